use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args as ClapArgs, Parser, Subcommand};
use spdlog::{info, warn};

use scribe::logger::configure_logger;
use scribe::site::Site;
use scribe::watch::watch_for_changes_blocking;

use crate::config::{display_path, expand_home, open_config};
use crate::init::init_site;
use crate::skeleton::{create_source, get_name, page_file_name, post_file_name, render_page, render_post};

mod config;
mod init;
mod skeleton;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file, or the directory holding scribe.toml. Searched upwards
    /// from the current directory when omitted
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates a new site with sample templates and a first post
    Init(InitArgs),
    /// Builds the site, rewriting only what changed
    Generate(GenerateArgs),
    /// Builds the site, then rebuilds on every source change
    Watch(GenerateArgs),
    /// Creates a new post
    Post(PostArgs),
    /// Creates a new page
    Page(PageArgs),
}

#[derive(ClapArgs, Debug)]
struct InitArgs {
    /// Directory of the new site, also used as its title
    #[arg(default_value = "blog")]
    name: String,
}

#[derive(ClapArgs, Debug)]
struct GenerateArgs {
    /// Ignore the stored state and rebuild everything
    #[arg(short, long)]
    full: bool,

    /// Publish directory, overriding the configured one
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct PostArgs {
    /// Title of the post
    #[arg(short, long)]
    title: String,

    /// Name of the author. If empty, OS user real name is being used
    #[arg(short, long)]
    author: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct PageArgs {
    /// Title of the page
    #[arg(short, long)]
    title: String,

    /// Where the page is published, e.g. /about/
    #[arg(short, long)]
    url: String,

    #[arg(short, long)]
    description: Option<String>,
}

fn init_cmd(args: InitArgs) -> Result<()> {
    let site_dir = expand_home(&args.name);
    let title = site_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.name.clone());

    init_site(&site_dir, &title).with_context(|| format!("Could not create a site in {}", site_dir.display()))?;
    info!("Site created in {}", site_dir.display());
    println!("Site created. Run `scribe generate` inside {}", site_dir.display());
    Ok(())
}

fn generate_cmd(cfg_path: Option<&str>, args: GenerateArgs, watch: bool) -> Result<()> {
    let config = open_config(cfg_path, args.output.as_deref())?;
    info!("Building {} into {}", config.site.title, config.paths.publish_dir.display());

    let mut site = Site::with_defaults(config, args.full)?;
    let summary = site.generate()?;
    println!("{} written, {} unchanged, {} removed, {} pruned",
        summary.written, summary.skipped, summary.removed, summary.pruned);

    if watch {
        info!("Watching for changes. Press Ctrl+C to stop");
        watch_for_changes_blocking(&mut site)?;
    }
    Ok(())
}

fn post_cmd(cfg_path: Option<&str>, args: PostArgs) -> Result<()> {
    let config = open_config(cfg_path, None)?;
    let date = Local::now().naive_local();
    let author = args.author.unwrap_or_else(get_name);

    let path = config.paths.posts_dir.join(post_file_name(&args.title, &date));
    create_source(&path, &render_post(&args.title, &author, &date))
        .with_context(|| format!("Could not create {}", path.display()))?;

    println!("Created post {}", display_path(&config, &path));
    Ok(())
}

fn page_cmd(cfg_path: Option<&str>, args: PageArgs) -> Result<()> {
    let config = open_config(cfg_path, None)?;

    let path = config.paths.pages_dir.join(page_file_name(&args.title));
    create_source(&path, &render_page(&args.title, &args.url, args.description.as_deref()))
        .with_context(|| format!("Could not create {}", path.display()))?;

    println!("Created page {}", display_path(&config, &path));
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg_path = args.config.as_deref();

    // Logging follows the site's [log] section, so it needs the config first
    let log = open_config(cfg_path, None).ok().and_then(|c| c.log);
    if let Err(err) = configure_logger(log.as_ref(), args.verbose) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    match args.command {
        Command::Init(init_args) => init_cmd(init_args),
        Command::Generate(gen_args) => generate_cmd(cfg_path, gen_args, false),
        Command::Watch(gen_args) => generate_cmd(cfg_path, gen_args, true),
        Command::Post(post_args) => post_cmd(cfg_path, post_args),
        Command::Page(page_args) => page_cmd(cfg_path, page_args),
    }
}
