use std::fs;
use std::io;
use std::path::Path;

use scribe::config::CFG_FILE_NAME;

use crate::skeleton::create_source;

const SAMPLE_FILES: &[(&str, &str)] = &[
    ("templates/post.html", include_str!("init/templates/post.html")),
    ("templates/page.html", include_str!("init/templates/page.html")),
    ("templates/index.html", include_str!("init/templates/index.html")),
    ("templates/tag.html", include_str!("init/templates/tag.html")),
    ("templates/category.html", include_str!("init/templates/category.html")),
    ("static/css/style.css", include_str!("init/static/css/style.css")),
    ("source/posts/hello-world.md", include_str!("init/source/posts/hello-world.md")),
];

const SITE_DIRS: &[&str] = &["source/posts", "source/pages", "templates", "static"];

fn sample_cfg(title: &str) -> String {
    let title = toml::Value::String(title.to_string()).to_string();
    include_str!("init/scribe.toml").replace("SITE_TITLE", &title)
}

/// Lays out a new site under `site_dir`. Fails without touching anything
/// when a config file is already there.
pub(crate) fn init_site(site_dir: &Path, title: &str) -> io::Result<()> {
    let cfg_path = site_dir.join(CFG_FILE_NAME);
    if cfg_path.exists() {
        return Err(io::Error::new(io::ErrorKind::AlreadyExists,
            format!("{} already exists", cfg_path.display())));
    }

    for dir in SITE_DIRS {
        fs::create_dir_all(site_dir.join(dir))?;
    }
    for (rel_path, content) in SAMPLE_FILES {
        create_source(&site_dir.join(rel_path), content)?;
    }
    create_source(&cfg_path, &sample_cfg(title))
}
