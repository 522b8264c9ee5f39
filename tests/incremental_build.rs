use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tempfile::{tempdir, TempDir};

use scribe::config::Config;
use scribe::content::{Model, Post};
use scribe::error::BuildError;
use scribe::render::{RenderError, RenderOutput, Renderer};
use scribe::reporter::{MemoryReporter, ReportKind};
use scribe::site::{BuildSummary, Site, SiteData};
use scribe::store::Store;

/// Renders every post and page as plain text, plus an index of post titles.
struct CountingRenderer {
    runs: Arc<AtomicUsize>,
}

impl Renderer for CountingRenderer {
    fn run(&self, data: &SiteData) -> Result<RenderOutput, RenderError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let mut output = RenderOutput::default();

        for post in &data.index.posts {
            if let Some(path) = post.output_path() {
                output.content_map.insert(path, format!("{}\n{}", post.title, post.rendered).into_bytes());
            }
        }
        for page in &data.pages {
            if let Some(path) = page.output_path() {
                output.content_map.insert(path, page.rendered.clone().into_bytes());
            }
        }
        let titles: Vec<&str> = data.index.posts.iter().map(|p| p.title.as_str()).collect();
        output.content_map.insert("index.html".to_string(), titles.join("\n").into_bytes());
        for (name, tag) in &data.index.tags {
            output.content_map.insert(format!("tags/{}/index.html", tag.slug), format!("{} {}", name, tag.posts.len()).into_bytes());
        }

        output.static_files = data.static_files.clone();
        Ok(output)
    }
}

struct FailingRenderer;

impl Renderer for FailingRenderer {
    fn run(&self, _data: &SiteData) -> Result<RenderOutput, RenderError> {
        Err(RenderError::Failed("theme exploded".to_string()))
    }
}

struct TestSite {
    _dir: TempDir,
    config: Config,
    reporter: Arc<MemoryReporter>,
    runs: Arc<AtomicUsize>,
}

impl TestSite {
    fn new() -> TestSite {
        let dir = tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        fs::create_dir_all(&config.paths.posts_dir).unwrap();
        fs::create_dir_all(&config.paths.pages_dir).unwrap();
        fs::create_dir_all(config.paths.static_dir.join("img")).unwrap();

        let site = TestSite {
            _dir: dir,
            config,
            reporter: Arc::new(MemoryReporter::new()),
            runs: Arc::new(AtomicUsize::new(0)),
        };
        site.write_post("hello.md", "Hello", "2024-01-01 09:00", "intro");
        site.write_post("second.md", "Second", "2024-01-02 09:00", "intro, rust");
        site.write_post("third.md", "Third", "2024-01-03 09:00", "rust");
        fs::write(site.config.paths.pages_dir.join("about.md"), "---\ntitle: About\n---\nAbout me\n").unwrap();
        fs::write(site.config.paths.static_dir.join("img").join("logo.png"), [0x89, 0x50, 0x4e, 0x47]).unwrap();
        site
    }

    fn posts_dir(&self) -> &Path {
        &self.config.paths.posts_dir
    }

    fn publish(&self, rel: &str) -> PathBuf {
        self.config.paths.publish_dir.join(rel)
    }

    fn write_post(&self, filename: &str, title: &str, date: &str, tags: &str) {
        let raw = format!("---\ntitle: {}\ndate: {}\ntags: {}\n---\n{} body\n", title, date, tags, title);
        fs::write(self.posts_dir().join(filename), raw).unwrap();
    }

    fn open(&self, full: bool) -> Site {
        let renderer = Box::new(CountingRenderer { runs: self.runs.clone() });
        Site::new(self.config.clone(), full, renderer, self.reporter.clone()).unwrap()
    }

    fn build(&self) -> BuildSummary {
        self.open(false).generate().unwrap()
    }

    fn build_with(&self, config: Config) -> BuildSummary {
        let renderer = Box::new(CountingRenderer { runs: self.runs.clone() });
        Site::new(config, false, renderer, self.reporter.clone()).unwrap().generate().unwrap()
    }

    fn digest(&self) -> std::collections::BTreeMap<String, String> {
        Store::load(&self.config.paths.db_path).unwrap().digest_table().clone()
    }
}

fn bump_mtime(path: &Path) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60)).unwrap();
}

#[test]
fn first_build_writes_everything() {
    let site = TestSite::new();
    let summary = site.build();

    // 3 posts, 1 page, index, 2 tags, 1 static file
    assert_eq!(summary, BuildSummary { written: 8, skipped: 0, removed: 0, pruned: 0 });
    assert_eq!(fs::read_to_string(site.publish("index.html")).unwrap(), "Third\nSecond\nHello");
    assert_eq!(fs::read(site.publish("img/logo.png")).unwrap(), [0x89, 0x50, 0x4e, 0x47]);
    assert!(site.publish("2024/01/02/second/index.html").is_file());
    assert!(site.publish("about/index.html").is_file());
    assert_eq!(fs::read_to_string(site.publish("tags/intro/index.html")).unwrap(), "intro 2");
    assert!(site.reporter.reports().is_empty());
}

#[test]
fn unchanged_rebuild_writes_nothing() {
    let site = TestSite::new();
    site.build();
    let digest = site.digest();
    let post_output = site.publish("2024/01/01/hello/index.html");
    let written_at = fs::metadata(&post_output).unwrap().modified().unwrap();

    let mut second = site.open(false);
    assert!(second.content().posts.iter().all(|p| p.rendered.contains("body")));
    let summary = second.generate().unwrap();

    assert_eq!(summary, BuildSummary { written: 0, skipped: 8, removed: 0, pruned: 0 });
    assert_eq!(site.digest(), digest);
    assert_eq!(fs::metadata(&post_output).unwrap().modified().unwrap(), written_at);
    assert_eq!(site.runs.load(Ordering::SeqCst), 2);
}

#[test]
fn removed_post_disappears() {
    let site = TestSite::new();
    site.build();
    let output = site.publish("2024/01/03/third/index.html");
    assert!(output.is_file());

    fs::remove_file(site.posts_dir().join("third.md")).unwrap();
    let mut rebuilt = site.open(false);
    let summary = rebuilt.generate().unwrap();

    assert_eq!(summary.removed, 1);
    assert!(!output.exists());
    assert!(rebuilt.content().posts.iter().all(|p| p.filename != "third.md"));
    assert!(rebuilt.store().get(Post::TABLE, "third.md").is_err());
    assert!(!site.digest().contains_key("2024/01/03/third/index.html"));
    // index and the rust tag page changed
    assert_eq!(summary.written, 2);
    assert_eq!(site.reporter.count(ReportKind::RemovalFailed), 0);
}

#[test]
fn removal_of_missing_output_is_reported() {
    let site = TestSite::new();
    site.build();
    fs::remove_file(site.publish("2024/01/03/third/index.html")).unwrap();
    fs::remove_file(site.posts_dir().join("third.md")).unwrap();

    let summary = site.build();
    assert_eq!(summary.removed, 1);
    assert_eq!(site.reporter.count(ReportKind::RemovalFailed), 1);
}

#[test]
fn edited_post_is_reparsed() {
    let site = TestSite::new();
    site.build();

    site.write_post("hello.md", "Hello again", "2024-01-01 09:00", "intro");
    bump_mtime(&site.posts_dir().join("hello.md"));
    let summary = site.build();

    // The slug comes from the new title, so the old URL goes away
    assert_eq!(fs::read_to_string(site.publish("index.html")).unwrap(), "Third\nSecond\nHello again");
    assert!(site.publish("2024/01/01/hello-again/index.html").is_file());
    assert!(!site.publish("2024/01/01/hello/index.html").exists());
    assert!(!site.digest().contains_key("2024/01/01/hello/index.html"));
    assert_eq!(summary, BuildSummary { written: 2, skipped: 6, removed: 0, pruned: 0 });
    assert_eq!(site.reporter.count(ReportKind::RemovalFailed), 0);
}

#[test]
fn bad_post_does_not_stop_the_build() {
    let site = TestSite::new();
    fs::write(site.posts_dir().join("broken.md"), "---\ntitle: Broken\ndate: not a date\n---\n").unwrap();
    fs::write(site.posts_dir().join("plain.md"), "just text").unwrap();

    let mut built = site.open(false);
    built.generate().unwrap();

    assert_eq!(built.content().posts.len(), 3);
    assert_eq!(site.reporter.count(ReportKind::IllegalSource), 2);
    assert!(built.store().get(Post::TABLE, "broken.md").is_err());
}

#[test]
fn page_url_outside_the_site_is_rejected() {
    let site = TestSite::new();
    fs::write(site.config.paths.pages_dir.join("bad.md"), "---\ntitle: Bad\nurl: ../escape\n---\nnope\n").unwrap();

    let summary = site.build();
    assert_eq!(summary.written, 8);
    assert!(site.publish("2024/01/01/hello/index.html").is_file());
    assert!(!site.config.base_dir.join("escape").exists());
    assert!(site.config.paths.db_path.is_file());
    assert_eq!(site.reporter.count(ReportKind::IllegalSource), 1);
}

#[test]
fn orphaned_tag_page_is_pruned() {
    let site = TestSite::new();
    site.write_post("gone.md", "Gone", "2024-01-04 09:00", "gone");
    site.build();
    let tag_page = site.publish("tags/gone/index.html");
    assert!(tag_page.is_file());

    fs::remove_file(site.posts_dir().join("gone.md")).unwrap();
    let summary = site.build();

    assert_eq!(summary.removed, 1);
    assert_eq!(summary.pruned, 1);
    assert!(!tag_page.exists());
    assert!(!site.digest().contains_key("tags/gone/index.html"));
    // Nothing left to prune on the next build
    assert_eq!(site.build().pruned, 0);
}

#[test]
fn permalink_change_moves_cached_posts() {
    let site = TestSite::new();
    site.build();

    let mut config = site.config.clone();
    config.defaults.permalink = "/blog/:slug/".to_string();
    let summary = site.build_with(config);

    assert_eq!(summary.written, 3);
    assert_eq!(summary.pruned, 3);
    assert!(site.publish("blog/hello/index.html").is_file());
    assert!(!site.publish("2024/01/01/hello/index.html").exists());
}

#[test]
fn deleted_output_dir_is_restored() {
    let site = TestSite::new();
    site.build();
    fs::remove_dir_all(&site.config.paths.publish_dir).unwrap();

    let summary = site.build();
    assert_eq!(summary.written, 8);
    assert!(site.publish("index.html").is_file());
}

#[test]
fn full_build_ignores_the_store() {
    let site = TestSite::new();
    site.build();

    let summary = site.open(true).generate().unwrap();
    assert_eq!(summary.written, 8);
    assert_eq!(summary.skipped, 0);
}

#[test]
fn corrupted_store_means_full_build() {
    let site = TestSite::new();
    site.build();
    fs::write(&site.config.paths.db_path, "{ definitely not a store").unwrap();

    let summary = site.build();
    assert_eq!(summary.written, 8);
    assert!(Store::load(&site.config.paths.db_path).is_ok());
}

#[test]
fn renderer_failure_fails_the_build() {
    let site = TestSite::new();
    let mut failing = Site::new(site.config.clone(), false, Box::new(FailingRenderer), site.reporter.clone()).unwrap();

    let err = failing.generate().unwrap_err();
    assert!(matches!(err, BuildError::Render(RenderError::Failed(_))));
    assert!(!site.config.paths.db_path.exists());
}
