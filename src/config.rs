use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::Deserialize;

use crate::content::post::DEFAULT_PERMALINK;

pub const CFG_FILE_NAME: &str = "scribe.toml";
pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SiteInfo {
    pub title: String,
    pub url: String,
    pub description: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        SiteInfo {
            title: "My blog".to_string(),
            url: "http://localhost".to_string(),
            description: String::new(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Paths {
    pub posts_dir: PathBuf,
    pub pages_dir: PathBuf,
    pub static_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub publish_dir: PathBuf,
    pub db_path: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            posts_dir: PathBuf::from("source/posts"),
            pages_dir: PathBuf::from("source/pages"),
            static_dir: PathBuf::from("static"),
            templates_dir: PathBuf::from("templates"),
            publish_dir: PathBuf::from("_sites"),
            db_path: PathBuf::from("db.json"),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Defaults {
    /// Posts per index page. The page count truncates: a trailing partial
    /// page is not counted.
    pub page_size: usize,
    pub permalink: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            page_size: DEFAULT_PAGE_SIZE,
            permalink: DEFAULT_PERMALINK.to_string(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, Debug, PartialEq)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub site: SiteInfo,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub defaults: Defaults,
    pub log: Option<Log>,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Config {
    /// All defaults, rooted at `base_dir`.
    pub fn with_base_dir(base_dir: &Path) -> Config {
        let mut cfg = Config::default();
        cfg.resolve_paths(base_dir);
        cfg
    }

    /// Replaces the publish directory, resolved like the configured one.
    pub fn set_publish_dir(&mut self, publish_dir: &Path) {
        self.paths.publish_dir = resolve_path(&self.base_dir, publish_dir);
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        self.base_dir = base_dir.to_path_buf();
        self.paths = Paths {
            posts_dir: resolve_path(base_dir, &self.paths.posts_dir),
            pages_dir: resolve_path(base_dir, &self.paths.pages_dir),
            static_dir: resolve_path(base_dir, &self.paths.static_dir),
            templates_dir: resolve_path(base_dir, &self.paths.templates_dir),
            publish_dir: resolve_path(base_dir, &self.paths.publish_dir),
            db_path: resolve_path(base_dir, &self.paths.db_path),
        };
        if self.defaults.page_size == 0 {
            self.defaults.page_size = DEFAULT_PAGE_SIZE;
        }
    }
}

/// Relative paths and `${base_dir}/...` are taken from the site root.
fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("${base_dir}") {
        return base_dir.join(rest);
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

pub fn read_config(cfg_path: &Path) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    let mut cfg: Config = match toml::from_str::<Config>(cfg_content.as_str()) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    let base_dir = match cfg_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let base_dir = fs::canonicalize(&base_dir).unwrap_or(base_dir);
    cfg.resolve_paths(&base_dir);

    Ok(cfg)
}

/// Walks up from `start` to the first directory holding a `scribe.toml`.
pub fn locate_base_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CFG_FILE_NAME).is_file())
        .map(Path::to_path_buf)
}
