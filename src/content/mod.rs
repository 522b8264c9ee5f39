use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub mod front_matter;
pub mod body;
pub mod page;
pub mod post;
pub mod static_file;
pub mod template;

pub use page::Page;
pub use post::Post;
pub use static_file::StaticFile;
pub use template::Template;

/// Current layout of every persisted entity record. Records carrying any
/// other version are reparsed from source instead of trusted.
pub const RECORD_VERSION: u32 = 1;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{file}: missing front matter")]
    MissingFrontMatter { file: String },
    #[error("{file}: front matter is not closed by `---`")]
    UnterminatedFrontMatter { file: String },
    #[error("{file}: invalid front matter: {reason}")]
    InvalidFrontMatter { file: String, reason: String },
    #[error("{file}: missing required field `{field}`")]
    MissingField { file: String, field: &'static str },
    #[error("{file}: invalid date `{value}`: {reason}")]
    InvalidDate { file: String, value: String, reason: String },
    #[error("{file}: url `{url}` leaves the publish directory")]
    InvalidUrl { file: String, url: String },
    #[error("{file}: could not render body: {reason}")]
    InvalidBody { file: String, reason: String },
    #[error("{file}: marked as draft")]
    Draft { file: String },
    #[error("{file}: {reason}")]
    Unreadable { file: String, reason: String },
}

/// What parsing needs besides the raw text. Not part of any record.
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub source_dir: PathBuf,
    pub permalink: String,
}

impl ParseContext {
    pub fn new(source_dir: impl Into<PathBuf>, permalink: &str) -> Self {
        ParseContext {
            source_dir: source_dir.into(),
            permalink: permalink.to_string(),
        }
    }
}

/// A content type the loaders know how to reconcile: parseable from its
/// source file and round-trippable through a versioned store record.
pub trait Model: Sized + Clone {
    /// Store table holding this type's records.
    const TABLE: &'static str;

    /// Extensions of the files this type is built from. `None` takes all.
    const EXTENSIONS: Option<&'static [&'static str]>;

    type Record: Serialize + DeserializeOwned;

    /// Source filename, the entity's identity within its table.
    fn filename(&self) -> &str;

    fn parse(raw: &str, filename: &str, ctx: &ParseContext) -> Result<Self, ValidationError>;

    fn to_record(&self) -> Self::Record;

    /// `None` when the record was written by another layout version.
    fn from_record(filename: &str, record: Self::Record, ctx: &ParseContext) -> Option<Self>;

    /// Path under the publish directory generated for this entity, if any.
    fn output_path(&self) -> Option<String>;

    fn load_source(path: &Path, filename: &str, ctx: &ParseContext) -> Result<Self, ValidationError> {
        let raw = fs::read_to_string(path).map_err(|e| ValidationError::Unreadable {
            file: filename.to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&raw, filename, ctx)
    }
}

pub fn serialize<M: Model>(entity: &M) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(entity.to_record())
}

/// Rebuilds an entity from a stored record. Anything this crate wrote with
/// the current layout comes back; foreign or outdated records give `None`
/// and the caller reparses.
pub fn parse_from_cache<M: Model>(filename: &str, content: &serde_json::Value, ctx: &ParseContext) -> Option<M> {
    let record: M::Record = serde_json::from_value(content.clone()).ok()?;
    M::from_record(filename, record, ctx)
}

/// Output file of something published at `url`: `/a/b/` becomes `a/b/index.html`.
pub fn index_path_for_url(url: &str) -> String {
    let trimmed = url.trim_matches('/');
    if trimmed.is_empty() {
        "index.html".to_string()
    } else if trimmed.ends_with(".html") || trimmed.ends_with(".htm") {
        trimmed.to_string()
    } else {
        format!("{}/index.html", trimmed)
    }
}
