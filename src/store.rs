use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spdlog::{debug, warn};
use tempfile::NamedTempFile;
use thiserror::Error;

pub const STORE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key `{key}` not found in table `{table}`")]
    KeyNotFound { table: String, key: String },
    #[error("store file {path} is corrupted: {reason}")]
    Corrupted { path: PathBuf, reason: String },
    #[error("store I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One persisted item: when its source was last seen modified, and the
/// serialized entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub last_modified: DateTime<Utc>,
    pub content: serde_json::Value,
}

pub type Table = BTreeMap<String, Record>;
pub type DigestTable = BTreeMap<String, String>;

#[derive(Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    tables: BTreeMap<String, Table>,
    #[serde(default)]
    digest: DigestTable,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    version: u32,
    tables: &'a BTreeMap<String, Table>,
    digest: &'a DigestTable,
}

#[derive(Debug, Default)]
pub struct Store {
    path: PathBuf,
    tables: BTreeMap<String, Table>,
    digest: DigestTable,
}

impl Store {
    /// An empty store that will be saved to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Store {
        Store {
            path: path.into(),
            tables: BTreeMap::new(),
            digest: DigestTable::new(),
        }
    }

    /// Reads the store at `path`. A missing file is a first build, not an error.
    pub fn load(path: &Path) -> Result<Store, StoreError> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No store at {}, starting empty", path.display());
                return Ok(Store::new(path));
            }
            Err(source) => return Err(StoreError::Io { path: path.to_path_buf(), source }),
        };

        let parsed: StoreFile = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| StoreError::Corrupted { path: path.to_path_buf(), reason: e.to_string() })?;

        if parsed.version != STORE_VERSION {
            return Err(StoreError::Corrupted {
                path: path.to_path_buf(),
                reason: format!("unsupported store version {} (expected {})", parsed.version, STORE_VERSION),
            });
        }

        Ok(Store {
            path: path.to_path_buf(),
            tables: parsed.tables,
            digest: parsed.digest,
        })
    }

    /// Like [`Store::load`], but a corrupted file degrades to an empty store,
    /// which makes the next build a full one. Unreadable paths still fail.
    pub fn load_or_empty(path: &Path) -> Result<Store, StoreError> {
        match Self::load(path) {
            Err(StoreError::Corrupted { path, reason }) => {
                warn!("Ignoring corrupted store {}: {}. Doing a full build", path.display(), reason);
                Ok(Store::new(path))
            }
            other => other,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, table: &str, key: &str) -> Result<&Record, StoreError> {
        self.tables
            .get(table)
            .and_then(|t| t.get(key))
            .ok_or_else(|| StoreError::KeyNotFound { table: table.to_string(), key: key.to_string() })
    }

    pub fn set(&mut self, table: &str, key: &str, record: Record) {
        self.get_table(table).insert(key.to_string(), record);
    }

    pub fn remove(&mut self, table: &str, key: &str) -> Result<Record, StoreError> {
        self.tables
            .get_mut(table)
            .and_then(|t| t.remove(key))
            .ok_or_else(|| StoreError::KeyNotFound { table: table.to_string(), key: key.to_string() })
    }

    /// Mutable access to a table, creating it empty when absent.
    pub fn get_table(&mut self, table: &str) -> &mut Table {
        self.tables.entry(table.to_string()).or_default()
    }

    /// Read-only access. `None` and `Some(empty)` are different states.
    pub fn table(&self, table: &str) -> Option<&Table> {
        self.tables.get(table)
    }

    pub fn digest_table(&self) -> &DigestTable {
        &self.digest
    }

    pub fn digest_table_mut(&mut self) -> &mut DigestTable {
        &mut self.digest
    }

    /// Saves to the path the store was loaded from.
    pub fn save(&self) -> Result<(), StoreError> {
        self.save_to(&self.path)
    }

    /// Serializes every table and atomically replaces `path`.
    ///
    /// The data goes to a temporary file in the same directory which is
    /// synced and then renamed over the target, so a crash leaves either the
    /// old store or the new one.
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        let io_err = |source: io::Error| StoreError::Io { path: path.to_path_buf(), source };

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, &StoreFileRef {
                version: STORE_VERSION,
                tables: &self.tables,
                digest: &self.digest,
            })?;
            writer.flush().map_err(io_err)?;
        }
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;

        debug!("Store saved to {}", path.display());
        Ok(())
    }
}

/// Modification time of a file, in the representation records keep.
pub fn modified_time(path: &Path) -> io::Result<DateTime<Utc>> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Utc>::from(modified))
}
