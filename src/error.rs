use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::render::RenderError;
use crate::store::StoreError;

/// Failures that abort a whole build.
///
/// Everything recoverable (a malformed post, an output file that was already
/// gone) goes through the [`Reporter`](crate::reporter::Reporter) instead.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
