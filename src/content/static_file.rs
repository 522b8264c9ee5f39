use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::content::{Model, ParseContext, ValidationError, RECORD_VERSION};

/// A file copied verbatim into the publish directory, at the same relative
/// path it has under the static directory.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticFile {
    pub path: String,
    pub source: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StaticFileRecord {
    pub version: u32,
}

impl StaticFile {
    fn locate(filename: &str, ctx: &ParseContext) -> StaticFile {
        StaticFile {
            path: filename.to_string(),
            source: ctx.source_dir.join(filename),
        }
    }
}

impl Model for StaticFile {
    const TABLE: &'static str = "static";
    const EXTENSIONS: Option<&'static [&'static str]> = None;

    type Record = StaticFileRecord;

    fn filename(&self) -> &str {
        &self.path
    }

    fn parse(_raw: &str, filename: &str, ctx: &ParseContext) -> Result<StaticFile, ValidationError> {
        Ok(Self::locate(filename, ctx))
    }

    // Binary content is read when it gets written, not at load time.
    fn load_source(path: &Path, filename: &str, ctx: &ParseContext) -> Result<StaticFile, ValidationError> {
        if !path.is_file() {
            return Err(ValidationError::Unreadable {
                file: filename.to_string(),
                reason: "not a regular file".to_string(),
            });
        }
        Ok(Self::locate(filename, ctx))
    }

    fn to_record(&self) -> StaticFileRecord {
        StaticFileRecord { version: RECORD_VERSION }
    }

    fn from_record(filename: &str, record: StaticFileRecord, ctx: &ParseContext) -> Option<StaticFile> {
        if record.version != RECORD_VERSION {
            return None;
        }
        Some(Self::locate(filename, ctx))
    }

    fn output_path(&self) -> Option<String> {
        Some(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use crate::content::{parse_from_cache, serialize};

    use super::*;

    #[test]
    fn test_load_source() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css").join("site.css"), [0xff, 0x00, 0x12]).unwrap();
        let ctx = ParseContext::new(dir.path(), "");

        let file = StaticFile::load_source(&dir.path().join("css").join("site.css"), "css/site.css", &ctx).unwrap();
        assert_eq!(file.output_path().as_deref(), Some("css/site.css"));
        assert_eq!(file.source, dir.path().join("css/site.css"));

        let value = serialize(&file).unwrap();
        assert_eq!(parse_from_cache::<StaticFile>("css/site.css", &value, &ctx), Some(file));

        assert!(StaticFile::load_source(&dir.path().join("gone.css"), "gone.css", &ctx).is_err());
    }
}
