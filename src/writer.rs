use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use spdlog::{debug, trace, warn};

use crate::store::Store;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    pub written: usize,
    pub skipped: usize,
    /// Outputs no longer in the content map, deleted from the publish dir.
    pub pruned: usize,
}

/// Hex SHA-256 of an output's bytes, as kept in the digest table.
pub fn content_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Writes rendered outputs under the publish directory, skipping every path
/// whose content hashes to what the digest table already holds.
pub struct DigestGatedWriter {
    publish_dir: PathBuf,
}

impl DigestGatedWriter {
    pub fn new(publish_dir: &Path) -> Self {
        DigestGatedWriter {
            publish_dir: publish_dir.to_path_buf(),
        }
    }

    pub fn publish_dir(&self) -> &Path {
        &self.publish_dir
    }

    pub fn write(&self, store: &mut Store, content_map: &BTreeMap<String, Vec<u8>>) -> io::Result<WriteStats> {
        let mut stats = WriteStats::default();

        for (rel_path, content) in content_map {
            let target = self.target_for(rel_path)?;
            let digest = content_digest(content);

            let unchanged = store.digest_table().get(rel_path) == Some(&digest);
            // A deleted output comes back even when its digest still matches
            if unchanged && target.is_file() {
                trace!("Unchanged {}", rel_path);
                stats.skipped += 1;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, content)?;
            store.digest_table_mut().insert(rel_path.clone(), digest);
            debug!("Wrote {}", target.display());
            stats.written += 1;
        }

        stats.pruned = self.prune(store, content_map);
        Ok(stats)
    }

    /// Deletes every previously written output that the current build did not
    /// produce. A failed delete keeps its digest entry so the next build
    /// tries again.
    fn prune(&self, store: &mut Store, content_map: &BTreeMap<String, Vec<u8>>) -> usize {
        let orphans: Vec<String> = store
            .digest_table()
            .keys()
            .filter(|rel_path| !content_map.contains_key(*rel_path))
            .cloned()
            .collect();

        let mut pruned = 0;
        for rel_path in orphans {
            if let Ok(target) = self.target_for(&rel_path) {
                match fs::remove_file(&target) {
                    Ok(()) => debug!("Pruned {}", target.display()),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => {
                        warn!("Could not delete {}: {}", target.display(), e);
                        continue;
                    }
                }
            }
            store.digest_table_mut().remove(&rel_path);
            pruned += 1;
        }
        pruned
    }

    fn target_for(&self, rel_path: &str) -> io::Result<PathBuf> {
        let rel = Path::new(rel_path);
        if rel_path.is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(io::Error::new(ErrorKind::InvalidInput,
                format!("Output path {} is not inside the publish directory", rel_path)));
        }
        Ok(self.publish_dir.join(rel))
    }
}
