use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::store::Store;

#[derive(Debug, Default, PartialEq)]
pub struct Changes {
    /// On disk, never recorded.
    pub new: BTreeSet<String>,
    /// On disk and recorded.
    pub existing: BTreeSet<String>,
    /// Recorded, gone from disk.
    pub removed: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Recorded modification time matches: reuse the cached parse.
    CachedValid,
    /// Recorded modification time differs, or there is no record.
    Stale,
}

pub fn detect(store: &Store, table: &str, current: &BTreeSet<String>) -> Changes {
    let previous: BTreeSet<&String> = match store.table(table) {
        Some(records) => records.keys().collect(),
        None => BTreeSet::new(),
    };

    let mut changes = Changes::default();
    for filename in current {
        if previous.contains(filename) {
            changes.existing.insert(filename.clone());
        } else {
            changes.new.insert(filename.clone());
        }
    }
    changes.removed = previous
        .into_iter()
        .filter(|key| !current.contains(*key))
        .cloned()
        .collect();

    changes
}

pub fn check_modified(store: &Store, table: &str, filename: &str, modified: DateTime<Utc>) -> Freshness {
    match store.get(table, filename) {
        Ok(record) if record.last_modified == modified => Freshness::CachedValid,
        // A missing record lands here as KeyNotFound
        _ => Freshness::Stale,
    }
}
