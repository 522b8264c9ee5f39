use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecursiveMode, Watcher};
use spdlog::{debug, error, info};

use crate::error::BuildError;
use crate::loader::FileEvent;
use crate::site::Site;
use crate::source_list::is_ignored;

const DEBOUNCE_MS: u64 = 300;
const IDLE_WAIT_MS: u64 = 1000;

fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or(true, is_ignored)
}

fn file_event(kind: &EventKind) -> Option<FileEvent> {
    match kind {
        EventKind::Create(_) => Some(FileEvent::Created),
        EventKind::Modify(_) => Some(FileEvent::Modified),
        EventKind::Remove(_) => Some(FileEvent::Removed),
        _ => None,
    }
}

/// Pending changes, last event per path wins.
struct Debouncer {
    pending: BTreeMap<PathBuf, FileEvent>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Debouncer {
            pending: BTreeMap::new(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        let Some(kind) = file_event(&event.kind) else {
            return;
        };
        for path in event.paths {
            if is_temp_file(&path) {
                continue;
            }
            self.pending.insert(path, kind);
            self.last_event = Some(Instant::now());
        }
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self.last_event.is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn timeout(&self) -> Duration {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        match self.last_event {
            Some(t) if !self.pending.is_empty() => debounce.saturating_sub(t.elapsed()),
            _ => Duration::from_millis(IDLE_WAIT_MS),
        }
    }

    fn take(&mut self) -> BTreeMap<PathBuf, FileEvent> {
        self.last_event = None;
        std::mem::take(&mut self.pending)
    }
}

fn apply_changes(site: &mut Site, changes: BTreeMap<PathBuf, FileEvent>) {
    for (path, event) in changes {
        match site.parse_single_file(&path, event) {
            Ok(Some(summary)) => info!("{} changed: {} written, {} removed, {} pruned",
                path.display(), summary.written, summary.removed, summary.pruned),
            Ok(None) => {}
            Err(e) => error!("Rebuild after {} failed: {}", path.display(), e),
        }
    }
}

/// Watches every source directory of `site` and blocks, rebuilding on
/// changes until the watcher goes away.
pub fn watch_for_changes_blocking(site: &mut Site) -> Result<(), BuildError> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx)?;

    for dir in site.source_dirs() {
        if dir.is_dir() {
            watcher.watch(dir, RecursiveMode::Recursive)?;
            info!("Watching {}", dir.display());
        } else {
            debug!("Not watching missing {}", dir.display());
        }
    }

    let mut debouncer = Debouncer::new();
    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) => debouncer.add(event),
            Ok(Err(e)) => error!("Watch error: {}", e),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => apply_changes(site, debouncer.take()),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    Ok(())
}
