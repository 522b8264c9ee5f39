use std::collections::BTreeSet;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use spdlog::{debug, info};

use crate::change_detector::{check_modified, detect, Freshness};
use crate::content::{parse_from_cache, serialize, Model, Page, ParseContext, Post, StaticFile, Template, ValidationError};
use crate::reporter::{ReportKind, Reporter};
use crate::source_list::SourceList;
use crate::store::{modified_time, Record, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEvent {
    Created,
    Modified,
    Removed,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub cached: usize,
    pub parsed: usize,
    pub rejected: usize,
    pub removed: usize,
}

impl LoadSummary {
    fn add(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Cached => self.cached += 1,
            Outcome::Parsed => self.parsed += 1,
            Outcome::Rejected => self.rejected += 1,
        }
    }
}

enum Outcome {
    Cached,
    Parsed,
    Rejected,
}

/// Common capability of every content loader.
pub trait Loader {
    /// Source directory this loader watches.
    fn path(&self) -> &Path;

    /// Full reconciliation of the source directory with the store.
    fn load(&mut self, store: &mut Store) -> io::Result<LoadSummary>;

    /// Reconciles a single file after a filesystem event. Paths outside
    /// [`Loader::path`] are ignored.
    fn single_file_on_change(&mut self, store: &mut Store, path: &Path, event: FileEvent) -> io::Result<LoadSummary>;
}

/// Loader for one [`Model`] type, backed by the model's store table.
pub struct TableLoader<M: Model> {
    sources: SourceList,
    publish_dir: PathBuf,
    ctx: ParseContext,
    reporter: Arc<dyn Reporter>,
    // Kept in filename order
    entities: Vec<M>,
}

impl<M: Model> TableLoader<M> {
    pub fn new(source_dir: &Path, publish_dir: &Path, permalink: &str, reporter: Arc<dyn Reporter>) -> Self {
        TableLoader {
            sources: SourceList {
                root_dir: source_dir.to_path_buf(),
                extensions: M::EXTENSIONS,
            },
            publish_dir: publish_dir.to_path_buf(),
            ctx: ParseContext::new(source_dir, permalink),
            reporter,
            entities: vec![],
        }
    }

    pub fn entities(&self) -> &[M] {
        &self.entities
    }

    /// Brings one present source file up to date in the store.
    fn reconcile(&mut self, store: &mut Store, filename: &str, path: &Path) -> io::Result<(Outcome, Option<M>)> {
        let modified = match modified_time(path) {
            Ok(modified) => modified,
            Err(e) => {
                self.reject(store, ValidationError::Unreadable { file: filename.to_string(), reason: e.to_string() });
                return Ok((Outcome::Rejected, None));
            }
        };

        let cached = match check_modified(store, M::TABLE, filename, modified) {
            Freshness::CachedValid => store
                .get(M::TABLE, filename)
                .ok()
                .and_then(|record| parse_from_cache::<M>(filename, &record.content, &self.ctx)),
            Freshness::Stale => None,
        };

        let (outcome, entity) = match cached {
            Some(entity) => (Outcome::Cached, entity),
            None => match M::load_source(path, filename, &self.ctx) {
                Ok(entity) => {
                    debug!("Parsed {}/{}", M::TABLE, filename);
                    (Outcome::Parsed, entity)
                }
                Err(e) => {
                    self.reject(store, e);
                    return Ok((Outcome::Rejected, None));
                }
            },
        };

        if let Outcome::Parsed = outcome {
            self.drop_moved_output(store, filename, &entity);
        }

        let content = serialize(&entity).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))?;
        store.set(M::TABLE, filename, Record { last_modified: modified, content });

        Ok((outcome, Some(entity)))
    }

    /// Reports a file that cannot be part of the build. Whatever an earlier
    /// version of it produced goes away too.
    fn reject(&mut self, store: &mut Store, err: ValidationError) {
        let (kind, file) = match &err {
            ValidationError::Draft { file } => (ReportKind::Draft, file.clone()),
            ValidationError::Unreadable { file, .. } => (ReportKind::UnreadableSource, file.clone()),
            ValidationError::MissingFrontMatter { file }
            | ValidationError::UnterminatedFrontMatter { file }
            | ValidationError::InvalidFrontMatter { file, .. }
            | ValidationError::MissingField { file, .. }
            | ValidationError::InvalidDate { file, .. }
            | ValidationError::InvalidUrl { file, .. }
            | ValidationError::InvalidBody { file, .. } => (ReportKind::IllegalSource, file.clone()),
        };
        self.reporter.report(kind, &err.to_string());
        self.evict(store, &file);
    }

    /// Drops the record of `filename`, its digest entry and its output file.
    /// Returns false when there was no record.
    fn evict(&mut self, store: &mut Store, filename: &str) -> bool {
        // KeyNotFound here just means the file was never part of a build
        let Ok(record) = store.remove(M::TABLE, filename) else {
            return false;
        };
        self.entities.retain(|e| e.filename() != filename);

        let output = parse_from_cache::<M>(filename, &record.content, &self.ctx).and_then(|e| e.output_path());
        let Some(output) = output else {
            debug!("Removed {}/{}, no output to delete", M::TABLE, filename);
            return true;
        };

        self.remove_output(store, &output, true);
        debug!("Removed {}/{}", M::TABLE, filename);
        true
    }

    /// A reparse can move the output (new slug or date). The file at the old
    /// path belongs to nobody anymore.
    fn drop_moved_output(&self, store: &mut Store, filename: &str, entity: &M) {
        let previous = store
            .get(M::TABLE, filename)
            .ok()
            .and_then(|record| parse_from_cache::<M>(filename, &record.content, &self.ctx))
            .and_then(|e| e.output_path());

        if let Some(previous) = previous {
            if Some(&previous) != entity.output_path().as_ref() {
                self.remove_output(store, &previous, false);
            }
        }
    }

    /// Deletes a generated file and forgets its digest. With `expected`, a
    /// file that is already gone gets reported.
    fn remove_output(&self, store: &mut Store, output: &str, expected: bool) {
        store.digest_table_mut().remove(output);
        let target = self.publish_dir.join(output);
        match fs::remove_file(&target) {
            Ok(()) => debug!("Deleted {}", target.display()),
            Err(e) if e.kind() == ErrorKind::NotFound && !expected => {}
            Err(e) => self.reporter.report(ReportKind::RemovalFailed, &format!("{}: {}", target.display(), e)),
        }
    }

    fn upsert(&mut self, entity: M) {
        match self.entities.binary_search_by(|e| e.filename().cmp(entity.filename())) {
            Ok(pos) => self.entities[pos] = entity,
            Err(pos) => self.entities.insert(pos, entity),
        }
    }
}

impl<M: Model> Loader for TableLoader<M> {
    fn path(&self) -> &Path {
        &self.sources.root_dir
    }

    fn load(&mut self, store: &mut Store) -> io::Result<LoadSummary> {
        let files = self.sources.retrieve_files()?;
        let current: BTreeSet<String> = files.keys().cloned().collect();
        let changes = detect(store, M::TABLE, &current);
        store.get_table(M::TABLE);

        let mut summary = LoadSummary::default();
        for filename in &changes.removed {
            if self.evict(store, filename) {
                summary.removed += 1;
            }
        }

        self.entities.clear();
        for (filename, path) in &files {
            let (outcome, entity) = self.reconcile(store, filename, path)?;
            summary.add(&outcome);
            if let Some(entity) = entity {
                self.entities.push(entity);
            }
        }

        info!("Loaded {} {}: {} cached, {} parsed, {} rejected, {} removed",
            self.entities.len(), M::TABLE, summary.cached, summary.parsed, summary.rejected, summary.removed);
        Ok(summary)
    }

    fn single_file_on_change(&mut self, store: &mut Store, path: &Path, event: FileEvent) -> io::Result<LoadSummary> {
        let mut summary = LoadSummary::default();
        let Some(filename) = self.sources.key_for(path) else {
            return Ok(summary);
        };

        // Editors often replace files, so a "modified" file may be gone already
        if event == FileEvent::Removed || !path.is_file() {
            if self.evict(store, &filename) {
                summary.removed += 1;
            }
            return Ok(summary);
        }

        let (outcome, entity) = self.reconcile(store, &filename, path)?;
        summary.add(&outcome);
        if let Some(entity) = entity {
            self.upsert(entity);
        }
        Ok(summary)
    }
}

/// Everything the loaders produced, merged once all of them ran.
#[derive(Debug, Default, Clone)]
pub struct LoadedContent {
    pub posts: Vec<Post>,
    pub pages: Vec<Page>,
    pub templates: Vec<Template>,
    pub static_files: Vec<StaticFile>,
}

/// The closed set of content loaders a site runs, in load order.
pub enum SiteLoader {
    Post(TableLoader<Post>),
    Page(TableLoader<Page>),
    Template(TableLoader<Template>),
    Static(TableLoader<StaticFile>),
}

macro_rules! each_loader {
    ($self:expr, $loader:ident => $body:expr) => {
        match $self {
            SiteLoader::Post($loader) => $body,
            SiteLoader::Page($loader) => $body,
            SiteLoader::Template($loader) => $body,
            SiteLoader::Static($loader) => $body,
        }
    };
}

impl SiteLoader {
    pub fn name(&self) -> &'static str {
        match self {
            SiteLoader::Post(_) => Post::TABLE,
            SiteLoader::Page(_) => Page::TABLE,
            SiteLoader::Template(_) => Template::TABLE,
            SiteLoader::Static(_) => StaticFile::TABLE,
        }
    }

    /// Copies this loader's entities into the shared content.
    pub fn export(&self, content: &mut LoadedContent) {
        match self {
            SiteLoader::Post(l) => content.posts = l.entities().to_vec(),
            SiteLoader::Page(l) => content.pages = l.entities().to_vec(),
            SiteLoader::Template(l) => content.templates = l.entities().to_vec(),
            SiteLoader::Static(l) => content.static_files = l.entities().to_vec(),
        }
    }
}

impl Loader for SiteLoader {
    fn path(&self) -> &Path {
        each_loader!(self, l => l.path())
    }

    fn load(&mut self, store: &mut Store) -> io::Result<LoadSummary> {
        each_loader!(self, l => l.load(store))
    }

    fn single_file_on_change(&mut self, store: &mut Store, path: &Path, event: FileEvent) -> io::Result<LoadSummary> {
        each_loader!(self, l => l.single_file_on_change(store, path, event))
    }
}
