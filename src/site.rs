use std::fs;
use std::mem;
use std::path::Path;
use std::sync::Arc;

use spdlog::{debug, info};

use crate::collector::{collect, SiteIndex};
use crate::config::{Config, SiteInfo};
use crate::content::{Model, Page, StaticFile, Template};
use crate::error::BuildError;
use crate::loader::{FileEvent, LoadedContent, Loader, SiteLoader, TableLoader};
use crate::render::{Renderer, TemplateRenderer};
use crate::reporter::{LogReporter, ReportKind, Reporter};
use crate::store::Store;
use crate::writer::DigestGatedWriter;

/// Everything a renderer gets to see.
#[derive(Debug, Clone)]
pub struct SiteData {
    pub site: SiteInfo,
    pub index: SiteIndex,
    pub pages: Vec<Page>,
    pub templates: Vec<Template>,
    pub static_files: Vec<StaticFile>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub written: usize,
    pub skipped: usize,
    /// Sources evicted since the previous build.
    pub removed: usize,
    /// Outputs the build stopped producing, such as a tag page whose last
    /// post went away.
    pub pruned: usize,
}

pub struct Site {
    config: Config,
    store: Store,
    loaders: Vec<SiteLoader>,
    content: LoadedContent,
    renderer: Box<dyn Renderer>,
    reporter: Arc<dyn Reporter>,
    writer: DigestGatedWriter,
    removed: usize,
}

impl Site {
    /// Opens the store and runs every loader. With `full` the stored state
    /// is ignored and everything is reparsed and rewritten.
    pub fn new(config: Config, full: bool, renderer: Box<dyn Renderer>, reporter: Arc<dyn Reporter>) -> Result<Site, BuildError> {
        let db_path = config.paths.db_path.clone();
        let store = if full {
            info!("Full build requested, ignoring {}", db_path.display());
            Store::new(db_path)
        } else {
            Store::load_or_empty(&db_path)?
        };

        let paths = &config.paths;
        let publish_dir = &paths.publish_dir;
        let permalink = config.defaults.permalink.as_str();
        let loaders = vec![
            SiteLoader::Post(TableLoader::new(&paths.posts_dir, publish_dir, permalink, reporter.clone())),
            SiteLoader::Page(TableLoader::new(&paths.pages_dir, publish_dir, permalink, reporter.clone())),
            SiteLoader::Template(TableLoader::new(&paths.templates_dir, publish_dir, permalink, reporter.clone())),
            SiteLoader::Static(TableLoader::new(&paths.static_dir, publish_dir, permalink, reporter.clone())),
        ];

        let mut site = Site {
            writer: DigestGatedWriter::new(publish_dir),
            config,
            store,
            loaders,
            content: LoadedContent::default(),
            renderer,
            reporter,
            removed: 0,
        };
        site.load_all()?;
        Ok(site)
    }

    /// Ramhorns templates, warnings to the log.
    pub fn with_defaults(config: Config, full: bool) -> Result<Site, BuildError> {
        let reporter: Arc<dyn Reporter> = Arc::new(LogReporter);
        let renderer = Box::new(TemplateRenderer::new(reporter.clone()));
        Site::new(config, full, renderer, reporter)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn content(&self) -> &LoadedContent {
        &self.content
    }

    pub fn source_dirs(&self) -> impl Iterator<Item = &Path> {
        self.loaders.iter().map(|l| l.path())
    }

    fn load_all(&mut self) -> Result<(), BuildError> {
        for loader in self.loaders.iter_mut() {
            let summary = loader.load(&mut self.store).map_err(|e| BuildError::io(loader.path(), e))?;
            self.removed += summary.removed;
        }

        // Nothing sees the loaded content before every loader is done
        let mut content = LoadedContent::default();
        for loader in &self.loaders {
            loader.export(&mut content);
        }
        self.content = content;
        Ok(())
    }

    /// Collects, renders, writes what changed and saves the store.
    pub fn generate(&mut self) -> Result<BuildSummary, BuildError> {
        let data = SiteData {
            site: self.config.site.clone(),
            index: collect(self.content.posts.clone(), self.config.defaults.page_size),
            pages: self.content.pages.clone(),
            templates: self.content.templates.clone(),
            static_files: self.content.static_files.clone(),
        };

        let mut output = self.renderer.run(&data)?;
        for file in &output.static_files {
            let Some(path) = file.output_path() else {
                continue;
            };
            match fs::read(&file.source) {
                Ok(bytes) => {
                    output.content_map.insert(path, bytes);
                }
                Err(e) => self.reporter.report(ReportKind::UnreadableSource, &format!("{}: {}", file.source.display(), e)),
            }
        }

        let publish_dir = self.writer.publish_dir();
        fs::create_dir_all(publish_dir).map_err(|e| BuildError::io(publish_dir, e))?;
        let stats = self.writer
            .write(&mut self.store, &output.content_map)
            .map_err(|e| BuildError::io(publish_dir, e))?;
        self.store.save()?;

        let summary = BuildSummary {
            written: stats.written,
            skipped: stats.skipped,
            removed: mem::take(&mut self.removed),
            pruned: stats.pruned,
        };
        info!("Build done: {} posts, {} pages. {} written, {} unchanged, {} removed, {} pruned",
            data.index.posts.len(), data.pages.len(), summary.written, summary.skipped, summary.removed, summary.pruned);

        Ok(summary)
    }

    /// Reconciles one changed file and rebuilds. `None` when no loader owns
    /// `path`.
    pub fn parse_single_file(&mut self, path: &Path, event: FileEvent) -> Result<Option<BuildSummary>, BuildError> {
        let Some(loader) = self.loaders.iter_mut().find(|l| path.starts_with(l.path())) else {
            debug!("Ignoring change outside the source directories: {}", path.display());
            return Ok(None);
        };

        let summary = loader
            .single_file_on_change(&mut self.store, path, event)
            .map_err(|e| BuildError::io(path, e))?;
        debug!("{} {:?} in {}: {:?}", path.display(), event, loader.name(), summary);
        self.removed += summary.removed;
        loader.export(&mut self.content);

        self.generate().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::reporter::MemoryReporter;

    use super::*;

    #[test]
    fn test_generate_with_templates() {
        let dir = tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        let paths = &config.paths;
        fs::create_dir_all(&paths.posts_dir).unwrap();
        fs::create_dir_all(&paths.templates_dir).unwrap();
        fs::create_dir_all(paths.static_dir.join("css")).unwrap();
        fs::write(paths.posts_dir.join("hello.md"),
            "---\ntitle: Hello\ndate: 2024-01-02 10:00\ntags: [intro]\ncategories: [news]\n---\nHi there\n").unwrap();
        fs::write(paths.templates_dir.join("post.html"), "<h1>{{title}}</h1>{{{content}}}").unwrap();
        fs::write(paths.templates_dir.join("index.html"), "{{#post_list}}{{title}};{{/post_list}}").unwrap();
        fs::write(paths.templates_dir.join("tag.html"), "tag {{title}}").unwrap();
        fs::write(paths.static_dir.join("css").join("site.css"), "body {}").unwrap();

        let reporter = Arc::new(MemoryReporter::new());
        let renderer = Box::new(TemplateRenderer::new(reporter.clone()));
        let mut site = Site::new(config.clone(), false, renderer, reporter.clone()).unwrap();
        let summary = site.generate().unwrap();

        let publish = &config.paths.publish_dir;
        let post = fs::read_to_string(publish.join("2024/01/02/hello/index.html")).unwrap();
        assert!(post.starts_with("<h1>Hello</h1>"));
        assert_eq!(fs::read_to_string(publish.join("index.html")).unwrap(), "Hello;");
        assert_eq!(fs::read_to_string(publish.join("tags/intro/index.html")).unwrap(), "tag intro");
        assert_eq!(fs::read_to_string(publish.join("css/site.css")).unwrap(), "body {}");
        assert_eq!(summary, BuildSummary { written: 4, skipped: 0, removed: 0, pruned: 0 });

        // category.html is not there
        assert_eq!(reporter.reports(), [(ReportKind::MissingTemplate, "category.html".to_string())]);
        assert!(config.paths.db_path.is_file());
    }

    #[test]
    fn test_parse_single_file() {
        let dir = tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        fs::create_dir_all(&config.paths.templates_dir).unwrap();
        fs::write(config.paths.templates_dir.join("post.html"), "{{title}}").unwrap();

        let reporter = Arc::new(MemoryReporter::new());
        let renderer = Box::new(TemplateRenderer::new(reporter.clone()));
        let mut site = Site::new(config.clone(), false, renderer, reporter).unwrap();
        site.generate().unwrap();

        fs::create_dir_all(&config.paths.posts_dir).unwrap();
        let path = config.paths.posts_dir.join("new.md");
        fs::write(&path, "---\ntitle: New\ndate: 2024-05-06\n---\n").unwrap();

        let summary = site.parse_single_file(&path, FileEvent::Created).unwrap().unwrap();
        assert_eq!(summary.written, 1);
        assert_eq!(site.content().posts.len(), 1);
        assert!(config.paths.publish_dir.join("2024/05/06/new/index.html").is_file());

        let elsewhere = dir.path().join("notes.md");
        assert_eq!(site.parse_single_file(&elsewhere, FileEvent::Created).unwrap(), None);
    }
}
