use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;

use crate::content::{index_path_for_url, Model, StaticFile};
use crate::paginator::Paginator;
use crate::reporter::{ReportKind, Reporter};
use crate::site::SiteData;
use crate::text_utils::slugify;

use list_renderer::{index_page_url, ListRenderer};
use post_renderer::PostRenderer;

pub mod list_renderer;
pub mod post_renderer;

pub const POST_TEMPLATE: &str = "post.html";
pub const INDEX_TEMPLATE: &str = "index.html";
pub const TAG_TEMPLATE: &str = "tag.html";
pub const CATEGORY_TEMPLATE: &str = "category.html";
pub const ARCHIVE_TEMPLATE: &str = "archive.html";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template {name}: {reason}")]
    Template { name: String, reason: String },
    #[error("render failed: {0}")]
    Failed(String),
}

#[derive(Debug, Default)]
pub struct RenderOutput {
    /// Output path relative to the publish directory, and its bytes.
    pub content_map: BTreeMap<String, Vec<u8>>,
    pub static_files: Vec<StaticFile>,
}

pub trait Renderer {
    fn run(&self, data: &SiteData) -> Result<RenderOutput, RenderError>;
}

pub fn tag_url(name: &str) -> String {
    format!("/tags/{}/", slugify(name))
}

pub fn category_url(name: &str) -> String {
    format!("/categories/{}/", slugify(name))
}

pub fn archive_url(year: i32, month: u32) -> String {
    format!("/archives/{:04}/{:02}/", year, month)
}

/// Renders with the ramhorns templates the template loader found. A missing
/// or broken template is reported and only its outputs are skipped.
pub struct TemplateRenderer {
    reporter: Arc<dyn Reporter>,
}

impl TemplateRenderer {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        TemplateRenderer { reporter }
    }

    fn source<'d>(&self, sources: &HashMap<&str, &'d str>, name: &str, required: bool) -> Option<&'d str> {
        let source = sources.get(name).copied();
        if source.is_none() && required {
            self.reporter.report(ReportKind::MissingTemplate, name);
        }
        source
    }

    fn compiled<T>(&self, compiled: Result<T, RenderError>) -> Option<T> {
        match compiled {
            Ok(renderer) => Some(renderer),
            Err(e) => {
                self.reporter.report(ReportKind::MissingTemplate, &e.to_string());
                None
            }
        }
    }

    fn post_renderer<'d>(&self, sources: &HashMap<&str, &'d str>, name: &str) -> Option<PostRenderer<'d>> {
        let source = self.source(sources, name, true)?;
        self.compiled(PostRenderer::new(name, source))
    }

    fn list_renderer<'d>(&self, sources: &HashMap<&str, &'d str>, name: &str, required: bool) -> Option<ListRenderer<'d>> {
        let source = self.source(sources, name, required)?;
        self.compiled(ListRenderer::new(name, source))
    }
}

impl Renderer for TemplateRenderer {
    fn run(&self, data: &SiteData) -> Result<RenderOutput, RenderError> {
        let sources: HashMap<&str, &str> = data.templates.iter().map(|t| (t.name.as_str(), t.source.as_str())).collect();
        let index = &data.index;
        let site = &data.site;
        let mut content_map = BTreeMap::new();

        if !index.posts.is_empty() {
            if let Some(renderer) = self.post_renderer(&sources, POST_TEMPLATE) {
                for post in &index.posts {
                    if let Some(path) = post.output_path() {
                        content_map.insert(path, renderer.render_post(site, post).into_bytes());
                    }
                }
            }
        }

        let mut layouts: HashMap<&str, Option<PostRenderer>> = HashMap::new();
        for page in &data.pages {
            let renderer = layouts
                .entry(page.layout.as_str())
                .or_insert_with(|| self.post_renderer(&sources, &page.layout));
            if let (Some(renderer), Some(path)) = (renderer, page.output_path()) {
                content_map.insert(path, renderer.render_page(site, page).into_bytes());
            }
        }

        if let Some(renderer) = self.list_renderer(&sources, INDEX_TEMPLATE, true) {
            let paginator = Paginator::from(&index.posts, index.page_size);
            let page_total = paginator.rendered_pages();
            for page in 1..=page_total {
                let Ok(posts) = paginator.get_page(page) else {
                    continue;
                };
                let rendered = renderer.render_index(site, posts.iter(), page, page_total);
                content_map.insert(index_path_for_url(&index_page_url(page)), rendered.into_bytes());
            }
        }

        if !index.tags.is_empty() {
            if let Some(renderer) = self.list_renderer(&sources, TAG_TEMPLATE, true) {
                for tag in index.tags.values() {
                    let rendered = renderer.render_listing(site, &tag.name, index.posts_of(&tag.posts));
                    content_map.insert(index_path_for_url(&tag_url(&tag.name)), rendered.into_bytes());
                }
            }
        }

        if !index.categories.is_empty() {
            if let Some(renderer) = self.list_renderer(&sources, CATEGORY_TEMPLATE, true) {
                for category in index.categories.values() {
                    let rendered = renderer.render_listing(site, &category.name, index.posts_of(&category.posts));
                    content_map.insert(index_path_for_url(&category_url(&category.name)), rendered.into_bytes());
                }
            }
        }

        // Month archives are rendered only by themes that ship a template
        if let Some(renderer) = self.list_renderer(&sources, ARCHIVE_TEMPLATE, false) {
            for archive in &index.archives {
                let title = format!("{:04}-{:02}", archive.year, archive.month);
                let rendered = renderer.render_listing(site, &title, index.posts_of(&archive.posts));
                content_map.insert(index_path_for_url(&archive_url(archive.year, archive.month)), rendered.into_bytes());
            }
        }

        Ok(RenderOutput {
            content_map,
            static_files: data.static_files.clone(),
        })
    }
}
