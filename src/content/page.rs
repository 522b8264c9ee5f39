use std::path::{Component, Path};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::content::body::render_markdown;
use crate::content::front_matter::FrontMatter;
use crate::content::post::derive_slug;
use crate::content::{index_path_for_url, Model, ParseContext, ValidationError, RECORD_VERSION};

pub const DEFAULT_LAYOUT: &str = "page.html";

/// A standalone page published at its own URL (`/about/`), outside the post
/// list and indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub filename: String,
    pub title: String,
    pub slug: String,
    pub url: String,
    pub layout: String,
    pub description: Option<String>,
    pub pub_time: Option<NaiveDateTime>,
    pub raw: String,
    pub rendered: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PageRecord {
    pub version: u32,
    pub title: String,
    pub slug: String,
    pub url: String,
    pub layout: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pub_time: Option<NaiveDateTime>,
    pub raw: String,
    pub rendered: String,
}

impl Model for Page {
    const TABLE: &'static str = "pages";
    const EXTENSIONS: Option<&'static [&'static str]> = Some(&["md", "markdown", "mkd"]);

    type Record = PageRecord;

    fn filename(&self) -> &str {
        &self.filename
    }

    fn parse(raw: &str, filename: &str, _ctx: &ParseContext) -> Result<Page, ValidationError> {
        let (front_matter, body) = FrontMatter::parse(raw, filename)?;

        let title = front_matter.required_title(filename)?;
        let pub_time = front_matter.optional_date(filename)?;
        let slug = derive_slug(front_matter.slug.as_deref(), &title, filename)?;
        let url = match front_matter.url {
            Some(ref url) if !url.trim().is_empty() => normalize_url(url, filename)?,
            _ => format!("/{}/", slug),
        };
        let layout = front_matter.layout.clone().unwrap_or_else(|| DEFAULT_LAYOUT.to_string());

        let rendered = render_markdown(body).map_err(|reason| ValidationError::InvalidBody {
            file: filename.to_string(),
            reason,
        })?;

        Ok(Page {
            filename: filename.to_string(),
            title,
            slug,
            url,
            layout,
            description: front_matter.description,
            pub_time,
            raw: body.to_string(),
            rendered,
        })
    }

    fn to_record(&self) -> PageRecord {
        PageRecord {
            version: RECORD_VERSION,
            title: self.title.clone(),
            slug: self.slug.clone(),
            url: self.url.clone(),
            layout: self.layout.clone(),
            description: self.description.clone(),
            pub_time: self.pub_time,
            raw: self.raw.clone(),
            rendered: self.rendered.clone(),
        }
    }

    fn from_record(filename: &str, record: PageRecord, _ctx: &ParseContext) -> Option<Page> {
        if record.version != RECORD_VERSION {
            return None;
        }

        Some(Page {
            filename: filename.to_string(),
            title: record.title,
            slug: record.slug,
            url: record.url,
            layout: record.layout,
            description: record.description,
            pub_time: record.pub_time,
            raw: record.raw,
            rendered: record.rendered,
        })
    }

    fn output_path(&self) -> Option<String> {
        Some(index_path_for_url(&self.url))
    }
}

/// Only plain path segments are allowed, so the output stays under the
/// publish directory.
fn normalize_url(url: &str, filename: &str) -> Result<String, ValidationError> {
    let trimmed = url.trim().trim_matches('/');
    if !Path::new(trimmed).components().all(|c| matches!(c, Component::Normal(_))) || trimmed.contains('\\') {
        return Err(ValidationError::InvalidUrl { file: filename.to_string(), url: url.to_string() });
    }

    let url = if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.ends_with(".html") || trimmed.ends_with(".htm") {
        format!("/{}", trimmed)
    } else {
        format!("/{}/", trimmed)
    };
    Ok(url)
}
