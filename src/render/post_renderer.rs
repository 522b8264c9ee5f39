use ramhorns::Template;

use crate::config::SiteInfo;
use crate::content::{Page, Post};
use crate::render::{category_url, tag_url, RenderError};
use crate::text_utils::format_date_time;

#[derive(ramhorns::Content)]
struct ViewTerm<'a> {
    name: &'a str,
    url: String,
}

#[derive(ramhorns::Content)]
struct ViewPost<'a> {
    site_title: &'a str,
    site_url: &'a str,
    title: &'a str,
    url: &'a str,
    author: &'a str,
    date: String,
    time: String,
    categories: Vec<ViewTerm<'a>>,
    tags: Vec<ViewTerm<'a>>,
    content: &'a str,
}

#[derive(ramhorns::Content)]
struct ViewPage<'a> {
    site_title: &'a str,
    site_url: &'a str,
    title: &'a str,
    url: &'a str,
    description: &'a str,
    date: String,
    content: &'a str,
}

/// Renders single documents: a post through `post.html`, a page through
/// its layout.
pub struct PostRenderer<'a> {
    pub template: Template<'a>,
}

impl<'a> PostRenderer<'a> {
    pub fn new(name: &str, view_tpl_src: &'a str) -> Result<PostRenderer<'a>, RenderError> {
        let template = Template::new(view_tpl_src).map_err(|e| RenderError::Template {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        Ok(PostRenderer { template })
    }

    pub fn render_post(&self, site: &SiteInfo, post: &Post) -> String {
        let (date, time) = format_date_time(&post.pub_time);
        self.template.render(&ViewPost {
            site_title: &site.title,
            site_url: &site.url,
            title: &post.title,
            url: &post.url,
            author: post.author.as_deref().unwrap_or_default(),
            date,
            time,
            categories: post.categories.iter().map(|c| ViewTerm { name: c, url: category_url(c) }).collect(),
            tags: post.tags.iter().map(|t| ViewTerm { name: t, url: tag_url(t) }).collect(),
            content: &post.rendered,
        })
    }

    pub fn render_page(&self, site: &SiteInfo, page: &Page) -> String {
        let date = page.pub_time.map(|d| format_date_time(&d).0).unwrap_or_default();
        self.template.render(&ViewPage {
            site_title: &site.title,
            site_url: &site.url,
            title: &page.title,
            url: &page.url,
            description: page.description.as_deref().unwrap_or_default(),
            date,
            content: &page.rendered,
        })
    }
}
