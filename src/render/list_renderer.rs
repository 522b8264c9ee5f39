use ramhorns::Template;

use crate::config::SiteInfo;
use crate::content::Post;
use crate::render::RenderError;
use crate::text_utils::format_date_time;

#[derive(ramhorns::Content)]
struct ListPage<'a> {
    site_title: &'a str,
    site_url: &'a str,
    title: &'a str,
    post_list: Vec<PostItem<'a>>,
    page_list: Vec<ViewPagination>,
    show_pagination: bool,
}

#[derive(ramhorns::Content)]
struct PostItem<'a> {
    date: String,
    time: String,
    link: &'a str,
    title: &'a str,
    summary: &'a str,
}

#[derive(ramhorns::Content)]
struct ViewPagination {
    current: bool,
    number: u32,
    url: String,
}

/// URL of an index page. Page 1 is the front page.
pub fn index_page_url(page: usize) -> String {
    if page <= 1 {
        "/".to_string()
    } else {
        format!("/page/{}/", page)
    }
}

/// Renders post lists: the paginated front index, and the per tag,
/// category and month listings.
pub struct ListRenderer<'a> {
    pub template: Template<'a>,
}

impl<'a> ListRenderer<'a> {
    pub fn new(name: &str, list_tpl_src: &'a str) -> Result<ListRenderer<'a>, RenderError> {
        let template = Template::new(list_tpl_src).map_err(|e| RenderError::Template {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        Ok(ListRenderer { template })
    }

    /// One index page out of `page_total`. Pagination links are only shown
    /// when there is more than one page.
    pub fn render_index<'p>(&self, site: &SiteInfo, posts: impl Iterator<Item = &'p Post>, cur_page: usize, page_total: usize) -> String {
        let page_list = (1..=page_total)
            .map(|i| ViewPagination {
                current: i == cur_page,
                number: i as u32,
                url: index_page_url(i),
            })
            .collect();

        self.render(site, &site.title, posts, page_list)
    }

    pub fn render_listing<'p>(&self, site: &SiteInfo, title: &str, posts: impl Iterator<Item = &'p Post>) -> String {
        self.render(site, title, posts, vec![])
    }

    fn render<'p>(&self, site: &SiteInfo, title: &str, posts: impl Iterator<Item = &'p Post>, page_list: Vec<ViewPagination>) -> String {
        let post_list = posts
            .map(|post| {
                let (date, time) = format_date_time(&post.pub_time);
                PostItem {
                    date,
                    time,
                    link: &post.url,
                    title: &post.title,
                    summary: &post.excerpt,
                }
            })
            .collect();

        self.template.render(&ListPage {
            site_title: &site.title,
            site_url: &site.url,
            title,
            post_list,
            show_pagination: page_list.len() > 1,
            page_list,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn post(title: &str, day: u32) -> Post {
        Post {
            filename: format!("{}.md", title),
            title: title.to_string(),
            slug: title.to_string(),
            pub_time: NaiveDate::from_ymd_opt(2024, 1, day).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            author: None,
            categories: vec![],
            tags: vec![],
            url: format!("/{}/", title),
            raw: String::new(),
            rendered: String::new(),
            excerpt: format!("<p>{}</p>", title),
        }
    }

    #[test]
    fn test_index_page_url() {
        assert_eq!(index_page_url(1), "/");
        assert_eq!(index_page_url(3), "/page/3/");
    }

    #[test]
    fn test_render_index() {
        let tpl = "{{#post_list}}[{{title}}|{{link}}|{{date}}|{{{summary}}}]{{/post_list}}\
{{#show_pagination}}{{#page_list}}({{number}}{{#current}}*{{/current}}{{url}}){{/page_list}}{{/show_pagination}}";
        let renderer = ListRenderer::new("index.html", tpl).unwrap();
        let posts = [post("a", 2), post("b", 1)];

        let res = renderer.render_index(&SiteInfo::default(), posts.iter(), 2, 2);
        assert_eq!(res, "[a|/a/|2024-01-02|<p>a</p>][b|/b/|2024-01-01|<p>b</p>](1/)(2*/page/2/)");

        let res = renderer.render_index(&SiteInfo::default(), posts.iter().take(1), 1, 1);
        assert_eq!(res, "[a|/a/|2024-01-02|<p>a</p>]");
    }

    #[test]
    fn test_render_listing() {
        let renderer = ListRenderer::new("tag.html", "<h1>{{title}}</h1>{{#post_list}}{{title}};{{/post_list}}").unwrap();
        let posts = [post("a", 2), post("b", 1)];
        assert_eq!(renderer.render_listing(&SiteInfo::default(), "rust", posts.iter()), "<h1>rust</h1>a;b;");
    }
}
