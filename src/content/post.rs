use std::fmt;
use std::fmt::{Display, Formatter};
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::content::body::render_body;
use crate::content::front_matter::FrontMatter;
use crate::content::{index_path_for_url, Model, ParseContext, ValidationError, RECORD_VERSION};
use crate::text_utils::slugify;

pub const DEFAULT_PERMALINK: &str = "/:year/:month/:day/:slug/";

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub filename: String,
    pub title: String,
    pub slug: String,
    pub pub_time: NaiveDateTime,
    pub author: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub url: String,
    pub raw: String,
    pub rendered: String,
    pub excerpt: String,
}

impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "file={}, date={}, url={}\ntitle={}\ncategories={:?}, tags={:?}",
               self.filename,
               self.pub_time,
               self.url,
               self.title,
               self.categories,
               self.tags,
        )
    }
}

/// Persisted form of a [`Post`]. Everything that feeds rendering or digests
/// is in here; the filename is the record key.
#[derive(Debug, Serialize, Deserialize)]
pub struct PostRecord {
    pub version: u32,
    pub title: String,
    pub slug: String,
    pub pub_time: NaiveDateTime,
    #[serde(default)]
    pub author: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub url: String,
    pub raw: String,
    pub rendered: String,
    pub excerpt: String,
}

impl Model for Post {
    const TABLE: &'static str = "posts";
    const EXTENSIONS: Option<&'static [&'static str]> = Some(&["md", "markdown", "mkd"]);

    type Record = PostRecord;

    fn filename(&self) -> &str {
        &self.filename
    }

    fn parse(raw: &str, filename: &str, ctx: &ParseContext) -> Result<Post, ValidationError> {
        let (front_matter, body) = FrontMatter::parse(raw, filename)?;
        if front_matter.draft {
            return Err(ValidationError::Draft { file: filename.to_string() });
        }

        let title = front_matter.required_title(filename)?;
        let pub_time = front_matter.required_date(filename)?;
        let slug = derive_slug(front_matter.slug.as_deref(), &title, filename)?;
        let url = expand_permalink(&ctx.permalink, &pub_time, &slug);

        let rendered = render_body(body).map_err(|reason| ValidationError::InvalidBody {
            file: filename.to_string(),
            reason,
        })?;

        Ok(Post {
            filename: filename.to_string(),
            title,
            slug,
            pub_time,
            author: front_matter.author,
            categories: front_matter.categories,
            tags: front_matter.tags,
            url,
            raw: body.to_string(),
            rendered: rendered.html,
            excerpt: rendered.excerpt,
        })
    }

    fn to_record(&self) -> PostRecord {
        PostRecord {
            version: RECORD_VERSION,
            title: self.title.clone(),
            slug: self.slug.clone(),
            pub_time: self.pub_time,
            author: self.author.clone(),
            categories: self.categories.clone(),
            tags: self.tags.clone(),
            url: self.url.clone(),
            raw: self.raw.clone(),
            rendered: self.rendered.clone(),
            excerpt: self.excerpt.clone(),
        }
    }

    fn from_record(filename: &str, record: PostRecord, ctx: &ParseContext) -> Option<Post> {
        if record.version != RECORD_VERSION {
            return None;
        }
        // The permalink pattern changed since the record was written
        if expand_permalink(&ctx.permalink, &record.pub_time, &record.slug) != record.url {
            return None;
        }

        Some(Post {
            filename: filename.to_string(),
            title: record.title,
            slug: record.slug,
            pub_time: record.pub_time,
            author: record.author,
            categories: record.categories,
            tags: record.tags,
            url: record.url,
            raw: record.raw,
            rendered: record.rendered,
            excerpt: record.excerpt,
        })
    }

    fn output_path(&self) -> Option<String> {
        Some(index_path_for_url(&self.url))
    }
}

/// Explicit slug when given, then the title, then the file name.
pub(crate) fn derive_slug(explicit: Option<&str>, title: &str, filename: &str) -> Result<String, ValidationError> {
    let file_stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    [explicit.unwrap_or_default(), title, file_stem]
        .into_iter()
        .map(slugify)
        .find(|slug| !slug.is_empty())
        .ok_or_else(|| ValidationError::MissingField { file: filename.to_string(), field: "slug" })
}

/// Applies `:year`, `:month`, `:day` and `:slug` to a permalink pattern.
/// The result always starts and ends with `/`.
pub fn expand_permalink(pattern: &str, pub_time: &NaiveDateTime, slug: &str) -> String {
    let expanded = pattern
        .replace(":year", &pub_time.format("%Y").to_string())
        .replace(":month", &pub_time.format("%m").to_string())
        .replace(":day", &pub_time.format("%d").to_string())
        .replace(":slug", slug);

    let trimmed = expanded.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use crate::content::{parse_from_cache, serialize};
    use crate::test_data::{POST_DATA, POST_WITHOUT_DATE};

    use super::*;

    fn ctx() -> ParseContext {
        ParseContext::new("source/posts", DEFAULT_PERMALINK)
    }

    #[test]
    fn test_parse() {
        let post = Post::parse(POST_DATA, "2022-04-02-what-i-learned.md", &ctx()).unwrap();
        println!("{}", post);

        assert_eq!(post.title, "What I learned after 20+ years of software development");
        assert_eq!(post.slug, "what-i-learned");
        assert_eq!(post.url, "/2022/04/02/what-i-learned/");
        assert_eq!(post.pub_time, NaiveDateTime::new(
            NaiveDate::from_ymd_opt(2022, 4, 2).unwrap(),
            NaiveTime::from_hms_opt(12, 5, 0).unwrap(),
        ));
        assert_eq!(post.categories, ["career"]);
        assert_eq!(post.tags, ["rust", "craft"]);
        assert!(post.rendered.contains("<h2>Non technical</h2>"));
        assert!(post.excerpt.contains("How to be a great software engineer?"));
        assert!(!post.excerpt.contains("Non technical"));
        assert_eq!(post.output_path().as_deref(), Some("2022/04/02/what-i-learned/index.html"));
    }

    #[test]
    fn test_slug_from_title() {
        let raw = "---\ntitle: Café com Rust!\ndate: 2024-01-02 10:00\n---\nbody\n";
        let post = Post::parse(raw, "x.md", &ctx()).unwrap();
        assert_eq!(post.slug, "cafe-com-rust");
        assert_eq!(post.url, "/2024/01/02/cafe-com-rust/");
    }

    #[test]
    fn test_slug_is_stable() {
        let a = Post::parse(POST_DATA, "a.md", &ctx()).unwrap();
        let b = Post::parse(POST_DATA, "a.md", &ctx()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_posts() {
        let err = Post::parse(POST_WITHOUT_DATE, "no-date.md", &ctx()).unwrap_err();
        assert_eq!(err, ValidationError::MissingField { file: "no-date.md".to_string(), field: "date" });

        let raw = "---\ntitle: t\ndate: 2024-02-30\n---\n";
        assert!(matches!(Post::parse(raw, "x.md", &ctx()), Err(ValidationError::InvalidDate { .. })));

        let raw = "---\ntitle: t\ndate: 2024-02-03\ndraft: true\n---\n";
        assert_eq!(Post::parse(raw, "x.md", &ctx()), Err(ValidationError::Draft { file: "x.md".to_string() }));
    }

    #[test]
    fn test_cache_round_trip() {
        let post = Post::parse(POST_DATA, "2022-04-02-what-i-learned.md", &ctx()).unwrap();
        let value = serialize(&post).unwrap();
        let cached: Post = parse_from_cache("2022-04-02-what-i-learned.md", &value, &ctx()).unwrap();
        assert_eq!(cached, post);
    }

    #[test]
    fn test_outdated_record_is_rejected() {
        let post = Post::parse(POST_DATA, "a.md", &ctx()).unwrap();
        let mut value = serialize(&post).unwrap();
        value["version"] = serde_json::json!(RECORD_VERSION + 1);
        assert!(parse_from_cache::<Post>("a.md", &value, &ctx()).is_none());

        assert!(parse_from_cache::<Post>("a.md", &serde_json::json!({"title": "x"}), &ctx()).is_none());
    }

    #[test]
    fn test_record_with_old_permalink_is_rejected() {
        let post = Post::parse(POST_DATA, "a.md", &ctx()).unwrap();
        let value = serialize(&post).unwrap();

        let moved = ParseContext::new("source/posts", "/blog/:slug/");
        assert!(parse_from_cache::<Post>("a.md", &value, &moved).is_none());
        assert!(parse_from_cache::<Post>("a.md", &value, &ctx()).is_some());
    }

    #[test]
    fn test_expand_permalink() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(expand_permalink("/:year/:month/:day/:slug/", &date, "x"), "/2024/03/09/x/");
        assert_eq!(expand_permalink("posts/:slug", &date, "x"), "/posts/x/");
        assert_eq!(expand_permalink("", &date, "x"), "/");
    }
}
