use std::collections::BTreeMap;

use chrono::Datelike;

use crate::content::Post;
use crate::paginator::page_count;
use crate::text_utils::slugify;

/// A category or a tag: a name and the posts filed under it, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub name: String,
    pub slug: String,
    pub posts: Vec<usize>,
}

pub type Category = Term;
pub type Tag = Term;

impl Term {
    fn new(name: &str) -> Term {
        Term {
            name: name.to_string(),
            slug: slugify(name),
            posts: vec![],
        }
    }

    fn push(&mut self, index: usize) {
        if self.posts.last() != Some(&index) {
            self.posts.push(index);
        }
    }
}

/// Posts of one month.
#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    pub year: i32,
    pub month: u32,
    pub posts: Vec<usize>,
}

#[derive(Debug, Default, Clone)]
pub struct SiteIndex {
    /// All posts, publish time descending. Equal times keep load order.
    pub posts: Vec<Post>,
    pub categories: BTreeMap<String, Category>,
    pub tags: BTreeMap<String, Tag>,
    /// Newest month first.
    pub archives: Vec<Archive>,
    pub page_size: usize,
    /// `posts.len() / page_size`, truncated.
    pub page_count: usize,
}

impl SiteIndex {
    pub fn posts_of<'a>(&'a self, indexes: &'a [usize]) -> impl Iterator<Item = &'a Post> + 'a {
        indexes.iter().filter_map(|&i| self.posts.get(i))
    }
}

pub fn collect(mut posts: Vec<Post>, page_size: usize) -> SiteIndex {
    // sort_by is stable
    posts.sort_by(|a, b| b.pub_time.cmp(&a.pub_time));

    let mut categories: BTreeMap<String, Category> = BTreeMap::new();
    let mut tags: BTreeMap<String, Tag> = BTreeMap::new();
    let mut archives: Vec<Archive> = vec![];

    for (index, post) in posts.iter().enumerate() {
        for name in &post.categories {
            categories.entry(name.clone()).or_insert_with(|| Term::new(name)).push(index);
        }
        for name in &post.tags {
            tags.entry(name.clone()).or_insert_with(|| Term::new(name)).push(index);
        }

        let (year, month) = (post.pub_time.year(), post.pub_time.month());
        match archives.last_mut() {
            Some(archive) if archive.year == year && archive.month == month => archive.posts.push(index),
            _ => archives.push(Archive { year, month, posts: vec![index] }),
        }
    }

    SiteIndex {
        page_count: page_count(posts.len(), page_size),
        posts,
        categories,
        tags,
        archives,
        page_size,
    }
}
