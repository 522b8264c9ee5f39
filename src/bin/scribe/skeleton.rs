use std::fmt::Write;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use chrono::NaiveDateTime;

use scribe::text_utils::slugify;

/// Real name of the OS user, or the login name when it is not set.
pub(crate) fn get_name() -> String {
    let name = whoami::realname();
    if name.trim().is_empty() {
        return whoami::username();
    }
    name
}

fn yaml_scalar(value: &str) -> String {
    match serde_yaml::to_string(value) {
        Ok(s) => s.trim_end().to_string(),
        Err(_) => format!("{:?}", value),
    }
}

pub(crate) fn render_post(title: &str, author: &str, date: &NaiveDateTime) -> String {
    let mut buf = String::new();

    let _ = writeln!(&mut buf, "---");
    let _ = writeln!(&mut buf, "title: {}", yaml_scalar(title));
    let _ = writeln!(&mut buf, "date: {}", date.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(&mut buf, "author: {}", yaml_scalar(author));
    let _ = writeln!(&mut buf, "categories: []");
    let _ = writeln!(&mut buf, "tags: []");
    let _ = writeln!(&mut buf, "---");
    let _ = writeln!(&mut buf);
    let _ = writeln!(&mut buf, "This is a body example");
    let _ = writeln!(&mut buf, "Please remove it and replace with your content");
    let _ = writeln!(&mut buf);
    let _ = writeln!(&mut buf, "<!-- more -->");
    let _ = writeln!(&mut buf);
    let _ = writeln!(&mut buf, "And this is the rest of your post");

    buf
}

pub(crate) fn render_page(title: &str, url: &str, description: Option<&str>) -> String {
    let mut buf = String::new();

    let _ = writeln!(&mut buf, "---");
    let _ = writeln!(&mut buf, "title: {}", yaml_scalar(title));
    let _ = writeln!(&mut buf, "url: {}", yaml_scalar(url));
    if let Some(description) = description {
        let _ = writeln!(&mut buf, "description: {}", yaml_scalar(description));
    }
    let _ = writeln!(&mut buf, "---");
    let _ = writeln!(&mut buf);
    let _ = writeln!(&mut buf, "Page content goes here");

    buf
}

/// `2024-01-02-my-title.md`
pub(crate) fn post_file_name(title: &str, date: &NaiveDateTime) -> String {
    format!("{}-{}.md", date.format("%Y-%m-%d"), slugify(title))
}

pub(crate) fn page_file_name(title: &str) -> String {
    format!("{}.md", slugify(title))
}

/// Writes a new source file, refusing to replace an existing one.
pub(crate) fn create_source(path: &Path, content: &str) -> io::Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(content.as_bytes())
}
