use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{fs, io};

/// Source files under one content directory, keyed by their path relative
/// to that directory (always `/`-separated).
pub struct SourceList {
    pub root_dir: PathBuf,
    pub extensions: Option<&'static [&'static str]>,
}

impl SourceList {
    /// Lists every regular file under `root_dir`, recursively. A missing
    /// directory simply has no sources.
    pub fn retrieve_files(&self) -> io::Result<BTreeMap<String, PathBuf>> {
        let mut files = BTreeMap::new();
        if !self.root_dir.is_dir() {
            return Ok(files);
        }
        self.walk(&self.root_dir, &mut files)?;
        Ok(files)
    }

    /// The key `path` would have in [`SourceList::retrieve_files`], if it
    /// lives under `root_dir` and passes the filters.
    pub fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root_dir).ok()?;
        if relative.components().any(|c| is_ignored(&c.as_os_str().to_string_lossy())) {
            return None;
        }
        if !self.accepts(path) {
            return None;
        }
        to_key(relative)
    }

    fn walk(&self, dir: &Path, files: &mut BTreeMap<String, PathBuf>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            if is_ignored(&file_name.to_string_lossy()) {
                continue;
            }

            let file_type = entry.file_type()?;
            let path = entry.path();
            if file_type.is_dir() {
                self.walk(&path, files)?;
            } else if file_type.is_file() && self.accepts(&path) {
                if let Some(key) = path.strip_prefix(&self.root_dir).ok().and_then(to_key) {
                    files.insert(key, path);
                }
            }
        }
        Ok(())
    }

    fn accepts(&self, path: &Path) -> bool {
        match self.extensions {
            None => true,
            Some(extensions) => path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| extensions.iter().any(|x| x.eq_ignore_ascii_case(ext))),
        }
    }
}

fn to_key(relative: &Path) -> Option<String> {
    let parts: Option<Vec<&str>> = relative.iter().map(|p| p.to_str()).collect();
    let parts = parts?;
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Hidden files and editor leftovers never count as sources.
pub(crate) fn is_ignored(name: &str) -> bool {
    name.starts_with('.')
        || name.ends_with('~')
        || name.ends_with(".swp")
        || name.ends_with(".swo")
        || name.ends_with(".tmp")
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_retrieve_files() -> io::Result<()> {
        let dir = tempdir()?;
        let root = dir.path();
        fs::create_dir_all(root.join("2024").join(".git"))?;
        fs::write(root.join("hello.md"), "x")?;
        fs::write(root.join("2024").join("deep.markdown"), "x")?;
        fs::write(root.join("2024").join(".git").join("HEAD.md"), "x")?;
        fs::write(root.join("notes.txt"), "x")?;
        fs::write(root.join(".hidden.md"), "x")?;
        fs::write(root.join("hello.md~"), "x")?;

        let list = SourceList { root_dir: root.to_path_buf(), extensions: Some(&["md", "markdown"]) };
        let files = list.retrieve_files()?;
        let keys: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(keys, ["2024/deep.markdown", "hello.md"]);
        assert_eq!(files["hello.md"], root.join("hello.md"));

        let all = SourceList { root_dir: root.to_path_buf(), extensions: None };
        assert_eq!(all.retrieve_files()?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_missing_dir_is_empty() -> io::Result<()> {
        let dir = tempdir()?;
        let list = SourceList { root_dir: dir.path().join("nope"), extensions: None };
        assert!(list.retrieve_files()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_key_for() {
        let list = SourceList { root_dir: PathBuf::from("/site/posts"), extensions: Some(&["md"]) };
        assert_eq!(list.key_for(Path::new("/site/posts/a/b.md")), Some("a/b.md".to_string()));
        assert_eq!(list.key_for(Path::new("/site/posts/a/b.txt")), None);
        assert_eq!(list.key_for(Path::new("/site/pages/b.md")), None);
        assert_eq!(list.key_for(Path::new("/site/posts/.b.md")), None);
    }
}
