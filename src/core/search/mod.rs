//! # File Search Module
//!
//! Lists files under a directory whose names end with one of the requested
//! suffixes. Matching is a plain suffix comparison, not extension-aware:
//! `".jpg"` and `"jpg"` are different suffixes and the caller chooses which
//! to pass. Result order follows the underlying directory walk.

use crate::error::SearchError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Criteria for one file search
#[derive(Debug, Clone)]
pub struct FileSearchCriteria {
    pub src_dir: PathBuf,
    /// Suffix strings to match against file names
    pub file_extensions: Vec<String>,
    /// Descend into subdirectories
    pub recursive: bool,
}

/// Suffix-matching directory lister
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSearch;

impl FileSearch {
    pub fn new() -> Self {
        Self
    }

    pub fn search(&self, criteria: &FileSearchCriteria) -> Result<Vec<PathBuf>, SearchError> {
        let root = criteria.src_dir.as_path();

        if !root.is_dir() {
            return Err(SearchError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let mut walker = WalkDir::new(root);
        if !criteria.recursive {
            walker = walker.max_depth(1);
        }

        let mut result = Vec::new();

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                SearchError::ReadDirectory {
                    path,
                    source: e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
                }
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if criteria
                .file_extensions
                .iter()
                .any(|ext| name.ends_with(ext.as_str()))
            {
                result.push(entry.into_path());
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn criteria(dir: &Path, extensions: &[&str], recursive: bool) -> FileSearchCriteria {
        FileSearchCriteria {
            src_dir: dir.to_path_buf(),
            file_extensions: extensions.iter().map(|e| e.to_string()).collect(),
            recursive,
        }
    }

    #[test]
    fn finds_matching_suffixes_only() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.jpg"), b"x").unwrap();
        fs::write(temp.path().join("b.png"), b"x").unwrap();
        fs::write(temp.path().join("c.txt"), b"x").unwrap();

        let search = FileSearch::new();
        let found = search
            .search(&criteria(temp.path(), &[".jpg", ".png"], false))
            .unwrap();

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| {
            let name = p.file_name().unwrap().to_string_lossy();
            name.ends_with(".jpg") || name.ends_with(".png")
        }));
    }

    #[test]
    fn suffix_match_is_exact_string_suffix() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("photo.jpg"), b"x").unwrap();

        let search = FileSearch::new();

        // "jpg" without the dot also matches as a suffix of the name
        let found = search.search(&criteria(temp.path(), &["jpg"], false)).unwrap();
        assert_eq!(found.len(), 1);

        // But an unrelated suffix does not
        let found = search.search(&criteria(temp.path(), &[".jpeg"], false)).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn non_recursive_skips_subdirectories() {
        let temp = TempDir::new().unwrap();
        let sub = temp.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(temp.path().join("top.jpg"), b"x").unwrap();
        fs::write(sub.join("nested.jpg"), b"x").unwrap();

        let search = FileSearch::new();
        let found = search.search(&criteria(temp.path(), &[".jpg"], false)).unwrap();

        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("top.jpg"));
    }

    #[test]
    fn recursive_descends_into_subdirectories() {
        let temp = TempDir::new().unwrap();
        let sub = temp.path().join("sub/deeper");
        fs::create_dir_all(&sub).unwrap();
        fs::write(temp.path().join("top.jpg"), b"x").unwrap();
        fs::write(sub.join("nested.jpg"), b"x").unwrap();

        let search = FileSearch::new();
        let found = search.search(&criteria(temp.path(), &[".jpg"], true)).unwrap();

        assert_eq!(found.len(), 2);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let search = FileSearch::new();
        let result = search.search(&criteria(
            Path::new("/nonexistent/dir/12345"),
            &[".jpg"],
            false,
        ));
        assert!(matches!(result, Err(SearchError::NotADirectory { .. })));
    }
}
