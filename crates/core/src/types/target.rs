//! Canonical destinations computed from merged metadata

use std::path::PathBuf;

/// Where a file should end up
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalTarget {
    pub folder: PathBuf,
    pub file_name: String,
}

impl CanonicalTarget {
    pub fn new(folder: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            file_name: file_name.into(),
        }
    }

    /// Full destination path
    pub fn path(&self) -> PathBuf {
        self.folder.join(&self.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_joins_folder_and_name() {
        let target = CanonicalTarget::new("/ebooks/books/My Book", "Jane Doe - My Book.epub");
        assert_eq!(
            target.path(),
            PathBuf::from("/ebooks/books/My Book/Jane Doe - My Book.epub")
        );
    }
}
