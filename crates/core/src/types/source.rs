//! Files discovered in the watched tree

use crate::error::{CoreError, CoreResult};
use crate::types::{split_extension, EbookFormat, MediaKind};
use std::path::{Path, PathBuf};

/// A candidate file, from discovery until the pipeline finishes with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// File name with the extension stripped
    pub base_name: String,
    /// Extension including the leading dot, compound suffixes kept whole
    pub extension: String,
    /// Size in bytes when the file was discovered
    pub size: u64,
    pub kind: MediaKind,
}

impl SourceFile {
    /// Builds a source file without touching the filesystem
    pub fn new(path: impl Into<PathBuf>, kind: MediaKind, size: u64) -> CoreResult<Self> {
        let path = path.into();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CoreError::InvalidPath(path.clone()))?;

        let (base_name, extension) = split_extension(file_name);
        let base_name = base_name.to_string();
        let extension = extension.to_string();

        Ok(Self {
            path,
            base_name,
            extension,
            size,
            kind,
        })
    }

    /// Stats `path` and builds a source file with its current size
    pub fn from_path(path: impl Into<PathBuf>, kind: MediaKind) -> CoreResult<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path).map_err(|source| CoreError::Io {
            path: path.clone(),
            source,
        })?;

        if !metadata.is_file() {
            return Err(CoreError::NotAFile(path));
        }

        Self::new(path, kind, metadata.len())
    }

    /// File name including extension
    pub fn file_name(&self) -> String {
        format!("{}{}", self.base_name, self.extension)
    }

    /// Directory containing the file
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Detected format, if the extension is a known one
    pub fn format(&self) -> Option<EbookFormat> {
        EbookFormat::from_extension(&self.extension)
    }

    /// Returns a copy pointing at another file of the same kind
    pub fn relocated(&self, path: impl Into<PathBuf>) -> CoreResult<Self> {
        Self::new(path, self.kind, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_splits_compound_extension() {
        let source = SourceFile::new("/ebooks/mangas/A - B - C.kepub.epub", MediaKind::Manga, 10)
            .expect("valid path");
        assert_eq!(source.base_name, "A - B - C");
        assert_eq!(source.extension, ".kepub.epub");
        assert_eq!(source.format(), Some(EbookFormat::Kepub));
        assert_eq!(source.file_name(), "A - B - C.kepub.epub");
        assert_eq!(source.directory(), Path::new("/ebooks/mangas"));
    }

    #[test]
    fn test_new_rejects_path_without_file_name() {
        let result = SourceFile::new("/", MediaKind::Book, 0);
        assert!(matches!(result, Err(CoreError::InvalidPath(_))));
    }

    #[test]
    fn test_from_path_reads_size() -> CoreResult<()> {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("Jane Doe - Title.epub");
        std::fs::write(&path, vec![0u8; 42]).expect("write");

        let source = SourceFile::from_path(&path, MediaKind::Book)?;
        assert_eq!(source.size, 42);
        assert_eq!(source.kind, MediaKind::Book);
        Ok(())
    }

    #[test]
    fn test_from_path_rejects_directories_and_missing_files() {
        let dir = TempDir::new().expect("temp dir");
        assert!(matches!(
            SourceFile::from_path(dir.path(), MediaKind::Book),
            Err(CoreError::NotAFile(_))
        ));
        assert!(matches!(
            SourceFile::from_path(dir.path().join("gone.epub"), MediaKind::Book),
            Err(CoreError::Io { .. })
        ));
    }
}
