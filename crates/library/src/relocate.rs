//! Moving files into place without leaving partial copies behind

use crate::error::{LibraryError, LibraryResult};
use log::debug;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

/// Moves `source` to `destination`, creating the destination folder.
///
/// Same-filesystem moves are a single rename. Across filesystems the data
/// goes to a temporary file next to the destination which is then renamed
/// over it, so the destination path never holds a partial file.
pub async fn relocate(source: &Path, destination: &Path) -> LibraryResult<()> {
    if let Some(folder) = destination.parent() {
        tokio::fs::create_dir_all(folder)
            .await
            .map_err(|e| LibraryError::filesystem(folder, e))?;
    }

    match tokio::fs::rename(source, destination).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(
                "Cross-device move, copying {} to {}",
                source.display(),
                destination.display()
            );
            let source = source.to_path_buf();
            let destination = destination.to_path_buf();
            tokio::task::spawn_blocking(move || copy_then_remove(&source, &destination))
                .await
                .map_err(|e| LibraryError::Other(format!("Copy task failed: {}", e)))?
        }
        Err(e) => Err(LibraryError::filesystem(source, e)),
    }
}

fn copy_then_remove(source: &Path, destination: &Path) -> LibraryResult<()> {
    let folder = destination.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(folder).map_err(|e| LibraryError::filesystem(folder, e))?;

    let mut input = std::fs::File::open(source).map_err(|e| LibraryError::filesystem(source, e))?;
    io::copy(&mut input, temp.as_file_mut()).map_err(|e| LibraryError::filesystem(destination, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| LibraryError::filesystem(destination, e))?;

    temp.persist(destination)
        .map_err(|e| LibraryError::filesystem(destination, e.error))?;

    std::fs::remove_file(source).map_err(|e| LibraryError::filesystem(source, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_relocate_creates_folders() -> LibraryResult<()> {
        let dir = TempDir::new()?;
        let source = dir.path().join("A - T.epub");
        std::fs::write(&source, b"content")?;

        let destination = dir.path().join("books/T/A - T.epub");
        relocate(&source, &destination).await?;

        assert!(!source.exists());
        assert_eq!(std::fs::read(&destination)?, b"content");
        Ok(())
    }

    #[tokio::test]
    async fn test_relocate_replaces_existing_file() -> LibraryResult<()> {
        let dir = TempDir::new()?;
        let source = dir.path().join("new.epub");
        let destination = dir.path().join("old.epub");
        std::fs::write(&source, b"new")?;
        std::fs::write(&destination, b"old")?;

        relocate(&source, &destination).await?;
        assert_eq!(std::fs::read(&destination)?, b"new");
        Ok(())
    }

    #[test]
    fn test_copy_fallback_leaves_no_temp_files() -> LibraryResult<()> {
        let dir = TempDir::new()?;
        let source = dir.path().join("src.epub");
        let target_dir = dir.path().join("out");
        std::fs::create_dir(&target_dir)?;
        std::fs::write(&source, b"payload")?;

        let destination = target_dir.join("dst.epub");
        copy_then_remove(&source, &destination)?;

        assert!(!source.exists());
        assert_eq!(std::fs::read(&destination)?, b"payload");
        assert_eq!(std::fs::read_dir(&target_dir)?.count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_source_is_filesystem_error() -> LibraryResult<()> {
        let dir = TempDir::new()?;
        let result = relocate(&dir.path().join("gone.epub"), &dir.path().join("x/y.epub")).await;
        assert!(matches!(result, Err(LibraryError::Filesystem { .. })));
        Ok(())
    }
}
