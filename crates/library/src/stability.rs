//! Size-based "has the writer finished" check

use log::debug;
use std::path::Path;
use std::time::Duration;

/// Samples the size of `path` twice, `wait` apart.
///
/// Stable means both samples exist and agree. A file that vanishes or is
/// not a regular file is never stable.
pub async fn is_stable(path: &Path, wait: Duration) -> bool {
    let Some(first) = file_size(path).await else {
        debug!("Not a readable file: {}", path.display());
        return false;
    };

    tokio::time::sleep(wait).await;

    match file_size(path).await {
        Some(second) if second == first => true,
        Some(second) => {
            debug!(
                "Size of {} changed from {} to {} bytes",
                path.display(),
                first,
                second
            );
            false
        }
        None => {
            debug!("File disappeared while waiting: {}", path.display());
            false
        }
    }
}

async fn file_size(path: &Path) -> Option<u64> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    metadata.is_file().then(|| metadata.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_unchanged_file_is_stable() -> std::io::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("done.epub");
        std::fs::write(&path, b"finished")?;

        assert!(is_stable(&path, Duration::from_millis(20)).await);
        Ok(())
    }

    #[tokio::test]
    async fn test_growing_file_is_unstable() -> std::io::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("copying.epub");
        std::fs::write(&path, b"part")?;

        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let mut file = std::fs::OpenOptions::new().append(true).open(writer_path)?;
            file.write_all(b" two")
        });

        assert!(!is_stable(&path, Duration::from_millis(200)).await);
        writer.await.map_err(std::io::Error::other)??;
        Ok(())
    }

    #[tokio::test]
    async fn test_file_deleted_during_wait_is_unstable() -> std::io::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("moved-away.epub");
        std::fs::write(&path, b"content")?;

        let doomed = path.clone();
        let remover = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            std::fs::remove_file(doomed)
        });

        assert!(!is_stable(&path, Duration::from_millis(200)).await);
        remover.await.map_err(std::io::Error::other)??;
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_unstable() {
        assert!(!is_stable(Path::new("/nonexistent/shelfwatch.epub"), Duration::ZERO).await);
    }

    #[tokio::test]
    async fn test_directory_is_unstable() -> std::io::Result<()> {
        let dir = TempDir::new()?;
        assert!(!is_stable(dir.path(), Duration::ZERO).await);
        Ok(())
    }
}
