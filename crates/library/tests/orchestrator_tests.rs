//! Batch, push and poll behaviour of the orchestrator

use shelfwatch_config::DiscoveryMode;
use shelfwatch_core::{DocumentMetadata, EbookFormat, MetadataUpdate};
use shelfwatch_library::{
    BatchReport, IngestOptions, LibraryError, LibraryResult, MemoryMetadataStore, MetadataStore, Orchestrator,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Store that records how many reads overlap and fails on request
struct SlowStore {
    inner: MemoryMetadataStore,
    current: AtomicUsize,
    peak: AtomicUsize,
    delay: Duration,
}

impl SlowStore {
    fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryMetadataStore::new(),
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            delay,
        }
    }
}

impl MetadataStore for SlowStore {
    fn read(&self, path: &Path) -> LibraryResult<DocumentMetadata> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.current.fetch_sub(1, Ordering::SeqCst);
        self.inner.read(path)
    }

    fn write(&self, path: &Path, update: &MetadataUpdate) -> LibraryResult<()> {
        self.inner.write(path, update)
    }

    fn supports(&self, format: EbookFormat) -> bool {
        format.carries_metadata()
    }
}

fn setup() -> LibraryResult<(TempDir, PathBuf)> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new()?;
    let root = dir.path().to_path_buf();
    Ok((dir, root))
}

fn options(root: &Path) -> IngestOptions {
    IngestOptions::new(root).with_stability_wait(Duration::ZERO)
}

async fn wait_for(path: &Path, limit: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if path.is_file() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    path.is_file()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_batch_respects_worker_limit() -> LibraryResult<()> {
    let (_dir, root) = setup()?;
    let store = Arc::new(SlowStore::new(Duration::from_millis(50)));
    let orchestrator = Orchestrator::new(options(&root).with_max_workers(2), store.clone());
    orchestrator.prepare()?;

    for i in 0..8 {
        fs::write(root.join(format!("books/Author {i} - Title {i}.epub")), b"x")?;
    }

    let report = orchestrator.scan_once().await?;

    assert_eq!(
        report,
        BatchReport {
            relocated: 8,
            skipped: 0,
            failed: 0
        }
    );
    assert!(store.peak.load(Ordering::SeqCst) <= 2);
    assert!(store.peak.load(Ordering::SeqCst) >= 1);
    for i in 0..8 {
        assert!(root
            .join(format!("books/Title {i}/Author {i} - Title {i}.epub"))
            .is_file());
    }
    Ok(())
}

#[tokio::test]
async fn test_one_bad_file_does_not_stop_the_batch() -> LibraryResult<()> {
    let (_dir, root) = setup()?;
    let store = Arc::new(MemoryMetadataStore::new());
    let orchestrator = Orchestrator::new(options(&root), store.clone());
    orchestrator.prepare()?;

    fs::write(root.join("books/Good - One.epub"), b"1")?;
    fs::write(root.join("books/Good - Two.epub"), b"2")?;
    fs::write(root.join("books/untitled.epub"), b"3")?;
    fs::write(root.join("books/Broken - Three.epub"), b"4")?;
    store.fail_on(root.join("books/Broken - Three.epub"));

    let report = orchestrator.scan_once().await?;

    assert_eq!(report.relocated, 2);
    assert_eq!(report.failed, 2);
    assert_eq!(report.total(), 4);
    assert!(root.join("books/untitled.epub").is_file());
    assert!(root.join("books/Broken - Three.epub").is_file());
    Ok(())
}

#[tokio::test]
async fn test_prepare_creates_enabled_folders_only() -> LibraryResult<()> {
    let (_dir, root) = setup()?;
    let orchestrator = Orchestrator::new(options(&root), Arc::new(MemoryMetadataStore::new()));

    orchestrator.prepare()?;

    assert!(root.join("books").is_dir());
    assert!(!root.join("mangas").exists());
    Ok(())
}

#[tokio::test]
async fn test_prepare_fails_when_root_is_a_file() -> LibraryResult<()> {
    let (_dir, root) = setup()?;
    let blocker = root.join("not-a-dir");
    fs::write(&blocker, b"")?;
    let orchestrator = Orchestrator::new(options(&blocker), Arc::new(MemoryMetadataStore::new()));

    assert!(matches!(orchestrator.prepare(), Err(LibraryError::Filesystem { .. })));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_push_mode_sweeps_then_follows_events() -> LibraryResult<()> {
    let (_dir, root) = setup()?;
    let orchestrator = Arc::new(Orchestrator::new(
        options(&root).with_discovery(DiscoveryMode::Push),
        Arc::new(MemoryMetadataStore::new()),
    ));
    orchestrator.prepare()?;
    fs::write(root.join("books/Early - Bird.epub"), b"early")?;

    let shutdown = CancellationToken::new();
    let runner = {
        let orchestrator = Arc::clone(&orchestrator);
        let shutdown = shutdown.clone();
        tokio::spawn(async move { orchestrator.run(shutdown).await })
    };

    assert!(wait_for(&root.join("books/Bird/Early - Bird.epub"), Duration::from_secs(5)).await);

    // Renamed in from outside so the event carries a complete file
    let staging = root.join("staging.epub");
    fs::write(&staging, b"late")?;
    fs::rename(&staging, root.join("books/Late - Arrival.epub"))?;

    assert!(wait_for(&root.join("books/Arrival/Late - Arrival.epub"), Duration::from_secs(5)).await);

    shutdown.cancel();
    runner
        .await
        .map_err(|e| LibraryError::Other(e.to_string()))??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_poll_mode_picks_up_new_files() -> LibraryResult<()> {
    let (_dir, root) = setup()?;
    let orchestrator = Arc::new(Orchestrator::new(
        options(&root)
            .with_discovery(DiscoveryMode::Poll)
            .with_poll_interval(Duration::from_millis(50)),
        Arc::new(MemoryMetadataStore::new()),
    ));
    orchestrator.prepare()?;

    let shutdown = CancellationToken::new();
    let runner = {
        let orchestrator = Arc::clone(&orchestrator);
        let shutdown = shutdown.clone();
        tokio::spawn(async move { orchestrator.run(shutdown).await })
    };

    fs::write(root.join("books/Jane Doe - My Book.epub"), b"book")?;
    assert!(wait_for(&root.join("books/My Book/Jane Doe - My Book.epub"), Duration::from_secs(5)).await);

    shutdown.cancel();
    runner
        .await
        .map_err(|e| LibraryError::Other(e.to_string()))??;
    Ok(())
}

#[tokio::test]
async fn test_cancelled_run_returns_promptly() -> LibraryResult<()> {
    let (_dir, root) = setup()?;
    let orchestrator = Orchestrator::new(
        options(&root)
            .with_discovery(DiscoveryMode::Poll)
            .with_poll_interval(Duration::from_secs(3600)),
        Arc::new(MemoryMetadataStore::new()),
    );
    orchestrator.prepare()?;

    let shutdown = CancellationToken::new();
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(5), orchestrator.run(shutdown))
        .await
        .map_err(|e| LibraryError::Other(e.to_string()))??;
    Ok(())
}
