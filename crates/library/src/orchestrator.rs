//! Feeding discovered files through the pipeline
//!
//! The orchestrator owns the worker limit. Push mode sweeps the folders once
//! and then follows the watcher; poll mode lists the folders on an interval.
//! A failing file is logged and counted, never fatal to the loop.

use crate::error::{LibraryError, LibraryResult};
use crate::metadata::MetadataStore;
use crate::pipeline::{Outcome, Pipeline};
use crate::scanner::{LibraryScanner, ScanEvent};
use crate::IngestOptions;
use log::{debug, error, info, warn};
use shelfwatch_config::DiscoveryMode;
use shelfwatch_core::SourceFile;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Counts for one batch of files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub relocated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.relocated + self.skipped + self.failed
    }

    fn record(&mut self, result: Result<LibraryResult<Outcome>, JoinError>) {
        match result {
            Ok(Ok(Outcome::Relocated { .. })) => self.relocated += 1,
            Ok(Ok(Outcome::Skipped(_))) => self.skipped += 1,
            Ok(Err(e)) => {
                error!("{}", e);
                self.failed += 1;
            }
            Err(e) => {
                error!("Pipeline task failed: {}", e);
                self.failed += 1;
            }
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} relocated, {} skipped, {} failed",
            self.relocated, self.skipped, self.failed
        )
    }
}

pub struct Orchestrator {
    options: Arc<IngestOptions>,
    pipeline: Arc<Pipeline>,
    workers: Arc<Semaphore>,
}

impl Orchestrator {
    pub fn new(options: IngestOptions, store: Arc<dyn MetadataStore>) -> Self {
        let pipeline = Arc::new(Pipeline::new(&options, store));
        let workers = Arc::new(Semaphore::new(options.max_workers.max(1)));
        Self {
            options: Arc::new(options),
            pipeline,
            workers,
        }
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Creates the watched folders of the enabled kinds
    pub fn prepare(&self) -> LibraryResult<()> {
        for kind in self.options.enabled_kinds() {
            let dir = self.options.kind_dir(kind);
            std::fs::create_dir_all(&dir).map_err(|e| LibraryError::filesystem(&dir, e))?;
            debug!("Ensured {} folder {}", kind, dir.display());
        }
        Ok(())
    }

    pub fn scanner(&self) -> LibraryScanner {
        LibraryScanner::new(self.options.scan_targets())
    }

    /// Lists the watched folders once and processes what is there
    pub async fn scan_once(&self) -> LibraryResult<BatchReport> {
        let files = self.scanner().scan()?;
        Ok(self.run_batch(files).await)
    }

    /// Processes `files` with at most `max_workers` in flight
    pub async fn run_batch(&self, files: Vec<SourceFile>) -> BatchReport {
        self.run_batch_until(files, &CancellationToken::new()).await
    }

    async fn run_batch_until(&self, files: Vec<SourceFile>, shutdown: &CancellationToken) -> BatchReport {
        let mut report = BatchReport::default();
        if files.is_empty() {
            return report;
        }

        let mut tasks = JoinSet::new();
        for file in files {
            let Some(permit) = self.acquire(shutdown).await else {
                break;
            };
            self.spawn(&mut tasks, file, permit);
        }

        while let Some(result) = tasks.join_next().await {
            report.record(result);
        }

        info!("Batch finished: {}", report);
        report
    }

    /// Runs discovery until `shutdown` fires, then waits for in-flight files
    pub async fn run(&self, shutdown: CancellationToken) -> LibraryResult<()> {
        match self.options.discovery {
            DiscoveryMode::Push => self.run_push(shutdown).await,
            DiscoveryMode::Poll => self.run_poll(shutdown).await,
        }
    }

    async fn run_push(&self, shutdown: CancellationToken) -> LibraryResult<()> {
        let mut scanner = self.scanner();
        let mut events = scanner.start()?;
        let mut tasks = JoinSet::new();
        let mut report = BatchReport::default();

        // Files dropped before the watcher came up
        match scanner.scan() {
            Ok(files) => {
                info!("Startup sweep found {} files", files.len());
                for file in files {
                    let Some(permit) = self.acquire(&shutdown).await else {
                        break;
                    };
                    self.spawn(&mut tasks, file, permit);
                }
            }
            Err(e) => warn!("Startup sweep failed: {}", e),
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(ScanEvent::FileAdded(path, kind)) => match SourceFile::from_path(&path, kind) {
                        Ok(file) => {
                            let Some(permit) = self.acquire(&shutdown).await else {
                                break;
                            };
                            self.spawn(&mut tasks, file, permit);
                        }
                        Err(e) => debug!("Ignoring {}: {}", path.display(), e),
                    },
                    Some(ScanEvent::WatchError(e)) => warn!("Watcher reported: {}", e),
                    None => {
                        warn!("Watcher stopped unexpectedly");
                        break;
                    }
                },
                Some(result) = tasks.join_next(), if !tasks.is_empty() => report.record(result),
            }
        }

        scanner.stop();
        info!("Waiting for {} files in flight", tasks.len());
        while let Some(result) = tasks.join_next().await {
            report.record(result);
        }
        info!("Watcher finished: {}", report);
        Ok(())
    }

    async fn run_poll(&self, shutdown: CancellationToken) -> LibraryResult<()> {
        let mut ticker = tokio::time::interval(self.options.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let scanner = self.scanner();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match scanner.scan() {
                Ok(files) if files.is_empty() => debug!("Nothing to process"),
                Ok(files) => {
                    self.run_batch_until(files, &shutdown).await;
                }
                Err(e) => warn!("Scan failed: {}", e),
            }
        }

        info!("Polling stopped");
        Ok(())
    }

    /// Waits for a free worker slot, or `None` once shutdown starts
    async fn acquire(&self, shutdown: &CancellationToken) -> Option<OwnedSemaphorePermit> {
        tokio::select! {
            _ = shutdown.cancelled() => None,
            permit = Arc::clone(&self.workers).acquire_owned() => permit.ok(),
        }
    }

    fn spawn(
        &self,
        tasks: &mut JoinSet<LibraryResult<Outcome>>,
        file: SourceFile,
        permit: OwnedSemaphorePermit,
    ) {
        let pipeline = Arc::clone(&self.pipeline);
        tasks.spawn(async move {
            let _permit = permit;
            pipeline.process(file).await
        });
    }
}
