//! Shelfwatch ingestion engine
//!
//! Picks up ebooks and mangas dropped into a watched tree, works out their
//! canonical title/author/series from the file name (falling back to the
//! embedded metadata), moves them into a canonical folder layout and fills
//! in missing embedded metadata.
//!
//! Per-file flow: stability gate, filename parse, optional conversion, type
//! guard, metadata merge, path planning, atomic move, metadata write. The
//! [`Orchestrator`] feeds files into that flow from filesystem events or a
//! periodic listing, with a fixed upper bound on files in flight.

pub mod convert;
pub mod error;
pub mod locks;
pub mod merge;
pub mod metadata;
pub mod orchestrator;
pub mod parser;
pub mod pipeline;
pub mod planner;
pub mod relocate;
pub mod scanner;
pub mod stability;

pub use convert::{Converter, ConverterOptions};
pub use error::{LibraryError, LibraryResult};
pub use locks::{InFlight, PathLocks};
pub use merge::{merge, MergedMetadata};
pub use metadata::{EbookMetaStore, MemoryMetadataStore, MetadataStore};
pub use orchestrator::{BatchReport, Orchestrator};
pub use parser::{parse_book_name, parse_manga_name, parse_name};
pub use pipeline::{Outcome, Pipeline, SkipReason};
pub use planner::{PathPlanner, Placement};
pub use scanner::{LibraryScanner, ScanEvent, ScanTarget};
pub use stability::is_stable;

use shelfwatch_config::{CollisionPolicy, Config, DiscoveryMode, MangaLayout};
use shelfwatch_core::MediaKind;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings for the ingestion engine
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Root of the watched tree
    pub root: PathBuf,
    pub books_dir: String,
    pub mangas_dir: String,
    pub book_monitoring: bool,
    pub manga_monitoring: bool,
    pub discovery: DiscoveryMode,
    pub poll_interval: Duration,
    pub stability_wait: Duration,
    /// Upper bound on pipelines running at the same time
    pub max_workers: usize,
    pub collision_policy: CollisionPolicy,
    pub manga_layout: MangaLayout,
    /// Lowercase extensions without the leading dot
    pub book_extensions: Vec<String>,
    /// Empty accepts every file
    pub manga_extensions: Vec<String>,
    /// `None` disables conversion
    pub conversion: Option<ConverterOptions>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for IngestOptions {
    fn from(config: &Config) -> Self {
        let watch = &config.watch;
        let conversion = config.conversion.is_enabled().then(|| {
            ConverterOptions::from_option_string(&config.conversion.program, &config.conversion.options)
                .with_timeout(
                    (config.conversion.timeout_secs > 0)
                        .then(|| Duration::from_secs(config.conversion.timeout_secs)),
                )
                .with_remove_source(config.conversion.remove_source)
        });

        Self {
            root: watch.root.clone(),
            books_dir: watch.books_dir.clone(),
            mangas_dir: watch.mangas_dir.clone(),
            book_monitoring: watch.book_monitoring,
            manga_monitoring: watch.manga_monitoring,
            discovery: watch.discovery,
            poll_interval: Duration::from_secs(watch.poll_interval_secs),
            stability_wait: Duration::from_secs(watch.stability_wait_secs),
            max_workers: watch.max_workers.max(1),
            collision_policy: watch.collision_policy,
            manga_layout: watch.manga_layout,
            book_extensions: normalize_extensions(&watch.book_extensions),
            manga_extensions: normalize_extensions(&watch.manga_extensions),
            conversion,
        }
    }
}

impl IngestOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn with_books(mut self, enabled: bool) -> Self {
        self.book_monitoring = enabled;
        self
    }

    pub fn with_mangas(mut self, enabled: bool) -> Self {
        self.manga_monitoring = enabled;
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryMode) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_stability_wait(mut self, wait: Duration) -> Self {
        self.stability_wait = wait;
        self
    }

    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.max(1);
        self
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    pub fn with_manga_layout(mut self, layout: MangaLayout) -> Self {
        self.manga_layout = layout;
        self
    }

    pub fn with_conversion(mut self, conversion: Option<ConverterOptions>) -> Self {
        self.conversion = conversion;
        self
    }

    /// Watched folder for `kind`
    pub fn kind_dir(&self, kind: MediaKind) -> PathBuf {
        match kind {
            MediaKind::Book => self.root.join(&self.books_dir),
            MediaKind::Manga => self.root.join(&self.mangas_dir),
        }
    }

    pub fn is_enabled(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Book => self.book_monitoring,
            MediaKind::Manga => self.manga_monitoring,
        }
    }

    /// Kinds that are monitored, in a stable order
    pub fn enabled_kinds(&self) -> Vec<MediaKind> {
        MediaKind::all()
            .into_iter()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }

    /// Discovery targets for the enabled kinds
    pub fn scan_targets(&self) -> Vec<ScanTarget> {
        self.enabled_kinds()
            .into_iter()
            .map(|kind| {
                let extensions = match kind {
                    MediaKind::Book => self.book_extensions.clone(),
                    MediaKind::Manga => self.manga_extensions.clone(),
                };
                ScanTarget::new(self.kind_dir(kind), kind, extensions)
            })
            .collect()
    }
}

fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
