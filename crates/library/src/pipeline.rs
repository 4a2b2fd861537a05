//! The per-file ingestion flow
//!
//! stability gate -> filename parse -> optional conversion -> type guard ->
//! metadata read -> merge -> plan -> destination lock -> move -> metadata
//! write. Any failure before the move leaves the file where it was. Manga
//! archives are moved without the metadata steps when no converter is set.

use crate::convert::Converter;
use crate::error::{LibraryError, LibraryResult};
use crate::locks::{InFlight, PathLocks};
use crate::merge::merge;
use crate::metadata::MetadataStore;
use crate::parser::parse_name;
use crate::planner::{PathPlanner, Placement};
use crate::relocate::relocate;
use crate::stability::is_stable;
use crate::IngestOptions;
use log::{debug, error, info, warn};
use shelfwatch_core::{DocumentMetadata, MediaKind, MetadataUpdate, SourceFile};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Why a file was left alone without it being an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Still being written, or gone
    Unstable,
    /// Manga file name does not follow the convention
    NameMismatch,
    /// Format without embedded metadata, and not a manga archive to file as is
    NotAnEbook,
    /// Another pipeline owns the file
    AlreadyInFlight,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unstable => write!(f, "file is still changing"),
            Self::NameMismatch => write!(f, "file name does not match the naming convention"),
            Self::NotAnEbook => write!(f, "not an ebook format"),
            Self::AlreadyInFlight => write!(f, "already being processed"),
        }
    }
}

/// How a pipeline run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Relocated {
        from: PathBuf,
        to: PathBuf,
        /// False when nothing needed writing or the write failed
        metadata_written: bool,
    },
    Skipped(SkipReason),
}

/// Shared per-file processing, cheap to call from many tasks
pub struct Pipeline {
    planner: PathPlanner,
    store: Arc<dyn MetadataStore>,
    converter: Option<Converter>,
    stability_wait: Duration,
    locks: PathLocks,
    in_flight: InFlight,
}

impl Pipeline {
    pub fn new(options: &IngestOptions, store: Arc<dyn MetadataStore>) -> Self {
        let planner = PathPlanner::new(&options.root, &options.books_dir, &options.mangas_dir)
            .with_manga_layout(options.manga_layout)
            .with_collision_policy(options.collision_policy);

        Self {
            planner,
            store,
            converter: options.conversion.clone().map(Converter::new),
            stability_wait: options.stability_wait,
            locks: PathLocks::new(),
            in_flight: InFlight::new(),
        }
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Runs one file through the whole flow
    pub async fn process(&self, mut source: SourceFile) -> LibraryResult<Outcome> {
        let Some(mut claim) = self.in_flight.try_claim(&source.path) else {
            debug!("Already processing {}", source.path.display());
            return Ok(Outcome::Skipped(SkipReason::AlreadyInFlight));
        };

        if !is_stable(&source.path, self.stability_wait).await {
            warn!("Skipping {}: file is still changing or gone", source.path.display());
            return Ok(Outcome::Skipped(SkipReason::Unstable));
        }

        let guess = parse_name(source.kind, &source.base_name);
        if guess.is_none() {
            match source.kind {
                MediaKind::Manga => {
                    info!(
                        "Skipping {}: expected \"Authors - Series - Title\"",
                        source.path.display()
                    );
                    return Ok(Outcome::Skipped(SkipReason::NameMismatch));
                }
                MediaKind::Book => info!(
                    "File name of {} does not match \"Authors - Title\", using embedded metadata",
                    source.path.display()
                ),
            }
        }

        if let Some(converter) = self.converter.as_ref() {
            if source.kind == MediaKind::Manga && Converter::should_convert(&source) {
                for output in Converter::expected_outputs(&source) {
                    if !claim.extend(&output) {
                        return Ok(Outcome::Skipped(SkipReason::AlreadyInFlight));
                    }
                }
                let produced = converter.convert(&source).await?;
                source = SourceFile::from_path(produced, source.kind)?;
            }
        }

        let document = if source.format().is_some_and(|f| self.store.supports(f)) {
            Some(self.read_metadata(&source.path).await?)
        } else if self.files_as_archive(&source) {
            debug!("Filing {} without touching its metadata", source.path.display());
            None
        } else {
            info!("Skipping {}: not an ebook", source.path.display());
            return Ok(Outcome::Skipped(SkipReason::NotAnEbook));
        };

        let empty = DocumentMetadata::default();
        let merged = merge(source.kind, guess.as_ref(), document.as_ref().unwrap_or(&empty))
            .ok_or_else(|| {
                LibraryError::metadata(&source.path, "no title in the file name or the document")
            })?;

        let target = self.planner.plan(source.kind, &merged, &source.extension);
        let _destination = self.locks.lock(&target.path()).await;

        let destination = match self
            .planner
            .resolve_collision(&source.path, target.path())
            .await?
        {
            Placement::AlreadyInPlace => source.path.clone(),
            Placement::Free(path) => {
                relocate(&source.path, &path).await?;
                path
            }
            Placement::Replace(path) => {
                warn!("Replacing existing {}", path.display());
                relocate(&source.path, &path).await?;
                path
            }
        };

        let metadata_written = if document.is_some() && merged.needs_write() {
            match self.write_metadata(&destination, merged.update.clone()).await {
                Ok(()) => true,
                Err(e) => {
                    error!(
                        "Moved {} but could not update its metadata: {}",
                        destination.display(),
                        e
                    );
                    false
                }
            }
        } else {
            false
        };

        info!(
            "Processed {}: {} -> {}",
            source.kind,
            source.path.display(),
            destination.display()
        );

        Ok(Outcome::Relocated {
            from: source.path,
            to: destination,
            metadata_written,
        })
    }

    /// Unconverted manga archives are filed as they are
    fn files_as_archive(&self, source: &SourceFile) -> bool {
        self.converter.is_none()
            && source.kind == MediaKind::Manga
            && source.format().is_some_and(|f| f.is_comic_archive())
    }

    async fn read_metadata(&self, path: &Path) -> LibraryResult<DocumentMetadata> {
        let store = Arc::clone(&self.store);
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || store.read(&path))
            .await
            .map_err(|e| LibraryError::Other(format!("Metadata task failed: {}", e)))?
    }

    async fn write_metadata(&self, path: &Path, update: MetadataUpdate) -> LibraryResult<()> {
        let store = Arc::clone(&self.store);
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || store.write(&path, &update))
            .await
            .map_err(|e| LibraryError::Other(format!("Metadata task failed: {}", e)))?
    }
}
