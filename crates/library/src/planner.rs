//! Canonical destination layout and collision handling

use crate::error::{LibraryError, LibraryResult};
use crate::merge::MergedMetadata;
use shelfwatch_config::{CollisionPolicy, MangaLayout};
use shelfwatch_core::{split_extension, CanonicalTarget, MediaKind};
use std::path::{Path, PathBuf};

/// Upper bound on `" (n)"` suffixes tried before giving up
const MAX_SUFFIX: u32 = 9_999;

/// Where a file ends up once collisions are accounted for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// The source already sits at its canonical path
    AlreadyInPlace,
    /// Free path, nothing to replace
    Free(PathBuf),
    /// Existing file that will be overwritten
    Replace(PathBuf),
}

/// Computes canonical destinations under the library root
#[derive(Debug, Clone)]
pub struct PathPlanner {
    root: PathBuf,
    books_dir: String,
    mangas_dir: String,
    manga_layout: MangaLayout,
    collision_policy: CollisionPolicy,
}

impl PathPlanner {
    pub fn new(root: impl Into<PathBuf>, books_dir: impl Into<String>, mangas_dir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            books_dir: books_dir.into(),
            mangas_dir: mangas_dir.into(),
            manga_layout: MangaLayout::Nested,
            collision_policy: CollisionPolicy::Suffix,
        }
    }

    pub fn with_manga_layout(mut self, layout: MangaLayout) -> Self {
        self.manga_layout = layout;
        self
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Canonical folder and file name for a document.
    ///
    /// Books: `{root}/{books}/{title}/{authors} - {title}{ext}`, or just
    /// `{title}{ext}` when no author is known. Mangas (nested):
    /// `{root}/{mangas}/{series}/{series} - {title}{ext}`; flat:
    /// `{root}/{series}/{title}{ext}`.
    pub fn plan(&self, kind: MediaKind, merged: &MergedMetadata, extension: &str) -> CanonicalTarget {
        let title = path_component(&merged.title);

        match kind {
            MediaKind::Book => {
                let folder = self.root.join(&self.books_dir).join(&title);
                let file_name = if merged.authors.is_empty() {
                    format!("{title}{extension}")
                } else {
                    let authors = path_component(&merged.authors.join(", "));
                    format!("{authors} - {title}{extension}")
                };
                CanonicalTarget::new(folder, file_name)
            }
            MediaKind::Manga => {
                let series = path_component(merged.series.as_deref().unwrap_or(&merged.title));
                match self.manga_layout {
                    MangaLayout::Nested => CanonicalTarget::new(
                        self.root.join(&self.mangas_dir).join(&series),
                        format!("{series} - {title}{extension}"),
                    ),
                    MangaLayout::Flat => {
                        CanonicalTarget::new(self.root.join(&series), format!("{title}{extension}"))
                    }
                }
            }
        }
    }

    /// Applies the collision policy to `desired` for a file at `source`.
    ///
    /// Callers hold the destination lock for `desired` so the answer stays
    /// valid until the move.
    pub async fn resolve_collision(&self, source: &Path, desired: PathBuf) -> LibraryResult<Placement> {
        if is_same_file(source, &desired).await {
            return Ok(Placement::AlreadyInPlace);
        }
        if !exists(&desired).await? {
            return Ok(Placement::Free(desired));
        }

        match self.collision_policy {
            CollisionPolicy::Fail => Err(LibraryError::DestinationExists(desired)),
            CollisionPolicy::Overwrite => Ok(Placement::Replace(desired)),
            CollisionPolicy::Suffix => {
                let folder = desired.parent().map(Path::to_path_buf).unwrap_or_default();
                let file_name = desired
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();
                let (stem, extension) = split_extension(&file_name);

                for n in 1..=MAX_SUFFIX {
                    let candidate = folder.join(format!("{stem} ({n}){extension}"));
                    if is_same_file(source, &candidate).await {
                        return Ok(Placement::AlreadyInPlace);
                    }
                    if !exists(&candidate).await? {
                        return Ok(Placement::Free(candidate));
                    }
                }
                Err(LibraryError::DestinationExists(desired))
            }
        }
    }
}

/// Keeps a metadata value from escaping its folder
fn path_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

async fn exists(path: &Path) -> LibraryResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| LibraryError::filesystem(path, e))
}

async fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
