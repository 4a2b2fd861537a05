//! Combining the filename guess with embedded metadata
//!
//! The filename wins for the destination path. The document only receives
//! the fields it is missing.

use shelfwatch_core::{DocumentMetadata, MediaKind, MetadataUpdate, ParsedNameGuess};

/// Fields used to plan the destination, plus what to write back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub series: Option<String>,
    pub series_index: Option<String>,
    /// Fields missing from the document that will be filled in
    pub update: MetadataUpdate,
}

impl MergedMetadata {
    pub fn needs_write(&self) -> bool {
        !self.update.is_empty()
    }
}

/// Merges a filename guess with the document's current metadata.
///
/// Without a guess the document's own title and authors are used, and
/// `None` is returned when the document has no title either. Books never
/// carry series information.
pub fn merge(
    kind: MediaKind,
    guess: Option<&ParsedNameGuess>,
    document: &DocumentMetadata,
) -> Option<MergedMetadata> {
    let Some(guess) = guess else {
        let title = document.title()?.to_string();
        let (series, series_index) = match kind {
            MediaKind::Book => (None, None),
            MediaKind::Manga => (
                document.series().map(str::to_string),
                document.series_index().map(str::to_string),
            ),
        };
        return Some(MergedMetadata {
            title,
            authors: document.authors(),
            series,
            series_index,
            update: MetadataUpdate::default(),
        });
    };

    let mut update = MetadataUpdate::default();

    if document.title().is_none() {
        update.title = Some(guess.title.clone());
    }
    if document.authors().is_empty() && !guess.authors.is_empty() {
        update.authors = Some(guess.authors.clone());
    }

    let (series, series_index) = match kind {
        MediaKind::Book => (None, None),
        MediaKind::Manga => (guess.series.clone(), guess.series_index.clone()),
    };

    if document.series().is_none() {
        update.series = series.clone();
    }
    if document.series_index().is_none() {
        update.series_index = series_index.clone();
    }

    Some(MergedMetadata {
        title: guess.title.clone(),
        authors: guess.authors.clone(),
        series,
        series_index,
        update,
    })
}
