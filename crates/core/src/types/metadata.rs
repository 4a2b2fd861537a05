//! Filename guesses and embedded document metadata

use serde::{Deserialize, Serialize};

/// What the filename says about a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedNameGuess {
    pub authors: Vec<String>,
    pub title: String,
    pub series: Option<String>,
    /// `"{volume}.{chapter}"`, or whichever of the two is present
    pub series_index: Option<String>,
}

/// Metadata as currently embedded in a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub series: Option<String>,
    pub series_index: Option<String>,
}

impl DocumentMetadata {
    /// Title, if present and not blank
    pub fn title(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    /// Authors with blank entries removed
    pub fn authors(&self) -> Vec<String> {
        self.authors
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn series(&self) -> Option<&str> {
        non_blank(self.series.as_deref())
    }

    pub fn series_index(&self) -> Option<&str> {
        non_blank(self.series_index.as_deref())
    }

    /// Applies an update on top of this metadata
    pub fn apply(&mut self, update: &MetadataUpdate) {
        if let Some(title) = &update.title {
            self.title = Some(title.clone());
        }
        if let Some(authors) = &update.authors {
            self.authors = authors.clone();
        }
        if let Some(series) = &update.series {
            self.series = Some(series.clone());
        }
        if let Some(index) = &update.series_index {
            self.series_index = Some(index.clone());
        }
    }
}

/// Fields to write into a document; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataUpdate {
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub series: Option<String>,
    pub series_index: Option<String>,
}

impl MetadataUpdate {
    /// True when nothing would be written
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.authors.is_none()
            && self.series.is_none()
            && self.series_index.is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
