//! Media kinds and ebook format detection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Multi-part suffixes recognised as a single extension
const COMPOUND_EXTENSIONS: &[&str] = &[".kepub.epub"];

/// Which naming convention and destination tree a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Book,
    Manga,
}

impl MediaKind {
    /// Returns both kinds in a stable order
    pub fn all() -> [Self; 2] {
        [Self::Book, Self::Manga]
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Book => write!(f, "book"),
            Self::Manga => write!(f, "manga"),
        }
    }
}

/// File formats the pipeline knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EbookFormat {
    Epub,
    /// Kobo flavoured EPUB (`.kepub.epub`)
    Kepub,
    Mobi,
    Azw3,
    Pdf,
    Cbz,
    Cbr,
    Cb7,
}

impl EbookFormat {
    /// Detects format from an extension, with or without the leading dot
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "epub" => Some(Self::Epub),
            "kepub.epub" => Some(Self::Kepub),
            "mobi" => Some(Self::Mobi),
            "azw3" => Some(Self::Azw3),
            "pdf" => Some(Self::Pdf),
            "cbz" => Some(Self::Cbz),
            "cbr" => Some(Self::Cbr),
            "cb7" => Some(Self::Cb7),
            _ => None,
        }
    }

    /// Detects format from a file path, honouring compound extensions
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let (_, ext) = split_extension(name);
        Self::from_extension(ext)
    }

    /// Returns the canonical extension, without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Epub => "epub",
            Self::Kepub => "kepub.epub",
            Self::Mobi => "mobi",
            Self::Azw3 => "azw3",
            Self::Pdf => "pdf",
            Self::Cbz => "cbz",
            Self::Cbr => "cbr",
            Self::Cb7 => "cb7",
        }
    }

    /// True when the document's embedded metadata can be rewritten
    pub fn carries_metadata(&self) -> bool {
        matches!(
            self,
            Self::Epub | Self::Kepub | Self::Mobi | Self::Azw3 | Self::Pdf
        )
    }

    /// True for comic archives, which are only ever conversion inputs
    pub fn is_comic_archive(&self) -> bool {
        matches!(self, Self::Cbz | Self::Cbr | Self::Cb7)
    }

    /// Returns all known formats
    pub fn all() -> &'static [Self] {
        &[
            Self::Epub,
            Self::Kepub,
            Self::Mobi,
            Self::Azw3,
            Self::Pdf,
            Self::Cbz,
            Self::Cbr,
            Self::Cb7,
        ]
    }
}

impl fmt::Display for EbookFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Splits a file name into `(base name, extension)`.
///
/// The extension keeps its leading dot and original case. Known compound
/// suffixes such as `.kepub.epub` are kept whole. A name without a dot (or
/// with only a leading dot) has an empty extension.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    for compound in COMPOUND_EXTENSIONS {
        if file_name.len() <= compound.len() {
            continue;
        }
        let at = file_name.len() - compound.len();
        if file_name.is_char_boundary(at) && file_name[at..].eq_ignore_ascii_case(compound) {
            return file_name.split_at(at);
        }
    }

    match file_name.rfind('.') {
        Some(0) | None => (file_name, ""),
        Some(at) => file_name.split_at(at),
    }
}
