//! Domain types for Shelfwatch
//!
//! - `format`: media kinds, ebook formats and extension handling
//! - `source`: files discovered in the watched tree
//! - `metadata`: filename guesses and embedded document metadata
//! - `target`: canonical destinations

mod format;
mod metadata;
mod source;
mod target;

pub use format::{split_extension, EbookFormat, MediaKind};
pub use metadata::{DocumentMetadata, MetadataUpdate, ParsedNameGuess};
pub use source::SourceFile;
pub use target::CanonicalTarget;
