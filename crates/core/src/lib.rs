//! Shelfwatch core domain types
//!
//! Plain data shared by the configuration and ingestion crates. Nothing in
//! here touches the filesystem except [`SourceFile::from_path`].

pub mod error;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use types::{
    split_extension, CanonicalTarget, DocumentMetadata, EbookFormat, MediaKind, MetadataUpdate,
    ParsedNameGuess, SourceFile,
};
