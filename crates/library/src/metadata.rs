//! Reading and writing embedded document metadata
//!
//! Stores are synchronous; the pipeline runs them on the blocking pool.

use crate::error::{LibraryError, LibraryResult};
use log::debug;
use shelfwatch_core::{DocumentMetadata, EbookFormat, MetadataUpdate};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

/// Access to the metadata embedded in ebook files
pub trait MetadataStore: Send + Sync {
    fn read(&self, path: &Path) -> LibraryResult<DocumentMetadata>;

    /// Writes the fields set in `update`, leaving the rest untouched
    fn write(&self, path: &Path, update: &MetadataUpdate) -> LibraryResult<()>;

    /// Whether documents of `format` can be handled at all
    fn supports(&self, format: EbookFormat) -> bool {
        format.carries_metadata()
    }
}

/// Metadata through calibre's `ebook-meta` command line tool
#[derive(Debug, Clone)]
pub struct EbookMetaStore {
    program: String,
    leading_args: Vec<String>,
}

impl EbookMetaStore {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Arguments placed before the document path on every call
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    fn run(&self, path: &Path, args: &[String]) -> LibraryResult<String> {
        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .arg(path)
            .args(args)
            .output()
            .map_err(|e| LibraryError::metadata(path, format!("Failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LibraryError::metadata(
                path,
                format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for EbookMetaStore {
    fn default() -> Self {
        Self::new("ebook-meta")
    }
}

impl MetadataStore for EbookMetaStore {
    fn read(&self, path: &Path) -> LibraryResult<DocumentMetadata> {
        let stdout = self.run(path, &[])?;
        Ok(parse_ebook_meta_output(&stdout))
    }

    fn write(&self, path: &Path, update: &MetadataUpdate) -> LibraryResult<()> {
        let args = ebook_meta_write_args(update);
        if args.is_empty() {
            return Ok(());
        }
        debug!("Writing metadata to {}: {:?}", path.display(), args);
        self.run(path, &args).map(|_| ())
    }
}

/// What calibre reports for a missing title or author
const CALIBRE_UNKNOWN: &str = "Unknown";

/// Parses the `Key : value` report printed by `ebook-meta <file>`.
///
/// calibre's `Unknown` placeholder reads as missing.
pub fn parse_ebook_meta_output(output: &str) -> DocumentMetadata {
    let mut metadata = DocumentMetadata::default();

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match key.trim() {
            "Title" if value != CALIBRE_UNKNOWN => metadata.title = Some(value.to_string()),
            "Author(s)" => {
                let authors: Vec<String> = value
                    .split(" & ")
                    .map(strip_sort_key)
                    .filter(|a| !a.is_empty())
                    .collect();
                if authors != [CALIBRE_UNKNOWN] {
                    metadata.authors = authors;
                }
            }
            "Series" => match value.rsplit_once(" #") {
                Some((series, index)) => {
                    metadata.series = Some(series.trim().to_string());
                    metadata.series_index = Some(index.trim().to_string());
                }
                None => metadata.series = Some(value.to_string()),
            },
            _ => {}
        }
    }

    metadata
}

/// `"Jane Doe [Doe, Jane]"` becomes `"Jane Doe"`
fn strip_sort_key(author: &str) -> String {
    let author = author.trim();
    match author.rfind(" [") {
        Some(at) if author.ends_with(']') => author[..at].trim().to_string(),
        _ => author.to_string(),
    }
}

fn ebook_meta_write_args(update: &MetadataUpdate) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(title) = &update.title {
        args.extend(["--title".to_string(), title.clone()]);
    }
    if let Some(authors) = &update.authors {
        args.extend(["--authors".to_string(), authors.join(" & ")]);
    }
    if let Some(series) = &update.series {
        args.extend(["--series".to_string(), series.clone()]);
    }
    if let Some(index) = &update.series_index {
        args.extend(["--index".to_string(), index.clone()]);
    }
    args
}

/// Keeps metadata in memory, keyed by path.
///
/// Unknown paths read as empty metadata. Useful for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    documents: Mutex<HashMap<PathBuf, DocumentMetadata>>,
    failing: Mutex<HashSet<PathBuf>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, metadata: DocumentMetadata) {
        lock(&self.documents).insert(path.into(), metadata);
    }

    pub fn get(&self, path: &Path) -> Option<DocumentMetadata> {
        lock(&self.documents).get(path).cloned()
    }

    /// Makes every read and write of `path` fail
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        lock(&self.failing).insert(path.into());
    }

    fn check(&self, path: &Path) -> LibraryResult<()> {
        if lock(&self.failing).contains(path) {
            return Err(LibraryError::metadata(path, "document is unreadable"));
        }
        Ok(())
    }
}

impl MetadataStore for MemoryMetadataStore {
    fn read(&self, path: &Path) -> LibraryResult<DocumentMetadata> {
        self.check(path)?;
        Ok(self.get(path).unwrap_or_default())
    }

    fn write(&self, path: &Path, update: &MetadataUpdate) -> LibraryResult<()> {
        self.check(path)?;
        lock(&self.documents)
            .entry(path.to_path_buf())
            .or_default()
            .apply(update);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
