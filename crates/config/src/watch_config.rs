//! Watched tree, discovery and placement settings

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// How new files are discovered
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// Filesystem notifications, one pipeline per created file
    Push,
    /// Periodic listing of the watched folders, processed in batches
    Poll,
}

impl FromStr for DiscoveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "push" | "watch" | "events" => Ok(Self::Push),
            "poll" | "scan" => Ok(Self::Poll),
            other => Err(format!("unknown discovery mode '{}'", other)),
        }
    }
}

impl std::fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Push => write!(f, "push"),
            Self::Poll => write!(f, "poll"),
        }
    }
}

/// What to do when the canonical destination already exists
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Leave the source in place and report an error
    Fail,
    /// Replace the existing file
    Overwrite,
    /// Append ` (1)`, ` (2)`, ... to the file name
    Suffix,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "overwrite" => Ok(Self::Overwrite),
            "suffix" | "rename" => Ok(Self::Suffix),
            other => Err(format!("unknown collision policy '{}'", other)),
        }
    }
}

/// Folder layout for mangas
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MangaLayout {
    /// `{root}/{mangas}/{series}/{series} - {title}{ext}`
    Nested,
    /// `{root}/{series}/{title}{ext}`
    Flat,
}

impl FromStr for MangaLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nested" => Ok(Self::Nested),
            "flat" => Ok(Self::Flat),
            other => Err(format!("unknown manga layout '{}'", other)),
        }
    }
}

/// Watched tree and ingestion settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    /// Root of the watched tree
    pub root: PathBuf,

    /// Subfolder receiving books
    pub books_dir: String,

    /// Subfolder receiving mangas
    pub mangas_dir: String,

    /// Process files dropped into the books folder
    pub book_monitoring: bool,

    /// Process files dropped into the mangas folder
    pub manga_monitoring: bool,

    pub discovery: DiscoveryMode,

    /// Seconds between two listings in poll mode
    pub poll_interval_secs: u64,

    /// Seconds between the two size samples of the stability check
    pub stability_wait_secs: u64,

    /// Upper bound on files processed at the same time
    pub max_workers: usize,

    pub collision_policy: CollisionPolicy,

    pub manga_layout: MangaLayout,

    /// Extensions picked up from the books folder (compound ones allowed)
    pub book_extensions: Vec<String>,

    /// Extensions picked up from the mangas folder; empty accepts every file
    pub manga_extensions: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/ebooks"),
            books_dir: "books".to_string(),
            mangas_dir: "mangas".to_string(),
            book_monitoring: true,
            manga_monitoring: false,
            discovery: DiscoveryMode::Push,
            poll_interval_secs: 30,
            stability_wait_secs: 10,
            max_workers: 4,
            collision_policy: CollisionPolicy::Suffix,
            manga_layout: MangaLayout::Nested,
            book_extensions: vec![
                "epub".to_string(),
                "kepub.epub".to_string(),
                "mobi".to_string(),
                "azw3".to_string(),
                "pdf".to_string(),
            ],
            manga_extensions: Vec::new(),
        }
    }
}

impl WatchConfig {
    /// Folder watched for books
    pub fn books_path(&self) -> PathBuf {
        self.root.join(&self.books_dir)
    }

    /// Folder watched for mangas
    pub fn mangas_path(&self) -> PathBuf {
        self.root.join(&self.mangas_dir)
    }
}

impl ConfigSection for WatchConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::not_empty(&self.root.to_string_lossy(), &self.field("root")),
            Validator::plain_name(&self.books_dir, &self.field("books_dir")),
            Validator::plain_name(&self.mangas_dir, &self.field("mangas_dir")),
            Validator::in_range(self.poll_interval_secs, 1, 86_400, &self.field("poll_interval_secs")),
            Validator::in_range(self.stability_wait_secs, 0, 3_600, &self.field("stability_wait_secs")),
            Validator::in_range(self.max_workers, 1, 256, &self.field("max_workers")),
        ];

        if !self.book_monitoring && !self.manga_monitoring {
            results.push(Err(ValidationError::new(
                self.field("book_monitoring"),
                "at least one of book_monitoring or manga_monitoring must be enabled",
            )));
        }

        if self.books_dir == self.mangas_dir {
            results.push(Err(ValidationError::with_value(
                self.field("mangas_dir"),
                "must differ from books_dir",
                &self.mangas_dir,
            )));
        }

        if self.book_monitoring && self.book_extensions.is_empty() {
            results.push(Err(ValidationError::new(
                self.field("book_extensions"),
                "must list at least one extension when book_monitoring is enabled",
            )));
        }

        for (i, ext) in self.book_extensions.iter().enumerate() {
            results.push(Validator::not_empty(
                ext,
                &format!("{}[{}]", self.field("book_extensions"), i),
            ));
        }

        for (i, ext) in self.manga_extensions.iter().enumerate() {
            results.push(Validator::not_empty(
                ext,
                &format!("{}[{}]", self.field("manga_extensions"), i),
            ));
        }

        Validator::collect_errors(results)
    }

    fn section_name(&self) -> &'static str {
        "watch"
    }
}
