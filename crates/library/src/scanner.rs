//! Discovery of candidate files
//!
//! Two ways in: a one-shot listing of the watched folders, or a filesystem
//! watcher reporting files as they appear. Only the immediate contents of
//! each folder are considered; the canonical subfolders that files are
//! moved into are never revisited.

use crate::error::{LibraryError, LibraryResult};
use log::{debug, error, info, warn};
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Error as NotifyError, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use shelfwatch_core::{MediaKind, SourceFile};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use walkdir::WalkDir;

const CHANNEL_BUFFER_SIZE: usize = 256;

/// A watched folder and what it accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    pub dir: PathBuf,
    pub kind: MediaKind,
    /// Lowercase extensions without the leading dot; empty accepts all
    pub extensions: Vec<String>,
}

impl ScanTarget {
    pub fn new(dir: impl Into<PathBuf>, kind: MediaKind, extensions: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            kind,
            extensions,
        }
    }

    /// Whether a file directly inside this folder should be processed
    pub fn accepts(&self, path: &Path) -> bool {
        if path.parent() != Some(self.dir.as_path()) {
            return false;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if name.starts_with('.') {
            return false;
        }
        if self.extensions.is_empty() {
            return true;
        }

        let name = name.to_lowercase();
        self.extensions
            .iter()
            .any(|ext| name.strip_suffix(ext.as_str()).is_some_and(|rest| rest.len() > 1 && rest.ends_with('.')))
    }
}

/// Events emitted by the watcher
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// A file appeared in a watched folder
    FileAdded(PathBuf, MediaKind),
    /// The watcher reported an error
    WatchError(String),
}

/// Lists and watches the configured folders
pub struct LibraryScanner {
    targets: Vec<ScanTarget>,
    running: Arc<AtomicBool>,
    watcher: Option<RecommendedWatcher>,
}

impl LibraryScanner {
    pub fn new(targets: Vec<ScanTarget>) -> Self {
        Self {
            targets,
            running: Arc::new(AtomicBool::new(false)),
            watcher: None,
        }
    }

    pub fn targets(&self) -> &[ScanTarget] {
        &self.targets
    }

    /// Lists every accepted file currently sitting in the watched folders
    pub fn scan(&self) -> LibraryResult<Vec<SourceFile>> {
        let mut found = Vec::new();

        for target in &self.targets {
            if !target.dir.is_dir() {
                warn!("Watch folder does not exist: {}", target.dir.display());
                continue;
            }

            let walker = WalkDir::new(&target.dir)
                .min_depth(1)
                .max_depth(1)
                .follow_links(false)
                .sort_by_file_name();

            for entry in walker {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        warn!("Error listing {}: {}", target.dir.display(), e);
                        continue;
                    }
                };

                if !entry.file_type().is_file() || !target.accepts(entry.path()) {
                    continue;
                }

                match SourceFile::from_path(entry.path(), target.kind) {
                    Ok(source) => found.push(source),
                    Err(e) => debug!("Skipping {}: {}", entry.path().display(), e),
                }
            }
        }

        debug!("Scan found {} candidate files", found.len());
        Ok(found)
    }

    /// Starts watching the folders and returns the event stream
    pub fn start(&mut self) -> LibraryResult<mpsc::Receiver<ScanEvent>> {
        if self.is_running() {
            return Err(LibraryError::Watcher("Scanner is already running".to_string()));
        }

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let targets = self.targets.clone();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, NotifyError>| match res {
            Ok(event) => handle_fs_event(event, &tx, &targets),
            Err(e) => {
                error!("Watch error: {}", e);
                let _ = tx.blocking_send(ScanEvent::WatchError(e.to_string()));
            }
        })
        .map_err(|e| LibraryError::Watcher(format!("Failed to create watcher: {}", e)))?;

        for target in &self.targets {
            watcher
                .watch(&target.dir, RecursiveMode::NonRecursive)
                .map_err(|e| {
                    LibraryError::Watcher(format!("Failed to watch {}: {}", target.dir.display(), e))
                })?;
            info!("Watching {} for {}s", target.dir.display(), target.kind);
        }

        self.watcher = Some(watcher);
        self.running.store(true, Ordering::Relaxed);
        Ok(rx)
    }

    /// Stops the watcher; the event stream ends once drained
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        info!("Stopping file system watcher");
        self.running.store(false, Ordering::Relaxed);
        self.watcher = None;
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

fn handle_fs_event(event: Event, tx: &mpsc::Sender<ScanEvent>, targets: &[ScanTarget]) {
    let arrived = matches!(
        event.kind,
        EventKind::Create(CreateKind::File | CreateKind::Any)
            | EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Both | RenameMode::Any))
    );
    if !arrived {
        return;
    }

    for path in event.paths {
        if !path.is_file() {
            continue;
        }
        if let Some(target) = targets.iter().find(|t| t.accepts(&path)) {
            debug!("File added: {}", path.display());
            let _ = tx.blocking_send(ScanEvent::FileAdded(path, target.kind));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_target_accepts_by_extension() {
        let target = ScanTarget::new("/ebooks/books", MediaKind::Book, exts(&["epub", "kepub.epub", "pdf"]));

        assert!(target.accepts(Path::new("/ebooks/books/A - T.epub")));
        assert!(target.accepts(Path::new("/ebooks/books/A - T.KEPUB.EPUB")));
        assert!(!target.accepts(Path::new("/ebooks/books/A - T.txt")));
        assert!(!target.accepts(Path::new("/ebooks/books/.A - T.epub")));
        assert!(!target.accepts(Path::new("/ebooks/books/T/A - T.epub")));
        assert!(!target.accepts(Path::new("/ebooks/books/epub")));
    }

    #[test]
    fn test_empty_extension_list_accepts_everything() {
        let target = ScanTarget::new("/ebooks/mangas", MediaKind::Manga, Vec::new());
        assert!(target.accepts(Path::new("/ebooks/mangas/A - S - C.cbz")));
        assert!(target.accepts(Path::new("/ebooks/mangas/noext")));
        assert!(!target.accepts(Path::new("/ebooks/mangas/.partial")));
    }

    #[test]
    fn test_scan_lists_immediate_files_only() -> LibraryResult<()> {
        let dir = TempDir::new()?;
        let books = dir.path().join("books");
        fs::create_dir_all(books.join("Placed"))?;
        fs::write(books.join("A - One.epub"), b"1")?;
        fs::write(books.join("B - Two.pdf"), b"2")?;
        fs::write(books.join("notes.txt"), b"3")?;
        fs::write(books.join("Placed/C - Three.epub"), b"4")?;

        let scanner = LibraryScanner::new(vec![ScanTarget::new(&books, MediaKind::Book, exts(&["epub", "pdf"]))]);
        let found = scanner.scan()?;

        let names: Vec<String> = found.iter().map(|s| s.file_name()).collect();
        assert_eq!(names, vec!["A - One.epub", "B - Two.pdf"]);
        assert!(found.iter().all(|s| s.kind == MediaKind::Book));
        Ok(())
    }

    #[test]
    fn test_scan_tolerates_missing_folder() -> LibraryResult<()> {
        let scanner = LibraryScanner::new(vec![ScanTarget::new("/nonexistent/shelfwatch", MediaKind::Book, Vec::new())]);
        assert!(scanner.scan()?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_watcher_start_and_stop() -> LibraryResult<()> {
        let dir = TempDir::new()?;
        let mut scanner = LibraryScanner::new(vec![ScanTarget::new(dir.path(), MediaKind::Book, Vec::new())]);

        let _rx = scanner.start()?;
        assert!(scanner.is_running());
        assert!(matches!(scanner.start(), Err(LibraryError::Watcher(_))));

        scanner.stop();
        assert!(!scanner.is_running());
        Ok(())
    }

    #[tokio::test]
    async fn test_watch_missing_folder_fails() {
        let mut scanner = LibraryScanner::new(vec![ScanTarget::new("/nonexistent/shelfwatch", MediaKind::Book, Vec::new())]);
        assert!(matches!(scanner.start(), Err(LibraryError::Watcher(_))));
    }
}
