//! Coordination between concurrent pipelines
//!
//! [`PathLocks`] serializes work aimed at the same destination path so
//! collision checks and moves cannot interleave. [`InFlight`] keeps a file
//! from being picked up twice while a pipeline already owns it.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;

type LockMap = HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>;

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Per-path async mutexes, created on demand and dropped when unused
#[derive(Debug, Clone, Default)]
pub struct PathLocks {
    locks: Arc<Mutex<LockMap>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no one else holds `path`
    pub async fn lock(&self, path: &Path) -> PathLockGuard {
        let mutex = {
            let mut locks = lock_or_recover(&self.locks);
            locks.entry(path.to_path_buf()).or_default().clone()
        };

        let guard = mutex.lock_owned().await;

        PathLockGuard {
            guard: Some(guard),
            path: path.to_path_buf(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of paths with a live lock entry
    pub fn len(&self) -> usize {
        lock_or_recover(&self.locks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Held while a pipeline works on a destination path
#[derive(Debug)]
pub struct PathLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    path: PathBuf,
    locks: Arc<Mutex<LockMap>>,
}

impl Drop for PathLockGuard {
    fn drop(&mut self) {
        // Release first so the entry's only remaining owner is the map
        drop(self.guard.take());

        let mut locks = lock_or_recover(&self.locks);
        if locks
            .get(&self.path)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
        {
            locks.remove(&self.path);
        }
    }
}

/// Source paths currently owned by a pipeline
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    paths: Arc<Mutex<HashSet<PathBuf>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `path`, or returns `None` if it is already claimed
    pub fn try_claim(&self, path: &Path) -> Option<InFlightClaim> {
        let mut claim = InFlightClaim {
            paths: Vec::new(),
            set: Arc::clone(&self.paths),
        };
        claim.extend(path).then_some(claim)
    }

    pub fn contains(&self, path: &Path) -> bool {
        lock_or_recover(&self.paths).contains(path)
    }

    pub fn len(&self) -> usize {
        lock_or_recover(&self.paths).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases every claimed path on drop
#[derive(Debug)]
pub struct InFlightClaim {
    paths: Vec<PathBuf>,
    set: Arc<Mutex<HashSet<PathBuf>>>,
}

impl InFlightClaim {
    /// Adds another path to this claim. Returns false if someone else holds it.
    pub fn extend(&mut self, path: &Path) -> bool {
        if self.paths.iter().any(|p| p == path) {
            return true;
        }
        let inserted = lock_or_recover(&self.set).insert(path.to_path_buf());
        if inserted {
            self.paths.push(path.to_path_buf());
        }
        inserted
    }
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        let mut set = lock_or_recover(&self.set);
        for path in &self.paths {
            set.remove(path);
        }
    }
}
