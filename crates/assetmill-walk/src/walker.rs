use std::collections::VecDeque;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

use crate::error::{WalkError, WalkResult};

// ---------------------------------------------------------------------------
// WalkEntry
// ---------------------------------------------------------------------------

/// A regular file visited by a walker, with the metadata fetched on the way.
#[derive(Clone, Debug)]
pub struct WalkEntry {
    /// Path as reached from the root that contained it.
    pub path: PathBuf,
    /// Metadata from the stat that classified this path as a file.
    pub metadata: Metadata,
}

impl WalkEntry {
    /// Last modification time of the file.
    pub fn modified(&self) -> WalkResult<SystemTime> {
        self.metadata
            .modified()
            .map_err(|source| WalkError::io(&self.path, source))
    }
}

// ---------------------------------------------------------------------------
// SubpathWalker
// ---------------------------------------------------------------------------

/// Lazy pre-order, depth-first walk over a list of files and directories.
///
/// Nothing is read from disk until [`next`](Self::next) is called, and each
/// call does only the stats and listings needed to reach the next file.
#[derive(Debug)]
pub struct SubpathWalker {
    pending: VecDeque<PathBuf>,
}

impl SubpathWalker {
    /// Create a walker seeded with `roots`, visited in the given order.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            pending: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of paths queued but not yet visited.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Advance to the next file.
    ///
    /// Returns `Ok(None)` once every root has been exhausted. Directories are
    /// expanded in place and never returned. A failed stat or listing is
    /// returned as an error; the walker can still be advanced afterwards.
    pub async fn next(&mut self) -> WalkResult<Option<WalkEntry>> {
        while let Some(path) = self.pending.pop_front() {
            let metadata = fs::metadata(&path)
                .await
                .map_err(|source| WalkError::io(&path, source))?;

            if metadata.is_file() {
                trace!(path = %path.display(), "walk: file");
                return Ok(Some(WalkEntry { path, metadata }));
            }

            if metadata.is_dir() {
                let children = list_children(&path).await?;
                trace!(path = %path.display(), children = children.len(), "walk: expand");
                for child in children.into_iter().rev() {
                    self.pending.push_front(child);
                }
                continue;
            }

            return Err(WalkError::NotFileOrDirectory(path));
        }
        Ok(None)
    }

    /// Drain the walker into a vector.
    pub async fn collect(mut self) -> WalkResult<Vec<WalkEntry>> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next().await? {
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Wrap this walker in a cloneable handle.
    pub fn into_shared(self) -> SharedWalker {
        SharedWalker {
            inner: Arc::new(Mutex::new(self)),
        }
    }
}

/// Directory children, sorted so that traversal order depends only on the
/// filesystem contents.
async fn list_children(dir: &Path) -> WalkResult<Vec<PathBuf>> {
    let mut reader = fs::read_dir(dir)
        .await
        .map_err(|source| WalkError::io(dir, source))?;
    let mut children = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|source| WalkError::io(dir, source))?
    {
        children.push(entry.path());
    }
    children.sort();
    Ok(children)
}

// ---------------------------------------------------------------------------
// SharedWalker
// ---------------------------------------------------------------------------

/// Cloneable handle to a [`SubpathWalker`].
///
/// Only one advance may be outstanding at a time. Starting a second one
/// before the first has been resolved (or dropped) returns
/// [`WalkError::Busy`] immediately.
#[derive(Clone, Debug)]
pub struct SharedWalker {
    inner: Arc<Mutex<SubpathWalker>>,
}

impl SharedWalker {
    /// Create a shareable walker seeded with `roots`.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        SubpathWalker::new(roots).into_shared()
    }

    /// Reserve the walker for one advance.
    pub fn advance(&self) -> WalkResult<Advance> {
        let walker = Arc::clone(&self.inner)
            .try_lock_owned()
            .map_err(|_| WalkError::Busy)?;
        Ok(Advance { walker })
    }
}

/// An in-progress advance holding exclusive use of a [`SharedWalker`].
#[derive(Debug)]
pub struct Advance {
    walker: OwnedMutexGuard<SubpathWalker>,
}

impl Advance {
    /// Perform the advance, releasing the walker once it completes.
    pub async fn resolve(mut self) -> WalkResult<Option<WalkEntry>> {
        self.walker.next().await
    }
}
