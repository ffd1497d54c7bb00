use std::path::PathBuf;
use std::time::SystemTime;

use async_trait::async_trait;
use tracing::debug;

use crate::error::WalkError;
use crate::walker::{SubpathWalker, WalkEntry};

/// Decides whether a newer source file should count towards staleness.
///
/// Errors from the walk itself are converted into the predicate's error
/// type, so callers see a single error type for the whole check.
#[async_trait]
pub trait SourcePredicate: Send + Sync {
    type Error: From<WalkError> + Send;

    async fn accepts(&self, entry: &WalkEntry) -> Result<bool, Self::Error>;
}

/// Predicate that counts every source file.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

#[async_trait]
impl SourcePredicate for AcceptAll {
    type Error = WalkError;

    async fn accepts(&self, _entry: &WalkEntry) -> Result<bool, WalkError> {
        Ok(true)
    }
}

/// Returns `true` if any accepted file under `sources` was modified strictly
/// after `artifact_modified`.
///
/// Stops at the first such file; the rest of the tree is never visited. The
/// predicate is only consulted for files that are already newer.
pub async fn is_stale<P>(
    artifact_modified: SystemTime,
    sources: &[PathBuf],
    predicate: &P,
) -> Result<bool, P::Error>
where
    P: SourcePredicate + ?Sized,
{
    let mut walker = SubpathWalker::new(sources.iter().cloned());
    while let Some(entry) = walker.next().await? {
        if entry.modified()? <= artifact_modified {
            continue;
        }
        if predicate.accepts(&entry).await? {
            debug!(path = %entry.path.display(), "source is newer than artifact");
            return Ok(true);
        }
    }
    Ok(false)
}
