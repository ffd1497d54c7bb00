use std::path::Path;

use tokio::sync::oneshot;

/// Result of the atomic insert-if-absent step.
#[derive(Debug)]
pub enum Slot<T> {
    /// No build was in flight; the caller now owns the entry.
    Claimed,
    /// A build is in flight; its outcome will arrive on this channel.
    Joined(oneshot::Receiver<T>),
}

/// Registry of in-flight builds keyed by destination path.
///
/// All implementations must satisfy these invariants:
/// - `claim_or_subscribe` is atomic: of any number of concurrent callers for
///   one destination, exactly one observes [`Slot::Claimed`].
/// - `release` delivers the same outcome to every subscriber and removes the
///   entry; the next claim for that destination starts a new build.
/// - `abandon` removes the entry without an outcome, closing every
///   subscriber's channel.
///
/// A deployment spanning several processes can back this with an external
/// coordination service; callers only depend on the trait.
pub trait GenerationRegistry<T>: Send + Sync
where
    T: Clone + Send + 'static,
{
    /// Create the entry for `destination`, or subscribe to the existing one.
    fn claim_or_subscribe(&self, destination: &Path) -> Slot<T>;

    /// Deliver `outcome` to every subscriber and delete the entry.
    ///
    /// Returns the number of subscribers that received it.
    fn release(&self, destination: &Path, outcome: T) -> usize;

    /// Delete the entry without an outcome. Returns the number of
    /// subscribers that were cut off.
    fn abandon(&self, destination: &Path) -> usize;

    /// Whether a build for `destination` is currently registered.
    fn is_in_flight(&self, destination: &Path) -> bool;

    /// Number of builds currently registered.
    fn in_flight(&self) -> usize;
}
