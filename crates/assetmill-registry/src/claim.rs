use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::warn;

use crate::error::{RegistryError, RegistryResult};
use crate::traits::{GenerationRegistry, Slot};

/// Outcome of [`claim_or_join`].
pub enum Claim<T>
where
    T: Clone + Send + 'static,
{
    /// The caller must run the build and release the guard.
    Builder(BuildGuard<T>),
    /// Another request is building; wait for its outcome.
    Joined(Waiter<T>),
}

/// Claim the build for `destination` or join the one in flight.
///
/// This performs no I/O and never awaits, so it must be called before the
/// request touches the filesystem.
pub fn claim_or_join<T>(
    registry: &Arc<dyn GenerationRegistry<T>>,
    destination: impl Into<PathBuf>,
) -> Claim<T>
where
    T: Clone + Send + 'static,
{
    let destination = destination.into();
    match registry.claim_or_subscribe(&destination) {
        Slot::Claimed => Claim::Builder(BuildGuard {
            registry: Arc::clone(registry),
            destination,
            released: false,
        }),
        Slot::Joined(receiver) => Claim::Joined(Waiter {
            destination,
            receiver,
        }),
    }
}

/// Ownership of a registry entry.
///
/// Dropping the guard without calling [`release`](Self::release) abandons
/// the entry so waiters are not left hanging.
pub struct BuildGuard<T>
where
    T: Clone + Send + 'static,
{
    registry: Arc<dyn GenerationRegistry<T>>,
    destination: PathBuf,
    released: bool,
}

impl<T> BuildGuard<T>
where
    T: Clone + Send + 'static,
{
    /// Artifact path this guard owns.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Hand `outcome` to every joined request and remove the entry.
    pub fn release(mut self, outcome: T) -> usize {
        self.released = true;
        self.registry.release(&self.destination, outcome)
    }
}

impl<T> Drop for BuildGuard<T>
where
    T: Clone + Send + 'static,
{
    fn drop(&mut self) {
        if !self.released {
            let cut_off = self.registry.abandon(&self.destination);
            warn!(
                destination = %self.destination.display(),
                waiting = cut_off,
                "build dropped without an outcome"
            );
        }
    }
}

impl<T> std::fmt::Debug for BuildGuard<T>
where
    T: Clone + Send + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildGuard")
            .field("destination", &self.destination)
            .field("released", &self.released)
            .finish()
    }
}

/// A request waiting on another request's build.
#[derive(Debug)]
pub struct Waiter<T> {
    destination: PathBuf,
    receiver: oneshot::Receiver<T>,
}

impl<T> Waiter<T> {
    /// Artifact path being waited on.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Wait for the builder's outcome.
    pub async fn outcome(self) -> RegistryResult<T> {
        self.receiver
            .await
            .map_err(|_| RegistryError::Abandoned(self.destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRegistry;

    fn registry() -> Arc<dyn GenerationRegistry<Result<u32, String>>> {
        Arc::new(InMemoryRegistry::new())
    }

    #[tokio::test]
    async fn joiners_see_builder_outcome() {
        let registry = registry();
        let Claim::Builder(guard) = claim_or_join(&registry, "/out/a.js") else {
            panic!("first claim should build");
        };
        let Claim::Joined(first) = claim_or_join(&registry, "/out/a.js") else {
            panic!("second claim should join");
        };
        let Claim::Joined(second) = claim_or_join(&registry, "/out/a.js") else {
            panic!("third claim should join");
        };
        assert_eq!(guard.destination(), Path::new("/out/a.js"));

        assert_eq!(guard.release(Err("boom".into())), 2);
        assert_eq!(first.outcome().await.unwrap(), Err("boom".to_string()));
        assert_eq!(second.outcome().await.unwrap(), Err("boom".to_string()));
        assert_eq!(registry.in_flight(), 0);
    }

    #[tokio::test]
    async fn dropped_guard_abandons_entry() {
        let registry = registry();
        let guard = claim_or_join(&registry, "/out/a.js");
        let Claim::Joined(waiter) = claim_or_join(&registry, "/out/a.js") else {
            panic!("second claim should join");
        };
        drop(guard);

        let err = waiter.outcome().await.unwrap_err();
        assert!(matches!(err, RegistryError::Abandoned(p) if p == Path::new("/out/a.js")));
        assert!(matches!(claim_or_join(&registry, "/out/a.js"), Claim::Builder(_)));
    }

    #[tokio::test]
    async fn waiter_across_tasks() {
        let registry = registry();
        let Claim::Builder(guard) = claim_or_join(&registry, "/out/b.js") else {
            panic!("first claim should build");
        };
        let Claim::Joined(waiter) = claim_or_join(&registry, "/out/b.js") else {
            panic!("second claim should join");
        };
        let handle = tokio::spawn(waiter.outcome());
        tokio::task::yield_now().await;
        guard.release(Ok(42));
        assert_eq!(handle.await.unwrap().unwrap(), Ok(42));
    }
}
