use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::debug;

use crate::traits::{GenerationRegistry, Slot};

/// In-process registry backed by a `HashMap` under a `Mutex`.
///
/// The lock is held only for map operations, never across an await point.
/// Each entry stores the senders of the requests that joined the build.
pub struct InMemoryRegistry<T> {
    entries: Mutex<HashMap<PathBuf, Vec<oneshot::Sender<T>>>>,
}

impl<T> InMemoryRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of requests waiting on the build for `destination`.
    pub fn waiting(&self, destination: &Path) -> usize {
        self.entries
            .lock()
            .expect("registry lock poisoned")
            .get(destination)
            .map_or(0, Vec::len)
    }
}

impl<T> Default for InMemoryRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> GenerationRegistry<T> for InMemoryRegistry<T>
where
    T: Clone + Send + 'static,
{
    fn claim_or_subscribe(&self, destination: &Path) -> Slot<T> {
        let mut entries = self.entries.lock().expect("registry lock poisoned");
        match entries.get_mut(destination) {
            Some(waiters) => {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                debug!(
                    destination = %destination.display(),
                    waiting = waiters.len(),
                    "joined in-flight build"
                );
                Slot::Joined(rx)
            }
            None => {
                entries.insert(destination.to_path_buf(), Vec::new());
                Slot::Claimed
            }
        }
    }

    fn release(&self, destination: &Path, outcome: T) -> usize {
        let waiters = self
            .entries
            .lock()
            .expect("registry lock poisoned")
            .remove(destination)
            .unwrap_or_default();

        // A waiter whose request was dropped has closed its receiver.
        waiters
            .into_iter()
            .filter(|tx| !tx.is_closed())
            .map(|tx| tx.send(outcome.clone()).is_ok())
            .filter(|delivered| *delivered)
            .count()
    }

    fn abandon(&self, destination: &Path) -> usize {
        self.entries
            .lock()
            .expect("registry lock poisoned")
            .remove(destination)
            .map_or(0, |waiters| waiters.len())
    }

    fn is_in_flight(&self, destination: &Path) -> bool {
        self.entries
            .lock()
            .expect("registry lock poisoned")
            .contains_key(destination)
    }

    fn in_flight(&self) -> usize {
        self.entries.lock().expect("registry lock poisoned").len()
    }
}

impl<T> std::fmt::Debug for InMemoryRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.entries.lock().map(|e| e.len()).unwrap_or(0);
        f.debug_struct("InMemoryRegistry")
            .field("in_flight", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    fn dest() -> PathBuf {
        PathBuf::from("/srv/out/app.js")
    }

    #[test]
    fn first_claim_wins() {
        let registry = InMemoryRegistry::<u32>::new();
        assert!(matches!(registry.claim_or_subscribe(&dest()), Slot::Claimed));
        assert!(matches!(registry.claim_or_subscribe(&dest()), Slot::Joined(_)));
        assert!(registry.is_in_flight(&dest()));
        assert_eq!(registry.in_flight(), 1);
    }

    #[test]
    fn destinations_are_independent() {
        let registry = InMemoryRegistry::<u32>::new();
        assert!(matches!(registry.claim_or_subscribe(Path::new("/a")), Slot::Claimed));
        assert!(matches!(registry.claim_or_subscribe(Path::new("/b")), Slot::Claimed));
        assert_eq!(registry.in_flight(), 2);
    }

    #[tokio::test]
    async fn release_delivers_same_outcome_to_all() {
        let registry = InMemoryRegistry::<String>::new();
        registry.claim_or_subscribe(&dest());
        let receivers: Vec<_> = (0..5)
            .map(|_| match registry.claim_or_subscribe(&dest()) {
                Slot::Joined(rx) => rx,
                Slot::Claimed => panic!("expected to join"),
            })
            .collect();
        assert_eq!(registry.waiting(&dest()), 5);

        assert_eq!(registry.release(&dest(), "built".to_string()), 5);
        for rx in receivers {
            assert_eq!(rx.await.unwrap(), "built");
        }
        assert!(!registry.is_in_flight(&dest()));
    }

    #[test]
    fn release_then_claim_starts_new_build() {
        let registry = InMemoryRegistry::<u32>::new();
        registry.claim_or_subscribe(&dest());
        assert_eq!(registry.release(&dest(), 1), 0);
        assert!(matches!(registry.claim_or_subscribe(&dest()), Slot::Claimed));
    }

    #[test]
    fn release_unknown_destination_is_noop() {
        let registry = InMemoryRegistry::<u32>::new();
        assert_eq!(registry.release(&dest(), 7), 0);
        assert_eq!(registry.in_flight(), 0);
    }

    #[test]
    fn release_skips_dropped_waiters() {
        let registry = InMemoryRegistry::<u32>::new();
        registry.claim_or_subscribe(&dest());
        let kept = registry.claim_or_subscribe(&dest());
        drop(registry.claim_or_subscribe(&dest()));
        assert_eq!(registry.release(&dest(), 3), 1);
        drop(kept);
    }

    #[tokio::test]
    async fn abandon_closes_waiters() {
        let registry = InMemoryRegistry::<u32>::new();
        registry.claim_or_subscribe(&dest());
        let Slot::Joined(rx) = registry.claim_or_subscribe(&dest()) else {
            panic!("expected to join");
        };
        assert_eq!(registry.abandon(&dest()), 1);
        assert!(rx.await.is_err());
        assert_eq!(registry.in_flight(), 0);
    }

    #[test]
    fn concurrent_claims_have_one_builder() {
        let registry = Arc::new(InMemoryRegistry::<u32>::new());
        let builders = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(std::sync::Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let builders = Arc::clone(&builders);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    if let Slot::Claimed = registry.claim_or_subscribe(&dest()) {
                        builders.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(builders.load(Ordering::SeqCst), 1);
        assert_eq!(registry.waiting(&dest()), 15);
    }

    #[test]
    fn debug_format() {
        let registry = InMemoryRegistry::<u32>::new();
        registry.claim_or_subscribe(&dest());
        let debug = format!("{registry:?}");
        assert!(debug.contains("InMemoryRegistry"));
        assert!(debug.contains("in_flight"));
    }
}
