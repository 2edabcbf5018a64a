//! The versioned value store providing lock-free snapshot reads.

use crate::core::WaitCoordinator;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// One generation of the stored value.
///
/// A snapshot is immutable once published: the version and the payload are
/// always observed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue<T = String> {
    /// Generation counter, 0 until the first update
    pub version: u64,
    /// The value published with this version
    pub payload: T,
}

impl<T> VersionedValue<T> {
    /// Whether this snapshot is newer than what a caller last saw.
    pub fn is_newer_than(&self, baseline: u64) -> bool {
        self.version > baseline
    }

    /// Whether nothing has been published yet.
    pub fn is_initial(&self) -> bool {
        self.version == 0
    }
}

/// Single-item store with a monotonically increasing version.
///
/// Reads are lock-free and return an `Arc` to an immutable snapshot. Updates
/// publish a whole new snapshot through `ArcSwap::rcu`, so concurrent
/// writers are serialized and never reuse a version number.
///
/// # Examples
///
/// ```rust
/// use hotswap_poll::core::VersionedStore;
///
/// let store = VersionedStore::new(String::new());
/// assert_eq!(store.read().version, 0);
///
/// let snapshot = store.update("Update #1".to_string());
/// assert_eq!(snapshot.version, 1);
/// assert_eq!(store.read().payload, "Update #1");
/// ```
pub struct VersionedStore<T = String> {
    current: ArcSwap<VersionedValue<T>>,
    coordinator: WaitCoordinator,
}

impl<T> VersionedStore<T> {
    /// Create a store at version 0 holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            current: ArcSwap::from_pointee(VersionedValue {
                version: 0,
                payload: initial,
            }),
            coordinator: WaitCoordinator::new(),
        }
    }

    /// Get the current snapshot.
    ///
    /// Never blocks and never fails.
    pub fn read(&self) -> Arc<VersionedValue<T>> {
        self.current.load_full()
    }

    /// Get the current version without taking a reference to the payload.
    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// The coordinator woken by every update of this store.
    pub fn coordinator(&self) -> &WaitCoordinator {
        &self.coordinator
    }

    /// Publish `payload` as the next version and wake all waiters.
    ///
    /// Waiters are notified only after the new snapshot is visible to
    /// [`read`](Self::read).
    ///
    /// # Panics
    ///
    /// Panics if the version counter would overflow.
    pub fn update(&self, payload: T) -> Arc<VersionedValue<T>>
    where
        T: Clone,
    {
        let mut published = None;
        self.current.rcu(|current| {
            let next = Arc::new(VersionedValue {
                version: successor(current.version),
                payload: payload.clone(),
            });
            // rcu may retry; the last attempt is the one that was stored
            published = Some(Arc::clone(&next));
            next
        });
        let Some(published) = published else {
            unreachable!("rcu always runs its update closure");
        };

        tracing::debug!(version = published.version, "store: published snapshot");
        self.coordinator.notify_updated();
        published
    }
}

impl<T: Default> Default for VersionedStore<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

fn successor(version: u64) -> u64 {
    match version.checked_add(1) {
        Some(next) => next,
        None => panic!("version counter exhausted at {version}; store invariant violated"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_starts_empty_at_version_zero() {
        let store: VersionedStore = VersionedStore::default();
        let snapshot = store.read();
        assert_eq!(snapshot.version, 0);
        assert_eq!(snapshot.payload, "");
        assert!(snapshot.is_initial());
    }

    #[test]
    fn test_update_bumps_version_and_replaces_payload() {
        let store = VersionedStore::new(String::new());

        let first = store.update("a".to_string());
        assert_eq!(*first, VersionedValue { version: 1, payload: "a".to_string() });

        let second = store.update("b".to_string());
        assert_eq!(second.version, 2);
        assert_eq!(store.read().payload, "b");
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_returned_snapshot_is_the_published_one() {
        let store = VersionedStore::new(0u32);
        let published = store.update(7);
        assert!(Arc::ptr_eq(&published, &store.read()));
    }

    #[test]
    fn test_is_newer_than() {
        let value = VersionedValue { version: 3, payload: () };
        assert!(value.is_newer_than(2));
        assert!(!value.is_newer_than(3));
        assert!(!value.is_newer_than(4));
    }

    #[test]
    fn test_concurrent_writers_never_reuse_versions() {
        let store = Arc::new(VersionedStore::new(0usize));
        let writers = 8;
        let per_writer = 250;

        let handles: Vec<_> = (0..writers)
            .map(|w| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..per_writer)
                        .map(|i| store.update(w * per_writer + i).version)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for version in handle.join().unwrap() {
                assert!(seen.insert(version), "version {version} was issued twice");
            }
        }

        let total = (writers * per_writer) as u64;
        assert_eq!(seen.len() as u64, total);
        assert_eq!(store.version(), total);
        assert!((1..=total).all(|v| seen.contains(&v)));
    }

    #[test]
    fn test_readers_never_observe_torn_snapshots() {
        let store = Arc::new(VersionedStore::new("v0".to_string()));
        let updates = 2_000u64;

        thread::scope(|scope| {
            for _ in 0..4 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    let mut last = 0;
                    while last < updates {
                        let snapshot = store.read();
                        assert_eq!(snapshot.payload, format!("v{}", snapshot.version));
                        assert!(snapshot.version >= last, "version went backwards");
                        last = snapshot.version;
                    }
                });
            }

            for v in 1..=updates {
                store.update(format!("v{v}"));
            }
        });
    }

    proptest! {
        #[test]
        fn prop_versions_increase_by_one(payloads in proptest::collection::vec(".*", 1..64)) {
            let store = VersionedStore::new(String::new());
            let mut previous = store.version();
            for payload in payloads {
                let snapshot = store.update(payload.clone());
                prop_assert_eq!(snapshot.version, previous + 1);
                prop_assert_eq!(&snapshot.payload, &payload);
                previous = snapshot.version;
            }
        }
    }
}
