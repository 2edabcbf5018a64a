//! The query handle surfaced to transport collaborators.

use crate::core::{VersionedStore, VersionedValue};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[cfg(feature = "metrics")]
use crate::metrics::PollMetrics;

// Deadline used when `now + timeout` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Short-poll and long-poll access to the latest value.
///
/// Cloning is cheap; every clone shares the same store.
///
/// # Examples
///
/// ```rust
/// use hotswap_poll::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() {
/// let latest: LatestValue = LatestValue::new(String::new());
/// assert!(latest.peek(0).is_none());
///
/// latest.store().update("Update #1".to_string());
/// let value = latest.peek(0).unwrap();
/// assert_eq!((value.payload.as_str(), value.version), ("Update #1", 1));
///
/// // Already newer than the baseline: returns without waiting
/// let value = latest.await_newer(0, Duration::from_secs(20)).await;
/// assert_eq!(value.unwrap().version, 1);
/// # }
/// ```
pub struct LatestValue<T = String> {
    store: Arc<VersionedStore<T>>,
    #[cfg(feature = "metrics")]
    metrics: Option<PollMetrics>,
}

impl<T> LatestValue<T> {
    /// Create a handle over a fresh store holding `initial` at version 0.
    pub fn new(initial: T) -> Self {
        Self::from_store(Arc::new(VersionedStore::new(initial)))
    }

    /// Create a handle over an existing store.
    pub fn from_store(store: Arc<VersionedStore<T>>) -> Self {
        Self {
            store,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Record poll activity into `metrics`.
    ///
    /// Also attaches `metrics` to the store's coordinator, so waiter counts
    /// and publishes are recorded however the store is updated.
    #[cfg(feature = "metrics")]
    pub(crate) fn with_metrics(mut self, metrics: PollMetrics) -> Self {
        self.store.coordinator().attach_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    /// The metrics collector, if one was configured.
    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> Option<&PollMetrics> {
        self.metrics.as_ref()
    }

    /// The shared store behind this handle.
    pub fn store(&self) -> &Arc<VersionedStore<T>> {
        &self.store
    }

    /// Return the current snapshot if it is newer than `baseline`.
    ///
    /// Never blocks. `None` means "no update since `baseline`".
    pub fn peek(&self, baseline: u64) -> Option<Arc<VersionedValue<T>>> {
        let snapshot = self.store.read();
        let fresh = snapshot.is_newer_than(baseline);

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_peek(fresh);
        }

        fresh.then_some(snapshot)
    }

    /// Wait up to `timeout` for a snapshot newer than `baseline`.
    ///
    /// Returns immediately when the store is already past the baseline.
    /// `None` means the full timeout elapsed first; that is not an error.
    /// Transports that accept a caller-supplied timeout should bound it with
    /// [`PollSettings::resolve_timeout`](crate::settings::PollSettings::resolve_timeout).
    ///
    /// Dropping the returned future cancels the wait.
    pub async fn await_newer(
        &self,
        baseline: u64,
        timeout: Duration,
    ) -> Option<Arc<VersionedValue<T>>> {
        let now = Instant::now();
        let deadline = now.checked_add(timeout).unwrap_or(now + FAR_FUTURE);

        #[cfg(feature = "metrics")]
        let started = self.metrics.as_ref().map(|m| m.start_long_poll());

        let outcome = self
            .store
            .coordinator()
            .await_version_above(&self.store, baseline, deadline)
            .await;

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(started)) = (&self.metrics, started) {
            metrics.record_long_poll(started, outcome.is_fresh());
        }

        tracing::trace!(
            baseline,
            version = outcome.snapshot().version,
            fresh = outcome.is_fresh(),
            "long poll finished"
        );
        outcome.into_fresh()
    }
}

impl<T: Default> Default for LatestValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Clone for LatestValue<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            #[cfg(feature = "metrics")]
            metrics: self.metrics.clone(),
        }
    }
}
