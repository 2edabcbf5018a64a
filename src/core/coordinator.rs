//! Wait/wake protocol for long-poll callers.
//!
//! A waiter enrolls with the underlying [`Notify`] *before* it checks the
//! store. An update that lands between the check and the suspension still
//! wakes the waiter, so no notification can be lost.

use crate::core::{VersionedStore, VersionedValue};
use std::fmt;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use tokio::time::{Instant, timeout_at};

#[cfg(feature = "metrics")]
use crate::metrics::PollMetrics;
#[cfg(feature = "metrics")]
use arc_swap::ArcSwapOption;

/// Result of waiting for a version above a baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T = String> {
    /// A snapshot newer than the baseline.
    Fresh(Arc<VersionedValue<T>>),
    /// The deadline passed first; carries the current, not-newer snapshot.
    Stale(Arc<VersionedValue<T>>),
}

impl<T> WaitOutcome<T> {
    /// Whether the wait produced newer data.
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }

    /// The snapshot observed when the wait ended, fresh or not.
    pub fn snapshot(&self) -> &Arc<VersionedValue<T>> {
        match self {
            Self::Fresh(snapshot) | Self::Stale(snapshot) => snapshot,
        }
    }

    /// The newer snapshot, or `None` if the wait timed out.
    pub fn into_fresh(self) -> Option<Arc<VersionedValue<T>>> {
        match self {
            Self::Fresh(snapshot) => Some(snapshot),
            Self::Stale(_) => None,
        }
    }
}

/// Lets any number of tasks suspend until a store moves past their baseline.
///
/// Every update broadcasts to all suspended waiters; each one re-reads the
/// store and decides against its own baseline whether to return or keep
/// waiting.
pub struct WaitCoordinator {
    notify: Notify,
    waiting: AtomicUsize,
    #[cfg(feature = "metrics")]
    metrics: ArcSwapOption<PollMetrics>,
}

/// A live, suspended waiter. Dropping it (return, timeout, or cancellation of
/// the enclosing future) releases the registration.
struct WaitRegistration<'a> {
    coordinator: &'a WaitCoordinator,
    baseline: u64,
}

impl<'a> WaitRegistration<'a> {
    fn new(coordinator: &'a WaitCoordinator, baseline: u64) -> Self {
        let now_waiting = coordinator.waiting.fetch_add(1, Ordering::SeqCst) + 1;
        coordinator.record_waiting(now_waiting);
        tracing::debug!(baseline, waiting = now_waiting, "coordinator: waiter registered");
        Self {
            coordinator,
            baseline,
        }
    }
}

impl Drop for WaitRegistration<'_> {
    fn drop(&mut self) {
        let remaining = self.coordinator.waiting.fetch_sub(1, Ordering::SeqCst) - 1;
        self.coordinator.record_waiting(remaining);
        tracing::debug!(
            baseline = self.baseline,
            waiting = remaining,
            "coordinator: waiter released"
        );
    }
}

impl WaitCoordinator {
    /// Create a coordinator with no waiters.
    pub fn new() -> Self {
        Self {
            notify: Notify::new(),
            waiting: AtomicUsize::new(0),
            #[cfg(feature = "metrics")]
            metrics: ArcSwapOption::empty(),
        }
    }

    /// Report waiter counts and publishes into `metrics` from now on.
    #[cfg(feature = "metrics")]
    pub fn attach_metrics(&self, metrics: PollMetrics) {
        metrics.update_waiting(self.waiting());
        self.metrics.store(Some(Arc::new(metrics)));
    }

    /// Number of callers currently suspended in
    /// [`await_version_above`](Self::await_version_above).
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Wake every suspended waiter so each re-checks its own baseline.
    ///
    /// Waiters that have not enrolled yet do not need this signal: they will
    /// see the new version in their own check.
    pub fn notify_updated(&self) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = self.metrics.load().as_deref() {
            metrics.record_publish();
        }

        tracing::trace!(waiting = self.waiting(), "coordinator: broadcasting update");
        self.notify.notify_waiters();
    }

    #[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
    fn record_waiting(&self, count: usize) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = self.metrics.load().as_deref() {
            metrics.update_waiting(count);
        }
    }

    /// Wait until `store` holds a version above `baseline`, or `deadline`.
    ///
    /// Returns immediately, without suspending, when the store is already
    /// past the baseline. At the deadline the store is read one final time
    /// and the result is [`WaitOutcome::Stale`] only if it is still not newer.
    ///
    /// The returned future is cancel-safe: dropping it releases the waiter.
    pub async fn await_version_above<T>(
        &self,
        store: &VersionedStore<T>,
        baseline: u64,
        deadline: Instant,
    ) -> WaitOutcome<T> {
        let mut registration: Option<WaitRegistration<'_>> = None;

        loop {
            let mut notified = pin!(self.notify.notified());
            notified.as_mut().enable();

            let snapshot = store.read();
            if snapshot.is_newer_than(baseline) {
                return WaitOutcome::Fresh(snapshot);
            }

            if registration.is_none() {
                registration = Some(WaitRegistration::new(self, baseline));
            }

            if timeout_at(deadline, notified).await.is_err() {
                let snapshot = store.read();
                return if snapshot.is_newer_than(baseline) {
                    WaitOutcome::Fresh(snapshot)
                } else {
                    tracing::debug!(
                        baseline,
                        version = snapshot.version,
                        "coordinator: deadline reached without newer data"
                    );
                    WaitOutcome::Stale(snapshot)
                };
            }
        }
    }
}

impl Default for WaitCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WaitCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitCoordinator")
            .field("waiting", &self.waiting())
            .finish_non_exhaustive()
    }
}
