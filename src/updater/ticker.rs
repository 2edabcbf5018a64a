//! The updater task that feeds new payloads into the store.

use crate::core::{LatestValue, VersionedStore, VersionedValue};
use crate::updater::PayloadSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

#[cfg(feature = "metrics")]
use crate::metrics::PollMetrics;

/// Shortest cadence accepted by [`Updater::spawn`].
const MIN_CADENCE: Duration = Duration::from_millis(1);

/// Publishes payloads from a [`PayloadSource`] into a store.
///
/// Each tick is all-or-nothing: a failing source leaves the store at its last
/// good value and the next tick tries again.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_poll::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() {
/// let latest: LatestValue = LatestValue::default();
/// let handle = latest
///     .updater(SequenceSource::new("Update #"))
///     .spawn(Duration::from_secs(10));
///
/// let value = latest.await_newer(0, Duration::from_secs(20)).await;
/// println!("{:?}", value);
///
/// handle.shutdown().await;
/// # }
/// ```
pub struct Updater<T, S> {
    store: Arc<VersionedStore<T>>,
    source: S,
    #[cfg(feature = "metrics")]
    metrics: Option<PollMetrics>,
}

impl<T, S> Updater<T, S>
where
    T: Clone + Send + Sync + 'static,
    S: PayloadSource<T> + 'static,
{
    /// Create an updater publishing into `store`.
    pub fn new(store: Arc<VersionedStore<T>>, source: S) -> Self {
        Self {
            store,
            source,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Record producer failures into `metrics`.
    ///
    /// Publishes are counted by the store's coordinator once metrics are
    /// attached to it.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: PollMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The payload source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Produce one payload and publish it.
    ///
    /// Returns the new snapshot, or `None` if the source had nothing new or
    /// failed. Failures are logged, never propagated.
    pub fn tick(&mut self) -> Option<Arc<VersionedValue<T>>> {
        match self.source.next_payload() {
            Ok(Some(payload)) => {
                let snapshot = self.store.update(payload);
                tracing::info!(
                    version = snapshot.version,
                    source = %self.source.name(),
                    "Data updated"
                );

                Some(snapshot)
            }
            Ok(None) => {
                tracing::debug!(source = %self.source.name(), "Nothing new to publish");
                None
            }
            Err(e) => {
                tracing::warn!(
                    source = %self.source.name(),
                    error = %e,
                    version = self.store.version(),
                    "Payload producer failed, skipping tick"
                );

                #[cfg(feature = "metrics")]
                if let Some(metrics) = &self.metrics {
                    metrics.record_producer_failure();
                }

                None
            }
        }
    }

    /// Tick on a fixed cadence until shut down.
    ///
    /// The first tick happens one `cadence` after spawning. Ticks that fall
    /// behind are delayed, not bunched up.
    pub fn spawn(mut self, cadence: Duration) -> UpdaterHandle {
        let cadence = cadence.max(MIN_CADENCE);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            tracing::info!(?cadence, source = %self.source.name(), "Updater started");
            let mut ticks = interval_at(Instant::now() + cadence, cadence);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticks.tick() => {
                        self.tick();
                    }
                }
            }
            tracing::info!(source = %self.source.name(), "Updater stopped");
        });

        UpdaterHandle::new(shutdown_tx, task)
    }

    /// Tick once per message on `triggers` until shut down or until every
    /// sender is dropped.
    pub fn spawn_triggered(mut self, mut triggers: mpsc::Receiver<()>) -> UpdaterHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            tracing::info!(source = %self.source.name(), "Triggered updater started");
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    trigger = triggers.recv() => match trigger {
                        Some(()) => {
                            self.tick();
                        }
                        None => break,
                    },
                }
            }
            tracing::info!(source = %self.source.name(), "Triggered updater stopped");
        });

        UpdaterHandle::new(shutdown_tx, task)
    }
}

impl<T> LatestValue<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an updater publishing into this handle's store.
    pub fn updater<S>(&self, source: S) -> Updater<T, S>
    where
        S: PayloadSource<T> + 'static,
    {
        let updater = Updater::new(Arc::clone(self.store()), source);

        #[cfg(feature = "metrics")]
        let updater = match self.metrics() {
            Some(metrics) => updater.with_metrics(metrics.clone()),
            None => updater,
        };

        updater
    }
}

/// Handle to a running updater task.
///
/// Dropping the handle aborts the task; [`shutdown`](Self::shutdown) stops
/// it between ticks and waits for it.
pub struct UpdaterHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl UpdaterHandle {
    fn new(shutdown: oneshot::Sender<()>, task: JoinHandle<()>) -> Self {
        Self {
            shutdown: Some(shutdown),
            task: Some(task),
        }
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Stop the updater and wait for its task to finish.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Updater task ended abnormally");
            }
        }
    }
}

impl Drop for UpdaterHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PollError;
    use crate::updater::{FnSource, SequenceSource};

    fn store() -> Arc<VersionedStore<String>> {
        Arc::new(VersionedStore::new(String::new()))
    }

    #[test]
    fn test_tick_publishes() {
        let store = store();
        let mut updater = Updater::new(Arc::clone(&store), SequenceSource::new("Update #"));

        let snapshot = updater.tick().unwrap();
        assert_eq!(snapshot.version, 1);
        assert_eq!(store.read().payload, "Update #1");
    }

    #[test]
    fn test_failed_tick_keeps_last_good_value() {
        let store = store();
        let mut ok = true;
        let source = FnSource::new("alternating", move || {
            ok = !ok;
            if ok {
                Err(PollError::producer("sensor offline"))
            } else {
                Ok(Some("reading".to_string()))
            }
        });
        let mut updater = Updater::new(Arc::clone(&store), source);

        assert!(updater.tick().is_some());
        assert!(updater.tick().is_none());
        assert_eq!(store.version(), 1);
        assert_eq!(store.read().payload, "reading");

        assert_eq!(updater.tick().unwrap().version, 2);
    }

    #[test]
    fn test_empty_tick_does_not_bump_version() {
        let store = store();
        let mut updater = Updater::new(
            Arc::clone(&store),
            FnSource::new("idle", || -> crate::error::Result<Option<String>> { Ok(None) }),
        );
        assert!(updater.tick().is_none());
        assert_eq!(store.version(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_ticks_on_cadence() {
        let latest: LatestValue = LatestValue::default();
        let handle = latest
            .updater(SequenceSource::new("Update #"))
            .spawn(Duration::from_secs(10));
        let started = Instant::now();

        let first = latest.await_newer(0, Duration::from_secs(20)).await.unwrap();
        assert_eq!(first.payload, "Update #1");
        assert!(started.elapsed() >= Duration::from_secs(10));

        let second = latest.await_newer(1, Duration::from_secs(20)).await.unwrap();
        assert_eq!(second.payload, "Update #2");
        assert!(started.elapsed() >= Duration::from_secs(20));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_publishing() {
        let latest: LatestValue = LatestValue::default();
        let handle = latest
            .updater(SequenceSource::new("n"))
            .spawn(Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(350)).await;
        handle.shutdown().await;
        let version = latest.store().version();
        assert_eq!(version, 3);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(latest.store().version(), version);
    }

    #[tokio::test]
    async fn test_triggered_updater() {
        let latest: LatestValue = LatestValue::default();
        let (tx, rx) = mpsc::channel(4);
        let handle = latest.updater(SequenceSource::new("t")).spawn_triggered(rx);

        tx.send(()).await.unwrap();
        let value = latest.await_newer(0, Duration::from_secs(5)).await.unwrap();
        assert_eq!(value.payload, "t1");

        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), async {
            while !handle.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }
}
