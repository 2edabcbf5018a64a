//! File watching that triggers updater ticks.

use crate::error::{PollError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Watches one file and emits a trigger after each burst of changes.
///
/// Uses the `notify` crate for change events. Events closer together than the
/// debounce window collapse into a single trigger, and triggers that the
/// updater has not consumed yet are not queued twice.
///
/// Dropping the watcher stops watching and closes the trigger channel.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_poll::prelude::*;
/// use hotswap_poll::updater::{FileSource, FileWatcher};
/// use std::time::Duration;
///
/// # async fn example() -> Result<()> {
/// let latest: LatestValue = LatestValue::default();
/// let (watcher, triggers) = FileWatcher::new("feed.txt", Duration::from_millis(200))?;
/// let handle = latest
///     .updater(FileSource::new(watcher.path()))
///     .spawn_triggered(triggers);
/// # Ok(())
/// # }
/// ```
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
    debounce: Duration,
}

impl FileWatcher {
    /// Start watching `path`.
    ///
    /// Returns the watcher and the receiver to hand to
    /// [`Updater::spawn_triggered`](crate::updater::Updater::spawn_triggered).
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be resolved or watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> Result<(Self, mpsc::Receiver<()>)> {
        let path = path
            .as_ref()
            .canonicalize()
            .map_err(|e| PollError::WatchError(format!("Failed to resolve path: {}", e)))?;

        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    let _ = event_tx.send(event);
                }
            }
        })
        .map_err(|e| PollError::WatchError(format!("Failed to create file watcher: {}", e)))?;

        watcher
            .watch(&path, RecursiveMode::NonRecursive)
            .map_err(|e| PollError::WatchError(format!("Failed to watch path: {}", e)))?;

        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let watched = path.clone();
        tokio::spawn(async move {
            while event_rx.recv().await.is_some() {
                // One save usually fires several events; wait them out.
                tokio::time::sleep(debounce).await;
                while event_rx.try_recv().is_ok() {}

                match trigger_tx.try_send(()) {
                    Ok(()) | Err(TrySendError::Full(())) => {}
                    Err(TrySendError::Closed(())) => break,
                }
                tracing::debug!(path = %watched.display(), "file change detected");
            }
        });

        Ok((
            Self {
                _watcher: watcher,
                path,
                debounce,
            },
            trigger_rx,
        ))
    }

    /// The canonical path being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the debounce duration for this watcher.
    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}
