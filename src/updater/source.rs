//! Payload sources consumed by the updater.

use crate::error::Result;

#[cfg(feature = "file-watch")]
use crate::error::PollError;
#[cfg(feature = "file-watch")]
use std::path::PathBuf;

/// Produces the payload for the next version.
///
/// Implement this trait to feed the store from anything: a counter, a
/// sensor, a file, a remote API.
pub trait PayloadSource<T>: Send {
    /// Produce the next payload.
    ///
    /// `Ok(None)` means there is nothing new to publish on this tick.
    ///
    /// # Errors
    ///
    /// An error skips the tick; the store keeps its last good value.
    fn next_payload(&mut self) -> Result<Option<T>>;

    /// Get a human-readable name for this source (for logging/debugging).
    fn name(&self) -> String;
}

/// Labels every tick with an increasing counter: `"Update #1"`, `"Update #2"`, ...
///
/// # Examples
///
/// ```rust
/// use hotswap_poll::updater::{PayloadSource, SequenceSource};
///
/// let mut source = SequenceSource::new("Update #");
/// assert_eq!(source.next_payload().unwrap().as_deref(), Some("Update #1"));
/// assert_eq!(source.next_payload().unwrap().as_deref(), Some("Update #2"));
/// ```
#[derive(Debug, Clone)]
pub struct SequenceSource {
    prefix: String,
    count: u64,
}

impl SequenceSource {
    /// Create a sequence that starts at 1.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            count: 0,
        }
    }

    /// Number of labels produced so far.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl PayloadSource<String> for SequenceSource {
    fn next_payload(&mut self) -> Result<Option<String>> {
        self.count += 1;
        Ok(Some(format!("{}{}", self.prefix, self.count)))
    }

    fn name(&self) -> String {
        format!("sequence '{}'", self.prefix)
    }
}

/// Wraps a closure as a payload source.
pub struct FnSource<F> {
    name: String,
    produce: F,
}

impl<F> FnSource<F> {
    /// Create a source named `name` that calls `produce` on every tick.
    pub fn new(name: impl Into<String>, produce: F) -> Self {
        Self {
            name: name.into(),
            produce,
        }
    }
}

impl<T, F> PayloadSource<T> for FnSource<F>
where
    F: FnMut() -> Result<Option<T>> + Send,
{
    fn next_payload(&mut self) -> Result<Option<T>> {
        (self.produce)()
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Publishes the contents of a file whenever they differ from the last
/// published contents.
///
/// Pair it with [`FileWatcher`](crate::updater::FileWatcher) and
/// [`Updater::spawn_triggered`](crate::updater::Updater::spawn_triggered) to
/// publish on every save.
///
/// The file is read synchronously on the updater task, which occupies a
/// runtime worker for the duration of the read. Keep watched files small;
/// read large feeds in `tokio::task::spawn_blocking` and publish them with
/// [`VersionedStore::update`](crate::core::VersionedStore::update).
#[cfg(feature = "file-watch")]
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    last: Option<String>,
}

#[cfg(feature = "file-watch")]
impl FileSource {
    /// Create a source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last: None,
        }
    }
}

#[cfg(feature = "file-watch")]
impl PayloadSource<String> for FileSource {
    fn next_payload(&mut self) -> Result<Option<String>> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            PollError::producer(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        if self.last.as_deref() == Some(contents.as_str()) {
            return Ok(None);
        }
        self.last = Some(contents.clone());
        Ok(Some(contents))
    }

    fn name(&self) -> String {
        format!("file '{}'", self.path.display())
    }
}
