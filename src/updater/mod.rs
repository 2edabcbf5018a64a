//! Producers that publish new values into the store.
//!
//! An [`Updater`] pulls payloads from a [`PayloadSource`] either on a fixed
//! cadence or whenever a trigger arrives (for example from a [`FileWatcher`]).

mod source;
mod ticker;

#[cfg(feature = "file-watch")]
mod watcher;

pub use source::{FnSource, PayloadSource, SequenceSource};
pub use ticker::{Updater, UpdaterHandle};

#[cfg(feature = "file-watch")]
pub use source::FileSource;
#[cfg(feature = "file-watch")]
pub use watcher::FileWatcher;
