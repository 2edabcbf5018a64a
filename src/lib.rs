//! # hotswap-poll
//!
//! Latest-value store with short-poll and notification-driven long-poll access.
//!
//! ## Overview
//!
//! `hotswap-poll` keeps exactly one value and a version counter that grows on
//! every update, and hands it out to any number of concurrent readers:
//! - Lock-free snapshot reads using `arc-swap`: version and payload are
//!   always observed together
//! - `peek`: returns at once with newer data or `None`
//! - `await_newer`: suspends the caller until newer data arrives or the
//!   timeout elapses, woken by notification instead of a sleep loop
//! - An updater that publishes on a cadence or on external triggers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hotswap_poll::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let (latest, settings) = LatestValue::<String>::builder()
//!     .with_env_overrides("POLL", "__")
//!     .build()?;
//!
//! // Publish "Update #1", "Update #2", ... every ten seconds
//! let _updater = latest
//!     .updater(SequenceSource::new(settings.label_prefix.clone()))
//!     .spawn(settings.update_interval());
//!
//! // Short poll: immediate answer
//! assert!(latest.peek(0).is_none());
//!
//! // Long poll: wait up to twenty seconds for version 1
//! if let Some(value) = latest.await_newer(0, settings.long_poll_timeout()).await {
//!     println!("{} (version {})", value.payload, value.version);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `file-watch` (default): publish a file's contents whenever it changes
//! - `json` (default): render poll responses as JSON
//! - `metrics`: OpenTelemetry counters for polls and publishes

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod settings;
pub mod updater;
pub mod wire;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{LatestValue, LatestValueBuilder, VersionedStore, VersionedValue};
    pub use crate::error::{PollError, Result, ValidationError};
    pub use crate::settings::PollSettings;
    pub use crate::updater::{PayloadSource, SequenceSource, Updater, UpdaterHandle};
    pub use crate::wire::{PollResponse, parse_baseline};
}
