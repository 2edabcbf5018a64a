//! Built-in metrics for poll operations.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Peek requests and how many found newer data
//! - Long polls, timeouts, and how long they waited
//! - Published versions and producer failures
//! - Suspended waiters and age of the current value
//!
//! # Examples
//!
//! ```rust,no_run
//! use hotswap_poll::prelude::*;
//! use opentelemetry::global;
//!
//! # fn example() -> Result<()> {
//! let meter = global::meter("my-app");
//!
//! let (latest, _settings) = LatestValue::<String>::builder()
//!     .with_metrics(meter)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod poll_metrics;

pub use poll_metrics::PollMetrics;
