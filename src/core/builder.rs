//! Builder for constructing LatestValue handles.

use crate::core::{LatestValue, Validate, VersionedStore};
use crate::error::Result;
use crate::settings::PollSettings;
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::PollMetrics;

/// Builder for a `LatestValue` handle and its settings.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_poll::prelude::*;
///
/// # fn example() -> Result<()> {
/// let (latest, settings) = LatestValue::<String>::builder()
///     .with_settings_file("config/poll.yaml")
///     .with_env_overrides("POLL", "__")
///     .build()?;
///
/// assert!(latest.peek(0).is_none());
/// println!("ticking every {:?}", settings.update_interval());
/// # Ok(())
/// # }
/// ```
pub struct LatestValueBuilder<T> {
    initial: Option<T>,
    settings: Option<PollSettings>,
    settings_file: Option<PathBuf>,
    env: Option<(String, String)>,
    #[cfg(feature = "metrics")]
    meter: Option<opentelemetry::metrics::Meter>,
}

impl<T> LatestValueBuilder<T> {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            initial: None,
            settings: None,
            settings_file: None,
            env: None,
            #[cfg(feature = "metrics")]
            meter: None,
        }
    }

    /// Payload held at version 0. Defaults to `T::default()`.
    pub fn with_initial(mut self, initial: T) -> Self {
        self.initial = Some(initial);
        self
    }

    /// Use these settings as-is instead of loading them.
    pub fn with_settings(mut self, settings: PollSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Load settings from a YAML, TOML, or JSON file layered over defaults.
    pub fn with_settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_file = Some(path.into());
        self
    }

    /// Allow environment variables to override file and default settings.
    pub fn with_env_overrides(mut self, prefix: &str, separator: &str) -> Self {
        self.env = Some((prefix.to_string(), separator.to_string()));
        self
    }

    /// Record poll and publish activity with OpenTelemetry.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.meter = Some(meter);
        self
    }

    /// Build the handle and return it with the settings that shaped it.
    ///
    /// # Errors
    ///
    /// Returns an error if settings cannot be loaded or fail validation.
    pub fn build(self) -> Result<(LatestValue<T>, PollSettings)>
    where
        T: Default,
    {
        let settings = match self.settings {
            Some(settings) => {
                settings.validate()?;
                settings
            }
            None => {
                let mut loader = PollSettings::loader();
                if let Some(path) = self.settings_file {
                    loader = loader.with_file(path);
                }
                if let Some((prefix, separator)) = &self.env {
                    loader = loader.with_env_overrides(prefix, separator);
                }
                loader.load()?
            }
        };

        let store = Arc::new(VersionedStore::new(self.initial.unwrap_or_default()));
        let latest = LatestValue::from_store(store);

        #[cfg(feature = "metrics")]
        let latest = match self.meter {
            Some(meter) => latest.with_metrics(PollMetrics::new(meter)),
            None => latest,
        };

        Ok((latest, settings))
    }
}

impl<T> Default for LatestValueBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LatestValue<T> {
    /// Create a new builder for constructing a handle.
    pub fn builder() -> LatestValueBuilder<T> {
        LatestValueBuilder::new()
    }
}
