//! Runtime settings for the updater cadence and long-poll bounds.
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional file (format picked from the extension), then environment
//! variables such as `POLL_UPDATE_INTERVAL_MS=500`.

use crate::core::Validate;
use crate::error::{PollError, Result, ValidationError};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default environment prefix for overrides.
pub const DEFAULT_ENV_PREFIX: &str = "POLL";

/// Default separator for nested environment keys.
pub const DEFAULT_ENV_SEPARATOR: &str = "__";

/// Settings shared by the updater and the long-poll facade.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    /// Time between two updater ticks
    pub update_interval_ms: u64,
    /// Long-poll timeout used when the caller does not ask for one
    pub long_poll_timeout_ms: u64,
    /// Upper bound for any caller-supplied long-poll timeout
    pub max_long_poll_timeout_ms: u64,
    /// Prefix of generated sequence payloads ("Update #1", "Update #2", ...)
    pub label_prefix: String,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            update_interval_ms: 10_000,
            long_poll_timeout_ms: 20_000,
            max_long_poll_timeout_ms: 60_000,
            label_prefix: "Update #".to_string(),
        }
    }
}

impl PollSettings {
    /// Start a layered load.
    pub fn loader() -> SettingsLoader {
        SettingsLoader::default()
    }

    /// Time between two updater ticks.
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    /// Long-poll timeout used when the caller does not ask for one.
    pub fn long_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.long_poll_timeout_ms)
    }

    /// Upper bound for any long-poll timeout.
    pub fn max_long_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.max_long_poll_timeout_ms)
    }

    /// Resolve a caller-supplied timeout: absent means the default, and the
    /// result never exceeds the maximum.
    pub fn resolve_timeout(&self, requested_ms: Option<u64>) -> Duration {
        let requested = requested_ms.unwrap_or(self.long_poll_timeout_ms);
        Duration::from_millis(requested.min(self.max_long_poll_timeout_ms))
    }
}

impl Validate for PollSettings {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut errors = Vec::new();

        if self.update_interval_ms == 0 {
            errors.push(ValidationError::invalid_field(
                "update_interval_ms",
                "must be greater than 0",
            ));
        }
        if self.max_long_poll_timeout_ms == 0 {
            errors.push(ValidationError::invalid_field(
                "max_long_poll_timeout_ms",
                "must be greater than 0",
            ));
        }
        if self.long_poll_timeout_ms > self.max_long_poll_timeout_ms {
            errors.push(ValidationError::invalid_field(
                "long_poll_timeout_ms",
                format!(
                    "must not exceed max_long_poll_timeout_ms ({})",
                    self.max_long_poll_timeout_ms
                ),
            ));
        }

        match ValidationError::from_vec(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Layered settings loader.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_poll::settings::PollSettings;
///
/// # fn example() -> hotswap_poll::error::Result<()> {
/// let settings = PollSettings::loader()
///     .with_file("config/poll.yaml")
///     .with_env_overrides("POLL", "__")
///     .load()?;
/// println!("tick every {:?}", settings.update_interval());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct SettingsLoader {
    file: Option<PathBuf>,
    env: Option<(String, String)>,
}

impl SettingsLoader {
    /// Layer a settings file over the defaults. The file must exist.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Layer environment variables `<prefix>_<KEY>` over file and defaults.
    pub fn with_env_overrides(mut self, prefix: &str, separator: &str) -> Self {
        self.env = Some((prefix.to_string(), separator.to_string()));
        self
    }

    /// Load, merge, and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file is missing, has an unknown extension, or fails to parse
    /// - A value has the wrong type
    /// - The merged settings fail validation
    pub fn load(self) -> Result<PollSettings> {
        let mut builder = Config::builder();

        if let Some(path) = &self.file {
            check_extension(path)?;
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        if let Some((prefix, separator)) = &self.env {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator(separator)
                    .try_parsing(true),
            );
        }

        let settings: PollSettings = builder
            .build()?
            .try_deserialize()
            .map_err(|e| PollError::SettingsError(format!("Failed to deserialize settings: {}", e)))?;

        settings.validate()?;
        tracing::debug!(?settings, "settings loaded");
        Ok(settings)
    }
}

fn check_extension(path: &Path) -> Result<()> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml" | "toml" | "json") => Ok(()),
        Some(other) => Err(PollError::SettingsError(format!(
            "Unsupported file extension: {}. Supported: .yaml, .yml, .toml, .json",
            other
        ))),
        None => Err(PollError::SettingsError(format!(
            "Unable to determine file format for: {}",
            path.display()
        ))),
    }
}
