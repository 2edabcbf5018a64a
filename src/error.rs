//! Error types for hotswap-poll.
//!
//! Note that neither a missing update nor an expired long poll is an error:
//! both surface as `None` from the query operations.

use std::fmt;

/// Result type alias for hotswap-poll operations.
pub type Result<T> = std::result::Result<T, PollError>;

/// Errors that can occur around the latest-value core.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// Failed to load settings from defaults, file, or environment.
    #[error("Failed to load settings: {0}")]
    SettingsError(String),

    /// Settings were loaded but did not pass validation.
    #[error("Settings validation failed: {0}")]
    ValidationError(String),

    /// A payload source could not produce the next value.
    #[error("Payload producer failed: {0}")]
    Producer(String),

    /// File watching is not supported or failed to initialize.
    #[error("File watching error: {0}")]
    WatchError(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error for other cases.
    #[error("Poll error: {0}")]
    Other(String),
}

impl PollError {
    /// Create a producer failure from any displayable cause.
    pub fn producer(msg: impl fmt::Display) -> Self {
        Self::Producer(msg.to_string())
    }
}

/// Validation error for settings validation.
#[derive(Debug)]
pub enum ValidationError {
    /// Custom validation error with a message.
    Custom(String),

    /// A specific field has an invalid value.
    InvalidField {
        /// The field name/path
        field: String,
        /// The reason why it's invalid
        reason: String,
    },

    /// Multiple validation errors occurred.
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Collapse a list of errors: `None` when empty, the single error when
    /// there is one, `Multiple` otherwise.
    pub fn from_vec(mut errors: Vec<ValidationError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => write!(f, "{}", msg),
            Self::InvalidField { field, reason } => {
                write!(f, "Field '{}' is invalid: {}", field, reason)
            }
            Self::Multiple(errors) => {
                writeln!(f, "Multiple validation errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for PollError {
    fn from(err: ValidationError) -> Self {
        PollError::ValidationError(err.to_string())
    }
}

impl From<config::ConfigError> for PollError {
    fn from(err: config::ConfigError) -> Self {
        PollError::SettingsError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_collapses() {
        assert!(ValidationError::from_vec(Vec::new()).is_none());

        let single = ValidationError::from_vec(vec![ValidationError::custom("one")]).unwrap();
        assert!(matches!(single, ValidationError::Custom(_)));

        let many = ValidationError::from_vec(vec![
            ValidationError::custom("one"),
            ValidationError::invalid_field("two", "bad"),
        ])
        .unwrap();
        let rendered = many.to_string();
        assert!(rendered.contains("1. one"));
        assert!(rendered.contains("2. Field 'two' is invalid: bad"));
    }

    #[test]
    fn test_validation_converts_to_poll_error() {
        let err: PollError = ValidationError::invalid_field("update_interval", "must be > 0").into();
        assert!(matches!(err, PollError::ValidationError(_)));
        assert!(err.to_string().contains("update_interval"));
    }
}
