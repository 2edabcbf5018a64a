//! Settings validation support.

use crate::error::ValidationError;

/// Trait for validating loaded settings before they are used.
///
/// # Examples
///
/// ```rust
/// use hotswap_poll::core::Validate;
/// use hotswap_poll::error::ValidationError;
///
/// struct Feed {
///     label: String,
/// }
///
/// impl Validate for Feed {
///     fn validate(&self) -> Result<(), ValidationError> {
///         if self.label.is_empty() {
///             return Err(ValidationError::invalid_field("label", "must not be empty"));
///         }
///         Ok(())
///     }
/// }
///
/// assert!(Feed { label: String::new() }.validate().is_err());
/// ```
pub trait Validate {
    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Should return a `ValidationError` describing what validation failed.
    fn validate(&self) -> Result<(), ValidationError>;
}
