//! Helpers for transport layers that expose the two poll operations.
//!
//! The response shape mirrors what polling clients expect:
//! `{ "newData": "Update #3", "id": 3 }` when there is news and
//! `{ "newData": null }` when there is not.

use crate::core::VersionedValue;
use serde::Serialize;

#[cfg(feature = "json")]
use crate::error::{PollError, Result};

/// Parse the caller's last seen version from a raw request parameter.
///
/// Missing, blank, non-numeric, negative, or out-of-range input means
/// "nothing seen yet" and yields 0.
///
/// # Examples
///
/// ```rust
/// use hotswap_poll::wire::parse_baseline;
///
/// assert_eq!(parse_baseline(Some("42")), 42);
/// assert_eq!(parse_baseline(Some("-3")), 0);
/// assert_eq!(parse_baseline(Some("soon")), 0);
/// assert_eq!(parse_baseline(None), 0);
/// ```
pub fn parse_baseline(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

/// Serializable result of a peek or long poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollResponse<'a, T> {
    /// The new payload, `null` when there is no update
    #[serde(rename = "newData")]
    pub new_data: Option<&'a T>,
    /// Version of `new_data`, omitted when there is no update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl<'a, T> PollResponse<'a, T> {
    /// Response for "no update since the caller's baseline".
    pub fn no_update() -> Self {
        Self {
            new_data: None,
            id: None,
        }
    }

    /// Response for the result of `peek` or `await_newer`.
    pub fn from_result(result: Option<&'a VersionedValue<T>>) -> Self {
        match result {
            Some(value) => Self {
                new_data: Some(&value.payload),
                id: Some(value.version),
            },
            None => Self::no_update(),
        }
    }

    /// Whether this response carries new data.
    pub fn has_update(&self) -> bool {
        self.new_data.is_some()
    }

    /// Render as JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String>
    where
        T: Serialize,
    {
        serde_json::to_string(self)
            .map_err(|e| PollError::Other(format!("Failed to serialize poll response: {}", e)))
    }
}
