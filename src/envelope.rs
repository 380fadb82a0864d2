//! Remote result envelopes, execution results and failure-message resolution.
//!
//! A remote operation answers with an [`Envelope`]:
//!
//! ```json
//! { "success": true,  "data": { ... } }
//! { "success": false, "error": { "message": "Email already taken" } }
//! { "success": false, "message": "Unauthorized" }
//! ```
//!
//! Success is the explicit `success` field, never the absence of an error.
//! Every failure, whether an envelope with `success: false` or a thrown
//! [`Error`], is turned into one user-facing message by [`resolve_message`]:
//! nested `error.message`, then top-level `message`, then
//! [`DEFAULT_ERROR_MESSAGE`].

use crate::error::{Error, ErrorBody};
use serde::{Deserialize, Serialize};

/// Message used when a failure carries no usable message.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// The uniform `{success, data | error}` shape returned by a remote operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Successful envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Envelope {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// Failed envelope with a nested `error.message`.
    pub fn fail(message: impl Into<String>) -> Self {
        Envelope {
            success: false,
            data: None,
            error: Some(ErrorBody::new(message)),
            message: None,
        }
    }

    /// Failed envelope with only a top-level `message`.
    pub fn fail_with_message(message: impl Into<String>) -> Self {
        Envelope {
            success: false,
            data: None,
            error: None,
            message: Some(message.into()),
        }
    }
}

/// Outcome of one `execute` call as seen by the caller.
///
/// Never an `Err`: exhausted failures come back as `success: false` with the
/// resolved message in `error`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResult<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(default)]
    pub from_cache: bool,
}

impl<T> ExecuteResult<T> {
    pub fn fetched(data: T) -> Self {
        ExecuteResult {
            success: true,
            data: Some(data),
            error: None,
            from_cache: false,
        }
    }

    pub fn cached(data: T) -> Self {
        ExecuteResult {
            success: true,
            data: Some(data),
            error: None,
            from_cache: true,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        ExecuteResult {
            success: false,
            data: None,
            error: Some(ErrorBody::new(message)),
            from_cache: false,
        }
    }

    /// The failure message, if this result is a failure.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

/// Anything that can be normalized into a failure message.
pub trait FailureMessage {
    /// The message nested under `error.message`, if any.
    fn nested_message(&self) -> Option<&str>;

    /// The top-level `message`, if any.
    fn top_level_message(&self) -> Option<String>;
}

impl<T> FailureMessage for Envelope<T> {
    fn nested_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    fn top_level_message(&self) -> Option<String> {
        self.message.clone()
    }
}

impl FailureMessage for Error {
    fn nested_message(&self) -> Option<&str> {
        match self {
            Error::Remote(fault) => fault.body.as_ref().map(|b| b.message.as_str()),
            _ => None,
        }
    }

    fn top_level_message(&self) -> Option<String> {
        match self {
            Error::Remote(fault) => fault.message.clone(),
            other => Some(other.to_string()),
        }
    }
}

/// Resolve a failure to a message: nested, then top-level, then the default.
///
/// Blank messages are skipped.
pub fn resolve_message<F: FailureMessage + ?Sized>(failure: &F) -> String {
    if let Some(nested) = failure.nested_message().filter(|m| !m.trim().is_empty()) {
        return nested.to_string();
    }

    failure
        .top_level_message()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
}
