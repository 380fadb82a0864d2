//! Error types for the request engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for fallible crate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Nested error body carried by remote envelopes and faults: `{ "message": "..." }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorBody {
            message: message.into(),
        }
    }
}

/// A fault raised by a remote operation after the server answered.
///
/// Mirrors what an HTTP client collaborator reports for a non-2xx response:
/// an optional status, an optional decoded `{ error: { message } }` body and
/// an optional top-level message of its own.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteFault {
    pub status: Option<u16>,
    pub body: Option<ErrorBody>,
    pub message: Option<String>,
}

impl RemoteFault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_body(mut self, message: impl Into<String>) -> Self {
        self.body = Some(ErrorBody::new(message));
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Error types for the request engine.
///
/// Executor operations never return these to the caller: they are normalized
/// into a message (see [`crate::envelope::FailureMessage`]) and surfaced through
/// `RequestState::error` and the returned `ExecuteResult`. Cache operations
/// return them directly.
#[derive(Debug, Clone)]
pub enum Error {
    /// The remote operation failed before any response was received.
    ///
    /// Common causes:
    /// - Connection refused or reset
    /// - DNS failure
    /// - Client-side timeout
    Transport(String),

    /// The remote operation answered with an error response.
    Remote(RemoteFault),

    /// The remote operation reported success but the envelope is malformed
    /// (for example `success: true` without `data`).
    Shape(String),

    /// Serialization failed when encoding a payload for the cache.
    SerializationError(String),

    /// Deserialization failed when decoding cached bytes.
    ///
    /// **Recovery:** the entry is evicted and treated as a miss.
    DeserializationError(String),

    /// Cached bytes do not start with the expected magic header.
    InvalidCacheEntry(String),

    /// Cached bytes were written with another schema version.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// Cache backend storage error.
    BackendError(String),

    /// Invalid configuration.
    ConfigError(String),

    /// Operation not supported by this backend.
    NotImplemented(String),

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(msg) => write!(f, "{}", msg),
            Error::Remote(fault) => match (&fault.message, fault.status) {
                (Some(msg), _) => write!(f, "{}", msg),
                (None, Some(status)) => write!(f, "Request failed with status {}", status),
                (None, None) => write!(f, "Request failed"),
            },
            Error::Shape(msg) => write!(f, "Malformed response: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            Error::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

impl From<RemoteFault> for Error {
    fn from(fault: RemoteFault) -> Self {
        Error::Remote(fault)
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
