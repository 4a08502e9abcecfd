//! A general-purpose failure value with optional classification fields.
//!
//! Handlers that talk to HTTP APIs, sockets and managed databases see errors
//! of many shapes. `Failure` captures the handful of fields the retry
//! classifier understands (`status`, `code`, `name`) next to a human-readable
//! `message`, so heterogeneous errors can be normalized into one type before
//! they enter a retry loop.
//!
//! # Examples
//!
//! ```
//! use slackwater::{Classify, Failure};
//!
//! let throttled = Failure::new("slow down").with_status(429);
//! assert!(throttled.is_retryable());
//!
//! let missing = Failure::new("no such item").with_status(404);
//! assert!(!missing.is_retryable());
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Code reported for an operation that did not finish before its deadline.
pub const ETIMEDOUT: &str = "ETIMEDOUT";

/// Code reported for a connection the peer reset.
pub const ECONNRESET: &str = "ECONNRESET";

/// Name reported for an operation cancelled through an abort signal.
pub const ABORT_ERROR: &str = "AbortError";

/// Message used by the timeout guard when the caller supplies none.
pub const DEFAULT_TIMEOUT_MESSAGE: &str = "Operation timed out";

/// An error-like value with optional `status`, `code` and `name` fields.
///
/// Every field except `message` is optional; consumers must never assume one
/// is present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Failure {
    /// HTTP-style status code, when the failure came from a response.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub status: Option<u16>,
    /// Short symbolic code such as `ECONNRESET`.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub code: Option<String>,
    /// Classification tag such as `AbortError`.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl Failure {
    /// Create a failure carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// The failure synthesized when a deadline expires.
    ///
    /// An empty message falls back to [`DEFAULT_TIMEOUT_MESSAGE`].
    ///
    /// ```
    /// use slackwater::Failure;
    ///
    /// let failure = Failure::timeout("");
    /// assert_eq!(failure.code.as_deref(), Some("ETIMEDOUT"));
    /// assert_eq!(failure.message, "Operation timed out");
    /// ```
    pub fn timeout(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            DEFAULT_TIMEOUT_MESSAGE.to_string()
        } else {
            message
        };
        Self::new(message).with_code(ETIMEDOUT)
    }

    /// Attach an HTTP-style status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach a symbolic error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach a classification name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns true if this failure carries the timeout code.
    pub fn is_timeout(&self) -> bool {
        self.code.as_deref() == Some(ETIMEDOUT)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, self.status) {
            (Some(code), _) => write!(f, "{} ({})", self.message, code),
            (None, Some(status)) => write!(f, "{} (status {})", self.message, status),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl StdError for Failure {}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<io::Error> for Failure {
    fn from(err: io::Error) -> Self {
        let failure = Self::new(err.to_string());
        match io_error_code(err.kind()) {
            Some(code) => failure.with_code(code),
            None => failure,
        }
    }
}

/// POSIX-style code for the I/O error kinds that have a well-known one.
pub(crate) fn io_error_code(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::ConnectionReset => Some(ECONNRESET),
        io::ErrorKind::TimedOut => Some(ETIMEDOUT),
        io::ErrorKind::ConnectionRefused => Some("ECONNREFUSED"),
        io::ErrorKind::ConnectionAborted => Some("ECONNABORTED"),
        io::ErrorKind::BrokenPipe => Some("EPIPE"),
        io::ErrorKind::NotFound => Some("ENOENT"),
        io::ErrorKind::PermissionDenied => Some("EACCES"),
        _ => None,
    }
}
