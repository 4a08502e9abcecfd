//! Error type produced by the timeout guard.

use std::time::Duration;

use crate::classify::Classify;
use crate::failure::{Failure, DEFAULT_TIMEOUT_MESSAGE, ETIMEDOUT};

/// Outcome of a guarded operation that did not succeed.
///
/// Either the deadline expired first ([`TimeoutError::Timeout`]), or the
/// operation failed on its own ([`TimeoutError::Inner`]). The inner error is
/// carried verbatim; the two are never merged.
///
/// # Examples
///
/// ```rust
/// use slackwater::{with_timeout, TimeoutError};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let slow = async {
///     tokio::time::sleep(Duration::from_secs(10)).await;
///     Ok::<_, String>(42)
/// };
///
/// match with_timeout(slow, Duration::from_millis(10), None).await {
///     Err(TimeoutError::Timeout { duration, message }) => {
///         assert_eq!(duration, Duration::from_millis(10));
///         assert_eq!(message, "Operation timed out");
///     }
///     _ => panic!("Expected timeout"),
/// }
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeoutError<E> {
    /// The deadline expired before the operation completed.
    Timeout {
        /// The (clamped) deadline that was exceeded.
        duration: Duration,
        /// Caller-supplied message, or the default one.
        message: String,
    },
    /// The operation failed before the deadline.
    Inner(E),
}

impl<E> TimeoutError<E> {
    /// Create a timeout error; an empty or missing message uses the default.
    pub fn timeout(duration: Duration, message: Option<&str>) -> Self {
        let message = match message {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => DEFAULT_TIMEOUT_MESSAGE.to_string(),
        };
        Self::Timeout { duration, message }
    }

    /// Create an inner error.
    pub fn inner(error: E) -> Self {
        Self::Inner(error)
    }

    /// Returns true if the deadline expired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if the operation failed on its own.
    pub fn is_inner(&self) -> bool {
        matches!(self, Self::Inner(_))
    }

    /// Get the inner error if present.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Timeout { .. } => None,
        }
    }

    /// Transform the inner error, leaving timeouts untouched.
    pub fn map_inner<F, E2>(self, f: F) -> TimeoutError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            Self::Timeout { duration, message } => TimeoutError::Timeout { duration, message },
            Self::Inner(e) => TimeoutError::Inner(f(e)),
        }
    }

    /// Collapse both arms into a single error type.
    ///
    /// ```rust
    /// use slackwater::TimeoutError;
    /// use std::time::Duration;
    ///
    /// let err: TimeoutError<String> = TimeoutError::timeout(Duration::from_secs(1), None);
    /// let flat = err.unify(|message| format!("deadline: {}", message));
    /// assert_eq!(flat, "deadline: Operation timed out");
    /// ```
    pub fn unify<F>(self, on_timeout: F) -> E
    where
        F: FnOnce(String) -> E,
    {
        match self {
            Self::Timeout { message, .. } => on_timeout(message),
            Self::Inner(e) => e,
        }
    }
}

impl<E: Classify> Classify for TimeoutError<E> {
    fn status(&self) -> Option<u16> {
        match self {
            Self::Timeout { .. } => None,
            Self::Inner(e) => e.status(),
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            Self::Timeout { .. } => Some(ETIMEDOUT),
            Self::Inner(e) => e.code(),
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            Self::Timeout { .. } => None,
            Self::Inner(e) => e.name(),
        }
    }
}

impl From<TimeoutError<Failure>> for Failure {
    fn from(err: TimeoutError<Failure>) -> Self {
        err.unify(|message| Failure::timeout(message))
    }
}

impl<E: std::fmt::Display> std::fmt::Display for TimeoutError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { message, .. } => write!(f, "{}", message),
            Self::Inner(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for TimeoutError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timeout { .. } => None,
            Self::Inner(e) => Some(e),
        }
    }
}
