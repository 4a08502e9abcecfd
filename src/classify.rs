//! Transient-failure classification.
//!
//! Deciding whether a failure is worth retrying is a pure function of a few
//! optional fields on the error. The [`Classify`] trait exposes those fields
//! for any error type, and [`is_retryable`] applies the decision rule:
//!
//! 1. an absent failure is not retryable,
//! 2. status `429` or any `5xx` status is retryable,
//! 3. the name `AbortError` is retryable,
//! 4. the codes `ECONNRESET` and `ETIMEDOUT` are retryable,
//! 5. everything else is not.
//!
//! The rule is deliberately narrow: client errors other than `429` never
//! retry.
//!
//! # Examples
//!
//! ```
//! use slackwater::{is_retryable, Failure};
//!
//! assert!(is_retryable(Some(&Failure::new("busy").with_status(503))));
//! assert!(is_retryable(Some(&Failure::new("reset").with_code("ECONNRESET"))));
//! assert!(!is_retryable(Some(&Failure::new("bad input").with_status(400))));
//! assert!(!is_retryable::<Failure>(None));
//! ```

use std::io;
use std::sync::Arc;

use crate::failure::{io_error_code, Failure, ABORT_ERROR, ECONNRESET, ETIMEDOUT};

/// Read access to the classification fields of an error.
///
/// All methods default to "absent", so plain error types can opt in with an
/// empty impl and only override what they actually know.
///
/// ```
/// use slackwater::Classify;
///
/// #[derive(Debug)]
/// enum DbError {
///     Throttled,
///     Conflict,
/// }
///
/// impl Classify for DbError {
///     fn status(&self) -> Option<u16> {
///         match self {
///             DbError::Throttled => Some(429),
///             DbError::Conflict => Some(409),
///         }
///     }
/// }
///
/// assert!(DbError::Throttled.is_retryable());
/// assert!(!DbError::Conflict.is_retryable());
/// ```
pub trait Classify {
    /// HTTP-style status code, if any.
    fn status(&self) -> Option<u16> {
        None
    }

    /// Symbolic error code, if any.
    fn code(&self) -> Option<&str> {
        None
    }

    /// Classification name, if any.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Apply the retry decision rule to this failure.
    fn is_retryable(&self) -> bool {
        classify_fields(self.status(), self.code(), self.name())
    }
}

/// Decide whether `failure` is transient and worth another attempt.
///
/// `None` stands for an absent failure and is never retryable.
pub fn is_retryable<E>(failure: Option<&E>) -> bool
where
    E: Classify + ?Sized,
{
    match failure {
        Some(failure) => failure.is_retryable(),
        None => false,
    }
}

fn classify_fields(status: Option<u16>, code: Option<&str>, name: Option<&str>) -> bool {
    if let Some(status) = status {
        if status == 429 || (500..600).contains(&status) {
            return true;
        }
    }

    if name == Some(ABORT_ERROR) {
        return true;
    }

    matches!(code, Some(ECONNRESET) | Some(ETIMEDOUT))
}

impl Classify for Failure {
    fn status(&self) -> Option<u16> {
        self.status
    }

    fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Classify for io::Error {
    fn code(&self) -> Option<&str> {
        io_error_code(self.kind())
    }
}

// Bare messages carry no classification fields.
impl Classify for String {}

impl Classify for str {}

impl<T: Classify + ?Sized> Classify for &T {
    fn status(&self) -> Option<u16> {
        (**self).status()
    }

    fn code(&self) -> Option<&str> {
        (**self).code()
    }

    fn name(&self) -> Option<&str> {
        (**self).name()
    }
}

impl<T: Classify + ?Sized> Classify for Box<T> {
    fn status(&self) -> Option<u16> {
        (**self).status()
    }

    fn code(&self) -> Option<&str> {
        (**self).code()
    }

    fn name(&self) -> Option<&str> {
        (**self).name()
    }
}

impl<T: Classify + ?Sized> Classify for Arc<T> {
    fn status(&self) -> Option<u16> {
        (**self).status()
    }

    fn code(&self) -> Option<&str> {
        (**self).code()
    }

    fn name(&self) -> Option<&str> {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_failure_is_not_retryable() {
        assert!(!is_retryable::<Failure>(None));
    }

    #[test]
    fn test_rate_limit_and_server_errors_retry() {
        for status in [429, 500, 502, 503, 504, 599] {
            let failure = Failure::new("http").with_status(status);
            assert!(failure.is_retryable(), "status {} should retry", status);
        }
    }

    #[test]
    fn test_client_errors_do_not_retry() {
        for status in [400, 401, 403, 404, 409, 422, 428, 430, 600, 200] {
            let failure = Failure::new("http").with_status(status);
            assert!(!failure.is_retryable(), "status {} should not retry", status);
        }
    }

    #[test]
    fn test_abort_error_retries() {
        let failure = Failure::new("aborted").with_name("AbortError");
        assert!(failure.is_retryable());

        let other = Failure::new("type").with_name("TypeError");
        assert!(!other.is_retryable());
    }

    #[test]
    fn test_network_codes_retry() {
        assert!(Failure::new("reset").with_code("ECONNRESET").is_retryable());
        assert!(Failure::new("slow").with_code("ETIMEDOUT").is_retryable());
        assert!(!Failure::new("refused").with_code("ECONNREFUSED").is_retryable());
        assert!(!Failure::new("lower").with_code("econnreset").is_retryable());
    }

    #[test]
    fn test_non_retryable_status_falls_through_to_code() {
        let failure = Failure::new("reset mid-response")
            .with_status(404)
            .with_code(ECONNRESET);
        assert!(failure.is_retryable());
    }

    #[test]
    fn test_plain_failure_is_not_retryable() {
        assert!(!Failure::new("validation failed").is_retryable());
        assert!(!"plain".is_retryable());
        assert!(!String::from("plain").is_retryable());
    }

    #[test]
    fn test_io_error_kinds() {
        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        let timed_out = io::Error::new(io::ErrorKind::TimedOut, "timed out");
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");

        assert!(is_retryable(Some(&reset)));
        assert!(is_retryable(Some(&timed_out)));
        assert!(!is_retryable(Some(&refused)));
    }

    #[test]
    fn test_smart_pointers_delegate() {
        let boxed: Box<Failure> = Box::new(Failure::new("busy").with_status(503));
        let shared = Arc::new(Failure::new("reset").with_code(ECONNRESET));

        assert!(boxed.is_retryable());
        assert!(shared.is_retryable());
        assert!(is_retryable(Some(&&*boxed)));
    }
}
