//! Testing utilities for code built on slackwater.
//!
//! Retry and timeout logic is only trustworthy when it is exercised against
//! operations that fail in controlled ways. This module provides a scripted
//! operation, assertion macros, and (with the `proptest` feature) an
//! [`Arbitrary`](proptest::arbitrary::Arbitrary) impl for [`Failure`].
//!
//! # Examples
//!
//! ## ScriptedOperation
//!
//! ```rust
//! use slackwater::testing::ScriptedOperation;
//! use slackwater::{Failure, Retry};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let op = ScriptedOperation::succeeding("ok")
//!     .after_failures([Failure::timeout(""), Failure::timeout("")]);
//!
//! let result = Retry::new()
//!     .with_max_retries(3)
//!     .with_backoff(|_: u32| Duration::ZERO)
//!     .run(|attempt| op.call(attempt))
//!     .await;
//!
//! assert_eq!(result, Ok("ok"));
//! assert_eq!(op.calls(), 3);
//! assert_eq!(op.attempts(), vec![0, 1, 2]);
//! # });
//! ```
//!
//! ## Assertion Macros
//!
//! ```rust
//! use slackwater::{assert_timed_out, TimeoutError};
//! use std::time::Duration;
//!
//! let result: Result<(), TimeoutError<String>> =
//!     Err(TimeoutError::timeout(Duration::from_millis(10), None));
//! assert_timed_out!(result);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};

#[cfg(any(test, feature = "proptest"))]
use crate::failure::Failure;

/// An operation whose outcomes are scripted in advance.
///
/// Scripted outcomes are returned first, in order; once they run out every
/// further call returns a clone of the fallback outcome. Every call is
/// counted and the attempt index it received is recorded.
#[derive(Debug)]
pub struct ScriptedOperation<T, E> {
    script: Mutex<VecDeque<Result<T, E>>>,
    fallback: Result<T, E>,
    latency: Option<Duration>,
    calls: AtomicU32,
    attempts: Mutex<Vec<u32>>,
}

impl<T, E> ScriptedOperation<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn with_fallback(fallback: Result<T, E>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            latency: None,
            calls: AtomicU32::new(0),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// An operation that succeeds with `value` once the script is spent.
    pub fn succeeding(value: T) -> Self {
        Self::with_fallback(Ok(value))
    }

    /// An operation that fails with `error` once the script is spent.
    pub fn failing(error: E) -> Self {
        Self::with_fallback(Err(error))
    }

    /// Fail with each of `failures`, in order, before the fallback applies.
    pub fn after_failures(self, failures: impl IntoIterator<Item = E>) -> Self {
        self.after_outcomes(failures.into_iter().map(Err))
    }

    /// Return each of `outcomes`, in order, before the fallback applies.
    pub fn after_outcomes(self, outcomes: impl IntoIterator<Item = Result<T, E>>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(outcomes);
        self
    }

    /// Make every call take `latency` before resolving.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Invoke the operation for `attempt`.
    pub fn call(&self, attempt: u32) -> BoxFuture<'static, Result<T, E>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(attempt);

        let outcome = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match self.latency {
            Some(latency) => async move {
                tokio::time::sleep(latency).await;
                outcome
            }
            .boxed(),
            None => futures::future::ready(outcome).boxed(),
        }
    }

    /// How many times the operation was invoked.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// The attempt indices received, in call order.
    pub fn attempts(&self) -> Vec<u32> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Assert that a guarded result is a deadline expiry.
///
/// # Example
///
/// ```rust
/// use slackwater::{assert_timed_out, TimeoutError};
/// use std::time::Duration;
///
/// let result: Result<i32, TimeoutError<String>> =
///     Err(TimeoutError::timeout(Duration::from_secs(1), Some("slow")));
/// assert_timed_out!(result);
/// ```
#[macro_export]
macro_rules! assert_timed_out {
    ($result:expr) => {
        match $result {
            Err($crate::TimeoutError::Timeout { .. }) => {}
            Err($crate::TimeoutError::Inner(e)) => {
                panic!("Expected timeout, got inner error: {:?}", e);
            }
            Ok(v) => {
                panic!("Expected timeout, got Ok: {:?}", v);
            }
        }
    };
}

/// Assert that a failure is classified as retryable.
///
/// # Example
///
/// ```rust
/// use slackwater::{assert_retryable, Failure};
///
/// assert_retryable!(Failure::new("busy").with_status(503));
/// ```
#[macro_export]
macro_rules! assert_retryable {
    ($failure:expr) => {{
        let failure = &$failure;
        if !$crate::Classify::is_retryable(failure) {
            panic!("Expected retryable failure, got: {:?}", failure);
        }
    }};
}

/// Assert that a failure is classified as permanent.
///
/// # Example
///
/// ```rust
/// use slackwater::{assert_not_retryable, Failure};
///
/// assert_not_retryable!(Failure::new("missing").with_status(404));
/// ```
#[macro_export]
macro_rules! assert_not_retryable {
    ($failure:expr) => {{
        let failure = &$failure;
        if $crate::Classify::is_retryable(failure) {
            panic!("Expected non-retryable failure, got: {:?}", failure);
        }
    }};
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
impl Arbitrary for Failure {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        let code = prop_oneof![
            Just(crate::failure::ECONNRESET.to_string()),
            Just(crate::failure::ETIMEDOUT.to_string()),
            Just("ECONNREFUSED".to_string()),
            "[A-Z]{3,10}",
        ];
        let name = prop_oneof![
            Just(crate::failure::ABORT_ERROR.to_string()),
            Just("TypeError".to_string()),
            "[A-Za-z]{1,12}",
        ];

        (
            proptest::option::of(100u16..700),
            proptest::option::of(code),
            proptest::option::of(name),
            ".{0,32}",
        )
            .prop_map(|(status, code, name, message)| Failure {
                status,
                code,
                name,
                message,
            })
            .boxed()
    }
}
