//! Retry with backoff for a single asynchronous operation.
//!
//! The driver re-invokes an operation while two things hold: the failure is
//! transient (per a [`RetryPredicate`], by default the [`Classify`] rules)
//! and the retry budget is not spent. Between attempts it sleeps for a
//! duration chosen by a [`Backoff`].
//!
//! - **Bounded**: `max_retries` defaults to `0`, and is always respected even
//!   when the predicate accepts everything.
//! - **Sequential**: one attempt in flight at a time, in attempt order.
//! - **Transparent**: the most recent failure is returned as-is; there is no
//!   "retries exhausted" wrapper.
//!
//! # Quick Start
//!
//! ```rust
//! use slackwater::{Failure, Retry};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let retry = Retry::new()
//!     .with_max_retries(3)
//!     .with_backoff(|_: u32| Duration::from_millis(1));
//!
//! let result = retry
//!     .run(|attempt| async move {
//!         if attempt == 0 {
//!             Err(Failure::new("throttled").with_status(429))
//!         } else {
//!             Ok(attempt)
//!         }
//!     })
//!     .await;
//!
//! assert_eq!(result, Ok(1));
//! # });
//! ```
//!
//! # Backoff Strategies
//!
//! - [`default_backoff`]: `min(2s * 2^attempt, 8s)`, the default
//! - [`BackoffPolicy`]: constant, linear, exponential or Fibonacci growth with
//!   an optional cap and (with the `jitter` feature) jitter
//! - any `Fn(u32) -> Duration`
//!
//! [`Classify`]: crate::Classify

mod backoff;
mod config;
mod driver;

pub use backoff::{
    default_backoff, Backoff, BackoffPolicy, BackoffStrategy, JitterStrategy, DEFAULT_BASE_DELAY,
    DEFAULT_MAX_DELAY,
};
pub use config::{ConfigError, RetryConfig, StrategyKind};
pub use driver::{
    with_retry, DefaultClassifier, HookFn, NoHook, PredicateFn, Retry, RetryEvent, RetryHook,
    RetryPredicate,
};
