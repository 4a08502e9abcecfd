//! # Slackwater
//!
//! > *Slack water: the pause between tides, when it is safe to try again.*
//!
//! Asynchronous flow control for request handlers and serverless functions:
//!
//! - [`with_timeout`]: race one operation against a deadline
//! - [`is_retryable`] / [`Classify`]: decide whether a failure is transient
//! - [`Retry`] / [`with_retry`]: re-invoke an operation with backoff
//!
//! The three pieces are independent. Compose them as needed, typically a
//! guarded operation inside a retry loop.
//!
//! ## Quick Example
//!
//! ```rust
//! use slackwater::{with_timeout, Failure, Retry};
//! use std::time::Duration;
//!
//! async fn fetch_profile(attempt: u32) -> Result<String, Failure> {
//!     if attempt == 0 {
//!         Err(Failure::new("upstream unavailable").with_status(503))
//!     } else {
//!         Ok("profile".to_string())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let retry = Retry::new()
//!     .with_max_retries(2)
//!     .with_backoff(|_: u32| Duration::from_millis(1));
//!
//! let profile = retry
//!     .run(|attempt| async move {
//!         with_timeout(fetch_profile(attempt), Duration::from_secs(3), None)
//!             .await
//!             .map_err(Failure::from)
//!     })
//!     .await;
//!
//! assert_eq!(profile.as_deref(), Ok("profile"));
//! # });
//! ```
//!
//! ## Logging
//!
//! Timeouts and retries are reported through [`tracing`] events; install a
//! subscriber to see them. Per-retry callbacks are available through
//! [`Retry::on_retry`].

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod classify;
pub mod delay;
pub mod failure;
pub mod retry;
pub mod testing;
pub mod timeout;

// Re-exports
pub use classify::{is_retryable, Classify};
pub use failure::Failure;
pub use retry::{
    default_backoff, with_retry, Backoff, BackoffPolicy, ConfigError, Retry, RetryConfig,
    RetryEvent,
};
pub use timeout::{spawn_with_timeout, with_timeout, with_timeout_ms, TimeoutError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::classify::{is_retryable, Classify};
    pub use crate::failure::Failure;
    pub use crate::retry::{default_backoff, with_retry, Backoff, BackoffPolicy, Retry};
    pub use crate::timeout::{with_timeout, with_timeout_ms, TimeoutError};
}
