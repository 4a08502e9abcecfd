//! The retry loop.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::classify::Classify;
use crate::delay;
use crate::retry::backoff::{Backoff, BackoffPolicy};
use crate::timeout::{with_timeout, TimeoutError};

/// Decides whether a failure should be retried.
pub trait RetryPredicate<E: ?Sized> {
    /// Returns true if another attempt makes sense after `error`.
    fn should_retry(&self, error: &E) -> bool;
}

/// The default predicate: [`Classify::is_retryable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl<E: Classify + ?Sized> RetryPredicate<E> for DefaultClassifier {
    fn should_retry(&self, error: &E) -> bool {
        error.is_retryable()
    }
}

/// A predicate built from a closure. Created by [`Retry::retry_if`].
#[derive(Clone, Copy)]
pub struct PredicateFn<F>(F);

impl<E: ?Sized, F> RetryPredicate<E> for PredicateFn<F>
where
    F: Fn(&E) -> bool,
{
    fn should_retry(&self, error: &E) -> bool {
        (self.0)(error)
    }
}

impl<F> fmt::Debug for PredicateFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PredicateFn")
    }
}

/// Information about a failed attempt that is about to be retried.
#[derive(Debug, Clone)]
pub struct RetryEvent<'a, E> {
    /// 0-based index of the attempt that failed, as passed to the operation.
    pub attempt: u32,
    /// The failure from that attempt.
    pub error: &'a E,
    /// How long the driver will sleep before the next attempt.
    pub next_delay: Duration,
    /// Time since the first attempt started.
    pub elapsed: Duration,
}

/// Observer notified before each retry.
pub trait RetryHook<E> {
    /// Called once per failed attempt that will be retried, before sleeping.
    fn on_retry(&self, event: &RetryEvent<'_, E>);
}

/// A hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHook;

impl<E> RetryHook<E> for NoHook {
    fn on_retry(&self, _event: &RetryEvent<'_, E>) {}
}

/// A hook built from a closure. Created by [`Retry::on_retry`].
#[derive(Clone, Copy)]
pub struct HookFn<F>(F);

impl<E, F> RetryHook<E> for HookFn<F>
where
    F: Fn(&RetryEvent<'_, E>),
{
    fn on_retry(&self, event: &RetryEvent<'_, E>) {
        (self.0)(event)
    }
}

impl<F> fmt::Debug for HookFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HookFn")
    }
}

/// Retry configuration and driver.
///
/// Defaults: no retries, the [`DefaultClassifier`] predicate, the default
/// exponential backoff (2s doubling, 8s cap) and no hook. A failure is
/// retried only when the predicate accepts it **and** the retry budget is not
/// spent; otherwise the most recent failure is returned.
///
/// Attempts run strictly one after another. The operation receives the
/// 0-based attempt index.
///
/// # Examples
///
/// ```rust
/// use slackwater::{Failure, Retry};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let calls = AtomicU32::new(0);
///
/// let result = Retry::new()
///     .with_max_retries(3)
///     .with_backoff(|_: u32| Duration::ZERO)
///     .run(|_attempt| {
///         let n = calls.fetch_add(1, Ordering::SeqCst);
///         async move {
///             if n < 2 {
///                 Err(Failure::new("reset").with_code("ETIMEDOUT"))
///             } else {
///                 Ok("ok")
///             }
///         }
///     })
///     .await;
///
/// assert_eq!(result, Ok("ok"));
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// # });
/// ```
#[derive(Clone)]
pub struct Retry<P = DefaultClassifier, B = BackoffPolicy, H = NoHook> {
    max_retries: u32,
    predicate: P,
    backoff: B,
    hook: H,
}

impl Retry {
    /// A driver with the default settings.
    pub fn new() -> Self {
        Self {
            max_retries: 0,
            predicate: DefaultClassifier,
            backoff: BackoffPolicy::default(),
            hook: NoHook,
        }
    }
}

impl Default for Retry {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, B, H> Retry<P, B, H> {
    /// Allow up to `n` retries after the first attempt.
    ///
    /// `0` means the operation runs exactly once.
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Replace the backoff. Any `Fn(u32) -> Duration` works.
    pub fn with_backoff<B2: Backoff>(self, backoff: B2) -> Retry<P, B2, H> {
        Retry {
            max_retries: self.max_retries,
            predicate: self.predicate,
            backoff,
            hook: self.hook,
        }
    }

    /// Retry only failures for which `predicate` returns true.
    ///
    /// ```rust
    /// use slackwater::Retry;
    ///
    /// # tokio_test::block_on(async {
    /// let result = Retry::new()
    ///     .with_max_retries(5)
    ///     .retry_if(|err: &String| err.starts_with("transient"))
    ///     .run(|_| async { Err::<(), _>("permanent".to_string()) })
    ///     .await;
    ///
    /// assert_eq!(result, Err("permanent".to_string()));
    /// # });
    /// ```
    pub fn retry_if<E, F>(self, predicate: F) -> Retry<PredicateFn<F>, B, H>
    where
        E: ?Sized,
        F: Fn(&E) -> bool,
    {
        Retry {
            max_retries: self.max_retries,
            predicate: PredicateFn(predicate),
            backoff: self.backoff,
            hook: self.hook,
        }
    }

    /// Replace the predicate with any [`RetryPredicate`] implementation.
    pub fn with_predicate<P2>(self, predicate: P2) -> Retry<P2, B, H> {
        Retry {
            max_retries: self.max_retries,
            predicate,
            backoff: self.backoff,
            hook: self.hook,
        }
    }

    /// Observe each retry, e.g. to forward it to a request-scoped logger.
    pub fn on_retry<E, F>(self, hook: F) -> Retry<P, B, HookFn<F>>
    where
        F: Fn(&RetryEvent<'_, E>),
    {
        Retry {
            max_retries: self.max_retries,
            predicate: self.predicate,
            backoff: self.backoff,
            hook: HookFn(hook),
        }
    }

    /// The retry budget.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// The backoff in use.
    pub fn backoff(&self) -> &B {
        &self.backoff
    }

    /// Run `operation` until it succeeds, fails terminally, or the retry
    /// budget is spent.
    pub async fn run<Op, Fut, T, E>(&self, mut operation: Op) -> Result<T, E>
    where
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: RetryPredicate<E>,
        B: Backoff,
        H: RetryHook<E>,
    {
        let start = Instant::now();
        let mut attempt = 0u32;

        loop {
            tracing::debug!(attempt, max_retries = self.max_retries, "starting attempt");

            let error = match operation(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(attempt, "operation succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let retryable = self.predicate.should_retry(&error);
            if !retryable || attempt >= self.max_retries {
                tracing::debug!(
                    attempt,
                    retryable,
                    max_retries = self.max_retries,
                    "giving up"
                );
                return Err(error);
            }

            let next_delay = delay::clamp(self.backoff.delay(attempt));
            self.hook.on_retry(&RetryEvent {
                attempt,
                error: &error,
                next_delay,
                elapsed: start.elapsed(),
            });
            tracing::warn!(
                attempt,
                delay_ms = next_delay.as_millis() as u64,
                "retryable failure, backing off"
            );
            drop(error);

            delay::sleep(next_delay).await;
            attempt += 1;
        }
    }

    /// Like [`run`](Self::run), with every attempt guarded by a deadline.
    ///
    /// An attempt that misses its deadline fails with
    /// [`TimeoutError::Timeout`], which the default classifier treats as
    /// retryable. A zero `timeout` disables the guard.
    pub async fn run_with_timeout<Op, Fut, T, E>(
        &self,
        timeout: Duration,
        mut operation: Op,
    ) -> Result<T, TimeoutError<E>>
    where
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: RetryPredicate<TimeoutError<E>>,
        B: Backoff,
        H: RetryHook<TimeoutError<E>>,
    {
        self.run(|attempt| with_timeout(operation(attempt), timeout, None))
            .await
    }
}

impl<P, B: fmt::Debug, H> fmt::Debug for Retry<P, B, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

/// Run `operation` under `options`.
///
/// Free-function form of [`Retry::run`].
///
/// ```rust
/// use slackwater::{with_retry, Failure, Retry};
///
/// # tokio_test::block_on(async {
/// let result = with_retry(
///     |_| async { Err::<(), _>(Failure::new("validation failed")) },
///     Retry::new().with_max_retries(5),
/// )
/// .await;
///
/// assert_eq!(result, Err(Failure::new("validation failed")));
/// # });
/// ```
pub async fn with_retry<Op, Fut, T, E, P, B, H>(
    operation: Op,
    options: Retry<P, B, H>,
) -> Result<T, E>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: RetryPredicate<E>,
    B: Backoff,
    H: RetryHook<E>,
{
    options.run(operation).await
}
