//! Deadline enforcement for a single asynchronous operation.
//!
//! [`with_timeout`] races an operation against a deadline. Whichever finishes
//! first decides the outcome; a tie goes to the deadline. The deadline timer
//! lives on the guard's stack and is dropped on every exit path, so no timer
//! outlives the call.
//!
//! # Cancellation
//!
//! The deadline cancels the *wait*, not necessarily the work:
//!
//! - [`with_timeout`] owns the operation future. When the deadline wins the
//!   future is dropped and never polled again, which cancels it at its next
//!   suspension point.
//! - [`spawn_with_timeout`] runs the operation as a detached tokio task. When
//!   the deadline wins the task keeps running to completion in the background
//!   and its result is discarded. Use this for work that must not be torn
//!   down half-way.
//!
//! # Examples
//!
//! ```rust
//! use slackwater::{with_timeout_ms, Classify};
//!
//! # tokio_test::block_on(async {
//! let never = std::future::pending::<Result<(), String>>();
//!
//! let err = with_timeout_ms(never, 10, None).await.unwrap_err();
//! assert_eq!(err.code(), Some("ETIMEDOUT"));
//! assert_eq!(err.to_string(), "Operation timed out");
//! # });
//! ```

mod error;

pub use error::TimeoutError;

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinError;

use crate::delay;

/// Run `operation` with a deadline of `timeout`.
///
/// A zero `timeout` disables the guard: the operation is awaited directly
/// and no timer is created. Timeouts longer than [`delay::MAX_TIMEOUT`] are
/// clamped to it.
///
/// The operation's own failure comes back as [`TimeoutError::Inner`],
/// untouched. Only deadline expiry produces [`TimeoutError::Timeout`], with
/// `message` if it is non-empty and `"Operation timed out"` otherwise.
///
/// ```rust
/// use slackwater::with_timeout;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let quick = async { Ok::<_, String>(42) };
/// assert_eq!(with_timeout(quick, Duration::from_secs(1), None).await, Ok(42));
/// # });
/// ```
pub async fn with_timeout<F, T, E>(
    operation: F,
    timeout: Duration,
    message: Option<&str>,
) -> Result<T, TimeoutError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    if timeout.is_zero() {
        return operation.await.map_err(TimeoutError::Inner);
    }

    let timeout = delay::clamp(timeout);

    // Deadline is polled first so an operation finishing on the same tick
    // still counts as late.
    tokio::select! {
        biased;
        () = delay::sleep(timeout) => {
            tracing::debug!(
                timeout_ms = timeout.as_millis() as u64,
                "deadline expired before operation completed"
            );
            Err(TimeoutError::timeout(timeout, message))
        }
        outcome = operation => outcome.map_err(TimeoutError::Inner),
    }
}

/// [`with_timeout`] taking a signed millisecond count.
///
/// Zero or negative values mean "no limit".
pub async fn with_timeout_ms<F, T, E>(
    operation: F,
    timeout_ms: i64,
    message: Option<&str>,
) -> Result<T, TimeoutError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    let timeout = delay::from_millis(timeout_ms).unwrap_or(Duration::ZERO);
    with_timeout(operation, timeout, message).await
}

/// Spawn `operation` on the tokio runtime and wait for it with a deadline.
///
/// Unlike [`with_timeout`], expiry does not stop the operation: the task is
/// detached and runs to completion in the background, and its result is
/// discarded.
///
/// # Panics
///
/// A panic inside the task is resumed on the caller. If the task is
/// cancelled before it finishes, e.g. because the runtime is shutting down,
/// this panics with a message saying so.
///
/// ```rust
/// use slackwater::spawn_with_timeout;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let finished = Arc::new(AtomicBool::new(false));
/// let flag = finished.clone();
///
/// let result = spawn_with_timeout(
///     async move {
///         tokio::time::sleep(Duration::from_millis(50)).await;
///         flag.store(true, Ordering::SeqCst);
///         Ok::<_, String>(())
///     },
///     Duration::from_millis(5),
///     Some("flush took too long"),
/// )
/// .await;
///
/// assert!(result.unwrap_err().is_timeout());
///
/// tokio::time::sleep(Duration::from_millis(100)).await;
/// assert!(finished.load(Ordering::SeqCst));
/// # });
/// ```
pub async fn spawn_with_timeout<F, T, E>(
    operation: F,
    timeout: Duration,
    message: Option<&str>,
) -> Result<T, TimeoutError<E>>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let handle = tokio::spawn(operation);

    // Dropping a JoinHandle detaches the task rather than aborting it.
    with_timeout(async move { settle(handle.await) }, timeout, message).await
}

/// Unwrap a joined task, re-raising its panic on this task.
fn settle<T>(joined: Result<T, JoinError>) -> T {
    match joined {
        Ok(outcome) => outcome,
        Err(err) => match err.try_into_panic() {
            Ok(panic) => std::panic::resume_unwind(panic),
            Err(err) => panic!("spawned operation was cancelled before completing: {}", err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classify;
    use crate::failure::Failure;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;

    async fn resolve_after(ms: u64, value: &'static str) -> Result<&'static str, Failure> {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(value)
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_is_pass_through() {
        let slow = resolve_after(60_000, "late but fine");
        let result = with_timeout(slow, Duration::ZERO, None).await;
        assert_eq!(result, Ok("late but fine"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_positive_millis_are_pass_through() {
        for ms in [0, -1, -10_000, i64::MIN] {
            let result = with_timeout_ms(resolve_after(60_000, "done"), ms, None).await;
            assert_eq!(result, Ok("done"), "timeout_ms = {}", ms);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pass_through_keeps_original_failure() {
        let failure = Failure::new("conflict").with_status(409);
        let expected = failure.clone();

        let result = with_timeout_ms(async move { Err::<(), _>(failure) }, 0, None).await;
        assert_eq!(result, Err(TimeoutError::Inner(expected)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_before_deadline() {
        let result = with_timeout(resolve_after(9, "ok"), Duration::from_millis(10), None).await;
        assert_eq!(result, Ok("ok"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tie_goes_to_deadline() {
        let result = with_timeout(resolve_after(10, "ok"), Duration::from_millis(10), None).await;
        let err = result.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.code(), Some("ETIMEDOUT"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_operation_times_out_with_custom_message() {
        let result = with_timeout(
            resolve_after(50, "ok"),
            Duration::from_millis(10),
            Some("query exceeded budget"),
        )
        .await;

        match result {
            Err(TimeoutError::Timeout { duration, message }) => {
                assert_eq!(duration, Duration::from_millis(10));
                assert_eq!(message, "query exceeded budget");
            }
            other => panic!("Expected timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_before_deadline_propagates_verbatim() {
        let failure = Failure::new("throttled").with_status(429);
        let expected = failure.clone();

        let result = with_timeout(
            async move {
                tokio::time::sleep(Duration::from_millis(2)).await;
                Err::<(), _>(failure)
            },
            Duration::from_millis(10),
            None,
        )
        .await;

        assert_eq!(result, Err(TimeoutError::Inner(expected)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_resolving_operation_times_out() {
        let start = tokio::time::Instant::now();
        let never = std::future::pending::<Result<(), Failure>>();

        let err = with_timeout_ms(never, 10, None).await.unwrap_err();

        assert_eq!(err.to_string(), "Operation timed out");
        assert_eq!(err.code(), Some("ETIMEDOUT"));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(10), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(20), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_millis_is_effectively_unlimited() {
        let result = with_timeout_ms(resolve_after(5_000, "eventually"), i64::MAX, None).await;
        assert_eq!(result, Ok("eventually"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_duration_is_clamped() {
        let never = std::future::pending::<Result<(), Failure>>();
        let raced = tokio::time::timeout(
            Duration::from_secs(1),
            with_timeout(never, Duration::MAX, None),
        )
        .await;

        // Still waiting: the deadline was clamped, not wrapped to zero.
        assert!(raced.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_owned_future_is_dropped_on_expiry() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let result = with_timeout(
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                flag.store(true, Ordering::SeqCst);
                Ok::<_, Failure>(())
            },
            Duration::from_millis(10),
            None,
        )
        .await;

        assert!(result.unwrap_err().is_timeout());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_operation_keeps_running_after_expiry() {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();

        let result = spawn_with_timeout(
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Failure>("discarded")
            },
            Duration::from_millis(10),
            None,
        )
        .await;

        assert!(result.unwrap_err().is_timeout());
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_operation_success_and_failure() {
        let ok = spawn_with_timeout(resolve_after(1, "fast"), Duration::from_millis(10), None).await;
        assert_eq!(ok, Ok("fast"));

        let err = spawn_with_timeout(
            async { Err::<(), _>(Failure::new("bad request").with_status(400)) },
            Duration::from_millis(10),
            None,
        )
        .await;
        assert_eq!(err.unwrap_err().status(), Some(400));
    }

    #[tokio::test]
    #[should_panic(expected = "spawned operation was cancelled")]
    async fn test_cancelled_task_reports_cancellation() {
        let handle = tokio::spawn(std::future::pending::<()>());
        handle.abort();
        settle(handle.await);
    }

    #[tokio::test]
    #[should_panic(expected = "handler exploded")]
    async fn test_spawned_panic_is_resumed() {
        let _ = spawn_with_timeout(
            async {
                if true {
                    panic!("handler exploded");
                }
                Ok::<(), Failure>(())
            },
            Duration::from_secs(1),
            None,
        )
        .await;
    }

    #[tokio::test(start_paused = true)]
    #[tracing_test::traced_test]
    async fn test_expiry_is_logged() {
        let never = std::future::pending::<Result<(), Failure>>();
        let _ = with_timeout(never, Duration::from_millis(10), None).await;
        assert!(logs_contain("deadline expired"));
    }
}
