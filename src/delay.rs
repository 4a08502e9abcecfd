//! The delay primitive shared by the timeout guard and the retry driver.
//!
//! Tokio's timer wheel cannot represent arbitrarily distant deadlines, so
//! every duration handed to it passes through [`clamp`] first.

use std::time::Duration;

use tokio::time::Sleep;

/// Longest delay, in milliseconds, the timer will be asked to wait.
///
/// Matches the span of tokio's six-level timer wheel (`2^36 - 1` ms, a little
/// over two years).
pub const MAX_TIMEOUT_MS: u64 = (1 << 36) - 1;

/// [`MAX_TIMEOUT_MS`] as a [`Duration`].
pub const MAX_TIMEOUT: Duration = Duration::from_millis(MAX_TIMEOUT_MS);

/// Clamp `duration` to [`MAX_TIMEOUT`].
///
/// Oversized requests are silently reduced to the maximum, never wrapped or
/// treated as zero.
///
/// ```
/// use slackwater::delay::{clamp, MAX_TIMEOUT};
/// use std::time::Duration;
///
/// assert_eq!(clamp(Duration::from_secs(5)), Duration::from_secs(5));
/// assert_eq!(clamp(Duration::MAX), MAX_TIMEOUT);
/// ```
pub fn clamp(duration: Duration) -> Duration {
    duration.min(MAX_TIMEOUT)
}

/// Convert a signed millisecond count into an optional limit.
///
/// Zero and negative values mean "no limit".
pub fn from_millis(ms: i64) -> Option<Duration> {
    u64::try_from(ms)
        .ok()
        .filter(|&ms| ms > 0)
        .map(|ms| clamp(Duration::from_millis(ms)))
}

/// A single-shot timer for `duration`, clamped.
pub fn sleep(duration: Duration) -> Sleep {
    tokio::time::sleep(clamp(duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_passes_small_durations_through() {
        assert_eq!(clamp(Duration::ZERO), Duration::ZERO);
        assert_eq!(clamp(Duration::from_millis(10)), Duration::from_millis(10));
        assert_eq!(clamp(MAX_TIMEOUT), MAX_TIMEOUT);
    }

    #[test]
    fn test_clamp_caps_oversized_durations() {
        assert_eq!(clamp(MAX_TIMEOUT + Duration::from_millis(1)), MAX_TIMEOUT);
        assert_eq!(clamp(Duration::MAX), MAX_TIMEOUT);
    }

    #[test]
    fn test_from_millis() {
        assert_eq!(from_millis(0), None);
        assert_eq!(from_millis(-5), None);
        assert_eq!(from_millis(i64::MIN), None);
        assert_eq!(from_millis(250), Some(Duration::from_millis(250)));
        assert_eq!(from_millis(i64::MAX), Some(MAX_TIMEOUT));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_with_oversized_duration_does_not_panic() {
        let timer = sleep(Duration::MAX);
        tokio::pin!(timer);

        let raced = tokio::time::timeout(Duration::from_millis(5), &mut timer).await;
        assert!(raced.is_err());
    }
}
