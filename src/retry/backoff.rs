//! Backoff policies: how long to wait before the next attempt.

use std::time::Duration;

/// Base delay of the default exponential policy.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(2000);

/// Ceiling of the default exponential policy.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(8000);

/// Maps a 0-based attempt index to the delay before the next attempt.
///
/// Implementations must be pure. Any `Fn(u32) -> Duration` is a backoff,
/// which makes zero-delay policies in tests a one-liner:
///
/// ```rust
/// use slackwater::Backoff;
/// use std::time::Duration;
///
/// let immediate = |_attempt: u32| Duration::ZERO;
/// assert_eq!(immediate.delay(7), Duration::ZERO);
/// ```
pub trait Backoff {
    /// Delay to sleep after `attempt` failed.
    fn delay(&self, attempt: u32) -> Duration;
}

impl<F> Backoff for F
where
    F: Fn(u32) -> Duration,
{
    fn delay(&self, attempt: u32) -> Duration {
        self(attempt)
    }
}

/// The default backoff: `min(2000ms * 2^attempt, 8000ms)`, no jitter.
///
/// ```rust
/// use slackwater::default_backoff;
/// use std::time::Duration;
///
/// assert_eq!(default_backoff(0), Duration::from_millis(2000));
/// assert_eq!(default_backoff(1), Duration::from_millis(4000));
/// assert_eq!(default_backoff(2), Duration::from_millis(8000));
/// assert_eq!(default_backoff(3), Duration::from_millis(8000));
/// ```
pub fn default_backoff(attempt: u32) -> Duration {
    DEFAULT_BASE_DELAY
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(DEFAULT_MAX_DELAY)
}

/// A backoff described as data: a growth strategy, an optional cap and an
/// optional jitter.
///
/// Policies are plain values. They can be cloned, compared and inspected,
/// and computing a delay has no side effects unless jitter is enabled.
///
/// # Examples
///
/// ```rust
/// use slackwater::BackoffPolicy;
/// use std::time::Duration;
///
/// let policy = BackoffPolicy::linear(Duration::from_millis(100))
///     .with_max_delay(Duration::from_millis(250));
///
/// assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
/// assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    strategy: BackoffStrategy,
    max_delay: Option<Duration>,
    jitter: JitterStrategy,
}

/// How the delay grows with the attempt index.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Same delay every time.
    Constant(Duration),
    /// `base * (attempt + 1)`.
    Linear {
        /// Base delay duration.
        base: Duration,
    },
    /// `base * 2^attempt`.
    Exponential {
        /// Base delay duration.
        base: Duration,
    },
    /// `base * fib(attempt + 1)`.
    Fibonacci {
        /// Base delay duration.
        base: Duration,
    },
}

/// Randomness applied on top of the computed delay.
///
/// Only takes effect with the `jitter` feature; otherwise every variant
/// leaves the delay unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JitterStrategy {
    /// No jitter.
    #[default]
    None,
    /// Uniformly within `±factor` of the delay.
    Proportional(f64),
    /// Uniformly between zero and the delay.
    Full,
}

impl Default for BackoffPolicy {
    /// `exponential(2s)` capped at `8s`, the same curve as [`default_backoff`].
    fn default() -> Self {
        Self::exponential(DEFAULT_BASE_DELAY).with_max_delay(DEFAULT_MAX_DELAY)
    }
}

impl BackoffPolicy {
    fn from_strategy(strategy: BackoffStrategy) -> Self {
        Self {
            strategy,
            max_delay: None,
            jitter: JitterStrategy::None,
        }
    }

    /// Fixed delay between attempts.
    pub fn constant(delay: Duration) -> Self {
        Self::from_strategy(BackoffStrategy::Constant(delay))
    }

    /// Delay grows by `base` each attempt.
    pub fn linear(base: Duration) -> Self {
        Self::from_strategy(BackoffStrategy::Linear { base })
    }

    /// Delay doubles each attempt, starting at `base`.
    ///
    /// ```rust
    /// use slackwater::BackoffPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = BackoffPolicy::exponential(Duration::from_millis(100));
    /// assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(800));
    /// ```
    pub fn exponential(base: Duration) -> Self {
        Self::from_strategy(BackoffStrategy::Exponential { base })
    }

    /// Delay follows the Fibonacci sequence scaled by `base`.
    pub fn fibonacci(base: Duration) -> Self {
        Self::from_strategy(BackoffStrategy::Fibonacci { base })
    }

    /// Never wait longer than `max` between attempts.
    pub fn with_max_delay(mut self, max: Duration) -> Self {
        self.max_delay = Some(max);
        self
    }

    /// Randomize each delay within `±factor` (clamped to `0.0..=1.0`).
    ///
    /// A non-finite factor disables jitter. Inert without the `jitter`
    /// feature.
    pub fn with_jitter(mut self, factor: f64) -> Self {
        self.jitter = if factor.is_finite() {
            JitterStrategy::Proportional(factor.clamp(0.0, 1.0))
        } else {
            JitterStrategy::None
        };
        self
    }

    /// Randomize each delay between zero and its computed value.
    ///
    /// Inert without the `jitter` feature.
    pub fn with_full_jitter(mut self) -> Self {
        self.jitter = JitterStrategy::Full;
        self
    }

    /// The growth strategy.
    pub fn strategy(&self) -> &BackoffStrategy {
        &self.strategy
    }

    /// The delay cap, if any.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// The jitter strategy.
    pub fn jitter(&self) -> &JitterStrategy {
        &self.jitter
    }

    /// Delay after `attempt` failed, before jitter.
    ///
    /// Arithmetic saturates, so large attempt indices never overflow.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let raw = match &self.strategy {
            BackoffStrategy::Constant(d) => *d,
            BackoffStrategy::Linear { base } => base.saturating_mul(attempt.saturating_add(1)),
            BackoffStrategy::Exponential { base } => {
                base.saturating_mul(2u32.saturating_pow(attempt))
            }
            BackoffStrategy::Fibonacci { base } => {
                base.saturating_mul(fibonacci(attempt.saturating_add(1)))
            }
        };
        self.cap(raw)
    }

    fn cap(&self, delay: Duration) -> Duration {
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

impl Backoff for BackoffPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        let delay = self.delay_for_attempt(attempt);
        self.cap(self.jitter.apply(delay))
    }
}

impl JitterStrategy {
    /// Apply this jitter to `delay`.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterStrategy::None => delay,
            #[cfg(feature = "jitter")]
            JitterStrategy::Proportional(factor) => {
                use rand::Rng;
                let millis = delay.as_millis() as f64;
                let spread = millis * factor;
                let low = (millis - spread).max(0.0);
                let high = millis + spread;
                if !high.is_finite() || high <= low {
                    delay
                } else {
                    Duration::from_millis(rand::rng().random_range(low..=high) as u64)
                }
            }
            #[cfg(feature = "jitter")]
            JitterStrategy::Full => {
                use rand::Rng;
                let millis = delay.as_millis() as u64;
                if millis == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_millis(rand::rng().random_range(0..=millis))
                }
            }
            #[cfg(not(feature = "jitter"))]
            JitterStrategy::Proportional(_) | JitterStrategy::Full => delay,
        }
    }
}

fn fibonacci(n: u32) -> u32 {
    let (mut a, mut b) = (0u32, 1u32);
    for _ in 0..n {
        if a == u32::MAX {
            break;
        }
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    a
}
