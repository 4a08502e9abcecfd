//! Retry settings as plain data.
//!
//! Handlers usually read their retry budget from deployment configuration
//! rather than hard-coding it. [`RetryConfig`] is that configuration; with the
//! `serde` feature it deserializes from any serde format, and every field has
//! a default matching [`Retry::new`].
//!
//! ```rust
//! use slackwater::RetryConfig;
//! use std::time::Duration;
//!
//! let config = RetryConfig {
//!     max_retries: 2,
//!     base_delay_ms: 100,
//!     max_delay_ms: 1_000,
//!     ..RetryConfig::default()
//! };
//!
//! let retry = config.into_retry().unwrap();
//! assert_eq!(retry.max_retries(), 2);
//! assert_eq!(retry.backoff().delay_for_attempt(4), Duration::from_millis(1_000));
//! ```

use std::fmt;
use std::time::Duration;

use crate::retry::backoff::{BackoffPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY};
use crate::retry::driver::Retry;

/// Growth strategy named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StrategyKind {
    /// See [`BackoffPolicy::constant`].
    Constant,
    /// See [`BackoffPolicy::linear`].
    Linear,
    /// See [`BackoffPolicy::exponential`].
    #[default]
    Exponential,
    /// See [`BackoffPolicy::fibonacci`].
    Fibonacci,
}

/// Declarative retry settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetryConfig {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// First delay, in milliseconds.
    pub base_delay_ms: u64,
    /// Delay ceiling, in milliseconds.
    pub max_delay_ms: u64,
    /// How delays grow.
    pub strategy: StrategyKind,
    /// Proportional jitter factor in `0.0..=1.0`; `0.0` disables jitter.
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: DEFAULT_BASE_DELAY.as_millis() as u64,
            max_delay_ms: DEFAULT_MAX_DELAY.as_millis() as u64,
            strategy: StrategyKind::Exponential,
            jitter: 0.0,
        }
    }
}

/// Invalid [`RetryConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The first delay is larger than the ceiling.
    BaseExceedsMax {
        /// Configured first delay.
        base_delay_ms: u64,
        /// Configured ceiling.
        max_delay_ms: u64,
    },
    /// The jitter factor is outside `0.0..=1.0` or not a number.
    JitterOutOfRange(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BaseExceedsMax {
                base_delay_ms,
                max_delay_ms,
            } => write!(
                f,
                "base_delay_ms ({}) exceeds max_delay_ms ({})",
                base_delay_ms, max_delay_ms
            ),
            Self::JitterOutOfRange(factor) => {
                write!(f, "jitter factor {} is outside 0.0..=1.0", factor)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl RetryConfig {
    /// Check the settings for contradictions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_delay_ms > self.max_delay_ms {
            return Err(ConfigError::BaseExceedsMax {
                base_delay_ms: self.base_delay_ms,
                max_delay_ms: self.max_delay_ms,
            });
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::JitterOutOfRange(self.jitter));
        }
        Ok(())
    }

    /// The backoff these settings describe.
    pub fn backoff_policy(&self) -> Result<BackoffPolicy, ConfigError> {
        self.validate()?;

        let base = Duration::from_millis(self.base_delay_ms);
        let policy = match self.strategy {
            StrategyKind::Constant => BackoffPolicy::constant(base),
            StrategyKind::Linear => BackoffPolicy::linear(base),
            StrategyKind::Exponential => BackoffPolicy::exponential(base),
            StrategyKind::Fibonacci => BackoffPolicy::fibonacci(base),
        }
        .with_max_delay(Duration::from_millis(self.max_delay_ms));

        Ok(if self.jitter > 0.0 {
            policy.with_jitter(self.jitter)
        } else {
            policy
        })
    }

    /// Build a driver with the default classifier and these settings.
    pub fn into_retry(self) -> Result<Retry, ConfigError> {
        let backoff = self.backoff_policy()?;
        Ok(Retry::new()
            .with_max_retries(self.max_retries)
            .with_backoff(backoff))
    }
}
