//! Bounded retry for the initial load.
//!
//! Only the first fetch of a lifecycle is retried: until it succeeds no timer
//! is armed, so nothing else would ever recover the controller.

use std::time::Duration;

/// Wait between two initial-load attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// `initial * multiplier^attempt`, capped at `ceiling`. With `jitter` the
    /// result is scaled by a random factor in `0.5..1.5`.
    Exponential {
        initial: Duration,
        multiplier: u32,
        ceiling: Duration,
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            initial: Duration::from_millis(500),
            multiplier: 2,
            ceiling: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay after failed attempt `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => delay,
            Self::Exponential {
                initial,
                multiplier,
                ceiling,
                jitter,
            } => {
                let delay = initial
                    .saturating_mul(multiplier.saturating_pow(attempt))
                    .min(ceiling);
                if jitter {
                    delay.mul_f64(0.5 + fastrand::f64())
                } else {
                    delay
                }
            }
        }
    }
}

/// Retry budget for the initial fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::default(),
        }
    }
}

impl RetryConfig {
    pub fn exponential(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::default(),
        }
    }

    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed(delay),
        }
    }

    /// A single attempt.
    pub fn no_retry() -> Self {
        Self::exponential(0)
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}
