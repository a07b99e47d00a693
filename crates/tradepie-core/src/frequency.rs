//! Volatility-driven polling frequency.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Snapshot, ValidationError};

pub const DEFAULT_CHANGE_THRESHOLD_PCT: f64 = 3.0;
pub const DEFAULT_HIGH_FREQUENCY_MS: u64 = 5_000;
pub const DEFAULT_LOW_FREQUENCY_MS: u64 = 15_000;

/// The two cadences a controller may run at.
///
/// The period is always derived from a [`PollingConfig`], so an armed timer
/// can never carry an arbitrary interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollingFrequency {
    Low,
    High,
}

impl PollingFrequency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }

    pub fn period(self, config: &PollingConfig) -> Duration {
        match self {
            Self::Low => config.low_frequency(),
            Self::High => config.high_frequency(),
        }
    }
}

impl Display for PollingFrequency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instance-scoped polling constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollingConfig {
    change_threshold_pct: f64,
    high_frequency: Duration,
    low_frequency: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            change_threshold_pct: DEFAULT_CHANGE_THRESHOLD_PCT,
            high_frequency: Duration::from_millis(DEFAULT_HIGH_FREQUENCY_MS),
            low_frequency: Duration::from_millis(DEFAULT_LOW_FREQUENCY_MS),
        }
    }
}

impl PollingConfig {
    pub fn new(
        change_threshold_pct: f64,
        high_frequency: Duration,
        low_frequency: Duration,
    ) -> Result<Self, ValidationError> {
        if !change_threshold_pct.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "change_threshold_pct",
            });
        }
        if high_frequency.is_zero() {
            return Err(ValidationError::ZeroPeriod {
                field: "high_frequency",
            });
        }
        if low_frequency.is_zero() {
            return Err(ValidationError::ZeroPeriod {
                field: "low_frequency",
            });
        }
        if high_frequency >= low_frequency {
            return Err(ValidationError::InvertedFrequencies {
                high_ms: high_frequency.as_millis() as u64,
                low_ms: low_frequency.as_millis() as u64,
            });
        }

        Ok(Self {
            change_threshold_pct,
            high_frequency,
            low_frequency,
        })
    }

    pub fn from_millis(
        change_threshold_pct: f64,
        high_frequency_ms: u64,
        low_frequency_ms: u64,
    ) -> Result<Self, ValidationError> {
        Self::new(
            change_threshold_pct,
            Duration::from_millis(high_frequency_ms),
            Duration::from_millis(low_frequency_ms),
        )
    }

    pub const fn change_threshold_pct(&self) -> f64 {
        self.change_threshold_pct
    }

    pub const fn high_frequency(&self) -> Duration {
        self.high_frequency
    }

    pub const fn low_frequency(&self) -> Duration {
        self.low_frequency
    }
}

/// Pick the cadence for the next polling period.
///
/// Uses the signed maximum of `change_pct`: a large drop alone does not raise
/// the cadence. An empty snapshot polls at [`PollingFrequency::Low`].
pub fn decide_frequency(snapshot: &Snapshot, config: &PollingConfig) -> PollingFrequency {
    match snapshot.max_change_pct() {
        Some(max_change_pct) if max_change_pct > config.change_threshold_pct() => {
            PollingFrequency::High
        }
        _ => PollingFrequency::Low,
    }
}
