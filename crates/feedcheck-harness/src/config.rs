//! Run configuration for the harness.

use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Default bound for async cases and hooks, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Settings for a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Bound for async cases and hooks without their own timeout
    pub default_timeout_ms: u64,
    /// Only run cases whose full name contains this string
    pub filter: Option<String>,
    /// Settle polling used by interaction cases
    pub settle: SettleConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            filter: None,
            settle: SettleConfig::default(),
        }
    }
}

impl RunConfig {
    /// Default async bound as a [`Duration`].
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Whether a case with the given full name is selected by the filter.
    pub fn selects(&self, full_name: &str) -> bool {
        self.filter
            .as_deref()
            .is_none_or(|filter| full_name.contains(filter))
    }
}

/// Polling settings for [`wait_until`](crate::wait_until).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    /// Upper bound on how long to wait for a condition
    pub ceiling_ms: u64,
    /// Delay between two predicate checks
    pub poll_interval_ms: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            ceiling_ms: 1000,
            poll_interval_ms: 25,
        }
    }
}

impl SettleConfig {
    /// Ceiling as a [`Duration`].
    pub fn ceiling(&self) -> Duration {
        Duration::from_millis(self.ceiling_ms)
    }

    /// Poll interval as a [`Duration`], never zero.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
