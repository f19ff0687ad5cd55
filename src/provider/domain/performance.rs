//! Rolling performance history for a provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exponentially weighted success rate and latency.
///
/// Updated after every invocation and never reset except when the provider
/// is re-registered with a different configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    success_rate: f64,
    latency_ms: Option<f64>,
    invocations: u64,
    successes: u64,
    selections: u64,
    last_updated: Option<DateTime<Utc>>,
}

impl Default for PerformanceRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceRecord {
    /// Creates an empty record with an optimistic success rate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            success_rate: 1.0,
            latency_ms: None,
            invocations: 0,
            successes: 0,
            selections: 0,
            last_updated: None,
        }
    }

    /// Folds one invocation outcome into the rolling averages.
    ///
    /// `smoothing` is the weight of the newest sample and is clamped to
    /// `(0, 1]`.
    #[expect(
        clippy::float_arithmetic,
        reason = "exponential smoothing blends floating-point samples"
    )]
    pub fn record(&mut self, success: bool, latency: Duration, smoothing: f64, now: DateTime<Utc>) {
        let alpha = smoothing.clamp(f64::EPSILON, 1.0);
        let sample = if success { 1.0 } else { 0.0 };
        let latency_sample = latency.as_secs_f64() * 1_000.0;

        self.success_rate = if self.invocations == 0 {
            sample
        } else {
            alpha * sample + (1.0 - alpha) * self.success_rate
        };
        self.latency_ms = Some(self.latency_ms.map_or(latency_sample, |previous| {
            alpha * latency_sample + (1.0 - alpha) * previous
        }));
        self.invocations = self.invocations.saturating_add(1);
        if success {
            self.successes = self.successes.saturating_add(1);
        }
        self.last_updated = Some(now);
    }

    /// Counts one occasion where this provider's payload became the result.
    pub const fn record_selection(&mut self, now: DateTime<Utc>) {
        self.selections = self.selections.saturating_add(1);
        self.last_updated = Some(now);
    }

    /// Returns the rolling success rate in `[0, 1]`.
    #[must_use]
    pub const fn success_rate(&self) -> f64 {
        self.success_rate
    }

    /// Returns the success rate when at least `min_samples` invocations exist.
    #[must_use]
    pub fn trusted_success_rate(&self, min_samples: u64) -> Option<f64> {
        (self.invocations >= min_samples && self.invocations > 0).then_some(self.success_rate)
    }

    /// Returns the rolling latency in milliseconds, if any invocation exists.
    #[must_use]
    pub const fn latency_ms(&self) -> Option<f64> {
        self.latency_ms
    }

    /// Returns the total number of recorded invocations.
    #[must_use]
    pub const fn invocations(&self) -> u64 {
        self.invocations
    }

    /// Returns the total number of successful invocations.
    #[must_use]
    pub const fn successes(&self) -> u64 {
        self.successes
    }

    /// Returns how many times this provider's payload was chosen.
    #[must_use]
    pub const fn selections(&self) -> u64 {
        self.selections
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }
}
