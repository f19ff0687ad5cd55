//! Aggregate configuration for a Switchyard instance.
//!
//! Every tunable has a default and every struct deserializes with
//! `serde(default)`, so a host loader only supplies the values it overrides.
//! Locating and reading configuration files is left to the host.

use crate::orchestration::domain::{ConflictConfig, RetryPolicy};
use crate::probe::ProbeConfig;
use crate::provider::domain::HealthPolicy;
use crate::routing::{PreferenceConfig, RoutingConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while reading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON for the configuration shape.
    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its permitted range.
    #[error("invalid configuration value for {field}: {reason}")]
    OutOfRange {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What the field must satisfy.
        reason: &'static str,
    },
}

/// Every tunable of the orchestration core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchyardConfig {
    /// Health check thresholds and intervals.
    pub health: HealthPolicy,
    /// Capability probe budget.
    pub probe: ProbeConfig,
    /// Scoring weights and routing limits.
    pub routing: RoutingConfig,
    /// How user overrides move preference weights.
    pub preferences: PreferenceConfig,
    /// Per-provider retry policy.
    pub retry: RetryPolicy,
    /// Conflict detection and resolution tunables.
    pub conflict: ConflictConfig,
    /// Weight of the newest sample in rolling performance averages.
    pub performance_smoothing: f64,
    /// Grace period between closing a child's stdin and killing it.
    pub kill_grace_ms: u64,
    /// Interval between discovery cycles.
    pub discovery_interval_ms: u64,
    /// Number of tasks whose routing plans are kept for explanation.
    pub plan_log_capacity: usize,
}

impl Default for SwitchyardConfig {
    fn default() -> Self {
        Self {
            health: HealthPolicy::default(),
            probe: ProbeConfig::default(),
            routing: RoutingConfig::default(),
            preferences: PreferenceConfig::default(),
            retry: RetryPolicy::default(),
            conflict: ConflictConfig::default(),
            performance_smoothing: 0.3,
            kill_grace_ms: 500,
            discovery_interval_ms: 30_000,
            plan_log_capacity: 256,
        }
    }
}

impl SwitchyardConfig {
    /// Parses and validates a JSON document. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents and
    /// [`ConfigError::OutOfRange`] for values that fail validation.
    pub fn from_json_str(document: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the subprocess kill grace period.
    #[must_use]
    pub const fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }

    /// Returns the discovery cycle interval.
    #[must_use]
    pub const fn discovery_interval(&self) -> Duration {
        Duration::from_millis(self.discovery_interval_ms)
    }

    /// Checks that every value is within its permitted range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        let weights = &self.routing.weights;
        let checks = [
            (
                self.performance_smoothing > 0.0 && self.performance_smoothing <= 1.0,
                "performance_smoothing",
                "must be in (0, 1]",
            ),
            (
                self.routing.max_parallelism >= 1,
                "routing.max_parallelism",
                "must be at least 1",
            ),
            (
                [
                    weights.capability_fit,
                    weights.preference,
                    weights.performance,
                    weights.health,
                ]
                .iter()
                .all(|weight| weight.is_finite() && *weight >= 0.0),
                "routing.weights",
                "must be finite and non-negative",
            ),
            (
                is_unit(self.conflict.equivalence_threshold),
                "conflict.equivalence_threshold",
                "must be in [0, 1]",
            ),
            (
                is_unit(self.conflict.confirmation_threshold),
                "conflict.confirmation_threshold",
                "must be in [0, 1]",
            ),
            (
                self.preferences.min_weight <= self.preferences.max_weight,
                "preferences",
                "min_weight must not exceed max_weight",
            ),
            (
                self.health.failure_threshold >= 1,
                "health.failure_threshold",
                "must be at least 1",
            ),
            (
                self.health.check_interval_ms > 0 && self.health.probe_interval_ms > 0,
                "health",
                "check and probe intervals must be positive",
            ),
            (
                self.discovery_interval_ms > 0,
                "discovery_interval_ms",
                "must be positive",
            ),
            (
                self.plan_log_capacity > 0,
                "plan_log_capacity",
                "must be positive",
            ),
        ];
        checks
            .into_iter()
            .find(|(valid, _, _)| !valid)
            .map_or(Ok(()), |(_, field, reason)| {
                Err(ConfigError::OutOfRange { field, reason })
            })
    }
}

fn is_unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}
