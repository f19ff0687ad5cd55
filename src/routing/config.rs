//! Routing tunables.

use crate::provider::domain::Capability;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Weights of the four score components.
///
/// No canonical weighting exists, so every weight is tunable. Components are
/// each normalised to `[0, 1]` before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Weight of capability fit.
    pub capability_fit: f64,
    /// Weight of the stored user or team preference.
    pub preference: f64,
    /// Weight of the performance record.
    pub performance: f64,
    /// Weight of the health bonus.
    pub health: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            capability_fit: 0.4,
            preference: 0.2,
            performance: 0.3,
            health: 0.1,
        }
    }
}

/// Router and re-routing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Score component weights.
    pub weights: ScoringWeights,
    /// Maximum number of providers invoked concurrently for one task,
    /// primary included.
    pub max_parallelism: usize,
    /// Task types whose work may be shared with supporting providers.
    pub parallel_task_types: Vec<Capability>,
    /// Tasks with less remaining time than this get on-demand health checks
    /// before routing, in milliseconds.
    pub time_sensitive_within_ms: u64,
    /// Full re-routes allowed per task after capability-class failures.
    pub max_reroutes: u32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            max_parallelism: 2,
            parallel_task_types: vec![Capability::analysis()],
            time_sensitive_within_ms: 10_000,
            max_reroutes: 1,
        }
    }
}

impl RoutingConfig {
    /// Returns the time-sensitivity threshold.
    #[must_use]
    pub const fn time_sensitive_within(&self) -> Duration {
        Duration::from_millis(self.time_sensitive_within_ms)
    }

    /// Returns how many supporting providers a parallel-worthy task may use.
    #[must_use]
    pub const fn max_supporting(&self) -> usize {
        self.max_parallelism.saturating_sub(1)
    }

    /// Returns whether tasks of `task_type` may use supporting providers.
    #[must_use]
    pub fn is_parallel_worthy(&self, task_type: &Capability) -> bool {
        self.parallel_task_types.contains(task_type)
    }
}
