//! Retry and conflict-resolution tunables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-provider retry policy for retryable failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries per provider after the first attempt.
    pub max_retries: u32,
    /// Pause before each retry, in milliseconds.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff_ms: 100,
        }
    }
}

impl RetryPolicy {
    /// Returns the pause before a retry.
    #[must_use]
    pub const fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Built-in resolution strategies selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Use the higher-ranked response and attach the others.
    #[default]
    PreferHigherRanked,
    /// Like `PreferHigherRanked`, but flag results whose alternatives diverge
    /// past the confirmation threshold.
    RequireConfirmation,
}

/// Conflict detection and resolution tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictConfig {
    /// Similarity at or above which two payloads count as the same answer.
    pub equivalence_threshold: f64,
    /// Similarity below which the strict strategy asks for confirmation.
    pub confirmation_threshold: f64,
    /// Strategy used when no custom one is installed.
    pub strategy: StrategyKind,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            equivalence_threshold: 0.9,
            confirmation_threshold: 0.5,
            strategy: StrategyKind::PreferHigherRanked,
        }
    }
}
