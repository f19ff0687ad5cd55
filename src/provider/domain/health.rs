//! Provider health state machine.
//!
//! States move only along these edges (self-loops aside):
//!
//! - `unknown -> healthy` on the first successful check
//! - `healthy -> degraded` when a check is slow or the recent success rate
//!   drops below the policy floor
//! - `healthy | degraded -> unavailable` after N consecutive failed checks or
//!   a hard connection error
//! - `degraded -> healthy` after M consecutive checks within threshold
//! - `unavailable -> healthy` on a successful check once the recovery grace
//!   period has elapsed

use super::ParseHealthStateError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Health state of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// Health has not been established yet.
    Unknown,
    /// Provider answers checks within thresholds.
    Healthy,
    /// Provider answers checks but is slow or failing tasks.
    Degraded,
    /// Provider is unreachable.
    Unavailable,
}

impl HealthState {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unavailable => "unavailable",
        }
    }

    /// Returns whether providers in this state may be selected by routing.
    #[must_use]
    pub const fn is_routable(self) -> bool {
        matches!(self, Self::Healthy | Self::Degraded)
    }

    /// Returns whether the state machine allows moving to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Unknown, Self::Healthy)
                | (Self::Healthy, Self::Degraded | Self::Unavailable)
                | (Self::Degraded, Self::Healthy | Self::Unavailable)
                | (Self::Unavailable, Self::Healthy)
        )
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for HealthState {
    type Error = ParseHealthStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "unknown" => Ok(Self::Unknown),
            "healthy" => Ok(Self::Healthy),
            "degraded" => Ok(Self::Degraded),
            "unavailable" => Ok(Self::Unavailable),
            _ => Err(ParseHealthStateError(value.to_owned())),
        }
    }
}

/// Tunable thresholds for health checking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthPolicy {
    /// Consecutive failed checks before a provider becomes unavailable.
    pub failure_threshold: u32,
    /// Consecutive good checks before a degraded provider recovers.
    pub recovery_threshold: u32,
    /// Check latency above which a provider is considered degraded.
    pub latency_threshold_ms: u64,
    /// Rolling task success rate below which a provider is degraded.
    pub min_success_rate: f64,
    /// Invocations required before the success rate is trusted.
    pub min_success_samples: u64,
    /// Interval between periodic checks.
    pub check_interval_ms: u64,
    /// Upper bound on a single check; slower checks count as failures.
    pub check_timeout_ms: u64,
    /// Minimum unavailability before a successful check can recover.
    pub recovery_grace_ms: u64,
    /// Sustained unreachability after which a provider is removed.
    pub removal_grace_ms: u64,
    /// Interval between capability re-probes.
    pub probe_interval_ms: u64,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_threshold: 2,
            latency_threshold_ms: 2_000,
            min_success_rate: 0.5,
            min_success_samples: 5,
            check_interval_ms: 15_000,
            check_timeout_ms: 3_000,
            recovery_grace_ms: 30_000,
            removal_grace_ms: 30 * 60 * 1_000,
            probe_interval_ms: 60 * 60 * 1_000,
        }
    }
}

impl HealthPolicy {
    /// Returns the periodic check interval.
    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    /// Returns the per-check timeout.
    #[must_use]
    pub const fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    /// Returns the latency threshold for healthy checks.
    #[must_use]
    pub const fn latency_threshold(&self) -> Duration {
        Duration::from_millis(self.latency_threshold_ms)
    }

    /// Returns the capability re-probe interval.
    #[must_use]
    pub const fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }
}

/// Result of a single liveness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthCheckOutcome {
    /// The check succeeded.
    Passed {
        /// Time taken by the check.
        latency: Duration,
    },
    /// The check failed or timed out.
    Failed {
        /// Failure description.
        reason: String,
    },
}

/// A recorded health-state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthTransition {
    /// State before the change.
    pub from: HealthState,
    /// State after the change.
    pub to: HealthState,
    /// When the change happened.
    pub at: DateTime<Utc>,
}

impl HealthTransition {
    /// Returns whether this transition is a recovery from unavailability.
    #[must_use]
    pub fn is_recovery(&self) -> bool {
        self.from == HealthState::Unavailable && self.to == HealthState::Healthy
    }
}

/// Health state plus the counters the state machine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    state: HealthState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    unavailable_since: Option<DateTime<Utc>>,
    unreachable_since: Option<DateTime<Utc>>,
    last_checked: Option<DateTime<Utc>>,
    last_message: Option<String>,
}

impl Default for HealthRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRecord {
    /// Creates a record in the `unknown` state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: HealthState::Unknown,
            consecutive_failures: 0,
            consecutive_successes: 0,
            unavailable_since: None,
            unreachable_since: None,
            last_checked: None,
            last_message: None,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> HealthState {
        self.state
    }

    /// Returns the number of consecutive failed checks.
    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Returns when the last check completed.
    #[must_use]
    pub const fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.last_checked
    }

    /// Returns the most recent failure description.
    #[must_use]
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Returns when the provider entered `unavailable`.
    #[must_use]
    pub const fn unavailable_since(&self) -> Option<DateTime<Utc>> {
        self.unavailable_since
    }

    /// Applies a check outcome and returns the resulting transition, if any.
    ///
    /// `recent_success_rate` is the provider's rolling task success rate when
    /// enough samples exist to trust it.
    pub fn observe(
        &mut self,
        outcome: &HealthCheckOutcome,
        recent_success_rate: Option<f64>,
        policy: &HealthPolicy,
        now: DateTime<Utc>,
    ) -> Option<HealthTransition> {
        self.last_checked = Some(now);
        match outcome {
            HealthCheckOutcome::Passed { latency } => {
                let within_threshold = *latency <= policy.latency_threshold()
                    && recent_success_rate.is_none_or(|rate| rate >= policy.min_success_rate);
                self.observe_success(within_threshold, policy, now)
            }
            HealthCheckOutcome::Failed { reason } => self.observe_failure(reason, policy, now),
        }
    }

    /// Applies a hard connection error reported outside the periodic checks.
    pub fn observe_connection_lost(
        &mut self,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Option<HealthTransition> {
        self.record_failure(reason, now);
        match self.state {
            HealthState::Healthy | HealthState::Degraded => {
                self.transition_to(HealthState::Unavailable, now)
            }
            HealthState::Unknown | HealthState::Unavailable => None,
        }
    }

    /// Returns whether the provider has been unreachable for longer than the
    /// removal grace period.
    #[must_use]
    pub fn is_removable(&self, policy: &HealthPolicy, now: DateTime<Utc>) -> bool {
        self.unreachable_since
            .is_some_and(|since| elapsed_at_least(since, now, policy.removal_grace_ms))
    }

    fn observe_success(
        &mut self,
        within_threshold: bool,
        policy: &HealthPolicy,
        now: DateTime<Utc>,
    ) -> Option<HealthTransition> {
        self.consecutive_failures = 0;
        self.unreachable_since = None;

        match self.state {
            HealthState::Unknown => {
                self.consecutive_successes = 1;
                self.transition_to(HealthState::Healthy, now)
            }
            HealthState::Healthy if within_threshold => {
                self.consecutive_successes = self.consecutive_successes.saturating_add(1);
                None
            }
            HealthState::Healthy => {
                self.consecutive_successes = 0;
                self.transition_to(HealthState::Degraded, now)
            }
            HealthState::Degraded if within_threshold => {
                self.consecutive_successes = self.consecutive_successes.saturating_add(1);
                if self.consecutive_successes >= policy.recovery_threshold {
                    self.transition_to(HealthState::Healthy, now)
                } else {
                    None
                }
            }
            HealthState::Degraded => {
                self.consecutive_successes = 0;
                None
            }
            HealthState::Unavailable => {
                let grace_elapsed = self
                    .unavailable_since
                    .is_none_or(|since| elapsed_at_least(since, now, policy.recovery_grace_ms));
                if grace_elapsed {
                    self.consecutive_successes = 1;
                    self.transition_to(HealthState::Healthy, now)
                } else {
                    None
                }
            }
        }
    }

    fn observe_failure(
        &mut self,
        reason: &str,
        policy: &HealthPolicy,
        now: DateTime<Utc>,
    ) -> Option<HealthTransition> {
        self.record_failure(reason, now);
        let exhausted = self.consecutive_failures >= policy.failure_threshold;
        match self.state {
            HealthState::Healthy | HealthState::Degraded if exhausted => {
                self.transition_to(HealthState::Unavailable, now)
            }
            _ => None,
        }
    }

    fn record_failure(&mut self, reason: &str, now: DateTime<Utc>) {
        self.consecutive_successes = 0;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.unreachable_since.get_or_insert(now);
        let trimmed = reason.trim();
        if !trimmed.is_empty() {
            self.last_message = Some(trimmed.to_owned());
        }
    }

    fn transition_to(&mut self, target: HealthState, now: DateTime<Utc>) -> Option<HealthTransition> {
        if !self.state.can_transition_to(target) {
            return None;
        }

        let transition = HealthTransition {
            from: self.state,
            to: target,
            at: now,
        };
        self.state = target;
        self.unavailable_since = match target {
            HealthState::Unavailable => Some(now),
            _ => None,
        };
        if target == HealthState::Healthy {
            self.last_message = None;
        }
        Some(transition)
    }
}

fn elapsed_at_least(since: DateTime<Utc>, now: DateTime<Utc>, millis: u64) -> bool {
    now.signed_duration_since(since)
        .to_std()
        .is_ok_and(|elapsed| elapsed >= Duration::from_millis(millis))
}
