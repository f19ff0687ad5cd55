//! Candidate scoring.

use super::{PreferenceTable, ScoringWeights};
use crate::provider::domain::{HealthState, Provider, ProviderId};
use crate::work::domain::Task;
use std::cmp::Ordering;
use std::fmt;

/// Score given to a component without enough history to judge.
const NEUTRAL: f64 = 0.5;

/// How well a provider's probed capabilities match a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityFit {
    /// The provider offers the task's own type.
    Exact,
    /// The provider covers the requirements without the task's type.
    Partial,
    /// Only the generic fallback capability matched.
    Generic,
}

impl CapabilityFit {
    /// Returns the normalised fit score.
    #[must_use]
    pub const fn score(self) -> f64 {
        match self {
            Self::Exact => 1.0,
            Self::Partial => 0.5,
            Self::Generic => 0.25,
        }
    }

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Partial => "partial",
            Self::Generic => "generic",
        }
    }
}

/// Score breakdown for one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteScore {
    provider: ProviderId,
    fit: CapabilityFit,
    capability_fit: f64,
    preference: f64,
    performance: f64,
    health: f64,
    total: f64,
    latency_ms: Option<f64>,
}

impl RouteScore {
    /// Scores `provider` for `task`.
    ///
    /// `fastest_ms` is the lowest rolling latency among all candidates and
    /// normalises the inverse-latency term.
    #[expect(
        clippy::float_arithmetic,
        reason = "scores are weighted sums of normalised components"
    )]
    pub(super) fn compute(
        provider: &Provider,
        task: &Task,
        fit: CapabilityFit,
        preferences: &PreferenceTable,
        weights: &ScoringWeights,
        fastest_ms: Option<f64>,
    ) -> Self {
        let record = provider.performance();
        let success = if record.invocations() == 0 {
            NEUTRAL
        } else {
            record.success_rate()
        };
        let latency = match (record.latency_ms(), fastest_ms) {
            (Some(own), Some(fastest)) if own > 0.0 => (fastest / own).clamp(0.0, 1.0),
            (Some(_), _) => 1.0,
            (None, _) => NEUTRAL,
        };
        let performance = (success + latency) / 2.0;
        let health = match provider.health_state() {
            HealthState::Healthy => 1.0,
            HealthState::Degraded => 0.5,
            HealthState::Unknown | HealthState::Unavailable => 0.0,
        };
        let preference = preferences.weight(task.task_type(), provider.id());
        let capability_fit = fit.score();
        let total = weights.capability_fit * capability_fit
            + weights.preference * preference
            + weights.performance * performance
            + weights.health * health;

        Self {
            provider: provider.id().clone(),
            fit,
            capability_fit,
            preference,
            performance,
            health,
            total,
            latency_ms: record.latency_ms(),
        }
    }

    /// Returns the scored provider.
    #[must_use]
    pub const fn provider(&self) -> &ProviderId {
        &self.provider
    }

    /// Returns the capability fit class.
    #[must_use]
    pub const fn fit(&self) -> CapabilityFit {
        self.fit
    }

    /// Returns the weighted total.
    #[must_use]
    pub const fn total(&self) -> f64 {
        self.total
    }

    /// Returns the normalised preference component.
    #[must_use]
    pub const fn preference(&self) -> f64 {
        self.preference
    }

    /// Returns the normalised performance component.
    #[must_use]
    pub const fn performance(&self) -> f64 {
        self.performance
    }

    /// Returns the rolling latency used for tie-breaks.
    #[must_use]
    pub const fn latency_ms(&self) -> Option<f64> {
        self.latency_ms
    }

    /// Orders candidates best first: higher total, then lower latency
    /// (unknown latency last), then provider id.
    #[must_use]
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .total
            .total_cmp(&self.total)
            .then_with(|| {
                let own = self.latency_ms.unwrap_or(f64::INFINITY);
                let theirs = other.latency_ms.unwrap_or(f64::INFINITY);
                own.total_cmp(&theirs)
            })
            .then_with(|| self.provider.cmp(&other.provider))
    }
}

impl fmt::Display for RouteScore {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} {:.3} (fit {} {:.2}, preference {:.2}, performance {:.2}, health {:.2})",
            self.provider,
            self.total,
            self.fit.as_str(),
            self.capability_fit,
            self.preference,
            self.performance,
            self.health
        )
    }
}
