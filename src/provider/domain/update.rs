//! Mutations accepted by the registry's single writer path.

use super::{CapabilitySet, HealthCheckOutcome, HealthPolicy};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A change to a registered provider.
///
/// Health variants are produced by the health monitor, capability variants by
/// the probe, and invocation variants by the orchestration core. Routing only
/// reads snapshots and never builds updates.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderUpdate {
    /// Result of a periodic or on-demand liveness check.
    HealthCheck {
        /// Check outcome.
        outcome: HealthCheckOutcome,
        /// Thresholds to evaluate the outcome against.
        policy: HealthPolicy,
        /// Check completion time.
        at: DateTime<Utc>,
    },
    /// A hard connection error observed while invoking the provider.
    ConnectionLost {
        /// Error description.
        reason: String,
        /// Observation time.
        at: DateTime<Utc>,
    },
    /// Capabilities confirmed by a probe run.
    ProbedCapabilities {
        /// Capabilities answered successfully.
        capabilities: CapabilitySet,
        /// Probe completion time.
        at: DateTime<Utc>,
    },
    /// Outcome of one invocation attempt.
    Invocation {
        /// Whether the attempt succeeded.
        success: bool,
        /// Time taken by the attempt.
        latency: Duration,
        /// Weight of the newest sample in the rolling averages.
        smoothing: f64,
        /// Completion time.
        at: DateTime<Utc>,
    },
    /// The provider's payload was chosen as the integrated result.
    Selected {
        /// Selection time.
        at: DateTime<Utc>,
    },
}

impl ProviderUpdate {
    /// Returns the canonical name of the update variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::HealthCheck { .. } => "health_check",
            Self::ConnectionLost { .. } => "connection_lost",
            Self::ProbedCapabilities { .. } => "probed_capabilities",
            Self::Invocation { .. } => "invocation",
            Self::Selected { .. } => "selected",
        }
    }
}
