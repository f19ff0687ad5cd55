//! Errors surfaced to callers of the orchestrator.

use crate::health::HealthMonitorError;
use crate::orchestration::domain::AttemptFailure;
use crate::orchestration::ports::DiscoveryError;
use crate::provider::domain::{Capability, CapabilitySet, ProviderDomainError, ProviderId};
use crate::provider::ports::ProviderRegistryError;
use crate::work::domain::TaskId;
use thiserror::Error;

/// Result type for orchestrator operations.
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

/// Errors returned by [`super::Orchestrator`].
#[derive(Debug, Clone, Error)]
pub enum OrchestrationError {
    /// No routable provider can serve the task, even generically.
    #[error("no capable provider for {task_type} task {task} (requires {required})")]
    NoCapableProvider {
        /// Task that could not be routed.
        task: TaskId,
        /// Task type requested.
        task_type: Capability,
        /// Capabilities required.
        required: CapabilitySet,
    },

    /// Every attempted provider failed.
    #[error("all {} attempted providers failed for task {task}", .failures.len())]
    AllProvidersFailed {
        /// Task that failed.
        task: TaskId,
        /// Final failure per attempted provider, in attempt order.
        failures: Vec<AttemptFailure>,
    },

    /// The caller cancelled the task.
    #[error("task {0} was cancelled")]
    Cancelled(TaskId),

    /// No plan is recorded for the task.
    #[error("no routing plan recorded for task {0}")]
    UnknownTask(TaskId),

    /// A registration input was invalid.
    #[error(transparent)]
    Domain(#[from] ProviderDomainError),

    /// Registry access failed or a provider is unknown.
    #[error(transparent)]
    Registry(#[from] ProviderRegistryError),

    /// The health monitor failed.
    #[error(transparent)]
    Health(#[from] HealthMonitorError),

    /// The discovery source failed.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Orchestrator state could not be accessed.
    #[error("orchestrator state unavailable: {0}")]
    State(String),
}

impl OrchestrationError {
    /// Returns whether the error is a provider-not-found registry error for
    /// `id`.
    #[must_use]
    pub fn is_unknown_provider(&self, id: &ProviderId) -> bool {
        matches!(
            self,
            Self::Registry(ProviderRegistryError::NotFound(missing))
                | Self::Health(HealthMonitorError::Registry(ProviderRegistryError::NotFound(missing)))
                if missing == id
        )
    }
}
