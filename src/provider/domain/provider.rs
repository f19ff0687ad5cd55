//! Provider aggregate root.

use super::{
    CapabilitySet, ConnectionConfig, HealthRecord, HealthState, HealthTransition,
    PerformanceRecord, ProviderDomainError, ProviderId, ProviderUpdate, TransportKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registration input describing a discovered provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    id: ProviderId,
    connection: ConnectionConfig,
    declared: CapabilitySet,
}

impl ProviderDescriptor {
    /// Creates a descriptor, checking that `transport_kind` matches the
    /// connection configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderDomainError::TransportMismatch`] when the declared
    /// transport kind disagrees with `connection`.
    pub fn new(
        id: ProviderId,
        transport_kind: TransportKind,
        connection: ConnectionConfig,
        declared: CapabilitySet,
    ) -> Result<Self, ProviderDomainError> {
        let configured = connection.kind();
        if configured != transport_kind {
            return Err(ProviderDomainError::TransportMismatch {
                declared: transport_kind,
                configured,
            });
        }

        Ok(Self {
            id,
            connection,
            declared,
        })
    }

    /// Creates a descriptor whose transport kind is taken from `connection`.
    #[must_use]
    pub const fn from_connection(
        id: ProviderId,
        connection: ConnectionConfig,
        declared: CapabilitySet,
    ) -> Self {
        Self {
            id,
            connection,
            declared,
        }
    }

    /// Returns the provider identifier.
    #[must_use]
    pub const fn id(&self) -> &ProviderId {
        &self.id
    }

    /// Returns the connection configuration.
    #[must_use]
    pub const fn connection(&self) -> &ConnectionConfig {
        &self.connection
    }

    /// Returns the self-reported capabilities.
    #[must_use]
    pub const fn declared(&self) -> &CapabilitySet {
        &self.declared
    }
}

/// A discovered provider as tracked by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    id: ProviderId,
    connection: ConnectionConfig,
    declared: CapabilitySet,
    probed: CapabilitySet,
    probed_at: Option<DateTime<Utc>>,
    health: HealthRecord,
    performance: PerformanceRecord,
    registered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Provider {
    /// Creates a provider from its descriptor.
    ///
    /// Probed capabilities start empty and health starts `unknown`.
    #[must_use]
    pub fn new(descriptor: ProviderDescriptor, now: DateTime<Utc>) -> Self {
        Self {
            id: descriptor.id,
            connection: descriptor.connection,
            declared: descriptor.declared,
            probed: CapabilitySet::new(),
            probed_at: None,
            health: HealthRecord::new(),
            performance: PerformanceRecord::new(),
            registered_at: now,
            updated_at: now,
        }
    }

    /// Returns the provider identifier.
    #[must_use]
    pub const fn id(&self) -> &ProviderId {
        &self.id
    }

    /// Returns the transport kind.
    #[must_use]
    pub const fn transport_kind(&self) -> TransportKind {
        self.connection.kind()
    }

    /// Returns the connection configuration.
    #[must_use]
    pub const fn connection(&self) -> &ConnectionConfig {
        &self.connection
    }

    /// Returns the self-reported capabilities.
    #[must_use]
    pub const fn declared_capabilities(&self) -> &CapabilitySet {
        &self.declared
    }

    /// Returns the capabilities confirmed by probing.
    #[must_use]
    pub const fn probed_capabilities(&self) -> &CapabilitySet {
        &self.probed
    }

    /// Returns when capabilities were last probed.
    #[must_use]
    pub const fn probed_at(&self) -> Option<DateTime<Utc>> {
        self.probed_at
    }

    /// Returns the health record.
    #[must_use]
    pub const fn health(&self) -> &HealthRecord {
        &self.health
    }

    /// Returns the current health state.
    #[must_use]
    pub const fn health_state(&self) -> HealthState {
        self.health.state()
    }

    /// Returns the performance history.
    #[must_use]
    pub const fn performance(&self) -> &PerformanceRecord {
        &self.performance
    }

    /// Returns the first registration timestamp.
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether `descriptor` carries the same registration data.
    #[must_use]
    pub fn matches_descriptor(&self, descriptor: &ProviderDescriptor) -> bool {
        self.connection == descriptor.connection && self.declared == descriptor.declared
    }

    /// Replaces connection config and declared capabilities.
    ///
    /// Performance history restarts because it described the old endpoint.
    /// Health and probed capabilities stay until the next check and probe.
    pub fn reconfigure(&mut self, descriptor: ProviderDescriptor, now: DateTime<Utc>) {
        self.connection = descriptor.connection;
        self.declared = descriptor.declared;
        self.performance = PerformanceRecord::new();
        self.updated_at = now;
    }

    /// Applies an update and returns the health transition it caused.
    pub fn apply(&mut self, update: ProviderUpdate) -> Option<HealthTransition> {
        match update {
            ProviderUpdate::HealthCheck {
                outcome,
                policy,
                at,
            } => {
                let rate = self
                    .performance
                    .trusted_success_rate(policy.min_success_samples);
                self.updated_at = at;
                self.health.observe(&outcome, rate, &policy, at)
            }
            ProviderUpdate::ConnectionLost { reason, at } => {
                self.updated_at = at;
                self.health.observe_connection_lost(&reason, at)
            }
            ProviderUpdate::ProbedCapabilities { capabilities, at } => {
                self.probed = capabilities;
                self.probed_at = Some(at);
                self.updated_at = at;
                None
            }
            ProviderUpdate::Invocation {
                success,
                latency,
                smoothing,
                at,
            } => {
                self.performance.record(success, latency, smoothing, at);
                self.updated_at = at;
                None
            }
            ProviderUpdate::Selected { at } => {
                self.performance.record_selection(at);
                self.updated_at = at;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::domain::{Capability, HealthCheckOutcome, HealthPolicy};
    use std::time::Duration;

    fn descriptor() -> ProviderDescriptor {
        ProviderDescriptor::from_connection(
            ProviderId::new("aider").expect("valid id"),
            ConnectionConfig::subprocess("aider").expect("valid config"),
            CapabilitySet::from_iter([Capability::refactoring()]),
        )
    }

    #[test]
    fn new_provider_is_unknown_and_unprobed() {
        let provider = Provider::new(descriptor(), Utc::now());

        assert_eq!(provider.health_state(), HealthState::Unknown);
        assert!(provider.probed_capabilities().is_empty());
        assert_eq!(provider.transport_kind(), TransportKind::Subprocess);
    }

    #[test]
    fn descriptor_rejects_mismatched_transport() {
        let result = ProviderDescriptor::new(
            ProviderId::new("aider").expect("valid id"),
            TransportKind::DirectNetwork,
            ConnectionConfig::subprocess("aider").expect("valid config"),
            CapabilitySet::new(),
        );

        assert!(matches!(
            result,
            Err(ProviderDomainError::TransportMismatch { .. })
        ));
    }

    #[test]
    fn apply_routes_updates_to_the_right_record() {
        let now = Utc::now();
        let mut provider = Provider::new(descriptor(), now);

        let transition = provider.apply(ProviderUpdate::HealthCheck {
            outcome: HealthCheckOutcome::Passed {
                latency: Duration::from_millis(5),
            },
            policy: HealthPolicy::default(),
            at: now,
        });
        provider.apply(ProviderUpdate::Invocation {
            success: true,
            latency: Duration::from_millis(40),
            smoothing: 0.3,
            at: now,
        });

        assert!(transition.is_some());
        assert_eq!(provider.health_state(), HealthState::Healthy);
        assert_eq!(provider.performance().invocations(), 1);
    }

    #[test]
    fn reconfigure_resets_performance_only() {
        let now = Utc::now();
        let mut provider = Provider::new(descriptor(), now);
        provider.apply(ProviderUpdate::Invocation {
            success: false,
            latency: Duration::from_millis(40),
            smoothing: 0.3,
            at: now,
        });
        provider.apply(ProviderUpdate::ProbedCapabilities {
            capabilities: CapabilitySet::from_iter([Capability::refactoring()]),
            at: now,
        });

        let replacement = ProviderDescriptor::from_connection(
            ProviderId::new("aider").expect("valid id"),
            ConnectionConfig::subprocess("aider-next").expect("valid config"),
            CapabilitySet::new(),
        );
        assert!(!provider.matches_descriptor(&replacement));
        provider.reconfigure(replacement, now);

        assert_eq!(provider.performance().invocations(), 0);
        assert_eq!(provider.probed_capabilities().len(), 1);
    }
}
