//! Consistent, versioned views of the registry.

use super::{Capability, HealthState, Provider, ProviderId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Immutable view of every provider at one registry version.
///
/// Routing decisions read a single snapshot, so a provider changing state
/// mid-decision is observed entirely before or entirely after the change.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    version: u64,
    providers: Arc<BTreeMap<ProviderId, Arc<Provider>>>,
}

impl RegistrySnapshot {
    /// Wraps shared registry state.
    #[must_use]
    pub const fn new(version: u64, providers: Arc<BTreeMap<ProviderId, Arc<Provider>>>) -> Self {
        Self { version, providers }
    }

    /// Builds a snapshot from loose providers.
    #[must_use]
    pub fn from_providers(version: u64, providers: impl IntoIterator<Item = Provider>) -> Self {
        let map = providers
            .into_iter()
            .map(|provider| (provider.id().clone(), Arc::new(provider)))
            .collect();
        Self::new(version, Arc::new(map))
    }

    /// Returns the registry version this snapshot was taken at.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Looks up a provider.
    #[must_use]
    pub fn get(&self, id: &ProviderId) -> Option<&Provider> {
        self.providers.get(id).map(AsRef::as_ref)
    }

    /// Iterates providers in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Provider> {
        self.providers.values().map(AsRef::as_ref)
    }

    /// Returns providers matching `filter`, in identifier order.
    pub fn filter<'a>(&'a self, filter: &'a ProviderFilter) -> impl Iterator<Item = &'a Provider> {
        self.iter().filter(move |provider| filter.matches(provider))
    }

    /// Returns the number of providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns whether the snapshot holds no providers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Criteria for listing providers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderFilter {
    capability: Option<Capability>,
    states: Vec<HealthState>,
}

impl ProviderFilter {
    /// Creates a filter matching every provider.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            capability: None,
            states: Vec::new(),
        }
    }

    /// Restricts to providers whose probed capabilities include `capability`.
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = Some(capability);
        self
    }

    /// Restricts to providers in `state`; repeated calls widen the match.
    #[must_use]
    pub fn with_health(mut self, state: HealthState) -> Self {
        if !self.states.contains(&state) {
            self.states.push(state);
        }
        self
    }

    /// Returns whether `provider` satisfies the filter.
    #[must_use]
    pub fn matches(&self, provider: &Provider) -> bool {
        let capability_ok = self
            .capability
            .as_ref()
            .is_none_or(|capability| provider.probed_capabilities().contains(capability));
        let state_ok = self.states.is_empty() || self.states.contains(&provider.health_state());
        capability_ok && state_ok
    }
}
