//! Copy-on-write in-memory provider registry.

use crate::provider::{
    domain::{HealthTransition, Provider, ProviderDescriptor, ProviderId, ProviderUpdate, RegistrySnapshot},
    ports::{ProviderRegistry, ProviderRegistryError, ProviderRegistryResult, RegistrationOutcome},
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory provider registry.
///
/// Readers clone an `Arc` to the current state; writers copy the state only
/// when a snapshot is still alive, mutate it and bump the version.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProviderRegistry {
    state: Arc<RwLock<RegistryState>>,
}

#[derive(Debug, Default)]
struct RegistryState {
    version: u64,
    providers: Arc<BTreeMap<ProviderId, Arc<Provider>>>,
}

impl RegistryState {
    const fn commit(&mut self) {
        self.version = self.version.saturating_add(1);
    }
}

impl InMemoryProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ProviderRegistryResult<RwLockReadGuard<'_, RegistryState>> {
        self.state.read().map_err(|err| {
            ProviderRegistryError::storage(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> ProviderRegistryResult<RwLockWriteGuard<'_, RegistryState>> {
        self.state.write().map_err(|err| {
            ProviderRegistryError::storage(std::io::Error::other(err.to_string()))
        })
    }
}

impl ProviderRegistry for InMemoryProviderRegistry {
    fn register(
        &self,
        descriptor: ProviderDescriptor,
        now: DateTime<Utc>,
    ) -> ProviderRegistryResult<RegistrationOutcome> {
        let mut state = self.write()?;

        let outcome = match state.providers.get(descriptor.id()) {
            Some(existing) if existing.matches_descriptor(&descriptor) => {
                return Ok(RegistrationOutcome::Unchanged);
            }
            Some(_) => RegistrationOutcome::Reconfigured,
            None => RegistrationOutcome::Created,
        };

        match Arc::make_mut(&mut state.providers).entry(descriptor.id().clone()) {
            Entry::Occupied(mut slot) => Arc::make_mut(slot.get_mut()).reconfigure(descriptor, now),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Provider::new(descriptor, now)));
            }
        }
        state.commit();
        Ok(outcome)
    }

    fn deregister(&self, id: &ProviderId) -> ProviderRegistryResult<Provider> {
        let mut state = self.write()?;
        let removed = Arc::make_mut(&mut state.providers)
            .remove(id)
            .ok_or_else(|| ProviderRegistryError::NotFound(id.clone()))?;
        state.commit();
        Ok(Arc::unwrap_or_clone(removed))
    }

    fn apply(
        &self,
        id: &ProviderId,
        update: ProviderUpdate,
    ) -> ProviderRegistryResult<Option<HealthTransition>> {
        let mut state = self.write()?;
        if !state.providers.contains_key(id) {
            return Err(ProviderRegistryError::NotFound(id.clone()));
        }

        let transition = Arc::make_mut(&mut state.providers)
            .get_mut(id)
            .map(|provider| Arc::make_mut(provider).apply(update))
            .ok_or_else(|| ProviderRegistryError::NotFound(id.clone()))?;
        state.commit();
        Ok(transition)
    }

    fn snapshot(&self) -> ProviderRegistryResult<RegistrySnapshot> {
        let state = self.read()?;
        Ok(RegistrySnapshot::new(
            state.version,
            Arc::clone(&state.providers),
        ))
    }
}
