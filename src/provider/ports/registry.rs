//! Registry port: the single owner of provider state.

use crate::provider::domain::{
    HealthTransition, Provider, ProviderDescriptor, ProviderFilter, ProviderId, ProviderUpdate,
    RegistrySnapshot,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for provider registry operations.
pub type ProviderRegistryResult<T> = Result<T, ProviderRegistryError>;

/// What a registration call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The provider was new.
    Created,
    /// The provider existed with identical registration data.
    Unchanged,
    /// The provider existed and its configuration was replaced.
    Reconfigured,
}

/// Concurrent-safe catalogue of providers.
///
/// Reads hand out immutable snapshots; every mutation goes through
/// [`ProviderRegistry::apply`], [`ProviderRegistry::register`] or
/// [`ProviderRegistry::deregister`]. None of these block on I/O.
pub trait ProviderRegistry: Send + Sync {
    /// Registers a provider. Identical repeated registrations are no-ops and
    /// a changed configuration for a known id replaces the old one.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderRegistryError::Storage`] when registry state cannot
    /// be accessed.
    fn register(
        &self,
        descriptor: ProviderDescriptor,
        now: DateTime<Utc>,
    ) -> ProviderRegistryResult<RegistrationOutcome>;

    /// Removes a provider and returns its final state.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderRegistryError::NotFound`] when the id is unknown.
    fn deregister(&self, id: &ProviderId) -> ProviderRegistryResult<Provider>;

    /// Applies one update to one provider.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderRegistryError::NotFound`] when the id is unknown.
    fn apply(
        &self,
        id: &ProviderId,
        update: ProviderUpdate,
    ) -> ProviderRegistryResult<Option<HealthTransition>>;

    /// Returns a consistent view of every provider.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderRegistryError::Storage`] when registry state cannot
    /// be accessed.
    fn snapshot(&self) -> ProviderRegistryResult<RegistrySnapshot>;

    /// Returns a copy of one provider.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderRegistryError::Storage`] when registry state cannot
    /// be accessed.
    fn get(&self, id: &ProviderId) -> ProviderRegistryResult<Option<Provider>> {
        Ok(self.snapshot()?.get(id).cloned())
    }

    /// Returns copies of providers matching `filter`, in identifier order.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderRegistryError::Storage`] when registry state cannot
    /// be accessed.
    fn list(&self, filter: &ProviderFilter) -> ProviderRegistryResult<Vec<Provider>> {
        Ok(self.snapshot()?.filter(filter).cloned().collect())
    }
}

/// Errors returned by provider registry implementations.
#[derive(Debug, Clone, Error)]
pub enum ProviderRegistryError {
    /// The provider was not found.
    #[error("provider not found: {0}")]
    NotFound(ProviderId),

    /// Registry state could not be read or written.
    #[error("registry storage error: {0}")]
    Storage(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProviderRegistryError {
    /// Wraps a storage-layer failure.
    #[must_use]
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Arc::new(err))
    }
}
