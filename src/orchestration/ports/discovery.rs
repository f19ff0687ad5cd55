//! Discovery port: where provider registrations come from.

use crate::provider::domain::ProviderDescriptor;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Errors raised by discovery sources.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    /// The source could not be listed.
    #[error("discovery source unavailable: {0}")]
    Unavailable(String),

    /// The source returned an unusable entry.
    #[error("invalid discovery entry: {0}")]
    InvalidEntry(Arc<dyn std::error::Error + Send + Sync>),
}

impl DiscoveryError {
    /// Wraps an entry-level failure.
    #[must_use]
    pub fn invalid_entry(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidEntry(Arc::new(err))
    }
}

/// Lists the providers currently present in the host environment.
///
/// Only the `discover` call may perform I/O. Each cycle's descriptors are
/// registered idempotently, so sources may return every provider every time.
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    /// Returns the providers currently discoverable.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError`] when the source cannot be listed.
    async fn discover(&self) -> DiscoveryResult<Vec<ProviderDescriptor>>;
}
