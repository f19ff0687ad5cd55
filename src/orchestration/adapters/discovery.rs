//! Discovery source backed by a caller-maintained list.

use crate::orchestration::ports::{DiscoveryResult, DiscoverySource};
use crate::provider::domain::ProviderDescriptor;
use async_trait::async_trait;
use std::sync::{PoisonError, RwLock};

/// Discovery source returning a fixed set of descriptors until replaced.
#[derive(Debug, Default)]
pub struct StaticDiscoverySource {
    descriptors: RwLock<Vec<ProviderDescriptor>>,
}

impl StaticDiscoverySource {
    /// Creates a source returning `descriptors`.
    #[must_use]
    pub const fn new(descriptors: Vec<ProviderDescriptor>) -> Self {
        Self {
            descriptors: RwLock::new(descriptors),
        }
    }

    /// Replaces the descriptors returned by later cycles.
    pub fn replace(&self, descriptors: Vec<ProviderDescriptor>) {
        *self
            .descriptors
            .write()
            .unwrap_or_else(PoisonError::into_inner) = descriptors;
    }

    /// Adds one descriptor.
    pub fn push(&self, descriptor: ProviderDescriptor) {
        self.descriptors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(descriptor);
    }
}

#[async_trait]
impl DiscoverySource for StaticDiscoverySource {
    async fn discover(&self) -> DiscoveryResult<Vec<ProviderDescriptor>> {
        Ok(self
            .descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
