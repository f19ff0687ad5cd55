//! Port contracts for the provider registry.

mod registry;

pub use registry::{
    ProviderRegistry, ProviderRegistryError, ProviderRegistryResult, RegistrationOutcome,
};
