//! Domain model for capability providers.
//!
//! A provider is an external assistant reachable over one of four transport
//! kinds. The domain keeps declared capabilities (a discovery hint) apart from
//! probed capabilities (what routing trusts), and models health as an explicit
//! state machine so every transition can be validated.

mod capability;
mod error;
mod health;
mod ids;
mod performance;
mod provider;
mod snapshot;
mod transport;
mod update;

pub use capability::{Capability, CapabilitySet};
pub use error::{ParseHealthStateError, ParseTransportKindError, ProviderDomainError};
pub use health::{HealthCheckOutcome, HealthPolicy, HealthRecord, HealthState, HealthTransition};
pub use ids::ProviderId;
pub use performance::PerformanceRecord;
pub use provider::{Provider, ProviderDescriptor};
pub use snapshot::{ProviderFilter, RegistrySnapshot};
pub use transport::{
    ConnectionConfig, NetworkConfig, PluginCommandConfig, ProcessConfig, TransportKind,
};
pub use update::ProviderUpdate;
