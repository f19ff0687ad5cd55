//! Port contracts for the orchestration core.

mod discovery;

pub use discovery::{DiscoveryError, DiscoveryResult, DiscoverySource};
