//! Adapter implementations for orchestration ports.

mod discovery;

pub use discovery::StaticDiscoverySource;
