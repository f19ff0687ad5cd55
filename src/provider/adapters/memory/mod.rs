//! In-memory provider registry adapter.

mod registry;

pub use registry::InMemoryProviderRegistry;
