//! Orchestration core: executes routing plans, resolves conflicting
//! results and feeds outcomes back into the registry.
//!
//! The module follows hexagonal architecture:
//!
//! - Conflict resolution and result types in [`domain`]
//! - The provider discovery port in [`ports`]
//! - A static discovery adapter in [`adapters`]
//! - The [`services::Orchestrator`] facade used by host surfaces

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
