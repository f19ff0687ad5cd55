//! Health monitoring: periodic liveness checks driving the per-provider
//! health state machine.
//!
//! Each watched provider gets its own check loop and its own re-probe loop,
//! so a hung provider never delays checks on another. All state changes go
//! through [`ProviderRegistry::apply`](crate::provider::ports::ProviderRegistry::apply).

mod monitor;

pub use monitor::{HealthMonitor, HealthMonitorError, HealthMonitorResult};

#[cfg(test)]
mod tests;
