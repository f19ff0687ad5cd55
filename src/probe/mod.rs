//! Capability probing.
//!
//! A probe establishes what a provider can actually do, independent of what
//! it declared at registration. It prefers the provider's own "list supported
//! operations" call and falls back to one side-effect-free canary task per
//! declared capability. The confirmed set is written back through the
//! registry; a failed probe yields an empty or reduced set and never removes
//! the provider.

mod report;
mod service;

pub use report::{ProbeMethod, ProbeReport};
pub use service::{CapabilityProbe, ProbeConfig};

#[cfg(test)]
mod tests;
