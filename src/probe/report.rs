//! Probe outcome value types.

use crate::provider::domain::{Capability, CapabilitySet, ProviderId};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// How the confirmed capabilities were established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    /// The provider answered a capability listing call.
    Listing,
    /// One canary task was issued per declared capability.
    Canary,
}

/// Result of probing one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    provider: ProviderId,
    method: ProbeMethod,
    confirmed: CapabilitySet,
    rejected: BTreeMap<Capability, String>,
    completed_at: DateTime<Utc>,
}

impl ProbeReport {
    pub(super) const fn new(
        provider: ProviderId,
        method: ProbeMethod,
        confirmed: CapabilitySet,
        rejected: BTreeMap<Capability, String>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            provider,
            method,
            confirmed,
            rejected,
            completed_at,
        }
    }

    /// Returns the probed provider.
    #[must_use]
    pub const fn provider(&self) -> &ProviderId {
        &self.provider
    }

    /// Returns how capabilities were established.
    #[must_use]
    pub const fn method(&self) -> ProbeMethod {
        self.method
    }

    /// Returns the capabilities the provider answered successfully.
    #[must_use]
    pub const fn confirmed(&self) -> &CapabilitySet {
        &self.confirmed
    }

    /// Returns declared capabilities that were not confirmed, with reasons.
    #[must_use]
    pub const fn rejected(&self) -> &BTreeMap<Capability, String> {
        &self.rejected
    }

    /// Returns when the probe finished.
    #[must_use]
    pub const fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
