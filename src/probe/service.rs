//! Capability probe service.

use super::{ProbeMethod, ProbeReport};
use crate::connector::ports::Connector;
use crate::provider::domain::{Capability, CapabilitySet, Provider, ProviderUpdate};
use crate::provider::ports::{ProviderRegistry, ProviderRegistryResult};
use crate::work::domain::{Task, WorkspaceSnapshot};
use futures::future::join_all;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Probe tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Latency budget for the listing call and for each canary, in
    /// milliseconds.
    pub latency_budget_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            latency_budget_ms: 5_000,
        }
    }
}

impl ProbeConfig {
    /// Returns the latency budget.
    #[must_use]
    pub const fn latency_budget(&self) -> Duration {
        Duration::from_millis(self.latency_budget_ms)
    }
}

/// Determines and records a provider's actual capabilities.
#[derive(Clone)]
pub struct CapabilityProbe<R, C>
where
    R: ProviderRegistry,
    C: Clock + Send + Sync,
{
    registry: Arc<R>,
    clock: Arc<C>,
    config: ProbeConfig,
}

impl<R, C> CapabilityProbe<R, C>
where
    R: ProviderRegistry,
    C: Clock + Send + Sync,
{
    /// Creates a probe writing into `registry`.
    #[must_use]
    pub const fn new(registry: Arc<R>, clock: Arc<C>, config: ProbeConfig) -> Self {
        Self {
            registry,
            clock,
            config,
        }
    }

    /// Returns the probe tunables.
    #[must_use]
    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Probes `provider` through `connector` and records the confirmed set.
    ///
    /// # Errors
    ///
    /// Returns registry errors when the result cannot be written, for
    /// example because the provider was deregistered mid-probe.
    pub async fn probe(
        &self,
        provider: &Provider,
        connector: &dyn Connector,
    ) -> ProviderRegistryResult<ProbeReport> {
        let report = self.discover(provider, connector).await;
        self.registry.apply(
            provider.id(),
            ProviderUpdate::ProbedCapabilities {
                capabilities: report.confirmed().clone(),
                at: report.completed_at(),
            },
        )?;
        info!(
            provider = %provider.id(),
            method = ?report.method(),
            confirmed = %report.confirmed(),
            rejected = report.rejected().len(),
            "capability probe finished"
        );
        Ok(report)
    }

    async fn discover(&self, provider: &Provider, connector: &dyn Connector) -> ProbeReport {
        let budget = self.config.latency_budget();
        match tokio::time::timeout(budget, connector.list_capabilities()).await {
            Ok(Ok(Some(listed))) => return self.from_listing(provider, listed),
            Ok(Ok(None)) => {
                debug!(provider = %provider.id(), "no capability listing, using canaries");
            }
            Ok(Err(err)) => {
                warn!(provider = %provider.id(), error = %err, "capability listing failed, using canaries");
            }
            Err(_) => {
                warn!(provider = %provider.id(), "capability listing exceeded budget, using canaries");
            }
        }
        self.from_canaries(provider, connector, budget).await
    }

    fn from_listing(&self, provider: &Provider, listed: CapabilitySet) -> ProbeReport {
        let rejected = provider
            .declared_capabilities()
            .missing(&listed)
            .iter()
            .map(|capability| (capability.clone(), "not listed by provider".to_owned()))
            .collect();
        ProbeReport::new(
            provider.id().clone(),
            ProbeMethod::Listing,
            listed,
            rejected,
            self.clock.utc(),
        )
    }

    async fn from_canaries(
        &self,
        provider: &Provider,
        connector: &dyn Connector,
        budget: Duration,
    ) -> ProbeReport {
        let workspace = WorkspaceSnapshot::new();
        let canaries = provider.declared_capabilities().iter().map(|capability| {
            let task = canary_task(capability, budget);
            let snapshot = &workspace;
            async move {
                let response = connector.invoke(&task, snapshot).await;
                (capability.clone(), response)
            }
        });

        let mut confirmed = CapabilitySet::new();
        let mut rejected = BTreeMap::new();
        for (capability, response) in join_all(canaries).await {
            match response.error() {
                None if response.latency() <= budget => {
                    confirmed.insert(capability);
                }
                None => {
                    rejected.insert(capability, "answered outside the latency budget".to_owned());
                }
                Some(error) => {
                    rejected.insert(capability, format!("{}: {}", error.kind, error.message));
                }
            }
        }
        ProbeReport::new(
            provider.id().clone(),
            ProbeMethod::Canary,
            confirmed,
            rejected,
            self.clock.utc(),
        )
    }
}

/// Builds the side-effect-free diagnostic task for one capability.
fn canary_task(capability: &Capability, budget: Duration) -> Task {
    Task::new(
        capability.clone(),
        json!({ "canary": true, "capability": capability.as_str() }),
    )
    .with_timeout(budget)
}
