//! Shared world state for orchestration BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use switchyard::config::SwitchyardConfig;
use switchyard::connector::adapters::{InMemoryConnector, InMemoryConnectorFactory};
use switchyard::connector::ports::ConnectorFactory;
use switchyard::orchestration::domain::{IntegratedResult, RetryPolicy};
use switchyard::orchestration::services::{OrchestrationError, Orchestrator};
use switchyard::provider::adapters::memory::InMemoryProviderRegistry;
use switchyard::provider::domain::{CapabilitySet, ProviderId};
use switchyard::routing::RoutingConfig;
use switchyard::work::domain::TaskId;

/// Orchestrator type used by the BDD world.
pub type TestOrchestrator = Orchestrator<InMemoryProviderRegistry, DefaultClock>;

/// Scenario world for orchestration behaviour tests.
pub struct OrchestrationWorld {
    /// Registry backing the orchestrator.
    pub registry: Arc<InMemoryProviderRegistry>,
    /// Factory handing out scripted connectors.
    pub factory: Arc<InMemoryConnectorFactory>,
    /// The orchestrator under test.
    pub orchestrator: Arc<TestOrchestrator>,
    /// Scripted connectors by provider name.
    pub connectors: HashMap<String, Arc<InMemoryConnector>>,
    /// Identifier of the last submitted task.
    pub last_task: Option<TaskId>,
    /// Result of the last submission.
    pub last_result: Option<Result<IntegratedResult, OrchestrationError>>,
}

impl OrchestrationWorld {
    /// Creates a world with an empty registry.
    #[must_use]
    #[expect(
        clippy::expect_used,
        reason = "Scenario setup fails loudly on an invalid fixed configuration"
    )]
    pub fn new() -> Self {
        let registry = Arc::new(InMemoryProviderRegistry::new());
        let factory = Arc::new(InMemoryConnectorFactory::new());
        let config = SwitchyardConfig {
            retry: RetryPolicy {
                max_retries: 1,
                backoff_ms: 10,
            },
            routing: RoutingConfig {
                time_sensitive_within_ms: 0,
                ..RoutingConfig::default()
            },
            ..SwitchyardConfig::default()
        };
        let orchestrator = Arc::new(
            Orchestrator::new(
                Arc::clone(&registry),
                Arc::clone(&factory) as Arc<dyn ConnectorFactory>,
                Arc::new(DefaultClock),
                config,
            )
            .expect("scenario configuration is valid"),
        );
        Self {
            registry,
            factory,
            orchestrator,
            connectors: HashMap::new(),
            last_task: None,
            last_result: None,
        }
    }

    /// Returns the scripted connector registered as `name`.
    pub fn connector(&self, name: &str) -> Result<&Arc<InMemoryConnector>, eyre::Report> {
        self.connectors
            .get(name)
            .ok_or_else(|| eyre::eyre!("no provider named '{name}' in scenario world"))
    }

    /// Returns the result of the last submission.
    pub fn result(&self) -> Result<&Result<IntegratedResult, OrchestrationError>, eyre::Report> {
        self.last_result
            .as_ref()
            .ok_or_else(|| eyre::eyre!("no task has been submitted"))
    }
}

impl Default for OrchestrationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> OrchestrationWorld {
    OrchestrationWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Parses a provider identifier from a step argument.
pub fn provider_id(name: &str) -> Result<ProviderId, eyre::Report> {
    ProviderId::new(name).map_err(|err| eyre::eyre!("invalid provider id '{name}': {err}"))
}

/// Parses a comma-separated capability list from a step argument.
pub fn capability_list(names: &str) -> Result<CapabilitySet, eyre::Report> {
    CapabilitySet::parse(names.split(',').map(str::trim))
        .map_err(|err| eyre::eyre!("invalid capabilities '{names}': {err}"))
}
