//! Orchestrator behaviour against scripted in-memory providers.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ConfigError, SwitchyardConfig};
use crate::connector::adapters::{InMemoryConnector, InMemoryConnectorFactory};
use crate::connector::ports::{ConnectorError, ConnectorFactory};
use crate::orchestration::adapters::StaticDiscoverySource;
use crate::orchestration::domain::{IntegratedResult, RetryPolicy};
use crate::orchestration::services::{OrchestrationError, OrchestrationResult, Orchestrator};
use crate::provider::{
    adapters::memory::InMemoryProviderRegistry,
    domain::{
        Capability, CapabilitySet, ConnectionConfig, HealthCheckOutcome, HealthPolicy,
        HealthState, Provider, ProviderDescriptor, ProviderId, ProviderUpdate, TransportKind,
    },
    ports::{ProviderRegistry, RegistrationOutcome},
};
use crate::routing::{RoutingConfig, ScoringWeights};
use crate::work::domain::{ResponseErrorKind, Task, WorkspaceSnapshot};
use chrono::Utc;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::json;
use tokio_util::sync::CancellationToken;

type TestOrchestrator = Orchestrator<InMemoryProviderRegistry, DefaultClock>;

struct Harness {
    registry: Arc<InMemoryProviderRegistry>,
    factory: Arc<InMemoryConnectorFactory>,
    orchestrator: Arc<TestOrchestrator>,
}

fn id(name: &str) -> ProviderId {
    ProviderId::new(name).expect("valid provider id")
}

fn capabilities(names: &[&str]) -> CapabilitySet {
    CapabilitySet::parse(names.iter().copied()).expect("valid capabilities")
}

fn quick_config() -> SwitchyardConfig {
    SwitchyardConfig {
        retry: RetryPolicy {
            max_retries: 1,
            backoff_ms: 10,
        },
        routing: RoutingConfig {
            time_sensitive_within_ms: 0,
            ..RoutingConfig::default()
        },
        ..SwitchyardConfig::default()
    }
}

fn harness_with(config: SwitchyardConfig) -> Harness {
    let registry = Arc::new(InMemoryProviderRegistry::new());
    let factory = Arc::new(InMemoryConnectorFactory::new());
    let orchestrator = Arc::new(
        Orchestrator::new(
            Arc::clone(&registry),
            Arc::clone(&factory) as Arc<dyn ConnectorFactory>,
            Arc::new(DefaultClock),
            config,
        )
        .expect("valid config"),
    );
    Harness {
        registry,
        factory,
        orchestrator,
    }
}

#[fixture]
fn harness() -> Harness {
    harness_with(quick_config())
}

impl Harness {
    /// Registers a provider whose listing reports `names`.
    async fn provider(&self, name: &str, names: &[&str]) -> Arc<InMemoryConnector> {
        let connector = self.factory.scripted(&id(name));
        connector.set_capabilities(Some(capabilities(names)));
        self.orchestrator
            .register_provider(
                id(name),
                TransportKind::MessageRpc,
                ConnectionConfig::message_rpc(name).expect("config"),
                capabilities(names),
            )
            .await
            .expect("provider registered");
        connector
    }

    fn state(&self, name: &str) -> Provider {
        self.registry
            .get(&id(name))
            .expect("registry readable")
            .expect("provider registered")
    }

    async fn submit(&self, task: Task) -> OrchestrationResult<IntegratedResult> {
        self.orchestrator
            .submit_task(task, WorkspaceSnapshot::new())
            .await
    }
}

fn task(task_type: &str) -> Task {
    Task::new(
        Capability::new(task_type).expect("valid capability"),
        json!({"prompt": "help"}),
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registration_probes_and_checks_providers(harness: Harness) {
    harness.provider("alpha", &["completion"]).await;

    let provider = harness.state("alpha");
    assert_eq!(provider.health_state(), HealthState::Healthy);
    assert_eq!(provider.probed_capabilities(), &capabilities(&["completion"]));
    assert!(harness.orchestrator.monitor().is_watching(&id("alpha")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_registration_is_idempotent_and_reconfiguration_reconnects(harness: Harness) {
    let connector = harness.provider("alpha", &["completion"]).await;

    let repeated = harness
        .orchestrator
        .register_provider(
            id("alpha"),
            TransportKind::MessageRpc,
            ConnectionConfig::message_rpc("alpha").expect("config"),
            capabilities(&["completion"]),
        )
        .await
        .expect("re-registered");
    let changed = harness
        .orchestrator
        .register_provider(
            id("alpha"),
            TransportKind::MessageRpc,
            ConnectionConfig::message_rpc("alpha-v2").expect("config"),
            capabilities(&["completion"]),
        )
        .await
        .expect("reconfigured");

    assert_eq!(repeated, RegistrationOutcome::Unchanged);
    assert_eq!(changed, RegistrationOutcome::Reconfigured);
    assert_eq!(connector.disconnects(), 1);
    assert_eq!(connector.connects(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mismatched_transport_is_rejected(harness: Harness) {
    let result = harness
        .orchestrator
        .register_provider(
            id("alpha"),
            TransportKind::Subprocess,
            ConnectionConfig::message_rpc("alpha").expect("config"),
            capabilities(&["completion"]),
        )
        .await;

    assert!(matches!(result, Err(OrchestrationError::Domain(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completed_tasks_update_performance_history(harness: Harness) {
    harness.provider("alpha", &["completion"]).await;
    harness.provider("beta", &["completion", "planning"]).await;

    let result = harness.submit(task("completion")).await.expect("task completed");

    assert_eq!(result.produced_by, id("alpha"));
    assert!(!result.degraded);
    assert_eq!(result.resolution, "single_response");
    let alpha = harness.state("alpha");
    assert_eq!(alpha.performance().invocations(), 1);
    assert_eq!(alpha.performance().selections(), 1);
    assert_eq!(harness.state("beta").performance().invocations(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unavailable_providers_are_not_planned(harness: Harness) {
    harness.provider("beta", &["completion", "planning"]).await;
    harness.provider("gamma", &["planning"]).await;
    harness
        .orchestrator
        .monitor()
        .report_connection_failure(&id("gamma"), "socket closed")
        .await
        .expect("failure recorded");

    let planning = task("planning");
    let task_id = planning.id();
    let result = harness.submit(planning).await.expect("task completed");

    assert_eq!(result.produced_by, id("beta"));
    let plan = harness
        .orchestrator
        .routing_plan(task_id)
        .expect("plan recorded");
    assert!(plan.fallback_chain().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn uncovered_capabilities_have_no_capable_provider(harness: Harness) {
    harness.provider("alpha", &["completion"]).await;

    let scan = task("security-scan");
    let task_id = scan.id();
    let result = harness.submit(scan).await;

    assert!(matches!(
        result,
        Err(OrchestrationError::NoCapableProvider { task: failed, .. }) if failed == task_id
    ));
    let rationale = harness
        .orchestrator
        .explain_routing(task_id)
        .expect("plan recorded");
    assert!(rationale.contains("no routable provider"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[expect(clippy::float_arithmetic, reason = "approximate success rate comparison")]
async fn divergent_supporting_payloads_are_kept_as_alternatives(harness: Harness) {
    let alpha = harness.provider("alpha", &["analysis"]).await;
    let beta = harness.provider("beta", &["analysis"]).await;
    alpha.set_reply(json!("keep the parser"));
    beta.set_reply(json!("rewrite everything from scratch"));

    let result = harness.submit(task("analysis")).await.expect("task completed");

    assert_eq!(result.produced_by, id("alpha"));
    assert_eq!(result.payload, json!("keep the parser"));
    assert_eq!(result.resolution, "prefer_higher_ranked");
    let alternative = result.alternatives.first().expect("alternative attached");
    assert_eq!(alternative.provider, id("beta"));
    assert_eq!(alternative.payload, json!("rewrite everything from scratch"));
    for name in ["alpha", "beta"] {
        let performance = harness.state(name).performance().clone();
        assert_eq!(performance.invocations(), 1, "{name} invocations");
        assert!((performance.success_rate() - 1.0).abs() < f64::EPSILON);
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn matching_supporting_payloads_corroborate(harness: Harness) {
    harness.provider("alpha", &["analysis"]).await;
    let beta = harness.provider("beta", &["analysis"]).await;
    beta.set_reply(json!({"provider": "alpha"}));

    let result = harness.submit(task("analysis")).await.expect("task completed");

    assert_eq!(result.resolution, "consensus");
    assert_eq!(result.corroborated_by, vec![id("beta")]);
    assert!(!result.has_alternatives());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn successful_supporting_provider_covers_a_failed_primary(harness: Harness) {
    let alpha = harness.provider("alpha", &["analysis"]).await;
    harness.provider("beta", &["analysis"]).await;
    alpha.set_failure(ConnectorError::Provider("model crashed".to_owned()));

    let result = harness.submit(task("analysis")).await.expect("task completed");

    assert_eq!(result.produced_by, id("beta"));
    assert_eq!(result.attempts.len(), 2);
    assert_eq!(harness.state("alpha").performance().successes(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unsupported_operations_advance_the_fallback_chain_without_retry(harness: Harness) {
    let alpha = harness.provider("alpha", &["completion"]).await;
    harness.provider("beta", &["completion"]).await;
    alpha.set_failure(ConnectorError::UnsupportedOperation("no completions".to_owned()));

    let result = harness.submit(task("completion")).await.expect("task completed");

    assert_eq!(result.produced_by, id("beta"));
    assert_eq!(alpha.invocations(), 1);
    let first = result.attempts.first().expect("first attempt");
    assert_eq!(first.error, Some(ResponseErrorKind::UnsupportedOperation));
    assert_eq!(first.retries, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn retryable_failures_are_retried_once(harness: Harness) {
    let alpha = harness.provider("alpha", &["completion"]).await;
    alpha.queue(Err(ConnectorError::RateLimited("slow down".to_owned())));

    let result = harness.submit(task("completion")).await.expect("task completed");

    assert_eq!(result.produced_by, id("alpha"));
    assert_eq!(alpha.invocations(), 2);
    assert_eq!(result.attempts.first().map(|attempt| attempt.retries), Some(1));
    assert_eq!(harness.state("alpha").performance().invocations(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn exhausted_plans_report_every_failure(harness: Harness) {
    let alpha = harness.provider("alpha", &["completion"]).await;
    let beta = harness.provider("beta", &["completion"]).await;
    alpha.set_failure(ConnectorError::Provider("alpha broke".to_owned()));
    beta.set_failure(ConnectorError::InvalidResponse("beta garbled".to_owned()));

    let result = harness.submit(task("completion")).await;

    match result {
        Err(OrchestrationError::AllProvidersFailed { failures, .. }) => {
            let providers: Vec<&str> = failures
                .iter()
                .map(|failure| failure.provider.as_str())
                .collect();
            assert_eq!(providers, ["alpha", "beta"]);
        }
        other => panic!("expected all providers to fail, got {other:?}"),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unavailable_capability_class_triggers_a_fresh_plan(harness: Harness) {
    let alpha = harness.provider("alpha", &["completion"]).await;
    harness.provider("beta", &["completion"]).await;
    alpha.set_failure(ConnectorError::CapabilityUnavailable("completions offline".to_owned()));

    let completion = task("completion");
    let task_id = completion.id();
    let result = harness.submit(completion).await.expect("task completed");

    assert_eq!(result.produced_by, id("beta"));
    let plan = harness
        .orchestrator
        .routing_plan(task_id)
        .expect("plan recorded");
    assert_eq!(plan.primary(), Some(&id("beta")));
    assert!(plan.rank_of(&id("alpha")).is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn hard_connection_errors_mark_the_provider_unavailable(harness: Harness) {
    let alpha = harness.provider("alpha", &["completion"]).await;
    harness.provider("beta", &["completion"]).await;
    alpha.set_failure(ConnectorError::ConnectionRefused("port closed".to_owned()));

    let result = harness.submit(task("completion")).await.expect("task completed");

    assert_eq!(result.produced_by, id("beta"));
    assert_eq!(harness.state("alpha").health_state(), HealthState::Unavailable);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stalled_connects_fail_at_the_task_deadline(harness: Harness) {
    let alpha = harness.factory.scripted(&id("alpha"));
    alpha.stall_connections(true);
    harness
        .registry
        .register(descriptor("alpha"), Utc::now())
        .expect("registered");
    harness
        .registry
        .apply(
            &id("alpha"),
            ProviderUpdate::ProbedCapabilities {
                capabilities: capabilities(&["completion"]),
                at: Utc::now(),
            },
        )
        .expect("probed");
    harness
        .registry
        .apply(
            &id("alpha"),
            ProviderUpdate::HealthCheck {
                outcome: HealthCheckOutcome::Passed {
                    latency: Duration::from_millis(1),
                },
                policy: HealthPolicy::default(),
                at: Utc::now(),
            },
        )
        .expect("checked");

    let result = tokio::time::timeout(
        Duration::from_secs(2),
        harness.submit(task("completion").with_timeout(Duration::from_millis(200))),
    )
    .await
    .expect("submission finishes by its deadline");

    match result {
        Err(OrchestrationError::AllProvidersFailed { failures, .. }) => {
            let kinds: Vec<ResponseErrorKind> =
                failures.iter().map(|failure| failure.error.kind).collect();
            assert_eq!(kinds, [ResponseErrorKind::Timeout]);
        }
        other => panic!("expected a timed out attempt, got {other:?}"),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancellation_discards_in_flight_attempts(harness: Harness) {
    let alpha = harness.provider("alpha", &["completion"]).await;
    alpha.set_delay(Duration::from_secs(10));
    let token = CancellationToken::new();
    let cancellable = task("completion").with_cancellation(token.clone());

    let (result, ()) = tokio::join!(harness.submit(cancellable), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    assert!(matches!(result, Err(OrchestrationError::Cancelled(_))));
    let performance = harness.state("alpha").performance().clone();
    assert_eq!(performance.invocations(), 0);
    assert_eq!(performance.selections(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn overrides_shift_later_routing() {
    let harness = harness_with(SwitchyardConfig {
        routing: RoutingConfig {
            weights: ScoringWeights {
                performance: 0.0,
                ..ScoringWeights::default()
            },
            ..quick_config().routing
        },
        ..quick_config()
    });
    harness.provider("alpha", &["completion"]).await;
    harness.provider("beta", &["completion"]).await;
    let first = task("completion");
    let first_id = first.id();
    let routed = harness.submit(first).await.expect("task completed");
    assert_eq!(routed.produced_by, id("alpha"));

    harness
        .orchestrator
        .record_user_override(first_id, &id("beta"))
        .expect("override recorded");
    let rerouted = harness.submit(task("completion")).await.expect("task completed");

    assert_eq!(rerouted.produced_by, id("beta"));
    let preferences = harness.orchestrator.preferences().expect("preferences readable");
    assert!(preferences.weight(&Capability::completion(), &id("beta")) > 0.0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overrides_and_explanations_need_a_known_task(harness: Harness) {
    harness.provider("alpha", &["completion"]).await;
    let unknown = task("completion").id();

    assert!(matches!(
        harness.orchestrator.explain_routing(unknown),
        Err(OrchestrationError::UnknownTask(_))
    ));
    assert!(matches!(
        harness.orchestrator.record_user_override(unknown, &id("alpha")),
        Err(OrchestrationError::UnknownTask(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn time_sensitive_tasks_refresh_candidate_health() {
    let harness = harness_with(SwitchyardConfig {
        routing: RoutingConfig {
            time_sensitive_within_ms: 60_000,
            ..RoutingConfig::default()
        },
        ..quick_config()
    });
    let alpha = harness.provider("alpha", &["completion"]).await;
    let checks_before = alpha.health_checks();

    harness
        .submit(task("completion").with_timeout(Duration::from_secs(5)))
        .await
        .expect("task completed");

    assert_eq!(alpha.health_checks(), checks_before + 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deregistration_stops_monitoring_and_disconnects(harness: Harness) {
    let alpha = harness.provider("alpha", &["completion"]).await;

    let removed = harness
        .orchestrator
        .deregister_provider(&id("alpha"))
        .await
        .expect("deregistered");

    assert_eq!(removed.id(), &id("alpha"));
    assert_eq!(alpha.disconnects(), 1);
    assert!(!harness.orchestrator.monitor().is_watching(&id("alpha")));
    assert!(harness.orchestrator.list_providers().expect("listed").is_empty());
}

fn descriptor(name: &str) -> ProviderDescriptor {
    ProviderDescriptor::from_connection(
        id(name),
        ConnectionConfig::message_rpc(name).expect("config"),
        capabilities(&["completion"]),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn discovery_cycles_register_idempotently() {
    let registry = Arc::new(InMemoryProviderRegistry::new());
    let factory = Arc::new(InMemoryConnectorFactory::new());
    for name in ["alpha", "beta"] {
        factory.scripted(&id(name));
    }
    let source = Arc::new(StaticDiscoverySource::new(vec![
        descriptor("alpha"),
        descriptor("beta"),
    ]));
    let orchestrator = Orchestrator::new(
        Arc::clone(&registry),
        factory,
        Arc::new(DefaultClock),
        quick_config(),
    )
    .expect("valid config")
    .with_discovery(source);

    let first = orchestrator.run_discovery_cycle().await.expect("first cycle");
    let second = orchestrator.run_discovery_cycle().await.expect("second cycle");

    assert_eq!(first.created, 2);
    assert_eq!(second.unchanged, 2);
    assert_eq!(orchestrator.list_providers().expect("listed").len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn start_runs_discovery_until_shutdown() {
    let registry = Arc::new(InMemoryProviderRegistry::new());
    let factory = Arc::new(InMemoryConnectorFactory::new());
    factory.scripted(&id("alpha"));
    let orchestrator = Arc::new(
        Orchestrator::new(
            Arc::clone(&registry),
            factory,
            Arc::new(DefaultClock),
            quick_config(),
        )
        .expect("valid config")
        .with_discovery(Arc::new(StaticDiscoverySource::new(vec![descriptor("alpha")]))),
    );

    orchestrator.start().expect("started");
    let discovered = tokio::time::timeout(Duration::from_secs(5), async {
        while registry.get(&id("alpha")).ok().flatten().is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    orchestrator.shutdown().await.expect("stopped");

    assert!(discovered.is_ok());
    assert!(!orchestrator.monitor().is_watching(&id("alpha")));
}

#[test]
fn invalid_configuration_is_rejected_at_construction() {
    let result = Orchestrator::new(
        Arc::new(InMemoryProviderRegistry::new()),
        Arc::new(InMemoryConnectorFactory::new()),
        Arc::new(DefaultClock),
        SwitchyardConfig {
            health: HealthPolicy {
                check_interval_ms: 0,
                ..HealthPolicy::default()
            },
            ..SwitchyardConfig::default()
        },
    );

    assert!(matches!(
        result,
        Err(ConfigError::OutOfRange { field: "health", .. })
    ));
}
