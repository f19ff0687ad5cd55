//! The orchestrator: the single entry point host surfaces talk to.

use super::{OrchestrationError, OrchestrationResult, PlanLog};
use crate::config::{ConfigResult, SwitchyardConfig};
use crate::connector::ports::{Connector, ConnectorFactory};
use crate::connector::services::ConnectorPool;
use crate::health::HealthMonitor;
use crate::orchestration::domain::{
    AttemptFailure, AttemptSummary, ConflictSet, IntegratedResult, PreferHigherRanked,
    RankedResponse, RequireConfirmation, ResolutionStrategy, StrategyKind,
};
use crate::orchestration::ports::DiscoverySource;
use crate::probe::CapabilityProbe;
use crate::provider::domain::{
    CapabilitySet, ConnectionConfig, Provider, ProviderDescriptor, ProviderFilter, ProviderId,
    ProviderUpdate, TransportKind,
};
use crate::provider::ports::{ProviderRegistry, ProviderRegistryError, RegistrationOutcome};
use crate::routing::{FailureDisposition, PreferenceTable, RoutingPlan, TaskRouter};
use crate::work::domain::{ResponseErrorKind, Task, TaskId, ToolResponse, WorkspaceSnapshot};
use futures::StreamExt;
use futures::future::join_all;
use futures::stream::FuturesUnordered;
use mockable::Clock;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What one discovery cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Providers registered for the first time.
    pub created: usize,
    /// Known providers whose configuration changed.
    pub reconfigured: usize,
    /// Providers re-discovered with identical registration data.
    pub unchanged: usize,
    /// Descriptors that could not be registered.
    pub rejected: usize,
}

/// The final try of one provider.
struct Attempt {
    rank: usize,
    response: ToolResponse,
    retries: u32,
}

/// Everything attempted so far for one task, across re-routes.
#[derive(Default)]
struct Execution {
    summaries: Vec<AttemptSummary>,
    failures: Vec<AttemptFailure>,
    attempted: BTreeSet<ProviderId>,
}

impl Execution {
    fn absorb(&mut self, attempt: &Attempt) {
        let response = &attempt.response;
        self.summaries
            .push(AttemptSummary::from_response(response, attempt.retries));
        self.attempted.insert(response.provider().clone());
        if let Some(error) = response.error() {
            self.failures.push(AttemptFailure {
                provider: response.provider().clone(),
                error: error.clone(),
            });
        }
    }
}

enum PlanOutcome {
    Succeeded(Vec<Attempt>),
    Reroute,
    Exhausted,
}

/// Coordinates registration, routing, execution and result integration.
///
/// The registry is the only shared mutable state. Routing reads one snapshot
/// per plan; health updates come from the [`HealthMonitor`] and invocation
/// outcomes are written back by this service before `submit_task` returns.
pub struct Orchestrator<R, C>
where
    R: ProviderRegistry + 'static,
    C: Clock + Send + Sync + 'static,
{
    registry: Arc<R>,
    clock: Arc<C>,
    pool: ConnectorPool,
    monitor: Arc<HealthMonitor<R, C>>,
    router: TaskRouter,
    preferences: RwLock<PreferenceTable>,
    plans: PlanLog,
    strategy: Arc<dyn ResolutionStrategy>,
    discovery: Option<Arc<dyn DiscoverySource>>,
    config: SwitchyardConfig,
    discovery_loop: Mutex<Option<JoinHandle<()>>>,
    stopping: CancellationToken,
}

impl<R, C> Orchestrator<R, C>
where
    R: ProviderRegistry + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates an orchestrator over `registry`, building connectors with
    /// `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::config::ConfigError::OutOfRange`] when `config`
    /// fails validation.
    pub fn new(
        registry: Arc<R>,
        factory: Arc<dyn ConnectorFactory>,
        clock: Arc<C>,
        config: SwitchyardConfig,
    ) -> ConfigResult<Self> {
        config.validate()?;
        let pool = ConnectorPool::new(factory);
        let probe = CapabilityProbe::new(Arc::clone(&registry), Arc::clone(&clock), config.probe);
        let monitor = Arc::new(HealthMonitor::new(
            Arc::clone(&registry),
            pool.clone(),
            probe,
            Arc::clone(&clock),
            config.health,
        ));
        let strategy: Arc<dyn ResolutionStrategy> = match config.conflict.strategy {
            StrategyKind::PreferHigherRanked => Arc::new(PreferHigherRanked),
            StrategyKind::RequireConfirmation => Arc::new(RequireConfirmation {
                threshold: config.conflict.confirmation_threshold,
            }),
        };
        Ok(Self {
            registry,
            clock,
            pool,
            monitor,
            router: TaskRouter::new(config.routing.clone()),
            preferences: RwLock::new(PreferenceTable::new(config.preferences)),
            plans: PlanLog::new(config.plan_log_capacity),
            strategy,
            discovery: None,
            config,
            discovery_loop: Mutex::new(None),
            stopping: CancellationToken::new(),
        })
    }

    /// Replaces the conflict resolution strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn ResolutionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the source polled by discovery cycles.
    #[must_use]
    pub fn with_discovery(mut self, source: Arc<dyn DiscoverySource>) -> Self {
        self.discovery = Some(source);
        self
    }

    /// Seeds the preference table.
    #[must_use]
    pub fn with_preferences(mut self, preferences: PreferenceTable) -> Self {
        self.preferences = RwLock::new(preferences);
        self
    }

    /// Returns the configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SwitchyardConfig {
        &self.config
    }

    /// Returns the health monitor driving this orchestrator's providers.
    #[must_use]
    pub const fn monitor(&self) -> &Arc<HealthMonitor<R, C>> {
        &self.monitor
    }

    /// Returns a copy of the current preference table.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::State`] when the table lock is poisoned.
    pub fn preferences(&self) -> OrchestrationResult<PreferenceTable> {
        self.preferences
            .read()
            .map(|table| table.clone())
            .map_err(|err| OrchestrationError::State(err.to_string()))
    }

    /// Registers a provider, then probes it, checks it and starts its health
    /// loops.
    ///
    /// Repeating an identical registration is a no-op. Re-registering with a
    /// different configuration replaces the connector and re-probes.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Domain`] when `transport_kind` does not
    /// match `connection`, and registry or monitor errors otherwise.
    pub async fn register_provider(
        &self,
        id: ProviderId,
        transport_kind: TransportKind,
        connection: ConnectionConfig,
        declared: CapabilitySet,
    ) -> OrchestrationResult<RegistrationOutcome> {
        let descriptor = ProviderDescriptor::new(id, transport_kind, connection, declared)?;
        self.register_descriptor(descriptor).await
    }

    /// Registers an already validated descriptor.
    ///
    /// # Errors
    ///
    /// Returns registry or monitor errors.
    pub async fn register_descriptor(
        &self,
        descriptor: ProviderDescriptor,
    ) -> OrchestrationResult<RegistrationOutcome> {
        let id = descriptor.id().clone();
        let outcome = self.registry.register(descriptor, self.clock.utc())?;
        match outcome {
            RegistrationOutcome::Unchanged => {
                debug!(provider = %id, "registration unchanged");
                return Ok(outcome);
            }
            RegistrationOutcome::Reconfigured => {
                self.pool.remove(&id).await;
                info!(provider = %id, "provider reconfigured");
            }
            RegistrationOutcome::Created => info!(provider = %id, "provider registered"),
        }
        self.monitor.probe_now(&id).await?;
        self.monitor.check_now(&id).await?;
        self.monitor.watch(&id)?;
        Ok(outcome)
    }

    /// Removes a provider, stopping its health loops and disconnecting it.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Registry`] when the provider is unknown.
    pub async fn deregister_provider(&self, id: &ProviderId) -> OrchestrationResult<Provider> {
        let removed = self.registry.deregister(id)?;
        self.monitor.unwatch(id)?;
        self.pool.remove(id).await;
        info!(provider = %id, "provider deregistered");
        Ok(removed)
    }

    /// Returns every registered provider in identifier order.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Registry`] when the registry is
    /// unreadable.
    pub fn list_providers(&self) -> OrchestrationResult<Vec<Provider>> {
        self.list_providers_matching(&ProviderFilter::any())
    }

    /// Returns the registered providers matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Registry`] when the registry is
    /// unreadable.
    pub fn list_providers_matching(
        &self,
        filter: &ProviderFilter,
    ) -> OrchestrationResult<Vec<Provider>> {
        Ok(self.registry.list(filter)?)
    }

    /// Returns the latest routing plan recorded for `task`.
    #[must_use]
    pub fn routing_plan(&self, task: TaskId) -> Option<RoutingPlan> {
        self.plans.latest(task)
    }

    /// Explains why the latest plan for `task` chose its providers.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::UnknownTask`] when no plan is recorded.
    pub fn explain_routing(&self, task: TaskId) -> OrchestrationResult<String> {
        self.plans
            .latest(task)
            .map(|plan| plan.rationale().to_owned())
            .ok_or(OrchestrationError::UnknownTask(task))
    }

    /// Records that the user preferred `chosen` for `task`, raising its
    /// preference for the task's type and lowering the other planned
    /// providers slightly.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::UnknownTask`] without a recorded plan,
    /// and [`OrchestrationError::Registry`] when `chosen` is not registered.
    pub fn record_user_override(
        &self,
        task: TaskId,
        chosen: &ProviderId,
    ) -> OrchestrationResult<()> {
        let plan = self
            .plans
            .latest(task)
            .ok_or(OrchestrationError::UnknownTask(task))?;
        if self.registry.get(chosen)?.is_none() {
            return Err(ProviderRegistryError::NotFound(chosen.clone()).into());
        }
        self.preferences
            .write()
            .map_err(|err| OrchestrationError::State(err.to_string()))?
            .record_override(plan.task_type(), chosen, plan.participants());
        info!(
            task = %task,
            provider = %chosen,
            task_type = %plan.task_type(),
            "recorded user override"
        );
        Ok(())
    }

    /// Routes and executes `task`, returning the integrated result.
    ///
    /// Retries, fallbacks and re-routes are exhausted before a failure is
    /// surfaced. Every completed attempt is recorded in its provider's
    /// performance history; attempts still in flight when the task is
    /// cancelled are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::NoCapableProvider`] when nothing can
    /// serve the task, [`OrchestrationError::AllProvidersFailed`] when every
    /// attempt failed, and [`OrchestrationError::Cancelled`] when the caller
    /// cancelled the task.
    pub async fn submit_task(
        &self,
        task: Task,
        workspace: WorkspaceSnapshot,
    ) -> OrchestrationResult<IntegratedResult> {
        debug!(task = %task.id(), task_type = %task.task_type(), "task submitted");
        if task.is_cancelled() {
            return Err(OrchestrationError::Cancelled(task.id()));
        }
        self.refresh_time_sensitive(&task).await?;
        if task.is_cancelled() {
            return Err(OrchestrationError::Cancelled(task.id()));
        }

        let mut run = Execution::default();
        let mut plan = self.plan(&task, &run.attempted)?;
        let mut reroutes = 0;
        loop {
            if plan.primary().is_none() {
                return Err(unroutable(&task, run));
            }
            let may_reroute = reroutes < self.router.config().max_reroutes;
            match self
                .execute(&task, &workspace, &plan, &mut run, may_reroute)
                .await?
            {
                PlanOutcome::Succeeded(successes) => {
                    return self.integrate(&task, &plan, successes, run);
                }
                PlanOutcome::Exhausted => {
                    return Err(OrchestrationError::AllProvidersFailed {
                        task: task.id(),
                        failures: run.failures,
                    });
                }
                PlanOutcome::Reroute => {
                    reroutes += 1;
                    info!(
                        task = %task.id(),
                        reroute = reroutes,
                        excluded = run.attempted.len(),
                        "capability class unavailable; re-routing"
                    );
                    plan = self.plan(&task, &run.attempted)?;
                }
            }
        }
    }

    /// Runs on-demand checks for every candidate of a task close to its
    /// deadline, so routing sees fresh health.
    async fn refresh_time_sensitive(&self, task: &Task) -> OrchestrationResult<()> {
        if task.remaining() >= self.router.config().time_sensitive_within() {
            return Ok(());
        }
        let candidates: Vec<ProviderId> = self
            .registry
            .snapshot()?
            .iter()
            .filter(|provider| {
                provider
                    .probed_capabilities()
                    .covers(task.required_capabilities())
            })
            .map(|provider| provider.id().clone())
            .collect();
        debug!(
            task = %task.id(),
            candidates = candidates.len(),
            "checking candidates before time-sensitive routing"
        );
        let outcomes = join_all(candidates.iter().map(|id| self.monitor.check_now(id))).await;
        for (id, outcome) in candidates.iter().zip(outcomes) {
            if let Err(err) = outcome {
                warn!(provider = %id, error = %err, "on-demand health check failed");
            }
        }
        Ok(())
    }

    fn plan(
        &self,
        task: &Task,
        excluded: &BTreeSet<ProviderId>,
    ) -> OrchestrationResult<RoutingPlan> {
        let snapshot = self.registry.snapshot()?;
        let plan = {
            let preferences = self
                .preferences
                .read()
                .map_err(|err| OrchestrationError::State(err.to_string()))?;
            self.router
                .route_excluding(task, &snapshot, &preferences, excluded)
        };
        self.plans.record(plan.clone());
        Ok(plan)
    }

    async fn execute(
        &self,
        task: &Task,
        workspace: &WorkspaceSnapshot,
        plan: &RoutingPlan,
        run: &mut Execution,
        may_reroute: bool,
    ) -> OrchestrationResult<PlanOutcome> {
        let wave: Vec<(usize, &ProviderId)> = plan
            .primary()
            .into_iter()
            .chain(plan.supporting())
            .enumerate()
            .map(|(index, id)| (plan.rank_of(id).unwrap_or(index), id))
            .collect();

        let mut successes = Vec::new();
        let mut reroute = false;
        for attempt in self.run_wave(task, workspace, &wave).await? {
            run.absorb(&attempt);
            let failed = attempt.response.error_kind();
            reroute |= failed.is_some_and(wants_reroute);
            if failed.is_none() {
                successes.push(attempt);
            }
        }
        if !successes.is_empty() {
            return Ok(PlanOutcome::Succeeded(successes));
        }
        if reroute && may_reroute {
            return Ok(PlanOutcome::Reroute);
        }

        for id in plan.fallback_chain() {
            if run.attempted.contains(id) {
                continue;
            }
            debug!(task = %task.id(), provider = %id, "advancing fallback chain");
            let rank = plan.rank_of(id).unwrap_or(usize::MAX);
            for attempt in self.run_wave(task, workspace, &[(rank, id)]).await? {
                run.absorb(&attempt);
                match attempt.response.error_kind() {
                    None => return Ok(PlanOutcome::Succeeded(vec![attempt])),
                    Some(kind) if may_reroute && wants_reroute(kind) => {
                        return Ok(PlanOutcome::Reroute);
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(PlanOutcome::Exhausted)
    }

    /// Attempts every provider of `wave` concurrently, returning the attempts
    /// in completion order. Cancellation drops whatever is still in flight.
    async fn run_wave(
        &self,
        task: &Task,
        workspace: &WorkspaceSnapshot,
        wave: &[(usize, &ProviderId)],
    ) -> OrchestrationResult<Vec<Attempt>> {
        let mut pending: FuturesUnordered<_> = wave
            .iter()
            .map(|(rank, id)| self.attempt(task, workspace, id, *rank))
            .collect();
        let mut completed = Vec::with_capacity(wave.len());
        loop {
            tokio::select! {
                biased;
                () = task.cancellation().cancelled() => {
                    debug!(task = %task.id(), "task cancelled; discarding in-flight attempts");
                    return Err(OrchestrationError::Cancelled(task.id()));
                }
                next = pending.next() => match next {
                    Some(attempt) => completed.push(attempt),
                    None => return Ok(completed),
                },
            }
        }
    }

    /// Invokes one provider, retrying retryable failures within the task
    /// deadline. Every try is recorded as it completes.
    async fn attempt(
        &self,
        task: &Task,
        workspace: &WorkspaceSnapshot,
        id: &ProviderId,
        rank: usize,
    ) -> Attempt {
        let connector = match self.connector(task, id).await {
            Ok(connector) => connector,
            Err(response) => {
                self.record(&response).await;
                return Attempt {
                    rank,
                    response,
                    retries: 0,
                };
            }
        };

        let retry = self.config.retry;
        let mut retries = 0;
        loop {
            let response = connector.invoke(task, workspace).await;
            self.record(&response).await;
            let retryable = response
                .error_kind()
                .is_some_and(ResponseErrorKind::is_retryable);
            if !retryable || retries >= retry.max_retries || task.remaining() <= retry.backoff() {
                return Attempt {
                    rank,
                    response,
                    retries,
                };
            }
            retries += 1;
            warn!(
                task = %task.id(),
                provider = %id,
                error = ?response.error_kind(),
                retry = retries,
                "retrying provider after backoff"
            );
            tokio::time::sleep(retry.backoff()).await;
        }
    }

    async fn connector(
        &self,
        task: &Task,
        id: &ProviderId,
    ) -> Result<Arc<dyn Connector>, ToolResponse> {
        let started_at = self.clock.utc();
        let failure = |kind: ResponseErrorKind, message: String| {
            ToolResponse::failure(id.clone(), task.id(), kind, message, started_at, Duration::ZERO)
        };
        let provider = match self.registry.get(id) {
            Ok(Some(provider)) => provider,
            Ok(None) => {
                return Err(failure(
                    ResponseErrorKind::Provider,
                    format!("provider {id} is no longer registered"),
                ));
            }
            Err(err) => return Err(failure(ResponseErrorKind::Provider, err.to_string())),
        };
        self.pool
            .get_or_create_before(&provider, task.deadline())
            .await
            .map_err(|err| failure(err.kind(), err.to_string()))
    }

    /// Writes one completed try back to the registry.
    async fn record(&self, response: &ToolResponse) {
        let id = response.provider();
        let update = ProviderUpdate::Invocation {
            success: response.is_success(),
            latency: response.latency(),
            smoothing: self.config.performance_smoothing,
            at: self.clock.utc(),
        };
        if let Err(err) = self.registry.apply(id, update) {
            warn!(provider = %id, error = %err, "invocation outcome not recorded");
        }
        if let Some(error) = response.error()
            && error.kind.is_hard_connection_error()
            && let Err(err) = self
                .monitor
                .report_connection_failure(id, &error.message)
                .await
        {
            warn!(provider = %id, error = %err, "connection failure not recorded");
        }
    }

    fn integrate(
        &self,
        task: &Task,
        plan: &RoutingPlan,
        successes: Vec<Attempt>,
        run: Execution,
    ) -> OrchestrationResult<IntegratedResult> {
        let members = successes
            .into_iter()
            .map(|attempt| RankedResponse {
                rank: attempt.rank,
                response: attempt.response,
            })
            .collect();
        let conflict = ConflictSet::new(task.id(), members);
        let result = IntegratedResult::resolve(
            &conflict,
            self.strategy.as_ref(),
            self.config.conflict.equivalence_threshold,
            plan.is_degraded(),
            run.summaries,
        )
        .ok_or_else(|| {
            OrchestrationError::State(format!(
                "resolution strategy {} chose no response for task {}",
                self.strategy.name(),
                task.id()
            ))
        })?;

        if let Err(err) = self.registry.apply(
            &result.produced_by,
            ProviderUpdate::Selected {
                at: self.clock.utc(),
            },
        ) {
            warn!(provider = %result.produced_by, error = %err, "selection not recorded");
        }
        info!(
            task = %task.id(),
            provider = %result.produced_by,
            resolution = %result.resolution,
            alternatives = result.alternatives.len(),
            degraded = result.degraded,
            "task completed"
        );
        Ok(result)
    }

    /// Pulls descriptors from the discovery source and registers each one.
    /// Without a source this does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Discovery`] when the source cannot be
    /// listed. Individual registration failures are counted as rejected.
    pub async fn run_discovery_cycle(&self) -> OrchestrationResult<DiscoveryReport> {
        let Some(source) = &self.discovery else {
            return Ok(DiscoveryReport::default());
        };
        let descriptors = source.discover().await?;
        let mut report = DiscoveryReport::default();
        for descriptor in descriptors {
            let id = descriptor.id().clone();
            match self.register_descriptor(descriptor).await {
                Ok(RegistrationOutcome::Created) => report.created += 1,
                Ok(RegistrationOutcome::Reconfigured) => report.reconfigured += 1,
                Ok(RegistrationOutcome::Unchanged) => report.unchanged += 1,
                Err(err) => {
                    report.rejected += 1;
                    warn!(provider = %id, error = %err, "discovered provider not registered");
                }
            }
        }
        debug!(?report, "discovery cycle finished");
        Ok(report)
    }

    /// Starts health loops for every registered provider and, with a
    /// discovery source, the periodic discovery loop. The first discovery
    /// cycle runs immediately. Starting twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns registry or monitor errors.
    pub fn start(self: &Arc<Self>) -> OrchestrationResult<()> {
        for provider in self.registry.list(&ProviderFilter::any())? {
            self.monitor.watch(provider.id())?;
        }
        if self.discovery.is_none() {
            return Ok(());
        }
        let mut slot = self
            .discovery_loop
            .lock()
            .map_err(|err| OrchestrationError::State(err.to_string()))?;
        if slot.is_none() && !self.stopping.is_cancelled() {
            *slot = Some(tokio::spawn(Arc::clone(self).discover_periodically()));
            info!(
                interval_ms = self.config.discovery_interval_ms,
                "discovery loop started"
            );
        }
        Ok(())
    }

    async fn discover_periodically(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.discovery_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = self.stopping.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if let Err(err) = self.run_discovery_cycle().await {
                warn!(error = %err, "discovery cycle failed");
            }
        }
        debug!("discovery loop finished");
    }

    /// Stops discovery and health loops and disconnects every connector.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::State`] or monitor errors when loop
    /// state is unavailable.
    pub async fn shutdown(&self) -> OrchestrationResult<()> {
        self.stopping.cancel();
        let discovery = self
            .discovery_loop
            .lock()
            .map_err(|err| OrchestrationError::State(err.to_string()))?
            .take();
        if let Some(handle) = discovery {
            handle.abort();
            if let Err(err) = handle.await
                && !err.is_cancelled()
            {
                warn!(error = %err, "discovery loop ended abnormally");
            }
        }
        self.monitor.shutdown().await?;
        self.pool.shutdown().await;
        info!("orchestrator stopped");
        Ok(())
    }
}

fn unroutable(task: &Task, run: Execution) -> OrchestrationError {
    if run.failures.is_empty() {
        OrchestrationError::NoCapableProvider {
            task: task.id(),
            task_type: task.task_type().clone(),
            required: task.required_capabilities().clone(),
        }
    } else {
        OrchestrationError::AllProvidersFailed {
            task: task.id(),
            failures: run.failures,
        }
    }
}

const fn wants_reroute(kind: ResponseErrorKind) -> bool {
    matches!(
        FailureDisposition::for_error(kind),
        FailureDisposition::Reroute
    )
}

impl<R, C> std::fmt::Debug for Orchestrator<R, C>
where
    R: ProviderRegistry + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Orchestrator")
            .field("strategy", &self.strategy.name())
            .field("router", &self.router)
            .field("plans", &self.plans.len())
            .finish_non_exhaustive()
    }
}
