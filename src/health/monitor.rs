//! Health monitor service.

use crate::connector::ports::Connector;
use crate::connector::services::ConnectorPool;
use crate::probe::{CapabilityProbe, ProbeReport};
use crate::provider::domain::{
    CapabilitySet, HealthCheckOutcome, HealthPolicy, HealthState, HealthTransition, Provider,
    ProviderId, ProviderUpdate,
};
use crate::provider::ports::{ProviderRegistry, ProviderRegistryError};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors raised by the health monitor.
#[derive(Debug, Clone, Error)]
pub enum HealthMonitorError {
    /// Registry access failed or the provider is unknown.
    #[error(transparent)]
    Registry(#[from] ProviderRegistryError),

    /// The loop table lock was poisoned.
    #[error("health monitor state unavailable: {0}")]
    State(String),
}

/// Result type for health monitor operations.
pub type HealthMonitorResult<T> = Result<T, HealthMonitorError>;

const MIN_PERIOD: Duration = Duration::from_millis(1);

struct WatchHandles {
    checks: JoinHandle<()>,
    reprobes: JoinHandle<()>,
}

/// Runs health checks and re-probes for registered providers.
pub struct HealthMonitor<R, C>
where
    R: ProviderRegistry + 'static,
    C: Clock + Send + Sync + 'static,
{
    registry: Arc<R>,
    pool: ConnectorPool,
    probe: CapabilityProbe<R, C>,
    clock: Arc<C>,
    policy: HealthPolicy,
    watches: Mutex<HashMap<ProviderId, WatchHandles>>,
    stopping: CancellationToken,
}

impl<R, C> HealthMonitor<R, C>
where
    R: ProviderRegistry + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a monitor with no watched providers.
    #[must_use]
    pub fn new(
        registry: Arc<R>,
        pool: ConnectorPool,
        probe: CapabilityProbe<R, C>,
        clock: Arc<C>,
        policy: HealthPolicy,
    ) -> Self {
        Self {
            registry,
            pool,
            probe,
            clock,
            policy,
            watches: Mutex::new(HashMap::new()),
            stopping: CancellationToken::new(),
        }
    }

    /// Returns the thresholds checks are evaluated against.
    #[must_use]
    pub const fn policy(&self) -> &HealthPolicy {
        &self.policy
    }

    fn lock_watches(
        &self,
    ) -> HealthMonitorResult<MutexGuard<'_, HashMap<ProviderId, WatchHandles>>> {
        self.watches
            .lock()
            .map_err(|err| HealthMonitorError::State(err.to_string()))
    }

    fn provider(&self, id: &ProviderId) -> HealthMonitorResult<Provider> {
        self.registry
            .get(id)?
            .ok_or_else(|| ProviderRegistryError::NotFound(id.clone()).into())
    }

    /// Runs one bounded health check now and records its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`HealthMonitorError::Registry`] when the provider is unknown
    /// or the outcome cannot be recorded.
    pub async fn check_now(&self, id: &ProviderId) -> HealthMonitorResult<Option<HealthTransition>> {
        let provider = self.provider(id)?;
        let started = Instant::now();
        let deadline = started + self.policy.check_timeout();
        let outcome = match self.pool.get_or_create_before(&provider, deadline).await {
            Ok(connector) => self.run_check(connector.as_ref(), started, deadline).await,
            Err(err) => HealthCheckOutcome::Failed {
                reason: err.to_string(),
            },
        };
        debug!(provider = %id, ?outcome, "health check finished");
        let transition = self.registry.apply(
            id,
            ProviderUpdate::HealthCheck {
                outcome,
                policy: self.policy,
                at: self.clock.utc(),
            },
        )?;
        if let Some(change) = transition {
            self.on_transition(id, change).await?;
        }
        Ok(transition)
    }

    async fn run_check(
        &self,
        connector: &dyn Connector,
        started: Instant,
        deadline: Instant,
    ) -> HealthCheckOutcome {
        match tokio::time::timeout_at(deadline, connector.health()).await {
            Ok(true) => HealthCheckOutcome::Passed {
                latency: started.elapsed(),
            },
            Ok(false) => HealthCheckOutcome::Failed {
                reason: "provider reported unhealthy".to_owned(),
            },
            Err(_) => HealthCheckOutcome::Failed {
                reason: format!(
                    "health check exceeded {}ms",
                    self.policy.check_timeout().as_millis()
                ),
            },
        }
    }

    /// Records a hard connection error seen outside the periodic checks.
    ///
    /// The provider's connector is dropped so the next use reconnects.
    ///
    /// # Errors
    ///
    /// Returns [`HealthMonitorError::Registry`] when the provider is unknown.
    pub async fn report_connection_failure(
        &self,
        id: &ProviderId,
        reason: &str,
    ) -> HealthMonitorResult<Option<HealthTransition>> {
        let transition = self.registry.apply(
            id,
            ProviderUpdate::ConnectionLost {
                reason: reason.to_owned(),
                at: self.clock.utc(),
            },
        )?;
        self.pool.remove(id).await;
        if let Some(change) = transition {
            self.on_transition(id, change).await?;
        }
        Ok(transition)
    }

    async fn on_transition(
        &self,
        id: &ProviderId,
        transition: HealthTransition,
    ) -> HealthMonitorResult<()> {
        info!(
            provider = %id,
            from = %transition.from,
            to = %transition.to,
            "provider health changed"
        );
        if transition.is_recovery() {
            self.probe_now(id).await?;
        }
        Ok(())
    }

    /// Probes `id` now. A provider that cannot be connected within the
    /// latency budget gets an empty capability set.
    ///
    /// # Errors
    ///
    /// Returns [`HealthMonitorError::Registry`] when the provider is unknown.
    pub async fn probe_now(&self, id: &ProviderId) -> HealthMonitorResult<Option<ProbeReport>> {
        let provider = self.provider(id)?;
        let deadline = Instant::now() + self.probe.config().latency_budget();
        match self.pool.get_or_create_before(&provider, deadline).await {
            Ok(connector) => Ok(Some(self.probe.probe(&provider, connector.as_ref()).await?)),
            Err(err) => {
                warn!(provider = %id, error = %err, "cannot connect for probing");
                self.registry.apply(
                    id,
                    ProviderUpdate::ProbedCapabilities {
                        capabilities: CapabilitySet::new(),
                        at: self.clock.utc(),
                    },
                )?;
                Ok(None)
            }
        }
    }

    /// Removes the provider when it has been unreachable past the removal
    /// grace period. Returns whether it was removed.
    ///
    /// # Errors
    ///
    /// Returns [`HealthMonitorError::Registry`] when registry access fails.
    pub async fn remove_if_expired(&self, id: &ProviderId) -> HealthMonitorResult<bool> {
        let provider = self.provider(id)?;
        if !provider.health().is_removable(&self.policy, self.clock.utc()) {
            return Ok(false);
        }
        self.registry.deregister(id)?;
        self.pool.remove(id).await;
        self.unwatch(id)?;
        info!(
            provider = %id,
            state = %provider.health_state(),
            "removed provider after sustained unreachability"
        );
        Ok(true)
    }

    /// Starts the check and re-probe loops for `id`. Watching an already
    /// watched provider is a no-op.
    ///
    /// The first periodic check runs one interval from now.
    ///
    /// # Errors
    ///
    /// Returns [`HealthMonitorError::State`] when the loop table is
    /// unavailable.
    pub fn watch(self: &Arc<Self>, id: &ProviderId) -> HealthMonitorResult<()> {
        let mut watches = self.lock_watches()?;
        if watches.contains_key(id) || self.stopping.is_cancelled() {
            return Ok(());
        }
        let checks = tokio::spawn(Arc::clone(self).check_loop(id.clone()));
        let reprobes = tokio::spawn(Arc::clone(self).reprobe_loop(id.clone()));
        watches.insert(id.clone(), WatchHandles { checks, reprobes });
        debug!(provider = %id, "health watch started");
        Ok(())
    }

    /// Stops the loops for `id`.
    ///
    /// A check loop calling this through [`Self::remove_if_expired`] reaches
    /// no further await point and ends normally.
    ///
    /// # Errors
    ///
    /// Returns [`HealthMonitorError::State`] when the loop table is
    /// unavailable.
    pub fn unwatch(&self, id: &ProviderId) -> HealthMonitorResult<()> {
        if let Some(handles) = self.lock_watches()?.remove(id) {
            handles.checks.abort();
            handles.reprobes.abort();
            debug!(provider = %id, "health watch stopped");
        }
        Ok(())
    }

    /// Returns whether `id` has running loops.
    #[must_use]
    pub fn is_watching(&self, id: &ProviderId) -> bool {
        self.lock_watches()
            .is_ok_and(|watches| watches.contains_key(id))
    }

    /// Stops every loop and waits for them to finish.
    ///
    /// # Errors
    ///
    /// Returns [`HealthMonitorError::State`] when the loop table is
    /// unavailable.
    pub async fn shutdown(&self) -> HealthMonitorResult<()> {
        self.stopping.cancel();
        let handles: Vec<WatchHandles> = self
            .lock_watches()?
            .drain()
            .map(|(_, handles)| handles)
            .collect();
        for WatchHandles { checks, reprobes } in handles {
            checks.abort();
            reprobes.abort();
            for handle in [checks, reprobes] {
                if let Err(err) = handle.await
                    && !err.is_cancelled()
                {
                    warn!(error = %err, "health loop ended abnormally");
                }
            }
        }
        Ok(())
    }

    async fn check_loop(self: Arc<Self>, id: ProviderId) {
        let period = self.policy.check_interval().max(MIN_PERIOD);
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = self.stopping.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if let Err(err) = self.check_now(&id).await {
                if is_gone(&err) {
                    break;
                }
                warn!(provider = %id, error = %err, "health check could not be recorded");
                continue;
            }
            match self.remove_if_expired(&id).await {
                Ok(true) => break,
                Ok(false) => {}
                Err(err) if is_gone(&err) => break,
                Err(err) => warn!(provider = %id, error = %err, "removal check failed"),
            }
        }
        debug!(provider = %id, "health check loop finished");
    }

    async fn reprobe_loop(self: Arc<Self>, id: ProviderId) {
        let period = self.policy.probe_interval().max(MIN_PERIOD);
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = self.stopping.cancelled() => break,
                _ = ticker.tick() => {}
            }
            match self.provider(&id) {
                Ok(provider) if provider.health_state() == HealthState::Unavailable => continue,
                Ok(_) => {}
                Err(err) if is_gone(&err) => break,
                Err(err) => {
                    warn!(provider = %id, error = %err, "re-probe skipped");
                    continue;
                }
            }
            match self.probe_now(&id).await {
                Ok(_) => {}
                Err(err) if is_gone(&err) => break,
                Err(err) => warn!(provider = %id, error = %err, "re-probe failed"),
            }
        }
    }
}

const fn is_gone(err: &HealthMonitorError) -> bool {
    matches!(
        err,
        HealthMonitorError::Registry(ProviderRegistryError::NotFound(_))
    )
}

impl<R, C> std::fmt::Debug for HealthMonitor<R, C>
where
    R: ProviderRegistry + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HealthMonitor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
