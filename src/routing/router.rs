//! The task router.

use super::{CapabilityFit, PreferenceTable, RouteScore, RoutingConfig, RoutingPlan};
use crate::provider::domain::{Capability, Provider, ProviderId, RegistrySnapshot};
use crate::work::domain::Task;
use std::collections::BTreeSet;
use tracing::debug;

/// Computes routing plans from registry snapshots.
#[derive(Debug, Clone, Default)]
pub struct TaskRouter {
    config: RoutingConfig,
}

impl TaskRouter {
    /// Creates a router.
    #[must_use]
    pub const fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    /// Returns the routing configuration.
    #[must_use]
    pub const fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Plans `task` against one consistent snapshot.
    #[must_use]
    pub fn route(
        &self,
        task: &Task,
        snapshot: &RegistrySnapshot,
        preferences: &PreferenceTable,
    ) -> RoutingPlan {
        self.route_excluding(task, snapshot, preferences, &BTreeSet::new())
    }

    /// Plans `task` while ignoring the `excluded` providers, as needed when
    /// re-routing after attempted providers failed.
    #[must_use]
    pub fn route_excluding(
        &self,
        task: &Task,
        snapshot: &RegistrySnapshot,
        preferences: &PreferenceTable,
        excluded: &BTreeSet<ProviderId>,
    ) -> RoutingPlan {
        let routable: Vec<&Provider> = snapshot
            .iter()
            .filter(|provider| provider.health_state().is_routable())
            .filter(|provider| !excluded.contains(provider.id()))
            .collect();

        let (candidates, degraded) = select_candidates(task, &routable);
        let fastest = candidates
            .iter()
            .filter_map(|(provider, _)| provider.performance().latency_ms())
            .min_by(f64::total_cmp);

        let mut ranking: Vec<RouteScore> = candidates
            .iter()
            .map(|(provider, fit)| {
                RouteScore::compute(
                    provider,
                    task,
                    *fit,
                    preferences,
                    &self.config.weights,
                    fastest,
                )
            })
            .collect();
        ranking.sort_by(RouteScore::rank_cmp);

        let supporting = if self.config.is_parallel_worthy(task.task_type()) {
            self.config.max_supporting()
        } else {
            0
        };
        let plan = RoutingPlan::new(
            task.id(),
            task.task_type().clone(),
            ranking,
            supporting,
            degraded,
            snapshot.version(),
        );
        debug!(
            task = %task.id(),
            primary = ?plan.primary().map(ProviderId::as_str),
            degraded = plan.is_degraded(),
            snapshot = plan.snapshot_version(),
            "routing plan computed"
        );
        plan
    }
}

/// Filters routable providers to those covering the task's requirements,
/// relaxing to generic providers when none do.
fn select_candidates<'a>(
    task: &Task,
    routable: &[&'a Provider],
) -> (Vec<(&'a Provider, CapabilityFit)>, bool) {
    let required = task.required_capabilities();
    let qualified: Vec<(&Provider, CapabilityFit)> = routable
        .iter()
        .filter(|provider| provider.probed_capabilities().covers(required))
        .map(|provider| {
            let fit = if provider.probed_capabilities().contains(task.task_type()) {
                CapabilityFit::Exact
            } else {
                CapabilityFit::Partial
            };
            (*provider, fit)
        })
        .collect();
    if !qualified.is_empty() {
        return (qualified, false);
    }

    let generic = Capability::generic();
    let relaxed = routable
        .iter()
        .filter(|provider| provider.probed_capabilities().contains(&generic))
        .map(|provider| (*provider, CapabilityFit::Generic))
        .collect();
    (relaxed, true)
}
