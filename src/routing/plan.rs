//! Routing plan value type.

use super::RouteScore;
use crate::provider::domain::{Capability, ProviderId};
use crate::work::domain::TaskId;

/// The router's decision for one task.
///
/// Produced once per task and never mutated; a re-route produces a new plan.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingPlan {
    task: TaskId,
    task_type: Capability,
    primary: Option<ProviderId>,
    supporting: Vec<ProviderId>,
    fallback: Vec<ProviderId>,
    ranking: Vec<RouteScore>,
    rationale: String,
    degraded: bool,
    snapshot_version: u64,
}

impl RoutingPlan {
    pub(super) fn new(
        task: TaskId,
        task_type: Capability,
        ranking: Vec<RouteScore>,
        supporting_count: usize,
        degraded: bool,
        snapshot_version: u64,
    ) -> Self {
        let mut ordered = ranking.iter().map(|score| score.provider().clone());
        let primary = ordered.next();
        let supporting: Vec<ProviderId> = ordered.by_ref().take(supporting_count).collect();
        let fallback: Vec<ProviderId> = ordered.collect();
        let mut plan = Self {
            task,
            task_type,
            primary,
            supporting,
            fallback,
            ranking,
            rationale: String::new(),
            degraded,
            snapshot_version,
        };
        plan.rationale = plan.describe();
        plan
    }

    fn describe(&self) -> String {
        let Some(primary) = self.ranking.first() else {
            return format!(
                "{} task {}: no routable provider covers the required capabilities and none offers `{}` (snapshot v{})",
                self.task_type,
                self.task,
                Capability::generic(),
                self.snapshot_version
            );
        };
        let mut parts = vec![format!("{} task {}: primary {primary}", self.task_type, self.task)];
        if self.degraded {
            parts.push(format!(
                "degraded: no routable provider covers the required capabilities, relaxed to `{}`",
                Capability::generic()
            ));
        }
        if !self.supporting.is_empty() {
            parts.push(format!("supporting [{}]", join(&self.supporting)));
        }
        if !self.fallback.is_empty() {
            parts.push(format!("fallback [{}]", join(&self.fallback)));
        }
        let ranking: Vec<String> = self.ranking.iter().map(ToString::to_string).collect();
        parts.push(format!("ranking: {}", ranking.join(", ")));
        parts.push(format!("snapshot v{}", self.snapshot_version));
        parts.join("; ")
    }

    /// Returns the task this plan is for.
    #[must_use]
    pub const fn task(&self) -> TaskId {
        self.task
    }

    /// Returns the task type the plan was scored for.
    #[must_use]
    pub const fn task_type(&self) -> &Capability {
        &self.task_type
    }

    /// Returns the primary provider, absent when nothing can serve the task.
    #[must_use]
    pub const fn primary(&self) -> Option<&ProviderId> {
        self.primary.as_ref()
    }

    /// Returns providers invoked alongside the primary, best first.
    #[must_use]
    pub fn supporting(&self) -> &[ProviderId] {
        &self.supporting
    }

    /// Returns providers consulted in order if the primary fails.
    #[must_use]
    pub fn fallback_chain(&self) -> &[ProviderId] {
        &self.fallback
    }

    /// Returns every candidate's score, best first.
    #[must_use]
    pub fn ranking(&self) -> &[RouteScore] {
        &self.ranking
    }

    /// Returns the zero-based rank of `provider`, if it was a candidate.
    #[must_use]
    pub fn rank_of(&self, provider: &ProviderId) -> Option<usize> {
        self.ranking
            .iter()
            .position(|score| score.provider() == provider)
    }

    /// Returns the human-readable explanation.
    #[must_use]
    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    /// Returns whether the plan was made without full capability coverage.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Returns the registry snapshot version the plan observed.
    #[must_use]
    pub const fn snapshot_version(&self) -> u64 {
        self.snapshot_version
    }

    /// Returns every planned provider: primary, supporting, then fallback.
    pub fn participants(&self) -> impl Iterator<Item = &ProviderId> {
        self.primary
            .iter()
            .chain(self.supporting.iter())
            .chain(self.fallback.iter())
    }
}

fn join(ids: &[ProviderId]) -> String {
    ids.iter()
        .map(ProviderId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
