//! Integrated results returned to the host.

use super::{ConflictSet, ResolutionStrategy};
use crate::provider::domain::ProviderId;
use crate::work::domain::{ResponseError, ResponseErrorKind, TaskId, ToolResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// A divergent payload kept next to the integrated result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    /// Provider that produced the payload.
    pub provider: ProviderId,
    /// The payload.
    pub payload: Value,
    /// Similarity to the integrated payload in `[0, 1]`.
    pub similarity: f64,
}

/// One invocation attempt made while executing a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptSummary {
    /// Provider invoked.
    pub provider: ProviderId,
    /// Failure classification, `None` for a success.
    pub error: Option<ResponseErrorKind>,
    /// Latency of the final try.
    #[serde(with = "millis")]
    pub latency: Duration,
    /// Retries made against this provider before the final try.
    pub retries: u32,
}

impl AttemptSummary {
    /// Summarises the final response of an attempt.
    #[must_use]
    pub fn from_response(response: &ToolResponse, retries: u32) -> Self {
        Self {
            provider: response.provider().clone(),
            error: response.error_kind(),
            latency: response.latency(),
            retries,
        }
    }

    /// Returns whether the attempt succeeded.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// A provider failure reported when no provider could complete a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptFailure {
    /// Provider that failed.
    pub provider: ProviderId,
    /// Why it failed.
    pub error: ResponseError,
}

/// The value returned for a submitted task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedResult {
    /// Task answered.
    pub task: TaskId,
    /// The integrated payload.
    pub payload: Value,
    /// Provider whose payload became the result.
    pub produced_by: ProviderId,
    /// Providers whose payloads matched the result.
    pub corroborated_by: Vec<ProviderId>,
    /// Materially different payloads from other providers.
    pub alternatives: Vec<Alternative>,
    /// How the result was chosen: `single_response`, `consensus` or the
    /// resolution strategy's name.
    pub resolution: String,
    /// Whether the caller should confirm the result before using it.
    pub requires_confirmation: bool,
    /// Whether routing relaxed the capability match.
    pub degraded: bool,
    /// Every attempt made, in completion order.
    pub attempts: Vec<AttemptSummary>,
}

impl IntegratedResult {
    /// Integrates the successful responses of `conflict`.
    ///
    /// A single response is used as is. When every other payload is at least
    /// `equivalence_threshold` similar to the best-ranked one, the result is
    /// a consensus. Otherwise `strategy` picks the base and the divergent
    /// payloads become alternatives. Returns `None` for an empty set or a
    /// strategy choosing a missing member.
    #[must_use]
    pub fn resolve(
        conflict: &ConflictSet,
        strategy: &dyn ResolutionStrategy,
        equivalence_threshold: f64,
        degraded: bool,
        attempts: Vec<AttemptSummary>,
    ) -> Option<Self> {
        let members = conflict.members();
        let (base, resolution, requires_confirmation) = if members.len() < 2 {
            (0, "single_response", false)
        } else if conflict
            .min_similarity_to(0)
            .is_some_and(|similarity| similarity >= equivalence_threshold)
        {
            (0, "consensus", false)
        } else {
            let decision = strategy.resolve(conflict);
            (decision.base, strategy.name(), decision.requires_confirmation)
        };
        let chosen = members.get(base)?;

        let mut corroborated_by = Vec::new();
        let mut alternatives = Vec::new();
        for (index, member) in members.iter().enumerate() {
            if index == base {
                continue;
            }
            let provider = member.response.provider().clone();
            let similarity = conflict.similarity(base, index).unwrap_or(0.0);
            if similarity >= equivalence_threshold {
                corroborated_by.push(provider);
            } else {
                alternatives.push(Alternative {
                    provider,
                    payload: member.response.payload().cloned().unwrap_or(Value::Null),
                    similarity,
                });
            }
        }

        Some(Self {
            task: conflict.task(),
            payload: chosen.response.payload().cloned().unwrap_or(Value::Null),
            produced_by: chosen.response.provider().clone(),
            corroborated_by,
            alternatives,
            resolution: resolution.to_owned(),
            requires_confirmation,
            degraded,
            attempts,
        })
    }

    /// Returns whether other providers offered different payloads.
    #[must_use]
    pub const fn has_alternatives(&self) -> bool {
        !self.alternatives.is_empty()
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::domain::{PreferHigherRanked, RankedResponse, RequireConfirmation};
    use chrono::Utc;
    use serde_json::json;

    fn member(name: &str, rank: usize, payload: Value) -> RankedResponse {
        RankedResponse {
            rank,
            response: ToolResponse::success(
                ProviderId::new(name).expect("valid provider id"),
                TaskId::new(),
                payload,
                Utc::now(),
                Duration::from_millis(5),
            ),
        }
    }

    fn resolve(members: Vec<RankedResponse>, strategy: &dyn ResolutionStrategy) -> IntegratedResult {
        let conflict = ConflictSet::new(TaskId::new(), members);
        IntegratedResult::resolve(&conflict, strategy, 0.9, false, Vec::new())
            .expect("non-empty conflict set")
    }

    #[test]
    fn single_responses_are_used_directly() {
        let result = resolve(vec![member("a", 0, json!("only"))], &PreferHigherRanked);
        assert_eq!(result.resolution, "single_response");
        assert_eq!(result.payload, json!("only"));
        assert!(!result.has_alternatives());
    }

    #[test]
    fn matching_payloads_corroborate() {
        let result = resolve(
            vec![
                member("a", 0, json!({"answer": 42})),
                member("b", 1, json!({"answer": 42})),
            ],
            &PreferHigherRanked,
        );
        assert_eq!(result.resolution, "consensus");
        assert_eq!(result.corroborated_by.len(), 1);
        assert!(!result.has_alternatives());
    }

    #[test]
    fn divergent_payloads_become_alternatives() {
        let result = resolve(
            vec![
                member("b", 1, json!("rewrite the parser")),
                member("a", 0, json!("keep the parser")),
            ],
            &PreferHigherRanked,
        );
        assert_eq!(result.produced_by.as_str(), "a");
        assert_eq!(result.resolution, "prefer_higher_ranked");
        let alternative = result.alternatives.first().expect("one alternative");
        assert_eq!(alternative.provider.as_str(), "b");
        assert!(alternative.similarity < 0.9);
        assert!(!result.requires_confirmation);
    }

    #[test]
    fn strict_strategy_requests_confirmation() {
        let result = resolve(
            vec![member("a", 0, json!("alpha")), member("b", 1, json!("omega"))],
            &RequireConfirmation { threshold: 0.5 },
        );
        assert!(result.requires_confirmation);
        assert_eq!(result.resolution, "require_confirmation");
    }

    #[test]
    fn empty_sets_resolve_to_nothing() {
        let conflict = ConflictSet::new(TaskId::new(), Vec::new());
        assert!(
            IntegratedResult::resolve(&conflict, &PreferHigherRanked, 0.9, false, Vec::new())
                .is_none()
        );
    }
}
