//! Conflict detection and pluggable resolution strategies.
//!
//! Successful responses that disagree form a [`ConflictSet`]. A
//! [`ResolutionStrategy`] picks the base response; the remaining members are
//! attached to the integrated result as alternatives.

use crate::work::domain::{TaskId, ToolResponse};
use serde_json::Value;
use std::collections::BTreeSet;

/// A successful response together with its provider's plan rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResponse {
    /// Zero-based rank in the routing plan; lower is better.
    pub rank: usize,
    /// The successful response.
    pub response: ToolResponse,
}

/// Successful responses for one task that produced materially different
/// payloads, ordered best rank first.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictSet {
    task: TaskId,
    members: Vec<RankedResponse>,
}

impl ConflictSet {
    /// Builds a conflict set; members are sorted by rank, then provider id.
    #[must_use]
    pub fn new(task: TaskId, mut members: Vec<RankedResponse>) -> Self {
        members.sort_by(|left, right| {
            left.rank
                .cmp(&right.rank)
                .then_with(|| left.response.provider().cmp(right.response.provider()))
        });
        Self { task, members }
    }

    /// Returns the task the responses answer.
    #[must_use]
    pub const fn task(&self) -> TaskId {
        self.task
    }

    /// Returns the members, best rank first.
    #[must_use]
    pub fn members(&self) -> &[RankedResponse] {
        &self.members
    }

    /// Returns the similarity of member `index` to member `base`.
    #[must_use]
    pub fn similarity(&self, base: usize, index: usize) -> Option<f64> {
        let left = self.members.get(base)?.response.payload()?;
        let right = self.members.get(index)?.response.payload()?;
        Some(payload_similarity(left, right))
    }

    /// Returns the lowest similarity between member `base` and any other
    /// member, or `None` for a set with one member.
    #[must_use]
    pub fn min_similarity_to(&self, base: usize) -> Option<f64> {
        (0..self.members.len())
            .filter(|index| *index != base)
            .filter_map(|index| self.similarity(base, index))
            .min_by(f64::total_cmp)
    }
}

/// A strategy's decision for one conflict set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Index into [`ConflictSet::members`] of the base response.
    pub base: usize,
    /// Whether the caller should confirm the result before using it.
    pub requires_confirmation: bool,
}

/// Chooses the base response for a conflict set.
pub trait ResolutionStrategy: Send + Sync {
    /// Returns the tag recorded on integrated results.
    fn name(&self) -> &'static str;

    /// Resolves `conflict`, which always has at least two members.
    fn resolve(&self, conflict: &ConflictSet) -> Resolution;
}

/// Uses the higher-ranked provider's payload and keeps the others as
/// alternatives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreferHigherRanked;

impl ResolutionStrategy for PreferHigherRanked {
    fn name(&self) -> &'static str {
        "prefer_higher_ranked"
    }

    fn resolve(&self, _conflict: &ConflictSet) -> Resolution {
        Resolution {
            base: 0,
            requires_confirmation: false,
        }
    }
}

/// Uses the higher-ranked payload but flags results whose alternatives fall
/// below `threshold` similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequireConfirmation {
    /// Similarity below which confirmation is required.
    pub threshold: f64,
}

impl ResolutionStrategy for RequireConfirmation {
    fn name(&self) -> &'static str {
        "require_confirmation"
    }

    fn resolve(&self, conflict: &ConflictSet) -> Resolution {
        let requires_confirmation = conflict
            .min_similarity_to(0)
            .is_some_and(|similarity| similarity < self.threshold);
        Resolution {
            base: 0,
            requires_confirmation,
        }
    }
}

/// Token Jaccard similarity of two payloads in `[0, 1]`.
///
/// Payloads are serialised canonically (object keys sorted) and split into
/// lower-cased alphanumeric tokens. Two payloads without tokens are equal
/// exactly when their canonical forms match.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "similarity is a ratio of token counts"
)]
pub fn payload_similarity(left: &Value, right: &Value) -> f64 {
    if left == right {
        return 1.0;
    }
    let left_tokens = tokens(left);
    let right_tokens = tokens(right);
    let union = left_tokens.union(&right_tokens).count();
    if union == 0 {
        return 0.0;
    }
    let shared = left_tokens.intersection(&right_tokens).count();
    let (Ok(shared_count), Ok(union_count)) = (u32::try_from(shared), u32::try_from(union)) else {
        return 0.0;
    };
    f64::from(shared_count) / f64::from(union_count)
}

fn tokens(value: &Value) -> BTreeSet<String> {
    let canonical = value.to_string();
    canonical
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}
