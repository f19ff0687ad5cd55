//! Orchestration domain types.

mod conflict;
mod policy;
mod result;

pub use conflict::{
    ConflictSet, PreferHigherRanked, RankedResponse, RequireConfirmation, Resolution,
    ResolutionStrategy, payload_similarity,
};
pub use policy::{ConflictConfig, RetryPolicy, StrategyKind};
pub use result::{Alternative, AttemptFailure, AttemptSummary, IntegratedResult};
