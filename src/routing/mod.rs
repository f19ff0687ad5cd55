//! Adaptive task routing.
//!
//! [`TaskRouter::route`] turns a task, one registry snapshot and the stored
//! preferences into a [`RoutingPlan`]: a primary provider, optional
//! supporting providers and an ordered fallback chain. Scoring is a
//! transparent weighted sum and ranking is fully deterministic for a given
//! input. The router only reads snapshots; it never mutates provider state.

mod config;
mod disposition;
mod plan;
mod preferences;
mod router;
mod scoring;

pub use config::{RoutingConfig, ScoringWeights};
pub use disposition::FailureDisposition;
pub use plan::RoutingPlan;
pub use preferences::{PreferenceConfig, PreferenceTable};
pub use router::TaskRouter;
pub use scoring::{CapabilityFit, RouteScore};
