//! Orchestration services.

mod error;
mod orchestrator;
mod plan_log;

pub use error::{OrchestrationError, OrchestrationResult};
pub use orchestrator::{DiscoveryReport, Orchestrator};
pub use plan_log::PlanLog;
