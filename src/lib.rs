//! Switchyard: orchestration core for AI capability providers.
//!
//! Switchyard discovers independently operated providers reachable over
//! different transports, tracks their health and actual capabilities, and
//! routes tasks to the best provider available at that moment. When several
//! providers answer the same task, their results are reconciled into one
//! integrated result.
//!
//! # Architecture
//!
//! Switchyard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (transports, stores)
//!
//! # Modules
//!
//! - [`provider`]: Provider data model and the registry
//! - [`work`]: Tasks, workspace snapshots and normalised responses
//! - [`connector`]: One connector per transport kind behind a common trait
//! - [`probe`]: Discovery of a provider's actual capabilities
//! - [`health`]: Periodic and on-demand health monitoring
//! - [`routing`]: Deterministic scoring and routing plans
//! - [`orchestration`]: Plan execution, conflict resolution and the facade
//! - [`config`]: Aggregate tunables

pub mod config;
pub mod connector;
pub mod health;
pub mod orchestration;
pub mod probe;
pub mod provider;
pub mod routing;
pub mod work;
