//! Capability provider catalogue for Switchyard.
//!
//! This module owns the data model for discovered providers (identity,
//! transport configuration, declared and probed capabilities, health and
//! performance history) and the concurrent-safe registry that stores them.
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
