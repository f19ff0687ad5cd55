//! Connector adapters: one uniform contract over four transport kinds.
//!
//! Every transport implements [`ports::Connector`] (`connect`, `invoke`,
//! `health`, `disconnect`) and normalises replies into
//! [`ToolResponse`](crate::work::domain::ToolResponse), so code above this
//! layer never sees a transport-specific envelope. The module follows
//! hexagonal architecture:
//!
//! - Wire-level request and reply types in [`domain`]
//! - Port contracts in [`ports`]
//! - Transport implementations in [`adapters`]
//! - The per-provider connector pool in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
