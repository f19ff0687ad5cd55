//! Work items submitted for routing and the responses providers return.
//!
//! A [`domain::Task`] is immutable once built and carries its own deadline
//! and cancellation token. [`domain::ToolResponse`] is the transport-agnostic
//! shape every connector normalises its replies into.

pub mod domain;
