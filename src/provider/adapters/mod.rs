//! Adapter implementations for the provider registry port.

pub mod memory;
