//! Connector lifecycle services.

mod pool;

pub use pool::ConnectorPool;
