//! Port contracts for provider connectors.

mod connector;
mod factory;
mod plugin_host;

pub use connector::{Connector, ConnectorError, ConnectorResult};
pub use factory::ConnectorFactory;
pub use plugin_host::{PluginCommandError, PluginCommandHost, PluginCommandResult};
