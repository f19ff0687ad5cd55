//! Connector adapters, one per transport kind, plus an in-memory double.

mod deadline;
pub mod direct_network;
pub mod factory;
pub mod memory;
pub mod message_rpc;
pub mod plugin_command;
pub mod subprocess;

pub use direct_network::DirectNetworkConnector;
pub use factory::DefaultConnectorFactory;
pub use memory::{InMemoryConnector, InMemoryConnectorFactory};
pub use message_rpc::MessageRpcConnector;
pub use plugin_command::PluginCommandConnector;
pub use subprocess::SubprocessConnector;
