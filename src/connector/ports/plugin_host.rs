//! Host editor plugin-command port.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Result type for plugin command execution.
pub type PluginCommandResult<T> = Result<T, PluginCommandError>;

/// Command surface of the host editor, through which plugin-hosted
/// assistants are invoked.
#[async_trait]
pub trait PluginCommandHost: Send + Sync {
    /// Runs `command` contributed by `plugin` with JSON arguments.
    async fn execute(&self, plugin: &str, command: &str, arguments: Value)
    -> PluginCommandResult<Value>;

    /// Returns whether `plugin` is installed and active.
    async fn is_available(&self, plugin: &str) -> bool;
}

/// Errors returned by the host when running plugin commands.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PluginCommandError {
    /// The plugin is not installed or not active.
    #[error("plugin {0} is not available")]
    PluginUnavailable(String),

    /// The plugin does not contribute the command.
    #[error("command {0} not found")]
    CommandNotFound(String),

    /// The command ran and failed.
    #[error("command failed: {0}")]
    Failed(String),
}
