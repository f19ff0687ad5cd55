//! Transport kinds and per-transport connection configuration.

use super::{ParseTransportKindError, ProviderDomainError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The four transport kinds a provider can be reached over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Message-based RPC over a long-lived connection.
    MessageRpc,
    /// A command exposed by a host editor plugin.
    PluginCommand,
    /// A one-shot child process per invocation.
    Subprocess,
    /// A direct network call to an HTTP endpoint.
    DirectNetwork,
}

impl TransportKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MessageRpc => "message_rpc",
            Self::PluginCommand => "plugin_command",
            Self::Subprocess => "subprocess",
            Self::DirectNetwork => "direct_network",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransportKind {
    type Error = ParseTransportKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "message_rpc" => Ok(Self::MessageRpc),
            "plugin_command" => Ok(Self::PluginCommand),
            "subprocess" => Ok(Self::Subprocess),
            "direct_network" => Ok(Self::DirectNetwork),
            _ => Err(ParseTransportKindError(value.to_owned())),
        }
    }
}

/// Settings for launching a provider as a local process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfig {
    command: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    working_directory: Option<String>,
}

impl ProcessConfig {
    /// Creates a process configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderDomainError::EmptyCommand`] when `command` is empty
    /// after trimming.
    pub fn new(command: impl Into<String>) -> Result<Self, ProviderDomainError> {
        let normalized_command = command.into().trim().to_owned();
        if normalized_command.is_empty() {
            return Err(ProviderDomainError::EmptyCommand);
        }

        Ok(Self {
            command: normalized_command,
            args: Vec::new(),
            env: BTreeMap::new(),
            working_directory: None,
        })
    }

    /// Replaces command-line arguments.
    #[must_use]
    pub fn with_args(mut self, values: impl IntoIterator<Item = String>) -> Self {
        self.args = values.into_iter().collect();
        self
    }

    /// Replaces process environment variables.
    #[must_use]
    pub fn with_env(mut self, values: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env = values.into_iter().collect();
        self
    }

    /// Sets an explicit working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderDomainError::EmptyWorkingDirectory`] when the value
    /// is empty after trimming.
    pub fn with_working_directory(
        mut self,
        value: impl Into<String>,
    ) -> Result<Self, ProviderDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(ProviderDomainError::EmptyWorkingDirectory);
        }

        self.working_directory = Some(normalized);
        Ok(self)
    }

    /// Returns the executable command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns command-line arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns environment variables.
    #[must_use]
    pub const fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Returns the optional working directory.
    #[must_use]
    pub fn working_directory(&self) -> Option<&str> {
        self.working_directory.as_deref()
    }
}

/// Settings for a provider exposed as a host plugin command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginCommandConfig {
    plugin: String,
    command: String,
    health_command: Option<String>,
}

impl PluginCommandConfig {
    /// Creates a plugin-command configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderDomainError`] when the plugin or command is empty.
    pub fn new(
        plugin: impl Into<String>,
        command: impl Into<String>,
    ) -> Result<Self, ProviderDomainError> {
        let normalized_plugin = plugin.into().trim().to_owned();
        if normalized_plugin.is_empty() {
            return Err(ProviderDomainError::EmptyPluginId);
        }

        let normalized_command = command.into().trim().to_owned();
        if normalized_command.is_empty() {
            return Err(ProviderDomainError::EmptyPluginCommand);
        }

        Ok(Self {
            plugin: normalized_plugin,
            command: normalized_command,
            health_command: None,
        })
    }

    /// Sets a dedicated liveness command.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderDomainError::EmptyPluginCommand`] when the command
    /// is empty after trimming.
    pub fn with_health_command(
        mut self,
        command: impl Into<String>,
    ) -> Result<Self, ProviderDomainError> {
        let normalized = command.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(ProviderDomainError::EmptyPluginCommand);
        }
        self.health_command = Some(normalized);
        Ok(self)
    }

    /// Returns the owning plugin identifier.
    #[must_use]
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Returns the command used for invocations.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the optional liveness command.
    #[must_use]
    pub fn health_command(&self) -> Option<&str> {
        self.health_command.as_deref()
    }
}

/// Settings for a provider reachable over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    base_url: String,
    headers: BTreeMap<String, String>,
}

impl NetworkConfig {
    /// Creates a network configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderDomainError`] when `base_url` is empty or does not
    /// start with `http://` or `https://`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderDomainError> {
        let normalized_base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        if normalized_base_url.is_empty() {
            return Err(ProviderDomainError::EmptyBaseUrl);
        }

        let has_valid_prefix = normalized_base_url.starts_with("http://")
            || normalized_base_url.starts_with("https://");
        if !has_valid_prefix {
            return Err(ProviderDomainError::InvalidBaseUrl(normalized_base_url));
        }

        Ok(Self {
            base_url: normalized_base_url,
            headers: BTreeMap::new(),
        })
    }

    /// Replaces extra request headers.
    #[must_use]
    pub fn with_headers(mut self, values: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers = values.into_iter().collect();
        self
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns extra request headers.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

/// Connection settings, one variant per transport kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "config")]
pub enum ConnectionConfig {
    /// JSON-RPC over the stdio of a long-lived process.
    MessageRpc(ProcessConfig),
    /// A host plugin command.
    PluginCommand(PluginCommandConfig),
    /// A one-shot process per invocation.
    Subprocess(ProcessConfig),
    /// An HTTP endpoint.
    DirectNetwork(NetworkConfig),
}

impl ConnectionConfig {
    /// Returns the transport kind implied by this configuration.
    #[must_use]
    pub const fn kind(&self) -> TransportKind {
        match self {
            Self::MessageRpc(_) => TransportKind::MessageRpc,
            Self::PluginCommand(_) => TransportKind::PluginCommand,
            Self::Subprocess(_) => TransportKind::Subprocess,
            Self::DirectNetwork(_) => TransportKind::DirectNetwork,
        }
    }

    /// Creates a `message_rpc` configuration.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`ProcessConfig::new`].
    pub fn message_rpc(command: impl Into<String>) -> Result<Self, ProviderDomainError> {
        Ok(Self::MessageRpc(ProcessConfig::new(command)?))
    }

    /// Creates a `plugin_command` configuration.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`PluginCommandConfig::new`].
    pub fn plugin_command(
        plugin: impl Into<String>,
        command: impl Into<String>,
    ) -> Result<Self, ProviderDomainError> {
        Ok(Self::PluginCommand(PluginCommandConfig::new(plugin, command)?))
    }

    /// Creates a `subprocess` configuration.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`ProcessConfig::new`].
    pub fn subprocess(command: impl Into<String>) -> Result<Self, ProviderDomainError> {
        Ok(Self::Subprocess(ProcessConfig::new(command)?))
    }

    /// Creates a `direct_network` configuration.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`NetworkConfig::new`].
    pub fn direct_network(base_url: impl Into<String>) -> Result<Self, ProviderDomainError> {
        Ok(Self::DirectNetwork(NetworkConfig::new(base_url)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("message-rpc", TransportKind::MessageRpc)]
    #[case("plugin_command", TransportKind::PluginCommand)]
    #[case("Subprocess", TransportKind::Subprocess)]
    #[case("direct-network", TransportKind::DirectNetwork)]
    fn parses_transport_kinds(#[case] input: &str, #[case] expected: TransportKind) {
        assert_eq!(TransportKind::try_from(input), Ok(expected));
    }

    #[test]
    fn network_config_requires_http_scheme() {
        assert_eq!(
            NetworkConfig::new("ftp://example"),
            Err(ProviderDomainError::InvalidBaseUrl("ftp://example".to_owned()))
        );
        let config = NetworkConfig::new("https://assistant.local/").expect("valid url");
        assert_eq!(config.base_url(), "https://assistant.local");
    }

    #[test]
    fn connection_config_reports_its_kind() {
        let config = ConnectionConfig::plugin_command("copilot", "copilot.ask")
            .expect("valid plugin config");
        assert_eq!(config.kind(), TransportKind::PluginCommand);
    }

    #[test]
    fn connection_config_serializes_with_kind_tag() {
        let config = ConnectionConfig::subprocess("aider").expect("valid process config");
        let value = serde_json::to_value(&config).expect("serializable config");
        assert_eq!(value["kind"], "subprocess");
        assert_eq!(value["config"]["command"], "aider");
    }
}
