//! Connector factory dispatching on the provider's connection config.

use super::{
    DirectNetworkConnector, MessageRpcConnector, PluginCommandConnector, SubprocessConnector,
};
use crate::connector::ports::{
    Connector, ConnectorError, ConnectorFactory, ConnectorResult, PluginCommandHost,
};
use crate::provider::domain::{ConnectionConfig, Provider};
use std::sync::Arc;
use std::time::Duration;

/// Builds the production connector for each transport kind.
#[derive(Clone)]
pub struct DefaultConnectorFactory {
    plugin_host: Option<Arc<dyn PluginCommandHost>>,
    kill_grace: Duration,
    http: reqwest::Client,
}

impl std::fmt::Debug for DefaultConnectorFactory {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DefaultConnectorFactory")
            .field("has_plugin_host", &self.plugin_host.is_some())
            .field("kill_grace", &self.kill_grace)
            .finish_non_exhaustive()
    }
}

impl DefaultConnectorFactory {
    /// Creates a factory without a plugin host.
    #[must_use]
    pub fn new(kill_grace: Duration) -> Self {
        Self {
            plugin_host: None,
            kill_grace,
            http: reqwest::Client::new(),
        }
    }

    /// Attaches the host used by plugin-command providers.
    #[must_use]
    pub fn with_plugin_host(mut self, host: Arc<dyn PluginCommandHost>) -> Self {
        self.plugin_host = Some(host);
        self
    }

    /// Replaces the shared HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }
}

impl ConnectorFactory for DefaultConnectorFactory {
    fn build(&self, provider: &Provider) -> ConnectorResult<Arc<dyn Connector>> {
        let id = provider.id().clone();
        let connector: Arc<dyn Connector> = match provider.connection() {
            ConnectionConfig::MessageRpc(config) => Arc::new(MessageRpcConnector::new(
                id,
                config.clone(),
                self.kill_grace,
            )),
            ConnectionConfig::Subprocess(config) => Arc::new(SubprocessConnector::new(
                id,
                config.clone(),
                self.kill_grace,
            )),
            ConnectionConfig::PluginCommand(config) => {
                let host = self.plugin_host.as_ref().ok_or_else(|| {
                    ConnectorError::UnsupportedOperation(
                        "no plugin host is attached".to_owned(),
                    )
                })?;
                Arc::new(PluginCommandConnector::new(
                    id,
                    config.clone(),
                    Arc::clone(host),
                ))
            }
            ConnectionConfig::DirectNetwork(config) => Arc::new(DirectNetworkConnector::new(
                id,
                config.clone(),
                self.http.clone(),
            )),
        };
        Ok(connector)
    }
}
