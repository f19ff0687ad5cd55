//! Plugin-command connector: providers hosted as editor plugins.

use super::deadline::invoke_within_deadline;
use crate::connector::domain::{InvocationRequest, decode_reply};
use crate::connector::ports::{
    Connector, ConnectorError, ConnectorResult, PluginCommandError, PluginCommandHost,
};
use crate::provider::domain::{PluginCommandConfig, ProviderId, TransportKind};
use crate::work::domain::{Task, ToolResponse, WorkspaceSnapshot};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

impl From<PluginCommandError> for ConnectorError {
    fn from(err: PluginCommandError) -> Self {
        match err {
            PluginCommandError::PluginUnavailable(_) => Self::ConnectionRefused(err.to_string()),
            PluginCommandError::CommandNotFound(_) => Self::UnsupportedOperation(err.to_string()),
            PluginCommandError::Failed(message) => Self::Provider(message),
        }
    }
}

/// Connector that runs a plugin command through the host editor.
#[derive(Clone)]
pub struct PluginCommandConnector {
    provider: ProviderId,
    config: PluginCommandConfig,
    host: Arc<dyn PluginCommandHost>,
}

impl std::fmt::Debug for PluginCommandConnector {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("PluginCommandConnector")
            .field("provider", &self.provider)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PluginCommandConnector {
    /// Creates a connector bound to `host`.
    #[must_use]
    pub const fn new(
        provider: ProviderId,
        config: PluginCommandConfig,
        host: Arc<dyn PluginCommandHost>,
    ) -> Self {
        Self {
            provider,
            config,
            host,
        }
    }

    async fn execute(&self, command: &str, request: &InvocationRequest) -> ConnectorResult<Value> {
        let arguments = request.to_value()?;
        let reply = self
            .host
            .execute(self.config.plugin(), command, arguments)
            .await?;
        decode_reply(reply)
    }
}

#[async_trait]
impl Connector for PluginCommandConnector {
    fn provider_id(&self) -> &ProviderId {
        &self.provider
    }

    fn transport_kind(&self) -> TransportKind {
        TransportKind::PluginCommand
    }

    async fn connect(&self) -> ConnectorResult<()> {
        if self.host.is_available(self.config.plugin()).await {
            Ok(())
        } else {
            Err(PluginCommandError::PluginUnavailable(self.config.plugin().to_owned()).into())
        }
    }

    async fn invoke(&self, task: &Task, workspace: &WorkspaceSnapshot) -> ToolResponse {
        let request = InvocationRequest::invoke(task, workspace);
        invoke_within_deadline(
            &self.provider,
            task,
            self.execute(self.config.command(), &request),
        )
        .await
    }

    async fn health(&self) -> bool {
        if !self.host.is_available(self.config.plugin()).await {
            return false;
        }
        match self.config.health_command() {
            Some(command) => self
                .execute(command, &InvocationRequest::health())
                .await
                .is_ok(),
            None => true,
        }
    }

    async fn disconnect(&self) {}
}
