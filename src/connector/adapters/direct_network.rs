//! Direct-network connector for providers served over HTTP.
//!
//! Endpoints are relative to the configured base URL: `POST /invoke`,
//! `GET /health` and `GET /capabilities`.

use super::deadline::invoke_within_deadline;
use crate::connector::domain::{InvocationRequest, decode_capabilities, decode_reply};
use crate::connector::ports::{Connector, ConnectorError, ConnectorResult};
use crate::provider::domain::{CapabilitySet, NetworkConfig, ProviderId, TransportKind};
use crate::work::domain::{Task, ToolResponse, WorkspaceSnapshot};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::debug;

/// Connector for providers reachable over HTTP.
#[derive(Debug, Clone)]
pub struct DirectNetworkConnector {
    provider: ProviderId,
    config: NetworkConfig,
    client: Client,
}

impl DirectNetworkConnector {
    /// Creates a connector sharing `client`'s connection pool.
    #[must_use]
    pub const fn new(provider: ProviderId, config: NetworkConfig, client: Client) -> Self {
        Self {
            provider,
            config,
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url())
    }

    fn with_headers(&self, mut request: RequestBuilder) -> RequestBuilder {
        for (name, value) in self.config.headers() {
            request = request.header(name, value);
        }
        request
    }

    async fn send(&self, request: RequestBuilder) -> ConnectorResult<Value> {
        let response = self
            .with_headers(request)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, body.trim()));
        }
        let reply: Value = response
            .json()
            .await
            .map_err(|err| ConnectorError::InvalidResponse(format!("decode reply: {err}")))?;
        decode_reply(reply)
    }
}

fn map_transport_error(err: reqwest::Error) -> ConnectorError {
    if err.is_timeout() {
        ConnectorError::Timeout(err.to_string())
    } else if err.is_connect() {
        ConnectorError::ConnectionRefused(err.to_string())
    } else if err.is_decode() {
        ConnectorError::InvalidResponse(err.to_string())
    } else {
        ConnectorError::ConnectionReset(err.to_string())
    }
}

fn error_for_status(status: StatusCode, body: &str) -> ConnectorError {
    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };
    match status {
        StatusCode::TOO_MANY_REQUESTS => ConnectorError::RateLimited(message),
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
            ConnectorError::UnsupportedOperation(message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ConnectorError::Timeout(message)
        }
        StatusCode::SERVICE_UNAVAILABLE => ConnectorError::CapabilityUnavailable(message),
        _ => ConnectorError::Provider(message),
    }
}

#[async_trait]
impl Connector for DirectNetworkConnector {
    fn provider_id(&self) -> &ProviderId {
        &self.provider
    }

    fn transport_kind(&self) -> TransportKind {
        TransportKind::DirectNetwork
    }

    async fn connect(&self) -> ConnectorResult<()> {
        Ok(())
    }

    async fn invoke(&self, task: &Task, workspace: &WorkspaceSnapshot) -> ToolResponse {
        let request = InvocationRequest::invoke(task, workspace);
        invoke_within_deadline(&self.provider, task, async {
            let body = request.to_value()?;
            self.send(self.client.post(self.url("invoke")).json(&body))
                .await
        })
        .await
    }

    async fn health(&self) -> bool {
        match self
            .with_headers(self.client.get(self.url("health")))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(provider = %self.provider, error = %err, "health request failed");
                false
            }
        }
    }

    async fn list_capabilities(&self) -> ConnectorResult<Option<CapabilitySet>> {
        match self.send(self.client.get(self.url("capabilities"))).await {
            Ok(listing) => decode_capabilities(listing).map(Some),
            Err(ConnectorError::UnsupportedOperation(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn disconnect(&self) {}
}
