//! Uniform connector contract implemented once per transport kind.

use crate::provider::domain::{CapabilitySet, ProviderId, TransportKind};
use crate::work::domain::{ResponseErrorKind, Task, ToolResponse, WorkspaceSnapshot};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Transport-agnostic access to one provider.
///
/// A connector holds only the provider's id and connection config; provider
/// state itself lives in the registry.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Returns the provider this connector talks to.
    fn provider_id(&self) -> &ProviderId;

    /// Returns the transport kind.
    fn transport_kind(&self) -> TransportKind;

    /// Establishes the transport connection. Calling it on a connected
    /// connector is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::ConnectionRefused`] when the provider cannot
    /// be reached.
    async fn connect(&self) -> ConnectorResult<()>;

    /// Performs `task`, never running past the task deadline.
    ///
    /// Failures are reported inside the returned [`ToolResponse`]; a deadline
    /// overrun yields a `timeout` failure rather than a hang.
    async fn invoke(&self, task: &Task, workspace: &WorkspaceSnapshot) -> ToolResponse;

    /// Lightweight liveness probe, distinct from capability probing.
    async fn health(&self) -> bool;

    /// Asks the provider for its supported operations.
    ///
    /// Returns `Ok(None)` when the transport has no such call.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors from the listing call.
    async fn list_capabilities(&self) -> ConnectorResult<Option<CapabilitySet>> {
        Ok(None)
    }

    /// Releases transport resources. Idempotent.
    async fn disconnect(&self);
}

/// Errors raised by connector transports.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectorError {
    /// The transport is unreachable.
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    /// An established connection dropped.
    #[error("connection reset: {0}")]
    ConnectionReset(String),

    /// The deadline elapsed.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The provider is throttling requests.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider lacks the requested operation.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The provider reports the whole capability class as unavailable.
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// The reply could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Any other provider-side failure.
    #[error("provider error: {0}")]
    Provider(String),
}

impl ConnectorError {
    /// Builds a timeout error for a call that ran for `after`.
    #[must_use]
    pub fn timeout(after: Duration) -> Self {
        Self::Timeout(format!("deadline exceeded after {}ms", after.as_millis()))
    }

    /// Builds the error matching a reported error kind.
    #[must_use]
    pub fn from_kind(kind: ResponseErrorKind, message: impl Into<String>) -> Self {
        let text = message.into();
        match kind {
            ResponseErrorKind::ConnectionRefused => Self::ConnectionRefused(text),
            ResponseErrorKind::ConnectionReset => Self::ConnectionReset(text),
            ResponseErrorKind::Timeout => Self::Timeout(text),
            ResponseErrorKind::RateLimited => Self::RateLimited(text),
            ResponseErrorKind::UnsupportedOperation => Self::UnsupportedOperation(text),
            ResponseErrorKind::CapabilityUnavailable => Self::CapabilityUnavailable(text),
            ResponseErrorKind::InvalidResponse => Self::InvalidResponse(text),
            ResponseErrorKind::Provider => Self::Provider(text),
        }
    }

    /// Returns the response error kind for this error.
    #[must_use]
    pub const fn kind(&self) -> ResponseErrorKind {
        match self {
            Self::ConnectionRefused(_) => ResponseErrorKind::ConnectionRefused,
            Self::ConnectionReset(_) => ResponseErrorKind::ConnectionReset,
            Self::Timeout(_) => ResponseErrorKind::Timeout,
            Self::RateLimited(_) => ResponseErrorKind::RateLimited,
            Self::UnsupportedOperation(_) => ResponseErrorKind::UnsupportedOperation,
            Self::CapabilityUnavailable(_) => ResponseErrorKind::CapabilityUnavailable,
            Self::InvalidResponse(_) => ResponseErrorKind::InvalidResponse,
            Self::Provider(_) => ResponseErrorKind::Provider,
        }
    }
}
