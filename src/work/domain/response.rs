//! Normalised provider responses.

use super::TaskId;
use crate::provider::domain::ProviderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Classification of a failed invocation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseErrorKind {
    /// The transport could not be reached at all.
    ConnectionRefused,
    /// An established connection dropped mid-call.
    ConnectionReset,
    /// The deadline elapsed before the provider answered.
    Timeout,
    /// The provider asked the caller to slow down.
    RateLimited,
    /// The provider does not support the requested operation.
    UnsupportedOperation,
    /// The provider reports that the whole capability class is unavailable.
    CapabilityUnavailable,
    /// The provider answered with something that could not be decoded.
    InvalidResponse,
    /// Any other provider-side failure.
    Provider,
}

impl ResponseErrorKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConnectionRefused => "connection_refused",
            Self::ConnectionReset => "connection_reset",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::UnsupportedOperation => "unsupported_operation",
            Self::CapabilityUnavailable => "capability_unavailable",
            Self::InvalidResponse => "invalid_response",
            Self::Provider => "provider",
        }
    }

    /// Returns whether the same provider may be retried after a short backoff.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::ConnectionReset | Self::RateLimited
        )
    }

    /// Returns whether the failure means the transport is unreachable.
    #[must_use]
    pub const fn is_hard_connection_error(self) -> bool {
        matches!(self, Self::ConnectionRefused)
    }
}

impl fmt::Display for ResponseErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error details carried by a failed [`ToolResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Failure classification.
    pub kind: ResponseErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// One invocation attempt's outcome, identical in shape for every transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    provider: ProviderId,
    task: TaskId,
    payload: Option<Value>,
    error: Option<ResponseError>,
    started_at: DateTime<Utc>,
    latency: Duration,
    metadata: BTreeMap<String, Value>,
}

impl ToolResponse {
    /// Creates a successful response.
    #[must_use]
    pub const fn success(
        provider: ProviderId,
        task: TaskId,
        payload: Value,
        started_at: DateTime<Utc>,
        latency: Duration,
    ) -> Self {
        Self {
            provider,
            task,
            payload: Some(payload),
            error: None,
            started_at,
            latency,
            metadata: BTreeMap::new(),
        }
    }

    /// Creates a failed response.
    #[must_use]
    pub fn failure(
        provider: ProviderId,
        task: TaskId,
        kind: ResponseErrorKind,
        message: impl Into<String>,
        started_at: DateTime<Utc>,
        latency: Duration,
    ) -> Self {
        Self {
            provider,
            task,
            payload: None,
            error: Some(ResponseError {
                kind,
                message: message.into(),
            }),
            started_at,
            latency,
            metadata: BTreeMap::new(),
        }
    }

    /// Adds one metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns the responding provider.
    #[must_use]
    pub const fn provider(&self) -> &ProviderId {
        &self.provider
    }

    /// Returns the task the response belongs to.
    #[must_use]
    pub const fn task(&self) -> TaskId {
        self.task
    }

    /// Returns whether the invocation succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Returns the payload of a successful response.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Returns the error of a failed response.
    #[must_use]
    pub const fn error(&self) -> Option<&ResponseError> {
        self.error.as_ref()
    }

    /// Returns the error kind of a failed response.
    #[must_use]
    pub fn error_kind(&self) -> Option<ResponseErrorKind> {
        self.error.as_ref().map(|error| error.kind)
    }

    /// Returns when the attempt started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns how long the attempt took.
    #[must_use]
    pub const fn latency(&self) -> Duration {
        self.latency
    }

    /// Returns attached metadata.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }
}
