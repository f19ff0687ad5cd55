//! Generic request envelope and reply decoding shared by all transports.

use crate::connector::ports::{ConnectorError, ConnectorResult};
use crate::provider::domain::{Capability, CapabilitySet};
use crate::work::domain::{ResponseErrorKind, Task, TaskId, WorkspaceSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Operation requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Perform a task.
    Invoke,
    /// Lightweight liveness check.
    Health,
    /// List supported operations.
    Capabilities,
}

impl Operation {
    /// Returns the canonical operation name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invoke => "invoke",
            Self::Health => "health",
            Self::Capabilities => "capabilities",
        }
    }
}

/// Request body sent to a provider, wrapped per transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// Requested operation.
    pub operation: Operation,
    /// Task identifier for `invoke` requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    /// Task type for `invoke` requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<Capability>,
    /// Task description payload.
    #[serde(default)]
    pub description: Value,
    /// Capabilities the task requires.
    #[serde(default)]
    pub required_capabilities: CapabilitySet,
    /// Language hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Domain hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Workspace context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<WorkspaceSnapshot>,
    /// Time budget left for the provider, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl InvocationRequest {
    /// Builds an `invoke` request for `task`.
    #[must_use]
    pub fn invoke(task: &Task, workspace: &WorkspaceSnapshot) -> Self {
        Self {
            operation: Operation::Invoke,
            task_id: Some(task.id()),
            task_type: Some(task.task_type().clone()),
            description: task.description().clone(),
            required_capabilities: task.required_capabilities().clone(),
            language: task.language().map(ToOwned::to_owned),
            domain: task.domain().map(ToOwned::to_owned),
            workspace: Some(workspace.clone()),
            deadline_ms: Some(millis(task.remaining())),
        }
    }

    /// Builds a `health` request.
    #[must_use]
    pub const fn health() -> Self {
        Self::bare(Operation::Health)
    }

    /// Builds a `capabilities` request.
    #[must_use]
    pub const fn capabilities() -> Self {
        Self::bare(Operation::Capabilities)
    }

    const fn bare(operation: Operation) -> Self {
        Self {
            operation,
            task_id: None,
            task_type: None,
            description: Value::Null,
            required_capabilities: CapabilitySet::new(),
            language: None,
            domain: None,
            workspace: None,
            deadline_ms: None,
        }
    }

    /// Serialises the request to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidResponse`] if serialisation fails.
    pub fn to_value(&self) -> ConnectorResult<Value> {
        serde_json::to_value(self)
            .map_err(|err| ConnectorError::InvalidResponse(format!("encode request: {err}")))
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Deserialize)]
struct ReplyError {
    kind: ResponseErrorKind,
    #[serde(default)]
    message: String,
}

/// Decodes a provider reply.
///
/// A reply carrying an `error` object becomes the matching
/// [`ConnectorError`]; a reply with a `payload` field yields that field;
/// anything else is taken as the payload itself.
///
/// # Errors
///
/// Returns the provider-reported error, or
/// [`ConnectorError::InvalidResponse`] when the error object is malformed.
pub fn decode_reply(reply: Value) -> ConnectorResult<Value> {
    match reply {
        Value::Object(mut fields) => {
            if let Some(error) = fields.remove("error").filter(|error| !error.is_null()) {
                let parsed: ReplyError = serde_json::from_value(error).map_err(|err| {
                    ConnectorError::InvalidResponse(format!("malformed error reply: {err}"))
                })?;
                return Err(ConnectorError::from_kind(parsed.kind, parsed.message));
            }
            Ok(fields
                .remove("payload")
                .unwrap_or_else(|| Value::Object(fields)))
        }
        other => Ok(other),
    }
}

/// Decodes a capability listing: either an array of names or an object with
/// a `capabilities` array.
///
/// # Errors
///
/// Returns [`ConnectorError::InvalidResponse`] when the listing has another
/// shape or contains invalid names.
pub fn decode_capabilities(reply: Value) -> ConnectorResult<CapabilitySet> {
    let listing = match decode_reply(reply)? {
        Value::Object(mut fields) => fields.remove("capabilities").unwrap_or(Value::Null),
        other => other,
    };
    let names: Vec<String> = serde_json::from_value(listing)
        .map_err(|err| ConnectorError::InvalidResponse(format!("capability listing: {err}")))?;
    CapabilitySet::parse(names)
        .map_err(|err| ConnectorError::InvalidResponse(format!("capability listing: {err}")))
}
