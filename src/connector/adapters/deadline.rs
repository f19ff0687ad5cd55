//! Deadline enforcement shared by the connector adapters.

use crate::connector::ports::{ConnectorError, ConnectorResult};
use crate::provider::domain::ProviderId;
use crate::work::domain::{Task, ToolResponse};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Runs `call` bounded by the task deadline and normalises the result.
///
/// An already expired deadline fails without polling `call`.
pub(super) async fn invoke_within_deadline<F>(
    provider: &ProviderId,
    task: &Task,
    call: F,
) -> ToolResponse
where
    F: Future<Output = ConnectorResult<Value>>,
{
    let started_at = Utc::now();
    let started = Instant::now();
    let result = if task.remaining().is_zero() {
        Err(ConnectorError::timeout(Duration::ZERO))
    } else {
        tokio::time::timeout_at(task.deadline(), call)
            .await
            .unwrap_or_else(|_| Err(ConnectorError::timeout(started.elapsed())))
    };
    into_response(provider, task, started_at, started.elapsed(), result)
}

/// Converts a transport result into a [`ToolResponse`].
pub(super) fn into_response(
    provider: &ProviderId,
    task: &Task,
    started_at: DateTime<Utc>,
    latency: Duration,
    result: ConnectorResult<Value>,
) -> ToolResponse {
    match result {
        Ok(payload) => {
            ToolResponse::success(provider.clone(), task.id(), payload, started_at, latency)
        }
        Err(err) => ToolResponse::failure(
            provider.clone(),
            task.id(),
            err.kind(),
            err.to_string(),
            started_at,
            latency,
        ),
    }
}
