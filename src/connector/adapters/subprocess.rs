//! Subprocess connector: one child process per request.
//!
//! The request envelope is written to the child's stdin and the reply read
//! from its stdout. A child still running at the deadline has its stdin
//! closed, is given a short grace period, then killed and reaped.

use super::deadline::into_response;
use crate::connector::domain::{InvocationRequest, decode_capabilities, decode_reply};
use crate::connector::ports::{Connector, ConnectorError, ConnectorResult};
use crate::provider::domain::{CapabilitySet, ProcessConfig, ProviderId, TransportKind};
use crate::work::domain::{Task, ToolResponse, WorkspaceSnapshot};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Budget for health and capability requests, which carry no task deadline.
const CONTROL_REQUEST_BUDGET: Duration = Duration::from_secs(10);

/// Connector for providers run as a fresh subprocess per request.
#[derive(Debug, Clone)]
pub struct SubprocessConnector {
    provider: ProviderId,
    config: ProcessConfig,
    kill_grace: Duration,
}

impl SubprocessConnector {
    /// Creates a connector.
    #[must_use]
    pub const fn new(provider: ProviderId, config: ProcessConfig, kill_grace: Duration) -> Self {
        Self {
            provider,
            config,
            kill_grace,
        }
    }

    fn spawn(&self) -> ConnectorResult<Child> {
        let mut command = Command::new(self.config.command());
        command
            .args(self.config.args())
            .envs(self.config.env())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(directory) = self.config.working_directory() {
            command.current_dir(directory);
        }
        command.spawn().map_err(|err| {
            ConnectorError::ConnectionRefused(format!("spawn {}: {err}", self.config.command()))
        })
    }

    async fn run(&self, request: &InvocationRequest, deadline: Instant) -> ConnectorResult<Value> {
        let body = serde_json::to_vec(&request.to_value()?)
            .map_err(|err| ConnectorError::InvalidResponse(format!("encode request: {err}")))?;
        let mut child = self.spawn()?;
        let (Some(mut stdin), Some(mut stdout), Some(mut stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(ConnectorError::ConnectionRefused(
                "child stdio unavailable".to_owned(),
            ));
        };

        let exchange = async move {
            let write = async {
                stdin.write_all(&body).await?;
                stdin.shutdown().await?;
                drop(stdin);
                Ok::<_, std::io::Error>(())
            };
            let mut output = Vec::new();
            let mut diagnostics = Vec::new();
            let (written, read, read_err) = tokio::join!(
                write,
                stdout.read_to_end(&mut output),
                stderr.read_to_end(&mut diagnostics),
            );
            written.map_err(|err| ConnectorError::ConnectionReset(format!("write request: {err}")))?;
            read.map_err(|err| ConnectorError::ConnectionReset(format!("read reply: {err}")))?;
            read_err
                .map_err(|err| ConnectorError::ConnectionReset(format!("read stderr: {err}")))?;
            Ok::<_, ConnectorError>((output, diagnostics))
        };

        let Ok(exchanged) = tokio::time::timeout_at(deadline, exchange).await else {
            self.terminate(&mut child).await;
            return Err(ConnectorError::Timeout(format!(
                "{} did not finish before the deadline",
                self.config.command()
            )));
        };
        let (output, diagnostics) = match exchanged {
            Ok(streams) => streams,
            Err(err) => {
                self.terminate(&mut child).await;
                return Err(err);
            }
        };

        let status = child
            .wait()
            .await
            .map_err(|err| ConnectorError::ConnectionReset(format!("wait for child: {err}")))?;
        if !status.success() {
            let message = String::from_utf8_lossy(&diagnostics).trim().to_owned();
            return Err(ConnectorError::Provider(format!("{status}: {message}")));
        }
        let reply: Value = serde_json::from_slice(&output)
            .map_err(|err| ConnectorError::InvalidResponse(format!("decode reply: {err}")))?;
        decode_reply(reply)
    }

    async fn terminate(&self, child: &mut Child) {
        if tokio::time::timeout(self.kill_grace, child.wait())
            .await
            .is_ok()
        {
            return;
        }
        match child.kill().await {
            Ok(()) => debug!(provider = %self.provider, "killed subprocess after deadline"),
            Err(err) => warn!(provider = %self.provider, error = %err, "failed to kill subprocess"),
        }
    }
}

#[async_trait]
impl Connector for SubprocessConnector {
    fn provider_id(&self) -> &ProviderId {
        &self.provider
    }

    fn transport_kind(&self) -> TransportKind {
        TransportKind::Subprocess
    }

    async fn connect(&self) -> ConnectorResult<()> {
        Ok(())
    }

    async fn invoke(&self, task: &Task, workspace: &WorkspaceSnapshot) -> ToolResponse {
        let started_at = Utc::now();
        let started = Instant::now();
        let result = if task.remaining().is_zero() {
            Err(ConnectorError::timeout(Duration::ZERO))
        } else {
            let request = InvocationRequest::invoke(task, workspace);
            self.run(&request, task.deadline()).await
        };
        into_response(&self.provider, task, started_at, started.elapsed(), result)
    }

    async fn health(&self) -> bool {
        let deadline = Instant::now() + CONTROL_REQUEST_BUDGET;
        self.run(&InvocationRequest::health(), deadline).await.is_ok()
    }

    async fn list_capabilities(&self) -> ConnectorResult<Option<CapabilitySet>> {
        let deadline = Instant::now() + CONTROL_REQUEST_BUDGET;
        match self.run(&InvocationRequest::capabilities(), deadline).await {
            Ok(listing) => decode_capabilities(listing).map(Some),
            Err(ConnectorError::UnsupportedOperation(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn disconnect(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::domain::Capability;
    use crate::work::domain::ResponseErrorKind;
    use serde_json::json;

    fn shell(script: &str) -> SubprocessConnector {
        let config = ProcessConfig::new("sh")
            .expect("valid command")
            .with_args(["-c".to_owned(), script.to_owned()]);
        SubprocessConnector::new(
            ProviderId::new("sub").expect("valid provider id"),
            config,
            Duration::from_millis(50),
        )
    }

    fn task() -> Task {
        Task::new(Capability::completion(), json!({"prompt": "hi"}))
            .with_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn replies_on_stdout_become_payloads() {
        let connector = shell(r#"cat >/dev/null; echo '{"payload": {"answer": 42}}'"#);
        let response = connector.invoke(&task(), &WorkspaceSnapshot::new()).await;
        assert_eq!(response.payload(), Some(&json!({"answer": 42})));
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_provider_error() {
        let connector = shell("cat >/dev/null; echo boom >&2; exit 3");
        let response = connector.invoke(&task(), &WorkspaceSnapshot::new()).await;
        assert_eq!(response.error_kind(), Some(ResponseErrorKind::Provider));
        assert!(response.error().is_some_and(|error| error.message.contains("boom")));
    }

    #[tokio::test]
    async fn garbage_output_is_an_invalid_response() {
        let connector = shell("cat >/dev/null; echo not-json");
        let response = connector.invoke(&task(), &WorkspaceSnapshot::new()).await;
        assert_eq!(response.error_kind(), Some(ResponseErrorKind::InvalidResponse));
    }

    #[tokio::test]
    async fn overrunning_children_time_out() {
        let connector = shell("sleep 5");
        let task = task().with_timeout(Duration::from_millis(100));
        let response = connector.invoke(&task, &WorkspaceSnapshot::new()).await;
        assert_eq!(response.error_kind(), Some(ResponseErrorKind::Timeout));
        assert!(response.latency() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn missing_binaries_refuse_connection() {
        let config = ProcessConfig::new("switchyard-test-no-such-binary").expect("valid command");
        let connector = SubprocessConnector::new(
            ProviderId::new("sub").expect("valid provider id"),
            config,
            Duration::from_millis(50),
        );
        let response = connector.invoke(&task(), &WorkspaceSnapshot::new()).await;
        assert_eq!(response.error_kind(), Some(ResponseErrorKind::ConnectionRefused));
    }
}
