//! Message-RPC connector speaking JSON-RPC 2.0 over the stdio of a
//! long-lived child process.
//!
//! The child is spawned lazily on first use and respawned when its output
//! stream closes. Replies are matched to callers by request id; a caller
//! that gives up (deadline or cancellation) removes its pending entry so a
//! late reply is dropped.

use super::deadline::invoke_within_deadline;
use crate::connector::domain::{InvocationRequest, decode_capabilities, decode_reply};
use crate::connector::ports::{Connector, ConnectorError, ConnectorResult};
use crate::provider::domain::{CapabilitySet, ProcessConfig, ProviderId, TransportKind};
use crate::work::domain::{Task, ToolResponse, WorkspaceSnapshot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const METHOD_INVOKE: &str = "invoke";
const METHOD_HEALTH: &str = "health";
const METHOD_CAPABILITIES: &str = "capabilities/list";

const CODE_METHOD_NOT_FOUND: i64 = -32601;
const CODE_CAPABILITY_UNAVAILABLE: i64 = -32010;
const CODE_RATE_LIMITED: i64 = -32029;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<ConnectorResult<Value>>>>>;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    #[serde(default)]
    message: String,
}

impl RpcError {
    fn into_connector_error(self) -> ConnectorError {
        match self.code {
            CODE_METHOD_NOT_FOUND => ConnectorError::UnsupportedOperation(self.message),
            CODE_CAPABILITY_UNAVAILABLE => ConnectorError::CapabilityUnavailable(self.message),
            CODE_RATE_LIMITED => ConnectorError::RateLimited(self.message),
            code => ConnectorError::Provider(format!("rpc error {code}: {}", self.message)),
        }
    }
}

#[derive(Debug)]
struct Session {
    child: Child,
    stdin: Arc<AsyncMutex<ChildStdin>>,
    pending: PendingMap,
    closed: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

#[derive(Debug, Clone)]
struct SessionHandles {
    stdin: Arc<AsyncMutex<ChildStdin>>,
    pending: PendingMap,
    closed: Arc<AtomicBool>,
}

impl Session {
    fn handles(&self) -> SessionHandles {
        SessionHandles {
            stdin: Arc::clone(&self.stdin),
            pending: Arc::clone(&self.pending),
            closed: Arc::clone(&self.closed),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Removes a pending entry when its caller stops waiting.
struct PendingGuard<'a> {
    pending: &'a PendingMap,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock_pending(self.pending).remove(&self.id);
    }
}

fn lock_pending(
    pending: &PendingMap,
) -> MutexGuard<'_, HashMap<u64, oneshot::Sender<ConnectorResult<Value>>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

fn fail_pending(pending: &PendingMap, reason: &str) {
    for (_, sender) in lock_pending(pending).drain() {
        if sender
            .send(Err(ConnectorError::ConnectionReset(reason.to_owned())))
            .is_err()
        {
            debug!(reason, "pending caller already gone");
        }
    }
}

/// Connector for providers reached over a message-RPC channel.
#[derive(Debug)]
pub struct MessageRpcConnector {
    provider: ProviderId,
    config: ProcessConfig,
    kill_grace: Duration,
    next_id: AtomicU64,
    session: AsyncMutex<Option<Session>>,
}

impl MessageRpcConnector {
    /// Creates an unconnected connector.
    #[must_use]
    pub fn new(provider: ProviderId, config: ProcessConfig, kill_grace: Duration) -> Self {
        Self {
            provider,
            config,
            kill_grace,
            next_id: AtomicU64::new(1),
            session: AsyncMutex::new(None),
        }
    }

    async fn ensure_connected(&self) -> ConnectorResult<SessionHandles> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref()
            && !session.is_closed()
        {
            return Ok(session.handles());
        }
        if let Some(stale) = guard.take() {
            debug!(provider = %self.provider, "respawning closed message-rpc session");
            self.shut_down(stale).await;
        }
        let session = self.spawn()?;
        let handles = session.handles();
        *guard = Some(session);
        Ok(handles)
    }

    fn spawn(&self) -> ConnectorResult<Session> {
        let mut command = Command::new(self.config.command());
        command
            .args(self.config.args())
            .envs(self.config.env())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(directory) = self.config.working_directory() {
            command.current_dir(directory);
        }

        let mut child = command.spawn().map_err(|err| {
            ConnectorError::ConnectionRefused(format!("spawn {}: {err}", self.config.command()))
        })?;
        let stdin = child.stdin.take().ok_or_else(|| {
            ConnectorError::ConnectionRefused("child stdin unavailable".to_owned())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            ConnectorError::ConnectionRefused("child stdout unavailable".to_owned())
        })?;

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let reader = tokio::spawn(read_replies(
            self.provider.clone(),
            stdout,
            Arc::clone(&pending),
            Arc::clone(&closed),
        ));
        debug!(provider = %self.provider, command = self.config.command(), "message-rpc session started");

        Ok(Session {
            child,
            stdin: Arc::new(AsyncMutex::new(stdin)),
            pending,
            closed,
            reader,
        })
    }

    async fn shut_down(&self, session: Session) {
        let Session {
            mut child,
            stdin,
            pending,
            reader,
            ..
        } = session;
        drop(stdin);
        if tokio::time::timeout(self.kill_grace, child.wait())
            .await
            .is_err()
            && let Err(err) = child.kill().await
        {
            warn!(provider = %self.provider, error = %err, "failed to kill message-rpc child");
        }
        reader.abort();
        fail_pending(&pending, "connector disconnected");
    }

    async fn call(&self, method: &str, params: Option<Value>) -> ConnectorResult<Value> {
        let handles = self.ensure_connected().await?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        lock_pending(&handles.pending).insert(id, sender);
        let _guard = PendingGuard {
            pending: &handles.pending,
            id,
        };
        if handles.closed.load(Ordering::SeqCst) {
            return Err(ConnectorError::ConnectionReset(
                "provider closed its output stream".to_owned(),
            ));
        }

        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        let mut line = serde_json::to_vec(&request)
            .map_err(|err| ConnectorError::InvalidResponse(format!("encode request: {err}")))?;
        line.push(b'\n');
        {
            let mut writer = handles.stdin.lock().await;
            writer
                .write_all(&line)
                .await
                .map_err(|err| ConnectorError::ConnectionReset(format!("write request: {err}")))?;
            writer
                .flush()
                .await
                .map_err(|err| ConnectorError::ConnectionReset(format!("flush request: {err}")))?;
        }
        debug!(provider = %self.provider, id, method, "message-rpc request sent");

        receiver.await.map_err(|_| {
            ConnectorError::ConnectionReset("provider closed before replying".to_owned())
        })?
    }
}

async fn read_replies(
    provider: ProviderId,
    stdout: ChildStdout,
    pending: PendingMap,
    closed: Arc<AtomicBool>,
) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => dispatch_reply(&provider, &line, &pending),
            Ok(None) => {
                debug!(provider = %provider, "message-rpc output stream closed");
                break;
            }
            Err(err) => {
                warn!(provider = %provider, error = %err, "message-rpc read failed");
                break;
            }
        }
    }
    closed.store(true, Ordering::SeqCst);
    fail_pending(&pending, "provider closed its output stream");
}

fn dispatch_reply(provider: &ProviderId, line: &str, pending: &PendingMap) {
    let reply: RpcReply = match serde_json::from_str(line) {
        Ok(reply) => reply,
        Err(err) => {
            warn!(provider = %provider, error = %err, "discarding undecodable reply line");
            return;
        }
    };
    // Notifications carry no id.
    let Some(id) = reply.id else {
        return;
    };
    let Some(sender) = lock_pending(pending).remove(&id) else {
        debug!(provider = %provider, id, "dropping late reply");
        return;
    };
    let result = reply.error.map_or_else(
        || Ok(reply.result.unwrap_or(Value::Null)),
        |error| Err(error.into_connector_error()),
    );
    if sender.send(result).is_err() {
        debug!(provider = %provider, id, "caller stopped waiting");
    }
}

#[async_trait]
impl Connector for MessageRpcConnector {
    fn provider_id(&self) -> &ProviderId {
        &self.provider
    }

    fn transport_kind(&self) -> TransportKind {
        TransportKind::MessageRpc
    }

    async fn connect(&self) -> ConnectorResult<()> {
        self.ensure_connected().await.map(|_| ())
    }

    async fn invoke(&self, task: &Task, workspace: &WorkspaceSnapshot) -> ToolResponse {
        let request = InvocationRequest::invoke(task, workspace);
        invoke_within_deadline(&self.provider, task, async {
            let params = request.to_value()?;
            self.call(METHOD_INVOKE, Some(params))
                .await
                .and_then(decode_reply)
        })
        .await
    }

    async fn health(&self) -> bool {
        self.call(METHOD_HEALTH, None)
            .await
            .and_then(decode_reply)
            .is_ok()
    }

    async fn list_capabilities(&self) -> ConnectorResult<Option<CapabilitySet>> {
        match self.call(METHOD_CAPABILITIES, None).await {
            Ok(listing) => decode_capabilities(listing).map(Some),
            Err(ConnectorError::UnsupportedOperation(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn disconnect(&self) {
        let session = self.session.lock().await.take();
        if let Some(active) = session {
            self.shut_down(active).await;
            debug!(provider = %self.provider, "message-rpc session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::domain::Capability;
    use crate::work::domain::ResponseErrorKind;
    use rstest::rstest;
    use serde_json::json;

    fn connector(command: &str, args: &[&str]) -> MessageRpcConnector {
        let config = ProcessConfig::new(command)
            .expect("valid command")
            .with_args(args.iter().map(|arg| (*arg).to_owned()));
        MessageRpcConnector::new(
            ProviderId::new("rpc").expect("valid provider id"),
            config,
            Duration::from_millis(50),
        )
    }

    #[rstest]
    #[case(CODE_METHOD_NOT_FOUND, ResponseErrorKind::UnsupportedOperation)]
    #[case(CODE_CAPABILITY_UNAVAILABLE, ResponseErrorKind::CapabilityUnavailable)]
    #[case(CODE_RATE_LIMITED, ResponseErrorKind::RateLimited)]
    #[case(-32000, ResponseErrorKind::Provider)]
    fn rpc_error_codes_map_to_error_kinds(#[case] code: i64, #[case] expected: ResponseErrorKind) {
        let error = RpcError {
            code,
            message: "nope".to_owned(),
        };
        assert_eq!(error.into_connector_error().kind(), expected);
    }

    #[test]
    fn late_replies_are_dropped() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let provider = ProviderId::new("rpc").expect("valid provider id");
        dispatch_reply(&provider, r#"{"jsonrpc":"2.0","id":9,"result":1}"#, &pending);
        assert!(lock_pending(&pending).is_empty());
    }

    #[tokio::test]
    async fn unknown_commands_refuse_connection() {
        let rpc = connector("switchyard-test-no-such-binary", &[]);
        let result = rpc.connect().await;
        assert!(matches!(result, Err(ConnectorError::ConnectionRefused(_))));
    }

    #[tokio::test]
    async fn echoed_requests_resolve_their_caller() {
        // `cat` echoes the request line, whose id matches and carries no error.
        let rpc = connector("cat", &[]);
        let task = Task::new(Capability::completion(), json!({"prompt": "hi"}));
        let response = rpc.invoke(&task, &WorkspaceSnapshot::new()).await;
        assert!(response.is_success(), "unexpected failure: {:?}", response.error());
        rpc.disconnect().await;
        rpc.disconnect().await;
    }

    #[tokio::test]
    async fn exited_children_reset_the_connection() {
        let rpc = connector("true", &[]);
        let task = Task::new(Capability::completion(), json!({}))
            .with_timeout(Duration::from_secs(5));
        let response = rpc.invoke(&task, &WorkspaceSnapshot::new()).await;
        assert_eq!(response.error_kind(), Some(ResponseErrorKind::ConnectionReset));
    }
}
