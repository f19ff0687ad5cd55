//! Scripted in-memory connector for tests and deterministic local flows.

use super::deadline::invoke_within_deadline;
use crate::connector::ports::{Connector, ConnectorError, ConnectorFactory, ConnectorResult};
use crate::provider::domain::{Capability, CapabilitySet, Provider, ProviderId, TransportKind};
use crate::work::domain::{Task, ToolResponse, WorkspaceSnapshot};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Connector whose replies, delays and health are scripted by the caller.
///
/// Replies are chosen in order from the queue, then by task type, then the
/// default reply.
#[derive(Debug)]
pub struct InMemoryConnector {
    provider: ProviderId,
    transport: TransportKind,
    state: Mutex<ScriptState>,
}

#[derive(Debug)]
struct ScriptState {
    default_reply: ConnectorResult<Value>,
    replies: HashMap<Capability, ConnectorResult<Value>>,
    queued: VecDeque<ConnectorResult<Value>>,
    delay: Duration,
    healthy: bool,
    refuse_connections: bool,
    stall_connections: bool,
    capabilities: Option<CapabilitySet>,
    invoked: Vec<Capability>,
    connects: usize,
    disconnects: usize,
    health_checks: usize,
    listings: usize,
}

impl InMemoryConnector {
    /// Creates a healthy connector echoing its provider id.
    #[must_use]
    pub fn new(provider: ProviderId) -> Self {
        let default_reply = Ok(json!({ "provider": provider.as_str() }));
        Self {
            provider,
            transport: TransportKind::MessageRpc,
            state: Mutex::new(ScriptState {
                default_reply,
                replies: HashMap::new(),
                queued: VecDeque::new(),
                delay: Duration::ZERO,
                healthy: true,
                refuse_connections: false,
                stall_connections: false,
                capabilities: None,
                invoked: Vec::new(),
                connects: 0,
                disconnects: 0,
                health_checks: 0,
                listings: 0,
            }),
        }
    }

    /// Sets the transport kind reported by the connector.
    #[must_use]
    pub const fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the default reply payload.
    pub fn set_reply(&self, payload: Value) {
        self.lock().default_reply = Ok(payload);
    }

    /// Makes every unscripted invocation fail with `error`.
    pub fn set_failure(&self, error: ConnectorError) {
        self.lock().default_reply = Err(error);
    }

    /// Scripts the outcome for tasks of one type.
    pub fn set_reply_for(&self, task_type: Capability, reply: ConnectorResult<Value>) {
        self.lock().replies.insert(task_type, reply);
    }

    /// Queues a one-shot outcome used before any other script.
    pub fn queue(&self, reply: ConnectorResult<Value>) {
        self.lock().queued.push_back(reply);
    }

    /// Delays every invocation by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = delay;
    }

    /// Sets the liveness answer.
    pub fn set_healthy(&self, healthy: bool) {
        self.lock().healthy = healthy;
    }

    /// Makes `connect` fail with a refused connection.
    pub fn refuse_connections(&self, refuse: bool) {
        self.lock().refuse_connections = refuse;
    }

    /// Makes `connect` never complete.
    pub fn stall_connections(&self, stall: bool) {
        self.lock().stall_connections = stall;
    }

    /// Sets the capability listing; `None` means the call is unsupported.
    pub fn set_capabilities(&self, capabilities: Option<CapabilitySet>) {
        self.lock().capabilities = capabilities;
    }

    /// Returns the number of invocations received.
    #[must_use]
    pub fn invocations(&self) -> usize {
        self.lock().invoked.len()
    }

    /// Returns the task types of all invocations, oldest first.
    #[must_use]
    pub fn invoked_task_types(&self) -> Vec<Capability> {
        self.lock().invoked.clone()
    }

    /// Returns the number of `connect` calls.
    #[must_use]
    pub fn connects(&self) -> usize {
        self.lock().connects
    }

    /// Returns the number of `disconnect` calls.
    #[must_use]
    pub fn disconnects(&self) -> usize {
        self.lock().disconnects
    }

    /// Returns the number of liveness checks received.
    #[must_use]
    pub fn health_checks(&self) -> usize {
        self.lock().health_checks
    }

    /// Returns the number of capability listing requests received.
    #[must_use]
    pub fn capability_listings(&self) -> usize {
        self.lock().listings
    }

    fn next_reply(&self, task: &Task) -> (ConnectorResult<Value>, Duration) {
        let mut state = self.lock();
        state.invoked.push(task.task_type().clone());
        let reply = state.queued.pop_front().unwrap_or_else(|| {
            state
                .replies
                .get(task.task_type())
                .unwrap_or(&state.default_reply)
                .clone()
        });
        (reply, state.delay)
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    fn provider_id(&self) -> &ProviderId {
        &self.provider
    }

    fn transport_kind(&self) -> TransportKind {
        self.transport
    }

    async fn connect(&self) -> ConnectorResult<()> {
        let stalled = {
            let mut state = self.lock();
            state.connects += 1;
            if state.refuse_connections {
                return Err(ConnectorError::ConnectionRefused(format!(
                    "{} refuses connections",
                    self.provider
                )));
            }
            state.stall_connections
        };
        if stalled {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn invoke(&self, task: &Task, _workspace: &WorkspaceSnapshot) -> ToolResponse {
        let (reply, delay) = self.next_reply(task);
        invoke_within_deadline(&self.provider, task, async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            reply
        })
        .await
    }

    async fn health(&self) -> bool {
        let (healthy, delay) = {
            let mut state = self.lock();
            state.health_checks += 1;
            (state.healthy, state.delay)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        healthy
    }

    async fn list_capabilities(&self) -> ConnectorResult<Option<CapabilitySet>> {
        let mut state = self.lock();
        state.listings += 1;
        Ok(state.capabilities.clone())
    }

    async fn disconnect(&self) {
        self.lock().disconnects += 1;
    }
}

/// Factory handing out pre-registered in-memory connectors.
#[derive(Debug, Default)]
pub struct InMemoryConnectorFactory {
    connectors: Mutex<HashMap<ProviderId, Arc<InMemoryConnector>>>,
}

impl InMemoryConnectorFactory {
    /// Creates an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connector, replacing any previous one for its provider.
    pub fn insert(&self, connector: Arc<InMemoryConnector>) {
        self.connectors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(connector.provider_id().clone(), connector);
    }

    /// Creates, registers and returns a default connector for `provider`.
    pub fn scripted(&self, provider: &ProviderId) -> Arc<InMemoryConnector> {
        let connector = Arc::new(InMemoryConnector::new(provider.clone()));
        self.insert(Arc::clone(&connector));
        connector
    }

    /// Returns the connector registered for `provider`.
    #[must_use]
    pub fn connector(&self, provider: &ProviderId) -> Option<Arc<InMemoryConnector>> {
        self.connectors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider)
            .cloned()
    }
}

impl ConnectorFactory for InMemoryConnectorFactory {
    fn build(&self, provider: &Provider) -> ConnectorResult<Arc<dyn Connector>> {
        let connector = self.connector(provider.id()).ok_or_else(|| {
            ConnectorError::ConnectionRefused(format!("no connector scripted for {}", provider.id()))
        })?;
        Ok(connector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::domain::ResponseErrorKind;

    fn connector() -> InMemoryConnector {
        InMemoryConnector::new(ProviderId::new("mem").expect("valid provider id"))
    }

    #[tokio::test]
    async fn queued_replies_take_precedence() {
        let connector = connector();
        connector.set_reply_for(Capability::planning(), Ok(json!("typed")));
        connector.queue(Err(ConnectorError::RateLimited("slow down".to_owned())));
        let task = Task::new(Capability::planning(), json!({}));

        let first = connector.invoke(&task, &WorkspaceSnapshot::new()).await;
        let second = connector.invoke(&task, &WorkspaceSnapshot::new()).await;

        assert_eq!(first.error_kind(), Some(ResponseErrorKind::RateLimited));
        assert_eq!(second.payload(), Some(&json!("typed")));
        assert_eq!(connector.invocations(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delays_respect_the_task_deadline() {
        let connector = connector();
        connector.set_delay(Duration::from_secs(10));
        let task = Task::new(Capability::completion(), json!({}))
            .with_timeout(Duration::from_millis(20));

        let response = connector.invoke(&task, &WorkspaceSnapshot::new()).await;

        assert_eq!(response.error_kind(), Some(ResponseErrorKind::Timeout));
    }
}
