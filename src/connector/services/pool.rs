//! Pool of live connectors keyed by provider.

use crate::connector::ports::{Connector, ConnectorError, ConnectorFactory, ConnectorResult};
use crate::provider::domain::{Provider, ProviderId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Caches one connected connector per provider.
#[derive(Clone)]
pub struct ConnectorPool {
    factory: Arc<dyn ConnectorFactory>,
    connectors: Arc<RwLock<HashMap<ProviderId, Arc<dyn Connector>>>>,
}

impl std::fmt::Debug for ConnectorPool {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ConnectorPool")
            .finish_non_exhaustive()
    }
}

impl ConnectorPool {
    /// Creates an empty pool backed by `factory`.
    #[must_use]
    pub fn new(factory: Arc<dyn ConnectorFactory>) -> Self {
        Self {
            factory,
            connectors: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the cached connector for `id`, if any.
    pub async fn get(&self, id: &ProviderId) -> Option<Arc<dyn Connector>> {
        self.connectors.read().await.get(id).cloned()
    }

    /// Returns the cached connector for `provider`, building and connecting
    /// one on first use.
    ///
    /// # Errors
    ///
    /// Returns factory or connection errors; nothing is cached on failure.
    pub async fn get_or_create(&self, provider: &Provider) -> ConnectorResult<Arc<dyn Connector>> {
        if let Some(existing) = self.get(provider.id()).await {
            return Ok(existing);
        }

        let created = self.factory.build(provider)?;
        created.connect().await?;

        let mut connectors = self.connectors.write().await;
        if let Some(existing) = connectors.get(provider.id()).cloned() {
            drop(connectors);
            created.disconnect().await;
            return Ok(existing);
        }
        connectors.insert(provider.id().clone(), Arc::clone(&created));
        debug!(provider = %provider.id(), transport = %created.transport_kind(), "connector created");
        Ok(created)
    }

    /// Like [`Self::get_or_create`], but gives up once `deadline` passes.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Timeout`] when building or connecting is
    /// still unfinished at `deadline`, and factory or connection errors
    /// otherwise.
    pub async fn get_or_create_before(
        &self,
        provider: &Provider,
        deadline: Instant,
    ) -> ConnectorResult<Arc<dyn Connector>> {
        let started = Instant::now();
        tokio::time::timeout_at(deadline, self.get_or_create(provider))
            .await
            .unwrap_or_else(|_| Err(ConnectorError::timeout(started.elapsed())))
    }

    /// Disconnects and forgets the connector for `id`.
    pub async fn remove(&self, id: &ProviderId) {
        let removed = self.connectors.write().await.remove(id);
        if let Some(connector) = removed {
            connector.disconnect().await;
            debug!(provider = %id, "connector removed");
        }
    }

    /// Disconnects every cached connector.
    pub async fn shutdown(&self) {
        let drained: Vec<_> = self.connectors.write().await.drain().collect();
        for (_, connector) in drained {
            connector.disconnect().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::adapters::InMemoryConnectorFactory;
    use std::time::Duration;
    use crate::provider::domain::{CapabilitySet, ConnectionConfig, ProviderDescriptor};
    use chrono::Utc;
    use rstest::{fixture, rstest};

    fn provider(name: &str) -> Provider {
        let descriptor = ProviderDescriptor::from_connection(
            ProviderId::new(name).expect("valid provider id"),
            ConnectionConfig::message_rpc("assistant").expect("config"),
            CapabilitySet::new(),
        );
        Provider::new(descriptor, Utc::now())
    }

    #[fixture]
    fn factory() -> Arc<InMemoryConnectorFactory> {
        Arc::new(InMemoryConnectorFactory::new())
    }

    #[rstest]
    #[tokio::test]
    async fn connectors_are_built_once(factory: Arc<InMemoryConnectorFactory>) {
        let alpha = provider("alpha");
        let scripted = factory.scripted(alpha.id());
        let pool = ConnectorPool::new(factory.clone());

        pool.get_or_create(&alpha).await.expect("first");
        pool.get_or_create(&alpha).await.expect("second");

        assert_eq!(scripted.connects(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_connects_are_not_cached(factory: Arc<InMemoryConnectorFactory>) {
        let alpha = provider("alpha");
        factory.scripted(alpha.id()).refuse_connections(true);
        let pool = ConnectorPool::new(factory.clone());

        let result = pool.get_or_create(&alpha).await;

        assert!(matches!(result, Err(ConnectorError::ConnectionRefused(_))));
        assert!(pool.get(alpha.id()).await.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn stalled_connects_time_out_at_the_deadline(factory: Arc<InMemoryConnectorFactory>) {
        let alpha = provider("alpha");
        factory.scripted(alpha.id()).stall_connections(true);
        let pool = ConnectorPool::new(factory.clone());

        let result = pool
            .get_or_create_before(&alpha, Instant::now() + Duration::from_millis(50))
            .await;

        assert!(matches!(result, Err(ConnectorError::Timeout(_))));
        assert!(pool.get(alpha.id()).await.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn remove_disconnects(factory: Arc<InMemoryConnectorFactory>) {
        let alpha = provider("alpha");
        let scripted = factory.scripted(alpha.id());
        let pool = ConnectorPool::new(factory.clone());
        pool.get_or_create(&alpha).await.expect("created");

        pool.remove(alpha.id()).await;
        pool.remove(alpha.id()).await;

        assert_eq!(scripted.disconnects(), 1);
        assert!(pool.get(alpha.id()).await.is_none());
    }
}
