//! Factory port building connectors from provider configuration.

use super::{Connector, ConnectorResult};
use crate::provider::domain::Provider;
use std::sync::Arc;

/// Builds a connector for a registered provider.
pub trait ConnectorFactory: Send + Sync {
    /// Creates an unconnected connector from the provider's connection
    /// config.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::UnsupportedOperation`](super::ConnectorError)
    /// when the factory cannot serve the provider's transport kind.
    fn build(&self, provider: &Provider) -> ConnectorResult<Arc<dyn Connector>>;
}
