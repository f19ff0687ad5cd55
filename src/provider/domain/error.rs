//! Error types for provider domain validation and parsing.

use super::TransportKind;
use thiserror::Error;

/// Errors returned while constructing provider domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderDomainError {
    /// The provider identifier is empty after trimming.
    #[error("provider id must not be empty")]
    EmptyProviderId,

    /// The provider identifier contains characters outside `[a-z0-9_-]`.
    #[error(
        "provider id '{0}' contains invalid characters (only lowercase alphanumeric, '-' and '_' allowed)"
    )]
    InvalidProviderId(String),

    /// The provider identifier exceeds the 100-character limit.
    #[error("provider id exceeds 100 character limit: {0}")]
    ProviderIdTooLong(String),

    /// A capability name is empty after trimming.
    #[error("capability name must not be empty")]
    EmptyCapability,

    /// A capability name contains characters outside `[a-z0-9_.-]`.
    #[error("capability '{0}' contains invalid characters")]
    InvalidCapability(String),

    /// A process command is empty.
    #[error("process command must not be empty")]
    EmptyCommand,

    /// A process working directory is empty after trimming.
    #[error("process working directory must not be empty when provided")]
    EmptyWorkingDirectory,

    /// The plugin identifier of a plugin-command provider is empty.
    #[error("plugin id must not be empty")]
    EmptyPluginId,

    /// The command name of a plugin-command provider is empty.
    #[error("plugin command must not be empty")]
    EmptyPluginCommand,

    /// The base URL of a direct-network provider is empty.
    #[error("network base URL must not be empty")]
    EmptyBaseUrl,

    /// The base URL does not have an `http://` or `https://` prefix.
    #[error("network base URL '{0}' must start with 'http://' or 'https://'")]
    InvalidBaseUrl(String),

    /// The declared transport kind disagrees with the connection config.
    #[error("transport kind {declared} does not match connection config for {configured}")]
    TransportMismatch {
        /// Transport kind passed at registration.
        declared: TransportKind,
        /// Transport kind implied by the connection config.
        configured: TransportKind,
    },
}

/// Error returned while parsing a transport kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown transport kind: {0}")]
pub struct ParseTransportKindError(pub String);

/// Error returned while parsing a health state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown provider health state: {0}")]
pub struct ParseHealthStateError(pub String);
