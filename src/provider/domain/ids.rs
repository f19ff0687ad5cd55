//! Identifier type for capability providers.

use super::ProviderDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a provider identifier.
const MAX_PROVIDER_ID_LENGTH: usize = 100;

/// Stable identifier, unique per discovered provider instance.
///
/// Identifiers are ordered so that routing tie-breaks are reproducible.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    /// Creates a validated provider identifier.
    ///
    /// The input is trimmed and lowercased. Only characters in
    /// `[a-z0-9_-]` are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderDomainError`] when validation fails.
    pub fn new(value: impl Into<String>) -> Result<Self, ProviderDomainError> {
        let normalized = value.into().trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(ProviderDomainError::EmptyProviderId);
        }

        let is_valid = normalized.chars().all(|character| {
            character.is_ascii_lowercase()
                || character.is_ascii_digit()
                || character == '_'
                || character == '-'
        });
        if !is_valid {
            return Err(ProviderDomainError::InvalidProviderId(normalized));
        }

        if normalized.len() > MAX_PROVIDER_ID_LENGTH {
            return Err(ProviderDomainError::ProviderIdTooLong(normalized));
        }

        Ok(Self(normalized))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProviderId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
