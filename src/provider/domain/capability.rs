//! Capability names and capability sets.

use super::ProviderDomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Capability offered by providers that accept any task as a last resort.
const GENERIC_CAPABILITY: &str = "generic";

/// A named task type (or family) a provider can perform.
///
/// Task types form an open enumeration: the well-known constructors cover the
/// common cases, and [`Capability::new`] accepts any validated name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(String);

impl Capability {
    /// Creates a validated capability name.
    ///
    /// The input is trimmed and lowercased. Only characters in `[a-z0-9_.-]`
    /// are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderDomainError`] when the name is empty or contains
    /// invalid characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ProviderDomainError> {
        let normalized = value.into().trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(ProviderDomainError::EmptyCapability);
        }

        let is_valid = normalized.chars().all(|character| {
            character.is_ascii_lowercase()
                || character.is_ascii_digit()
                || matches!(character, '_' | '-' | '.')
        });
        if !is_valid {
            return Err(ProviderDomainError::InvalidCapability(normalized));
        }

        Ok(Self(normalized))
    }

    fn well_known(value: &'static str) -> Self {
        Self(value.to_owned())
    }

    /// Planning tasks.
    #[must_use]
    pub fn planning() -> Self {
        Self::well_known("planning")
    }

    /// Code completion tasks.
    #[must_use]
    pub fn completion() -> Self {
        Self::well_known("completion")
    }

    /// Analysis tasks.
    #[must_use]
    pub fn analysis() -> Self {
        Self::well_known("analysis")
    }

    /// Refactoring tasks.
    #[must_use]
    pub fn refactoring() -> Self {
        Self::well_known("refactoring")
    }

    /// Deployment tasks.
    #[must_use]
    pub fn deployment() -> Self {
        Self::well_known("deployment")
    }

    /// The relaxed fallback capability used for degraded plans.
    #[must_use]
    pub fn generic() -> Self {
        Self::well_known(GENERIC_CAPABILITY)
    }

    /// Returns whether this is the generic fallback capability.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.0 == GENERIC_CAPABILITY
    }

    /// Returns the capability name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Ordered set of capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    /// Creates an empty capability set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Parses a set from raw capability names.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProviderDomainError`] raised by
    /// [`Capability::new`].
    pub fn parse<I, S>(names: I) -> Result<Self, ProviderDomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().map(Capability::new).collect()
    }

    /// Adds a capability, returning whether it was newly inserted.
    pub fn insert(&mut self, capability: Capability) -> bool {
        self.0.insert(capability)
    }

    /// Returns whether the set contains `capability`.
    #[must_use]
    pub fn contains(&self, capability: &Capability) -> bool {
        self.0.contains(capability)
    }

    /// Returns whether this set is a superset of `required`.
    #[must_use]
    pub fn covers(&self, required: &Self) -> bool {
        self.0.is_superset(&required.0)
    }

    /// Returns the capabilities of `required` absent from this set.
    #[must_use]
    pub fn missing(&self, required: &Self) -> Self {
        Self(required.0.difference(&self.0).cloned().collect())
    }

    /// Returns the number of capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates capabilities in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.0.iter()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CapabilitySet {
    type Item = &'a Capability;
    type IntoIter = std::collections::btree_set::Iter<'a, Capability>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("{")?;
        for (position, capability) in self.0.iter().enumerate() {
            if position > 0 {
                formatter.write_str(", ")?;
            }
            formatter.write_str(capability.as_str())?;
        }
        formatter.write_str("}")
    }
}
