//! Stored user and team preference weights.

use crate::provider::domain::{Capability, ProviderId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How overrides move preference weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceConfig {
    /// Added to the chosen provider's weight on each override.
    pub override_boost: f64,
    /// Subtracted from every other planned provider's weight.
    pub override_decay: f64,
    /// Lowest stored weight.
    pub min_weight: f64,
    /// Highest stored weight.
    pub max_weight: f64,
}

impl Default for PreferenceConfig {
    fn default() -> Self {
        Self {
            override_boost: 0.25,
            override_decay: 0.05,
            min_weight: 0.0,
            max_weight: 1.0,
        }
    }
}

/// Preference weight per task type and provider. Unset pairs weigh zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceTable {
    config: PreferenceConfig,
    weights: BTreeMap<Capability, BTreeMap<ProviderId, f64>>,
}

impl PreferenceTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new(config: PreferenceConfig) -> Self {
        Self {
            config,
            weights: BTreeMap::new(),
        }
    }

    /// Returns the weight for `provider` on `task_type`.
    #[must_use]
    pub fn weight(&self, task_type: &Capability, provider: &ProviderId) -> f64 {
        self.weights
            .get(task_type)
            .and_then(|providers| providers.get(provider))
            .copied()
            .unwrap_or(0.0)
    }

    /// Stores an explicit weight, clamped to the configured range.
    pub fn set(&mut self, task_type: Capability, provider: ProviderId, weight: f64) {
        let clamped = self.clamp(weight);
        self.weights
            .entry(task_type)
            .or_default()
            .insert(provider, clamped);
    }

    /// Records that the user picked `chosen` over the `others` for a task of
    /// `task_type`.
    #[expect(
        clippy::float_arithmetic,
        reason = "weights move by fixed floating-point steps"
    )]
    pub fn record_override<'a>(
        &mut self,
        task_type: &Capability,
        chosen: &ProviderId,
        others: impl IntoIterator<Item = &'a ProviderId>,
    ) {
        for other in others {
            if other != chosen {
                let lowered = self.weight(task_type, other) - self.config.override_decay;
                self.set(task_type.clone(), other.clone(), lowered);
            }
        }
        let raised = self.weight(task_type, chosen) + self.config.override_boost;
        self.set(task_type.clone(), chosen.clone(), raised);
    }

    const fn clamp(&self, weight: f64) -> f64 {
        if weight.is_nan() {
            return self.config.min_weight;
        }
        weight.clamp(self.config.min_weight, self.config.max_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> ProviderId {
        ProviderId::new(name).expect("valid provider id")
    }

    #[test]
    #[expect(clippy::float_arithmetic, reason = "approximate weight comparison")]
    fn overrides_raise_the_choice_and_lower_the_rest() {
        let mut table = PreferenceTable::new(PreferenceConfig::default());
        table.set(Capability::planning(), id("beta"), 0.5);

        table.record_override(&Capability::planning(), &id("alpha"), [&id("alpha"), &id("beta")]);

        assert!((table.weight(&Capability::planning(), &id("alpha")) - 0.25).abs() < 1e-9);
        assert!((table.weight(&Capability::planning(), &id("beta")) - 0.45).abs() < 1e-9);
        assert!(table.weight(&Capability::completion(), &id("alpha")).abs() < 1e-9);
    }

    #[test]
    #[expect(clippy::float_arithmetic, reason = "approximate weight comparison")]
    fn weights_stay_within_the_configured_range() {
        let mut table = PreferenceTable::new(PreferenceConfig::default());
        for _ in 0..10 {
            table.record_override(&Capability::planning(), &id("alpha"), [&id("beta")]);
        }

        assert!((table.weight(&Capability::planning(), &id("alpha")) - 1.0).abs() < 1e-9);
        assert!(table.weight(&Capability::planning(), &id("beta")).abs() < 1e-9);
    }
}
