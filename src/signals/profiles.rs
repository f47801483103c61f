//! Named weighting profiles and their resolution

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::FusionError;
use crate::models::indicators::IndicatorKind;
use crate::models::profile::{WeightOverrides, WeightingProfile};
use crate::signals::categories::KindWeights;

pub const DEFAULT_PROFILE: &str = "balanced";

fn default_true() -> bool {
    true
}

/// Configured shape of a named profile, before resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDefinition {
    #[serde(default)]
    pub indicators: BTreeMap<String, f64>,
    #[serde(default)]
    pub kinds: BTreeMap<IndicatorKind, f64>,
    /// Fill kinds this profile leaves out from the registry defaults.
    #[serde(default = "default_true")]
    pub inherit_defaults: bool,
}

impl Default for ProfileDefinition {
    fn default() -> Self {
        Self {
            indicators: BTreeMap::new(),
            kinds: BTreeMap::new(),
            inherit_defaults: true,
        }
    }
}

impl ProfileDefinition {
    pub fn with_kinds(kinds: impl IntoIterator<Item = (IndicatorKind, f64)>) -> Self {
        Self {
            indicators: BTreeMap::new(),
            kinds: kinds.into_iter().collect(),
            inherit_defaults: false,
        }
    }

    pub fn indicator(mut self, indicator: impl Into<String>, weight: f64) -> Self {
        self.indicators.insert(indicator.into(), weight);
        self
    }
}

/// Profiles shipped with the engine.
pub fn builtin_profiles() -> BTreeMap<String, ProfileDefinition> {
    use IndicatorKind::*;

    BTreeMap::from([
        (DEFAULT_PROFILE.to_string(), ProfileDefinition::default()),
        (
            "conservative".to_string(),
            ProfileDefinition::with_kinds([
                (Oscillator, 0.15),
                (Trend, 0.45),
                (Volatility, 0.25),
                (Volume, 0.15),
            ]),
        ),
        (
            "momentum-focused".to_string(),
            ProfileDefinition::with_kinds([
                (Oscillator, 0.50),
                (Trend, 0.20),
                (Volatility, 0.10),
                (Volume, 0.20),
            ]),
        ),
        (
            "trend-following".to_string(),
            ProfileDefinition::with_kinds([
                (Oscillator, 0.10),
                (Trend, 0.60),
                (Volatility, 0.10),
                (Volume, 0.20),
            ])
            .indicator("sma_cross_50_200", 1.2),
        ),
    ])
}

/// Immutable set of named profiles, shared read-only after startup.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    definitions: BTreeMap<String, ProfileDefinition>,
    defaults: KindWeights,
    default_profile: String,
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self {
            definitions: builtin_profiles(),
            defaults: KindWeights::default(),
            default_profile: DEFAULT_PROFILE.to_string(),
        }
    }
}

impl ProfileRegistry {
    /// Build a registry and check that every profile resolves.
    pub fn new(
        definitions: BTreeMap<String, ProfileDefinition>,
        defaults: KindWeights,
        default_profile: impl Into<String>,
    ) -> Result<Self, FusionError> {
        let registry = Self {
            definitions,
            defaults,
            default_profile: default_profile.into(),
        };
        if !registry.definitions.contains_key(&registry.default_profile) {
            return Err(FusionError::UnknownProfile(registry.default_profile.clone()));
        }
        for name in registry.definitions.keys() {
            registry.resolve(Some(name), None)?;
        }
        Ok(registry)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn default_profile(&self) -> &str {
        &self.default_profile
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Resolve a named (or the default) profile with optional overrides.
    ///
    /// Precedence, lowest first: registry kind defaults (when the profile
    /// inherits them), the profile's own weights, the request overrides.
    pub fn resolve(
        &self,
        name: Option<&str>,
        overrides: Option<&WeightOverrides>,
    ) -> Result<WeightingProfile, FusionError> {
        let name = name.unwrap_or(&self.default_profile);
        let definition = self
            .definitions
            .get(name)
            .ok_or_else(|| FusionError::UnknownProfile(name.to_string()))?;

        let mut kind_weights = if definition.inherit_defaults {
            self.defaults.as_map()
        } else {
            BTreeMap::new()
        };
        kind_weights.extend(definition.kinds.iter().map(|(k, w)| (*k, *w)));
        let mut indicator_weights = definition.indicators.clone();

        if let Some(overrides) = overrides.filter(|o| !o.is_empty()) {
            debug!(
                profile = name,
                indicators = overrides.indicators.len(),
                kinds = overrides.kinds.len(),
                "Applying weight overrides"
            );
            kind_weights.extend(overrides.kinds.iter().map(|(k, w)| (*k, *w)));
            indicator_weights.extend(overrides.indicators.iter().map(|(i, w)| (i.clone(), *w)));
        }

        WeightingProfile::new(name, indicator_weights, kind_weights)
    }
}
