//! Weighting profiles consumed by the fusion engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::FusionError;
use crate::models::indicators::IndicatorKind;

/// Resolved, validated mapping from indicator identity (or kind) to weight.
///
/// Weights are non-negative and need not sum to one; the engine normalizes
/// at fusion time. A profile whose weights are all zero cannot be built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightingProfile {
    name: String,
    indicator_weights: BTreeMap<String, f64>,
    kind_weights: BTreeMap<IndicatorKind, f64>,
}

impl WeightingProfile {
    pub fn new(
        name: impl Into<String>,
        indicator_weights: BTreeMap<String, f64>,
        kind_weights: BTreeMap<IndicatorKind, f64>,
    ) -> Result<Self, FusionError> {
        let profile = Self {
            name: name.into(),
            indicator_weights,
            kind_weights,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn builder(name: impl Into<String>) -> WeightingProfileBuilder {
        WeightingProfileBuilder {
            name: name.into(),
            indicator_weights: BTreeMap::new(),
            kind_weights: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn indicator_weights(&self) -> &BTreeMap<String, f64> {
        &self.indicator_weights
    }

    pub fn kind_weights(&self) -> &BTreeMap<IndicatorKind, f64> {
        &self.kind_weights
    }

    /// Weight for a signal: its explicit indicator weight, else its kind's.
    pub fn weight_for(&self, indicator: &str, kind: IndicatorKind) -> Option<f64> {
        self.indicator_weights
            .get(indicator)
            .or_else(|| self.kind_weights.get(&kind))
            .copied()
    }

    pub fn total_weight(&self) -> f64 {
        self.indicator_weights.values().sum::<f64>() + self.kind_weights.values().sum::<f64>()
    }

    /// Reject negative or non-finite weights, overflowing totals and all-zero profiles.
    pub fn validate(&self) -> Result<(), FusionError> {
        for (indicator, weight) in &self.indicator_weights {
            check_weight(&self.name, indicator, *weight)?;
        }
        for (kind, weight) in &self.kind_weights {
            check_weight(&self.name, kind.as_str(), *weight)?;
        }
        let total = self.total_weight();
        if !total.is_finite() {
            return Err(FusionError::invalid_profile(
                &self.name,
                "total weight is not finite",
            ));
        }
        if total <= 0.0 {
            return Err(FusionError::invalid_profile(
                &self.name,
                "all weights are zero",
            ));
        }
        Ok(())
    }
}

fn check_weight(profile: &str, key: &str, weight: f64) -> Result<(), FusionError> {
    if !weight.is_finite() {
        return Err(FusionError::invalid_profile(
            profile,
            format!("weight for '{}' is not finite", key),
        ));
    }
    if weight < 0.0 {
        return Err(FusionError::invalid_profile(
            profile,
            format!("weight for '{}' is negative ({})", key, weight),
        ));
    }
    Ok(())
}

pub struct WeightingProfileBuilder {
    name: String,
    indicator_weights: BTreeMap<String, f64>,
    kind_weights: BTreeMap<IndicatorKind, f64>,
}

impl WeightingProfileBuilder {
    pub fn indicator(mut self, indicator: impl Into<String>, weight: f64) -> Self {
        self.indicator_weights.insert(indicator.into(), weight);
        self
    }

    pub fn kind(mut self, kind: IndicatorKind, weight: f64) -> Self {
        self.kind_weights.insert(kind, weight);
        self
    }

    pub fn build(self) -> Result<WeightingProfile, FusionError> {
        WeightingProfile::new(self.name, self.indicator_weights, self.kind_weights)
    }
}

/// Ad hoc per-request weights layered over a named profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightOverrides {
    #[serde(default)]
    pub indicators: BTreeMap<String, f64>,
    #[serde(default)]
    pub kinds: BTreeMap<IndicatorKind, f64>,
}

impl WeightOverrides {
    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty() && self.kinds.is_empty()
    }
}
