//! Indicator kind default weights

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::indicators::IndicatorKind;

/// Registry-level fallback weight per indicator kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindWeights {
    pub oscillator: f64,
    pub trend: f64,
    pub volatility: f64,
    pub volume: f64,
}

impl Default for KindWeights {
    fn default() -> Self {
        Self {
            oscillator: 0.25,
            trend: 0.35,
            volatility: 0.20,
            volume: 0.20,
        }
    }
}

impl KindWeights {
    /// Get weight for a kind
    pub fn get(&self, kind: IndicatorKind) -> f64 {
        match kind {
            IndicatorKind::Oscillator => self.oscillator,
            IndicatorKind::Trend => self.trend,
            IndicatorKind::Volatility => self.volatility,
            IndicatorKind::Volume => self.volume,
        }
    }

    pub fn as_map(&self) -> BTreeMap<IndicatorKind, f64> {
        IndicatorKind::all()
            .into_iter()
            .map(|kind| (kind, self.get(kind)))
            .collect()
    }

    pub fn total(&self) -> f64 {
        self.oscillator + self.trend + self.volatility + self.volume
    }
}
