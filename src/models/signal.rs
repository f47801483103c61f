use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::indicators::IndicatorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Bearish,
    Neutral,
    Bullish,
}

impl Direction {
    /// -1 for bearish, 0 for neutral, +1 for bullish.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Bearish => -1.0,
            Direction::Neutral => 0.0,
            Direction::Bullish => 1.0,
        }
    }

    pub fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Direction::Bullish
        } else if value < 0.0 {
            Direction::Bearish
        } else {
            Direction::Neutral
        }
    }
}

/// One indicator reading on the common directional scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSignal {
    pub indicator: String,
    pub kind: IndicatorKind,
    pub direction: Direction,
    /// Strength of the reading, in [0, 1].
    pub magnitude: f64,
    /// How much history backed the reading, in [0, 1]. Zero means no data.
    pub reliability: f64,
}

impl NormalizedSignal {
    pub fn new(
        indicator: impl Into<String>,
        kind: IndicatorKind,
        direction: Direction,
        magnitude: f64,
        reliability: f64,
    ) -> Self {
        Self {
            indicator: indicator.into(),
            kind,
            direction,
            magnitude,
            reliability,
        }
    }

    /// Neutral, zero-reliability placeholder for an indicator without data.
    pub fn no_data(indicator: impl Into<String>, kind: IndicatorKind) -> Self {
        Self::new(indicator, kind, Direction::Neutral, 0.0, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongSell,
    Sell,
    Hold,
    Buy,
    StrongBuy,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StrongSell => "strong_sell",
            Recommendation::Sell => "sell",
            Recommendation::Hold => "hold",
            Recommendation::Buy => "buy",
            Recommendation::StrongBuy => "strong_buy",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Reliability was zero: missing, invalid or failed indicator.
    NoData,
    /// Neither the indicator nor its kind carries a weight in the profile.
    Unweighted,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::NoData => "no_data",
            ExclusionReason::Unweighted => "unweighted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionStatus {
    Included,
    Excluded(ExclusionReason),
}

/// How one input signal took part in a fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    pub indicator: String,
    pub kind: IndicatorKind,
    pub direction: Direction,
    pub magnitude: f64,
    pub reliability: f64,
    pub status: AttributionStatus,
    /// Profile weight before reliability scaling, when one applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_weight: Option<f64>,
    pub effective_weight: f64,
    /// Signed share of the composite score carried by this signal.
    pub contribution: f64,
}

impl Attribution {
    pub fn is_included(&self) -> bool {
        matches!(self.status, AttributionStatus::Included)
    }
}

/// Composite verdict of one fusion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub composite_score: f64,
    pub recommendation: Recommendation,
    pub confidence: f64,
    /// Share of directional evidence that agrees with the score's sign.
    pub agreement: f64,
    /// Sum of effective weights over included signals.
    pub total_weight: f64,
    pub insufficient_evidence: bool,
    pub profile: String,
    pub attribution: Vec<Attribution>,
    pub evaluated_at: DateTime<Utc>,
}

impl FusionResult {
    pub fn direction(&self) -> Direction {
        Direction::from_sign(self.composite_score)
    }

    pub fn included(&self) -> impl Iterator<Item = &Attribution> {
        self.attribution.iter().filter(|a| a.is_included())
    }

    pub fn excluded(&self) -> impl Iterator<Item = &Attribution> {
        self.attribution.iter().filter(|a| !a.is_included())
    }

    /// Tag the result with the instrument and last price it was computed for.
    pub fn for_instrument(self, instrument: impl Into<String>, price: Option<f64>) -> Self {
        Self {
            instrument: Some(instrument.into()),
            price,
            ..self
        }
    }
}
