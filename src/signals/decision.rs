//! Composite score to recommendation bands

use serde::{Deserialize, Serialize};

use crate::error::FusionError;
use crate::models::signal::Recommendation;

/// Band edges on the composite score.
///
/// `score <= strong_sell` is a strong sell, `score <= sell` a sell,
/// `score >= strong_buy` a strong buy, `score >= buy` a buy and anything in
/// between a hold. Validation keeps `sell < 0 < buy`, so a zero score is
/// always a hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    pub strong_sell: f64,
    pub sell: f64,
    pub buy: f64,
    pub strong_buy: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            strong_sell: -0.6,
            sell: -0.2,
            buy: 0.2,
            strong_buy: 0.6,
        }
    }
}

impl RecommendationThresholds {
    pub fn new(strong_sell: f64, sell: f64, buy: f64, strong_buy: f64) -> Result<Self, FusionError> {
        let thresholds = Self {
            strong_sell,
            sell,
            buy,
            strong_buy,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<(), FusionError> {
        let edges = [self.strong_sell, self.sell, self.buy, self.strong_buy];
        if edges.iter().any(|e| !e.is_finite() || e.abs() > 1.0) {
            return Err(FusionError::InvalidThresholds(
                "thresholds must be finite and within [-1, 1]".to_string(),
            ));
        }
        if !(self.strong_sell <= self.sell && self.sell < 0.0) {
            return Err(FusionError::InvalidThresholds(format!(
                "expected strong_sell <= sell < 0, got {} / {}",
                self.strong_sell, self.sell
            )));
        }
        if !(0.0 < self.buy && self.buy <= self.strong_buy) {
            return Err(FusionError::InvalidThresholds(format!(
                "expected 0 < buy <= strong_buy, got {} / {}",
                self.buy, self.strong_buy
            )));
        }
        Ok(())
    }

    pub fn recommend(&self, score: f64) -> Recommendation {
        if score <= self.strong_sell {
            Recommendation::StrongSell
        } else if score <= self.sell {
            Recommendation::Sell
        } else if score >= self.strong_buy {
            Recommendation::StrongBuy
        } else if score >= self.buy {
            Recommendation::Buy
        } else {
            Recommendation::Hold
        }
    }
}
