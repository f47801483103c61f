//! OBV (On-Balance Volume) against its moving average

use crate::common::math;
use crate::models::indicators::Candle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObvValue {
    pub obv: f64,
    /// SMA of OBV over the period.
    pub baseline: f64,
    /// SMA of raw volume over the period.
    pub average_volume: f64,
}

/// Cumulative OBV series starting at zero on the first bar.
pub fn obv_series(candles: &[Candle]) -> Vec<f64> {
    let mut series = Vec::with_capacity(candles.len());
    let mut obv = 0.0;
    if !candles.is_empty() {
        series.push(obv);
    }
    for pair in candles.windows(2) {
        let (prev, current) = (&pair[0], &pair[1]);
        if current.close > prev.close {
            obv += current.volume;
        } else if current.close < prev.close {
            obv -= current.volume;
        }
        series.push(obv);
    }
    series
}

pub fn calculate_obv(candles: &[Candle], period: u32) -> Option<ObvValue> {
    let period = period as usize;
    if period == 0 || candles.len() < period + 1 {
        return None;
    }
    let series = obv_series(candles);
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

    Some(ObvValue {
        obv: *series.last()?,
        baseline: math::sma(&series, period)?,
        average_volume: math::sma(&volumes, period)?,
    })
}
