//! Williams %R

use crate::common::math;
use crate::models::indicators::Candle;

/// %R = -100 * (highest high - close) / (highest high - lowest low), in [-100, 0]
pub fn calculate_williams_r(candles: &[Candle], period: u32) -> Option<f64> {
    let period = period as usize;
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
    let highest = math::highest(&highs, period)?;
    let lowest = math::lowest(&lows, period)?;
    let close = candles.last()?.close;

    let range = highest - lowest;
    if range == 0.0 {
        return Some(-50.0);
    }
    Some(-100.0 * (highest - close) / range)
}
