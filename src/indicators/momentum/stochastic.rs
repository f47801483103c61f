//! Stochastic oscillator (slow %K)

use crate::common::math;
use crate::models::indicators::Candle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochasticValue {
    /// Raw %K of the latest bar.
    pub k: f64,
    /// %D: SMA of %K over the smoothing period.
    pub d: f64,
}

fn percent_k(candles: &[Candle], end: usize, period: usize) -> f64 {
    let window = &candles[end + 1 - period..=end];
    let highest = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let lowest = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let range = highest - lowest;
    if range == 0.0 {
        return 50.0;
    }
    100.0 * (candles[end].close - lowest) / range
}

/// %K = 100 * (close - lowest low) / (highest high - lowest low)
pub fn calculate_stochastic(
    candles: &[Candle],
    k_period: u32,
    d_period: u32,
) -> Option<StochasticValue> {
    let k_period = k_period as usize;
    let d_period = d_period as usize;
    if k_period == 0 || d_period == 0 || candles.len() < k_period + d_period - 1 {
        return None;
    }

    let k_values: Vec<f64> = (k_period - 1..candles.len())
        .map(|end| percent_k(candles, end, k_period))
        .collect();

    Some(StochasticValue {
        k: *k_values.last()?,
        d: math::sma(&k_values, d_period)?,
    })
}
