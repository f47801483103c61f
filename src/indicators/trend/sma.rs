//! SMA (Simple Moving Average) crossover

use crate::common::math;
use crate::indicators::trend::{cross_from_series, CrossValue};
use crate::models::indicators::Candle;

/// Fast SMA against slow SMA (e.g. the 50/200 golden/death cross)
pub fn calculate_sma_cross(candles: &[Candle], fast_period: u32, slow_period: u32) -> Option<CrossValue> {
    if fast_period == 0 || fast_period >= slow_period || candles.len() < slow_period as usize {
        return None;
    }
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let fast = math::sma_series(&closes, fast_period as usize);
    let slow = math::sma_series(&closes, slow_period as usize);
    cross_from_series(&fast, &slow)
}
