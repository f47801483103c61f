//! EMA (Exponential Moving Average) indicator

use crate::common::math;
use crate::indicators::trend::{cross_from_series, CrossValue};
use crate::models::indicators::Candle;

/// Fast EMA against slow EMA (e.g. EMA 20 crossing above/below EMA 50)
pub fn calculate_ema_cross(candles: &[Candle], fast_period: u32, slow_period: u32) -> Option<CrossValue> {
    if fast_period == 0 || fast_period >= slow_period || candles.len() < slow_period as usize {
        return None;
    }
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let fast = math::ema_series(&closes, fast_period as usize);
    let slow = math::ema_series(&closes, slow_period as usize);
    cross_from_series(&fast, &slow)
}
