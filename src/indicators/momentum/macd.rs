//! MACD (Moving Average Convergence Divergence) indicator

use crate::common::math;
use crate::indicators::trend::detect_crossover;
use crate::models::indicators::Candle;
use crate::models::signal::Direction;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
    /// MACD line crossed its signal line on the latest bar.
    pub crossed: Option<Direction>,
}

/// Calculate MACD indicator
///
/// MACD = EMA(fast) - EMA(slow)
/// Signal = EMA(signal) of MACD
/// Histogram = MACD - Signal
pub fn calculate_macd(
    candles: &[Candle],
    fast_period: u32,
    slow_period: u32,
    signal_period: u32,
) -> Option<MacdValue> {
    let (fast, slow, signal) = (
        fast_period as usize,
        slow_period as usize,
        signal_period as usize,
    );
    if fast == 0 || fast >= slow || signal == 0 || candles.len() < slow + signal - 1 {
        return None;
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let fast_ema = math::ema_series(&closes, fast);
    let slow_ema = math::ema_series(&closes, slow);

    // Both series end on the latest bar; the fast one starts earlier.
    let offset = slow - fast;
    let macd_line: Vec<f64> = slow_ema
        .iter()
        .enumerate()
        .map(|(i, slow_value)| fast_ema[i + offset] - slow_value)
        .collect();

    let signal_line = math::ema_series(&macd_line, signal);
    let last = signal_line.len().checked_sub(1)?;
    let histogram = |i: usize| macd_line[i + signal - 1] - signal_line[i];

    let previous = last.checked_sub(1).map(histogram);
    let current = histogram(last);

    Some(MacdValue {
        macd: macd_line[last + signal - 1],
        signal: signal_line[last],
        histogram: current,
        crossed: detect_crossover(previous, current),
    })
}
