//! RSI (Relative Strength Index) indicator

use crate::models::indicators::Candle;

/// Calculate RSI with Wilder smoothing
///
/// RSI = 100 - (100 / (1 + RS))
/// RS = Average Gain / Average Loss
pub fn calculate_rsi(candles: &[Candle], period: u32) -> Option<f64> {
    let period = period as usize;
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let changes: Vec<f64> = candles
        .windows(2)
        .map(|pair| pair[1].close - pair[0].close)
        .collect();

    let mut avg_gain = changes[..period].iter().map(|c| c.max(0.0)).sum::<f64>() / period as f64;
    let mut avg_loss = changes[..period].iter().map(|c| (-c).max(0.0)).sum::<f64>() / period as f64;

    for change in &changes[period..] {
        avg_gain = (avg_gain * (period as f64 - 1.0) + change.max(0.0)) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + (-change).max(0.0)) / period as f64;
    }

    if avg_loss == 0.0 {
        // Flat series sits at the midpoint; only gains pins it at the top.
        return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}
