//! Trend indicators: SMA and EMA crossovers

pub mod ema;
pub mod sma;

pub use ema::*;
pub use sma::*;

use crate::models::signal::Direction;

/// Fast and slow moving averages at the latest bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossValue {
    pub fast: f64,
    pub slow: f64,
    /// Fast line crossed the slow line on the latest bar.
    pub crossed: Option<Direction>,
}

/// Crossover from the previous and current `fast - slow` differences.
///
/// Bullish when the difference moves from `<= 0` to `> 0`, bearish when it
/// moves from `>= 0` to `< 0`.
pub fn detect_crossover(previous: Option<f64>, current: f64) -> Option<Direction> {
    let previous = previous?;
    if previous <= 0.0 && current > 0.0 {
        Some(Direction::Bullish)
    } else if previous >= 0.0 && current < 0.0 {
        Some(Direction::Bearish)
    } else {
        None
    }
}

/// Build a [`CrossValue`] from aligned fast/slow series ending on the same bar.
pub(crate) fn cross_from_series(fast: &[f64], slow: &[f64]) -> Option<CrossValue> {
    let fast_now = *fast.last()?;
    let slow_now = *slow.last()?;
    let previous = match (fast.len().checked_sub(2), slow.len().checked_sub(2)) {
        (Some(f), Some(s)) => Some(fast[f] - slow[s]),
        _ => None,
    };
    Some(CrossValue {
        fast: fast_now,
        slow: slow_now,
        crossed: detect_crossover(previous, fast_now - slow_now),
    })
}
