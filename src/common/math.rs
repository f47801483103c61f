//! Rolling-window math over close/volume slices.
//!
//! All helpers work on the tail of the input: the last element is the most
//! recent bar. They return `None` (or an empty series) when the slice is
//! shorter than the requested period.

/// Simple moving average of the last `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Simple moving average for every complete window.
///
/// The result has `values.len() - period + 1` elements; element `i` averages
/// `values[i..i + period]`.
pub fn sma_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut sum: f64 = values[..period].iter().sum();
    out.push(sum / period as f64);
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out.push(sum / period as f64);
    }
    out
}

/// One EMA step from the previous average.
pub fn ema_from_previous(value: f64, previous: f64, period: usize) -> f64 {
    let k = 2.0 / (period as f64 + 1.0);
    value * k + previous * (1.0 - k)
}

/// Exponential moving average series seeded with the SMA of the first window.
///
/// Same alignment as [`sma_series`]: element 0 corresponds to
/// `values[period - 1]`.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut prev = values[..period].iter().sum::<f64>() / period as f64;
    out.push(prev);
    for &value in &values[period..] {
        prev = ema_from_previous(value, prev, period);
        out.push(prev);
    }
    out
}

/// Population standard deviation of the last `period` values.
pub fn standard_deviation(values: &[f64], period: usize) -> Option<f64> {
    let mean = sma(values, period)?;
    let window = &values[values.len() - period..];
    let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
    Some(variance.sqrt())
}

/// Highest value of the last `period` values.
pub fn highest(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    values[values.len() - period..]
        .iter()
        .copied()
        .reduce(f64::max)
}

/// Lowest value of the last `period` values.
pub fn lowest(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    values[values.len() - period..]
        .iter()
        .copied()
        .reduce(f64::min)
}
