//! Unit tests for MACD indicator

use chrono::{Duration, Utc};
use fusetrix::indicators::momentum::calculate_macd;
use fusetrix::models::indicators::Candle;

fn trending_candles(count: usize, base: f64, step: f64) -> Vec<Candle> {
    let start = Utc::now();
    (0..count)
        .map(|i| {
            let price = base + i as f64 * step;
            Candle::new(
                price,
                price + 0.5,
                price - 0.5,
                price,
                1000.0,
                start + Duration::minutes(i as i64),
            )
        })
        .collect()
}

#[test]
fn test_macd_needs_slow_plus_signal_bars() {
    assert!(calculate_macd(&trending_candles(33, 100.0, 1.0), 12, 26, 9).is_none());
    assert!(calculate_macd(&trending_candles(34, 100.0, 1.0), 12, 26, 9).is_some());
}

#[test]
fn test_macd_rejects_inverted_periods() {
    let candles = trending_candles(100, 100.0, 1.0);
    assert!(calculate_macd(&candles, 26, 12, 9).is_none());
    assert!(calculate_macd(&candles, 12, 26, 0).is_none());
}

#[test]
fn test_macd_sign_follows_trend() {
    let up = calculate_macd(&trending_candles(100, 100.0, 1.0), 12, 26, 9).unwrap();
    assert!(up.macd > 0.0);

    let down = calculate_macd(&trending_candles(100, 200.0, -1.0), 12, 26, 9).unwrap();
    assert!(down.macd < 0.0);
}

#[test]
fn test_macd_histogram_is_macd_minus_signal() {
    let macd = calculate_macd(&trending_candles(80, 100.0, 0.7), 5, 13, 4).unwrap();
    assert!((macd.histogram - (macd.macd - macd.signal)).abs() < 1e-12);
}

#[test]
fn test_macd_flat_series_is_near_zero() {
    let macd = calculate_macd(&trending_candles(60, 100.0, 0.0), 12, 26, 9).unwrap();
    assert!(macd.macd.abs() < 1e-9);
    assert!(macd.histogram.abs() < 1e-9);
}
