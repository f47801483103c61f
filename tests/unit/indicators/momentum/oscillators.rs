//! Unit tests for Stochastic and Williams %R

use chrono::{Duration, Utc};
use fusetrix::indicators::momentum::{calculate_stochastic, calculate_williams_r};
use fusetrix::models::indicators::Candle;

fn candle(i: usize, high: f64, low: f64, close: f64) -> Candle {
    Candle::new(close, high, low, close, 1000.0, Utc::now() + Duration::minutes(i as i64))
}

fn range_candles(count: usize, close_at: f64) -> Vec<Candle> {
    (0..count).map(|i| candle(i, 110.0, 90.0, close_at)).collect()
}

#[test]
fn test_stochastic_close_at_top_of_range() {
    let stoch = calculate_stochastic(&range_candles(20, 110.0), 14, 3).unwrap();
    assert!((stoch.k - 100.0).abs() < 1e-12);
    assert!((stoch.d - 100.0).abs() < 1e-12);
}

#[test]
fn test_stochastic_close_at_bottom_of_range() {
    let stoch = calculate_stochastic(&range_candles(20, 90.0), 14, 3).unwrap();
    assert!(stoch.k.abs() < 1e-12);
}

#[test]
fn test_stochastic_needs_k_plus_d_minus_one_bars() {
    assert!(calculate_stochastic(&range_candles(15, 100.0), 14, 3).is_none());
    assert!(calculate_stochastic(&range_candles(16, 100.0), 14, 3).is_some());
}

#[test]
fn test_stochastic_zero_range_is_midpoint() {
    let candles: Vec<Candle> = (0..20).map(|i| candle(i, 100.0, 100.0, 100.0)).collect();
    let stoch = calculate_stochastic(&candles, 14, 3).unwrap();
    assert_eq!(stoch.k, 50.0);
}

#[test]
fn test_williams_r_bounds() {
    let top = calculate_williams_r(&range_candles(14, 110.0), 14).unwrap();
    assert!(top.abs() < 1e-12);

    let bottom = calculate_williams_r(&range_candles(14, 90.0), 14).unwrap();
    assert!((bottom + 100.0).abs() < 1e-12);

    let middle = calculate_williams_r(&range_candles(14, 100.0), 14).unwrap();
    assert!((middle + 50.0).abs() < 1e-12);
}

#[test]
fn test_williams_r_insufficient_data() {
    assert!(calculate_williams_r(&range_candles(13, 100.0), 14).is_none());
}
