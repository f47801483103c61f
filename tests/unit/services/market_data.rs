//! Unit tests for the in-memory market data provider

use chrono::{Duration, TimeZone, Utc};
use fusetrix::error::FusionError;
use fusetrix::models::indicators::{Candle, PriceSeries};
use fusetrix::services::{InMemoryMarketData, MarketDataError, MarketDataProvider};

fn series(instrument: &str, count: usize) -> PriceSeries {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let candles = (0..count)
        .map(|i| {
            let price = 100.0 + i as f64;
            Candle::new(price, price + 1.0, price - 1.0, price, 10.0, start + Duration::hours(i as i64))
        })
        .collect();
    PriceSeries::new(instrument, candles).unwrap()
}

#[tokio::test]
async fn test_unknown_instrument_is_not_found() {
    let market_data = InMemoryMarketData::new();
    let err = market_data.get_series("ETH-USD", 10).await.unwrap_err();
    assert_eq!(err, MarketDataError::NotFound("ETH-USD".to_string()));
    assert!(!err.is_transient());
    assert_eq!(
        FusionError::from(err),
        FusionError::InstrumentNotFound("ETH-USD".to_string())
    );
}

#[tokio::test]
async fn test_get_series_keeps_most_recent_bars() {
    let market_data = InMemoryMarketData::new();
    market_data.insert(series("BTC-USD", 50)).await;

    let tail = market_data.get_series("BTC-USD", 10).await.unwrap();
    assert_eq!(tail.len(), 10);
    assert_eq!(tail.last().unwrap().close, 149.0);
    assert_eq!(tail.candles()[0].close, 140.0);

    let all = market_data.get_series("BTC-USD", 500).await.unwrap();
    assert_eq!(all.len(), 50);
}

#[test]
fn test_instruments_are_sorted() {
    let market_data = InMemoryMarketData::new();
    tokio_test::block_on(async {
        market_data.insert(series("SOL-USD", 2)).await;
        market_data.insert(series("BTC-USD", 2)).await;
    });
    assert_eq!(
        tokio_test::block_on(market_data.instruments()),
        vec!["BTC-USD", "SOL-USD"]
    );
}

#[tokio::test]
async fn test_load_from_json_file() {
    let path = std::env::temp_dir().join(format!("fusetrix-market-{}.json", std::process::id()));
    let bars = serde_json::json!({
        "BTC-USD": [
            { "timestamp": "2024-01-01T00:00:00Z", "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5, "volume": 10.0 },
            { "timestamp": "2024-01-01T01:00:00Z", "open": 1.5, "high": 2.5, "low": 1.0, "close": 2.0, "volume": 12.0 }
        ]
    });
    std::fs::write(&path, bars.to_string()).unwrap();

    let market_data = InMemoryMarketData::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let series = market_data.get_series("BTC-USD", 100).await.unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.last().unwrap().close, 2.0);
}

#[test]
fn test_unordered_json_bars_are_rejected() {
    let path = std::env::temp_dir().join(format!("fusetrix-unordered-{}.json", std::process::id()));
    let bars = serde_json::json!({
        "BTC-USD": [
            { "timestamp": "2024-01-01T01:00:00Z", "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5, "volume": 10.0 },
            { "timestamp": "2024-01-01T00:00:00Z", "open": 1.5, "high": 2.5, "low": 1.0, "close": 2.0, "volume": 12.0 }
        ]
    });
    std::fs::write(&path, bars.to_string()).unwrap();

    let result = InMemoryMarketData::from_json_file(&path);
    std::fs::remove_file(&path).ok();
    assert!(matches!(result, Err(MarketDataError::InvalidSeries(_))));
}

#[test]
fn test_missing_file_is_load_error() {
    let result = InMemoryMarketData::from_json_file("/nonexistent/fusetrix/bars.json");
    assert!(matches!(result, Err(MarketDataError::Load(_))));
}
