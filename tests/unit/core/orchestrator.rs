//! Unit tests for request orchestration

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use fusetrix::config::EngineConfig;
use fusetrix::core::{EvaluationRequest, OrchestratorSettings, SignalOrchestrator};
use fusetrix::error::FusionError;
use fusetrix::indicators::provider::{IndicatorProvider, TechnicalIndicators};
use fusetrix::indicators::IndicatorError;
use fusetrix::models::indicators::{Candle, IndicatorReading, IndicatorSpec, PriceSeries};
use fusetrix::models::profile::WeightOverrides;
use fusetrix::models::signal::{AttributionStatus, ExclusionReason};
use fusetrix::services::{InMemoryMarketData, MarketDataError, MarketDataProvider};
use fusetrix::signals::FusionContext;

fn trending(instrument: &str, count: usize) -> PriceSeries {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let candles = (0..count)
        .map(|i| {
            let price = 100.0 + i as f64 * 0.5 + (i as f64 * 0.4).sin() * 2.0;
            Candle::new(
                price - 0.2,
                price + 1.0,
                price - 1.0,
                price,
                1_000.0 + (i % 5) as f64 * 100.0,
                start + ChronoDuration::hours(i as i64),
            )
        })
        .collect();
    PriceSeries::new(instrument, candles).unwrap()
}

fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        retry_min_delay: Duration::from_millis(1),
        ..OrchestratorSettings::default()
    }
}

fn orchestrator_with(
    provider: Arc<dyn IndicatorProvider>,
    market_data: Arc<dyn MarketDataProvider>,
    settings: OrchestratorSettings,
) -> SignalOrchestrator {
    SignalOrchestrator::new(
        Arc::new(FusionContext::default()),
        provider,
        market_data,
        EngineConfig::default().default_specs().unwrap(),
        settings,
    )
}

async fn orchestrator(bars: usize) -> SignalOrchestrator {
    let market_data = InMemoryMarketData::new();
    market_data.insert(trending("BTC-USD", bars)).await;
    orchestrator_with(
        Arc::new(TechnicalIndicators::new()),
        Arc::new(market_data),
        settings(),
    )
}

struct FailingProvider;

impl IndicatorProvider for FailingProvider {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn compute(
        &self,
        spec: &IndicatorSpec,
        _series: &PriceSeries,
    ) -> Result<IndicatorReading, IndicatorError> {
        Err(IndicatorError::Computation {
            indicator: spec.id().to_string(),
            reason: "upstream unavailable".to_string(),
        })
    }
}

/// Computes everything except MACD.
struct NoMacdProvider;

impl IndicatorProvider for NoMacdProvider {
    fn name(&self) -> &'static str {
        "no-macd"
    }

    fn compute(
        &self,
        spec: &IndicatorSpec,
        series: &PriceSeries,
    ) -> Result<IndicatorReading, IndicatorError> {
        if spec.id().starts_with("macd") {
            return Err(IndicatorError::Computation {
                indicator: spec.id().to_string(),
                reason: "upstream unavailable".to_string(),
            });
        }
        TechnicalIndicators::new().compute(spec, series)
    }
}

struct SlowProvider;

impl IndicatorProvider for SlowProvider {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn compute(
        &self,
        spec: &IndicatorSpec,
        series: &PriceSeries,
    ) -> Result<IndicatorReading, IndicatorError> {
        std::thread::sleep(Duration::from_millis(200));
        Ok(IndicatorReading::missing(spec, series.len()))
    }
}

/// Fails transiently a fixed number of times before serving.
struct FlakyMarketData {
    inner: InMemoryMarketData,
    failures: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl MarketDataProvider for FlakyMarketData {
    async fn get_series(
        &self,
        instrument: &str,
        limit: usize,
    ) -> Result<PriceSeries, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(MarketDataError::Unavailable("connection reset".to_string()));
        }
        self.inner.get_series(instrument, limit).await
    }

    async fn instruments(&self) -> Vec<String> {
        self.inner.instruments().await
    }
}

#[tokio::test]
async fn test_evaluates_default_indicators() {
    let orchestrator = orchestrator(300).await;
    let result = orchestrator
        .evaluate(&EvaluationRequest::new("BTC-USD"))
        .await
        .unwrap();

    assert_eq!(result.instrument.as_deref(), Some("BTC-USD"));
    assert_eq!(result.profile, "balanced");
    assert_eq!(result.attribution.len(), orchestrator.default_indicators().len());
    assert!(result.price.is_some());
    assert!(!result.insufficient_evidence);
    assert!((-1.0..=1.0).contains(&result.composite_score));
    assert!((0.0..=1.0).contains(&result.confidence));
}

#[tokio::test]
async fn test_malformed_selection_degrades() {
    let orchestrator = orchestrator(300).await;
    let request = EvaluationRequest::new("BTC-USD").with_indicators(["rsi:0", "macd:12,26,9"]);
    let result = orchestrator.evaluate(&request).await.unwrap();

    let degraded = result
        .attribution
        .iter()
        .find(|a| a.indicator == "rsi:0")
        .unwrap();
    assert_eq!(
        degraded.status,
        AttributionStatus::Excluded(ExclusionReason::NoData)
    );
    assert_eq!(result.included().count(), 1);
}

#[tokio::test]
async fn test_unknown_indicator_is_rejected() {
    let orchestrator = orchestrator(300).await;
    let request = EvaluationRequest::new("BTC-USD").with_indicators(["rsi:14", "vwap:20"]);
    let err = orchestrator.evaluate(&request).await.unwrap_err();
    assert!(matches!(err, FusionError::InvalidSpec { ref indicator, .. } if indicator == "vwap:20"));
}

#[tokio::test]
async fn test_duplicate_selections_collapse() {
    let orchestrator = orchestrator(300).await;
    let request =
        EvaluationRequest::new("BTC-USD").with_indicators(["rsi:14", "rsi", " rsi:14 "]);
    let result = orchestrator.evaluate(&request).await.unwrap();
    assert_eq!(result.attribution.len(), 1);
    assert_eq!(result.attribution[0].indicator, "rsi_14");
}

#[tokio::test]
async fn test_unknown_instrument() {
    let orchestrator = orchestrator(300).await;
    let err = orchestrator
        .evaluate(&EvaluationRequest::new("DOGE-USD"))
        .await
        .unwrap_err();
    assert_eq!(err, FusionError::InstrumentNotFound("DOGE-USD".to_string()));
}

#[tokio::test]
async fn test_unknown_profile() {
    let orchestrator = orchestrator(300).await;
    let request = EvaluationRequest::new("BTC-USD").with_profile("aggressive");
    let err = orchestrator.evaluate(&request).await.unwrap_err();
    assert_eq!(err, FusionError::UnknownProfile("aggressive".to_string()));
}

#[tokio::test]
async fn test_weight_overrides_apply() {
    let orchestrator = orchestrator(300).await;
    let mut weights = WeightOverrides::default();
    weights.indicators.insert("rsi_14".to_string(), 5.0);
    let request = EvaluationRequest::new("BTC-USD")
        .with_indicators(["rsi:14"])
        .with_weights(weights);
    let result = orchestrator.evaluate(&request).await.unwrap();
    assert_eq!(result.attribution[0].base_weight, Some(5.0));
}

#[tokio::test]
async fn test_short_history_is_insufficient_evidence() {
    let orchestrator = orchestrator(30).await;
    let request = EvaluationRequest::new("BTC-USD").with_indicators(["sma_cross:50,200"]);
    let result = orchestrator.evaluate(&request).await.unwrap();
    assert!(result.insufficient_evidence);
    assert_eq!(result.recommendation.as_str(), "hold");
}

#[tokio::test]
async fn test_provider_failure_degrades() {
    let market_data = InMemoryMarketData::new();
    market_data.insert(trending("BTC-USD", 300)).await;
    let orchestrator =
        orchestrator_with(Arc::new(FailingProvider), Arc::new(market_data), settings());

    let result = orchestrator
        .evaluate(&EvaluationRequest::new("BTC-USD"))
        .await
        .unwrap();
    assert!(result.insufficient_evidence);
    assert_eq!(result.excluded().count(), result.attribution.len());
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let market_data = InMemoryMarketData::new();
    market_data.insert(trending("BTC-USD", 300)).await;
    let settings = OrchestratorSettings {
        request_timeout: Duration::from_millis(50),
        ..settings()
    };
    let orchestrator = orchestrator_with(Arc::new(SlowProvider), Arc::new(market_data), settings);

    let err = orchestrator
        .evaluate(&EvaluationRequest::new("BTC-USD"))
        .await
        .unwrap_err();
    assert_eq!(err, FusionError::Timeout(50));
}

#[tokio::test]
async fn test_transient_market_data_is_retried() {
    let inner = InMemoryMarketData::new();
    inner.insert(trending("BTC-USD", 300)).await;
    let flaky = Arc::new(FlakyMarketData {
        inner,
        failures: AtomicUsize::new(2),
        calls: AtomicUsize::new(0),
    });
    let orchestrator = orchestrator_with(
        Arc::new(TechnicalIndicators::new()),
        flaky.clone(),
        settings(),
    );

    assert!(orchestrator
        .evaluate(&EvaluationRequest::new("BTC-USD"))
        .await
        .is_ok());
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let inner = InMemoryMarketData::new();
    inner.insert(trending("BTC-USD", 300)).await;
    let flaky = Arc::new(FlakyMarketData {
        inner,
        failures: AtomicUsize::new(10),
        calls: AtomicUsize::new(0),
    });
    let orchestrator = orchestrator_with(
        Arc::new(TechnicalIndicators::new()),
        flaky.clone(),
        settings(),
    );

    let err = orchestrator
        .evaluate(&EvaluationRequest::new("BTC-USD"))
        .await
        .unwrap_err();
    assert_eq!(err.label(), "market_data");
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_each_selection_keeps_its_own_outcome() {
    let market_data = InMemoryMarketData::new();
    market_data.insert(trending("BTC-USD", 300)).await;
    let orchestrator =
        orchestrator_with(Arc::new(NoMacdProvider), Arc::new(market_data), settings());

    let request = EvaluationRequest::new("BTC-USD").with_indicators([
        "stochastic:0",
        "macd:12,26,9",
        "rsi:14",
        "bollinger:20,2",
    ]);
    let result = orchestrator.evaluate(&request).await.unwrap();
    assert_eq!(result.attribution.len(), 4);

    let status = |id: &str| {
        result
            .attribution
            .iter()
            .find(|a| a.indicator == id)
            .map(|a| a.status)
            .unwrap()
    };
    let no_data = AttributionStatus::Excluded(ExclusionReason::NoData);
    assert_eq!(status("stochastic:0"), no_data);
    assert_eq!(status("macd_12_26_9"), no_data);
    assert_ne!(status("rsi_14"), no_data);
    assert_ne!(status("bollinger_20_2"), no_data);
}
