//! Prometheus metrics for the API server and the fusion pipeline

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::core::backtest::BacktestResult;
use crate::error::FusionError;
use crate::models::signal::{AttributionStatus, FusionResult};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
    pub fusion_evaluations_total: IntCounterVec,
    pub fusion_failures_total: IntCounterVec,
    pub indicator_exclusions_total: IntCounterVec,
    pub backtests_total: IntCounter,
    pub backtest_trades_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::with_opts(Opts::new("http_requests_total", "Total HTTP requests"))?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight = IntGauge::with_opts(Opts::new(
            "http_requests_in_flight",
            "HTTP requests currently being served",
        ))?;
        let fusion_evaluations_total = IntCounterVec::new(
            Opts::new("fusion_evaluations_total", "Completed fusions by recommendation"),
            &["recommendation"],
        )?;
        let fusion_failures_total = IntCounterVec::new(
            Opts::new("fusion_failures_total", "Failed fusion requests by error"),
            &["error"],
        )?;
        let indicator_exclusions_total = IntCounterVec::new(
            Opts::new(
                "indicator_exclusions_total",
                "Indicators left out of a fusion by reason",
            ),
            &["reason"],
        )?;

        let backtests_total =
            IntCounter::with_opts(Opts::new("backtests_total", "Completed backtests"))?;
        let backtest_trades_total = IntCounter::with_opts(Opts::new(
            "backtest_trades_total",
            "Simulated trades across completed backtests",
        ))?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(fusion_evaluations_total.clone()))?;
        registry.register(Box::new(fusion_failures_total.clone()))?;
        registry.register(Box::new(indicator_exclusions_total.clone()))?;
        registry.register(Box::new(backtests_total.clone()))?;
        registry.register(Box::new(backtest_trades_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            fusion_evaluations_total,
            fusion_failures_total,
            indicator_exclusions_total,
            backtests_total,
            backtest_trades_total,
        })
    }

    pub fn record_result(&self, result: &FusionResult) {
        self.fusion_evaluations_total
            .with_label_values(&[result.recommendation.as_str()])
            .inc();
        for entry in result.excluded() {
            if let AttributionStatus::Excluded(reason) = entry.status {
                self.indicator_exclusions_total
                    .with_label_values(&[reason.as_str()])
                    .inc();
            }
        }
    }

    pub fn record_backtest(&self, result: &BacktestResult) {
        self.backtests_total.inc();
        self.backtest_trades_total.inc_by(result.total_trades as u64);
    }

    pub fn record_failure(&self, error: &FusionError) {
        self.fusion_failures_total
            .with_label_values(&[error.label()])
            .inc();
    }

    /// Prometheus text exposition of every registered metric.
    pub fn export(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
