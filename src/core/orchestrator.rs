//! Request orchestration
//!
//! Sequences one evaluation: resolve the profile, parse the indicator
//! selections, fetch the series (with retry), compute every indicator in
//! parallel on blocking threads, then normalize and fuse. Per-indicator
//! failures degrade into zero-reliability signals; everything else aborts the
//! request. Backtests share the same front half and replay the series on one
//! blocking thread.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::backtest::{
    default_warmup, BacktestRequest, BacktestResult, Backtester, DEFAULT_INITIAL_CAPITAL,
};
use crate::error::FusionError;
use crate::indicators::parser::{parse_indicator_type, parse_selection};
use crate::indicators::provider::IndicatorProvider;
use crate::indicators::IndicatorError;
use crate::models::indicators::{IndicatorKind, IndicatorReading, IndicatorSpec, PriceSeries};
use crate::models::profile::WeightOverrides;
use crate::models::signal::{FusionResult, NormalizedSignal};
use crate::services::market_data::{MarketDataError, MarketDataProvider};
use crate::signals::attribution;
use crate::signals::FusionContext;

/// One evaluation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub instrument: String,
    /// Selection strings such as `rsi:14`; the configured defaults when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<WeightOverrides>,
}

impl EvaluationRequest {
    pub fn new(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            ..Self::default()
        }
    }

    pub fn with_indicators<I, S>(mut self, indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indicators = Some(indicators.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_weights(mut self, weights: WeightOverrides) -> Self {
        self.weights = Some(weights);
        self
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub history_limit: usize,
    pub request_timeout: Duration,
    /// Extra attempts for transient market data failures.
    pub fetch_retries: usize,
    pub retry_min_delay: Duration,
    /// Bars fetched per backtest.
    pub backtest_history_limit: usize,
    pub backtest_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            history_limit: 250,
            request_timeout: Duration::from_millis(5_000),
            fetch_retries: 3,
            retry_min_delay: Duration::from_millis(100),
            backtest_history_limit: 1_000,
            backtest_timeout: Duration::from_millis(30_000),
        }
    }
}

/// A parsed selection: a usable spec, or a malformed one kept for attribution.
#[derive(Debug, Clone)]
enum Selection {
    Valid(IndicatorSpec),
    Degraded { id: String, kind: IndicatorKind },
}

impl Selection {
    fn id(&self) -> &str {
        match self {
            Selection::Valid(spec) => spec.id(),
            Selection::Degraded { id, .. } => id,
        }
    }

    fn kind(&self) -> IndicatorKind {
        match self {
            Selection::Valid(spec) => spec.kind(),
            Selection::Degraded { kind, .. } => *kind,
        }
    }

    fn into_spec(self) -> Option<IndicatorSpec> {
        match self {
            Selection::Valid(spec) => Some(spec),
            Selection::Degraded { .. } => None,
        }
    }
}

/// What one selection produced on its blocking task.
enum Computed {
    Reading(IndicatorReading),
    Failed(IndicatorError),
    Degraded,
}

pub struct SignalOrchestrator {
    context: Arc<FusionContext>,
    provider: Arc<dyn IndicatorProvider>,
    market_data: Arc<dyn MarketDataProvider>,
    default_indicators: Vec<IndicatorSpec>,
    settings: OrchestratorSettings,
}

impl SignalOrchestrator {
    pub fn new(
        context: Arc<FusionContext>,
        provider: Arc<dyn IndicatorProvider>,
        market_data: Arc<dyn MarketDataProvider>,
        default_indicators: Vec<IndicatorSpec>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            context,
            provider,
            market_data,
            default_indicators,
            settings,
        }
    }

    pub fn context(&self) -> &FusionContext {
        &self.context
    }

    pub fn default_indicators(&self) -> &[IndicatorSpec] {
        &self.default_indicators
    }

    pub async fn evaluate(&self, request: &EvaluationRequest) -> Result<FusionResult, FusionError> {
        let profile = self
            .context
            .profiles()
            .resolve(request.profile.as_deref(), request.weights.as_ref())?;
        let selections = self.selections(request.indicators.as_deref())?;
        let series = self
            .fetch_series(&request.instrument, self.settings.history_limit)
            .await?;

        let signals = self.compute_signals(&selections, series.clone()).await?;
        let result = self
            .context
            .engine()
            .fuse(&signals, &profile)?
            .for_instrument(series.instrument(), series.last().map(|c| c.close));

        let top: Vec<&str> = attribution::top_contributors(&result, 3)
            .into_iter()
            .map(|a| a.indicator.as_str())
            .collect();
        info!(
            instrument = %request.instrument,
            profile = %result.profile,
            recommendation = %result.recommendation,
            score = result.composite_score,
            confidence = result.confidence,
            insufficient_evidence = result.insufficient_evidence,
            top = ?top,
            "Evaluated signals"
        );
        Ok(result)
    }

    /// Replay the selections over the stored history of one instrument.
    pub async fn backtest(&self, request: &BacktestRequest) -> Result<BacktestResult, FusionError> {
        let profile = self
            .context
            .profiles()
            .resolve(request.profile.as_deref(), request.weights.as_ref())?;
        let specs: Vec<IndicatorSpec> = self
            .selections(request.indicators.as_deref())?
            .into_iter()
            .filter_map(Selection::into_spec)
            .collect();
        let series = self
            .fetch_series(&request.instrument, self.settings.backtest_history_limit)
            .await?;

        let initial_capital = request.initial_capital.unwrap_or(DEFAULT_INITIAL_CAPITAL);
        let warmup = request.warmup.unwrap_or_else(|| default_warmup(&specs));
        let context = Arc::clone(&self.context);
        let provider = Arc::clone(&self.provider);
        let task = tokio::task::spawn_blocking(move || {
            Backtester::new(&context, provider.as_ref()).run(
                &series,
                &specs,
                &profile,
                initial_capital,
                warmup,
            )
        });

        let timeout = self.settings.backtest_timeout;
        let result = tokio::time::timeout(timeout, task)
            .await
            .map_err(|_| FusionError::Timeout(timeout.as_millis() as u64))?
            .map_err(|e| FusionError::Internal(format!("backtest task failed: {}", e)))??;

        info!(
            instrument = %result.instrument,
            profile = %result.profile,
            bars = result.bars_evaluated,
            trades = result.total_trades,
            final_capital = result.final_capital,
            total_return_percent = result.total_return_percent,
            "Backtest finished"
        );
        Ok(result)
    }

    fn selections(&self, indicators: Option<&[String]>) -> Result<Vec<Selection>, FusionError> {
        let indicators = match indicators {
            Some(list) if !list.is_empty() => list,
            _ => {
                return Ok(self
                    .default_indicators
                    .iter()
                    .cloned()
                    .map(Selection::Valid)
                    .collect())
            }
        };

        let mut seen = HashSet::new();
        let mut selections = Vec::with_capacity(indicators.len());
        for raw in indicators {
            let selection = parse(raw.trim())?;
            if seen.insert(selection.id().to_string()) {
                selections.push(selection);
            }
        }
        Ok(selections)
    }

    async fn fetch_series(&self, instrument: &str, limit: usize) -> Result<PriceSeries, FusionError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.settings.retry_min_delay)
            .with_max_times(self.settings.fetch_retries);

        let market_data = &self.market_data;
        let series = (move || async move { market_data.get_series(instrument, limit).await })
            .retry(backoff)
            .when(MarketDataError::is_transient)
            .notify(|err: &MarketDataError, delay: Duration| {
                warn!(
                    instrument = %instrument,
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "Market data fetch failed, retrying"
                );
            })
            .await?;

        debug!(instrument = %instrument, bars = series.len(), "Fetched series");
        Ok(series)
    }

    /// One signal per selection, in selection order.
    async fn compute_signals(
        &self,
        selections: &[Selection],
        series: PriceSeries,
    ) -> Result<Vec<NormalizedSignal>, FusionError> {
        let series = Arc::new(series);
        let tasks = selections.iter().map(|selection| {
            let provider = Arc::clone(&self.provider);
            let series = Arc::clone(&series);
            let selection = selection.clone();
            tokio::task::spawn_blocking(move || match selection {
                Selection::Valid(spec) => match provider.compute(&spec, &series) {
                    Ok(reading) => Computed::Reading(reading),
                    Err(err) => Computed::Failed(err),
                },
                Selection::Degraded { .. } => Computed::Degraded,
            })
        });

        let timeout = self.settings.request_timeout;
        let outcomes = tokio::time::timeout(timeout, join_all(tasks))
            .await
            .map_err(|_| FusionError::Timeout(timeout.as_millis() as u64))?;

        let mut signals = Vec::with_capacity(selections.len());
        for (selection, outcome) in selections.iter().zip(outcomes) {
            let computed = outcome.unwrap_or_else(|e| {
                Computed::Failed(IndicatorError::Computation {
                    indicator: selection.id().to_string(),
                    reason: e.to_string(),
                })
            });
            let signal = match (selection, computed) {
                (Selection::Valid(spec), Computed::Reading(reading)) => {
                    self.context.normalizer().normalize(&reading, spec)?
                }
                (_, Computed::Failed(err)) => {
                    warn!(
                        indicator = selection.id(),
                        provider = self.provider.name(),
                        error = %err,
                        "Indicator failed, excluding"
                    );
                    NormalizedSignal::no_data(selection.id(), selection.kind())
                }
                _ => NormalizedSignal::no_data(selection.id(), selection.kind()),
            };
            signals.push(signal);
        }
        Ok(signals)
    }
}

/// Parse one selection. Malformed parameters on a known indicator degrade;
/// an unknown indicator name has no kind to attribute and is rejected.
fn parse(selection: &str) -> Result<Selection, FusionError> {
    match parse_selection(selection) {
        Ok(spec) => Ok(Selection::Valid(spec)),
        Err(err) => {
            let name = selection.split(':').next().unwrap_or(selection);
            let indicator = parse_indicator_type(name)
                .map_err(|_| err.clone().into_spec_error(selection))?;
            warn!(
                selection = %selection,
                error = %err,
                "Invalid indicator spec, excluding"
            );
            Ok(Selection::Degraded {
                id: selection.to_string(),
                kind: indicator.default_kind(),
            })
        }
    }
}
