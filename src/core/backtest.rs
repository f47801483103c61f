//! Historical replay
//!
//! Re-runs indicator computation, normalization and fusion bar by bar over a
//! stored series and trades the recommendations long/flat: a buy spends the
//! cash on whole units, a sell closes the position. The report carries final
//! capital, total return and CAGR.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FusionError;
use crate::indicators::provider::IndicatorProvider;
use crate::models::indicators::{IndicatorReading, IndicatorSpec, PriceSeries};
use crate::models::profile::{WeightOverrides, WeightingProfile};
use crate::models::signal::Recommendation;
use crate::signals::FusionContext;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

const SECONDS_PER_YEAR: f64 = 365.25 * 86_400.0;

/// One backtest request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestRequest {
    pub instrument: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<WeightOverrides>,
    /// Starting cash, [`DEFAULT_INITIAL_CAPITAL`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_capital: Option<f64>,
    /// Bars in the first evaluated window; the longest indicator history when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup: Option<usize>,
}

impl BacktestRequest {
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

    pub fn with_initial_capital(mut self, capital: f64) -> Self {
        self.initial_capital = Some(capital);
        self
    }

    pub fn with_warmup(mut self, warmup: usize) -> Self {
        self.warmup = Some(warmup);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: DateTime<Utc>,
    pub side: TradeSide,
    pub price: f64,
    pub quantity: f64,
    /// Composite score that triggered the trade.
    pub composite_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub instrument: String,
    pub profile: String,
    pub initial_capital: f64,
    /// Cash plus the open position marked at the last close.
    pub final_capital: f64,
    pub total_return_percent: f64,
    /// Annualized over the series span; zero when the span is empty.
    pub cagr_percent: f64,
    pub total_trades: usize,
    pub warmup: usize,
    pub bars_evaluated: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    pub trades: Vec<Trade>,
}

/// Cash and whole units held during a replay.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    cash: f64,
    units: f64,
    trades: Vec<Trade>,
}

impl Portfolio {
    pub fn new(cash: f64) -> Self {
        Self {
            cash,
            units: 0.0,
            trades: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn units(&self) -> f64 {
        self.units
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.units * price
    }

    /// Act on one recommendation at `price`, returning the trade if one was made.
    ///
    /// Buys only when at least one whole unit is affordable; sells only with
    /// an open position. Holds never trade.
    pub fn apply(
        &mut self,
        recommendation: Recommendation,
        price: f64,
        timestamp: DateTime<Utc>,
        composite_score: f64,
    ) -> Option<&Trade> {
        if !(price.is_finite() && price > 0.0) {
            return None;
        }
        let (side, quantity) = match recommendation {
            Recommendation::Buy | Recommendation::StrongBuy => {
                let quantity = (self.cash / price).floor();
                if quantity < 1.0 {
                    return None;
                }
                self.cash -= quantity * price;
                self.units += quantity;
                (TradeSide::Buy, quantity)
            }
            Recommendation::Sell | Recommendation::StrongSell => {
                if self.units <= 0.0 {
                    return None;
                }
                let quantity = self.units;
                self.cash += quantity * price;
                self.units = 0.0;
                (TradeSide::Sell, quantity)
            }
            Recommendation::Hold => return None,
        };
        self.trades.push(Trade {
            timestamp,
            side,
            price,
            quantity,
            composite_score,
        });
        self.trades.last()
    }
}

/// Longest minimum history among `specs`, at least one bar.
pub fn default_warmup(specs: &[IndicatorSpec]) -> usize {
    specs
        .iter()
        .map(|spec| spec.params().min_history())
        .max()
        .unwrap_or(1)
        .max(1)
}

/// Percentage growth per year from `initial` to `last` over `years`.
pub fn cagr_percent(initial: f64, last: f64, years: f64) -> f64 {
    if years <= 0.0 || initial <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    ((last / initial).powf(1.0 / years) - 1.0) * 100.0
}

/// Replays the fusion pipeline over every window of a series.
pub struct Backtester<'a> {
    context: &'a FusionContext,
    provider: &'a dyn IndicatorProvider,
}

impl<'a> Backtester<'a> {
    pub fn new(context: &'a FusionContext, provider: &'a dyn IndicatorProvider) -> Self {
        Self { context, provider }
    }

    /// Evaluate `specs` on every window `series[..end]` with `end >= warmup`
    /// and trade the recommendations at each window's last close.
    ///
    /// Indicator failures on a window count as missing readings there.
    pub fn run(
        &self,
        series: &PriceSeries,
        specs: &[IndicatorSpec],
        profile: &WeightingProfile,
        initial_capital: f64,
        warmup: usize,
    ) -> Result<BacktestResult, FusionError> {
        if !(initial_capital.is_finite() && initial_capital > 0.0) {
            return Err(FusionError::InvalidBacktest(format!(
                "initial capital must be finite and positive, got {}",
                initial_capital
            )));
        }
        let warmup = warmup.max(1);
        let mut portfolio = Portfolio::new(initial_capital);
        let mut bars_evaluated = 0;

        for end in warmup..=series.len() {
            let window = series.head(end);
            let Some((close, timestamp)) = window.last().map(|bar| (bar.close, bar.timestamp))
            else {
                continue;
            };
            let readings: Vec<(IndicatorSpec, IndicatorReading)> = specs
                .iter()
                .map(|spec| {
                    let reading = self.provider.compute(spec, &window).unwrap_or_else(|err| {
                        debug!(indicator = spec.id(), bar = end - 1, error = %err, "Indicator failed on window");
                        IndicatorReading::missing(spec, window.len())
                    });
                    (spec.clone(), reading)
                })
                .collect();

            let result = self.context.evaluate_at(&readings, profile, timestamp)?;
            bars_evaluated += 1;
            if let Some(trade) =
                portfolio.apply(result.recommendation, close, timestamp, result.composite_score)
            {
                debug!(
                    instrument = %series.instrument(),
                    side = ?trade.side,
                    price = trade.price,
                    quantity = trade.quantity,
                    "Backtest trade"
                );
            }
        }

        let start = series.candles().first().map(|bar| bar.timestamp);
        let end = series.last().map(|bar| bar.timestamp);
        let last_close = series.last().map(|bar| bar.close).unwrap_or(0.0);
        let final_capital = portfolio.equity(last_close);
        let years = match (start, end) {
            (Some(start), Some(end)) => (end - start).num_seconds() as f64 / SECONDS_PER_YEAR,
            _ => 0.0,
        };
        let trades = portfolio.trades;

        Ok(BacktestResult {
            instrument: series.instrument().to_string(),
            profile: profile.name().to_string(),
            initial_capital,
            final_capital,
            total_return_percent: (final_capital - initial_capital) / initial_capital * 100.0,
            cagr_percent: cagr_percent(initial_capital, final_capital, years),
            total_trades: trades.len(),
            warmup,
            bars_evaluated,
            start,
            end,
            trades,
        })
    }
}
