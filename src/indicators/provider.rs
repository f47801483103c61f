//! Indicator provider trait and the built-in technical indicator set

use crate::indicators::error::IndicatorError;
use crate::indicators::momentum::{macd, rsi, stochastic, williams_r};
use crate::indicators::trend::{ema, sma, CrossValue};
use crate::indicators::volatility::bollinger;
use crate::indicators::volume::obv;
use crate::models::indicators::{
    IndicatorParams, IndicatorReading, IndicatorSpec, PriceSeries, RawReading,
};

/// Computes raw readings for indicator specs.
///
/// Implementations must be pure functions of `(spec, series)` so the
/// orchestrator can run them concurrently on blocking threads.
pub trait IndicatorProvider: Send + Sync {
    /// Name of the provider, for logs.
    fn name(&self) -> &'static str;

    /// Reading of `spec` at the latest bar of `series`.
    ///
    /// Too little history is not an error: it yields a missing reading.
    fn compute(
        &self,
        spec: &IndicatorSpec,
        series: &PriceSeries,
    ) -> Result<IndicatorReading, IndicatorError>;
}

/// Built-in provider covering every [`IndicatorParams`] variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct TechnicalIndicators;

impl TechnicalIndicators {
    pub fn new() -> Self {
        Self
    }

    fn raw(params: &IndicatorParams, series: &PriceSeries) -> Option<RawReading> {
        let candles = series.candles();
        match *params {
            IndicatorParams::Rsi { period } => {
                rsi::calculate_rsi(candles, period).map(|value| RawReading::Level { value })
            }
            IndicatorParams::Stochastic { k_period, d_period } => {
                stochastic::calculate_stochastic(candles, k_period, d_period)
                    .map(|s| RawReading::Level { value: s.d })
            }
            IndicatorParams::WilliamsR { period } => williams_r::calculate_williams_r(candles, period)
                .map(|value| RawReading::Level { value }),
            IndicatorParams::Macd { fast, slow, signal } => {
                let close = candles.last()?.close;
                macd::calculate_macd(candles, fast, slow, signal).map(|m| RawReading::Spread {
                    fast: m.macd,
                    slow: m.signal,
                    reference: close,
                    crossed: m.crossed,
                })
            }
            IndicatorParams::SmaCross { fast, slow } => {
                sma::calculate_sma_cross(candles, fast, slow).map(spread_from_cross)
            }
            IndicatorParams::EmaCross { fast, slow } => {
                ema::calculate_ema_cross(candles, fast, slow).map(spread_from_cross)
            }
            IndicatorParams::Bollinger { period, std_dev } => {
                let price = candles.last()?.close;
                bollinger::calculate_bollinger_bands(candles, period, std_dev).map(|b| {
                    RawReading::Band {
                        price,
                        lower: b.lower,
                        middle: b.middle,
                        upper: b.upper,
                    }
                })
            }
            IndicatorParams::Obv { period } => {
                obv::calculate_obv(candles, period).map(|o| RawReading::Flow {
                    delta: o.obv - o.baseline,
                    scale: o.average_volume,
                })
            }
        }
    }
}

fn spread_from_cross(cross: CrossValue) -> RawReading {
    RawReading::Spread {
        fast: cross.fast,
        slow: cross.slow,
        reference: cross.slow,
        crossed: cross.crossed,
    }
}

impl IndicatorProvider for TechnicalIndicators {
    fn name(&self) -> &'static str {
        "technical"
    }

    fn compute(
        &self,
        spec: &IndicatorSpec,
        series: &PriceSeries,
    ) -> Result<IndicatorReading, IndicatorError> {
        let available = series.len();
        if available < spec.params().min_history() {
            return Ok(IndicatorReading::missing(spec, available));
        }
        match Self::raw(spec.params(), series) {
            Some(raw) => Ok(IndicatorReading::present(spec, raw, available)),
            None => Ok(IndicatorReading::missing(spec, available)),
        }
    }
}
