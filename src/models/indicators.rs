use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::models::signal::Direction;

/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar {index} of '{instrument}' is not later than the previous bar")]
    NonIncreasingTimestamp { instrument: String, index: usize },

    #[error("gap of {gap_seconds}s before bar {index} of '{instrument}' exceeds tolerance")]
    GapExceeded {
        instrument: String,
        index: usize,
        gap_seconds: i64,
    },
}

/// Ordered bars for one instrument, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    instrument: String,
    candles: Vec<Candle>,
}

impl PriceSeries {
    /// Build a series, checking that timestamps strictly increase.
    pub fn new(instrument: impl Into<String>, candles: Vec<Candle>) -> Result<Self, SeriesError> {
        let instrument = instrument.into();
        for (index, pair) in candles.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SeriesError::NonIncreasingTimestamp {
                    instrument,
                    index: index + 1,
                });
            }
        }
        Ok(Self {
            instrument,
            candles,
        })
    }

    /// Like [`PriceSeries::new`], additionally rejecting gaps wider than `tolerance`.
    pub fn with_gap_tolerance(
        instrument: impl Into<String>,
        candles: Vec<Candle>,
        tolerance: Duration,
    ) -> Result<Self, SeriesError> {
        let series = Self::new(instrument, candles)?;
        for (index, pair) in series.candles.windows(2).enumerate() {
            let gap = pair[1].timestamp - pair[0].timestamp;
            if gap > tolerance {
                return Err(SeriesError::GapExceeded {
                    instrument: series.instrument,
                    index: index + 1,
                    gap_seconds: gap.num_seconds(),
                });
            }
        }
        Ok(series)
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// The first `len` bars: the series as it stood when bar `len - 1` closed.
    pub fn head(&self, len: usize) -> PriceSeries {
        let end = len.min(self.candles.len());
        PriceSeries {
            instrument: self.instrument.clone(),
            candles: self.candles[..end].to_vec(),
        }
    }

    /// Keep only the most recent `limit` bars.
    pub fn tail(&self, limit: usize) -> PriceSeries {
        let start = self.candles.len().saturating_sub(limit);
        PriceSeries {
            instrument: self.instrument.clone(),
            candles: self.candles[start..].to_vec(),
        }
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }
}

/// What an indicator measures; selects the normalization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Oscillator,
    Trend,
    Volatility,
    Volume,
}

impl IndicatorKind {
    pub fn all() -> [IndicatorKind; 4] {
        [
            IndicatorKind::Oscillator,
            IndicatorKind::Trend,
            IndicatorKind::Volatility,
            IndicatorKind::Volume,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::Oscillator => "oscillator",
            IndicatorKind::Trend => "trend",
            IndicatorKind::Volatility => "volatility",
            IndicatorKind::Volume => "volume",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Available indicator algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorType {
    Rsi,
    Stochastic,
    WilliamsR,
    Macd,
    SmaCross,
    EmaCross,
    Bollinger,
    Obv,
}

impl IndicatorType {
    pub fn all() -> [IndicatorType; 8] {
        [
            IndicatorType::Rsi,
            IndicatorType::Stochastic,
            IndicatorType::WilliamsR,
            IndicatorType::Macd,
            IndicatorType::SmaCross,
            IndicatorType::EmaCross,
            IndicatorType::Bollinger,
            IndicatorType::Obv,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorType::Rsi => "rsi",
            IndicatorType::Stochastic => "stochastic",
            IndicatorType::WilliamsR => "williams_r",
            IndicatorType::Macd => "macd",
            IndicatorType::SmaCross => "sma_cross",
            IndicatorType::EmaCross => "ema_cross",
            IndicatorType::Bollinger => "bollinger",
            IndicatorType::Obv => "obv",
        }
    }

    /// Kind an indicator reports unless an `IndicatorSpec` declares another.
    pub fn default_kind(&self) -> IndicatorKind {
        match self {
            IndicatorType::Rsi | IndicatorType::Stochastic | IndicatorType::WilliamsR => {
                IndicatorKind::Oscillator
            }
            IndicatorType::Macd | IndicatorType::SmaCross | IndicatorType::EmaCross => {
                IndicatorKind::Trend
            }
            IndicatorType::Bollinger => IndicatorKind::Volatility,
            IndicatorType::Obv => IndicatorKind::Volume,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of one indicator computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "indicator", rename_all = "snake_case")]
pub enum IndicatorParams {
    Rsi { period: u32 },
    Stochastic { k_period: u32, d_period: u32 },
    WilliamsR { period: u32 },
    Macd { fast: u32, slow: u32, signal: u32 },
    SmaCross { fast: u32, slow: u32 },
    EmaCross { fast: u32, slow: u32 },
    Bollinger { period: u32, std_dev: f64 },
    Obv { period: u32 },
}

impl IndicatorParams {
    pub fn indicator_type(&self) -> IndicatorType {
        match self {
            IndicatorParams::Rsi { .. } => IndicatorType::Rsi,
            IndicatorParams::Stochastic { .. } => IndicatorType::Stochastic,
            IndicatorParams::WilliamsR { .. } => IndicatorType::WilliamsR,
            IndicatorParams::Macd { .. } => IndicatorType::Macd,
            IndicatorParams::SmaCross { .. } => IndicatorType::SmaCross,
            IndicatorParams::EmaCross { .. } => IndicatorType::EmaCross,
            IndicatorParams::Bollinger { .. } => IndicatorType::Bollinger,
            IndicatorParams::Obv { .. } => IndicatorType::Obv,
        }
    }

    /// Canonical identity, e.g. `rsi_14` or `macd_12_26_9`.
    pub fn default_id(&self) -> String {
        let name = self.indicator_type().as_str();
        match self {
            IndicatorParams::Rsi { period }
            | IndicatorParams::WilliamsR { period }
            | IndicatorParams::Obv { period } => format!("{}_{}", name, period),
            IndicatorParams::Stochastic { k_period, d_period } => {
                format!("{}_{}_{}", name, k_period, d_period)
            }
            IndicatorParams::Macd { fast, slow, signal } => {
                format!("{}_{}_{}_{}", name, fast, slow, signal)
            }
            IndicatorParams::SmaCross { fast, slow } | IndicatorParams::EmaCross { fast, slow } => {
                format!("{}_{}_{}", name, fast, slow)
            }
            IndicatorParams::Bollinger { period, std_dev } => {
                format!("{}_{}_{}", name, period, std_dev)
            }
        }
    }

    /// Fewest bars that produce a value at all.
    pub fn min_history(&self) -> usize {
        match *self {
            IndicatorParams::Rsi { period } => period as usize + 1,
            IndicatorParams::Stochastic { k_period, d_period } => {
                (k_period as usize + d_period as usize).saturating_sub(1)
            }
            IndicatorParams::WilliamsR { period } => period as usize,
            IndicatorParams::Macd { slow, signal, .. } => {
                (slow as usize + signal as usize).saturating_sub(1)
            }
            IndicatorParams::SmaCross { slow, .. } | IndicatorParams::EmaCross { slow, .. } => {
                slow as usize
            }
            IndicatorParams::Bollinger { period, .. } => period as usize,
            IndicatorParams::Obv { period } => period as usize + 1,
        }
    }

    /// Bars needed before the value is considered fully reliable.
    ///
    /// Recursive smoothers (Wilder RSI, EMAs) need several periods to forget
    /// their seed; window indicators are exact once the window is full, plus
    /// one bar to detect a crossover.
    pub fn stable_lookback(&self) -> usize {
        match *self {
            IndicatorParams::Rsi { period } => 3 * period as usize + 1,
            IndicatorParams::Stochastic { .. }
            | IndicatorParams::WilliamsR { .. }
            | IndicatorParams::Bollinger { .. } => self.min_history(),
            IndicatorParams::Macd { slow, signal, .. } => 3 * slow as usize + signal as usize,
            IndicatorParams::SmaCross { slow, .. } => slow as usize + 1,
            IndicatorParams::EmaCross { slow, .. } => 3 * slow as usize,
            IndicatorParams::Obv { period } => 2 * period as usize + 1,
        }
    }
}

/// Immutable description of one indicator to evaluate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSpec {
    id: String,
    kind: IndicatorKind,
    params: IndicatorParams,
}

impl IndicatorSpec {
    /// Spec with the canonical id and the indicator's default kind.
    ///
    /// Use [`crate::indicators::validation::validate_spec`] (or the parser)
    /// to obtain a checked spec.
    pub(crate) fn from_parts(id: String, kind: IndicatorKind, params: IndicatorParams) -> Self {
        Self { id, kind, params }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> IndicatorKind {
        self.kind
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    pub fn indicator_type(&self) -> IndicatorType {
        self.params.indicator_type()
    }
}

/// Shape of a raw indicator value, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RawReading {
    /// Bounded oscillator level.
    Level { value: f64 },
    /// Fast line against slow line, scaled by `reference`.
    Spread {
        fast: f64,
        slow: f64,
        reference: f64,
        crossed: Option<Direction>,
    },
    /// Price inside an envelope.
    Band {
        price: f64,
        lower: f64,
        middle: f64,
        upper: f64,
    },
    /// Flow deviation from its baseline, in units of `scale`.
    Flow { delta: f64, scale: f64 },
}

impl RawReading {
    pub fn is_finite(&self) -> bool {
        match *self {
            RawReading::Level { value } => value.is_finite(),
            RawReading::Spread {
                fast,
                slow,
                reference,
                ..
            } => fast.is_finite() && slow.is_finite() && reference.is_finite(),
            RawReading::Band {
                price,
                lower,
                middle,
                upper,
            } => price.is_finite() && lower.is_finite() && middle.is_finite() && upper.is_finite(),
            RawReading::Flow { delta, scale } => delta.is_finite() && scale.is_finite(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReadingValue {
    /// Not enough history to compute anything.
    Missing,
    /// The computation produced a non-finite value.
    Invalid,
    Present { raw: RawReading },
}

/// Raw output of one spec applied to one series at its latest bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub spec_id: String,
    pub value: ReadingValue,
    pub sample_size: usize,
    pub stable_lookback: usize,
}

impl IndicatorReading {
    pub fn present(spec: &IndicatorSpec, raw: RawReading, sample_size: usize) -> Self {
        let value = if raw.is_finite() {
            ReadingValue::Present { raw }
        } else {
            ReadingValue::Invalid
        };
        Self {
            spec_id: spec.id().to_string(),
            value,
            sample_size,
            stable_lookback: spec.params().stable_lookback(),
        }
    }

    pub fn missing(spec: &IndicatorSpec, sample_size: usize) -> Self {
        Self {
            spec_id: spec.id().to_string(),
            value: ReadingValue::Missing,
            sample_size,
            stable_lookback: spec.params().stable_lookback(),
        }
    }

    /// Share of the stable lookback that backed this reading, in [0, 1].
    pub fn history_coverage(&self) -> f64 {
        if self.stable_lookback == 0 {
            return 1.0;
        }
        (self.sample_size as f64 / self.stable_lookback as f64).min(1.0)
    }
}
