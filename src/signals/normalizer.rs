//! Indicator normalization
//!
//! Maps raw indicator readings onto the common
//! `(direction, magnitude, reliability)` scale. One strategy is registered per
//! [`IndicatorKind`]; the curves each strategy applies come from
//! [`NormalizationConfig`].

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::error::FusionError;
use crate::models::indicators::{
    IndicatorKind, IndicatorReading, IndicatorSpec, IndicatorType, RawReading, ReadingValue,
};
use crate::models::signal::{Direction, NormalizedSignal};
use crate::signals::scoring::{band_position, clamp_unit, distance_from_midpoint, relative_spread};

/// Output range and overbought/oversold edges of a bounded oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorBands {
    pub min: f64,
    pub max: f64,
    /// At or below: oversold, bullish.
    pub lower: f64,
    /// At or above: overbought, bearish.
    pub upper: f64,
}

impl OscillatorBands {
    pub const fn new(min: f64, max: f64, lower: f64, upper: f64) -> Self {
        Self {
            min,
            max,
            lower,
            upper,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let values = [self.min, self.max, self.lower, self.upper];
        if values.iter().any(|v| !v.is_finite()) {
            return Err("oscillator bands must be finite".to_string());
        }
        if !(self.min < self.lower && self.lower < self.upper && self.upper < self.max) {
            return Err(format!(
                "expected min < lower < upper < max, got {}/{}/{}/{}",
                self.min, self.lower, self.upper, self.max
            ));
        }
        Ok(())
    }
}

/// Curve for line-versus-line trend readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendCurve {
    /// Relative spreads inside `±neutral_band` read as neutral.
    pub neutral_band: f64,
    /// Relative spread that maps to full magnitude.
    pub full_scale: f64,
    /// Added to the magnitude on a same-direction crossover at the last bar.
    pub crossover_boost: f64,
}

impl Default for TrendCurve {
    fn default() -> Self {
        Self {
            neutral_band: 0.0005,
            full_scale: 0.02,
            crossover_boost: 0.25,
        }
    }
}

impl TrendCurve {
    pub const fn new(neutral_band: f64, full_scale: f64, crossover_boost: f64) -> Self {
        Self {
            neutral_band,
            full_scale,
            crossover_boost,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.neutral_band.is_finite() && self.neutral_band >= 0.0) {
            return Err("trend neutral_band must be finite and non-negative".to_string());
        }
        if !(self.full_scale.is_finite() && self.full_scale > 0.0) {
            return Err("trend full_scale must be finite and positive".to_string());
        }
        if !(self.crossover_boost.is_finite() && (0.0..=1.0).contains(&self.crossover_boost)) {
            return Err("trend crossover_boost must be within [0, 1]".to_string());
        }
        Ok(())
    }
}

/// Curve for price-in-envelope readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandCurve {
    /// Band position (in half widths) where the reading turns directional.
    pub edge: f64,
    /// Band position that maps to full magnitude.
    pub saturation: f64,
}

impl Default for BandCurve {
    fn default() -> Self {
        Self {
            edge: 1.0,
            saturation: 2.0,
        }
    }
}

impl BandCurve {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.edge.is_finite() && self.edge > 0.0) {
            return Err("band edge must be finite and positive".to_string());
        }
        if !(self.saturation.is_finite() && self.saturation >= self.edge) {
            return Err("band saturation must be finite and not below the edge".to_string());
        }
        Ok(())
    }
}

/// Curve for flow-versus-baseline readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowCurve {
    pub neutral_band: f64,
    pub full_scale: f64,
}

impl Default for FlowCurve {
    fn default() -> Self {
        Self {
            neutral_band: 0.1,
            full_scale: 2.0,
        }
    }
}

impl FlowCurve {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.neutral_band.is_finite() && self.neutral_band >= 0.0) {
            return Err("flow neutral_band must be finite and non-negative".to_string());
        }
        if !(self.full_scale.is_finite() && self.full_scale > 0.0) {
            return Err("flow full_scale must be finite and positive".to_string());
        }
        Ok(())
    }
}

/// Parameters of every normalization curve.
///
/// Configured `oscillators` and `trend` entries are merged over the built-in
/// ones, so overriding one indicator keeps the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    #[serde(deserialize_with = "oscillators_over_defaults")]
    pub oscillators: BTreeMap<IndicatorType, OscillatorBands>,
    /// Trend curve per indicator; indicators not listed use `trend_default`.
    #[serde(deserialize_with = "trend_over_defaults")]
    pub trend: BTreeMap<IndicatorType, TrendCurve>,
    pub trend_default: TrendCurve,
    pub volatility: BandCurve,
    pub volume: FlowCurve,
}

fn default_oscillator_bands() -> BTreeMap<IndicatorType, OscillatorBands> {
    BTreeMap::from([
        (IndicatorType::Rsi, OscillatorBands::new(0.0, 100.0, 30.0, 70.0)),
        (IndicatorType::Stochastic, OscillatorBands::new(0.0, 100.0, 20.0, 80.0)),
        (IndicatorType::WilliamsR, OscillatorBands::new(-100.0, 0.0, -80.0, -20.0)),
    ])
}

fn default_trend_curves() -> BTreeMap<IndicatorType, TrendCurve> {
    // MACD spreads are scaled by price and run much tighter than MA spreads
    BTreeMap::from([
        (IndicatorType::Macd, TrendCurve::new(0.0001, 0.005, 0.25)),
        (IndicatorType::SmaCross, TrendCurve::new(0.001, 0.05, 0.25)),
        (IndicatorType::EmaCross, TrendCurve::new(0.0005, 0.03, 0.25)),
    ])
}

fn oscillators_over_defaults<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<IndicatorType, OscillatorBands>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut bands = default_oscillator_bands();
    bands.extend(BTreeMap::<IndicatorType, OscillatorBands>::deserialize(deserializer)?);
    Ok(bands)
}

fn trend_over_defaults<'de, D>(deserializer: D) -> Result<BTreeMap<IndicatorType, TrendCurve>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut curves = default_trend_curves();
    curves.extend(BTreeMap::<IndicatorType, TrendCurve>::deserialize(deserializer)?);
    Ok(curves)
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            oscillators: default_oscillator_bands(),
            trend: default_trend_curves(),
            trend_default: TrendCurve::default(),
            volatility: BandCurve::default(),
            volume: FlowCurve::default(),
        }
    }
}

impl NormalizationConfig {
    pub fn validate(&self) -> Result<(), String> {
        for indicator in IndicatorType::all() {
            if indicator.default_kind() == IndicatorKind::Oscillator
                && !self.oscillators.contains_key(&indicator)
            {
                return Err(format!("{}: oscillator bands are missing", indicator));
            }
        }
        for (indicator, bands) in &self.oscillators {
            bands
                .validate()
                .map_err(|reason| format!("{}: {}", indicator, reason))?;
        }
        for (indicator, curve) in &self.trend {
            curve
                .validate()
                .map_err(|reason| format!("{}: {}", indicator, reason))?;
        }
        self.trend_default.validate()?;
        self.volatility.validate()?;
        self.volume.validate()
    }
}

/// Direction and magnitude for one kind of raw reading.
///
/// Returns `None` when the reading's shape is not one the strategy handles.
pub trait NormalizationStrategy: Send + Sync {
    fn kind(&self) -> IndicatorKind;

    fn map(&self, spec: &IndicatorSpec, raw: &RawReading) -> Option<(Direction, f64)>;
}

/// Bounded oscillators: oversold reads bullish, overbought bearish.
pub struct OscillatorStrategy {
    bands: BTreeMap<IndicatorType, OscillatorBands>,
}

impl OscillatorStrategy {
    pub fn new(bands: BTreeMap<IndicatorType, OscillatorBands>) -> Self {
        Self { bands }
    }
}

impl NormalizationStrategy for OscillatorStrategy {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Oscillator
    }

    fn map(&self, spec: &IndicatorSpec, raw: &RawReading) -> Option<(Direction, f64)> {
        let RawReading::Level { value } = *raw else {
            return None;
        };
        let bands = self.bands.get(&spec.indicator_type())?;
        let direction = if value <= bands.lower {
            Direction::Bullish
        } else if value >= bands.upper {
            Direction::Bearish
        } else {
            return Some((Direction::Neutral, 0.0));
        };
        Some((direction, distance_from_midpoint(value, bands.min, bands.max)))
    }
}

/// Fast line against slow line, scaled by a reference price.
pub struct TrendStrategy {
    curves: BTreeMap<IndicatorType, TrendCurve>,
    fallback: TrendCurve,
}

impl TrendStrategy {
    pub fn new(curves: BTreeMap<IndicatorType, TrendCurve>, fallback: TrendCurve) -> Self {
        Self { curves, fallback }
    }

    fn curve(&self, indicator: IndicatorType) -> &TrendCurve {
        self.curves.get(&indicator).unwrap_or(&self.fallback)
    }
}

impl NormalizationStrategy for TrendStrategy {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Trend
    }

    fn map(&self, spec: &IndicatorSpec, raw: &RawReading) -> Option<(Direction, f64)> {
        let RawReading::Spread {
            fast,
            slow,
            reference,
            crossed,
        } = *raw
        else {
            return None;
        };
        let curve = self.curve(spec.indicator_type());
        let spread = relative_spread(fast, slow, reference);
        if spread.abs() <= curve.neutral_band {
            return Some((Direction::Neutral, 0.0));
        }
        let direction = Direction::from_sign(spread);
        let mut magnitude = spread.abs() / curve.full_scale;
        if crossed == Some(direction) {
            magnitude += curve.crossover_boost;
        }
        Some((direction, clamp_unit(magnitude)))
    }
}

/// Mean reversion at the edges of an envelope.
pub struct BandStrategy {
    curve: BandCurve,
}

impl BandStrategy {
    pub fn new(curve: BandCurve) -> Self {
        Self { curve }
    }
}

impl NormalizationStrategy for BandStrategy {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Volatility
    }

    fn map(&self, _spec: &IndicatorSpec, raw: &RawReading) -> Option<(Direction, f64)> {
        let RawReading::Band {
            price,
            lower,
            middle,
            upper,
        } = *raw
        else {
            return None;
        };
        let Some(position) = band_position(price, lower, middle, upper) else {
            return Some((Direction::Neutral, 0.0));
        };
        if position.abs() < self.curve.edge {
            return Some((Direction::Neutral, 0.0));
        }
        // above the upper band is stretched to the upside: bearish
        let direction = Direction::from_sign(-position);
        Some((direction, clamp_unit(position.abs() / self.curve.saturation)))
    }
}

/// Accumulated volume flow against its own baseline.
pub struct FlowStrategy {
    curve: FlowCurve,
}

impl FlowStrategy {
    pub fn new(curve: FlowCurve) -> Self {
        Self { curve }
    }
}

impl NormalizationStrategy for FlowStrategy {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Volume
    }

    fn map(&self, _spec: &IndicatorSpec, raw: &RawReading) -> Option<(Direction, f64)> {
        let RawReading::Flow { delta, scale } = *raw else {
            return None;
        };
        if scale <= 0.0 {
            return Some((Direction::Neutral, 0.0));
        }
        let ratio = delta / scale;
        if ratio.abs() <= self.curve.neutral_band {
            return Some((Direction::Neutral, 0.0));
        }
        Some((
            Direction::from_sign(ratio),
            clamp_unit(ratio.abs() / self.curve.full_scale),
        ))
    }
}

/// Registry of normalization strategies keyed by indicator kind.
pub struct Normalizer {
    strategies: BTreeMap<IndicatorKind, Box<dyn NormalizationStrategy>>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&NormalizationConfig::default())
    }
}

impl Normalizer {
    /// Registry with no strategies.
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &NormalizationConfig) -> Self {
        let mut normalizer = Self::empty();
        normalizer.register(Box::new(OscillatorStrategy::new(config.oscillators.clone())));
        normalizer.register(Box::new(TrendStrategy::new(
            config.trend.clone(),
            config.trend_default,
        )));
        normalizer.register(Box::new(BandStrategy::new(config.volatility)));
        normalizer.register(Box::new(FlowStrategy::new(config.volume)));
        normalizer
    }

    /// Register a strategy, replacing any previous one for the same kind.
    pub fn register(&mut self, strategy: Box<dyn NormalizationStrategy>) {
        self.strategies.insert(strategy.kind(), strategy);
    }

    pub fn kinds(&self) -> impl Iterator<Item = IndicatorKind> + '_ {
        self.strategies.keys().copied()
    }

    /// Normalize a reading produced for `spec`.
    ///
    /// Missing and invalid readings come back neutral with zero reliability.
    pub fn normalize(
        &self,
        reading: &IndicatorReading,
        spec: &IndicatorSpec,
    ) -> Result<NormalizedSignal, FusionError> {
        if reading.spec_id != spec.id() {
            return Err(FusionError::SpecMismatch {
                expected: spec.id().to_string(),
                found: reading.spec_id.clone(),
            });
        }

        let raw = match &reading.value {
            ReadingValue::Present { raw } => raw,
            ReadingValue::Missing | ReadingValue::Invalid => {
                return Ok(NormalizedSignal::no_data(spec.id(), spec.kind()));
            }
        };

        let unsupported = || FusionError::UnsupportedReading {
            indicator: spec.id().to_string(),
            kind: spec.kind(),
        };
        let strategy = self.strategies.get(&spec.kind()).ok_or_else(unsupported)?;
        let (direction, magnitude) = strategy.map(spec, raw).ok_or_else(unsupported)?;

        let magnitude = clamp_unit(magnitude);
        let direction = if magnitude == 0.0 {
            Direction::Neutral
        } else {
            direction
        };
        Ok(NormalizedSignal::new(
            spec.id(),
            spec.kind(),
            direction,
            magnitude,
            clamp_unit(reading.history_coverage()),
        ))
    }
}
