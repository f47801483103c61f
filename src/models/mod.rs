//! Shared data models spanning the engine layers.

pub mod indicators;
pub mod profile;
pub mod signal;

pub use indicators::{
    Candle, IndicatorKind, IndicatorParams, IndicatorReading, IndicatorSpec, IndicatorType,
    PriceSeries, RawReading, ReadingValue, SeriesError,
};
pub use profile::{WeightOverrides, WeightingProfile, WeightingProfileBuilder};
pub use signal::{
    Attribution, AttributionStatus, Direction, ExclusionReason, FusionResult, NormalizedSignal,
    Recommendation,
};
