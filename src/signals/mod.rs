//! Normalization, weighting and fusion of indicator signals.

pub mod attribution;
pub mod categories;
pub mod context;
pub mod decision;
pub mod engine;
pub mod normalizer;
pub mod profiles;
pub mod scoring;

pub use categories::KindWeights;
pub use context::FusionContext;
pub use decision::RecommendationThresholds;
pub use engine::FusionEngine;
pub use normalizer::{
    BandCurve, FlowCurve, NormalizationConfig, NormalizationStrategy, Normalizer,
    OscillatorBands, TrendCurve,
};
pub use profiles::{builtin_profiles, ProfileDefinition, ProfileRegistry, DEFAULT_PROFILE};
