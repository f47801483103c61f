//! Shared, read-only fusion context
//!
//! Bundles the normalizer registry, the profile registry and the engine so a
//! request only needs one handle. Built once at startup and shared behind an
//! `Arc`.

use chrono::{DateTime, Utc};

use crate::error::FusionError;
use crate::models::indicators::{IndicatorReading, IndicatorSpec};
use crate::models::profile::WeightingProfile;
use crate::models::signal::{FusionResult, NormalizedSignal};
use crate::signals::engine::FusionEngine;
use crate::signals::normalizer::Normalizer;
use crate::signals::profiles::ProfileRegistry;

#[derive(Default)]
pub struct FusionContext {
    normalizer: Normalizer,
    profiles: ProfileRegistry,
    engine: FusionEngine,
}

impl FusionContext {
    pub fn new(normalizer: Normalizer, profiles: ProfileRegistry, engine: FusionEngine) -> Self {
        Self {
            normalizer,
            profiles,
            engine,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    pub fn engine(&self) -> &FusionEngine {
        &self.engine
    }

    /// Normalize every `(spec, reading)` pair, in order.
    pub fn normalize_all(
        &self,
        readings: &[(IndicatorSpec, IndicatorReading)],
    ) -> Result<Vec<NormalizedSignal>, FusionError> {
        readings
            .iter()
            .map(|(spec, reading)| self.normalizer.normalize(reading, spec))
            .collect()
    }

    /// Normalize then fuse under an already resolved profile, stamped `evaluated_at`.
    pub fn evaluate_at(
        &self,
        readings: &[(IndicatorSpec, IndicatorReading)],
        profile: &WeightingProfile,
        evaluated_at: DateTime<Utc>,
    ) -> Result<FusionResult, FusionError> {
        let signals = self.normalize_all(readings)?;
        self.engine.fuse_at(&signals, profile, evaluated_at)
    }
}
