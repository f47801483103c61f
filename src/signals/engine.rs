//! Signal fusion engine
//!
//! Combines normalized signals into one composite score under a weighting
//! profile. Pure: no I/O, no shared state, identical inputs give identical
//! results apart from `evaluated_at`.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::FusionError;
use crate::models::profile::WeightingProfile;
use crate::models::signal::{
    Attribution, Direction, FusionResult, NormalizedSignal, Recommendation,
};
use crate::signals::attribution::{self, weighted_evidence};
use crate::signals::decision::RecommendationThresholds;
use crate::signals::scoring::{clamp_signed, clamp_unit};

#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    thresholds: RecommendationThresholds,
}

impl FusionEngine {
    pub fn new(thresholds: RecommendationThresholds) -> Result<Self, FusionError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &RecommendationThresholds {
        &self.thresholds
    }

    /// Fuse `signals` under `profile`, stamped with the current time.
    pub fn fuse(
        &self,
        signals: &[NormalizedSignal],
        profile: &WeightingProfile,
    ) -> Result<FusionResult, FusionError> {
        self.fuse_at(signals, profile, Utc::now())
    }

    pub fn fuse_at(
        &self,
        signals: &[NormalizedSignal],
        profile: &WeightingProfile,
        evaluated_at: DateTime<Utc>,
    ) -> Result<FusionResult, FusionError> {
        for signal in signals {
            validate_signal(signal)?;
        }
        profile.validate()?;

        let mut entries: Vec<_> = signals
            .iter()
            .map(|signal| attribution::weigh(signal, profile))
            .collect();

        let total_weight: f64 = entries
            .iter()
            .filter(|e| e.is_included())
            .map(|e| e.effective_weight)
            .sum();

        if !total_weight.is_finite() {
            return Err(FusionError::invalid_profile(
                profile.name(),
                "effective weight total is not finite",
            ));
        }
        if total_weight <= 0.0 {
            debug!(
                profile = profile.name(),
                signals = signals.len(),
                "No weighted evidence, holding"
            );
            attribution::rank(&mut entries);
            return Ok(FusionResult {
                instrument: None,
                price: None,
                composite_score: 0.0,
                recommendation: Recommendation::Hold,
                confidence: 0.0,
                agreement: 0.0,
                total_weight: 0.0,
                insufficient_evidence: true,
                profile: profile.name().to_string(),
                attribution: entries,
                evaluated_at,
            });
        }

        for entry in entries.iter_mut() {
            entry.contribution = weighted_evidence(entry) / total_weight;
        }
        let raw_score: f64 = entries.iter().map(|e| e.contribution).sum();
        let composite_score = clamp_signed(raw_score);
        let agreement = agreement(&entries, composite_score);
        let confidence = clamp_unit(composite_score.abs() * agreement);
        let recommendation = self.thresholds.recommend(composite_score);

        attribution::rank(&mut entries);

        debug!(
            profile = profile.name(),
            score = composite_score,
            confidence,
            recommendation = %recommendation,
            "Fused signals"
        );

        Ok(FusionResult {
            instrument: None,
            price: None,
            composite_score,
            recommendation,
            confidence,
            agreement,
            total_weight,
            insufficient_evidence: false,
            profile: profile.name().to_string(),
            attribution: entries,
            evaluated_at,
        })
    }
}

fn validate_signal(signal: &NormalizedSignal) -> Result<(), FusionError> {
    let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
    if !in_unit(signal.magnitude) {
        return Err(FusionError::invalid_signal(
            &signal.indicator,
            format!("magnitude {} is outside [0, 1]", signal.magnitude),
        ));
    }
    if !in_unit(signal.reliability) {
        return Err(FusionError::invalid_signal(
            &signal.indicator,
            format!("reliability {} is outside [0, 1]", signal.reliability),
        ));
    }
    Ok(())
}

/// Share of directional evidence pointing the same way as the score.
fn agreement(entries: &[Attribution], score: f64) -> f64 {
    let direction = Direction::from_sign(score);
    if direction == Direction::Neutral {
        return 0.0;
    }
    let mut agreeing = 0.0;
    let mut total = 0.0;
    for entry in entries
        .iter()
        .filter(|e| e.is_included() && e.direction != Direction::Neutral)
    {
        let evidence = entry.magnitude * entry.effective_weight;
        total += evidence;
        if entry.direction == direction {
            agreeing += evidence;
        }
    }
    if total <= 0.0 {
        return 0.0;
    }
    clamp_unit(agreeing / total)
}
