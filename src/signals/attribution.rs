//! Per-indicator attribution of a fusion result

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::indicators::IndicatorKind;
use crate::models::profile::WeightingProfile;
use crate::models::signal::{
    Attribution, AttributionStatus, Direction, ExclusionReason, FusionResult, NormalizedSignal,
};

/// Status and weights of one signal under a profile, before contributions
/// are known.
pub fn weigh(signal: &NormalizedSignal, profile: &WeightingProfile) -> Attribution {
    let base_weight = profile.weight_for(&signal.indicator, signal.kind);
    let status = if signal.reliability == 0.0 {
        AttributionStatus::Excluded(ExclusionReason::NoData)
    } else if base_weight.is_none() {
        AttributionStatus::Excluded(ExclusionReason::Unweighted)
    } else {
        AttributionStatus::Included
    };
    let effective_weight = match status {
        AttributionStatus::Included => base_weight.unwrap_or(0.0) * signal.reliability,
        AttributionStatus::Excluded(_) => 0.0,
    };

    Attribution {
        indicator: signal.indicator.clone(),
        kind: signal.kind,
        direction: signal.direction,
        magnitude: signal.magnitude,
        reliability: signal.reliability,
        status,
        base_weight,
        effective_weight,
        contribution: 0.0,
    }
}

/// Signed weighted evidence of an entry: `sign × magnitude × weight`.
pub fn weighted_evidence(entry: &Attribution) -> f64 {
    if !entry.is_included() {
        return 0.0;
    }
    entry.direction.sign() * entry.magnitude * entry.effective_weight
}

/// Order entries by absolute contribution, largest first.
///
/// The sort is stable, so ties keep their input order.
pub fn rank(entries: &mut [Attribution]) {
    entries.sort_by(|a, b| {
        b.contribution
            .abs()
            .partial_cmp(&a.contribution.abs())
            .unwrap_or(Ordering::Equal)
    });
}

/// The `n` included entries that moved the score the most.
pub fn top_contributors(result: &FusionResult, n: usize) -> Vec<&Attribution> {
    result
        .included()
        .filter(|a| a.contribution != 0.0)
        .take(n)
        .collect()
}

/// Sum of contributions per indicator kind.
pub fn contribution_by_kind(result: &FusionResult) -> BTreeMap<IndicatorKind, f64> {
    let mut by_kind = BTreeMap::new();
    for entry in result.included() {
        *by_kind.entry(entry.kind).or_insert(0.0) += entry.contribution;
    }
    by_kind
}

/// One line of text per attribution entry, in ranking order.
pub fn explain(result: &FusionResult) -> Vec<String> {
    result
        .attribution
        .iter()
        .map(|entry| match entry.status {
            AttributionStatus::Included => format!(
                "{} ({}) {} magnitude {:.2}, weight {:.3}, contribution {:+.3}",
                entry.indicator,
                entry.kind,
                direction_label(entry),
                entry.magnitude,
                entry.effective_weight,
                entry.contribution
            ),
            AttributionStatus::Excluded(reason) => {
                format!("{} ({}) excluded: {}", entry.indicator, entry.kind, reason.as_str())
            }
        })
        .collect()
}

fn direction_label(entry: &Attribution) -> &'static str {
    match entry.direction {
        Direction::Bullish => "bullish",
        Direction::Bearish => "bearish",
        Direction::Neutral => "neutral",
    }
}
