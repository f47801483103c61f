//! Unit tests for attribution helpers

use fusetrix::models::indicators::IndicatorKind;
use fusetrix::models::profile::WeightingProfile;
use fusetrix::models::signal::{
    AttributionStatus, Direction, ExclusionReason, FusionResult, NormalizedSignal,
};
use fusetrix::signals::attribution::{
    contribution_by_kind, explain, rank, top_contributors, weigh, weighted_evidence,
};
use fusetrix::signals::FusionEngine;

fn profile() -> WeightingProfile {
    WeightingProfile::builder("test")
        .kind(IndicatorKind::Oscillator, 1.0)
        .kind(IndicatorKind::Trend, 2.0)
        .build()
        .unwrap()
}

fn fused() -> FusionResult {
    let signals = vec![
        NormalizedSignal::new("rsi_14", IndicatorKind::Oscillator, Direction::Bullish, 0.6, 1.0),
        NormalizedSignal::new("williams_r_14", IndicatorKind::Oscillator, Direction::Bearish, 0.2, 1.0),
        NormalizedSignal::new("macd_12_26_9", IndicatorKind::Trend, Direction::Bullish, 0.5, 1.0),
        NormalizedSignal::no_data("ema_cross_12_26", IndicatorKind::Trend),
        NormalizedSignal::new("obv_20", IndicatorKind::Volume, Direction::Bullish, 1.0, 1.0),
    ];
    FusionEngine::default().fuse(&signals, &profile()).unwrap()
}

#[test]
fn test_weigh_assigns_status() {
    let profile = profile();
    let included = weigh(
        &NormalizedSignal::new("rsi_14", IndicatorKind::Oscillator, Direction::Bullish, 0.5, 0.5),
        &profile,
    );
    assert!(included.is_included());
    assert_eq!(included.base_weight, Some(1.0));
    assert!((included.effective_weight - 0.5).abs() < 1e-12);
    assert!((weighted_evidence(&included) - 0.25).abs() < 1e-12);

    // no data wins over unweighted
    let excluded = weigh(&NormalizedSignal::no_data("obv_20", IndicatorKind::Volume), &profile);
    assert_eq!(excluded.status, AttributionStatus::Excluded(ExclusionReason::NoData));
    assert_eq!(weighted_evidence(&excluded), 0.0);
}

#[test]
fn test_rank_orders_by_absolute_contribution() {
    let profile = profile();
    let mut entries: Vec<_> = [0.1, -0.4, 0.3]
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let mut entry = weigh(
                &NormalizedSignal::new(
                    format!("s{}", i),
                    IndicatorKind::Trend,
                    Direction::from_sign(*c),
                    0.5,
                    1.0,
                ),
                &profile,
            );
            entry.contribution = *c;
            entry
        })
        .collect();
    rank(&mut entries);
    let order: Vec<&str> = entries.iter().map(|e| e.indicator.as_str()).collect();
    assert_eq!(order, vec!["s1", "s2", "s0"]);
}

#[test]
fn test_top_contributors_skip_excluded() {
    let result = fused();
    let top: Vec<&str> = top_contributors(&result, 2)
        .into_iter()
        .map(|a| a.indicator.as_str())
        .collect();
    assert_eq!(top, vec!["macd_12_26_9", "rsi_14"]);
    assert_eq!(top_contributors(&result, 10).len(), 3);
}

#[test]
fn test_contribution_by_kind() {
    let result = fused();
    let by_kind = contribution_by_kind(&result);
    // weights: rsi 1, williams 1, macd 2 => total 4
    assert!((by_kind[&IndicatorKind::Oscillator] - 0.1).abs() < 1e-12);
    assert!((by_kind[&IndicatorKind::Trend] - 0.25).abs() < 1e-12);
    assert!(!by_kind.contains_key(&IndicatorKind::Volume));
}

#[test]
fn test_explain_lists_every_entry() {
    let result = fused();
    let lines = explain(&result);
    assert_eq!(lines.len(), result.attribution.len());
    assert!(lines[0].starts_with("macd_12_26_9 (trend) bullish"));
    assert!(lines.iter().any(|l| l == "ema_cross_12_26 (trend) excluded: no_data"));
    assert!(lines.iter().any(|l| l == "obv_20 (volume) excluded: unweighted"));
}
