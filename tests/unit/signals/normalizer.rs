//! Unit tests for indicator normalization

use fusetrix::error::FusionError;
use fusetrix::indicators::parser::parse_selection;
use fusetrix::indicators::validation::validate_spec_with_kind;
use fusetrix::models::indicators::{
    IndicatorKind, IndicatorParams, IndicatorReading, IndicatorSpec, RawReading,
};
use fusetrix::models::signal::Direction;
use fusetrix::signals::normalizer::{NormalizationConfig, Normalizer};

fn spec(selection: &str) -> IndicatorSpec {
    parse_selection(selection).unwrap()
}

/// Reading with full history behind it.
fn full(spec: &IndicatorSpec, raw: RawReading) -> IndicatorReading {
    IndicatorReading::present(spec, raw, spec.params().stable_lookback())
}

fn level(value: f64) -> RawReading {
    RawReading::Level { value }
}

#[test]
fn test_rsi_oversold_is_bullish() {
    let normalizer = Normalizer::default();
    let rsi = spec("rsi:14");
    let signal = normalizer.normalize(&full(&rsi, level(20.0)), &rsi).unwrap();

    assert_eq!(signal.indicator, "rsi_14");
    assert_eq!(signal.kind, IndicatorKind::Oscillator);
    assert_eq!(signal.direction, Direction::Bullish);
    assert!((signal.magnitude - 0.6).abs() < 1e-12);
    assert_eq!(signal.reliability, 1.0);
}

#[test]
fn test_rsi_overbought_is_bearish() {
    let normalizer = Normalizer::default();
    let rsi = spec("rsi:14");
    let signal = normalizer.normalize(&full(&rsi, level(85.0)), &rsi).unwrap();
    assert_eq!(signal.direction, Direction::Bearish);
    assert!((signal.magnitude - 0.7).abs() < 1e-12);
}

#[test]
fn test_rsi_inside_bands_is_neutral() {
    let normalizer = Normalizer::default();
    let rsi = spec("rsi:14");
    for value in [31.0, 50.0, 69.9] {
        let signal = normalizer.normalize(&full(&rsi, level(value)), &rsi).unwrap();
        assert_eq!(signal.direction, Direction::Neutral);
        assert_eq!(signal.magnitude, 0.0);
    }
    let edge = normalizer.normalize(&full(&rsi, level(30.0)), &rsi).unwrap();
    assert_eq!(edge.direction, Direction::Bullish);
    assert!((edge.magnitude - 0.4).abs() < 1e-12);
}

#[test]
fn test_williams_r_uses_its_own_range() {
    let normalizer = Normalizer::default();
    let willr = spec("williams_r:14");
    let signal = normalizer.normalize(&full(&willr, level(-90.0)), &willr).unwrap();
    assert_eq!(signal.direction, Direction::Bullish);
    assert!((signal.magnitude - 0.8).abs() < 1e-12);
}

#[test]
fn test_reliability_scales_with_history() {
    let normalizer = Normalizer::default();
    let rsi = spec("rsi:14");
    let reading = IndicatorReading::present(&rsi, level(20.0), 20);
    let signal = normalizer.normalize(&reading, &rsi).unwrap();
    assert!((signal.reliability - 20.0 / 43.0).abs() < 1e-12);
}

#[test]
fn test_missing_and_invalid_readings_have_no_data() {
    let normalizer = Normalizer::default();
    let rsi = spec("rsi:14");

    let missing = normalizer
        .normalize(&IndicatorReading::missing(&rsi, 5), &rsi)
        .unwrap();
    assert_eq!(missing.direction, Direction::Neutral);
    assert_eq!(missing.magnitude, 0.0);
    assert_eq!(missing.reliability, 0.0);

    let invalid = normalizer
        .normalize(&full(&rsi, level(f64::NAN)), &rsi)
        .unwrap();
    assert_eq!(invalid.reliability, 0.0);
}

#[test]
fn test_spec_mismatch_is_an_error() {
    let normalizer = Normalizer::default();
    let rsi = spec("rsi:14");
    let other = spec("rsi:21");
    let err = normalizer
        .normalize(&full(&rsi, level(20.0)), &other)
        .unwrap_err();
    assert_eq!(
        err,
        FusionError::SpecMismatch {
            expected: "rsi_21".to_string(),
            found: "rsi_14".to_string(),
        }
    );
}

#[test]
fn test_trend_spread_magnitude_and_crossover_boost() {
    let normalizer = Normalizer::default();
    let sma = spec("sma_cross:50,200");
    let spread = |crossed| RawReading::Spread {
        fast: 102.0,
        slow: 100.0,
        reference: 100.0,
        crossed,
    };

    // 2% spread against a 5% full scale
    let plain = normalizer.normalize(&full(&sma, spread(None)), &sma).unwrap();
    assert_eq!(plain.direction, Direction::Bullish);
    assert!((plain.magnitude - 0.4).abs() < 1e-9);

    let fresh = normalizer
        .normalize(&full(&sma, spread(Some(Direction::Bullish))), &sma)
        .unwrap();
    assert!((fresh.magnitude - 0.65).abs() < 1e-9);

    // a crossover against the spread does not boost
    let stale = normalizer
        .normalize(&full(&sma, spread(Some(Direction::Bearish))), &sma)
        .unwrap();
    assert!((stale.magnitude - 0.4).abs() < 1e-9);
}

#[test]
fn test_trend_inside_neutral_band() {
    let normalizer = Normalizer::default();
    let sma = spec("sma_cross:50,200");
    let raw = RawReading::Spread {
        fast: 100.05,
        slow: 100.0,
        reference: 100.0,
        crossed: None,
    };
    let signal = normalizer.normalize(&full(&sma, raw), &sma).unwrap();
    assert_eq!(signal.direction, Direction::Neutral);
    assert_eq!(signal.magnitude, 0.0);
}

#[test]
fn test_bands_read_as_mean_reversion() {
    let normalizer = Normalizer::default();
    let bb = spec("bollinger:20,2");
    let band = |price| RawReading::Band {
        price,
        lower: 90.0,
        middle: 100.0,
        upper: 110.0,
    };

    let above = normalizer.normalize(&full(&bb, band(115.0)), &bb).unwrap();
    assert_eq!(above.direction, Direction::Bearish);
    assert!((above.magnitude - 0.75).abs() < 1e-12);

    let below = normalizer.normalize(&full(&bb, band(88.0)), &bb).unwrap();
    assert_eq!(below.direction, Direction::Bullish);
    assert!((below.magnitude - 0.6).abs() < 1e-12);

    let inside = normalizer.normalize(&full(&bb, band(105.0)), &bb).unwrap();
    assert_eq!(inside.direction, Direction::Neutral);
}

#[test]
fn test_degenerate_band_is_neutral() {
    let normalizer = Normalizer::default();
    let bb = spec("bollinger:20,2");
    let raw = RawReading::Band {
        price: 100.0,
        lower: 100.0,
        middle: 100.0,
        upper: 100.0,
    };
    let signal = normalizer.normalize(&full(&bb, raw), &bb).unwrap();
    assert_eq!(signal.direction, Direction::Neutral);
    assert_eq!(signal.magnitude, 0.0);
    assert_eq!(signal.reliability, 1.0);
}

#[test]
fn test_flow_ratio() {
    let normalizer = Normalizer::default();
    let obv = spec("obv:20");

    let strong = normalizer
        .normalize(&full(&obv, RawReading::Flow { delta: -300.0, scale: 100.0 }), &obv)
        .unwrap();
    assert_eq!(strong.direction, Direction::Bearish);
    assert_eq!(strong.magnitude, 1.0);

    let half = normalizer
        .normalize(&full(&obv, RawReading::Flow { delta: 100.0, scale: 100.0 }), &obv)
        .unwrap();
    assert_eq!(half.direction, Direction::Bullish);
    assert!((half.magnitude - 0.5).abs() < 1e-12);

    let no_volume = normalizer
        .normalize(&full(&obv, RawReading::Flow { delta: 100.0, scale: 0.0 }), &obv)
        .unwrap();
    assert_eq!(no_volume.direction, Direction::Neutral);
}

#[test]
fn test_kind_mismatch_is_unsupported() {
    let normalizer = Normalizer::default();
    let rsi_as_volume =
        validate_spec_with_kind(IndicatorParams::Rsi { period: 14 }, IndicatorKind::Volume).unwrap();
    let err = normalizer
        .normalize(&full(&rsi_as_volume, level(20.0)), &rsi_as_volume)
        .unwrap_err();
    assert!(matches!(
        err,
        FusionError::UnsupportedReading {
            kind: IndicatorKind::Volume,
            ..
        }
    ));
}

#[test]
fn test_empty_registry_rejects_present_readings() {
    let normalizer = Normalizer::empty();
    let rsi = spec("rsi:14");
    assert!(normalizer.normalize(&full(&rsi, level(20.0)), &rsi).is_err());
    // no strategy is needed to report missing data
    assert!(normalizer
        .normalize(&IndicatorReading::missing(&rsi, 0), &rsi)
        .is_ok());
}

#[test]
fn test_custom_bands_from_config() {
    let mut config = NormalizationConfig::default();
    config.oscillators.insert(
        fusetrix::models::indicators::IndicatorType::Rsi,
        fusetrix::signals::OscillatorBands::new(0.0, 100.0, 20.0, 80.0),
    );
    assert!(config.validate().is_ok());

    let normalizer = Normalizer::from_config(&config);
    let rsi = spec("rsi:14");
    let signal = normalizer.normalize(&full(&rsi, level(25.0)), &rsi).unwrap();
    assert_eq!(signal.direction, Direction::Neutral);
}

#[test]
fn test_partial_band_override_keeps_other_oscillators() {
    let json = r#"{"oscillators":{"rsi":{"min":0,"max":100,"lower":25,"upper":75}}}"#;
    let config: NormalizationConfig = serde_json::from_str(json).unwrap();
    assert!(config.validate().is_ok());

    let normalizer = Normalizer::from_config(&config);
    let rsi = spec("rsi:14");
    let neutral = normalizer.normalize(&full(&rsi, level(28.0)), &rsi).unwrap();
    assert_eq!(neutral.direction, Direction::Neutral);

    let stochastic = spec("stochastic:14,3");
    let signal = normalizer
        .normalize(&full(&stochastic, level(10.0)), &stochastic)
        .unwrap();
    assert_eq!(signal.direction, Direction::Bullish);
    assert!((signal.magnitude - 0.8).abs() < 1e-12);
}
