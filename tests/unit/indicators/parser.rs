//! Unit tests for the indicator selection syntax

use fusetrix::indicators::parser::{format_selection, parse_indicator_type, parse_selection};
use fusetrix::indicators::IndicatorError;
use fusetrix::models::indicators::{IndicatorKind, IndicatorParams, IndicatorType};

#[test]
fn test_parse_selection_with_params() {
    let spec = parse_selection("rsi:21").unwrap();
    assert_eq!(spec.id(), "rsi_21");
    assert_eq!(spec.kind(), IndicatorKind::Oscillator);
    assert_eq!(spec.params(), &IndicatorParams::Rsi { period: 21 });
}

#[test]
fn test_parse_selection_defaults() {
    assert_eq!(parse_selection("macd").unwrap().id(), "macd_12_26_9");
    assert_eq!(parse_selection("sma_cross").unwrap().id(), "sma_cross_50_200");
    assert_eq!(parse_selection("bbands").unwrap().id(), "bollinger_20_2");
    assert_eq!(parse_selection("stochastic:5").unwrap().id(), "stochastic_5_3");
}

#[test]
fn test_parse_selection_assigns_kinds() {
    assert_eq!(parse_selection("macd:12,26,9").unwrap().kind(), IndicatorKind::Trend);
    assert_eq!(parse_selection("bollinger:20,2.5").unwrap().kind(), IndicatorKind::Volatility);
    assert_eq!(parse_selection("obv:20").unwrap().kind(), IndicatorKind::Volume);
}

#[test]
fn test_parse_indicator_aliases() {
    assert_eq!(parse_indicator_type("WILLR").unwrap(), IndicatorType::WilliamsR);
    assert_eq!(parse_indicator_type("stoch").unwrap(), IndicatorType::Stochastic);
    assert_eq!(parse_indicator_type(" ma_cross ").unwrap(), IndicatorType::SmaCross);
}

#[test]
fn test_parse_selection_errors() {
    assert!(matches!(
        parse_selection("vwap"),
        Err(IndicatorError::UnknownIndicator(_))
    ));
    assert!(matches!(
        parse_selection("rsi:abc"),
        Err(IndicatorError::InvalidNumericFormat(_))
    ));
    assert!(matches!(
        parse_selection("macd:12,26"),
        Err(IndicatorError::WrongParameterCount { found: 2, .. })
    ));
    assert!(matches!(
        parse_selection("rsi:0"),
        Err(IndicatorError::InvalidParameter { .. })
    ));
    assert!(matches!(
        parse_selection("sma_cross:200,50"),
        Err(IndicatorError::InvalidParameter { .. })
    ));
}

#[test]
fn test_format_selection_parses_back() {
    for selection in ["rsi:14", "macd:8,21,5", "ema_cross:10,30", "bollinger:20,2.5", "stochastic:14,3"] {
        let spec = parse_selection(selection).unwrap();
        let formatted = format_selection(spec.params());
        assert_eq!(formatted, selection);
        assert_eq!(parse_selection(&formatted).unwrap(), spec);
    }
}
