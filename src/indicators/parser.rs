//! Indicator selection syntax: `name` or `name:p1,p2,...`.
//!
//! Examples: `rsi`, `rsi:21`, `macd:12,26,9`, `sma_cross:50,200`,
//! `bollinger:20,2.5`. Omitted parameters take the conventional defaults.

use crate::indicators::error::IndicatorError;
use crate::indicators::validation::validate_spec;
use crate::models::indicators::{IndicatorParams, IndicatorSpec, IndicatorType};

pub fn parse_f64(value: &str) -> Result<f64, IndicatorError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| IndicatorError::InvalidNumericFormat(value.to_string()))
}

pub fn parse_u32(value: &str) -> Result<u32, IndicatorError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| IndicatorError::InvalidNumericFormat(value.to_string()))
}

pub fn parse_indicator_type(name: &str) -> Result<IndicatorType, IndicatorError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "rsi" => Ok(IndicatorType::Rsi),
        "stochastic" | "stoch" => Ok(IndicatorType::Stochastic),
        "williams_r" | "willr" | "williamsr" => Ok(IndicatorType::WilliamsR),
        "macd" => Ok(IndicatorType::Macd),
        "sma_cross" | "ma_cross" => Ok(IndicatorType::SmaCross),
        "ema_cross" => Ok(IndicatorType::EmaCross),
        "bollinger" | "bbands" | "bb" => Ok(IndicatorType::Bollinger),
        "obv" => Ok(IndicatorType::Obv),
        other => Err(IndicatorError::UnknownIndicator(other.to_string())),
    }
}

/// Parameters used when a selection names an indicator without arguments.
pub fn default_params(indicator: IndicatorType) -> IndicatorParams {
    match indicator {
        IndicatorType::Rsi => IndicatorParams::Rsi { period: 14 },
        IndicatorType::Stochastic => IndicatorParams::Stochastic {
            k_period: 14,
            d_period: 3,
        },
        IndicatorType::WilliamsR => IndicatorParams::WilliamsR { period: 14 },
        IndicatorType::Macd => IndicatorParams::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        },
        IndicatorType::SmaCross => IndicatorParams::SmaCross { fast: 50, slow: 200 },
        IndicatorType::EmaCross => IndicatorParams::EmaCross { fast: 20, slow: 50 },
        IndicatorType::Bollinger => IndicatorParams::Bollinger {
            period: 20,
            std_dev: 2.0,
        },
        IndicatorType::Obv => IndicatorParams::Obv { period: 20 },
    }
}

fn expect_count(
    indicator: IndicatorType,
    args: &[&str],
    expected: &str,
    allowed: &[usize],
) -> Result<(), IndicatorError> {
    if allowed.contains(&args.len()) {
        Ok(())
    } else {
        Err(IndicatorError::WrongParameterCount {
            indicator: indicator.to_string(),
            expected: expected.to_string(),
            found: args.len(),
        })
    }
}

pub fn parse_params(indicator: IndicatorType, args: &[&str]) -> Result<IndicatorParams, IndicatorError> {
    if args.is_empty() {
        return Ok(default_params(indicator));
    }
    match indicator {
        IndicatorType::Rsi => {
            expect_count(indicator, args, "1", &[1])?;
            Ok(IndicatorParams::Rsi {
                period: parse_u32(args[0])?,
            })
        }
        IndicatorType::WilliamsR => {
            expect_count(indicator, args, "1", &[1])?;
            Ok(IndicatorParams::WilliamsR {
                period: parse_u32(args[0])?,
            })
        }
        IndicatorType::Obv => {
            expect_count(indicator, args, "1", &[1])?;
            Ok(IndicatorParams::Obv {
                period: parse_u32(args[0])?,
            })
        }
        IndicatorType::Stochastic => {
            expect_count(indicator, args, "1 or 2", &[1, 2])?;
            let k_period = parse_u32(args[0])?;
            let d_period = args.get(1).map(|a| parse_u32(a)).transpose()?.unwrap_or(3);
            Ok(IndicatorParams::Stochastic { k_period, d_period })
        }
        IndicatorType::Macd => {
            expect_count(indicator, args, "3", &[3])?;
            Ok(IndicatorParams::Macd {
                fast: parse_u32(args[0])?,
                slow: parse_u32(args[1])?,
                signal: parse_u32(args[2])?,
            })
        }
        IndicatorType::SmaCross => {
            expect_count(indicator, args, "2", &[2])?;
            Ok(IndicatorParams::SmaCross {
                fast: parse_u32(args[0])?,
                slow: parse_u32(args[1])?,
            })
        }
        IndicatorType::EmaCross => {
            expect_count(indicator, args, "2", &[2])?;
            Ok(IndicatorParams::EmaCross {
                fast: parse_u32(args[0])?,
                slow: parse_u32(args[1])?,
            })
        }
        IndicatorType::Bollinger => {
            expect_count(indicator, args, "1 or 2", &[1, 2])?;
            let period = parse_u32(args[0])?;
            let std_dev = args.get(1).map(|a| parse_f64(a)).transpose()?.unwrap_or(2.0);
            Ok(IndicatorParams::Bollinger { period, std_dev })
        }
    }
}

/// Parse and validate one selection string into a spec.
pub fn parse_selection(selection: &str) -> Result<IndicatorSpec, IndicatorError> {
    let (name, args) = match selection.split_once(':') {
        Some((name, rest)) => (name, rest.split(',').collect::<Vec<_>>()),
        None => (selection, Vec::new()),
    };
    let indicator = parse_indicator_type(name)?;
    let params = parse_params(indicator, &args)?;
    validate_spec(params)
}

/// Selection string that parses back to the same spec.
pub fn format_selection(params: &IndicatorParams) -> String {
    let name = params.indicator_type().as_str();
    match params {
        IndicatorParams::Rsi { period }
        | IndicatorParams::WilliamsR { period }
        | IndicatorParams::Obv { period } => format!("{}:{}", name, period),
        IndicatorParams::Stochastic { k_period, d_period } => {
            format!("{}:{},{}", name, k_period, d_period)
        }
        IndicatorParams::Macd { fast, slow, signal } => {
            format!("{}:{},{},{}", name, fast, slow, signal)
        }
        IndicatorParams::SmaCross { fast, slow } | IndicatorParams::EmaCross { fast, slow } => {
            format!("{}:{},{}", name, fast, slow)
        }
        IndicatorParams::Bollinger { period, std_dev } => {
            format!("{}:{},{}", name, period, std_dev)
        }
    }
}
