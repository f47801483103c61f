//! Checked construction of indicator specs.

use crate::indicators::error::IndicatorError;
use crate::models::indicators::{IndicatorKind, IndicatorParams, IndicatorSpec};

fn invalid(params: &IndicatorParams, reason: impl Into<String>) -> IndicatorError {
    IndicatorError::InvalidParameter {
        indicator: params.indicator_type().to_string(),
        reason: reason.into(),
    }
}

fn positive(params: &IndicatorParams, name: &str, value: u32) -> Result<(), IndicatorError> {
    if value == 0 {
        return Err(invalid(params, format!("{} must be positive", name)));
    }
    Ok(())
}

fn fast_below_slow(params: &IndicatorParams, fast: u32, slow: u32) -> Result<(), IndicatorError> {
    positive(params, "fast period", fast)?;
    positive(params, "slow period", slow)?;
    if fast >= slow {
        return Err(invalid(
            params,
            format!("fast period {} must be shorter than slow period {}", fast, slow),
        ));
    }
    Ok(())
}

pub fn validate_params(params: &IndicatorParams) -> Result<(), IndicatorError> {
    match *params {
        IndicatorParams::Rsi { period }
        | IndicatorParams::WilliamsR { period }
        | IndicatorParams::Obv { period } => positive(params, "period", period),
        IndicatorParams::Stochastic { k_period, d_period } => {
            positive(params, "%K period", k_period)?;
            positive(params, "%D period", d_period)
        }
        IndicatorParams::Macd { fast, slow, signal } => {
            fast_below_slow(params, fast, slow)?;
            positive(params, "signal period", signal)
        }
        IndicatorParams::SmaCross { fast, slow } | IndicatorParams::EmaCross { fast, slow } => {
            fast_below_slow(params, fast, slow)
        }
        IndicatorParams::Bollinger { period, std_dev } => {
            positive(params, "period", period)?;
            if !std_dev.is_finite() || std_dev <= 0.0 {
                return Err(invalid(params, "standard deviation multiplier must be positive"));
            }
            Ok(())
        }
    }
}

/// Validated spec with the canonical id and the indicator's default kind.
pub fn validate_spec(params: IndicatorParams) -> Result<IndicatorSpec, IndicatorError> {
    let kind = params.indicator_type().default_kind();
    validate_spec_with_kind(params, kind)
}

/// Validated spec declaring an explicit output kind.
pub fn validate_spec_with_kind(
    params: IndicatorParams,
    kind: IndicatorKind,
) -> Result<IndicatorSpec, IndicatorError> {
    validate_params(&params)?;
    let id = params.default_id();
    Ok(IndicatorSpec::from_parts(id, kind, params))
}
