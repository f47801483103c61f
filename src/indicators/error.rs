use thiserror::Error;

use crate::error::FusionError;

/// Problems building or computing a single indicator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("unknown indicator '{0}'")]
    UnknownIndicator(String),

    #[error("invalid numeric format: {0}")]
    InvalidNumericFormat(String),

    #[error("{indicator} expects {expected} parameter(s), got {found}")]
    WrongParameterCount {
        indicator: String,
        expected: String,
        found: usize,
    },

    #[error("invalid {indicator} parameter: {reason}")]
    InvalidParameter { indicator: String, reason: String },

    #[error("{indicator} computation failed: {reason}")]
    Computation { indicator: String, reason: String },
}

impl IndicatorError {
    /// Lift into the pipeline error for the indicator identified by `indicator`.
    pub fn into_spec_error(self, indicator: &str) -> FusionError {
        FusionError::InvalidSpec {
            indicator: indicator.to_string(),
            reason: self.to_string(),
        }
    }
}
