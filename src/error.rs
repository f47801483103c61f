//! Error types surfaced by the fusion pipeline.

use crate::models::indicators::IndicatorKind;
use thiserror::Error;

/// Failures that abort a fusion request.
///
/// Per-indicator problems (missing history, provider failures, malformed
/// specs in a request) do not appear here once the orchestrator has degraded
/// them into zero-reliability signals. What remains are violations the caller
/// has to see.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FusionError {
    #[error("invalid indicator spec '{indicator}': {reason}")]
    InvalidSpec { indicator: String, reason: String },

    #[error("invalid signal from '{indicator}': {reason}")]
    InvalidSignal { indicator: String, reason: String },

    #[error("invalid weighting profile '{profile}': {reason}")]
    InvalidProfile { profile: String, reason: String },

    #[error("unknown weighting profile '{0}'")]
    UnknownProfile(String),

    #[error("reading computed for '{found}' was normalized against spec '{expected}'")]
    SpecMismatch { expected: String, found: String },

    #[error("no {kind} normalization accepts the reading produced by '{indicator}'")]
    UnsupportedReading {
        indicator: String,
        kind: IndicatorKind,
    },

    #[error("invalid recommendation thresholds: {0}")]
    InvalidThresholds(String),

    #[error("instrument '{0}' not found")]
    InstrumentNotFound(String),

    #[error("market data error: {0}")]
    MarketData(String),

    #[error("indicator computation timed out after {0} ms")]
    Timeout(u64),

    #[error("invalid backtest: {0}")]
    InvalidBacktest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl FusionError {
    /// Short label used for metrics and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            FusionError::InvalidSpec { .. } => "invalid_spec",
            FusionError::InvalidSignal { .. } => "invalid_signal",
            FusionError::InvalidProfile { .. } => "invalid_profile",
            FusionError::UnknownProfile(_) => "unknown_profile",
            FusionError::SpecMismatch { .. } => "spec_mismatch",
            FusionError::UnsupportedReading { .. } => "unsupported_reading",
            FusionError::InvalidThresholds(_) => "invalid_thresholds",
            FusionError::InstrumentNotFound(_) => "instrument_not_found",
            FusionError::MarketData(_) => "market_data",
            FusionError::Timeout(_) => "timeout",
            FusionError::InvalidBacktest(_) => "invalid_backtest",
            FusionError::Internal(_) => "internal",
        }
    }

    pub(crate) fn invalid_signal(indicator: &str, reason: impl Into<String>) -> Self {
        FusionError::InvalidSignal {
            indicator: indicator.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_profile(profile: &str, reason: impl Into<String>) -> Self {
        FusionError::InvalidProfile {
            profile: profile.to_string(),
            reason: reason.into(),
        }
    }
}
