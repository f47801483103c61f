//! Tool-call surface
//!
//! Exposes fusion and backtesting as named tools with JSON schemas, for agent
//! frameworks that discover and invoke tools over HTTP.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::core::backtest::{BacktestRequest, BacktestResult};
use crate::core::orchestrator::{EvaluationRequest, SignalOrchestrator};
use crate::error::FusionError;
use crate::models::signal::FusionResult;

pub const FUSE_SIGNALS: &str = "fuse_signals";
pub const RUN_BACKTEST: &str = "run_backtest";

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("failed to encode tool output: {0}")]
    Encode(String),

    #[error(transparent)]
    Fusion(#[from] FusionError),
}

/// Arguments of [`FUSE_SIGNALS`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FuseSignalsArgs {
    pub instrument: String,
    #[serde(default)]
    pub indicators: Option<Vec<String>>,
    #[serde(default)]
    pub profile: Option<String>,
}

impl From<FuseSignalsArgs> for EvaluationRequest {
    fn from(args: FuseSignalsArgs) -> Self {
        EvaluationRequest {
            instrument: args.instrument,
            indicators: args.indicators,
            profile: args.profile,
            weights: None,
        }
    }
}

/// Arguments of [`RUN_BACKTEST`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunBacktestArgs {
    pub instrument: String,
    #[serde(default)]
    pub indicators: Option<Vec<String>>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub initial_capital: Option<f64>,
}

impl From<RunBacktestArgs> for BacktestRequest {
    fn from(args: RunBacktestArgs) -> Self {
        BacktestRequest {
            instrument: args.instrument,
            indicators: args.indicators,
            profile: args.profile,
            initial_capital: args.initial_capital,
            ..BacktestRequest::default()
        }
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

fn require_instrument(instrument: &str) -> Result<(), ToolError> {
    if instrument.trim().is_empty() {
        return Err(ToolError::InvalidArguments(
            "instrument must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: FUSE_SIGNALS,
            description: "Fuse technical indicator readings for an instrument into one \
                          buy/sell/hold recommendation with confidence and per-indicator attribution.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "instrument": {
                        "type": "string",
                        "description": "Instrument identifier, e.g. BTC-USD"
                    },
                    "indicators": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Indicator selections such as rsi:14, macd:12,26,9 or \
                                        sma_cross:50,200. Defaults to the configured set."
                    },
                    "profile": {
                        "type": "string",
                        "description": "Weighting profile name. Defaults to the configured default profile."
                    }
                },
                "required": ["instrument"],
                "additionalProperties": false
            }),
        },
        ToolDefinition {
            name: RUN_BACKTEST,
            description: "Replay signal fusion over an instrument's stored history, trading \
                          buy/sell recommendations long/flat, and report final capital, total \
                          return, CAGR and trades.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "instrument": {
                        "type": "string",
                        "description": "Instrument identifier, e.g. BTC-USD"
                    },
                    "indicators": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Indicator selections. Defaults to the configured set."
                    },
                    "profile": {
                        "type": "string",
                        "description": "Weighting profile name. Defaults to the configured default profile."
                    },
                    "initial_capital": {
                        "type": "number",
                        "exclusiveMinimum": 0,
                        "description": "Starting cash. Defaults to 10000."
                    }
                },
                "required": ["instrument"],
                "additionalProperties": false
            }),
        },
    ]
}

/// Result of one tool invocation.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    Fusion(FusionResult),
    Backtest(BacktestResult),
}

impl ToolOutput {
    pub fn fusion_result(&self) -> Option<&FusionResult> {
        match self {
            ToolOutput::Fusion(result) => Some(result),
            ToolOutput::Backtest(_) => None,
        }
    }

    pub fn backtest_result(&self) -> Option<&BacktestResult> {
        match self {
            ToolOutput::Backtest(result) => Some(result),
            ToolOutput::Fusion(_) => None,
        }
    }

    /// Serialized form returned to the caller.
    pub fn to_json(&self) -> Result<Value, ToolError> {
        let encoded = match self {
            ToolOutput::Fusion(result) => serde_json::to_value(result),
            ToolOutput::Backtest(result) => serde_json::to_value(result),
        };
        encoded.map_err(|e| ToolError::Encode(e.to_string()))
    }
}

/// Invoke a tool by name with JSON arguments.
pub async fn invoke(
    orchestrator: &SignalOrchestrator,
    name: &str,
    arguments: Value,
) -> Result<ToolOutput, ToolError> {
    match name {
        FUSE_SIGNALS => {
            let args: FuseSignalsArgs = parse_args(arguments)?;
            require_instrument(&args.instrument)?;
            let result = orchestrator.evaluate(&args.into()).await?;
            Ok(ToolOutput::Fusion(result))
        }
        RUN_BACKTEST => {
            let args: RunBacktestArgs = parse_args(arguments)?;
            require_instrument(&args.instrument)?;
            let result = orchestrator.backtest(&args.into()).await?;
            Ok(ToolOutput::Backtest(result))
        }
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}
