//! Request orchestration, backtesting and the HTTP / tool surfaces

pub mod backtest;
pub mod http;
pub mod orchestrator;
pub mod tools;

pub use backtest::{BacktestRequest, BacktestResult, Trade, TradeSide};
pub use http::{create_router, start_server, AppState};
pub use orchestrator::{EvaluationRequest, OrchestratorSettings, SignalOrchestrator};
pub use tools::{ToolDefinition, ToolError, ToolOutput, FUSE_SIGNALS, RUN_BACKTEST};
