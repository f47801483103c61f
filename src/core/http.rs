//! HTTP endpoint server using Axum

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

use crate::config::{EngineConfig, ServerConfig};
use crate::core::backtest::{BacktestRequest, BacktestResult};
use crate::core::orchestrator::{EvaluationRequest, OrchestratorSettings, SignalOrchestrator};
use crate::core::tools::{self, ToolError};
use crate::error::FusionError;
use crate::indicators::provider::TechnicalIndicators;
use crate::metrics::Metrics;
use crate::models::signal::FusionResult;
use crate::services::market_data::InMemoryMarketData;

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub orchestrator: Arc<SignalOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<SignalOrchestrator>, metrics: Arc<Metrics>) -> Self {
        Self {
            health: Arc::new(RwLock::new(HealthStatus::default())),
            metrics,
            start_time: Arc::new(Instant::now()),
            orchestrator,
        }
    }

    fn record(&self, outcome: &Result<FusionResult, FusionError>) {
        match outcome {
            Ok(result) => self.metrics.record_result(result),
            Err(err) => self.metrics.record_failure(err),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Error body `{ "error": label, "message": text }` with a mapped status.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Fusion(FusionError),
    Tool(ToolError),
}

impl From<FusionError> for ApiError {
    fn from(error: FusionError) -> Self {
        ApiError::Fusion(error)
    }
}

impl From<ToolError> for ApiError {
    fn from(error: ToolError) -> Self {
        match error {
            ToolError::Fusion(inner) => ApiError::Fusion(inner),
            other => ApiError::Tool(other),
        }
    }
}

pub fn status_for(error: &FusionError) -> StatusCode {
    match error {
        FusionError::InvalidSpec { .. }
        | FusionError::InvalidProfile { .. }
        | FusionError::InvalidThresholds(_)
        | FusionError::InvalidBacktest(_) => StatusCode::BAD_REQUEST,
        FusionError::UnknownProfile(_) | FusionError::InstrumentNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        FusionError::InvalidSignal { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        FusionError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        FusionError::MarketData(_) => StatusCode::BAD_GATEWAY,
        FusionError::SpecMismatch { .. }
        | FusionError::UnsupportedReading { .. }
        | FusionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, label, message) = match &self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "bad_request", message.clone())
            }
            ApiError::Fusion(err) => (status_for(err), err.label(), err.to_string()),
            ApiError::Tool(err @ ToolError::UnknownTool(_)) => {
                (StatusCode::NOT_FOUND, "unknown_tool", err.to_string())
            }
            ApiError::Tool(err @ ToolError::InvalidArguments(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_arguments", err.to_string())
            }
            ApiError::Tool(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "tool_error",
                err.to_string(),
            ),
        };
        if status.is_server_error() {
            error!(error = label, message = %message, "Request failed");
        }
        (status, Json(json!({ "error": label, "message": message }))).into_response()
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "fusetrix-signal-fusion"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

/// Profile names and the default profile
async fn list_profiles(State(state): State<AppState>) -> Json<Value> {
    let profiles = state.orchestrator.context().profiles();
    let names: Vec<&str> = profiles.names().collect();
    Json(json!({
        "profiles": names,
        "default": profiles.default_profile(),
    }))
}

/// Evaluate the indicators of one instrument
async fn evaluate_signals(
    State(state): State<AppState>,
    Json(request): Json<EvaluationRequest>,
) -> Result<Json<FusionResult>, ApiError> {
    if request.instrument.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "instrument must not be empty".to_string(),
        ));
    }
    let outcome = state.orchestrator.evaluate(&request).await;
    state.record(&outcome);
    Ok(Json(outcome?))
}

/// Replay fusion over the stored history of one instrument
async fn run_backtest(
    State(state): State<AppState>,
    Json(request): Json<BacktestRequest>,
) -> Result<Json<BacktestResult>, ApiError> {
    if request.instrument.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "instrument must not be empty".to_string(),
        ));
    }
    match state.orchestrator.backtest(&request).await {
        Ok(result) => {
            state.metrics.record_backtest(&result);
            Ok(Json(result))
        }
        Err(err) => {
            state.metrics.record_failure(&err);
            Err(err.into())
        }
    }
}

async fn list_tools() -> Json<Value> {
    Json(json!({ "tools": tools::definitions() }))
}

async fn invoke_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(arguments): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    match tools::invoke(&state.orchestrator, &name, arguments).await {
        Ok(output) => {
            if let Some(result) = output.fusion_result() {
                state.metrics.record_result(result);
            }
            if let Some(result) = output.backtest_result() {
                state.metrics.record_backtest(result);
            }
            Ok(Json(output.to_json()?))
        }
        Err(ToolError::Fusion(err)) => {
            state.metrics.record_failure(&err);
            Err(ApiError::Fusion(err))
        }
        Err(other) => Err(other.into()),
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/profiles", get(list_profiles))
        .route("/api/signals/evaluate", post(evaluate_signals))
        .route("/api/backtest", post(run_backtest))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/{name}", post(invoke_tool))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Wire the orchestrator from server and engine configuration.
pub fn build_orchestrator(
    config: &ServerConfig,
    engine: &EngineConfig,
) -> Result<SignalOrchestrator, Box<dyn std::error::Error + Send + Sync>> {
    let market_data = match &config.market_data_path {
        Some(path) => InMemoryMarketData::from_json_file(path)?,
        None => {
            warn!("FUSETRIX_MARKET_DATA not set, starting with no instruments");
            InMemoryMarketData::new()
        }
    };
    let settings = OrchestratorSettings {
        history_limit: config.history_limit,
        request_timeout: Duration::from_millis(config.request_timeout_ms),
        backtest_history_limit: config.backtest_history_limit,
        backtest_timeout: Duration::from_millis(config.backtest_timeout_ms),
        ..OrchestratorSettings::default()
    };
    Ok(SignalOrchestrator::new(
        Arc::new(engine.fusion_context()?),
        Arc::new(TechnicalIndicators::new()),
        Arc::new(market_data),
        engine.default_specs()?,
        settings,
    ))
}

pub async fn start_server(
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let engine = EngineConfig::load_or_default(config.engine_config_path.as_deref())?;
    let orchestrator = Arc::new(build_orchestrator(&config, &engine)?);
    let metrics = Arc::new(Metrics::new()?);

    let state = AppState::new(orchestrator, metrics);
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!(port = config.port, "HTTP server listening on port {}", config.port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        config.port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
