//! Runtime configuration
//!
//! Process settings come from the environment (optionally via `.env`), engine
//! settings from an optional JSON file. Every engine field has a default, so
//! an empty `{}` file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::FusionError;
use crate::indicators::parser::parse_selection;
use crate::models::indicators::IndicatorSpec;
use crate::signals::{
    builtin_profiles, FusionContext, FusionEngine, KindWeights, NormalizationConfig, Normalizer,
    ProfileDefinition, ProfileRegistry, RecommendationThresholds, DEFAULT_PROFILE,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {section} configuration: {reason}")]
    Invalid { section: &'static str, reason: String },

    #[error(transparent)]
    Fusion(#[from] FusionError),
}

/// Deployment environment, from `ENVIRONMENT` (default `sandbox`).
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// Process-level settings of the API server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub engine_config_path: Option<PathBuf>,
    pub market_data_path: Option<PathBuf>,
    /// Bars fetched per evaluation.
    pub history_limit: usize,
    /// Budget for computing every indicator of one request.
    pub request_timeout_ms: u64,
    /// Bars replayed per backtest.
    pub backtest_history_limit: usize,
    pub backtest_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            engine_config_path: None,
            market_data_path: None,
            history_limit: 250,
            request_timeout_ms: 5_000,
            backtest_history_limit: 1_000,
            backtest_timeout_ms: 30_000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("PORT").unwrap_or(defaults.port),
            engine_config_path: env_path("FUSETRIX_CONFIG"),
            market_data_path: env_path("FUSETRIX_MARKET_DATA"),
            history_limit: env_parse("FUSETRIX_HISTORY_LIMIT")
                .filter(|limit: &usize| *limit > 0)
                .unwrap_or(defaults.history_limit),
            request_timeout_ms: env_parse("FUSETRIX_REQUEST_TIMEOUT_MS")
                .filter(|ms: &u64| *ms > 0)
                .unwrap_or(defaults.request_timeout_ms),
            backtest_history_limit: env_parse("FUSETRIX_BACKTEST_HISTORY_LIMIT")
                .filter(|limit: &usize| *limit > 0)
                .unwrap_or(defaults.backtest_history_limit),
            backtest_timeout_ms: env_parse("FUSETRIX_BACKTEST_TIMEOUT_MS")
                .filter(|ms: &u64| *ms > 0)
                .unwrap_or(defaults.backtest_timeout_ms),
        }
    }
}

fn default_indicators() -> Vec<String> {
    [
        "rsi:14",
        "stochastic:14,3",
        "macd:12,26,9",
        "sma_cross:50,200",
        "bollinger:20,2",
        "obv:20",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Engine settings: thresholds, curves, weights and profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: RecommendationThresholds,
    pub normalization: NormalizationConfig,
    pub kind_weights: KindWeights,
    /// Named profiles. Built-in profiles are kept unless redefined here.
    pub profiles: BTreeMap<String, ProfileDefinition>,
    pub default_profile: String,
    /// Indicator selections used when a request names none.
    pub default_indicators: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: RecommendationThresholds::default(),
            normalization: NormalizationConfig::default(),
            kind_weights: KindWeights::default(),
            profiles: BTreeMap::new(),
            default_profile: DEFAULT_PROFILE.to_string(),
            default_indicators: default_indicators(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON engine config.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        self.normalization
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                section: "normalization",
                reason,
            })?;
        for (kind, weight) in self.kind_weights.as_map() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::Invalid {
                    section: "kind_weights",
                    reason: format!("weight for '{}' must be finite and non-negative", kind),
                });
            }
        }
        self.default_specs()?;
        self.profile_registry()?;
        Ok(())
    }

    /// Built-in profiles overlaid with the configured ones.
    pub fn profile_definitions(&self) -> BTreeMap<String, ProfileDefinition> {
        let mut profiles = builtin_profiles();
        profiles.extend(self.profiles.clone());
        profiles
    }

    pub fn profile_registry(&self) -> Result<ProfileRegistry, FusionError> {
        ProfileRegistry::new(
            self.profile_definitions(),
            self.kind_weights.clone(),
            self.default_profile.clone(),
        )
    }

    pub fn default_specs(&self) -> Result<Vec<IndicatorSpec>, ConfigError> {
        if self.default_indicators.is_empty() {
            return Err(ConfigError::Invalid {
                section: "default_indicators",
                reason: "at least one default indicator is required".to_string(),
            });
        }
        self.default_indicators
            .iter()
            .map(|selection| {
                parse_selection(selection).map_err(|e| ConfigError::Invalid {
                    section: "default_indicators",
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    pub fn fusion_context(&self) -> Result<FusionContext, FusionError> {
        Ok(FusionContext::new(
            Normalizer::from_config(&self.normalization),
            self.profile_registry()?,
            FusionEngine::new(self.thresholds)?,
        ))
    }
}
