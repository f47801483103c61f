//! Market data provider interface and the in-memory implementation

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::FusionError;
use crate::models::indicators::{Candle, PriceSeries, SeriesError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarketDataError {
    #[error("instrument '{0}' not found")]
    NotFound(String),

    /// Transient: the caller may retry.
    #[error("market data unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    InvalidSeries(#[from] SeriesError),

    #[error("failed to load market data: {0}")]
    Load(String),
}

impl MarketDataError {
    pub fn is_transient(&self) -> bool {
        matches!(self, MarketDataError::Unavailable(_))
    }
}

impl From<MarketDataError> for FusionError {
    fn from(error: MarketDataError) -> Self {
        match error {
            MarketDataError::NotFound(instrument) => FusionError::InstrumentNotFound(instrument),
            other => FusionError::MarketData(other.to_string()),
        }
    }
}

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Most recent `limit` bars of `instrument`, oldest first.
    async fn get_series(&self, instrument: &str, limit: usize)
        -> Result<PriceSeries, MarketDataError>;

    /// Instruments the provider can serve.
    async fn instruments(&self) -> Vec<String>;
}

/// Series held in memory, keyed by instrument.
#[derive(Clone, Default)]
pub struct InMemoryMarketData {
    series: Arc<RwLock<HashMap<String, PriceSeries>>>,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `{ "INSTRUMENT": [candle, ...], ... }` from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MarketDataError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| MarketDataError::Load(format!("{}: {}", path.display(), e)))?;
        let bars: HashMap<String, Vec<Candle>> = serde_json::from_str(&raw)
            .map_err(|e| MarketDataError::Load(format!("{}: {}", path.display(), e)))?;

        let mut series = HashMap::with_capacity(bars.len());
        for (instrument, candles) in bars {
            let loaded = PriceSeries::new(instrument.clone(), candles)?;
            info!(instrument = %instrument, bars = loaded.len(), "Loaded market data");
            series.insert(instrument, loaded);
        }
        Ok(Self {
            series: Arc::new(RwLock::new(series)),
        })
    }

    /// Insert or replace the series for its instrument.
    pub async fn insert(&self, series: PriceSeries) {
        let mut map = self.series.write().await;
        map.insert(series.instrument().to_string(), series);
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for InMemoryMarketData {
    async fn get_series(
        &self,
        instrument: &str,
        limit: usize,
    ) -> Result<PriceSeries, MarketDataError> {
        let map = self.series.read().await;
        map.get(instrument)
            .map(|series| series.tail(limit))
            .ok_or_else(|| MarketDataError::NotFound(instrument.to_string()))
    }

    async fn instruments(&self) -> Vec<String> {
        let map = self.series.read().await;
        let mut names: Vec<String> = map.keys().cloned().collect();
        names.sort();
        names
    }
}
