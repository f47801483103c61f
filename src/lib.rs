//! Fusetrix: technical indicator signal fusion.
//!
//! Readings from heterogeneous indicators (oscillators, trend, volatility
//! bands, volume flow) are normalized onto one directional scale, weighted
//! under a named profile and fused into a composite score with a
//! recommendation, a confidence and per-indicator attribution.

pub mod common;
pub mod config;
pub mod core;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;

pub use error::FusionError;
