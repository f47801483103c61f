//! Momentum indicators: RSI, Stochastic, Williams %R, MACD

pub mod macd;
pub mod rsi;
pub mod stochastic;
pub mod williams_r;

pub use macd::*;
pub use rsi::*;
pub use stochastic::*;
pub use williams_r::*;
