pub mod error;
pub mod parser;
pub mod provider;
pub mod validation;

pub mod momentum;
pub mod trend;
pub mod volatility;
pub mod volume;

pub use error::IndicatorError;
pub use parser::*;
pub use provider::*;
pub use validation::*;
