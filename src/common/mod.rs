//! Shared numeric helpers used by the indicator providers.

pub mod math;
