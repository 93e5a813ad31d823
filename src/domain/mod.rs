//! Core domain types and logic.

pub mod candle;
pub mod indicator;
pub mod trend;
pub mod gap;
pub mod registry;
pub mod engine;
pub mod signal;
pub mod chart;
pub mod replay;
pub mod config_validation;
pub mod error;
