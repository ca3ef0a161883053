// Core modules
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod strategy;

// Re-export commonly used types
pub use config::BotConfig;
pub use error::{ConfigError, ExecutionError, TickError};
pub use execution::{TickOutcome, TradingSession};
pub use models::*;
pub use strategy::MomentumStrategy;
