use std::time::Duration;
use thiserror::Error;

/// Failure of an order submission. Always recoverable: the position is left untouched.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("order rejected by exchange (code {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("no response from exchange within {0:?}")]
    Timeout(Duration),

    #[error("order returned no fills")]
    NoFills,

    #[error("invalid exchange response: {0}")]
    InvalidResponse(String),

    #[error("API credentials are not configured")]
    MissingCredentials,
}

impl From<reqwest::Error> for ExecutionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ExecutionError::InvalidResponse(err.to_string())
        } else {
            ExecutionError::Transport(err.to_string())
        }
    }
}

/// A feed message that could not be turned into a tick
#[derive(Debug, Error, PartialEq)]
pub enum TickError {
    #[error("malformed tick: {0}")]
    Malformed(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid config value {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
