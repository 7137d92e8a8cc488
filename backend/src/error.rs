use std::path::PathBuf;

use thiserror::Error;

use crate::signal::Alert;

/// Channel construction failures. Always fatal to the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl ChannelError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Candle series and candle source failures.
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("open_time must strictly increase: index {index} ({prev} -> {next})")]
    NonMonotonic { index: usize, prev: i64, next: i64 },

    #[error("malformed OHLCV row {index}: {reason}")]
    MalformedRow { index: usize, reason: String },

    #[error("unknown timeframe `{0}`")]
    UnknownTimeframe(String),
}

/// Cross-state storage failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("state file i/o failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state codec failed: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("state backend unavailable: {0}")]
    Unavailable(String),
}

/// Per-call detector failures.
#[derive(Error, Debug)]
pub enum DetectError {
    /// The offending call is aborted and the symbol's state is left untouched.
    #[error("invalid candle for {symbol} at {open_time}: {reason}")]
    InvalidCandle {
        symbol: String,
        open_time: i64,
        reason: String,
    },

    /// The in-memory classification was updated but could not be written.
    /// `alert` is whatever the call decided, so delivery can still happen.
    #[error("failed to persist cross state for {symbol}: {source}")]
    StatePersistence {
        symbol: String,
        alert: Option<Box<Alert>>,
        #[source]
        source: StoreError,
    },
}
