//! Error types for the screener core

use std::time::Duration;

/// Errors surfaced by the cache, calculator and analysis engine.
///
/// `InsufficientData` is an expected state, not a fault: indicator functions
/// signal it with `None` and the calculator simply omits the indicator.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("symbol {symbol} not found in cache")]
    SymbolNotFound { symbol: String },

    #[error("interval {interval} not found for symbol {symbol}")]
    IntervalNotFound { symbol: String, interval: String },

    #[error("missing market data: {0}")]
    MissingData(String),

    #[error("insufficient data for {indicator}")]
    InsufficientData { indicator: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("unsupported indicator: {0}")]
    UnsupportedIndicator(String),

    #[error("analysis queue is full ({depth}/{capacity})")]
    QueueFull { depth: usize, capacity: usize },

    #[error("analysis engine is stopped")]
    EngineStopped,

    #[error("reasoning call timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    #[error("invalid analysis verdict: {0}")]
    Validation(String),

    #[error("reasoning call failed: {0}")]
    Reasoning(String),

    #[error("failed to persist analysis result: {0}")]
    Persistence(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ScreenerError {
    /// True for the two cache-miss shapes.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ScreenerError::SymbolNotFound { .. } | ScreenerError::IntervalNotFound { .. }
        )
    }
}
