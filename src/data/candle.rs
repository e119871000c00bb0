//! OHLCV candle data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One OHLCV candle. Immutable once closed; the most recent candle of a live
/// interval is still forming and may be revised in place via the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time in epoch milliseconds
    pub open_time: i64,
    /// Opening price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Volume
    pub volume: f64,
    /// Close time in epoch milliseconds
    pub close_time: i64,
}

impl Candle {
    /// Get typical price (HLC/3)
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Check if candle is bullish
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Check if candle is bearish
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Get body size (absolute difference between open and close)
    pub fn body_size(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Get total range (high - low)
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Real-time ticker snapshot for a symbol
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ticker {
    pub last_price: f64,
    pub price_change_percent: f64,
    pub quote_volume: f64,
}

/// Snapshot of market data carried by an analysis request: the ticker plus
/// candle slices keyed by interval (e.g. "5m", "1h").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketData {
    pub symbol: String,
    pub ticker: Option<Ticker>,
    pub candles: HashMap<String, Vec<Candle>>,
    pub timestamp: DateTime<Utc>,
}

impl MarketData {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ticker: None,
            candles: HashMap::new(),
            timestamp: Utc::now(),
        }
    }
}
