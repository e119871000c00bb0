//! Candlestick pattern detection

use crate::data::Candle;
use serde::{Deserialize, Serialize};

/// Engulfing pattern direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engulfing {
    Bullish,
    Bearish,
}

impl Engulfing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engulfing::Bullish => "bullish",
            Engulfing::Bearish => "bearish",
        }
    }
}

/// Detects a bullish or bearish engulfing pattern from the two most recent
/// closed candles. The final candle of the slice is the still-forming one
/// and is excluded from the comparison.
pub fn detect_engulfing(candles: &[Candle]) -> Option<Engulfing> {
    if candles.len() < 3 {
        return None;
    }

    let current = &candles[candles.len() - 2];
    let prev = &candles[candles.len() - 3];

    // Bullish engulfing: a bearish candle fully engulfed by the next bullish body
    if prev.is_bearish() && current.is_bullish() && current.open < prev.close && current.close > prev.open
    {
        return Some(Engulfing::Bullish);
    }

    // Bearish engulfing is the mirror case
    if prev.is_bullish() && current.is_bearish() && current.open > prev.close && current.close < prev.open
    {
        return Some(Engulfing::Bearish);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(open: f64, close: f64) -> Candle {
        Candle {
            open,
            close,
            ..Default::default()
        }
    }

    #[test]
    fn test_bullish_engulfing() {
        let candles = vec![
            body(100.0, 98.0),  // bearish candle
            body(97.0, 102.0),  // bullish engulfing
            body(102.0, 103.0), // still-forming candle
        ];
        assert_eq!(detect_engulfing(&candles), Some(Engulfing::Bullish));
    }

    #[test]
    fn test_bearish_engulfing() {
        let candles = vec![
            body(100.0, 102.0), // bullish candle
            body(103.0, 98.0),  // bearish engulfing
            body(98.0, 97.0),   // still-forming candle
        ];
        assert_eq!(detect_engulfing(&candles), Some(Engulfing::Bearish));
    }

    #[test]
    fn test_no_pattern() {
        let candles = vec![body(100.0, 101.0), body(101.0, 102.0), body(102.0, 103.0)];
        assert_eq!(detect_engulfing(&candles), None);
    }

    #[test]
    fn test_insufficient_data() {
        let candles = vec![body(100.0, 101.0)];
        assert_eq!(detect_engulfing(&candles), None);
    }

    #[test]
    fn test_partial_overlap_is_not_engulfing() {
        let candles = vec![
            body(100.0, 98.0),  // bearish candle
            body(99.0, 99.5),   // bullish but body does not engulf
            body(99.5, 100.0),
        ];
        assert_eq!(detect_engulfing(&candles), None);
    }
}
