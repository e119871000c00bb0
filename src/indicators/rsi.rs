//! RSI (Relative Strength Index)

use crate::data::Candle;

/// RSI series. Values before index `period` are zero (window not yet full).
#[derive(Debug, Clone, PartialEq)]
pub struct RsiResult {
    pub values: Vec<f64>,
}

/// Relative Strength Index with Wilder smoothing: the average gain/loss is
/// seeded from the first `period` deltas, then recursively updated with
/// `avg = (avg * (period - 1) + current) / period`. When the average loss is
/// zero, RSI is 100 if there were gains and 50 on a flat series.
pub fn rsi(candles: &[Candle], period: usize) -> Option<RsiResult> {
    if candles.len() < period + 1 || period == 0 {
        return None;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in 1..=period {
        let change = candles[i].close - candles[i - 1].close;
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let mut avg_gain = gains / period as f64;
    let mut avg_loss = losses / period as f64;

    let mut values = vec![0.0; candles.len()];
    values[period] = rsi_point(avg_gain, avg_loss);

    for i in (period + 1)..candles.len() {
        let change = candles[i].close - candles[i - 1].close;
        let (current_gain, current_loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };

        avg_gain = (avg_gain * (period as f64 - 1.0) + current_gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + current_loss) / period as f64;

        values[i] = rsi_point(avg_gain, avg_loss);
    }

    Some(RsiResult { values })
}

fn rsi_point(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 {
            100.0
        } else {
            50.0
        }
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}

/// Most recent RSI value (the last non-zero entry of the series).
pub fn latest_rsi(candles: &[Candle], period: usize) -> Option<f64> {
    let result = rsi(candles, period)?;
    result.values.iter().rev().find(|v| **v != 0.0).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::rising_candles;

    #[test]
    fn test_rsi_uptrend() {
        // Consistent uptrend: closes rise by 2.0 each bar
        let candles: Vec<Candle> = (0..50)
            .map(|i| Candle {
                close: 100.0 + i as f64 * 2.0,
                ..Default::default()
            })
            .collect();

        let result = rsi(&candles, 14).unwrap();
        let latest = result.values[result.values.len() - 1];
        assert!(latest >= 70.0, "RSI for uptrend = {latest}, want >= 70");
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let candles = rising_candles(10, 100.0);
        assert!(rsi(&candles, 14).is_none());
        assert!(rsi(&candles, 0).is_none());
    }

    #[test]
    fn test_rsi_flat_series() {
        let candles: Vec<Candle> = (0..30)
            .map(|_| Candle {
                close: 100.0,
                ..Default::default()
            })
            .collect();

        // No gains and no losses: the zero-range fallback is 50
        let result = rsi(&candles, 14).unwrap();
        assert_eq!(result.values[result.values.len() - 1], 50.0);
    }

    #[test]
    fn test_rsi_pure_downtrend() {
        let candles: Vec<Candle> = (0..30)
            .map(|i| Candle {
                close: 100.0 - i as f64,
                ..Default::default()
            })
            .collect();

        // Zero average gain drives RSI to exactly 0
        let result = rsi(&candles, 14).unwrap();
        assert_eq!(result.values[result.values.len() - 1], 0.0);

        // latest_rsi skips zeros, so an all-loss series has no latest value
        assert!(latest_rsi(&candles, 14).is_none());
    }

    #[test]
    fn test_latest_rsi_skips_warmup_zeros() {
        let candles = rising_candles(20, 100.0);
        let result = rsi(&candles, 14).unwrap();
        assert_eq!(result.values[13], 0.0);
        assert!(latest_rsi(&candles, 14).unwrap() > 0.0);
    }

    #[test]
    fn test_rsi_bounds() {
        let candles = rising_candles(60, 100.0);
        let result = rsi(&candles, 14).unwrap();
        for value in &result.values[14..] {
            assert!((0.0..=100.0).contains(value));
        }
    }
}
