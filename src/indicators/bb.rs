//! Bollinger Bands

use crate::data::Candle;
use crate::indicators::ma::sma_series;

/// Upper/middle/lower band series over the full input. Values before the
/// window fills are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerResult {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Latest band values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Bollinger Bands: middle = SMA(period); band offset = `std_dev` × the
/// population standard deviation of the trailing window.
pub fn bollinger_bands(candles: &[Candle], period: usize, std_dev: f64) -> Option<BollingerResult> {
    if candles.len() < period || period == 0 {
        return None;
    }

    let middle = sma_series(candles, period);
    let mut upper = vec![0.0; candles.len()];
    let mut lower = vec![0.0; candles.len()];

    for i in (period - 1)..candles.len() {
        let variance: f64 = candles[i + 1 - period..=i]
            .iter()
            .map(|c| {
                let diff = c.close - middle[i];
                diff * diff
            })
            .sum::<f64>()
            / period as f64;

        let band = std_dev * variance.sqrt();
        upper[i] = middle[i] + band;
        lower[i] = middle[i] - band;
    }

    Some(BollingerResult {
        upper,
        middle,
        lower,
    })
}

/// Most recent band values.
pub fn latest_bollinger(candles: &[Candle], period: usize, std_dev: f64) -> Option<BollingerValue> {
    let result = bollinger_bands(candles, period, std_dev)?;
    let idx = result.middle.len().checked_sub(1)?;

    Some(BollingerValue {
        upper: result.upper[idx],
        middle: result.middle[idx],
        lower: result.lower[idx],
    })
}
