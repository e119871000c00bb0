//! MACD (Moving Average Convergence Divergence)

use crate::data::Candle;
use crate::indicators::ma::{ema_from_values, ema_series};

/// MACD line, signal line and histogram over the full input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdResult {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Latest MACD values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD = EMA(short) − EMA(long) over the full series. The signal line is an
/// EMA of the MACD line seeded by an SMA of its first `signal_period` values;
/// the histogram is their difference at every index.
pub fn macd(
    candles: &[Candle],
    short_period: usize,
    long_period: usize,
    signal_period: usize,
) -> Option<MacdResult> {
    if candles.len() < long_period || short_period == 0 || long_period == 0 || signal_period == 0 {
        return None;
    }

    let short_ema = ema_series(candles, short_period);
    let long_ema = ema_series(candles, long_period);

    let macd_line: Vec<f64> = short_ema
        .iter()
        .zip(long_ema.iter())
        .map(|(s, l)| s - l)
        .collect();

    let signal_line = ema_from_values(&macd_line, signal_period);

    let histogram: Vec<f64> = macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| m - s)
        .collect();

    Some(MacdResult {
        macd: macd_line,
        signal: signal_line,
        histogram,
    })
}

/// Most recent MACD/signal/histogram values.
pub fn latest_macd(
    candles: &[Candle],
    short_period: usize,
    long_period: usize,
    signal_period: usize,
) -> Option<MacdValue> {
    let result = macd(candles, short_period, long_period, signal_period)?;
    let idx = result.macd.len().checked_sub(1)?;

    Some(MacdValue {
        macd: result.macd[idx],
        signal: result.signal[idx],
        histogram: result.histogram[idx],
    })
}
