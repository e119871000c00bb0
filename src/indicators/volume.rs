//! Volume and range metrics: average volume, highest high, lowest low, VWAP

use crate::data::Candle;

/// Mean volume of the last `period` candles.
pub fn avg_volume(candles: &[Candle], period: usize) -> Option<f64> {
    if candles.len() < period || period == 0 {
        return None;
    }

    let sum: f64 = candles[candles.len() - period..]
        .iter()
        .map(|c| c.volume)
        .sum();
    Some(sum / period as f64)
}

/// Highest high over the trailing `period` candles.
pub fn highest_high(candles: &[Candle], period: usize) -> Option<f64> {
    if candles.len() < period || period == 0 {
        return None;
    }

    candles[candles.len() - period..]
        .iter()
        .map(|c| c.high)
        .fold(None, |acc, h| Some(acc.map_or(h, |a: f64| a.max(h))))
}

/// Lowest low over the trailing `period` candles.
pub fn lowest_low(candles: &[Candle], period: usize) -> Option<f64> {
    if candles.len() < period || period == 0 {
        return None;
    }

    candles[candles.len() - period..]
        .iter()
        .map(|c| c.low)
        .fold(None, |acc, l| Some(acc.map_or(l, |a: f64| a.min(l))))
}

/// Volume-weighted average price over the entire supplied slice (not
/// windowed): cumulative typical-price × volume divided by cumulative
/// volume. Returns 0.0 for empty input or zero total volume.
pub fn vwap(candles: &[Candle]) -> f64 {
    if candles.is_empty() {
        return 0.0;
    }

    let mut cumulative_tpv = 0.0;
    let mut cumulative_volume = 0.0;
    for candle in candles {
        cumulative_tpv += candle.typical_price() * candle.volume;
        cumulative_volume += candle.volume;
    }

    if cumulative_volume == 0.0 {
        return 0.0;
    }

    cumulative_tpv / cumulative_volume
}
