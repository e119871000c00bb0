//! Thread-safe in-memory candle storage
//!
//! Series stay time-ordered and bounded to `max_len` entries after every
//! mutation. A single coarse lock guards the series map; hit/miss counters
//! are atomics so reads never take the write lock.

use crate::data::Candle;
use crate::error::ScreenerError;
use crate::Result;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

type SeriesMap = HashMap<String, HashMap<String, Vec<Candle>>>;

/// Bounded per-(symbol, interval) candle cache shared across the process.
#[derive(Debug)]
pub struct CandleCache {
    data: RwLock<SeriesMap>,
    max_len: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Cache statistics snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub symbols: usize,
    pub total_candles: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

impl CandleCache {
    /// Create a new cache keeping at most `max_len` candles per series.
    pub fn new(max_len: usize) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            max_len,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Bulk-set the series for a symbol/interval pair (used for bootstrap).
    /// Keeps only the most recent `max_len` candles.
    pub fn set(&self, symbol: &str, interval: &str, mut candles: Vec<Candle>) {
        if candles.len() > self.max_len {
            candles.drain(..candles.len() - self.max_len);
        }

        let mut data = self.data.write().unwrap_or_else(|e| e.into_inner());
        let count = candles.len();
        data.entry(symbol.to_string())
            .or_default()
            .insert(interval.to_string(), candles);

        tracing::debug!(symbol, interval, count, "cache series set");
    }

    /// Apply a live tick: a candle with the same open time as the newest
    /// entry replaces it (price still forming), otherwise it is appended and
    /// the oldest entry is evicted once the series exceeds `max_len`.
    pub fn update(&self, symbol: &str, interval: &str, candle: Candle) {
        let mut data = self.data.write().unwrap_or_else(|e| e.into_inner());
        let series = data
            .entry(symbol.to_string())
            .or_default()
            .entry(interval.to_string())
            .or_default();

        match series.last_mut() {
            Some(last) if last.open_time == candle.open_time => {
                *last = candle;
            }
            _ => {
                series.push(candle);
                if series.len() > self.max_len {
                    series.remove(0);
                }
            }
        }
    }

    /// Retrieve the latest `limit` candles (all if fewer exist), in time
    /// order. Unknown symbol or interval counts as a miss.
    pub fn get(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        let data = self.data.read().unwrap_or_else(|e| e.into_inner());

        let symbol_data = data.get(symbol).ok_or_else(|| {
            self.misses.fetch_add(1, Ordering::Relaxed);
            ScreenerError::SymbolNotFound {
                symbol: symbol.to_string(),
            }
        })?;

        let series = symbol_data.get(interval).ok_or_else(|| {
            self.misses.fetch_add(1, Ordering::Relaxed);
            ScreenerError::IntervalNotFound {
                symbol: symbol.to_string(),
                interval: interval.to_string(),
            }
        })?;

        self.hits.fetch_add(1, Ordering::Relaxed);

        let start = series.len().saturating_sub(limit);
        Ok(series[start..].to_vec())
    }

    /// The most recent candle for a symbol/interval.
    pub fn latest(&self, symbol: &str, interval: &str) -> Result<Candle> {
        let data = self.data.read().unwrap_or_else(|e| e.into_inner());

        let series = data
            .get(symbol)
            .ok_or_else(|| ScreenerError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?
            .get(interval)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ScreenerError::IntervalNotFound {
                symbol: symbol.to_string(),
                interval: interval.to_string(),
            })?;

        Ok(series[series.len() - 1].clone())
    }

    /// Close time of the latest candle, as a UTC timestamp.
    pub fn last_update_time(&self, symbol: &str, interval: &str) -> Result<DateTime<Utc>> {
        let candle = self.latest(symbol, interval)?;
        Ok(Utc
            .timestamp_millis_opt(candle.close_time)
            .single()
            .ok_or_else(|| {
                ScreenerError::MissingData(format!(
                    "invalid close time {} for {symbol}@{interval}",
                    candle.close_time
                ))
            })?)
    }

    /// Check whether the cache holds a series for a symbol/interval pair.
    pub fn has(&self, symbol: &str, interval: &str) -> bool {
        let data = self.data.read().unwrap_or_else(|e| e.into_inner());
        data.get(symbol)
            .map(|s| s.contains_key(interval))
            .unwrap_or(false)
    }

    /// All symbols currently cached.
    pub fn symbols(&self) -> Vec<String> {
        let data = self.data.read().unwrap_or_else(|e| e.into_inner());
        data.keys().cloned().collect()
    }

    /// All intervals cached for a symbol.
    pub fn intervals(&self, symbol: &str) -> Vec<String> {
        let data = self.data.read().unwrap_or_else(|e| e.into_inner());
        data.get(symbol)
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Total number of candles across all series.
    pub fn size(&self) -> usize {
        let data = self.data.read().unwrap_or_else(|e| e.into_inner());
        data.values().flat_map(|s| s.values()).map(Vec::len).sum()
    }

    /// Drop all series and reset the counters.
    pub fn clear(&self) {
        let mut data = self.data.write().unwrap_or_else(|e| e.into_inner());
        data.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        tracing::debug!("cache cleared");
    }

    /// Snapshot of cache statistics.
    pub fn stats(&self) -> CacheStats {
        let data = self.data.read().unwrap_or_else(|e| e.into_inner());
        let total_candles = data.values().flat_map(|s| s.values()).map(Vec::len).sum();
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64 * 100.0
        };

        CacheStats {
            symbols: data.len(),
            total_candles,
            hits,
            misses,
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn candle(open_time: i64, close: f64) -> Candle {
        Candle {
            open_time,
            close,
            ..Default::default()
        }
    }

    #[test]
    fn test_set_and_get() {
        let cache = CandleCache::new(500);
        cache.set(
            "BTCUSDT",
            "5m",
            vec![candle(1000, 100.0), candle(2000, 101.0), candle(3000, 102.0)],
        );

        let retrieved = cache.get("BTCUSDT", "5m", 3).unwrap();
        assert_eq!(retrieved.len(), 3);
        assert_eq!(retrieved[0].close, 100.0);
        assert_eq!(retrieved[2].close, 102.0);
    }

    #[test]
    fn test_get_limit() {
        let cache = CandleCache::new(500);
        let candles: Vec<Candle> = (0..100).map(|i| candle(i * 1000, i as f64)).collect();
        cache.set("ETHUSDT", "5m", candles);

        let retrieved = cache.get("ETHUSDT", "5m", 10).unwrap();
        assert_eq!(retrieved.len(), 10);
        assert_eq!(retrieved[0].close, 90.0);
        assert_eq!(retrieved[9].close, 99.0);
    }

    #[test]
    fn test_update_in_place() {
        let cache = CandleCache::new(500);
        cache.set("BTCUSDT", "5m", vec![candle(1000, 100.0), candle(2000, 101.0)]);

        // Same open time revises the forming candle, length unchanged
        cache.update("BTCUSDT", "5m", candle(2000, 105.0));

        let retrieved = cache.get("BTCUSDT", "5m", 10).unwrap();
        assert_eq!(retrieved.len(), 2);
        assert_eq!(retrieved[1].close, 105.0);
    }

    #[test]
    fn test_update_appends_new() {
        let cache = CandleCache::new(500);
        cache.set("BTCUSDT", "5m", vec![candle(1000, 100.0)]);

        cache.update("BTCUSDT", "5m", candle(2000, 101.0));

        let retrieved = cache.get("BTCUSDT", "5m", 10).unwrap();
        assert_eq!(retrieved.len(), 2);
        assert_eq!(retrieved[1].close, 101.0);
    }

    #[test]
    fn test_set_truncates_to_max_len() {
        let cache = CandleCache::new(10);
        let candles: Vec<Candle> = (0..20).map(|i| candle(i * 1000, i as f64)).collect();
        cache.set("BTCUSDT", "5m", candles);

        let retrieved = cache.get("BTCUSDT", "5m", 20).unwrap();
        assert_eq!(retrieved.len(), 10);
        assert_eq!(retrieved[0].close, 10.0);
        assert_eq!(retrieved[9].close, 19.0);
    }

    #[test]
    fn test_update_evicts_oldest() {
        let cache = CandleCache::new(5);
        cache.set(
            "BTCUSDT",
            "5m",
            vec![candle(1000, 1.0), candle(2000, 2.0), candle(3000, 3.0)],
        );

        cache.update("BTCUSDT", "5m", candle(4000, 4.0));
        cache.update("BTCUSDT", "5m", candle(5000, 5.0));
        cache.update("BTCUSDT", "5m", candle(6000, 6.0));

        let retrieved = cache.get("BTCUSDT", "5m", 10).unwrap();
        assert_eq!(retrieved.len(), 5);
        assert_eq!(retrieved[0].close, 2.0);
        assert_eq!(retrieved[4].close, 6.0);
    }

    #[test]
    fn test_cache_miss() {
        let cache = CandleCache::new(500);

        let err = cache.get("NONEXISTENT", "5m", 10).unwrap_err();
        assert!(err.is_not_found());

        cache.set("BTCUSDT", "5m", vec![candle(1000, 100.0)]);

        // Wrong interval for a known symbol
        let err = cache.get("BTCUSDT", "1h", 10).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_stats() {
        let cache = CandleCache::new(500);
        cache.set("BTCUSDT", "5m", vec![candle(1000, 100.0)]);
        cache.set("ETHUSDT", "5m", vec![candle(1000, 50.0)]);

        cache.get("BTCUSDT", "5m", 1).unwrap();
        cache.get("BTCUSDT", "5m", 1).unwrap();
        cache.get("NONEXISTENT", "5m", 1).unwrap_err();

        let stats = cache.stats();
        assert_eq!(stats.symbols, 2);
        assert_eq!(stats.total_candles, 2);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_has_and_intervals() {
        let cache = CandleCache::new(500);
        assert!(!cache.has("BTCUSDT", "5m"));

        cache.set("BTCUSDT", "5m", vec![candle(1000, 100.0)]);
        cache.set("BTCUSDT", "1h", vec![candle(1000, 100.0)]);

        assert!(cache.has("BTCUSDT", "5m"));
        assert!(!cache.has("BTCUSDT", "15m"));

        let mut intervals = cache.intervals("BTCUSDT");
        intervals.sort();
        assert_eq!(intervals, vec!["1h", "5m"]);
    }

    #[test]
    fn test_clear_resets_everything() {
        let cache = CandleCache::new(500);
        cache.set("BTCUSDT", "5m", vec![candle(1000, 100.0)]);
        cache.get("BTCUSDT", "5m", 1).unwrap();

        cache.clear();

        assert_eq!(cache.size(), 0);
        assert!(cache.symbols().is_empty());
        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_latest() {
        let cache = CandleCache::new(500);
        cache.set(
            "BTCUSDT",
            "5m",
            vec![candle(1000, 100.0), candle(2000, 101.0), candle(3000, 102.0)],
        );

        let latest = cache.latest("BTCUSDT", "5m").unwrap();
        assert_eq!(latest.open_time, 3000);
        assert_eq!(latest.close, 102.0);
    }

    #[test]
    fn test_last_update_time() {
        let cache = CandleCache::new(500);
        let close_time = Utc::now().timestamp_millis();
        cache.set(
            "BTCUSDT",
            "5m",
            vec![Candle {
                open_time: 1000,
                close_time,
                ..Default::default()
            }],
        );

        let updated = cache.last_update_time("BTCUSDT", "5m").unwrap();
        assert_eq!(updated.timestamp_millis(), close_time);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(CandleCache::new(500));
        cache.set("BTCUSDT", "5m", vec![candle(1000, 100.0)]);

        let mut handles = Vec::new();

        for _ in 0..50 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    let _ = cache.get("BTCUSDT", "5m", 10);
                }
            }));
        }

        for _ in 0..10 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for j in 0..100i64 {
                    cache.update("BTCUSDT", "5m", candle(2000 + j, 101.0 + j as f64));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let retrieved = cache.get("BTCUSDT", "5m", 10).unwrap();
        assert!(!retrieved.is_empty());
        // Series must still be strictly time-ordered
        for pair in retrieved.windows(2) {
            assert!(pair[0].open_time < pair[1].open_time);
        }
    }
}
