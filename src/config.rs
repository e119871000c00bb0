//! Analysis engine configuration

use std::time::Duration;

/// Options for the analysis engine, passed in at construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of queued analysis requests before `enqueue` rejects.
    pub queue_size: usize,
    /// Number of worker tasks pulling from the queue.
    pub worker_count: usize,
    /// Maximum concurrent reasoning calls in flight (gated by semaphore,
    /// clamped to `worker_count`).
    pub max_concurrent: usize,
    /// Per-request deadline for the external reasoning call.
    pub request_timeout: Duration,
    /// Bars of history handed to the calculator per request.
    pub default_candle_limit: usize,
    /// Maximum re-analyses of a monitored signal, referenced by the
    /// monitoring prompt.
    pub max_reanalyses: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_size: 1000,
            worker_count: 10,
            max_concurrent: 10,
            request_timeout: Duration::from_secs(30),
            default_candle_limit: 100,
            max_reanalyses: 5,
        }
    }
}
