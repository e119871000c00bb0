//! Analysis request/result types and the persistence seam

use crate::analysis::calculator::IndicatorValue;
use crate::data::MarketData;
use crate::llm::Verdict;
use crate::strategy::StrategyConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One unit of analysis work, created by a signal producer and consumed
/// exactly once by an engine worker.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub signal_id: String,
    pub strategy_id: String,
    pub user_id: String,
    pub symbol: String,
    /// Primary interval the signal triggered on.
    pub interval: String,
    /// Snapshot of market data at signal time.
    pub market: MarketData,
    /// Strategy configuration, read-only to this core.
    pub strategy: Arc<StrategyConfig>,
    pub is_reanalysis: bool,
    /// Verdict of the previous analysis, if this signal is being monitored.
    pub previous: Option<Verdict>,
    /// How many times this signal has been analyzed already.
    pub analysis_count: u32,
    /// Stamped by the engine on enqueue.
    pub queued_at: DateTime<Utc>,
}

impl AnalysisRequest {
    pub fn new(
        signal_id: impl Into<String>,
        symbol: impl Into<String>,
        interval: impl Into<String>,
        market: MarketData,
        strategy: Arc<StrategyConfig>,
    ) -> Self {
        Self {
            signal_id: signal_id.into(),
            strategy_id: strategy.id.clone(),
            user_id: String::new(),
            symbol: symbol.into(),
            interval: interval.into(),
            market,
            strategy,
            is_reanalysis: false,
            previous: None,
            analysis_count: 0,
            queued_at: Utc::now(),
        }
    }
}

/// Immutable result of one completed analysis, handed to the sink.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub signal_id: String,
    pub strategy_id: String,
    pub user_id: String,
    pub symbol: String,
    pub verdict: Verdict,
    pub model: String,
    pub tokens_used: u32,
    /// Total processing latency, queue pickup to persistence hand-off.
    pub latency_ms: u64,
    /// Indicator values the verdict was based on.
    pub indicators: BTreeMap<String, IndicatorValue>,
}

/// Persistence collaborator. Failures are logged by the engine, never
/// retried at this layer.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn persist(&self, report: &AnalysisReport) -> anyhow::Result<()>;
}

/// Default sink that only logs the completed report.
#[derive(Debug, Default)]
pub struct LoggingSink;

#[async_trait]
impl ResultSink for LoggingSink {
    async fn persist(&self, report: &AnalysisReport) -> anyhow::Result<()> {
        tracing::info!(
            signal_id = %report.signal_id,
            decision = %report.verdict.decision,
            confidence = report.verdict.confidence,
            "analysis result:\n{}",
            report.verdict
        );
        Ok(())
    }
}
