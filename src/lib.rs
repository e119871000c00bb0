//! screener-rs: core of an AI-assisted crypto screener
//!
//! This crate provides the algorithmic heart of the screener:
//!
//! - **Data Management**: bounded in-memory OHLCV candle cache per (symbol, interval)
//! - **Technical Indicators**: pure functions for SMA, EMA, RSI, MACD, Bollinger
//!   Bands, VWAP, Stochastic, volume metrics and candle patterns
//! - **Analysis Engine**: a bounded queue plus fixed worker pool that computes
//!   indicators for a triggered signal, renders a prompt, calls an external
//!   reasoning service under a concurrency gate, validates the structured
//!   verdict and hands the result to a persistence collaborator
//!
//! # Example
//!
//! ```no_run
//! use screener_rs::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run(client: Arc<OpenRouterClient>, sink: Arc<LoggingSink>) -> Result<()> {
//! let engine = AnalysisEngine::new(EngineConfig::default(), client, sink);
//! engine.start()?;
//! // ... enqueue AnalysisRequests from signal producers ...
//! engine.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod llm;
pub mod strategy;

// Re-export commonly used types
pub mod prelude {
    pub use crate::analysis::{
        AnalysisEngine, AnalysisReport, AnalysisRequest, Calculator, IndicatorValue, LoggingSink,
        Prompter, ResultSink,
    };
    pub use crate::config::EngineConfig;
    pub use crate::data::{Candle, CandleCache, MarketData, Ticker};
    pub use crate::error::ScreenerError;
    pub use crate::llm::{
        ChatRequest, ChatResponse, Decision, OpenRouterClient, ReasoningClient, Verdict,
    };
    pub use crate::strategy::{IndicatorSpec, ParamValue, StrategyConfig, StrategyRegistry};

    pub use crate::Result;
}

/// Result type alias
pub type Result<T> = std::result::Result<T, error::ScreenerError>;
