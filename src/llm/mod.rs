//! Reasoning service integration
//!
//! The analysis engine talks to the external reasoning service through the
//! [`ReasoningClient`] trait. The bundled [`OpenRouterClient`] speaks the
//! OpenAI-compatible chat completions API; any returned failure is terminal
//! for that request. Retry policy belongs to the service client itself, not
//! to this core.

pub mod client;
pub mod verdict;

pub use client::{ClientConfig, OpenRouterClient};
pub use verdict::{parse_verdict, Decision, Verdict};

use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// A chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Optional per-request model override.
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// A chat completion response: text plus token usage.
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
    pub latency: Duration,
}

/// Token usage reported by the reasoning service.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Black-box seam to the external reasoning service.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// System prompt for the initial evaluation of a triggered signal.
pub const SIGNAL_ANALYSIS_SYSTEM_PROMPT: &str = r#"You are an expert cryptocurrency trading analyst specialized in technical analysis and market microstructure.

Your task is to analyze trading signals and provide structured recommendations. You will receive:
1. Market data (price, volume, indicators)
2. Trading strategy description
3. Current market conditions

You must respond ONLY with valid JSON in this exact format:
{
  "decision": "enter" | "reject" | "wait",
  "confidence": 0.0-1.0,
  "reasoning": "Brief explanation of your decision",
  "entry_price": number | null,
  "stop_loss": number | null,
  "take_profit_1": number | null,
  "take_profit_2": number | null,
  "position_size_pct": number (0-100),
  "risk_reward_ratio": number | null,
  "timeframe": "string describing expected holding period"
}

Decision Types:
- "enter": Strong signal, conditions met, recommend immediate position
- "reject": Signal invalid, conditions not met, or risk too high
- "wait": Signal has potential but needs confirmation (will be monitored)

Analysis Guidelines:
1. Be conservative - only recommend "enter" for high-probability setups
2. Use "wait" for signals that need more confirmation or better entry
3. Use "reject" for signals that clearly don't meet criteria
4. Consider risk management - stop loss should be logical and protect capital
5. Consider market conditions - trend, volatility, volume profile
6. Validate indicator values match the strategy requirements
7. Check for conflicting signals or bearish divergences

Risk Management:
- Stop loss should be below key support levels
- Take profit targets should be at resistance levels
- Risk/reward ratio should be at least 1.5:1 (preferably 2:1 or higher)

Be concise, precise, and actionable in your reasoning."#;

/// System prompt for re-analysis of a monitored signal.
pub const MONITORING_ANALYSIS_SYSTEM_PROMPT: &str = r#"You are an expert cryptocurrency trading analyst monitoring active signals for optimal entry timing.

Your task is to continuously evaluate monitored signals and determine if conditions have improved, worsened, or if it's time to enter the trade.

You must respond ONLY with valid JSON in this exact format:
{
  "decision": "enter" | "reject" | "continue_monitoring",
  "confidence": 0.0-1.0,
  "reasoning": "Brief explanation focusing on what changed since last analysis",
  "entry_price": number | null,
  "stop_loss": number | null,
  "take_profit_1": number | null,
  "take_profit_2": number | null,
  "position_size_pct": number (0-100),
  "risk_reward_ratio": number | null,
  "timeframe": "string describing expected holding period",
  "changes_observed": "string describing key market changes since last analysis"
}

Monitoring Guidelines:
1. Compare current conditions to previous analysis - what changed?
2. Has the setup improved (better entry, stronger confirmation)?
3. Has the setup deteriorated (breakdown, volume drying up)?
4. If approaching the re-analysis limit, be more decisive (enter or reject)
5. Check if price action confirms or contradicts the original signal

Be specific about what changed and why it affects your decision."#;
