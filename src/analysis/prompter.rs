//! Prompt rendering for reasoning requests
//!
//! Pure functions of their inputs: no I/O, deterministic output (indicator
//! maps are ordered), unit-testable by string comparison.

use crate::analysis::calculator::IndicatorValue;
use crate::analysis::types::AnalysisRequest;
use crate::error::ScreenerError;
use crate::llm::Verdict;
use crate::Result;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Renders calculated indicators and recent price action into the
/// evaluation request text.
#[derive(Debug, Clone, Default)]
pub struct Prompter;

impl Prompter {
    pub fn new() -> Self {
        Self
    }

    /// Prompt for the initial evaluation of a triggered signal.
    pub fn build_analysis_prompt(
        &self,
        req: &AnalysisRequest,
        indicators: &BTreeMap<String, IndicatorValue>,
    ) -> Result<String> {
        let strategy_desc = if req.strategy.description.is_empty() {
            "No strategy description provided".to_string()
        } else {
            req.strategy.description.join(" ")
        };

        let ticker = req
            .market
            .ticker
            .as_ref()
            .ok_or_else(|| ScreenerError::MissingData("ticker".to_string()))?;

        let prompt = format!(
            "Analyze this trading signal:\n\
             \n\
             STRATEGY:\n\
             {strategy_desc}\n\
             \n\
             SYMBOL: {symbol}\n\
             CURRENT PRICE: ${price:.8}\n\
             24H CHANGE: {change:.2}%\n\
             VOLUME (24H): ${volume:.2}\n\
             \n\
             TECHNICAL INDICATORS:\n\
             {indicators}\n\
             \n\
             RECENT PRICE ACTION:\n\
             {candles}\n\
             \n\
             Provide your analysis as JSON following the specified format. Focus on:\n\
             1. Whether the setup meets the strategy criteria\n\
             2. Risk/reward assessment at current price\n\
             3. Key support/resistance levels for stop loss and take profit\n\
             4. Overall confidence in this trade setup",
            symbol = req.symbol,
            price = ticker.last_price,
            change = ticker.price_change_percent,
            volume = ticker.quote_volume,
            indicators = format_indicators(indicators),
            candles = format_recent_candles(req),
        );

        Ok(prompt)
    }

    /// Prompt for re-analyzing a monitored signal: the base prompt plus the
    /// previous verdict and the reanalysis counter, so the model can focus
    /// on drift from the original call.
    pub fn build_monitoring_prompt(
        &self,
        req: &AnalysisRequest,
        indicators: &BTreeMap<String, IndicatorValue>,
        previous: Option<&Verdict>,
        analysis_count: u32,
        max_reanalyses: u32,
    ) -> Result<String> {
        let base = self.build_analysis_prompt(req, indicators)?;

        let previous_str = match previous {
            Some(verdict) => format!(
                "Decision: {}\nConfidence: {:.2}\nReasoning: {}\nAnalysis Count: {analysis_count} / {max_reanalyses}",
                verdict.decision, verdict.confidence, verdict.reasoning,
            ),
            None => "None (first analysis)".to_string(),
        };

        Ok(format!(
            "{base}\n\
             \n\
             PREVIOUS ANALYSIS:\n\
             {previous_str}\n\
             \n\
             REANALYSIS COUNT: {analysis_count} / {max_reanalyses}\n\
             \n\
             Since this signal is being monitored, focus on what has CHANGED:\n\
             - Has price action confirmed or contradicted the original signal?\n\
             - Have indicators improved or deteriorated?\n\
             - Are we approaching maximum reanalysis limit? Be more decisive.\n\
             - Should we enter NOW, reject the signal, or continue monitoring?"
        ))
    }
}

fn format_indicators(indicators: &BTreeMap<String, IndicatorValue>) -> String {
    if indicators.is_empty() {
        return "  No indicators calculated (strategy configuration may be empty)".to_string();
    }

    indicators
        .iter()
        .map(|(name, value)| format!("  {name}: {}", format_indicator_value(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_indicator_value(value: &IndicatorValue) -> String {
    match value {
        IndicatorValue::MovingAverage { value, series, .. }
        | IndicatorValue::Rsi { value, series, .. } => {
            format!("{value:.4} (latest of {} values)", series.len())
        }
        IndicatorValue::Macd {
            macd,
            signal,
            histogram,
            ..
        } => format!("macd={macd:.4}, signal={signal:.4}, histogram={histogram:.4}"),
        IndicatorValue::Bollinger {
            upper,
            middle,
            lower,
            ..
        } => format!("upper={upper:.4}, middle={middle:.4}, lower={lower:.4}"),
        IndicatorValue::Vwap { value } => format!("value={value:.4}"),
        IndicatorValue::Stochastic { k, d, .. } => format!("k={k:.4}, d={d:.4}"),
        IndicatorValue::AvgVolume { value, .. } | IndicatorValue::Range { value, .. } => {
            format!("value={value:.4}")
        }
        IndicatorValue::Pattern { signal } => {
            if signal.is_empty() {
                "none".to_string()
            } else {
                signal.clone()
            }
        }
    }
}

fn format_recent_candles(req: &AnalysisRequest) -> String {
    let candles = match req.market.candles.get(&req.interval) {
        Some(candles) if !candles.is_empty() => candles,
        _ => return "  No candle data available".to_string(),
    };

    let count = candles.len().min(5);
    let recent = &candles[candles.len() - count..];

    let mut out = format!("  Last {count} candles ({} interval):", req.interval);
    for (i, candle) in recent.iter().enumerate() {
        let direction = if candle.close > candle.open {
            "↑"
        } else if candle.close < candle.open {
            "↓"
        } else {
            "→"
        };

        // Writing into a String cannot fail
        let _ = write!(
            out,
            "\n    [{}] O:{:.2} H:{:.2} L:{:.2} C:{:.2} {} V:{:.0}",
            i + 1,
            candle.open,
            candle.high,
            candle.low,
            candle.close,
            direction,
            candle.volume,
        );
    }

    out
}
