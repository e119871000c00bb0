//! Structured verdict parsing and validation
//!
//! The reasoning service is asked for pure JSON but routinely wraps it in
//! markdown fences or prose; parsing strips that before deserializing. All
//! malformed or rule-violating responses surface as `Validation` errors.

use crate::error::ScreenerError;
use crate::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Decision recommended by the reasoning service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Enter,
    Reject,
    Wait,
    ContinueMonitoring,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Decision::Enter => "enter",
            Decision::Reject => "reject",
            Decision::Wait => "wait",
            Decision::ContinueMonitoring => "continue_monitoring",
        };
        f.write_str(s)
    }
}

/// Structured analysis verdict returned by the reasoning service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub decision: Decision,
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default)]
    pub entry_price: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub take_profit_1: Option<f64>,
    #[serde(default)]
    pub take_profit_2: Option<f64>,
    #[serde(default)]
    pub position_size_pct: f64,
    #[serde(default)]
    pub risk_reward_ratio: Option<f64>,
    #[serde(default)]
    pub timeframe: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes_observed: Option<String>,
}

impl Verdict {
    pub fn should_enter(&self) -> bool {
        self.decision == Decision::Enter
    }

    pub fn should_reject(&self) -> bool {
        self.decision == Decision::Reject
    }

    /// Wait and continue_monitoring both keep the signal under observation.
    pub fn should_monitor(&self) -> bool {
        matches!(self.decision, Decision::Wait | Decision::ContinueMonitoring)
    }

    /// Basic structural validation.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ScreenerError::Validation(format!(
                "confidence must be between 0 and 1, got {:.2}",
                self.confidence
            )));
        }

        if self.reasoning.is_empty() {
            return Err(ScreenerError::Validation(
                "reasoning cannot be empty".to_string(),
            ));
        }

        if self.should_enter() {
            match self.entry_price {
                Some(p) if p > 0.0 => {}
                _ => {
                    return Err(ScreenerError::Validation(
                        "entry_price required for 'enter' decision".to_string(),
                    ))
                }
            }
            match self.stop_loss {
                Some(p) if p > 0.0 => {}
                _ => {
                    return Err(ScreenerError::Validation(
                        "stop_loss required for 'enter' decision".to_string(),
                    ))
                }
            }
            if self.position_size_pct <= 0.0 || self.position_size_pct > 100.0 {
                return Err(ScreenerError::Validation(format!(
                    "position_size_pct must be between 0 and 100, got {:.2}",
                    self.position_size_pct
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Decision: {} (Confidence: {:.2})",
            self.decision, self.confidence
        )?;
        writeln!(f, "Reasoning: {}", self.reasoning)?;

        if self.should_enter() {
            if let Some(entry) = self.entry_price {
                writeln!(f, "Entry: ${entry:.8}")?;
            }
            if let Some(stop) = self.stop_loss {
                writeln!(f, "Stop Loss: ${stop:.8}")?;
            }
            if let Some(tp1) = self.take_profit_1 {
                writeln!(f, "TP1: ${tp1:.8}")?;
            }
            if let Some(tp2) = self.take_profit_2 {
                writeln!(f, "TP2: ${tp2:.8}")?;
            }
            writeln!(f, "Position Size: {:.2}%", self.position_size_pct)?;
            if let Some(rr) = self.risk_reward_ratio {
                writeln!(f, "Risk/Reward: {rr:.2}:1")?;
            }
        }

        if let Some(changes) = &self.changes_observed {
            writeln!(f, "Changes: {changes}")?;
        }

        Ok(())
    }
}

/// Parse the reasoning service's text into a sanitized, validated verdict.
pub fn parse_verdict(content: &str) -> Result<Verdict> {
    let json = extract_json(content);

    let mut verdict: Verdict = serde_json::from_str(&json)
        .map_err(|e| ScreenerError::Validation(format!("failed to parse JSON: {e} (content: {json})")))?;

    validate_and_sanitize(&mut verdict)?;
    Ok(verdict)
}

/// Extract JSON from markdown code blocks, or return the content as-is.
fn extract_json(content: &str) -> String {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence =
        FENCE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*\n?(.*?)\n?```").expect("fence regex"));

    let content = content.trim();

    if let Some(captures) = fence.captures(content) {
        return captures[1].trim().to_string();
    }

    if content.starts_with('{') && content.ends_with('}') {
        return content.to_string();
    }

    // Last resort: the outermost brace pair
    if let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) {
        if end > start {
            return content[start..=end].to_string();
        }
    }

    content.to_string()
}

/// Clamp out-of-range fields, then enforce the trade-entry business rules.
pub fn validate_and_sanitize(verdict: &mut Verdict) -> Result<()> {
    verdict.confidence = verdict.confidence.clamp(0.0, 1.0);

    verdict.validate()?;

    if verdict.should_enter() {
        if let (Some(stop), Some(entry)) = (verdict.stop_loss, verdict.entry_price) {
            if stop >= entry {
                return Err(ScreenerError::Validation(format!(
                    "stop loss ({stop:.8}) must be below entry price ({entry:.8})"
                )));
            }

            let stop_pct = (entry - stop) / entry * 100.0;
            if stop_pct > 10.0 {
                return Err(ScreenerError::Validation(format!(
                    "stop loss too wide ({stop_pct:.2}%), maximum 10%"
                )));
            }
        }

        if let (Some(tp1), Some(entry)) = (verdict.take_profit_1, verdict.entry_price) {
            if tp1 <= entry {
                return Err(ScreenerError::Validation(format!(
                    "take profit 1 ({tp1:.8}) must be above entry price ({entry:.8})"
                )));
            }
        }

        if let (Some(tp2), Some(tp1)) = (verdict.take_profit_2, verdict.take_profit_1) {
            if tp2 <= tp1 {
                return Err(ScreenerError::Validation(format!(
                    "take profit 2 ({tp2:.8}) must be above take profit 1 ({tp1:.8})"
                )));
            }
        }

        if let Some(rr) = verdict.risk_reward_ratio {
            if rr < 1.0 {
                return Err(ScreenerError::Validation(format!(
                    "risk/reward ratio too low ({rr:.2}), minimum 1.0"
                )));
            }
        }

        verdict.position_size_pct = verdict.position_size_pct.clamp(0.1, 10.0);
    }

    Ok(())
}
