//! Strategy configuration types and registry
//!
//! Strategies are owned by an external provider; this core only reads them.
//! Indicator parameters arrive as loosely-typed JSON, so each parameter is a
//! tagged [`ParamValue`] with explicit coercions instead of a free-form `any`.

use crate::error::ScreenerError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A single loosely-typed indicator parameter. Accepts numeric or
/// numeric-string forms; coercion failures surface as `InvalidParameter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Coerce to a period (non-negative whole number).
    pub fn as_period(&self, name: &str) -> Result<usize> {
        let invalid = |reason: String| ScreenerError::InvalidParameter {
            name: name.to_string(),
            reason,
        };

        match self {
            ParamValue::Int(v) => {
                usize::try_from(*v).map_err(|_| invalid(format!("negative value {v}")))
            }
            ParamValue::Float(v) => {
                if *v < 0.0 || !v.is_finite() {
                    Err(invalid(format!("invalid value {v}")))
                } else {
                    Ok(*v as usize)
                }
            }
            ParamValue::Text(s) => s
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid(format!("not a whole number: {s:?}"))),
        }
    }

    /// Coerce to a float.
    pub fn as_f64(&self, name: &str) -> Result<f64> {
        match self {
            ParamValue::Int(v) => Ok(*v as f64),
            ParamValue::Float(v) => Ok(*v),
            ParamValue::Text(s) => {
                s.trim()
                    .parse::<f64>()
                    .map_err(|_| ScreenerError::InvalidParameter {
                        name: name.to_string(),
                        reason: format!("not a number: {s:?}"),
                    })
            }
        }
    }
}

/// One configured indicator within a strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub params: HashMap<String, ParamValue>,
}

impl IndicatorSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// A trading strategy as configured by its owner: which indicators to
/// calculate and how the setup is described to the reasoning service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub id: String,
    pub name: String,
    /// Human-readable description lines, joined into the prompt.
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default)]
    pub indicators: Vec<IndicatorSpec>,
    /// Optional model override for this strategy's analyses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_tier: Option<String>,
}

/// Read-only lookup of strategies by id, shared across producers.
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    strategies: RwLock<HashMap<String, Arc<StrategyConfig>>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, strategy: StrategyConfig) {
        let mut strategies = self.strategies.write().unwrap_or_else(|e| e.into_inner());
        strategies.insert(strategy.id.clone(), Arc::new(strategy));
    }

    pub fn get(&self, id: &str) -> Option<Arc<StrategyConfig>> {
        let strategies = self.strategies.read().unwrap_or_else(|e| e.into_inner());
        strategies.get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<Arc<StrategyConfig>> {
        let mut strategies = self.strategies.write().unwrap_or_else(|e| e.into_inner());
        strategies.remove(id)
    }

    pub fn ids(&self) -> Vec<String> {
        let strategies = self.strategies.read().unwrap_or_else(|e| e.into_inner());
        strategies.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let strategies = self.strategies.read().unwrap_or_else(|e| e.into_inner());
        strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_coercion_numeric_forms() {
        assert_eq!(ParamValue::Int(14).as_period("period").unwrap(), 14);
        assert_eq!(ParamValue::Float(14.0).as_period("period").unwrap(), 14);
        assert_eq!(
            ParamValue::Text("14".to_string()).as_period("period").unwrap(),
            14
        );

        assert_eq!(ParamValue::Int(2).as_f64("stdDev").unwrap(), 2.0);
        assert_eq!(
            ParamValue::Text("2.5".to_string()).as_f64("stdDev").unwrap(),
            2.5
        );
    }

    #[test]
    fn test_param_coercion_failures() {
        assert!(matches!(
            ParamValue::Int(-5).as_period("period"),
            Err(ScreenerError::InvalidParameter { .. })
        ));
        assert!(matches!(
            ParamValue::Text("abc".to_string()).as_period("period"),
            Err(ScreenerError::InvalidParameter { .. })
        ));
        assert!(matches!(
            ParamValue::Text("".to_string()).as_f64("stdDev"),
            Err(ScreenerError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_indicator_spec_from_loose_json() {
        let spec: IndicatorSpec = serde_json::from_str(
            r#"{"name": "RSI", "params": {"period": "14"}}"#,
        )
        .unwrap();
        assert_eq!(spec.name, "RSI");
        assert_eq!(spec.params["period"].as_period("period").unwrap(), 14);

        let spec: IndicatorSpec =
            serde_json::from_str(r#"{"name": "BB", "params": {"stdDev": 2.0}}"#).unwrap();
        assert_eq!(spec.params["stdDev"].as_f64("stdDev").unwrap(), 2.0);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = StrategyRegistry::new();
        assert!(registry.is_empty());

        registry.insert(StrategyConfig {
            id: "trader-1".to_string(),
            name: "RSI dip buyer".to_string(),
            ..Default::default()
        });

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("trader-1").unwrap().name, "RSI dip buyer");
        assert!(registry.get("trader-2").is_none());

        registry.remove("trader-1");
        assert!(registry.is_empty());
    }
}
