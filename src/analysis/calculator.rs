//! Indicator calculation for analysis requests

use crate::analysis::types::AnalysisRequest;
use crate::data::Candle;
use crate::error::ScreenerError;
use crate::indicators;
use crate::strategy::{IndicatorSpec, ParamValue};
use crate::Result;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// A calculated indicator value, latest figures plus series where the
/// indicator exposes them.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndicatorValue {
    MovingAverage {
        value: f64,
        series: Vec<f64>,
        period: usize,
    },
    Rsi {
        value: f64,
        series: Vec<f64>,
        period: usize,
    },
    Macd {
        macd: f64,
        signal: f64,
        histogram: f64,
        macd_series: Vec<f64>,
        signal_series: Vec<f64>,
        histogram_series: Vec<f64>,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
        upper_series: Vec<f64>,
        middle_series: Vec<f64>,
        lower_series: Vec<f64>,
        period: usize,
        std_dev: f64,
    },
    Vwap {
        value: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
        k_period: usize,
        d_period: usize,
    },
    AvgVolume {
        value: f64,
        period: usize,
    },
    Range {
        value: f64,
        period: usize,
    },
    Pattern {
        signal: String,
    },
}

/// Maps a strategy's configured indicator list onto indicator library calls.
/// Per-indicator failures are isolated: they are logged and the indicator is
/// omitted from the result, never failing the whole request.
#[derive(Debug, Clone)]
pub struct Calculator {
    default_limit: usize,
}

impl Calculator {
    /// `default_limit` bounds the analysis window handed to each indicator.
    pub fn new(default_limit: usize) -> Self {
        Self { default_limit }
    }

    /// Compute all indicators configured on the request's strategy over the
    /// primary interval. Fails only when that interval has no cached candles.
    pub fn calculate(&self, req: &AnalysisRequest) -> Result<BTreeMap<String, IndicatorValue>> {
        if req.strategy.indicators.is_empty() {
            tracing::warn!(
                strategy_id = %req.strategy_id,
                "strategy has no indicators configured"
            );
            return Ok(BTreeMap::new());
        }

        let candles = req
            .market
            .candles
            .get(&req.interval)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                ScreenerError::MissingData(format!("no candles for interval {}", req.interval))
            })?;

        let start = candles.len().saturating_sub(self.default_limit);
        let window = &candles[start..];

        let mut result = BTreeMap::new();
        for spec in &req.strategy.indicators {
            match calculate_indicator(spec, window) {
                Ok(value) => {
                    result.insert(spec.name.clone(), value);
                }
                Err(e) => {
                    tracing::warn!(
                        indicator = %spec.name,
                        signal_id = %req.signal_id,
                        error = %e,
                        "skipping indicator"
                    );
                }
            }
        }

        Ok(result)
    }
}

fn calculate_indicator(spec: &IndicatorSpec, candles: &[Candle]) -> Result<IndicatorValue> {
    match spec.name.as_str() {
        "MA" | "SMA" => {
            let period = int_param(&spec.params, "period", 20)?;
            let series = indicators::sma_series(candles, period);
            let value = indicators::sma(candles, period).ok_or(ScreenerError::InsufficientData {
                indicator: format!("MA({period})"),
            })?;
            Ok(IndicatorValue::MovingAverage {
                value,
                series,
                period,
            })
        }
        "EMA" => {
            let period = int_param(&spec.params, "period", 20)?;
            let series = indicators::ema_series(candles, period);
            let value = indicators::ema(candles, period).ok_or(ScreenerError::InsufficientData {
                indicator: format!("EMA({period})"),
            })?;
            Ok(IndicatorValue::MovingAverage {
                value,
                series,
                period,
            })
        }
        "RSI" => {
            let period = int_param(&spec.params, "period", 14)?;
            let result =
                indicators::rsi(candles, period).ok_or(ScreenerError::InsufficientData {
                    indicator: format!("RSI({period})"),
                })?;
            let value = result.values[result.values.len() - 1];
            Ok(IndicatorValue::Rsi {
                value,
                series: result.values,
                period,
            })
        }
        "MACD" => {
            let short_period = int_param(&spec.params, "shortPeriod", 12)?;
            let long_period = int_param(&spec.params, "longPeriod", 26)?;
            let signal_period = int_param(&spec.params, "signalPeriod", 9)?;
            let result = indicators::macd(candles, short_period, long_period, signal_period)
                .ok_or(ScreenerError::InsufficientData {
                    indicator: format!("MACD({short_period},{long_period},{signal_period})"),
                })?;
            let idx = result.macd.len() - 1;
            Ok(IndicatorValue::Macd {
                macd: result.macd[idx],
                signal: result.signal[idx],
                histogram: result.histogram[idx],
                macd_series: result.macd,
                signal_series: result.signal,
                histogram_series: result.histogram,
            })
        }
        "BollingerBands" | "BB" => {
            let period = int_param(&spec.params, "period", 20)?;
            let std_dev = float_param(&spec.params, "stdDev", 2.0)?;
            let result = indicators::bollinger_bands(candles, period, std_dev).ok_or(
                ScreenerError::InsufficientData {
                    indicator: format!("BB({period},{std_dev:.1})"),
                },
            )?;
            let idx = result.middle.len() - 1;
            Ok(IndicatorValue::Bollinger {
                upper: result.upper[idx],
                middle: result.middle[idx],
                lower: result.lower[idx],
                upper_series: result.upper,
                middle_series: result.middle,
                lower_series: result.lower,
                period,
                std_dev,
            })
        }
        "VWAP" => {
            let value = indicators::vwap(candles);
            if value == 0.0 {
                return Err(ScreenerError::InsufficientData {
                    indicator: "VWAP".to_string(),
                });
            }
            Ok(IndicatorValue::Vwap { value })
        }
        "Stochastic" => {
            let k_period = int_param(&spec.params, "kPeriod", 14)?;
            let d_period = int_param(&spec.params, "dPeriod", 3)?;
            let value = indicators::stochastic(candles, k_period, d_period).ok_or(
                ScreenerError::InsufficientData {
                    indicator: format!("Stochastic({k_period},{d_period})"),
                },
            )?;
            Ok(IndicatorValue::Stochastic {
                k: value.k,
                d: value.d,
                k_period,
                d_period,
            })
        }
        "AvgVolume" => {
            let period = int_param(&spec.params, "period", 20)?;
            let value = indicators::avg_volume(candles, period).ok_or(
                ScreenerError::InsufficientData {
                    indicator: format!("AvgVolume({period})"),
                },
            )?;
            Ok(IndicatorValue::AvgVolume { value, period })
        }
        "HighestHigh" => {
            let period = int_param(&spec.params, "period", 20)?;
            let value = indicators::highest_high(candles, period).ok_or(
                ScreenerError::InsufficientData {
                    indicator: format!("HighestHigh({period})"),
                },
            )?;
            Ok(IndicatorValue::Range { value, period })
        }
        "LowestLow" => {
            let period = int_param(&spec.params, "period", 20)?;
            let value = indicators::lowest_low(candles, period).ok_or(
                ScreenerError::InsufficientData {
                    indicator: format!("LowestLow({period})"),
                },
            )?;
            Ok(IndicatorValue::Range { value, period })
        }
        "Engulfing" => {
            let signal = indicators::detect_engulfing(candles)
                .map(|e| e.as_str().to_string())
                .unwrap_or_default();
            Ok(IndicatorValue::Pattern { signal })
        }
        other => Err(ScreenerError::UnsupportedIndicator(other.to_string())),
    }
}

fn int_param(params: &HashMap<String, ParamValue>, key: &str, default: usize) -> Result<usize> {
    match params.get(key) {
        Some(value) => value.as_period(key),
        None => Ok(default),
    }
}

fn float_param(params: &HashMap<String, ParamValue>, key: &str, default: f64) -> Result<f64> {
    match params.get(key) {
        Some(value) => value.as_f64(key),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MarketData;
    use crate::indicators::test_support::rising_candles;
    use crate::strategy::StrategyConfig;
    use std::sync::Arc;

    fn request_with(indicators: Vec<IndicatorSpec>, candle_count: usize) -> AnalysisRequest {
        let strategy = Arc::new(StrategyConfig {
            id: "trader-1".to_string(),
            name: "test".to_string(),
            indicators,
            ..Default::default()
        });

        let mut market = MarketData::new("BTCUSDT");
        market
            .candles
            .insert("5m".to_string(), rising_candles(candle_count, 100.0));

        AnalysisRequest::new("sig-1", "BTCUSDT", "5m", market, strategy)
    }

    #[test]
    fn test_calculates_configured_indicators() {
        let calculator = Calculator::new(100);
        let req = request_with(
            vec![
                IndicatorSpec::new("RSI").with_param("period", ParamValue::Float(14.0)),
                IndicatorSpec::new("MACD"),
                IndicatorSpec::new("BB"),
            ],
            50,
        );

        let result = calculator.calculate(&req).unwrap();
        assert_eq!(result.len(), 3);
        assert!(matches!(result["RSI"], IndicatorValue::Rsi { period: 14, .. }));
        assert!(matches!(result["MACD"], IndicatorValue::Macd { .. }));
        assert!(matches!(
            result["BB"],
            IndicatorValue::Bollinger { period: 20, .. }
        ));
    }

    #[test]
    fn test_unsupported_indicator_is_isolated() {
        let calculator = Calculator::new(100);
        let req = request_with(
            vec![
                IndicatorSpec::new("Nonexistent"),
                IndicatorSpec::new("RSI"),
            ],
            50,
        );

        // The bad indicator is skipped, the good one still computed
        let result = calculator.calculate(&req).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.contains_key("RSI"));
    }

    #[test]
    fn test_insufficient_data_is_isolated() {
        let calculator = Calculator::new(100);
        let req = request_with(
            vec![
                IndicatorSpec::new("RSI").with_param("period", ParamValue::Int(14)),
                IndicatorSpec::new("SMA").with_param("period", ParamValue::Int(5)),
            ],
            10,
        );

        let result = calculator.calculate(&req).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.contains_key("SMA"));
    }

    #[test]
    fn test_bad_param_is_isolated() {
        let calculator = Calculator::new(100);
        let req = request_with(
            vec![
                IndicatorSpec::new("RSI")
                    .with_param("period", ParamValue::Text("banana".to_string())),
                IndicatorSpec::new("VWAP"),
            ],
            50,
        );

        let result = calculator.calculate(&req).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.contains_key("VWAP"));
    }

    #[test]
    fn test_missing_interval_fails() {
        let calculator = Calculator::new(100);
        let mut req = request_with(vec![IndicatorSpec::new("RSI")], 50);
        req.interval = "1h".to_string();

        assert!(matches!(
            calculator.calculate(&req),
            Err(ScreenerError::MissingData(_))
        ));
    }

    #[test]
    fn test_no_indicators_configured_is_ok() {
        let calculator = Calculator::new(100);
        let req = request_with(vec![], 50);
        assert!(calculator.calculate(&req).unwrap().is_empty());
    }

    #[test]
    fn test_window_is_bounded() {
        let calculator = Calculator::new(30);
        let req = request_with(vec![IndicatorSpec::new("SMA")], 200);

        let result = calculator.calculate(&req).unwrap();
        match &result["SMA"] {
            IndicatorValue::MovingAverage { series, .. } => assert_eq!(series.len(), 30),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn test_string_params_coerce() {
        let calculator = Calculator::new(100);
        let req = request_with(
            vec![IndicatorSpec::new("Stochastic")
                .with_param("kPeriod", ParamValue::Text("14".to_string()))
                .with_param("dPeriod", ParamValue::Int(3))],
            50,
        );

        let result = calculator.calculate(&req).unwrap();
        assert!(matches!(
            result["Stochastic"],
            IndicatorValue::Stochastic {
                k_period: 14,
                d_period: 3,
                ..
            }
        ));
    }
}
