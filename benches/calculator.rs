use criterion::{black_box, criterion_group, criterion_main, Criterion};
use screener_rs::prelude::*;
use std::sync::Arc;

fn bench_candles(count: usize) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let price = 50_000.0 + i as f64 * 10.0;
            Candle {
                open_time: i as i64 * 60_000,
                open: price,
                high: price + 100.0,
                low: price - 100.0,
                close: price + 50.0,
                volume: 1000.0 + i as f64,
                close_time: (i as i64 + 1) * 60_000,
            }
        })
        .collect()
}

fn bench_request() -> AnalysisRequest {
    let strategy = Arc::new(StrategyConfig {
        id: "bench-trader".to_string(),
        name: "bench".to_string(),
        indicators: vec![
            IndicatorSpec::new("RSI").with_param("period", ParamValue::Int(14)),
            IndicatorSpec::new("MACD"),
            IndicatorSpec::new("BollingerBands"),
            IndicatorSpec::new("Stochastic"),
            IndicatorSpec::new("VWAP"),
        ],
        ..Default::default()
    });

    let mut market = MarketData::new("BTCUSDT");
    market.ticker = Some(Ticker {
        last_price: 52_500.0,
        price_change_percent: 1.2,
        quote_volume: 1_000_000.0,
    });
    market.candles.insert("5m".to_string(), bench_candles(250));

    AnalysisRequest::new("bench-signal", "BTCUSDT", "5m", market, strategy)
}

fn calculator_benchmark(c: &mut Criterion) {
    let calculator = Calculator::new(100);
    let request = bench_request();

    c.bench_function("calculate_indicators", |b| {
        b.iter(|| calculator.calculate(black_box(&request)))
    });
}

fn prompter_benchmark(c: &mut Criterion) {
    let calculator = Calculator::new(100);
    let prompter = Prompter::new();
    let request = bench_request();
    let indicators = calculator.calculate(&request).unwrap();

    c.bench_function("build_analysis_prompt", |b| {
        b.iter(|| prompter.build_analysis_prompt(black_box(&request), black_box(&indicators)))
    });
}

criterion_group!(benches, calculator_benchmark, prompter_benchmark);
criterion_main!(benches);
