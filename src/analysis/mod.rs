//! Signal analysis: indicator calculation, prompt building and the
//! concurrent evaluation engine

pub mod calculator;
pub mod engine;
pub mod prompter;
pub mod types;

pub use calculator::{Calculator, IndicatorValue};
pub use engine::{AnalysisEngine, EngineStats};
pub use prompter::Prompter;
pub use types::{AnalysisReport, AnalysisRequest, LoggingSink, ResultSink};
