//! Technical indicators module
//!
//! Pure, stateless functions over a candle slice. Every function returns
//! `None` (or a zero-filled series for the series variants) when the input is
//! shorter than the required window or the period is zero. Insufficient data
//! is an expected state, never an error or a panic.

pub mod bb;
pub mod ma;
pub mod macd;
pub mod patterns;
pub mod rsi;
pub mod stochastic;
pub mod volume;

pub use bb::*;
pub use ma::*;
pub use macd::*;
pub use patterns::*;
pub use rsi::*;
pub use stochastic::*;
pub use volume::*;
