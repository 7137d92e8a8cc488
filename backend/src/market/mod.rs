pub mod source;
pub mod symbols;
pub mod types;

pub use types::{Candle, CandleSeries, Timeframe};
