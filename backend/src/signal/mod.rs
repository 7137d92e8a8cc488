pub mod classify;
pub mod detector;
pub mod policy;

use serde::{Deserialize, Serialize};

pub use classify::{WickTouch, classify};
pub use detector::BandCrossDetector;
pub use policy::{DedupPolicy, DetectorConfig};

/// Where a candle body sits relative to the channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// Nothing observed yet for the symbol.
    #[default]
    None,
    Inside,
    AboveUpper,
    BelowLower,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Band {
    Upper,
    Lower,
}

impl Band {
    pub fn direction(&self) -> Direction {
        match self {
            Band::Upper => Direction::Bullish,
            Band::Lower => Direction::Bearish,
        }
    }

    /// Classification of a body that has fully crossed this band.
    pub fn beyond(&self) -> Classification {
        match self {
            Band::Upper => Classification::AboveUpper,
            Band::Lower => Classification::BelowLower,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Body,
    Wick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Bullish,
    Bearish,
}

/// A single band crossing, produced once and handed to the sinks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub symbol: String,
    pub band: Band,
    pub method: Method,
    pub direction: Direction,
    /// Candle `open_time`, epoch ms.
    pub timestamp: i64,
    pub close: f64,
    pub upper_band: f64,
    pub lower_band: f64,
}
