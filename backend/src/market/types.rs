use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// One OHLC bar. `open_time` is epoch milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(open_time: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
        }
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    pub fn body_high(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_low(&self) -> f64 {
        self.open.min(self.close)
    }

    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }
}

/// Candles ordered by strictly increasing `open_time`. Read-only once built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self, MarketError> {
        if let Some(index) = candles
            .windows(2)
            .position(|w| w[1].open_time <= w[0].open_time)
        {
            return Err(MarketError::NonMonotonic {
                index: index + 1,
                prev: candles[index].open_time,
                next: candles[index + 1].open_time,
            });
        }
        Ok(Self { candles })
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

/// Candle interval buckets the scanner runs over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    pub fn duration_ms(&self) -> i64 {
        const MINUTE: i64 = 60_000;
        match self {
            Timeframe::M15 => 15 * MINUTE,
            Timeframe::M30 => 30 * MINUTE,
            Timeframe::H1 => 60 * MINUTE,
            Timeframe::H4 => 240 * MINUTE,
            Timeframe::D1 => 1_440 * MINUTE,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "15m" => Ok(Timeframe::M15),
            "30m" => Ok(Timeframe::M30),
            "1h" | "60m" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            other => Err(MarketError::UnknownTimeframe(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(ts: i64) -> Candle {
        Candle::new(ts, 1.0, 2.0, 0.5, 1.5)
    }

    #[test]
    fn series_rejects_duplicate_open_time() {
        let err = CandleSeries::new(vec![c(1), c(2), c(2)]).unwrap_err();
        assert!(matches!(
            err,
            MarketError::NonMonotonic {
                index: 2,
                prev: 2,
                next: 2
            }
        ));
    }

    #[test]
    fn series_accepts_strictly_increasing() {
        let s = CandleSeries::new(vec![c(1), c(5), c(9)]).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.as_slice().last().map(|c| c.open_time), Some(9));
    }

    #[test]
    fn body_bounds_follow_open_close() {
        let bearish = Candle::new(0, 10.0, 12.0, 7.0, 8.0);
        assert_eq!(bearish.body_high(), 10.0);
        assert_eq!(bearish.body_low(), 8.0);
        assert!((bearish.typical_price() - 9.0).abs() < 1e-12);
    }

    #[test]
    fn timeframe_parses_and_displays() {
        assert_eq!("30M".parse::<Timeframe>().unwrap(), Timeframe::M30);
        assert_eq!(Timeframe::H4.to_string(), "4h");
        assert_eq!(Timeframe::M15.duration_ms(), 900_000);
        assert!("7m".parse::<Timeframe>().is_err());
    }
}
