use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::types::{Candle, CandleSeries, Timeframe};
use crate::error::MarketError;

/// Candle retrieval boundary.
///
/// `Ok(None)` means the source has no data for the symbol; `Err` is a
/// transport or decoding failure. Neither aborts a run.
#[async_trait]
pub trait CandleSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Option<CandleSeries>>;
}

/// Tries each source in order and returns the first usable series.
///
/// A series shorter than `min_candles` counts as "no data" for that source.
pub struct FallbackSource {
    sources: Vec<Arc<dyn CandleSource>>,
    min_candles: usize,
}

impl FallbackSource {
    pub fn new(sources: Vec<Arc<dyn CandleSource>>, min_candles: usize) -> Self {
        Self {
            sources,
            min_candles,
        }
    }
}

#[async_trait]
impl CandleSource for FallbackSource {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Option<CandleSeries>> {
        for source in &self.sources {
            match source.fetch(symbol, timeframe, count).await {
                Ok(Some(series)) if series.len() >= self.min_candles => {
                    debug!(source = source.name(), candles = series.len(), "candles fetched");
                    return Ok(Some(series));
                }
                Ok(Some(series)) => {
                    warn!(
                        source = source.name(),
                        candles = series.len(),
                        min = self.min_candles,
                        "insufficient candles; trying next source"
                    );
                }
                Ok(None) => debug!(source = source.name(), "symbol not available"),
                Err(e) => warn!(source = source.name(), error = %e, "candle source failed"),
            }
        }

        warn!(symbol, "all candle sources exhausted");
        Ok(None)
    }
}

/// Reads exchange-style OHLCV rows `[ts, open, high, low, close, volume]`
/// from `<dir>/<SYMBOL>_<timeframe>.json`, keeping the newest `count` rows.
pub struct FileCandleSource {
    dir: PathBuf,
}

impl FileCandleSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.dir.join(format!("{symbol}_{timeframe}.json"))
    }
}

#[async_trait]
impl CandleSource for FileCandleSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Option<CandleSeries>> {
        let path = self.path_for(symbol, timeframe);

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };

        let rows: Vec<Vec<f64>> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to decode {}", path.display()))?;

        let candles = decode_rows(&rows)?;
        let skip = candles.len().saturating_sub(count);
        let series = CandleSeries::new(candles.into_iter().skip(skip).collect())?;

        Ok(Some(series))
    }
}

fn decode_rows(rows: &[Vec<f64>]) -> Result<Vec<Candle>, MarketError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| match row.as_slice() {
            [ts, open, high, low, close, ..] => {
                if ts.fract() != 0.0 || !ts.is_finite() {
                    return Err(MarketError::MalformedRow {
                        index,
                        reason: format!("timestamp {ts} is not an integer"),
                    });
                }
                Ok(Candle::new(*ts as i64, *open, *high, *low, *close))
            }
            _ => Err(MarketError::MalformedRow {
                index,
                reason: format!("expected at least 5 fields, got {}", row.len()),
            }),
        })
        .collect()
}
