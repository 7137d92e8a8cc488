use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::AlertSink;
use crate::market::Timeframe;
use crate::signal::Alert;

/// Appends alerts as JSON lines, one file per timeframe and UTC day of the
/// alerting candle: `<dir>/alerts_<tf>_<YYYYMMDD>.jsonl`.
pub struct JournalSink {
    dir: PathBuf,
    timeframe: Timeframe,
}

impl JournalSink {
    pub fn new(dir: impl Into<PathBuf>, timeframe: Timeframe) -> Self {
        Self {
            dir: dir.into(),
            timeframe,
        }
    }

    pub fn path_for(&self, ts_ms: i64) -> PathBuf {
        let day = DateTime::<Utc>::from_timestamp_millis(ts_ms)
            .map(|dt| dt.format("%Y%m%d").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        self.dir
            .join(format!("alerts_{}_{}.jsonl", self.timeframe, day))
    }
}

#[async_trait]
impl AlertSink for JournalSink {
    fn name(&self) -> &str {
        "journal"
    }

    async fn deliver(&self, alert: &Alert) -> Result<()> {
        let path = self.path_for(alert.timestamp);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;

        let mut line = serde_json::to_string(alert).context("failed to encode alert")?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to open {}", path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("failed to append to {}", path.display()))?;
        file.flush().await?;

        debug!(path = %path.display(), symbol = %alert.symbol, "alert journaled");
        Ok(())
    }
}
