use async_trait::async_trait;
use tracing::info;

use super::AlertSink;
use crate::signal::Alert;
use crate::time::format_ms;

/// Emits every alert as a structured `info` event.
#[derive(Clone, Debug, Default)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, alert: &Alert) -> anyhow::Result<()> {
        info!(
            symbol = %alert.symbol,
            band = ?alert.band,
            method = ?alert.method,
            direction = ?alert.direction,
            candle = %format_ms(alert.timestamp),
            close = alert.close,
            upper_band = alert.upper_band,
            lower_band = alert.lower_band,
            "band cross alert"
        );
        Ok(())
    }
}
