use chrono::{DateTime, Utc};

/// Wall-clock time as epoch milliseconds, the unit of `Candle::open_time`.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Renders an epoch-ms timestamp as UTC, falling back to the raw number.
pub fn format_ms(ts_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ts_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| ts_ms.to_string())
}
