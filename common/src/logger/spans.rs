use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{Span, field};

use super::TraceId;

/// Root span for one scan run over a timeframe bucket.
pub fn run_span(timeframe: &str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "run",
        timeframe = %timeframe,
        trace_id = %trace_id.as_str(),
        symbols = field::Empty
    )
}

/// Child span for the work done on a single symbol.
pub fn symbol_span(symbol: &str) -> Span {
    tracing::info_span!("symbol", symbol = %symbol, source = field::Empty)
}

/// Records which candle source served the current symbol.
pub fn annotate_span(source: &str) {
    Span::current().record("source", field::display(source));
}

pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
