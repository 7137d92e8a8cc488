//! One scan run over a single timeframe bucket.
//!
//! Responsibilities:
//! - Fetch candles per symbol through the `CandleSource` chain.
//! - Rebuild the channel over the whole window and evaluate one candle.
//! - Feed the detector and fan alerts out to every sink.
//!
//! Symbols are processed sequentially so the detector and its repository
//! see exactly one writer. Work stops between symbols once the wall-clock
//! budget is spent or shutdown is requested; the remaining symbols are
//! counted as deferred. A symbol in flight always finishes, so an alert
//! whose state was saved is also delivered.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{Instrument, debug, error, info, warn};

use common::logger::{TraceId, annotate_span, run_span, symbol_span, warn_if_slow};

use crate::channel::ChannelBuilder;
use crate::error::DetectError;
use crate::market::Timeframe;
use crate::market::source::CandleSource;
use crate::notify::AlertSink;
use crate::signal::{Alert, Band, BandCrossDetector};

const SLOW_FETCH: Duration = Duration::from_secs(5);
const SLOW_DELIVERY: Duration = Duration::from_secs(2);

#[derive(Clone, Debug)]
pub struct ScanSettings {
    pub timeframe: Timeframe,
    /// Candles requested per symbol.
    pub candle_count: usize,
    /// Shorter series are skipped as insufficient.
    pub min_candles: usize,
    pub budget: Duration,
    /// Evaluate the second-to-last candle; the last one is still forming.
    pub evaluate_last_closed: bool,
    /// Skip symbols whose evaluated candle closed longer ago than this.
    pub max_candle_age: Option<Duration>,
}

impl ScanSettings {
    pub fn new(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            candle_count: 200,
            min_candles: 150,
            budget: Duration::from_secs(900),
            evaluate_last_closed: true,
            max_candle_age: None,
        }
    }
}

/// Per-run counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub analyzed: usize,
    pub alerts_upper: usize,
    pub alerts_lower: usize,
    pub skipped_no_data: usize,
    pub skipped_insufficient: usize,
    pub skipped_stale: usize,
    pub invalid: usize,
    pub failed: usize,
    pub deferred: usize,
}

impl RunSummary {
    pub fn alerts(&self) -> usize {
        self.alerts_upper + self.alerts_lower
    }

    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Analyzed { alert, persisted } => {
                self.analyzed += 1;
                match alert.as_ref().map(|a| a.band) {
                    Some(Band::Upper) => self.alerts_upper += 1,
                    Some(Band::Lower) => self.alerts_lower += 1,
                    None => {}
                }
                if !persisted {
                    self.failed += 1;
                }
            }
            Outcome::NoData => self.skipped_no_data += 1,
            Outcome::Insufficient => self.skipped_insufficient += 1,
            Outcome::Stale => self.skipped_stale += 1,
            Outcome::Invalid => self.invalid += 1,
            Outcome::Failed => self.failed += 1,
        }
    }
}

#[derive(Debug)]
enum Outcome {
    Analyzed { alert: Option<Alert>, persisted: bool },
    NoData,
    Insufficient,
    Stale,
    Invalid,
    Failed,
}

pub struct Scanner {
    source: Arc<dyn CandleSource>,
    sinks: Vec<Arc<dyn AlertSink>>,
    detector: BandCrossDetector,
    channel: ChannelBuilder,
    settings: ScanSettings,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Scanner {
    pub fn new(
        source: Arc<dyn CandleSource>,
        sinks: Vec<Arc<dyn AlertSink>>,
        detector: BandCrossDetector,
        channel: ChannelBuilder,
        settings: ScanSettings,
    ) -> Self {
        Self {
            source,
            sinks,
            detector,
            channel,
            settings,
            shutdown: None,
        }
    }

    /// Stop before the next symbol once `true` is sent.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    pub async fn run(&mut self, symbols: &[String]) -> RunSummary {
        self.run_at(symbols, crate::time::now_ms()).await
    }

    /// Runs every symbol once, judging candle freshness against `now_ms`.
    pub async fn run_at(&mut self, symbols: &[String], now_ms: i64) -> RunSummary {
        let trace_id = TraceId::default();
        let span = run_span(self.settings.timeframe.as_str(), &trace_id);
        span.record("symbols", symbols.len());

        async {
            let started = Instant::now();
            let mut summary = RunSummary {
                total: symbols.len(),
                ..RunSummary::default()
            };

            info!("scan started");

            for (i, symbol) in symbols.iter().enumerate() {
                if started.elapsed() >= self.settings.budget {
                    summary.deferred = symbols.len() - i;
                    warn!(
                        deferred = summary.deferred,
                        budget_secs = self.settings.budget.as_secs(),
                        "run budget exhausted"
                    );
                    break;
                }
                if self.shutdown_requested() {
                    summary.deferred = symbols.len() - i;
                    info!(deferred = summary.deferred, "shutdown requested, stopping scan");
                    break;
                }

                let outcome = self
                    .scan_symbol(symbol, now_ms)
                    .instrument(symbol_span(symbol))
                    .await;
                summary.record(&outcome);
            }

            info!(
                analyzed = summary.analyzed,
                alerts_upper = summary.alerts_upper,
                alerts_lower = summary.alerts_lower,
                no_data = summary.skipped_no_data,
                insufficient = summary.skipped_insufficient,
                stale = summary.skipped_stale,
                invalid = summary.invalid,
                failed = summary.failed,
                deferred = summary.deferred,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "scan finished"
            );
            summary
        }
        .instrument(span)
        .await
    }

    async fn scan_symbol(&mut self, symbol: &str, now_ms: i64) -> Outcome {
        let fetched = warn_if_slow(
            "fetch_candles",
            SLOW_FETCH,
            self.source
                .fetch(symbol, self.settings.timeframe, self.settings.candle_count),
        )
        .await;

        let series = match fetched {
            Ok(Some(series)) => series,
            Ok(None) => {
                debug!("no candles available");
                return Outcome::NoData;
            }
            Err(e) => {
                warn!(error = %e, "candle fetch failed");
                return Outcome::Failed;
            }
        };
        annotate_span(self.source.name());

        let evaluated_from_end = if self.settings.evaluate_last_closed { 2 } else { 1 };
        let min = self.settings.min_candles.max(evaluated_from_end);
        if series.len() < min {
            debug!(candles = series.len(), min, "insufficient candles");
            return Outcome::Insufficient;
        }

        let candles = series.as_slice();
        let index = candles.len() - evaluated_from_end;
        let candle = candles[index];

        if let Some(max_age) = self.settings.max_candle_age {
            let closed_at = candle.open_time + self.settings.timeframe.duration_ms();
            let age_ms = now_ms - closed_at;
            if age_ms > max_age.as_millis() as i64 {
                debug!(age_ms, "evaluated candle is stale");
                return Outcome::Stale;
            }
        }

        let points = self.channel.build(candles);
        let point = points[index];

        let (alert, persisted) = match self.detector.detect_cross(symbol, &candle, &point) {
            Ok(alert) => (alert, true),
            Err(DetectError::InvalidCandle { reason, .. }) => {
                warn!(reason = %reason, ts = candle.open_time, "invalid candle");
                return Outcome::Invalid;
            }
            Err(DetectError::StatePersistence { alert, source, .. }) => {
                error!(error = %source, "cross state not persisted");
                (alert.map(|a| *a), false)
            }
        };

        if let Some(alert) = &alert {
            self.deliver(alert).await;
        }

        Outcome::Analyzed { alert, persisted }
    }

    async fn deliver(&self, alert: &Alert) {
        for sink in &self.sinks {
            let delivered = warn_if_slow("deliver_alert", SLOW_DELIVERY, sink.deliver(alert)).await;
            if let Err(e) = delivered {
                warn!(sink = sink.name(), error = %e, "alert delivery failed");
            }
        }
    }
}
