use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::policy::{DetectorConfig, decide};
use super::{Alert, Classification, WickTouch, classify};
use crate::channel::ChannelPoint;
use crate::error::{DetectError, StoreError};
use crate::market::Candle;
use crate::state::{CrossState, CrossStateRepository};

/// Turns (candle, channel point) observations into at most one alert per
/// call, keeping one `CrossState` per symbol.
///
/// Every accepted call is written through to the repository. The in-memory
/// copy is authoritative for the process: a failed write does not roll it
/// back, so the next call still sees the latest classification.
pub struct BandCrossDetector {
    repo: Arc<dyn CrossStateRepository>,
    config: DetectorConfig,
    states: HashMap<String, CrossState>,
}

impl BandCrossDetector {
    pub fn new(repo: Arc<dyn CrossStateRepository>, config: DetectorConfig) -> Self {
        Self {
            repo,
            config,
            states: HashMap::new(),
        }
    }

    #[instrument(skip(self, candle, point), target = "detector", fields(ts = candle.open_time))]
    pub fn detect_cross(
        &mut self,
        symbol: &str,
        candle: &Candle,
        point: &ChannelPoint,
    ) -> Result<Option<Alert>, DetectError> {
        validate_candle(symbol, candle)?;

        if !point.is_usable() {
            debug!(quality = ?point.quality, "channel point not usable; skipping");
            return Ok(None);
        }

        let mut state = self.load(symbol)?;

        if state.is_replay(candle.open_time) {
            debug!(last = ?state.last_candle_ts, "candle already processed");
            return Ok(None);
        }

        let current = classify(candle, point);
        let decision = decide(&self.config, &state, current, WickTouch::of(candle, point));

        if state.last_classification == Classification::None {
            info!(classification = ?current, "seeded cross state");
        }

        let alert = decision.map(|(band, method)| {
            state.record_alert(band, candle.open_time);
            info!(?band, ?method, close = candle.close, "band cross");
            Alert {
                symbol: symbol.to_string(),
                band,
                method,
                direction: band.direction(),
                timestamp: candle.open_time,
                close: candle.close,
                upper_band: point.upper_band,
                lower_band: point.lower_band,
            }
        });

        state.last_classification = current;
        state.last_candle_ts = Some(candle.open_time);
        self.states.insert(symbol.to_string(), state.clone());

        if let Err(source) = self.repo.put(symbol, &state) {
            warn!(error = %source, "cross state write failed");
            return Err(DetectError::StatePersistence {
                symbol: symbol.to_string(),
                alert: alert.map(Box::new),
                source,
            });
        }

        Ok(alert)
    }

    /// Drops the symbol's state; its next observation re-seeds.
    pub fn reset(&mut self, symbol: &str) -> Result<bool, StoreError> {
        self.states.remove(symbol);
        self.repo.remove(symbol)
    }

    /// Drops every symbol's state in this detector's repository.
    pub fn reset_all(&mut self) -> Result<(), StoreError> {
        self.states.clear();
        self.repo.clear()
    }

    fn load(&self, symbol: &str) -> Result<CrossState, DetectError> {
        if let Some(state) = self.states.get(symbol) {
            return Ok(state.clone());
        }

        match self.repo.get(symbol) {
            Ok(Some(mut state)) => {
                state.symbol = symbol.to_string();
                Ok(state)
            }
            Ok(None) => Ok(CrossState::new(symbol)),
            Err(source) => Err(DetectError::StatePersistence {
                symbol: symbol.to_string(),
                alert: None,
                source,
            }),
        }
    }
}

fn validate_candle(symbol: &str, candle: &Candle) -> Result<(), DetectError> {
    let reason = if !candle.is_finite() {
        "non-finite price"
    } else if candle.low > candle.high {
        "low above high"
    } else {
        return Ok(());
    };

    Err(DetectError::InvalidCandle {
        symbol: symbol.to_string(),
        open_time: candle.open_time,
        reason: reason.to_string(),
    })
}
