use serde::{Deserialize, Serialize};

use crate::signal::{Band, Classification};

/// Durable alerting state for one symbol.
///
/// `symbol` is the store key and is not repeated inside the record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossState {
    #[serde(skip)]
    pub symbol: String,
    pub last_classification: Classification,
    pub last_upper_alert_ts: Option<i64>,
    pub last_lower_alert_ts: Option<i64>,
    pub alert_count: u64,
    /// Newest candle applied; older or equal candles are replays.
    #[serde(default)]
    pub last_candle_ts: Option<i64>,
}

impl CrossState {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Band of the most recent alert, if any fired.
    pub fn last_fired_band(&self) -> Option<Band> {
        match (self.last_upper_alert_ts, self.last_lower_alert_ts) {
            (Some(upper), Some(lower)) if upper >= lower => Some(Band::Upper),
            (Some(_), Some(_)) => Some(Band::Lower),
            (Some(_), None) => Some(Band::Upper),
            (None, Some(_)) => Some(Band::Lower),
            (None, None) => None,
        }
    }

    pub fn record_alert(&mut self, band: Band, ts: i64) {
        match band {
            Band::Upper => self.last_upper_alert_ts = Some(ts),
            Band::Lower => self.last_lower_alert_ts = Some(ts),
        }
        self.alert_count += 1;
    }

    pub fn is_replay(&self, open_time: i64) -> bool {
        self.last_candle_ts.is_some_and(|ts| open_time <= ts)
    }
}
