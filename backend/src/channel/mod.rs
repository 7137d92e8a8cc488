pub mod builder;
pub mod filter;

use serde::{Deserialize, Serialize};

pub use builder::ChannelBuilder;
pub use filter::{FilterOutput, RecursiveChannelFilter, WarmUp};

use crate::error::ChannelError;
use crate::market::Candle;

/// Channel parameters, fixed for a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Filter order, 1..=9.
    pub poles: u8,
    /// Sampling period, at least 2.
    pub period: u32,
    /// Filtered true range multiplier for the bands.
    pub multiplier: f64,
    pub lag_reduction: bool,
    /// Averages the N-pole output with a 1-pole pass.
    pub fast_response: bool,
    /// Early-output handling for every filter pass.
    #[serde(default)]
    pub warm_up: WarmUp,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            poles: 4,
            period: 144,
            multiplier: 1.414,
            lag_reduction: false,
            fast_response: false,
            warm_up: WarmUp::SkipMissing,
        }
    }
}

impl ChannelConfig {
    pub fn validate(&self) -> Result<(), ChannelError> {
        if !(filter::MIN_POLES..=filter::MAX_POLES).contains(&self.poles) {
            return Err(ChannelError::invalid(
                "poles",
                format!(
                    "{} is outside [{}, {}]",
                    self.poles,
                    filter::MIN_POLES,
                    filter::MAX_POLES
                ),
            ));
        }
        if self.period < filter::MIN_PERIOD {
            return Err(ChannelError::invalid(
                "period",
                format!("{} is below the minimum of {}", self.period, filter::MIN_PERIOD),
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 0.0 {
            return Err(ChannelError::invalid(
                "multiplier",
                format!("{} must be finite and non-negative", self.multiplier),
            ));
        }
        if self.warm_up == WarmUp::PassThrough(0) {
            return Err(ChannelError::invalid(
                "warm_up",
                "pass-through needs at least one candle".to_string(),
            ));
        }
        Ok(())
    }
}

/// Whether a point had the full recurrence history behind it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataQuality {
    Settled,
    InsufficientData,
}

/// Channel values for one candle, index-aligned with the input series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelPoint {
    pub centerline: f64,
    pub filtered_range: f64,
    pub upper_band: f64,
    pub lower_band: f64,
    pub quality: DataQuality,
}

impl ChannelPoint {
    pub fn new(centerline: f64, filtered_range: f64, multiplier: f64, quality: DataQuality) -> Self {
        Self {
            centerline,
            filtered_range,
            upper_band: centerline + filtered_range * multiplier,
            lower_band: centerline - filtered_range * multiplier,
            quality,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.centerline.is_finite()
            && self.filtered_range.is_finite()
            && self.upper_band.is_finite()
            && self.lower_band.is_finite()
    }

    /// Finite and fully warmed up.
    pub fn is_usable(&self) -> bool {
        self.is_finite() && self.quality == DataQuality::Settled
    }
}

/// Full recompute of the channel over `candles`.
pub fn compute_channel(
    candles: &[Candle],
    config: &ChannelConfig,
) -> Result<Vec<ChannelPoint>, ChannelError> {
    Ok(ChannelBuilder::new(config.clone())?.build(candles))
}
