use tracing::{debug, instrument};

use super::filter::{FilterOutput, RecursiveChannelFilter};
use super::{ChannelConfig, ChannelPoint, DataQuality};
use crate::error::ChannelError;
use crate::market::Candle;

/// True range per candle; the first candle has no previous close.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let range = c.high - c.low;
            match i.checked_sub(1).map(|p| candles[p].close) {
                Some(prev_close) => range
                    .max((c.high - prev_close).abs())
                    .max((c.low - prev_close).abs()),
                None => range,
            }
        })
        .collect()
}

/// z[i] + (z[i] − z[i−lag]) for i ≥ lag; earlier values pass through.
pub fn reduce_lag(series: &[f64], lag: usize) -> Vec<f64> {
    series
        .iter()
        .enumerate()
        .map(|(i, &z)| if i >= lag { z + (z - series[i - lag]) } else { z })
        .collect()
}

/// floor((period − 1) / (2·poles))
pub fn lag_for(poles: u8, period: u32) -> usize {
    (period.saturating_sub(1) / (2 * u32::from(poles))) as usize
}

/// Builds channel points from a candle slice. Stateless; holds only the
/// validated configuration and the filters derived from it.
pub struct ChannelBuilder {
    config: ChannelConfig,
    primary: RecursiveChannelFilter,
    fast: Option<RecursiveChannelFilter>,
}

impl ChannelBuilder {
    pub fn new(config: ChannelConfig) -> Result<Self, ChannelError> {
        config.validate()?;
        let primary =
            RecursiveChannelFilter::new(config.poles, config.period)?.with_warm_up(config.warm_up);

        // The 1-pole companion shares the N-pole smoothing factor.
        let fast = if config.fast_response {
            Some(RecursiveChannelFilter::with_alpha(1, primary.alpha())?.with_warm_up(config.warm_up))
        } else {
            None
        };

        Ok(Self {
            config,
            primary,
            fast,
        })
    }

    #[instrument(skip_all, fields(candles = candles.len(), poles = self.config.poles))]
    pub fn build(&self, candles: &[Candle]) -> Vec<ChannelPoint> {
        let mut source: Vec<f64> = candles.iter().map(Candle::typical_price).collect();
        let mut range = true_range(candles);

        if self.config.lag_reduction {
            let lag = lag_for(self.config.poles, self.config.period);
            source = reduce_lag(&source, lag);
            range = reduce_lag(&range, lag);
            debug!(lag, "applied lag reduction");
        }

        let centerline = self.smooth(&source);
        let filtered_range = self.smooth(&range);

        centerline
            .values
            .iter()
            .zip(&filtered_range.values)
            .enumerate()
            .map(|(i, (&center, &tr))| {
                let quality = if centerline.is_provisional(i) || filtered_range.is_provisional(i) {
                    DataQuality::InsufficientData
                } else {
                    DataQuality::Settled
                };
                ChannelPoint::new(center, tr, self.config.multiplier, quality)
            })
            .collect()
    }

    fn smooth(&self, series: &[f64]) -> FilterOutput {
        let slow = self.primary.apply(series);
        let Some(fast) = &self.fast else {
            return slow;
        };

        let quick = fast.apply(series);
        FilterOutput {
            values: slow
                .values
                .iter()
                .zip(&quick.values)
                .map(|(s, q)| (s + q) / 2.0)
                .collect(),
            provisional: slow.provisional.max(quick.provisional),
        }
    }
}
