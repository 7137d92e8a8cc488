use super::{Band, Classification};
use crate::channel::ChannelPoint;
use crate::market::Candle;

/// Body-based position of the candle against the bands.
pub fn classify(candle: &Candle, point: &ChannelPoint) -> Classification {
    if candle.body_low() > point.upper_band {
        Classification::AboveUpper
    } else if candle.body_high() < point.lower_band {
        Classification::BelowLower
    } else {
        Classification::Inside
    }
}

/// Which bands the candle's wicks poke through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WickTouch {
    pub upper: bool,
    pub lower: bool,
}

impl WickTouch {
    pub fn of(candle: &Candle, point: &ChannelPoint) -> Self {
        Self {
            upper: candle.high > point.upper_band,
            lower: candle.low < point.lower_band,
        }
    }

    pub fn touches(&self, band: Band) -> bool {
        match band {
            Band::Upper => self.upper,
            Band::Lower => self.lower,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::DataQuality;

    fn point() -> ChannelPoint {
        ChannelPoint::new(100.0, 5.0, 1.0, DataQuality::Settled)
    }

    #[test]
    fn body_must_clear_band_entirely() {
        let p = point();
        // body 104..106 straddles the upper band at 105
        assert_eq!(classify(&Candle::new(0, 104.0, 107.0, 103.0, 106.0), &p), Classification::Inside);
        assert_eq!(classify(&Candle::new(0, 105.5, 107.0, 105.2, 106.0), &p), Classification::AboveUpper);
        assert_eq!(classify(&Candle::new(0, 94.0, 94.5, 92.0, 93.0), &p), Classification::BelowLower);
    }

    #[test]
    fn touching_the_band_is_still_inside() {
        let p = point();
        assert_eq!(classify(&Candle::new(0, 105.0, 106.0, 104.0, 105.0), &p), Classification::Inside);
    }

    #[test]
    fn wick_touch_ignores_body() {
        let p = point();
        let t = WickTouch::of(&Candle::new(0, 100.0, 105.5, 94.0, 101.0), &p);
        assert!(t.touches(Band::Upper));
        assert!(t.touches(Band::Lower));
        assert_eq!(
            WickTouch::of(&Candle::new(0, 100.0, 101.0, 99.0, 100.5), &p),
            WickTouch::default()
        );
    }
}
