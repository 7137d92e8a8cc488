use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Band, Classification, Method, WickTouch};
use crate::state::CrossState;

/// Alert deduplication policy, selected once per detector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupPolicy {
    /// Body alerts strictly alternate between bands. An excursion that
    /// returns inside and re-exits through the same band stays silent.
    #[default]
    Alternation,
    /// Every entry into a band excursion from a different classification fires.
    ExitReentry,
}

impl FromStr for DedupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alternation" => Ok(Self::Alternation),
            "exit-reentry" | "exit_reentry" => Ok(Self::ExitReentry),
            other => Err(format!("unknown dedup policy `{other}`")),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub policy: DedupPolicy,
    /// Allow wick-only band touches to fire. They always follow alternation
    /// and count as the band's turn: with wicks on, the strict alternation
    /// holds across body and wick alerts together, so two body alerts on
    /// the same band can be separated by an opposite wick alert.
    pub wick_alerts: bool,
}

/// Decides whether the transition `state.last_classification -> current`
/// fires, and on which band. Never mutates.
pub(crate) fn decide(
    config: &DetectorConfig,
    state: &CrossState,
    current: Classification,
    wick: WickTouch,
) -> Option<(Band, Method)> {
    let previous = state.last_classification;
    if previous == Classification::None {
        return None;
    }

    let last_fired = state.last_fired_band();

    let body_band = match current {
        Classification::AboveUpper => Some(Band::Upper),
        Classification::BelowLower => Some(Band::Lower),
        Classification::Inside | Classification::None => None,
    };

    if let Some(band) = body_band {
        let entered = previous != band.beyond();
        let eligible = match config.policy {
            DedupPolicy::Alternation => entered && last_fired != Some(band),
            DedupPolicy::ExitReentry => entered,
        };
        return eligible.then_some((band, Method::Body));
    }

    if !config.wick_alerts {
        return None;
    }

    let mut eligible = [Band::Upper, Band::Lower]
        .into_iter()
        .filter(|&band| wick.touches(band) && previous != band.beyond() && last_fired != Some(band));

    // Both wicks through: no single direction to report.
    match (eligible.next(), eligible.next()) {
        (Some(band), None) => Some((band, Method::Wick)),
        _ => None,
    }
}
