use std::f64::consts::PI;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

pub const MIN_POLES: u8 = 1;
pub const MAX_POLES: u8 = 9;
pub const MIN_PERIOD: u32 = 2;

/// Copied leading outputs when `pass-through` is given without a count.
pub const DEFAULT_PASS_THROUGH: usize = 10;

/// Root-two constant exactly as the charting indicator spells it.
const ROOT_TWO: f64 = 1.414;

/// Smoothing factor for a `poles`-pole filter at sampling `period`.
///
/// beta = (1 - cos(2π / period)) / (1.414^(2 / poles) - 1)
/// alpha = -beta + sqrt(beta² + 2·beta)
pub fn smoothing_alpha(poles: u8, period: u32) -> f64 {
    let beta = (1.0 - (2.0 * PI / period as f64).cos())
        / (ROOT_TWO.powf(2.0 / poles as f64) - 1.0);
    -beta + (beta * beta + 2.0 * beta).sqrt()
}

fn binomial(n: u8, k: u8) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * f64::from(n - i) / f64::from(i + 1))
}

/// How outputs are produced before the recurrence has `poles` predecessors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarmUp {
    /// Terms reaching before the start of the input are omitted, which is
    /// the same as zero initial conditions.
    #[default]
    SkipMissing,
    /// The first `n` outputs are copies of the input; the recurrence
    /// starts from them.
    PassThrough(usize),
}

impl WarmUp {
    fn copied(&self) -> usize {
        match self {
            WarmUp::SkipMissing => 0,
            WarmUp::PassThrough(n) => *n,
        }
    }
}

impl FromStr for WarmUp {
    type Err = String;

    /// `skip-missing`, `pass-through` or `pass-through:<n>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.split_once(':') {
            None if s == "skip-missing" || s == "skip" => Ok(Self::SkipMissing),
            None if s == "pass-through" => Ok(Self::PassThrough(DEFAULT_PASS_THROUGH)),
            Some(("pass-through", n)) => n
                .trim()
                .parse()
                .map(Self::PassThrough)
                .map_err(|e| format!("bad pass-through count `{n}`: {e}")),
            _ => Err(format!("unknown warm-up `{s}`")),
        }
    }
}

/// Output of one filter pass.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterOutput {
    pub values: Vec<f64>,
    /// Leading indices that are copies or were computed with fewer than
    /// `poles` predecessors.
    pub provisional: usize,
}

impl FilterOutput {
    pub fn is_provisional(&self, index: usize) -> bool {
        index < self.provisional
    }
}

/// Last `poles` outputs, newest first. Missing history reads as absent.
struct FilterState {
    history: [f64; MAX_POLES as usize],
    len: usize,
}

impl FilterState {
    fn new() -> Self {
        Self {
            history: [0.0; MAX_POLES as usize],
            len: 0,
        }
    }

    /// Output `k` steps back (1-based), if it exists.
    fn lagged(&self, k: usize) -> Option<f64> {
        (k <= self.len).then(|| self.history[k - 1])
    }

    fn push(&mut self, y: f64) {
        self.history.copy_within(0..MAX_POLES as usize - 1, 1);
        self.history[0] = y;
        self.len = (self.len + 1).min(MAX_POLES as usize);
    }
}

/// N-pole recursive low-pass filter:
///
/// y[i] = α^p·x[i] + Σ_{k=1..p} (−1)^(k+1)·C(p,k)·(1−α)^k·y[i−k]
///
/// Early outputs follow the configured `WarmUp`. Every call recomputes the
/// whole input; nothing carries over between calls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecursiveChannelFilter {
    poles: u8,
    alpha: f64,
    gain: f64,
    feedback: [f64; MAX_POLES as usize],
    warm_up: WarmUp,
}

impl RecursiveChannelFilter {
    pub fn new(poles: u8, period: u32) -> Result<Self, ChannelError> {
        validate_poles(poles)?;
        if period < MIN_PERIOD {
            return Err(ChannelError::invalid(
                "period",
                format!("{period} is below the minimum of {MIN_PERIOD}"),
            ));
        }
        Self::with_alpha(poles, smoothing_alpha(poles, period))
    }

    /// Builds a filter around an externally derived alpha, e.g. the 1-pole
    /// companion that shares the N-pole filter's smoothing factor.
    pub fn with_alpha(poles: u8, alpha: f64) -> Result<Self, ChannelError> {
        validate_poles(poles)?;
        if !alpha.is_finite() || alpha <= 0.0 || alpha > 1.0 {
            return Err(ChannelError::invalid(
                "alpha",
                format!("{alpha} is outside (0, 1]"),
            ));
        }

        let decay = 1.0 - alpha;
        let mut feedback = [0.0; MAX_POLES as usize];
        for k in 1..=poles {
            let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
            feedback[k as usize - 1] = sign * binomial(poles, k) * decay.powi(i32::from(k));
        }

        Ok(Self {
            poles,
            alpha,
            gain: alpha.powi(i32::from(poles)),
            feedback,
            warm_up: WarmUp::SkipMissing,
        })
    }

    pub fn with_warm_up(mut self, warm_up: WarmUp) -> Self {
        self.warm_up = warm_up;
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn apply(&self, input: &[f64]) -> FilterOutput {
        let copied = self.warm_up.copied();
        let mut state = FilterState::new();
        let mut values = Vec::with_capacity(input.len());

        for (i, &x) in input.iter().enumerate() {
            let y = if i < copied { x } else { self.step(&state, x) };
            state.push(y);
            values.push(y);
        }

        FilterOutput {
            provisional: input.len().min(copied.max(self.poles as usize)),
            values,
        }
    }

    fn step(&self, state: &FilterState, x: f64) -> f64 {
        let mut y = self.gain * x;
        for k in 1..=self.poles as usize {
            match state.lagged(k) {
                Some(prev) => y += self.feedback[k - 1] * prev,
                None => break,
            }
        }
        y
    }
}

fn validate_poles(poles: u8) -> Result<(), ChannelError> {
    if !(MIN_POLES..=MAX_POLES).contains(&poles) {
        return Err(ChannelError::invalid(
            "poles",
            format!("{poles} is outside [{MIN_POLES}, {MAX_POLES}]"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 * 0.37).sin() * 3.0 + i as f64 * 0.1).collect()
    }

    #[test]
    fn binomial_rows_match_pascal() {
        let row: Vec<f64> = (0..=9).map(|k| binomial(9, k)).collect();
        assert_eq!(row, vec![1.0, 9.0, 36.0, 84.0, 126.0, 126.0, 84.0, 36.0, 9.0, 1.0]);
        assert_eq!(binomial(4, 2), 6.0);
    }

    #[test]
    fn alpha_matches_indicator_defaults() {
        let alpha = smoothing_alpha(4, 144);
        assert!((alpha - 0.095_420_281_889).abs() < 1e-9, "alpha = {alpha}");
    }

    #[test]
    fn single_pole_is_exponential_smoothing() {
        let input = ramp(64);
        let filter = RecursiveChannelFilter::new(1, 20).unwrap();
        let alpha = filter.alpha();

        let mut expected = Vec::with_capacity(input.len());
        let mut prev: Option<f64> = None;
        for &x in &input {
            let y = match prev {
                Some(p) => alpha * x + (1.0 - alpha) * p,
                None => alpha * x,
            };
            expected.push(y);
            prev = Some(y);
        }

        assert_eq!(filter.apply(&input).values, expected);
    }

    #[test]
    fn four_pole_matches_direct_recurrence() {
        let input = ramp(40);
        let filter = RecursiveChannelFilter::new(4, 30).unwrap();
        let a = filter.alpha();
        let x1 = 1.0 - a;

        let mut y: Vec<f64> = Vec::new();
        for (i, &x) in input.iter().enumerate() {
            let at = |k: usize| if i >= k { y[i - k] } else { 0.0 };
            let v = a.powi(4) * x + 4.0 * x1 * at(1) - 6.0 * x1.powi(2) * at(2)
                + 4.0 * x1.powi(3) * at(3)
                - x1.powi(4) * at(4);
            y.push(v);
        }

        let got = filter.apply(&input).values;
        for (g, e) in got.iter().zip(&y) {
            assert!((g - e).abs() < 1e-9, "{g} vs {e}");
        }
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let input = ramp(300);
        let filter = RecursiveChannelFilter::new(9, 144).unwrap();
        assert_eq!(filter.apply(&input), filter.apply(&input));
    }

    #[test]
    fn constant_input_converges_to_level() {
        let filter = RecursiveChannelFilter::new(3, 10).unwrap();
        let out = filter.apply(&[50.0; 400]);
        assert!((out.values[399] - 50.0).abs() < 1e-6);
    }

    #[test]
    fn leading_indices_are_provisional() {
        let filter = RecursiveChannelFilter::new(4, 144).unwrap();
        let out = filter.apply(&ramp(10));
        assert_eq!(out.provisional, 4);
        assert!(out.is_provisional(3));
        assert!(!out.is_provisional(4));

        let short = filter.apply(&ramp(2));
        assert_eq!(short.provisional, 2);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let out = RecursiveChannelFilter::new(2, 5).unwrap().apply(&[]);
        assert!(out.values.is_empty());
        assert_eq!(out.provisional, 0);
    }

    #[test]
    fn pass_through_copies_then_recurses_from_copies() {
        let input = ramp(30);
        let filter = RecursiveChannelFilter::new(2, 20)
            .unwrap()
            .with_warm_up(WarmUp::PassThrough(10));
        let a = filter.alpha();
        let x1 = 1.0 - a;

        let out = filter.apply(&input);
        assert_eq!(out.values[..10], input[..10]);
        assert_eq!(out.provisional, 10);

        let expected = a * a * input[10] + 2.0 * x1 * input[9] - x1 * x1 * input[8];
        assert!((out.values[10] - expected).abs() < 1e-12);
    }

    #[test]
    fn short_pass_through_still_waits_for_poles() {
        let filter = RecursiveChannelFilter::new(4, 30)
            .unwrap()
            .with_warm_up(WarmUp::PassThrough(2));
        assert_eq!(filter.apply(&ramp(12)).provisional, 4);
    }

    #[test]
    fn warm_up_parses_from_config_strings() {
        assert_eq!("skip-missing".parse::<WarmUp>(), Ok(WarmUp::SkipMissing));
        assert_eq!("Pass-Through".parse::<WarmUp>(), Ok(WarmUp::PassThrough(10)));
        assert_eq!("pass-through:25".parse::<WarmUp>(), Ok(WarmUp::PassThrough(25)));
        assert!("pass-through:x".parse::<WarmUp>().is_err());
        assert!("zero".parse::<WarmUp>().is_err());
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        for poles in [0u8, 10, 11] {
            assert!(matches!(
                RecursiveChannelFilter::new(poles, 144),
                Err(ChannelError::InvalidParameter { name: "poles", .. })
            ));
        }
        assert!(matches!(
            RecursiveChannelFilter::new(4, 1),
            Err(ChannelError::InvalidParameter { name: "period", .. })
        ));
        assert!(RecursiveChannelFilter::new(9, 2).is_ok());
    }
}
