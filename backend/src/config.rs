use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use crate::channel::ChannelConfig;
use crate::market::Timeframe;
use crate::scheduler::ScanSettings;
use crate::signal::{DedupPolicy, DetectorConfig};

#[derive(Clone, Debug)]
pub struct AppConfig {
    // =========================
    // Inputs and outputs
    // =========================
    /// One symbol per line; blank lines and `#` comments are ignored.
    pub symbols_file: PathBuf,

    /// Directory holding `<SYMBOL>_<tf>.json` OHLCV files.
    pub candle_dir: PathBuf,

    /// Directory for per-timeframe cross state files.
    ///
    /// Deleting a file forces every symbol in that bucket to re-seed on
    /// its next observation.
    pub state_dir: PathBuf,

    /// Directory for the JSONL alert journal.
    pub journal_dir: PathBuf,

    /// Buckets scanned by `scan`, in order. Each keeps its own state file.
    pub timeframes: Vec<Timeframe>,

    // =========================
    // Indicator configuration
    // =========================
    pub channel: ChannelConfig,

    pub detector: DetectorConfig,

    // =========================
    // Run configuration
    // =========================
    /// Candles requested per symbol. Must cover the filter warm-up.
    pub candle_count: usize,

    /// Symbols with fewer candles are skipped for the run.
    pub min_candles: usize,

    /// Wall-clock budget per timeframe run.
    ///
    /// Symbols not reached when the budget runs out are deferred to the
    /// next run rather than processed late.
    pub run_budget: Duration,

    /// Optional freshness filter on the evaluated candle.
    pub max_candle_age: Option<Duration>,

    /// Evaluate the last closed candle instead of the forming one.
    pub evaluate_last_closed: bool,

    /// JSON logs for production, pretty logs otherwise.
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let timeframes = env_or("TIMEFRAMES", "30m".to_string())?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Timeframe>())
            .collect::<Result<Vec<_>, _>>()
            .context("invalid TIMEFRAMES")?;
        if timeframes.is_empty() {
            return Err(anyhow!("TIMEFRAMES must name at least one timeframe"));
        }

        let defaults = ChannelConfig::default();
        let channel = ChannelConfig {
            poles: env_or("GC_POLES", defaults.poles)?,
            period: env_or("GC_PERIOD", defaults.period)?,
            multiplier: env_or("GC_MULTIPLIER", defaults.multiplier)?,
            lag_reduction: env_or("GC_REDUCED_LAG", defaults.lag_reduction)?,
            fast_response: env_or("GC_FAST_RESPONSE", defaults.fast_response)?,
            warm_up: env_or("GC_WARM_UP", defaults.warm_up)?,
        };
        channel.validate().context("invalid channel configuration")?;

        let detector = DetectorConfig {
            policy: env_or("DEDUP_POLICY", DedupPolicy::default())?,
            wick_alerts: env_or("WICK_ALERTS", false)?,
        };

        let max_candle_age = match std::env::var("MAX_CANDLE_AGE_SECS") {
            Ok(raw) if !raw.trim().is_empty() => Some(Duration::from_secs(
                parse_var("MAX_CANDLE_AGE_SECS", &raw)?,
            )),
            _ => None,
        };

        Ok(Self {
            symbols_file: env_or("SYMBOLS_FILE", PathBuf::from("config/coins.txt"))?,
            candle_dir: env_or("CANDLE_DIR", PathBuf::from("data/candles"))?,
            state_dir: env_or("STATE_DIR", PathBuf::from("cache"))?,
            journal_dir: env_or("JOURNAL_DIR", PathBuf::from("logs"))?,
            timeframes,
            channel,
            detector,
            candle_count: env_or("CANDLE_COUNT", 200)?,
            min_candles: env_or("MIN_CANDLES", 150)?,
            run_budget: Duration::from_secs(env_or("RUN_BUDGET_SECS", 900)?),
            max_candle_age,
            evaluate_last_closed: env_or("EVALUATE_LAST_CLOSED", true)?,
            json_logs: std::env::var("APP_ENV").unwrap_or_default() == "production",
        })
    }

    /// State file for one timeframe bucket.
    pub fn state_file(&self, timeframe: Timeframe) -> PathBuf {
        self.state_dir.join(format!("cross_state_{timeframe}.json"))
    }

    pub fn scan_settings(&self, timeframe: Timeframe) -> ScanSettings {
        ScanSettings {
            timeframe,
            candle_count: self.candle_count,
            min_candles: self.min_candles,
            budget: self.run_budget,
            evaluate_last_closed: self.evaluate_last_closed,
            max_candle_age: self.max_candle_age,
        }
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => parse_var(name, &raw),
        _ => Ok(default),
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("invalid {name}={raw:?}: {e}"))
}
