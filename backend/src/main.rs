mod cli;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;

use bandwatch::{
    channel::ChannelBuilder,
    config::AppConfig,
    market::{
        Timeframe,
        source::{CandleSource, FallbackSource, FileCandleSource},
        symbols::load_symbols,
    },
    notify::{AlertSink, JournalSink, LogSink},
    scheduler::Scanner,
    signal::BandCrossDetector,
    state::{CrossState, CrossStateRepository, JsonFileRepository},
};
use cli::{Cli, Command};
use common::logger::init_logger;

fn open_state(cfg: &AppConfig, timeframe: Timeframe) -> anyhow::Result<Arc<JsonFileRepository>> {
    let path = cfg.state_file(timeframe);
    let repo = JsonFileRepository::open(&path)
        .with_context(|| format!("failed to open cross state {}", path.display()))?;
    Ok(Arc::new(repo))
}

fn selected(cfg: &AppConfig, timeframe: Option<Timeframe>) -> Vec<Timeframe> {
    match timeframe {
        Some(tf) => vec![tf],
        None => cfg.timeframes.clone(),
    }
}

/// One run per configured timeframe, each against its own state file.
///
/// Shutdown is checked between symbols and between timeframes; a symbol
/// that is mid-flight finishes, including delivery of its alert.
async fn scan(cfg: &AppConfig, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
    let symbols = load_symbols(&cfg.symbols_file)?;
    tracing::info!(symbols = symbols.len(), "symbol list loaded");

    let files: Arc<dyn CandleSource> = Arc::new(FileCandleSource::new(&cfg.candle_dir));
    let source: Arc<dyn CandleSource> =
        Arc::new(FallbackSource::new(vec![files], cfg.min_candles));

    for &timeframe in &cfg.timeframes {
        if *shutdown.borrow() {
            tracing::info!(timeframe = %timeframe, "shutdown requested, timeframe skipped");
            continue;
        }

        let repo = open_state(cfg, timeframe)?;
        let detector = BandCrossDetector::new(repo, cfg.detector.clone());
        let channel = ChannelBuilder::new(cfg.channel.clone())?;

        let sinks: Vec<Arc<dyn AlertSink>> = vec![
            Arc::new(LogSink),
            Arc::new(JournalSink::new(&cfg.journal_dir, timeframe)),
        ];

        let mut scanner = Scanner::new(
            source.clone(),
            sinks,
            detector,
            channel,
            cfg.scan_settings(timeframe),
        )
        .with_shutdown(shutdown.clone());

        let summary = scanner.run(&symbols).await;
        println!(
            "{}",
            serde_json::json!({ "timeframe": timeframe, "summary": summary })
        );
    }

    Ok(())
}

fn show_state(cfg: &AppConfig, timeframe: Option<Timeframe>) -> anyhow::Result<()> {
    let mut out: BTreeMap<String, BTreeMap<String, CrossState>> = BTreeMap::new();

    for tf in selected(cfg, timeframe) {
        let records = open_state(cfg, tf)?
            .list()?
            .into_iter()
            .map(|state| (state.symbol.clone(), state))
            .collect();
        out.insert(tf.to_string(), records);
    }

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn reset(
    cfg: &AppConfig,
    symbol: Option<String>,
    all: bool,
    timeframe: Option<Timeframe>,
) -> anyhow::Result<()> {
    for tf in selected(cfg, timeframe) {
        let mut detector = BandCrossDetector::new(open_state(cfg, tf)?, cfg.detector.clone());

        match (&symbol, all) {
            (_, true) => {
                detector.reset_all()?;
                tracing::info!(timeframe = %tf, "all cross state reset");
            }
            (Some(symbol), false) => {
                let symbol = symbol.trim().to_uppercase();
                let removed = detector.reset(&symbol)?;
                tracing::info!(timeframe = %tf, symbol = %symbol, removed, "cross state reset");
            }
            (None, false) => anyhow::bail!("reset needs a symbol or --all"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::from_env().context("invalid configuration")?;
    init_logger("bandwatch", cfg.json_logs);

    match cli.command {
        Command::Scan => {
            let (stop, stopped) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Shutdown signal received, finishing current symbol");
                    stop.send_replace(true);
                }
            });
            scan(&cfg, stopped).await?;
        }
        Command::State { timeframe } => show_state(&cfg, timeframe)?,
        Command::Reset {
            symbol,
            all,
            timeframe,
        } => reset(&cfg, symbol, all, timeframe)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bandwatch::{
        channel::ChannelConfig,
        signal::{Classification, DetectorConfig},
    };

    use super::*;

    fn config(root: &std::path::Path) -> AppConfig {
        AppConfig {
            symbols_file: root.join("coins.txt"),
            candle_dir: root.join("candles"),
            state_dir: root.join("cache"),
            journal_dir: root.join("logs"),
            timeframes: vec![Timeframe::M30, Timeframe::H4],
            channel: ChannelConfig::default(),
            detector: DetectorConfig::default(),
            candle_count: 200,
            min_candles: 150,
            run_budget: Duration::from_secs(900),
            max_candle_age: None,
            evaluate_last_closed: true,
            json_logs: false,
        }
    }

    fn seed(cfg: &AppConfig, tf: Timeframe, symbols: &[&str]) {
        let repo = open_state(cfg, tf).unwrap();
        for symbol in symbols {
            let mut state = CrossState::new(*symbol);
            state.last_classification = Classification::Inside;
            repo.put(symbol, &state).unwrap();
        }
    }

    #[test]
    fn reset_symbol_normalizes_and_touches_only_that_symbol() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path());
        seed(&cfg, Timeframe::M30, &["BTCUSDT", "ETHUSDT"]);

        reset(&cfg, Some(" btcusdt ".to_string()), false, Some(Timeframe::M30)).unwrap();

        let repo = open_state(&cfg, Timeframe::M30).unwrap();
        assert!(repo.get("BTCUSDT").unwrap().is_none());
        assert!(repo.get("ETHUSDT").unwrap().is_some());
    }

    #[test]
    fn reset_all_clears_every_selected_timeframe() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path());
        seed(&cfg, Timeframe::M30, &["BTCUSDT"]);
        seed(&cfg, Timeframe::H4, &["SOLUSDT"]);

        reset(&cfg, None, true, None).unwrap();

        for tf in [Timeframe::M30, Timeframe::H4] {
            assert!(open_state(&cfg, tf).unwrap().list().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn scan_after_shutdown_touches_no_state() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path());
        std::fs::write(&cfg.symbols_file, "BTCUSDT\n").unwrap();

        let (_stop, stopped) = watch::channel(true);
        scan(&cfg, stopped).await.unwrap();

        assert!(open_state(&cfg, Timeframe::M30).unwrap().list().unwrap().is_empty());
    }
}
