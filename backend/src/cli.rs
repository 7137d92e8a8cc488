use clap::{Parser, Subcommand};

use bandwatch::market::Timeframe;

#[derive(Debug, Parser)]
#[clap(name = "bandwatch", version)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one scan over every configured timeframe
    Scan,

    /// Print stored cross state as JSON
    State {
        /// Limit to one timeframe bucket (default: all configured)
        #[clap(long)]
        timeframe: Option<Timeframe>,
    },

    /// Drop stored cross state so symbols re-seed on their next candle
    Reset {
        /// Symbol to reset
        #[clap(required_unless_present = "all")]
        symbol: Option<String>,

        /// Reset every symbol
        #[clap(long, conflicts_with = "symbol")]
        all: bool,

        /// Limit to one timeframe bucket (default: all configured)
        #[clap(long)]
        timeframe: Option<Timeframe>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reset_forms() {
        let cli = Cli::try_parse_from(["bandwatch", "reset", "btcusdt", "--timeframe", "4h"]).unwrap();
        match cli.command {
            Command::Reset {
                symbol,
                all,
                timeframe,
            } => {
                assert_eq!(symbol.as_deref(), Some("btcusdt"));
                assert!(!all);
                assert_eq!(timeframe, Some(Timeframe::H4));
            }
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Cli::try_parse_from(["bandwatch", "reset", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["bandwatch", "reset"]).is_err());
        assert!(Cli::try_parse_from(["bandwatch", "reset", "X", "--all"]).is_err());
    }

    #[test]
    fn rejects_unknown_timeframe() {
        assert!(Cli::try_parse_from(["bandwatch", "state", "--timeframe", "7m"]).is_err());
    }
}
