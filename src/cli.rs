use clap::{Parser, Subcommand, ValueEnum};

use crate::model::{EconomyState, RetentionFilter};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn debug(&self) -> bool {
        match &self.command {
            Commands::Market { debug, .. } | Commands::Model { debug, .. } => *debug,
        }
    }
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// writes the cheapest price per item and quality for each realm
    Market {
        #[arg(long, value_enum, default_value_t = MarketSource::Aggregator)]
        source: MarketSource,
        #[arg(long = "realm", default_values_t = [0u32])]
        realms: Vec<u32>,
        /// output base name, `{output}_{realm}.json`
        #[arg(long)]
        output: Option<String>,
        #[arg(long)]
        debug: bool,
    },
    /// extracts production models from the game's script and joins them with retail data
    Model {
        #[arg(long)]
        realm: u32,
        /// output base name, defaults to `{realm}_data`
        #[arg(long)]
        output: Option<String>,
        #[arg(long, env("SIMCO_SESSION_ID"))]
        session_id: Option<String>,
        /// overrides the session lookup: 0/1/2, an English name or an in-game label
        #[arg(long)]
        economy_state: Option<EconomyState>,
        #[arg(long, value_enum, default_value_t = Layout::Single)]
        layout: Layout,
        #[arg(long, default_value_t = RetentionFilter::Standard)]
        filter: RetentionFilter,
        #[arg(long, value_enum, default_value_t = WageSource::Fixed)]
        wages: WageSource,
        #[arg(long)]
        debug: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MarketSource {
    /// previous day's VWAP from SimcoTools
    Aggregator,
    /// live order book from the game, one request per item
    OrderBook,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    /// the resolved economy state only
    Single,
    /// one file per economy state
    PerState,
    /// all economy states in one file keyed by state index
    Combined,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum WageSource {
    /// built-in wage per store category
    Fixed,
    /// average salary times the building's salary modifier, read from the script
    Scraped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_command() {
        let cli = Cli::try_parse_from([
            "simco-scrape",
            "model",
            "--realm",
            "1",
            "--economy-state",
            "景气",
            "--layout",
            "per-state",
            "--filter",
            "strict",
            "--wages",
            "scraped",
        ])
        .unwrap();

        match cli.command {
            Commands::Model {
                realm,
                economy_state,
                layout,
                filter,
                wages,
                ..
            } => {
                assert_eq!(realm, 1);
                assert_eq!(economy_state, Some(EconomyState::Booming));
                assert_eq!(layout, Layout::PerState);
                assert_eq!(filter, RetentionFilter::Strict);
                assert_eq!(wages, WageSource::Scraped);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn market_takes_several_realms() {
        let cli = Cli::try_parse_from([
            "simco-scrape",
            "market",
            "--source",
            "order-book",
            "--realm",
            "0",
            "--realm",
            "1",
            "--debug",
        ])
        .unwrap();

        assert!(cli.debug());
        match cli.command {
            Commands::Market { source, realms, .. } => {
                assert_eq!(source, MarketSource::OrderBook);
                assert_eq!(realms, vec![0, 1]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_filter() {
        assert!(Cli::try_parse_from(["simco-scrape", "model", "--realm", "0", "--filter", "loose"]).is_err());
    }
}
