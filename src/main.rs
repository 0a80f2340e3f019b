use clap::Parser;

use simco_scrape::app::run;
use simco_scrape::cli::Cli;
use simco_scrape::config::Config;
use simco_scrape::error::Result;
use simco_scrape::logging::init;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init(cli.debug());

    let config = Config::from_env()?;

    run(cli.command, config).await
}
