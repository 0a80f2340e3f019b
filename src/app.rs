use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::cli::{Commands, Layout, MarketSource, WageSource};
use crate::config::Config;
use crate::constants::EXCLUDED_BUILDING_CATEGORY;
use crate::error::{Error, Result};
use crate::extract::{extract_constants, ScriptConstants};
use crate::market::{BatchFetcher, PriceBook};
use crate::model::{
    ensure_market_ready, fixed_wages, item_adjustments, scraped_wages, AdjustmentTable,
    DatasetMerger, EconomyState, ExtractedDataset, RetentionFilter,
};
use crate::output::write_json;
use crate::sources::simcompanies::{MarketData, SimCompaniesClient};
use crate::sources::simcotools::SimcoToolsClient;

pub struct ModelOptions {
    pub realm: u32,
    pub output: Option<String>,
    pub session_id: Option<String>,
    pub economy_state: Option<EconomyState>,
    pub layout: Layout,
    pub filter: RetentionFilter,
    pub wages: WageSource,
}

pub async fn run(command: Commands, config: Config) -> Result<()> {
    info!("Started");
    info!("================================");

    match command {
        Commands::Market {
            source,
            realms,
            output,
            ..
        } => run_market(&config, source, &realms, output.as_deref()).await,
        Commands::Model {
            realm,
            output,
            session_id,
            economy_state,
            layout,
            filter,
            wages,
            ..
        } => {
            let options = ModelOptions {
                realm,
                output,
                session_id,
                economy_state,
                layout,
                filter,
                wages,
            };
            run_model(&config, options).await
        }
    }
}

// ============================================================================
// Market snapshot
// ============================================================================

pub fn market_path(output: Option<&str>, realm: u32) -> PathBuf {
    match output {
        Some(base) => PathBuf::from(format!("{}_{}.json", base, realm)),
        None => PathBuf::from(format!("{}_market_data.json", realm)),
    }
}

/// Snapshots every realm. A failing realm is logged and skipped; the run still fails
/// once all realms have been tried.
pub async fn run_market(
    config: &Config,
    source: MarketSource,
    realms: &[u32],
    output: Option<&str>,
) -> Result<()> {
    info!("Market snapshot from {:?} for realms {:?}", source, realms);

    let failed =
        snapshot_realms(realms, |realm| snapshot_realm(config, source, realm, output)).await;
    if failed.is_empty() {
        Ok(())
    } else {
        Err(Error::Other(format!("market snapshot failed for realms {:?}", failed)))
    }
}

/// Runs `snapshot` for each realm in order and returns the realms that failed.
pub async fn snapshot_realms<F, Fut>(realms: &[u32], mut snapshot: F) -> Vec<u32>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PathBuf>>,
{
    let mut failed = Vec::new();
    for &realm in realms {
        if let Err(e) = snapshot(realm).await {
            error!("Realm {}: market snapshot failed: {}", realm, e);
            failed.push(realm);
        }
    }
    failed
}

async fn snapshot_realm(
    config: &Config,
    source: MarketSource,
    realm: u32,
    output: Option<&str>,
) -> Result<PathBuf> {
    let book = match source {
        MarketSource::Aggregator => {
            let tools = SimcoToolsClient::new(config.tools.clone());
            let vwaps = tools.fetch_vwaps(realm).await?;
            let mut book = PriceBook::default();
            book.observe_vwaps(&vwaps);
            book
        }
        MarketSource::OrderBook => {
            let game = SimCompaniesClient::new(config.game.clone())?;
            BatchFetcher::new(&game, config.fetch.clone())
                .fetch_all(realm, &config.item_ids)
                .await?
        }
    };

    let records = book.records(&config.item_ids);
    info!("Realm {}: {} records after allow-list", realm, records.len());
    write_json(market_path(output, realm), &records)
}

// ============================================================================
// Production models
// ============================================================================

/// Resolution order: explicit label, then the session's company, else an error.
pub async fn resolve_economy_state(
    client: &SimCompaniesClient,
    override_state: Option<EconomyState>,
    session_id: Option<&str>,
) -> Result<EconomyState> {
    if let Some(state) = override_state {
        info!("Economy state {} given on the command line", state);
        return Ok(state);
    }
    match session_id {
        Some(session_id) => client.fetch_economy_state(session_id).await,
        None => Err(Error::Config(
            "economy state unknown: pass --economy-state or a session id".into(),
        )),
    }
}

/// Merges every economy state in the script with the realm's retail data.
pub fn assemble_datasets(
    constants: &ScriptConstants,
    market: &MarketData,
    config: &Config,
    wage_source: WageSource,
    filter: RetentionFilter,
) -> Result<BTreeMap<EconomyState, ExtractedDataset>> {
    let wages = match wage_source {
        WageSource::Fixed => fixed_wages(&config.wage_categories),
        WageSource::Scraped => {
            scraped_wages(&constants.wage_inputs()?, &[EXCLUDED_BUILDING_CATEGORY.to_string()])
        }
    };

    let adjustments = match &constants.sales {
        Some(sales) => item_adjustments(sales, &constants.retail_adjustments),
        None => {
            warn!("No sales table, retail adjustments will be null");
            AdjustmentTable::new()
        }
    };

    let merger = DatasetMerger {
        market,
        wages: &wages,
        adjustments: &adjustments,
        filter,
    };

    Ok(constants
        .models
        .iter()
        .map(|(state, models)| {
            let dataset = merger.merge(
                models,
                &constants.profit_per_building_level,
                &constants.retail_modeling_quality_weight,
            );
            (*state, dataset)
        })
        .collect())
}

pub fn model_base(output: Option<&str>, realm: u32) -> String {
    output
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}_data", realm))
}

/// Writes the datasets in the requested layout and returns the written paths.
pub fn write_datasets(
    datasets: &BTreeMap<EconomyState, ExtractedDataset>,
    layout: Layout,
    state: Option<EconomyState>,
    base: &str,
) -> Result<Vec<PathBuf>> {
    match layout {
        Layout::Single => {
            let state = state.ok_or_else(|| Error::Config("single layout needs an economy state".into()))?;
            let dataset = datasets.get(&state).ok_or_else(|| {
                Error::PatternNotFound(format!("production models for {} economy", state))
            })?;
            Ok(vec![write_json(format!("{}.json", base), dataset)?])
        }
        Layout::PerState => datasets
            .iter()
            .map(|(state, dataset)| write_json(format!("{}_{}.json", base, state), dataset))
            .collect(),
        Layout::Combined => {
            let by_index: BTreeMap<u8, &ExtractedDataset> =
                datasets.iter().map(|(s, d)| (s.index(), d)).collect();
            Ok(vec![write_json(format!("{}.json", base), &by_index)?])
        }
    }
}

pub async fn run_model(config: &Config, options: ModelOptions) -> Result<()> {
    let client = SimCompaniesClient::new(config.game.clone())?;

    let retail = client.fetch_retail_info(options.realm).await?;
    let market = MarketData::from_retail_info(&retail);
    ensure_market_ready(&market, config.sentinel.as_ref())?;

    let state = match options.layout {
        Layout::Single => Some(
            resolve_economy_state(&client, options.economy_state, options.session_id.as_deref())
                .await?,
        ),
        Layout::PerState | Layout::Combined => options.economy_state,
    };

    let script = client.fetch_script().await?;
    let constants = extract_constants(&script)?;

    let datasets = assemble_datasets(&constants, &market, config, options.wages, options.filter)?;
    let base = model_base(options.output.as_deref(), options.realm);
    let written = write_datasets(&datasets, options.layout, state, &base)?;

    info!("Done, wrote {} file(s)", written.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names() {
        assert_eq!(market_path(None, 0), PathBuf::from("0_market_data.json"));
        assert_eq!(market_path(Some("out/prices"), 1), PathBuf::from("out/prices_1.json"));
        assert_eq!(model_base(None, 1), "1_data");
        assert_eq!(model_base(Some("models"), 1), "models");
    }

    #[tokio::test]
    async fn failing_realm_does_not_stop_the_others() {
        let mut attempted = Vec::new();
        let failed = snapshot_realms(&[0, 1, 2], |realm| {
            attempted.push(realm);
            async move {
                if realm == 0 {
                    Err(Error::Status {
                        status: 502,
                        url: "vwaps".into(),
                    })
                } else {
                    Ok(market_path(None, realm))
                }
            }
        })
        .await;

        assert_eq!(attempted, vec![0, 1, 2]);
        assert_eq!(failed, vec![0]);
    }

    #[tokio::test]
    async fn all_realms_succeeding_reports_nothing() {
        let failed = snapshot_realms(&[0, 1], |realm| async move { Ok(market_path(None, realm)) }).await;
        assert!(failed.is_empty());
    }
}
