use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::types::{ModelEntry, ProductionModel, StateModels};
use super::wages::{AdjustmentTable, WageTable};
use crate::config::SentinelConfig;
use crate::constants::{MIN_RETAINED_PRICE, PROFIT_PER_BUILDING_LEVEL, RETAIL_MODELING_QUALITY_WEIGHT};
use crate::error::{Error, Result};
use crate::sources::simcompanies::MarketData;
use crate::sources::MarketInfo;

/// Which merged entries make it into the dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetentionFilter {
    /// Keep everything.
    None,
    /// Price at least 0.1 and non-zero saturation.
    #[default]
    Standard,
    /// `Standard`, and the model carries a store wage.
    Strict,
}

impl RetentionFilter {
    pub fn retains(&self, item: &MergedItem) -> bool {
        let priced = item.average_price >= MIN_RETAINED_PRICE && item.market_saturation != 0.0;
        match self {
            RetentionFilter::None => true,
            RetentionFilter::Standard => priced,
            RetentionFilter::Strict => priced && item.model.modeled_store_wages.is_some(),
        }
    }
}

impl fmt::Display for RetentionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RetentionFilter::None => "none",
            RetentionFilter::Standard => "standard",
            RetentionFilter::Strict => "strict",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RetentionFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(RetentionFilter::None),
            "standard" => Ok(RetentionFilter::Standard),
            "strict" => Ok(RetentionFilter::Strict),
            other => Err(Error::Config(format!("Unknown retention filter: {:?}", other))),
        }
    }
}

/// One item (or one quality of an item) with market data, wage and adjustment attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedItem {
    #[serde(rename = "averagePrice")]
    pub average_price: f64,
    #[serde(rename = "marketSaturation")]
    pub market_saturation: f64,
    pub building_wages: f64,
    pub retail_adjustment: Option<Value>,
    #[serde(flatten)]
    pub model: ProductionModel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DatasetEntry {
    Item(MergedItem),
    PerQuality(BTreeMap<u8, MergedItem>),
}

/// Merged items of one economy state, plus the two global scalars.
///
/// Serializes as a single flat object: item ids and the scalar keys side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDataset {
    pub items: BTreeMap<u32, DatasetEntry>,
    pub profit_per_building_level: String,
    pub retail_modeling_quality_weight: String,
}

impl Serialize for ExtractedDataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.items.len() + 2))?;
        for (id, entry) in &self.items {
            map.serialize_entry(&id.to_string(), entry)?;
        }
        map.serialize_entry(PROFIT_PER_BUILDING_LEVEL, &self.profit_per_building_level)?;
        map.serialize_entry(
            RETAIL_MODELING_QUALITY_WEIGHT,
            &self.retail_modeling_quality_weight,
        )?;
        map.end()
    }
}

/// Joins one state's models with market data, wages and adjustments.
pub struct DatasetMerger<'a> {
    pub market: &'a MarketData,
    pub wages: &'a WageTable,
    pub adjustments: &'a AdjustmentTable,
    pub filter: RetentionFilter,
}

impl<'a> DatasetMerger<'a> {
    fn merge_one(&self, item_id: u32, info: Option<MarketInfo>, model: &ProductionModel) -> MergedItem {
        let info = info.unwrap_or_default();
        MergedItem {
            average_price: info.average_price,
            market_saturation: info.market_saturation,
            building_wages: self.wages.get(&item_id).copied().unwrap_or(0.0),
            retail_adjustment: self.adjustments.get(&item_id).cloned(),
            model: model.clone(),
        }
    }

    pub fn merge(
        &self,
        models: &StateModels,
        profit_per_building_level: &str,
        retail_modeling_quality_weight: &str,
    ) -> ExtractedDataset {
        let mut items = BTreeMap::new();

        for (&item_id, entry) in models {
            match entry {
                ModelEntry::Single(model) => {
                    let merged = self.merge_one(item_id, self.market.item(item_id), model);
                    if self.filter.retains(&merged) {
                        items.insert(item_id, DatasetEntry::Item(merged));
                    } else {
                        debug!("Item {} filtered out", item_id);
                    }
                }
                ModelEntry::PerQuality(per_quality) => {
                    let kept: BTreeMap<u8, MergedItem> = per_quality
                        .iter()
                        .map(|(&q, model)| {
                            (q, self.merge_one(item_id, self.market.quality(item_id, q), model))
                        })
                        .filter(|(_, merged)| self.filter.retains(merged))
                        .collect();
                    if kept.is_empty() {
                        debug!("Item {} filtered out at every quality", item_id);
                    } else {
                        items.insert(item_id, DatasetEntry::PerQuality(kept));
                    }
                }
            }
        }

        info!(
            "Merged {} of {} modeled items ({} filter)",
            items.len(),
            models.len(),
            self.filter
        );

        ExtractedDataset {
            items,
            profit_per_building_level: profit_per_building_level.to_string(),
            retail_modeling_quality_weight: retail_modeling_quality_weight.to_string(),
        }
    }
}

/// Fails when the sentinel item's retail price says today's data is not out yet.
pub fn ensure_market_ready(market: &MarketData, sentinel: Option<&SentinelConfig>) -> Result<()> {
    let Some(sentinel) = sentinel else {
        return Ok(());
    };
    match market.item(sentinel.item_id) {
        Some(info) if info.average_price >= sentinel.min_price => Ok(()),
        Some(info) => {
            warn!(
                "Sentinel item {} priced at {}, retail data not ready",
                sentinel.item_id, info.average_price
            );
            Err(Error::DataNotReady(format!(
                "item {} average price {} is below {}",
                sentinel.item_id, info.average_price, sentinel.min_price
            )))
        }
        None => Err(Error::DataNotReady(format!(
            "item {} missing from retail info",
            sentinel.item_id
        ))),
    }
}
