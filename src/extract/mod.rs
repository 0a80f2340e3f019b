//! Constant-table extraction from the game's front-end bundle.
//!
//! Three stages, each with its own failure result:
//! [`locate`] finds raw fragments, [`repair`] rewrites them as JSON and
//! [`interpret`] turns them into typed tables.

pub mod interpret;
pub mod locate;
pub mod repair;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::constants::*;
use crate::error::{Error, Result};
use crate::model::ProductionModelTable;

pub use interpret::{BuildingMeta, SalesEntry, SalesTable};

/// Everything the model pipeline needs from the bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptConstants {
    pub profit_per_building_level: String,
    pub retail_modeling_quality_weight: String,
    pub average_salary: Option<Decimal>,
    pub sales: Option<SalesTable>,
    pub buildings: BTreeMap<String, BuildingMeta>,
    pub retail_adjustments: BTreeMap<String, Value>,
    pub models: ProductionModelTable,
}

/// Inputs for scraped wages, all present.
#[derive(Debug, Clone, Copy)]
pub struct WageInputs<'a> {
    pub average_salary: Decimal,
    pub sales: &'a SalesTable,
    pub buildings: &'a BTreeMap<String, BuildingMeta>,
}

impl ScriptConstants {
    /// Fails when any table needed to derive wages from the bundle is missing.
    pub fn wage_inputs(&self) -> Result<WageInputs<'_>> {
        let average_salary = self
            .average_salary
            .ok_or_else(|| Error::PatternNotFound(AVERAGE_SALARY.into()))?;
        let sales = self
            .sales
            .as_ref()
            .ok_or_else(|| Error::PatternNotFound(SALES_BY_BUILDING.into()))?;
        if self.buildings.is_empty() {
            return Err(Error::PatternNotFound("building salary modifiers".into()));
        }
        Ok(WageInputs {
            average_salary,
            sales,
            buildings: &self.buildings,
        })
    }
}

/// Decimal scalar bound to `key`, as the literal text found in the bundle.
fn decimal_scalar(script: &str, key: &str) -> Result<String> {
    let raw = locate::scalar(script, key)?;
    interpret::decimal(key, &raw)?;
    Ok(raw)
}

/// Runs an optional table through its stages; a failure at any stage reads as absent.
fn optional<T>(what: &str, stage: impl FnOnce() -> Result<T>) -> Option<T> {
    match stage() {
        Ok(value) => Some(value),
        Err(e @ Error::PatternNotFound(_)) => {
            debug!("{}", e);
            None
        }
        Err(e) => {
            warn!("Ignoring unusable {} table: {}", what, e);
            None
        }
    }
}

/// Pulls every constant table out of the bundle text.
///
/// Profit per level, quality weight and the production models are required. Wage
/// and adjustment tables are optional here and checked where they are used.
pub fn extract_constants(script: &str) -> Result<ScriptConstants> {
    let profit_per_building_level = decimal_scalar(script, PROFIT_PER_BUILDING_LEVEL)?;
    let retail_modeling_quality_weight = decimal_scalar(script, RETAIL_MODELING_QUALITY_WEIGHT)?;
    debug!(
        "{}={} {}={}",
        PROFIT_PER_BUILDING_LEVEL,
        profit_per_building_level,
        RETAIL_MODELING_QUALITY_WEIGHT,
        retail_modeling_quality_weight
    );

    let models = interpret::model_table(&locate::model_table(script)?)?;
    info!(
        "Extracted production models for {} economy states",
        models.len()
    );

    let average_salary = optional(AVERAGE_SALARY, || {
        interpret::decimal(AVERAGE_SALARY, &locate::scalar(script, AVERAGE_SALARY)?)
    });

    let sales = optional(SALES_BY_BUILDING, || {
        let raw = locate::literal_after(script, SALES_BY_BUILDING)?;
        interpret::sales_table(&repair::parse_js_literal(SALES_BY_BUILDING, raw)?)
    });

    let buildings = interpret::buildings(&locate::building_objects(script));
    debug!("Found {} building declarations", buildings.len());

    let retail_adjustments = optional(RETAIL_ADJUSTMENT, || {
        let raw = locate::shallow_literal_after(script, RETAIL_ADJUSTMENT)
            .ok_or_else(|| Error::PatternNotFound(RETAIL_ADJUSTMENT.into()))?;
        interpret::retail_adjustments(&repair::parse_js_literal(RETAIL_ADJUSTMENT, raw)?)
    })
    .unwrap_or_else(|| {
        warn!("{} table unavailable, adjustments will be null", RETAIL_ADJUSTMENT);
        BTreeMap::new()
    });

    Ok(ScriptConstants {
        profit_per_building_level,
        retail_modeling_quality_weight,
        average_salary,
        sales,
        buildings,
        retail_adjustments,
        models,
    })
}
