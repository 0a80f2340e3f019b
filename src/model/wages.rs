use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::WageCategories;
use crate::extract::{SalesTable, WageInputs};

/// Item id → modeled store wage.
pub type WageTable = BTreeMap<u32, f64>;

/// Item id → retail adjustment of the building that sells it.
pub type AdjustmentTable = BTreeMap<u32, Value>;

/// `averageSalary × salaryModifier` to exactly two decimal places.
pub fn round_wage(average_salary: Decimal, salary_modifier: Decimal) -> Decimal {
    let mut wage = (average_salary * salary_modifier)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    wage.rescale(2);
    wage
}

fn is_excluded(category: Option<&str>, excluded: &[String]) -> bool {
    category.is_some_and(|c| {
        let c = c.to_lowercase();
        excluded.iter().any(|e| c.contains(e.as_str()))
    })
}

/// Wage per item from `averageSalary × salaryModifier` of the building selling it.
///
/// Buildings filed under an excluded category get no entries.
pub fn scraped_wages(inputs: &WageInputs<'_>, excluded: &[String]) -> WageTable {
    let mut wages = WageTable::new();

    for (code, entry) in inputs.sales {
        let Some(meta) = inputs.buildings.get(code) else {
            warn!("No salary modifier for building {}, skipping its items", code);
            continue;
        };
        if is_excluded(entry.category.as_deref(), excluded)
            || is_excluded(meta.category.as_deref(), excluded)
        {
            debug!("Skipping excluded building {} ({})", code, meta.name);
            continue;
        }

        let wage = round_wage(inputs.average_salary, meta.salary_modifier);
        let Some(wage) = wage.to_f64() else {
            warn!("Wage {} for building {} does not fit a float", wage, code);
            continue;
        };
        for item in &entry.items {
            wages.insert(*item, wage);
        }
    }
    wages
}

pub fn fixed_wages(categories: &WageCategories) -> WageTable {
    categories.as_map().clone()
}

pub fn item_adjustments(sales: &SalesTable, adjustments: &BTreeMap<String, Value>) -> AdjustmentTable {
    let mut table = AdjustmentTable::new();
    for (code, entry) in sales {
        if let Some(adjustment) = adjustments.get(code) {
            for item in &entry.items {
                table.insert(*item, adjustment.clone());
            }
        }
    }
    table
}
