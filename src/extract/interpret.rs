//! Turns repaired fragments into typed tables.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::debug;

use super::locate::{BuildingFragments, ModelFragment, RawFields};
use super::repair::{parse_js_literal, parse_quoted_payload};
use crate::error::{Error, Result};
use crate::model::{EconomyState, ModelEntry, ProductionModel, ProductionModelTable, StateModels};

/// Items a building sells, plus the category it is filed under.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesEntry {
    pub category: Option<String>,
    pub items: Vec<u32>,
}

/// Building short code → sales entry.
pub type SalesTable = BTreeMap<String, SalesEntry>;

#[derive(Debug, Clone, PartialEq)]
pub struct BuildingMeta {
    pub name: String,
    pub db_letter: String,
    pub salary_modifier: Decimal,
    pub category: Option<String>,
}

fn interpret_err(what: &str, reason: impl Into<String>) -> Error {
    Error::Interpret {
        what: what.to_string(),
        reason: reason.into(),
    }
}

pub fn decimal(what: &str, raw: &str) -> Result<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| interpret_err(what, format!("{:?} is not a decimal: {}", raw, e)))
}

fn decimal_value(what: &str, value: &Value) -> Result<Decimal> {
    match value {
        Value::Number(n) => decimal(what, &n.to_string()),
        Value::String(s) => decimal(what, s),
        other => Err(interpret_err(what, format!("expected a number, got {}", other))),
    }
}

fn item_id(what: &str, value: &Value) -> Result<u32> {
    let id = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    id.and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| interpret_err(what, format!("{} is not an item id", value)))
}

fn as_object<'a>(what: &str, value: &'a Value) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| interpret_err(what, "expected an object"))
}

/// Accepts `code: [ids]` or `code: {category?, resources|items: [ids]}`.
pub fn sales_table(value: &Value) -> Result<SalesTable> {
    let what = "sales by building";
    let mut table = SalesTable::new();

    for (code, entry) in as_object(what, value)? {
        let (category, list) = match entry {
            Value::Array(list) => (None, list),
            Value::Object(obj) => {
                let list = obj
                    .get("resources")
                    .or_else(|| obj.get("items"))
                    .and_then(Value::as_array)
                    .ok_or_else(|| interpret_err(what, format!("building {} lists no items", code)))?;
                let category = obj.get("category").and_then(Value::as_str).map(str::to_string);
                (category, list)
            }
            _ => return Err(interpret_err(what, format!("building {} has no item list", code))),
        };

        let items = list
            .iter()
            .map(|v| item_id(what, v))
            .collect::<Result<Vec<_>>>()?;
        table.insert(code.clone(), SalesEntry { category, items });
    }

    if table.is_empty() {
        return Err(interpret_err(what, "table is empty"));
    }
    Ok(table)
}

/// Building metadata from one declaration, or `None` when a field does not parse.
pub fn building(fields: &RawFields) -> Option<BuildingMeta> {
    let field = |key: &str| -> Option<Value> {
        let raw = fields.get(key)?;
        parse_js_literal(key, raw).ok()
    };

    let name = field("name")?.as_str()?.to_string();
    let db_letter = match field("dbLetter")? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let salary_modifier = decimal_value("salaryModifier", &field("salaryModifier")?).ok()?;
    let category = field("category").and_then(|v| v.as_str().map(str::to_string));

    Some(BuildingMeta {
        name,
        db_letter,
        salary_modifier,
        category,
    })
}

/// Merges both declaration passes by short code. Top-level declarations win.
pub fn buildings(fragments: &BuildingFragments) -> BTreeMap<String, BuildingMeta> {
    let mut table = BTreeMap::new();

    for fields in fragments.declared.iter().chain(fragments.nested.iter()) {
        match building(fields) {
            Some(meta) => {
                table.entry(meta.db_letter.clone()).or_insert(meta);
            }
            None => debug!("Skipping unparsable building declaration: {:?}", fields),
        }
    }
    table
}

/// Building short code → adjustment value, kept as found.
pub fn retail_adjustments(value: &Value) -> Result<BTreeMap<String, Value>> {
    Ok(as_object("retail adjustment", value)?
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect())
}

fn production_model(what: &str, value: &Value) -> Result<ProductionModel> {
    serde_json::from_value(value.clone()).map_err(|e| interpret_err(what, e.to_string()))
}

fn model_entry(item: &str, value: &Value) -> Result<ModelEntry> {
    let what = format!("model for item {}", item);
    let obj = as_object(&what, value)?;

    let is_model = obj
        .keys()
        .any(|k| k.starts_with("buildingLevelsNeeded") || k.starts_with("modeled"));
    if is_model {
        return Ok(ModelEntry::Single(production_model(&what, value)?));
    }

    let mut per_quality = BTreeMap::new();
    for (quality, model) in obj {
        let q = quality
            .parse::<u8>()
            .map_err(|_| interpret_err(&what, format!("unexpected key {:?}", quality)))?;
        per_quality.insert(q, production_model(&what, model)?);
    }
    if per_quality.is_empty() {
        return Err(interpret_err(&what, "no model fields"));
    }
    Ok(ModelEntry::PerQuality(per_quality))
}

fn state_models(state: EconomyState, value: &Value) -> Result<StateModels> {
    let what = format!("{} production models", state);
    let mut models = StateModels::new();
    for (item, entry) in as_object(&what, value)? {
        let id = item_id(&what, &Value::String(item.clone()))?;
        models.insert(id, model_entry(item, entry)?);
    }
    Ok(models)
}

fn state_index(what: &str, key: &str) -> Result<EconomyState> {
    let index = key
        .parse::<u8>()
        .map_err(|_| interpret_err(what, format!("{:?} is not a state index", key)))?;
    EconomyState::try_from(index)
}

pub fn model_table(fragment: &ModelFragment<'_>) -> Result<ProductionModelTable> {
    let what = "production model table";
    let mut table = ProductionModelTable::new();

    match fragment {
        ModelFragment::Inline(raw) => {
            let value = parse_js_literal(what, raw)?;
            for (key, models) in as_object(what, &value)? {
                let state = state_index(what, key)?;
                table.insert(state, state_models(state, models)?);
            }
        }
        ModelFragment::Quoted(parts) => {
            for (index, payload) in parts {
                let state = EconomyState::try_from(*index)?;
                let value = parse_quoted_payload(what, payload)?;
                table.insert(state, state_models(state, &value)?);
            }
        }
    }

    if table.is_empty() {
        return Err(interpret_err(what, "no economy states"));
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::locate::top_level_fields;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn sales_table_accepts_both_shapes() {
        let table = sales_table(&json!({
            "B": [3, 4, "5"],
            "E": {"category": "restaurant", "resources": [120, 121]}
        }))
        .unwrap();

        assert_eq!(table["B"].items, vec![3, 4, 5]);
        assert!(table["B"].category.is_none());
        assert_eq!(table["E"].category.as_deref(), Some("restaurant"));
        assert_eq!(table["E"].items, vec![120, 121]);
    }

    #[test]
    fn sales_table_rejects_garbage() {
        assert!(sales_table(&json!({"B": 4})).is_err());
        assert!(sales_table(&json!({})).is_err());
        assert!(sales_table(&json!([1, 2])).is_err());
    }

    #[test]
    fn building_from_raw_fields() {
        let fields = top_level_fields(r#"{name:"Grocery store",dbLetter:"B",salaryModifier:1.5,cost:.2}"#);
        let meta = building(&fields).unwrap();
        assert_eq!(meta.name, "Grocery store");
        assert_eq!(meta.db_letter, "B");
        assert_eq!(meta.salary_modifier, dec("1.5"));
        assert!(meta.category.is_none());
    }

    #[test]
    fn declared_buildings_take_precedence() {
        let fragments = BuildingFragments {
            declared: vec![top_level_fields(r#"{name:"Top",dbLetter:"B",salaryModifier:2}"#)],
            nested: vec![
                top_level_fields(r#"{name:"Nested",dbLetter:"B",salaryModifier:1}"#),
                top_level_fields(r#"{name:"Other",dbLetter:"C",salaryModifier:.5}"#),
                top_level_fields(r#"{name:"Broken",dbLetter:"D",salaryModifier:x+1}"#),
            ],
        };
        let table = buildings(&fragments);
        assert_eq!(table.len(), 2);
        assert_eq!(table["B"].name, "Top");
        assert_eq!(table["C"].salary_modifier, dec("0.5"));
    }

    #[test]
    fn inline_model_table_with_per_quality_item() {
        let fragment = ModelFragment::Inline(
            "{0:{3:{buildingLevelsNeededPerHour:.2,modeledProductionCostPerUnit:.3,modeledStoreWages:.1,modeledUnitsSoldAnHour:50}},\
             1:{3:{buildingLevelsNeededPerHour:.25},150:{0:{buildingLevelsNeededPerUnitPerHour:1},1:{buildingLevelsNeededPerUnitPerHour:2}}}}",
        );
        let table = model_table(&fragment).unwrap();

        assert_eq!(table.len(), 2);
        match &table[&EconomyState::Depressed][&3] {
            ModelEntry::Single(m) => {
                assert_eq!(m.building_levels_needed_per_hour, Some(0.2));
                assert_eq!(m.modeled_units_sold_an_hour, Some(50.0));
            }
            other => panic!("unexpected {:?}", other),
        }
        match &table[&EconomyState::Balanced][&150] {
            ModelEntry::PerQuality(q) => {
                assert_eq!(q.len(), 2);
                assert_eq!(q[&1].building_levels_needed_per_unit_per_hour, Some(2.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn quoted_model_table() {
        let fragment = ModelFragment::Quoted(vec![(
            2,
            r#"{\"7\":{\"buildingLevelsNeededPerHour\":0.4,\"modeledStoreWages\":null}}"#,
        )]);
        let table = model_table(&fragment).unwrap();
        match &table[&EconomyState::Booming][&7] {
            ModelEntry::Single(m) => assert!(m.modeled_store_wages.is_none()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_state_index_is_rejected() {
        let fragment = ModelFragment::Inline("{7:{3:{buildingLevelsNeededPerHour:1}}}");
        assert!(model_table(&fragment).is_err());
    }

    #[test]
    fn decimal_accepts_scientific() {
        assert_eq!(decimal("x", "1e2").unwrap(), dec("100"));
        assert!(decimal("x", "abc").is_err());
    }
}
