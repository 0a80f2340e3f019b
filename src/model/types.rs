use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The game's macro-economic cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EconomyState {
    Depressed = 0,
    Balanced = 1,
    Booming = 2,
}

impl EconomyState {
    pub const ALL: [EconomyState; 3] = [Self::Depressed, Self::Balanced, Self::Booming];

    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EconomyState::Depressed => "depressed",
            EconomyState::Balanced => "balanced",
            EconomyState::Booming => "booming",
        }
    }
}

impl fmt::Display for EconomyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<u8> for EconomyState {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0 => Ok(EconomyState::Depressed),
            1 => Ok(EconomyState::Balanced),
            2 => Ok(EconomyState::Booming),
            _ => Err(Error::Other(format!("Unknown economy state: {}", v))),
        }
    }
}

impl FromStr for EconomyState {
    type Err = Error;

    /// Accepts the state index, the English name, or the in-game cycle label.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "0" | "depressed" | "萧条" => Ok(EconomyState::Depressed),
            "1" | "balanced" | "平缓" => Ok(EconomyState::Balanced),
            "2" | "booming" | "景气" => Ok(EconomyState::Booming),
            other => Err(Error::Config(format!("Unknown economy state: {:?}", other))),
        }
    }
}

/// Modeled retail parameters for one item in one economy state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_levels_needed_per_hour: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_levels_needed_per_unit_per_hour: Option<f64>,
    #[serde(default)]
    pub modeled_production_cost_per_unit: Option<f64>,
    #[serde(default)]
    pub modeled_store_wages: Option<f64>,
    #[serde(default)]
    pub modeled_units_sold_an_hour: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelEntry {
    Single(ProductionModel),
    /// Item modeled separately for each quality level.
    PerQuality(BTreeMap<u8, ProductionModel>),
}

pub type StateModels = BTreeMap<u32, ModelEntry>;

pub type ProductionModelTable = BTreeMap<EconomyState, StateModels>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_label_form() {
        assert_eq!("0".parse::<EconomyState>().unwrap(), EconomyState::Depressed);
        assert_eq!("Balanced".parse::<EconomyState>().unwrap(), EconomyState::Balanced);
        assert_eq!("景气".parse::<EconomyState>().unwrap(), EconomyState::Booming);
        assert_eq!("萧条".parse::<EconomyState>().unwrap(), EconomyState::Depressed);
        assert!("roaring".parse::<EconomyState>().is_err());
    }

    #[test]
    fn index_round_trips() {
        for state in EconomyState::ALL {
            assert_eq!(EconomyState::try_from(state.index()).unwrap(), state);
        }
        assert!(EconomyState::try_from(3).is_err());
    }

    #[test]
    fn per_unit_variant_is_kept_apart() {
        let model: ProductionModel = serde_json::from_str(
            r#"{"buildingLevelsNeededPerUnitPerHour":0.2,"modeledProductionCostPerUnit":1.1,"modeledStoreWages":null,"modeledUnitsSoldAnHour":30}"#,
        )
        .unwrap();
        assert_eq!(model.building_levels_needed_per_unit_per_hour, Some(0.2));
        assert!(model.building_levels_needed_per_hour.is_none());
        assert!(model.modeled_store_wages.is_none());
    }
}
