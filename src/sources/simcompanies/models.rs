use std::collections::HashMap;

use serde::Deserialize;

use crate::sources::MarketInfo;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetailInfo {
    pub db_letter: u32,
    #[serde(default)]
    pub average_price: f64,
    #[serde(default)]
    pub saturation: f64,
    #[serde(default)]
    pub quality: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct CompanyMe {
    #[serde(default)]
    pub temporals: Option<Temporals>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Temporals {
    pub economy_state: Option<u8>,
}

/// Retail market info indexed by item, and by (item, quality) for rows that carry a quality.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketData {
    pub by_item: HashMap<u32, MarketInfo>,
    pub by_quality: HashMap<(u32, u8), MarketInfo>,
}

impl MarketData {
    pub fn from_retail_info(rows: &[RetailInfo]) -> Self {
        let mut data = MarketData::default();
        for row in rows {
            let info = MarketInfo {
                average_price: row.average_price,
                market_saturation: row.saturation,
            };
            if let Some(q) = row.quality {
                data.by_quality.insert((row.db_letter, q), info);
            }
            // later rows for the same item replace earlier ones
            data.by_item.insert(row.db_letter, info);
        }
        data
    }

    pub fn item(&self, item_id: u32) -> Option<MarketInfo> {
        self.by_item.get(&item_id).copied()
    }

    pub fn quality(&self, item_id: u32, quality: u8) -> Option<MarketInfo> {
        self.by_quality
            .get(&(item_id, quality))
            .copied()
            .or_else(|| self.item(item_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_row_wins_for_item_level() {
        let rows: Vec<RetailInfo> = serde_json::from_str(
            r#"[
                {"dbLetter": 3, "averagePrice": 0.4, "saturation": 1.2},
                {"dbLetter": 3, "averagePrice": 0.6, "saturation": 1.1}
            ]"#,
        )
        .unwrap();
        let data = MarketData::from_retail_info(&rows);
        assert_eq!(data.item(3).unwrap().average_price, 0.6);
    }

    #[test]
    fn quality_rows_fall_back_to_item_level() {
        let rows: Vec<RetailInfo> = serde_json::from_str(
            r#"[
                {"dbLetter": 3, "averagePrice": 0.4, "saturation": 1.2},
                {"dbLetter": 150, "averagePrice": 20.0, "saturation": 0.8, "quality": 0},
                {"dbLetter": 150, "averagePrice": 25.0, "saturation": 0.9, "quality": 1}
            ]"#,
        )
        .unwrap();
        let data = MarketData::from_retail_info(&rows);

        assert_eq!(data.item(3).unwrap().average_price, 0.4);
        assert_eq!(data.quality(150, 1).unwrap().average_price, 25.0);
        assert_eq!(data.quality(150, 0).unwrap().average_price, 20.0);
        // unknown quality falls back to the last row seen for the item
        assert_eq!(data.quality(150, 4).unwrap().average_price, 25.0);
        assert_eq!(data.quality(3, 2).unwrap().market_saturation, 1.2);
        assert!(data.item(4).is_none());
    }
}
