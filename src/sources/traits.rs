use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Cheapest observed price for one (item, quality) pair.
///
/// Serialized as the tuple `[itemId, quality, price]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "(u32, u8, f64)", from = "(u32, u8, f64)")]
pub struct ItemPriceRecord {
    pub item_id: u32,
    pub quality: u8,
    pub price: f64,
}

impl From<ItemPriceRecord> for (u32, u8, f64) {
    fn from(r: ItemPriceRecord) -> Self {
        (r.item_id, r.quality, r.price)
    }
}

impl From<(u32, u8, f64)> for ItemPriceRecord {
    fn from((item_id, quality, price): (u32, u8, f64)) -> Self {
        Self {
            item_id,
            quality,
            price,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInfo {
    pub average_price: f64,
    pub market_saturation: f64,
}

/// Single sell order as returned by the game's order book.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarketOrder {
    pub kind: u32,
    #[serde(default)]
    pub quality: u8,
    pub price: f64,
}

/// Per-item order book lookup, the unit of work of the batched fetcher.
#[async_trait]
pub trait OrderBookSource: Send + Sync {
    async fn fetch_orders(&self, realm: u32, item_id: u32) -> Result<Vec<MarketOrder>>;
}
