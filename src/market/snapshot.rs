use std::collections::{BTreeMap, HashSet};

use crate::sources::simcotools::Vwap;
use crate::sources::{ItemPriceRecord, MarketOrder};

/// Minimum observed price per (item, quality), accumulated across pages and attempts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceBook {
    prices: BTreeMap<(u32, u8), f64>,
}

impl PriceBook {
    pub fn observe(&mut self, item_id: u32, quality: u8, price: f64) {
        if !price.is_finite() {
            return;
        }
        self.prices
            .entry((item_id, quality))
            .and_modify(|p| {
                if price < *p {
                    *p = price
                }
            })
            .or_insert(price);
    }

    pub fn observe_orders(&mut self, orders: &[MarketOrder]) {
        for order in orders {
            self.observe(order.kind, order.quality, order.price);
        }
    }

    pub fn observe_vwaps(&mut self, vwaps: &[Vwap]) {
        for v in vwaps {
            self.observe(v.resource_id, v.quality, v.vwap);
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Records for allow-listed items only, ordered by item then quality.
    pub fn records(&self, allow: &[u32]) -> Vec<ItemPriceRecord> {
        let allow: HashSet<u32> = allow.iter().copied().collect();
        self.prices
            .iter()
            .filter(|((item_id, _), _)| allow.contains(item_id))
            .map(|(&(item_id, quality), &price)| ItemPriceRecord {
                item_id,
                quality,
                price,
            })
            .collect()
    }
}
