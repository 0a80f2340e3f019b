pub mod simcompanies;
pub mod simcotools;
pub mod traits;

pub use traits::{ItemPriceRecord, MarketInfo, MarketOrder, OrderBookSource};
