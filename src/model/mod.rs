pub mod merge;
pub mod types;
pub mod wages;

pub use merge::{ensure_market_ready, DatasetEntry, DatasetMerger, ExtractedDataset, MergedItem, RetentionFilter};
pub use types::{EconomyState, ModelEntry, ProductionModel, ProductionModelTable, StateModels};
pub use wages::{fixed_wages, item_adjustments, scraped_wages, AdjustmentTable, WageTable};
