pub mod batch;
pub mod snapshot;

pub use batch::BatchFetcher;
pub use snapshot::PriceBook;
