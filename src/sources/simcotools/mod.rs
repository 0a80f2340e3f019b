pub mod client;
pub mod models;

pub use client::SimcoToolsClient;
pub use models::*;
