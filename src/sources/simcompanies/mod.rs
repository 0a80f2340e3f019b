pub mod client;
pub mod models;

pub use client::SimCompaniesClient;
pub use models::*;
