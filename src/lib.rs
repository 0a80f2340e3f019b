pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod logging;
pub mod market;
pub mod model;
pub mod output;
pub mod sources;

pub use config::Config;
pub use error::{Error, Result};
