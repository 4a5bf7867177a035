// crates/olist-core/src/error.rs

use olist_data::DataError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Raw data error: {0}")]
    Data(#[from] DataError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid metrics configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MetricsError>;
