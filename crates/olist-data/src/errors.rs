use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("raw table {table} was not supplied")]
    MissingTable { table: String },

    #[error("raw table {table} is missing column {column}")]
    MissingColumn { table: String, column: &'static str },

    #[error("review {review_id} has review_score {score:?}; expected a value between 1 and 5")]
    InvalidReviewScore { review_id: String, score: Option<i64> },

    #[error("column {table}.{column} could not be read as a timestamp: {source}")]
    InvalidTimestamp {
        table: String,
        column: &'static str,
        #[source]
        source: PolarsError,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid csv search pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to list csv files: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
}
