use std::collections::HashMap;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::errors::DataError;
use crate::tables::RawTables;

/// Health check for the data layer.
pub fn ping() -> &'static str {
    "pong"
}

/// Loads every `*.csv` extract in `dir` into a validated [`RawTables`].
pub fn load_csv_dir(dir: impl AsRef<Path>) -> Result<RawTables, DataError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(DataError::Io {
            path: dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let pattern = dir.join("*.csv");
    let mut tables = HashMap::new();

    for entry in glob::glob(&pattern.to_string_lossy())? {
        let path = entry?;
        let Some(name) = table_name_from_path(&path) else {
            continue;
        };

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.clone()))?
            .finish()?;

        info!(table = %name, rows = df.height(), path = %path.display(), "loaded raw table");
        tables.insert(name, df);
    }

    RawTables::new(tables)
}

/// `olist_order_items_dataset.csv` -> `order_items`.
pub fn table_name_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let name = stem.replace("olist_", "").replace("_dataset", "");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
