pub mod errors;
pub mod loader;
pub mod schema;
mod tables;

pub use errors::DataError;
pub use loader::{load_csv_dir, ping, table_name_from_path};
pub use tables::RawTables;
