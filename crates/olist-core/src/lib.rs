pub mod config;
pub mod error;
mod frame;
mod geo;
pub mod order;
pub mod product;
pub mod seller;

pub use config::{CostModel, MetricsConfig, OrderOptions, ReviewCostTable};
pub use error::{MetricsError, Result};
pub use order::OrderMetrics;
pub use product::ProductMetrics;
pub use seller::SellerMetrics;
