use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// Cost charged for a single bad review, depending on its score.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ReviewCostTable {
    /// Divided by the score for 1 and 2 star reviews.
    pub one_or_two_star_base: f64,
    pub three_star: f64,
}

impl ReviewCostTable {
    pub const PRODUCT: Self = Self {
        one_or_two_star_base: 75.0,
        three_star: 30.0,
    };

    pub const SELLER: Self = Self {
        one_or_two_star_base: 100.0,
        three_star: 40.0,
    };
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CostModel {
    /// Share of item price kept by the marketplace.
    pub commission_rate: f64,
    pub seller_subscription_per_month: f64,
    /// Fixed platform cost spread over sellers by sqrt(n_orders).
    pub platform_it_cost: f64,
    pub product_review_costs: ReviewCostTable,
    pub seller_review_costs: ReviewCostTable,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            commission_rate: 0.10,
            seller_subscription_per_month: 80.0,
            platform_it_cost: 500_000.0,
            product_review_costs: ReviewCostTable::PRODUCT,
            seller_review_costs: ReviewCostTable::SELLER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrderOptions {
    /// Restrict order wait times to delivered orders.
    pub delivered_only: bool,
    /// Add the seller/customer distance to the order training data.
    pub with_distance_seller_customer: bool,
}

impl Default for OrderOptions {
    fn default() -> Self {
        Self {
            delivered_only: true,
            with_distance_seller_customer: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub cost_model: CostModel,
    pub orders: OrderOptions,
}

impl MetricsConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
