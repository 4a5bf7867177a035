use olist_data::schema::{CATEGORY_TRANSLATION, ORDER_ITEMS, PRODUCTS};
use olist_data::RawTables;
use polars::prelude::*;
use tracing::{debug, info};

use crate::config::{CostModel, MetricsConfig};
use crate::error::Result;
use crate::frame::{join_on, merge_all, order_pairs, review_cost, sort_by_key};
use crate::order::OrderMetrics;

/// Per-product features. Order-level metrics reach product granularity through the
/// distinct `(order_id, product_id)` pairs of the matching table, so a product bought
/// several times in one order counts that order once.
#[derive(Debug, Clone)]
pub struct ProductMetrics {
    data: RawTables,
    matching: DataFrame,
    orders: OrderMetrics,
    cost_model: CostModel,
}

impl ProductMetrics {
    pub fn new(data: RawTables, config: &MetricsConfig) -> Result<Self> {
        let matching = data.matching_table()?;
        let orders = OrderMetrics::with_options(data.clone(), config.orders);
        Ok(Self {
            data,
            matching,
            orders,
            cost_model: config.cost_model.clone(),
        })
    }

    /// Catalogue attributes with the category translated to English.
    ///
    /// Products whose category has no translation are dropped.
    pub fn features(&self) -> Result<DataFrame> {
        let products = self.data.lazy(PRODUCTS)?;
        let translation = self.data.lazy(CATEGORY_TRANSLATION)?;

        let df = join_on(products, translation, "product_category_name", JoinType::Inner)
            .select([
                col("product_id"),
                col("product_category_name_english").alias("category"),
                col("product_name_lenght").alias("product_name_length"),
                col("product_description_lenght").alias("product_description_length"),
                col("product_photos_qty"),
                col("product_weight_g"),
                col("product_length_cm"),
                col("product_height_cm"),
                col("product_width_cm"),
            ])
            .collect()?;

        debug!(rows = df.height(), "computed product features");
        Ok(df)
    }

    /// `[product_id, price]`, mean over every line item.
    pub fn price(&self) -> Result<DataFrame> {
        let df = self
            .items()?
            .group_by([col("product_id")])
            .agg([col("price").mean()])
            .collect()?;
        Ok(df)
    }

    /// `[product_id, wait_time]`, mean wait of the orders containing the product.
    pub fn wait_time(&self) -> Result<DataFrame> {
        let waits = self
            .orders
            .wait_time()?
            .lazy()
            .select([col("order_id"), col("wait_time")]);

        let df = join_on(self.pairs(), waits, "order_id", JoinType::Inner)
            .group_by([col("product_id")])
            .agg([col("wait_time").mean()])
            .collect()?;
        Ok(df)
    }

    /// `[product_id, share_of_five_stars, share_of_one_stars, review_score]`.
    pub fn review_score(&self) -> Result<DataFrame> {
        let reviews = self.orders.review_score()?.lazy();

        let df = join_on(self.pairs(), reviews, "order_id", JoinType::Inner)
            .group_by([col("product_id")])
            .agg([
                col("dim_is_five_star")
                    .cast(DataType::Float64)
                    .mean()
                    .alias("share_of_five_stars"),
                col("dim_is_one_star")
                    .cast(DataType::Float64)
                    .mean()
                    .alias("share_of_one_stars"),
                col("review_score").cast(DataType::Float64).mean(),
            ])
            .collect()?;

        debug!(rows = df.height(), "computed product review shares");
        Ok(df)
    }

    /// `[product_id, sales]`, total item price.
    pub fn sales(&self) -> Result<DataFrame> {
        let df = self
            .items()?
            .group_by([col("product_id")])
            .agg([col("price").sum().alias("sales")])
            .collect()?;
        Ok(df)
    }

    /// `[product_id, n_orders, quantity]`: distinct orders and line items.
    pub fn quantity(&self) -> Result<DataFrame> {
        let df = self
            .items()?
            .group_by([col("product_id")])
            .agg([
                col("order_id")
                    .drop_nulls()
                    .n_unique()
                    .cast(DataType::Int64)
                    .alias("n_orders"),
                len().cast(DataType::Int64).alias("quantity"),
            ])
            .collect()?;
        Ok(df)
    }

    /// `[product_id, costs]`: review costs summed over the orders containing the product.
    pub fn costs(&self) -> Result<DataFrame> {
        let reviews = self
            .orders
            .review_score()?
            .lazy()
            .select([col("order_id"), col("review_score")]);

        let df = join_on(self.pairs(), reviews, "order_id", JoinType::Inner)
            .with_column(
                review_cost("review_score", &self.cost_model.product_review_costs)
                    .alias("costs"),
            )
            .group_by([col("product_id")])
            .agg([col("costs").sum()])
            .collect()?;
        Ok(df)
    }

    /// `[product_id, revenues]`: the marketplace commission on sales.
    pub fn revenues(&self) -> Result<DataFrame> {
        let df = self
            .sales()?
            .lazy()
            .select([
                col("product_id"),
                (col("sales") * lit(self.cost_model.commission_rate)).alias("revenues"),
            ])
            .collect()?;
        Ok(df)
    }

    /// `[product_id, profits]`, with revenues and costs matched on `product_id`.
    pub fn profits(&self) -> Result<DataFrame> {
        let df = join_on(
            self.revenues()?.lazy(),
            self.costs()?.lazy(),
            "product_id",
            JoinType::Inner,
        )
        .select([
            col("product_id"),
            (col("revenues") - col("costs")).alias("profits"),
        ])
        .collect()?;
        Ok(df)
    }

    /// Every product metric inner-joined on `product_id`.
    pub fn training_data(&self) -> Result<DataFrame> {
        let frames = vec![
            self.features()?,
            self.wait_time()?,
            self.price()?,
            self.review_score()?,
            self.costs()?,
            self.revenues()?,
            self.profits()?,
            self.quantity()?,
            self.sales()?,
        ];

        let df = sort_by_key(merge_all(frames, "product_id"), "product_id").collect()?;

        info!(rows = df.height(), "computed product training data");
        Ok(df)
    }

    fn pairs(&self) -> LazyFrame {
        order_pairs(&self.matching, "product_id")
    }

    fn items(&self) -> Result<LazyFrame> {
        Ok(self
            .data
            .lazy(ORDER_ITEMS)?
            .filter(col("product_id").is_not_null()))
    }
}
