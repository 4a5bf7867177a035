use olist_data::schema::{CUSTOMERS, GEOLOCATION, ORDERS, ORDER_ITEMS, ORDER_REVIEWS, SELLERS};
use olist_data::RawTables;
use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::config::OrderOptions;
use crate::error::Result;
use crate::frame::{
    days_between, join_on, merge_all, non_negative, sort_by_key, star_indicator, DELIVERED,
};
use crate::geo::{first_location_by, haversine_km};

/// Per-order features: delivery timings, review flags, basket composition and value.
#[derive(Debug, Clone)]
pub struct OrderMetrics {
    data: RawTables,
    options: OrderOptions,
}

impl OrderMetrics {
    pub fn new(data: RawTables) -> Self {
        Self::with_options(data, OrderOptions::default())
    }

    pub fn with_options(data: RawTables, options: OrderOptions) -> Self {
        Self { data, options }
    }

    /// `[order_id, wait_time, expected_wait_time, delay_vs_expected, order_status]`, in days.
    ///
    /// Early deliveries have a `delay_vs_expected` of zero.
    pub fn wait_time(&self) -> Result<DataFrame> {
        let mut orders = self.data.lazy(ORDERS)?;
        if self.options.delivered_only {
            orders = orders.filter(col("order_status").eq(lit(DELIVERED)));
        }

        let df = orders
            .select([
                col("order_id"),
                days_between("order_delivered_customer_date", "order_purchase_timestamp")
                    .alias("wait_time"),
                days_between("order_estimated_delivery_date", "order_purchase_timestamp")
                    .alias("expected_wait_time"),
                non_negative(days_between(
                    "order_delivered_customer_date",
                    "order_estimated_delivery_date",
                ))
                .alias("delay_vs_expected"),
                col("order_status"),
            ])
            .collect()?;

        debug!(rows = df.height(), "computed order wait times");
        Ok(df)
    }

    /// `[order_id, dim_is_five_star, dim_is_one_star, review_score]`, one row per review.
    pub fn review_score(&self) -> Result<DataFrame> {
        let df = self
            .data
            .lazy(ORDER_REVIEWS)?
            .select([
                col("order_id"),
                star_indicator("review_score", 5).alias("dim_is_five_star"),
                star_indicator("review_score", 1).alias("dim_is_one_star"),
                col("review_score"),
            ])
            .collect()?;

        debug!(rows = df.height(), "computed order review flags");
        Ok(df)
    }

    /// `[order_id, number_of_products]`, counting line items directly.
    pub fn number_of_products(&self) -> Result<DataFrame> {
        let counts = self
            .data
            .lazy(ORDER_ITEMS)?
            .group_by([col("order_id")])
            .agg([
                len().cast(DataType::Int64).alias("number_of_products"),
                col("order_item_id").max().alias("max_order_item_id"),
            ])
            .collect()?;

        let sparse = counts
            .clone()
            .lazy()
            .filter(
                col("max_order_item_id")
                    .neq(col("number_of_products"))
                    .fill_null(lit(false)),
            )
            .collect()?
            .height();
        if sparse > 0 {
            warn!(
                orders = sparse,
                "order_item_id numbering has gaps; using the item count"
            );
        }

        Ok(counts.drop("max_order_item_id")?)
    }

    /// `[order_id, number_of_sellers]`, distinct sellers per order.
    pub fn number_of_sellers(&self) -> Result<DataFrame> {
        let df = self
            .data
            .lazy(ORDER_ITEMS)?
            .group_by([col("order_id")])
            .agg([col("seller_id")
                .drop_nulls()
                .n_unique()
                .cast(DataType::Int64)
                .alias("number_of_sellers")])
            .collect()?;
        Ok(df)
    }

    /// `[order_id, price, freight_value]`, summed over the order's items.
    pub fn price_and_freight(&self) -> Result<DataFrame> {
        let df = self
            .data
            .lazy(ORDER_ITEMS)?
            .group_by([col("order_id")])
            .agg([col("price").sum(), col("freight_value").sum()])
            .collect()?;
        Ok(df)
    }

    /// `[order_id, distance_seller_customer]`: mean haversine distance in km between each
    /// item's seller and the order's customer, located by zip-code prefix.
    ///
    /// Needs the `customers` table. Items whose seller or customer zip prefix has no
    /// geolocation are left out of the mean.
    pub fn distance_seller_customer(&self) -> Result<DataFrame> {
        let by_zip = first_location_by(self.data.lazy(GEOLOCATION)?, "geolocation_zip_code_prefix");

        let sellers = self
            .data
            .lazy(SELLERS)?
            .select([col("seller_id"), col("seller_zip_code_prefix")])
            .unique_stable(None, UniqueKeepStrategy::First)
            .join(
                by_zip.clone(),
                [col("seller_zip_code_prefix")],
                [col("geolocation_zip_code_prefix")],
                JoinArgs::new(JoinType::Inner),
            )
            .select([
                col("seller_id"),
                col("lat").alias("seller_lat"),
                col("lng").alias("seller_lng"),
            ]);

        let customers = self
            .data
            .lazy(CUSTOMERS)?
            .select([col("customer_id"), col("customer_zip_code_prefix")])
            .unique_stable(None, UniqueKeepStrategy::First)
            .join(
                by_zip,
                [col("customer_zip_code_prefix")],
                [col("geolocation_zip_code_prefix")],
                JoinArgs::new(JoinType::Inner),
            )
            .select([
                col("customer_id"),
                col("lat").alias("customer_lat"),
                col("lng").alias("customer_lng"),
            ]);

        let items = self
            .data
            .lazy(ORDER_ITEMS)?
            .select([col("order_id"), col("seller_id")]);
        let orders = self
            .data
            .lazy(ORDERS)?
            .select([col("order_id"), col("customer_id")]);

        let mut legs = join_on(items, orders, "order_id", JoinType::Inner);
        legs = join_on(legs, sellers, "seller_id", JoinType::Inner);
        legs = join_on(legs, customers, "customer_id", JoinType::Inner);
        let mut legs = legs.collect()?;

        let seller_lat = legs.column("seller_lat")?.f64()?;
        let seller_lng = legs.column("seller_lng")?.f64()?;
        let customer_lat = legs.column("customer_lat")?.f64()?;
        let customer_lng = legs.column("customer_lng")?.f64()?;

        let distances: Vec<Option<f64>> = (0..legs.height())
            .map(|idx| {
                match (
                    seller_lat.get(idx),
                    seller_lng.get(idx),
                    customer_lat.get(idx),
                    customer_lng.get(idx),
                ) {
                    (Some(s_lat), Some(s_lng), Some(c_lat), Some(c_lng)) => {
                        Some(haversine_km(s_lat, s_lng, c_lat, c_lng))
                    }
                    _ => None,
                }
            })
            .collect();

        legs.with_column(Series::new("distance_seller_customer".into(), distances))?;

        let df = legs
            .lazy()
            .group_by([col("order_id")])
            .agg([col("distance_seller_customer").mean()])
            .collect()?;
        Ok(df)
    }

    /// Inner join of every per-order metric on `order_id`, without rows holding nulls.
    ///
    /// Orders without a review, or without complete delivery timestamps, are dropped.
    pub fn training_data(&self) -> Result<DataFrame> {
        let mut frames = vec![
            self.wait_time()?,
            self.review_score()?,
            self.number_of_products()?,
            self.number_of_sellers()?,
            self.price_and_freight()?,
        ];
        if self.options.with_distance_seller_customer {
            frames.push(self.distance_seller_customer()?);
        }

        let training = merge_all(frames, "order_id").drop_nulls(None);
        let df = sort_by_key(training, "order_id").collect()?;

        info!(rows = df.height(), "computed order training data");
        Ok(df)
    }
}
