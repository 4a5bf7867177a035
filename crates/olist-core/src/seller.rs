use chrono::{DateTime, Datelike, NaiveDateTime};
use olist_data::schema::{GEOLOCATION, ORDERS, ORDER_ITEMS, SELLERS};
use olist_data::RawTables;
use polars::prelude::*;
use tracing::{debug, info};

use crate::config::{CostModel, MetricsConfig};
use crate::error::Result;
use crate::frame::{
    days_between, join_on, merge_all, non_negative, order_pairs, review_cost, sort_by_key,
    DELIVERED,
};
use crate::geo::first_location_by;
use crate::order::OrderMetrics;

/// Per-seller features, including the revenue/cost/profit model of the marketplace.
#[derive(Debug, Clone)]
pub struct SellerMetrics {
    data: RawTables,
    matching: DataFrame,
    orders: OrderMetrics,
    cost_model: CostModel,
}

impl SellerMetrics {
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

    /// `[seller_id, seller_city, seller_state, lat, lng]`.
    ///
    /// Coordinates come from the first geolocation row of the seller's city; sellers
    /// in unknown cities keep null coordinates.
    pub fn features(&self) -> Result<DataFrame> {
        let cities = first_location_by(self.data.lazy(GEOLOCATION)?, "geolocation_city");

        let df = self
            .data
            .lazy(SELLERS)?
            .select([col("seller_id"), col("seller_city"), col("seller_state")])
            .unique_stable(None, UniqueKeepStrategy::First)
            .join(
                cities,
                [col("seller_city")],
                [col("geolocation_city")],
                JoinArgs::new(JoinType::Left),
            )
            .select([
                col("seller_id"),
                col("seller_city"),
                col("seller_state"),
                col("lat"),
                col("lng"),
            ])
            .collect()?;

        debug!(rows = df.height(), "computed seller features");
        Ok(df)
    }

    /// `[seller_id, delay_to_carrier, wait_time]` over delivered orders, in days.
    ///
    /// `delay_to_carrier` is how late the parcel reached the carrier after the
    /// shipping limit; early hand-offs count as zero.
    pub fn delay_and_wait_time(&self) -> Result<DataFrame> {
        let delivered = self
            .data
            .lazy(ORDERS)?
            .filter(col("order_status").eq(lit(DELIVERED)))
            .select([
                col("order_id"),
                col("order_purchase_timestamp"),
                col("order_delivered_carrier_date"),
                col("order_delivered_customer_date"),
            ]);
        let items = self.items()?.select([
            col("order_id"),
            col("seller_id"),
            col("shipping_limit_date"),
        ]);

        let df = join_on(items, delivered, "order_id", JoinType::Inner)
            .with_columns([
                non_negative(days_between(
                    "order_delivered_carrier_date",
                    "shipping_limit_date",
                ))
                .alias("delay_to_carrier"),
                days_between("order_delivered_customer_date", "order_purchase_timestamp")
                    .alias("wait_time"),
            ])
            .group_by([col("seller_id")])
            .agg([col("delay_to_carrier").mean(), col("wait_time").mean()])
            .collect()?;

        debug!(rows = df.height(), "computed seller delays");
        Ok(df)
    }

    /// `[seller_id, date_first_sale, date_last_sale, active_months]` from approval dates.
    pub fn active_dates(&self) -> Result<DataFrame> {
        let approvals = self
            .data
            .lazy(ORDERS)?
            .select([col("order_id"), col("order_approved_at")]);

        let mut df = join_on(approvals, self.pairs(), "order_id", JoinType::Inner)
            .group_by([col("seller_id")])
            .agg([
                col("order_approved_at").min().alias("date_first_sale"),
                col("order_approved_at").max().alias("date_last_sale"),
            ])
            .collect()?;

        let first = df.column("date_first_sale")?.cast(&DataType::Int64)?;
        let last = df.column("date_last_sale")?.cast(&DataType::Int64)?;
        let active_months: Vec<Option<i64>> = first
            .i64()?
            .into_iter()
            .zip(last.i64()?)
            .map(|(first, last)| match (first.and_then(naive), last.and_then(naive)) {
                (Some(first), Some(last)) => Some(whole_months_between(first, last) + 1),
                _ => None,
            })
            .collect();

        df.with_column(Series::new("active_months".into(), active_months))?;
        Ok(df)
    }

    /// `[seller_id, share_of_five_stars, share_of_one_stars, review_score]`.
    pub fn review_score(&self) -> Result<DataFrame> {
        let reviews = self.orders.review_score()?.lazy();

        let df = join_on(self.pairs(), reviews, "order_id", JoinType::Inner)
            .group_by([col("seller_id")])
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
        Ok(df)
    }

    /// `[seller_id, n_orders, quantity, quantity_per_order]`.
    ///
    /// Sellers without any identified order are left out instead of dividing by zero,
    /// and so are items without a seller.
    pub fn quantity(&self) -> Result<DataFrame> {
        let df = self
            .items()?
            .group_by([col("seller_id")])
            .agg([
                col("order_id")
                    .drop_nulls()
                    .n_unique()
                    .cast(DataType::Int64)
                    .alias("n_orders"),
                len().cast(DataType::Int64).alias("quantity"),
            ])
            .filter(col("n_orders").cast(DataType::Float64).gt(lit(0.0)))
            .with_column(
                (col("quantity").cast(DataType::Float64) / col("n_orders").cast(DataType::Float64))
                    .alias("quantity_per_order"),
            )
            .collect()?;
        Ok(df)
    }

    /// `[seller_id, sales]`, total item price.
    pub fn sales(&self) -> Result<DataFrame> {
        let df = self
            .items()?
            .group_by([col("seller_id")])
            .agg([col("price").sum().alias("sales")])
            .collect()?;
        Ok(df)
    }

    /// `[seller_id, costs]`: review costs plus the seller's share of the platform IT cost.
    ///
    /// Sellers without reviews have no review cost row and are left out.
    pub fn costs(&self) -> Result<DataFrame> {
        let reviews = self
            .orders
            .review_score()?
            .lazy()
            .select([col("order_id"), col("review_score")]);

        let review_costs = join_on(self.pairs(), reviews, "order_id", JoinType::Inner)
            .with_column(
                review_cost("review_score", &self.cost_model.seller_review_costs)
                    .alias("review_costs"),
            )
            .group_by([col("seller_id")])
            .agg([col("review_costs").sum()]);

        let mut it_costs = self
            .quantity()?
            .select(["seller_id", "n_orders"])?;
        let allocation = allocate_platform_cost(
            self.cost_model.platform_it_cost,
            it_costs.column("n_orders")?.i64()?,
        );
        it_costs.with_column(Series::new("it_costs".into(), allocation))?;

        let df = join_on(review_costs, it_costs.lazy(), "seller_id", JoinType::Inner)
            .select([
                col("seller_id"),
                (col("review_costs") + col("it_costs")).alias("costs"),
            ])
            .collect()?;

        debug!(rows = df.height(), "computed seller costs");
        Ok(df)
    }

    /// `[seller_id, revenues]`: commission on sales plus the monthly subscription.
    pub fn revenues(&self) -> Result<DataFrame> {
        let months = self
            .active_dates()?
            .lazy()
            .select([col("seller_id"), col("active_months")]);

        let df = join_on(self.sales()?.lazy(), months, "seller_id", JoinType::Inner)
            .select([
                col("seller_id"),
                (col("sales") * lit(self.cost_model.commission_rate)
                    + col("active_months").cast(DataType::Float64)
                        * lit(self.cost_model.seller_subscription_per_month))
                .alias("revenues"),
            ])
            .collect()?;
        Ok(df)
    }

    /// `[seller_id, profits]`, with revenues and costs matched on `seller_id`.
    pub fn profits(&self) -> Result<DataFrame> {
        let df = join_on(
            self.revenues()?.lazy(),
            self.costs()?.lazy(),
            "seller_id",
            JoinType::Inner,
        )
        .select([
            col("seller_id"),
            (col("revenues") - col("costs")).alias("profits"),
        ])
        .collect()?;
        Ok(df)
    }

    /// Every seller metric inner-joined on `seller_id`, without rows holding nulls.
    pub fn training_data(&self) -> Result<DataFrame> {
        let frames = vec![
            self.features()?,
            self.delay_and_wait_time()?,
            self.active_dates()?,
            self.review_score()?,
            self.costs()?,
            self.revenues()?,
            self.profits()?,
            self.quantity()?,
            self.sales()?,
        ];

        let training = merge_all(frames, "seller_id").drop_nulls(None);
        let df = sort_by_key(training, "seller_id").collect()?;

        info!(rows = df.height(), "computed seller training data");
        Ok(df)
    }

    fn pairs(&self) -> LazyFrame {
        order_pairs(&self.matching, "seller_id")
    }

    /// Line items attributed to a seller.
    fn items(&self) -> Result<LazyFrame> {
        Ok(self
            .data
            .lazy(ORDER_ITEMS)?
            .filter(col("seller_id").is_not_null()))
    }
}

fn naive(micros: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}

/// Calendar months elapsed from `first` to `last`; a month only counts once the same
/// day and time of day has been reached.
fn whole_months_between(first: NaiveDateTime, last: NaiveDateTime) -> i64 {
    let mut months = i64::from(last.year() - first.year()) * 12 + i64::from(last.month())
        - i64::from(first.month());
    if (last.day(), last.time()) < (first.day(), first.time()) {
        months -= 1;
    }
    months.max(0)
}

/// Splits `total` across sellers proportionally to `sqrt(n_orders)`.
fn allocate_platform_cost(total: f64, n_orders: &Int64Chunked) -> Vec<Option<f64>> {
    let weights: Vec<Option<f64>> = n_orders
        .into_iter()
        .map(|n| n.map(|n| (n as f64).sqrt()))
        .collect();
    let weight_sum: f64 = weights.iter().flatten().sum();

    weights
        .into_iter()
        .map(|weight| {
            weight.map(|weight| {
                if weight_sum > 0.0 {
                    total * weight / weight_sum
                } else {
                    0.0
                }
            })
        })
        .collect()
}
