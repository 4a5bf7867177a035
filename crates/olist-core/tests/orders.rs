mod common;

use anyhow::Result;
use olist_core::{MetricsError, OrderMetrics, OrderOptions};
use olist_data::DataError;
use polars::prelude::*;

use common::{assert_close, delivered_orders, fixture_tables, items, keys, reviews, tables, value};

#[test]
fn wait_time_for_early_delivery() -> Result<()> {
    let orders = OrderMetrics::new(fixture_tables());
    let df = orders.wait_time()?;

    // o1: bought 2018-01-01, delivered 01-05, promised 01-10.
    assert_close(value(&df, "order_id", "o1", "wait_time"), 4.0);
    assert_close(value(&df, "order_id", "o1", "expected_wait_time"), 9.0);
    assert_close(value(&df, "order_id", "o1", "delay_vs_expected"), 0.0);

    // o2 arrived two days after the estimate.
    assert_close(value(&df, "order_id", "o2", "delay_vs_expected"), 2.0);

    // o4 is still in transit.
    assert_eq!(keys(&df, "order_id"), vec!["o1", "o2", "o3", "o5"]);

    let delays = df.column("delay_vs_expected")?.f64()?;
    assert!(delays.into_iter().flatten().all(|delay| delay >= 0.0));
    Ok(())
}

#[test]
fn wait_time_can_include_undelivered_orders() -> Result<()> {
    let options = OrderOptions {
        delivered_only: false,
        ..OrderOptions::default()
    };
    let orders = OrderMetrics::with_options(fixture_tables(), options);
    let df = orders.wait_time()?;

    assert_eq!(df.height(), 5);
    assert_eq!(value(&df, "order_id", "o4", "wait_time"), None);
    assert_close(value(&df, "order_id", "o4", "expected_wait_time"), 19.0);
    Ok(())
}

#[test]
fn review_flags_are_mutually_exclusive() -> Result<()> {
    let df = OrderMetrics::new(fixture_tables()).review_score()?;

    assert_eq!(
        df.get_column_names_str(),
        &["order_id", "dim_is_five_star", "dim_is_one_star", "review_score"]
    );

    let five = df.column("dim_is_five_star")?.i64()?;
    let one = df.column("dim_is_one_star")?.i64()?;
    for (five, one) in five.into_iter().zip(one) {
        assert!(five.unwrap() + one.unwrap() <= 1);
    }

    assert_close(value(&df, "order_id", "o1", "dim_is_five_star"), 1.0);
    assert_close(value(&df, "order_id", "o2", "dim_is_one_star"), 1.0);
    assert_close(value(&df, "order_id", "o4", "dim_is_five_star"), 0.0);
    assert_close(value(&df, "order_id", "o4", "dim_is_one_star"), 0.0);
    Ok(())
}

#[test]
fn basket_composition_and_value() -> Result<()> {
    let orders = OrderMetrics::new(fixture_tables());

    let products = orders.number_of_products()?;
    assert_close(value(&products, "order_id", "o1", "number_of_products"), 3.0);
    assert_close(value(&products, "order_id", "o2", "number_of_products"), 1.0);

    let sellers = orders.number_of_sellers()?;
    assert_close(value(&sellers, "order_id", "o1", "number_of_sellers"), 2.0);

    let totals = orders.price_and_freight()?;
    assert_close(value(&totals, "order_id", "o1", "price"), 250.0);
    assert_close(value(&totals, "order_id", "o1", "freight_value"), 25.0);
    Ok(())
}

#[test]
fn number_of_products_ignores_numbering_gaps() -> Result<()> {
    let mut line_items = items(&[("o1", "p1", "s1", 10.0), ("o1", "p2", "s1", 20.0)]);
    line_items.with_column(Series::new("order_item_id".into(), &[1i64, 3]))?;

    let raw = tables(
        delivered_orders(&["o1"], &["2018-01-01 00:00:00"]),
        line_items,
        reviews(&[("r1", "o1", 4)]),
    );
    let df = OrderMetrics::new(raw).number_of_products()?;

    assert_close(value(&df, "order_id", "o1", "number_of_products"), 2.0);
    Ok(())
}

#[test]
fn training_data_keeps_fully_described_orders() -> Result<()> {
    let df = OrderMetrics::new(fixture_tables()).training_data()?;

    assert_eq!(
        df.get_column_names_str(),
        &[
            "order_id",
            "wait_time",
            "expected_wait_time",
            "delay_vs_expected",
            "order_status",
            "dim_is_five_star",
            "dim_is_one_star",
            "review_score",
            "number_of_products",
            "number_of_sellers",
            "price",
            "freight_value",
        ]
    );
    // o4 is undelivered, o5 has no review.
    assert_eq!(keys(&df, "order_id"), vec!["o1", "o2", "o3"]);
    for column in df.get_columns() {
        assert_eq!(column.null_count(), 0, "{} has nulls", column.name());
    }
    Ok(())
}

#[test]
fn training_data_is_idempotent() -> Result<()> {
    let orders = OrderMetrics::new(fixture_tables());
    let first = orders.training_data()?;
    let second = orders.training_data()?;

    assert!(first.equals_missing(&second));
    Ok(())
}

#[test]
fn distance_to_customer_is_averaged_over_items() -> Result<()> {
    let options = OrderOptions {
        with_distance_seller_customer: true,
        ..OrderOptions::default()
    };
    let df = OrderMetrics::with_options(fixture_tables(), options).training_data()?;

    // o1 ships two items from Campinas and one from the customer's own zip prefix.
    let campinas_to_sao_paulo = 85.537_435_603;
    let distance = value(&df, "order_id", "o1", "distance_seller_customer").unwrap();
    assert!((distance - 2.0 * campinas_to_sao_paulo / 3.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn distance_requires_location_tables() {
    let raw = tables(
        delivered_orders(&["o1"], &["2018-01-01 00:00:00"]),
        items(&[("o1", "p1", "s1", 10.0)]),
        reviews(&[("r1", "o1", 4)]),
    );

    let err = OrderMetrics::new(raw).distance_seller_customer().unwrap_err();
    assert!(matches!(
        err,
        MetricsError::Data(DataError::MissingTable { .. })
    ));
}
