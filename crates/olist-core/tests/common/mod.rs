#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;

use olist_data::schema::{ORDERS, ORDER_ITEMS, ORDER_REVIEWS};
use olist_data::{load_csv_dir, RawTables};
use polars::prelude::*;

pub fn fixture_tables() -> RawTables {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../olist-data/tests/data/csv");
    load_csv_dir(dir).expect("failed to load csv fixtures")
}

/// Delivered orders with the given approval timestamps and otherwise identical timings.
pub fn delivered_orders(ids: &[&str], approved: &[&str]) -> DataFrame {
    let n = ids.len();
    df!(
        "order_id" => ids,
        "customer_id" => ids.iter().map(|id| format!("c_{id}")).collect::<Vec<_>>(),
        "order_status" => vec!["delivered"; n],
        "order_purchase_timestamp" => approved,
        "order_approved_at" => approved,
        "order_delivered_carrier_date" => approved,
        "order_delivered_customer_date" => approved,
        "order_estimated_delivery_date" => approved,
    )
    .expect("orders frame")
}

/// Line items as `(order_id, product_id, seller_id, price)`; item ids restart at 1 per order.
pub fn items(rows: &[(&str, &str, &str, f64)]) -> DataFrame {
    let mut item_ids = Vec::with_capacity(rows.len());
    let mut seen: HashMap<&str, i64> = HashMap::new();
    for (order_id, _, _, _) in rows {
        let next = seen.entry(*order_id).or_insert(0);
        *next += 1;
        item_ids.push(*next);
    }

    df!(
        "order_id" => rows.iter().map(|r| r.0).collect::<Vec<_>>(),
        "order_item_id" => item_ids,
        "product_id" => rows.iter().map(|r| r.1).collect::<Vec<_>>(),
        "seller_id" => rows.iter().map(|r| r.2).collect::<Vec<_>>(),
        "shipping_limit_date" => vec!["2017-01-01 00:00:00"; rows.len()],
        "price" => rows.iter().map(|r| r.3).collect::<Vec<_>>(),
        "freight_value" => vec![1.0f64; rows.len()],
    )
    .expect("items frame")
}

/// Line items with possibly missing `(order_id, product_id, seller_id)` keys, one per order.
pub fn items_with_missing_keys(
    rows: &[(Option<&str>, Option<&str>, Option<&str>, f64)],
) -> DataFrame {
    df!(
        "order_id" => rows.iter().map(|r| r.0).collect::<Vec<_>>(),
        "order_item_id" => vec![1i64; rows.len()],
        "product_id" => rows.iter().map(|r| r.1).collect::<Vec<_>>(),
        "seller_id" => rows.iter().map(|r| r.2).collect::<Vec<_>>(),
        "shipping_limit_date" => vec!["2017-01-01 00:00:00"; rows.len()],
        "price" => rows.iter().map(|r| r.3).collect::<Vec<_>>(),
        "freight_value" => vec![1.0f64; rows.len()],
    )
    .expect("items frame")
}

/// Reviews as `(review_id, order_id, review_score)`.
pub fn reviews(rows: &[(&str, &str, i64)]) -> DataFrame {
    df!(
        "review_id" => rows.iter().map(|r| r.0).collect::<Vec<_>>(),
        "order_id" => rows.iter().map(|r| r.1).collect::<Vec<_>>(),
        "review_score" => rows.iter().map(|r| r.2).collect::<Vec<_>>(),
    )
    .expect("reviews frame")
}

pub fn tables(orders: DataFrame, items: DataFrame, reviews: DataFrame) -> RawTables {
    RawTables::new(HashMap::from([
        (ORDERS.to_string(), orders),
        (ORDER_ITEMS.to_string(), items),
        (ORDER_REVIEWS.to_string(), reviews),
    ]))
    .expect("valid raw tables")
}

/// Value of `column` on the row whose `key` column equals `id`, as f64.
pub fn value(df: &DataFrame, key: &str, id: &str, column: &str) -> Option<f64> {
    let ids = df.column(key).unwrap().str().unwrap();
    let idx = ids.into_iter().position(|value| value == Some(id))?;
    let values = df.column(column).unwrap().cast(&DataType::Float64).unwrap();
    values.f64().unwrap().get(idx)
}

pub fn keys(df: &DataFrame, key: &str) -> Vec<String> {
    df.column(key)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|value| value.unwrap_or_default().to_string())
        .collect()
}

pub fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("value present");
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
