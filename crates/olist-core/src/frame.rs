use polars::prelude::*;

use crate::config::ReviewCostTable;

const MICROS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1_000_000.0;

pub(crate) const DELIVERED: &str = "delivered";

/// `end - start` in fractional days. Both columns are `Datetime(µs)` after ingestion.
pub(crate) fn days_between(end: &str, start: &str) -> Expr {
    (col(end).cast(DataType::Int64) - col(start).cast(DataType::Int64)).cast(DataType::Float64)
        / lit(MICROS_PER_DAY)
}

/// Negative values become zero, nulls stay null.
pub(crate) fn non_negative(expr: Expr) -> Expr {
    when(expr.clone().lt(lit(0.0)))
        .then(lit(0.0))
        .otherwise(expr)
}

/// `1` when the score equals `stars`, `0` otherwise. The comparison runs in `Float64`;
/// integer literals compared against `Int64` columns get widened to `Int128`.
pub(crate) fn star_indicator(score: &str, stars: i64) -> Expr {
    when(col(score).cast(DataType::Float64).eq(lit(stars as f64)))
        .then(lit(1i64))
        .otherwise(lit(0i64))
}

pub(crate) fn review_cost(score: &str, table: &ReviewCostTable) -> Expr {
    let score = col(score).cast(DataType::Float64);
    when(score.clone().lt_eq(lit(2.0)))
        .then(lit(table.one_or_two_star_base) / score.clone())
        .when(score.eq(lit(3.0)))
        .then(lit(table.three_star))
        .otherwise(lit(0.0))
}

pub(crate) fn join_on(left: LazyFrame, right: LazyFrame, key: &str, how: JoinType) -> LazyFrame {
    left.join(right, [col(key)], [col(key)], JoinArgs::new(how))
}

/// Inner-joins every frame on `key`, left to right.
pub(crate) fn merge_all(frames: Vec<DataFrame>, key: &str) -> LazyFrame {
    let mut frames = frames.into_iter();
    let first = frames
        .next()
        .map(DataFrame::lazy)
        .unwrap_or_else(|| DataFrame::default().lazy());
    frames.fold(first, |merged, frame| {
        join_on(merged, frame.lazy(), key, JoinType::Inner)
    })
}

/// Distinct `(order_id, <entity>)` pairs from the matching table, in first-seen order.
pub(crate) fn order_pairs(matching: &DataFrame, entity: &str) -> LazyFrame {
    matching
        .clone()
        .lazy()
        .select([col("order_id"), col(entity)])
        .filter(col("order_id").is_not_null().and(col(entity).is_not_null()))
        .unique_stable(None, UniqueKeepStrategy::First)
}

/// Stable sort by the entity key so repeated runs produce identical tables.
pub(crate) fn sort_by_key(frame: LazyFrame, key: &str) -> LazyFrame {
    frame.sort([key], SortMultipleOptions::default().with_maintain_order(true))
}
