use std::collections::HashMap;

use polars::prelude::*;
use tracing::debug;

use crate::errors::DataError;
use crate::schema::{
    table_schema, TableSchema, ORDERS, ORDER_ITEMS, ORDER_REVIEWS, TIMESTAMP_FORMAT,
};

/// Immutable snapshot of the raw marketplace extracts, keyed by table name.
///
/// Tables with a known schema are validated and normalised on construction:
/// required columns must exist, timestamp columns become `Datetime(µs)` and
/// review scores are checked against the 1..=5 range. Unknown tables are kept
/// as supplied.
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    tables: HashMap<String, DataFrame>,
}

impl RawTables {
    pub fn new(tables: HashMap<String, DataFrame>) -> Result<Self, DataError> {
        let mut normalised = HashMap::with_capacity(tables.len());

        for (name, df) in tables {
            let df = match table_schema(&name) {
                Some(schema) => normalise_table(schema, df)?,
                None => {
                    debug!(table = %name, "keeping raw table without a known schema");
                    df
                }
            };
            normalised.insert(name, df);
        }

        Ok(Self { tables: normalised })
    }

    pub fn table(&self, name: &str) -> Result<&DataFrame, DataError> {
        self.tables.get(name).ok_or_else(|| DataError::MissingTable {
            table: name.to_string(),
        })
    }

    pub fn lazy(&self, name: &str) -> Result<LazyFrame, DataError> {
        Ok(self.table(name)?.clone().lazy())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Flattens orders, reviews and items into one
    /// `[order_id, review_id, customer_id, product_id, seller_id]` relation.
    ///
    /// Both joins are full outer joins on `order_id`, so an order that only
    /// exists in one of the three tables still shows up with nulls elsewhere.
    pub fn matching_table(&self) -> Result<DataFrame, DataError> {
        let orders = self
            .lazy(ORDERS)?
            .select([col("customer_id"), col("order_id")]);
        let reviews = self
            .lazy(ORDER_REVIEWS)?
            .select([col("order_id"), col("review_id")]);
        let items = self
            .lazy(ORDER_ITEMS)?
            .select([col("order_id"), col("product_id"), col("seller_id")]);

        let outer = JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns);

        let matching = orders
            .join(
                reviews,
                [col("order_id")],
                [col("order_id")],
                outer.clone(),
            )
            .join(items, [col("order_id")], [col("order_id")], outer)
            .select([
                col("order_id"),
                col("review_id"),
                col("customer_id"),
                col("product_id"),
                col("seller_id"),
            ])
            .collect()?;

        debug!(rows = matching.height(), "built matching table");
        Ok(matching)
    }
}

fn normalise_table(schema: &TableSchema, mut df: DataFrame) -> Result<DataFrame, DataError> {
    for column in schema.columns {
        if df.get_column_index(column).is_none() {
            return Err(DataError::MissingColumn {
                table: schema.name.to_string(),
                column,
            });
        }
    }

    for column in schema.timestamps {
        normalise_timestamp(schema.name, &mut df, column)?;
    }
    for column in schema.floats {
        cast_in_place(&mut df, column, DataType::Float64)?;
    }
    for column in schema.integers {
        cast_in_place(&mut df, column, DataType::Int64)?;
    }

    if schema.name == ORDER_REVIEWS {
        validate_review_scores(&df)?;
    }

    Ok(df)
}

fn normalise_timestamp(
    table: &str,
    df: &mut DataFrame,
    column: &'static str,
) -> Result<(), DataError> {
    let target = DataType::Datetime(TimeUnit::Microseconds, None);
    let source_dtype = df.column(column)?.dtype().clone();
    if source_dtype == target {
        return Ok(());
    }

    let expr = match source_dtype {
        DataType::String => col(column).str().to_datetime(
            Some(TimeUnit::Microseconds),
            None,
            StrptimeOptions {
                format: Some(TIMESTAMP_FORMAT.into()),
                strict: true,
                exact: true,
                cache: true,
            },
            lit("raise"),
        ),
        _ => col(column).cast(target),
    };

    let parsed = df
        .clone()
        .lazy()
        .select([expr])
        .collect()
        .map_err(|source| DataError::InvalidTimestamp {
            table: table.to_string(),
            column,
            source,
        })?;

    df.with_column(parsed.column(column)?.clone())?;
    Ok(())
}

fn cast_in_place(df: &mut DataFrame, column: &str, dtype: DataType) -> Result<(), DataError> {
    let cast = df.column(column)?.cast(&dtype)?;
    df.with_column(cast)?;
    Ok(())
}

fn validate_review_scores(df: &DataFrame) -> Result<(), DataError> {
    let scores = df.column("review_score")?.i64()?;
    let review_ids = df.column("review_id")?.cast(&DataType::String)?;
    let review_ids = review_ids.str()?;

    let invalid = scores
        .into_iter()
        .zip(review_ids)
        .find(|(score, _)| !matches!(score, Some(1..=5)));

    if let Some((score, review_id)) = invalid {
        return Err(DataError::InvalidReviewScore {
            review_id: review_id.unwrap_or("<null>").to_string(),
            score,
        });
    }

    Ok(())
}
