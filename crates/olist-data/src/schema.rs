//! Canonical table names and the columns each raw extract must carry.

pub const ORDERS: &str = "orders";
pub const ORDER_ITEMS: &str = "order_items";
pub const ORDER_REVIEWS: &str = "order_reviews";
pub const PRODUCTS: &str = "products";
pub const SELLERS: &str = "sellers";
pub const GEOLOCATION: &str = "geolocation";
pub const CATEGORY_TRANSLATION: &str = "product_category_name_translation";
pub const CUSTOMERS: &str = "customers";

/// Text timestamps in the extracts use this layout.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub timestamps: &'static [&'static str],
    pub floats: &'static [&'static str],
    pub integers: &'static [&'static str],
}

pub const TABLE_SCHEMAS: &[TableSchema] = &[
    TableSchema {
        name: ORDERS,
        columns: &[
            "order_id",
            "customer_id",
            "order_status",
            "order_purchase_timestamp",
            "order_approved_at",
            "order_delivered_carrier_date",
            "order_delivered_customer_date",
            "order_estimated_delivery_date",
        ],
        timestamps: &[
            "order_purchase_timestamp",
            "order_approved_at",
            "order_delivered_carrier_date",
            "order_delivered_customer_date",
            "order_estimated_delivery_date",
        ],
        floats: &[],
        integers: &[],
    },
    TableSchema {
        name: ORDER_ITEMS,
        columns: &[
            "order_id",
            "order_item_id",
            "product_id",
            "seller_id",
            "shipping_limit_date",
            "price",
            "freight_value",
        ],
        timestamps: &["shipping_limit_date"],
        floats: &["price", "freight_value"],
        integers: &["order_item_id"],
    },
    TableSchema {
        name: ORDER_REVIEWS,
        columns: &["review_id", "order_id", "review_score"],
        timestamps: &[],
        floats: &[],
        integers: &["review_score"],
    },
    TableSchema {
        name: PRODUCTS,
        columns: &[
            "product_id",
            "product_category_name",
            "product_name_lenght",
            "product_description_lenght",
            "product_photos_qty",
            "product_weight_g",
            "product_length_cm",
            "product_height_cm",
            "product_width_cm",
        ],
        timestamps: &[],
        floats: &[],
        integers: &[],
    },
    TableSchema {
        name: SELLERS,
        columns: &[
            "seller_id",
            "seller_zip_code_prefix",
            "seller_city",
            "seller_state",
        ],
        timestamps: &[],
        floats: &[],
        integers: &["seller_zip_code_prefix"],
    },
    TableSchema {
        name: GEOLOCATION,
        columns: &[
            "geolocation_zip_code_prefix",
            "geolocation_lat",
            "geolocation_lng",
            "geolocation_city",
        ],
        timestamps: &[],
        floats: &["geolocation_lat", "geolocation_lng"],
        integers: &["geolocation_zip_code_prefix"],
    },
    TableSchema {
        name: CATEGORY_TRANSLATION,
        columns: &["product_category_name", "product_category_name_english"],
        timestamps: &[],
        floats: &[],
        integers: &[],
    },
    TableSchema {
        name: CUSTOMERS,
        columns: &["customer_id", "customer_zip_code_prefix"],
        timestamps: &[],
        floats: &[],
        integers: &["customer_zip_code_prefix"],
    },
];

pub fn table_schema(name: &str) -> Option<&'static TableSchema> {
    TABLE_SCHEMAS.iter().find(|schema| schema.name == name)
}
