use polars::prelude::*;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// One `(lat, lng)` per value of `key`; the first geolocation row in input order wins.
pub(crate) fn first_location_by(geolocation: LazyFrame, key: &str) -> LazyFrame {
    geolocation
        .filter(col(key).is_not_null())
        .group_by_stable([col(key)])
        .agg([
            col("geolocation_lat").first().alias("lat"),
            col("geolocation_lng").first().alias("lng"),
        ])
}

/// Great-circle distance in kilometres between two points given in degrees.
pub(crate) fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (lat1, lng1, lat2, lng2) = (
        lat1.to_radians(),
        lng1.to_radians(),
        lat2.to_radians(),
        lng2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}
