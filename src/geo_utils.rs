//! Geographic utilities: great-circle distance, bounds, and centers.

use crate::PoiPoint;

/// Mean Earth radius in kilometers used by every distance in the crate.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude on the 6371 km sphere.
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

/// Haversine distance in kilometers between two coordinates given in degrees.
///
/// Symmetric in its arguments and exactly zero for identical coordinates.
/// NaN inputs propagate; validate batches before clustering.
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (lng2 - lng1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    // Rounding can push `a` just past 1 for antipodal points
    2.0 * EARTH_RADIUS_KM * a.min(1.0).sqrt().asin()
}

/// Haversine distance in kilometers between two POIs.
#[inline]
pub fn haversine_km(p1: &PoiPoint, p2: &PoiPoint) -> f64 {
    distance_km(p1.lat, p1.lng, p2.lat, p2.lng)
}

/// Compute `(min_lat, max_lat, min_lng, max_lng)` for a set of POIs.
///
/// Returns the inverted infinities for an empty slice.
pub fn compute_bounds_tuple(points: &[PoiPoint]) -> (f64, f64, f64, f64) {
    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for p in points {
        min_lat = min_lat.min(p.lat);
        max_lat = max_lat.max(p.lat);
        min_lng = min_lng.min(p.lng);
        max_lng = max_lng.max(p.lng);
    }

    (min_lat, max_lat, min_lng, max_lng)
}

/// Mean latitude and longitude of a set of POIs. `(0, 0)` when empty.
///
/// Suitable for city-scale clusters; does not handle the antimeridian.
pub fn compute_center(points: &[PoiPoint]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
    let lng = points.iter().map(|p| p.lng).sum::<f64>() / n;
    (lat, lng)
}

/// Convert a distance in kilometers to degrees of longitude at a latitude.
///
/// Longitude degrees shrink towards the poles, so the same distance covers
/// more degrees at higher latitude.
pub fn km_to_degrees(km: f64, latitude: f64) -> f64 {
    let cos_lat = latitude.to_radians().cos().max(1e-6);
    km / (KM_PER_DEGREE * cos_lat)
}

/// Offset a coordinate by kilometers north and east (flat-earth approximation).
pub fn offset_km(lat: f64, lng: f64, north_km: f64, east_km: f64) -> (f64, f64) {
    let new_lat = lat + north_km / KM_PER_DEGREE;
    let new_lng = lng + km_to_degrees(east_km, lat);
    (new_lat, new_lng)
}
