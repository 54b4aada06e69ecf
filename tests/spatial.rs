//! Tests for spatial module

use poi_cluster::geo_utils::{distance_km, offset_km};
use poi_cluster::spatial::{PoiIndex, chord_for_km, to_unit_vector};
use poi_cluster::PoiPoint;

fn line_of_pois(count: usize, step_km: f64) -> Vec<PoiPoint> {
    (0..count)
        .map(|i| {
            let (lat, lng) = offset_km(52.52, 13.405, i as f64 * step_km, 0.0);
            PoiPoint::new(format!("p{i}"), format!("POI {i}"), lat, lng)
        })
        .collect()
}

#[test]
fn test_unit_vector_length() {
    for (lat, lng) in [(0.0, 0.0), (45.0, 90.0), (-60.0, -120.0), (90.0, 0.0)] {
        let v = to_unit_vector(lat, lng);
        let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-12);
    }
}

#[test]
fn test_chord_matches_vector_distance() {
    let a = to_unit_vector(10.0, 20.0);
    let b = to_unit_vector(10.5, 20.5);
    let chord = ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt();
    let km = distance_km(10.0, 20.0, 10.5, 20.5);
    assert!((chord_for_km(km) - chord).abs() < 1e-9);
}

#[test]
fn test_within_km_includes_self_and_sorted() {
    let points = line_of_pois(6, 1.0);
    let index = PoiIndex::build(&points);

    assert_eq!(index.len(), 6);
    assert_eq!(index.within_km(2, 1.5), vec![1, 2, 3]);
    assert_eq!(index.within_km(0, 0.5), vec![0]);
    assert_eq!(index.within_km(5, 100.0), vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_k_nearest_ordered_by_distance() {
    let points = line_of_pois(6, 1.0);
    let index = PoiIndex::build(&points);

    let neighbors = index.k_nearest(0, 3);
    let ids: Vec<usize> = neighbors.iter().map(|n| n.idx).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(neighbors[0].distance_km, 0.0);
    assert!((neighbors[2].distance_km - 2.0).abs() < 1e-6);
}

#[test]
fn test_k_nearest_ties_break_by_index() {
    // Point 2 sits between 1 and 3, both 1 km away
    let points = line_of_pois(5, 1.0);
    let index = PoiIndex::build(&points);

    let neighbors = index.k_nearest(2, 2);
    assert_eq!(neighbors[0].idx, 2);
    assert!(neighbors[1].idx == 1 || neighbors[1].idx == 3);

    let neighbors = index.k_nearest(2, 3);
    let mut ids: Vec<usize> = neighbors.iter().map(|n| n.idx).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_k_nearest_clamps_to_batch() {
    let points = line_of_pois(3, 1.0);
    let index = PoiIndex::build(&points);
    assert_eq!(index.k_nearest(1, 10).len(), 3);
    assert!(index.k_nearest(1, 0).is_empty());
}

#[test]
fn test_neighbors_across_antimeridian() {
    let points = vec![
        PoiPoint::new("fiji-w", "West", -17.0, 179.99),
        PoiPoint::new("fiji-e", "East", -17.0, -179.99),
        PoiPoint::new("far", "Far", -17.0, 170.0),
    ];
    let index = PoiIndex::build(&points);
    assert_eq!(index.within_km(0, 5.0), vec![0, 1]);
    assert_eq!(index.k_nearest(0, 2)[1].idx, 1);
}

#[test]
fn test_non_finite_points_are_isolated() {
    let mut points = line_of_pois(4, 1.0);
    points[1].lat = f64::NAN;
    points.push(PoiPoint::new("inf", "Inf", 52.52, f64::INFINITY));
    let index = PoiIndex::build(&points);

    assert!(!index.is_indexed(1));
    assert!(!index.is_indexed(4));
    assert!(index.is_indexed(0));

    assert_eq!(index.within_km(1, 100.0), vec![1]);
    assert_eq!(index.within_km(0, 100.0), vec![0, 2, 3]);
    assert_eq!(index.distance(0, 1), f64::INFINITY);

    let neighbors = index.k_nearest(4, 3);
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].idx, 4);

    let ids: Vec<usize> = index.k_nearest(0, 10).iter().map(|n| n.idx).collect();
    assert_eq!(ids, vec![0, 2, 3]);
}
