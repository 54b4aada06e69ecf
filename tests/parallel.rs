//! Tests for the rayon-backed neighbor queries (feature `parallel`)

use poi_cluster::geo_utils::offset_km;
use poi_cluster::{
    ClusterEngine, ClusterStrategy, DensityClusterer, NOISE, PoiPoint, StrategyKind,
    ThresholdClusterer,
};

/// Four rings of 50 POIs, 0.5 km radius, 20 km apart.
fn rings() -> Vec<PoiPoint> {
    (0..4)
        .flat_map(|r| {
            let (clat, clng) = offset_km(-37.8136, 144.9631, 0.0, r as f64 * 20.0);
            (0..50).map(move |i| {
                let angle = i as f64 * std::f64::consts::TAU / 50.0;
                let (lat, lng) = offset_km(clat, clng, 0.5 * angle.sin(), 0.5 * angle.cos());
                PoiPoint::new(format!("r{r}_{i}"), format!("Ring {r} POI {i}"), lat, lng)
            })
        })
        .collect()
}

#[test]
fn test_parallel_threshold_labels() {
    let points = rings();
    let labels = ThresholdClusterer::default().cluster(&points);

    let expected: Vec<i32> = (0..4).flat_map(|r| std::iter::repeat(r).take(50)).collect();
    assert_eq!(labels.as_slice(), expected.as_slice());
}

#[test]
fn test_parallel_density_finds_every_ring() {
    let points = rings();
    let labels = DensityClusterer::default().cluster(&points);
    let l = labels.as_slice();

    assert_eq!(labels.cluster_count(), 4);
    for ring in l.chunks(50) {
        assert!(ring.iter().all(|&x| x == ring[0] && x != NOISE));
    }
}

#[test]
fn test_parallel_engine_deterministic() {
    let points = rings();
    let engine = ClusterEngine::default();

    let first = engine.run(points.clone());
    assert_eq!(first.strategy, Some(StrategyKind::Density));
    assert_eq!(first.clusters.len(), 4);
    for _ in 0..3 {
        assert_eq!(engine.run(points.clone()), first);
    }
}
