//! Tests for the clustering strategies through their shared trait

use poi_cluster::geo_utils::offset_km;
use poi_cluster::strategy::scaled_min_cluster_size;
use poi_cluster::{
    ClusterConfig, ClusterStrategy, DensityClusterer, NOISE, NeighborChainClusterer, PoiPoint,
    Strategy, StrategyKind, ThresholdClusterer,
};

fn poi(i: usize, lat: f64, lng: f64) -> PoiPoint {
    PoiPoint::new(format!("p{i}"), format!("POI {i}"), lat, lng)
}

/// Points walking east from a start, `step_km` apart.
fn walk(count: usize, lat: f64, lng: f64, step_km: f64) -> Vec<PoiPoint> {
    (0..count)
        .map(|i| {
            let (plat, plng) = offset_km(lat, lng, 0.0, i as f64 * step_km);
            poi(i, plat, plng)
        })
        .collect()
}

#[test]
fn test_min_points_per_strategy() {
    assert_eq!(DensityClusterer::default().min_points(), 3);
    assert_eq!(ThresholdClusterer::default().min_points(), 2);
    assert_eq!(NeighborChainClusterer::default().min_points(), 1);
}

#[test]
fn test_noise_policy_per_strategy() {
    assert!(DensityClusterer::default().emits_noise());
    assert!(ThresholdClusterer::default().emits_noise());
    assert!(!NeighborChainClusterer::default().emits_noise());
}

#[test]
fn test_scaled_min_cluster_size_grows_with_batch() {
    assert_eq!(scaled_min_cluster_size(5), 2);
    assert_eq!(scaled_min_cluster_size(30), 3);
    assert_eq!(scaled_min_cluster_size(500), 10);
}

#[test]
fn test_default_chain_order() {
    let chain = Strategy::chain(&ClusterConfig::default());
    let kinds: Vec<StrategyKind> = chain.iter().map(|s| s.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            StrategyKind::Density,
            StrategyKind::Threshold,
            StrategyKind::NeighborChain
        ]
    );
}

#[test]
fn test_chain_uses_config_values() {
    let config = ClusterConfig {
        threshold_radius_km: 0.5,
        strategies: vec![StrategyKind::Threshold],
        ..Default::default()
    };
    let chain = Strategy::chain(&config);
    assert_eq!(chain.len(), 2);
    match &chain[0] {
        Strategy::Threshold(t) => assert_eq!(t.radius_km(), 0.5),
        other => panic!("unexpected first strategy {other:?}"),
    }
}

#[test]
fn test_labels_cover_every_point() {
    let points = walk(12, 45.4642, 9.19, 0.7);
    let strategies: Vec<Box<dyn ClusterStrategy>> = vec![
        Box::new(DensityClusterer::default()),
        Box::new(ThresholdClusterer::default()),
        Box::new(NeighborChainClusterer::default()),
    ];

    for strategy in &strategies {
        let labels = strategy.cluster(&points);
        assert_eq!(labels.len(), points.len(), "{} strategy", strategy.kind());
        assert!(labels.as_slice().iter().all(|&l| l >= NOISE));
    }
}

#[test]
fn test_neighbor_chain_never_emits_noise() {
    let mut points = walk(4, 45.0, 7.0, 0.5);
    points.push(poi(4, 60.0, 25.0));
    points.push(poi(5, -20.0, 47.0));

    let labels = NeighborChainClusterer::default().cluster(&points);
    assert_eq!(labels.noise_count(), 0);
    assert_eq!(labels.as_slice(), &[0, 0, 0, 0, 1, 2]);
}

#[test]
fn test_threshold_respects_radius() {
    // 3 km steps: nothing within the default 2 km, everything within 5 km
    let points = walk(4, -23.5505, -46.6333, 3.0);

    let tight = ThresholdClusterer::default().cluster(&points);
    assert!(!tight.has_clusters());

    let loose = ThresholdClusterer::new(5.0, 2).cluster(&points);
    assert_eq!(loose.as_slice(), &[0, 0, 0, 0]);
}

#[test]
fn test_neighbor_chain_respects_max_distance() {
    let points = walk(3, 19.4326, -99.1332, 3.0);

    let short = NeighborChainClusterer::default().cluster(&points);
    assert_eq!(short.as_slice(), &[0, 1, 2]);

    let long = NeighborChainClusterer::new(10, 5.0).cluster(&points);
    assert_eq!(long.as_slice(), &[0, 0, 0]);
}

#[test]
fn test_density_separates_distant_groups() {
    let mut points = walk(4, 37.7749, -122.4194, 0.2);
    let offset = points.len();
    points.extend(
        walk(4, 37.3382, -121.8863, 0.2)
            .into_iter()
            .enumerate()
            .map(|(i, p)| poi(offset + i, p.lat, p.lng)),
    );

    let labels = DensityClusterer::default().cluster(&points);
    let l = labels.as_slice();

    assert_eq!(labels.cluster_count(), 2);
    assert!(l[..4].iter().all(|&x| x == l[0] && x != NOISE));
    assert!(l[4..].iter().all(|&x| x == l[4] && x != NOISE));
    assert_ne!(l[0], l[4]);
}
