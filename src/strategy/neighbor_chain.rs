//! Nearest-neighbor chaining, the fallback that always produces clusters.
//!
//! Every point keeps its `k` nearest neighbors (itself included). Starting
//! from the first unvisited point in input order, a breadth-first walk
//! follows neighbor edges no longer than `max_distance_km` and stamps every
//! reached point with the current label. Each walk gets a fresh label, so
//! every point ends up in a real cluster and nothing is labeled noise.

use std::collections::VecDeque;

use log::debug;

use super::{ClusterStrategy, Labels, NOISE};
use crate::spatial::{Neighbor, PoiIndex};
use crate::{PoiPoint, StrategyKind};

#[derive(Debug, Clone, PartialEq)]
pub struct NeighborChainClusterer {
    k: usize,
    max_distance_km: f64,
}

impl Default for NeighborChainClusterer {
    fn default() -> Self {
        Self::new(10, 2.0)
    }
}

impl NeighborChainClusterer {
    pub fn new(k: usize, max_distance_km: f64) -> Self {
        Self {
            k: k.max(1),
            max_distance_km,
        }
    }
}

impl ClusterStrategy for NeighborChainClusterer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NeighborChain
    }

    fn min_points(&self) -> usize {
        1
    }

    fn cluster(&self, points: &[PoiPoint]) -> Labels {
        let n = points.len();
        if n == 0 {
            return Labels::default();
        }

        let k = self.k.min(n);
        let index = PoiIndex::build(points);
        let knn: Vec<Vec<Neighbor>> = (0..n).map(|i| index.k_nearest(i, k)).collect();

        let mut labels = vec![NOISE; n];
        let mut visited = vec![false; n];
        let mut current_label = 0;
        let mut queue = VecDeque::new();

        for start in 0..n {
            if visited[start] {
                continue;
            }

            visited[start] = true;
            labels[start] = current_label;
            queue.push_back(start);

            while let Some(current) = queue.pop_front() {
                for neighbor in &knn[current] {
                    let j = neighbor.idx;
                    if j != current && !visited[j] && neighbor.distance_km <= self.max_distance_km
                    {
                        visited[j] = true;
                        labels[j] = current_label;
                        queue.push_back(j);
                    }
                }
            }

            current_label += 1;
        }

        debug!(
            "[NeighborChain] {} points, k={}, max_distance={}km: {} clusters",
            n, k, self.max_distance_km, current_label
        );

        Labels::new(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::offset_km;

    fn poi(i: usize, lat: f64, lng: f64) -> PoiPoint {
        PoiPoint::new(format!("p{i}"), format!("POI {i}"), lat, lng)
    }

    #[test]
    fn test_far_points_are_singletons() {
        let points = vec![
            poi(0, 40.7128, -74.0060),
            poi(1, 34.0522, -118.2437),
            poi(2, 51.5074, -0.1278),
            poi(3, 35.6762, 139.6503),
        ];
        let labels = NeighborChainClusterer::default().cluster(&points);
        assert_eq!(labels.as_slice(), &[0, 1, 2, 3]);
        assert_eq!(labels.noise_count(), 0);
    }

    #[test]
    fn test_chain_follows_short_edges() {
        // Interleaved input order: two walks, labels follow first appearance
        let (a1_lat, a1_lng) = offset_km(48.0, 11.0, 1.0, 0.0);
        let (a2_lat, a2_lng) = offset_km(48.0, 11.0, 2.0, 0.0);
        let points = vec![
            poi(0, 48.0, 11.0),
            poi(1, 49.0, 11.0),
            poi(2, a1_lat, a1_lng),
            poi(3, a2_lat, a2_lng),
        ];
        let labels = NeighborChainClusterer::default().cluster(&points);
        assert_eq!(labels.as_slice(), &[0, 1, 0, 0]);
    }

    #[test]
    fn test_k_limits_reachable_neighbors() {
        // With k = 1 a point only knows itself, so nothing chains
        let (lat, lng) = offset_km(10.0, 10.0, 0.5, 0.0);
        let points = vec![poi(0, 10.0, 10.0), poi(1, lat, lng)];
        let labels = NeighborChainClusterer::new(1, 2.0).cluster(&points);
        assert_eq!(labels.as_slice(), &[0, 1]);
    }

    #[test]
    fn test_single_point() {
        let labels = NeighborChainClusterer::default().cluster(&[poi(0, 1.0, 1.0)]);
        assert_eq!(labels.as_slice(), &[0]);
    }
}
