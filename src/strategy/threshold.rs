//! DBSCAN with a fixed kilometer radius.
//!
//! 1. Radius query per point through the R-tree (the point counts itself)
//! 2. Core points have at least `min_samples` points in their neighborhood
//! 3. Core points that are neighbors are merged with Union-Find
//! 4. Cluster ids follow the index of each cluster's first core point
//! 5. Border points join the first cluster whose expansion reaches them,
//!    which is the lowest label among their core neighbors; everything else
//!    is noise

use std::collections::HashMap;

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{ClusterStrategy, Labels, NOISE};
use crate::spatial::PoiIndex;
use crate::union_find::UnionFind;
use crate::{PoiPoint, StrategyKind};

/// Radius-based clustering for batches where density estimation finds nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdClusterer {
    radius_km: f64,
    min_samples: usize,
}

impl Default for ThresholdClusterer {
    fn default() -> Self {
        Self::new(2.0, 2)
    }
}

impl ThresholdClusterer {
    pub fn new(radius_km: f64, min_samples: usize) -> Self {
        Self {
            radius_km,
            min_samples: min_samples.max(1),
        }
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }
}

impl ClusterStrategy for ThresholdClusterer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Threshold
    }

    fn min_points(&self) -> usize {
        2
    }

    fn cluster(&self, points: &[PoiPoint]) -> Labels {
        let n = points.len();
        if n == 0 {
            return Labels::default();
        }

        let index = PoiIndex::build(points);
        let radius_km = self.radius_km;

        #[cfg(feature = "parallel")]
        let neighbors: Vec<Vec<usize>> = (0..n)
            .into_par_iter()
            .map(|i| index.within_km(i, radius_km))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let neighbors: Vec<Vec<usize>> = (0..n).map(|i| index.within_km(i, radius_km)).collect();

        let is_core: Vec<bool> = neighbors
            .iter()
            .map(|neigh| neigh.len() >= self.min_samples)
            .collect();

        let mut uf: UnionFind<usize> = UnionFind::with_capacity(n);
        for i in (0..n).filter(|&i| is_core[i]) {
            uf.make_set(i);
        }
        for i in (0..n).filter(|&i| is_core[i]) {
            for &j in neighbors[i].iter().filter(|&&j| j > i && is_core[j]) {
                uf.union(&i, &j);
            }
        }

        // Number clusters in order of their first core point
        let mut root_to_cluster: HashMap<usize, i32> = HashMap::new();
        let mut labels = vec![NOISE; n];
        for i in (0..n).filter(|&i| is_core[i]) {
            let root = uf.find(&i);
            let next_id = root_to_cluster.len() as i32;
            labels[i] = *root_to_cluster.entry(root).or_insert(next_id);
        }

        // Clusters expand in label order, so the lowest label reaches a border point first
        for i in (0..n).filter(|&i| !is_core[i]) {
            if let Some(label) = neighbors[i]
                .iter()
                .filter(|&&j| is_core[j])
                .map(|&j| labels[j])
                .min()
            {
                labels[i] = label;
            }
        }

        let labels = Labels::new(labels);
        debug!(
            "[Threshold] {} points, radius={}km, min_samples={}: {} clusters, {} noise",
            n,
            self.radius_km,
            self.min_samples,
            labels.cluster_count(),
            labels.noise_count()
        );
        labels
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
    fn test_pairs_within_radius() {
        let (lat_b, lng_b) = offset_km(51.5074, -0.1278, 0.0, 1.0);
        let (lat_d, lng_d) = offset_km(51.6, -0.1278, 0.5, 0.0);
        let points = vec![
            poi(0, 51.5074, -0.1278),
            poi(1, 51.6, -0.1278),
            poi(2, lat_b, lng_b),
            poi(3, lat_d, lng_d),
        ];

        let labels = ThresholdClusterer::default().cluster(&points);
        assert_eq!(labels.as_slice(), &[0, 1, 0, 1]);
    }

    #[test]
    fn test_isolated_points_are_noise() {
        let points = vec![
            poi(0, 40.0, -74.0),
            poi(1, 40.5, -74.0),
            poi(2, 41.0, -74.0),
        ];
        let labels = ThresholdClusterer::default().cluster(&points);
        assert_eq!(labels.noise_count(), 3);
        assert!(!labels.has_clusters());
    }

    #[test]
    fn test_chain_connects_through_core_points() {
        // 1.5 km steps: each neighbor pair is within 2 km, ends are 6 km apart
        let points: Vec<PoiPoint> = (0..5)
            .map(|i| {
                let (lat, lng) = offset_km(-33.8688, 151.2093, i as f64 * 1.5, 0.0);
                poi(i, lat, lng)
            })
            .collect();

        let labels = ThresholdClusterer::default().cluster(&points);
        assert_eq!(labels.cluster_count(), 1);
        assert_eq!(labels.noise_count(), 0);
    }

    #[test]
    fn test_border_point_joins_core_cluster() {
        // min_samples = 3: the middle point is core, the ends are border points
        let points: Vec<PoiPoint> = (0..3)
            .map(|i| {
                let (lat, lng) = offset_km(35.0, 135.0, 0.0, i as f64 * 1.5);
                poi(i, lat, lng)
            })
            .collect();

        let labels = ThresholdClusterer::new(2.0, 3).cluster(&points);
        assert_eq!(labels.as_slice(), &[0, 0, 0]);
    }

    #[test]
    fn test_border_point_goes_to_first_expanded_cluster() {
        // min_samples = 4: both runs are all core, the point between them
        // sees one core from each run and is a border point. The right run's
        // core has the lower index, but the left run holds label 0.
        let east = |i: usize, km: f64| {
            let (lat, lng) = offset_km(0.0, 100.0, 0.0, km);
            poi(i, lat, lng)
        };
        let points = vec![
            east(0, 0.0),
            east(1, 4.9),
            east(2, 3.2),
            east(3, 0.5),
            east(4, 1.0),
            east(5, 1.5),
            east(6, 5.4),
            east(7, 5.9),
            east(8, 6.4),
        ];

        let labels = ThresholdClusterer::new(2.0, 4).cluster(&points);
        assert_eq!(labels.as_slice(), &[0, 1, 0, 0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_empty() {
        assert!(ThresholdClusterer::default().cluster(&[]).is_empty());
    }
}
