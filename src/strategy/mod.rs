//! Clustering strategies.
//!
//! Each strategy turns a POI batch into one integer label per point.
//! Non-negative labels are clusters; [`NOISE`] marks points that belong to
//! no dense region. The assembler tries strategies in order and keeps the
//! first result that contains at least one real cluster.

mod density;
mod neighbor_chain;
mod threshold;

pub use density::{DensityClusterer, scaled_min_cluster_size};
pub use neighbor_chain::NeighborChainClusterer;
pub use threshold::ThresholdClusterer;

use crate::{ClusterConfig, PoiPoint, StrategyKind};

/// Label for points that do not belong to any cluster.
pub const NOISE: i32 = -1;

/// Per-point labels produced by a strategy, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Labels {
    labels: Vec<i32>,
}

impl Labels {
    /// Wrap a label vector.
    pub fn new(labels: Vec<i32>) -> Self {
        Self { labels }
    }

    /// Every point labeled as noise.
    pub fn all_noise(n: usize) -> Self {
        Self {
            labels: vec![NOISE; n],
        }
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.labels
    }

    pub fn into_inner(self) -> Vec<i32> {
        self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of distinct non-noise labels.
    pub fn cluster_count(&self) -> usize {
        let mut distinct: Vec<i32> = self.labels.iter().copied().filter(|&l| l != NOISE).collect();
        distinct.sort_unstable();
        distinct.dedup();
        distinct.len()
    }

    /// Number of points labeled as noise.
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE).count()
    }

    /// A result is usable when it found at least one real cluster.
    pub fn has_clusters(&self) -> bool {
        self.labels.iter().any(|&l| l != NOISE)
    }
}

/// A clustering algorithm over POI coordinates.
pub trait ClusterStrategy {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Smallest batch the strategy is attempted on.
    fn min_points(&self) -> usize;

    /// Label every point in the batch.
    fn cluster(&self, points: &[PoiPoint]) -> Labels;

    /// Whether noise labels should become a trailing cluster.
    fn emits_noise(&self) -> bool {
        self.kind().emits_noise()
    }
}

/// The strategy tiers as one closed set, so a chain can be stored in a `Vec`.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Density(DensityClusterer),
    Threshold(ThresholdClusterer),
    NeighborChain(NeighborChainClusterer),
}

impl Strategy {
    /// Build the strategy of the given kind from configuration.
    pub fn from_config(kind: StrategyKind, config: &ClusterConfig) -> Self {
        match kind {
            StrategyKind::Density => Strategy::Density(DensityClusterer::new(
                config.density_min_samples,
                config.density_min_cluster_size,
            )),
            StrategyKind::Threshold => Strategy::Threshold(ThresholdClusterer::new(
                config.threshold_radius_km,
                config.threshold_min_samples,
            )),
            StrategyKind::NeighborChain => Strategy::NeighborChain(NeighborChainClusterer::new(
                config.neighbor_chain_k,
                config.neighbor_chain_max_km,
            )),
        }
    }

    /// The ordered strategy chain for a configuration.
    ///
    /// Duplicates are dropped and the neighbor chain is appended when missing,
    /// so the chain always ends in a strategy that cannot fail.
    pub fn chain(config: &ClusterConfig) -> Vec<Strategy> {
        let mut kinds: Vec<StrategyKind> = Vec::with_capacity(config.strategies.len() + 1);
        for &kind in &config.strategies {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        if !kinds.contains(&StrategyKind::NeighborChain) {
            kinds.push(StrategyKind::NeighborChain);
        }
        kinds
            .into_iter()
            .map(|kind| Strategy::from_config(kind, config))
            .collect()
    }
}

impl ClusterStrategy for Strategy {
    fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Density(s) => s.kind(),
            Strategy::Threshold(s) => s.kind(),
            Strategy::NeighborChain(s) => s.kind(),
        }
    }

    fn min_points(&self) -> usize {
        match self {
            Strategy::Density(s) => s.min_points(),
            Strategy::Threshold(s) => s.min_points(),
            Strategy::NeighborChain(s) => s.min_points(),
        }
    }

    fn cluster(&self, points: &[PoiPoint]) -> Labels {
        match self {
            Strategy::Density(s) => s.cluster(points),
            Strategy::Threshold(s) => s.cluster(points),
            Strategy::NeighborChain(s) => s.cluster(points),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_counts() {
        let labels = Labels::new(vec![0, 0, NOISE, 1, 1, NOISE, 2]);
        assert_eq!(labels.cluster_count(), 3);
        assert_eq!(labels.noise_count(), 2);
        assert!(labels.has_clusters());
    }

    #[test]
    fn test_all_noise_not_usable() {
        let labels = Labels::all_noise(4);
        assert_eq!(labels.cluster_count(), 0);
        assert!(!labels.has_clusters());
    }

    #[test]
    fn test_chain_appends_neighbor_chain() {
        let config = ClusterConfig {
            strategies: vec![StrategyKind::Threshold, StrategyKind::Threshold],
            ..ClusterConfig::default()
        };
        let chain = Strategy::chain(&config);
        let kinds: Vec<StrategyKind> = chain.iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![StrategyKind::Threshold, StrategyKind::NeighborChain]
        );
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
}
