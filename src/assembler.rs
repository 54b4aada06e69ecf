//! Strategy chain and cluster output construction.
//!
//! The engine tries each configured strategy in order and keeps the first
//! result with at least one real cluster. Labels are then turned into named
//! clusters: regular clusters in ascending label order as `cluster_1`,
//! `cluster_2`, ..., followed by a single trailing cluster holding every
//! noise point.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::strategy::{ClusterStrategy, Labels, NOISE, Strategy};
use crate::validation::validate_batch;
use crate::{Cluster, ClusterConfig, ClusteringResult, PoiPoint, Result};

/// Cluster id for the `n`-th emitted cluster (1-indexed).
pub fn format_cluster_id(n: usize) -> String {
    format!("cluster_{n}")
}

/// Clustering engine holding a validated configuration and its strategy chain.
///
/// Stateless between runs; one engine can serve any number of batches,
/// including from several threads at once.
#[derive(Debug, Clone)]
pub struct ClusterEngine {
    config: ClusterConfig,
    strategies: Vec<Strategy>,
}

impl Default for ClusterEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ClusterEngine {
    /// Create an engine, rejecting unusable configuration values.
    pub fn new(config: ClusterConfig) -> Result<Self> {
        config.validate()?;
        let strategies = Strategy::chain(&config);
        Ok(Self { config, strategies })
    }

    /// Engine with the recommended defaults.
    pub fn with_defaults() -> Self {
        let config = ClusterConfig::default();
        let strategies = Strategy::chain(&config);
        Self { config, strategies }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// The strategies in the order they are tried.
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Cluster a batch without validating it.
    ///
    /// Never fails or panics. POIs with non-finite coordinates are left
    /// isolated (noise or a singleton cluster); out-of-range values give
    /// unspecified groupings. Either way every POI lands in exactly one cluster.
    pub fn run(&self, points: Vec<PoiPoint>) -> ClusteringResult {
        match points.len() {
            0 => {
                return ClusteringResult {
                    clusters: Vec::new(),
                    strategy: None,
                    noise_count: 0,
                };
            }
            1 => {
                return ClusteringResult {
                    clusters: vec![Cluster {
                        cluster_id: format_cluster_id(1),
                        members: points,
                    }],
                    strategy: None,
                    noise_count: 0,
                };
            }
            _ => {}
        }

        let n = points.len();
        for strategy in &self.strategies {
            if n < strategy.min_points() {
                debug!(
                    "[Cluster] Skipping {} strategy: {} points < {}",
                    strategy.kind(),
                    n,
                    strategy.min_points()
                );
                continue;
            }

            let labels = strategy.cluster(&points);
            if !labels.has_clusters() {
                debug!(
                    "[Cluster] {} strategy found no structure in {} points",
                    strategy.kind(),
                    n
                );
                continue;
            }

            let include_noise = strategy.emits_noise();
            let noise_count = if include_noise {
                labels.noise_count()
            } else {
                0
            };
            let clusters = build_clusters(&labels, points, include_noise);

            info!(
                "[Cluster] {} points -> {} clusters via {} strategy ({} noise)",
                n,
                clusters.len(),
                strategy.kind(),
                noise_count
            );

            return ClusteringResult {
                clusters,
                strategy: Some(strategy.kind()),
                noise_count,
            };
        }

        // The chain always ends with the neighbor chain, which labels every
        // point of a non-empty batch. Keep the partition if that ever changes.
        let labels = Labels::new((0..n as i32).collect());
        ClusteringResult {
            clusters: build_clusters(&labels, points, false),
            strategy: None,
            noise_count: 0,
        }
    }

    /// Validate the batch (when enabled in the config), then cluster it.
    pub fn run_checked(&self, points: Vec<PoiPoint>) -> Result<ClusteringResult> {
        if self.config.validate_input {
            validate_batch(&points)?;
        }
        Ok(self.run(points))
    }
}

/// Cluster POIs with the default configuration.
///
/// Empty input gives no clusters; a single POI gives `cluster_1`. The batch
/// is not validated; see [`ClusterEngine::run`] for invalid coordinates.
pub fn cluster_pois(points: Vec<PoiPoint>) -> Vec<Cluster> {
    ClusterEngine::with_defaults().run(points).clusters
}

/// Validate the batch, then cluster it with the default configuration.
///
/// The whole batch is rejected on the first invalid coordinate or duplicate id.
pub fn cluster_pois_checked(points: Vec<PoiPoint>) -> Result<Vec<Cluster>> {
    Ok(ClusterEngine::with_defaults().run_checked(points)?.clusters)
}

/// Turn per-point labels into named clusters.
///
/// Regular clusters are emitted in ascending label order with members in
/// input order. With `include_noise`, all [`NOISE`] points form one extra
/// cluster numbered after the regular ones; without it, noise is treated as
/// an ordinary label.
pub fn build_clusters(labels: &Labels, points: Vec<PoiPoint>, include_noise: bool) -> Vec<Cluster> {
    debug_assert_eq!(labels.len(), points.len());

    let mut grouped: BTreeMap<i32, Vec<PoiPoint>> = BTreeMap::new();
    let mut noise: Vec<PoiPoint> = Vec::new();

    for (&label, poi) in labels.as_slice().iter().zip(points) {
        if include_noise && label == NOISE {
            noise.push(poi);
        } else {
            grouped.entry(label).or_default().push(poi);
        }
    }

    let mut clusters: Vec<Cluster> = grouped
        .into_values()
        .enumerate()
        .map(|(i, members)| Cluster {
            cluster_id: format_cluster_id(i + 1),
            members,
        })
        .collect();

    if !noise.is_empty() {
        clusters.push(Cluster {
            cluster_id: format_cluster_id(clusters.len() + 1),
            members: noise,
        });
    }

    clusters
}
