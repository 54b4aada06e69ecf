//! # POI Cluster
//!
//! Geographic clustering of points of interest (POIs) for day-by-day
//! itinerary planning.
//!
//! This library provides:
//! - Haversine (great-circle) distance on a 6371 km sphere
//! - Density-based clustering (HDBSCAN) over the geodesic metric
//! - Radius-based clustering (DBSCAN) as a secondary strategy
//! - Nearest-neighbor chaining as an always-succeeding fallback
//! - A cluster assembler that runs the strategies in order and names the
//!   resulting groups `cluster_1`, `cluster_2`, ...
//!
//! ## Features
//!
//! - **`parallel`** - Parallel neighbor queries with rayon
//! - **`synthetic`** - Seeded synthetic POI generator for tests and benchmarks
//! - **`cli`** - Debug command line tool
//!
//! ## Quick Start
//!
//! ```rust
//! use poi_cluster::{PoiPoint, cluster_pois};
//!
//! let pois = vec![
//!     PoiPoint::new("a", "Louvre", 48.8606, 2.3376),
//!     PoiPoint::new("b", "Tuileries", 48.8634, 2.3275),
//!     PoiPoint::new("c", "Palais Royal", 48.8638, 2.3372),
//!     PoiPoint::new("d", "Versailles", 48.8049, 2.1204),
//! ];
//!
//! let clusters = cluster_pois(pois);
//! let total: usize = clusters.iter().map(|c| c.members.len()).sum();
//! assert_eq!(total, 4);
//! assert_eq!(clusters[0].cluster_id, "cluster_1");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

// Unified error handling
pub mod error;
pub use error::{ClusterError, OptionExt, Result};

// Union-Find data structure for connected components
pub mod union_find;
pub use union_find::UnionFind;

// Geographic utilities (distance, bounds, center calculations)
pub mod geo_utils;
pub use geo_utils::distance_km;

// R-tree backed neighbor queries on the unit sphere
pub mod spatial;
pub use spatial::PoiIndex;

// Clustering strategies (density, threshold, neighbor chain)
pub mod strategy;
pub use strategy::{
    ClusterStrategy, DensityClusterer, Labels, NOISE, NeighborChainClusterer, Strategy,
    ThresholdClusterer,
};

// Strategy chain and output construction
pub mod assembler;
pub use assembler::{
    ClusterEngine, build_clusters, cluster_pois, cluster_pois_checked, format_cluster_id,
};

// Batch boundary validation
pub mod validation;
pub use validation::validate_batch;

// Synthetic POI generator (testing and benchmarking)
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A point of interest, the clustering engine's only input unit.
///
/// `id` is the canonical identifier assigned upstream. The engine carries it
/// through unchanged and never regenerates it. `name` is for display only.
///
/// # Example
/// ```
/// use poi_cluster::PoiPoint;
/// let poi = PoiPoint::new("poi-1", "Statue of Liberty", 40.6892, -74.0445);
/// assert!(poi.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiPoint {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl PoiPoint {
    /// Create a new POI.
    pub fn new(id: impl Into<String>, name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat,
            lng,
        }
    }

    /// Check if the point has finite, in-range coordinates.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat >= -90.0
            && self.lat <= 90.0
            && self.lng >= -180.0
            && self.lng <= 180.0
    }

    /// Great-circle distance to another POI in kilometers.
    pub fn distance_km(&self, other: &PoiPoint) -> f64 {
        geo_utils::haversine_km(self, other)
    }
}

/// Bounding box for a set of POIs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from POIs. Returns `None` for an empty slice.
    pub fn from_points(points: &[PoiPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let (min_lat, max_lat, min_lng, max_lng) = geo_utils::compute_bounds_tuple(points);
        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center of the bounds as `(lat, lng)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// A named group of co-located POIs.
///
/// Members keep the order in which they appeared in the input batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Identifier of the form `cluster_<n>`, 1-indexed
    pub cluster_id: String,
    /// POIs in this cluster, in input order
    #[serde(rename = "pois")]
    pub members: Vec<PoiPoint>,
}

impl Cluster {
    /// Number of POIs in the cluster.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the cluster has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// IDs of the member POIs, in input order.
    pub fn member_ids(&self) -> Vec<&str> {
        self.members.iter().map(|p| p.id.as_str()).collect()
    }

    /// Geometric summary of the cluster (center, bounds, radius).
    pub fn summary(&self) -> ClusterSummary {
        let (center_lat, center_lng) = geo_utils::compute_center(&self.members);
        let radius_km = self
            .members
            .iter()
            .map(|p| distance_km(center_lat, center_lng, p.lat, p.lng))
            .fold(0.0, f64::max);

        ClusterSummary {
            cluster_id: self.cluster_id.clone(),
            size: self.members.len(),
            center_lat,
            center_lng,
            bounds: Bounds::from_points(&self.members),
            radius_km,
        }
    }
}

/// Geometric summary of a cluster, used when laying out a day plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster_id: String,
    pub size: usize,
    /// Mean latitude of the members
    pub center_lat: f64,
    /// Mean longitude of the members
    pub center_lng: f64,
    pub bounds: Option<Bounds>,
    /// Largest distance from the center to any member, in kilometers
    pub radius_km: f64,
}

/// Mapping from POI id to cluster id, the artifact handed to persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterAssignment {
    assignments: BTreeMap<String, String>,
}

impl ClusterAssignment {
    /// Build the assignment from a cluster list.
    pub fn from_clusters(clusters: &[Cluster]) -> Self {
        let assignments = clusters
            .iter()
            .flat_map(|cluster| {
                cluster
                    .members
                    .iter()
                    .map(move |poi| (poi.id.clone(), cluster.cluster_id.clone()))
            })
            .collect();
        Self { assignments }
    }

    /// Cluster id assigned to a POI.
    pub fn get(&self, poi_id: &str) -> Option<&str> {
        self.assignments.get(poi_id).map(String::as_str)
    }

    /// Number of assigned POIs.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Check if nothing was assigned.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Iterate `(poi_id, cluster_id)` pairs ordered by POI id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assignments
            .iter()
            .map(|(poi, cluster)| (poi.as_str(), cluster.as_str()))
    }
}

// ============================================================================
// Strategy Selection
// ============================================================================

/// The clustering strategies, in the order the assembler tries them by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// HDBSCAN over haversine distance
    Density,
    /// DBSCAN with a fixed kilometer radius
    Threshold,
    /// k-nearest-neighbor chaining under a distance threshold
    NeighborChain,
}

impl StrategyKind {
    /// Whether this strategy can label points as noise.
    pub fn emits_noise(&self) -> bool {
        !matches!(self, StrategyKind::NeighborChain)
    }

    /// Short name used in logs and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Density => "density",
            StrategyKind::Threshold => "threshold",
            StrategyKind::NeighborChain => "neighbor-chain",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringResult {
    /// Named clusters forming a total partition of the input
    pub clusters: Vec<Cluster>,
    /// Strategy whose labels were used (`None` for empty and single-point batches)
    pub strategy: Option<StrategyKind>,
    /// Number of points placed in the trailing noise cluster
    pub noise_count: usize,
}

impl ClusteringResult {
    /// POI id to cluster id mapping for this result.
    pub fn assignment(&self) -> ClusterAssignment {
        ClusterAssignment::from_clusters(&self.clusters)
    }

    /// Summaries of every cluster, in cluster order.
    pub fn summaries(&self) -> Vec<ClusterSummary> {
        self.clusters.iter().map(Cluster::summary).collect()
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Tuning constants for the clustering strategies.
///
/// All values default to the recommended settings. Radii are in kilometers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// HDBSCAN core distance is the distance to this many-th nearest other
    /// point (clamped to the batch size minus one).
    /// Default: 2
    pub density_min_samples: usize,

    /// Fixed HDBSCAN minimum cluster size. `None` scales with batch size
    /// (2 below 10 points, 3 below 50, then `max(3, n / 50)`).
    /// Default: None
    pub density_min_cluster_size: Option<usize>,

    /// DBSCAN neighborhood radius.
    /// Default: 2.0 km
    pub threshold_radius_km: f64,

    /// Points (including itself) a DBSCAN core point needs within the radius.
    /// Default: 2
    pub threshold_min_samples: usize,

    /// Neighbors (including the point itself) per point in the chaining graph.
    /// Default: 10
    pub neighbor_chain_k: usize,

    /// Longest edge the chaining fallback will follow.
    /// Default: 2.0 km
    pub neighbor_chain_max_km: f64,

    /// Strategies to try, in order. The neighbor chain is always appended if absent.
    /// Default: density, threshold, neighbor-chain
    pub strategies: Vec<StrategyKind>,

    /// Reject invalid batches in `ClusterEngine::run_checked`.
    /// Default: true
    pub validate_input: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            density_min_samples: 2,
            density_min_cluster_size: None,
            threshold_radius_km: 2.0,
            threshold_min_samples: 2,
            neighbor_chain_k: 10,
            neighbor_chain_max_km: 2.0,
            strategies: vec![
                StrategyKind::Density,
                StrategyKind::Threshold,
                StrategyKind::NeighborChain,
            ],
            validate_input: true,
        }
    }
}

impl ClusterConfig {
    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.density_min_samples == 0 {
            return Err(ClusterError::invalid_config(
                "density_min_samples",
                "must be at least 1",
            ));
        }
        if let Some(size) = self.density_min_cluster_size {
            if size < 2 {
                return Err(ClusterError::invalid_config(
                    "density_min_cluster_size",
                    "must be at least 2",
                ));
            }
        }
        if !self.threshold_radius_km.is_finite() || self.threshold_radius_km <= 0.0 {
            return Err(ClusterError::invalid_config(
                "threshold_radius_km",
                "must be a positive finite distance",
            ));
        }
        if self.threshold_min_samples == 0 {
            return Err(ClusterError::invalid_config(
                "threshold_min_samples",
                "must be at least 1",
            ));
        }
        if self.neighbor_chain_k == 0 {
            return Err(ClusterError::invalid_config(
                "neighbor_chain_k",
                "must be at least 1",
            ));
        }
        if !self.neighbor_chain_max_km.is_finite() || self.neighbor_chain_max_km < 0.0 {
            return Err(ClusterError::invalid_config(
                "neighbor_chain_max_km",
                "must be a non-negative finite distance",
            ));
        }
        self.strategies
            .first()
            .ok_or_invalid_config("strategies", "at least one strategy is required")?;
        Ok(())
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ClusterConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
