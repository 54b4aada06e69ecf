//! Synthetic POI generator for stress testing and benchmarking.
//!
//! Generates POI batches with known neighborhoods (dense "quarters" of
//! attractions) plus scattered outliers, providing ground truth for
//! validating the clustering strategies.
//!
//! Feature-gated behind `synthetic`, so it stays out of production builds.
//!
//! # Example
//!
//! ```rust
//! use poi_cluster::synthetic::{NeighborhoodConfig, PoiScenario};
//!
//! let scenario = PoiScenario {
//!     origin: (41.3874, 2.1686),
//!     neighborhoods: vec![NeighborhoodConfig {
//!         poi_count: 12,
//!         radius_km: 0.4,
//!         offset_north_km: 0.0,
//!         offset_east_km: 0.0,
//!     }],
//!     scattered_count: 3,
//!     scatter_radius_km: 40.0,
//!     seed: 42,
//! };
//!
//! let dataset = scenario.generate();
//! assert_eq!(dataset.points.len(), 15);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use crate::PoiPoint;
use crate::geo_utils::offset_km;

// ============================================================================
// Types
// ============================================================================

/// A dense group of POIs around a center point.
#[derive(Debug, Clone)]
pub struct NeighborhoodConfig {
    /// Number of POIs in the neighborhood.
    pub poi_count: usize,
    /// POIs are placed uniformly within this radius of the center.
    pub radius_km: f64,
    /// Center offset from the scenario origin.
    pub offset_north_km: f64,
    pub offset_east_km: f64,
}

/// A complete synthetic batch with ground truth.
#[derive(Debug, Clone)]
pub struct SyntheticDataset {
    /// POIs in generation order (neighborhoods first, then scattered points).
    pub points: Vec<PoiPoint>,
    /// POI ids per neighborhood.
    pub expected_groups: Vec<Vec<String>>,
    /// POI ids of the scattered outliers.
    pub scattered_ids: Vec<String>,
}

/// Scenario configuration for generating synthetic POIs.
#[derive(Debug, Clone)]
pub struct PoiScenario {
    /// Origin `(lat, lng)` of the destination city.
    pub origin: (f64, f64),
    pub neighborhoods: Vec<NeighborhoodConfig>,
    /// Isolated POIs spread across the wider area.
    pub scattered_count: usize,
    /// Scattered POIs land between 5 km and this distance from the origin.
    pub scatter_radius_km: f64,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

// ============================================================================
// Generation
// ============================================================================

/// Uniform point in a disc (square-root radius for even density).
fn random_in_disc(center: (f64, f64), radius_km: f64, rng: &mut StdRng) -> (f64, f64) {
    let r = radius_km * rng.r#gen::<f64>().sqrt();
    let theta = rng.gen_range(0.0..(2.0 * PI));
    offset_km(center.0, center.1, r * theta.sin(), r * theta.cos())
}

impl PoiScenario {
    /// Generate the batch described by this scenario.
    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut points = Vec::new();
        let mut expected_groups = Vec::with_capacity(self.neighborhoods.len());

        for (gi, hood) in self.neighborhoods.iter().enumerate() {
            let center = offset_km(
                self.origin.0,
                self.origin.1,
                hood.offset_north_km,
                hood.offset_east_km,
            );

            let mut ids = Vec::with_capacity(hood.poi_count);
            for pi in 0..hood.poi_count {
                let (lat, lng) = random_in_disc(center, hood.radius_km, &mut rng);
                let id = format!("synth_{gi:02}_{pi:04}");
                points.push(PoiPoint::new(
                    id.clone(),
                    format!("Neighborhood {gi} POI {pi}"),
                    lat,
                    lng,
                ));
                ids.push(id);
            }
            expected_groups.push(ids);
        }

        let mut scattered_ids = Vec::with_capacity(self.scattered_count);
        let min_scatter_km = 5.0_f64.min(self.scatter_radius_km);
        for si in 0..self.scattered_count {
            let r = rng.gen_range(min_scatter_km..=self.scatter_radius_km);
            let theta = rng.gen_range(0.0..(2.0 * PI));
            let (lat, lng) = offset_km(self.origin.0, self.origin.1, r * theta.sin(), r * theta.cos());
            let id = format!("synth_scatter_{si:04}");
            points.push(PoiPoint::new(id.clone(), format!("Scattered POI {si}"), lat, lng));
            scattered_ids.push(id);
        }

        SyntheticDataset {
            points,
            expected_groups,
            scattered_ids,
        }
    }

    /// Walkable old town: three tight quarters a few kilometers apart.
    pub fn historic_center() -> Self {
        Self {
            origin: (41.9028, 12.4964),
            neighborhoods: vec![
                NeighborhoodConfig {
                    poi_count: 15,
                    radius_km: 0.4,
                    offset_north_km: 0.0,
                    offset_east_km: 0.0,
                },
                NeighborhoodConfig {
                    poi_count: 10,
                    radius_km: 0.3,
                    offset_north_km: 6.0,
                    offset_east_km: 1.0,
                },
                NeighborhoodConfig {
                    poi_count: 8,
                    radius_km: 0.3,
                    offset_north_km: -2.0,
                    offset_east_km: 7.0,
                },
            ],
            scattered_count: 0,
            scatter_radius_km: 30.0,
            seed: 7,
        }
    }

    /// Dense downtown plus sparse suburbs.
    pub fn city_with_suburbs() -> Self {
        Self {
            origin: (40.7128, -74.0060),
            neighborhoods: vec![
                NeighborhoodConfig {
                    poi_count: 40,
                    radius_km: 1.0,
                    offset_north_km: 0.0,
                    offset_east_km: 0.0,
                },
                NeighborhoodConfig {
                    poi_count: 20,
                    radius_km: 0.8,
                    offset_north_km: 12.0,
                    offset_east_km: -4.0,
                },
            ],
            scattered_count: 10,
            scatter_radius_km: 60.0,
            seed: 42,
        }
    }

    /// Only scattered POIs, far apart: no density structure at all.
    pub fn sparse_region(count: usize) -> Self {
        Self {
            origin: (-8.3405, 115.0920),
            neighborhoods: Vec::new(),
            scattered_count: count,
            scatter_radius_km: 500.0,
            seed: 11,
        }
    }

    /// Many neighborhoods for scaling benchmarks.
    pub fn with_poi_count(count: usize) -> Self {
        let per_hood = 25;
        let hoods = count.div_ceil(per_hood).max(1);
        let neighborhoods = (0..hoods)
            .map(|i| {
                let ring = (i / 8) as f64 + 1.0;
                let angle = (i % 8) as f64 * PI / 4.0;
                NeighborhoodConfig {
                    poi_count: per_hood.min(count - i * per_hood),
                    radius_km: 0.5,
                    offset_north_km: 8.0 * ring * angle.sin(),
                    offset_east_km: 8.0 * ring * angle.cos(),
                }
            })
            .collect();

        Self {
            origin: (51.5074, -0.1278),
            neighborhoods,
            scattered_count: 0,
            scatter_radius_km: 100.0,
            seed: 1234,
        }
    }
}
