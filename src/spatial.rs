//! R-tree indexed POIs and geodesic neighbor queries.
//!
//! Points are embedded as unit vectors on the sphere. Straight-line (chord)
//! distance between unit vectors is monotonic in great-circle distance, so
//! Euclidean R-tree queries return neighbors in geodesic order without any
//! latitude-dependent degree scaling. Exact distances are always recomputed
//! with the haversine formula.
//!
//! POIs with non-finite coordinates are kept out of the tree. They are their
//! own only neighbor and sit at infinite distance from everything else, so
//! every strategy leaves them isolated instead of failing.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::PoiPoint;
use crate::geo_utils::{EARTH_RADIUS_KM, haversine_km};

/// Relative slack on chord radii so float rounding never drops a boundary point.
const CHORD_SLACK: f64 = 1e-9;

/// A POI position on the unit sphere with its index in the input batch.
#[derive(Debug, Clone, Copy)]
pub struct SpherePoint {
    pub idx: usize,
    pub xyz: [f64; 3],
}

impl RTreeObject for SpherePoint {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.xyz)
    }
}

impl PointDistance for SpherePoint {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.xyz[0] - point[0];
        let dy = self.xyz[1] - point[1];
        let dz = self.xyz[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// Unit vector for a coordinate in degrees.
pub fn to_unit_vector(lat: f64, lng: f64) -> [f64; 3] {
    let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
    let (sin_lng, cos_lng) = lng.to_radians().sin_cos();
    [cos_lat * cos_lng, cos_lat * sin_lng, sin_lat]
}

fn is_finite_vector(xyz: &[f64; 3]) -> bool {
    xyz.iter().all(|c| c.is_finite())
}

/// Chord length on the unit sphere spanning `km` of great-circle distance.
pub fn chord_for_km(km: f64) -> f64 {
    let angle = (km / EARTH_RADIUS_KM).clamp(0.0, std::f64::consts::PI);
    2.0 * (angle / 2.0).sin()
}

/// A neighbor returned by a query: input index and haversine distance in km.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub idx: usize,
    pub distance_km: f64,
}

/// Spatial index over one POI batch.
///
/// Borrows the batch so distances are computed against the original records.
#[derive(Debug)]
pub struct PoiIndex<'a> {
    points: &'a [PoiPoint],
    vectors: Vec<[f64; 3]>,
    tree: RTree<SpherePoint>,
}

impl<'a> PoiIndex<'a> {
    /// Build the index for a batch.
    pub fn build(points: &'a [PoiPoint]) -> Self {
        let vectors: Vec<[f64; 3]> = points
            .iter()
            .map(|p| to_unit_vector(p.lat, p.lng))
            .collect();

        let indexed: Vec<SpherePoint> = vectors
            .iter()
            .enumerate()
            .filter(|(_, xyz)| is_finite_vector(xyz))
            .map(|(idx, &xyz)| SpherePoint { idx, xyz })
            .collect();

        Self {
            points,
            vectors,
            tree: RTree::bulk_load(indexed),
        }
    }

    /// Number of indexed POIs.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The indexed batch.
    pub fn points(&self) -> &'a [PoiPoint] {
        self.points
    }

    /// Whether POI `idx` has finite coordinates and is searchable.
    #[inline]
    pub fn is_indexed(&self, idx: usize) -> bool {
        is_finite_vector(&self.vectors[idx])
    }

    /// Haversine distance in km between two indexed POIs.
    ///
    /// Infinite when either POI has non-finite coordinates.
    #[inline]
    pub fn distance(&self, a: usize, b: usize) -> f64 {
        if !self.is_indexed(a) || !self.is_indexed(b) {
            return f64::INFINITY;
        }
        haversine_km(&self.points[a], &self.points[b])
    }

    /// All POIs within `radius_km` of POI `idx` (inclusive, including `idx` itself).
    ///
    /// Returned in ascending index order.
    pub fn within_km(&self, idx: usize, radius_km: f64) -> Vec<usize> {
        if !self.is_indexed(idx) {
            return vec![idx];
        }

        let chord = chord_for_km(radius_km) * (1.0 + CHORD_SLACK) + CHORD_SLACK;

        let mut found: Vec<usize> = self
            .tree
            .locate_within_distance(self.vectors[idx], chord * chord)
            .map(|p| p.idx)
            .filter(|&j| j == idx || self.distance(idx, j) <= radius_km)
            .collect();

        found.sort_unstable();
        found
    }

    /// The `k` nearest POIs to POI `idx`, including `idx` itself.
    ///
    /// Sorted by distance, ties broken by input index, so results do not
    /// depend on R-tree layout.
    pub fn k_nearest(&self, idx: usize, k: usize) -> Vec<Neighbor> {
        if k == 0 || self.points.is_empty() {
            return Vec::new();
        }
        if !self.is_indexed(idx) {
            return vec![Neighbor {
                idx,
                distance_km: 0.0,
            }];
        }

        let query = self.vectors[idx];
        let mut candidates: Vec<(usize, f64)> = Vec::with_capacity(k + 1);
        let mut kth_distance_2 = f64::INFINITY;

        // Take k candidates, then keep going while there are ties with the k-th
        for p in self.tree.nearest_neighbor_iter(&query) {
            let d2 = p.distance_2(&query);
            if candidates.len() >= k && d2 > kth_distance_2 * (1.0 + CHORD_SLACK) + CHORD_SLACK {
                break;
            }
            candidates.push((p.idx, d2));
            if candidates.len() == k {
                kth_distance_2 = d2;
            }
        }

        let mut neighbors: Vec<Neighbor> = candidates
            .into_iter()
            .map(|(j, _)| Neighbor {
                idx: j,
                distance_km: if j == idx { 0.0 } else { self.distance(idx, j) },
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| (a.idx != idx).cmp(&(b.idx != idx)))
                .then_with(|| a.idx.cmp(&b.idx))
        });
        neighbors.truncate(k);
        neighbors
    }
}
