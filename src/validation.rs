//! Batch boundary validation.
//!
//! Clustering assumes finite, in-range coordinates and unique ids. A batch
//! that breaks either rule is rejected whole rather than partially clustered.

use std::collections::HashSet;

use log::warn;

use crate::{ClusterError, PoiPoint, Result};

/// Check every POI in a batch. Fails on the first offending point.
pub fn validate_batch(points: &[PoiPoint]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(points.len());

    for poi in points {
        if !poi.is_valid() {
            warn!(
                "[Validation] Rejecting batch of {}: POI {} at ({}, {})",
                points.len(),
                poi.id,
                poi.lat,
                poi.lng
            );
            return Err(ClusterError::InvalidCoordinate {
                id: poi.id.clone(),
                lat: poi.lat,
                lng: poi.lng,
            });
        }
        if !seen.insert(poi.id.as_str()) {
            warn!(
                "[Validation] Rejecting batch of {}: duplicate id {}",
                points.len(),
                poi.id
            );
            return Err(ClusterError::DuplicateId { id: poi.id.clone() });
        }
    }

    Ok(())
}
