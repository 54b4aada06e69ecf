//! Unified error type for the clustering engine.
//!
//! Clustering itself never fails: "no structure found" is handled by falling
//! through to the next strategy. Errors only arise at the batch boundary
//! (invalid coordinates, duplicate ids), from bad configuration, or while
//! loading inputs from disk.

use thiserror::Error;

/// Errors produced by validation, configuration, and input loading.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("POI {id} has invalid coordinates ({lat}, {lng})")]
    InvalidCoordinate { id: String, lat: f64, lng: f64 },

    #[error("POI id {id} appears more than once in the batch")]
    DuplicateId { id: String },

    #[error("invalid config value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "cli")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ClusterError {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        ClusterError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the error rejects the batch contents (as opposed to setup problems).
    pub fn is_batch_rejection(&self) -> bool {
        matches!(
            self,
            ClusterError::InvalidCoordinate { .. } | ClusterError::DuplicateId { .. }
        )
    }
}

/// Result type for fallible engine operations.
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Conversions from `Option` into engine errors.
pub trait OptionExt<T> {
    /// Map `None` to `ClusterError::InvalidConfig` for the given field.
    fn ok_or_invalid_config(self, field: &'static str, reason: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_invalid_config(self, field: &'static str, reason: &str) -> Result<T> {
        self.ok_or_else(|| ClusterError::invalid_config(field, reason))
    }
}
