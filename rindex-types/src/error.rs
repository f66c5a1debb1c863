//! Error types shared across the index crates.

use thiserror::Error;

/// Errors reported by the spatial index and its support types.
///
/// Absent rectangles on `remove` and non-intersecting `search` calls are
/// not errors; those paths return empty results or no-op instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// Construction parameters violate a documented bound.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Two coordinate vectors of different lengths were combined.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A Hilbert range query was issued with inconsistent bounds.
    #[error("Invalid query bounds: {0}")]
    InvalidQueryBounds(String),

    /// A `Ranges` container refused an element beyond its capacity.
    #[error("Range capacity exceeded: {capacity}")]
    CapacityExceeded { capacity: usize },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, IndexError>;
