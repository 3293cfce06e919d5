//! Error types for sampled sets.

use thiserror::Error;

use crate::units::UnitError;

/// Result type for set operations.
pub type Result<T> = std::result::Result<T, SetError>;

/// Errors raised by set construction and grid queries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetError {
    /// Array dimension disagrees with the declared domain or manifold dimension
    #[error("{context}: dimension {found} does not match expected {expected}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    /// Component arrays have inconsistent lengths
    #[error("{context}: length {found} does not match expected {expected}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    /// Interpolation needs every grid axis to have at least two samples
    #[error("{0}: requires all grid dimensions to be > 1")]
    DegenerateGrid(&'static str),

    #[error("{0}: samples are not monotonic")]
    NotMonotonic(&'static str),

    /// Samples do not form a consistently oriented grid
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("invalid length: {0}")]
    InvalidLength(String),

    #[error("{0} is not implemented")]
    Unimplemented(&'static str),

    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    #[error("sample {index} may not be missing")]
    MissingSample { index: usize },

    #[error(transparent)]
    Unit(#[from] UnitError),
}
