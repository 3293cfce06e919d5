//! Error types for triangulation.

use thiserror::Error;

/// Result type for triangulation.
pub type Result<T> = std::result::Result<T, DelaunayError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DelaunayError {
    #[error("dimension must be 2 or 3, found {0}")]
    InvalidDimension(usize),

    /// Three dimensional tetrahedralization
    #[error("{0} is not implemented")]
    Unimplemented(&'static str),

    #[error("triangulation is futile with less than 3 samples (found {0})")]
    TooFewPoints(usize),

    #[error("sample {index} is not finite")]
    NonFiniteSample { index: usize },

    #[error("sample components differ in length: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("triangle {triangle} refers to point {index}, which does not exist")]
    IndexOutOfRange { triangle: usize, index: usize },

    /// A triangle repeats one of its vertices
    #[error("triangle {0} is degenerate")]
    DegenerateTriangle(usize),

    #[error("path self intersects")]
    SelfIntersecting,

    /// Ear clipping stalled after trying both orientations; carries the
    /// triangles clipped so far.
    #[error("path could not be filled ({} triangles clipped)", .triangles.len())]
    Unfillable { triangles: Vec<[usize; 3]> },
}
