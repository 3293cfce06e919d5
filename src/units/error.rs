//! Error types for the unit algebra.

use thiserror::Error;

/// Result type for unit operations.
pub type Result<T> = std::result::Result<T, UnitError>;

/// Errors raised by unit construction, arithmetic and conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    /// Values cannot be converted between dimensionally different units
    #[error("units not convertible: \"{from}\" and \"{to}\"")]
    NotConvertible { from: String, to: String },

    /// A quantity is already registered with different parameters
    #[error("attempt to redefine base unit for quantity \"{quantity}\": existing \"{existing}\"")]
    Redefinition { quantity: String, existing: String },

    #[error("empty {0} for base unit")]
    EmptyName(&'static str),

    #[error("scale amount must be non-zero")]
    ZeroScale,

    #[error("attempt to take the zero root of \"{0}\"")]
    ZeroRoot(String),

    #[error("power {power} is not integral and its inverse is not integral for \"{unit}\"")]
    NonIntegralPower { unit: String, power: f64 },

    #[error("root {root} of \"{unit}\" would produce a fractional dimension")]
    NonIntegralRoot { unit: String, root: i32 },

    /// An exponent left the range of `i32`
    #[error("exponent overflow computing \"{0}\"")]
    ExponentOverflow(String),

    #[error("logarithm base must be 2, e or 10 (got {0})")]
    InvalidLogBase(f64),

    /// Unsupported operation involving a logarithmic unit
    #[error("logarithmic unit: {0}")]
    Logarithmic(String),

    #[error("\"{0}\" is not dimensionless")]
    NotDimensionless(String),

    #[error("a base unit cannot be given a new identifier")]
    BaseIdentifier,
}
