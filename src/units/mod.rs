//! Physical unit algebra.
//!
//! Units are built from base units held in a [`UnitRegistry`]. Every unit
//! reduces to a [`DerivedUnit`] (an exponent vector over base units); two
//! units are convertible when their exponent vectors match, ignoring
//! dimensionless bases such as the radian.
//!
//! # Example
//!
//! ```
//! use unitgrid::units::{Unit, UnitRegistry};
//!
//! let si = UnitRegistry::with_si();
//! let m = Unit::from(si.quantity_to_unit("Length").unwrap());
//! let s = Unit::from(si.quantity_to_unit("Time").unwrap());
//!
//! let speed = m.divide(&s).unwrap();
//! let knot = speed.scale(1852.0 / 3600.0).unwrap();
//!
//! let mps = speed.to_this(&[10.0_f64], &knot).unwrap();
//! assert!((mps[0] - 5.144444).abs() < 1e-6);
//! ```

mod conversion;
mod derived;
mod error;
mod registry;
mod unit;

pub use derived::{DerivedUnit, Factor};
pub use error::{Result, UnitError};
pub use registry::{BaseUnit, UnitRegistry};
pub use unit::{LogarithmicUnit, OffsetUnit, ScaledUnit, Unit};
