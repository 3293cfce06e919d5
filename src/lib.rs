//! # unitgrid
//!
//! Physical units and gridded sample geometry for scientific data.
//!
//! This crate provides:
//! - A unit algebra (base, scaled, offset, derived and logarithmic units)
//!   with exact value conversion between convertible units
//! - Sample sets in R^N with forward and inverse grid interpolation
//!   (linear, irregular, curvilinear and lat/lon grids)
//! - A fast divide and conquer planar triangulator, plus caller supplied
//!   triangulations and polygon filling

pub mod delaunay;
pub mod sets;
pub mod units;

// Re-export main types for convenience
pub use delaunay::{DelaunayCustom, DelaunayError, DelaunayFast, Triangulation};
pub use sets::{
    Gridded1DDoubleSet, Gridded1DSet, Gridded2DSet, Gridded3DDoubleSet, Gridded3DSet, GriddedLatLonSet, GriddedNDSet,
    GriddedSet, LatLonOrder, Linear1DSet, LinearLatLonSet, LinearNDSet, SampledSet, Set, SetError, SetOptions,
};
pub use units::{BaseUnit, DerivedUnit, Unit, UnitError, UnitRegistry};
