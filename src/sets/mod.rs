//! Sample sets over real-valued domains.
//!
//! Every set maps between flat sample indices and domain values. Gridded
//! sets add a topology: fractional grid coordinates interpolate between
//! samples, and [`GriddedSet::value_to_grid`] inverts that map.
//!
//! Arrays are laid out `[component][point]`. A missing value is NaN and a
//! missing index is `None`.
//!
//! # Example
//!
//! ```
//! use unitgrid::sets::{GriddedSet, Linear1DSet, LinearNDSet, Set};
//!
//! let x = Linear1DSet::new(0.0, 1.0, 11).unwrap();
//! let y = Linear1DSet::new(-1.0, 1.0, 5).unwrap();
//! let plane = LinearNDSet::from_axes(vec![x, y], Default::default()).unwrap();
//!
//! let grid = plane.value_to_grid(&[vec![0.55], vec![0.25]]).unwrap();
//! assert!((grid[0][0] - 5.5).abs() < 1e-5);
//! assert!((grid[1][0] - 2.5).abs() < 1e-5);
//! ```

mod error;
mod gridded;
mod gridded_1d;
mod gridded_1d_double;
mod gridded_2d;
mod gridded_3d;
mod gridded_3d_double;
mod gridded_latlon;
mod linear_1d;
mod linear_latlon;
mod linear_nd;
mod sampled;
mod set;

pub use error::{Result, SetError};
pub use gridded::{GriddedNDSet, GriddedSet, Interpolation, interpolation_weights, make_gridded_set, wedge};
pub use gridded_1d::Gridded1DSet;
pub use gridded_1d_double::{Gridded1DDoubleSet, Gridded1DDoubleSetCache};
pub use gridded_2d::Gridded2DSet;
pub use gridded_3d::Gridded3DSet;
pub use gridded_3d_double::Gridded3DDoubleSet;
pub use gridded_latlon::{
    DATELINE_SPAN_DEGREES, GRANULE_SPLIT_DEGREES, GriddedLatLonSet, Location, great_circle_angle, inside_triangle,
    to_xyz,
};
pub use linear_1d::Linear1DSet;
pub use linear_latlon::{LatLonOrder, LinearLatLonSet};
pub use linear_nd::LinearNDSet;
pub use sampled::SampledSet;
pub use set::{CoordinateSystem, ErrorEstimate, Set, SetCore, SetOptions};
