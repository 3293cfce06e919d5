//! Fast approximate planar triangulation.
//!
//! [`DelaunayFast`] bisects the point set along alternating axes, solves
//! the leaves directly and zips neighboring sub-triangulations together
//! along their hull tangents. The result is close to, but not always, a
//! true Delaunay triangulation. [`DelaunayCustom`] wraps triangles
//! supplied by the caller, or fills a closed path by ear clipping.
//!
//! # Example
//!
//! ```
//! use unitgrid::delaunay::DelaunayFast;
//!
//! // corners of a unit square
//! let samples = vec![vec![0.0, 1.0, 0.0, 1.0], vec![0.0, 0.0, 1.0, 1.0]];
//! let triangulation = DelaunayFast::new(&samples).unwrap().into_triangulation();
//! assert_eq!(triangulation.len(), 2);
//! assert!(triangulation.vertices.iter().all(|v| !v.is_empty()));
//! ```

mod custom;
mod error;
mod fast;
mod triangulation;

pub use custom::{DelaunayCustom, PARALLEL_TOLERANCE, check_self_intersection, fill, inside, path_area};
pub use error::{DelaunayError, Result};
pub use fast::{DelaunayFast, HULL_SWEEP_PASSES, ROTATION_ANGLE};
pub use triangulation::Triangulation;
