//! Caller supplied triangulations and closed path utilities.
//!
//! A path is a closed polygon given as `[dimension][point]` samples; the
//! last point connects back to the first.

use std::f64::consts::{PI, TAU};

use super::error::{DelaunayError, Result};
use super::triangulation::Triangulation;

/// Segment pairs closer to parallel than this are never reported as
/// crossing by [`check_self_intersection`].
pub const PARALLEL_TOLERANCE: f64 = 1e-7;

type Point = [f64; 2];

/// Planar points of `samples`, rejecting anything but finite 2-D data
/// with equal component lengths.
fn planar(samples: &[Vec<f32>], three_d: &'static str) -> Result<Vec<Point>> {
    match samples.len() {
        2 => {}
        3 => return Err(DelaunayError::Unimplemented(three_d)),
        d => return Err(DelaunayError::InvalidDimension(d)),
    }
    if samples[0].len() != samples[1].len() {
        return Err(DelaunayError::LengthMismatch {
            expected: samples[0].len(),
            found: samples[1].len(),
        });
    }
    samples[0]
        .iter()
        .zip(&samples[1])
        .enumerate()
        .map(|(index, (&x, &y))| {
            if x.is_finite() && y.is_finite() {
                Ok([f64::from(x), f64::from(y)])
            } else {
                Err(DelaunayError::NonFiniteSample { index })
            }
        })
        .collect()
}

fn cross(a: Point, b: Point) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

fn sub(a: Point, b: Point) -> Point {
    [a[0] - b[0], a[1] - b[1]]
}

/// Positive when `p` lies left of the directed line `a -> b`.
fn side(a: Point, b: Point, p: Point) -> f64 {
    cross(sub(b, a), sub(p, a))
}

/// Parameters along `a -> b` and `c -> d` of the crossing point of the
/// two lines, or `None` when the determinant is within `tolerance` of 0.
fn crossing(a: Point, b: Point, c: Point, d: Point, tolerance: f64) -> Option<(f64, f64)> {
    let det = (b[0] - a[0]) * (c[1] - d[1]) - (b[1] - a[1]) * (c[0] - d[0]);
    if det.abs() <= tolerance {
        return None;
    }
    let along_cd = ((b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])) / det;
    let along_ab = ((c[0] - a[0]) * (c[1] - d[1]) - (c[1] - a[1]) * (c[0] - d[0])) / det;
    Some((along_ab, along_cd))
}

fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    0.5 * (0..n).map(|i| cross(points[i], points[(i + 1) % n])).sum::<f64>()
}

fn self_intersects(points: &[Point]) -> bool {
    let n = points.len();
    for i in 0..n {
        let (a, b) = (points[i], points[(i + 1) % n]);
        for j in i + 2..n {
            // the closing segment touches the first
            if i == 0 && j == n - 1 {
                continue;
            }
            let (c, d) = (points[j], points[(j + 1) % n]);
            if let Some((s, t)) = crossing(a, b, c, d, PARALLEL_TOLERANCE) {
                if 0.0 < s && s < 1.0 && 0.0 < t && t < 1.0 {
                    tracing::trace!(first = i, second = j, "path segments cross");
                    return true;
                }
            }
        }
    }
    false
}

/// Whether two non-adjacent segments of the closed `path` cross.
///
/// Segments meeting only at an end point do not count.
pub fn check_self_intersection(path: &[Vec<f32>]) -> Result<bool> {
    let points = planar(path, "path intersection in three dimensions")?;
    Ok(self_intersects(&points))
}

/// Unsigned area enclosed by the closed `path`; 0 for fewer than three
/// points.
///
/// # Errors
///
/// [`DelaunayError::SelfIntersecting`] if the path crosses itself.
pub fn path_area(path: &[Vec<f32>]) -> Result<f64> {
    let points = planar(path, "path area in three dimensions")?;
    if points.len() < 3 {
        return Ok(0.0);
    }
    if self_intersects(&points) {
        return Err(DelaunayError::SelfIntersecting);
    }
    Ok(signed_area(&points).abs())
}

/// Whether `(x, y)` lies inside the closed `path`, by winding angle.
pub fn inside(path: &[Vec<f32>], x: f32, y: f32) -> Result<bool> {
    let points = planar(path, "path containment in three dimensions")?;
    let Some(&last) = points.last() else {
        return Ok(false);
    };
    let (x, y) = (f64::from(x), f64::from(y));
    let bearing = |p: Point| (p[1] - y).atan2(p[0] - x);

    let mut previous = bearing(last);
    let mut winding = 0.0;
    for &p in &points {
        let angle = bearing(p);
        let mut turn = angle - previous;
        if turn > PI {
            turn -= TAU;
        } else if turn < -PI {
            turn += TAU;
        }
        winding += turn;
        previous = angle;
    }
    Ok(winding.abs() > PI)
}

/// Split the region enclosed by the closed `path` into triangles whose
/// vertices are path points, by ear clipping.
///
/// Consecutive identical points are skipped, so a closed path may repeat
/// its first point at the end. A path of fewer than three distinct points
/// yields no triangles. The result indexes `path` and has the path's
/// orientation.
///
/// # Errors
///
/// - [`DelaunayError::SelfIntersecting`] if `check` is set and the path
///   crosses itself.
/// - [`DelaunayError::Unfillable`] if clipping stalls in both orientations.
pub fn fill(path: &[Vec<f32>], check: bool) -> Result<Vec<[usize; 3]>> {
    let points = planar(path, "path fill in three dimensions")?;
    let n = points.len();
    let ring: Vec<usize> = (0..n).filter(|&i| points[i] != points[(i + 1) % n]).collect();
    let m = ring.len();
    if m < 3 {
        return Ok(Vec::new());
    }
    let boundary: Vec<Point> = ring.iter().map(|&i| points[i]).collect();
    if check && self_intersects(&boundary) {
        return Err(DelaunayError::SelfIntersecting);
    }

    let mut next: Vec<usize> = (0..m).map(|i| (i + 1) % m).collect();
    let mut prev: Vec<usize> = (0..m).map(|i| (i + m - 1) % m).collect();
    let mut positive = signed_area(&boundary) > 0.0;

    let mut tri = Vec::with_capacity(m - 2);
    let mut remaining = m;
    let mut i = 0;
    let mut stalled = 0;
    let mut flipped = false;
    while remaining > 2 {
        let j = next[i];
        let k = next[j];
        if is_ear(&boundary, &next, &prev, [i, j, k], positive) {
            tri.push([ring[i], ring[j], ring[k]]);
            next[i] = k;
            prev[k] = i;
            remaining -= 1;
            stalled = 0;
        } else {
            i = j;
            if stalled > remaining {
                if flipped {
                    tracing::debug!(clipped = tri.len(), remaining, "ear clipping stalled");
                    return Err(DelaunayError::Unfillable { triangles: tri });
                }
                flipped = true;
                positive = !positive;
                stalled = 0;
            } else {
                stalled += 1;
            }
        }
    }
    tracing::debug!(points = m, triangles = tri.len(), flipped, "path filled");
    Ok(tri)
}

/// Whether corner `j` of `i -> j -> k` can be cut off the boundary.
fn is_ear(p: &[Point], next: &[usize], prev: &[usize], [i, j, k]: [usize; 3], positive: bool) -> bool {
    if (cross(sub(p[j], p[i]), sub(p[k], p[j])) > 0.0) != positive {
        return false;
    }
    // the last triangle
    if next[k] == i {
        return true;
    }

    let kn = p[next[k]];
    if (side(p[i], p[k], kn) > 0.0) != positive && (side(p[k], p[j], kn) > 0.0) != positive {
        return false;
    }
    let ip = p[prev[i]];
    if (side(p[i], p[k], ip) > 0.0) != positive && (side(p[j], p[i], ip) > 0.0) != positive {
        return false;
    }

    // the cut i -> k must not touch the rest of the boundary
    let mut a = next[k];
    let mut b = next[a];
    while b != i {
        if let Some((s, t)) = crossing(p[i], p[k], p[a], p[b], 0.0) {
            if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) {
                return false;
            }
        }
        a = b;
        b = next[a];
    }
    true
}

/// A triangulation whose triangles are supplied by the caller.
///
/// # Example
///
/// ```
/// use unitgrid::delaunay::DelaunayCustom;
///
/// // an L shaped region
/// let path = vec![
///     vec![0.0, 2.0, 2.0, 1.0, 1.0, 0.0],
///     vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0],
/// ];
/// let custom = DelaunayCustom::fill(&path).unwrap();
/// assert_eq!(custom.triangulation().len(), 4);
/// assert!((custom.area() - 3.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct DelaunayCustom {
    points: Vec<Point>,
    triangulation: Triangulation,
}

impl DelaunayCustom {
    /// Wrap `tri`, triangles over the `[dimension][point]` `samples`.
    ///
    /// # Errors
    ///
    /// Fails for dimensions other than 2 (3 is reported as unimplemented),
    /// components of different length, non-finite coordinates, vertex
    /// indices past the last point, or triangles repeating a vertex.
    pub fn new(samples: &[Vec<f32>], tri: Vec<[usize; 3]>) -> Result<Self> {
        let points = planar(samples, "DelaunayCustom in three dimensions")?;
        let n = points.len();
        for (triangle, corners) in tri.iter().enumerate() {
            if let Some(&index) = corners.iter().find(|&&v| v >= n) {
                return Err(DelaunayError::IndexOutOfRange { triangle, index });
            }
            if corners[0] == corners[1] || corners[1] == corners[2] || corners[2] == corners[0] {
                return Err(DelaunayError::DegenerateTriangle(triangle));
            }
        }
        tracing::debug!(points = n, triangles = tri.len(), "custom triangulation accepted");
        Ok(Self {
            points,
            triangulation: Triangulation::new(tri, n),
        })
    }

    /// Triangulate the region enclosed by the closed `path`.
    ///
    /// # Errors
    ///
    /// As [`fill`] with checking enabled, plus the checks of
    /// [`DelaunayCustom::new`].
    pub fn fill(path: &[Vec<f32>]) -> Result<Self> {
        let tri = fill(path, true)?;
        Self::new(path, tri)
    }

    pub fn triangulation(&self) -> &Triangulation {
        &self.triangulation
    }

    pub fn into_triangulation(self) -> Triangulation {
        self.triangulation
    }

    /// Total unsigned area of the triangles.
    pub fn area(&self) -> f64 {
        self.triangulation
            .tri
            .iter()
            .map(|&[a, b, c]| 0.5 * side(self.points[a], self.points[b], self.points[c]).abs())
            .sum()
    }

    /// First triangle containing `(x, y)`, edges included.
    pub fn find_triangle(&self, x: f64, y: f64) -> Option<usize> {
        self.triangulation.tri.iter().position(|&[a, b, c]| {
            let (a, b, c) = (self.points[a], self.points[b], self.points[c]);
            let sides = [side(a, b, [x, y]), side(b, c, [x, y]), side(c, a, [x, y])];
            sides.iter().all(|&s| s >= 0.0) || sides.iter().all(|&s| s <= 0.0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Vec<f32>> {
        vec![vec![0.0, 1.0, 1.0, 0.0], vec![0.0, 0.0, 1.0, 1.0]]
    }

    fn bowtie() -> Vec<Vec<f32>> {
        vec![vec![0.0, 1.0, 1.0, 0.0], vec![0.0, 1.0, 0.0, 1.0]]
    }

    #[test]
    fn test_square_fill() {
        let tri = fill(&square(), true).unwrap();
        assert_eq!(tri, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_self_intersection() {
        assert!(!check_self_intersection(&square()).unwrap());
        assert!(check_self_intersection(&bowtie()).unwrap());
        assert_eq!(path_area(&bowtie()).unwrap_err(), DelaunayError::SelfIntersecting);
        assert_eq!(fill(&bowtie(), true).unwrap_err(), DelaunayError::SelfIntersecting);
    }

    #[test]
    fn test_area_ignores_orientation() {
        let mut clockwise = square();
        clockwise[0].reverse();
        clockwise[1].reverse();
        assert_relative_eq!(path_area(&square()).unwrap(), 1.0);
        assert_relative_eq!(path_area(&clockwise).unwrap(), 1.0);
        assert_eq!(path_area(&[vec![0.0, 1.0], vec![0.0, 1.0]]).unwrap(), 0.0);
    }

    #[test]
    fn test_inside_winding() {
        let path = square();
        assert!(inside(&path, 0.5, 0.5).unwrap());
        assert!(inside(&path, 0.01, 0.99).unwrap());
        assert!(!inside(&path, 1.5, 0.5).unwrap());
        assert!(!inside(&path, -0.2, -0.2).unwrap());
        assert!(!inside(&[vec![], vec![]], 0.0, 0.0).unwrap());
    }

    #[test]
    fn test_repeated_points_are_skipped() {
        let path = vec![vec![0.0, 1.0, 1.0, 1.0, 0.0, 0.0], vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0]];
        let tri = fill(&path, true).unwrap();
        assert_eq!(tri.len(), 2);
        assert!(tri.iter().flatten().all(|&v| v != 1 && v != 5));
        assert!(fill(&[vec![2.0; 3], vec![1.0; 3]], true).unwrap().is_empty());
    }

    #[test]
    fn test_custom_validation() {
        let samples = square();
        assert_eq!(
            DelaunayCustom::new(&samples, vec![[0, 1, 4]]).unwrap_err(),
            DelaunayError::IndexOutOfRange { triangle: 0, index: 4 }
        );
        assert_eq!(
            DelaunayCustom::new(&samples, vec![[0, 1, 2], [2, 3, 2]]).unwrap_err(),
            DelaunayError::DegenerateTriangle(1)
        );
        assert_eq!(
            DelaunayCustom::new(&[vec![0.0, 1.0], vec![0.0]], vec![]).unwrap_err(),
            DelaunayError::LengthMismatch { expected: 2, found: 1 }
        );
        assert_eq!(
            DelaunayCustom::new(&[vec![0.0, f32::NAN], vec![0.0, 1.0]], vec![]).unwrap_err(),
            DelaunayError::NonFiniteSample { index: 1 }
        );
        assert!(matches!(
            DelaunayCustom::new(&[vec![0.0], vec![0.0], vec![0.0]], vec![]),
            Err(DelaunayError::Unimplemented(_))
        ));
        assert_eq!(
            DelaunayCustom::new(&[vec![0.0]], vec![]).unwrap_err(),
            DelaunayError::InvalidDimension(1)
        );
    }

    #[test]
    fn test_find_triangle() {
        let custom = DelaunayCustom::new(&square(), vec![[0, 1, 2], [0, 2, 3]]).unwrap();
        assert_eq!(custom.find_triangle(0.8, 0.2), Some(0));
        assert_eq!(custom.find_triangle(0.2, 0.8), Some(1));
        assert_eq!(custom.find_triangle(0.5, 0.5), Some(0));
        assert_eq!(custom.find_triangle(1.2, 0.5), None);
        assert_eq!(custom.triangulation().num_edges, 5);
        assert_eq!(custom.triangulation().boundary_edges(), 4);
    }
}
