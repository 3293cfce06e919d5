//! Curvilinear three dimensional grids.
//!
//! Each grid cell is split into four corner tetrahedra and one central
//! tetrahedron. Neighboring cells use mirror images of that split,
//! selected by the parity of `ix + iy + iz`, so that shared faces are cut
//! along the same diagonal. Evaluation is linear inside each tetrahedron;
//! the inverse walks from cell to cell, guided by the barycentric
//! coordinates of the value, until a tetrahedron contains it.

use std::sync::Mutex;

use super::error::{Result, SetError};
use super::gridded::{GriddedSet, check_interpolable, grid_length, grid_to_index};
use super::sampled::SampledSet;
use super::set::{Set, SetCore, SetOptions, narrow, point_count, widen};

/// Barycentric coordinates down to this value still count as inside.
const CONTAINMENT_TOLERANCE: f64 = 1e-9;

/// The five tetrahedra of a cell as corners in the cell's local frame.
///
/// The first four each own one even corner (`000`, `101`, `011`, `110`)
/// and its three neighbors; the last joins the four odd corners.
const TETRAHEDRA: [[[usize; 3]; 4]; 5] = [
    [[0, 0, 0], [1, 0, 0], [0, 1, 0], [0, 0, 1]],
    [[1, 0, 1], [0, 0, 1], [1, 1, 1], [1, 0, 0]],
    [[0, 1, 1], [1, 1, 1], [0, 0, 1], [0, 1, 0]],
    [[1, 1, 0], [0, 1, 0], [1, 0, 0], [1, 1, 1]],
    [[1, 0, 0], [0, 1, 0], [0, 0, 1], [1, 1, 1]],
];

/// Random access to the sample points of a three component set.
pub(crate) trait Points3D {
    fn point(&self, k: usize) -> [f64; 3];
}

impl Points3D for [Vec<f32>] {
    fn point(&self, k: usize) -> [f64; 3] {
        [f64::from(self[0][k]), f64::from(self[1][k]), f64::from(self[2][k])]
    }
}

impl Points3D for [Vec<f64>] {
    fn point(&self, k: usize) -> [f64; 3] {
        [self[0][k], self[1][k], self[2][k]]
    }
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Triple product `a . (b x c)`.
fn det(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> f64 {
    a[0] * (b[1] * c[2] - b[2] * c[1]) + a[1] * (b[2] * c[0] - b[0] * c[2]) + a[2] * (b[0] * c[1] - b[1] * c[0])
}

/// Barycentric coordinates of `p` in the tetrahedron `v`, `None` if flat.
fn barycentric(p: [f64; 3], v: [[f64; 3]; 4]) -> Option<[f64; 4]> {
    let (a, b, c) = (sub(v[1], v[0]), sub(v[2], v[0]), sub(v[3], v[0]));
    let volume = det(a, b, c);
    if volume == 0.0 || !volume.is_finite() {
        return None;
    }
    let r = sub(p, v[0]);
    let l1 = det(r, b, c) / volume;
    let l2 = det(a, r, c) / volume;
    let l3 = det(a, b, r) / volume;
    Some([1.0 - l1 - l2 - l3, l1, l2, l3])
}

/// Whether a cell uses the unmirrored split.
fn is_even(origin: [usize; 3]) -> bool {
    (origin[0] + origin[1] + origin[2]) % 2 == 0
}

/// Flat sample index of a local corner of the cell at `origin`.
fn corner_index(lengths: [usize; 3], origin: [usize; 3], local: [usize; 3], even: bool) -> usize {
    let offset = |axis: usize| if even { local[axis] } else { 1 - local[axis] };
    let (x, y, z) = (origin[0] + offset(0), origin[1] + offset(1), origin[2] + offset(2));
    x + lengths[0] * (y + lengths[1] * z)
}

/// Tetrahedron of the split holding the local point `c` in `[0, 1]³`.
fn select_tetrahedron(c: [f64; 3]) -> usize {
    let [s, t, u] = c;
    if s + t + u <= 1.0 {
        0
    } else if s - t + u >= 1.0 {
        1
    } else if t - s + u >= 1.0 {
        2
    } else if s + t - u >= 1.0 {
        3
    } else {
        4
    }
}

/// Evaluate the piecewise linear map at one grid coordinate.
///
/// Every axis must have at least two samples. Coordinates outside the
/// grid are extrapolated from the nearest boundary tetrahedron.
pub(crate) fn evaluate<P: Points3D + ?Sized>(points: &P, lengths: [usize; 3], g: [f64; 3]) -> [f64; 3] {
    let mut origin = [0_usize; 3];
    for axis in 0..3 {
        origin[axis] = (g[axis].max(0.0) as usize).min(lengths[axis] - 2);
    }
    let even = is_even(origin);
    let local = [0, 1, 2].map(|axis| {
        let f = g[axis] - origin[axis] as f64;
        if even { f } else { 1.0 - f }
    });
    let corners = TETRAHEDRA[select_tetrahedron(local.map(|x| x.clamp(0.0, 1.0)))];
    let frame = corners.map(|corner| corner.map(|b| b as f64));
    let Some(lambda) = barycentric(local, frame) else {
        return [f64::NAN; 3];
    };

    let mut value = [0.0; 3];
    for (l, corner) in lambda.iter().zip(corners) {
        let p = points.point(corner_index(lengths, origin, corner, even));
        for axis in 0..3 {
            value[axis] += l * p[axis];
        }
    }
    value
}

/// Walk from `start` to the cell containing `p`.
///
/// Returns the grid coordinate and the cell it was found in. A value just
/// beyond an outer face is extrapolated from the boundary cell; the caller
/// decides whether it is close enough to count.
pub(crate) fn walk<P: Points3D + ?Sized>(
    points: &P,
    lengths: [usize; 3],
    p: [f64; 3],
    start: [usize; 3],
) -> Option<([f64; 3], [usize; 3])> {
    let max = lengths.map(|n| n - 2);
    let mut origin = [0, 1, 2].map(|axis| start[axis].min(max[axis]));

    for _ in 0..2 * (lengths[0] + lengths[1] + lengths[2]) {
        let even = is_even(origin);

        // tetrahedron with the largest minimum barycentric coordinate
        let mut best: Option<(f64, [f64; 3])> = None;
        for corners in &TETRAHEDRA {
            let v = corners.map(|corner| points.point(corner_index(lengths, origin, corner, even)));
            let Some(lambda) = barycentric(p, v) else {
                continue;
            };
            let worst = lambda.iter().copied().fold(f64::INFINITY, f64::min);
            if best.is_none_or(|(w, _)| worst > w) {
                let mut local = [0.0; 3];
                for (l, corner) in lambda.iter().zip(corners) {
                    for axis in 0..3 {
                        local[axis] += l * corner[axis] as f64;
                    }
                }
                best = Some((worst, local));
            }
        }
        let (worst, local) = best?;

        let relative = local.map(|x| if even { x } else { 1.0 - x });
        let grid = [0, 1, 2].map(|axis| origin[axis] as f64 + relative[axis]);
        if worst >= -CONTAINMENT_TOLERANCE {
            return Some((grid, origin));
        }

        let mut next = origin;
        let mut blocked = false;
        for axis in 0..3 {
            let r = relative[axis];
            if r < 0.0 {
                if origin[axis] > 0 {
                    next[axis] -= 1;
                } else {
                    blocked = true;
                }
            } else if r > 1.0 {
                if origin[axis] < max[axis] {
                    next[axis] += 1;
                } else {
                    blocked = true;
                }
            }
        }
        if next == origin {
            return blocked.then_some((grid, origin));
        }
        origin = next;
    }
    None
}

/// Locate every value, seeding each walk with the previous success.
///
/// `cell` is read as the first starting cell and, on return, holds the
/// cell of the last located value; it is left alone when nothing was
/// located. A single sample set maps every present value to the origin.
pub(crate) fn locate_all<P: Points3D + ?Sized>(
    points: &P,
    lengths: [usize; 3],
    value: &[Vec<f64>],
    cell: &mut Option<[usize; 3]>,
) -> Vec<Vec<f64>> {
    let n = value.first().map_or(0, Vec::len);
    let mut grid = vec![vec![f64::NAN; n]; 3];
    let singleton = lengths.iter().all(|&l| l == 1);
    let center = lengths.map(|l| (l.max(2) - 2) / 2);
    let mut start = cell.unwrap_or(center);

    for i in 0..n {
        let p = [value[0][i], value[1][i], value[2][i]];
        if p.iter().any(|v| v.is_nan()) {
            continue;
        }
        if singleton {
            for axis in &mut grid {
                axis[i] = 0.0;
            }
            continue;
        }
        let Some((g, found)) = walk(points, lengths, p, start) else {
            start = center;
            continue;
        };
        let inside = (0..3).all(|axis| g[axis] > -0.5 && g[axis] < lengths[axis] as f64 - 0.5);
        if inside {
            for axis in 0..3 {
                grid[axis][i] = g[axis];
            }
            start = found;
            *cell = Some(found);
        } else {
            start = center;
        }
    }
    grid
}

/// Map grid coordinates `[axis][point]` through the tetrahedral split.
pub(crate) fn evaluate_all<P: Points3D + ?Sized>(points: &P, lengths: [usize; 3], grid: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = grid.first().map_or(0, Vec::len);
    let singleton = lengths.iter().all(|&l| l == 1);
    let mut value = vec![vec![f64::NAN; n]; 3];
    for i in 0..n {
        let g = [grid[0][i], grid[1][i], grid[2][i]];
        let in_range = (0..3).all(|axis| g[axis] >= -0.5 && g[axis] <= lengths[axis] as f64 - 0.5);
        if !in_range {
            continue;
        }
        let v = if singleton { points.point(0) } else { evaluate(points, lengths, g) };
        for axis in 0..3 {
            value[axis][i] = v[axis];
        }
    }
    value
}

/// Orientation of every cell, checked against the first one.
///
/// The signed volume spanned by the three edges leaving each corner
/// (pointing into the cell) must have the same sign everywhere. Returns
/// the sign at the first corner and the first offending cell, if any.
pub(crate) fn check_orientation<P: Points3D + ?Sized>(points: &P, lengths: [usize; 3]) -> (bool, Option<[usize; 3]>) {
    let mut positive = None;
    for k in 0..lengths[2] - 1 {
        for j in 0..lengths[1] - 1 {
            for i in 0..lengths[0] - 1 {
                let origin = [i, j, k];
                for bits in 0..8_usize {
                    let corner = [bits & 1, (bits >> 1) & 1, (bits >> 2) & 1];
                    let here = points.point(corner_index(lengths, origin, corner, true));
                    let edge = |axis: usize| {
                        let mut other = corner;
                        other[axis] = 1 - corner[axis];
                        let d = sub(points.point(corner_index(lengths, origin, other, true)), here);
                        if corner[axis] == 0 { d } else { d.map(|x| -x) }
                    };
                    let volume = det(edge(0), edge(1), edge(2));
                    let pos = *positive.get_or_insert(volume > 0.0);
                    if (volume > 0.0) != pos {
                        return (pos, Some(origin));
                    }
                }
            }
        }
    }
    (positive.unwrap_or(false), None)
}

/// A three dimensional set whose samples form an `nx` by `ny` by `nz`
/// grid, or a surface or curve embedded in three dimensions.
///
/// # Example
///
/// ```
/// use unitgrid::sets::{Gridded3DSet, GriddedSet};
///
/// // the unit cube
/// let set = Gridded3DSet::new(
///     vec![
///         vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0],
///         vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0],
///         vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
///     ],
///     2,
///     2,
///     2,
/// )
/// .unwrap();
/// let grid = set.value_to_grid(&[vec![0.25], vec![0.5], vec![0.75]]).unwrap();
/// assert!((grid[2][0] - 0.75).abs() < 1e-6);
/// ```
#[derive(Debug)]
pub struct Gridded3DSet {
    sampled: SampledSet,
    lengths: Vec<usize>,
    pos: bool,
    last_cell: Mutex<Option<[usize; 3]>>,
}

impl Clone for Gridded3DSet {
    fn clone(&self) -> Self {
        Self {
            sampled: self.sampled.clone(),
            lengths: self.lengths.clone(),
            pos: self.pos,
            last_cell: Mutex::new(*self.last_cell.lock().unwrap_or_else(|e| e.into_inner())),
        }
    }
}

impl Gridded3DSet {
    /// Grid volume with the orientation check enabled.
    pub fn new(samples: Vec<Vec<f32>>, nx: usize, ny: usize, nz: usize) -> Result<Self> {
        Self::with_options(samples, nx, ny, nz, SetOptions::default(), true)
    }

    /// Grid volume.
    ///
    /// With `test` set, missing samples are rejected and every cell must
    /// have the same orientation as the first.
    pub fn with_options(
        samples: Vec<Vec<f32>>,
        nx: usize,
        ny: usize,
        nz: usize,
        options: SetOptions,
        test: bool,
    ) -> Result<Self> {
        let lengths = [nx, ny, nz];
        let length = grid_length(&lengths)?;
        let core = options.into_core(3, 3, length)?;
        let mut sampled = SampledSet::new(core, samples)?;
        sampled.rehash(&lengths);

        let mut pos = false;
        if lengths.iter().all(|&n| n > 1) {
            let s = sampled.samples();
            if test {
                if let Some(index) = s.iter().flat_map(|c| c.iter().position(|v| v.is_nan())).min() {
                    return Err(SetError::MissingSample { index });
                }
            }
            let (positive, invalid) = check_orientation(s, lengths);
            if let (true, Some([i, j, k])) = (test, invalid) {
                return Err(SetError::InvalidGrid(format!(
                    "Gridded3DSet samples do not form a valid grid ({i},{j},{k})"
                )));
            }
            pos = positive;
        }

        Ok(Self {
            sampled,
            lengths: lengths.to_vec(),
            pos,
            last_cell: Mutex::new(None),
        })
    }

    /// A surface of `nx` by `ny` points in space. Only index based
    /// operations are available on surfaces.
    pub fn surface(samples: Vec<Vec<f32>>, nx: usize, ny: usize) -> Result<Self> {
        Self::embedded(samples, &[nx, ny], SetOptions::default())
    }

    /// A curve of `n` points in space. Only index based operations are
    /// available on curves.
    pub fn curve(samples: Vec<Vec<f32>>, n: usize) -> Result<Self> {
        Self::embedded(samples, &[n], SetOptions::default())
    }

    /// Surface or curve with explicit options.
    pub fn embedded(samples: Vec<Vec<f32>>, lengths: &[usize], options: SetOptions) -> Result<Self> {
        if !(1..=2).contains(&lengths.len()) {
            return Err(SetError::DimensionMismatch {
                context: "Gridded3DSet embedded manifold",
                expected: 2,
                found: lengths.len(),
            });
        }
        let length = grid_length(lengths)?;
        let core = options.into_core(3, lengths.len(), length)?;
        let mut sampled = SampledSet::new(core, samples)?;
        sampled.rehash(lengths);
        Ok(Self {
            sampled,
            lengths: lengths.to_vec(),
            pos: false,
            last_cell: Mutex::new(None),
        })
    }

    pub fn sampled(&self) -> &SampledSet {
        &self.sampled
    }

    /// Whether the grid axes form a right handed frame.
    pub fn is_positive(&self) -> bool {
        self.pos
    }

    fn volume_lengths(&self, context: &'static str) -> Result<[usize; 3]> {
        match self.lengths.as_slice() {
            &[nx, ny, nz] => {
                check_interpolable(context, &self.lengths)?;
                Ok([nx, ny, nz])
            }
            other => Err(SetError::DimensionMismatch {
                context,
                expected: 3,
                found: other.len(),
            }),
        }
    }

    fn search(&self, value: &[Vec<f32>], cell: &mut Option<[usize; 3]>) -> Result<Vec<Vec<f32>>> {
        let lengths = self.volume_lengths("Gridded3DSet value_to_grid")?;
        point_count("Gridded3DSet value_to_grid", 3, value)?;
        let value = widen(value.to_vec());
        Ok(narrow(&locate_all(self.sampled.samples(), lengths, &value, cell)))
    }
}

impl Set for Gridded3DSet {
    fn core(&self) -> &SetCore {
        self.sampled.core()
    }

    fn low(&self) -> &[f32] {
        self.sampled.low()
    }

    fn hi(&self) -> &[f32] {
        self.sampled.hi()
    }

    fn hash_code(&self) -> u64 {
        self.sampled.hash_code()
    }

    fn samples(&self) -> Result<Vec<Vec<f32>>> {
        Ok(self.sampled.samples().to_vec())
    }

    fn index_to_value(&self, index: &[usize]) -> Result<Vec<Vec<f32>>> {
        Ok(self.sampled.values_at(index))
    }

    fn value_to_index(&self, value: &[Vec<f32>]) -> Result<Vec<Option<usize>>> {
        point_count("Gridded3DSet value_to_index", 3, value)?;
        let grid = self.value_to_grid(value)?;
        Ok(grid_to_index(&grid, &self.lengths))
    }
}

impl GriddedSet for Gridded3DSet {
    fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    fn grid_to_value(&self, grid: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        let lengths = self.volume_lengths("Gridded3DSet grid_to_value")?;
        point_count("Gridded3DSet grid_to_value", 3, grid)?;
        let grid = widen(grid.to_vec());
        Ok(narrow(&evaluate_all(self.sampled.samples(), lengths, &grid)))
    }

    fn value_to_grid(&self, value: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        let mut last = self.last_cell.lock().unwrap_or_else(|e| e.into_inner());
        self.search(value, &mut last)
    }

    fn value_to_grid_with_guess(
        &self,
        value: &[Vec<f32>],
        guess: &mut Option<Vec<usize>>,
    ) -> Result<Vec<Vec<f32>>> {
        let mut cell = match guess.as_deref() {
            Some(&[x, y, z]) => Some([x, y, z]),
            Some(other) => {
                return Err(SetError::DimensionMismatch {
                    context: "Gridded3DSet guess",
                    expected: 3,
                    found: other.len(),
                });
            }
            None => None,
        };
        let grid = self.search(value, &mut cell)?;
        if let Some(found) = cell {
            *guess = Some(found.to_vec());
        }
        Ok(grid)
    }
}

impl PartialEq for Gridded3DSet {
    fn eq(&self, other: &Self) -> bool {
        self.lengths == other.lengths && self.sampled.same_samples(&other.sampled)
    }
}
