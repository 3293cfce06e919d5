//! Curvilinear two dimensional grids.
//!
//! Each grid cell is split along its `(1,0)`-`(0,1)` diagonal into a lower
//! and an upper triangle. Forward evaluation is linear inside each
//! triangle; the inverse walks from cell to cell using the signs of edge
//! cross products until the triangle containing the value is found.

use std::sync::Mutex;

use super::error::{Result, SetError};
use super::gridded::{GriddedSet, check_interpolable, grid_length, grid_to_index};
use super::sampled::SampledSet;
use super::set::{Set, SetCore, SetOptions, point_count};

fn cross(a: [f32; 2], b: [f32; 2]) -> f32 {
    a[0] * b[1] - a[1] * b[0]
}

fn sub(a: [f32; 2], b: [f32; 2]) -> [f32; 2] {
    [a[0] - b[0], a[1] - b[1]]
}

/// A two dimensional set whose samples form an `nx` by `ny` grid, or a
/// curve of `n` points when built with [`Gridded2DSet::curve`].
///
/// # Example
///
/// ```
/// use unitgrid::sets::{Gridded2DSet, GriddedSet};
///
/// // a 2x2 unit square
/// let set = Gridded2DSet::new(vec![vec![0.0, 1.0, 0.0, 1.0], vec![0.0, 0.0, 1.0, 1.0]], 2, 2).unwrap();
/// let grid = set.value_to_grid(&[vec![0.25], vec![0.5]]).unwrap();
/// assert!((grid[0][0] - 0.25).abs() < 1e-6);
/// assert!((grid[1][0] - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug)]
pub struct Gridded2DSet {
    sampled: SampledSet,
    lengths: Vec<usize>,
    /// Orientation of the first cell; every cell shares it when tested.
    pos: bool,
    last_cell: Mutex<Option<[usize; 2]>>,
}

impl Clone for Gridded2DSet {
    fn clone(&self) -> Self {
        Self {
            sampled: self.sampled.clone(),
            lengths: self.lengths.clone(),
            pos: self.pos,
            last_cell: Mutex::new(*self.last_cell.lock().unwrap_or_else(|e| e.into_inner())),
        }
    }
}

impl Gridded2DSet {
    /// Grid surface with the orientation check enabled.
    pub fn new(samples: Vec<Vec<f32>>, nx: usize, ny: usize) -> Result<Self> {
        Self::with_options(samples, nx, ny, SetOptions::default(), true)
    }

    /// Grid surface.
    ///
    /// With `test` set, missing samples are rejected and every cell must
    /// have the same orientation as the first.
    pub fn with_options(
        samples: Vec<Vec<f32>>,
        nx: usize,
        ny: usize,
        options: SetOptions,
        test: bool,
    ) -> Result<Self> {
        let length = grid_length(&[nx, ny])?;
        let core = options.into_core(2, 2, length)?;
        let mut sampled = SampledSet::new(core, samples)?;
        sampled.rehash(&[nx, ny]);

        let mut pos = false;
        if nx > 1 && ny > 1 {
            let s = sampled.samples();
            let (s0, s1) = (&s[0], &s[1]);
            pos = (s0[1] - s0[0]) * (s1[nx + 1] - s1[1]) - (s1[1] - s1[0]) * (s0[nx + 1] - s0[1]) > 0.0;

            if test {
                if let Some(index) = s0.iter().position(|v| v.is_nan()) {
                    return Err(SetError::MissingSample { index });
                }
                let at = |k: usize| [s0[k], s1[k]];
                for j in 0..ny - 1 {
                    for i in 0..nx - 1 {
                        let v00 = at(j * nx + i);
                        let v10 = at(j * nx + i + 1);
                        let v01 = at((j + 1) * nx + i);
                        let v11 = at((j + 1) * nx + i + 1);
                        let turns = [(v00, v10, v11), (v10, v11, v01), (v11, v01, v00), (v01, v00, v10)];
                        let consistent = turns
                            .iter()
                            .all(|&(a, b, c)| (cross(sub(b, a), sub(c, b)) > 0.0) == pos);
                        if !consistent {
                            return Err(SetError::InvalidGrid(format!(
                                "Gridded2DSet samples do not form a valid grid ({i},{j})"
                            )));
                        }
                    }
                }
            }
        }

        Ok(Self {
            sampled,
            lengths: vec![nx, ny],
            pos,
            last_cell: Mutex::new(None),
        })
    }

    /// A curve of `n` points in the plane. Only index based operations
    /// are available on curves.
    pub fn curve(samples: Vec<Vec<f32>>, n: usize) -> Result<Self> {
        Self::curve_with_options(samples, n, SetOptions::default())
    }

    pub fn curve_with_options(samples: Vec<Vec<f32>>, n: usize, options: SetOptions) -> Result<Self> {
        grid_length(&[n])?;
        let core = options.into_core(2, 1, n)?;
        let mut sampled = SampledSet::new(core, samples)?;
        sampled.rehash(&[n]);
        Ok(Self {
            sampled,
            lengths: vec![n],
            pos: false,
            last_cell: Mutex::new(None),
        })
    }

    pub fn sampled(&self) -> &SampledSet {
        &self.sampled
    }

    pub fn low_x(&self) -> f32 {
        self.sampled.low()[0]
    }

    pub fn hi_x(&self) -> f32 {
        self.sampled.hi()[0]
    }

    pub fn low_y(&self) -> f32 {
        self.sampled.low()[1]
    }

    pub fn hi_y(&self) -> f32 {
        self.sampled.hi()[1]
    }

    /// Whether cells are traversed counter-clockwise.
    pub fn is_positive(&self) -> bool {
        self.pos
    }

    fn check_surface(&self, context: &'static str) -> Result<()> {
        if self.lengths.len() < 2 {
            return Err(SetError::DimensionMismatch {
                context,
                expected: 2,
                found: self.lengths.len(),
            });
        }
        check_interpolable(context, &self.lengths)
    }

    /// Walk the grid for each value, starting from `cell`.
    fn locate(&self, value: &[Vec<f32>], cell: &mut Option<[usize; 2]>) -> Vec<Vec<f32>> {
        let (nx, ny) = (self.lengths[0], self.lengths[1]);
        let n = value[0].len();
        let mut grid = vec![vec![f32::NAN; n]; 2];
        let s = self.sampled.samples();
        let at = |k: usize| [s[0][k], s[1][k]];

        let center = [((nx - 1) / 2) as isize, ((ny - 1) / 2) as isize];
        let (mut gx, mut gy) = match *cell {
            Some([x, y]) if x < nx && y < ny => (x as isize, y as isize),
            _ => (center[0], center[1]),
        };
        let max_x = nx as isize - 2;
        let max_y = ny as isize - 2;
        let mut lowertri = true;

        for i in 0..n {
            let p = [value[0][i], value[1][i]];
            if self.sampled.core().len() == 1 {
                if !p[0].is_nan() && !p[1].is_nan() {
                    grid[0][i] = 0.0;
                    grid[1][i] = 0.0;
                }
                continue;
            }
            if i != 0 && grid[0][i - 1].is_nan() {
                gx = center[0];
                gy = center[1];
            }
            if p[0].is_nan() || p[1].is_nan() {
                continue;
            }

            for _ in 0..2 * (nx + ny) {
                let base = gy as usize * nx + gx as usize;
                let v0 = at(base);
                let v1 = at(base + 1);
                let v2 = at(base + nx);
                let v3 = at(base + nx + 1);
                let bd = sub(v2, v1);
                let bp = sub(p, v1);
                let dp = sub(p, v2);
                let (ogx, ogy) = (gx, gy);

                if lowertri {
                    let t1 = cross(sub(v1, v0), sub(p, v0));
                    let t2 = cross(bd, bp);
                    let t3 = cross(sub(v0, v2), dp);
                    let test1 = t1 == 0.0 || (t1 > 0.0) == self.pos;
                    let test2 = t2 == 0.0 || (t2 > 0.0) == self.pos;
                    let test3 = t3 == 0.0 || (t3 > 0.0) == self.pos;
                    if !test1 && !test2 {
                        gx += 1;
                        gy -= 1;
                    } else if !test2 && !test3 {
                        gx -= 1;
                        gy += 1;
                    } else if !test1 && !test3 {
                        gx -= 1;
                        gy -= 1;
                    } else if !test1 {
                        gy -= 1;
                    } else if !test3 {
                        gx -= 1;
                    }
                    gx = gx.clamp(0, max_x);
                    gy = gy.clamp(0, max_y);
                    if gx == ogx && gy == ogy && test2 {
                        grid[0][i] = ((p[0] - v0[0]) * (v2[1] - v0[1]) + (v0[1] - p[1]) * (v2[0] - v0[0]))
                            / ((v1[0] - v0[0]) * (v2[1] - v0[1]) + (v0[1] - v1[1]) * (v2[0] - v0[0]))
                            + gx as f32;
                        grid[1][i] = ((p[0] - v0[0]) * (v1[1] - v0[1]) + (v0[1] - p[1]) * (v1[0] - v0[0]))
                            / ((v2[0] - v0[0]) * (v1[1] - v0[1]) + (v0[1] - v2[1]) * (v1[0] - v0[0]))
                            + gy as f32;
                        break;
                    }
                    lowertri = false;
                } else {
                    let t1 = cross(sub(v3, v1), bp);
                    let t2 = cross(sub(v2, v3), sub(p, v3));
                    let t3 = cross(bd, dp);
                    let test1 = t1 == 0.0 || (t1 > 0.0) == self.pos;
                    let test2 = t2 == 0.0 || (t2 > 0.0) == self.pos;
                    let test3 = t3 == 0.0 || (t3 < 0.0) == self.pos;
                    if !test1 && !test3 {
                        gx += 1;
                        gy -= 1;
                    } else if !test2 && !test3 {
                        gx -= 1;
                        gy += 1;
                    } else if !test1 && !test2 {
                        gx += 1;
                        gy += 1;
                    } else if !test1 {
                        gx += 1;
                    } else if !test2 {
                        gy += 1;
                    }
                    gx = gx.clamp(0, max_x);
                    gy = gy.clamp(0, max_y);
                    if gx == ogx && gy == ogy && test3 {
                        grid[0][i] = ((v3[0] - p[0]) * (v1[1] - v3[1]) + (p[1] - v3[1]) * (v1[0] - v3[0]))
                            / ((v2[0] - v3[0]) * (v1[1] - v3[1]) - (v2[1] - v3[1]) * (v1[0] - v3[0]))
                            + gx as f32
                            + 1.0;
                        grid[1][i] = ((v2[1] - v3[1]) * (v3[0] - p[0]) + (v2[0] - v3[0]) * (p[1] - v3[1]))
                            / ((v1[0] - v3[0]) * (v2[1] - v3[1]) - (v2[0] - v3[0]) * (v1[1] - v3[1]))
                            + gy as f32
                            + 1.0;
                        break;
                    }
                    lowertri = true;
                }
            }

            let (g0, g1) = (grid[0][i], grid[1][i]);
            if g0 >= nx as f32 - 0.5 || g1 >= ny as f32 - 0.5 || g0 <= -0.5 || g1 <= -0.5 {
                grid[0][i] = f32::NAN;
                grid[1][i] = f32::NAN;
            }
        }

        if self.sampled.core().len() > 1 {
            *cell = Some([gx as usize, gy as usize]);
        }
        grid
    }
}

impl Set for Gridded2DSet {
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
        point_count("Gridded2DSet value_to_index", 2, value)?;
        let grid = self.value_to_grid(value)?;
        Ok(grid_to_index(&grid, &self.lengths))
    }
}

impl GriddedSet for Gridded2DSet {
    fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    fn grid_to_value(&self, grid: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        self.check_surface("Gridded2DSet grid_to_value")?;
        let n = point_count("Gridded2DSet grid_to_value", 2, grid)?;
        let (nx, ny) = (self.lengths[0], self.lengths[1]);
        let s = self.sampled.samples();
        let mut value = vec![vec![f32::NAN; n]; 2];

        for i in 0..n {
            let (gx, gy) = (grid[0][i], grid[1][i]);
            if gx.is_nan() || gy.is_nan() || gx < -0.5 || gy < -0.5 || gx > nx as f32 - 0.5 || gy > ny as f32 - 0.5 {
                continue;
            }
            if nx * ny == 1 {
                value[0][i] = s[0][0];
                value[1][i] = s[1][0];
                continue;
            }
            let igx = (gx as isize).clamp(0, nx as isize - 2) as usize;
            let igy = (gy as isize).clamp(0, ny as isize - 2) as usize;
            let k00 = nx * igy + igx;
            let k01 = k00 + nx;
            let k10 = k00 + 1;
            let k11 = k01 + 1;
            let fx = gx - igx as f32;
            let fy = gy - igy as f32;
            for (j, component) in s.iter().enumerate() {
                value[j][i] = if fx + fy - 1.0 <= 0.0 {
                    component[k00] + fx * (component[k10] - component[k00]) + fy * (component[k01] - component[k00])
                } else {
                    component[k11]
                        + (1.0 - fx) * (component[k01] - component[k11])
                        + (1.0 - fy) * (component[k10] - component[k11])
                };
            }
        }
        Ok(value)
    }

    fn value_to_grid(&self, value: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        self.check_surface("Gridded2DSet value_to_grid")?;
        point_count("Gridded2DSet value_to_grid", 2, value)?;
        let mut last = self.last_cell.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.locate(value, &mut last))
    }

    fn value_to_grid_with_guess(
        &self,
        value: &[Vec<f32>],
        guess: &mut Option<Vec<usize>>,
    ) -> Result<Vec<Vec<f32>>> {
        self.check_surface("Gridded2DSet value_to_grid")?;
        point_count("Gridded2DSet value_to_grid", 2, value)?;
        let mut cell = match guess.as_deref() {
            Some(&[x, y]) => Some([x, y]),
            _ => None,
        };
        let grid = self.locate(value, &mut cell);
        if let Some(found) = cell {
            *guess = Some(found.to_vec());
        }
        Ok(grid)
    }
}

impl PartialEq for Gridded2DSet {
    fn eq(&self, other: &Self) -> bool {
        self.lengths == other.lengths && self.sampled.same_samples(&other.sampled)
    }
}
