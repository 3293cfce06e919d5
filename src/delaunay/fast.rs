//! Divide and conquer triangulation with hull merging.

use std::f64::consts::PI;

use super::error::{DelaunayError, Result};
use super::triangulation::Triangulation;

/// Points are rotated by this angle (10 degrees) before triangulating so
/// that axis-aligned rows of samples do not produce ties in the sorts.
pub const ROTATION_ANGLE: f64 = PI / 18.0;

/// Tangent sweeps per merge; fewer passes do not always converge.
pub const HULL_SWEEP_PASSES: usize = 3;

/// Pending work on the index range `start..=end`.
#[derive(Debug, Clone, Copy)]
enum Task {
    /// Sort and bisect, or solve directly when small.
    Split { start: usize, end: usize, vertical: bool },
    /// Zip the hulls of the two halves produced by a split.
    Merge { vertical: bool },
}

/// Which hull tangent a sweep is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Upper,
    Lower,
}

/// Rotated point coordinates.
struct Points {
    x: Vec<f32>,
    y: Vec<f32>,
}

impl Points {
    fn coord(&self, axis: usize) -> &[f32] {
        if axis == 0 { &self.x } else { &self.y }
    }

    /// Normalized x (or y when `vertical`) component of the direction
    /// from `anchor` to `p`.
    fn direction(&self, anchor: usize, p: usize, vertical: bool) -> f32 {
        let dx = self.x[p] - self.x[anchor];
        let dy = self.y[p] - self.y[anchor];
        let c = if vertical { dy } else { dx };
        (f64::from(c) / f64::from(dx * dx + dy * dy).sqrt()) as f32
    }

    /// Rotate `hull[current]` toward the tangent through `anchor`.
    fn sweep(&self, hull: &[usize], mut current: usize, anchor: usize, vertical: bool, side: Side) -> usize {
        let n = hull.len();
        let better = |u: f32, v: f32| match side {
            Side::Upper => u < v,
            Side::Lower => u > v,
        };
        let mut bob = (current + 1) % n;
        let mut u = self.direction(anchor, hull[bob], vertical);
        let mut v = self.direction(anchor, hull[current], vertical);
        let plus = better(u, v);
        if !plus {
            bob = current;
            (u, v) = match side {
                Side::Upper => (0.0, 1.0),
                Side::Lower => (1.0, 0.0),
            };
        }
        // a full turn around the hull means the points are degenerate
        let mut steps = 0;
        while better(u, v) && steps <= n {
            current = bob;
            bob = if plus { (current + 1) % n } else { (current + n - 1) % n };
            u = self.direction(anchor, hull[bob], vertical);
            v = self.direction(anchor, hull[current], vertical);
            steps += 1;
        }
        current
    }

    /// Whether the zipper should advance along the second hull, given the
    /// current base `b1`/`b2` and the next candidates `o1`/`o2`.
    fn advance_second(&self, b1: usize, o1: usize, b2: usize, o2: usize) -> bool {
        let (ax, ay) = (self.x[o2], self.y[o2]);
        let (bx, by) = (self.x[b2], self.y[b2]);
        let (cx, cy) = (self.x[o1], self.y[o1]);
        let (dx, dy) = (self.x[b1], self.y[b1]);
        let (abx, aby) = (ax - bx, ay - by);
        let (acx, acy) = (ax - cx, ay - cy);
        let (dbx, dby) = (dx - bx, dy - by);
        let (dcx, dcy) = (dx - cx, dy - cy);
        let q = abx * acx + aby * acy;
        let r = dbx * abx + dby * aby;
        let s = acx * dcx + acy * dcy;
        let t = dbx * dcx + dby * dcy;
        let qd = abx * acy - aby * acx >= 0.0;
        let rd = dbx * aby - dby * abx >= 0.0;
        let sd = acx * dcy - acy * dcx >= 0.0;
        let td = dcx * dby - dcy * dbx >= 0.0;
        let sig = [qd, rd, sd, td].iter().filter(|&&b| b).count() < 2;
        if qd == sig {
            true
        } else if rd == sig || sd == sig {
            false
        } else if td == sig {
            true
        } else if (q < 0.0 && t < 0.0) || (r > 0.0 && s > 0.0) {
            true
        } else if (r < 0.0 && s < 0.0) || (q > 0.0 && t > 0.0) {
            false
        } else {
            (if q < 0.0 { q } else { t }) < (if r < 0.0 { r } else { s })
        }
    }
}

/// Quicksort of `indices[lo..=hi]` by one coordinate, pivoting on the
/// middle element. Equal keys keep no particular order.
fn sort_range(indices: &mut [usize], key: &[f32], lo: usize, hi: usize) {
    let mut pending = vec![(lo, hi)];
    while let Some((lo, hi)) = pending.pop() {
        if lo >= hi {
            continue;
        }
        indices.swap(lo, (lo + hi) / 2);
        let mut pivot = lo;
        for i in lo + 1..=hi {
            if key[indices[i]] < key[indices[lo]] {
                pivot += 1;
                indices.swap(i, pivot);
            }
        }
        indices.swap(lo, pivot);
        if lo + 1 < pivot {
            pending.push((lo, pivot - 1));
        }
        if pivot + 1 < hi {
            pending.push((pivot + 1, hi));
        }
    }
}

/// Approximate Delaunay triangulation of 2-D samples.
#[derive(Debug, Clone)]
pub struct DelaunayFast {
    triangulation: Triangulation,
}

impl DelaunayFast {
    /// Triangulate `samples`, laid out `[dimension][point]`.
    ///
    /// # Errors
    ///
    /// Fails for dimensions other than 2 (3 is reported as unimplemented),
    /// fewer than three points, or non-finite coordinates.
    pub fn new(samples: &[Vec<f32>]) -> Result<Self> {
        match samples.len() {
            2 => {}
            3 => return Err(DelaunayError::Unimplemented("DelaunayFast in three dimensions")),
            d => return Err(DelaunayError::InvalidDimension(d)),
        }
        let n = samples[0].len().min(samples[1].len());
        if n < 3 {
            return Err(DelaunayError::TooFewPoints(n));
        }
        if let Some(index) = (0..n).find(|&i| !samples[0][i].is_finite() || !samples[1][i].is_finite()) {
            return Err(DelaunayError::NonFiniteSample { index });
        }

        let (sin, cos) = ROTATION_ANGLE.sin_cos();
        let (x, y): (Vec<f32>, Vec<f32>) = (0..n)
            .map(|i| {
                let (x, y) = (f64::from(samples[0][i]), f64::from(samples[1][i]));
                ((x * cos - y * sin) as f32, (y * cos + x * sin) as f32)
            })
            .unzip();
        let points = Points { x, y };

        let tri = triangulate(&points, n);
        tracing::debug!(points = n, triangles = tri.len(), "DelaunayFast triangulation complete");
        Ok(Self {
            triangulation: Triangulation::new(tri, n),
        })
    }

    pub fn triangulation(&self) -> &Triangulation {
        &self.triangulation
    }

    pub fn into_triangulation(self) -> Triangulation {
        self.triangulation
    }
}

fn triangulate(points: &Points, n: usize) -> Vec<[usize; 3]> {
    let mut tri = Vec::with_capacity(2 * n);
    let mut indices: Vec<usize> = (0..n).collect();
    let mut hulls: Vec<Vec<usize>> = Vec::new();
    let mut tasks = vec![Task::Split {
        start: 0,
        end: n - 1,
        vertical: false,
    }];
    let mut merges = 0usize;

    while let Some(task) = tasks.pop() {
        match task {
            Task::Split { start, end, vertical } if end - start >= 3 => {
                sort_range(&mut indices, points.coord(if vertical { 0 } else { 1 }), start, end);
                let mid = (start + end) / 2;
                tasks.push(Task::Merge { vertical });
                tasks.push(Task::Split {
                    start,
                    end: mid,
                    vertical: !vertical,
                });
                tasks.push(Task::Split {
                    start: mid + 1,
                    end,
                    vertical: !vertical,
                });
            }
            Task::Split { start, end, .. } => {
                let hull = if end - start + 1 == 3 {
                    let mut hull = [indices[start], indices[start + 1], indices[end]];
                    let a = hull[0];
                    let turn = (points.x[hull[1]] - points.x[a]) * (points.y[hull[2]] - points.y[a])
                        - (points.y[hull[1]] - points.y[a]) * (points.x[hull[2]] - points.x[a]);
                    // clockwise order
                    if turn > 0.0 {
                        hull.swap(1, 2);
                    }
                    tri.push(hull);
                    hull.to_vec()
                } else {
                    vec![indices[start], indices[end]]
                };
                hulls.push(hull);
            }
            Task::Merge { vertical } => {
                // the second half was solved first, so its hull is deeper
                let (Some(first), Some(second)) = (hulls.pop(), hulls.pop()) else {
                    continue;
                };
                let (hull1, hull2) = if vertical { (second, first) } else { (first, second) };
                let (merged, zipped) = merge(points, &hull1, &hull2, vertical);
                tri.extend(zipped);
                hulls.push(merged);
                merges += 1;
            }
        }
    }
    tracing::trace!(merges, hull = hulls.first().map_or(0, Vec::len), "hull merges finished");
    tri
}

/// Join two adjacent clockwise hulls. Returns the merged hull and the
/// triangles stitched between them.
fn merge(points: &Points, hull1: &[usize], hull2: &[usize], vertical: bool) -> (Vec<usize>, Vec<[usize; 3]>) {
    let key = points.coord(if vertical { 1 } else { 0 });
    let extremes = |hull: &[usize]| {
        let (mut upp, mut low) = (0, 0);
        for i in 1..hull.len() {
            if key[hull[i]] > key[hull[upp]] {
                upp = i;
            }
            if key[hull[i]] < key[hull[low]] {
                low = i;
            }
        }
        (upp, low)
    };
    let (mut upp1, mut low1) = extremes(hull1);
    let (mut upp2, mut low2) = extremes(hull2);

    for _ in 0..HULL_SWEEP_PASSES {
        upp1 = points.sweep(hull1, upp1, hull2[upp2], vertical, Side::Upper);
        upp2 = points.sweep(hull2, upp2, hull1[upp1], vertical, Side::Upper);
        low1 = points.sweep(hull1, low1, hull2[low2], vertical, Side::Lower);
        low2 = points.sweep(hull2, low2, hull1[low1], vertical, Side::Lower);
    }

    let (len1, len2) = (hull1.len(), hull2.len());
    // points of each hull facing the other, and the rest
    let (nih1, noh1, mut h1ups) = if low1 == upp1 {
        (len1, 1, 0)
    } else {
        let nih = (low1 + len1 - upp1) % len1 + 1;
        (nih, len1 - nih + 2, 1)
    };
    let (nih2, noh2, mut h2ups) = if low2 == upp2 {
        (len2, 1, 0)
    } else {
        let nih = (upp2 + len2 - low2) % len2 + 1;
        (nih, len2 - nih + 2, 1)
    };

    let mut merged = Vec::with_capacity(noh1 + noh2);
    let mut spot = low1;
    while spot != upp1 {
        merged.push(hull1[spot]);
        spot = (spot + 1) % len1;
    }
    merged.push(hull1[upp1]);
    spot = upp2;
    while spot != low2 {
        merged.push(hull2[spot]);
        spot = (spot + 1) % len2;
    }
    merged.push(hull2[low2]);

    let mut base1 = low1;
    let mut base2 = low2;
    let mut up1 = (base1 + len1 - 1) % len1;
    let mut up2 = (base2 + 1) % len2;
    let count = if noh1 == 1 || noh2 == 1 {
        nih1 + nih2 - 1
    } else {
        nih1 + nih2 - 2
    };

    let mut zipped = Vec::with_capacity(count);
    for _ in 0..count {
        let second = if h1ups == nih1 {
            up2 = (base2 + 1) % len2;
            true
        } else if h2ups == nih2 {
            up1 = (base1 + len1 - 1) % len1;
            false
        } else {
            points.advance_second(hull1[base1], hull1[up1], hull2[base2], hull2[up2])
        };
        if second {
            zipped.push([hull2[base2], hull1[base1], hull2[up2]]);
            base2 = up2;
            h2ups += 1;
            up2 = (base2 + 1) % len2;
        } else {
            zipped.push([hull2[base2], hull1[base1], hull1[up1]]);
            base1 = up1;
            h1ups += 1;
            up1 = (base1 + len1 - 1) % len1;
        }
    }
    (merged, zipped)
}
