//! Triangle topology shared by every triangulator.

use std::collections::HashMap;

/// Triangles over point indices plus the adjacency derived from them.
///
/// Side `j` of triangle `t` runs from `tri[t][j]` to `tri[t][(j + 1) % 3]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triangulation {
    /// Vertex indices of each triangle.
    pub tri: Vec<[usize; 3]>,
    /// Triangles incident to each point, in ascending order.
    pub vertices: Vec<Vec<usize>>,
    /// Triangle across each side, `None` on the boundary.
    pub walk: Vec<[Option<usize>; 3]>,
    /// Global edge number of each side.
    pub edges: Vec<[usize; 3]>,
    pub num_edges: usize,
}

impl Triangulation {
    /// Derive incidence and adjacency for `tri` over `num_points` points.
    pub fn new(tri: Vec<[usize; 3]>, num_points: usize) -> Self {
        let mut vertices = vec![Vec::new(); num_points];
        for (t, corners) in tri.iter().enumerate() {
            for &v in corners {
                if let Some(list) = vertices.get_mut(v) {
                    list.push(t);
                }
            }
        }

        let mut edge_numbers: HashMap<(usize, usize), usize> = HashMap::new();
        let mut first_side: Vec<(usize, usize)> = Vec::new();
        let mut walk = vec![[None; 3]; tri.len()];
        let mut edges = vec![[0; 3]; tri.len()];
        for (t, corners) in tri.iter().enumerate() {
            for j in 0..3 {
                let (a, b) = (corners[j], corners[(j + 1) % 3]);
                let key = (a.min(b), a.max(b));
                match edge_numbers.get(&key) {
                    Some(&e) => {
                        let (other, side) = first_side[e];
                        edges[t][j] = e;
                        walk[t][j] = Some(other);
                        if walk[other][side].is_none() {
                            walk[other][side] = Some(t);
                        }
                    }
                    None => {
                        let e = first_side.len();
                        edge_numbers.insert(key, e);
                        first_side.push((t, j));
                        edges[t][j] = e;
                    }
                }
            }
        }

        Self {
            tri,
            vertices,
            walk,
            edges,
            num_edges: first_side.len(),
        }
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.tri.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tri.is_empty()
    }

    /// Sides with no triangle on the other side.
    pub fn boundary_edges(&self) -> usize {
        self.walk.iter().flatten().filter(|w| w.is_none()).count()
    }

    /// Points not used by any triangle.
    pub fn isolated_points(&self) -> Vec<usize> {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_empty())
            .map(|(i, _)| i)
            .collect()
    }
}
