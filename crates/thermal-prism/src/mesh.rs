//! Constrained Delaunay triangulation and refinement (spec.md §4.7).
//!
//! Boundary loops are merged into one point set (collapsing points within
//! `tolerance`) and triangulated with their edges as constraints via
//! `spade`'s incremental CDT; a refinement loop then inserts midpoints on
//! over-long edges and centroids of low-quality triangles, relying on
//! spade's automatic constraint-edge splitting when a new vertex lands on an
//! existing constrained edge.

use spade::{ConstrainedDelaunayTriangulation, Point2, Triangulation};
use std::collections::HashMap;

use crate::error::{PrismError, PrismResult};
use crate::geometry2::{self, Pt};

/// Mesh quality targets (spec.md §4.7's "mesh quality targets").
#[derive(Debug, Clone)]
pub struct MeshParams {
    pub min_alpha: f64,
    pub min_len: f64,
    pub max_len: f64,
    pub tolerance: f64,
    pub iteration: usize,
}

impl Default for MeshParams {
    fn default() -> Self {
        Self {
            min_alpha: 15.0,
            min_len: 1e-6,
            max_len: f64::INFINITY,
            tolerance: 1e-9,
            iteration: 4,
        }
    }
}

/// One triangulated cell: three vertex indices into `Mesh::points`.
#[derive(Debug, Clone, Copy)]
pub struct MeshTriangle {
    pub v: [usize; 3],
}

/// A triangulation result: shared point set, triangle list, and in-plane
/// neighbor table (`None` at a mesh boundary edge).
#[derive(Debug, Clone)]
pub struct Mesh {
    pub points: Vec<Pt>,
    pub triangles: Vec<MeshTriangle>,
    pub neighbors: Vec<[Option<usize>; 3]>,
}

impl Mesh {
    pub fn triangle_points(&self, t: usize) -> [Pt; 3] {
        let tri = self.triangles[t];
        [self.points[tri.v[0]], self.points[tri.v[1]], self.points[tri.v[2]]]
    }

    pub fn centroid(&self, t: usize) -> Pt {
        let [a, b, c] = self.triangle_points(t);
        geometry2::centroid(a, b, c)
    }

    pub fn area(&self, t: usize) -> f64 {
        let [a, b, c] = self.triangle_points(t);
        geometry2::area(a, b, c)
    }
}

fn collapse(points: &[Pt], tolerance: f64) -> Vec<usize> {
    let mut map = vec![usize::MAX; points.len()];
    let mut kept: Vec<Pt> = Vec::new();
    for (i, &p) in points.iter().enumerate() {
        if let Some(existing) = kept.iter().position(|&q| geometry2::dist(p, q) <= tolerance) {
            map[i] = existing;
        } else {
            map[i] = kept.len();
            kept.push(p);
        }
    }
    map
}

/// Triangulate `boundary_loops` (each a closed, ordered polygon ring) plus
/// free `steiner` points, under `params`.
pub fn triangulate(
    boundary_loops: &[Vec<Pt>],
    steiner: &[Pt],
    params: &MeshParams,
) -> PrismResult<Mesh> {
    if boundary_loops.is_empty() {
        return Err(PrismError::EmptyMesh);
    }

    let mut all_points: Vec<Pt> = Vec::new();
    let mut loop_spans: Vec<(usize, usize)> = Vec::new();
    for loop_pts in boundary_loops {
        let start = all_points.len();
        all_points.extend(loop_pts.iter().copied());
        loop_spans.push((start, loop_pts.len()));
    }
    let steiner_start = all_points.len();
    all_points.extend(steiner.iter().copied());

    let remap = collapse(&all_points, params.tolerance);
    let n_collapsed = remap.iter().copied().max().map(|m| m + 1).unwrap_or(0);
    let mut collapsed_points = vec![(0.0_f64, 0.0_f64); n_collapsed];
    for (i, &p) in all_points.iter().enumerate() {
        collapsed_points[remap[i]] = p;
    }

    let mut cdt: ConstrainedDelaunayTriangulation<Point2<f64>> =
        ConstrainedDelaunayTriangulation::new();
    let mut handles = Vec::with_capacity(collapsed_points.len());
    for &(x, y) in &collapsed_points {
        let h = cdt
            .insert(Point2::new(x, y))
            .map_err(|e| PrismError::Triangulation { what: e.to_string() })?;
        handles.push(h);
    }

    for &(start, len) in &loop_spans {
        for i in 0..len {
            let a = remap[start + i];
            let b = remap[start + (i + 1) % len];
            if a != b {
                cdt.add_constraint(handles[a], handles[b]);
            }
        }
    }
    let _ = steiner_start;

    refine(&mut cdt, params);

    Ok(merge_short_edges(extract(&cdt), params.min_len))
}

fn refine(cdt: &mut ConstrainedDelaunayTriangulation<Point2<f64>>, params: &MeshParams) {
    for _ in 0..params.iteration {
        let mut to_insert: Vec<Pt> = Vec::new();

        for face in cdt.inner_faces() {
            let verts = face.vertices();
            let p: [Pt; 3] = std::array::from_fn(|i| {
                let pos = verts[i].position();
                (pos.x, pos.y)
            });
            if geometry2::area(p[0], p[1], p[2]) <= 0.0 {
                continue;
            }
            if geometry2::min_angle(p[0], p[1], p[2]) < params.min_alpha {
                to_insert.push(geometry2::centroid(p[0], p[1], p[2]));
            }
        }

        for edge in cdt.undirected_edges() {
            let [a, b] = edge.vertices();
            let pa = a.position();
            let pb = b.position();
            let len = geometry2::dist((pa.x, pa.y), (pb.x, pb.y));
            if len > params.max_len {
                to_insert.push(((pa.x + pb.x) / 2.0, (pa.y + pb.y) / 2.0));
            }
        }

        if to_insert.is_empty() {
            break;
        }
        for (x, y) in to_insert {
            let _ = cdt.insert(Point2::new(x, y));
        }
    }
}

fn extract(cdt: &ConstrainedDelaunayTriangulation<Point2<f64>>) -> Mesh {
    let mut points = Vec::new();
    let mut vertex_index = HashMap::new();
    for v in cdt.vertices() {
        let pos = v.position();
        vertex_index.insert(v.fix(), points.len());
        points.push((pos.x, pos.y));
    }

    let mut triangles = Vec::new();
    let mut face_index = HashMap::new();
    for face in cdt.inner_faces() {
        let verts = face.vertices();
        let p: [Pt; 3] = std::array::from_fn(|i| {
            let pos = verts[i].position();
            (pos.x, pos.y)
        });
        if geometry2::area(p[0], p[1], p[2]) <= 1e-18 {
            continue;
        }
        face_index.insert(face.fix(), triangles.len());
        triangles.push(MeshTriangle {
            v: std::array::from_fn(|i| vertex_index[&verts[i].fix()]),
        });
    }

    let mut neighbors = vec![[None; 3]; triangles.len()];
    for face in cdt.inner_faces() {
        let Some(&ti) = face_index.get(&face.fix()) else { continue };
        let edges = face.adjacent_edges();
        for (k, edge) in edges.iter().enumerate() {
            if let Some(opposite) = edge.rev().as_inner() {
                if let Some(&tj) = face_index.get(&opposite.fix()) {
                    neighbors[ti][k] = Some(tj);
                }
            }
        }
    }

    Mesh { points, triangles, neighbors }
}

/// Union-find root of `i`, with path compression.
fn find(parent: &mut [usize], i: usize) -> usize {
    if parent[i] != i {
        parent[i] = find(parent, parent[i]);
    }
    parent[i]
}

/// Collapse edges shorter than `min_len` (spec.md §4.7 step 4) by unioning
/// their endpoints, then rebuilding the triangle list and neighbor table
/// over the reduced point set. Triangles degenerate after a merge (two
/// collapsed vertices, or zero area) are dropped.
fn merge_short_edges(mesh: Mesh, min_len: f64) -> Mesh {
    let n = mesh.points.len();
    if n == 0 || !min_len.is_finite() || min_len <= 0.0 {
        return mesh;
    }

    let mut parent: Vec<usize> = (0..n).collect();
    for tri in &mesh.triangles {
        for k in 0..3 {
            let a = tri.v[k];
            let b = tri.v[(k + 1) % 3];
            if geometry2::dist(mesh.points[a], mesh.points[b]) < min_len {
                let ra = find(&mut parent, a);
                let rb = find(&mut parent, b);
                if ra != rb {
                    parent[ra] = rb;
                }
            }
        }
    }

    let mut root_to_new: HashMap<usize, usize> = HashMap::new();
    let mut new_points = Vec::new();
    let mut remap = vec![0usize; n];
    for i in 0..n {
        let r = find(&mut parent, i);
        let new_idx = *root_to_new.entry(r).or_insert_with(|| {
            let idx = new_points.len();
            new_points.push(mesh.points[r]);
            idx
        });
        remap[i] = new_idx;
    }

    let mut new_triangles = Vec::new();
    for tri in &mesh.triangles {
        let v = [remap[tri.v[0]], remap[tri.v[1]], remap[tri.v[2]]];
        if v[0] == v[1] || v[1] == v[2] || v[2] == v[0] {
            continue;
        }
        let p = [new_points[v[0]], new_points[v[1]], new_points[v[2]]];
        if geometry2::area(p[0], p[1], p[2]).abs() <= 1e-18 {
            continue;
        }
        new_triangles.push(MeshTriangle { v });
    }

    Mesh {
        neighbors: compute_neighbors(&new_triangles),
        points: new_points,
        triangles: new_triangles,
    }
}

/// Rebuild the neighbor table from scratch by matching shared edges between
/// triangles; an edge touched by only one triangle is a mesh boundary.
fn compute_neighbors(triangles: &[MeshTriangle]) -> Vec<[Option<usize>; 3]> {
    let mut edge_map: HashMap<(usize, usize), Vec<(usize, usize)>> = HashMap::new();
    for (ti, tri) in triangles.iter().enumerate() {
        for k in 0..3 {
            let a = tri.v[k];
            let b = tri.v[(k + 1) % 3];
            let key = if a < b { (a, b) } else { (b, a) };
            edge_map.entry(key).or_default().push((ti, k));
        }
    }
    let mut neighbors = vec![[None; 3]; triangles.len()];
    for entries in edge_map.values() {
        if entries.len() == 2 {
            let (t0, k0) = entries[0];
            let (t1, k1) = entries[1];
            neighbors[t0][k0] = Some(t1);
            neighbors[t1][k1] = Some(t0);
        }
    }
    neighbors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_square_triangulates_into_two_triangles() {
        let square = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let mesh = triangulate(&[square], &[], &MeshParams::default()).unwrap();
        assert_eq!(mesh.triangles.len(), 2);
        let total: f64 = (0..mesh.triangles.len()).map(|t| mesh.area(t)).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn refinement_splits_triangles_exceeding_max_len() {
        let square = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let params = MeshParams { max_len: 0.6, iteration: 6, ..MeshParams::default() };
        let mesh = triangulate(&[square], &[], &params).unwrap();
        assert!(mesh.triangles.len() > 2);
        let total: f64 = (0..mesh.triangles.len()).map(|t| mesh.area(t)).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn merging_collapses_sliver_edges_without_leaving_dangling_indices() {
        let square = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        // A Steiner point nudged a hair off a corner creates a sliver edge
        // shorter than min_len that should be collapsed back into a single
        // vertex.
        let steiner = vec![(1e-9, 1e-9)];
        let params = MeshParams { min_len: 1e-3, ..MeshParams::default() };
        let mesh = triangulate(&[square], &steiner, &params).unwrap();

        for tri in &mesh.triangles {
            assert!(tri.v[0] != tri.v[1] && tri.v[1] != tri.v[2] && tri.v[2] != tri.v[0]);
            for &v in &tri.v {
                assert!(v < mesh.points.len());
            }
        }
        for edge in &mesh.neighbors {
            for &n in edge {
                if let Some(n) = n {
                    assert!(n < mesh.triangles.len());
                }
            }
        }
    }
}
