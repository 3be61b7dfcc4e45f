//! Conversion between triangles and quads.

use std::f64::consts::PI;

use tracing::{debug, trace, warn};

use crate::component::ComponentIndex;
use crate::face::MeshFace;
use crate::geometry::{self, E3};
use crate::mesh::{DeletePolicy, Mesh};
use crate::{OptionExt as _, UNSET_INDEX};

/// Tolerances that determine which pairs of triangles are merged into quads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangleMergeParams {
    /// Largest angle between the normals of two triangles in radians.
    pub angle_tolerance: f64,
    /// Smallest ratio between the lengths of the new diagonal and the removed
    /// edge. The ratio must lie in the interval
    /// $[r, \frac{1}{r}]$.
    pub min_diagonal_length_ratio: f64,
}

impl TriangleMergeParams {
    pub fn with_angle_tolerance(mut self, angle_tolerance: f64) -> Self {
        self.angle_tolerance = angle_tolerance;
        self
    }

    pub fn with_min_diagonal_length_ratio(mut self, ratio: f64) -> Self {
        self.min_diagonal_length_ratio = ratio;
        self
    }
}

impl Default for TriangleMergeParams {
    fn default() -> Self {
        TriangleMergeParams {
            angle_tolerance: PI / 90.0,
            min_diagonal_length_ratio: 0.875,
        }
    }
}

/// Diagonal along which a quad is split.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(in crate::mesh) enum Diagonal {
    /// Joins the first and third corners.
    Even,
    /// Joins the second and fourth corners.
    Odd,
}

impl Diagonal {
    pub fn triangles(self, face: &MeshFace) -> [MeshFace; 2] {
        let [a, b, c, d] = face.vi;
        match self {
            Diagonal::Even => [MeshFace::triangle(a, b, c), MeshFace::triangle(a, c, d)],
            Diagonal::Odd => [MeshFace::triangle(a, b, d), MeshFace::triangle(b, c, d)],
        }
    }

    /// Chooses the shorter diagonal, preferring the even diagonal on ties.
    pub fn shorter(points: &[E3; 4]) -> Self {
        if (points[1] - points[3]).norm() < (points[0] - points[2]).norm() {
            Diagonal::Odd
        }
        else {
            Diagonal::Even
        }
    }
}

/// Gets the quad formed by two triangles that share a side.
///
/// The triangles must use the same vertices at the ends of the shared side and
/// traverse it in opposite directions. The quad keeps the winding of the
/// triangles.
pub(in crate::mesh) fn join_triangles(first: &MeshFace, second: &MeshFace) -> Option<MeshFace> {
    if !(first.is_triangle() && second.is_triangle()) {
        return None;
    }
    let a = first.corners();
    let b = second.corners();
    for k in 0..3 {
        let (x, y) = (a[k], a[(k + 1) % 3]);
        for j in 0..3 {
            if (b[j], b[(j + 1) % 3]) == (y, x) {
                let (p, q) = (a[(k + 2) % 3], b[(j + 2) % 3]);
                if p == q {
                    return None;
                }
                return Some(MeshFace::quad(p, x, q, y));
            }
        }
    }
    None
}

impl Mesh {
    /// Merges pairs of adjacent triangles into quads.
    ///
    /// A pair is merged if the triangles share a manifold edge with the same
    /// vertices at its ends, are oriented consistently, and are nearly
    /// coplanar, if the quad is convex, if the ratio of the new diagonal to
    /// the shared edge is within the tolerance, and if the shared edge is the
    /// longest side of both triangles. Each triangle is merged at most once.
    ///
    /// Triangles in different $n$-gons are never merged.
    ///
    /// Returns the number of quads created.
    pub fn convert_triangles_to_quads(&mut self, params: TriangleMergeParams) -> usize {
        let vertex_count = self.vertex_count();
        let ngon_map = self.ngon_index_map();
        let mut joins: Vec<(u32, u32, MeshFace)> = Vec::new();
        {
            let topology = match self.topology() {
                Ok(topology) => topology,
                Err(_) => return 0,
            };
            let mut used = vec![false; self.faces.len()];
            for (topei, edge) in topology.edges().iter().enumerate() {
                let (f0, f1) = match edge.faces() {
                    [f0, f1] => (*f0, *f1),
                    _ => continue,
                };
                if used[f0 as usize] || used[f1 as usize] {
                    continue;
                }
                if ngon_map[f0 as usize] != ngon_map[f1 as usize] {
                    continue;
                }
                let (first, second) = (&self.faces[f0 as usize], &self.faces[f1 as usize]);
                if !(first.is_valid(vertex_count) && second.is_valid(vertex_count)) {
                    continue;
                }
                if !topology.is_welded_edge(&self.faces, topei as u32) {
                    continue;
                }
                let quad = match join_triangles(first, second) {
                    Some(quad) => quad,
                    None => continue,
                };
                if self.is_mergeable(first, second, &quad, &params) {
                    trace!(f0, f1, ?quad, "merging triangles");
                    used[f0 as usize] = true;
                    used[f1 as usize] = true;
                    joins.push((f0, f1, quad));
                }
            }
        }
        if joins.is_empty() {
            return 0;
        }

        self.invalidate();
        let mut removed = Vec::with_capacity(joins.len());
        for (f0, f1, quad) in joins.iter() {
            self.faces[*f0 as usize] = *quad;
            let index = ngon_map[*f1 as usize];
            if index != UNSET_INDEX {
                self.ngons[index as usize]
                    .as_mut()
                    .expect_consistent()
                    .fi
                    .retain(|fi| fi != f1);
            }
            removed.push(ComponentIndex::Face(*f1));
        }
        let policy = DeletePolicy::default()
            .with_remove_degenerate_faces(false)
            .with_remove_unused_vertices(false)
            .with_remove_dissolved_ngons(false);
        if let Err(error) = self.delete_components(&removed, policy) {
            warn!(%error, "failed to remove merged triangles");
        }
        debug!(quads = joins.len(), "converted triangles to quads");
        joins.len()
    }

    fn is_mergeable(
        &self,
        first: &MeshFace,
        second: &MeshFace,
        quad: &MeshFace,
        params: &TriangleMergeParams,
    ) -> bool {
        let (first, second, quad) = match (
            self.face_points(first),
            self.face_points(second),
            self.face_points(quad),
        ) {
            (Some(first), Some(second), Some(quad)) => (first, second, quad),
            _ => return false,
        };
        let angle = geometry::angle_between(
            &geometry::triangle_normal(&first[0], &first[1], &first[2]),
            &geometry::triangle_normal(&second[0], &second[1], &second[2]),
        );
        if !angle.map_or(false, |angle| angle <= params.angle_tolerance) {
            return false;
        }
        // The shared edge joins the second and fourth corners of the quad.
        let edge = (quad[1] - quad[3]).norm();
        let diagonal = (quad[0] - quad[2]).norm();
        let longest = |points: &[E3; 4]| {
            (0..3)
                .map(|k| (points[k] - points[(k + 1) % 3]).norm())
                .fold(0.0, f64::max)
        };
        if edge < longest(&first) || edge < longest(&second) {
            return false;
        }
        let ratio = params.min_diagonal_length_ratio;
        if !(diagonal >= ratio * edge && diagonal * ratio <= edge) {
            return false;
        }
        let normals = geometry::corner_normals(&quad);
        normals
            .iter()
            .all(|normal| normal.dot(&normals[0]) > 0.0)
    }

    /// Splits every quad into two triangles along its shorter diagonal.
    ///
    /// The first triangle replaces the quad and the second is appended. Quads
    /// in an $n$-gon remain in the $n$-gon.
    ///
    /// Returns the number of quads split.
    pub fn convert_quads_to_triangles(&mut self) -> usize {
        let vertex_count = self.vertex_count();
        let splits: Vec<_> = self
            .faces
            .iter()
            .enumerate()
            .filter(|(_, face)| face.is_quad() && face.is_valid(vertex_count))
            .filter_map(|(fi, face)| {
                let points = self.face_points(face)?;
                Some((fi as u32, Diagonal::shorter(&points)))
            })
            .collect();
        self.split_quads(&splits);
        debug!(quads = splits.len(), "converted quads to triangles");
        splits.len()
    }

    /// Splits quads along the given diagonals.
    pub(in crate::mesh) fn split_quads(&mut self, splits: &[(u32, Diagonal)]) {
        if splits.is_empty() {
            return;
        }
        let ngon_map = self.ngon_index_map();
        let has_face_normals =
            !self.face_normals.is_empty() && self.face_normals.len() == self.faces.len();
        self.invalidate();
        for (fi, diagonal) in splits.iter() {
            let [first, second] = diagonal.triangles(&self.faces[*fi as usize]);
            self.faces[*fi as usize] = first;
            self.faces.push(second);
            if has_face_normals {
                let normal = self.face_normals[*fi as usize];
                self.face_normals.push(normal);
            }
            let index = ngon_map[*fi as usize];
            if index != UNSET_INDEX {
                self.ngons[index as usize]
                    .as_mut()
                    .expect_consistent()
                    .fi
                    .push((self.faces.len() - 1) as u32);
            }
        }
    }
}
