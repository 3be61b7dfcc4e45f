//! Triangulation of non-planar quads.

use tracing::{debug, trace};

use crate::geometry::{self, E3};
use crate::mesh::quad::Diagonal;
use crate::mesh::Mesh;
use crate::IteratorExt as _;

/// Tolerance below which lengths are considered zero, relative to the
/// magnitude of the coordinates involved.
const ZERO_TOLERANCE: f64 = 2.328_306_436_538_696_3e-10;

/// Policy that selects the diagonal along which a quad is split.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum QuadSplit {
    #[default]
    ShortDiagonal,
    LongDiagonal,
    /// Minimizes the total area of the triangles.
    MinArea,
    /// Maximizes the total area of the triangles.
    MaxArea,
    /// Minimizes the angle between the normals of the triangles.
    MinAngle,
    /// Maximizes the angle between the normals of the triangles.
    MaxAngle,
}

impl QuadSplit {
    fn select(self, points: &[E3; 4]) -> Diagonal {
        let area = |diagonal: Diagonal| -> f64 {
            let [a, b, c] = triangle_points(points, diagonal, 0);
            let [d, e, f] = triangle_points(points, diagonal, 1);
            geometry::triangle_area(&a, &b, &c) + geometry::triangle_area(&d, &e, &f)
        };
        let fold = |diagonal: Diagonal| -> f64 {
            let [a, b, c] = triangle_points(points, diagonal, 0);
            let [d, e, f] = triangle_points(points, diagonal, 1);
            geometry::angle_between(
                &geometry::triangle_normal(&a, &b, &c),
                &geometry::triangle_normal(&d, &e, &f),
            )
            .unwrap_or(0.0)
        };
        // Ties select the even diagonal.
        let odd_if = |odd: bool| if odd { Diagonal::Odd } else { Diagonal::Even };
        match self {
            QuadSplit::ShortDiagonal => Diagonal::shorter(points),
            QuadSplit::LongDiagonal => {
                odd_if((points[1] - points[3]).norm() > (points[0] - points[2]).norm())
            }
            QuadSplit::MinArea => odd_if(area(Diagonal::Odd) < area(Diagonal::Even)),
            QuadSplit::MaxArea => odd_if(area(Diagonal::Odd) > area(Diagonal::Even)),
            QuadSplit::MinAngle => odd_if(fold(Diagonal::Odd) < fold(Diagonal::Even)),
            QuadSplit::MaxAngle => odd_if(fold(Diagonal::Odd) > fold(Diagonal::Even)),
        }
    }
}

fn triangle_points(points: &[E3; 4], diagonal: Diagonal, n: usize) -> [E3; 3] {
    let [a, b, c, d] = points;
    match (diagonal, n) {
        (Diagonal::Even, 0) => [*a, *b, *c],
        (Diagonal::Even, _) => [*a, *c, *d],
        (Diagonal::Odd, 0) => [*a, *b, *d],
        (Diagonal::Odd, _) => [*b, *c, *d],
    }
}

/// Tolerances that determine which quads are not planar.
///
/// A quad is not planar if the distance of any corner from the plane of the
/// quad exceeds the planar tolerance or if the angle between the normal at
/// any corner and the normal of the quad exceeds the angle tolerance. Absent
/// tolerances are not tested.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanarityParams {
    /// Distance tolerance relative to the magnitude of the coordinates of the
    /// quad. Magnitudes less than one are treated as one.
    pub planar_tolerance: Option<f64>,
    /// Angle tolerance in radians.
    pub angle_tolerance: Option<f64>,
    pub split: QuadSplit,
}

impl PlanarityParams {
    pub fn with_planar_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.planar_tolerance = tolerance;
        self
    }

    pub fn with_angle_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.angle_tolerance = tolerance;
        self
    }

    pub fn with_split(mut self, split: QuadSplit) -> Self {
        self.split = split;
        self
    }

    fn is_planar(&self, points: &[E3; 4]) -> bool {
        let normal = match geometry::quad_normal(points).try_normalize(0.0) {
            Some(normal) => normal,
            None => return false,
        };
        let scale = geometry::magnitude(points).max(1.0);
        if let Some(tolerance) = self.planar_tolerance {
            let origin = match geometry::centroid(points) {
                Some(origin) => origin,
                None => return false,
            };
            let deviation = points
                .iter()
                .map(|point| (point - origin).dot(&normal).abs())
                .fold(0.0, f64::max);
            if deviation > tolerance * scale {
                return false;
            }
        }
        if let Some(tolerance) = self.angle_tolerance {
            for corner in geometry::corner_normals(points).iter() {
                match geometry::angle_between(corner, &normal) {
                    Some(angle) if angle <= tolerance => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

impl Default for PlanarityParams {
    fn default() -> Self {
        PlanarityParams {
            planar_tolerance: Some(ZERO_TOLERANCE),
            angle_tolerance: None,
            split: QuadSplit::default(),
        }
    }
}

impl Mesh {
    /// Splits quads that are not planar into two triangles.
    ///
    /// A quad with a side of nearly zero length is instead collapsed into the
    /// triangle formed by its other corners, and no face is added. Otherwise
    /// the first triangle replaces the quad and the second is appended. Quads
    /// that cannot be collapsed into a triangle and quads without a normal,
    /// such as quads with coincident opposite corners, are left unchanged.
    ///
    /// Returns the number of quads converted.
    pub fn convert_non_planar_quads_to_triangles(&mut self, params: PlanarityParams) -> usize {
        let vertex_count = self.vertex_count();
        let mut collapses = Vec::new();
        let mut splits = Vec::new();
        for (fi, face) in self.faces.iter().enumerate() {
            if !(face.is_quad() && face.is_valid(vertex_count)) {
                continue;
            }
            let points = match self.face_points(face) {
                Some(points) if points.iter().all(|point| point.iter().all(|x| x.is_finite())) => {
                    points
                }
                _ => continue,
            };
            let tolerance = ZERO_TOLERANCE * geometry::magnitude(&points).max(1.0);
            let short = |a: u32, b: u32| {
                a == b
                    || matches!(
                        (self.point(a), self.point(b)),
                        (Some(a), Some(b)) if (a - b).norm() <= tolerance
                    )
            };
            if face
                .corners()
                .iter()
                .copied()
                .perimeter()
                .any(|(a, b)| short(a, b))
            {
                let mut collapsed = *face;
                if collapsed.repair_with(vertex_count, short) && collapsed.is_triangle() {
                    trace!(fi, ?collapsed, "collapsing quad with short side");
                    collapses.push((fi, collapsed));
                }
                else {
                    trace!(fi, "skipping collapsed quad");
                }
                continue;
            }
            if geometry::quad_normal(&points).try_normalize(0.0).is_none() {
                trace!(fi, "skipping quad without normal");
                continue;
            }
            if !params.is_planar(&points) {
                let diagonal = params.split.select(&points);
                trace!(fi, ?diagonal, "splitting non-planar quad");
                splits.push((fi as u32, diagonal));
            }
        }
        let count = collapses.len() + splits.len();
        if count == 0 {
            return 0;
        }
        self.invalidate();
        for (fi, face) in collapses {
            self.faces[fi] = face;
        }
        self.split_quads(&splits);
        debug!(count, "converted non-planar quads to triangles");
        count
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;
    use std::f64::consts::PI;

    use crate::face::MeshFace;
    use crate::mesh::{Mesh, PlanarityParams, QuadSplit};
    use crate::primitive;
    use crate::FromRawBuffers;

    fn is_planar_quad(mesh: &Mesh, face: &MeshFace) -> bool {
        mesh.face_points(face)
            .map_or(false, |points| PlanarityParams::default().is_planar(&points))
    }

    fn saddle() -> Mesh {
        // The third corner is lifted out of the plane of the others. The even
        // diagonal is longer.
        Mesh::from_raw_buffers(
            vec![MeshFace::quad(0, 1, 2, 3)],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.5, 1.5, 1.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn planar_quads_are_kept() {
        let mut mesh = primitive::cube();
        assert!(mesh.faces().iter().all(|face| is_planar_quad(&mesh, face)));
        assert_eq!(
            0,
            mesh.convert_non_planar_quads_to_triangles(PlanarityParams::default())
        );
        assert_eq!(6, mesh.quad_count());
    }

    #[test]
    fn split_non_planar_quad() {
        let mut mesh = saddle();
        assert!(!is_planar_quad(&mesh, &mesh.faces()[0]));
        assert_eq!(
            1,
            mesh.convert_non_planar_quads_to_triangles(PlanarityParams::default())
        );
        assert_eq!(
            vec![MeshFace::triangle(0, 1, 3), MeshFace::triangle(1, 2, 3)],
            mesh.faces().to_vec()
        );

        let mut mesh = saddle();
        let params = PlanarityParams::default().with_split(QuadSplit::LongDiagonal);
        assert_eq!(1, mesh.convert_non_planar_quads_to_triangles(params));
        assert_eq!(
            vec![MeshFace::triangle(0, 1, 2), MeshFace::triangle(0, 2, 3)],
            mesh.faces().to_vec()
        );
    }

    #[test]
    fn angle_tolerance_only() {
        let params = PlanarityParams::default()
            .with_planar_tolerance(None)
            .with_angle_tolerance(Some(PI / 2.0));
        let mut mesh = saddle();
        assert_eq!(0, mesh.convert_non_planar_quads_to_triangles(params));

        let params = params.with_angle_tolerance(Some(PI / 180.0));
        assert_eq!(1, mesh.convert_non_planar_quads_to_triangles(params));
        assert_eq!(2, mesh.triangle_count());
    }

    #[test]
    fn collapse_quad_with_short_side() {
        let mut mesh = Mesh::from_raw_buffers(
            vec![MeshFace::quad(0, 1, 2, 3)],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 1.0),
            ],
        )
        .unwrap();

        assert_eq!(
            1,
            mesh.convert_non_planar_quads_to_triangles(PlanarityParams::default())
        );
        assert_eq!(vec![MeshFace::triangle(0, 1, 3)], mesh.faces().to_vec());
    }

    #[test]
    fn area_policies_select_opposite_diagonals() {
        let mut min = saddle();
        let mut max = saddle();
        let params = PlanarityParams::default();
        min.convert_non_planar_quads_to_triangles(params.with_split(QuadSplit::MinArea));
        max.convert_non_planar_quads_to_triangles(params.with_split(QuadSplit::MaxArea));
        assert_ne!(min.faces(), max.faces());
    }

    #[test]
    fn skip_quad_that_cannot_collapse() {
        // Both pairs of adjacent corners coincide.
        let mut mesh = Mesh::from_raw_buffers(
            vec![MeshFace::quad(0, 1, 2, 3)],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
            ],
        )
        .unwrap();

        assert_eq!(
            0,
            mesh.convert_non_planar_quads_to_triangles(PlanarityParams::default())
        );
        assert_eq!(vec![MeshFace::quad(0, 1, 2, 3)], mesh.faces().to_vec());
    }

    #[test]
    fn coincident_opposite_corners_do_not_collapse() {
        // Every side has unit length, but the first and third corners coincide.
        let mut mesh = Mesh::from_raw_buffers(
            vec![MeshFace::quad(0, 1, 2, 3)],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        )
        .unwrap();

        assert_eq!(
            0,
            mesh.convert_non_planar_quads_to_triangles(PlanarityParams::default())
        );
        assert_eq!(vec![MeshFace::quad(0, 1, 2, 3)], mesh.faces().to_vec());
    }

    #[test]
    fn planar_tolerance_scales_with_magnitude() {
        // A unit square far from the origin with a corner displaced by less
        // than the scaled tolerance.
        let offset = 1.0e6;
        let mut mesh = Mesh::from_f64(
            vec![MeshFace::quad(0, 1, 2, 3)],
            vec![
                Point3::new(offset, offset, offset),
                Point3::new(offset + 1.0, offset, offset),
                Point3::new(offset + 1.0, offset + 1.0, offset + 1.0e-7),
                Point3::new(offset, offset + 1.0, offset),
            ],
        )
        .unwrap();
        assert_eq!(
            0,
            mesh.convert_non_planar_quads_to_triangles(PlanarityParams::default())
        );

        // The same displacement near the origin exceeds the tolerance.
        let mut mesh = Mesh::from_f64(
            vec![MeshFace::quad(0, 1, 2, 3)],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 1.0e-7),
                Point3::new(0.0, 1.0, 0.0),
            ],
        )
        .unwrap();
        assert_eq!(
            1,
            mesh.convert_non_planar_quads_to_triangles(PlanarityParams::default())
        );
    }
}
