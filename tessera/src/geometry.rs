//! Computational geometry over face corners.
//!
//! These functions operate on double precision points. Mesh positions are
//! promoted to double precision before any of these computations.

use nalgebra::{Point3, Vector3};

pub type E3 = Point3<f64>;

/// Gets the (unnormalized) normal of a triangle. Its length is twice the area
/// of the triangle.
pub fn triangle_normal(a: &E3, b: &E3, c: &E3) -> Vector3<f64> {
    (b - a).cross(&(c - a))
}

pub fn triangle_area(a: &E3, b: &E3, c: &E3) -> f64 {
    0.5 * triangle_normal(a, b, c).norm()
}

/// Gets the (unnormalized) normal of a quad from the cross product of its
/// diagonals. For planar quads its length is twice the area of the quad.
pub fn quad_normal(points: &[E3; 4]) -> Vector3<f64> {
    (points[2] - points[0]).cross(&(points[3] - points[1]))
}

/// Gets the normal of a polygon at each of its corners.
///
/// The normal at a corner is the cross product of the sides leaving and
/// entering it. For a convex and counterclockwise polygon, every corner normal
/// points in the same direction.
pub fn corner_normals<const N: usize>(points: &[E3; N]) -> [Vector3<f64>; N] {
    let mut normals = [Vector3::zeros(); N];
    for (n, normal) in normals.iter_mut().enumerate() {
        let corner = points[n];
        let next = points[(n + 1) % N];
        let previous = points[(n + N - 1) % N];
        *normal = (next - corner).cross(&(previous - corner));
    }
    normals
}

/// Gets the angle between two vectors in radians.
///
/// Returns `None` if either vector has zero length.
pub fn angle_between(u: &Vector3<f64>, v: &Vector3<f64>) -> Option<f64> {
    let length = u.norm() * v.norm();
    if length > 0.0 && length.is_finite() {
        Some((u.dot(v) / length).clamp(-1.0, 1.0).acos())
    }
    else {
        None
    }
}

pub fn centroid(points: &[E3]) -> Option<E3> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |sum, point| sum + point.coords);
    Some(E3::from(sum / points.len() as f64))
}

/// Gets the largest absolute coordinate among the points.
///
/// This is used to scale tolerances that must be relative to the magnitude
/// of the coordinates involved.
pub fn magnitude(points: &[E3]) -> f64 {
    points
        .iter()
        .flat_map(|point| point.coords.iter().copied())
        .fold(0.0, |magnitude: f64, x| magnitude.max(x.abs()))
}
