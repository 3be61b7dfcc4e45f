//! Primitive meshes.
//!
//! Faces of closed primitives are wound counterclockwise when viewed from
//! outside.

use nalgebra::Point3;

use crate::mesh::Mesh;

/// Creates a tetrahedron with a corner at the origin and the other corners on
/// the positive axes.
///
/// The four vertices are shared by the faces.
pub fn tetrahedron() -> Mesh {
    let mut mesh = Mesh::new();
    for position in [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ] {
        mesh.append_vertex(Point3::from(position));
    }
    mesh.append_triangle(0, 2, 1);
    mesh.append_triangle(0, 1, 3);
    mesh.append_triangle(0, 3, 2);
    mesh.append_triangle(1, 2, 3);
    mesh
}

/// Creates a unit cube with a corner at the origin.
///
/// Each face has its own four vertices, so the vertices at each corner of the
/// cube are coincident but distinct.
pub fn cube() -> Mesh {
    const FACES: [[[f32; 3]; 4]; 6] = [
        [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
        [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]],
        [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
        [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]],
        [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]],
        [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]],
    ];
    let mut mesh = Mesh::new();
    for corners in FACES {
        let [a, b, c, d] = corners.map(|position| mesh.append_vertex(Point3::from(position)));
        mesh.append_quad(a, b, c, d);
    }
    mesh
}

/// Creates a planar grid of unit quads in the $xy$-plane.
///
/// The vertex at column $c$ and row $r$ has index $r(w + 1) + c$, where $w$
/// is the number of columns, and is located at $(c, r, 0)$. Vertices are
/// shared by adjacent quads.
pub fn grid(columns: u32, rows: u32) -> Mesh {
    let mut mesh = Mesh::new();
    for row in 0..=rows {
        for column in 0..=columns {
            mesh.append_vertex(Point3::new(column as f32, row as f32, 0.0));
        }
    }
    let stride = columns + 1;
    for row in 0..rows {
        for column in 0..columns {
            let vi = (row * stride) + column;
            mesh.append_quad(vi, vi + 1, vi + stride + 1, vi + stride);
        }
    }
    mesh
}
