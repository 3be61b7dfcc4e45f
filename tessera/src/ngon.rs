//! $n$-gons composed of mesh faces.
//!
//! An [`MeshNgon`] groups one or more adjacent faces and presents them as a
//! single polygon. It stores the ordered vertex indices of its outer boundary
//! and the (unordered) indices of the faces that compose it.
//!
//! The boundary of a valid $n$-gon is exactly the set of face sides that are
//! not shared by two of its faces: when the sides of its faces are counted,
//! interior sides cancel in pairs and only boundary sides remain.

use ahash::AHashMap;
use thiserror::Error;
use tracing::warn;

use crate::face::MeshFace;
use crate::mesh::Mesh;
use crate::IteratorExt as _;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum NgonError {
    #[error("n-gon boundary has fewer than three vertices")]
    TooFewVertices,
    #[error("n-gon has no faces")]
    NoFaces,
    #[error("n-gon vertex index {index} out of bounds ({count} vertices)")]
    VertexOutOfBounds { index: u32, count: usize },
    #[error("n-gon face index {index} out of bounds ({count} faces)")]
    FaceOutOfBounds { index: u32, count: usize },
    #[error("n-gon references invalid face {index}")]
    InvalidFace { index: u32 },
    #[error("n-gon references vertex {index} more than once")]
    DuplicateVertex { index: u32 },
    #[error("n-gon references face {index} more than once")]
    DuplicateFace { index: u32 },
    #[error("n-gon boundary does not match the boundary of its faces")]
    BoundaryMismatch,
}

/// Polygon composed of mesh faces.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MeshNgon {
    /// Vertex indices of the outer boundary in order.
    pub vi: Vec<u32>,
    /// Indices of the faces that compose the $n$-gon.
    pub fi: Vec<u32>,
}

impl MeshNgon {
    pub fn new(vi: Vec<u32>, fi: Vec<u32>) -> Self {
        MeshNgon { vi, fi }
    }

    /// Creates an $n$-gon from faces by finding their outer boundary.
    ///
    /// The boundary follows the winding of the faces. Returns `None` if the
    /// faces do not form a single region bounded by one simple loop, such as
    /// when the faces are disjoint, enclose a hole, or disagree about their
    /// orientation.
    pub fn from_faces(faces: &[MeshFace], fi: Vec<u32>) -> Option<Self> {
        let vi = outer_boundary(faces, &fi)?;
        Some(MeshNgon { vi, fi })
    }

    pub fn boundary_edges(&self) -> impl '_ + Iterator<Item = (u32, u32)> {
        self.vi.iter().copied().perimeter()
    }

    /// Reverses the boundary, keeping its first vertex.
    pub fn reverse(&mut self) {
        if let Some((_, rest)) = self.vi.split_first_mut() {
            rest.reverse();
        }
    }

    /// Returns `true` if the $n$-gon is valid in the given mesh.
    ///
    /// When `silent` is `false`, the reason an $n$-gon is invalid is logged.
    pub fn is_valid(&self, mesh: &Mesh, silent: bool) -> bool {
        match self.validate(mesh.vertex_count(), mesh.faces()) {
            Ok(()) => true,
            Err(error) => {
                if !silent {
                    warn!(%error, "invalid n-gon");
                }
                false
            }
        }
    }

    /// Validates the $n$-gon against vertex and face data.
    pub fn validate(&self, vertex_count: usize, faces: &[MeshFace]) -> Result<(), NgonError> {
        if self.vi.len() < 3 {
            return Err(NgonError::TooFewVertices);
        }
        if self.fi.is_empty() {
            return Err(NgonError::NoFaces);
        }
        for (n, index) in self.vi.iter().enumerate() {
            if *index as usize >= vertex_count {
                return Err(NgonError::VertexOutOfBounds {
                    index: *index,
                    count: vertex_count,
                });
            }
            if self.vi[..n].contains(index) {
                return Err(NgonError::DuplicateVertex { index: *index });
            }
        }
        for (n, index) in self.fi.iter().enumerate() {
            let face = faces
                .get(*index as usize)
                .ok_or(NgonError::FaceOutOfBounds {
                    index: *index,
                    count: faces.len(),
                })?;
            if !face.is_valid(vertex_count) {
                return Err(NgonError::InvalidFace { index: *index });
            }
            if self.fi[..n].contains(index) {
                return Err(NgonError::DuplicateFace { index: *index });
            }
        }
        let mut boundary: Vec<_> = odd_sides(faces, &self.fi)
            .into_iter()
            .map(|(a, b)| undirected(a, b))
            .collect();
        let mut expected: Vec<_> = self
            .boundary_edges()
            .map(|(a, b)| undirected(a, b))
            .collect();
        boundary.sort_unstable();
        expected.sort_unstable();
        if boundary == expected {
            Ok(())
        }
        else {
            Err(NgonError::BoundaryMismatch)
        }
    }
}

fn undirected(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    }
    else {
        (b, a)
    }
}

/// Gets the directed face sides that are used an odd number of times among
/// the given faces, in face order.
///
/// Sides shared by two faces cancel. Out of bounds face indices are ignored.
fn odd_sides(faces: &[MeshFace], fi: &[u32]) -> Vec<(u32, u32)> {
    let directed: Vec<_> = fi
        .iter()
        .filter_map(|index| faces.get(*index as usize))
        .flat_map(|face| face.corners().iter().copied().perimeter())
        .collect();
    let mut counts = AHashMap::<(u32, u32), usize>::with_capacity(directed.len());
    for (a, b) in directed.iter() {
        *counts.entry(undirected(*a, *b)).or_insert(0) += 1;
    }
    directed
        .into_iter()
        .filter(|(a, b)| counts.get(&undirected(*a, *b)).copied().unwrap_or(0) % 2 == 1)
        .collect()
}

fn outer_boundary(faces: &[MeshFace], fi: &[u32]) -> Option<Vec<u32>> {
    if fi.is_empty() || fi.iter().any(|index| faces.get(*index as usize).is_none()) {
        return None;
    }
    let sides = odd_sides(faces, fi);
    let mut next = AHashMap::<u32, u32>::with_capacity(sides.len());
    for (a, b) in sides.iter() {
        // A vertex with more than one outgoing boundary side is pinched.
        if next.insert(*a, *b).is_some() {
            return None;
        }
    }
    let (start, _) = *sides.first()?;
    let mut vi = Vec::with_capacity(sides.len());
    let mut vertex = start;
    loop {
        vi.push(vertex);
        vertex = *next.get(&vertex)?;
        if vertex == start {
            break;
        }
        if vi.len() > sides.len() {
            return None;
        }
    }
    // Every boundary side must belong to the same loop.
    if vi.len() == sides.len() && vi.len() >= 3 {
        Some(vi)
    }
    else {
        None
    }
}
