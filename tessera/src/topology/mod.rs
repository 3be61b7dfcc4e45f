//! Topology derived from a mesh.
//!
//! A [`Topology`] merges coincident vertices of a mesh into _topological
//! vertices_ and builds an adjacency structure over them. Each topological
//! edge joins two distinct topological vertices and lists the faces that use
//! it. Each mesh face has exactly one topological face, which lists the edges
//! of its sides and whether the face traverses each edge backward.
//!
//! Topology is built from a mesh by [`Topology::build`], but it does not refer
//! back to the mesh. Meshes cache their topology and discard it whenever they
//! are mutated; see [`Mesh::topology`].
//!
//! # Degenerate Faces
//!
//! A face is _degenerate_ if it is invalid (see [`MeshFace::is_valid`]), if it
//! references a vertex with a non-finite position, or if two of its corners
//! are the same topological vertex. Degenerate faces have no edges and their
//! topological faces are [`TopFace::DEGENERATE`].
//!
//! [`Mesh::topology`]: crate::mesh::Mesh::topology
//! [`MeshFace::is_valid`]: crate::face::MeshFace::is_valid

mod build;
mod query;
mod radial;

use smallvec::SmallVec;
use thiserror::Error;

use crate::UNSET_INDEX;

pub use crate::topology::query::TopologyProperties;

/// Errors concerning [`Topology`].
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum TopologyError {
    #[error("no vertices")]
    NoVertices,
    /// An internal invariant does not hold after construction. This indicates
    /// corrupt input that was not detected beforehand.
    #[error("topology inconsistent: {0}")]
    Inconsistent(&'static str),
    #[error("too few edges for the faces and vertices present")]
    EdgeCount,
}

/// Equivalence class of coincident vertices.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TopVertex {
    pub(in crate::topology) vi: SmallVec<[u32; 4]>,
    pub(in crate::topology) topei: SmallVec<[u32; 8]>,
}

impl TopVertex {
    /// Gets the indices of the mesh vertices in this class in increasing
    /// order.
    pub fn vertices(&self) -> &[u32] {
        self.vi.as_slice()
    }

    /// Gets the indices of the incident topological edges.
    ///
    /// After a build, edges are in radial order. See
    /// [`Topology::sort_vertex_edges`].
    pub fn edges(&self) -> &[u32] {
        self.topei.as_slice()
    }
}

/// Undirected edge between two topological vertices.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TopEdge {
    pub(in crate::topology) topvi: [u32; 2],
    pub(in crate::topology) topfi: SmallVec<[u32; 2]>,
}

impl TopEdge {
    /// Gets the indices of the topological vertices at the ends of the edge.
    /// The first index is always less than the second.
    pub fn vertices(&self) -> [u32; 2] {
        self.topvi
    }

    /// Gets the indices of the faces that use the edge.
    ///
    /// Boundary edges have one face and interior edges of a manifold have two.
    /// More than two faces indicates a non-manifold edge.
    pub fn faces(&self) -> &[u32] {
        self.topfi.as_slice()
    }

    /// Gets the vertex at the opposite end of the edge from `topvi`.
    pub fn opposite(&self, topvi: u32) -> Option<u32> {
        match self.topvi {
            [a, b] if a == topvi => Some(b),
            [a, b] if b == topvi => Some(a),
            _ => None,
        }
    }
}

/// Edges of a face.
///
/// Slot $k$ holds the edge of side $k$ of the face, which joins corner $k$ to
/// corner $k + 1$. The fourth slot of a triangle repeats the third.
///
/// Corners are counted over topological vertices: a quad with two adjacent
/// corners on the same topological vertex is a triangle, and a face with
/// fewer than three distinct corners, or with coincident opposite corners, is
/// degenerate and has no edges.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TopFace {
    pub(in crate::topology) topei: [u32; 4],
    pub(in crate::topology) reve: [bool; 4],
}

impl TopFace {
    pub const DEGENERATE: TopFace = TopFace {
        topei: [UNSET_INDEX; 4],
        reve: [false; 4],
    };

    pub fn edges(&self) -> [u32; 4] {
        self.topei
    }

    /// Gets whether the face traverses the edge in each slot from its second
    /// vertex to its first.
    pub fn reversed(&self) -> [bool; 4] {
        self.reve
    }

    pub fn is_degenerate(&self) -> bool {
        self.topei[0] == UNSET_INDEX
    }

    pub fn is_triangle(&self) -> bool {
        self.topei[2] == self.topei[3]
    }

    pub fn arity(&self) -> usize {
        if self.is_degenerate() {
            0
        }
        else if self.is_triangle() {
            3
        }
        else {
            4
        }
    }

    /// Gets the slot of an edge in the face.
    pub fn slot(&self, topei: u32) -> Option<usize> {
        self.topei[..self.arity()]
            .iter()
            .position(|edge| *edge == topei)
    }
}

impl Default for TopFace {
    fn default() -> Self {
        TopFace::DEGENERATE
    }
}

/// Adjacency of topological vertices, edges, and faces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Topology {
    topv: Vec<TopVertex>,
    tope: Vec<TopEdge>,
    topf: Vec<TopFace>,
    topv_map: Vec<u32>,
}

impl Topology {
    pub fn vertices(&self) -> &[TopVertex] {
        self.topv.as_slice()
    }

    pub fn edges(&self) -> &[TopEdge] {
        self.tope.as_slice()
    }

    /// Gets the topological faces. These correspond one-to-one with the faces
    /// of the mesh.
    pub fn faces(&self) -> &[TopFace] {
        self.topf.as_slice()
    }

    /// Gets the index of the topological vertex of each mesh vertex.
    pub fn vertex_map(&self) -> &[u32] {
        self.topv_map.as_slice()
    }

    pub fn vertex(&self, topvi: u32) -> Option<&TopVertex> {
        self.topv.get(topvi as usize)
    }

    pub fn edge(&self, topei: u32) -> Option<&TopEdge> {
        self.tope.get(topei as usize)
    }

    pub fn face(&self, fi: u32) -> Option<&TopFace> {
        self.topf.get(fi as usize)
    }

    /// Gets the topological vertex of a mesh vertex.
    pub fn top_vertex_of(&self, vi: u32) -> Option<u32> {
        self.topv_map.get(vi as usize).copied()
    }

    pub fn edge_faces(&self, topei: u32) -> &[u32] {
        self.edge(topei).map(TopEdge::faces).unwrap_or(&[])
    }

    pub fn vertex_edges(&self, topvi: u32) -> &[u32] {
        self.vertex(topvi).map(TopVertex::edges).unwrap_or(&[])
    }

    /// Returns `true` if the invariants of the topology hold.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Checks the invariants of the topology.
    ///
    /// 1. Every mesh vertex is a member of exactly one topological vertex.
    /// 2. The two vertices of every edge are distinct and each lists the edge.
    /// 3. The edges of every face are distinct (except for the repeated slot
    ///    of triangles) and each lists the face.
    /// 4. The vertex map agrees with the members of each topological vertex.
    pub fn validate(&self) -> Result<(), TopologyError> {
        use TopologyError::Inconsistent;

        if self.topv_map.is_empty() {
            return Err(TopologyError::NoVertices);
        }
        let mut members = vec![0usize; self.topv_map.len()];
        for (topvi, vertex) in self.topv.iter().enumerate() {
            for vi in vertex.vi.iter() {
                let count = members
                    .get_mut(*vi as usize)
                    .ok_or(Inconsistent("vertex member out of bounds"))?;
                *count += 1;
                if self.topv_map[*vi as usize] as usize != topvi {
                    return Err(Inconsistent("vertex map disagrees with members"));
                }
            }
            for topei in vertex.topei.iter() {
                let edge = self
                    .edge(*topei)
                    .ok_or(Inconsistent("vertex edge out of bounds"))?;
                if edge.opposite(topvi as u32).is_none() {
                    return Err(Inconsistent("vertex edge does not touch vertex"));
                }
            }
        }
        if members.iter().any(|count| *count != 1) {
            return Err(Inconsistent("vertex is not a member of exactly one class"));
        }
        for (topei, edge) in self.tope.iter().enumerate() {
            let [a, b] = edge.topvi;
            if a >= b || b as usize >= self.topv.len() {
                return Err(Inconsistent("edge vertices not distinct and ordered"));
            }
            if edge.topfi.is_empty() {
                return Err(Inconsistent("edge has no faces"));
            }
            for topvi in edge.topvi {
                if !self.topv[topvi as usize].topei.contains(&(topei as u32)) {
                    return Err(Inconsistent("edge not listed by its vertex"));
                }
            }
        }
        let mut has_faces = false;
        for (fi, face) in self.topf.iter().enumerate() {
            if face.is_degenerate() {
                continue;
            }
            has_faces = true;
            let arity = face.arity();
            for (n, topei) in face.topei[..arity].iter().enumerate() {
                if face.topei[..n].contains(topei) {
                    return Err(Inconsistent("face repeats an edge"));
                }
                let edge = self
                    .edge(*topei)
                    .ok_or(Inconsistent("face edge out of bounds"))?;
                if !edge.topfi.contains(&(fi as u32)) {
                    return Err(Inconsistent("face not listed by its edge"));
                }
            }
        }
        if has_faces && self.topv.len() >= 2 && self.tope.len() < 3 {
            return Err(TopologyError::EdgeCount);
        }
        Ok(())
    }
}
