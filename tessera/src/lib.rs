//! **Tessera** is a library for indexed polygonal meshes and the topology
//! derived from them.
//!
//! A [`Mesh`] is a flat collection of vertex positions and triangular or
//! quadrilateral [faces][`MeshFace`] that index into those positions. Faces
//! may be grouped into [$n$-gons][`MeshNgon`] and vertices may carry optional
//! [attributes][`VertexAttributes`] such as normals and texture coordinates.
//!
//! Vertices that occupy exactly the same location are distinct entries in a
//! mesh, but they are the same _topological vertex_. The [`topology`] module
//! merges such vertices and builds an adjacency structure of topological
//! vertices, edges, and faces. Meshes build this structure lazily and cache it
//! until they are mutated.
//!
//! # Examples
//!
//! Querying the topology of a tetrahedron:
//!
//! ```rust
//! use tessera::primitive;
//!
//! let mesh = primitive::tetrahedron();
//! assert!(mesh.is_solid());
//!
//! let topology = mesh.topology().unwrap();
//! assert_eq!(4, topology.vertices().len());
//! assert_eq!(6, topology.edges().len());
//! ```
//!
//! [`Mesh`]: crate::mesh::Mesh
//! [`MeshFace`]: crate::face::MeshFace
//! [`MeshNgon`]: crate::ngon::MeshNgon
//! [`VertexAttributes`]: crate::attribute::VertexAttributes
//! [`topology`]: crate::topology
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

use std::fmt::Debug;

pub mod attribute;
pub mod coincidence;
pub mod component;
pub mod face;
pub mod geometry;
pub mod mesh;
pub mod ngon;
pub mod primitive;
pub mod topology;

pub mod prelude {
    //! Re-exports commonly used types and traits.

    pub use crate::component::ComponentIndex;
    pub use crate::face::MeshFace;
    pub use crate::mesh::{DeletePolicy, Mesh};
    pub use crate::ngon::MeshNgon;
    pub use crate::topology::Topology;
    pub use crate::FromRawBuffers as _;
    pub use crate::IteratorExt as _;
}

/// Index used to mark a vertex, face, or edge reference as absent.
///
/// Faces whose vertex indices are all `UNSET_INDEX` are neutralized and are
/// removed when a mesh is compacted.
pub const UNSET_INDEX: u32 = u32::MAX;

pub trait FromRawBuffers<N, G>: Sized {
    type Error: Debug;

    fn from_raw_buffers<I, J>(indices: I, vertices: J) -> Result<Self, Self::Error>
    where
        I: IntoIterator<Item = N>,
        J: IntoIterator<Item = G>;
}

/// Extension methods for iterators over the corners of polygons.
pub trait IteratorExt: Iterator + Sized {
    /// Pairs each item with the item that follows it, and finally the last
    /// item with the first.
    ///
    /// A single item is paired with itself. The sides of faces and the
    /// boundaries of $n$-gons are perimeters over vertex indices.
    fn perimeter(self) -> Perimeter<Self>
    where
        Self::Item: Copy,
    {
        Perimeter {
            input: self,
            state: Loop::Unstarted,
        }
    }
}

impl<I> IteratorExt for I where I: Iterator {}

#[derive(Clone, Copy)]
enum Loop<T> {
    Unstarted,
    Open { first: T, previous: T },
    Closed,
}

/// Iterator over consecutive pairs of items that closes into a loop.
///
/// See [`IteratorExt::perimeter`].
pub struct Perimeter<I>
where
    I: Iterator,
{
    input: I,
    state: Loop<I::Item>,
}

impl<I> Iterator for Perimeter<I>
where
    I: Iterator,
    I::Item: Copy,
{
    type Item = (I::Item, I::Item);

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            Loop::Unstarted => match self.input.next() {
                Some(first) => {
                    self.state = Loop::Open {
                        first,
                        previous: first,
                    };
                    self.next()
                }
                None => {
                    self.state = Loop::Closed;
                    None
                }
            },
            Loop::Open { first, previous } => match self.input.next() {
                Some(next) => {
                    self.state = Loop::Open {
                        first,
                        previous: next,
                    };
                    Some((previous, next))
                }
                None => {
                    self.state = Loop::Closed;
                    Some((previous, first))
                }
            },
            Loop::Closed => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, upper) = self.input.size_hint();
        match self.state {
            // Each item begins one pair.
            Loop::Unstarted => (lower, upper),
            Loop::Open { .. } => (
                lower.saturating_add(1),
                upper.and_then(|upper| upper.checked_add(1)),
            ),
            Loop::Closed => (0, Some(0)),
        }
    }
}

trait OptionExt<T> {
    fn expect_consistent(self) -> T;
}

impl<T> OptionExt<T> for Option<T> {
    #[allow(clippy::expect_used)]
    fn expect_consistent(self) -> T {
        self.expect("internal error: mesh consistency violated")
    }
}
