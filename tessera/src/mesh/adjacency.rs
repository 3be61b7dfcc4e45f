//! Edges adjacent to mesh vertices.
//!
//! Edges are reported as pairs of mesh vertex indices `[a, b]` with `a < b`.
//! When duplicates are excluded, sides of faces that join the same pair of
//! topological vertices are reported once, using the pair of mesh vertices
//! that sorts first.
//!
//! Identifying topological vertices requires coincidence information. If the
//! topology of a mesh is cached, it provides this information. Otherwise,
//! vertices are classified on demand. Both sources yield the same edges.

use crate::coincidence::Coincidence;
use crate::mesh::Mesh;
use crate::topology::Topology;

/// Source of the topological identity of mesh vertices.
pub trait VertexIds {
    /// Gets an id for a mesh vertex such that coincident vertices have the
    /// same id.
    ///
    /// Returns `None` for vertices that are not coincident with any other
    /// vertex, including themselves. Such vertices are distinct from every
    /// other vertex.
    fn vertex_id(&self, vi: u32) -> Option<u32>;
}

impl VertexIds for Coincidence {
    fn vertex_id(&self, vi: u32) -> Option<u32> {
        self.id(vi as usize)
    }
}

impl VertexIds for Topology {
    fn vertex_id(&self, vi: u32) -> Option<u32> {
        self.top_vertex_of(vi)
    }
}

/// Identity of a vertex: its id if it has one or else its index.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
enum Identity {
    Id(u32),
    Unique(u32),
}

fn identity<S>(source: &S, vi: u32) -> Identity
where
    S: VertexIds + ?Sized,
{
    source
        .vertex_id(vi)
        .map_or(Identity::Unique(vi), Identity::Id)
}

impl Mesh {
    /// Gets the edges of faces that touch any of the given vertices.
    ///
    /// When `no_duplicates` is `true`, each topological edge is reported once.
    pub fn vertex_edges(&self, vertices: &[u32], no_duplicates: bool) -> Vec<[u32; 2]> {
        let mut vertices = vertices.to_vec();
        vertices.sort_unstable();
        vertices.dedup();
        self.edges_with_source(Some(&vertices[..]), no_duplicates)
    }

    /// Gets the edges of every face.
    ///
    /// When `no_duplicates` is `true`, each topological edge is reported once.
    pub fn mesh_edges(&self, no_duplicates: bool) -> Vec<[u32; 2]> {
        self.edges_with_source(None, no_duplicates)
    }

    fn edges_with_source(&self, vertices: Option<&[u32]>, no_duplicates: bool) -> Vec<[u32; 2]> {
        match self.cache.topology.get() {
            Some(topology) => self.edges_with_ids(topology, vertices, no_duplicates),
            None => match self.coincidence() {
                Some(coincidence) => self.edges_with_ids(&coincidence, vertices, no_duplicates),
                None => Vec::new(),
            },
        }
    }

    /// Gets the edges of faces using the given source of vertex ids.
    ///
    /// If `vertices` is given, it must be sorted and only edges that touch
    /// one of its vertices are reported.
    pub fn edges_with_ids<S>(
        &self,
        source: &S,
        vertices: Option<&[u32]>,
        no_duplicates: bool,
    ) -> Vec<[u32; 2]>
    where
        S: VertexIds + ?Sized,
    {
        let vertex_count = self.vertex_count();
        let touches = |vi: u32| {
            vertices.map_or(true, |vertices| vertices.binary_search(&vi).is_ok())
        };
        let mut edges = Vec::new();
        for face in self.faces.iter().filter(|face| face.is_valid(vertex_count)) {
            for side in face.sides(0) {
                let [a, b] = side.vi;
                if !(touches(a) || touches(b)) {
                    continue;
                }
                let (x, y) = (identity(source, a), identity(source, b));
                if x == y {
                    continue;
                }
                let key = if x < y { (x, y) } else { (y, x) };
                edges.push((key, side.vi));
            }
        }
        if no_duplicates {
            edges.sort_unstable();
            edges.dedup_by(|next, previous| next.0 == previous.0);
        }
        let mut edges: Vec<_> = edges.into_iter().map(|(_, vi)| vi).collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }
}
