//! References to mesh components.
//!
//! A [`ComponentIndex`] identifies a vertex, face, $n$-gon, or topological
//! vertex or edge of a mesh by index. It is a plain value and may refer to a
//! component that no longer exists. A [`MeshComponentRef`] pairs an index with
//! a borrow of its mesh and can only be obtained for components that exist;
//! the borrow prevents the mesh from being mutated or dropped while the
//! reference is held.

use smallvec::SmallVec;

use crate::mesh::Mesh;

/// Identifies a component of a mesh.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ComponentIndex {
    Vertex(u32),
    TopologyVertex(u32),
    TopologyEdge(u32),
    Face(u32),
    Ngon(u32),
}

impl ComponentIndex {
    pub fn index(&self) -> u32 {
        match *self {
            ComponentIndex::Vertex(index)
            | ComponentIndex::TopologyVertex(index)
            | ComponentIndex::TopologyEdge(index)
            | ComponentIndex::Face(index)
            | ComponentIndex::Ngon(index) => index,
        }
    }

    /// Returns `true` if resolving the component requires topology.
    pub fn is_topological(&self) -> bool {
        matches!(
            self,
            ComponentIndex::TopologyVertex(_) | ComponentIndex::TopologyEdge(_)
        )
    }
}

/// Reference to an existing component of a mesh.
#[derive(Clone, Copy, Debug)]
pub struct MeshComponentRef<'a> {
    mesh: &'a Mesh,
    index: ComponentIndex,
}

impl<'a> MeshComponentRef<'a> {
    pub fn mesh(&self) -> &'a Mesh {
        self.mesh
    }

    pub fn index(&self) -> ComponentIndex {
        self.index
    }

    /// Gets the mesh vertices of the component.
    ///
    /// Topological components give every coincident vertex. Faces and
    /// $n$-gons give their corners.
    pub fn vertices(&self) -> SmallVec<[u32; 8]> {
        let mesh = self.mesh;
        match self.index {
            ComponentIndex::Vertex(vi) => SmallVec::from_slice(&[vi]),
            ComponentIndex::TopologyVertex(topvi) => mesh
                .topology()
                .ok()
                .and_then(|topology| topology.vertex(topvi))
                .map(|vertex| SmallVec::from_slice(vertex.vertices()))
                .unwrap_or_default(),
            ComponentIndex::TopologyEdge(topei) => mesh
                .topology()
                .ok()
                .and_then(|topology| {
                    let [a, b] = topology.edge(topei)?.vertices();
                    Some(
                        topology
                            .vertex(a)?
                            .vertices()
                            .iter()
                            .chain(topology.vertex(b)?.vertices())
                            .copied()
                            .collect(),
                    )
                })
                .unwrap_or_default(),
            ComponentIndex::Face(fi) => mesh
                .faces()
                .get(fi as usize)
                .map(|face| SmallVec::from_slice(face.corners()))
                .unwrap_or_default(),
            ComponentIndex::Ngon(index) => mesh
                .ngon(index)
                .map(|ngon| SmallVec::from_slice(&ngon.vi))
                .unwrap_or_default(),
        }
    }

    /// Gets the faces of the component.
    ///
    /// Vertices give the faces that reference them. Topological vertices and
    /// edges give the faces that use them.
    pub fn faces(&self) -> SmallVec<[u32; 8]> {
        let mesh = self.mesh;
        match self.index {
            ComponentIndex::Vertex(vi) => mesh
                .faces()
                .iter()
                .enumerate()
                .filter(|(_, face)| face.corners().contains(&vi))
                .map(|(fi, _)| fi as u32)
                .collect(),
            ComponentIndex::TopologyVertex(topvi) => {
                let mut faces: SmallVec<[u32; 8]> = mesh
                    .topology()
                    .ok()
                    .map(|topology| {
                        topology
                            .vertex_edges(topvi)
                            .iter()
                            .flat_map(|topei| topology.edge_faces(*topei))
                            .copied()
                            .collect()
                    })
                    .unwrap_or_default();
                faces.sort_unstable();
                faces.dedup();
                faces
            }
            ComponentIndex::TopologyEdge(topei) => mesh
                .topology()
                .ok()
                .map(|topology| SmallVec::from_slice(topology.edge_faces(topei)))
                .unwrap_or_default(),
            ComponentIndex::Face(fi) => SmallVec::from_slice(&[fi]),
            ComponentIndex::Ngon(index) => mesh
                .ngon(index)
                .map(|ngon| SmallVec::from_slice(&ngon.fi))
                .unwrap_or_default(),
        }
    }
}

impl Mesh {
    /// Gets a reference to a component if it exists.
    ///
    /// Topological components require topology, which is built if necessary.
    pub fn component_ref(&self, index: ComponentIndex) -> Option<MeshComponentRef<'_>> {
        let exists = match index {
            ComponentIndex::Vertex(vi) => (vi as usize) < self.vertex_count(),
            ComponentIndex::TopologyVertex(topvi) => self
                .topology()
                .map_or(false, |topology| topology.vertex(topvi).is_some()),
            ComponentIndex::TopologyEdge(topei) => self
                .topology()
                .map_or(false, |topology| topology.edge(topei).is_some()),
            ComponentIndex::Face(fi) => (fi as usize) < self.face_count(),
            ComponentIndex::Ngon(index) => self.ngon(index).is_some(),
        };
        if exists {
            Some(MeshComponentRef { mesh: self, index })
        }
        else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::component::ComponentIndex;
    use crate::primitive;

    #[test]
    fn resolve_components() {
        let mesh = primitive::grid(2, 1);

        let face = mesh.component_ref(ComponentIndex::Face(1)).unwrap();
        assert_eq!(&[1, 2, 5, 4], face.vertices().as_slice());

        let vertex = mesh.component_ref(ComponentIndex::Vertex(1)).unwrap();
        assert_eq!(&[0, 1], vertex.faces().as_slice());

        let topology = mesh.topology().unwrap();
        let topei = topology.top_edge(1, 4).unwrap();
        let edge = mesh
            .component_ref(ComponentIndex::TopologyEdge(topei))
            .unwrap();
        assert_eq!(&[0, 1], edge.faces().as_slice());
        assert_eq!(&[1, 4], edge.vertices().as_slice());

        assert!(mesh.component_ref(ComponentIndex::Face(2)).is_none());
        assert!(mesh.component_ref(ComponentIndex::Ngon(0)).is_none());
    }

    #[test]
    fn coincident_vertices_of_topological_vertex() {
        let mesh = primitive::cube();
        let topvi = mesh.topology().unwrap().top_vertex_of(0).unwrap();
        let vertex = mesh
            .component_ref(ComponentIndex::TopologyVertex(topvi))
            .unwrap();

        // Each corner of the cube is shared by three faces.
        assert_eq!(3, vertex.vertices().len());
        assert_eq!(3, vertex.faces().len());
    }
}
