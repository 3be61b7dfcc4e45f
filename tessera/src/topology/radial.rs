//! Radial ordering of the edges around a vertex.
//!
//! The edges of a topological vertex are in _radial order_ when consecutive
//! edges are sides of a common face, so that the order sweeps around the
//! vertex through the faces that meet there. Around an oriented fan, the
//! sweep follows the winding of the faces: each face is entered through the
//! edge on which it leaves the vertex and exited through the edge on which
//! it arrives.
//!
//! Vertices on a boundary, non-manifold vertices, and vertices where the faces
//! disagree about orientation have more than one fan. Each fan is ordered
//! independently and the fans are concatenated.

use smallvec::SmallVec;

use crate::topology::Topology;

impl Topology {
    /// Sorts the edges of a topological vertex into radial order.
    ///
    /// Returns `false` if there is no such vertex.
    pub fn sort_vertex_edges(&mut self, topvi: u32) -> bool {
        match self.radial_order(topvi) {
            Some(topei) => {
                self.topv[topvi as usize].topei = topei;
                true
            }
            None => false,
        }
    }

    /// Sorts the edges of every topological vertex into radial order.
    pub fn sort_all_vertex_edges(&mut self) {
        for topvi in 0..self.topv.len() {
            self.sort_vertex_edges(topvi as u32);
        }
    }

    fn radial_order(&self, topvi: u32) -> Option<SmallVec<[u32; 8]>> {
        let vertex = self.vertex(topvi)?;
        let mut remaining = vertex.topei.clone();
        if remaining.len() < 3 {
            return Some(remaining);
        }
        let mut order = SmallVec::with_capacity(remaining.len());
        while !remaining.is_empty() {
            // Fans begin at boundary or non-manifold edges. A vertex with only
            // interior edges may begin anywhere.
            let start = remaining
                .iter()
                .position(|topei| self.edge_faces(*topei).len() != 2)
                .unwrap_or(0);
            let start = remaining.remove(start);
            let mut fan = SmallVec::<[u32; 8]>::new();
            fan.push(start);

            let mut topei = start;
            let mut previous = None;
            let mut forward = true;
            loop {
                let faces = self.edge_faces(topei);
                let fi = match previous {
                    None => match faces.first() {
                        Some(fi) => *fi,
                        None => break,
                    },
                    // The fan ends at boundary and non-manifold edges.
                    Some(_) if faces.len() != 2 => break,
                    Some(previous) => {
                        if faces[0] == previous {
                            faces[1]
                        }
                        else {
                            faces[0]
                        }
                    }
                };
                let (outgoing, incoming) = match self.corner_edges(fi, topvi) {
                    Some(edges) => edges,
                    None => break,
                };
                if previous.is_none() {
                    forward = outgoing == topei;
                }
                let next = if outgoing == topei { incoming } else { outgoing };
                match remaining.iter().position(|topei| *topei == next) {
                    Some(position) => {
                        remaining.remove(position);
                        fan.push(next);
                    }
                    None => break,
                }
                previous = Some(fi);
                topei = next;
            }
            // Walking against the winding of the first face visits the fan
            // backward.
            if !forward {
                fan.reverse();
            }
            order.extend(fan);
        }
        Some(order)
    }

    /// Gets the edges of a face that leave and arrive at one of its corners.
    fn corner_edges(&self, fi: u32, topvi: u32) -> Option<(u32, u32)> {
        let face = self.face(fi)?;
        let corners = self.top_face_vertices(fi)?;
        let arity = face.arity();
        let k = corners[..arity].iter().position(|corner| *corner == topvi)?;
        Some((face.topei[k], face.topei[(k + arity - 1) % arity]))
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use crate::face::MeshFace;
    use crate::mesh::Mesh;
    use crate::primitive;
    use crate::topology::Topology;
    use crate::FromRawBuffers;

    fn share_face(topology: &Topology, a: u32, b: u32) -> bool {
        topology
            .edge_faces(a)
            .iter()
            .any(|fi| topology.edge_faces(b).contains(fi))
    }

    #[test]
    fn interior_vertex_is_cyclic() {
        let mesh = primitive::grid(2, 2);
        let topology = mesh.topology().unwrap();
        // The center of a 2x2 grid.
        let topvi = topology.top_vertex_of(4).unwrap();
        let edges = topology.vertex_edges(topvi);

        assert_eq!(4, edges.len());
        for n in 0..edges.len() {
            assert!(share_face(topology, edges[n], edges[(n + 1) % edges.len()]));
        }
    }

    #[test]
    fn boundary_vertex_begins_at_boundary() {
        let mesh = primitive::grid(2, 2);
        let topology = mesh.topology().unwrap();
        // The middle of the bottom side of a 2x2 grid.
        let topvi = topology.top_vertex_of(1).unwrap();
        let edges = topology.vertex_edges(topvi);

        assert_eq!(3, edges.len());
        assert_eq!(1, topology.edge_faces(edges[0]).len());
        assert_eq!(2, topology.edge_faces(edges[1]).len());
        assert_eq!(1, topology.edge_faces(edges[2]).len());
        assert!(share_face(topology, edges[0], edges[1]));
        assert!(share_face(topology, edges[1], edges[2]));

        // The first edge leaves the vertex in the winding of its face.
        let fi = topology.edge_faces(edges[0])[0];
        let face = topology.faces()[fi as usize];
        let slot = face.slot(edges[0]).unwrap();
        assert_eq!(topvi, topology.top_face_vertices(fi).unwrap()[slot]);
    }

    #[test]
    fn order_is_a_permutation_for_misoriented_faces() {
        // Three triangles around vertex 0; the last is wound backward.
        let mesh = Mesh::from_raw_buffers(
            vec![
                MeshFace::triangle(0, 1, 2),
                MeshFace::triangle(0, 2, 3),
                MeshFace::triangle(0, 3, 4),
                MeshFace::triangle(0, 5, 4),
            ],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(-1.0, 1.0, 0.0),
                Point3::new(-1.0, 0.0, 0.0),
            ],
        )
        .unwrap();
        let topology = mesh.topology().unwrap();
        let mut edges = topology.vertex_edges(0).to_vec();

        assert!(topology.is_valid());
        assert_eq!(5, edges.len());
        edges.sort_unstable();
        edges.dedup();
        assert_eq!(5, edges.len());
    }
}
