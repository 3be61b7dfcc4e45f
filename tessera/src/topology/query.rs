use crate::face::MeshFace;
use crate::topology::Topology;
use crate::IteratorExt as _;

/// Properties of a topology determined by a walk over its edges.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TopologyProperties {
    /// Every edge has one or two faces.
    pub manifold: bool,
    /// The two faces of every interior edge traverse it in opposite
    /// directions.
    pub oriented: bool,
    /// Some edge has exactly one face.
    pub boundary: bool,
}

impl Topology {
    pub fn properties(&self) -> TopologyProperties {
        let mut properties = TopologyProperties {
            manifold: true,
            oriented: true,
            boundary: false,
        };
        for (topei, edge) in self.tope.iter().enumerate() {
            match edge.topfi.as_slice() {
                [_] => {
                    properties.boundary = true;
                }
                [a, b] => {
                    if self.edge_direction(topei as u32, *a) == self.edge_direction(topei as u32, *b)
                    {
                        properties.oriented = false;
                    }
                }
                _ => {
                    properties.manifold = false;
                }
            }
        }
        properties
    }

    pub fn is_manifold(&self) -> bool {
        self.properties().manifold
    }

    pub fn is_oriented(&self) -> bool {
        self.properties().oriented
    }

    pub fn has_boundary(&self) -> bool {
        self.properties().boundary
    }

    /// Returns `true` if there is at least one edge and every edge has
    /// exactly two faces.
    pub fn is_closed(&self) -> bool {
        !self.tope.is_empty() && self.tope.iter().all(|edge| edge.topfi.len() == 2)
    }

    /// Gets the edge joining two topological vertices.
    pub fn top_edge(&self, a: u32, b: u32) -> Option<u32> {
        if a == b {
            return None;
        }
        self.vertex(a)?
            .topei
            .iter()
            .copied()
            .find(|topei| self.tope[*topei as usize].opposite(a) == Some(b))
    }

    /// Gets the topological vertices at the corners of a face.
    ///
    /// As with faces, the last two vertices of a triangle are the same.
    /// Returns `None` if the face is degenerate or out of bounds.
    pub fn top_face_vertices(&self, fi: u32) -> Option<[u32; 4]> {
        let face = self.face(fi)?;
        if face.is_degenerate() {
            return None;
        }
        let mut corners = [0u32; 4];
        for (k, corner) in corners.iter_mut().enumerate() {
            let [a, b] = self.edge(face.topei[k])?.topvi;
            *corner = if face.reve[k] { b } else { a };
        }
        if face.is_triangle() {
            corners[3] = corners[2];
        }
        Some(corners)
    }

    /// Gets whether a face traverses an edge from its second vertex to its
    /// first.
    ///
    /// Returns `None` if the face does not use the edge.
    pub fn edge_direction(&self, topei: u32, fi: u32) -> Option<bool> {
        let face = self.face(fi)?;
        face.slot(topei).map(|k| face.reve[k])
    }

    /// Returns `true` if every face that uses an edge uses the same mesh
    /// vertices at its ends.
    ///
    /// Edges that are not welded are seams, such as where faces meet at a
    /// crease with distinct vertex normals.
    pub fn is_welded_edge(&self, faces: &[MeshFace], topei: u32) -> bool {
        let edge = match self.edge(topei) {
            Some(edge) => edge,
            None => return false,
        };
        let mut ends: Option<[u32; 2]> = None;
        for fi in edge.topfi.iter() {
            let face = match faces.get(*fi as usize) {
                Some(face) => face,
                None => return false,
            };
            // The slots of a face with a collapsed side do not follow its
            // corners.
            let vi = face
                .corners()
                .iter()
                .copied()
                .perimeter()
                .find_map(|(start, end)| {
                    let side = [self.top_vertex_of(start)?, self.top_vertex_of(end)?];
                    if side == edge.topvi {
                        Some([start, end])
                    }
                    else if [side[1], side[0]] == edge.topvi {
                        Some([end, start])
                    }
                    else {
                        None
                    }
                });
            match (vi, ends) {
                (None, _) => return false,
                (Some(vi), Some(ends)) if ends != vi => return false,
                (Some(vi), _) => ends = Some(vi),
            }
        }
        ends.is_some()
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use crate::face::MeshFace;
    use crate::mesh::Mesh;
    use crate::primitive;
    use crate::FromRawBuffers;

    fn square() -> Vec<Point3<f32>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn single_triangle_is_open() {
        let mesh = Mesh::from_raw_buffers(vec![MeshFace::triangle(0, 1, 2)], square()).unwrap();
        let topology = mesh.topology().unwrap();
        let properties = topology.properties();

        assert!(properties.manifold);
        assert!(properties.oriented);
        assert!(properties.boundary);
        assert!(!topology.is_closed());
        assert_eq!(3, topology.edges().len());
    }

    #[test]
    fn consistently_wound_triangles_are_oriented() {
        let mesh = Mesh::from_raw_buffers(
            vec![MeshFace::triangle(0, 1, 2), MeshFace::triangle(0, 2, 3)],
            square(),
        )
        .unwrap();
        assert!(mesh.topology().unwrap().is_oriented());
    }

    #[test]
    fn inconsistently_wound_triangles_are_not_oriented() {
        // Both faces traverse the shared edge from 0 to 2.
        let mesh = Mesh::from_raw_buffers(
            vec![MeshFace::triangle(0, 1, 2), MeshFace::triangle(0, 3, 2)],
            square(),
        )
        .unwrap();
        let topology = mesh.topology().unwrap();

        assert!(topology.is_manifold());
        assert!(!topology.is_oriented());
    }

    #[test]
    fn fin_is_not_manifold() {
        // Three triangles share the edge between vertices 0 and 1.
        let mesh = Mesh::from_raw_buffers(
            vec![
                MeshFace::triangle(0, 1, 2),
                MeshFace::triangle(1, 0, 3),
                MeshFace::triangle(1, 0, 4),
            ],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, -1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
        )
        .unwrap();
        let topology = mesh.topology().unwrap();

        assert!(topology.is_valid());
        assert!(!topology.is_manifold());
        let topei = topology.top_edge(0, 1).unwrap();
        assert_eq!(3, topology.edge_faces(topei).len());
    }

    #[test]
    fn orientation_agrees_with_face_walk() {
        // Re-derive orientation from the faces directly: an oriented mesh never
        // traverses the same directed side twice.
        let mesh = primitive::cube();
        let topology = mesh.topology().unwrap();
        let map = topology.vertex_map();
        let mut directed = Vec::new();
        for face in mesh.faces() {
            for side in face.sides(0) {
                let (a, b) = side.directed();
                directed.push((map[a as usize], map[b as usize]));
            }
        }
        let count = directed.len();
        directed.sort_unstable();
        directed.dedup();

        assert_eq!(count, directed.len());
        assert!(topology.is_oriented());
        assert!(topology.is_closed());
    }

    #[test]
    fn find_face_vertices() {
        let mesh = Mesh::from_raw_buffers(vec![MeshFace::quad(3, 2, 1, 0)], square()).unwrap();
        let topology = mesh.topology().unwrap();

        assert_eq!(Some([3, 2, 1, 0]), topology.top_face_vertices(0));
        assert_eq!(None, topology.top_face_vertices(1));
    }

    #[test]
    fn detect_welded_edges() {
        let cube = primitive::cube();
        let topology = cube.topology().unwrap();
        // The vertices of the cube are not shared between its faces.
        assert!(topology
            .edges()
            .iter()
            .enumerate()
            .all(|(topei, _)| !topology.is_welded_edge(cube.faces(), topei as u32)));

        let grid = primitive::grid(2, 1);
        let topology = grid.topology().unwrap();
        let topei = topology.top_edge(1, 4).unwrap();
        assert!(topology.is_welded_edge(grid.faces(), topei));
    }

    #[test]
    fn collapsed_side_quad_closes_tetrahedron() {
        // Vertex 4 is coincident with vertex 3.
        let mesh = Mesh::from_raw_buffers(
            vec![
                MeshFace::triangle(0, 2, 1),
                MeshFace::triangle(0, 1, 3),
                MeshFace::triangle(0, 3, 2),
                MeshFace::quad(1, 2, 3, 4),
            ],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
        )
        .unwrap();
        // Computed without topology.
        assert!(mesh.clone().is_closed());

        let topology = mesh.topology().unwrap();
        assert!(topology.is_closed());
        assert!(topology.is_oriented());
        assert!(topology.faces()[3].is_triangle());
        let welded = topology.top_edge(2, 3).unwrap();
        assert!(topology.is_welded_edge(mesh.faces(), welded));
        // The quad leaves vertex 4 toward vertex 1, but the triangle uses
        // vertex 3.
        let seam = topology.top_edge(1, 3).unwrap();
        assert!(!topology.is_welded_edge(mesh.faces(), seam));
    }
}
