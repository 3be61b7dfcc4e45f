//! Property tests of coincidence classification, topology, and mutation.
//!
//! Positions are drawn from a small lattice so that coincident vertices are
//! common, and faces are drawn without regard for validity.

use nalgebra::Point3;
use proptest::prelude::*;
use tessera::coincidence;
use tessera::mesh::TriangleMergeParams;
use tessera::prelude::*;

fn arb_position() -> impl Strategy<Value = [f32; 3]> {
    prop::array::uniform3(0u8..3).prop_map(|[x, y, z]| [f32::from(x), f32::from(y), f32::from(z)])
}

fn arb_face(count: u32) -> impl Strategy<Value = MeshFace> {
    prop_oneof![
        prop::array::uniform3(0..count).prop_map(|[a, b, c]| MeshFace::triangle(a, b, c)),
        prop::array::uniform4(0..count).prop_map(MeshFace::from),
    ]
}

fn arb_mesh() -> impl Strategy<Value = Mesh> {
    (3u32..24)
        .prop_flat_map(|count| {
            (
                prop::collection::vec(arb_position(), count as usize),
                prop::collection::vec(arb_face(count), 0..32),
            )
        })
        .prop_map(|(positions, faces)| {
            Mesh::from_raw_buffers(faces, positions.into_iter().map(Point3::from)).unwrap()
        })
}

fn arb_permuted_points() -> impl Strategy<Value = (Vec<[f32; 3]>, Vec<usize>)> {
    prop::collection::vec(arb_position(), 1..32).prop_flat_map(|points| {
        let order: Vec<usize> = (0..points.len()).collect();
        (Just(points), Just(order).prop_shuffle())
    })
}

proptest! {
    #[test]
    fn coincidence_is_invariant_under_permutation((points, order) in arb_permuted_points()) {
        let permuted: Vec<_> = order.iter().map(|index| points[*index]).collect();
        let original = coincidence::classify(&points, 0).unwrap();
        let shuffled = coincidence::classify(&permuted, 0).unwrap();

        prop_assert_eq!(original.group_count(), shuffled.group_count());
        for a in 0..permuted.len() {
            for b in 0..permuted.len() {
                prop_assert_eq!(
                    shuffled.id(a) == shuffled.id(b),
                    original.id(order[a]) == original.id(order[b])
                );
            }
        }
    }

    #[test]
    fn topology_invariants_hold(mesh in arb_mesh()) {
        // Computed without topology.
        let closed = mesh.clone().is_closed();
        let topology = mesh.topology().unwrap();

        prop_assert!(topology.validate().is_ok());
        prop_assert_eq!(mesh.vertex_count(), topology.vertex_map().len());
        prop_assert_eq!(mesh.face_count(), topology.faces().len());
        for (topei, edge) in topology.edges().iter().enumerate() {
            prop_assert!(!edge.faces().is_empty());
            for fi in edge.faces() {
                let face = topology.face(*fi).unwrap();
                prop_assert!(face.slot(topei as u32).is_some());
            }
        }
        prop_assert_eq!(closed, topology.is_closed());
    }

    #[test]
    fn edge_sources_agree(mesh in arb_mesh(), no_duplicates: bool) {
        let coincidence = mesh.coincidence().unwrap();
        let topology = mesh.topology().unwrap();

        prop_assert_eq!(
            mesh.edges_with_ids(&coincidence, None, no_duplicates),
            mesh.edges_with_ids(topology, None, no_duplicates)
        );
    }

    #[test]
    fn deletion_conserves_components(
        mut mesh in arb_mesh(),
        faces in prop::collection::vec(0u32..32, 0..8),
        vertices in prop::collection::vec(0u32..24, 0..4),
        remove_degenerate_faces: bool,
        remove_unused_vertices: bool,
    ) {
        let (vertex_count, face_count) = (mesh.vertex_count(), mesh.face_count());
        let components: Vec<_> = faces
            .into_iter()
            .map(ComponentIndex::Face)
            .chain(vertices.into_iter().map(ComponentIndex::Vertex))
            .collect();
        let policy = DeletePolicy::default()
            .with_remove_degenerate_faces(remove_degenerate_faces)
            .with_remove_unused_vertices(remove_unused_vertices);
        let report = mesh.delete_components(&components, policy).unwrap();

        prop_assert_eq!(vertex_count, mesh.vertex_count() + report.vertices_removed);
        prop_assert_eq!(face_count, mesh.face_count() + report.faces_removed);
        for face in mesh.faces() {
            prop_assert!(face.vi.iter().all(|vi| (*vi as usize) < mesh.vertex_count()));
        }
        prop_assert!(mesh.topology().map_or(mesh.is_empty(), |topology| topology.is_valid()));
    }

    #[test]
    fn split_and_merge_rectangle(
        width in 0.5f32..4.0,
        height in 0.5f32..4.0,
        x in -8.0f32..8.0,
        y in -8.0f32..8.0,
    ) {
        let mut mesh = Mesh::from_raw_buffers(
            vec![[0u32, 1, 2, 3]],
            vec![
                Point3::new(x, y, 1.0),
                Point3::new(x + width, y, 1.0),
                Point3::new(x + width, y + height, 1.0),
                Point3::new(x, y + height, 1.0),
            ],
        )
        .unwrap();

        prop_assert_eq!(1, mesh.convert_quads_to_triangles());
        prop_assert_eq!(2, mesh.triangle_count());
        prop_assert_eq!(1, mesh.convert_triangles_to_quads(TriangleMergeParams::default()));
        prop_assert_eq!(1, mesh.face_count());
        let mut corners = mesh.faces()[0].vi;
        corners.sort_unstable();
        prop_assert_eq!([0, 1, 2, 3], corners);
    }
}
