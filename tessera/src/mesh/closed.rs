//! Closedness of a mesh without building its topology.

use itertools::Itertools;

use crate::face::MeshFace;
use crate::mesh::Mesh;
use crate::IteratorExt as _;

/// Returns `true` if every edge of the mesh is shared by exactly two faces.
///
/// Edges are derived from the faces and the coincidence of vertices. Faces
/// that are degenerate in the sense of the topology are ignored, so this
/// agrees with [`Topology::is_closed`].
///
/// [`Topology::is_closed`]: crate::topology::Topology::is_closed
pub(in crate::mesh) fn is_closed(mesh: &Mesh) -> bool {
    match mesh.coincidence() {
        Some(coincidence) => is_closed_with_ids(coincidence.ids(), mesh.faces()),
        None => false,
    }
}

fn is_closed_with_ids(ids: &[Option<u32>], faces: &[MeshFace]) -> bool {
    let mut edges = Vec::with_capacity(faces.len() * 4);
    for face in faces.iter().filter(|face| face.is_valid(ids.len())) {
        let corners = match face.map_collapsed(|vi| ids[vi as usize]) {
            Some(corners) => corners,
            None => continue,
        };
        edges.extend(
            corners
                .corners()
                .iter()
                .copied()
                .perimeter()
                .map(|(a, b)| if a < b { (a, b) } else { (b, a) }),
        );
    }
    if edges.is_empty() {
        return false;
    }
    edges.sort_unstable();
    edges
        .into_iter()
        .dedup_with_count()
        .all(|(count, _)| count == 2)
}
