use smallvec::SmallVec;
use tracing::debug;

use crate::face::{FaceSide, MeshFace};
use crate::mesh::Mesh;
use crate::topology::{TopEdge, TopFace, TopVertex, Topology, TopologyError};
use crate::UNSET_INDEX;

impl Topology {
    /// Builds the topology of a mesh.
    ///
    /// Double precision vertices are used if they are present and match the
    /// single precision vertices in count.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh has no vertices or if the resulting
    /// topology is inconsistent.
    pub fn build(mesh: &Mesh) -> Result<Self, TopologyError> {
        let ids = mesh
            .coincidence()
            .ok_or(TopologyError::NoVertices)?
            .into_ids();
        Topology::from_parts(&ids, mesh.faces())
    }

    /// Builds topology from coincidence ids and faces.
    ///
    /// `ids` has an entry for each vertex. Vertices with equal ids are merged
    /// into the same topological vertex and ids must be contiguous from zero.
    /// Each vertex without an id becomes a topological vertex by itself and
    /// faces that reference such a vertex are degenerate.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no vertices, if the ids are not dense, or
    /// if the resulting topology is inconsistent.
    pub fn from_parts(ids: &[Option<u32>], faces: &[MeshFace]) -> Result<Self, TopologyError> {
        let topv_map = vertex_map(ids)?;
        let topv_count = topv_map
            .iter()
            .copied()
            .max()
            .map_or(0, |topvi| topvi as usize + 1);
        let mut topv = vec![TopVertex::default(); topv_count];
        for (vi, topvi) in topv_map.iter().enumerate() {
            topv[*topvi as usize].vi.push(vi as u32);
        }

        // Collect the sides of every face over topological vertices. Sides are
        // ordered by their endpoints so that runs of equal sides form edges.
        let mut topf = vec![TopFace::DEGENERATE; faces.len()];
        let mut sides = Vec::with_capacity(faces.len() * 4);
        for (fi, face) in faces.iter().enumerate() {
            if let Some(corners) = top_corners(face, ids, &topv_map) {
                sides.extend(corners.sides(fi as u32));
            }
        }
        sides.sort_unstable_by_key(|side: &FaceSide| (side.vi, side.face, side.side));

        let mut tope = Vec::<TopEdge>::new();
        for side in sides.iter() {
            if tope.last().map_or(true, |edge| edge.topvi != side.vi) {
                tope.push(TopEdge {
                    topvi: side.vi,
                    topfi: SmallVec::new(),
                });
            }
            let topei = tope.len() - 1;
            tope[topei].topfi.push(side.face);
            let face = &mut topf[side.face as usize];
            face.topei[side.side as usize] = topei as u32;
            face.reve[side.side as usize] = side.reversed;
        }
        for face in topf.iter_mut().filter(|face| !face.is_degenerate()) {
            if face.topei[3] == UNSET_INDEX {
                face.topei[3] = face.topei[2];
                face.reve[3] = face.reve[2];
            }
        }
        for (topei, edge) in tope.iter().enumerate() {
            for topvi in edge.topvi {
                topv[topvi as usize].topei.push(topei as u32);
            }
        }

        let mut topology = Topology {
            topv,
            tope,
            topf,
            topv_map,
        };
        topology.sort_all_vertex_edges();
        topology.validate()?;
        debug!(
            vertices = topology.topv.len(),
            edges = topology.tope.len(),
            faces = topology.topf.len(),
            "built topology"
        );
        Ok(topology)
    }
}

/// Maps each vertex to a topological vertex. Vertices without an id are
/// assigned classes after the classes of vertices with ids.
fn vertex_map(ids: &[Option<u32>]) -> Result<Vec<u32>, TopologyError> {
    if ids.is_empty() {
        return Err(TopologyError::NoVertices);
    }
    let count = u32::try_from(ids.len())
        .map_err(|_| TopologyError::Inconsistent("too many vertices"))?;
    let mut next = ids
        .iter()
        .flatten()
        .copied()
        .max()
        .map_or(0, |id| id.saturating_add(1));
    if next > count {
        return Err(TopologyError::Inconsistent("vertex ids are not dense"));
    }
    let mut topv_map = Vec::with_capacity(ids.len());
    for id in ids.iter() {
        match id {
            Some(id) => topv_map.push(*id),
            None => {
                topv_map.push(next);
                next += 1;
            }
        }
    }
    Ok(topv_map)
}

/// Gets a face over topological vertices.
///
/// Sides whose ends are the same topological vertex are dropped, so a quad
/// with one collapsed side is a triangle. Returns `None` if the face is
/// degenerate.
fn top_corners(face: &MeshFace, ids: &[Option<u32>], topv_map: &[u32]) -> Option<MeshFace> {
    if !face.is_valid(ids.len()) {
        return None;
    }
    face.map_collapsed(|vi| ids[vi as usize].map(|_| topv_map[vi as usize]))
}
