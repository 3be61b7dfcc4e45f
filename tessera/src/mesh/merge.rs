//! Merging of faces into $n$-gons.

use ahash::AHashMap;
use tracing::{debug, trace, warn};

use crate::component::ComponentIndex;
use crate::face::MeshFace;
use crate::mesh::quad::join_triangles;
use crate::mesh::{DeletePolicy, Mesh};
use crate::ngon::MeshNgon;
use crate::topology::Topology;
use crate::{OptionExt as _, UNSET_INDEX};

/// Outcome of [`Mesh::merge_face_sets`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct MergeReport {
    /// Index of the first $n$-gon created. Created $n$-gons are contiguous.
    pub first_ngon: u32,
    pub ngons_created: usize,
    /// Pairs of triangles that were joined into a quad rather than an $n$-gon.
    pub quads_created: usize,
}

impl Mesh {
    /// Merges the faces of the given components into $n$-gons.
    ///
    /// Every face of each component is selected, and selecting any face of an
    /// existing $n$-gon selects all of its faces. Selected faces are grouped by
    /// flooding across topological edges shared by two selected faces. Each
    /// group of two or more faces becomes an $n$-gon, replacing any $n$-gons
    /// its faces belonged to. Within a group, coincident corners are welded to
    /// the same mesh vertex so that the boundary of the $n$-gon is well-formed;
    /// vertices outside of the group are unaffected. A group of exactly two
    /// triangles is joined into a single quad instead.
    ///
    /// Groups whose faces do not form a region bounded by a single loop and
    /// groups that contain only some of the faces of an existing $n$-gon,
    /// such as when one of its faces is degenerate, are left unchanged. Returns `None` if no group could be merged, in which
    /// case the mesh is not modified.
    pub fn merge_face_sets(&mut self, components: &[ComponentIndex]) -> Option<MergeReport> {
        let face_count = self.face_count();
        let mut selected = vec![false; face_count];
        for component in components.iter() {
            match self.component_ref(*component) {
                Some(reference) => {
                    for fi in reference.faces() {
                        if let Some(selected) = selected.get_mut(fi as usize) {
                            *selected = true;
                        }
                    }
                }
                None => trace!(?component, "ignoring invalid component"),
            }
        }
        for ngon in self.ngons.iter().flatten() {
            let ngon_fi = ngon.fi.iter().filter(|fi| (**fi as usize) < face_count);
            if ngon_fi.clone().any(|fi| selected[*fi as usize]) {
                for fi in ngon_fi {
                    selected[*fi as usize] = true;
                }
            }
        }

        let ngon_map = self.ngon_index_map();
        let mut faces = self.faces.clone();
        let mut vacated = vec![false; self.ngons.len()];
        let mut created = Vec::new();
        let mut absorbed = Vec::new();
        {
            let topology = self.topology().ok()?;
            for (fi, selected) in selected.iter_mut().enumerate() {
                if topology
                    .face(fi as u32)
                    .map_or(true, |face| face.is_degenerate())
                {
                    *selected = false;
                }
            }
            for group in groups(topology, &selected) {
                if group.len() < 2 {
                    continue;
                }
                if !covers_ngons(&self.ngons, &ngon_map, &group) {
                    trace!(faces = group.len(), "faces split an existing n-gon");
                    continue;
                }
                let originals: Vec<_> = group.iter().map(|fi| faces[*fi as usize]).collect();
                weld_group(topology, &mut faces, &group);
                if let [first, second] = group.as_slice() {
                    if let Some(quad) =
                        join_triangles(&faces[*first as usize], &faces[*second as usize])
                    {
                        trace!(first, second, ?quad, "joining triangles");
                        faces[*first as usize] = quad;
                        absorbed.push(ComponentIndex::Face(*second));
                        vacate(&ngon_map, &group, &mut vacated);
                        continue;
                    }
                }
                match MeshNgon::from_faces(&faces, group.clone()) {
                    Some(ngon) => {
                        trace!(faces = group.len(), "merging faces");
                        vacate(&ngon_map, &group, &mut vacated);
                        created.push(ngon);
                    }
                    None => {
                        trace!(faces = group.len(), "faces do not form an n-gon");
                        for (fi, face) in group.iter().zip(originals) {
                            faces[*fi as usize] = face;
                        }
                    }
                }
            }
        }
        if created.is_empty() && absorbed.is_empty() {
            return None;
        }

        self.invalidate();
        self.faces = faces;
        let mut index = 0;
        self.ngons.retain(|_| {
            index += 1;
            !vacated[index - 1]
        });
        let report = MergeReport {
            first_ngon: self.ngons.len() as u32,
            ngons_created: created.len(),
            quads_created: absorbed.len(),
        };
        self.ngons.extend(created.into_iter().map(Some));
        if !absorbed.is_empty() {
            let policy = DeletePolicy::default()
                .with_remove_degenerate_faces(false)
                .with_remove_unused_vertices(false)
                .with_remove_dissolved_ngons(false);
            if let Err(error) = self.delete_components(&absorbed, policy) {
                warn!(%error, "failed to remove joined triangles");
            }
        }
        debug!(?report, "merged face sets");
        Some(report)
    }
}

/// Groups selected faces that are connected by topological edges.
fn groups(topology: &Topology, selected: &[bool]) -> Vec<Vec<u32>> {
    let mut grouped = vec![false; selected.len()];
    let mut groups = Vec::new();
    for seed in 0..selected.len() {
        if !selected[seed] || grouped[seed] {
            continue;
        }
        grouped[seed] = true;
        let mut group = vec![seed as u32];
        let mut stack = vec![seed as u32];
        while let Some(fi) = stack.pop() {
            let edges = topology
                .face(fi)
                .map_or([UNSET_INDEX; 4], |face| face.edges());
            for topei in edges.iter().filter(|topei| **topei != UNSET_INDEX) {
                for neighbor in topology.edge_faces(*topei) {
                    let n = *neighbor as usize;
                    if selected[n] && !grouped[n] {
                        grouped[n] = true;
                        group.push(*neighbor);
                        stack.push(*neighbor);
                    }
                }
            }
        }
        group.sort_unstable();
        groups.push(group);
    }
    groups
}

/// Welds the coincident corners of a group of faces to the corner with the
/// smallest vertex index.
fn weld_group(topology: &Topology, faces: &mut [MeshFace], group: &[u32]) {
    let mut representatives: AHashMap<u32, u32> = AHashMap::new();
    for fi in group.iter() {
        for vi in faces[*fi as usize].corners() {
            let topvi = topology.top_vertex_of(*vi).expect_consistent();
            representatives
                .entry(topvi)
                .and_modify(|representative| *representative = (*representative).min(*vi))
                .or_insert(*vi);
        }
    }
    for fi in group.iter() {
        let face = &mut faces[*fi as usize];
        for vi in face.vi.iter_mut() {
            let topvi = topology.top_vertex_of(*vi).expect_consistent();
            *vi = representatives[&topvi];
        }
    }
}

/// Returns `true` if every $n$-gon with a face in the group has all of its
/// faces in the group. The group must be sorted.
fn covers_ngons(ngons: &[Option<MeshNgon>], ngon_map: &[u32], group: &[u32]) -> bool {
    group
        .iter()
        .map(|fi| ngon_map[*fi as usize])
        .filter(|index| *index != UNSET_INDEX)
        .all(|index| {
            ngons[index as usize].as_ref().map_or(true, |ngon| {
                ngon.fi.iter().all(|fi| group.binary_search(fi).is_ok())
            })
        })
}

fn vacate(ngon_map: &[u32], group: &[u32], vacated: &mut [bool]) {
    for fi in group.iter() {
        let index = ngon_map[*fi as usize];
        if index != UNSET_INDEX {
            vacated[index as usize] = true;
        }
    }
}
