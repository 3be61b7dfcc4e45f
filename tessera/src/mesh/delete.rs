//! Deletion of mesh components.
//!
//! Deletion determines which vertices, faces, and $n$-gons survive and then
//! compacts every array of the mesh with the same remapping tables, so that
//! positions, attributes, faces, face normals, and $n$-gons stay consistent
//! with one another. Requests are validated before anything is modified.

use tracing::{debug, trace};

use crate::attribute;
use crate::component::ComponentIndex;
use crate::face::MeshFace;
use crate::mesh::{Mesh, MeshError};
use crate::UNSET_INDEX;

/// Options that control [`Mesh::delete_components`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DeletePolicy {
    /// Ignore references to components that do not exist rather than fail.
    pub ignore_invalid_components: bool,
    /// Repair or remove faces whose corners are coincident.
    pub remove_degenerate_faces: bool,
    /// Remove vertices that are no longer referenced by any face.
    pub remove_unused_vertices: bool,
    /// Remove the slots of dissolved $n$-gons rather than leave them empty.
    ///
    /// An $n$-gon is dissolved if any of its faces is removed or repaired or
    /// any of its vertices is removed, even if some of its faces survive.
    /// Leaving empty slots keeps the indices of other $n$-gons stable.
    pub remove_dissolved_ngons: bool,
}

impl DeletePolicy {
    pub fn with_ignore_invalid_components(mut self, ignore: bool) -> Self {
        self.ignore_invalid_components = ignore;
        self
    }

    pub fn with_remove_degenerate_faces(mut self, remove: bool) -> Self {
        self.remove_degenerate_faces = remove;
        self
    }

    pub fn with_remove_unused_vertices(mut self, remove: bool) -> Self {
        self.remove_unused_vertices = remove;
        self
    }

    pub fn with_remove_dissolved_ngons(mut self, remove: bool) -> Self {
        self.remove_dissolved_ngons = remove;
        self
    }
}

impl Default for DeletePolicy {
    fn default() -> Self {
        DeletePolicy {
            ignore_invalid_components: true,
            remove_degenerate_faces: true,
            remove_unused_vertices: true,
            remove_dissolved_ngons: true,
        }
    }
}

/// Counts of components affected by a deletion.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct DeleteReport {
    pub vertices_removed: usize,
    pub faces_removed: usize,
    /// Degenerate faces that were repaired rather than removed.
    pub faces_repaired: usize,
    /// $n$-gons that were deleted or dissolved.
    pub ngons_removed: usize,
}

impl DeleteReport {
    /// Returns `true` if the mesh was not modified.
    pub fn is_empty(&self) -> bool {
        *self == DeleteReport::default()
    }
}

impl Mesh {
    /// Deletes components from the mesh.
    ///
    /// Deleting a vertex (or topological vertex) deletes every face that
    /// references it. Deleting a topological edge deletes the faces that use
    /// it. Deleting an $n$-gon deletes its faces.
    ///
    /// $n$-gons whose faces are all intact survive and are remapped. $n$-gons
    /// that lose or repair any face are dissolved: their remaining faces
    /// survive as ordinary faces.
    ///
    /// If every vertex or every face is removed, the mesh is destroyed.
    ///
    /// # Errors
    ///
    /// Returns an error if a component does not exist and the policy does not
    /// ignore invalid components, or if a topological component is requested
    /// and topology cannot be built. The mesh is not modified when an error is
    /// returned.
    pub fn delete_components(
        &mut self,
        components: &[ComponentIndex],
        policy: DeletePolicy,
    ) -> Result<DeleteReport, MeshError> {
        if components.iter().any(ComponentIndex::is_topological) {
            self.topology()?;
        }
        let vertex_count = self.vertex_count();
        let face_count = self.face_count();
        let mut remove_vertex = vec![false; vertex_count];
        let mut remove_face = vec![false; face_count];
        let mut remove_ngon = vec![false; self.ngons.len()];
        for component in components.iter() {
            let reference = match self.component_ref(*component) {
                Some(reference) => reference,
                None if policy.ignore_invalid_components => {
                    trace!(?component, "ignoring invalid component");
                    continue;
                }
                None => return Err(MeshError::InvalidComponent(*component)),
            };
            match *component {
                ComponentIndex::Vertex(_) | ComponentIndex::TopologyVertex(_) => {
                    for vi in reference.vertices() {
                        remove_vertex[vi as usize] = true;
                    }
                }
                ComponentIndex::TopologyEdge(_) | ComponentIndex::Face(_) => {
                    for fi in reference.faces() {
                        remove_face[fi as usize] = true;
                    }
                }
                ComponentIndex::Ngon(index) => {
                    remove_ngon[index as usize] = true;
                    for fi in reference.faces() {
                        if let Some(remove) = remove_face.get_mut(fi as usize) {
                            *remove = true;
                        }
                    }
                }
            }
        }

        // Determine which faces survive, repairing degenerate faces if
        // requested. Faces that reference a removed or nonexistent vertex are
        // always removed.
        let ids = if policy.remove_degenerate_faces {
            self.coincidence().map(|coincidence| coincidence.into_ids())
        }
        else {
            None
        };
        let mut faces = self.faces.clone();
        let mut repaired = vec![false; face_count];
        for (fi, face) in faces.iter_mut().enumerate() {
            if remove_face[fi] {
                continue;
            }
            if let Some(ids) = ids.as_ref() {
                if is_degenerate(face, ids) {
                    let mut candidate = *face;
                    let same = |a: u32, b: u32| {
                        a == b || (ids[a as usize].is_some() && ids[a as usize] == ids[b as usize])
                    };
                    if candidate.repair_with(vertex_count, same) && !is_degenerate(&candidate, ids)
                    {
                        trace!(fi, ?candidate, "repaired degenerate face");
                        *face = candidate;
                        repaired[fi] = true;
                    }
                    else {
                        trace!(fi, "removing degenerate face");
                        remove_face[fi] = true;
                        continue;
                    }
                }
            }
            if face
                .vi
                .iter()
                .any(|vi| remove_vertex.get(*vi as usize).copied().unwrap_or(true))
            {
                remove_face[fi] = true;
            }
        }

        if policy.remove_unused_vertices {
            // Only vertices that were used before the deletion are removed.
            let mut used = vec![false; vertex_count];
            let mut was_used = vec![false; vertex_count];
            for (fi, (face, original)) in faces.iter().zip(self.faces.iter()).enumerate() {
                for vi in original.vi.iter() {
                    if let Some(was_used) = was_used.get_mut(*vi as usize) {
                        *was_used = true;
                    }
                }
                if !remove_face[fi] {
                    for vi in face.vi.iter() {
                        used[*vi as usize] = true;
                    }
                }
            }
            for (vi, remove) in remove_vertex.iter_mut().enumerate() {
                if was_used[vi] && !used[vi] {
                    *remove = true;
                }
            }
        }

        let vertices_removed = remove_vertex.iter().filter(|remove| **remove).count();
        let faces_removed = remove_face.iter().filter(|remove| **remove).count();
        let faces_repaired = repaired
            .iter()
            .zip(remove_face.iter())
            .filter(|(repaired, removed)| **repaired && !**removed)
            .count();
        let dissolve: Vec<bool> = self
            .ngons
            .iter()
            .enumerate()
            .map(|(index, ngon)| {
                ngon.as_ref().map_or(false, |ngon| {
                    remove_ngon[index]
                        || ngon.fi.iter().any(|fi| {
                            remove_face.get(*fi as usize).copied().unwrap_or(true)
                                || repaired[*fi as usize]
                        })
                        || ngon
                            .vi
                            .iter()
                            .any(|vi| remove_vertex.get(*vi as usize).copied().unwrap_or(true))
                })
            })
            .collect();
        let ngons_removed = dissolve.iter().filter(|dissolve| **dissolve).count();
        let report = DeleteReport {
            vertices_removed,
            faces_removed,
            faces_repaired,
            ngons_removed,
        };
        if report.is_empty() {
            return Ok(report);
        }
        if (vertex_count > 0 && vertices_removed == vertex_count)
            || (face_count > 0 && faces_removed == face_count)
        {
            let report = DeleteReport {
                vertices_removed: vertex_count,
                faces_removed: face_count,
                faces_repaired: 0,
                ngons_removed: self.ngons.iter().flatten().count(),
            };
            debug!(?report, "deleted every component");
            self.destroy();
            return Ok(report);
        }

        let (vertex_map, vertex_survivors) = remap(&remove_vertex);
        let (face_map, face_survivors) = remap(&remove_face);
        self.vertices = attribute::compact(&self.vertices, &vertex_map, vertex_survivors);
        if !self.double_vertices.is_empty() {
            self.double_vertices =
                attribute::compact(&self.double_vertices, &vertex_map, vertex_survivors);
        }
        self.attributes.compact(&vertex_map, vertex_survivors);
        if !self.face_normals.is_empty() {
            self.face_normals = attribute::compact(&self.face_normals, &face_map, face_survivors);
        }
        self.faces = faces
            .iter()
            .zip(face_map.iter())
            .filter(|(_, fi)| **fi != UNSET_INDEX)
            .map(|(face, _)| MeshFace {
                vi: face.vi.map(|vi| vertex_map[vi as usize]),
            })
            .collect();
        let ngons = std::mem::take(&mut self.ngons);
        self.ngons = ngons
            .into_iter()
            .zip(dissolve)
            .filter_map(|(ngon, dissolve)| match ngon {
                None => Some(None),
                Some(_) if dissolve => {
                    if policy.remove_dissolved_ngons {
                        None
                    }
                    else {
                        Some(None)
                    }
                }
                Some(mut ngon) => {
                    for vi in ngon.vi.iter_mut() {
                        *vi = vertex_map[*vi as usize];
                    }
                    for fi in ngon.fi.iter_mut() {
                        *fi = face_map[*fi as usize];
                    }
                    Some(Some(ngon))
                }
            })
            .collect();
        self.invalidate();
        debug!(?report, "deleted components");
        Ok(report)
    }

    /// Repairs or removes faces whose corners are coincident or invalid.
    /// Returns the number of faces removed.
    pub fn cull_degenerate_faces(&mut self) -> usize {
        let policy = DeletePolicy::default().with_remove_unused_vertices(false);
        self.delete_components(&[], policy)
            .map_or(0, |report| report.faces_removed)
    }

    /// Removes vertices that are not referenced by any face. Returns the
    /// number of vertices removed.
    pub fn cull_unused_vertices(&mut self) -> usize {
        let mut used = vec![false; self.vertex_count()];
        for face in self.faces.iter() {
            for vi in face.vi.iter() {
                if let Some(used) = used.get_mut(*vi as usize) {
                    *used = true;
                }
            }
        }
        let unused: Vec<_> = used
            .iter()
            .enumerate()
            .filter(|(_, used)| !**used)
            .map(|(vi, _)| ComponentIndex::Vertex(vi as u32))
            .collect();
        let policy = DeletePolicy::default()
            .with_remove_degenerate_faces(false)
            .with_remove_unused_vertices(false);
        self.delete_components(&unused, policy)
            .map_or(0, |report| report.vertices_removed)
    }

    /// Removes invalid faces (including neutralized faces), unused vertices,
    /// and empty $n$-gon slots.
    pub fn compact(&mut self) -> DeleteReport {
        let vertex_count = self.vertex_count();
        let invalid: Vec<_> = self
            .faces
            .iter()
            .enumerate()
            .filter(|(_, face)| !face.is_valid(vertex_count))
            .map(|(fi, _)| ComponentIndex::Face(fi as u32))
            .collect();
        let policy = DeletePolicy::default().with_remove_degenerate_faces(false);
        let mut report = self.delete_components(&invalid, policy).unwrap_or_default();
        report.vertices_removed += self.cull_unused_vertices();
        report.ngons_removed += self.remove_empty_ngons();
        report
    }
}

/// Returns `true` if a face is invalid, touches a vertex without an id, or
/// has coincident corners.
fn is_degenerate(face: &MeshFace, ids: &[Option<u32>]) -> bool {
    if !face.is_valid(ids.len()) {
        return true;
    }
    let corners = face.corners();
    corners.iter().enumerate().any(|(n, a)| {
        let id = ids[*a as usize];
        id.is_none()
            || corners[(n + 1)..]
                .iter()
                .any(|b| ids[*b as usize] == id)
    })
}

/// Builds a table that maps old indices to new indices, skipping removed
/// items. Returns the table and the number of surviving items.
fn remap(remove: &[bool]) -> (Vec<u32>, usize) {
    let mut next = 0u32;
    let map = remove
        .iter()
        .map(|remove| {
            if *remove {
                UNSET_INDEX
            }
            else {
                next += 1;
                next - 1
            }
        })
        .collect();
    (map, next as usize)
}
