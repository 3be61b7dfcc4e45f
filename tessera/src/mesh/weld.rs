//! Welding of identical vertices.

use tracing::debug;

use crate::mesh::Mesh;

impl Mesh {
    /// Combines vertices that are coincident and have equal attributes.
    ///
    /// Faces and $n$-gons that reference a combined vertex are remapped to
    /// the vertex with the smallest index among those it was combined with.
    /// Unused vertices are then removed. Normals and texture coordinates can
    /// be ignored when comparing attributes, in which case the attributes of
    /// the surviving vertex are kept.
    ///
    /// Returns the number of vertices that were combined into another vertex.
    pub fn combine_identical_vertices(
        &mut self,
        ignore_normals: bool,
        ignore_texture_coordinates: bool,
    ) -> usize {
        let coincidence = match self.coincidence() {
            Some(coincidence) => coincidence,
            None => return 0,
        };
        let mut representative: Vec<u32> = (0..self.vertex_count() as u32).collect();
        let mut combined = 0;
        for group in coincidence.groups() {
            // Groups are sorted, so representatives precede the vertices
            // combined into them.
            for (n, vi) in group.iter().enumerate() {
                let target = group[..n].iter().copied().find(|other| {
                    representative[*other as usize] == *other
                        && self.attributes.matches(
                            *other,
                            *vi,
                            ignore_normals,
                            ignore_texture_coordinates,
                        )
                });
                if let Some(target) = target {
                    representative[*vi as usize] = target;
                    combined += 1;
                }
            }
        }
        if combined == 0 {
            return 0;
        }

        self.invalidate();
        let remap = |vi: &mut u32| {
            if let Some(target) = representative.get(*vi as usize) {
                *vi = *target;
            }
        };
        for face in self.faces.iter_mut() {
            face.vi.iter_mut().for_each(remap);
        }
        for ngon in self.ngons.iter_mut().flatten() {
            ngon.vi.iter_mut().for_each(remap);
        }
        let removed = self.cull_unused_vertices();
        debug!(combined, removed, "combined identical vertices");
        combined
    }
}
