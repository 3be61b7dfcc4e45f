//! Detection and repair of corrupt meshes.

use tracing::{debug, warn};

use crate::attribute::AttributeKind;
use crate::face::MeshFace;
use crate::mesh::Mesh;

/// Problems found in a mesh.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CorruptionReport {
    /// Faces with out of bounds or repeated indices or that reference a vertex
    /// with a non-finite position.
    pub invalid_faces: Vec<u32>,
    /// Vertices with a non-finite position.
    pub nonfinite_vertices: Vec<u32>,
    /// Parallel arrays whose lengths do not match their mesh.
    pub mismatched_arrays: Vec<AttributeKind>,
    /// $n$-gons that are not valid.
    pub invalid_ngons: Vec<u32>,
}

impl CorruptionReport {
    pub fn is_corrupt(&self) -> bool {
        !(self.invalid_faces.is_empty()
            && self.nonfinite_vertices.is_empty()
            && self.mismatched_arrays.is_empty()
            && self.invalid_ngons.is_empty())
    }
}

impl Mesh {
    /// Inspects the mesh for corruption without modifying it.
    ///
    /// Neutralized faces (see [`MeshFace::UNSET`]) are not considered
    /// corrupt.
    pub fn corruption(&self) -> CorruptionReport {
        let vertex_count = self.vertex_count();
        let mut report = CorruptionReport::default();
        report.nonfinite_vertices = (0..vertex_count as u32)
            .filter(|vi| {
                self.point(*vi)
                    .map_or(true, |point| !point.iter().all(|x| x.is_finite()))
            })
            .collect();
        report.invalid_faces = self
            .faces
            .iter()
            .enumerate()
            .filter(|(_, face)| {
                !face.is_unset()
                    && (!face.is_valid(vertex_count)
                        || face
                            .corners()
                            .iter()
                            .any(|vi| report.nonfinite_vertices.binary_search(vi).is_ok()))
            })
            .map(|(fi, _)| fi as u32)
            .collect();
        if !self.double_vertices.is_empty() && self.double_vertices.len() != vertex_count {
            report.mismatched_arrays.push(AttributeKind::DoubleVertex);
        }
        if !self.face_normals.is_empty() && self.face_normals.len() != self.faces.len() {
            report.mismatched_arrays.push(AttributeKind::FaceNormal);
        }
        report
            .mismatched_arrays
            .extend(self.attributes.mismatched(vertex_count));
        report.invalid_ngons = self
            .ngons
            .iter()
            .enumerate()
            .filter_map(|(index, ngon)| ngon.as_ref().map(|ngon| (index, ngon)))
            .filter(|(_, ngon)| !ngon.is_valid(self, true))
            .map(|(index, _)| index as u32)
            .collect();
        report
    }

    /// Returns `true` if the mesh is corrupt.
    ///
    /// When `repair` is `true`, corrupt faces are neutralized and removed,
    /// mismatched arrays are discarded, invalid $n$-gons are removed, and the
    /// mesh is compacted. When `silent` is `false`, each problem is logged.
    /// The returned value describes the mesh before any repair.
    pub fn is_corrupt(&mut self, repair: bool, silent: bool) -> bool {
        let report = self.corruption();
        if !report.is_corrupt() {
            return false;
        }
        if !silent {
            for fi in report.invalid_faces.iter() {
                warn!(fi, face = ?self.faces[*fi as usize], "corrupt face");
            }
            if !report.nonfinite_vertices.is_empty() {
                warn!(
                    count = report.nonfinite_vertices.len(),
                    "vertices with non-finite positions"
                );
            }
            for kind in report.mismatched_arrays.iter() {
                warn!("count of {} does not match mesh", kind);
            }
            for index in report.invalid_ngons.iter() {
                if let Some(ngon) = self.ngon(*index) {
                    // Logs the reason.
                    ngon.is_valid(self, false);
                }
            }
        }
        if repair {
            self.repair(&report);
        }
        true
    }

    fn repair(&mut self, report: &CorruptionReport) {
        self.invalidate();
        for fi in report.invalid_faces.iter() {
            self.faces[*fi as usize] = MeshFace::UNSET;
        }
        for kind in report.mismatched_arrays.iter() {
            match kind {
                AttributeKind::DoubleVertex => self.double_vertices.clear(),
                AttributeKind::FaceNormal => self.face_normals.clear(),
                _ => {}
            }
        }
        let vertex_count = self.vertex_count();
        self.attributes.clear_mismatched(vertex_count);
        for index in report.invalid_ngons.iter() {
            self.ngons[*index as usize] = None;
        }
        let compacted = self.compact();
        debug!(?compacted, "repaired corrupt mesh");
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Point3, Vector3};

    use crate::attribute::AttributeKind;
    use crate::face::MeshFace;
    use crate::ngon::MeshNgon;
    use crate::primitive;

    #[test]
    fn sound_mesh_is_not_corrupt() {
        let mut mesh = primitive::cube();
        assert!(!mesh.corruption().is_corrupt());
        assert!(!mesh.is_corrupt(true, false));
        assert_eq!(6, mesh.face_count());
    }

    #[test]
    fn detect_without_repair() {
        let mut mesh = primitive::grid(2, 1);
        mesh.faces_mut()[1] = MeshFace::quad(1, 2, 9, 4);
        mesh.attributes_mut().normals = vec![Vector3::z(); 2];

        let report = mesh.corruption();
        assert_eq!(vec![1], report.invalid_faces);
        assert_eq!(vec![AttributeKind::Normal], report.mismatched_arrays);
        assert!(mesh.is_corrupt(false, true));
        assert_eq!(2, mesh.face_count());
    }

    #[test]
    fn repair_corrupt_faces_and_arrays() {
        let mut mesh = primitive::grid(3, 1);
        let ngon = MeshNgon::from_faces(mesh.faces(), vec![0, 1]).unwrap();
        mesh.append_ngon(ngon).unwrap();
        mesh.faces_mut()[2] = MeshFace::quad(2, 3, 3, 6);
        mesh.vertices_mut()[0] = Point3::new(f32::NAN, 0.0, 0.0);
        mesh.face_normals_mut().push(Vector3::z());

        assert!(mesh.is_corrupt(true, false));
        // Both faces that touch a bad vertex or repeat an index are removed.
        assert_eq!(vec![MeshFace::quad(0, 1, 3, 2)], mesh.faces().to_vec());
        assert_eq!(4, mesh.vertex_count());
        assert!(mesh.face_normals().is_empty());
        assert_eq!(0, mesh.ngon_count());
        assert!(!mesh.is_corrupt(false, false));
        assert!(mesh.is_valid());
    }
}
