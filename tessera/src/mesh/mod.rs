//! Indexed meshes of triangles and quads.
//!
//! A [`Mesh`] owns its vertex positions, faces, $n$-gons, and optional
//! per-vertex attributes as flat arrays. Faces refer to vertices by index and
//! $n$-gons refer to both vertices and faces by index.
//!
//! Positions are stored in single precision and may also be stored in double
//! precision. When double precision positions are present and have the same
//! count as the single precision positions, they take precedence in every
//! geometric computation, including topology.
//!
//! # Caching
//!
//! Meshes lazily compute and cache derived data, such as their
//! [topology][`Mesh::topology`] and whether they are [closed][`Mesh::is_closed`].
//! Queries only require a shared reference, so a mesh can be queried from
//! many threads at once. Every operation that mutates a mesh requires an
//! exclusive reference and discards all cached data, which is recomputed on
//! demand. Cloning a mesh never clones its cache.
//!
//! # Examples
//!
//! ```rust
//! use nalgebra::Point3;
//! use tessera::prelude::*;
//!
//! let mesh = Mesh::from_raw_buffers(
//!     vec![[0u32, 1, 2]],
//!     vec![
//!         Point3::new(0.0f32, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ],
//! )
//! .unwrap();
//!
//! assert!(mesh.is_manifold());
//! assert!(!mesh.is_closed());
//! ```

mod adjacency;
mod cache;
mod closed;
mod corrupt;
mod delete;
mod merge;
mod partition;
mod planar;
mod quad;
mod weld;

use derivative::Derivative;
use nalgebra::{Point3, Vector3};
use thiserror::Error;
use tracing::trace;

use crate::attribute::{AttributeKind, VertexAttributes};
use crate::coincidence::{self, Coincidence};
use crate::component::ComponentIndex;
use crate::face::MeshFace;
use crate::geometry::{self, E3};
use crate::ngon::{MeshNgon, NgonError};
use crate::topology::{Topology, TopologyError, TopologyProperties};
use crate::{FromRawBuffers, UNSET_INDEX};

use crate::mesh::cache::MeshCache;

pub use crate::mesh::adjacency::VertexIds;
pub use crate::mesh::cache::{FaceCounts, Tristate};
pub use crate::mesh::corrupt::CorruptionReport;
pub use crate::mesh::delete::{DeletePolicy, DeleteReport};
pub use crate::mesh::merge::MergeReport;
pub use crate::mesh::partition::{MeshPart, MeshPartition, PartitionLimits};
pub use crate::mesh::planar::{PlanarityParams, QuadSplit};
pub use crate::mesh::quad::TriangleMergeParams;

/// Errors concerning [`Mesh`]es.
#[derive(Debug, Error, PartialEq)]
pub enum MeshError {
    #[error("index {index} out of bounds ({count} elements)")]
    IndexOutOfBounds { index: u32, count: usize },
    #[error("component {0:?} not found")]
    InvalidComponent(ComponentIndex),
    #[error("count of {0} does not match vertex count")]
    AttributeCountMismatch(AttributeKind),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Ngon(#[from] NgonError),
    #[error("mesh is empty")]
    Empty,
    #[error("partition limits too small")]
    PartitionLimit,
}

/// Indexed mesh of triangles and quads.
#[derive(Default, Derivative)]
#[derivative(Debug)]
pub struct Mesh {
    vertices: Vec<Point3<f32>>,
    double_vertices: Vec<Point3<f64>>,
    faces: Vec<MeshFace>,
    face_normals: Vec<Vector3<f32>>,
    ngons: Vec<Option<MeshNgon>>,
    attributes: VertexAttributes,
    #[derivative(Debug = "ignore")]
    cache: MeshCache,
}

impl Mesh {
    pub fn new() -> Self {
        Mesh::default()
    }

    /// Creates a mesh from double precision positions and faces.
    ///
    /// Single precision positions are rounded from the double precision
    /// positions, so the two are synchronized.
    ///
    /// # Errors
    ///
    /// Returns an error if a face references a vertex that does not exist.
    pub fn from_f64<I, J, N>(indices: I, points: J) -> Result<Self, MeshError>
    where
        I: IntoIterator<Item = N>,
        J: IntoIterator<Item = Point3<f64>>,
        N: Into<MeshFace>,
    {
        let double_vertices: Vec<_> = points.into_iter().collect();
        let vertices = double_vertices.iter().map(|point| point.cast::<f32>());
        let mut mesh = Mesh::from_raw_buffers(indices, vertices)?;
        mesh.double_vertices = double_vertices;
        Ok(mesh)
    }

    /// Discards all cached data derived from the mesh.
    ///
    /// Mutating methods do this implicitly.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Removes everything from the mesh.
    pub fn destroy(&mut self) {
        *self = Mesh::default();
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Gets the number of $n$-gon slots, including empty slots.
    pub fn ngon_count(&self) -> usize {
        self.ngons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.faces.is_empty()
    }

    pub fn vertices(&self) -> &[Point3<f32>] {
        self.vertices.as_slice()
    }

    pub fn vertices_mut(&mut self) -> &mut Vec<Point3<f32>> {
        self.invalidate();
        &mut self.vertices
    }

    pub fn faces(&self) -> &[MeshFace] {
        self.faces.as_slice()
    }

    pub fn faces_mut(&mut self) -> &mut Vec<MeshFace> {
        self.invalidate();
        &mut self.faces
    }

    pub fn face_normals(&self) -> &[Vector3<f32>] {
        self.face_normals.as_slice()
    }

    pub fn face_normals_mut(&mut self) -> &mut Vec<Vector3<f32>> {
        &mut self.face_normals
    }

    pub fn ngons(&self) -> &[Option<MeshNgon>] {
        self.ngons.as_slice()
    }

    pub fn ngons_mut(&mut self) -> &mut Vec<Option<MeshNgon>> {
        self.invalidate();
        &mut self.ngons
    }

    pub fn ngon(&self, index: u32) -> Option<&MeshNgon> {
        self.ngons.get(index as usize).and_then(Option::as_ref)
    }

    pub fn attributes(&self) -> &VertexAttributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut VertexAttributes {
        &mut self.attributes
    }

    /// Appends a vertex and returns its index.
    ///
    /// If the mesh has double precision vertices, the position is appended to
    /// both arrays.
    pub fn append_vertex(&mut self, position: Point3<f32>) -> u32 {
        let synchronized = self.has_double_vertices();
        self.invalidate();
        self.vertices.push(position);
        if synchronized {
            self.double_vertices.push(position.cast::<f64>());
        }
        (self.vertices.len() - 1) as u32
    }

    /// Appends a face and returns its index.
    ///
    /// The face is not validated, so faces may be appended before the vertices
    /// that they reference. If face normals are present, the normal of the new
    /// face is computed and appended.
    pub fn append_face<T>(&mut self, face: T) -> u32
    where
        T: Into<MeshFace>,
    {
        let face = face.into();
        self.invalidate();
        if !self.face_normals.is_empty() && self.face_normals.len() == self.faces.len() {
            let normal = self
                .area_normal(&face)
                .and_then(|normal| normal.try_normalize(0.0))
                .map_or_else(Vector3::zeros, |normal| normal.cast::<f32>());
            self.face_normals.push(normal);
        }
        self.faces.push(face);
        (self.faces.len() - 1) as u32
    }

    pub fn append_triangle(&mut self, a: u32, b: u32, c: u32) -> u32 {
        self.append_face(MeshFace::triangle(a, b, c))
    }

    pub fn append_quad(&mut self, a: u32, b: u32, c: u32, d: u32) -> u32 {
        self.append_face(MeshFace::quad(a, b, c, d))
    }

    /// Appends an $n$-gon and returns its index.
    ///
    /// # Errors
    ///
    /// Returns an error if the $n$-gon is not valid in the mesh.
    pub fn append_ngon(&mut self, ngon: MeshNgon) -> Result<u32, MeshError> {
        ngon.validate(self.vertex_count(), &self.faces)?;
        self.invalidate();
        self.ngons.push(Some(ngon));
        Ok((self.ngons.len() - 1) as u32)
    }

    /// Gets the index of the $n$-gon of each face or `UNSET_INDEX` for faces
    /// that are not part of an $n$-gon.
    pub fn ngon_index_map(&self) -> Vec<u32> {
        let mut map = vec![UNSET_INDEX; self.faces.len()];
        for (index, ngon) in self.ngons.iter().enumerate() {
            for fi in ngon.iter().flat_map(|ngon| ngon.fi.iter()) {
                if let Some(entry) = map.get_mut(*fi as usize) {
                    *entry = index as u32;
                }
            }
        }
        map
    }

    /// Removes empty $n$-gon slots and $n$-gons with no faces or vertices.
    /// Returns the number of slots removed.
    pub fn remove_empty_ngons(&mut self) -> usize {
        let count = self.ngons.len();
        self.ngons.retain(|ngon| {
            ngon.as_ref()
                .map_or(false, |ngon| !ngon.vi.is_empty() && !ngon.fi.is_empty())
        });
        let removed = count - self.ngons.len();
        if removed > 0 {
            self.invalidate();
        }
        removed
    }

    pub fn double_vertices(&self) -> Option<&[Point3<f64>]> {
        if self.double_vertices.is_empty() {
            None
        }
        else {
            Some(self.double_vertices.as_slice())
        }
    }

    /// Sets the double precision vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the count differs from the single precision
    /// vertices.
    pub fn set_double_vertices(&mut self, points: Vec<Point3<f64>>) -> Result<(), MeshError> {
        if points.len() != self.vertices.len() {
            return Err(MeshError::AttributeCountMismatch(AttributeKind::DoubleVertex));
        }
        self.invalidate();
        self.double_vertices = points;
        Ok(())
    }

    pub fn destroy_double_vertices(&mut self) {
        if !self.double_vertices.is_empty() {
            self.invalidate();
            self.double_vertices.clear();
        }
    }

    /// Returns `true` if double precision vertices are present and match the
    /// single precision vertices in count.
    pub fn has_double_vertices(&self) -> bool {
        !self.double_vertices.is_empty() && self.double_vertices.len() == self.vertices.len()
    }

    /// Returns `true` if every double precision vertex rounds to its single
    /// precision vertex.
    pub fn has_synchronized_double_and_single_precision_vertices(&self) -> bool {
        self.has_double_vertices()
            && self
                .double_vertices
                .iter()
                .zip(self.vertices.iter())
                .all(|(double, single)| double.cast::<f32>() == *single)
    }

    /// Rounds the double precision vertices into the single precision
    /// vertices.
    ///
    /// Returns `false` if there are no double precision vertices.
    pub fn update_single_precision_vertices(&mut self) -> bool {
        if self.double_vertices.is_empty() {
            return false;
        }
        self.invalidate();
        self.vertices = self
            .double_vertices
            .iter()
            .map(|point| point.cast::<f32>())
            .collect();
        true
    }

    /// Replaces the double precision vertices with the single precision
    /// vertices.
    pub fn update_double_precision_vertices(&mut self) {
        self.invalidate();
        self.double_vertices = self
            .vertices
            .iter()
            .map(|point| point.cast::<f64>())
            .collect();
    }

    /// Gets the position of a vertex in double precision.
    pub fn point(&self, vi: u32) -> Option<E3> {
        if self.has_double_vertices() {
            self.double_vertices.get(vi as usize).copied()
        }
        else {
            self.vertices.get(vi as usize).map(|point| point.cast::<f64>())
        }
    }

    /// Gets the positions of the corners of a face, repeating the last corner
    /// of triangles.
    pub(crate) fn face_points(&self, face: &MeshFace) -> Option<[E3; 4]> {
        Some([
            self.point(face.vi[0])?,
            self.point(face.vi[1])?,
            self.point(face.vi[2])?,
            self.point(face.vi[3])?,
        ])
    }

    /// Classifies the vertices by coincidence, preferring double precision
    /// positions.
    ///
    /// Returns `None` if the mesh has no vertices.
    pub fn coincidence(&self) -> Option<Coincidence> {
        if self.has_double_vertices() {
            let points = &self.double_vertices;
            coincidence::classify_with(points.len(), 0, |index| {
                let point = &points[index];
                [point.x, point.y, point.z]
            })
        }
        else {
            let points = &self.vertices;
            coincidence::classify_with(points.len(), 0, |index| {
                let point = &points[index];
                [point.x, point.y, point.z]
            })
        }
    }

    /// Gets the topology of the mesh, building it if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh has no vertices or if the topology cannot
    /// be built. A failed build is not cached and is attempted again on the
    /// next call.
    pub fn topology(&self) -> Result<&Topology, TopologyError> {
        self.cache.topology.get_or_try_init(|| Topology::build(self))
    }

    /// Returns `true` if the topology has been built and cached.
    pub fn has_topology(&self) -> bool {
        self.cache.topology.get().is_some()
    }

    /// Returns `true` if every edge of the mesh is shared by exactly two faces.
    ///
    /// This does not build topology: if topology is not already cached, edges
    /// are derived directly from the faces and the coincidence of vertices.
    pub fn is_closed(&self) -> bool {
        self.cache.closed.get_or_compute(|| match self.cache.topology.get() {
            Some(topology) => topology.is_closed(),
            None => closed::is_closed(self),
        })
    }

    pub fn closed_state(&self) -> Tristate {
        self.cache.closed.get()
    }

    /// Overrides the cached closed state.
    ///
    /// Setting [`Tristate::Unknown`] forces the next query to recompute it.
    pub fn set_closed(&self, state: Tristate) {
        self.cache.closed.set(state);
    }

    /// Returns `true` if every edge of the mesh is used by one or two faces.
    ///
    /// Returns `false` if the topology of the mesh cannot be built.
    pub fn is_manifold(&self) -> bool {
        self.cache
            .manifold
            .get_or_compute(|| self.resolve_properties().manifold)
    }

    /// Returns `true` if every pair of faces that share an edge traverse it in
    /// opposite directions.
    ///
    /// Returns `false` if the topology of the mesh cannot be built.
    pub fn is_oriented(&self) -> bool {
        self.cache
            .oriented
            .get_or_compute(|| self.resolve_properties().oriented)
    }

    /// Returns `true` if the mesh is closed, manifold, and oriented.
    pub fn is_solid(&self) -> bool {
        self.is_closed() && self.is_manifold() && self.is_oriented()
    }

    pub fn has_boundary(&self) -> bool {
        self.topology()
            .map(|topology| topology.has_boundary())
            .unwrap_or(false)
    }

    pub fn manifold_state(&self) -> Tristate {
        self.cache.manifold.get()
    }

    pub fn oriented_state(&self) -> Tristate {
        self.cache.oriented.get()
    }

    // Both flags are resolved by the same walk over the edges.
    fn resolve_properties(&self) -> TopologyProperties {
        let properties = match self.topology() {
            Ok(topology) => topology.properties(),
            Err(_) => TopologyProperties {
                manifold: false,
                oriented: false,
                boundary: false,
            },
        };
        self.cache.manifold.set(properties.manifold.into());
        self.cache.oriented.set(properties.oriented.into());
        properties
    }

    pub fn face_counts(&self) -> FaceCounts {
        *self.cache.face_counts.get_or_init(|| {
            let vertex_count = self.vertex_count();
            let mut counts = FaceCounts::default();
            for face in self.faces.iter() {
                if !face.is_valid(vertex_count) {
                    counts.invalid += 1;
                }
                else if face.is_triangle() {
                    counts.triangles += 1;
                }
                else {
                    counts.quads += 1;
                }
            }
            counts
        })
    }

    pub fn quad_count(&self) -> usize {
        self.face_counts().quads
    }

    pub fn triangle_count(&self) -> usize {
        self.face_counts().triangles
    }

    pub fn invalid_face_count(&self) -> usize {
        self.face_counts().invalid
    }

    /// Gets the normal of a face whose length is twice its area.
    fn area_normal(&self, face: &MeshFace) -> Option<Vector3<f64>> {
        let points = self.face_points(face)?;
        Some(if face.is_triangle() {
            geometry::triangle_normal(&points[0], &points[1], &points[2])
        }
        else {
            geometry::quad_normal(&points)
        })
    }

    /// Gets the unit normal of a face.
    ///
    /// Returns `None` if the face is invalid or has no area.
    pub fn face_normal(&self, fi: u32) -> Option<Vector3<f64>> {
        let face = self.faces.get(fi as usize)?;
        if !face.is_valid(self.vertex_count()) {
            return None;
        }
        self.area_normal(face)?.try_normalize(0.0)
    }

    /// Computes and stores the normal of every face.
    ///
    /// Invalid and degenerate faces are given a zero normal. Returns `false` if
    /// any such face is found.
    pub fn compute_face_normals(&mut self) -> bool {
        let normals: Vec<_> = (0..self.faces.len())
            .map(|fi| self.face_normal(fi as u32).map(|normal| normal.cast::<f32>()))
            .collect();
        let computed = normals.iter().all(Option::is_some);
        self.face_normals = normals
            .into_iter()
            .map(|normal| normal.unwrap_or_else(Vector3::zeros))
            .collect();
        computed
    }

    /// Computes and stores vertex normals as the area weighted average of the
    /// normals of the faces that reference each vertex.
    ///
    /// Vertices that are not referenced by a face with area are given a zero
    /// normal. Returns `false` if there are no faces.
    pub fn compute_vertex_normals(&mut self) -> bool {
        if self.faces.is_empty() {
            return false;
        }
        let vertex_count = self.vertex_count();
        let mut sums = vec![Vector3::<f64>::zeros(); vertex_count];
        for face in self.faces.iter().filter(|face| face.is_valid(vertex_count)) {
            if let Some(normal) = self.area_normal(face) {
                for vi in face.corners() {
                    sums[*vi as usize] += normal;
                }
            }
        }
        self.attributes.normals = sums
            .into_iter()
            .map(|sum| {
                sum.try_normalize(0.0)
                    .map_or_else(Vector3::zeros, |normal| normal.cast::<f32>())
            })
            .collect();
        true
    }

    /// Reverses the winding of every face and $n$-gon and negates normals.
    pub fn flip_faces(&mut self) {
        self.invalidate();
        for face in self.faces.iter_mut() {
            face.flip();
        }
        for ngon in self.ngons.iter_mut().flatten() {
            ngon.reverse();
        }
        for normal in self
            .face_normals
            .iter_mut()
            .chain(self.attributes.normals.iter_mut())
        {
            *normal = -*normal;
        }
    }

    /// Determines whether the faces of a solid mesh face outward.
    ///
    /// Returns `1` if the faces are wound counterclockwise when viewed from
    /// outside, `-1` if they are wound clockwise, and `0` if the mesh is not
    /// solid or encloses no volume.
    pub fn solid_orientation(&self) -> i32 {
        if !self.is_solid() {
            return 0;
        }
        let vertex_count = self.vertex_count();
        let origin = match geometry::centroid(
            &(0..vertex_count as u32)
                .filter_map(|vi| self.point(vi))
                .collect::<Vec<_>>(),
        ) {
            Some(origin) => origin,
            None => return 0,
        };
        let mut volume = 0.0;
        for face in self.faces.iter().filter(|face| face.is_valid(vertex_count)) {
            let points = match self.face_points(face) {
                Some(points) => points.map(|point| point - origin),
                None => continue,
            };
            volume += points[0].dot(&points[1].cross(&points[2]));
            if face.is_quad() {
                volume += points[0].dot(&points[2].cross(&points[3]));
            }
        }
        trace!(volume = volume / 6.0, "signed volume");
        if volume > 0.0 {
            1
        }
        else if volume < 0.0 {
            -1
        }
        else {
            0
        }
    }

    /// Returns `true` if the mesh has vertices and faces, every face is valid,
    /// every present attribute matches the vertex count, and every $n$-gon is
    /// valid.
    pub fn is_valid(&self) -> bool {
        let vertex_count = self.vertex_count();
        vertex_count > 0
            && !self.faces.is_empty()
            && self.faces.iter().all(|face| face.is_valid(vertex_count))
            && (self.double_vertices.is_empty() || self.double_vertices.len() == vertex_count)
            && (self.face_normals.is_empty() || self.face_normals.len() == self.faces.len())
            && self.attributes.mismatched(vertex_count).is_empty()
            && self
                .ngons
                .iter()
                .flatten()
                .all(|ngon| ngon.is_valid(self, true))
    }
}

impl Clone for Mesh {
    fn clone(&self) -> Self {
        Mesh {
            vertices: self.vertices.clone(),
            double_vertices: self.double_vertices.clone(),
            faces: self.faces.clone(),
            face_normals: self.face_normals.clone(),
            ngons: self.ngons.clone(),
            attributes: self.attributes.clone(),
            cache: MeshCache::default(),
        }
    }
}

impl<N, G> FromRawBuffers<N, G> for Mesh
where
    N: Into<MeshFace>,
    G: Into<Point3<f32>>,
{
    type Error = MeshError;

    fn from_raw_buffers<I, J>(indices: I, vertices: J) -> Result<Self, Self::Error>
    where
        I: IntoIterator<Item = N>,
        J: IntoIterator<Item = G>,
    {
        let vertices: Vec<Point3<f32>> = vertices.into_iter().map(|vertex| vertex.into()).collect();
        let faces: Vec<MeshFace> = indices.into_iter().map(|face| face.into()).collect();
        let count = vertices.len();
        for face in faces.iter() {
            if let Some(index) = face.vi.iter().find(|index| **index as usize >= count) {
                return Err(MeshError::IndexOutOfBounds {
                    index: *index,
                    count,
                });
            }
        }
        Ok(Mesh {
            vertices,
            faces,
            ..Mesh::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use nalgebra::{Point3, Vector3};
    use std::thread;

    use crate::face::MeshFace;
    use crate::mesh::{Mesh, MeshError, Tristate};
    use crate::primitive;
    use crate::topology::Topology;
    use crate::FromRawBuffers;

    fn two_triangles(second: MeshFace) -> Mesh {
        Mesh::from_raw_buffers(
            vec![MeshFace::triangle(0, 1, 2), second],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn tetrahedron_is_solid() {
        let mesh = primitive::tetrahedron();

        assert!(mesh.is_manifold());
        assert!(mesh.is_closed());
        assert!(mesh.is_oriented());
        assert!(mesh.is_solid());
        assert!(!mesh.has_boundary());

        let topology = mesh.topology().unwrap();
        assert_eq!(4, topology.vertices().len());
        assert_eq!(6, topology.edges().len());
        assert_eq!(4, topology.faces().len());
        assert!(topology.edges().iter().all(|edge| edge.faces().len() == 2));
    }

    #[test]
    fn single_triangle_is_open() {
        let mesh = Mesh::from_raw_buffers(
            vec![[0u32, 1, 2]],
            vec![[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        )
        .unwrap();

        assert!(!mesh.is_closed());
        assert!(mesh.is_manifold());
        assert!(mesh.is_oriented());
        assert!(mesh.has_boundary());
        assert!(!mesh.is_solid());
    }

    #[test]
    fn misoriented_triangles() {
        let mesh = two_triangles(MeshFace::triangle(0, 3, 2));

        assert!(mesh.is_manifold());
        assert!(!mesh.is_oriented());

        let mesh = two_triangles(MeshFace::triangle(0, 2, 3));
        assert!(mesh.is_oriented());
    }

    #[test]
    fn flags_are_computed_once() {
        let mesh = primitive::tetrahedron();

        assert_eq!(Tristate::Unknown, mesh.closed_state());
        assert!(mesh.is_closed());
        assert_eq!(Tristate::True, mesh.closed_state());
        // The closed query does not build topology.
        assert!(!mesh.has_topology());
        for _ in 0..4 {
            assert!(mesh.is_closed());
        }

        assert_eq!(Tristate::Unknown, mesh.oriented_state());
        assert!(mesh.is_manifold());
        // Manifold and oriented are resolved together.
        assert_eq!(Tristate::True, mesh.oriented_state());
        assert!(mesh.has_topology());
    }

    #[test]
    fn mutation_resets_flags() {
        let mut mesh = primitive::tetrahedron();
        assert!(mesh.is_closed());
        assert!(mesh.is_manifold());

        mesh.faces_mut().pop();
        assert_eq!(Tristate::Unknown, mesh.closed_state());
        assert_eq!(Tristate::Unknown, mesh.manifold_state());
        assert!(!mesh.has_topology());
        assert!(!mesh.is_closed());
    }

    #[test]
    fn concurrent_queries_agree() {
        let mesh = primitive::cube();
        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|n| {
                    let mesh = &mesh;
                    scope.spawn(move || {
                        // Half of the threads query closedness before topology is
                        // built.
                        if n % 2 == 0 {
                            mesh.is_closed();
                        }
                        let topology = mesh.topology().unwrap();
                        (
                            mesh.is_closed(),
                            mesh.is_solid(),
                            mesh.is_manifold(),
                            topology as *const Topology as usize,
                            topology.edges().len(),
                        )
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });

        let topology = mesh.topology().unwrap();
        for (closed, solid, manifold, address, edges) in results {
            assert!(closed);
            assert!(solid);
            assert!(manifold);
            assert_eq!(topology as *const Topology as usize, address);
            assert_eq!(12, edges);
        }
        assert_eq!(Tristate::True, mesh.closed_state());
    }

    #[test]
    fn clone_does_not_copy_cache() {
        let mesh = primitive::tetrahedron();
        mesh.topology().unwrap();
        assert!(mesh.is_closed());

        let clone = mesh.clone();
        assert!(!clone.has_topology());
        assert_eq!(Tristate::Unknown, clone.closed_state());
        assert_eq!(mesh.faces(), clone.faces());
    }

    #[test]
    fn closed_helper_agrees_with_topology() {
        for mesh in [
            primitive::tetrahedron(),
            primitive::cube(),
            primitive::grid(3, 2),
            two_triangles(MeshFace::triangle(0, 2, 3)),
        ] {
            let closed = mesh.is_closed();
            assert_eq!(closed, mesh.topology().unwrap().is_closed());
        }
    }

    #[test]
    fn reject_out_of_bounds_faces() {
        let result = Mesh::from_raw_buffers(
            vec![[0u32, 1, 3]],
            vec![[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        );
        assert_eq!(
            Err(MeshError::IndexOutOfBounds { index: 3, count: 3 }),
            result.map(|_| ())
        );
    }

    #[test]
    fn count_faces() {
        let mut mesh = primitive::grid(2, 1);
        mesh.append_triangle(0, 1, 3);
        mesh.append_triangle(0, 0, 1);

        assert_eq!(2, mesh.quad_count());
        assert_eq!(1, mesh.triangle_count());
        assert_eq!(1, mesh.invalid_face_count());
    }

    #[test]
    fn prefer_double_precision_positions() {
        // The second and third positions differ in double precision but not in
        // single precision.
        let mesh = Mesh::from_f64(
            vec![[0u32, 1, 3], [0, 3, 2]],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0 + 1e-12, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        )
        .unwrap();

        assert!(mesh.has_synchronized_double_and_single_precision_vertices());
        assert_eq!(mesh.vertices()[1], mesh.vertices()[2]);
        assert_eq!(4, mesh.topology().unwrap().vertices().len());

        let mut mesh = mesh;
        mesh.destroy_double_vertices();
        assert_eq!(3, mesh.topology().unwrap().vertices().len());
    }

    #[test]
    fn compute_normals() {
        let mut mesh = primitive::grid(1, 1);
        assert!(mesh.compute_face_normals());
        assert_eq!(vec![Vector3::z()], mesh.face_normals().to_vec());

        assert!(mesh.compute_vertex_normals());
        for normal in mesh.attributes().normals.iter() {
            assert_abs_diff_eq!(1.0, normal.z);
        }

        mesh.flip_faces();
        assert_eq!(MeshFace::quad(0, 2, 3, 1), mesh.faces()[0]);
        assert_eq!(vec![-Vector3::z()], mesh.face_normals().to_vec());
    }

    #[test]
    fn solid_orientation_of_cube() {
        let mut mesh = primitive::cube();
        assert_eq!(1, mesh.solid_orientation());

        mesh.flip_faces();
        assert_eq!(-1, mesh.solid_orientation());

        assert_eq!(0, primitive::grid(1, 1).solid_orientation());
    }

    #[test]
    fn validate_mesh() {
        let mut mesh = primitive::cube();
        assert!(mesh.is_valid());

        mesh.attributes_mut().colors = vec![[0; 4]; 3];
        assert!(!mesh.is_valid());
        mesh.attributes_mut().colors.clear();

        mesh.append_triangle(0, 1, 99);
        assert!(!mesh.is_valid());
        assert!(!Mesh::new().is_valid());
    }
}
