//! Partitioning of meshes into parts with bounded sizes.
//!
//! Consumers with small index types (such as 16-bit index buffers) can draw
//! a large mesh as a sequence of parts. Each part is a contiguous range of
//! faces together with the vertices those faces reference. Quads count as two
//! triangles.

use std::ops::Range;

use tracing::debug;

use crate::mesh::{Mesh, MeshError};

/// Bounds on the size of each part of a partition.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PartitionLimits {
    pub max_vertices: usize,
    pub max_triangles: usize,
}

impl PartitionLimits {
    pub fn with_max_vertices(mut self, max_vertices: usize) -> Self {
        self.max_vertices = max_vertices;
        self
    }

    pub fn with_max_triangles(mut self, max_triangles: usize) -> Self {
        self.max_triangles = max_triangles;
        self
    }
}

impl Default for PartitionLimits {
    fn default() -> Self {
        PartitionLimits {
            max_vertices: 0xFFFF,
            max_triangles: 0xFFFF,
        }
    }
}

/// Part of a partition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MeshPart {
    faces: Range<u32>,
    vertices: Vec<u32>,
    triangle_count: usize,
}

impl MeshPart {
    /// Gets the range of faces in the part.
    pub fn faces(&self) -> Range<u32> {
        self.faces.clone()
    }

    /// Gets the sorted vertices referenced by the faces of the part.
    pub fn vertices(&self) -> &[u32] {
        self.vertices.as_slice()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Gets the number of triangles in the part, counting quads as two.
    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }
}

/// Partition of the faces of a mesh into [`MeshPart`]s.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MeshPartition {
    limits: Option<PartitionLimits>,
    parts: Vec<MeshPart>,
}

impl MeshPartition {
    pub fn parts(&self) -> &[MeshPart] {
        self.parts.as_slice()
    }

    pub fn limits(&self) -> Option<PartitionLimits> {
        self.limits
    }
}

impl Mesh {
    /// Partitions the faces of the mesh and caches the partition.
    ///
    /// Faces are assigned to parts in order. A new part is started whenever
    /// adding a face would exceed either limit. The partition is discarded
    /// when the mesh is mutated.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh has no faces or if the limits cannot
    /// accommodate a single quad.
    pub fn create_partition(
        &mut self,
        limits: PartitionLimits,
    ) -> Result<&MeshPartition, MeshError> {
        if self.faces.is_empty() || self.vertices.is_empty() {
            return Err(MeshError::Empty);
        }
        if limits.max_vertices < 4 || limits.max_triangles < 2 {
            return Err(MeshError::PartitionLimit);
        }
        let vertex_count = self.vertex_count();
        if let Some(index) = self
            .faces
            .iter()
            .flat_map(|face| face.corners().iter())
            .find(|vi| (**vi as usize) >= vertex_count)
        {
            return Err(MeshError::IndexOutOfBounds {
                index: *index,
                count: vertex_count,
            });
        }

        let mut parts = Vec::new();
        let mut start = 0u32;
        let mut vertices: Vec<u32> = Vec::new();
        let mut triangle_count = 0;
        for (fi, face) in self.faces.iter().enumerate() {
            let triangles = if face.is_triangle() { 1 } else { 2 };
            let added = face
                .corners()
                .iter()
                .filter(|vi| vertices.binary_search(*vi).is_err())
                .count();
            if triangle_count + triangles > limits.max_triangles
                || vertices.len() + added > limits.max_vertices
            {
                parts.push(MeshPart {
                    faces: start..(fi as u32),
                    vertices: std::mem::take(&mut vertices),
                    triangle_count,
                });
                start = fi as u32;
                triangle_count = 0;
            }
            for vi in face.corners() {
                if let Err(position) = vertices.binary_search(vi) {
                    vertices.insert(position, *vi);
                }
            }
            triangle_count += triangles;
        }
        parts.push(MeshPart {
            faces: start..(self.faces.len() as u32),
            vertices,
            triangle_count,
        });
        debug!(parts = parts.len(), "partitioned mesh");
        Ok(&*self.cache.partition.insert(MeshPartition {
            limits: Some(limits),
            parts,
        }))
    }

    /// Gets the cached partition, if any.
    pub fn partition(&self) -> Option<&MeshPartition> {
        self.cache.partition.as_ref()
    }
}
