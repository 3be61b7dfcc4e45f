//! Optional per-vertex attributes.
//!
//! Every attribute array is either empty (absent) or exactly as long as the
//! vertex array of its mesh. [`VertexAttributes`] aggregates these arrays so
//! that they are compacted and permuted together with the vertices.

use nalgebra::{Point2, Vector3};
use std::fmt::{self, Display, Formatter};

use crate::UNSET_INDEX;

pub type Color = [u8; 4];

/// Principal curvatures at a vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Curvature {
    pub k1: f64,
    pub k2: f64,
}

impl Curvature {
    pub fn gaussian(&self) -> f64 {
        self.k1 * self.k2
    }

    pub fn mean(&self) -> f64 {
        0.5 * (self.k1 + self.k2)
    }
}

/// Identifies a parallel array of a mesh.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AttributeKind {
    DoubleVertex,
    FaceNormal,
    Normal,
    TextureCoordinate,
    SurfaceParameter,
    Curvature,
    Color,
    Hidden,
}

impl Display for AttributeKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeKind::DoubleVertex => "double precision vertices",
            AttributeKind::FaceNormal => "face normals",
            AttributeKind::Normal => "vertex normals",
            AttributeKind::TextureCoordinate => "texture coordinates",
            AttributeKind::SurfaceParameter => "surface parameters",
            AttributeKind::Curvature => "curvatures",
            AttributeKind::Color => "colors",
            AttributeKind::Hidden => "hidden flags",
        };
        write!(formatter, "{}", name)
    }
}

/// Optional per-vertex attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexAttributes {
    pub normals: Vec<Vector3<f32>>,
    pub texture_coordinates: Vec<Point2<f32>>,
    pub surface_parameters: Vec<Point2<f64>>,
    pub curvatures: Vec<Curvature>,
    pub colors: Vec<Color>,
    pub hidden: Vec<bool>,
}

impl VertexAttributes {
    /// Gets the attributes that are present but whose lengths differ from
    /// `vertex_count`.
    pub fn mismatched(&self, vertex_count: usize) -> Vec<AttributeKind> {
        [
            (AttributeKind::Normal, self.normals.len()),
            (AttributeKind::TextureCoordinate, self.texture_coordinates.len()),
            (AttributeKind::SurfaceParameter, self.surface_parameters.len()),
            (AttributeKind::Curvature, self.curvatures.len()),
            (AttributeKind::Color, self.colors.len()),
            (AttributeKind::Hidden, self.hidden.len()),
        ]
        .into_iter()
        .filter(|(_, len)| *len != 0 && *len != vertex_count)
        .map(|(kind, _)| kind)
        .collect()
    }

    /// Removes attributes whose lengths differ from `vertex_count`. Returns
    /// the attributes that were removed.
    pub fn clear_mismatched(&mut self, vertex_count: usize) -> Vec<AttributeKind> {
        let mismatched = self.mismatched(vertex_count);
        for kind in mismatched.iter() {
            match kind {
                AttributeKind::Normal => self.normals.clear(),
                AttributeKind::TextureCoordinate => self.texture_coordinates.clear(),
                AttributeKind::SurfaceParameter => self.surface_parameters.clear(),
                AttributeKind::Curvature => self.curvatures.clear(),
                AttributeKind::Color => self.colors.clear(),
                AttributeKind::Hidden => self.hidden.clear(),
                AttributeKind::DoubleVertex | AttributeKind::FaceNormal => {}
            }
        }
        mismatched
    }

    pub fn clear(&mut self) {
        *self = VertexAttributes::default();
    }

    pub fn is_hidden(&self, vertex: u32) -> bool {
        self.hidden.get(vertex as usize).copied().unwrap_or(false)
    }

    /// Compacts every present attribute with a remapping table.
    ///
    /// `map` is indexed by old vertex index and gives the new index of each
    /// surviving vertex or `UNSET_INDEX` for removed vertices. Attributes with
    /// lengths that do not match `map` are dropped.
    pub fn compact(&mut self, map: &[u32], count: usize) {
        compact_in_place(&mut self.normals, map, count);
        compact_in_place(&mut self.texture_coordinates, map, count);
        compact_in_place(&mut self.surface_parameters, map, count);
        compact_in_place(&mut self.curvatures, map, count);
        compact_in_place(&mut self.colors, map, count);
        compact_in_place(&mut self.hidden, map, count);
    }

    /// Reorders every present attribute such that the attributes of old
    /// vertex `order[n]` become those of vertex `n`.
    pub fn permute(&mut self, order: &[u32]) {
        permute_in_place(&mut self.normals, order);
        permute_in_place(&mut self.texture_coordinates, order);
        permute_in_place(&mut self.surface_parameters, order);
        permute_in_place(&mut self.curvatures, order);
        permute_in_place(&mut self.colors, order);
        permute_in_place(&mut self.hidden, order);
    }

    /// Returns `true` if the attributes of two vertices are equal.
    ///
    /// Normals and texture coordinates may be ignored. Absent attributes are
    /// always equal.
    pub fn matches(&self, a: u32, b: u32, ignore_normals: bool, ignore_texture: bool) -> bool {
        fn equal<T>(items: &[T], a: u32, b: u32) -> bool
        where
            T: PartialEq,
        {
            items.get(a as usize) == items.get(b as usize)
        }
        (ignore_normals || equal(&self.normals, a, b))
            && (ignore_texture || equal(&self.texture_coordinates, a, b))
            && equal(&self.surface_parameters, a, b)
            && equal(&self.curvatures, a, b)
            && equal(&self.colors, a, b)
            && equal(&self.hidden, a, b)
    }
}

/// Compacts items with a remapping table from old indices to new indices.
///
/// Returns an empty `Vec` if the length of `items` does not match `map`.
pub(crate) fn compact<T>(items: &[T], map: &[u32], count: usize) -> Vec<T>
where
    T: Clone,
{
    if items.len() != map.len() {
        return Vec::new();
    }
    let mut compacted = Vec::with_capacity(count);
    for (item, index) in items.iter().zip(map.iter()) {
        if *index != UNSET_INDEX {
            debug_assert_eq!(*index as usize, compacted.len());
            compacted.push(item.clone());
        }
    }
    compacted
}

fn compact_in_place<T>(items: &mut Vec<T>, map: &[u32], count: usize)
where
    T: Clone,
{
    if !items.is_empty() {
        let compacted = compact(items, map, count);
        *items = compacted;
    }
}

fn permute_in_place<T>(items: &mut Vec<T>, order: &[u32])
where
    T: Clone,
{
    if items.is_empty() {
        return;
    }
    if items.len() != order.len() {
        items.clear();
        return;
    }
    let permuted = order
        .iter()
        .map(|index| items[*index as usize].clone())
        .collect();
    *items = permuted;
}

#[cfg(test)]
mod tests {
    use nalgebra::{Point2, Vector3};

    use crate::attribute::{AttributeKind, VertexAttributes};
    use crate::UNSET_INDEX;

    fn attributes() -> VertexAttributes {
        VertexAttributes {
            normals: vec![Vector3::x(), Vector3::y(), Vector3::z()],
            colors: vec![[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]],
            ..Default::default()
        }
    }

    #[test]
    fn compact_present_attributes() {
        let mut attributes = attributes();
        attributes.compact(&[0, UNSET_INDEX, 1], 2);

        assert_eq!(vec![Vector3::x(), Vector3::z()], attributes.normals);
        assert_eq!(vec![[255, 0, 0, 255], [0, 0, 255, 255]], attributes.colors);
        assert!(attributes.texture_coordinates.is_empty());
    }

    #[test]
    fn permute_present_attributes() {
        let mut attributes = attributes();
        attributes.permute(&[2, 0, 1]);

        assert_eq!(
            vec![Vector3::z(), Vector3::x(), Vector3::y()],
            attributes.normals
        );
    }

    #[test]
    fn detect_mismatched_attributes() {
        let mut attributes = attributes();
        attributes.texture_coordinates = vec![Point2::origin()];

        assert_eq!(
            vec![AttributeKind::TextureCoordinate],
            attributes.mismatched(3)
        );
        attributes.clear_mismatched(3);
        assert!(attributes.mismatched(3).is_empty());
        assert_eq!(3, attributes.normals.len());
    }

    #[test]
    fn match_attributes() {
        let mut attributes = attributes();
        attributes.colors = vec![[0; 4]; 3];

        assert!(!attributes.matches(0, 1, false, false));
        assert!(attributes.matches(0, 1, true, false));
    }
}
