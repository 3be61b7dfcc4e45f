//! Triangular and quadrilateral faces.
//!
//! A [`MeshFace`] always stores four vertex indices. A face is a _triangle_
//! if its last two indices are equal and is otherwise a _quad_. This uniform
//! representation lets code treat every face as a four-slot record.
//!
//! The _sides_ of a face are the undirected edges between consecutive
//! corners. See [`FaceSide`].

use arrayvec::ArrayVec;

use crate::{IteratorExt as _, UNSET_INDEX};

/// Triangular or quadrilateral face.
///
/// # Examples
///
/// ```rust
/// use tessera::face::MeshFace;
///
/// let face = MeshFace::triangle(0, 1, 2);
/// assert!(face.is_triangle());
/// assert_eq!([0, 1, 2, 2], face.vi);
/// assert!(face.is_valid(3));
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MeshFace {
    pub vi: [u32; 4],
}

impl MeshFace {
    /// A neutralized face that refers to no vertices.
    pub const UNSET: MeshFace = MeshFace {
        vi: [UNSET_INDEX; 4],
    };

    pub fn triangle(a: u32, b: u32, c: u32) -> Self {
        MeshFace { vi: [a, b, c, c] }
    }

    pub fn quad(a: u32, b: u32, c: u32, d: u32) -> Self {
        MeshFace { vi: [a, b, c, d] }
    }

    pub fn is_triangle(&self) -> bool {
        self.vi[2] == self.vi[3]
    }

    pub fn is_quad(&self) -> bool {
        !self.is_triangle()
    }

    pub fn is_unset(&self) -> bool {
        self.vi.iter().all(|index| *index == UNSET_INDEX)
    }

    /// Gets the number of corners: three for triangles and four for quads.
    pub fn arity(&self) -> usize {
        if self.is_triangle() {
            3
        }
        else {
            4
        }
    }

    /// Gets the vertex indices of the distinct corners of the face.
    pub fn corners(&self) -> &[u32] {
        &self.vi[..self.arity()]
    }

    /// Returns `true` if all indices are less than `vertex_count` and the
    /// corners are distinct.
    ///
    /// Triangles are valid if their three corners are distinct. Quads are
    /// valid if their fourth index is distinct from the other three.
    pub fn is_valid(&self, vertex_count: usize) -> bool {
        let [a, b, c, d] = self.vi;
        self.vi.iter().all(|index| (*index as usize) < vertex_count)
            && a != b
            && b != c
            && c != a
            && (c == d || (a != d && b != d))
    }

    /// Returns `true` if the face is valid and no two of its distinct corners
    /// are located at the same point.
    ///
    /// This detects faces that are valid by index but have collapsed
    /// geometrically.
    pub fn is_valid_with_points<P>(&self, points: &[P]) -> bool
    where
        P: PartialEq,
    {
        if !self.is_valid(points.len()) {
            return false;
        }
        let corners = self.corners();
        corners.iter().enumerate().all(|(n, a)| {
            corners[(n + 1)..]
                .iter()
                .all(|b| points[*a as usize] != points[*b as usize])
        })
    }

    /// Attempts to repair an invalid face.
    ///
    /// Corners are chosen greedily in order, skipping indices that are out of
    /// bounds or that repeat a chosen corner. A quad with only three usable
    /// corners is demoted to a triangle. The face is only modified if a valid
    /// face can be formed.
    pub fn repair(&mut self, vertex_count: usize) -> bool {
        self.repair_with(vertex_count, |a, b| a == b)
    }

    /// Attempts to repair a face, also skipping corners located at the same
    /// point as a chosen corner.
    pub fn repair_with_points<P>(&mut self, points: &[P]) -> bool
    where
        P: PartialEq,
    {
        self.repair_with(points.len(), |a, b| {
            a == b || points[a as usize] == points[b as usize]
        })
    }

    /// Attempts to repair a face using a function that determines if two
    /// in-bounds vertex indices refer to the same corner.
    pub fn repair_with<F>(&mut self, vertex_count: usize, same: F) -> bool
    where
        F: Fn(u32, u32) -> bool,
    {
        let mut corners = ArrayVec::<u32, 4>::new();
        for index in self.vi {
            if (index as usize) < vertex_count && !corners.iter().any(|corner| same(*corner, index))
            {
                corners.push(index);
            }
        }
        let face = match corners.as_slice() {
            [a, b, c] => MeshFace::triangle(*a, *b, *c),
            [a, b, c, d] => MeshFace::quad(*a, *b, *c, *d),
            _ => return false,
        };
        if face.is_valid(vertex_count) {
            *self = face;
            true
        }
        else {
            false
        }
    }

    /// Reverses the winding of the face, keeping its first corner.
    pub fn flip(&mut self) {
        let [a, b, c, d] = self.vi;
        *self = if self.is_triangle() {
            MeshFace::triangle(a, c, b)
        }
        else {
            MeshFace::quad(a, d, c, b)
        };
    }

    /// Gets the sides of the face.
    ///
    /// Side $k$ joins corner $k$ to corner $k + 1$ (modulo the arity). Each
    /// side stores its endpoints in increasing order and records whether the
    /// face traverses it backward. Sides with equal endpoints are omitted.
    pub fn sides(&self, face: u32) -> ArrayVec<FaceSide, 4> {
        self.corners()
            .iter()
            .copied()
            .perimeter()
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(side, (a, b))| FaceSide::new(a, b, face, side as u8))
            .collect()
    }

    /// Maps the corners of the face and removes collapsed sides.
    ///
    /// A side is collapsed if `f` maps both of its ends to the same value. A
    /// quad with one collapsed side becomes a triangle. Returns `None` if `f`
    /// returns `None` for any corner, if fewer than three corners remain, or
    /// if two corners that are not joined by a side map to the same value.
    pub fn map_collapsed<F>(&self, mut f: F) -> Option<MeshFace>
    where
        F: FnMut(u32) -> Option<u32>,
    {
        let mut corners = ArrayVec::<u32, 4>::new();
        for vi in self.corners() {
            let corner = f(*vi)?;
            if corners.last() != Some(&corner) {
                corners.push(corner);
            }
        }
        if corners.len() > 1 && corners.first() == corners.last() {
            corners.pop();
        }
        if corners
            .iter()
            .enumerate()
            .any(|(n, a)| corners[(n + 1)..].contains(a))
        {
            return None;
        }
        match corners.as_slice() {
            [a, b, c] => Some(MeshFace::triangle(*a, *b, *c)),
            [a, b, c, d] => Some(MeshFace::quad(*a, *b, *c, *d)),
            _ => None,
        }
    }
}

impl Default for MeshFace {
    fn default() -> Self {
        MeshFace::UNSET
    }
}

impl From<[u32; 3]> for MeshFace {
    fn from(vi: [u32; 3]) -> Self {
        MeshFace::triangle(vi[0], vi[1], vi[2])
    }
}

impl From<[u32; 4]> for MeshFace {
    fn from(vi: [u32; 4]) -> Self {
        MeshFace { vi }
    }
}

/// Undirected side of a face.
///
/// Sides that join the same pair of vertices compare equal by `vi` regardless
/// of which face they belong to or in which direction that face traverses
/// them. This is used both to detect shared edges and to determine how each
/// face winds along such an edge.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FaceSide {
    /// Endpoints in increasing order.
    pub vi: [u32; 2],
    /// Index of the face.
    pub face: u32,
    /// Index of the side within the face.
    pub side: u8,
    /// `true` if the face traverses the side from `vi[1]` to `vi[0]`.
    pub reversed: bool,
}

impl FaceSide {
    pub fn new(a: u32, b: u32, face: u32, side: u8) -> Self {
        let reversed = a > b;
        FaceSide {
            vi: if reversed { [b, a] } else { [a, b] },
            face,
            side,
            reversed,
        }
    }

    /// Gets the endpoints in the order that the face traverses them.
    pub fn directed(&self) -> (u32, u32) {
        if self.reversed {
            (self.vi[1], self.vi[0])
        }
        else {
            (self.vi[0], self.vi[1])
        }
    }
}
