//! Exact coincidence classification of point locations.
//!
//! Meshes frequently store several vertices at the same location, for example
//! to give faces that meet at a crease distinct normals or texture
//! coordinates. Such vertices are _coincident_ and this module partitions a
//! set of points into classes of coincident points. Each class is assigned an
//! integer _id_.
//!
//! Coincidence is exact: two points are coincident if and only if each of
//! their coordinates compare equal. No tolerance is applied. Note that `0.0`
//! and `-0.0` compare equal and so are coincident.
//!
//! Ids do not depend on the order in which a sort happens to visit equal
//! points. The class containing the point with the smallest input index is
//! always assigned the first id, the class containing the smallest input
//! index not yet classified is assigned the next id, and so on. This makes
//! the grouping (and, up to a relabeling, the numbering) stable when the
//! input is transformed in ways that perturb sort order, such as rotation.
//!
//! # Invalid Points
//!
//! Points with any non-finite coordinate are never coincident with anything,
//! including themselves. They are not assigned an id (see
//! [`Coincidence::id`]) and are placed at the end of the grouped order.
//!
//! # Examples
//!
//! ```rust
//! use tessera::coincidence;
//!
//! let points = [[0.0f64, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
//! let coincidence = coincidence::classify(&points, 0).unwrap();
//!
//! assert_eq!(2, coincidence.group_count());
//! assert_eq!(coincidence.id(0), coincidence.id(2));
//! assert_ne!(coincidence.id(0), coincidence.id(1));
//! ```

use num::Float;
use std::cmp::Ordering;

/// Coincidence classes of a set of points.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Coincidence {
    ids: Vec<Option<u32>>,
    order: Vec<u32>,
    offsets: Vec<usize>,
    first_id: u32,
}

impl Coincidence {
    /// Gets the id of the point at `index`.
    ///
    /// Returns `None` if the index is out of bounds or the point is invalid.
    pub fn id(&self, index: usize) -> Option<u32> {
        self.ids.get(index).copied().flatten()
    }

    /// Gets the ids of all points in input order.
    pub fn ids(&self) -> &[Option<u32>] {
        self.ids.as_slice()
    }

    /// Gets a permutation of input indices in which coincident points are
    /// contiguous and ordered by id. Invalid points are last.
    pub fn order(&self) -> &[u32] {
        self.order.as_slice()
    }

    /// Gets the first id assigned.
    pub fn first_id(&self) -> u32 {
        self.first_id
    }

    /// Gets the number of classes of coincident points.
    ///
    /// Ids are contiguous in the range `[first_id, first_id + group_count)`.
    pub fn group_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Gets the number of points that have not been assigned an id.
    pub fn invalid_count(&self) -> usize {
        self.order.len() - self.offsets.last().copied().unwrap_or(0)
    }

    /// Gets the input indices of the points in the class with the given id.
    ///
    /// Indices within a group are sorted in increasing order.
    pub fn group(&self, id: u32) -> Option<&[u32]> {
        let k = id.checked_sub(self.first_id)? as usize;
        let start = *self.offsets.get(k)?;
        let end = *self.offsets.get(k + 1)?;
        Some(&self.order[start..end])
    }

    /// Gets an iterator over the classes of coincident points in id order.
    pub fn groups(&self) -> impl '_ + ExactSizeIterator<Item = &[u32]> {
        self.offsets
            .windows(2)
            .map(move |range| &self.order[range[0]..range[1]])
    }

    /// Gets the input indices of invalid points.
    pub fn invalid(&self) -> &[u32] {
        let start = self.offsets.last().copied().unwrap_or(0);
        &self.order[start..]
    }

    pub fn into_ids(self) -> Vec<Option<u32>> {
        self.ids
    }
}

/// Classifies points by exact coincidence.
///
/// Returns `None` if there are no points, if the dimension `D` is not two or
/// three, or if ids starting at `first_id` would overflow.
pub fn classify<T, const D: usize>(points: &[[T; D]], first_id: u32) -> Option<Coincidence>
where
    T: Float,
{
    classify_with(points.len(), first_id, |index| points[index])
}

/// Classifies points by exact coincidence, reading the location of each point
/// with a function.
///
/// This avoids copying positions out of richer vertex types. The function is
/// called with every index in `0..count`, possibly more than once.
pub fn classify_with<T, F, const D: usize>(count: usize, first_id: u32, f: F) -> Option<Coincidence>
where
    T: Float,
    F: Fn(usize) -> [T; D],
{
    if count == 0 || !(2..=3).contains(&D) || u32::try_from(count).is_err() {
        return None;
    }
    let is_valid = |index: usize| f(index).iter().all(|x| x.is_finite());
    if count == 1 {
        return Some(if is_valid(0) {
            Coincidence {
                ids: vec![Some(first_id)],
                order: vec![0],
                offsets: vec![0, 1],
                first_id,
            }
        }
        else {
            Coincidence {
                ids: vec![None],
                order: vec![0],
                offsets: vec![0],
                first_id,
            }
        });
    }

    // Dictionary sort of valid points. Ties are broken arbitrarily here; the
    // tie-breaking is erased by tagging each class with its smallest index.
    let (mut sorted, invalid): (Vec<u32>, Vec<u32>) =
        (0..count as u32).partition(|index| is_valid(*index as usize));
    sorted.sort_unstable_by(|a, b| compare(&f(*a as usize), &f(*b as usize)));

    let mut tagged = Vec::with_capacity(sorted.len());
    let mut start = 0;
    while start < sorted.len() {
        let location = f(sorted[start] as usize);
        let mut end = start + 1;
        while end < sorted.len() && compare(&location, &f(sorted[end] as usize)) == Ordering::Equal
        {
            end += 1;
        }
        let tag = sorted[start..end].iter().copied().min().unwrap_or(sorted[start]);
        tagged.extend(sorted[start..end].iter().map(|index| (tag, *index)));
        start = end;
    }
    tagged.sort_by_key(|&(tag, index)| (tag, index));

    let mut ids = vec![None; count];
    let mut order = Vec::with_capacity(count);
    let mut offsets = Vec::new();
    let mut previous = None;
    let mut id = first_id;
    for (position, &(tag, index)) in tagged.iter().enumerate() {
        if previous != Some(tag) {
            if previous.is_some() {
                id = id.checked_add(1)?;
            }
            offsets.push(position);
            previous = Some(tag);
        }
        ids[index as usize] = Some(id);
        order.push(index);
    }
    offsets.push(tagged.len());
    if offsets.len() == 1 {
        // Only invalid points.
        offsets.clear();
        offsets.push(0);
    }
    order.extend(invalid);
    Some(Coincidence {
        ids,
        order,
        offsets,
        first_id,
    })
}

/// Dictionary order over coordinates. Only called with finite values.
fn compare<T, const D: usize>(a: &[T; D], b: &[T; D]) -> Ordering
where
    T: Float,
{
    a.iter()
        .zip(b.iter())
        .map(|(a, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use crate::coincidence::{classify, classify_with};

    fn partition(ids: &[Option<u32>]) -> Vec<Vec<usize>> {
        ids.iter()
            .enumerate()
            .filter_map(|(index, id)| id.map(|id| (id, index)))
            .into_group_map()
            .into_values()
            .map(|mut group| {
                group.sort_unstable();
                group
            })
            .sorted()
            .collect()
    }

    #[test]
    fn classify_coincident_points() {
        let points = [
            [1.0f64, 2.0, 3.0],
            [0.0, 0.0, 0.0],
            [1.0, 2.0, 3.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0],
        ];
        let coincidence = classify(&points, 10).unwrap();

        assert_eq!(3, coincidence.group_count());
        // The class of the first point is numbered first, then the class of
        // the next unclassified point, and so on.
        assert_eq!(
            &[Some(10), Some(11), Some(10), Some(12), Some(11)],
            coincidence.ids()
        );
        assert_eq!(Some(&[0u32, 2][..]), coincidence.group(10));
        assert_eq!(Some(&[1u32, 4][..]), coincidence.group(11));
        assert_eq!(Some(&[3u32][..]), coincidence.group(12));
        assert_eq!(None, coincidence.group(13));
        assert_eq!(&[0, 2, 1, 4, 3], coincidence.order());
    }

    #[test]
    fn classify_two_dimensional_points() {
        let points = [[0.0f32, 1.0], [0.0, 1.0], [1.0, 0.0]];
        let coincidence = classify(&points, 0).unwrap();

        assert_eq!(2, coincidence.group_count());
        assert_eq!(coincidence.id(0), coincidence.id(1));
    }

    #[test]
    fn signed_zero_is_coincident() {
        let points = [[0.0f64, -0.0, 1.0], [-0.0, 0.0, 1.0]];
        let coincidence = classify(&points, 0).unwrap();

        assert_eq!(1, coincidence.group_count());
    }

    #[test]
    fn invalid_points_are_not_classified() {
        let points = [
            [f64::NAN, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            [f64::NAN, 0.0, 0.0],
            [f64::INFINITY, 0.0, 0.0],
            [1.0, 1.0, 1.0],
        ];
        let coincidence = classify(&points, 0).unwrap();

        assert_eq!(1, coincidence.group_count());
        assert_eq!(3, coincidence.invalid_count());
        assert_eq!(&[None, Some(0), None, None, Some(0)], coincidence.ids());
        assert_eq!(&[0, 2, 3], coincidence.invalid());
        assert_eq!(&[1, 4, 0, 2, 3], coincidence.order());
    }

    #[test]
    fn only_invalid_points() {
        let points = [[f32::NAN, 0.0, 0.0], [f32::NAN, 0.0, 0.0]];
        let coincidence = classify(&points, 0).unwrap();

        assert_eq!(0, coincidence.group_count());
        assert_eq!(0, coincidence.groups().count());
        assert_eq!(2, coincidence.invalid_count());
    }

    #[test]
    fn single_point_uses_first_id() {
        let coincidence = classify(&[[4.0f64, 5.0, 6.0]], 7).unwrap();

        assert_eq!(Some(7), coincidence.id(0));
        assert_eq!(1, coincidence.group_count());
    }

    #[test]
    fn reject_degenerate_input() {
        assert!(classify::<f64, 3>(&[], 0).is_none());
        assert!(classify(&[[0.0f64], [1.0]], 0).is_none());
        assert!(classify(&[[0.0f64; 4], [1.0; 4]], 0).is_none());
        assert!(classify(&[[0.0f64; 3], [1.0; 3]], u32::MAX).is_none());
    }

    #[test]
    fn grouping_is_invariant_under_permutation() {
        let points = [
            [0.0f64, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
        ];
        let expected = partition(classify(&points, 0).unwrap().ids());
        // Reverse the points and map the ids back to original indices.
        let n = points.len();
        let coincidence = classify_with(n, 0, |index| points[n - 1 - index]).unwrap();
        let ids: Vec<_> = (0..n).map(|index| coincidence.id(n - 1 - index)).collect();

        assert_eq!(expected, partition(&ids));
    }
}
