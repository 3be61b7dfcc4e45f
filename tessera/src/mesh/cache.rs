//! Lazily computed data derived from a mesh.
//!
//! Queries on a shared mesh may compute and cache derived data, such as its
//! topology or whether it is closed. Each cached value is written only once
//! its computation completes. Threads that race to compute the same value from
//! the same (unmodified) mesh compute the same result, so redundant work is
//! tolerated but an incomplete value is never observed.
//!
//! Mutation requires exclusive access to a mesh and resets the entire cache.

use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::mesh::partition::MeshPartition;
use crate::topology::Topology;

/// Cached boolean property that may not yet be known.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Tristate {
    #[default]
    Unknown,
    True,
    False,
}

impl Tristate {
    pub fn is_known(&self) -> bool {
        !matches!(self, Tristate::Unknown)
    }

    pub fn to_option(self) -> Option<bool> {
        match self {
            Tristate::Unknown => None,
            Tristate::True => Some(true),
            Tristate::False => Some(false),
        }
    }

    fn into_bits(self) -> u8 {
        match self {
            Tristate::Unknown => 0,
            Tristate::True => 1,
            Tristate::False => 2,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Tristate::True,
            2 => Tristate::False,
            _ => Tristate::Unknown,
        }
    }
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        if value {
            Tristate::True
        }
        else {
            Tristate::False
        }
    }
}

impl From<Option<bool>> for Tristate {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Tristate::Unknown, Tristate::from)
    }
}

/// [`Tristate`] that can be resolved through a shared reference.
#[derive(Debug, Default)]
pub(crate) struct CachedFlag(AtomicU8);

impl CachedFlag {
    pub fn get(&self) -> Tristate {
        Tristate::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: Tristate) {
        self.0.store(state.into_bits(), Ordering::Release);
    }

    /// Gets the flag, computing and storing it if it is unknown.
    pub fn get_or_compute<F>(&self, f: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        match self.get().to_option() {
            Some(value) => value,
            None => {
                let value = f();
                self.set(value.into());
                value
            }
        }
    }
}

/// Counts of faces by kind.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct FaceCounts {
    pub triangles: usize,
    pub quads: usize,
    pub invalid: usize,
}

#[derive(Debug, Default)]
pub(crate) struct MeshCache {
    pub topology: OnceCell<Topology>,
    pub closed: CachedFlag,
    pub manifold: CachedFlag,
    pub oriented: CachedFlag,
    pub face_counts: OnceCell<FaceCounts>,
    pub partition: Option<MeshPartition>,
}

impl MeshCache {
    pub fn invalidate(&mut self) {
        *self = MeshCache::default();
    }
}
