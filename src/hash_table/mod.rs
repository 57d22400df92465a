pub mod chained;
pub mod open_addressing;

use std::fmt;
use std::hash::{BuildHasher, Hasher};

use serde::Deserialize;

use crate::error::HashTableError;

pub use chained::ChainedHashTable;
pub use open_addressing::OpenAddressingHashTable;

/// Number of buckets (or slots) a table starts with when none is given.
pub const DEFAULT_CAPACITY: usize = 16;
/// Load factor above which a table doubles its capacity.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;
/// Smallest accepted load factor threshold.
///
/// A single insert adds one entry, so growing until `1 / capacity` drops to
/// this floor takes at most five doublings.
pub const MIN_LOAD_FACTOR: f64 = 0.05;

/// Defines the collision resolution strategy for the hash table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionResolution {
    /// Chaining: store colliding entries in a vector per bucket
    #[default]
    Chaining,
    /// Linear probing: check next slot sequentially (i+1, i+2, ...), deletions leave tombstones
    LinearProbing,
}

impl fmt::Display for CollisionResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionResolution::Chaining => write!(f, "chaining"),
            CollisionResolution::LinearProbing => write!(f, "linear probing"),
        }
    }
}

/// Operations shared by both table layouts.
///
/// The tables are not synchronized. Mutation goes through `&mut self`, so
/// sharing one between threads needs an external lock.
pub trait KeyValueTable<K, V> {
    /// Inserts or overwrites `key`, returning the value it replaced.
    fn insert(&mut self, key: K, value: V) -> Result<Option<V>, HashTableError>;
    fn retrieve(&self, key: &K) -> Option<&V>;
    /// Returns true if the key was found and removed.
    fn remove(&mut self, key: &K) -> bool;
    fn size(&self) -> usize;
    fn capacity(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn load_factor(&self) -> f64 {
        self.size() as f64 / self.capacity() as f64
    }
}

/// Polynomial rolling hash with multiplier 31 over every byte fed to it.
///
/// Deterministic across runs, which keeps bucket placement reproducible.
/// Not resistant to adversarial keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollingHasher {
    hash: u64,
}

impl Hasher for RollingHasher {
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.hash = self.hash.wrapping_mul(31).wrapping_add(*byte as u64);
        }
    }
}

/// Builds [`RollingHasher`]s; the default hasher for both tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollingBuildHasher;

impl BuildHasher for RollingBuildHasher {
    type Hasher = RollingHasher;

    fn build_hasher(&self) -> RollingHasher {
        RollingHasher::default()
    }
}

/// Rejects a zero capacity, and a threshold that is not finite or lies below
/// [`MIN_LOAD_FACTOR`].
pub(crate) fn validate(capacity: usize, load_factor_threshold: f64) -> Result<(), HashTableError> {
    if capacity == 0 {
        return Err(HashTableError::ZeroCapacity);
    }
    if !load_factor_threshold.is_finite() || load_factor_threshold < MIN_LOAD_FACTOR {
        return Err(HashTableError::InvalidLoadFactor(load_factor_threshold));
    }
    Ok(())
}

/// True when `count / capacity` is strictly above the threshold.
pub(crate) fn exceeds_threshold(count: usize, capacity: usize, load_factor_threshold: f64) -> bool {
    count as f64 / capacity as f64 > load_factor_threshold
}
