use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::mem;

use log::debug;

use super::{
    exceeds_threshold, validate, KeyValueTable, RollingBuildHasher, DEFAULT_CAPACITY,
    DEFAULT_LOAD_FACTOR,
};
use crate::error::HashTableError;

/// Represents a key-value pair stored in a bucket chain
#[derive(Debug, Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
}

impl<K, V> Entry<K, V> {
    fn new(key: K, value: V) -> Entry<K, V> {
        Entry { key, value }
    }
}

/// Hash table resolving collisions by separate chaining.
///
/// Every bucket owns a vector of the entries hashing to it. The table doubles
/// its bucket count after an insert pushes `size / capacity` above the load
/// factor threshold, so the threshold holds again by the time `insert`
/// returns. Removal never shrinks the table.
#[derive(Debug, Clone)]
pub struct ChainedHashTable<K, V, S = RollingBuildHasher> {
    /// One chain per bucket; the vector length is the capacity
    buckets: Vec<Vec<Entry<K, V>>>,
    /// Number of live entries across all chains
    count: usize,
    load_factor_threshold: f64,
    hasher: S,
}

impl<K: Hash + Eq, V> ChainedHashTable<K, V> {
    /// Creates an empty table with 16 buckets and a 0.75 load factor threshold.
    pub fn new() -> Self {
        Self::from_parts(DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR, RollingBuildHasher)
    }

    pub fn with_capacity(capacity: usize) -> Result<Self, HashTableError> {
        Self::with_capacity_and_load_factor(capacity, DEFAULT_LOAD_FACTOR)
    }

    pub fn with_capacity_and_load_factor(
        capacity: usize,
        load_factor_threshold: f64,
    ) -> Result<Self, HashTableError> {
        Self::with_hasher(capacity, load_factor_threshold, RollingBuildHasher)
    }
}

impl<K: Hash + Eq, V> Default for ChainedHashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ChainedHashTable<K, V, S> {
    /// Creates an empty table hashing keys with `hasher`.
    ///
    /// Fails if `capacity` is zero or the threshold is not finite or lies below
    /// [`MIN_LOAD_FACTOR`](super::MIN_LOAD_FACTOR).
    pub fn with_hasher(
        capacity: usize,
        load_factor_threshold: f64,
        hasher: S,
    ) -> Result<Self, HashTableError> {
        validate(capacity, load_factor_threshold)?;
        Ok(Self::from_parts(capacity, load_factor_threshold, hasher))
    }

    fn from_parts(capacity: usize, load_factor_threshold: f64, hasher: S) -> Self {
        ChainedHashTable {
            buckets: empty_buckets(capacity),
            count: 0,
            load_factor_threshold,
            hasher,
        }
    }

    /// Inserts a key-value pair, returning the previous value if the key existed.
    ///
    /// Overwriting an existing key never grows the table.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let index = self.bucket_index(&key);
        let chain = &mut self.buckets[index];

        for entry in chain.iter_mut() {
            if entry.key == key {
                return Some(mem::replace(&mut entry.value, value));
            }
        }

        chain.push(Entry::new(key, value));
        self.count += 1;

        while exceeds_threshold(self.count, self.capacity(), self.load_factor_threshold) {
            self.resize();
        }
        None
    }

    /// Retrieves the value stored for `key`.
    pub fn retrieve<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_index(key);
        self.buckets[index]
            .iter()
            .find(|entry| entry.key.borrow() == key)
            .map(|entry| &entry.value)
    }

    pub fn retrieve_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_index(key);
        self.buckets[index]
            .iter_mut()
            .find(|entry| entry.key.borrow() == key)
            .map(|entry| &mut entry.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.retrieve(key).is_some()
    }

    /// Removes `key` from its chain.
    /// Returns true if the key was found and removed, false otherwise
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_index(key);
        assert!(
            index < self.buckets.len(),
            "bucket index {} out of range for {} buckets",
            index,
            self.buckets.len()
        );

        let chain = &mut self.buckets[index];
        match chain.iter().position(|entry| entry.key.borrow() == key) {
            Some(position) => {
                chain.remove(position);
                self.count -= 1;
                true
            }
            None => false,
        }
    }

    /// Number of live entries.
    pub fn size(&self) -> usize {
        self.count
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn load_factor(&self) -> f64 {
        self.count as f64 / self.capacity() as f64
    }

    pub fn load_factor_threshold(&self) -> f64 {
        self.load_factor_threshold
    }

    /// Iterates over live entries in bucket order, which is not insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.buckets
            .iter()
            .flatten()
            .map(|entry| (&entry.key, &entry.value))
    }

    fn bucket_index<Q: Hash + ?Sized>(&self, key: &Q) -> usize {
        (self.hasher.hash_one(key) % self.buckets.len() as u64) as usize
    }

    /// Doubles the bucket count and rehashes every entry into the new buckets.
    fn resize(&mut self) {
        let old_capacity = self.buckets.len();
        let new_capacity = old_capacity * 2;
        let mut new_buckets = empty_buckets(new_capacity);

        for entry in self.buckets.drain(..).flatten() {
            let index = (self.hasher.hash_one(&entry.key) % new_capacity as u64) as usize;
            new_buckets[index].push(entry);
        }

        self.buckets = new_buckets;
        debug!(
            "chained table resized from {} to {} buckets ({} entries)",
            old_capacity, new_capacity, self.count
        );
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> KeyValueTable<K, V> for ChainedHashTable<K, V, S> {
    fn insert(&mut self, key: K, value: V) -> Result<Option<V>, HashTableError> {
        Ok(self.insert(key, value))
    }

    fn retrieve(&self, key: &K) -> Option<&V> {
        self.retrieve(key)
    }

    fn remove(&mut self, key: &K) -> bool {
        self.remove(key)
    }

    fn size(&self) -> usize {
        self.size()
    }

    fn capacity(&self) -> usize {
        self.capacity()
    }
}

fn empty_buckets<K, V>(capacity: usize) -> Vec<Vec<Entry<K, V>>> {
    let mut buckets = Vec::with_capacity(capacity);
    buckets.resize_with(capacity, Vec::new);
    buckets
}
