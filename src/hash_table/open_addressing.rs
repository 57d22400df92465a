use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::mem;

use log::{debug, trace, warn};

use super::{
    exceeds_threshold, validate, KeyValueTable, RollingBuildHasher, DEFAULT_CAPACITY,
    DEFAULT_LOAD_FACTOR,
};
use crate::error::HashTableError;

/// State of one slot in the probe array.
///
/// `Empty -> Occupied -> Deleted -> Occupied ...`; only a rehash turns a
/// slot back into `Empty`.
#[derive(Debug, Clone)]
enum Slot<K, V> {
    Empty,
    Occupied(K, V),
    /// Tombstone left by a removal so probe sequences passing through stay intact
    Deleted,
}

/// Hash table resolving collisions by linear probing over a flat slot array.
///
/// The load factor is checked before each insert probes: if live entries
/// already exceed the threshold the slot array doubles first. A table whose
/// threshold is 1.0 or more can therefore fill up, and the next insert of a
/// new key fails with [`HashTableError::TableFull`].
///
/// Removal leaves a tombstone. Tombstones are reused by later inserts and are
/// all discarded when the slots are rebuilt. A rebuild at the same capacity
/// happens when live entries plus tombstones exceed the threshold while live
/// entries alone do not.
#[derive(Debug, Clone)]
pub struct OpenAddressingHashTable<K, V, S = RollingBuildHasher> {
    slots: Vec<Slot<K, V>>,
    /// Occupied slots
    count: usize,
    /// Deleted slots
    tombstones: usize,
    load_factor_threshold: f64,
    hasher: S,
}

impl<K: Hash + Eq, V> OpenAddressingHashTable<K, V> {
    /// Creates an empty table with 16 slots and a 0.75 load factor threshold.
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

impl<K: Hash + Eq, V> Default for OpenAddressingHashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> OpenAddressingHashTable<K, V, S> {
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
        OpenAddressingHashTable {
            slots: empty_slots(capacity),
            count: 0,
            tombstones: 0,
            load_factor_threshold,
            hasher,
        }
    }

    /// Inserts a key-value pair, returning the previous value if the key existed.
    ///
    /// The probe continues past tombstones until it reaches an empty slot or
    /// the key itself, so a key is never stored twice. A new key lands in the
    /// first tombstone seen, or in the empty slot if there was none.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, HashTableError> {
        self.grow_if_needed();

        let capacity = self.capacity();
        let hash = self.hasher.hash_one(&key);
        let mut first_tombstone = None;
        let mut empty = None;

        for attempt in 0..capacity {
            let index = probe(hash, attempt, capacity);
            match &mut self.slots[index] {
                Slot::Occupied(existing, current) if *existing == key => {
                    return Ok(Some(mem::replace(current, value)));
                }
                Slot::Occupied(..) => {}
                Slot::Deleted => {
                    first_tombstone.get_or_insert(index);
                }
                Slot::Empty => {
                    empty = Some(index);
                    break;
                }
            }
        }

        match first_tombstone.or(empty) {
            Some(index) => {
                self.occupy(index, key, value);
                Ok(None)
            }
            None => {
                warn!(
                    "open addressing table full: {} slots probed at load factor threshold {}",
                    capacity, self.load_factor_threshold
                );
                Err(HashTableError::TableFull { capacity })
            }
        }
    }

    /// Retrieves the value stored for `key`.
    pub fn retrieve<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        match &self.slots[index] {
            Slot::Occupied(_, value) => Some(value),
            _ => None,
        }
    }

    pub fn retrieve_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        match &mut self.slots[index] {
            Slot::Occupied(_, value) => Some(value),
            _ => None,
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key).is_some()
    }

    /// Removes `key`, leaving a tombstone in its slot.
    /// Returns true if the key was found and removed, false otherwise
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.find_index(key) {
            Some(index) => {
                self.slots[index] = Slot::Deleted;
                self.count -= 1;
                self.tombstones += 1;
                true
            }
            None => false,
        }
    }

    /// Number of live entries; tombstones are not counted.
    pub fn size(&self) -> usize {
        self.count
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently holding a tombstone.
    pub fn tombstones(&self) -> usize {
        self.tombstones
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

    /// Iterates over live entries in slot order, which is not insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied(key, value) => Some((key, value)),
            _ => None,
        })
    }

    /// Follows the probe sequence for `key`, skipping tombstones and stopping
    /// at the first empty slot.
    fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let capacity = self.capacity();
        let hash = self.hasher.hash_one(key);

        for attempt in 0..capacity {
            let index = probe(hash, attempt, capacity);
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Occupied(existing, _) if existing.borrow() == key => return Some(index),
                Slot::Occupied(..) | Slot::Deleted => {}
            }
        }
        None
    }

    fn occupy(&mut self, index: usize, key: K, value: V) {
        if let Slot::Deleted = self.slots[index] {
            self.tombstones -= 1;
            trace!("reusing tombstone at slot {}", index);
        }
        self.slots[index] = Slot::Occupied(key, value);
        self.count += 1;
    }

    fn grow_if_needed(&mut self) {
        let capacity = self.capacity();
        if exceeds_threshold(self.count, capacity, self.load_factor_threshold) {
            let mut new_capacity = capacity * 2;
            while exceeds_threshold(self.count, new_capacity, self.load_factor_threshold) {
                new_capacity *= 2;
            }
            self.rehash(new_capacity);
        } else if self.tombstones > 0
            && exceeds_threshold(
                self.count + self.tombstones,
                capacity,
                self.load_factor_threshold,
            )
        {
            self.rehash(capacity);
        }
    }

    /// Rebuilds the slot array at `new_capacity` from the live entries only.
    fn rehash(&mut self, new_capacity: usize) {
        let old_capacity = self.capacity();
        let dropped = self.tombstones;
        let old_slots = mem::replace(&mut self.slots, empty_slots(new_capacity));

        for slot in old_slots {
            if let Slot::Occupied(key, value) = slot {
                let hash = self.hasher.hash_one(&key);
                let mut attempt = 0;
                loop {
                    debug_assert!(attempt < new_capacity, "no empty slot during rehash");
                    let index = probe(hash, attempt, new_capacity);
                    if let Slot::Empty = self.slots[index] {
                        self.slots[index] = Slot::Occupied(key, value);
                        break;
                    }
                    attempt += 1;
                }
            }
        }

        self.tombstones = 0;
        debug!(
            "open addressing table rehashed from {} to {} slots ({} entries, {} tombstones dropped)",
            old_capacity, new_capacity, self.count, dropped
        );
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> KeyValueTable<K, V> for OpenAddressingHashTable<K, V, S> {
    fn insert(&mut self, key: K, value: V) -> Result<Option<V>, HashTableError> {
        self.insert(key, value)
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

/// Slot for the given attempt: `(hash + attempt) mod capacity`.
fn probe(hash: u64, attempt: usize, capacity: usize) -> usize {
    debug_assert!(capacity != 0, "probing a table with zero capacity");
    ((hash % capacity as u64) as usize + attempt) % capacity
}

fn empty_slots<K, V>(capacity: usize) -> Vec<Slot<K, V>> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || Slot::Empty);
    slots
}

#[cfg(test)]
mod tests {
    use std::hash::{BuildHasher, Hasher};

    use super::*;
    use crate::hash_table::MIN_LOAD_FACTOR;

    // Same helper as tests/common/mod.rs; keep the two in sync.
    /// Uses an integer key as its own hash, so slot positions are predictable.
    #[derive(Clone, Copy, Default)]
    struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn finish(&self) -> u64 {
            self.0
        }

        fn write(&mut self, bytes: &[u8]) {
            for byte in bytes {
                self.0 = (self.0 << 8) | *byte as u64;
            }
        }

        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
    }

    #[derive(Clone, Copy, Default)]
    struct IdentityBuildHasher;

    impl BuildHasher for IdentityBuildHasher {
        type Hasher = IdentityHasher;

        fn build_hasher(&self) -> IdentityHasher {
            IdentityHasher(0)
        }
    }

    type TestTable = OpenAddressingHashTable<u64, &'static str, IdentityBuildHasher>;

    fn table(capacity: usize, threshold: f64) -> TestTable {
        OpenAddressingHashTable::with_hasher(capacity, threshold, IdentityBuildHasher).unwrap()
    }

    fn is_occupied_by(table: &TestTable, index: usize, key: u64) -> bool {
        matches!(&table.slots[index], Slot::Occupied(k, _) if *k == key)
    }

    #[test]
    fn test_probe_wraps_around() {
        assert_eq!(probe(6, 0, 8), 6);
        assert_eq!(probe(6, 1, 8), 7);
        assert_eq!(probe(6, 2, 8), 0);
        assert_eq!(probe(u64::MAX, 1, 8), 0);
    }

    #[test]
    fn test_collision_moves_to_next_slot() {
        let mut t = table(8, 0.75);
        t.insert(3, "a").unwrap();
        t.insert(11, "b").unwrap();

        assert!(is_occupied_by(&t, 3, 3));
        assert!(is_occupied_by(&t, 4, 11));
    }

    #[test]
    fn test_remove_leaves_tombstone() {
        let mut t = table(8, 0.75);
        t.insert(3, "a").unwrap();
        t.insert(11, "b").unwrap();

        assert!(t.remove(&3));
        assert!(matches!(t.slots[3], Slot::Deleted));
        assert_eq!(t.tombstones(), 1);
        assert_eq!(t.size(), 1);
        assert_eq!(t.retrieve(&11), Some(&"b"));
    }

    #[test]
    fn test_insert_reuses_first_tombstone() {
        let mut t = table(8, 0.75);
        t.insert(3, "a").unwrap();
        t.insert(11, "b").unwrap();
        t.remove(&3);

        assert_eq!(t.insert(19, "c").unwrap(), None);
        assert!(is_occupied_by(&t, 3, 19));
        assert_eq!(t.tombstones(), 0);
        assert_eq!(t.size(), 2);
    }

    #[test]
    fn test_reinsert_past_tombstone_overwrites_live_copy() {
        let mut t = table(8, 0.75);
        t.insert(3, "a").unwrap();
        t.insert(11, "b").unwrap();
        t.remove(&3);

        assert_eq!(t.insert(11, "b2").unwrap(), Some("b"));
        assert_eq!(t.size(), 1);
        assert!(matches!(t.slots[3], Slot::Deleted));
        assert_eq!(t.iter().filter(|(k, _)| **k == 11).count(), 1);
        assert_eq!(t.retrieve(&11), Some(&"b2"));
    }

    #[test]
    fn test_lookup_stops_at_empty_slot() {
        let mut t = table(8, 0.75);
        t.insert(3, "a").unwrap();
        // 11 would probe 3 then 4; slot 4 is empty so the search ends there
        assert_eq!(t.retrieve(&11), None);
        assert!(!t.remove(&11));
    }

    #[test]
    fn test_rehash_discards_tombstones() {
        let mut t = table(4, 0.75);
        t.insert(0, "a").unwrap();
        t.insert(1, "b").unwrap();
        t.insert(2, "c").unwrap();
        t.remove(&1);
        t.insert(3, "d").unwrap();
        assert_eq!(t.tombstones(), 1);

        // 3 live + 1 tombstone is above 0.75: rebuilt in place, then 5 takes slot 1
        t.insert(5, "e").unwrap();
        assert_eq!(t.capacity(), 4);
        assert_eq!(t.tombstones(), 0);
        assert!(is_occupied_by(&t, 1, 5));

        // 4 live entries in four slots; the next insert doubles first
        t.insert(6, "f").unwrap();
        assert_eq!(t.capacity(), 8);
        assert_eq!(t.tombstones(), 0);
        assert!(t.slots.iter().all(|s| !matches!(s, Slot::Deleted)));
        for key in [0, 2, 3, 5, 6] {
            assert!(t.contains_key(&key));
        }
    }

    #[test]
    fn test_tombstone_pressure_rebuilds_at_same_capacity() {
        let mut t = table(8, 0.75);
        for key in 0..6 {
            t.insert(key, "x").unwrap();
        }
        for key in 0..5 {
            t.remove(&key);
        }
        assert_eq!(t.tombstones(), 5);

        // 1 live + 5 tombstones = 6/8 is not above 0.75, so no rebuild yet
        t.insert(100, "y").unwrap();
        assert_eq!(t.tombstones(), 4);

        // reuse consumed one tombstone; add one more so 3 live + 4 tombstones = 7/8
        t.insert(7, "z").unwrap();
        assert_eq!(t.tombstones(), 4);
        assert_eq!(t.size(), 3);

        t.insert(200, "w").unwrap();
        assert_eq!(t.capacity(), 8);
        assert_eq!(t.tombstones(), 0);
        assert_eq!(t.size(), 4);
        for key in [5, 100, 7, 200] {
            assert!(t.contains_key(&key));
        }
    }

    #[test]
    fn test_full_table_fails_with_high_threshold() {
        let mut t = table(4, 1.0);
        for key in 0..4 {
            t.insert(key, "x").unwrap();
        }
        assert_eq!(t.capacity(), 4);

        let err = t.insert(9, "y").unwrap_err();
        assert_eq!(err, HashTableError::TableFull { capacity: 4 });
        assert_eq!(t.size(), 4);
        // overwrites still succeed on a full table
        assert_eq!(t.insert(2, "z").unwrap(), Some("x"));
    }

    #[test]
    fn test_full_table_with_tombstone_accepts_new_key() {
        let mut t = table(4, 1.0);
        for key in 0..4 {
            t.insert(key, "x").unwrap();
        }
        t.remove(&1);
        // 3 live + 1 tombstone = 4/4 is not above 1.0, so the tombstone is reused
        assert_eq!(t.insert(9, "y").unwrap(), None);
        assert!(is_occupied_by(&t, 1, 9));
    }

    #[test]
    fn test_threshold_below_floor_is_rejected() {
        assert!(matches!(
            OpenAddressingHashTable::<u64, ()>::with_capacity_and_load_factor(16, 1e-15),
            Err(HashTableError::InvalidLoadFactor(_))
        ));
    }

    #[test]
    fn test_lowest_threshold_grows_boundedly() {
        let mut t = table(1, MIN_LOAD_FACTOR);
        t.insert(1, "a").unwrap();
        // the check runs before probing, so one slot is enough for the first key
        assert_eq!(t.capacity(), 1);

        // 1/1 above 0.05: grows to 32 in one pass before probing
        t.insert(2, "b").unwrap();
        assert_eq!(t.capacity(), 32);
        assert_eq!(t.retrieve(&1), Some(&"a"));
        assert_eq!(t.retrieve(&2), Some(&"b"));
    }
}
