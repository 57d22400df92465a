#![allow(dead_code)]

use std::hash::{BuildHasher, Hasher};

// Same helper as the unit tests in src/hash_table/open_addressing.rs; keep the two in sync.
/// Uses an integer key as its own hash so tests can line up collisions.
#[derive(Clone, Copy, Default)]
pub struct IdentityHasher(u64);

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
pub struct IdentityBuildHasher;

impl BuildHasher for IdentityBuildHasher {
    type Hasher = IdentityHasher;

    fn build_hasher(&self) -> IdentityHasher {
        IdentityHasher(0)
    }
}

/// Number of doublings needed to go from `initial` to `capacity`.
pub fn doublings(initial: usize, capacity: usize) -> u32 {
    (capacity / initial).trailing_zeros()
}
