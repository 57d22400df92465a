use thiserror::Error;

/// Faults raised by the hash tables.
///
/// A missing key is never an error: lookups return `None` and removals
/// return `false`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HashTableError {
    #[error("hash table capacity must be non-zero")]
    ZeroCapacity,
    #[error("load factor threshold must be a finite number of at least 0.05, got {0}")]
    InvalidLoadFactor(f64),
    #[error("hash table is full ({capacity} slots probed)")]
    TableFull { capacity: usize },
}
