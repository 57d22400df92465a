pub mod config;
pub mod error;
pub mod hash_table;
pub mod logger;

pub use config::{AppConfig, ConfigError, TableConfig};
pub use error::HashTableError;
pub use hash_table::{
    ChainedHashTable, CollisionResolution, KeyValueTable, OpenAddressingHashTable,
    RollingBuildHasher, RollingHasher, DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR, MIN_LOAD_FACTOR,
};
