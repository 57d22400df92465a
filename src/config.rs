use std::fs;
use std::hash::Hash;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::error::HashTableError;
use crate::hash_table::{
    ChainedHashTable, CollisionResolution, KeyValueTable, OpenAddressingHashTable,
    DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub table: TableConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub strategy: CollisionResolution,
    pub initial_capacity: usize,
    pub load_factor_threshold: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            strategy: CollisionResolution::Chaining,
            initial_capacity: DEFAULT_CAPACITY,
            load_factor_threshold: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl AppConfig {
    pub fn from_toml(content: &str) -> Result<AppConfig, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }
}

impl TableConfig {
    /// Builds the table this configuration describes.
    pub fn build<K, V>(&self) -> Result<Box<dyn KeyValueTable<K, V>>, HashTableError>
    where
        K: Hash + Eq + 'static,
        V: 'static,
    {
        Ok(match self.strategy {
            CollisionResolution::Chaining => Box::new(
                ChainedHashTable::with_capacity_and_load_factor(
                    self.initial_capacity,
                    self.load_factor_threshold,
                )?,
            ),
            CollisionResolution::LinearProbing => Box::new(
                OpenAddressingHashTable::with_capacity_and_load_factor(
                    self.initial_capacity,
                    self.load_factor_threshold,
                )?,
            ),
        })
    }
}
