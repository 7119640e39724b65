//! Storage backend abstraction for the QTL atlas table.
//!
//! The builder writes through [`AtlasStore::replace_all`] and the query engine
//! reads through [`AtlasStore::overlapping`]. Handles are passed in explicitly,
//! so tests can run against an isolated in-memory store.
//!
//! # Implementations
//!
//! - [`SqliteStore`] - SQLite database file (or in-memory database)
//! - [`MemoryStore`] - plain vector, evaluates [`OverlapQuery::matches`] directly
//!
//! # Example
//!
//! ```no_run
//! use qtl_atlas::storage::{AtlasStore, SqliteStore};
//!
//! # async fn demo() -> qtl_atlas::Result<()> {
//! let store = SqliteStore::open("SorghumQtlAtlas.db", "atlas")?;
//! println!("{} QTL records", store.count().await?);
//! # Ok(())
//! # }
//! ```

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::types::{OverlapQuery, QtlRecord};
use crate::{Error, Result};
use async_trait::async_trait;

/// Default table name written by the builder
pub const DEFAULT_TABLE: &str = "atlas";

/// Storage backend trait for the atlas table
#[async_trait]
pub trait AtlasStore: Send + Sync {
    /// Drop any existing table contents and store `records` in order.
    /// Returns the number of rows written.
    async fn replace_all(&self, records: Vec<QtlRecord>) -> Result<usize>;

    /// Records matching the query, ordered by row id
    async fn overlapping(&self, query: &OverlapQuery) -> Result<Vec<QtlRecord>>;

    /// Number of stored records
    async fn count(&self) -> Result<usize>;
}

/// Table names are interpolated into SQL, so only plain identifiers are accepted
pub fn validate_table_name(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::Config(format!("invalid table name {:?}", table)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_table_name() {
        for name in ["atlas", "leaf", "_tmp", "Atlas_v3"] {
            assert!(validate_table_name(name).is_ok(), "{name}");
        }
        for name in ["", "3atlas", "atlas; DROP TABLE x", "a\"b", "stem-morphology"] {
            assert!(validate_table_name(name).is_err(), "{name}");
        }
    }
}
