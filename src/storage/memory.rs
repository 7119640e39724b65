use super::AtlasStore;
use crate::types::{OverlapQuery, QtlRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<QtlRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<QtlRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

fn poisoned() -> Error {
    Error::Internal("memory store lock poisoned".to_string())
}

#[async_trait]
impl AtlasStore for MemoryStore {
    async fn replace_all(&self, records: Vec<QtlRecord>) -> Result<usize> {
        let mut guard = self.records.write().map_err(|_| poisoned())?;
        *guard = records;
        Ok(guard.len())
    }

    async fn overlapping(&self, query: &OverlapQuery) -> Result<Vec<QtlRecord>> {
        let guard = self.records.read().map_err(|_| poisoned())?;
        let mut matches: Vec<QtlRecord> =
            guard.iter().filter(|r| query.matches(r)).cloned().collect();
        matches.sort_by_key(|r| r.id);
        Ok(matches)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().map_err(|_| poisoned())?.len())
    }
}
