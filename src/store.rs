// 🗄️ Store collaborators - catalog and favorites
//
// The engines only see these traits. SQLite implementations live in `db`;
// the in-memory ones here back tests and the CLI dry runs.

use crate::models::{CatalogRecord, NewCatalogRecord};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// One bulk lookup; unknown ids are simply absent from the result
    async fn find_by_place_ids(&self, place_ids: &[String]) -> Result<Vec<CatalogRecord>>;

    /// Atomic find-or-create keyed by `place_id`.
    /// When a record already exists it is returned untouched and `payload` is discarded.
    async fn upsert(&self, place_id: &str, payload: NewCatalogRecord) -> Result<CatalogRecord>;
}

#[async_trait]
pub trait FavoriteStore: Send + Sync {
    async fn exists(&self, user_id: &str, record_id: &str) -> Result<bool>;
}

// ============================================================================
// IN-MEMORY CATALOG
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    records: RwLock<HashMap<String, CatalogRecord>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<CatalogRecord>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.records.write() {
            for record in records {
                map.insert(record.place_id.clone(), record);
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, place_id: &str) -> Option<CatalogRecord> {
        self.records.read().ok()?.get(place_id).cloned()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn find_by_place_ids(&self, place_ids: &[String]) -> Result<Vec<CatalogRecord>> {
        let map = self
            .records
            .read()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;

        Ok(place_ids.iter().filter_map(|id| map.get(id).cloned()).collect())
    }

    async fn upsert(&self, place_id: &str, payload: NewCatalogRecord) -> Result<CatalogRecord> {
        let mut map = self
            .records
            .write()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;

        let record = map
            .entry(place_id.to_string())
            .or_insert_with(|| CatalogRecord::from_payload(place_id, payload, Utc::now()));

        Ok(record.clone())
    }
}

// ============================================================================
// IN-MEMORY FAVORITES
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryFavoriteStore {
    memberships: RwLock<HashSet<(String, String)>>,
}

impl MemoryFavoriteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, user_id: &str, record_id: &str) -> Result<()> {
        self.memberships
            .write()
            .map_err(|_| anyhow!("favorites lock poisoned"))?
            .insert((user_id.to_string(), record_id.to_string()));
        Ok(())
    }
}

#[async_trait]
impl FavoriteStore for MemoryFavoriteStore {
    async fn exists(&self, user_id: &str, record_id: &str) -> Result<bool> {
        let set = self
            .memberships
            .read()
            .map_err(|_| anyhow!("favorites lock poisoned"))?;

        Ok(set.contains(&(user_id.to_string(), record_id.to_string())))
    }
}
