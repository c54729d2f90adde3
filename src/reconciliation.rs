// ⚖️ Reconciliation Engine - provider venues against the persisted catalog
//
// 1. collect place ids
// 2. one bulk catalog lookup
// 3. place_id → existing record map
// 4. per venue, concurrently: hit → existing record, miss → build + atomic upsert
//
// Output is index-aligned with the input venues. Any lookup, build or upsert
// failure aborts the whole reconciliation.

use crate::builder::RecordBuilder;
use crate::error::{FeedError, Result};
use crate::fanout::try_ordered_fan_out;
use crate::models::{CatalogRecord, GeoPoint, Venue};
use crate::store::CatalogStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub struct ReconciliationEngine {
    store: Arc<dyn CatalogStore>,
    builder: Arc<dyn RecordBuilder>,

    /// Max concurrent build+upsert branches (0 = unbounded)
    pub max_concurrency: usize,
}

impl ReconciliationEngine {
    pub fn new(store: Arc<dyn CatalogStore>, builder: Arc<dyn RecordBuilder>) -> Self {
        ReconciliationEngine {
            store,
            builder,
            max_concurrency: 0,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Reconcile venues with the catalog; `output[i]` corresponds to `venues[i]`
    pub async fn reconcile(&self, venues: &[Venue], origin: GeoPoint) -> Result<Vec<CatalogRecord>> {
        if venues.is_empty() {
            return Ok(Vec::new());
        }

        let place_ids: Vec<String> = venues.iter().map(|v| v.place_id.clone()).collect();

        let existing = self
            .store
            .find_by_place_ids(&place_ids)
            .await
            .map_err(|e| FeedError::dependency("catalog lookup", e))?;

        let existing: HashMap<String, CatalogRecord> = existing
            .into_iter()
            .map(|record| (record.place_id.clone(), record))
            .collect();

        let misses = venues
            .iter()
            .filter(|v| !existing.contains_key(&v.place_id))
            .count();
        debug!(
            venues = venues.len(),
            hits = venues.len() - misses,
            misses,
            "catalog lookup complete"
        );

        let existing = &existing;
        let records = try_ordered_fan_out(venues.iter(), self.max_concurrency, |venue| async move {
            match existing.get(&venue.place_id) {
                Some(record) => Ok(record.clone()),
                None => self.create_missing(venue, origin).await,
            }
        })
        .await?;

        if misses > 0 {
            info!(created_or_found = misses, "reconciled catalog misses");
        }

        Ok(records)
    }

    async fn create_missing(&self, venue: &Venue, origin: GeoPoint) -> Result<CatalogRecord> {
        let payload = self
            .builder
            .build(venue, origin)
            .await
            .map_err(|e| FeedError::dependency(format!("building record for {}", venue.place_id), e))?;

        self.store
            .upsert(&venue.place_id, payload)
            .await
            .map_err(|e| FeedError::dependency(format!("catalog upsert for {}", venue.place_id), e))
    }
}
