// 📰 Feed Assembler - top slice + paginated, favorite-annotated remainder
//
// Query validation lives here too: it runs before any I/O.

use crate::error::{FeedError, Result};
use crate::fanout::ordered_fan_out;
use crate::models::{
    FeedPage, FeedSummary, GeoPoint, Pagination, RankedRecord, TopSummary, DEFAULT_LIMIT, DEFAULT_PAGE,
    TOP_SLICE_SIZE,
};
use crate::store::FavoriteStore;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

// ============================================================================
// QUERY VALIDATION
// ============================================================================

/// Raw query parameters as received from the transport layer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl FeedQuery {
    pub fn new(lat: &str, lng: &str) -> Self {
        FeedQuery {
            lat: Some(lat.to_string()),
            lng: Some(lng.to_string()),
            page: None,
            limit: None,
        }
    }

    pub fn with_page(mut self, page: usize, limit: usize) -> Self {
        self.page = Some(page.to_string());
        self.limit = Some(limit.to_string());
        self
    }

    /// Coordinates must parse as finite numbers. Zero is a valid coordinate.
    pub fn validate(&self) -> Result<FeedRequest> {
        let lat = parse_coordinate(self.lat.as_deref()).ok_or_else(FeedError::coordinates_required)?;
        let lng = parse_coordinate(self.lng.as_deref()).ok_or_else(FeedError::coordinates_required)?;

        Ok(FeedRequest {
            origin: GeoPoint::new(lat, lng),
            page: parse_positive(self.page.as_deref()).unwrap_or(DEFAULT_PAGE),
            limit: parse_positive(self.limit.as_deref()).unwrap_or(DEFAULT_LIMIT),
        })
    }
}

fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_positive(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|v| *v >= 1)
}

/// Validated request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedRequest {
    pub origin: GeoPoint,
    pub page: usize,
    pub limit: usize,
}

// ============================================================================
// ASSEMBLER
// ============================================================================

pub struct FeedAssembler {
    favorites: Arc<dyn FavoriteStore>,

    /// Max concurrent favorite lookups (0 = unbounded)
    pub max_concurrency: usize,
}

impl FeedAssembler {
    pub fn new(favorites: Arc<dyn FavoriteStore>) -> Self {
        FeedAssembler {
            favorites,
            max_concurrency: 0,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub async fn assemble(&self, ranked: Vec<RankedRecord>, user_id: &str, page: usize, limit: usize) -> FeedPage {
        let page = page.max(1);
        let limit = limit.max(1);

        let split = ranked.len().min(TOP_SLICE_SIZE);
        let top: Vec<TopSummary> = ranked[..split].iter().map(TopSummary::from).collect();
        let remainder = &ranked[split..];

        let enriched = self.enrich(remainder, user_id).await;

        let total = enriched.len();
        let skip = (page - 1).saturating_mul(limit);
        let bars: Vec<FeedSummary> = enriched.into_iter().skip(skip).take(limit).collect();

        FeedPage {
            top,
            bars,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages: total.div_ceil(limit),
            },
        }
    }

    /// Favorite lookups for every remainder item, results kept in rank order.
    /// A failed lookup marks that item as not favorite and is logged.
    async fn enrich(&self, remainder: &[RankedRecord], user_id: &str) -> Vec<FeedSummary> {
        let favorites = &self.favorites;

        ordered_fan_out(remainder.iter(), self.max_concurrency, |ranked| async move {
            let is_favorite = match favorites.exists(user_id, &ranked.record.id).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(
                        user_id,
                        record_id = %ranked.record.id,
                        error = %e,
                        "favorite lookup failed, defaulting to not favorite"
                    );
                    false
                }
            };
            FeedSummary::from_ranked(ranked, is_favorite)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{About, Address, CatalogRecord, NewCatalogRecord, ScheduleEntry};
    use crate::store::MemoryFavoriteStore;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration;

    fn ranked(name: &str) -> RankedRecord {
        let payload = NewCatalogRecord {
            name: name.to_string(),
            cover: format!("{}.jpg", name),
            gallery: vec![],
            bar_type: "Bar".to_string(),
            crowd_meter: "Low".to_string(),
            about: About {
                address: Address {
                    place_name: format!("{} street", name),
                    location: None,
                },
                schedule: vec![ScheduleEntry::new("Fri", "18:00–02:00")],
            },
            total_reviewer: 1,
            average_rating: 1.0,
        };
        RankedRecord {
            record: CatalogRecord::from_payload(name, payload, Utc::now()),
            current_date: "Fri, Oct 17, 2025".to_string(),
            close_time: "02:00".to_string(),
        }
    }

    fn ranked_list(n: usize) -> Vec<RankedRecord> {
        (0..n).map(|i| ranked(&format!("r{:02}", i))).collect()
    }

    fn names(bars: &[FeedSummary]) -> Vec<&str> {
        bars.iter().map(|b| b.name.as_str()).collect()
    }

    /// Slow for early records, fails for one record id
    struct FlakyFavorites {
        failing_record: String,
        favorite_record: String,
    }

    #[async_trait]
    impl FavoriteStore for FlakyFavorites {
        async fn exists(&self, _user_id: &str, record_id: &str) -> anyhow::Result<bool> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if record_id == self.failing_record {
                return Err(anyhow!("favorites backend timeout"));
            }
            Ok(record_id == self.favorite_record)
        }
    }

    // ------------------------------------------------------------------------
    // validation
    // ------------------------------------------------------------------------

    #[test]
    fn test_zero_coordinates_are_valid() {
        let request = FeedQuery::new("0", "0").validate().unwrap();
        assert_eq!(request.origin, GeoPoint::new(0.0, 0.0));

        assert!(FeedQuery::new("0.0", "-73.98").validate().is_ok());
        assert!(FeedQuery::new("40.75", "0").validate().is_ok());
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        for (lat, lng) in [("abc", "1"), ("1", ""), ("NaN", "1"), ("1", "inf"), ("-infinity", "2")] {
            let err = FeedQuery::new(lat, lng).validate().unwrap_err();
            assert!(err.is_validation(), "{} / {} should be rejected", lat, lng);
            assert_eq!(err.to_string(), "Latitude and longitude are required.");
        }

        let missing = FeedQuery::default().validate().unwrap_err();
        assert!(missing.is_validation());
    }

    #[test]
    fn test_page_and_limit_defaults() {
        let request = FeedQuery::new("1", "2").validate().unwrap();
        assert_eq!((request.page, request.limit), (1, 10));

        let mut query = FeedQuery::new("1", "2");
        query.page = Some("0".to_string());
        query.limit = Some("abc".to_string());
        let request = query.validate().unwrap();
        assert_eq!((request.page, request.limit), (1, 10));

        let request = FeedQuery::new("1", "2").with_page(3, 25).validate().unwrap();
        assert_eq!((request.page, request.limit), (3, 25));
    }

    // ------------------------------------------------------------------------
    // assembly
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_fewer_than_four_records_all_go_to_top() {
        let assembler = FeedAssembler::new(Arc::new(MemoryFavoriteStore::new()));
        let page = assembler.assemble(ranked_list(3), "u", 1, 10).await;

        assert_eq!(page.top.len(), 3);
        assert!(page.bars.is_empty());
        assert_eq!(page.pagination.total, 0);
        assert_eq!(page.pagination.total_pages, 0);
    }

    #[tokio::test]
    async fn test_pagination_over_remainder() {
        let assembler = FeedAssembler::new(Arc::new(MemoryFavoriteStore::new())).with_max_concurrency(3);
        let records = ranked_list(4 + 23);

        let first = assembler.assemble(records.clone(), "u", 1, 10).await;
        assert_eq!(first.top.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(), vec!["r00", "r01", "r02", "r03"]);
        assert_eq!(names(&first.bars)[0], "r04");
        assert_eq!(first.bars.len(), 10);
        assert_eq!(first.pagination.total, 23);
        assert_eq!(first.pagination.total_pages, 3);

        let last = assembler.assemble(records.clone(), "u", 3, 10).await;
        assert_eq!(names(&last.bars), vec!["r24", "r25", "r26"]);

        let beyond = assembler.assemble(records, "u", 4, 10).await;
        assert!(beyond.bars.is_empty());
        assert_eq!(beyond.pagination.total, 23);
    }

    #[tokio::test]
    async fn test_bars_length_property() {
        let assembler = FeedAssembler::new(Arc::new(MemoryFavoriteStore::new()));

        for n in [0usize, 4, 5, 9, 17] {
            for limit in [1usize, 3, 10] {
                for page in [1usize, 2, 5] {
                    let out = assembler.assemble(ranked_list(n), "u", page, limit).await;
                    let total = n.saturating_sub(4);
                    let skip = (page - 1) * limit;
                    assert_eq!(out.bars.len(), limit.min(total.saturating_sub(skip)));
                    assert_eq!(out.pagination.total, total);
                    assert_eq!(out.pagination.total_pages, (total + limit - 1) / limit);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_huge_page_does_not_overflow() {
        let assembler = FeedAssembler::new(Arc::new(MemoryFavoriteStore::new()));
        let out = assembler.assemble(ranked_list(8), "u", usize::MAX, usize::MAX).await;
        assert!(out.bars.is_empty());
        assert_eq!(out.pagination.total_pages, 1);
    }

    #[tokio::test]
    async fn test_favorites_annotated_per_user() {
        let records = ranked_list(6);
        let favorites = MemoryFavoriteStore::new();
        favorites.add("alice", &records[5].record.id).unwrap();

        let assembler = FeedAssembler::new(Arc::new(favorites));

        let alice = assembler.assemble(records.clone(), "alice", 1, 10).await;
        assert_eq!(alice.bars.iter().map(|b| b.is_favorite).collect::<Vec<_>>(), vec![false, true]);

        let bob = assembler.assemble(records, "bob", 1, 10).await;
        assert!(bob.bars.iter().all(|b| !b.is_favorite));
    }

    #[tokio::test]
    async fn test_failed_favorite_lookup_is_isolated() {
        let records = ranked_list(8);
        let favorites = FlakyFavorites {
            failing_record: records[5].record.id.clone(),
            favorite_record: records[6].record.id.clone(),
        };
        let assembler = FeedAssembler::new(Arc::new(favorites));

        let page = assembler.assemble(records, "u", 1, 10).await;

        assert_eq!(names(&page.bars), vec!["r04", "r05", "r06", "r07"]);
        assert_eq!(
            page.bars.iter().map(|b| b.is_favorite).collect::<Vec<_>>(),
            vec![false, false, true, false]
        );
    }
}
