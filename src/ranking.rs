// 🏆 Ranking Engine - deterministic feed order
//
// Order: total_reviewer DESC, then average_rating DESC, then input order.
// `sort_by` is stable, which is what keeps equal keys in reconciliation order.

use crate::models::CatalogRecord;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default)]
pub struct RankingEngine;

impl RankingEngine {
    pub fn new() -> Self {
        RankingEngine
    }

    pub fn rank(&self, mut records: Vec<CatalogRecord>) -> Vec<CatalogRecord> {
        records.sort_by(Self::compare);
        records
    }

    /// Ordering between two records (Less = ranks first)
    pub fn compare(a: &CatalogRecord, b: &CatalogRecord) -> Ordering {
        b.total_reviewer
            .cmp(&a.total_reviewer)
            .then_with(|| rating_key(b.average_rating).total_cmp(&rating_key(a.average_rating)))
    }
}

// NaN ratings rank last instead of poisoning the comparison
fn rating_key(rating: f64) -> f64 {
    if rating.is_nan() {
        f64::NEG_INFINITY
    } else {
        rating
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{About, Address, NewCatalogRecord};
    use chrono::Utc;

    fn record(place_id: &str, reviewers: u64, rating: f64) -> CatalogRecord {
        let payload = NewCatalogRecord {
            name: place_id.to_string(),
            cover: String::new(),
            gallery: vec![],
            bar_type: "Bar".to_string(),
            crowd_meter: "Low".to_string(),
            about: About {
                address: Address {
                    place_name: String::new(),
                    location: None,
                },
                schedule: vec![],
            },
            total_reviewer: reviewers,
            average_rating: rating,
        };
        CatalogRecord::from_payload(place_id, payload, Utc::now())
    }

    fn order(records: &[CatalogRecord]) -> Vec<&str> {
        records.iter().map(|r| r.place_id.as_str()).collect()
    }

    #[test]
    fn test_reviewers_then_rating() {
        let engine = RankingEngine::new();
        let ranked = engine.rank(vec![
            record("A", 50, 4.2),
            record("B", 80, 3.9),
            record("C", 80, 4.5),
            record("D", 10, 5.0),
        ]);

        assert_eq!(order(&ranked), vec!["C", "B", "A", "D"]);
    }

    #[test]
    fn test_equal_keys_keep_input_order() {
        let engine = RankingEngine::new();
        let ranked = engine.rank(vec![
            record("first", 20, 4.0),
            record("top", 99, 1.0),
            record("second", 20, 4.0),
            record("third", 20, 4.0),
        ]);

        assert_eq!(order(&ranked), vec!["top", "first", "second", "third"]);
    }

    #[test]
    fn test_rank_is_non_increasing() {
        let engine = RankingEngine::new();
        let inputs: Vec<CatalogRecord> = (0..40u64)
            .map(|i| record(&format!("p{}", i), (i * 7) % 5, ((i * 3) % 4) as f64 + 0.5))
            .collect();

        let ranked = engine.rank(inputs);

        for pair in ranked.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.total_reviewer > b.total_reviewer
                    || (a.total_reviewer == b.total_reviewer && a.average_rating >= b.average_rating),
                "{} before {} breaks the order",
                a.place_id,
                b.place_id
            );
        }
    }

    #[test]
    fn test_nan_rating_ranks_after_real_ratings() {
        let engine = RankingEngine::new();
        let ranked = engine.rank(vec![record("nan", 10, f64::NAN), record("low", 10, 0.1)]);
        assert_eq!(order(&ranked), vec!["low", "nan"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(RankingEngine::new().rank(vec![]).is_empty());
    }
}
