//! Venue provider abstraction
//!
//! The feed only needs "venues near a point". The real search provider's
//! network client lives outside this crate; `JsonVenueProvider` serves a
//! recorded provider response from disk for local runs.

use crate::models::{GeoPoint, Venue};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

#[async_trait]
pub trait VenueProvider: Send + Sync {
    /// Venues within `radius_meters` of `origin`, in provider order
    async fn fetch_nearby(&self, origin: GeoPoint, radius_meters: f64) -> Result<Vec<Venue>>;

    /// Provider name for logging and debugging
    fn provider_name(&self) -> &str;
}

/// Serves venues from a JSON array file (a recorded provider response).
///
/// Venues carrying a location are filtered by distance; venues without one
/// are passed through as the upstream provider returned them.
#[derive(Debug, Clone)]
pub struct JsonVenueProvider {
    path: PathBuf,
}

impl JsonVenueProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonVenueProvider { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(path: &Path) -> Result<Vec<Venue>> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read venues file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse venues file {}", path.display()))
    }
}

pub fn within_radius(venues: Vec<Venue>, origin: GeoPoint, radius_meters: f64) -> Vec<Venue> {
    venues
        .into_iter()
        .filter(|venue| match venue.location {
            Some(location) => origin.distance_to(&location) <= radius_meters,
            None => true,
        })
        .collect()
}

#[async_trait]
impl VenueProvider for JsonVenueProvider {
    async fn fetch_nearby(&self, origin: GeoPoint, radius_meters: f64) -> Result<Vec<Venue>> {
        let path = self.path.clone();
        let venues = tokio::task::spawn_blocking(move || Self::load(&path))
            .await
            .context("venue file task failed")??;

        let total = venues.len();
        let nearby = within_radius(venues, origin, radius_meters);
        debug!(total, nearby = nearby.len(), radius_meters, "venues loaded from file");

        Ok(nearby)
    }

    fn provider_name(&self) -> &str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn venue(place_id: &str, location: Option<GeoPoint>) -> Venue {
        Venue {
            place_id: place_id.to_string(),
            name: place_id.to_uppercase(),
            vicinity: None,
            location,
            types: vec![],
            rating: None,
            user_ratings_total: None,
            photos: vec![],
            weekday_text: vec![],
        }
    }

    #[test]
    fn test_within_radius_filters_far_venues() {
        let origin = GeoPoint::new(51.5074, -0.1278);
        let venues = vec![
            venue("near", Some(GeoPoint::new(51.5080, -0.1280))),
            venue("far", Some(GeoPoint::new(51.6000, -0.1278))),
            venue("unknown", None),
        ];

        let nearby = within_radius(venues, origin, 3000.0);
        let ids: Vec<&str> = nearby.iter().map(|v| v.place_id.as_str()).collect();

        assert_eq!(ids, vec!["near", "unknown"]);
    }

    #[tokio::test]
    async fn test_json_provider_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"place_id": "p1", "name": "One", "location": {{"lat": 0.0, "lng": 0.0}}, "rating": 4.5}},
                {{"place_id": "p2", "name": "Two", "location": {{"lat": 10.0, "lng": 10.0}}}}
            ]"#
        )
        .unwrap();

        let provider = JsonVenueProvider::new(file.path());
        let venues = provider.fetch_nearby(GeoPoint::new(0.0, 0.0), 3000.0).await.unwrap();

        assert_eq!(venues.len(), 1);
        assert_eq!(venues[0].place_id, "p1");
        assert_eq!(venues[0].rating, Some(4.5));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let provider = JsonVenueProvider::new("/definitely/not/here.json");
        assert!(provider.fetch_nearby(GeoPoint::new(0.0, 0.0), 3000.0).await.is_err());
    }
}
