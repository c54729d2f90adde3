// 🍸 Venue Feed Data Model
// Provider venues (transient), catalog records (persisted) and the two
// response views built from them per request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed search radius used for every feed query, in metres
pub const SEARCH_RADIUS_METERS: f64 = 3000.0;

/// Number of ranked records returned in the unpaginated top slice
pub const TOP_SLICE_SIZE: usize = 4;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// ============================================================================
// GEOGRAPHY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        GeoPoint { lat, lng }
    }

    /// Great-circle (haversine) distance in metres
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

// ============================================================================
// PROVIDER VENUE (transient)
// ============================================================================

/// Venue as returned by the external search provider.
/// Identity is the provider's `place_id`, nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub place_id: String,
    pub name: String,

    #[serde(default)]
    pub vicinity: Option<String>,

    #[serde(default)]
    pub location: Option<GeoPoint>,

    /// Provider place types, e.g. ["night_club", "bar", "establishment"]
    #[serde(default)]
    pub types: Vec<String>,

    #[serde(default)]
    pub rating: Option<f64>,

    #[serde(default)]
    pub user_ratings_total: Option<u64>,

    /// Photo URLs, first one is the cover
    #[serde(default)]
    pub photos: Vec<String>,

    /// Opening hours lines, e.g. "Friday: 6:00 PM – 2:00 AM"
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

// ============================================================================
// CATALOG RECORD (persisted)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Weekday abbreviation ("Mon", "Tue", ...)
    pub day: String,

    /// "<open>–<close>" range, en-dash separated
    #[serde(default)]
    pub time: String,
}

impl ScheduleEntry {
    pub fn new(day: &str, time: &str) -> Self {
        ScheduleEntry {
            day: day.to_string(),
            time: time.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub place_name: String,

    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct About {
    pub address: Address,

    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
}

/// Payload produced by a `RecordBuilder`, persisted by `CatalogStore::upsert`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCatalogRecord {
    pub name: String,
    pub cover: String,
    pub gallery: Vec<String>,
    pub bar_type: String,
    pub crowd_meter: String,
    pub about: About,
    pub total_reviewer: u64,
    pub average_rating: f64,
}

/// Persisted catalog entry. At most one per `place_id` (storage-enforced).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Stable identity assigned at creation
    pub id: String,
    pub place_id: String,
    pub name: String,
    pub cover: String,
    pub gallery: Vec<String>,
    pub bar_type: String,
    pub crowd_meter: String,
    pub about: About,
    pub total_reviewer: u64,
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
}

impl CatalogRecord {
    /// Materialize a builder payload into a record with a fresh identity
    pub fn from_payload(place_id: &str, payload: NewCatalogRecord, created_at: DateTime<Utc>) -> Self {
        CatalogRecord {
            id: uuid::Uuid::new_v4().to_string(),
            place_id: place_id.to_string(),
            name: payload.name,
            cover: payload.cover,
            gallery: payload.gallery,
            bar_type: payload.bar_type,
            crowd_meter: payload.crowd_meter,
            about: payload.about,
            total_reviewer: payload.total_reviewer,
            average_rating: payload.average_rating,
            created_at,
        }
    }
}

// ============================================================================
// DERIVED VIEWS (per request, never persisted)
// ============================================================================

/// Catalog record plus the time-dependent display fields
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRecord {
    pub record: CatalogRecord,
    pub current_date: String,
    /// Empty when today has no usable schedule entry
    pub close_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub cover: String,
    pub bar_type: String,
    pub name: String,
    pub crowd_meter: String,
    pub current_date: String,
    pub close_time: String,
}

impl From<&RankedRecord> for TopSummary {
    fn from(ranked: &RankedRecord) -> Self {
        let record = &ranked.record;
        TopSummary {
            id: record.id.clone(),
            cover: record.cover.clone(),
            bar_type: record.bar_type.clone(),
            name: record.name.clone(),
            crowd_meter: record.crowd_meter.clone(),
            current_date: ranked.current_date.clone(),
            close_time: ranked.close_time.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSummary {
    #[serde(rename = "_id")]
    pub id: String,
    /// Cover first, then the record's gallery
    pub gallery: Vec<String>,
    pub bar_type: String,
    pub name: String,
    pub address: String,
    pub current_date: String,
    /// Time range of the first schedule entry, empty if none
    pub time: String,
    pub is_favorite: bool,
}

impl FeedSummary {
    pub fn from_ranked(ranked: &RankedRecord, is_favorite: bool) -> Self {
        let record = &ranked.record;
        let mut gallery = Vec::with_capacity(record.gallery.len() + 1);
        gallery.push(record.cover.clone());
        gallery.extend(record.gallery.iter().cloned());

        FeedSummary {
            id: record.id.clone(),
            gallery,
            bar_type: record.bar_type.clone(),
            name: record.name.clone(),
            address: record.about.address.place_name.clone(),
            current_date: ranked.current_date.clone(),
            time: record
                .about
                .schedule
                .first()
                .map(|entry| entry.time.clone())
                .unwrap_or_default(),
            is_favorite,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Output of the feed assembler
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub top: Vec<TopSummary>,
    pub bars: Vec<FeedSummary>,
    pub pagination: Pagination,
}

// ============================================================================
// RESPONSE ENVELOPE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedData {
    pub top: Vec<TopSummary>,
    pub bars: Vec<FeedSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedResponse {
    pub success: bool,
    pub message: String,
    pub data: FeedData,
    pub pagination: Pagination,
}

impl FeedResponse {
    pub const SUCCESS_MESSAGE: &'static str = "Bars retrieved successfully.";

    pub fn ok(page: FeedPage) -> Self {
        FeedResponse {
            success: true,
            message: Self::SUCCESS_MESSAGE.to_string(),
            data: FeedData {
                top: page.top,
                bars: page.bars,
            },
            pagination: page.pagination,
        }
    }
}
