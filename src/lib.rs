// Venue Feed - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod models;
pub mod error;
pub mod clock;
pub mod config;
pub mod schedule;       // Closing-time + date label resolution
pub mod ranking;        // Popularity ordering
pub mod fanout;         // Bounded, order-preserving concurrency
pub mod store;          // Catalog + favorites collaborators
pub mod db;             // SQLite persistence + audit trail
pub mod provider;       // Nearby-venue sources
pub mod builder;        // Venue → catalog payload
pub mod reconciliation; // Find-or-create against the catalog
pub mod feed;           // Top slice + paginated remainder
pub mod service;        // End-to-end home feed pipeline

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use models::{
    About, Address, CatalogRecord, FeedData, FeedPage, FeedResponse, FeedSummary, GeoPoint,
    NewCatalogRecord, Pagination, RankedRecord, ScheduleEntry, TopSummary, Venue,
    DEFAULT_LIMIT, DEFAULT_PAGE, SEARCH_RADIUS_METERS, TOP_SLICE_SIZE,
};
pub use error::FeedError;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::FeedConfig;
pub use schedule::{ScheduleLookup, ScheduleResolver};
pub use ranking::RankingEngine;
pub use fanout::{ordered_fan_out, try_ordered_fan_out};
pub use store::{CatalogStore, FavoriteStore, MemoryCatalogStore, MemoryFavoriteStore};
pub use db::{
    Event, SharedConnection, SqliteCatalogStore, SqliteFavoriteStore,
    setup_database, open_shared, open_shared_in_memory, upsert_record,
    find_records_by_place_ids, get_record_by_place_id, add_favorite, favorite_exists,
    insert_event, get_events_for_entity,
};
pub use provider::{JsonVenueProvider, VenueProvider};
pub use builder::{PlacesRecordBuilder, RecordBuilder};
pub use reconciliation::ReconciliationEngine;
pub use feed::{FeedAssembler, FeedQuery, FeedRequest};
pub use service::{FeedDependencies, FeedService, FeedSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
