use crate::models::{CatalogRecord, NewCatalogRecord};
use crate::store::{CatalogStore, FavoriteStore};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const RECORD_COLUMNS: &str = "record_id, place_id, name, cover, gallery, bar_type, crowd_meter,
     about, total_reviewer, average_rating, created_at";

/// Event for audit trail ("every change is an event")
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;

    // ==========================================================================
    // Catalog Table
    // place_id UNIQUE is what makes find-or-create safe across requests
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS catalog_records (
            record_id TEXT PRIMARY KEY,
            place_id TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            cover TEXT NOT NULL,
            gallery TEXT NOT NULL,
            bar_type TEXT NOT NULL,
            crowd_meter TEXT NOT NULL,
            about TEXT NOT NULL,
            total_reviewer INTEGER NOT NULL DEFAULT 0,
            average_rating REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Favorites Table (existence-only membership)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS favorites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            record_id TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(user_id, record_id)
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn row_to_record(row: &Row) -> rusqlite::Result<CatalogRecord> {
    let gallery_json: String = row.get(4)?;
    let about_json: String = row.get(7)?;
    let total_reviewer: i64 = row.get(8)?;
    let created_at_str: String = row.get(10)?;

    Ok(CatalogRecord {
        id: row.get(0)?,
        place_id: row.get(1)?,
        name: row.get(2)?,
        cover: row.get(3)?,
        gallery: serde_json::from_str(&gallery_json).map_err(|e| conversion_error(4, e))?,
        bar_type: row.get(5)?,
        crowd_meter: row.get(6)?,
        about: serde_json::from_str(&about_json).map_err(|e| conversion_error(7, e))?,
        total_reviewer: u64::try_from(total_reviewer).unwrap_or(0),
        average_rating: row.get(9)?,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| conversion_error(10, e))?
            .with_timezone(&Utc),
    })
}

/// Atomic find-or-create of a catalog record.
///
/// `INSERT ... ON CONFLICT(place_id) DO NOTHING` then read back by place_id,
/// both inside one transaction. A creation event is logged only when the
/// insert actually wrote a row.
pub fn upsert_record(
    conn: &mut Connection,
    place_id: &str,
    payload: NewCatalogRecord,
) -> Result<CatalogRecord> {
    let candidate = CatalogRecord::from_payload(place_id, payload, Utc::now());
    let gallery_json = serde_json::to_string(&candidate.gallery)?;
    let about_json = serde_json::to_string(&candidate.about)?;

    let tx = conn.transaction()?;

    let inserted = tx.execute(
        "INSERT INTO catalog_records (
            record_id, place_id, name, cover, gallery, bar_type, crowd_meter,
            about, total_reviewer, average_rating, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(place_id) DO NOTHING",
        params![
            candidate.id,
            candidate.place_id,
            candidate.name,
            candidate.cover,
            gallery_json,
            candidate.bar_type,
            candidate.crowd_meter,
            about_json,
            i64::try_from(candidate.total_reviewer).unwrap_or(i64::MAX),
            candidate.average_rating,
            candidate.created_at.to_rfc3339(),
        ],
    )?;

    if inserted == 1 {
        let event = Event::new(
            "catalog_record_created",
            "catalog_record",
            place_id,
            serde_json::json!({
                "record_id": candidate.id,
                "name": candidate.name,
            }),
            "reconciliation",
        );
        insert_event(&tx, &event)?;
        info!(place_id, record_id = %candidate.id, "catalog record created");
    } else {
        debug!(place_id, "catalog record already present");
    }

    let record = tx
        .query_row(
            &format!("SELECT {} FROM catalog_records WHERE place_id = ?1", RECORD_COLUMNS),
            [place_id],
            row_to_record,
        )
        .with_context(|| format!("Failed to read back catalog record {}", place_id))?;

    tx.commit()?;

    Ok(record)
}

/// Bulk lookup of catalog records by place id (single query)
pub fn find_records_by_place_ids(conn: &Connection, place_ids: &[String]) -> Result<Vec<CatalogRecord>> {
    if place_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; place_ids.len()].join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM catalog_records WHERE place_id IN ({})",
        RECORD_COLUMNS, placeholders
    ))?;

    let records = stmt
        .query_map(params_from_iter(place_ids.iter()), row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

pub fn get_record_by_place_id(conn: &Connection, place_id: &str) -> Result<Option<CatalogRecord>> {
    let record = conn
        .query_row(
            &format!("SELECT {} FROM catalog_records WHERE place_id = ?1", RECORD_COLUMNS),
            [place_id],
            row_to_record,
        )
        .optional()?;

    Ok(record)
}

pub fn count_records(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM catalog_records", [], |row| row.get(0))?;

    Ok(count)
}

pub fn count_records_for_place(conn: &Connection, place_id: &str) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM catalog_records WHERE place_id = ?1",
        [place_id],
        |row| row.get(0),
    )?;

    Ok(count)
}

/// Mark a record as favorite for a user. Returns false if it already was.
pub fn add_favorite(conn: &Connection, user_id: &str, record_id: &str) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO favorites (user_id, record_id) VALUES (?1, ?2)
         ON CONFLICT(user_id, record_id) DO NOTHING",
        params![user_id, record_id],
    )?;

    Ok(inserted == 1)
}

pub fn favorite_exists(conn: &Connection, user_id: &str, record_id: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = ?1 AND record_id = ?2)",
        params![user_id, record_id],
        |row| row.get(0),
    )?;

    Ok(exists)
}

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|e| conversion_error(1, e))?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| conversion_error(5, e))?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// ASYNC STORE ADAPTERS
// ============================================================================

/// Shared SQLite handle; all access goes through a blocking task
pub type SharedConnection = Arc<Mutex<Connection>>;

pub fn open_shared(path: &Path) -> Result<SharedConnection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    setup_database(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub fn open_shared_in_memory() -> Result<SharedConnection> {
    let conn = Connection::open_in_memory()?;
    setup_database(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

async fn with_connection<T, F>(conn: &SharedConnection, f: F) -> Result<T>
where
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let conn = Arc::clone(conn);
    tokio::task::spawn_blocking(move || {
        let mut guard = conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))?;
        f(&mut *guard)
    })
    .await
    .context("database task failed")?
}

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: SharedConnection,
}

impl SqliteCatalogStore {
    pub fn new(conn: SharedConnection) -> Self {
        SqliteCatalogStore { conn }
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn find_by_place_ids(&self, place_ids: &[String]) -> Result<Vec<CatalogRecord>> {
        let place_ids = place_ids.to_vec();
        with_connection(&self.conn, move |conn| find_records_by_place_ids(conn, &place_ids)).await
    }

    async fn upsert(&self, place_id: &str, payload: NewCatalogRecord) -> Result<CatalogRecord> {
        let place_id = place_id.to_string();
        with_connection(&self.conn, move |conn| upsert_record(conn, &place_id, payload)).await
    }
}

#[derive(Clone)]
pub struct SqliteFavoriteStore {
    conn: SharedConnection,
}

impl SqliteFavoriteStore {
    pub fn new(conn: SharedConnection) -> Self {
        SqliteFavoriteStore { conn }
    }
}

#[async_trait]
impl FavoriteStore for SqliteFavoriteStore {
    async fn exists(&self, user_id: &str, record_id: &str) -> Result<bool> {
        let user_id = user_id.to_string();
        let record_id = record_id.to_string();
        with_connection(&self.conn, move |conn| favorite_exists(conn, &user_id, &record_id)).await
    }
}
