#![forbid(unsafe_code)]

use geo::Coord;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use snappoint_core::{Place, PlaceDraft, PlaceMetadata};

use super::SqliteStoreError;

/// Version written to `snappoint_schema_version` by [`initialise_schema`].
pub const SCHEMA_VERSION: i64 = 1;

/// Column list shared by every query that materialises a [`Place`].
pub(super) const PLACE_COLUMNS: &str = "id, name, lon, lat, categories, base_points, verified, \
     external_id, rating, review_count, metadata";

/// Create the place and post tables inside an existing SQLite database.
///
/// The call is idempotent. A database recorded under a different schema
/// version is rejected so migrations can be applied explicitly.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use snappoint_data::sqlite::initialise_schema;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create schema");
/// initialise_schema(&mut conn).expect("schema creation is idempotent");
///
/// let places: i64 = conn
///     .query_row("SELECT COUNT(*) FROM places", [], |row| row.get(0))
///     .expect("count places");
/// assert_eq!(places, 0);
/// ```
pub fn initialise_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| SqliteStoreError::Schema {
            step: "enable foreign keys",
            source,
        })?;

    let transaction = connection
        .transaction()
        .map_err(|source| SqliteStoreError::Schema {
            step: "begin schema transaction",
            source,
        })?;

    run_step(
        &transaction,
        "create places",
        "CREATE TABLE IF NOT EXISTS places (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            lon REAL NOT NULL,
            lat REAL NOT NULL,
            categories TEXT NOT NULL DEFAULT '[]',
            base_points INTEGER NOT NULL CHECK (base_points >= 0),
            verified INTEGER NOT NULL DEFAULT 0,
            external_id TEXT UNIQUE,
            rating REAL,
            review_count INTEGER,
            metadata TEXT NOT NULL DEFAULT '{}'
        )",
    )?;
    run_step(
        &transaction,
        "index place coordinates",
        "CREATE INDEX IF NOT EXISTS idx_places_lat_lon ON places(lat, lon)",
    )?;
    run_step(
        &transaction,
        "create posts",
        "CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            place_id INTEGER NOT NULL,
            user_id TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (place_id) REFERENCES places(id) ON DELETE CASCADE
        )",
    )?;
    run_step(
        &transaction,
        "index posts by place",
        "CREATE INDEX IF NOT EXISTS idx_posts_place_user ON posts(place_id, user_id)",
    )?;
    run_step(
        &transaction,
        "create schema version",
        "CREATE TABLE IF NOT EXISTS snappoint_schema_version (version INTEGER NOT NULL)",
    )?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| SqliteStoreError::Schema {
            step: "commit schema transaction",
            source,
        })
}

fn run_step(
    transaction: &rusqlite::Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), SqliteStoreError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SqliteStoreError::Schema { step, source })
}

fn ensure_schema_version(transaction: &rusqlite::Transaction<'_>) -> Result<(), SqliteStoreError> {
    let recorded: Option<i64> = transaction
        .query_row(
            "SELECT version FROM snappoint_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })
        .map_err(|source| SqliteStoreError::Schema {
            step: "read schema version",
            source,
        })?;

    match recorded {
        Some(SCHEMA_VERSION) => Ok(()),
        Some(found) => Err(SqliteStoreError::SchemaVersion {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => run_step(
            transaction,
            "record schema version",
            "INSERT INTO snappoint_schema_version (version) VALUES (1)",
        ),
    }
}

/// Values bound when writing a draft, in `PLACE_COLUMNS` order minus `id`.
pub(super) struct DraftRow {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    pub categories: String,
    pub base_points: u32,
    pub verified: bool,
    pub external_id: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub metadata: String,
}

impl DraftRow {
    pub(super) fn encode(draft: PlaceDraft) -> Result<Self, SqliteStoreError> {
        let categories = serde_json::to_string(&draft.categories)
            .map_err(|source| SqliteStoreError::Encode { source })?;
        let metadata = serde_json::to_string(&draft.metadata)
            .map_err(|source| SqliteStoreError::Encode { source })?;
        Ok(Self {
            name: draft.name,
            lon: draft.location.x,
            lat: draft.location.y,
            categories,
            base_points: draft.base_points,
            verified: draft.verified,
            external_id: draft.external_id,
            rating: draft.rating,
            review_count: draft.review_count,
            metadata,
        })
    }
}

/// Materialise a [`Place`] from a row selected with `PLACE_COLUMNS`.
pub(super) fn place_from_row(row: &Row<'_>) -> rusqlite::Result<Place> {
    let raw_id: i64 = row.get(0)?;
    let id = u64::try_from(raw_id).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(err))
    })?;
    let categories: String = row.get(4)?;
    let metadata: String = row.get(10)?;
    Ok(Place {
        id,
        name: row.get(1)?,
        location: Coord {
            x: row.get(2)?,
            y: row.get(3)?,
        },
        categories: decode_json::<Vec<String>>(4, &categories)?,
        base_points: row.get(5)?,
        verified: row.get(6)?,
        external_id: row.get(7)?,
        rating: row.get(8)?,
        review_count: row.get(9)?,
        metadata: decode_json::<PlaceMetadata>(10, &metadata)?,
    })
}

fn decode_json<T: serde::de::DeserializeOwned>(column: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err)))
}
