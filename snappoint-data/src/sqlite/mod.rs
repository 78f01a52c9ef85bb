//! SQLite-backed place store.
//!
//! [`SqlitePlaceStore`] implements [`PlaceStore`] and [`PostLedger`] over a
//! single connection:
//! - [`schema`] creates the `places` and `posts` tables and maps rows back to
//!   [`Place`] values.
//! - Radius queries prefilter on latitude/longitude boxes from
//!   [`search_bounds`] and then apply the exact Haversine test in Rust.
//! - Upserts rely on the `external_id` unique constraint so repeat
//!   ingestions converge on one row.
#![forbid(unsafe_code)]

mod schema;

use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, ToSql, params, params_from_iter};
use snappoint_core::{
    Place, PlaceDraft, PlaceHit, PlaceStore, PostLedger, RadiusQuery, StoreError, haversine_km,
    search_bounds,
};
use thiserror::Error;

pub use schema::{SCHEMA_VERSION, initialise_schema};

use schema::{DraftRow, PLACE_COLUMNS, place_from_row};

/// Errors raised while opening or writing the SQLite place database.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// The database's parent directory could not be created.
    #[error("failed to create directory for {path}")]
    CreateDirectory {
        /// Database path whose parent was being created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The database file could not be opened.
    #[error("failed to open SQLite database at {path}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Underlying SQLite error.
        #[source]
        source: rusqlite::Error,
    },
    /// A schema step failed.
    #[error("failed to {step}")]
    Schema {
        /// Step being executed.
        step: &'static str,
        /// Underlying SQLite error.
        #[source]
        source: rusqlite::Error,
    },
    /// The database was created by an incompatible schema version.
    #[error("unsupported schema version {found}; expected {expected}")]
    SchemaVersion {
        /// Version this build understands.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
    /// A statement failed.
    #[error("failed to {operation}")]
    Query {
        /// Operation being executed.
        operation: &'static str,
        /// Underlying SQLite error.
        #[source]
        source: rusqlite::Error,
    },
    /// Categories or metadata could not be serialised.
    #[error("failed to encode place columns")]
    Encode {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A place identifier does not fit SQLite's signed integer range.
    #[error("place id {id} is out of range")]
    IdOutOfRange {
        /// Offending identifier.
        id: u64,
    },
}

/// Place and post storage in a SQLite database.
#[derive(Debug)]
pub struct SqlitePlaceStore {
    connection: Mutex<Connection>,
}

impl SqlitePlaceStore {
    /// Open or create the database at `path`, creating parent directories
    /// and the schema as needed.
    ///
    /// # Examples
    /// ```
    /// use camino::Utf8PathBuf;
    /// use snappoint_data::sqlite::SqlitePlaceStore;
    ///
    /// let dir = tempfile::tempdir().expect("temp dir");
    /// let path = Utf8PathBuf::from_path_buf(dir.path().join("nested/places.db"))
    ///     .expect("utf-8 path");
    /// let store = SqlitePlaceStore::open(&path).expect("open store");
    /// assert!(path.exists());
    /// drop(store);
    /// ```
    pub fn open(path: &Utf8Path) -> Result<Self, SqliteStoreError> {
        let existed = snappoint_fs::is_regular_file(path).unwrap_or(false);
        snappoint_fs::ensure_parent_dir(path).map_err(|source| {
            SqliteStoreError::CreateDirectory {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let connection =
            Connection::open(path.as_std_path()).map_err(|source| SqliteStoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        if !existed {
            info!("created place database at {path}");
        }
        Self::from_connection(connection)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let connection =
            Connection::open_in_memory().map_err(|source| SqliteStoreError::Open {
                path: Utf8PathBuf::from(":memory:"),
                source,
            })?;
        Self::from_connection(connection)
    }

    fn from_connection(mut connection: Connection) -> Result<Self, SqliteStoreError> {
        initialise_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Record a post by `user_id` at `place_id`.
    pub fn record_post(&self, place_id: u64, user_id: &str) -> Result<(), StoreError> {
        let id = to_sql_id(place_id).map_err(|e| StoreError::backend("record post", e))?;
        let inserted = self
            .lock()
            .execute(
                "INSERT INTO posts (place_id, user_id)
                 SELECT id, ?2 FROM places WHERE id = ?1",
                params![id, user_id],
            )
            .map_err(|source| query_error("record post", source))?;
        if inserted == 0 {
            return Err(StoreError::NotFound { id: place_id });
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn candidates_in_bounds(&self, query: &RadiusQuery) -> Result<Vec<Place>, StoreError> {
        let boxes = search_bounds(query.center, query.radius_km);
        if boxes.is_empty() {
            return Ok(Vec::new());
        }
        let clause = boxes
            .iter()
            .map(|_| "(lat BETWEEN ? AND ? AND lon BETWEEN ? AND ?)")
            .collect::<Vec<_>>()
            .join(" OR ");
        let sql = format!("SELECT {PLACE_COLUMNS} FROM places WHERE {clause}");
        let bounds: Vec<f64> = boxes
            .iter()
            .flat_map(|rect| [rect.min().y, rect.max().y, rect.min().x, rect.max().x])
            .collect();

        let connection = self.lock();
        let mut statement = connection
            .prepare(&sql)
            .map_err(|source| query_error("prepare radius query", source))?;
        let rows = statement
            .query_map(params_from_iter(bounds), place_from_row)
            .map_err(|source| query_error("run radius query", source))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|source| query_error("read radius query", source))
    }
}

impl PlaceStore for SqlitePlaceStore {
    fn find_within_radius(&self, query: &RadiusQuery) -> Result<Vec<PlaceHit>, StoreError> {
        let mut hits: Vec<PlaceHit> = self
            .candidates_in_bounds(query)?
            .into_iter()
            .filter(|place| {
                query
                    .category
                    .as_deref()
                    .is_none_or(|category| place.has_category(category))
            })
            .filter_map(|place| {
                let distance_km = haversine_km(query.center, place.location);
                (distance_km <= query.radius_km).then_some(PlaceHit { place, distance_km })
            })
            .collect();
        hits.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then(a.place.id.cmp(&b.place.id))
        });
        if let Some(limit) = query.limit {
            hits.truncate(limit);
        }
        debug!(
            "radius query at ({}, {}) within {} km matched {} places",
            query.center.y,
            query.center.x,
            query.radius_km,
            hits.len()
        );
        Ok(hits)
    }

    fn create(&self, draft: PlaceDraft) -> Result<Place, StoreError> {
        let row = DraftRow::encode(draft).map_err(|e| StoreError::backend("create place", e))?;
        let sql = format!(
            "INSERT INTO places (name, lon, lat, categories, base_points, verified, \
             external_id, rating, review_count, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             RETURNING {PLACE_COLUMNS}"
        );
        self.lock()
            .query_row(&sql, &draft_params(&row), place_from_row)
            .map_err(|source| query_error("create place", source))
    }

    fn upsert_by_external_id(&self, draft: PlaceDraft) -> Result<Place, StoreError> {
        if draft.external_id.is_none() {
            return Err(StoreError::MissingExternalId);
        }
        let row = DraftRow::encode(draft).map_err(|e| StoreError::backend("upsert place", e))?;
        let sql = format!(
            "INSERT INTO places (name, lon, lat, categories, base_points, verified, \
             external_id, rating, review_count, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(external_id) DO UPDATE SET
                name = excluded.name,
                lon = excluded.lon,
                lat = excluded.lat,
                categories = excluded.categories,
                rating = excluded.rating,
                review_count = excluded.review_count,
                metadata = excluded.metadata
             RETURNING {PLACE_COLUMNS}"
        );
        self.lock()
            .query_row(&sql, &draft_params(&row), place_from_row)
            .map_err(|source| query_error("upsert place", source))
    }

    fn get(&self, id: u64) -> Result<Option<Place>, StoreError> {
        let Ok(sql_id) = to_sql_id(id) else {
            return Ok(None);
        };
        let sql = format!("SELECT {PLACE_COLUMNS} FROM places WHERE id = ?1");
        self.lock()
            .query_row(&sql, [sql_id], place_from_row)
            .optional()
            .map_err(|source| query_error("get place", source))
    }
}

impl PostLedger for SqlitePlaceStore {
    fn count_posts_at(&self, place_id: u64) -> Result<u64, StoreError> {
        let Ok(id) = to_sql_id(place_id) else {
            return Ok(0);
        };
        let count: i64 = self
            .lock()
            .query_row(
                "SELECT COUNT(*) FROM posts WHERE place_id = ?1",
                [id],
                |row| row.get(0),
            )
            .map_err(|source| query_error("count posts", source))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn has_user_posted_at(&self, place_id: u64, user_id: &str) -> Result<bool, StoreError> {
        let Ok(id) = to_sql_id(place_id) else {
            return Ok(false);
        };
        self.lock()
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM posts WHERE place_id = ?1 AND user_id = ?2)",
                params![id, user_id],
                |row| row.get(0),
            )
            .map_err(|source| query_error("check user post", source))
    }
}

fn draft_params(row: &DraftRow) -> [&dyn ToSql; 10] {
    [
        &row.name,
        &row.lon,
        &row.lat,
        &row.categories,
        &row.base_points,
        &row.verified,
        &row.external_id,
        &row.rating,
        &row.review_count,
        &row.metadata,
    ]
}

fn to_sql_id(id: u64) -> Result<i64, SqliteStoreError> {
    i64::try_from(id).map_err(|_| SqliteStoreError::IdOutOfRange { id })
}

fn query_error(operation: &'static str, source: rusqlite::Error) -> StoreError {
    StoreError::backend(operation, SqliteStoreError::Query { operation, source })
}
