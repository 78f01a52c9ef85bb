//! Storage traits for places and the posts made at them.
//!
//! The engine never owns persistence. It reads and writes places through
//! [`PlaceStore`] and asks [`PostLedger`] how often a place has been posted
//! at. Coordinates use WGS84 with `x = longitude` and `y = latitude`.

use std::sync::Arc;

use geo::Coord;
use thiserror::Error;

use crate::{Place, PlaceDraft};

/// Parameters for [`PlaceStore::find_within_radius`].
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusQuery {
    /// Centre of the search circle.
    pub center: Coord<f64>,
    /// Great-circle radius in kilometres. Inclusive.
    pub radius_km: f64,
    /// Only return places carrying this exact category.
    pub category: Option<String>,
    /// Maximum number of hits. `None` returns every match.
    pub limit: Option<usize>,
}

impl RadiusQuery {
    /// Query every place within `radius_km` of `center`.
    #[must_use]
    pub const fn new(center: Coord<f64>, radius_km: f64) -> Self {
        Self {
            center,
            radius_km,
            category: None,
            limit: None,
        }
    }

    /// Restrict hits to a category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Cap the number of hits.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A place returned by a radius query together with its distance.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceHit {
    /// The stored place.
    pub place: Place,
    /// Haversine distance from the query centre in kilometres.
    pub distance_km: f64,
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An upsert was attempted for a draft without an external identifier.
    #[error("upsert requires an external identifier")]
    MissingExternalId,
    /// The requested place does not exist.
    #[error("place {id} not found")]
    NotFound {
        /// Identifier that was looked up.
        id: u64,
    },
    /// The backend failed while performing `operation`.
    #[error("store operation `{operation}` failed: {source}")]
    Backend {
        /// Name of the failing operation.
        operation: &'static str,
        /// Underlying backend error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl StoreError {
    /// Wrap a backend error raised by `operation`.
    pub fn backend<E>(operation: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            operation,
            source: Box::new(source),
        }
    }
}

/// Read and write access to persisted places.
///
/// Implementations must make [`upsert_by_external_id`](Self::upsert_by_external_id)
/// atomic per row so that concurrent ingestions of the same provider
/// identifier converge on a single place.
pub trait PlaceStore: Send + Sync {
    /// Return places whose Haversine distance to the centre is at most the
    /// query radius, ordered by ascending distance.
    fn find_within_radius(&self, query: &RadiusQuery) -> Result<Vec<PlaceHit>, StoreError>;

    /// Insert a new place and return it with its assigned identity.
    fn create(&self, draft: PlaceDraft) -> Result<Place, StoreError>;

    /// Insert the draft or, when a place with the same external identifier
    /// exists, refresh its provider-owned fields.
    ///
    /// Base points and verification are written on insert only.
    fn upsert_by_external_id(&self, draft: PlaceDraft) -> Result<Place, StoreError>;

    /// Fetch a place by identity.
    fn get(&self, id: u64) -> Result<Option<Place>, StoreError>;
}

/// Lookup of posts made at places.
pub trait PostLedger: Send + Sync {
    /// Number of posts anyone has made at the place.
    fn count_posts_at(&self, place_id: u64) -> Result<u64, StoreError>;

    /// Whether `user_id` has posted at the place.
    fn has_user_posted_at(&self, place_id: u64, user_id: &str) -> Result<bool, StoreError>;
}

impl<T: PlaceStore + ?Sized> PlaceStore for &T {
    fn find_within_radius(&self, query: &RadiusQuery) -> Result<Vec<PlaceHit>, StoreError> {
        (**self).find_within_radius(query)
    }

    fn create(&self, draft: PlaceDraft) -> Result<Place, StoreError> {
        (**self).create(draft)
    }

    fn upsert_by_external_id(&self, draft: PlaceDraft) -> Result<Place, StoreError> {
        (**self).upsert_by_external_id(draft)
    }

    fn get(&self, id: u64) -> Result<Option<Place>, StoreError> {
        (**self).get(id)
    }
}

impl<T: PlaceStore + ?Sized> PlaceStore for Arc<T> {
    fn find_within_radius(&self, query: &RadiusQuery) -> Result<Vec<PlaceHit>, StoreError> {
        (**self).find_within_radius(query)
    }

    fn create(&self, draft: PlaceDraft) -> Result<Place, StoreError> {
        (**self).create(draft)
    }

    fn upsert_by_external_id(&self, draft: PlaceDraft) -> Result<Place, StoreError> {
        (**self).upsert_by_external_id(draft)
    }

    fn get(&self, id: u64) -> Result<Option<Place>, StoreError> {
        (**self).get(id)
    }
}

impl<T: PostLedger + ?Sized> PostLedger for &T {
    fn count_posts_at(&self, place_id: u64) -> Result<u64, StoreError> {
        (**self).count_posts_at(place_id)
    }

    fn has_user_posted_at(&self, place_id: u64, user_id: &str) -> Result<bool, StoreError> {
        (**self).has_user_posted_at(place_id, user_id)
    }
}

impl<T: PostLedger + ?Sized> PostLedger for Arc<T> {
    fn count_posts_at(&self, place_id: u64) -> Result<u64, StoreError> {
        (**self).count_posts_at(place_id)
    }

    fn has_user_posted_at(&self, place_id: u64, user_id: &str) -> Result<bool, StoreError> {
        (**self).has_user_posted_at(place_id, user_id)
    }
}
