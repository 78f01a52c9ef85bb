//! Zoom-adaptive proximity search with on-demand ingestion.
//!
//! [`NearbyService::nearby`] resolves a search radius from the caller's zoom
//! level, reads stored places, and prices each one for the requesting user.
//! When fewer than [`NearbyConfig::freshness_threshold`] places come back the
//! service ingests the same area from the provider and queries again.
//! Provider failures during that fallback are logged and the response is
//! built from whatever the store already holds.

use std::time::Duration;

use geo::Coord;
use serde::Serialize;
use snappoint_core::{Place, PlaceHit, PlaceProvider, PlaceStore, PostLedger, RadiusQuery, StoreError};
use snappoint_scorer::{RadiusClass, RadiusTable, VisitPoints, VisitState};
use thiserror::Error;

use crate::checkin::{CheckIn, CheckInValidator};
use crate::clock::{Clock, IngestBudget, SystemClock};
use crate::ingest::{IngestError, IngestRequest, Ingestor};

/// Smallest accepted zoom level.
pub const MIN_ZOOM: u8 = 1;
/// Largest accepted zoom level.
pub const MAX_ZOOM: u8 = 20;

/// Tunables for [`NearbyService`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyConfig {
    /// Radius used when the caller supplies none, in kilometres.
    pub default_radius_km: f64,
    /// Lower clamp for the resolved radius, in kilometres.
    pub min_radius_km: f64,
    /// Upper clamp for the resolved radius, in kilometres.
    pub max_radius_km: f64,
    /// Result cap, also the ceiling for caller-supplied caps.
    pub default_limit: usize,
    /// Below this many hits the service ingests before responding.
    pub freshness_threshold: usize,
    /// Optional bound on the fallback ingestion's duration.
    pub fallback_timeout: Option<Duration>,
}

impl Default for NearbyConfig {
    fn default() -> Self {
        Self {
            default_radius_km: 20.0,
            min_radius_km: 0.1,
            max_radius_km: 50.0,
            default_limit: 50,
            freshness_threshold: 20,
            fallback_timeout: None,
        }
    }
}

/// Caller input rejected before any lookup.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum NearbyQueryError {
    /// Latitude is not a finite value in `-90..=90`.
    #[error("latitude {0} is outside -90..=90")]
    InvalidLatitude(f64),
    /// Longitude is not a finite value in `-180..=180`.
    #[error("longitude {0} is outside -180..=180")]
    InvalidLongitude(f64),
    /// Zoom level is outside `1..=20`.
    #[error("zoom level {0} is outside 1..=20")]
    ZoomOutOfRange(u8),
    /// Radius is not a positive finite number of metres.
    #[error("radius {0} m must be positive and finite")]
    InvalidRadius(f64),
    /// A result cap of zero was requested.
    #[error("max places must be at least 1")]
    ZeroMaxPlaces,
}

/// Errors returned by [`NearbyService`].
#[derive(Debug, Error)]
pub enum NearbyError {
    /// The request was malformed.
    #[error(transparent)]
    InvalidQuery(#[from] NearbyQueryError),
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A nearby-places request.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    /// Search centre.
    pub center: Coord<f64>,
    /// Client map zoom, `1` far out to `20` close in.
    pub zoom_level: u8,
    /// Caller-supplied radius in metres.
    pub radius_m: Option<f64>,
    /// Only return places with this category.
    pub category: Option<String>,
    /// Caller-supplied result cap.
    pub max_places: Option<usize>,
    /// Drop places the requesting user already posted at.
    pub hide_visited: bool,
}

impl NearbyQuery {
    /// Query around `center` at `zoom_level`.
    #[must_use]
    pub const fn new(center: Coord<f64>, zoom_level: u8) -> Self {
        Self {
            center,
            zoom_level,
            radius_m: None,
            category: None,
            max_places: None,
            hide_visited: false,
        }
    }

    /// Search within `radius_m` metres before zoom scaling.
    #[must_use]
    pub const fn with_radius_m(mut self, radius_m: f64) -> Self {
        self.radius_m = Some(radius_m);
        self
    }

    /// Only return places with `category`.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Cap the number of markers.
    #[must_use]
    pub const fn with_max_places(mut self, max_places: usize) -> Self {
        self.max_places = Some(max_places);
        self
    }

    /// Drop places the user already posted at.
    #[must_use]
    pub const fn hiding_visited(mut self) -> Self {
        self.hide_visited = true;
        self
    }

    /// Reject malformed input.
    ///
    /// # Errors
    /// Returns the first [`NearbyQueryError`] found.
    pub fn validate(&self) -> Result<(), NearbyQueryError> {
        let Coord { x: lon, y: lat } = self.center;
        if !(-90.0..=90.0).contains(&lat) {
            return Err(NearbyQueryError::InvalidLatitude(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(NearbyQueryError::InvalidLongitude(lon));
        }
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.zoom_level) {
            return Err(NearbyQueryError::ZoomOutOfRange(self.zoom_level));
        }
        if let Some(radius) = self.radius_m
            && !(radius.is_finite() && radius > 0.0)
        {
            return Err(NearbyQueryError::InvalidRadius(radius));
        }
        if self.max_places == Some(0) {
            return Err(NearbyQueryError::ZeroMaxPlaces);
        }
        Ok(())
    }
}

/// A place as shown on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// Place identifier.
    pub id: u64,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Points this user would earn by posting here.
    pub point_value: u32,
    /// Whether the place has been verified.
    pub is_verified: bool,
    /// Distance from the query centre in kilometres.
    pub distance: f64,
    /// Check-in radius in metres.
    pub post_radius: u32,
    /// Geofence area in square metres.
    pub coverage_area: f64,
    /// Geofence size band.
    pub radius_type: RadiusClass,
    /// Human-readable size band.
    pub radius_description: &'static str,
}

/// Echo of the filters the service actually applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFilters {
    /// Resolved search radius in kilometres.
    pub radius: f64,
    /// Zoom level used for scaling.
    pub zoom_level: u8,
    /// Whether visited places were removed.
    pub hide_visited: bool,
    /// Category filter, if any.
    pub category: Option<String>,
}

/// Markers plus the filters that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyResponse {
    /// Places ordered by distance.
    pub markers: Vec<Marker>,
    /// Applied filters.
    pub filters: ResolvedFilters,
}

/// Answers nearby queries, ingesting sparse areas on demand.
#[derive(Debug)]
pub struct NearbyService<S, P, C = SystemClock> {
    store: S,
    ingestor: Ingestor<P, C>,
    radii: RadiusTable,
    visit: VisitPoints,
    config: NearbyConfig,
}

impl<S, P, C> NearbyService<S, P, C>
where
    S: PlaceStore + PostLedger,
    P: PlaceProvider,
    C: Clock,
{
    /// Service over `store`, falling back to `ingestor` for sparse areas.
    #[must_use]
    pub fn new(store: S, ingestor: Ingestor<P, C>) -> Self {
        Self {
            store,
            ingestor,
            radii: RadiusTable::default(),
            visit: VisitPoints::default(),
            config: NearbyConfig::default(),
        }
    }

    /// Replace the tunables.
    #[must_use]
    pub const fn with_config(mut self, config: NearbyConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the geofence table.
    #[must_use]
    pub fn with_radii(mut self, radii: RadiusTable) -> Self {
        self.radii = radii;
        self
    }

    /// Replace the per-user visit adjustment.
    #[must_use]
    pub const fn with_visit_points(mut self, visit: VisitPoints) -> Self {
        self.visit = visit;
        self
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The fallback ingestor.
    #[must_use]
    pub const fn ingestor(&self) -> &Ingestor<P, C> {
        &self.ingestor
    }

    /// The tunables in use.
    #[must_use]
    pub const fn config(&self) -> &NearbyConfig {
        &self.config
    }

    /// Search radius in kilometres for a validated query.
    ///
    /// The caller's radius (or the default) grows by `2 - min(zoom / 20, 1)`
    /// and is clamped to the configured bounds.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use snappoint_core::test_support::{MemoryPlaceStore, StubPlaceProvider};
    /// use snappoint_discovery::{Ingestor, NearbyQuery, NearbyService};
    ///
    /// let service = NearbyService::new(
    ///     MemoryPlaceStore::default(),
    ///     Ingestor::new(StubPlaceProvider::default()),
    /// );
    /// let query = NearbyQuery::new(Coord { x: 29.0, y: 41.0 }, 10);
    /// assert!((service.resolve_radius_km(&query) - 30.0).abs() < 1e-9);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "radius scaling is floating point by nature"
    )]
    pub fn resolve_radius_km(&self, query: &NearbyQuery) -> f64 {
        let base = query
            .radius_m
            .map_or(self.config.default_radius_km, |m| m / 1000.0);
        let zoom_factor = (f64::from(query.zoom_level) / f64::from(MAX_ZOOM)).min(1.0);
        (base * (2.0 - zoom_factor)).clamp(self.config.min_radius_km, self.config.max_radius_km)
    }

    /// Markers near `query.center` priced for `user_id`.
    ///
    /// # Errors
    /// Returns [`NearbyError::InvalidQuery`] before touching the store when
    /// the query is malformed, and [`NearbyError::Store`] when the store or
    /// post ledger fails. Provider failures never surface here.
    pub fn nearby(&self, user_id: &str, query: &NearbyQuery) -> Result<NearbyResponse, NearbyError> {
        query.validate()?;
        let radius_km = self.resolve_radius_km(query);
        let limit = query
            .max_places
            .map_or(self.config.default_limit, |cap| {
                cap.min(self.config.default_limit)
            });
        // Visited places are dropped after pricing, so the cap applies later.
        let mut store_query = RadiusQuery::new(query.center, radius_km);
        if !query.hide_visited {
            store_query = store_query.with_limit(limit);
        }
        if let Some(category) = &query.category {
            store_query = store_query.with_category(category.clone());
        }

        let mut hits = self.store.find_within_radius(&store_query)?;
        if hits.len().min(limit) < self.config.freshness_threshold {
            log::info!(
                "{} places within {radius_km:.2} km of ({}, {}), ingesting from provider",
                hits.len(),
                query.center.y,
                query.center.x,
            );
            if self.ingest_fallback(IngestRequest::new(query.center, radius_km)) {
                hits = self.store.find_within_radius(&store_query)?;
            }
        }

        let mut markers = Vec::with_capacity(hits.len().min(limit));
        for hit in hits {
            if markers.len() >= limit {
                break;
            }
            let (point_value, state) = self.dynamic_value(&hit.place, user_id)?;
            if query.hide_visited && state == VisitState::VisitedByUser {
                continue;
            }
            markers.push(self.marker(hit, point_value));
        }

        Ok(NearbyResponse {
            markers,
            filters: ResolvedFilters {
                radius: radius_km,
                zoom_level: query.zoom_level,
                hide_visited: query.hide_visited,
                category: query.category.clone(),
            },
        })
    }

    /// Dynamic point value of a single place for `user_id`.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] (wrapped) for unknown places and
    /// [`NearbyError::Store`] for backend failures.
    pub fn point_value_for(&self, place_id: u64, user_id: &str) -> Result<u32, NearbyError> {
        let place = self.require(place_id)?;
        Ok(self.dynamic_value(&place, user_id)?.0)
    }

    /// Check `user` against the geofence of place `place_id`.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] (wrapped) for unknown places and
    /// [`NearbyError::Store`] for backend failures.
    pub fn check_in(&self, place_id: u64, user: Coord<f64>) -> Result<CheckIn, NearbyError> {
        let place = self.require(place_id)?;
        Ok(CheckInValidator::new(self.radii.clone()).validate(&place, user))
    }

    fn require(&self, place_id: u64) -> Result<Place, StoreError> {
        self.store
            .get(place_id)?
            .ok_or(StoreError::NotFound { id: place_id })
    }

    fn dynamic_value(&self, place: &Place, user_id: &str) -> Result<(u32, VisitState), StoreError> {
        let user_posted = self.store.has_user_posted_at(place.id, user_id)?;
        let post_count = if user_posted {
            1
        } else {
            self.store.count_posts_at(place.id)?
        };
        let state = VisitState::from_ledger(user_posted, post_count);
        Ok((self.visit.adjust(place.base_points, state), state))
    }

    fn marker(&self, hit: PlaceHit, point_value: u32) -> Marker {
        let fence = self.radii.resolve(&hit.place.categories);
        Marker {
            id: hit.place.id,
            latitude: hit.place.location.y,
            longitude: hit.place.location.x,
            point_value,
            is_verified: hit.place.verified,
            distance: hit.distance_km,
            post_radius: fence.radius_m,
            coverage_area: fence.coverage_area_m2,
            radius_type: fence.class,
            radius_description: fence.description(),
        }
    }

    /// Run the fallback ingestion, returning whether the store should be
    /// queried again.
    fn ingest_fallback(&self, request: IngestRequest) -> bool {
        let mut budget = IngestBudget::unbounded();
        if let Some(timeout) = self.config.fallback_timeout
            && let Some(deadline) = self.ingestor.clock().now().checked_add(timeout)
        {
            budget = budget.with_deadline(deadline);
        }
        let (report, outcome) = self.ingestor.ingest_partial(&self.store, request, &budget);
        match outcome {
            Ok(()) => {
                log::debug!(
                    "fallback ingestion saved {} places over {} pages",
                    report.saved,
                    report.pages
                );
                true
            }
            Err(IngestError::Provider(err)) => {
                log::warn!(
                    "provider unavailable ({:?}) after {} pages, serving stored places: {err}",
                    err.kind(),
                    report.pages
                );
                report.saved > 0
            }
            Err(err) => {
                log::warn!("fallback ingestion stopped, serving stored places: {err}");
                true
            }
        }
    }
}
