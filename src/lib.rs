//! Facade crate for the snappoint place discovery engine.
//!
//! This crate re-exports the core domain types, the scoring tables and the
//! discovery services, and exposes the SQLite store and Google Places
//! provider behind feature flags.

#![forbid(unsafe_code)]

pub use snappoint_core::{
    Candidate, PageRequest, Place, PlaceDraft, PlaceHit, PlaceMetadata, PlaceProvider, PlaceStore,
    PostLedger, ProviderError, ProviderPage, ProviderStatus, RadiusQuery, StoreError, haversine_km,
    haversine_m, search_bounds,
};

pub use snappoint_scorer::{
    Geofence, ImportanceScorer, PointsEngine, RadiusClass, RadiusTable, VisitPoints,
};

pub use snappoint_discovery::{
    CandidateFilter, CheckIn, CheckInValidator, IngestBudget, IngestReport, IngestRequest,
    Ingestor, Marker, NearbyQuery, NearbyResponse, NearbyService, SpatialSelector,
};

#[cfg(feature = "store-sqlite")]
pub use snappoint_data::{SqlitePlaceStore, SqliteStoreError};

#[cfg(feature = "provider-google")]
pub use snappoint_data::{GooglePlacesConfig, GooglePlacesProvider, ProviderBuildError};
