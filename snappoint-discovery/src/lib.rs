//! Place discovery for snappoint.
//!
//! This crate turns third-party search results into stored, priced places and
//! answers map queries over them:
//! - [`CandidateFilter`] drops candidates unsuited to a social feed.
//! - [`SpatialSelector`] keeps a bounded, spread-out subset of ranked
//!   candidates while always admitting landmarks.
//! - [`Ingestor`] pages a [`PlaceProvider`](snappoint_core::PlaceProvider),
//!   runs filter, ranking, selection and pricing, and upserts the result. It
//!   paces continuation requests on an injected [`Clock`] and stops when its
//!   [`IngestBudget`] runs out.
//! - [`NearbyService`] resolves a zoom-adaptive radius, prices stored places
//!   per user, and ingests sparse areas before responding. Provider failures
//!   degrade to the data already stored.
//! - [`CheckInValidator`] measures a user's distance against a place's
//!   geofence.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod checkin;
mod clock;
mod filter;
mod ingest;
mod nearby;
mod selector;

pub use checkin::{CheckIn, CheckInValidator};
pub use clock::{
    BudgetExhausted, CancellationToken, Clock, IngestBudget, ManualClock, SystemClock,
};
pub use filter::{CandidateFilter, ExclusionRules, QualityThreshold, Rejection};
pub use ingest::{IngestConfig, IngestError, IngestReport, IngestRequest, Ingestor, PageReport};
pub use nearby::{
    MAX_ZOOM, MIN_ZOOM, Marker, NearbyConfig, NearbyError, NearbyQuery, NearbyQueryError,
    NearbyResponse, NearbyService, ResolvedFilters,
};
pub use selector::{GridCell, Selected, SelectionPass, SelectorConfig, SpatialSelector};
