//! Core domain types for the snappoint place discovery engine.
//!
//! The crate holds the vocabulary shared by the scoring, discovery and data
//! crates: persisted [`Place`] values, ephemeral provider [`Candidate`]s, the
//! [`ScoringInputs`] triple, spherical geodesy helpers, and the seams to the
//! outside world ([`PlaceStore`], [`PostLedger`] and [`PlaceProvider`]).
//!
//! Coordinates are WGS84 [`geo::Coord`] values with `x = longitude` and
//! `y = latitude`, in degrees.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod geodesy;
pub mod place;
pub mod provider;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use geodesy::{EARTH_RADIUS_KM, haversine_km, haversine_m, search_bounds};
pub use place::{Candidate, Place, PlaceDraft, PlaceMetadata, ScoringInputs};
pub use provider::{
    PageRequest, PlaceProvider, ProviderError, ProviderErrorKind, ProviderPage, ProviderStatus,
};
pub use store::{PlaceHit, PlaceStore, PostLedger, RadiusQuery, StoreError};
