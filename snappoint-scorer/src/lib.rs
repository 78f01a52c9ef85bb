//! Pure scoring engines for snappoint places.
//!
//! The crate provides three independent calculators, each driven by an
//! immutable lookup table that callers construct explicitly:
//! - **Points** ([`PointsEngine`]) turn a place's categories, rating and
//!   review count into a base gamification value in `10..=60`, quantised to
//!   multiples of five. [`VisitPoints`] adjusts that value per user.
//! - **Geofences** ([`RadiusTable`]) give the distance within which a user
//!   may check in, together with a size band and covered area.
//! - **Importance** ([`ImportanceScorer`]) ranks provider candidates during
//!   ingestion. It reads the same inputs as the points engine but aggregates
//!   categories differently.
//!
//! # Examples
//!
//! ```
//! use snappoint_core::ScoringInputs;
//! use snappoint_scorer::{PointsEngine, RadiusTable};
//!
//! let categories = vec!["castle".to_owned()];
//! let inputs = ScoringInputs::new(&categories, Some(4.6), Some(1500));
//! assert_eq!(PointsEngine::default().base_points(inputs), 60);
//! assert_eq!(RadiusTable::default().resolve(&categories).radius_m, 300);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod importance;
mod points;
mod radius;

pub use error::TableError;
pub use importance::{ImportanceScorer, ScoredCandidate, review_component};
pub use points::{
    ComboBonus, MAX_POINTS, MIN_POINTS, PointsEngine, PointsTable, VisitPoints, VisitState,
    popularity_bonus, quantise, rating_bonus,
};
pub use radius::{DEFAULT_RADIUS_M, Geofence, RadiusClass, RadiusTable};
