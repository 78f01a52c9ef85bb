//! Adapters that connect the discovery engine to the outside world.
//!
//! - [`places`] fetches candidate pages from the Google Places Nearby Search
//!   API.
//! - [`sqlite`] persists places and posts in a SQLite database and answers
//!   radius queries over them.
#![forbid(unsafe_code)]

pub mod places;
pub mod sqlite;

pub use places::{GooglePlacesConfig, GooglePlacesProvider, ProviderBuildError};
pub use sqlite::{SqlitePlaceStore, SqliteStoreError};
