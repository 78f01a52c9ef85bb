//! Google Places Nearby Search adapter.
//!
//! [`GooglePlacesProvider`] issues one HTTP request per
//! [`PageRequest`](snappoint_core::PageRequest) and converts the payload into
//! [`ProviderPage`](snappoint_core::ProviderPage) values. Provider statuses
//! other than `OK` and `ZERO_RESULTS` surface as
//! [`ProviderError`](snappoint_core::ProviderError) variants.

mod provider;
mod response;

pub use provider::{
    DEFAULT_BASE_URL, DEFAULT_USER_AGENT, GooglePlacesConfig, GooglePlacesProvider,
    ProviderBuildError,
};
