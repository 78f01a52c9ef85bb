//! The third-party nearby-search boundary.
//!
//! A [`PlaceProvider`] answers one page request at a time. Continuation is
//! driven by the caller through [`PageRequest::Continuation`], which keeps
//! the pacing and page budget in the orchestrator rather than the adapter.

use std::sync::Arc;

use geo::Coord;
use thiserror::Error;

use crate::Candidate;

/// A single page request.
#[derive(Debug, Clone, PartialEq)]
pub enum PageRequest {
    /// First page: search around a location.
    Nearby {
        /// Search centre.
        center: Coord<f64>,
        /// Search radius in metres.
        radius_m: u32,
    },
    /// Subsequent page identified by the provider's continuation token.
    Continuation {
        /// Opaque token returned with the previous page.
        token: String,
    },
}

/// Status code carried by a provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    /// Results follow.
    Ok,
    /// The search succeeded with nothing to report.
    ZeroResults,
    /// The credentials were refused.
    AccessDenied,
    /// The account ran out of quota.
    QuotaExceeded,
    /// The request was malformed.
    BadRequest,
    /// Any other status code, verbatim.
    Other(String),
}

impl ProviderStatus {
    /// Classify a provider status code.
    ///
    /// # Examples
    /// ```
    /// use snappoint_core::ProviderStatus;
    ///
    /// assert_eq!(ProviderStatus::from_code("OVER_QUERY_LIMIT"), ProviderStatus::QuotaExceeded);
    /// assert_eq!(
    ///     ProviderStatus::from_code("UNKNOWN_ERROR"),
    ///     ProviderStatus::Other("UNKNOWN_ERROR".into())
    /// );
    /// ```
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "OK" => Self::Ok,
            "ZERO_RESULTS" => Self::ZeroResults,
            "REQUEST_DENIED" => Self::AccessDenied,
            "OVER_QUERY_LIMIT" => Self::QuotaExceeded,
            "INVALID_REQUEST" => Self::BadRequest,
            other => Self::Other(other.to_owned()),
        }
    }

    /// The wire code for this status.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Ok => "OK",
            Self::ZeroResults => "ZERO_RESULTS",
            Self::AccessDenied => "REQUEST_DENIED",
            Self::QuotaExceeded => "OVER_QUERY_LIMIT",
            Self::BadRequest => "INVALID_REQUEST",
            Self::Other(code) => code,
        }
    }

    /// Convert an error status into the matching [`ProviderError`].
    ///
    /// `Ok` and `ZeroResults` pass.
    pub fn check(&self) -> Result<(), ProviderError> {
        match self {
            Self::Ok | Self::ZeroResults => Ok(()),
            Self::AccessDenied => Err(ProviderError::AccessDenied),
            Self::QuotaExceeded => Err(ProviderError::QuotaExceeded),
            Self::BadRequest => Err(ProviderError::BadRequest),
            Self::Other(code) => Err(ProviderError::Service { code: code.clone() }),
        }
    }
}

/// One page of provider results.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPage {
    /// Status reported by the provider.
    pub status: ProviderStatus,
    /// Results in provider order.
    pub candidates: Vec<Candidate>,
    /// Token for the next page, if any.
    pub next_page_token: Option<String>,
}

impl ProviderPage {
    /// An empty, terminal page.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            status: ProviderStatus::ZeroResults,
            candidates: Vec::new(),
            next_page_token: None,
        }
    }
}

/// Coarse failure classification used for logging and degradation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// Credentials refused.
    AccessDenied,
    /// Quota exhausted.
    QuotaExceeded,
    /// Malformed request.
    BadRequest,
    /// Transport, decode, configuration or unknown status failures.
    Other,
}

/// Errors raised while fetching a provider page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// No API key was configured.
    #[error("provider API key is not configured")]
    MissingApiKey,
    /// The provider refused the credentials.
    #[error("provider denied access")]
    AccessDenied,
    /// The provider quota has been exhausted.
    #[error("provider quota exceeded")]
    QuotaExceeded,
    /// The provider rejected the request.
    #[error("provider rejected the request as invalid")]
    BadRequest,
    /// The provider reported an unrecognised status.
    #[error("provider returned status {code}")]
    Service {
        /// Status code reported by the provider.
        code: String,
    },
    /// The request could not be delivered.
    #[error("network error calling {url}: {message}")]
    Network {
        /// Request URL with credentials removed.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The request timed out.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL with credentials removed.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The response body could not be decoded.
    #[error("failed to decode provider response: {message}")]
    Decode {
        /// Decoder error description.
        message: String,
    },
}

impl ProviderError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ProviderErrorKind {
        match self {
            Self::AccessDenied => ProviderErrorKind::AccessDenied,
            Self::QuotaExceeded => ProviderErrorKind::QuotaExceeded,
            Self::BadRequest => ProviderErrorKind::BadRequest,
            Self::MissingApiKey
            | Self::Service { .. }
            | Self::Network { .. }
            | Self::Timeout { .. }
            | Self::Decode { .. } => ProviderErrorKind::Other,
        }
    }
}

/// Fetch pages of nearby places from a third-party service.
///
/// Implementations return `Ok` for pages whose status passed
/// [`ProviderStatus::check`] and surface every other outcome as a
/// [`ProviderError`].
pub trait PlaceProvider: Send + Sync {
    /// Fetch a single page.
    fn fetch_page(&self, request: &PageRequest) -> Result<ProviderPage, ProviderError>;
}

impl<T: PlaceProvider + ?Sized> PlaceProvider for &T {
    fn fetch_page(&self, request: &PageRequest) -> Result<ProviderPage, ProviderError> {
        (**self).fetch_page(request)
    }
}

impl<T: PlaceProvider + ?Sized> PlaceProvider for Arc<T> {
    fn fetch_page(&self, request: &PageRequest) -> Result<ProviderPage, ProviderError> {
        (**self).fetch_page(request)
    }
}

impl<T: PlaceProvider + ?Sized> PlaceProvider for Box<T> {
    fn fetch_page(&self, request: &PageRequest) -> Result<ProviderPage, ProviderError> {
        (**self).fetch_page(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("OK", ProviderStatus::Ok)]
    #[case("ZERO_RESULTS", ProviderStatus::ZeroResults)]
    #[case("REQUEST_DENIED", ProviderStatus::AccessDenied)]
    #[case("OVER_QUERY_LIMIT", ProviderStatus::QuotaExceeded)]
    #[case("INVALID_REQUEST", ProviderStatus::BadRequest)]
    fn known_codes_are_classified(#[case] code: &str, #[case] expected: ProviderStatus) {
        let status = ProviderStatus::from_code(code);
        assert_eq!(status, expected);
        assert_eq!(status.code(), code);
    }

    #[rstest]
    #[case(ProviderStatus::AccessDenied, ProviderErrorKind::AccessDenied)]
    #[case(ProviderStatus::QuotaExceeded, ProviderErrorKind::QuotaExceeded)]
    #[case(ProviderStatus::BadRequest, ProviderErrorKind::BadRequest)]
    #[case(ProviderStatus::Other("UNKNOWN_ERROR".into()), ProviderErrorKind::Other)]
    fn error_statuses_fail_check(#[case] status: ProviderStatus, #[case] kind: ProviderErrorKind) {
        let err = status.check().expect_err("status should fail");
        assert_eq!(err.kind(), kind);
    }

    #[rstest]
    #[case(ProviderStatus::Ok)]
    #[case(ProviderStatus::ZeroResults)]
    fn success_statuses_pass_check(#[case] status: ProviderStatus) {
        assert!(status.check().is_ok());
    }

    #[rstest]
    fn missing_api_key_is_other() {
        assert_eq!(ProviderError::MissingApiKey.kind(), ProviderErrorKind::Other);
    }
}
