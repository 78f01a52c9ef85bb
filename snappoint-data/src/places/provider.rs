//! Blocking [`PlaceProvider`] over the Google Places Nearby Search API.
//!
//! The [`PlaceProvider`] trait is synchronous so the discovery engine stays
//! embeddable in synchronous callers. This provider bridges to `reqwest` by
//! blocking on a Tokio runtime, reusing the caller's multi-threaded runtime
//! when there is one.

use std::time::Duration;

use reqwest::Client;
use snappoint_core::{
    Candidate, PageRequest, PlaceProvider, ProviderError, ProviderPage, ProviderStatus,
};
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

use super::response::NearbySearchResponse;

/// Default Nearby Search endpoint.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Default user agent for provider requests.
pub const DEFAULT_USER_AGENT: &str = "snappoint-discovery/0.1";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while constructing a [`GooglePlacesProvider`].
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// The configured base URL does not parse.
    #[error("invalid provider base URL {url:?}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
    /// The Tokio runtime could not be built.
    #[error("failed to build Tokio runtime")]
    Runtime(#[source] std::io::Error),
}

/// Configuration for [`GooglePlacesProvider`].
#[derive(Clone)]
pub struct GooglePlacesConfig {
    /// Nearby Search endpoint.
    pub base_url: String,
    /// API key. Requests fail with [`ProviderError::MissingApiKey`] without one.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl std::fmt::Debug for GooglePlacesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GooglePlacesConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for GooglePlacesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl GooglePlacesConfig {
    /// Configuration using `api_key` against the default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::default().with_api_key(api_key)
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Point requests at a different endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Nearby Search client implementing [`PlaceProvider`].
///
/// # Example
///
/// ```no_run
/// use geo::Coord;
/// use snappoint_core::{PageRequest, PlaceProvider};
/// use snappoint_data::places::{GooglePlacesConfig, GooglePlacesProvider};
///
/// let provider = GooglePlacesProvider::with_config(GooglePlacesConfig::new("my-key"))?;
/// let page = provider.fetch_page(&PageRequest::Nearby {
///     center: Coord { x: 28.97, y: 41.02 },
///     radius_m: 1500,
/// })?;
/// println!("{} candidates", page.candidates.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct GooglePlacesProvider {
    client: Client,
    config: GooglePlacesConfig,
    base_url: Url,
    runtime: Runtime,
}

impl std::fmt::Debug for GooglePlacesProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GooglePlacesProvider")
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

impl GooglePlacesProvider {
    /// Provider with the default endpoint and `api_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(GooglePlacesConfig::new(api_key))
    }

    /// Provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client or
    /// Tokio runtime fails to build.
    pub fn with_config(config: GooglePlacesConfig) -> Result<Self, ProviderBuildError> {
        let base_url =
            Url::parse(&config.base_url).map_err(|source| ProviderBuildError::InvalidBaseUrl {
                url: config.base_url.clone(),
                source,
            })?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProviderBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            base_url,
            runtime,
        })
    }

    /// Build the request URL without credentials.
    ///
    /// First pages carry `location` and `radius`; continuation pages carry
    /// only `pagetoken`.
    fn page_url(&self, request: &PageRequest) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            match request {
                PageRequest::Nearby { center, radius_m } => {
                    query
                        .append_pair("location", &format!("{},{}", center.y, center.x))
                        .append_pair("radius", &radius_m.to_string());
                }
                PageRequest::Continuation { token } => {
                    query.append_pair("pagetoken", token);
                }
            }
        }
        url
    }

    async fn fetch_page_async(
        &self,
        request: &PageRequest,
        api_key: &str,
    ) -> Result<ProviderPage, ProviderError> {
        let url = self.page_url(request);
        let mut keyed = url.clone();
        keyed.query_pairs_mut().append_pair("key", api_key);
        log::debug!("fetching provider page {url}");

        let response = self
            .client
            .get(keyed)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url.as_str()))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, url.as_str()))?;

        let body: NearbySearchResponse =
            response
                .json()
                .await
                .map_err(|err| ProviderError::Decode {
                    message: err.to_string(),
                })?;

        convert_response(body)
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> ProviderError {
        if error.is_timeout() {
            return ProviderError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }
        if error.is_decode() {
            return ProviderError::Decode {
                message: error.to_string(),
            };
        }
        // The error's own message embeds the keyed URL.
        let message = match error.status() {
            Some(status) => format!("HTTP status {status}"),
            None => strip_url(error),
        };
        ProviderError::Network {
            url: url.to_owned(),
            message,
        }
    }
}

fn strip_url(error: &reqwest::Error) -> String {
    let mut source: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(error);
    let mut parts = Vec::new();
    while let Some(err) = source {
        parts.push(err.to_string());
        source = err.source();
    }
    if parts.is_empty() {
        "request failed".to_owned()
    } else {
        parts.join(": ")
    }
}

/// Classify a decoded payload into a page or an error.
fn convert_response(body: NearbySearchResponse) -> Result<ProviderPage, ProviderError> {
    let status = ProviderStatus::from_code(&body.status);
    if let Err(err) = status.check() {
        log::warn!(
            "nearby search returned {} ({} results): {}",
            status.code(),
            body.results.len(),
            body.error_message.as_deref().unwrap_or("no message")
        );
        return Err(err);
    }
    log::info!("fetched {} places from nearby search", body.results.len());
    Ok(ProviderPage {
        status,
        candidates: body.results.into_iter().map(Candidate::from).collect(),
        next_page_token: body.next_page_token.filter(|token| !token.is_empty()),
    })
}

impl PlaceProvider for GooglePlacesProvider {
    /// Fetch one page of nearby places.
    ///
    /// # Runtime requirements
    ///
    /// Inside an existing Tokio runtime the runtime must be multi-threaded;
    /// a `current_thread` caller falls back to the provider's own runtime,
    /// which blocks the caller's executor for the duration of the request.
    fn fetch_page(&self, request: &PageRequest) -> Result<ProviderPage, ProviderError> {
        let Some(api_key) = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
        else {
            log::warn!("nearby search skipped: no API key configured");
            return Err(ProviderError::MissingApiKey);
        };

        let future = self.fetch_page_async(request, api_key);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}
