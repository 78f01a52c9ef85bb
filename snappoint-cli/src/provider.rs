//! Places provider construction shared by the `nearby` and `ingest` commands.

use snappoint_core::PlaceProvider;
use snappoint_data::places::{DEFAULT_BASE_URL, GooglePlacesConfig, GooglePlacesProvider};

use crate::CliError;

/// Resolved provider options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ProviderSettings {
    /// Google Places API key. Without one every fetch fails with a
    /// missing-key provider error.
    pub(crate) api_key: Option<String>,
    /// Override for the Nearby Search endpoint.
    pub(crate) places_url: Option<String>,
}

impl ProviderSettings {
    pub(crate) fn new(api_key: Option<String>, places_url: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            places_url,
        }
    }

    fn base_url(&self) -> &str {
        self.places_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

/// Builds the provider for the current invocation.
pub(crate) trait ProviderFactory {
    fn build(&self, settings: &ProviderSettings) -> Result<Box<dyn PlaceProvider>, CliError>;
}

/// Builds a [`GooglePlacesProvider`].
pub(crate) struct GoogleProviderFactory;

impl ProviderFactory for GoogleProviderFactory {
    fn build(&self, settings: &ProviderSettings) -> Result<Box<dyn PlaceProvider>, CliError> {
        let mut config = GooglePlacesConfig::default().with_base_url(settings.base_url());
        if let Some(key) = &settings.api_key {
            config = config.with_api_key(key.clone());
        } else {
            log::warn!("no places API key configured; only stored places will be served");
        }
        let provider =
            GooglePlacesProvider::with_config(config).map_err(|source| CliError::BuildProvider {
                base_url: settings.base_url().to_owned(),
                source,
            })?;
        Ok(Box::new(provider))
    }
}
