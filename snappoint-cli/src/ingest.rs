//! `ingest` command: pull provider results for an area into the database.

use std::io::Write;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use snappoint_discovery::{Clock, IngestBudget, IngestConfig, IngestRequest, Ingestor};

use crate::provider::{ProviderFactory, ProviderSettings};
use crate::{
    ARG_API_KEY, ARG_DATABASE, ARG_DEADLINE_SECS, ARG_LATITUDE, ARG_LONGITUDE, ARG_MAX_PAGES,
    ARG_PLACES_URL, ARG_RADIUS_KM, CliError, DEFAULT_DATABASE, ENV_INGEST_LATITUDE,
    ENV_INGEST_LONGITUDE, ENV_INGEST_RADIUS_KM, open_store, validate_coordinates, write_json,
};

/// CLI arguments for the `ingest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "ingest",
    long_about = "Fetch up to a few pages of provider results around a point, \
                 filter, rank and spread them, and upsert the survivors into \
                 the place database. Prints the ingestion report as JSON.",
    about = "Ingest provider results for an area"
)]
#[ortho_config(prefix = "SNAPPOINT")]
pub(crate) struct IngestArgs {
    /// Latitude of the area centre in degrees.
    #[arg(long = ARG_LATITUDE, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the area centre in degrees.
    #[arg(long = ARG_LONGITUDE, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Area radius in kilometres.
    #[arg(long = ARG_RADIUS_KM, value_name = "km")]
    #[serde(default)]
    pub(crate) radius_km: Option<f64>,
    /// Maximum provider pages to fetch.
    #[arg(long = ARG_MAX_PAGES, value_name = "count")]
    #[serde(default)]
    pub(crate) max_pages: Option<usize>,
    /// Give up between pages once this many seconds have passed.
    #[arg(long = ARG_DEADLINE_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) deadline_secs: Option<u64>,
    /// Path to the SQLite place database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Google Places API key.
    #[arg(long = ARG_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) api_key: Option<String>,
    /// Override the Nearby Search endpoint.
    #[arg(long = ARG_PLACES_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) places_url: Option<String>,
}

impl IngestArgs {
    pub(crate) fn into_settings(self) -> Result<IngestSettings, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IngestSettings::try_from(merged)
    }
}

/// Resolved `ingest` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IngestSettings {
    pub(crate) request: IngestRequest,
    pub(crate) config: IngestConfig,
    pub(crate) deadline: Option<Duration>,
    pub(crate) database: Utf8PathBuf,
    pub(crate) provider: ProviderSettings,
}

impl TryFrom<IngestArgs> for IngestSettings {
    type Error = CliError;

    fn try_from(args: IngestArgs) -> Result<Self, Self::Error> {
        let lat = args.lat.ok_or(CliError::MissingArgument {
            field: ARG_LATITUDE,
            env: ENV_INGEST_LATITUDE,
        })?;
        let lon = args.lon.ok_or(CliError::MissingArgument {
            field: ARG_LONGITUDE,
            env: ENV_INGEST_LONGITUDE,
        })?;
        let radius_km = args.radius_km.ok_or(CliError::MissingArgument {
            field: ARG_RADIUS_KM,
            env: ENV_INGEST_RADIUS_KM,
        })?;
        validate_coordinates(lat, lon)?;
        if !(radius_km.is_finite() && radius_km > 0.0) {
            return Err(CliError::InvalidRadius { value: radius_km });
        }

        let mut config = IngestConfig::default();
        if let Some(max_pages) = args.max_pages {
            config.max_pages = max_pages;
        }

        Ok(Self {
            request: IngestRequest::new(Coord { x: lon, y: lat }, radius_km),
            config,
            deadline: args.deadline_secs.map(Duration::from_secs),
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            provider: ProviderSettings::new(args.api_key, args.places_url),
        })
    }
}

pub(crate) fn run_ingest_with(
    args: IngestArgs,
    factory: &dyn ProviderFactory,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let settings = args.into_settings()?;
    execute_ingest(&settings, factory, writer)
}

pub(crate) fn execute_ingest(
    settings: &IngestSettings,
    factory: &dyn ProviderFactory,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let store = open_store(&settings.database)?;
    let provider = factory.build(&settings.provider)?;
    let ingestor = Ingestor::new(provider).with_config(settings.config);
    let mut budget = IngestBudget::unbounded();
    if let Some(limit) = settings.deadline {
        budget = budget.with_deadline(ingestor.clock().now() + limit);
    }
    let report = ingestor.ingest(&store, settings.request, &budget)?;
    log::info!(
        "ingested {} pages: {} saved, {} failed",
        report.pages,
        report.saved,
        report.failed
    );
    write_json(writer, &report)
}

#[cfg(test)]
pub(crate) fn settings_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<IngestSettings, CliError> {
    let merged = IngestArgs::merge_from_layers(layers).map_err(CliError::from)?;
    IngestSettings::try_from(merged)
}
