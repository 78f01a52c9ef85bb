//! `nearby` command: priced markers around a point.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use snappoint_discovery::{Ingestor, NearbyQuery, NearbyService};

use crate::provider::{ProviderFactory, ProviderSettings};
use crate::{
    ARG_API_KEY, ARG_CATEGORY, ARG_DATABASE, ARG_HIDE_VISITED, ARG_LATITUDE, ARG_LONGITUDE,
    ARG_MAX_PLACES, ARG_PLACES_URL, ARG_RADIUS_M, ARG_USER, ARG_ZOOM, CliError, DEFAULT_DATABASE,
    ENV_NEARBY_LATITUDE, ENV_NEARBY_LONGITUDE, ENV_NEARBY_ZOOM, open_store, write_json,
};

/// User id used when none is given.
pub(crate) const ANONYMOUS_USER: &str = "anonymous";

/// CLI arguments for the `nearby` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "nearby",
    long_about = "List stored places around a point with their point value for \
                 the requesting user. Areas with too few stored places are \
                 ingested from the places provider first; provider failures \
                 fall back to whatever is already stored.",
    about = "List priced places around a point"
)]
#[ortho_config(prefix = "SNAPPOINT")]
pub(crate) struct NearbyArgs {
    /// Latitude of the map centre in degrees.
    #[arg(long = ARG_LATITUDE, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the map centre in degrees.
    #[arg(long = ARG_LONGITUDE, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Map zoom level between 1 (far out) and 20 (close in).
    #[arg(long = ARG_ZOOM, value_name = "level")]
    #[serde(default)]
    pub(crate) zoom: Option<u8>,
    /// Base search radius in metres before zoom scaling.
    #[arg(long = ARG_RADIUS_M, value_name = "metres")]
    #[serde(default)]
    pub(crate) radius_m: Option<f64>,
    /// Only list places with this exact category.
    #[arg(long = ARG_CATEGORY, value_name = "category")]
    #[serde(default)]
    pub(crate) category: Option<String>,
    /// Maximum number of markers.
    #[arg(long = ARG_MAX_PLACES, value_name = "count")]
    #[serde(default)]
    pub(crate) max_places: Option<usize>,
    /// Leave out places the user has already posted at.
    #[arg(
        long = ARG_HIDE_VISITED,
        value_name = "bool",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) hide_visited: Option<bool>,
    /// Requesting user, used for point values.
    #[arg(long = ARG_USER, value_name = "id")]
    #[serde(default)]
    pub(crate) user: Option<String>,
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

impl NearbyArgs {
    pub(crate) fn into_settings(self) -> Result<NearbySettings, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        NearbySettings::try_from(merged)
    }
}

/// Resolved `nearby` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NearbySettings {
    pub(crate) query: NearbyQuery,
    pub(crate) user: String,
    pub(crate) database: Utf8PathBuf,
    pub(crate) provider: ProviderSettings,
}

impl TryFrom<NearbyArgs> for NearbySettings {
    type Error = CliError;

    fn try_from(args: NearbyArgs) -> Result<Self, Self::Error> {
        let lat = args.lat.ok_or(CliError::MissingArgument {
            field: ARG_LATITUDE,
            env: ENV_NEARBY_LATITUDE,
        })?;
        let lon = args.lon.ok_or(CliError::MissingArgument {
            field: ARG_LONGITUDE,
            env: ENV_NEARBY_LONGITUDE,
        })?;
        let zoom = args.zoom.ok_or(CliError::MissingArgument {
            field: ARG_ZOOM,
            env: ENV_NEARBY_ZOOM,
        })?;

        let mut query = NearbyQuery::new(Coord { x: lon, y: lat }, zoom);
        if let Some(radius_m) = args.radius_m {
            query = query.with_radius_m(radius_m);
        }
        if let Some(category) = args.category.filter(|c| !c.is_empty()) {
            query = query.with_category(category);
        }
        if let Some(max_places) = args.max_places {
            query = query.with_max_places(max_places);
        }
        if args.hide_visited.unwrap_or(false) {
            query = query.hiding_visited();
        }

        Ok(Self {
            query,
            user: args.user.unwrap_or_else(|| ANONYMOUS_USER.to_owned()),
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            provider: ProviderSettings::new(args.api_key, args.places_url),
        })
    }
}

pub(crate) fn run_nearby_with(
    args: NearbyArgs,
    factory: &dyn ProviderFactory,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let settings = args.into_settings()?;
    execute_nearby(&settings, factory, writer)
}

pub(crate) fn execute_nearby(
    settings: &NearbySettings,
    factory: &dyn ProviderFactory,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    settings.query.validate()?;
    let store = open_store(&settings.database)?;
    let provider = factory.build(&settings.provider)?;
    let service = NearbyService::new(&store, Ingestor::new(provider));
    let response = service.nearby(&settings.user, &settings.query)?;
    write_json(writer, &response)
}

#[cfg(test)]
pub(crate) fn settings_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<NearbySettings, CliError> {
    let merged = NearbyArgs::merge_from_layers(layers).map_err(CliError::from)?;
    NearbySettings::try_from(merged)
}
