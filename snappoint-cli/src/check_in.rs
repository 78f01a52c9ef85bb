//! `check-in` command: measure a position against a place's geofence.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use snappoint_core::PlaceStore;
use snappoint_discovery::CheckInValidator;

use crate::{
    ARG_DATABASE, ARG_LATITUDE, ARG_LONGITUDE, ARG_PLACE_ID, CliError, DEFAULT_DATABASE,
    ENV_CHECK_IN_LATITUDE, ENV_CHECK_IN_LONGITUDE, ENV_CHECK_IN_PLACE_ID, open_store,
    validate_coordinates, write_json,
};

/// CLI arguments for the `check-in` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "check-in", about = "Check a position against a place's geofence")]
#[ortho_config(prefix = "SNAPPOINT")]
pub(crate) struct CheckInArgs {
    /// Identifier of the stored place.
    #[arg(long = ARG_PLACE_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) place_id: Option<u64>,
    /// Latitude of the user in degrees.
    #[arg(long = ARG_LATITUDE, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the user in degrees.
    #[arg(long = ARG_LONGITUDE, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Path to the SQLite place database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// Resolved `check-in` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CheckInSettings {
    pub(crate) place_id: u64,
    pub(crate) position: Coord<f64>,
    pub(crate) database: Utf8PathBuf,
}

impl TryFrom<CheckInArgs> for CheckInSettings {
    type Error = CliError;

    fn try_from(args: CheckInArgs) -> Result<Self, Self::Error> {
        let place_id = args.place_id.ok_or(CliError::MissingArgument {
            field: ARG_PLACE_ID,
            env: ENV_CHECK_IN_PLACE_ID,
        })?;
        let lat = args.lat.ok_or(CliError::MissingArgument {
            field: ARG_LATITUDE,
            env: ENV_CHECK_IN_LATITUDE,
        })?;
        let lon = args.lon.ok_or(CliError::MissingArgument {
            field: ARG_LONGITUDE,
            env: ENV_CHECK_IN_LONGITUDE,
        })?;
        validate_coordinates(lat, lon)?;
        Ok(Self {
            place_id,
            position: Coord { x: lon, y: lat },
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
        })
    }
}

pub(crate) fn run_check_in(args: CheckInArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let settings = CheckInSettings::try_from(merged)?;
    execute_check_in(&settings, writer)
}

pub(crate) fn execute_check_in(
    settings: &CheckInSettings,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let store = open_store(&settings.database)?;
    let place = store
        .get(settings.place_id)?
        .ok_or(CliError::PlaceNotFound {
            id: settings.place_id,
        })?;
    let check_in = CheckInValidator::default().validate(&place, settings.position);
    write_json(writer, &check_in)
}
