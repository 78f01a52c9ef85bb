//! Command-line interface for the snappoint discovery engine.
//!
//! Every subcommand layers its options from CLI flags, `SNAPPOINT_*`
//! environment variables and configuration files through `ortho_config`, then
//! prints its result as JSON on standard output.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use serde::Serialize;
use snappoint_data::SqlitePlaceStore;

mod check_in;
mod error;
mod ingest;
mod nearby;
mod post;
mod provider;

pub use error::CliError;

use check_in::{CheckInArgs, run_check_in};
use ingest::{IngestArgs, run_ingest_with};
use nearby::{NearbyArgs, run_nearby_with};
use post::{PostArgs, run_post};
use provider::{GoogleProviderFactory, ProviderFactory};

pub(crate) const ARG_LATITUDE: &str = "lat";
pub(crate) const ARG_LONGITUDE: &str = "lon";
pub(crate) const ARG_ZOOM: &str = "zoom";
pub(crate) const ARG_RADIUS_M: &str = "radius-m";
pub(crate) const ARG_RADIUS_KM: &str = "radius-km";
pub(crate) const ARG_CATEGORY: &str = "category";
pub(crate) const ARG_MAX_PLACES: &str = "max-places";
pub(crate) const ARG_HIDE_VISITED: &str = "hide-visited";
pub(crate) const ARG_USER: &str = "user";
pub(crate) const ARG_PLACE_ID: &str = "place-id";
pub(crate) const ARG_MAX_PAGES: &str = "max-pages";
pub(crate) const ARG_DEADLINE_SECS: &str = "deadline-secs";
pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_API_KEY: &str = "api-key";
pub(crate) const ARG_PLACES_URL: &str = "places-url";

pub(crate) const ENV_NEARBY_LATITUDE: &str = "SNAPPOINT_CMDS_NEARBY_LAT";
pub(crate) const ENV_NEARBY_LONGITUDE: &str = "SNAPPOINT_CMDS_NEARBY_LON";
pub(crate) const ENV_NEARBY_ZOOM: &str = "SNAPPOINT_CMDS_NEARBY_ZOOM";
pub(crate) const ENV_INGEST_LATITUDE: &str = "SNAPPOINT_CMDS_INGEST_LAT";
pub(crate) const ENV_INGEST_LONGITUDE: &str = "SNAPPOINT_CMDS_INGEST_LON";
pub(crate) const ENV_INGEST_RADIUS_KM: &str = "SNAPPOINT_CMDS_INGEST_RADIUS_KM";
pub(crate) const ENV_CHECK_IN_PLACE_ID: &str = "SNAPPOINT_CMDS_CHECK_IN_PLACE_ID";
pub(crate) const ENV_CHECK_IN_LATITUDE: &str = "SNAPPOINT_CMDS_CHECK_IN_LAT";
pub(crate) const ENV_CHECK_IN_LONGITUDE: &str = "SNAPPOINT_CMDS_CHECK_IN_LON";
pub(crate) const ENV_POST_PLACE_ID: &str = "SNAPPOINT_CMDS_POST_PLACE_ID";
pub(crate) const ENV_POST_USER: &str = "SNAPPOINT_CMDS_POST_USER";

/// Database file used when none is configured.
pub(crate) const DEFAULT_DATABASE: &str = "snappoint.db";

/// Run the snappoint CLI with the current process arguments and environment.
///
/// Help and version requests print and exit the process directly.
pub fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => return Err(CliError::ArgumentParsing(err)),
    };
    let mut stdout = std::io::stdout().lock();
    dispatch(cli.command, &GoogleProviderFactory, &mut stdout)
}

fn dispatch(
    command: Command,
    factory: &dyn ProviderFactory,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Command::Nearby(args) => run_nearby_with(args, factory, writer),
        Command::Ingest(args) => run_ingest_with(args, factory, writer),
        Command::CheckIn(args) => run_check_in(args, writer),
        Command::Post(args) => run_post(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "snappoint",
    about = "Discover, price and check in at nearby places",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List priced places around a point, ingesting sparse areas first.
    Nearby(NearbyArgs),
    /// Pull provider results for an area into the place database.
    Ingest(IngestArgs),
    /// Check a position against a place's geofence.
    CheckIn(CheckInArgs),
    /// Record a post by a user at a place.
    Post(PostArgs),
}

/// Write `value` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

/// Open the place database, creating it when missing.
pub(crate) fn open_store(path: &Utf8Path) -> Result<SqlitePlaceStore, CliError> {
    SqlitePlaceStore::open(path).map_err(|source| CliError::OpenStore {
        path: path.to_path_buf(),
        source,
    })
}

/// Reject latitudes outside [-90, 90] and longitudes outside [-180, 180].
pub(crate) fn validate_coordinates(lat: f64, lon: f64) -> Result<(), CliError> {
    if !(lat.is_finite() && (-90.0..=90.0).contains(&lat)) {
        return Err(CliError::InvalidCoordinate {
            field: ARG_LATITUDE,
            value: lat,
        });
    }
    if !(lon.is_finite() && (-180.0..=180.0).contains(&lon)) {
        return Err(CliError::InvalidCoordinate {
            field: ARG_LONGITUDE,
            value: lon,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
