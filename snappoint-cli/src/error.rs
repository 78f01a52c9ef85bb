//! Error types emitted by the snappoint CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use snappoint_core::StoreError;
use snappoint_data::{ProviderBuildError, SqliteStoreError};
use snappoint_discovery::{IngestError, NearbyError, NearbyQueryError};
use thiserror::Error;

/// Errors emitted by the snappoint CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A latitude or longitude is out of range.
    #[error("{field} {value} is out of range")]
    InvalidCoordinate { field: &'static str, value: f64 },
    /// An ingestion radius is not a positive, finite number of kilometres.
    #[error("radius {value} km must be positive and finite")]
    InvalidRadius { value: f64 },
    /// The nearby query failed validation.
    #[error(transparent)]
    InvalidQuery(#[from] NearbyQueryError),
    /// Opening the place database failed.
    #[error("failed to open place database at {path:?}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: SqliteStoreError,
    },
    /// Constructing the places provider failed.
    #[error("failed to build places provider for {base_url:?}: {source}")]
    BuildProvider {
        base_url: String,
        #[source]
        source: ProviderBuildError,
    },
    /// The nearby service failed.
    #[error("nearby query failed: {0}")]
    Nearby(#[from] NearbyError),
    /// Ingestion ended with an error.
    #[error("ingestion failed: {0}")]
    Ingest(#[from] IngestError),
    /// A store operation failed.
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
    /// The requested place does not exist.
    #[error("place {id} not found")]
    PlaceNotFound { id: u64 },
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
