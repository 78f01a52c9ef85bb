//! `post` command: record that a user posted at a place.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use snappoint_core::{PostLedger, StoreError};

use crate::{
    ARG_DATABASE, ARG_PLACE_ID, ARG_USER, CliError, DEFAULT_DATABASE, ENV_POST_PLACE_ID,
    ENV_POST_USER, open_store, write_json,
};

/// CLI arguments for the `post` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "post", about = "Record a post by a user at a place")]
#[ortho_config(prefix = "SNAPPOINT")]
pub(crate) struct PostArgs {
    /// Identifier of the stored place.
    #[arg(long = ARG_PLACE_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) place_id: Option<u64>,
    /// Posting user.
    #[arg(long = ARG_USER, value_name = "id")]
    #[serde(default)]
    pub(crate) user: Option<String>,
    /// Path to the SQLite place database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// Post totals printed after recording.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostSummary<'a> {
    place_id: u64,
    user_id: &'a str,
    post_count: u64,
}

pub(crate) fn run_post(args: PostArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let place_id = merged.place_id.ok_or(CliError::MissingArgument {
        field: ARG_PLACE_ID,
        env: ENV_POST_PLACE_ID,
    })?;
    let user = merged
        .user
        .filter(|u| !u.trim().is_empty())
        .ok_or(CliError::MissingArgument {
            field: ARG_USER,
            env: ENV_POST_USER,
        })?;
    let database = merged
        .database
        .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE));

    let store = open_store(&database)?;
    store.record_post(place_id, &user).map_err(|err| match err {
        StoreError::NotFound { id } => CliError::PlaceNotFound { id },
        other => CliError::Store(other),
    })?;
    let summary = PostSummary {
        place_id,
        user_id: &user,
        post_count: store.count_posts_at(place_id)?,
    };
    write_json(writer, &summary)
}
