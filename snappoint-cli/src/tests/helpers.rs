//! Scripted providers and scratch databases for CLI tests.

use super::*;
use crate::provider::ProviderSettings;
use camino::Utf8PathBuf;
use geo::Coord;
use snappoint_core::test_support::StubPlaceProvider;
use snappoint_core::{
    Candidate, PlaceProvider, ProviderError, ProviderPage, ProviderStatus,
};
use std::cell::{Cell, RefCell};
use tempfile::TempDir;

/// Centre of the fixture landmarks.
pub(super) const OLD_TOWN: Coord<f64> = Coord {
    x: 28.976,
    y: 41.008,
};

/// Factory handing out a fresh stub provider replaying the same script.
#[derive(Debug, Default)]
pub(super) struct ScriptedFactory {
    script: Vec<Result<ProviderPage, ProviderError>>,
    builds: Cell<usize>,
    last_settings: RefCell<Option<ProviderSettings>>,
}

impl ScriptedFactory {
    pub(super) fn new(script: Vec<Result<ProviderPage, ProviderError>>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    pub(super) fn builds(&self) -> usize {
        self.builds.get()
    }

    pub(super) fn last_settings(&self) -> Option<ProviderSettings> {
        self.last_settings.borrow().clone()
    }
}

impl ProviderFactory for ScriptedFactory {
    fn build(&self, settings: &ProviderSettings) -> Result<Box<dyn PlaceProvider>, CliError> {
        self.builds.set(self.builds.get() + 1);
        self.last_settings.replace(Some(settings.clone()));
        Ok(Box::new(StubPlaceProvider::new(self.script.clone())))
    }
}

fn landmark(id: &str, name: &str, lat: f64, lon: f64) -> Candidate {
    Candidate::new(id, name, Coord { x: lon, y: lat })
        .with_categories(["tourist_attraction", "point_of_interest"])
        .with_rating(4.7)
        .with_review_count(40_000)
}

/// Three well-known landmarks around [`OLD_TOWN`].
pub(super) fn landmarks_page() -> ProviderPage {
    ProviderPage {
        status: ProviderStatus::Ok,
        candidates: vec![
            landmark("g-sophia", "Hagia Sophia", 41.0086, 28.9802),
            landmark("g-cistern", "Basilica Cistern", 41.0084, 28.9779),
            landmark("g-blue", "Blue Mosque", 41.0054, 28.9768),
        ],
        next_page_token: None,
    }
}

/// A temporary directory holding the place database.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    database: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self {
            database: root.join("data").join("places.db"),
            _dir: dir,
        }
    }

    pub(super) fn database(&self) -> &Utf8PathBuf {
        &self.database
    }
}

/// Parse `argv` (without the binary name) and run it against `factory`.
pub(super) fn run_cli(
    argv: &[String],
    factory: &dyn ProviderFactory,
) -> Result<serde_json::Value, CliError> {
    let invocation = std::iter::once("snappoint".to_owned()).chain(argv.iter().cloned());
    let cli = Cli::try_parse_from(invocation).map_err(CliError::ArgumentParsing)?;
    let mut stdout = Vec::new();
    dispatch(cli.command, factory, &mut stdout)?;
    Ok(serde_json::from_slice(&stdout).expect("command prints JSON"))
}
