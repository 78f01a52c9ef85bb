//! Behaviour-driven step definitions driving the command scenarios.

use super::helpers::{OLD_TOWN, ScriptedFactory, Workspace, landmarks_page, run_cli};
use super::*;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;
use snappoint_core::{PlaceStore, ProviderError};
use std::cell::RefCell;

/// Scenario state shared by every step.
#[derive(Debug)]
struct CommandWorld {
    workspace: Workspace,
    factory: RefCell<ScriptedFactory>,
    outcome: RefCell<Option<Result<Value, CliError>>>,
}

impl CommandWorld {
    fn new() -> Self {
        Self {
            workspace: Workspace::new(),
            factory: RefCell::new(ScriptedFactory::default()),
            outcome: RefCell::new(None),
        }
    }

    fn run(&self, mut argv: Vec<String>) {
        argv.extend([
            format!("--{ARG_DATABASE}"),
            self.workspace.database().as_str().to_owned(),
        ]);
        let outcome = run_cli(&argv, &*self.factory.borrow());
        self.outcome.replace(Some(outcome));
    }

    fn output(&self) -> Value {
        let borrowed = self.outcome.borrow();
        match borrowed.as_ref().expect("a command ran") {
            Ok(value) => value.clone(),
            Err(err) => panic!("expected success, found {err:?}"),
        }
    }

    fn nearby_argv(user: &str) -> Vec<String> {
        vec![
            "nearby".to_owned(),
            format!("--{ARG_LATITUDE}"),
            OLD_TOWN.y.to_string(),
            format!("--{ARG_LONGITUDE}"),
            OLD_TOWN.x.to_string(),
            format!("--{ARG_ZOOM}"),
            "16".to_owned(),
            format!("--{ARG_USER}"),
            user.to_owned(),
        ]
    }

    fn check_in_argv(place_id: u64, lat: f64, lon: f64) -> Vec<String> {
        vec![
            "check-in".to_owned(),
            format!("--{ARG_PLACE_ID}"),
            place_id.to_string(),
            format!("--{ARG_LATITUDE}"),
            lat.to_string(),
            format!("--{ARG_LONGITUDE}"),
            lon.to_string(),
        ]
    }
}

#[fixture]
fn world() -> CommandWorld {
    CommandWorld::new()
}

#[given("an empty place database")]
fn empty_database(#[from(world)] world: &CommandWorld) {
    assert!(!world.workspace.database().exists());
}

#[given("the provider returns three landmarks")]
fn provider_returns_landmarks(#[from(world)] world: &CommandWorld) {
    world
        .factory
        .replace(ScriptedFactory::new(vec![Ok(landmarks_page())]));
}

#[given("the provider denies access")]
fn provider_denies_access(#[from(world)] world: &CommandWorld) {
    world
        .factory
        .replace(ScriptedFactory::new(vec![Err(ProviderError::AccessDenied)]));
}

#[when("I list nearby places around the old town as {user:word}")]
fn list_nearby(#[from(world)] world: &CommandWorld, user: String) {
    world.run(CommandWorld::nearby_argv(user.trim_matches('"')));
}

#[when("I ingest the old town")]
fn ingest_old_town(#[from(world)] world: &CommandWorld) {
    world.run(vec![
        "ingest".to_owned(),
        format!("--{ARG_LATITUDE}"),
        OLD_TOWN.y.to_string(),
        format!("--{ARG_LONGITUDE}"),
        OLD_TOWN.x.to_string(),
        format!("--{ARG_RADIUS_KM}"),
        "2".to_owned(),
    ]);
    let report = world.output();
    assert_eq!(report["saved"], 3, "unexpected report {report}");
}

#[when("I check in at place {id} from its own position")]
fn check_in_at_place(#[from(world)] world: &CommandWorld, id: u64) {
    let store = open_store(world.workspace.database()).expect("open database");
    let place = store
        .get(id)
        .expect("read place")
        .expect("place was ingested");
    drop(store);
    world.run(CommandWorld::check_in_argv(
        id,
        place.location.y,
        place.location.x,
    ));
}

#[when("I check in at place {id} from the old town")]
fn check_in_from_old_town(#[from(world)] world: &CommandWorld, id: u64) {
    world.run(CommandWorld::check_in_argv(id, OLD_TOWN.y, OLD_TOWN.x));
}

#[when("{user:word} posts at place {id}")]
fn user_posts(#[from(world)] world: &CommandWorld, user: String, id: u64) {
    // Gherkin quotes stay attached to word placeholders.
    world.run(vec![
        "post".to_owned(),
        format!("--{ARG_PLACE_ID}"),
        id.to_string(),
        format!("--{ARG_USER}"),
        user.trim_matches('"').to_owned(),
    ]);
}

#[then("{count} markers are printed")]
fn markers_printed(#[from(world)] world: &CommandWorld, count: usize) {
    let output = world.output();
    let markers = output["markers"].as_array().expect("markers array");
    assert_eq!(markers.len(), count);
    assert_eq!(output["filters"]["zoomLevel"], 16);
}

#[then("the provider was built once")]
fn provider_built_once(#[from(world)] world: &CommandWorld) {
    let factory = world.factory.borrow();
    assert_eq!(factory.builds(), 1);
    let settings = factory.last_settings().expect("provider settings recorded");
    assert_eq!(settings.places_url, None);
}

#[then("the check-in is within the geofence")]
fn check_in_within(#[from(world)] world: &CommandWorld) {
    let output = world.output();
    assert_eq!(output["is_within_radius"], true);
    assert_eq!(output["distance_meters"], 0);
    assert!(output.get("distance_difference").is_none());
}

#[then("the post summary counts {count} post")]
fn post_summary_counts(#[from(world)] world: &CommandWorld, count: u64) {
    let output = world.output();
    assert_eq!(output["postCount"], count);
    assert_eq!(output["placeId"], 1);
}

#[then("{user:word} sees place {id} worth {points} point")]
fn user_sees_value(#[from(world)] world: &CommandWorld, user: String, id: u64, points: u32) {
    world.run(CommandWorld::nearby_argv(user.trim_matches('"')));
    let output = world.output();
    let markers = output["markers"].as_array().expect("markers array");
    let marker = markers
        .iter()
        .find(|marker| marker["id"] == id)
        .expect("marker for the posted place");
    assert_eq!(marker["pointValue"], points);
}

#[then("the CLI reports place {id} as not found")]
fn reports_not_found(#[from(world)] world: &CommandWorld, id: u64) {
    let borrowed = world.outcome.borrow();
    let error = borrowed
        .as_ref()
        .expect("a command ran")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::PlaceNotFound { id: missing } => assert_eq!(*missing, id),
        other => panic!("unexpected error {other:?}"),
    }
}

macro_rules! register_command_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/commands.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: CommandWorld) {
            let _ = world;
        }
    };
}

register_command_scenario!(
    nearby_fills_sparse_area,
    "nearby fills a sparse area from the provider"
);
register_command_scenario!(
    nearby_degrades_to_stored_places,
    "nearby degrades to stored places when the provider refuses"
);
register_command_scenario!(
    check_in_at_ingested_landmark,
    "checking in at an ingested landmark"
);
register_command_scenario!(
    posting_lowers_poster_value,
    "posting lowers the value for the poster"
);
register_command_scenario!(check_in_at_unknown_place, "checking in at an unknown place");
