//! Configuration layering across files, environment and CLI flags.

use super::*;
use crate::{ingest, nearby};
use camino::Utf8PathBuf;
use ortho_config::MergeComposer;
use rstest::rstest;
use serde_json::json;

#[rstest]
fn nearby_layers_map_configuration_errors() {
    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "zoom": "street level" }));

    let err = nearby::settings_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn nearby_layers_honour_precedence() {
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "zoom": 12,
            "user": "from-file",
            "api_key": "file-key",
            "database": "/var/lib/snappoint/places.db",
        }),
        None,
    );
    composer.push_environment(json!({
        "lat": 41.0,
        "lon": 28.97,
        "user": "from-env",
    }));
    composer.push_cli(json!({ "zoom": 17 }));

    let settings =
        nearby::settings_from_layers_for_test(composer.layers()).expect("merged config builds");
    assert_eq!(settings.query.zoom_level, 17);
    assert_eq!(settings.user, "from-env");
    assert_eq!(settings.provider.api_key.as_deref(), Some("file-key"));
    assert_eq!(
        settings.database,
        Utf8PathBuf::from("/var/lib/snappoint/places.db")
    );
}

#[rstest]
fn ingest_layers_fill_gaps_from_the_environment() {
    let mut composer = MergeComposer::new();
    composer.push_file(json!({ "max_pages": 2, "radius_km": 5.0 }), None);
    composer.push_environment(json!({ "lat": -16.5, "lon": 179.9 }));
    composer.push_cli(json!({ "radius_km": 1.5 }));

    let settings =
        ingest::settings_from_layers_for_test(composer.layers()).expect("merged config builds");
    assert_eq!(settings.config.max_pages, 2);
    assert!((settings.request.radius_km - 1.5).abs() < f64::EPSILON);
    assert!((settings.request.center.x - 179.9).abs() < f64::EPSILON);
    assert!((settings.request.center.y + 16.5).abs() < f64::EPSILON);
}
