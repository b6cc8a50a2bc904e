//! Focused unit tests covering stops CLI configuration and output.

use super::helpers::StubFetcherBuilder;
use super::*;
use crate::stops::{StopsArgs, StopsConfig, config_from_layers_for_test, run_stops_with};
use ridetrack_core::{FetchError, STOP_LIST_FAILURE_MESSAGE, StopOfInterest};
use ridetrack_data::stops::DEFAULT_STOP_LIST_ENDPOINT;
use rstest::rstest;
use std::time::Duration;

#[rstest]
fn stops_config_falls_back_to_defaults() {
    let config = StopsConfig::from(StopsArgs::default());

    assert_eq!(config.endpoint, DEFAULT_STOP_LIST_ENDPOINT);
    assert_eq!(config.timeout, Duration::from_secs(30));
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({ "endpoint": "http://from-file/busstops", "timeout_secs": 9 }),
        None,
    );
    composer.push_environment(json!({ "endpoint": "http://from-env/busstops" }));

    let config = config_from_layers_for_test(composer.layers()).expect("merged config");
    assert_eq!(config.endpoint, "http://from-env/busstops");
    assert_eq!(config.timeout, Duration::from_secs(9));
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "timeout_secs": "soon" }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn prints_loaded_stops_as_json() {
    let stop = StopOfInterest::new("s1", "Gares", 48.1, -1.6, "Rennes", "STAR").expect("stop");
    let builder = StubFetcherBuilder::answering(Ok(vec![stop]));
    let args = StopsArgs {
        timeout_secs: Some(3),
        ..StopsArgs::default()
    };
    let mut stdout = Vec::new();

    run_stops_with(args, &builder, &mut stdout).expect("stops command succeeds");

    let printed: serde_json::Value = serde_json::from_slice(&stdout).expect("JSON output");
    assert_eq!(printed["state"], "loaded");
    assert_eq!(printed["detail"][0]["id"], "s1");
    assert_eq!(builder.timeouts(), [Duration::from_secs(3)]);
}

#[rstest]
fn failed_fetch_prints_message_and_errors() {
    let builder = StubFetcherBuilder::answering(Err(FetchError::ParseError {
        message: "expected an array".to_owned(),
    }));
    let mut stdout = Vec::new();

    let err = run_stops_with(StopsArgs::default(), &builder, &mut stdout)
        .expect_err("failed fetch should surface");

    match err {
        CliError::FetchStops { source, .. } => {
            assert!(matches!(source, FetchError::ParseError { .. }));
        }
        other => panic!("expected FetchStops, found {other:?}"),
    }
    let printed: serde_json::Value = serde_json::from_slice(&stdout).expect("JSON output");
    assert_eq!(printed["state"], "failed");
    assert_eq!(printed["detail"], STOP_LIST_FAILURE_MESSAGE);
}
