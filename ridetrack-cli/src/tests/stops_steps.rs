//! Behaviour-driven step definitions driving the stops CLI scenarios.

use super::helpers::StubFetcherBuilder;
use super::*;
use crate::stops::run_stops_with;
use ridetrack_core::{FetchError, STOP_LIST_FAILURE_MESSAGE};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;

#[derive(Debug, Default)]
struct StopsWorld {
    builder: RefCell<Option<StubFetcherBuilder>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl StopsWorld {
    fn printed(&self) -> serde_json::Value {
        serde_json::from_slice(&self.stdout.borrow()).expect("stdout should hold JSON")
    }
}

#[fixture]
fn world() -> StopsWorld {
    StopsWorld::default()
}

#[given("the stop-list service publishes no stops")]
fn service_publishes_nothing(#[from(world)] world: &StopsWorld) {
    world
        .builder
        .replace(Some(StubFetcherBuilder::answering(Ok(Vec::new()))));
}

#[given("the stop-list service is unreachable")]
fn service_unreachable(#[from(world)] world: &StopsWorld) {
    world
        .builder
        .replace(Some(StubFetcherBuilder::answering(Err(
            FetchError::NetworkError {
                url: "http://localhost:5000/busstops".to_owned(),
                message: "connection refused".to_owned(),
            },
        ))));
}

#[when("I run the stops command")]
fn run_stops_command(#[from(world)] world: &StopsWorld) {
    let parsed = Cli::try_parse_from(["ridetrack", "stops"]).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Stops(args) => {
            let builder = world.builder.borrow();
            let builder = builder.as_ref().expect("service configured");
            let mut buffer = world.stdout.borrow_mut();
            run_stops_with(args, builder, &mut *buffer)
        }
        Command::Track(_) => panic!("expected stops command"),
    });
    world.result.replace(Some(outcome));
}

#[then("the command succeeds and prints a loaded stop list with no stops")]
fn prints_empty_list(#[from(world)] world: &StopsWorld) {
    let borrowed = world.result.borrow();
    borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect("expected success");

    let printed = world.printed();
    assert_eq!(printed["state"], "loaded");
    assert_eq!(printed["detail"], serde_json::json!([]));
}

#[then("the command fails because the stop list could not be fetched")]
fn fails_with_fetch_error(#[from(world)] world: &StopsWorld) {
    let borrowed = world.result.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::FetchStops { source, .. } => {
            assert!(matches!(source, FetchError::NetworkError { .. }));
        }
        other => panic!("expected FetchStops, found {other:?}"),
    }
}

#[then("the stop-list error message is printed")]
fn prints_error_message(#[from(world)] world: &StopsWorld) {
    let printed = world.printed();
    assert_eq!(printed["state"], "failed");
    assert_eq!(printed["detail"], STOP_LIST_FAILURE_MESSAGE);
}

macro_rules! register_stops_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/stops_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: StopsWorld) {
            let _ = world;
        }
    };
}

register_stops_scenario!(stops_empty_list, "printing an empty stop list");
register_stops_scenario!(stops_failed_fetch, "reporting a failed fetch");
