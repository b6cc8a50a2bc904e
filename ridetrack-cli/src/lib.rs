//! Command-line interface for driving the ridetrack engine from recorded data.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::runtime::Runtime;

mod error;
mod stops;
mod track;

pub use error::CliError;
use stops::{StopsArgs, run_stops};
use track::{TrackArgs, run_track};

const ARG_STOPS_ENDPOINT: &str = "endpoint";
const ARG_STOPS_TIMEOUT: &str = "timeout-secs";
const ARG_TRACK_PATH: &str = "track-path";
const ARG_TRACK_RIDER_ID: &str = "rider-id";
const ARG_TRACK_ROUTE_ID: &str = "route-id";
const ARG_TRACK_CHANNEL: &str = "channel-endpoint";
const ARG_TRACK_INTERVAL: &str = "interval-ms";
const ARG_TRACK_LOOP: &str = "loop-track";
const ARG_TRACK_DURATION: &str = "duration-ms";
const ARG_TRACK_OVERLAY: &str = "overlay";
const ARG_TRACK_STOPS: &str = "stops-endpoint";
const ENV_TRACK_PATH: &str = "RIDETRACK_CMDS_TRACK_TRACK_PATH";
const ENV_TRACK_RIDER_ID: &str = "RIDETRACK_CMDS_TRACK_RIDER_ID";
const ENV_TRACK_ROUTE_ID: &str = "RIDETRACK_CMDS_TRACK_ROUTE_ID";

/// Run the ridetrack CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Stops(args) => run_stops(args),
        Command::Track(args) => run_track(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "ridetrack",
    about = "Drive the live position sync engine from recorded data",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch and print the stop list.
    Stops(StopsArgs),
    /// Replay a recorded track through the sync engine.
    Track(TrackArgs),
}

fn build_runtime() -> Result<Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
}

/// Write `value` as one line of compact JSON.
fn write_json_line<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
