//! Stop-list command implementation for the ridetrack CLI.

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use ridetrack_core::{StopListFetcher, StopListState};
use ridetrack_data::stops::{
    DEFAULT_STOP_LIST_ENDPOINT, HttpStopListFetcher, HttpStopListFetcherConfig,
};
use serde::{Deserialize, Serialize};

use crate::{ARG_STOPS_ENDPOINT, ARG_STOPS_TIMEOUT, CliError, build_runtime, write_json_line};

/// CLI arguments for the `stops` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fetch the stop list once and print the outcome as JSON. \
                 A failed fetch prints the user-facing error state and exits \
                 with a non-zero status.",
    about = "Fetch and print the stop list"
)]
#[ortho_config(prefix = "RIDETRACK")]
pub(crate) struct StopsArgs {
    /// URL of the stop-list API.
    #[arg(long = ARG_STOPS_ENDPOINT, value_name = "url")]
    #[serde(default)]
    pub(crate) endpoint: Option<String>,
    /// Request timeout in seconds.
    #[arg(long = ARG_STOPS_TIMEOUT, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

impl StopsArgs {
    pub(crate) fn into_config(self) -> Result<StopsConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(StopsConfig::from(merged))
    }
}

/// Resolved `stops` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StopsConfig {
    pub(crate) endpoint: String,
    pub(crate) timeout: Duration,
}

impl From<StopsArgs> for StopsConfig {
    fn from(args: StopsArgs) -> Self {
        let defaults = HttpStopListFetcherConfig::default();
        Self {
            endpoint: args
                .endpoint
                .unwrap_or_else(|| DEFAULT_STOP_LIST_ENDPOINT.to_owned()),
            timeout: args
                .timeout_secs
                .map_or(defaults.timeout, Duration::from_secs),
        }
    }
}

/// Builds the stop-list fetcher for a command invocation.
pub(crate) trait FetcherBuilder {
    fn build(&self, timeout: Duration) -> Result<Box<dyn StopListFetcher>, CliError>;
}

pub(crate) struct HttpFetcherBuilder;

impl FetcherBuilder for HttpFetcherBuilder {
    fn build(&self, timeout: Duration) -> Result<Box<dyn StopListFetcher>, CliError> {
        let config = HttpStopListFetcherConfig::default().with_timeout(timeout);
        Ok(Box::new(HttpStopListFetcher::with_config(config)?))
    }
}

pub(super) fn run_stops(args: StopsArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_stops_with(args, &HttpFetcherBuilder, &mut stdout)
}

pub(super) fn run_stops_with(
    args: StopsArgs,
    builder: &dyn FetcherBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let fetcher = builder.build(config.timeout)?;
    let outcome = build_runtime()?.block_on(fetcher.fetch(&config.endpoint));

    write_json_line(writer, &StopListState::from(outcome.clone()))?;
    outcome
        .map(drop)
        .map_err(|source| CliError::FetchStops {
            endpoint: config.endpoint,
            source,
        })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<StopsConfig, CliError> {
    let merged = StopsArgs::merge_from_layers(layers).map_err(CliError::from)?;
    Ok(StopsConfig::from(merged))
}
