//! Error types emitted by the ridetrack CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use ridetrack_core::{EngineError, FetchError, RiderIdentityError};
use ridetrack_data::OverlayLoadError;
use ridetrack_data::location::TrackLoadError;
use ridetrack_data::stops::FetcherBuildError;
use thiserror::Error;

/// Errors emitted by the ridetrack CLI.
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
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The rider or route identifier was blank.
    #[error("invalid rider identity: {0}")]
    InvalidIdentity(#[from] RiderIdentityError),
    /// The recorded track could not be loaded.
    #[error(transparent)]
    LoadTrack(#[from] TrackLoadError),
    /// The route overlay file could not be loaded.
    #[error(transparent)]
    LoadOverlay(#[from] OverlayLoadError),
    /// Constructing the stop-list fetcher failed.
    #[error(transparent)]
    BuildFetcher(#[from] FetcherBuildError),
    /// The stop list could not be fetched.
    #[error("failed to fetch stops from {endpoint}: {source}")]
    FetchStops {
        endpoint: String,
        #[source]
        source: FetchError,
    },
    /// The async runtime could not be started.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The sync engine could not be started.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// The location source refused access.
    #[error("{message}")]
    PermissionDenied { message: String },
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
