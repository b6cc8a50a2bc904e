//! Track command implementation for the ridetrack CLI.
//!
//! The command replays a recorded track through [`SyncEngine`], prints every
//! engine snapshot as a JSON line while it runs, and finishes with the
//! rendered screen state.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::{info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use ridetrack_core::{
    ChannelSession, DEFAULT_ENDPOINT, EngineConfig, EngineSnapshot, EngineStatus, RiderIdentity,
    RouteOverlayTable, StopListState, SyncEngine, render_screen,
};
use ridetrack_data::channel::TcpChannelSession;
use ridetrack_data::load_overlay_table;
use ridetrack_data::location::{DEFAULT_REPLAY_INTERVAL, ReplayConfig, ReplayLocationSource};
use ridetrack_data::stops::HttpStopListFetcherConfig;
use serde::{Deserialize, Serialize};

use crate::stops::{FetcherBuilder, HttpFetcherBuilder};
use crate::{
    ARG_TRACK_CHANNEL, ARG_TRACK_DURATION, ARG_TRACK_INTERVAL, ARG_TRACK_LOOP, ARG_TRACK_OVERLAY,
    ARG_TRACK_PATH, ARG_TRACK_RIDER_ID, ARG_TRACK_ROUTE_ID, ARG_TRACK_STOPS, CliError,
    ENV_TRACK_PATH, ENV_TRACK_RIDER_ID, ENV_TRACK_ROUTE_ID, build_runtime, write_json_line,
};

/// CLI arguments for the `track` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Replay a recorded track (one JSON fix per line) as the \
                 device location, forwarding fixes to the live channel while \
                 it is connected. Runs until interrupted or until the \
                 optional duration elapses.",
    about = "Replay a recorded track through the sync engine"
)]
#[ortho_config(prefix = "RIDETRACK")]
pub(crate) struct TrackArgs {
    /// Path to the recorded track file.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) track_path: Option<Utf8PathBuf>,
    /// Identifier announced for the rider.
    #[arg(long = ARG_TRACK_RIDER_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) rider_id: Option<String>,
    /// Route the rider travels on.
    #[arg(long = ARG_TRACK_ROUTE_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) route_id: Option<String>,
    /// Live channel address (e.g. "127.0.0.1:5000").
    #[arg(long = ARG_TRACK_CHANNEL, value_name = "host:port")]
    #[serde(default)]
    pub(crate) channel_endpoint: Option<String>,
    /// Pause between replayed fixes in milliseconds.
    #[arg(long = ARG_TRACK_INTERVAL, value_name = "ms")]
    #[serde(default)]
    pub(crate) interval_ms: Option<u64>,
    /// Start the track again after its last fix.
    #[arg(long = ARG_TRACK_LOOP, value_name = "bool", num_args = 0..=1, default_missing_value = "true")]
    #[serde(default)]
    pub(crate) loop_track: Option<bool>,
    /// Stop after this many milliseconds instead of waiting for Ctrl-C.
    #[arg(long = ARG_TRACK_DURATION, value_name = "ms")]
    #[serde(default)]
    pub(crate) duration_ms: Option<u64>,
    /// Route overlay table to draw on the final screen.
    #[arg(long = ARG_TRACK_OVERLAY, value_name = "path")]
    #[serde(default)]
    pub(crate) overlay: Option<Utf8PathBuf>,
    /// Stop-list API to fetch markers from.
    #[arg(long = ARG_TRACK_STOPS, value_name = "url")]
    #[serde(default)]
    pub(crate) stops_endpoint: Option<String>,
}

impl TrackArgs {
    pub(crate) fn into_config(self) -> Result<TrackConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        TrackConfig::try_from(merged)
    }
}

/// Resolved `track` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrackConfig {
    pub(crate) track_path: Utf8PathBuf,
    pub(crate) identity: RiderIdentity,
    pub(crate) channel_endpoint: String,
    pub(crate) replay: ReplayConfig,
    pub(crate) duration: Option<Duration>,
    pub(crate) overlay: Option<Utf8PathBuf>,
    pub(crate) stops_endpoint: Option<String>,
}

impl TrackConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_existing(&self.track_path, ARG_TRACK_PATH)?;
        if let Some(overlay) = &self.overlay {
            Self::require_existing(overlay, ARG_TRACK_OVERLAY)?;
        }
        Ok(())
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match ridetrack_fs::file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) if path.exists() => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Ok(false) => Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl TryFrom<TrackArgs> for TrackConfig {
    type Error = CliError;

    fn try_from(args: TrackArgs) -> Result<Self, Self::Error> {
        let track_path = args.track_path.ok_or(CliError::MissingArgument {
            field: ARG_TRACK_PATH,
            env: ENV_TRACK_PATH,
        })?;
        let rider_id = args.rider_id.ok_or(CliError::MissingArgument {
            field: ARG_TRACK_RIDER_ID,
            env: ENV_TRACK_RIDER_ID,
        })?;
        let route_id = args.route_id.ok_or(CliError::MissingArgument {
            field: ARG_TRACK_ROUTE_ID,
            env: ENV_TRACK_ROUTE_ID,
        })?;

        let replay = ReplayConfig::default()
            .with_interval(
                args.interval_ms
                    .map_or(DEFAULT_REPLAY_INTERVAL, Duration::from_millis),
            )
            .with_looping(args.loop_track.unwrap_or(false));

        Ok(Self {
            track_path,
            identity: RiderIdentity::new(rider_id, route_id)?,
            channel_endpoint: args
                .channel_endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            replay,
            duration: args.duration_ms.map(Duration::from_millis),
            overlay: args.overlay,
            stops_endpoint: args.stops_endpoint,
        })
    }
}

/// Collaborators the track command wires into the engine.
pub(super) struct TrackAdapters<'a> {
    pub(super) channel: Arc<dyn ChannelSession>,
    pub(super) fetchers: &'a dyn FetcherBuilder,
}

pub(super) fn run_track(args: TrackArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    let adapters = TrackAdapters {
        channel: Arc::new(TcpChannelSession::new()),
        fetchers: &HttpFetcherBuilder,
    };
    run_track_with(args, adapters, &mut stdout)
}

pub(super) fn run_track_with(
    args: TrackArgs,
    adapters: TrackAdapters<'_>,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = resolve_track_config(args)?;
    let location = ReplayLocationSource::from_path(&config.track_path, config.replay)?;
    info!(
        "replaying {} fixes from {}",
        location.len(),
        config.track_path
    );
    let overlays = match &config.overlay {
        Some(path) => load_overlay_table(path)?,
        None => RouteOverlayTable::default(),
    };
    let fetcher = match &config.stops_endpoint {
        Some(_) => Some(
            adapters
                .fetchers
                .build(HttpStopListFetcherConfig::default().timeout)?,
        ),
        None => None,
    };

    let runtime = build_runtime()?;
    let (last, stops) = runtime.block_on(async {
        let engine = SyncEngine::new(
            Arc::new(location),
            adapters.channel,
            config.identity.clone(),
            EngineConfig::new(config.channel_endpoint.clone()),
        );
        let stops = async {
            match (&fetcher, &config.stops_endpoint) {
                (Some(fetcher), Some(endpoint)) => {
                    StopListState::from(fetcher.fetch(endpoint).await)
                }
                _ => StopListState::Loaded(Vec::new()),
            }
        };
        let (last, stops) = tokio::join!(
            drive(engine, config.duration, tokio::signal::ctrl_c(), writer),
            stops
        );
        last.map(|last| (last, stops))
    })?;

    let screen = render_screen(&last, &stops, &overlays, config.identity.route_id());
    write_json_line(writer, &screen)?;
    match last.status {
        EngineStatus::PermissionDenied { message } => Err(CliError::PermissionDenied { message }),
        _ => Ok(()),
    }
}

fn resolve_track_config(args: TrackArgs) -> Result<TrackConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

/// Run the engine, printing each snapshot, until it ends, the deadline
/// passes or `interrupt` fires.
///
/// A failed `interrupt` listener is logged and ignored; the run then ends
/// only with the engine or the deadline.
pub(crate) async fn drive(
    engine: SyncEngine,
    duration: Option<Duration>,
    interrupt: impl Future<Output = std::io::Result<()>>,
    writer: &mut dyn Write,
) -> Result<EngineSnapshot, CliError> {
    let handle = engine.start()?;
    let mut snapshots = handle.subscribe();
    let deadline = run_for(duration);
    tokio::pin!(deadline, interrupt);
    let mut listening = true;

    let initial = snapshots.borrow_and_update().clone();
    write_json_line(writer, &initial)?;
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                write_json_line(writer, &snapshot)?;
            }
            () = &mut deadline => {
                info!("replay duration elapsed");
                break;
            }
            signal = &mut interrupt, if listening => match signal {
                Ok(()) => {
                    info!("interrupted; stopping");
                    break;
                }
                Err(err) => {
                    warn!("failed to listen for Ctrl-C: {err}");
                    listening = false;
                }
            },
        }
    }
    Ok(handle.stop().await)
}

async fn run_for(duration: Option<Duration>) {
    match duration {
        Some(limit) => tokio::time::sleep(limit).await,
        None => std::future::pending().await,
    }
}
