//! `ChannelSession` over a TCP stream of line-delimited JSON frames.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::StreamExt;
use log::{debug, info, trace, warn};
use ridetrack_core::{ChannelError, ChannelSession, ChannelState, Delivery, RiderIdentity};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::sync::CancellationToken;

use super::frame::Frame;

/// Default time allowed for the TCP handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest inbound line accepted from the peer, in bytes.
const MAX_INBOUND_LINE: usize = 64 * 1024;

/// Frames allowed to wait for the socket. Sends beyond this are dropped.
pub const OUTBOUND_CAPACITY: usize = 4;

/// Configuration for [`TcpChannelSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpChannelConfig {
    /// Time allowed for the TCP handshake before the attempt is abandoned.
    pub connect_timeout: Duration,
}

impl Default for TcpChannelConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl TcpChannelConfig {
    /// Set the handshake timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Connection bookkeeping guarded by one lock.
///
/// `generation` identifies the current attempt. Background tasks carry the
/// generation they were spawned for and lose every race against a newer one.
#[derive(Debug, Default)]
struct Link {
    state: ChannelState,
    generation: u64,
    endpoint: String,
    outbound: Option<mpsc::Sender<String>>,
    cancel: Option<CancellationToken>,
    last_error: Option<ChannelError>,
}

#[derive(Debug)]
struct Shared {
    link: Mutex<Link>,
    transitions: broadcast::Sender<ChannelState>,
    dropped: AtomicU64,
    config: TcpChannelConfig,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Link> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn announce(&self, link: &mut Link, next: ChannelState) {
        if link.state == next {
            return;
        }
        debug!("channel {} -> {next:?}", link.endpoint);
        link.state = next;
        if self.transitions.send(next).is_err() {
            trace!("no listeners for channel transitions");
        }
    }

    /// Promote attempt `generation` to connected. Fails if it was superseded.
    fn establish(&self, generation: u64, outbound: mpsc::Sender<String>) -> bool {
        let mut link = self.lock();
        if link.generation != generation {
            return false;
        }
        link.outbound = Some(outbound);
        link.last_error = None;
        self.announce(&mut link, ChannelState::Connected);
        true
    }

    /// End attempt `generation`, recording `error` if it is still current.
    fn settle(&self, generation: u64, error: Option<ChannelError>) {
        let mut link = self.lock();
        if link.generation != generation {
            return;
        }
        if let Some(err) = error {
            warn!("{err}");
            link.last_error = Some(err);
        }
        link.outbound = None;
        link.cancel = None;
        self.announce(&mut link, ChannelState::Disconnected);
    }

    fn transport_error(&self, generation: u64, message: impl Into<String>) {
        let endpoint = self.lock().endpoint.clone();
        self.settle(
            generation,
            Some(ChannelError::Transport {
                endpoint,
                message: message.into(),
            }),
        );
    }
}

/// Channel session speaking newline-delimited JSON frames over TCP.
///
/// [`connect`](ChannelSession::connect) spawns the connection onto the
/// current Tokio runtime and returns immediately. Once the stream is open the
/// session writes a `join` frame carrying the rider identity, then reports
/// [`ChannelState::Connected`]. Outbound frames go through a queue of
/// [`OUTBOUND_CAPACITY`] drained by the connection task, so
/// [`send`](ChannelSession::send) never blocks. While the socket is backed up
/// and the queue is full, further sends are dropped. Any read or write failure moves the session back to
/// [`ChannelState::Disconnected`]; the session never reconnects on its own.
///
/// # Example
///
/// ```no_run
/// use ridetrack_core::{ChannelSession, RiderIdentity};
/// use ridetrack_data::channel::TcpChannelSession;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let session = TcpChannelSession::new();
/// let mut states = session.subscribe_state();
/// session.connect("127.0.0.1:5000", &RiderIdentity::new("rider-7", "42")?);
/// println!("{:?}", states.recv().await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TcpChannelSession {
    shared: Arc<Shared>,
}

impl Default for TcpChannelSession {
    fn default() -> Self {
        Self::with_config(TcpChannelConfig::default())
    }
}

impl TcpChannelSession {
    /// Create a session with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with explicit configuration.
    #[must_use]
    pub fn with_config(config: TcpChannelConfig) -> Self {
        let (transitions, _) = broadcast::channel(16);
        Self {
            shared: Arc::new(Shared {
                link: Mutex::default(),
                transitions,
                dropped: AtomicU64::new(0),
                config,
            }),
        }
    }

    /// The failure that ended the most recent connection, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<ChannelError> {
        self.shared.lock().last_error.clone()
    }
}

impl ChannelSession for TcpChannelSession {
    fn connect(&self, endpoint: &str, identity: &RiderIdentity) {
        let mut link = self.shared.lock();
        if link.state != ChannelState::Disconnected {
            debug!("connect ignored; channel already {:?}", link.state);
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!("{}", ChannelError::NoRuntime);
            link.last_error = Some(ChannelError::NoRuntime);
            return;
        };

        link.generation += 1;
        let generation = link.generation;
        let cancel = CancellationToken::new();
        link.endpoint = endpoint.to_owned();
        link.cancel = Some(cancel.clone());
        self.shared.announce(&mut link, ChannelState::Connecting);
        drop(link);

        info!(
            "connecting to {endpoint} as rider {} on route {}",
            identity.id(),
            identity.route_id()
        );
        runtime.spawn(run_connection(
            Arc::clone(&self.shared),
            generation,
            endpoint.to_owned(),
            identity.clone(),
            cancel,
        ));
    }

    fn send(&self, event: &str, payload: serde_json::Value) -> Delivery {
        let link = self.shared.lock();
        let queued = match (&link.outbound, link.state) {
            (Some(outbound), ChannelState::Connected) => match Frame::new(event, payload).encode()
            {
                Ok(line) => match outbound.try_send(line) {
                    Ok(()) => true,
                    Err(TrySendError::Full(_)) => {
                        debug!("dropping {event}; outbound queue full");
                        false
                    }
                    Err(TrySendError::Closed(_)) => {
                        trace!("dropping {event}; connection task gone");
                        false
                    }
                },
                Err(err) => {
                    warn!("failed to encode {event} frame: {err}");
                    false
                }
            },
            _ => {
                trace!("dropping {event}; channel not connected");
                false
            }
        };
        drop(link);

        if queued {
            Delivery::Dispatched
        } else {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            Delivery::Dropped
        }
    }

    fn disconnect(&self) -> Result<(), ChannelError> {
        let mut link = self.shared.lock();
        link.generation += 1;
        link.outbound = None;
        if let Some(cancel) = link.cancel.take() {
            cancel.cancel();
        }
        self.shared.announce(&mut link, ChannelState::Disconnected);
        Ok(())
    }

    fn state(&self) -> ChannelState {
        self.shared.lock().state
    }

    fn subscribe_state(&self) -> broadcast::Receiver<ChannelState> {
        self.shared.transitions.subscribe()
    }

    fn dropped_sends(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for TcpChannelSession {
    fn drop(&mut self) {
        if let Some(cancel) = self.shared.lock().cancel.take() {
            cancel.cancel();
        }
    }
}

async fn run_connection(
    shared: Arc<Shared>,
    generation: u64,
    endpoint: String,
    identity: RiderIdentity,
    cancel: CancellationToken,
) {
    let connect = tokio::time::timeout(
        shared.config.connect_timeout,
        TcpStream::connect(endpoint.as_str()),
    );
    let stream = tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        outcome = connect => match outcome {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => return shared.transport_error(generation, err.to_string()),
            Err(_) => return shared.transport_error(
                generation,
                format!("connect timed out after {:?}", shared.config.connect_timeout),
            ),
        },
    };

    if let Err(err) = stream.set_nodelay(true) {
        debug!("could not disable Nagle on {endpoint}: {err}");
    }
    let (reader, mut writer) = stream.into_split();
    let join = match Frame::join(&identity).and_then(|frame| frame.encode()) {
        Ok(line) => line,
        Err(err) => return shared.transport_error(generation, err.to_string()),
    };
    if let Err(err) = writer.write_all(join.as_bytes()).await {
        return shared.transport_error(generation, err.to_string());
    }

    let (outbound, queue) = mpsc::channel(OUTBOUND_CAPACITY);
    if !shared.establish(generation, outbound) {
        close(writer).await;
        return;
    }

    let error = pump(&mut writer, reader, queue, &cancel).await;
    close(writer).await;
    match error {
        Some(message) => shared.transport_error(generation, message),
        None => shared.settle(generation, None),
    }
}

/// Drain the outbound queue and watch the inbound side until either ends.
///
/// Returns the transport failure, if one ended the connection.
async fn pump(
    writer: &mut OwnedWriteHalf,
    reader: tokio::net::tcp::OwnedReadHalf,
    mut queue: mpsc::Receiver<String>,
    cancel: &CancellationToken,
) -> Option<String> {
    let mut inbound = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_INBOUND_LINE));
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            line = queue.recv() => {
                let Some(line) = line else { return None };
                if let Err(err) = writer.write_all(line.as_bytes()).await {
                    return Some(err.to_string());
                }
            }
            received = inbound.next() => match received {
                Some(Ok(line)) => match Frame::decode(&line) {
                    Ok(frame) => debug!("received {} frame", frame.event),
                    Err(err) => trace!("ignoring malformed inbound line: {err}"),
                },
                Some(Err(err)) => return Some(err.to_string()),
                None => return Some("peer closed the connection".to_owned()),
            },
        }
    }
}

async fn close(mut writer: OwnedWriteHalf) {
    if let Err(err) = writer.shutdown().await {
        debug!("channel shutdown: {err}");
    }
}
