//! Location source trait and the stream it hands out.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::PositionSample;

use super::error::LocationError;

/// Lazy stream of fixes for one subscription.
///
/// The stream never ends on its own while the device is healthy. A hardware
/// failure surfaces as an `Err` item. Dropping the stream stops device updates.
pub type PositionStream = BoxStream<'static, Result<PositionSample, LocationError>>;

/// Proof that location access was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessGranted;

/// Accuracy requested from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccuracyMode {
    /// Coarse fixes with modest power use.
    Balanced,
    /// Fine-grained fixes.
    High,
    /// The highest rate and precision the device offers.
    #[default]
    BestForNavigation,
}

/// Produce position fixes from the device.
///
/// Implementations must be restartable: each call to [`watch`](Self::watch)
/// starts an independent subscription, and every subscription releases the
/// device when its stream is dropped, on every exit path. Implementations may
/// coalesce or drop fixes under load; consumers treat the latest fix as
/// authoritative.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use futures_util::{StreamExt, stream};
/// use ridetrack_core::{
///     AccessGranted, AccuracyMode, LocationError, LocationSource, PositionSample, PositionStream,
/// };
///
/// struct FixedSource;
///
/// #[async_trait]
/// impl LocationSource for FixedSource {
///     async fn request_access(&self) -> Result<AccessGranted, LocationError> {
///         Ok(AccessGranted)
///     }
///
///     fn watch(&self, _accuracy: AccuracyMode) -> Result<PositionStream, LocationError> {
///         let fix = PositionSample::now(37.1, -122.1).map_err(|err| LocationError::Hardware {
///             message: err.to_string(),
///         });
///         Ok(stream::iter([fix]).boxed())
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), LocationError> {
/// let source = FixedSource;
/// source.request_access().await?;
/// let mut fixes = source.watch(AccuracyMode::default())?;
/// assert!(fixes.next().await.is_some());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Ask the platform for location access.
    ///
    /// Idempotent. Must precede [`watch`](Self::watch). A
    /// [`LocationError::PermissionDenied`] result is final for the session.
    async fn request_access(&self) -> Result<AccessGranted, LocationError>;

    /// Open a new subscription to device fixes.
    ///
    /// Returns [`LocationError::Hardware`] when the service cannot start; the
    /// caller may try again later.
    fn watch(&self, accuracy: AccuracyMode) -> Result<PositionStream, LocationError>;
}
