use thiserror::Error;

/// Errors from [`crate::channel::ChannelSession`] lifecycle operations.
///
/// Sends never fail loudly; see [`crate::channel::Delivery`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The transport failed while opening or closing the connection.
    #[error("channel transport error at {endpoint}: {message}")]
    Transport {
        /// Endpoint the session was bound to.
        endpoint: String,
        /// Description of the failure.
        message: String,
    },
    /// No async runtime was available to drive the connection.
    #[error("no async runtime available to drive the channel")]
    NoRuntime,
}
