use thiserror::Error;

/// Errors from [`crate::location::LocationSource`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The user refused location access.
    ///
    /// Terminal for the session: nothing retries after a denial.
    #[error("Permission denied. Please enable location services in your device settings.")]
    PermissionDenied,
    /// The location service failed after access was granted.
    ///
    /// Callers may open a new watch to resume.
    #[error("location hardware unavailable: {message}")]
    Hardware {
        /// Description of the failure from the platform.
        message: String,
    },
}

impl LocationError {
    /// Whether the error ends the session.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}
