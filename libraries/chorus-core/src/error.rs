/// Core error types for Chorus
use thiserror::Error;

/// Result type alias using `ChorusError`
pub type Result<T> = std::result::Result<T, ChorusError>;

/// Core error type shared by every collaborator seam
///
/// Every variant is scoped to one session or one operation; none of them is
/// fatal to the process.
#[derive(Error, Debug)]
pub enum ChorusError {
    /// Query or URL could not be resolved to a track
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Source rejected or rate-limited a materialization request
    #[error("Not available: {0}")]
    NotAvailable(String),

    /// Voice transport failed to connect, start, stop or disconnect
    #[error("Transport error: {0}")]
    Transport(String),

    /// Session store read/write failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Snapshot read/write failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Notifier failed to send or delete a message
    #[error("Notification error: {0}")]
    Notification(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl ChorusError {
    /// Create a resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a not-available error
    pub fn not_available(msg: impl Into<String>) -> Self {
        Self::NotAvailable(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a notification error
    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error came from the track resolver
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution(_) | Self::NotAvailable(_))
    }
}
