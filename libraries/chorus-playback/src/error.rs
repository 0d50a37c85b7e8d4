//! Error types for playback management

use chorus_core::ChorusError;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The player has no voice connection
    #[error("Not connected to a voice channel")]
    NotConnected,

    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Collaborator failure (resolver, transport, store, notifier)
    #[error(transparent)]
    Core(#[from] ChorusError),

    /// Runtime options could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// User-facing command rejections
///
/// Argument and membership errors are raised before any player is touched.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid index.")]
    InvalidIndex,

    #[error("Volume must be between 1 and 100.")]
    InvalidVolume(String),

    #[error("Repeat must be one of: off, single, all.")]
    InvalidRepeat(String),

    #[error("You need to be in a voice channel.")]
    NotInVoiceChannel,

    #[error("You need to be in the same voice channel as the player.")]
    WrongVoiceChannel,

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

impl From<ChorusError> for CommandError {
    fn from(error: ChorusError) -> Self {
        Self::Playback(PlaybackError::Core(error))
    }
}
