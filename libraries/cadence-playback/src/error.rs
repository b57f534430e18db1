//! Error types for playback coordination

use crate::engine::EngineError;
use thiserror::Error;

/// Playback errors
///
/// Engine rejections surface as [`PlaybackError::CommandFailed`]. A queue
/// operation that fails halfway is rolled back before this error is returned,
/// so callers never observe a partially applied transition.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The engine has no loaded track yet
    ///
    /// Play/pause swallow this with a diagnostic; it is never user-facing.
    #[error("Engine not ready")]
    EngineNotReady,

    /// The engine rejected a command
    #[error("Engine command `{command}` failed: {source}")]
    CommandFailed {
        /// Name of the rejected command
        command: &'static str,
        /// Engine-side cause
        #[source]
        source: EngineError,
    },

    /// Argument outside the accepted domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PlaybackError {
    /// Wrap an engine error for the given command
    pub(crate) fn command(command: &'static str, source: EngineError) -> Self {
        Self::CommandFailed { command, source }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
