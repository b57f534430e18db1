//! Engine events
//!
//! Asynchronous notifications posted by the device audio engine:
//! - Playback state changes (buffering, playing, paused, ...)
//! - Progress ticks (typically once per second)
//! - Active track changes (manual skip or auto-advance)
//! - Queue ended
//! - Remote control requests from the lock screen / notification / headset

use crate::types::TrackId;
use serde::{Deserialize, Serialize};

/// Playback state reported by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// Nothing loaded
    #[default]
    Idle,
    /// Track loaded, not started
    Ready,
    /// Loading a track
    Loading,
    /// Waiting for data mid-playback
    Buffering,
    /// Playing audio
    Playing,
    /// Paused mid-track
    Paused,
    /// Stopped
    Stopped,
    /// Reached the end of the queue
    Ended,
    /// Playback error
    Error,
}

impl EngineState {
    /// Whether the UI should show the track as playing
    ///
    /// Buffering counts as playing: the user asked for audio and the engine is
    /// about to deliver it.
    pub fn is_playing(self) -> bool {
        matches!(self, EngineState::Playing | EngineState::Buffering)
    }
}

/// Progress tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Current position in seconds
    pub position_secs: f64,
    /// Duration of the active track in seconds
    pub duration_secs: f64,
}

/// Remote control request
///
/// Routed to the same action methods as in-app controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RemoteCommand {
    /// Resume playback
    Play,
    /// Pause playback
    Pause,
    /// Stop (treated as pause; the queue is kept)
    Stop,
    /// Skip forward
    Next,
    /// Skip backward or restart the current track
    Previous,
    /// Seek to a position in seconds
    Seek(f64),
}

/// Events emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Playback state changed
    PlaybackState(EngineState),

    /// Position update
    Progress(Progress),

    /// The engine moved to another track
    ActiveTrackChanged {
        /// Index in the engine queue (`None` when nothing is active)
        index: Option<usize>,
        /// Id of the new active track
        track_id: Option<TrackId>,
    },

    /// Playback reached the end of the queue
    QueueEnded,

    /// Remote control request
    Remote(RemoteCommand),
}
