//! Device audio engine contract
//!
//! The engine decodes and outputs audio, owns the native queue, posts
//! progress ticks, and exposes lock-screen controls. The playback manager is
//! the only component allowed to issue mutating commands; everything else only
//! reads the event stream.

use crate::events::{EngineState, Progress};
use crate::types::{RepeatMode, Track};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors reported by an engine binding
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// No session or track is loaded
    #[error("engine has no loaded track")]
    NotReady,

    /// The engine refused the command
    #[error("rejected: {0}")]
    Rejected(String),

    /// The audio subsystem could not be reached
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Result type for engine commands
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Native repeat mode of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineRepeatMode {
    /// Stop at the end of the queue
    Off,
    /// Wrap around to the first track
    Queue,
    /// Repeat the active track
    Track,
}

impl From<RepeatMode> for EngineRepeatMode {
    fn from(mode: RepeatMode) -> Self {
        match mode {
            RepeatMode::Off => EngineRepeatMode::Off,
            RepeatMode::All => EngineRepeatMode::Queue,
            RepeatMode::One => EngineRepeatMode::Track,
        }
    }
}

/// Remote control capabilities advertised to the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Play button
    Play,
    /// Pause button
    Pause,
    /// Next button
    SkipToNext,
    /// Previous button
    SkipToPrevious,
    /// Scrubbing
    SeekTo,
}

/// Options passed to the engine at setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Controls shown in the expanded notification / lock screen
    pub capabilities: Vec<Capability>,

    /// Controls shown in the compact notification
    pub compact_capabilities: Vec<Capability>,

    /// Interval between progress ticks
    pub progress_update_interval: Duration,

    /// Keep playing after the app is swiped away (Android)
    pub continue_playback_on_app_killed: bool,

    /// Let the engine pause/duck on audio focus loss
    pub handle_interruptions: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            capabilities: vec![
                Capability::Play,
                Capability::Pause,
                Capability::SkipToNext,
                Capability::SkipToPrevious,
                Capability::SeekTo,
            ],
            compact_capabilities: vec![
                Capability::Play,
                Capability::Pause,
                Capability::SkipToNext,
                Capability::SkipToPrevious,
            ],
            progress_update_interval: Duration::from_secs(1),
            continue_playback_on_app_killed: true,
            handle_interruptions: true,
        }
    }
}

/// Device audio engine
///
/// Implementors bridge to the platform player (ExoPlayer, AVPlayer, ...).
/// Every command may suspend while the audio subsystem is contacted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Initialize the native player
    async fn setup(&self, options: EngineOptions) -> EngineResult<()>;

    /// Start or resume playback
    async fn play(&self) -> EngineResult<()>;

    /// Pause playback
    async fn pause(&self) -> EngineResult<()>;

    /// Seek within the active track
    async fn seek_to(&self, position_secs: f64) -> EngineResult<()>;

    /// Advance to the next track (honours the native repeat mode)
    async fn skip_to_next(&self) -> EngineResult<()>;

    /// Go back to the previous track
    async fn skip_to_previous(&self) -> EngineResult<()>;

    /// Jump to a queue index
    async fn skip_to_index(&self, index: usize) -> EngineResult<()>;

    /// Replace the native queue; the first track becomes active
    async fn set_queue(&self, tracks: Vec<Track>) -> EngineResult<()>;

    /// Drop the native queue and release decoder resources
    async fn reset_queue(&self) -> EngineResult<()>;

    /// Set the native repeat mode
    async fn set_repeat_mode(&self, mode: EngineRepeatMode) -> EngineResult<()>;

    /// Set the playback rate
    async fn set_playback_rate(&self, rate: f32) -> EngineResult<()>;

    /// Set output volume in `[0, 1]`
    async fn set_volume(&self, volume: f32) -> EngineResult<()>;

    /// Current playback state
    async fn playback_state(&self) -> EngineResult<EngineState>;

    /// Current position and duration
    async fn progress(&self) -> EngineResult<Progress>;

    /// Index of the active track, if any
    async fn active_track_index(&self) -> EngineResult<Option<usize>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_mode_mapping() {
        assert_eq!(EngineRepeatMode::from(RepeatMode::Off), EngineRepeatMode::Off);
        assert_eq!(EngineRepeatMode::from(RepeatMode::All), EngineRepeatMode::Queue);
        assert_eq!(EngineRepeatMode::from(RepeatMode::One), EngineRepeatMode::Track);
    }

    #[test]
    fn default_options_advertise_seek() {
        let options = EngineOptions::default();
        assert!(options.capabilities.contains(&Capability::SeekTo));
        assert!(!options.compact_capabilities.contains(&Capability::SeekTo));
        assert_eq!(options.progress_update_interval, Duration::from_secs(1));
    }
}
