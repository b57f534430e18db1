//! Core types for playback state

use cadence_core::SongId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Playback speeds offered by the UI
pub const PLAYBACK_SPEEDS: [f32; 7] = [0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

/// Lowest rate forwarded to the engine
pub const MIN_PLAYBACK_SPEED: f32 = 0.5;

/// Highest rate forwarded to the engine
pub const MAX_PLAYBACK_SPEED: f32 = 2.0;

/// Playback rate when none is configured
pub const DEFAULT_PLAYBACK_SPEED: f32 = 1.0;

/// Output volume when none is configured
pub const DEFAULT_VOLUME: f32 = 1.0;

/// Stable identifier of a playable track
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Create a new track ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<SongId> for TrackId {
    fn from(id: SongId) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Playback-ready representation of a song
///
/// Immutable once built. Missing artist/album stay `None`; the "Unknown"
/// labels are only applied by the `display_*` accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: Option<String>,

    /// Album name
    pub album: Option<String>,

    /// Duration in seconds
    pub duration_secs: f64,

    /// Streaming URL
    pub audio_url: Url,

    /// Artwork URL
    pub artwork_url: Option<Url>,
}

impl Track {
    /// Title for display
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Unknown Title"
        } else {
            &self.title
        }
    }

    /// Artist for display
    pub fn display_artist(&self) -> &str {
        self.artist.as_deref().unwrap_or("Unknown Artist")
    }

    /// Album for display
    pub fn display_album(&self) -> &str {
        self.album.as_deref().unwrap_or("Unknown Album")
    }

    /// Duration as a `Duration`
    pub fn duration(&self) -> Duration {
        if self.duration_secs.is_finite() && self.duration_secs > 0.0 {
            Duration::from_secs_f64(self.duration_secs)
        } else {
            Duration::ZERO
        }
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Loop entire queue
    All,

    /// Loop current track only
    One,
}

impl RepeatMode {
    /// Next mode in the `Off -> All -> One -> Off` cycle
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// Snap an arbitrary rate to the closest entry of [`PLAYBACK_SPEEDS`]
///
/// Used by speed pickers; the manager itself forwards any rate in range.
pub fn snap_playback_speed(speed: f32) -> f32 {
    PLAYBACK_SPEEDS
        .iter()
        .copied()
        .min_by(|a, b| (a - speed).abs().total_cmp(&(b - speed).abs()))
        .unwrap_or(1.0)
}

/// Check whether a rate is one of the offered speeds
pub fn is_offered_speed(speed: f32) -> bool {
    PLAYBACK_SPEEDS
        .iter()
        .any(|s| (s - speed).abs() < f32::EPSILON)
}

/// High-frequency position projection
///
/// Kept apart from [`crate::SessionState`] so progress ticks and queue changes
/// notify independent subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Current position in seconds
    pub position_secs: f64,

    /// Duration of the active track in seconds
    pub duration_secs: f64,

    /// Whether the engine is playing (buffering counts as playing)
    pub is_playing: bool,
}

#[cfg(test)]
pub(crate) fn test_track(id: &str, duration_secs: f64) -> Track {
    Track {
        id: TrackId::new(id),
        title: format!("Track {id}"),
        artist: Some("Test Artist".to_string()),
        album: None,
        duration_secs,
        audio_url: Url::parse(&format!("https://music.test/fs_nodes/{id}/data"))
            .expect("valid test url"),
        artwork_url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_cycles_through_all_modes() {
        let mut mode = RepeatMode::Off;
        let mut visited = vec![mode];
        for _ in 0..3 {
            mode = mode.cycle();
            visited.push(mode);
        }
        assert_eq!(
            visited,
            vec![RepeatMode::Off, RepeatMode::All, RepeatMode::One, RepeatMode::Off]
        );
    }

    #[test]
    fn speed_snapping() {
        assert_eq!(snap_playback_speed(1.3), 1.25);
        assert_eq!(snap_playback_speed(0.1), 0.5);
        assert_eq!(snap_playback_speed(3.0), 2.0);
        assert!(is_offered_speed(1.75));
        assert!(!is_offered_speed(1.1));
    }

    #[test]
    fn display_labels_are_render_time_only() {
        let mut track = test_track("1", 10.0);
        track.artist = None;
        assert_eq!(track.display_artist(), "Unknown Artist");
        assert_eq!(track.display_album(), "Unknown Album");
        assert!(track.artist.is_none());
        assert_eq!(track.id.as_str(), "1");
    }
}
