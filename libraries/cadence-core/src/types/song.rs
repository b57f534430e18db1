//! Song domain type

use super::{FsNodeId, SongId};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A song as returned by the backend
///
/// Audio and artwork are stored as file nodes; the backend may also provide
/// compressed variants that are preferred for streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Unique song identifier
    pub id: SongId,

    /// Song title
    pub title: String,

    /// Album name
    #[serde(default)]
    pub album: Option<String>,

    /// Artist name
    #[serde(default)]
    pub artist: Option<String>,

    /// Duration in seconds
    pub duration: f64,

    /// Track number on the album
    #[serde(default)]
    pub track_number: Option<u32>,

    /// Disc number on the album
    #[serde(default)]
    pub disc_number: Option<u32>,

    /// Release year
    #[serde(default)]
    pub year: Option<i32>,

    /// Position in the owner's library listing
    #[serde(default)]
    pub position: i64,

    /// Original audio asset
    pub audio_fs_node_id: FsNodeId,

    /// Owner of the song
    pub user_id: String,

    /// Original artwork asset
    #[serde(default)]
    pub artwork_fs_node_id: Option<FsNodeId>,

    /// Downscaled artwork asset
    #[serde(default)]
    pub compressed_artwork_fs_node_id: Option<FsNodeId>,

    /// Transcoded audio asset
    #[serde(default)]
    pub compressed_audio_fs_node_id: Option<FsNodeId>,

    /// When the song was created
    pub created_at: DateTime<Utc>,

    /// When the song was last modified
    pub updated_at: DateTime<Utc>,
}

impl Song {
    /// Decode a song from a backend JSON payload
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Audio asset to stream: the compressed variant when present
    pub fn preferred_audio_node(&self) -> &FsNodeId {
        self.compressed_audio_fs_node_id
            .as_ref()
            .unwrap_or(&self.audio_fs_node_id)
    }

    /// Artwork asset to display: the compressed variant, then the original
    pub fn preferred_artwork_node(&self) -> Option<&FsNodeId> {
        self.compressed_artwork_fs_node_id
            .as_ref()
            .or(self.artwork_fs_node_id.as_ref())
    }

    /// Duration as a `Duration` (negative or non-finite values become zero)
    pub fn duration(&self) -> Duration {
        if self.duration.is_finite() && self.duration > 0.0 {
            Duration::from_secs_f64(self.duration)
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
pub(crate) fn test_song(id: i64, title: &str) -> Song {
    let now = Utc::now();
    Song {
        id: SongId::new(id),
        title: title.to_string(),
        album: None,
        artist: None,
        duration: 180.0,
        track_number: None,
        disc_number: None,
        year: None,
        position: 0,
        audio_fs_node_id: FsNodeId::new(format!("audio-{id}")),
        user_id: "user-1".to_string(),
        artwork_fs_node_id: None,
        compressed_artwork_fs_node_id: None,
        compressed_audio_fs_node_id: None,
        created_at: now,
        updated_at: now,
    }
}
