//! Playlist domain types

use super::{FsNodeId, PlaylistId, Song, SongId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    /// Unique playlist identifier
    pub id: PlaylistId,

    /// Playlist name
    pub name: String,

    /// Owner user ID
    pub user_id: String,

    /// Cover artwork
    #[serde(default)]
    pub artwork_fs_node_id: Option<FsNodeId>,

    /// Number of songs (when the backend includes it)
    #[serde(default)]
    pub song_count: Option<u32>,

    /// Total duration in seconds (when the backend includes it)
    #[serde(default)]
    pub total_duration: Option<f64>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Playlist entry with its embedded song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSong {
    /// Entry identifier
    pub id: i64,

    /// Playlist the entry belongs to
    pub playlist_id: PlaylistId,

    /// Song referenced by the entry
    pub song_id: SongId,

    /// Position in the playlist (0-indexed)
    pub position: u32,

    /// The song itself
    pub song: Song,
}

/// Order playlist entries into a play queue
///
/// Entries are sorted by position; entries sharing a position keep the order
/// in which the backend returned them.
pub fn playlist_queue(mut entries: Vec<PlaylistSong>) -> Vec<Song> {
    entries.sort_by_key(|entry| entry.position);
    entries.into_iter().map(|entry| entry.song).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::song::test_song;

    fn entry(id: i64, position: u32) -> PlaylistSong {
        PlaylistSong {
            id,
            playlist_id: PlaylistId::new(1),
            song_id: SongId::new(id),
            position,
            song: test_song(id, &format!("Song {id}")),
        }
    }

    #[test]
    fn orders_by_position() {
        let queue = playlist_queue(vec![entry(1, 2), entry(2, 0), entry(3, 1)]);
        let ids: Vec<i64> = queue.iter().map(|s| s.id.get()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn ties_keep_backend_order() {
        let queue = playlist_queue(vec![entry(5, 0), entry(4, 0), entry(3, 0)]);
        let ids: Vec<i64> = queue.iter().map(|s| s.id.get()).collect();
        assert_eq!(ids, vec![5, 4, 3]);
    }
}
