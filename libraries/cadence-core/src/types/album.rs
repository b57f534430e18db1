//! Album grouping

use super::Song;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An album as listed by the backend
///
/// Albums are not stored entities; they are derived from the `album` and
/// `artist` fields of songs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlbumRef {
    /// Album name
    pub name: Option<String>,
    /// Album artist
    pub artist: Option<String>,
}

impl AlbumRef {
    /// Check whether a song belongs to this album
    pub fn contains(&self, song: &Song) -> bool {
        song.album == self.name && song.artist == self.artist
    }
}

/// Build a play queue for an album
///
/// Keeps the songs of `album` and orders them by disc, then track number, then
/// title. Songs without numbering sort after numbered ones.
pub fn album_queue(songs: impl IntoIterator<Item = Song>, album: &AlbumRef) -> Vec<Song> {
    let mut tracks: Vec<Song> = songs.into_iter().filter(|s| album.contains(s)).collect();
    tracks.sort_by(|a, b| {
        numbered(a.disc_number, b.disc_number)
            .then_with(|| numbered(a.track_number, b.track_number))
            .then_with(|| a.title.cmp(&b.title))
    });
    tracks
}

fn numbered(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
