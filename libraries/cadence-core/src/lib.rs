//! Cadence Core
//!
//! Catalog domain records shared by the Cadence client libraries.
//!
//! The remote backend owns the library; this crate only describes the records it
//! returns (`Song`, `Playlist`, `PlaylistSong`) and the grouping helpers used to
//! turn a playlist or an album into an ordered list of songs for the player.
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{playlist_queue, PlaylistSong, Song};
//!
//! let json = r#"{
//!     "id": 7,
//!     "title": "Intro",
//!     "album": null,
//!     "artist": "Someone",
//!     "duration": 92.5,
//!     "position": 0,
//!     "audio_fs_node_id": "node-7",
//!     "user_id": "u1",
//!     "created_at": "2024-05-01T10:00:00Z",
//!     "updated_at": "2024-05-01T10:00:00Z"
//! }"#;
//!
//! let song = Song::from_json(json).unwrap();
//! assert_eq!(song.preferred_audio_node().as_str(), "node-7");
//! assert!(song.preferred_artwork_node().is_none());
//! # let _ = playlist_queue(Vec::<PlaylistSong>::new());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod types;

pub use error::{CoreError, Result};
pub use types::{
    album_queue, playlist_queue, AlbumRef, FsNodeId, Playlist, PlaylistId, PlaylistSong, Song,
    SongId,
};
