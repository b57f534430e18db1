mod album;
mod ids;
mod playlist;
mod song;

pub use album::{album_queue, AlbumRef};
pub use ids::{FsNodeId, PlaylistId, SongId};
pub use playlist::{playlist_queue, Playlist, PlaylistSong};
pub use song::Song;
