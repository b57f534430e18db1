//! Song to track conversion
//!
//! Resolves the streaming and artwork URLs of a catalog song and builds the
//! engine's playable [`Track`].

use crate::error::{PlaybackError, Result};
use crate::types::{Track, TrackId};
use cadence_core::{FsNodeId, Song};
use url::Url;

/// Builds authenticated file-node URLs
///
/// `{backend}/fs_nodes/{node}/data?token={token}`
#[derive(Debug, Clone, PartialEq)]
pub struct AssetResolver {
    backend_url: Url,
    token: Option<String>,
}

impl AssetResolver {
    /// Create a resolver for a backend base URL
    pub fn new(backend_url: Url, token: Option<String>) -> Result<Self> {
        if backend_url.cannot_be_a_base() {
            return Err(PlaybackError::InvalidArgument(format!(
                "backend url cannot be a base: {backend_url}"
            )));
        }
        Ok(Self { backend_url, token })
    }

    /// Replace the auth token (login/logout)
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Data URL of a stored file node
    pub fn data_url(&self, node: &FsNodeId) -> Url {
        let mut url = self.backend_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["fs_nodes", node.as_str(), "data"]);
        }
        url.query_pairs_mut()
            .clear()
            .append_pair("token", self.token.as_deref().unwrap_or_default());
        url
    }
}

/// Converts catalog songs into playable tracks
#[derive(Debug, Clone, PartialEq)]
pub struct TrackCatalog {
    resolver: AssetResolver,
    fallback_artwork: Url,
}

impl TrackCatalog {
    /// Create a catalog adapter
    pub fn new(resolver: AssetResolver, fallback_artwork: Url) -> Self {
        Self {
            resolver,
            fallback_artwork,
        }
    }

    /// URL resolver
    pub fn resolver(&self) -> &AssetResolver {
        &self.resolver
    }

    /// Access the URL resolver (e.g. to swap the auth token)
    pub fn resolver_mut(&mut self) -> &mut AssetResolver {
        &mut self.resolver
    }

    /// Streaming URL: compressed audio when present, else the original
    pub fn audio_url(&self, song: &Song) -> Url {
        self.resolver.data_url(song.preferred_audio_node())
    }

    /// Artwork URL: compressed, then original, then the fallback image
    pub fn artwork_url(&self, song: &Song) -> Url {
        song.preferred_artwork_node()
            .map(|node| self.resolver.data_url(node))
            .unwrap_or_else(|| self.fallback_artwork.clone())
    }

    /// Build the playable track for a song
    pub fn to_track(&self, song: &Song) -> Track {
        Track {
            id: TrackId::from(song.id),
            title: song.title.clone(),
            artist: song.artist.clone(),
            album: song.album.clone(),
            duration_secs: song.duration().as_secs_f64(),
            audio_url: self.audio_url(song),
            artwork_url: Some(self.artwork_url(song)),
        }
    }

    /// Build tracks for a list of songs, keeping order
    pub fn to_tracks<'a>(&self, songs: impl IntoIterator<Item = &'a Song>) -> Vec<Track> {
        songs.into_iter().map(|song| self.to_track(song)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::SongId;
    use chrono::Utc;

    fn song(id: i64) -> Song {
        let now = Utc::now();
        Song {
            id: SongId::new(id),
            title: format!("Song {id}"),
            album: None,
            artist: None,
            duration: 201.5,
            track_number: None,
            disc_number: None,
            year: None,
            position: 0,
            audio_fs_node_id: FsNodeId::new(format!("audio-{id}")),
            user_id: "u".to_string(),
            artwork_fs_node_id: None,
            compressed_artwork_fs_node_id: None,
            compressed_audio_fs_node_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog() -> TrackCatalog {
        let resolver = AssetResolver::new(
            Url::parse("http://backend.test:1143").unwrap(),
            Some("secret".to_string()),
        )
        .unwrap();
        TrackCatalog::new(resolver, Url::parse("https://cdn.test/fallback.png").unwrap())
    }

    #[test]
    fn data_url_shape() {
        let url = catalog().audio_url(&song(1));
        assert_eq!(
            url.as_str(),
            "http://backend.test:1143/fs_nodes/audio-1/data?token=secret"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let resolver =
            AssetResolver::new(Url::parse("https://host.test/api/").unwrap(), None).unwrap();
        let url = resolver.data_url(&FsNodeId::new("n"));
        assert_eq!(url.as_str(), "https://host.test/api/fs_nodes/n/data?token=");
    }

    #[test]
    fn prefers_compressed_assets() {
        let catalog = catalog();
        let mut s = song(2);
        s.artwork_fs_node_id = Some(FsNodeId::new("art"));
        s.compressed_artwork_fs_node_id = Some(FsNodeId::new("art-small"));
        s.compressed_audio_fs_node_id = Some(FsNodeId::new("audio-small"));

        let track = catalog.to_track(&s);
        assert!(track.audio_url.path().contains("audio-small"));
        assert!(track.artwork_url.unwrap().path().contains("art-small"));
    }

    #[test]
    fn missing_artwork_uses_fallback() {
        let track = catalog().to_track(&song(3));
        assert_eq!(
            track.artwork_url.unwrap().as_str(),
            "https://cdn.test/fallback.png"
        );
    }

    #[test]
    fn optional_fields_stay_empty() {
        let track = catalog().to_track(&song(4));
        assert_eq!(track.id.as_str(), "4");
        assert!(track.artist.is_none());
        assert!(track.album.is_none());
        assert_eq!(track.display_artist(), "Unknown Artist");
        assert_eq!(track.duration_secs, 201.5);
    }

    #[test]
    fn conversion_is_stable() {
        let catalog = catalog();
        let s = song(5);
        assert_eq!(catalog.to_track(&s), catalog.to_track(&s));
    }

    #[test]
    fn rejects_non_base_urls() {
        let url = Url::parse("mailto:someone@example.com").unwrap();
        assert!(AssetResolver::new(url, None).is_err());
    }
}
