//! Player configuration
//!
//! Layered from an optional TOML file and `CADENCE_*` environment variables.

use crate::catalog::{AssetResolver, TrackCatalog};
use crate::engine::EngineOptions;
use crate::error::{PlaybackError, Result};
use crate::types::{
    RepeatMode, DEFAULT_PLAYBACK_SPEED, DEFAULT_VOLUME, MAX_PLAYBACK_SPEED, MIN_PLAYBACK_SPEED,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Fallback artwork shown when a song has none
pub const DEFAULT_FALLBACK_ARTWORK_URL: &str = "https://placehold.co/600x600/png?text=%E2%99%AA";

/// Player configuration root
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    /// Backend asset locations
    #[serde(default = "default_catalog")]
    pub catalog: CatalogSettings,

    /// Initial playback settings
    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    /// Seek reconciliation
    #[serde(default = "default_seek")]
    pub seek: SeekSettings,

    /// Device engine setup
    #[serde(default = "default_engine")]
    pub engine: EngineSettings,
}

/// Where track audio and artwork are fetched from
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSettings {
    /// Base URL of the music backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Artwork used when a song has none
    #[serde(default = "default_fallback_artwork_url")]
    pub fallback_artwork_url: String,
}

/// Settings applied when the engine is initialized
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    /// Initial repeat policy
    #[serde(default)]
    pub repeat: RepeatMode,

    /// Initial playback rate, within [0.5, 2.0]
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Initial output volume, within [0, 1]
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Past this position "previous" restarts the current track
    #[serde(default = "default_previous_restart_threshold_secs")]
    pub previous_restart_threshold_secs: f64,
}

/// Seek reconciliation tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeekSettings {
    /// Distance at which a pinned seek target counts as reached
    #[serde(default = "default_seek_tolerance_secs")]
    pub tolerance_secs: f64,

    /// Longest time a seek target stays pinned
    #[serde(default = "default_max_pin_ms")]
    pub max_pin_ms: u64,
}

/// Options passed to the engine at setup
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSettings {
    /// Interval between engine progress events
    #[serde(default = "default_progress_update_interval_ms")]
    pub progress_update_interval_ms: u64,

    /// Keep playing after the app is killed
    #[serde(default = "default_true")]
    pub continue_playback_on_app_killed: bool,

    /// Pause and resume around audio interruptions such as calls
    #[serde(default = "default_true")]
    pub handle_interruptions: bool,
}

impl PlayerConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// Environment variables use the `CADENCE_` prefix and `__` between
    /// section and key, e.g. `CADENCE_PLAYBACK__SPEED=1.25`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if path.exists() {
                settings = settings.add_source(config::File::from(path));
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| PlaybackError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.catalog.backend_url)
            .map_err(|e| PlaybackError::Config(format!("catalog.backend_url: {e}")))?;
        Url::parse(&self.catalog.fallback_artwork_url)
            .map_err(|e| PlaybackError::Config(format!("catalog.fallback_artwork_url: {e}")))?;

        let speed = self.playback.speed;
        if !(MIN_PLAYBACK_SPEED..=MAX_PLAYBACK_SPEED).contains(&speed) {
            return Err(PlaybackError::Config(format!(
                "playback.speed must be within [{MIN_PLAYBACK_SPEED}, {MAX_PLAYBACK_SPEED}], got {speed}"
            )));
        }

        if !(0.0..=1.0).contains(&self.playback.volume) {
            return Err(PlaybackError::Config(format!(
                "playback.volume must be within [0, 1], got {}",
                self.playback.volume
            )));
        }

        let threshold = self.playback.previous_restart_threshold_secs;
        if threshold.is_nan() || threshold < 0.0 {
            return Err(PlaybackError::Config(
                "playback.previous_restart_threshold_secs must be >= 0".to_string(),
            ));
        }

        let tolerance = self.seek.tolerance_secs;
        if tolerance.is_nan() || tolerance <= 0.0 {
            return Err(PlaybackError::Config(
                "seek.tolerance_secs must be > 0".to_string(),
            ));
        }

        if self.engine.progress_update_interval_ms == 0 {
            return Err(PlaybackError::Config(
                "engine.progress_update_interval_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Build the song-to-track adapter for this backend
    pub fn track_catalog(&self, token: Option<String>) -> Result<TrackCatalog> {
        let backend = Url::parse(&self.catalog.backend_url)
            .map_err(|e| PlaybackError::Config(format!("catalog.backend_url: {e}")))?;
        let fallback = Url::parse(&self.catalog.fallback_artwork_url)
            .map_err(|e| PlaybackError::Config(format!("catalog.fallback_artwork_url: {e}")))?;

        Ok(TrackCatalog::new(AssetResolver::new(backend, token)?, fallback))
    }
}

impl SeekSettings {
    /// Longest time a seek target stays pinned
    pub fn max_pin(&self) -> Duration {
        Duration::from_millis(self.max_pin_ms)
    }
}

impl EngineSettings {
    /// Engine setup options
    pub fn options(&self) -> EngineOptions {
        EngineOptions {
            progress_update_interval: Duration::from_millis(self.progress_update_interval_ms),
            continue_playback_on_app_killed: self.continue_playback_on_app_killed,
            handle_interruptions: self.handle_interruptions,
            ..EngineOptions::default()
        }
    }
}

// Default values
fn default_catalog() -> CatalogSettings {
    CatalogSettings {
        backend_url: default_backend_url(),
        fallback_artwork_url: default_fallback_artwork_url(),
    }
}

fn default_backend_url() -> String {
    "http://localhost:1143".to_string()
}

fn default_fallback_artwork_url() -> String {
    DEFAULT_FALLBACK_ARTWORK_URL.to_string()
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        repeat: RepeatMode::Off,
        speed: default_speed(),
        volume: default_volume(),
        previous_restart_threshold_secs: default_previous_restart_threshold_secs(),
    }
}

fn default_speed() -> f32 {
    DEFAULT_PLAYBACK_SPEED
}

fn default_volume() -> f32 {
    DEFAULT_VOLUME
}

fn default_previous_restart_threshold_secs() -> f64 {
    3.0
}

fn default_seek() -> SeekSettings {
    SeekSettings {
        tolerance_secs: default_seek_tolerance_secs(),
        max_pin_ms: default_max_pin_ms(),
    }
}

fn default_seek_tolerance_secs() -> f64 {
    1.0
}

fn default_max_pin_ms() -> u64 {
    2000
}

fn default_engine() -> EngineSettings {
    EngineSettings {
        progress_update_interval_ms: default_progress_update_interval_ms(),
        continue_playback_on_app_killed: true,
        handle_interruptions: true,
    }
}

fn default_progress_update_interval_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            playback: default_playback(),
            seek: default_seek(),
            engine: default_engine(),
        }
    }
}
