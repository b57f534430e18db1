//! Common test utilities and fixtures
//!
//! `FakeEngine` is an in-memory engine with just enough behavior to drive the
//! manager: a native queue, an active index, a position, and play/pause state.
//! Every command is recorded, and failures can be injected per command.

#![allow(dead_code)]

use async_trait::async_trait;
use cadence_playback::engine::EngineResult;
use cadence_playback::{
    EngineError, EngineOptions, EngineRepeatMode, EngineState, PlaybackEngine, PlaybackManager,
    PlayerConfig, Progress, Track, TrackId,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use url::Url;

/// A command as received by the fake engine
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Setup,
    Play,
    Pause,
    SeekTo(f64),
    SkipToNext,
    SkipToPrevious,
    SkipToIndex(usize),
    SetQueue(Vec<String>),
    ResetQueue,
    SetRepeatMode(EngineRepeatMode),
    SetPlaybackRate(f32),
    SetVolume(f32),
}

#[derive(Default)]
struct Inner {
    queue: Vec<Track>,
    index: Option<usize>,
    position: f64,
    state: EngineState,
    repeat: Option<EngineRepeatMode>,
    rate: f32,
    volume: f32,
    commands: Vec<Command>,
    failures: HashMap<&'static str, EngineError>,
}

#[derive(Default)]
pub struct FakeEngine {
    inner: Mutex<Inner>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next call of `command` fail with `error`
    pub fn fail_next(&self, command: &'static str, error: EngineError) {
        self.inner.lock().unwrap().failures.insert(command, error);
    }

    /// Simulate playback advancing within the active track
    pub fn set_position(&self, position: f64) {
        self.inner.lock().unwrap().position = position;
    }

    pub fn position(&self) -> f64 {
        self.inner.lock().unwrap().position
    }

    pub fn state(&self) -> EngineState {
        self.inner.lock().unwrap().state
    }

    pub fn index(&self) -> Option<usize> {
        self.inner.lock().unwrap().index
    }

    pub fn queue_ids(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.queue.iter().map(|t| t.id.to_string()).collect()
    }

    pub fn repeat(&self) -> Option<EngineRepeatMode> {
        self.inner.lock().unwrap().repeat
    }

    pub fn rate(&self) -> f32 {
        self.inner.lock().unwrap().rate
    }

    pub fn volume(&self) -> f32 {
        self.inner.lock().unwrap().volume
    }

    pub fn commands(&self) -> Vec<Command> {
        self.inner.lock().unwrap().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.inner.lock().unwrap().commands.clear();
    }

    pub fn count(&self, pred: impl Fn(&Command) -> bool) -> usize {
        self.commands().iter().filter(|c| pred(c)).count()
    }

    fn run<T>(
        &self,
        name: &'static str,
        command: Command,
        f: impl FnOnce(&mut Inner) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let mut inner = self.inner.lock().unwrap();
        inner.commands.push(command);
        if let Some(error) = inner.failures.remove(name) {
            return Err(error);
        }
        f(&mut inner)
    }

    fn query<T>(
        &self,
        name: &'static str,
        f: impl FnOnce(&Inner) -> T,
    ) -> EngineResult<T> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.failures.remove(name) {
            return Err(error);
        }
        Ok(f(&inner))
    }
}

fn require_loaded(inner: &Inner) -> EngineResult<usize> {
    inner.index.ok_or(EngineError::NotReady)
}

#[async_trait]
impl PlaybackEngine for FakeEngine {
    async fn setup(&self, _options: EngineOptions) -> EngineResult<()> {
        self.run("setup", Command::Setup, |_| Ok(()))
    }

    async fn play(&self) -> EngineResult<()> {
        self.run("play", Command::Play, |inner| {
            require_loaded(inner)?;
            inner.state = EngineState::Playing;
            Ok(())
        })
    }

    async fn pause(&self) -> EngineResult<()> {
        self.run("pause", Command::Pause, |inner| {
            require_loaded(inner)?;
            inner.state = EngineState::Paused;
            Ok(())
        })
    }

    async fn seek_to(&self, position_secs: f64) -> EngineResult<()> {
        self.run("seek_to", Command::SeekTo(position_secs), |inner| {
            require_loaded(inner)?;
            inner.position = position_secs;
            Ok(())
        })
    }

    async fn skip_to_next(&self) -> EngineResult<()> {
        self.run("skip_to_next", Command::SkipToNext, |inner| {
            let index = require_loaded(inner)?;
            if index + 1 < inner.queue.len() {
                inner.index = Some(index + 1);
            } else if inner.repeat == Some(EngineRepeatMode::Queue) {
                inner.index = Some(0);
            } else {
                return Err(EngineError::Rejected("no next track".to_string()));
            }
            inner.position = 0.0;
            Ok(())
        })
    }

    async fn skip_to_previous(&self) -> EngineResult<()> {
        self.run("skip_to_previous", Command::SkipToPrevious, |inner| {
            let index = require_loaded(inner)?;
            inner.index = Some(index.saturating_sub(1));
            inner.position = 0.0;
            Ok(())
        })
    }

    async fn skip_to_index(&self, index: usize) -> EngineResult<()> {
        self.run("skip_to_index", Command::SkipToIndex(index), |inner| {
            if index >= inner.queue.len() {
                return Err(EngineError::Rejected(format!("index {index} out of range")));
            }
            inner.index = Some(index);
            inner.position = 0.0;
            Ok(())
        })
    }

    async fn set_queue(&self, tracks: Vec<Track>) -> EngineResult<()> {
        let ids = tracks.iter().map(|t| t.id.to_string()).collect();
        self.run("set_queue", Command::SetQueue(ids), |inner| {
            inner.index = (!tracks.is_empty()).then_some(0);
            inner.queue = tracks;
            inner.position = 0.0;
            inner.state = EngineState::Ready;
            Ok(())
        })
    }

    async fn reset_queue(&self) -> EngineResult<()> {
        self.run("reset_queue", Command::ResetQueue, |inner| {
            inner.queue.clear();
            inner.index = None;
            inner.position = 0.0;
            inner.state = EngineState::Idle;
            Ok(())
        })
    }

    async fn set_repeat_mode(&self, mode: EngineRepeatMode) -> EngineResult<()> {
        self.run("set_repeat_mode", Command::SetRepeatMode(mode), |inner| {
            inner.repeat = Some(mode);
            Ok(())
        })
    }

    async fn set_playback_rate(&self, rate: f32) -> EngineResult<()> {
        self.run("set_playback_rate", Command::SetPlaybackRate(rate), |inner| {
            inner.rate = rate;
            Ok(())
        })
    }

    async fn set_volume(&self, volume: f32) -> EngineResult<()> {
        self.run("set_volume", Command::SetVolume(volume), |inner| {
            inner.volume = volume;
            Ok(())
        })
    }

    async fn playback_state(&self) -> EngineResult<EngineState> {
        self.query("playback_state", |inner| inner.state)
    }

    async fn progress(&self) -> EngineResult<Progress> {
        self.query("progress", |inner| Progress {
            position_secs: inner.position,
            duration_secs: inner
                .index
                .and_then(|i| inner.queue.get(i))
                .map_or(0.0, |t| t.duration_secs),
        })
    }

    async fn active_track_index(&self) -> EngineResult<Option<usize>> {
        self.query("active_track_index", |inner| inner.index)
    }
}

// ===== Fixtures =====

pub fn track(id: &str, duration_secs: f64) -> Track {
    Track {
        id: TrackId::new(id),
        title: format!("Track {id}"),
        artist: Some("Test Artist".to_string()),
        album: Some("Test Album".to_string()),
        duration_secs,
        audio_url: Url::parse(&format!("http://backend.test:1143/fs_nodes/{id}/data?token="))
            .unwrap(),
        artwork_url: None,
    }
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id, 180.0)).collect()
}

pub fn numbered_tracks(count: usize) -> Vec<Track> {
    (0..count).map(|i| track(&format!("t{i}"), 240.0)).collect()
}

pub fn ids(manager: &PlaybackManager) -> Vec<String> {
    manager
        .state()
        .queue
        .tracks()
        .iter()
        .map(|t| t.id.to_string())
        .collect()
}

static INIT: Once = Once::new();

/// Install a test subscriber once (`RUST_LOG` overrides the default filter)
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "cadence_playback=debug".into()),
            )
            .try_init();
    });
}

/// Manager over `engine` with a seeded shuffle
pub fn manager_with_seed(engine: &Arc<FakeEngine>, seed: u64) -> PlaybackManager {
    init_tracing();
    let engine: Arc<dyn PlaybackEngine> = engine.clone();
    PlaybackManager::with_rng(engine, &PlayerConfig::default(), StdRng::seed_from_u64(seed))
}

pub fn manager(engine: &Arc<FakeEngine>) -> PlaybackManager {
    manager_with_seed(engine, 42)
}
