//! Playback manager - queue and playback state store
//!
//! Owns the play queue, shuffle/repeat/speed/volume settings, and the only
//! handle allowed to issue mutating commands to the engine. Local state is
//! updated first and the engine is then brought in line. If an engine command
//! fails halfway, the pre-operation snapshot is restored before the error is
//! returned.
//!
//! State is published on two independent watch channels: [`SessionState`]
//! (queue and settings, low frequency) and [`ProgressState`] (position, once per
//! engine tick).

use crate::{
    config::{PlaybackSettings, PlayerConfig},
    engine::{EngineError, EngineOptions, PlaybackEngine},
    error::{PlaybackError, Result},
    events::{EngineEvent, RemoteCommand},
    progress::ProgressProjection,
    queue::Queue,
    types::{
        is_offered_speed, ProgressState, RepeatMode, Track, TrackId, DEFAULT_PLAYBACK_SPEED,
        DEFAULT_VOLUME, MAX_PLAYBACK_SPEED, MIN_PLAYBACK_SPEED,
    },
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Queue and settings slice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    /// Play queue
    pub queue: Queue,

    /// Repeat policy (the engine's native mode always mirrors this)
    pub repeat_mode: RepeatMode,

    /// Playback rate
    pub playback_speed: f32,

    /// Output volume (0.0 - 1.0)
    pub volume: f32,
}

impl SessionState {
    fn from_settings(settings: &PlaybackSettings) -> Self {
        Self {
            queue: Queue::new(),
            repeat_mode: settings.repeat,
            playback_speed: finite_or(settings.speed, DEFAULT_PLAYBACK_SPEED)
                .clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED),
            volume: finite_or(settings.volume, DEFAULT_VOLUME).clamp(0.0, 1.0),
        }
    }

    /// Active track
    pub fn current_track(&self) -> Option<&Track> {
        self.queue.current()
    }

    /// Active index, `None` for an empty queue
    pub fn current_index(&self) -> Option<usize> {
        self.queue.current_index()
    }

    /// `current_index < len - 1`
    pub fn has_next(&self) -> bool {
        self.queue.has_next()
    }

    /// `current_index > 0`
    pub fn has_previous(&self) -> bool {
        self.queue.has_previous()
    }

    /// Whether the queue is shuffled
    pub fn is_shuffled(&self) -> bool {
        self.queue.is_shuffled()
    }
}

fn finite_or(value: f32, default: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        warn!(value, default, "Non-finite playback setting; using default");
        default
    }
}

/// Held for the whole of a queue-replacing operation
struct OpSlot {
    /// Ids the engine is known to hold, `None` when unknown
    loaded: Option<Vec<TrackId>>,

    rng: StdRng,
}

/// Coordinates the play queue with the device audio engine
pub struct PlaybackManager {
    engine: Arc<dyn PlaybackEngine>,

    /// Queue and settings
    state: watch::Sender<SessionState>,

    /// Position and play/pause
    progress: ProgressProjection,

    /// Single-slot guard; a second caller waits for the first
    op: Mutex<OpSlot>,

    engine_options: EngineOptions,

    /// Past this position "previous" restarts the current track
    previous_restart_threshold_secs: f64,
}

impl PlaybackManager {
    /// Create a manager over an engine handle
    pub fn new(engine: Arc<dyn PlaybackEngine>, config: &PlayerConfig) -> Self {
        Self::with_rng(engine, config, StdRng::from_entropy())
    }

    /// Create a manager with a fixed shuffle RNG
    pub fn with_rng(engine: Arc<dyn PlaybackEngine>, config: &PlayerConfig, rng: StdRng) -> Self {
        let (state, _rx) = watch::channel(SessionState::from_settings(&config.playback));

        Self {
            engine,
            state,
            progress: ProgressProjection::new(),
            op: Mutex::new(OpSlot { loaded: None, rng }),
            engine_options: config.engine.options(),
            previous_restart_threshold_secs: config.playback.previous_restart_threshold_secs,
        }
    }

    /// Set up the engine and push the initial repeat mode, rate and volume
    pub async fn initialize(&self) -> Result<()> {
        let state = self.state();

        self.engine
            .setup(self.engine_options.clone())
            .await
            .map_err(|e| PlaybackError::command("setup", e))?;
        self.engine
            .set_repeat_mode(state.repeat_mode.into())
            .await
            .map_err(|e| PlaybackError::command("set_repeat_mode", e))?;
        self.engine
            .set_playback_rate(state.playback_speed)
            .await
            .map_err(|e| PlaybackError::command("set_playback_rate", e))?;
        self.engine
            .set_volume(state.volume)
            .await
            .map_err(|e| PlaybackError::command("set_volume", e))?;

        info!("Playback engine initialized");
        Ok(())
    }

    /// Release the session: clear the engine queue and local state
    pub async fn shutdown(&self) -> Result<()> {
        let mut slot = self.op.lock().await;

        slot.loaded = None;
        self.state.send_modify(|state| state.queue = Queue::new());
        self.progress.reset();

        self.engine
            .reset_queue()
            .await
            .map_err(|e| PlaybackError::command("reset_queue", e))?;

        info!("Playback session released");
        Ok(())
    }

    // ===== Snapshots =====

    /// Queue and settings snapshot
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Progress snapshot
    pub fn progress(&self) -> ProgressState {
        self.progress.snapshot()
    }

    /// Subscribe to queue and settings changes
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Subscribe to progress changes
    pub fn subscribe_progress(&self) -> watch::Receiver<ProgressState> {
        self.progress.subscribe()
    }

    /// Active track
    pub fn current_track(&self) -> Option<Track> {
        self.state.borrow().current_track().cloned()
    }

    /// Whether a track follows the active one
    pub fn has_next(&self) -> bool {
        self.state.borrow().has_next()
    }

    /// Whether a track precedes the active one
    pub fn has_previous(&self) -> bool {
        self.state.borrow().has_previous()
    }

    /// Current repeat policy
    pub fn repeat_mode(&self) -> RepeatMode {
        self.state.borrow().repeat_mode
    }

    /// Current playback rate
    pub fn playback_speed(&self) -> f32 {
        self.state.borrow().playback_speed
    }

    /// Current volume
    pub fn volume(&self) -> f32 {
        self.state.borrow().volume
    }

    // ===== Queue operations =====

    /// Replace the queue and start playing `track`
    ///
    /// With a non-empty `queue`, it becomes the play queue and playback starts
    /// at the first occurrence of `track` in it (index 0 when absent).
    /// Otherwise the queue is just `[track]`. Shuffle is reset.
    ///
    /// When the engine already holds the same ids in the same order, the
    /// engine queue is left untouched and only the start index is re-issued.
    pub async fn load_and_play(&self, track: Track, queue: Option<Vec<Track>>) -> Result<()> {
        let mut slot = self.op.lock().await;

        let tracks = match queue {
            Some(queue) if !queue.is_empty() => queue,
            _ => vec![track.clone()],
        };
        let start = tracks.iter().position(|t| t.id == track.id).unwrap_or(0);
        let ids: Vec<TrackId> = tracks.iter().map(|t| t.id.clone()).collect();

        let snapshot = self.state();
        let resume = self.progress.snapshot();

        self.state
            .send_modify(|state| state.queue.load(tracks.clone(), start));

        debug!(len = tracks.len(), start, "Loading queue");

        if let Err(e) = self.push_load(&mut slot, tracks, ids, start).await {
            error!(error = %e, "Load failed; rolling back");
            self.roll_back(&mut slot, snapshot, resume.position_secs, resume.is_playing)
                .await;
            return Err(e);
        }

        Ok(())
    }

    async fn push_load(
        &self,
        slot: &mut OpSlot,
        tracks: Vec<Track>,
        ids: Vec<TrackId>,
        start: usize,
    ) -> Result<()> {
        if slot.loaded.as_deref() == Some(ids.as_slice()) {
            debug!("Engine already holds this queue; skipping set_queue");
            self.engine
                .skip_to_index(start)
                .await
                .map_err(|e| PlaybackError::command("skip_to_index", e))?;
        } else {
            slot.loaded = None;
            self.engine
                .set_queue(tracks)
                .await
                .map_err(|e| PlaybackError::command("set_queue", e))?;
            slot.loaded = Some(ids);

            if start > 0 {
                self.engine
                    .skip_to_index(start)
                    .await
                    .map_err(|e| PlaybackError::command("skip_to_index", e))?;
            }
        }

        self.engine
            .play()
            .await
            .map_err(|e| PlaybackError::command("play", e))
    }

    /// Toggle shuffle, keeping the active track and its position
    ///
    /// Turning shuffle on moves the active track to the front and randomizes
    /// the rest. Turning it off restores the previous order. The active
    /// track, playing/paused state and position are read from the engine
    /// before its queue is replaced and restored afterwards.
    pub async fn toggle_shuffle(&self) -> Result<()> {
        let mut slot = self.op.lock().await;
        let mut snapshot = self.state();

        if snapshot.queue.is_empty() {
            self.state.send_modify(|state| {
                if state.queue.is_shuffled() {
                    state.queue.unshuffle();
                } else {
                    state.queue.shuffle(&mut slot.rng);
                }
            });
            return Ok(());
        }

        let was_playing = self
            .engine
            .playback_state()
            .await
            .map_err(|e| PlaybackError::command("playback_state", e))?
            .is_playing();
        let position = self
            .engine
            .progress()
            .await
            .map_err(|e| PlaybackError::command("progress", e))?
            .position_secs;

        // The engine may have advanced without its event being applied yet
        match self.engine.active_track_index().await {
            Ok(Some(index)) if snapshot.queue.current_index() != Some(index) => {
                if snapshot.queue.set_current_index(index) {
                    debug!(index, "Adopting engine active index before shuffle");
                } else {
                    debug!(index, "Engine active index out of range; keeping local index");
                }
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "Could not read active index; keeping local index"),
        }

        let mut queue = snapshot.queue.clone();
        if queue.is_shuffled() {
            queue.unshuffle();
        } else {
            queue.shuffle(&mut slot.rng);
        }

        debug!(
            shuffled = queue.is_shuffled(),
            index = ?queue.current_index(),
            position,
            was_playing,
            "Toggling shuffle"
        );

        self.state.send_modify(|state| state.queue = queue.clone());

        if let Err(e) = self.sync_engine_queue(&mut slot, &queue, position, was_playing).await {
            error!(error = %e, "Shuffle failed; rolling back");
            self.roll_back(&mut slot, snapshot, position, was_playing).await;
            return Err(e);
        }

        Ok(())
    }

    /// Bring the engine queue in line with `queue`
    ///
    /// Replaces the engine queue unless it already holds the same ids, then
    /// skips to the active index, seeks to `position` and restores play/pause.
    async fn sync_engine_queue(
        &self,
        slot: &mut OpSlot,
        queue: &Queue,
        position: f64,
        resume: bool,
    ) -> Result<()> {
        let Some(index) = queue.current_index() else {
            slot.loaded = None;
            return self
                .engine
                .reset_queue()
                .await
                .map_err(|e| PlaybackError::command("reset_queue", e));
        };

        let ids = queue.ids();
        if slot.loaded.as_deref() != Some(ids.as_slice()) {
            slot.loaded = None;
            self.engine
                .set_queue(queue.tracks().to_vec())
                .await
                .map_err(|e| PlaybackError::command("set_queue", e))?;
            slot.loaded = Some(ids);
        }

        self.engine
            .skip_to_index(index)
            .await
            .map_err(|e| PlaybackError::command("skip_to_index", e))?;
        self.engine
            .seek_to(position)
            .await
            .map_err(|e| PlaybackError::command("seek_to", e))?;

        if resume {
            self.engine
                .play()
                .await
                .map_err(|e| PlaybackError::command("play", e))
        } else {
            self.engine
                .pause()
                .await
                .map_err(|e| PlaybackError::command("pause", e))
        }
    }

    /// Restore `snapshot` locally, then best-effort in the engine
    async fn roll_back(&self, slot: &mut OpSlot, snapshot: SessionState, position: f64, resume: bool) {
        let queue = snapshot.queue.clone();
        self.state.send_replace(snapshot);

        if let Err(e) = self.sync_engine_queue(slot, &queue, position, resume).await {
            slot.loaded = None;
            error!(error = %e, "Failed to restore engine queue; engine may be out of sync");
        }
    }

    // ===== Transport =====

    /// Resume playback
    ///
    /// Without a loaded track this is a logged no-op.
    pub async fn play(&self) -> Result<()> {
        match self.ensure_loaded().await {
            Err(PlaybackError::EngineNotReady) => {
                warn!("Play ignored: engine has no loaded track");
                return Ok(());
            }
            other => other?,
        }

        match self.engine.play().await {
            Err(EngineError::NotReady) => {
                warn!("Play ignored: engine not ready");
                Ok(())
            }
            other => other.map_err(|e| PlaybackError::command("play", e)),
        }
    }

    /// Pause playback
    ///
    /// Without a loaded track this is a logged no-op.
    pub async fn pause(&self) -> Result<()> {
        match self.ensure_loaded().await {
            Err(PlaybackError::EngineNotReady) => {
                warn!("Pause ignored: engine has no loaded track");
                return Ok(());
            }
            other => other?,
        }

        match self.engine.pause().await {
            Err(EngineError::NotReady) => {
                warn!("Pause ignored: engine not ready");
                Ok(())
            }
            other => other.map_err(|e| PlaybackError::command("pause", e)),
        }
    }

    /// Play if paused, pause if playing
    ///
    /// Reads the engine state at call time. Two rapid toggles are serialized
    /// so the second sees the effect of the first.
    pub async fn toggle_play(&self) -> Result<()> {
        let _slot = self.op.lock().await;

        let engine_state = match self.engine.playback_state().await {
            Ok(state) => state,
            Err(EngineError::NotReady) => {
                warn!("Toggle ignored: engine not ready");
                return Ok(());
            }
            Err(e) => return Err(PlaybackError::command("playback_state", e)),
        };

        if engine_state.is_playing() {
            self.pause().await
        } else {
            self.play().await
        }
    }

    /// `Ok(false)` after logging when the engine has no loaded track
    async fn has_loaded_track(&self, action: &str) -> Result<bool> {
        match self.ensure_loaded().await {
            Ok(()) => Ok(true),
            Err(PlaybackError::EngineNotReady) => {
                warn!("{action} ignored: engine has no loaded track");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn ensure_loaded(&self) -> Result<()> {
        match self.engine.active_track_index().await {
            Ok(Some(_)) => Ok(()),
            Ok(None) | Err(EngineError::NotReady) => Err(PlaybackError::EngineNotReady),
            Err(e) => Err(PlaybackError::command("active_track_index", e)),
        }
    }

    /// Seek within the active track
    ///
    /// Negative positions seek to the start.
    pub async fn seek(&self, position_secs: f64) -> Result<()> {
        if !position_secs.is_finite() {
            return Err(PlaybackError::InvalidArgument(format!(
                "seek position must be finite, got {position_secs}"
            )));
        }
        let position_secs = position_secs.max(0.0);

        debug!(position_secs, "Seeking");
        self.engine
            .seek_to(position_secs)
            .await
            .map_err(|e| PlaybackError::command("seek_to", e))
    }

    /// Skip to the next track
    ///
    /// Wrap-around under repeat-all is left to the engine. Without a loaded
    /// track this is a logged no-op.
    pub async fn next(&self) -> Result<()> {
        if !self.has_loaded_track("Next").await? {
            return Ok(());
        }

        match self.engine.skip_to_next().await {
            Err(EngineError::NotReady) => {
                warn!("Next ignored: engine not ready");
                return Ok(());
            }
            other => other.map_err(|e| PlaybackError::command("skip_to_next", e))?,
        }
        self.refresh_current_index().await;
        Ok(())
    }

    /// Restart the current track, or skip back near its start
    ///
    /// Past the restart threshold (3 s by default) this seeks to zero and
    /// keeps the active track; otherwise the engine skips backwards. Without
    /// a loaded track this is a logged no-op.
    pub async fn previous(&self) -> Result<()> {
        if !self.has_loaded_track("Previous").await? {
            return Ok(());
        }

        let position = match self.engine.progress().await {
            Ok(progress) => progress.position_secs,
            Err(EngineError::NotReady) => {
                warn!("Previous ignored: engine not ready");
                return Ok(());
            }
            Err(e) => return Err(PlaybackError::command("progress", e)),
        };

        if position > self.previous_restart_threshold_secs {
            debug!(position, "Restarting current track");
            return self
                .engine
                .seek_to(0.0)
                .await
                .map_err(|e| PlaybackError::command("seek_to", e));
        }

        match self.engine.skip_to_previous().await {
            Err(EngineError::NotReady) => {
                warn!("Previous ignored: engine not ready");
                return Ok(());
            }
            other => other.map_err(|e| PlaybackError::command("skip_to_previous", e))?,
        }
        self.refresh_current_index().await;
        Ok(())
    }

    /// Pick up the engine's active index after a skip
    async fn refresh_current_index(&self) {
        match self.engine.active_track_index().await {
            Ok(Some(index)) => {
                self.set_current_index(index);
            }
            Ok(None) => {}
            Err(e) => debug!(error = %e, "Could not read active index; waiting for event"),
        }
    }

    fn set_current_index(&self, index: usize) -> bool {
        self.state.send_if_modified(|state| {
            state.queue.current_index() != Some(index) && state.queue.set_current_index(index)
        })
    }

    // ===== Settings =====

    /// Advance the repeat policy `Off -> All -> One -> Off`
    ///
    /// The new mode is pushed to the engine; if the engine rejects it the
    /// previous mode is restored.
    pub async fn toggle_repeat(&self) -> Result<RepeatMode> {
        let _slot = self.op.lock().await;

        let previous = self.repeat_mode();
        let mode = previous.cycle();
        self.state.send_modify(|state| state.repeat_mode = mode);

        if let Err(e) = self.engine.set_repeat_mode(mode.into()).await {
            self.state.send_modify(|state| state.repeat_mode = previous);
            error!(error = %e, ?mode, "Engine rejected repeat mode");
            return Err(PlaybackError::command("set_repeat_mode", e));
        }

        debug!(?mode, "Repeat mode changed");
        Ok(mode)
    }

    /// Set the playback rate
    ///
    /// Rates are continuous; anything inside [0.5, 2.0] is accepted even when
    /// it is not one of the offered steps. Local state is updated even if the
    /// engine then rejects the rate.
    pub async fn set_playback_speed(&self, speed: f32) -> Result<()> {
        if !speed.is_finite() {
            return Err(PlaybackError::InvalidArgument(format!(
                "playback speed must be finite, got {speed}"
            )));
        }
        let speed = speed.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED);
        if !is_offered_speed(speed) {
            debug!(speed, "Playback speed is not an offered step");
        }

        self.state
            .send_if_modified(|state| std::mem::replace(&mut state.playback_speed, speed) != speed);

        self.engine
            .set_playback_rate(speed)
            .await
            .map_err(|e| PlaybackError::command("set_playback_rate", e))
    }

    /// Set the output volume, clamped to [0, 1]
    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        if !volume.is_finite() {
            return Err(PlaybackError::InvalidArgument(format!(
                "volume must be finite, got {volume}"
            )));
        }
        let volume = volume.clamp(0.0, 1.0);

        self.state
            .send_if_modified(|state| std::mem::replace(&mut state.volume, volume) != volume);

        self.engine
            .set_volume(volume)
            .await
            .map_err(|e| PlaybackError::command("set_volume", e))
    }

    // ===== Engine events =====

    /// Fold an engine event into the state slices
    ///
    /// Remote control requests are returned for dispatch through
    /// [`PlaybackManager::dispatch_remote`].
    pub fn handle_event(&self, event: EngineEvent) -> Option<RemoteCommand> {
        match event {
            EngineEvent::PlaybackState(engine_state) => {
                self.progress.apply_state(engine_state);
            }
            EngineEvent::Progress(progress) => {
                self.progress.apply_progress(progress);
            }
            EngineEvent::ActiveTrackChanged { index, track_id } => {
                if let Some(index) = index {
                    self.apply_active_track(index, track_id.as_ref());
                }
            }
            EngineEvent::QueueEnded => {
                debug!("Queue ended");
                self.progress.set_playing(false);
            }
            EngineEvent::Remote(command) => return Some(command),
        }
        None
    }

    /// Accept an active-track change only if it matches the local queue
    ///
    /// Events posted for a queue that has since been replaced are dropped.
    fn apply_active_track(&self, index: usize, track_id: Option<&TrackId>) {
        let matches = {
            let state = self.state.borrow();
            state
                .queue
                .tracks()
                .get(index)
                .is_some_and(|track| track_id.map_or(true, |id| id == &track.id))
        };

        if matches {
            self.set_current_index(index);
        } else {
            debug!(index, ?track_id, "Ignoring stale active-track event");
        }
    }

    /// Route a remote control request to the matching action
    pub async fn dispatch_remote(&self, command: RemoteCommand) -> Result<()> {
        debug!(?command, "Remote command");
        match command {
            RemoteCommand::Play => self.play().await,
            RemoteCommand::Pause | RemoteCommand::Stop => self.pause().await,
            RemoteCommand::Next => self.next().await,
            RemoteCommand::Previous => self.previous().await,
            RemoteCommand::Seek(position) => self.seek(position).await,
        }
    }

    /// Drain engine events on a background task
    ///
    /// The task ends when every sender of `events` is dropped.
    pub fn spawn_event_loop(
        manager: Arc<Self>,
        mut events: mpsc::Receiver<EngineEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Some(command) = manager.handle_event(event) {
                    if let Err(e) = manager.dispatch_remote(command).await {
                        warn!(error = %e, ?command, "Remote command failed");
                    }
                }
            }
            debug!("Engine event stream closed");
        })
    }
}
