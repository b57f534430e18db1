//! Progress projection
//!
//! Re-publishes engine progress ticks and play/pause state as an independent
//! watch channel, so progress consumers never wake up on queue changes and
//! queue consumers never wake up once per second.

use crate::events::{EngineState, Progress};
use crate::types::ProgressState;
use tokio::sync::watch;

/// High-frequency playback position slice
#[derive(Debug)]
pub struct ProgressProjection {
    tx: watch::Sender<ProgressState>,
}

impl ProgressProjection {
    /// Create a projection at position zero, not playing
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressState::default());
        Self { tx }
    }

    /// Subscribe to progress updates
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.tx.subscribe()
    }

    /// Current value
    pub fn snapshot(&self) -> ProgressState {
        *self.tx.borrow()
    }

    /// Apply a progress tick
    pub fn apply_progress(&self, progress: Progress) {
        self.tx.send_if_modified(|state| {
            let changed = state.position_secs != progress.position_secs
                || state.duration_secs != progress.duration_secs;
            state.position_secs = progress.position_secs;
            state.duration_secs = progress.duration_secs;
            changed
        });
    }

    /// Apply an engine playback-state change
    pub fn apply_state(&self, engine_state: EngineState) {
        self.set_playing(engine_state.is_playing());
    }

    pub(crate) fn set_playing(&self, is_playing: bool) {
        self.tx.send_if_modified(|state| {
            let changed = state.is_playing != is_playing;
            state.is_playing = is_playing;
            changed
        });
    }

    /// Back to zero (session released)
    pub(crate) fn reset(&self) {
        self.tx.send_replace(ProgressState::default());
    }
}

impl Default for ProgressProjection {
    fn default() -> Self {
        Self::new()
    }
}
