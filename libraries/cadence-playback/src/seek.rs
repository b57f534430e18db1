//! Seek reconciliation for a seek bar
//!
//! The engine's progress stream lags a seek by a tick or more. Without a pin
//! the bar would jump back to the old position and then forward again. After
//! a commit the displayed position is pinned to the target until the live
//! position comes within tolerance of it or the pin times out.
//!
//! ```text
//! Idle --begin_drag--> Dragging --commit(v)--> Pinned(v) --converged/timeout--> Idle
//!                         ^                       |
//!                         +-------begin_drag------+
//! ```
//!
//! The deadline is checked lazily whenever the phase or displayed position
//! is read, so there is no timer to clean up when a controller is dropped.

use crate::config::SeekSettings;
use crate::error::Result;
use crate::manager::PlaybackManager;
use crate::types::ProgressState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Reconciliation phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekPhase {
    /// Showing the live engine position
    Idle,

    /// User is dragging; the engine has not been told yet
    Dragging {
        /// Scratch position under the user's finger
        value: f64,
    },

    /// Seek issued; showing the target until the engine catches up
    Pinned {
        /// Requested position
        target: f64,
        /// Pin is dropped at this instant even without convergence
        deadline: Instant,
    },
}

/// Seek state machine for one seek-capable UI surface
pub struct SeekController {
    manager: Arc<PlaybackManager>,
    progress: watch::Receiver<ProgressState>,
    phase: SeekPhase,
    tolerance_secs: f64,
    max_pin: Duration,
}

impl SeekController {
    /// Create a controller over the shared manager
    pub fn new(manager: Arc<PlaybackManager>, settings: &SeekSettings) -> Self {
        let progress = manager.subscribe_progress();
        Self {
            manager,
            progress,
            phase: SeekPhase::Idle,
            tolerance_secs: settings.tolerance_secs,
            max_pin: settings.max_pin(),
        }
    }

    /// Current phase, after dropping a converged or expired pin
    pub fn phase(&mut self) -> SeekPhase {
        self.reconcile();
        self.phase
    }

    /// Position the seek bar should show
    pub fn displayed_position(&mut self) -> f64 {
        self.reconcile();
        match self.phase {
            SeekPhase::Idle => self.live_position(),
            SeekPhase::Dragging { value } => value,
            SeekPhase::Pinned { target, .. } => target,
        }
    }

    /// Start a drag from the currently displayed position
    ///
    /// Discards any pending pin.
    pub fn begin_drag(&mut self) {
        let value = self.displayed_position();
        self.phase = SeekPhase::Dragging { value };
    }

    /// Move the drag scratch value
    ///
    /// Starts a drag if none is active. The engine is not called.
    pub fn drag_to(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.phase = SeekPhase::Dragging {
            value: self.clamp_to_track(value),
        };
    }

    /// Abandon a drag without seeking
    pub fn cancel(&mut self) {
        self.phase = SeekPhase::Idle;
    }

    /// Release the control at `value` and seek there
    ///
    /// The displayed position is pinned to `value` until the engine reports a
    /// position within tolerance or the pin expires. A second commit replaces
    /// the pinned target. If the seek fails the pin is dropped immediately.
    pub async fn commit(&mut self, value: f64) -> Result<()> {
        let target = if value.is_finite() {
            self.clamp_to_track(value)
        } else {
            value
        };

        self.phase = SeekPhase::Pinned {
            target,
            deadline: Instant::now() + self.max_pin,
        };
        debug!(target, "Seek committed");

        if let Err(e) = self.manager.seek(target).await {
            warn!(error = %e, target, "Seek failed; dropping pin");
            self.phase = SeekPhase::Idle;
            return Err(e);
        }

        Ok(())
    }

    /// Wait for the next progress change
    ///
    /// Returns false once the manager is gone.
    pub async fn changed(&mut self) -> bool {
        self.progress.changed().await.is_ok()
    }

    fn live_position(&self) -> f64 {
        self.progress.borrow().position_secs
    }

    fn clamp_to_track(&self, value: f64) -> f64 {
        let duration = self.progress.borrow().duration_secs;
        if duration > 0.0 {
            value.clamp(0.0, duration)
        } else {
            value.max(0.0)
        }
    }

    fn reconcile(&mut self) {
        if let SeekPhase::Pinned { target, deadline } = self.phase {
            let live = self.live_position();
            if (live - target).abs() <= self.tolerance_secs {
                debug!(target, live, "Seek converged");
                self.phase = SeekPhase::Idle;
            } else if Instant::now() >= deadline {
                debug!(target, live, "Seek pin expired");
                self.phase = SeekPhase::Idle;
            }
        }
    }
}
