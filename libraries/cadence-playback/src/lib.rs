//! Cadence Playback - playback state coordination
//!
//! Keeps the client's view of "what is playing" in step with the device audio
//! engine.
//!
//! This crate provides:
//! - Song to track conversion (streaming and artwork URLs)
//! - Play queue with position-preserving shuffle
//! - Repeat modes (Off, All, One) mirrored into the engine
//! - Speed and volume control
//! - Progress re-published on its own channel
//! - Seek reconciliation (pinned targets while the engine catches up)
//! - Lock-screen remote commands routed to the same actions as in-app controls
//!
//! # Architecture
//!
//! The engine is reached only through the [`PlaybackEngine`] trait, injected
//! at construction. [`PlaybackManager`] is the only component that issues
//! mutating commands; everything else reads its watch channels.
//!
//! Queue-replacing operations are serialized: a second `load_and_play` or
//! `toggle_shuffle` waits until the first has fully applied. If the engine
//! fails partway through, local state is rolled back before the error is
//! returned.
//!
//! # Example: Building tracks
//!
//! ```rust
//! use cadence_playback::PlayerConfig;
//!
//! let config = PlayerConfig::default();
//! config.validate().unwrap();
//!
//! let catalog = config.track_catalog(Some("token".to_string())).unwrap();
//! let url = catalog.resolver().data_url(&cadence_core::FsNodeId::new("node-1"));
//! assert_eq!(url.path(), "/fs_nodes/node-1/data");
//! ```
//!
//! # Example: Wiring an engine
//!
//! ```rust,no_run
//! use cadence_playback::{EngineEvent, PlaybackEngine, PlaybackManager, PlayerConfig};
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//!
//! async fn start(
//!     engine: Arc<dyn PlaybackEngine>,
//!     events: mpsc::Receiver<EngineEvent>,
//! ) -> cadence_playback::Result<()> {
//!     let config = PlayerConfig::load(None)?;
//!     config.validate()?;
//!
//!     let manager = Arc::new(PlaybackManager::new(engine, &config));
//!     manager.initialize().await?;
//!     PlaybackManager::spawn_event_loop(Arc::clone(&manager), events);
//!
//!     manager.toggle_repeat().await?;
//!     manager.set_playback_speed(1.25).await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod catalog;
pub mod config;
pub mod engine;
mod error;
pub mod events;
mod manager;
mod progress;
mod queue;
mod seek;
mod shuffle;
pub mod types;

// Public exports
pub use catalog::{AssetResolver, TrackCatalog};
pub use config::PlayerConfig;
pub use engine::{EngineError, EngineOptions, EngineRepeatMode, PlaybackEngine};
pub use error::{PlaybackError, Result};
pub use events::{EngineEvent, EngineState, Progress, RemoteCommand};
pub use manager::{PlaybackManager, SessionState};
pub use progress::ProgressProjection;
pub use queue::Queue;
pub use seek::{SeekController, SeekPhase};
pub use shuffle::shuffle_order;
pub use types::{ProgressState, RepeatMode, Track, TrackId, PLAYBACK_SPEEDS};
