//! Play session lifecycle
//!
//! A `Session` ties one loaded level to at most one live `GameState` and
//! enforces the phase transitions the simulation itself does not own:
//! starting, pausing, resuming, restarting and cooperative stopping.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::level::Level;
use crate::sim::{tick, FrameSnapshot, GamePhase, GameState, InputSnapshot};

/// A single playthrough of one level
///
/// Owns all mutable state; the level is shared read-only with whoever else
/// holds the `Arc` (the cache, renderers). Lifecycle calls that do not apply
/// to the current phase are ignored rather than rejected, so hosts can wire
/// buttons directly without phase bookkeeping of their own.
pub struct Session {
    level: Arc<Level>,
    state: Option<GameState>,
    stop_requested: Arc<AtomicBool>,
}

impl Session {
    pub fn new(level: Arc<Level>) -> Self {
        Self {
            level,
            state: None,
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn level(&self) -> &Arc<Level> {
        &self.level
    }

    /// Current phase; `Idle` before `start` and after `stop`
    pub fn phase(&self) -> GamePhase {
        self.state
            .as_ref()
            .map_or(GamePhase::Idle, |state| state.phase)
    }

    /// Begin a playthrough, marble at the level's start point
    ///
    /// Ignored if a playthrough is already live; call `restart` for that.
    pub fn start(&mut self) {
        if self.state.is_some() {
            return;
        }
        self.stop_requested.store(false, Ordering::Relaxed);
        self.state = Some(GameState::new(&self.level));
        log::info!("session started on level {}", self.level.id);
    }

    /// Discard any current playthrough and begin a fresh one
    pub fn restart(&mut self) {
        self.state = None;
        self.start();
    }

    /// Freeze the simulation; only applies while `Running`
    ///
    /// The death animation deliberately cannot be paused: once the marble
    /// falls, the outcome is already decided.
    pub fn pause(&mut self) {
        if let Some(state) = &mut self.state {
            if state.phase == GamePhase::Running {
                state.phase = GamePhase::Paused;
                log::debug!("session paused at {:.2}s", state.elapsed_time);
            }
        }
    }

    /// Resume from `Paused`; ignored in any other phase
    pub fn resume(&mut self) {
        if let Some(state) = &mut self.state {
            if state.phase == GamePhase::Paused {
                state.phase = GamePhase::Running;
                log::debug!("session resumed at {:.2}s", state.elapsed_time);
            }
        }
    }

    /// Handle for requesting a stop from another thread
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_requested)
    }

    /// Request a cooperative stop; honored at the top of the next tick
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::Relaxed);
    }

    /// Advance the playthrough by one tick of `dt` real seconds
    ///
    /// Returns `None` once there is no live playthrough, either because
    /// `start` was never called or a stop request was honored.
    pub fn tick(&mut self, input: &InputSnapshot, dt: f32) -> Option<FrameSnapshot> {
        if self.stop_requested.swap(false, Ordering::Relaxed) {
            if self.state.take().is_some() {
                log::info!("session stopped on level {}", self.level.id);
            }
            return None;
        }
        let state = self.state.as_mut()?;
        Some(tick(state, &self.level, input, dt))
    }
}
