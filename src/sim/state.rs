//! Game state and core simulation types
//!
//! All mutable per-playthrough state lives here, owned by the session that
//! created it. The loaded `Level` stays outside: it is immutable and shared.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::level::Level;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No session is running yet
    Idle,
    /// Active gameplay; the only phase in which physics integrates
    Running,
    /// Frozen: no integration, no elapsed-time accumulation
    Paused,
    /// Marble fell into a hole; death animation in progress
    Died,
    /// Marble reached the goal (terminal)
    Completed,
    /// Death animation finished (terminal)
    GameOver,
}

impl GamePhase {
    /// Terminal phases never tick again
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::Completed | GamePhase::GameOver)
    }
}

/// One-time signal marking the end of a session's active physics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TerminalEvent {
    /// Marble captured by the goal; carries the final clock reading
    Completed { elapsed_time: f32 },
    /// Death animation ran to completion
    GameOver,
}

/// Per-tick event for external collaborators (audio)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TickEvent {
    /// Wall hit with approach speed above the audible threshold
    WallImpact { speed: f32 },
}

/// Viewpoint smoothed toward the marble, consumed by rendering only
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CameraState {
    pub position: Vec2,
}

impl CameraState {
    /// Exponential follow: converges asymptotically, never overshoots
    pub fn follow(&mut self, target: Vec2, follow_speed: f32) {
        self.position += (target - self.position) * follow_speed;
    }
}

/// Death animation bookkeeping, captured on the tick the marble falls in
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeathState {
    /// Seconds since the hole captured the marble
    pub time_since_death: f32,
    /// Vector from the marble to the hole center at capture time
    pub direction: Vec2,
    /// Marble position at capture time
    pub origin: Vec2,
}

/// Complete mutable session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Marble center in map coordinates
    pub position: Vec2,
    /// Per-tick displacement (the sim runs at a fixed logical rate, so this
    /// is a delta per tick, not units per second)
    pub velocity: Vec2,
    /// Radius used for rendering; shrinks during the death animation
    pub visual_radius: f32,
    /// Real time accumulated while not paused, in seconds
    pub elapsed_time: f32,
    /// Current phase
    pub phase: GamePhase,
    /// Follow camera
    pub camera: CameraState,
    /// Set exactly once, when the marble dies
    pub death: Option<DeathState>,
}

impl GameState {
    /// Fresh state for a playthrough of `level`, marble at the start point
    pub fn new(level: &Level) -> Self {
        Self {
            position: level.start_position,
            velocity: Vec2::ZERO,
            visual_radius: level.player_radius,
            elapsed_time: 0.0,
            phase: GamePhase::Running,
            camera: CameraState {
                position: level.start_position,
            },
            death: None,
        }
    }
}

/// Per-tick output snapshot for rendering/audio collaborators
///
/// Collaborators read this; they never mutate simulation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub player_position: Vec2,
    pub visual_radius: f32,
    pub camera_position: Vec2,
    /// Marble speed magnitude (drives rolling-sound volume)
    pub speed: f32,
    pub elapsed_time: f32,
    pub phase: GamePhase,
    /// Present exactly once, on the transition tick
    pub terminal_event: Option<TerminalEvent>,
    /// Audible wall impacts this tick
    pub events: Vec<TickEvent>,
}

impl GameState {
    /// Capture the collaborator-facing view of this tick
    pub fn snapshot(
        &self,
        terminal_event: Option<TerminalEvent>,
        events: Vec<TickEvent>,
    ) -> FrameSnapshot {
        FrameSnapshot {
            player_position: self.position,
            visual_radius: self.visual_radius,
            camera_position: self.camera.position,
            speed: self.velocity.length(),
            elapsed_time: self.elapsed_time,
            phase: self.phase,
            terminal_event,
            events,
        }
    }
}
