//! Tilt Maze - a tilt-controlled marble maze simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, game state)
//! - `level`: Level model and GeoGebra archive loader
//! - `session`: Per-playthrough session handle (start/pause/resume/stop)
//! - `runner`: Frame-paced host loop around the pure tick function
//!
//! Rendering, audio and input collection are external collaborators: they
//! feed an [`sim::InputSnapshot`] in and read a [`sim::FrameSnapshot`] out.

pub mod level;
pub mod runner;
pub mod session;
pub mod sim;

pub use level::{Level, LevelCache, LevelFormatError};
pub use session::Session;
pub use sim::{FrameSnapshot, GamePhase, InputSnapshot, TerminalEvent};

/// Game configuration constants
///
/// These are fixed tuning values, not derived state. The integration model
/// is intentionally per-tick (influences apply once per tick, not scaled by
/// dt) for frame-rate-tied game feel.
pub mod consts {
    /// Velocity retained per tick (damping applied before input influences)
    pub const FRICTION: f32 = 0.99;
    /// How strongly tilt (and keyboard tilt) accelerates the marble
    pub const TILT_INFLUENCE: f32 = 0.1;
    /// How strongly shake (gravity-free acceleration) nudges the marble
    pub const SHAKE_INFLUENCE: f32 = 0.02;
    /// Exponential camera convergence factor per tick
    pub const CAMERA_FOLLOW_SPEED: f32 = 0.2;
    /// Maximum travel per collision sub-step, in map pixels
    pub const MIN_COLLISION_CHECK_RESOLUTION: f32 = 2.0;
    /// Fraction of normal velocity retained (inverted) on a wall bounce
    pub const WALL_RESTITUTION: f32 = 0.7;
    /// Death animation length in seconds
    pub const DEATH_ANIMATION_DURATION: f32 = 0.3;
    /// Approach speed above which a wall hit is loud enough to report
    pub const MIN_IMPACT_SPEED: f32 = 4.0;
    /// Scale on hole radius when testing capture
    pub const HOLE_HITBOX_GENEROSITY: f32 = 1.0;
    /// Fraction of goal radius that counts as captured
    pub const GOAL_CAPTURE_FRACTION: f32 = 0.5;

    /// Thickness of synthesized walls and degenerate (1-D) wall segments
    pub const WALL_THICKNESS: f32 = 5.0;
    /// Marble radius when the level does not override it
    pub const DEFAULT_PLAYER_RADIUS: f32 = 7.0;
    /// Goal radius when the level does not override it
    pub const DEFAULT_GOAL_RADIUS: f32 = 20.0;

    /// Target logical tick rate (one tick per rendered frame)
    pub const TARGET_FRAME_RATE: u32 = 60;
    /// Target tick interval in seconds
    pub const TICK_INTERVAL: f32 = 1.0 / TARGET_FRAME_RATE as f32;
    /// Polling interval while paused, in seconds
    pub const PAUSE_POLL_INTERVAL: f32 = 0.1;

    /// Tilt magnitude contributed by a held arrow/WASD key
    pub const KEYBOARD_TILT_STEP: f32 = 0.5;
}
