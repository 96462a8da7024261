//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One logical tick per rendered frame
//! - Stable iteration order (walls and holes in level order)
//! - No rendering, audio or platform dependencies

pub mod rect;
pub mod state;
pub mod tick;

pub use rect::{CollisionResult, Rect};
pub use state::{CameraState, FrameSnapshot, GamePhase, GameState, TerminalEvent, TickEvent};
pub use tick::{tick, InputSnapshot};
