//! Per-frame simulation tick
//!
//! One logical tick per rendered frame. The tick function is pure over its
//! arguments (state in, state out), so any host loop - timer-based,
//! vsync-based or test-driven manual stepping - drives it identically.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rect::reflect_velocity;
use super::state::{DeathState, FrameSnapshot, GamePhase, GameState, TerminalEvent, TickEvent};
use crate::consts::*;
use crate::level::Level;

/// Input readings for a single tick
///
/// Produced once per tick by the host's input collaborator and passed in as
/// a plain value. Zero vectors are valid readings: an absent or denied
/// sensor degrades to reduced control fidelity, never to an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    /// Device acceleration including gravity (tilt)
    pub tilt: Vec2,
    /// Device acceleration without gravity (shake)
    pub shake: Vec2,
    /// Synthetic tilt from held keys
    pub keyboard: Vec2,
}

impl InputSnapshot {
    /// Synthetic tilt for held arrow/WASD keys
    pub fn from_keys(left: bool, right: bool, up: bool, down: bool) -> Self {
        let mut keyboard = Vec2::ZERO;
        if left {
            keyboard.x = -KEYBOARD_TILT_STEP;
        }
        if right {
            keyboard.x = KEYBOARD_TILT_STEP;
        }
        if up {
            keyboard.y = -KEYBOARD_TILT_STEP;
        }
        if down {
            keyboard.y = KEYBOARD_TILT_STEP;
        }
        Self {
            keyboard,
            ..Self::default()
        }
    }
}

/// Advance the session state by one tick of elapsed real time `dt`
///
/// Velocity is a per-tick displacement: influence factors apply once per
/// tick rather than per second, so game feel is tied to the frame cadence.
/// `dt` only feeds the elapsed-time clock and the death animation.
pub fn tick(
    state: &mut GameState,
    level: &Level,
    input: &InputSnapshot,
    dt: f32,
) -> FrameSnapshot {
    match state.phase {
        GamePhase::Running | GamePhase::Died => {}
        // Paused freezes integration, the clock and the camera alike;
        // terminal phases never tick again.
        GamePhase::Idle | GamePhase::Paused | GamePhase::Completed | GamePhase::GameOver => {
            return state.snapshot(None, Vec::new());
        }
    }

    state.elapsed_time += dt;

    let mut events = Vec::new();
    let mut terminal = None;

    if state.phase == GamePhase::Running {
        // Damped-acceleration model: responsive feel, not rigid-body accuracy.
        state.velocity = state.velocity * FRICTION
            + input.tilt * TILT_INFLUENCE
            + input.keyboard * TILT_INFLUENCE
            + input.shake * SHAKE_INFLUENCE;

        move_with_collisions(state, level, &mut events);

        if goal_reached(state, level) {
            state.phase = GamePhase::Completed;
            terminal = Some(TerminalEvent::Completed {
                elapsed_time: state.elapsed_time,
            });
            log::info!("level {} completed in {:.2}s", level.id, state.elapsed_time);
        } else if let Some(death) = find_hole_capture(state, level) {
            state.death = Some(death);
            state.phase = GamePhase::Died;
            log::info!("marble fell at {:.1},{:.1}", state.position.x, state.position.y);
        }
    } else {
        terminal = advance_death_animation(state, level, dt);
    }

    // The camera keeps following through the death animation.
    state.camera.follow(state.position, CAMERA_FOLLOW_SPEED);

    state.snapshot(terminal, events)
}

/// Sub-step count that bounds per-step travel to the collision resolution
#[inline]
fn sub_step_count(speed: f32) -> u32 {
    ((speed / MIN_COLLISION_CHECK_RESOLUTION).ceil() as u32).max(1)
}

/// Advance the marble along its velocity, resolving wall hits per sub-step
///
/// Sub-stepping bounds the per-step travel distance, so a wall thinner than
/// one full-tick displacement cannot be tunneled through. A bounce rewrites
/// the velocity; the remaining sub-steps follow the new direction.
fn move_with_collisions(state: &mut GameState, level: &Level, events: &mut Vec<TickEvent>) {
    let sub_steps = sub_step_count(state.velocity.length());

    for _ in 0..sub_steps {
        state.position += state.velocity / sub_steps as f32;

        for wall in &level.walls {
            let contact = wall.collide(state.position, level.player_radius, state.velocity);
            if !contact.hit {
                continue;
            }

            let approach_speed = -state.velocity.dot(contact.normal);
            if approach_speed > MIN_IMPACT_SPEED {
                events.push(TickEvent::WallImpact {
                    speed: approach_speed,
                });
            }

            state.position += contact.normal * contact.penetration;
            state.velocity = reflect_velocity(state.velocity, contact.normal, WALL_RESTITUTION);
        }
    }
}

fn goal_reached(state: &GameState, level: &Level) -> bool {
    let distance = (state.position - level.goal_position).length();
    distance < level.goal_radius * GOAL_CAPTURE_FRACTION + level.player_radius
}

/// First hole (in level order) close enough to capture the marble
fn find_hole_capture(state: &GameState, level: &Level) -> Option<DeathState> {
    level.holes.iter().find_map(|hole| {
        let distance = (state.position - hole.position).length();
        let capture = hole.radius * HOLE_HITBOX_GENEROSITY - level.player_radius / 2.0;
        (distance < capture).then(|| DeathState {
            time_since_death: 0.0,
            direction: hole.position - state.position,
            origin: state.position,
        })
    })
}

/// Shrink-and-slide animation toward the hole center, then game over
fn advance_death_animation(
    state: &mut GameState,
    level: &Level,
    dt: f32,
) -> Option<TerminalEvent> {
    let Some(mut death) = state.death else {
        return None;
    };
    death.time_since_death += dt;
    state.death = Some(death);

    let tau = (death.time_since_death / DEATH_ANIMATION_DURATION).min(1.0).sqrt();
    state.visual_radius = level.player_radius * (1.0 - tau * 0.8);
    state.position = death.origin + death.direction * tau;

    if death.time_since_death >= DEATH_ANIMATION_DURATION {
        state.phase = GamePhase::GameOver;
        log::info!("game over on level {}", level.id);
        return Some(TerminalEvent::GameOver);
    }
    None
}
