//! Axis-aligned wall rectangles and circle-vs-rect collision
//!
//! Walls are the only solid geometry in a level. The marble is a circle, so
//! collision reduces to clamping the marble center into the rectangle and
//! comparing the distance to the closest point against the marble radius.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned wall rectangle
///
/// Invariants: `max_x = min_x + width`, `max_y = min_y + height`, both
/// extents strictly positive. Instances are built once by the level loader
/// and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub width: f32,
    pub height: f32,
}

/// Result of a circle-vs-rect collision check
#[derive(Debug, Clone, Copy)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Surface normal at collision (pointing toward the marble center)
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

impl Rect {
    /// Build a rect from its top-left corner and extents
    pub fn new(top_left: Vec2, width: f32, height: f32) -> Self {
        debug_assert!(width > 0.0 && height > 0.0);
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + width,
            max_y: top_left.y + height,
            width,
            height,
        }
    }

    /// Closest point of the rectangle to `position` (clamp each axis)
    #[inline]
    pub fn closest_point(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            position.x.clamp(self.min_x, self.max_x),
            position.y.clamp(self.min_y, self.max_y),
        )
    }

    /// Check a marble of `radius` at `position` against this wall
    ///
    /// If the marble center sits exactly on the rectangle (distance zero),
    /// the normal is the reverse of the travel direction at full-radius
    /// penetration so the marble is ejected the way it came in. With zero
    /// velocity on top of that there is no direction to eject along; the
    /// result carries a zero normal and the marble stays stuck.
    pub fn collide(&self, position: Vec2, radius: f32, velocity: Vec2) -> CollisionResult {
        let closest = self.closest_point(position);
        let offset = position - closest;
        let distance = offset.length();

        if distance >= radius {
            return CollisionResult::miss();
        }

        if distance == 0.0 {
            let speed = velocity.length();
            if speed > 0.0 {
                return CollisionResult {
                    hit: true,
                    normal: velocity / -speed,
                    penetration: radius,
                };
            }

            // Unresolvable: center inside the wall with no velocity.
            return CollisionResult {
                hit: true,
                normal: Vec2::ZERO,
                penetration: radius,
            };
        }

        CollisionResult {
            hit: true,
            normal: offset / distance,
            penetration: radius - distance,
        }
    }
}

/// Reflect velocity off a surface with energy loss on the normal component
///
/// `v' = v - n * (2 (v·n) restitution)`. With `restitution < 1` the bounce is
/// inelastic: the tangential component is preserved, the normal component is
/// inverted and scaled.
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2, restitution: f32) -> Vec2 {
    velocity - normal * (2.0 * velocity.dot(normal) * restitution)
}
