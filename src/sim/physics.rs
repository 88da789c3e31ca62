//! Generic entity physics
//!
//! Every delta here is multiplied by the global time scale, so slow motion
//! (and a full freeze at 0) falls out of the same code path.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Body, Moving};
use crate::consts::*;
use crate::normalize_degrees;

/// Playfield bounds and the derived scale factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    /// Multiplier applied to reference distances and speeds
    pub scale: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        let scale = (height / REFERENCE_HEIGHT).min(MAX_SCALE_FACTOR);
        Self {
            width,
            height,
            scale,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Playfield area relative to the reference 800x600 screen
    pub fn area_ratio(&self) -> f32 {
        (self.width * self.height) / (SCREEN_WIDTH * SCREEN_HEIGHT)
    }

    pub fn diagonal(&self) -> f32 {
        (self.width * self.width + self.height * self.height).sqrt()
    }

    /// Whether a point lies on the playfield (edges inclusive)
    pub fn contains(&self, pos: Vec2) -> bool {
        (0.0..=self.width).contains(&pos.x) && (0.0..=self.height).contains(&pos.y)
    }

    /// Scale a reference-space value to this arena
    #[inline]
    pub fn scaled(&self, value: f32) -> f32 {
        value * self.scale
    }
}

/// Count a timer down, clamping at zero
#[inline]
pub fn tick_timer(value: f32, decrement: f32, time_scale: f32) -> f32 {
    if value > 0.0 {
        (value - decrement * time_scale).max(0.0)
    } else {
        0.0
    }
}

/// Exponential velocity decay, consistent across time scales
#[inline]
pub fn apply_friction(vel: &mut Vec2, friction: f32, time_scale: f32) {
    *vel *= friction.powf(time_scale);
}

/// Clamp speed to `max_speed`, keeping direction
#[inline]
pub fn apply_speed_limit(vel: &mut Vec2, max_speed: f32) {
    let speed = vel.length();
    if speed > max_speed {
        *vel *= max_speed / speed;
    }
}

/// Wrap a position onto the torus so `0 <= x < width` and `0 <= y < height`
pub fn wrap_position(pos: Vec2, arena: &Arena) -> Vec2 {
    Vec2::new(wrap_axis(pos.x, arena.width), wrap_axis(pos.y, arena.height))
}

fn wrap_axis(value: f32, extent: f32) -> f32 {
    if extent <= 0.0 {
        return 0.0;
    }
    let wrapped = value.rem_euclid(extent);
    if wrapped >= extent { 0.0 } else { wrapped }
}

/// Integrate a body's position, optionally wrapping at the arena edges
pub fn update_body(body: &mut Body, time_scale: f32, wrap: Option<&Arena>) {
    body.pos += body.vel * time_scale;
    if let Some(arena) = wrap {
        body.pos = wrap_position(body.pos, arena);
    }
}

/// Move, wrap, spin and fade the hit flash of any moving entity
pub fn update_entity_physics<E: Moving + ?Sized>(entity: &mut E, time_scale: f32, wrap: Option<&Arena>) {
    update_body(entity.body_mut(), time_scale, wrap);
    if let Some((angle, spin)) = entity.spin_mut() {
        *angle = normalize_degrees(*angle + spin * time_scale);
    }
    if let Some(flash) = entity.hit_flash_mut() {
        *flash = tick_timer(*flash, 1.0, time_scale);
    }
}
