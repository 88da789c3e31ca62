//! Cosmetic effect spawners
//!
//! These write particles, floating texts, screen shake and sound cues. None of
//! them feed back into gameplay, and all of them tolerate an exhausted pool.

use std::ops::Range;

use glam::Vec2;
use rand::Rng;

use super::entity::{FloatingText, Rgb, palette};
use super::particles::ParticleKind;
use super::physics::tick_timer;
use super::state::SimulationState;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::heading;

/// Parameters for a radial particle burst
#[derive(Debug, Clone)]
pub struct ParticleBurst {
    pub count: usize,
    pub color: Rgb,
    /// Reference-space speed range, scaled by the arena
    pub speed: Range<f32>,
    pub life_base: f32,
    pub life_variance: u32,
    pub kind: ParticleKind,
}

impl ParticleBurst {
    pub fn new(count: usize, color: Rgb) -> Self {
        Self {
            count,
            color,
            speed: 0.0..8.0,
            life_base: PARTICLE_BASE_LIFE,
            life_variance: PARTICLE_LIFE_VARIANCE,
            kind: ParticleKind::Default,
        }
    }
}

/// Emit `burst.count` particles from `pos` in random directions
pub fn spawn_particles(state: &mut SimulationState, pos: Vec2, burst: &ParticleBurst) {
    let scale = state.arena.scale;
    for _ in 0..burst.count {
        let speed = if burst.speed.is_empty() {
            burst.speed.start
        } else {
            state.rng.random_range(burst.speed.clone())
        } * scale;
        let dir = heading(state.rng.random_range(0.0f32..360.0));
        let life = burst.life_base + state.rng.random_range(0..=burst.life_variance) as f32;
        let Some(p) = state.particles.acquire() else {
            return;
        };
        p.pos = pos;
        p.vel = dir * speed;
        p.life = life;
        p.color = burst.color;
        p.kind = burst.kind;
    }
}

/// Area-based multiplier for particle counts, capped at 2
fn area_factor(state: &SimulationState) -> f32 {
    state.arena.area_ratio().sqrt().min(2.0)
}

/// Explosion with shake and a size-appropriate sound, attenuated by distance
pub fn create_explosion(state: &mut SimulationState, pos: Vec2, count: usize, color: Rgb, is_enemy: bool) {
    state.add_screen_shake((count / 5) as f32);

    let mut volume = if count <= 10 {
        0.7
    } else if count <= 30 {
        1.0
    } else {
        1.3
    };
    let distance = pos.distance(state.ship.body.pos);
    volume *= 1.0 - (distance / state.arena.diagonal()) * 0.3;

    let effect = if is_enemy {
        SoundEffect::EnemyExplosion
    } else if count <= 10 {
        SoundEffect::ExplosionSmall
    } else if count <= 30 {
        SoundEffect::ExplosionMedium
    } else {
        SoundEffect::ExplosionLarge
    };
    state.play_sound(effect, pos.x, volume);

    let scaled_count = (count as f32 * (0.7 + 0.3 * area_factor(state))) as usize;
    let mut burst = ParticleBurst::new(scaled_count, color);
    if is_enemy {
        burst.kind = ParticleKind::EnemyExplosion;
    }
    spawn_particles(state, pos, &burst);
}

/// Golden burst plus expanding rings for a finisher kill
pub fn create_finisher_explosion(state: &mut SimulationState, pos: Vec2) {
    let scale = state.arena.scale;
    for i in 0..FINISHER_PARTICLE_COUNT {
        let speed = state.rng.random_range(1.0f32..15.0) * scale;
        let dir = heading(state.rng.random_range(0.0f32..360.0));
        let color = if i < 30 {
            palette::GOLD
        } else if i < 70 {
            Rgb(255, state.rng.random_range(150..=215), 0)
        } else {
            Rgb(255, 255, state.rng.random_range(200..=255))
        };
        let life = PARTICLE_BASE_LIFE + state.rng.random_range(10u32..=40) as f32;
        let Some(p) = state.particles.acquire() else {
            return;
        };
        p.pos = pos;
        p.vel = dir * speed * 0.5;
        p.life = life;
        p.color = color;
        p.kind = ParticleKind::Finisher;
    }

    const RING_SEGMENTS: usize = 48;
    const RINGS: usize = 3;
    for i in 0..RING_SEGMENTS {
        let dir = heading(i as f32 * (360.0 / RING_SEGMENTS as f32));
        for ring in 0..RINGS {
            let Some(p) = state.particles.acquire() else {
                return;
            };
            p.pos = pos;
            p.vel = dir * (3.0 + ring as f32 * 2.0) * scale;
            p.life = 30.0 - ring as f32 * 5.0;
            p.color = if ring == 0 { palette::GOLD } else { Rgb(255, 200, 100) };
            p.kind = ParticleKind::Finisher;
        }
    }
}

/// Afterimage sample plus a few sparks behind a dashing ship
pub fn create_dash_trail(state: &mut SimulationState) {
    if state.ship.dashing <= 0.0 {
        return;
    }
    state.ship.record_dash_trail(DASH_TRAIL_LIFE);

    let side = heading(state.ship.angle + 90.0);
    let ship_pos = state.ship.body.pos;
    let ship_vel = state.ship.body.vel;
    for _ in 0..3 {
        let offset = state.rng.random_range(-5.0f32..5.0) * state.arena.scale;
        let jitter = Vec2::new(
            state.rng.random_range(-1.0f32..1.0),
            state.rng.random_range(-1.0f32..1.0),
        );
        let Some(p) = state.particles.acquire() else {
            return;
        };
        p.pos = ship_pos + side * offset;
        p.vel = -ship_vel * 0.3 + jitter;
        p.life = DASH_TRAIL_LIFE;
        p.color = palette::DASH;
        p.kind = ParticleKind::Dash;
    }
}

/// Particles that fly from a collected power-up into the ship
pub fn create_powerup_streak(state: &mut SimulationState, from: Vec2, to: Vec2, color: Rgb) {
    let delta = to - from;
    let distance = delta.length();
    let factor = area_factor(state);
    let scale = state.arena.scale;

    if distance > 0.0 {
        let dir = delta / distance;
        let count = (15.0 * factor) as usize;
        for i in 0..count {
            let progress = i as f32 / count as f32;
            let start = from + dir * distance * progress * 0.3;
            let spread = heading(state.rng.random_range(-30.0f32..30.0));
            // Rotate the direction by the spread angle
            let vel_dir = Vec2::new(dir.x * spread.x - dir.y * spread.y, dir.x * spread.y + dir.y * spread.x);
            let jitter = Vec2::new(
                state.rng.random_range(-5.0f32..5.0),
                state.rng.random_range(-5.0f32..5.0),
            ) * scale;
            let Some(p) = state.particles.acquire() else {
                break;
            };
            p.pos = start + jitter;
            p.vel = vel_dir * (3.0 + progress * 4.0) * scale;
            p.life = 20.0 + i as f32 * 2.0;
            p.color = color;
            p.kind = ParticleKind::Streak;
        }
    }

    let burst = ParticleBurst {
        count: (8.0 * factor) as usize,
        color,
        speed: 1.0..3.0,
        life_base: 25.0,
        life_variance: 0,
        kind: ParticleKind::Burst,
    };
    spawn_particles(state, from, &burst);
}

/// Exhaust sparks behind a thrusting ship
pub fn create_thruster_particles(state: &mut SimulationState) {
    let dir = heading(state.ship.angle);
    let scale = state.arena.scale;
    let base = state.ship.body.pos - dir * SHIP_NOSE_LENGTH * 0.8 * scale;
    for _ in 0..2 {
        let offset = Vec2::new(
            state.rng.random_range(-3i32..=3) as f32,
            state.rng.random_range(-3i32..=3) as f32,
        );
        let jitter = Vec2::new(
            state.rng.random_range(-0.5f32..0.5),
            state.rng.random_range(-0.5f32..0.5),
        );
        let Some(p) = state.particles.acquire() else {
            return;
        };
        p.pos = base + offset;
        p.vel = -dir * 3.0 * scale + jitter;
        p.life = 20.0;
        p.color = palette::THRUSTER;
    }
}

/// Inward spiral while the ship is waiting to respawn
pub fn create_respawn_particles(state: &mut SimulationState) {
    let center = state.ship.body.pos;
    let scale = state.arena.scale;
    for _ in 0..3 {
        let dir = heading(state.rng.random_range(0.0f32..360.0));
        let distance = state.rng.random_range(30.0f32..60.0) * scale;
        let jitter = Vec2::new(
            state.rng.random_range(-0.5f32..0.5),
            state.rng.random_range(-0.5f32..0.5),
        );
        if let Some(p) = state.particles.acquire() {
            p.pos = center + dir * distance;
            p.vel = -dir * 2.0 * scale + jitter;
            p.life = 30.0;
            p.color = palette::BLUE_GLOW;
            p.kind = ParticleKind::Respawn;
        }

        if state.rng.random::<f32>() < 0.3 {
            let offset = Vec2::new(
                state.rng.random_range(-10.0f32..10.0),
                state.rng.random_range(-10.0f32..10.0),
            ) * scale;
            if let Some(p) = state.particles.acquire() {
                p.pos = center + offset;
                p.life = 20.0;
                p.color = palette::WHITE;
                p.kind = ParticleKind::Respawn;
            }
        }
    }
}

/// Sparks at the gun when the ship fires
pub fn create_muzzle_flash(state: &mut SimulationState, pos: Vec2, triple: bool) {
    let count = if triple { 5 } else { 3 };
    let burst = ParticleBurst {
        count,
        color: palette::BULLET,
        speed: 1.0..3.0,
        life_base: 10.0,
        life_variance: 5,
        kind: ParticleKind::Burst,
    };
    spawn_particles(state, pos, &burst);
}

/// Rising text popup near `pos`
pub fn create_floating_text(state: &mut SimulationState, pos: Vec2, text: impl Into<String>, color: Rgb) {
    let spread = state.rng.random_range(-FLOATING_TEXT_SPREAD..=FLOATING_TEXT_SPREAD) as f32;
    let scale = state.arena.scale;
    state.floating_texts.push(FloatingText {
        pos: Vec2::new(pos.x + spread * scale, pos.y),
        text: text.into(),
        color,
        life: FLOATING_TEXT_LIFE,
        vy: -FLOATING_TEXT_SPEED * scale,
    });
}

/// Drift texts upward, slow them and drop the expired ones
pub fn update_floating_texts(state: &mut SimulationState) {
    let ts = state.time_scale;
    let friction = FLOATING_TEXT_FRICTION.powf(ts);
    for text in &mut state.floating_texts {
        text.pos.y += text.vy * ts;
        text.vy *= friction;
        text.life = tick_timer(text.life, 1.0, ts);
    }
    state.floating_texts.retain(|t| t.life > 0.0);
}
