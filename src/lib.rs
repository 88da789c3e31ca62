//! Asteroids Enhanced - simulation core for an arcade space shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, physics, combat, combo/finisher, AI)
//! - `progression`: Upgrades and achievements
//! - `persistence`: Save record format with validation
//! - `settings`: User preferences and simulation configuration
//! - `audio`: Sound cue catalogue and the sink trait audio backends implement

pub mod audio;
pub mod persistence;
pub mod progression;
pub mod settings;
pub mod sim;

pub use progression::{AchievementId, Progression, UpgradeId};
pub use settings::{QualityPreset, Settings, SimConfig};

use glam::Vec2;

/// Game configuration constants
///
/// Distances and speeds are in reference pixels for a 600 px tall screen and
/// get multiplied by the arena scale factor. Durations are in frames at 60 Hz.
pub mod consts {
    /// Fixed simulation timestep (one frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    pub const FPS: f32 = 60.0;

    /// Default arena dimensions
    pub const SCREEN_WIDTH: f32 = 800.0;
    pub const SCREEN_HEIGHT: f32 = 600.0;
    /// Height the reference values are tuned for
    pub const REFERENCE_HEIGHT: f32 = 600.0;
    pub const MAX_SCALE_FACTOR: f32 = 2.0;

    /// Ship
    pub const SHIP_MAX_SPEED: f32 = 6.4;
    pub const SHIP_TURN_SPEED: f32 = 6.0;
    pub const SHIP_THRUST_POWER: f32 = 0.5;
    pub const SHIP_REVERSE_THRUST_MULT: f32 = 0.4;
    pub const SHIP_FRICTION: f32 = 0.985;
    pub const SHIP_RADIUS: f32 = 10.0;
    pub const SHIP_NOSE_LENGTH: f32 = 15.0;
    pub const SHIP_MAX_LIVES: u32 = 5;
    pub const SHIP_START_LIVES: u32 = 3;
    pub const SHIP_INVULNERABILITY_TIME: f32 = 120.0;
    pub const SHIP_RESPAWN_DURATION: f32 = 90.0;
    pub const SHIP_TURN_INPUT_LIMIT: f32 = 2.0;

    /// Weapons
    pub const BULLET_RADIUS: f32 = 2.0;
    pub const BULLET_SPEED: f32 = 12.0;
    pub const BULLET_LIFETIME: f32 = 50.0;
    pub const NORMAL_FIRE_RATE: f32 = 10.0;
    pub const RAPID_FIRE_RATE: f32 = 5.0;
    pub const TRIPLE_SHOT_SPREAD: f32 = 10.0;
    pub const BULLET_TRAIL_LENGTH: usize = 8;
    pub const ENEMY_BULLET_TRAIL_LENGTH: usize = 6;
    pub const ENEMY_BULLET_SPEED_MULT: f32 = 0.8;

    /// Asteroids
    pub const ASTEROID_MAX_SIZE: u8 = 3;
    pub const ASTEROID_BASE_SPEED: f32 = 2.0;
    pub const ASTEROID_SPEED_MULT: f32 = 1.5;
    pub const ASTEROID_SPEED_SIZE_ADJUST: f32 = 0.2;
    pub const ASTEROID_COLLISION_MARGIN: f32 = 12.0;
    pub const ASTEROID_SPAWN_MARGIN: f32 = 50.0;
    pub const ASTEROID_HIT_FLASH: f32 = 8.0;
    pub const ASTEROID_CRYSTAL_CHANCE: f32 = 0.2;
    pub const ASTEROID_SPLIT_COUNT: usize = 2;
    pub const ASTEROID_VERTEX_COUNT: usize = 8;
    pub const ASTEROID_SHAPE_MIN: u8 = 8;
    pub const ASTEROID_SHAPE_MAX: u8 = 12;
    pub const ASTEROID_SPIN_RANGE: f32 = 3.0;
    pub const ASTEROID_RADIUS_PER_SIZE: f32 = 10.0;
    pub const LEVEL_BASE_ASTEROIDS: u32 = 3;
    pub const RESET_ASTEROID_COUNT: u32 = 4;

    /// Boss asteroids
    pub const BOSS_HEALTH: i32 = 50;
    pub const BOSS_LEVEL_INTERVAL: u32 = 5;
    pub const BOSS_SIZE_MULT: f32 = 3.0;
    pub const BOSS_SPEED_MULT: f32 = 0.5;
    pub const BOSS_SPIN_MULT: f32 = 0.3;
    pub const BOSS_SCORE: u32 = 1000;
    pub const BOSS_CRYSTAL_DROPS: usize = 5;
    pub const BOSS_CRYSTAL_SPREAD: f32 = 50.0;
    pub const BOSS_ASTEROID_DISCOUNT: u32 = 3;

    /// Enemies
    pub const ENEMY_SPEED: f32 = 1.5;
    pub const ENEMY_FIRE_RATE: f32 = 90.0;
    pub const ENEMY_FIRE_VARIANCE: i32 = 10;
    pub const ENEMY_MAX_COUNT: usize = 2;
    pub const ENEMY_SPAWN_CHANCE: f32 = 0.1;
    pub const ENEMY_MIN_SPAWN_DISTANCE: f32 = 200.0;
    pub const ENEMY_SPAWN_MARGIN: f32 = 50.0;
    pub const ENEMY_SPAWN_ATTEMPTS: usize = 10;
    pub const ENEMY_SCORE: u32 = 200;
    pub const ENEMY_AIM_INACCURACY: f32 = 5.0;
    pub const ENEMY_FRICTION: f32 = 0.96;
    pub const ENEMY_SPEED_REDUCTION: f32 = 0.75;
    pub const ENEMY_MIN_DISTANCE: f32 = 100.0;
    pub const ENEMY_RADIUS: f32 = 12.0;
    pub const ENEMY_HEALTH: i32 = 3;
    pub const ENEMY_FIRE_MIN_DISTANCE: f32 = 50.0;
    pub const ENEMY_FIRE_MAX_DISTANCE: f32 = 250.0;
    pub const ENEMY_CRYSTAL_DROP_CHANCE: f32 = 0.5;
    pub const HUNTER_APPROACH_SPEED: f32 = 0.05;
    pub const HUNTER_RETREAT_SPEED: f32 = 0.1;
    pub const CIRCLER_ORBIT_SPEED: f32 = 1.5;
    pub const CIRCLER_ORBIT_RADIUS: f32 = 180.0;
    pub const CIRCLER_APPROACH_SPEED: f32 = 0.08;

    /// Dash
    pub const DASH_COOLDOWN: f32 = 120.0;
    pub const DASH_DURATION: f32 = 15.0;
    pub const DASH_SPEED_MULT: f32 = 3.0;
    pub const DASH_TRAIL_MAX_LENGTH: usize = 10;
    pub const DASH_TRAIL_LIFE: f32 = 20.0;

    /// Finisher
    pub const FINISHER_LOCK_ON_FRAMES: f32 = 30.0;
    pub const FINISHER_PRE_IMPACT_FRAMES: f32 = 6.0;
    pub const FINISHER_IMPACT_FRAMES: f32 = 60.0;
    pub const FINISHER_POST_IMPACT_FRAMES: f32 = 30.0;
    pub const FINISHER_LOCK_ON_TIME_SCALE: f32 = 0.5;
    pub const FINISHER_IMPACT_TIME_SCALE: f32 = 0.1;
    pub const FINISHER_SHOCKWAVE_START: f32 = 10.0;
    pub const FINISHER_SHOCKWAVE_RADIUS: f32 = 200.0;
    pub const FINISHER_CLOSE_DAMAGE: i32 = 3;
    pub const FINISHER_FAR_DAMAGE: i32 = 2;
    pub const FINISHER_KNOCKBACK: f32 = 15.0;
    pub const FINISHER_SCORE: u32 = 500;
    pub const FINISHER_INVULN_BUFFER_SECS: f32 = 0.5;
    pub const FINISHER_DAMAGE_CHECKPOINTS: [f32; 2] = [0.3, 0.6];
    pub const FINISHER_PARTICLE_COUNT: usize = 100;

    /// Combo
    pub const COMBO_TIMEOUT: f32 = 180.0;
    pub const COMBO_PULSE_INTERVAL: u32 = 10;
    pub const COMBO_MILESTONES: [u32; 4] = [5, 10, 15, 20];
    pub const COMBO_TEXT_THRESHOLD: u32 = 5;
    pub const COMBO_MEDIUM_THRESHOLD: u32 = 5;
    pub const COMBO_HIGH_THRESHOLD: u32 = 10;
    pub const COMBO_FILL_BASE: f32 = 10.0;
    pub const COMBO_FILL_MEDIUM: f32 = 15.0;
    pub const COMBO_FILL_HIGH: f32 = 20.0;
    pub const COMBO_MAX_PULSE: f32 = 20.0;
    pub const COMBO_PULSE_FADE: f32 = 2.0;
    pub const FINISHER_METER_MAX: f32 = 100.0;
    /// Meter drain per frame while no combo is running
    pub const FINISHER_METER_DECAY: f32 = 2.0 / FPS;

    /// Power-ups
    pub const POWERUP_DROP_CHANCE: f32 = 0.2;
    pub const POWERUP_CRYSTAL_CHANCE: f32 = 0.3;
    pub const POWERUP_LIFETIME: f32 = 600.0;
    pub const RAPID_FIRE_DURATION: f32 = 600.0;
    pub const TRIPLE_SHOT_DURATION: f32 = 600.0;
    pub const SHIELD_DURATION: f32 = 300.0;
    pub const POWERUP_PICKUP_RADIUS: f32 = 15.0;
    pub const POWERUP_VISUAL_RADIUS: f32 = 20.0;
    pub const CRYSTAL_VALUE: u32 = 10;
    pub const POWERUP_SCORE: u32 = 50;
    pub const POWERUP_FLASH: f32 = 20.0;
    pub const POWERUP_FLASH_MAX: f32 = 30.0;

    /// Particles
    pub const PARTICLE_POOL_SIZE: usize = 1000;
    pub const PARTICLE_BASE_LIFE: f32 = 30.0;
    pub const PARTICLE_LIFE_VARIANCE: u32 = 20;
    pub const PARTICLE_FRICTION: f32 = 0.95;
    pub const PARTICLE_SHIP_EXPLOSION: usize = 50;
    pub const STREAK_ATTRACTION_DISTANCE: f32 = 100.0;
    pub const STREAK_ATTRACTION_FORCE: f32 = 0.15;
    pub const STREAK_MIN_LIFE: f32 = 5.0;

    /// Floating text
    pub const FLOATING_TEXT_LIFE: f32 = 60.0;
    pub const FLOATING_TEXT_SPEED: f32 = 2.0;
    pub const FLOATING_TEXT_FRICTION: f32 = 0.95;
    pub const FLOATING_TEXT_SPREAD: i32 = 10;

    /// Screen effects and level flow
    pub const LEVEL_TRANSITION_FRAMES: f32 = 120.0;
    pub const DAMAGE_FLASH_FRAMES: f32 = 60.0;
    pub const SHIELD_FLASH_FRAMES: f32 = 30.0;
    pub const DAMAGE_FLASH_DECAY: f32 = 2.0;
    pub const MAX_SCREEN_SHAKE: f32 = 20.0;
    /// Shake lost per frame, independent of time scale
    pub const SCREEN_SHAKE_DECAY: f32 = 1.0;
    pub const LEVEL_CLEAR_SHAKE: f32 = 10.0;
    pub const WAVE_WARNING_FRAMES: f32 = 180.0;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Unit vector pointing along `angle` degrees (0 = +x, 90 = +y)
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    let (sin, cos) = angle.to_radians().sin_cos();
    Vec2::new(cos, sin)
}

/// Angle in degrees of the vector from `from` to `to`
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x).to_degrees()
}
