//! Entity creation and level setup
//!
//! All randomness is drawn from the state's seeded RNG.

use glam::Vec2;
use rand::Rng;

use super::entity::{Asteroid, Body, Enemy, EnemyAi, PowerUp, PowerUpKind, Ship};
use super::state::{GameEvent, GamePhase, SimulationState};
use crate::consts::*;
use crate::heading;
use crate::progression::AchievementId;

/// Random point on one of the four edge bands, `margin` in from the border
fn edge_point(state: &mut SimulationState, margin: f32) -> Vec2 {
    let (w, h) = (state.arena.width, state.arena.height);
    let pick = |rng: &mut rand_pcg::Pcg32, lo: f32, hi: f32| {
        if hi > lo { rng.random_range(lo..hi) } else { lo }
    };
    if state.rng.random_bool(0.5) {
        let x = if state.rng.random_bool(0.5) { margin } else { w - margin };
        let y = pick(&mut state.rng, margin, h - margin);
        Vec2::new(x, y)
    } else {
        let x = pick(&mut state.rng, margin, w - margin);
        let y = if state.rng.random_bool(0.5) { margin } else { h - margin };
        Vec2::new(x, y)
    }
}

/// Build an asteroid; `pos = None` spawns it on a random edge
pub fn create_asteroid(
    state: &mut SimulationState,
    size: u8,
    pos: Option<Vec2>,
    is_boss: bool,
    has_crystals: bool,
) -> Asteroid {
    let size = size.clamp(1, ASTEROID_MAX_SIZE);
    let pos = match pos {
        Some(pos) => pos,
        None => {
            let margin = state.scaled(ASTEROID_SPAWN_MARGIN).floor();
            edge_point(state, margin)
        }
    };

    let mut speed = state.scaled(ASTEROID_BASE_SPEED)
        * (ASTEROID_SPEED_MULT - f32::from(size) * ASTEROID_SPEED_SIZE_ADJUST);
    let mut radius = f32::from(size) * state.scaled(ASTEROID_RADIUS_PER_SIZE);
    let mut spin = state.rng.random_range(-ASTEROID_SPIN_RANGE..ASTEROID_SPIN_RANGE);
    if is_boss {
        speed *= BOSS_SPEED_MULT;
        radius *= BOSS_SIZE_MULT;
        spin *= BOSS_SPIN_MULT;
    }
    let vel = heading(state.rng.random_range(0.0f32..360.0)) * speed;

    let mut shape = [0u8; ASTEROID_VERTEX_COUNT];
    for vertex in &mut shape {
        *vertex = state.rng.random_range(ASTEROID_SHAPE_MIN..=ASTEROID_SHAPE_MAX);
    }

    let health = if is_boss { BOSS_HEALTH } else { 1 };
    Asteroid {
        body: Body::new(pos, vel),
        size,
        radius,
        angle: state.rng.random_range(0.0f32..360.0),
        spin,
        shape,
        hit_flash: 0.0,
        is_boss,
        health,
        max_health: health,
        has_crystals,
    }
}

/// Build an enemy on an edge, away from the ship when possible
pub fn create_enemy(state: &mut SimulationState) -> Enemy {
    let margin = state.scaled(ENEMY_SPAWN_MARGIN).floor();
    let min_dist = state.scaled(ENEMY_MIN_SPAWN_DISTANCE);
    let ship_pos = state.ship.body.pos;

    let mut pos = None;
    for _ in 0..ENEMY_SPAWN_ATTEMPTS {
        let candidate = edge_point(state, margin);
        if candidate.distance_squared(ship_pos) >= min_dist * min_dist {
            pos = Some(candidate);
            break;
        }
    }
    let pos = pos.unwrap_or(Vec2::new(state.arena.width - margin, state.arena.height - margin));

    let id = state.next_entity_id();
    let fire_variance = state.rng.random_range(-ENEMY_FIRE_VARIANCE..=ENEMY_FIRE_VARIANCE);
    let ai = if state.rng.random_bool(0.5) {
        EnemyAi::Hunter
    } else {
        EnemyAi::Circler
    };
    Enemy {
        id,
        body: Body::new(pos, Vec2::ZERO),
        angle: state.rng.random_range(0.0f32..360.0),
        ai,
        orbit_angle: state.rng.random_range(0.0f32..360.0),
        fire_cooldown: ENEMY_FIRE_RATE + fire_variance as f32,
        health: ENEMY_HEALTH,
        max_health: ENEMY_HEALTH,
        radius: state.scaled(ENEMY_RADIUS),
        hit_flash: 0.0,
    }
}

/// Roll a power-up drop at `pos`.
///
/// A forced kind always drops. Unforced drops are a crystal (30%), otherwise
/// a random regular kind (20%), otherwise nothing.
pub fn create_powerup(state: &mut SimulationState, pos: Vec2, forced: Option<PowerUpKind>) {
    let kind = match forced {
        Some(kind) => kind,
        None if state.rng.random::<f32>() < POWERUP_CRYSTAL_CHANCE => PowerUpKind::Crystal,
        None if state.rng.random::<f32>() < POWERUP_DROP_CHANCE => {
            PowerUpKind::REGULAR[state.rng.random_range(0..PowerUpKind::REGULAR.len())]
        }
        None => return,
    };

    let lifetime = POWERUP_LIFETIME * (1.0 + (state.arena.area_ratio() - 1.0) * 0.3);
    let vel = Vec2::new(
        state.rng.random_range(-1.0f32..1.0),
        state.rng.random_range(-1.0f32..1.0),
    ) * state.arena.scale;
    state.powerups.push(PowerUp {
        body: Body::new(pos, vel),
        kind,
        lifetime,
        pulse: 0.0,
    });
}

/// Asteroids for a level: `(3 + level)` scaled by the playfield size
pub fn level_asteroid_count(level: u32, area_ratio: f32) -> u32 {
    (((LEVEL_BASE_ASTEROIDS + level) as f32) * area_ratio.sqrt()) as u32
}

pub fn is_boss_level(level: u32) -> bool {
    level % BOSS_LEVEL_INTERVAL == 0
}

/// Put the ship back in the center with a fresh respawn window
pub fn reset_ship(state: &mut SimulationState) {
    if state.ship.thrusting {
        state.events.push(GameEvent::StopThrustSound);
    }
    let mut ship = Ship::new(state.arena.center());
    ship.invulnerable = SHIP_INVULNERABILITY_TIME;
    ship.respawning = SHIP_RESPAWN_DURATION;
    state.ship = ship;
}

/// Populate the arena for `state.level`
pub fn start_new_level(state: &mut SimulationState) {
    if state.level > 1 {
        state.check_achievement(AchievementId::Untouchable);
    }
    state.untouchable_level = true;

    state.enemies.clear();
    state.enemy_bullets.clear();

    let level = state.level;
    let mut count = level_asteroid_count(level, state.arena.area_ratio());
    if is_boss_level(level) {
        state.effects.wave_warning = WAVE_WARNING_FRAMES;
        state.effects.wave_warning_text = "BOSS WAVE INCOMING!".to_string();
        let boss = create_asteroid(state, ASTEROID_MAX_SIZE, None, true, false);
        state.asteroids.push(boss);
        count = count.saturating_sub(BOSS_ASTEROID_DISCOUNT).max(1);
        state.events.push(GameEvent::BossWave { level });
    }

    for _ in 0..count {
        let has_crystals = state.rng.random::<f32>() < ASTEROID_CRYSTAL_CHANCE;
        let asteroid = create_asteroid(state, ASTEROID_MAX_SIZE, None, false, has_crystals);
        state.asteroids.push(asteroid);
    }

    state.floating_texts.clear();
    reset_ship(state);
    state.check_achievement(AchievementId::Survivor);

    state.events.push(GameEvent::LevelStarted { level });
    log::info!(
        "Level {}: {} asteroids{}",
        level,
        state.asteroids.len(),
        if is_boss_level(level) { " (boss)" } else { "" }
    );
}

/// Start a new run, keeping progression
pub fn reset_game(state: &mut SimulationState) {
    state.events.push(GameEvent::StopAllSounds);
    state.phase = GamePhase::Playing;
    state.score = 0;
    state.lives = SHIP_START_LIVES;
    state.level = 1;
    state.crystals = 0;
    state.untouchable_level = true;
    state.time_scale = 1.0;
    state.combo = Default::default();
    state.finisher = Default::default();
    state.effects = Default::default();

    state.asteroids.clear();
    state.bullets.clear();
    state.enemy_bullets.clear();
    state.enemies.clear();
    state.powerups.clear();
    state.floating_texts.clear();
    state.particles.release_all();

    let center = state.arena.center();
    state.ship = Ship::new(center);

    let count = ((RESET_ASTEROID_COUNT as f32) * state.arena.area_ratio().sqrt()).max(1.0) as u32;
    for _ in 0..count {
        let asteroid = create_asteroid(state, ASTEROID_MAX_SIZE, None, false, false);
        state.asteroids.push(asteroid);
    }
    log::info!("New game: {} asteroids, high score {}", count, state.progress.high_score);
}
