//! Fixed timestep simulation tick
//!
//! Core game loop that advances the simulation by one 60 Hz frame.

use super::combat::resolve_collisions;
use super::combo::{update_combo, update_finisher, update_finisher_meter};
use super::effects::update_floating_texts;
use super::enemy_ai::update_enemies;
use super::entity::Bullet;
use super::physics::{Arena, tick_timer, update_entity_physics};
use super::ship::{try_dash, try_shoot, update_ship};
use super::spawn::{reset_game, start_new_level};
use super::state::{GameEvent, GamePhase, SimulationState};
use crate::audio::SoundEffect;
use crate::consts::*;

/// Input commands for a single tick (deterministic)
///
/// `shoot`, `dash`, `pause` and `restart` are edge-triggered by the caller.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Turn rate in [-2, 2]; negative turns counter-clockwise
    pub turn: f32,
    pub thrust: bool,
    pub reverse: bool,
    pub shoot: bool,
    /// Dash, or the finisher when the meter is full
    pub dash: bool,
    /// Pause toggle
    pub pause: bool,
    /// Start a new run after game over
    pub restart: bool,
}

/// Advance the game state by one frame
pub fn tick(state: &mut SimulationState, input: &TickInput) {
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                if state.ship.thrusting {
                    state.ship.thrusting = false;
                    state.events.push(GameEvent::StopThrustSound);
                }
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            GamePhase::GameOver => {}
        }
    }
    if input.restart && state.phase == GamePhase::GameOver {
        reset_game(state);
        return;
    }

    // Don't tick if paused or game over
    if matches!(state.phase, GamePhase::Paused | GamePhase::GameOver) {
        return;
    }

    let in_transition = state.effects.level_transition > 0.0;
    if !in_transition {
        if input.dash {
            try_dash(state);
        }
        if input.shoot {
            try_shoot(state);
        }

        update_ship(state, input);
        move_world(state);
        resolve_collisions(state);
        if state.phase == GamePhase::GameOver {
            state.frame += 1;
            return;
        }
    }

    update_finisher(state);
    update_effects(state);
    update_level_flow(state);

    state.frame += 1;
}

/// Move every non-ship entity, including enemy steering and fire
fn move_world(state: &mut SimulationState) {
    let ts = state.time_scale;
    let arena = state.arena;

    for asteroid in &mut state.asteroids {
        update_entity_physics(asteroid, ts, Some(&arena));
    }
    move_bullets(&mut state.bullets, ts, &arena);
    move_bullets(&mut state.enemy_bullets, ts, &arena);

    for powerup in &mut state.powerups {
        update_entity_physics(powerup, ts, Some(&arena));
        powerup.lifetime = tick_timer(powerup.lifetime, 1.0, ts);
        powerup.pulse += 0.2 * ts;
    }
    state.powerups.retain(|p| p.lifetime > 0.0);

    update_enemies(state);
}

/// Bullets fly straight and die on expiry or when they leave the arena
fn move_bullets(bullets: &mut Vec<Bullet>, time_scale: f32, arena: &Arena) {
    for bullet in bullets.iter_mut() {
        bullet.record_trail();
        update_entity_physics(bullet, time_scale, None);
        bullet.life = tick_timer(bullet.life, 1.0, time_scale);
    }
    bullets.retain(|b| b.life > 0.0 && arena.contains(b.body.pos));
}

/// Cosmetic state plus the combo and meter timers
fn update_effects(state: &mut SimulationState) {
    let ts = state.time_scale;
    let ship_pos = state.ship.body.pos;
    state.particles.update(ts, ship_pos);
    update_floating_texts(state);
    update_combo(state);
    update_finisher_meter(state);

    let effects = &mut state.effects;
    effects.wave_warning = tick_timer(effects.wave_warning, 1.0, ts);
    effects.damage_flash = tick_timer(effects.damage_flash, DAMAGE_FLASH_DECAY, ts);
    effects.screen_shake = (effects.screen_shake - SCREEN_SHAKE_DECAY).max(0.0);
}

/// Detect a cleared arena, count the transition down and start the next level
fn update_level_flow(state: &mut SimulationState) {
    if state.asteroids.is_empty() && state.effects.level_transition <= 0.0 {
        state.level += 1;
        state.effects.level_transition = LEVEL_TRANSITION_FRAMES;
        state.effects.level_transition_text = format!("LEVEL {}", state.level);
        if state.screen_shake_enabled {
            state.effects.screen_shake = LEVEL_CLEAR_SHAKE;
        }
        let x = state.arena.center().x;
        state.play_sound(SoundEffect::LevelTransition, x, 1.0);
        log::debug!("Arena cleared, level {} next", state.level);
    }

    if state.effects.level_transition > 0.0 {
        state.effects.level_transition = tick_timer(state.effects.level_transition, 1.0, state.time_scale);
        if state.effects.level_transition <= 0.0 {
            start_new_level(state);
        }
    }
}
