//! Ship controller
//!
//! The ship is in exactly one of three movement modes each frame: respawning
//! (inert), dashing (scripted velocity) or normal (turn and thrust).

use glam::Vec2;

use super::combo::{dash_distance, find_finisher_target, start_finisher};
use super::effects::{
    create_dash_trail, create_explosion, create_muzzle_flash, create_respawn_particles,
    create_thruster_particles,
};
use super::entity::{Bullet, palette};
use super::physics::{apply_friction, apply_speed_limit, tick_timer, update_body};
use super::spawn::reset_ship;
use super::state::{GameEvent, GamePhase, SimulationState};
use super::tick::TickInput;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::{heading, normalize_degrees};

/// Outcome of a hit on a vulnerable ship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipHit {
    /// The shield took the hit
    Shielded,
    LifeLost,
    GameOver,
}

/// Advance the ship by one frame
pub fn update_ship(state: &mut SimulationState, input: &TickInput) {
    let ts = state.time_scale;
    let arena = state.arena;

    if state.ship.is_respawning() {
        state.ship.respawning = tick_timer(state.ship.respawning, 1.0, ts);
        create_respawn_particles(state);
        stop_thrust(state);
        update_body(&mut state.ship.body, ts, Some(&arena));
        return;
    }

    if state.ship.dashing > 0.0 {
        // Finisher lunges count real frames so they stay in sync with the phases
        state.ship.dashing = if state.finisher.executing {
            (state.ship.dashing - 1.0).max(0.0)
        } else {
            tick_timer(state.ship.dashing, 1.0, ts)
        };
        create_dash_trail(state);
        let ship = &mut state.ship;
        ship.body.vel = heading(ship.angle) * SHIP_MAX_SPEED * arena.scale * DASH_SPEED_MULT;
        ship.invulnerable = ship.invulnerable.max(ship.dashing);
        stop_thrust(state);
    } else {
        steer(state, input);
    }

    let ship = &mut state.ship;
    update_body(&mut ship.body, ts, Some(&arena));
    for sample in &mut ship.dash_trail {
        sample.life = tick_timer(sample.life, 1.0, ts);
    }
    ship.dash_trail.retain(|s| s.life > 0.0);

    ship.invulnerable = tick_timer(ship.invulnerable, 1.0, ts);
    ship.rapid_fire = tick_timer(ship.rapid_fire, 1.0, ts);
    ship.triple_shot = tick_timer(ship.triple_shot, 1.0, ts);
    ship.shield = tick_timer(ship.shield, 1.0, ts);
    ship.powerup_flash = tick_timer(ship.powerup_flash, 1.0, ts);
    ship.bullet_cooldown = tick_timer(ship.bullet_cooldown, 1.0, ts);
    ship.dash_cooldown = tick_timer(ship.dash_cooldown, 1.0, ts);
    ship.aura_pulse += 0.1 * ts;
}

/// Turn, thrust and drag in the normal flight mode
fn steer(state: &mut SimulationState, input: &TickInput) {
    let ts = state.time_scale;
    let scale = state.arena.scale;
    let max_speed = SHIP_MAX_SPEED * scale * state.progress.speed_multiplier();

    let ship = &mut state.ship;
    let turn = input.turn.clamp(-SHIP_TURN_INPUT_LIMIT, SHIP_TURN_INPUT_LIMIT);
    ship.angle = normalize_degrees(ship.angle + turn * SHIP_TURN_SPEED * ts);

    let thrust = if input.thrust {
        SHIP_THRUST_POWER * scale
    } else if input.reverse {
        -SHIP_THRUST_POWER * SHIP_REVERSE_THRUST_MULT * scale
    } else {
        0.0
    };
    if thrust != 0.0 {
        ship.body.vel += heading(ship.angle) * thrust * ts;
    }
    apply_speed_limit(&mut ship.body.vel, max_speed);
    apply_friction(&mut ship.body.vel, SHIP_FRICTION, ts);

    if input.thrust {
        create_thruster_particles(state);
        if !state.ship.thrusting {
            state.ship.thrusting = true;
            let x = state.ship.body.pos.x;
            state.play_sound(SoundEffect::Thrust, x, 0.6);
        }
    } else {
        stop_thrust(state);
    }
}

fn stop_thrust(state: &mut SimulationState) {
    if state.ship.thrusting {
        state.ship.thrusting = false;
        state.events.push(GameEvent::StopThrustSound);
    }
}

/// Fire if the gun has cooled down. Returns true when bullets were spawned.
pub fn try_shoot(state: &mut SimulationState) -> bool {
    let ship = &state.ship;
    if ship.bullet_cooldown > 0.0 || ship.is_respawning() {
        return false;
    }

    let scale = state.arena.scale;
    let angle = ship.angle;
    let nose = nose_position(state);
    let triple = ship.triple_shot > 0.0;
    let base_rate = if ship.rapid_fire > 0.0 {
        RAPID_FIRE_RATE
    } else {
        NORMAL_FIRE_RATE
    };
    let spreads: &[f32] = if triple {
        &[-TRIPLE_SHOT_SPREAD, 0.0, TRIPLE_SHOT_SPREAD]
    } else {
        &[0.0]
    };
    for spread in spreads {
        let vel = heading(angle + spread) * BULLET_SPEED * scale;
        state.bullets.push(Bullet::new(nose, vel, false));
    }
    state.ship.bullet_cooldown = (base_rate * state.progress.fire_rate_multiplier()).floor();

    create_muzzle_flash(state, nose, triple);
    state.play_sound(SoundEffect::Shoot, nose.x, 1.0);
    true
}

/// Dash, or launch the finisher when it is charged and an enemy is in the path
pub fn try_dash(state: &mut SimulationState) -> bool {
    let ship = &state.ship;
    if ship.dash_cooldown > 0.0 || ship.is_respawning() || ship.dashing > 0.0 {
        return false;
    }

    if state.finisher.ready && !state.finisher.executing && !state.enemies.is_empty() {
        let scale = state.arena.scale;
        let target = find_finisher_target(
            ship.body.pos,
            ship.angle,
            &state.enemies,
            SHIP_RADIUS * scale,
            dash_distance(scale),
        );
        if let Some(id) = target {
            start_finisher(state, id);
            return true;
        }
    }

    state.ship.dashing = DASH_DURATION;
    state.ship.dash_cooldown = (DASH_COOLDOWN - state.progress.dash_cooldown_reduction()).max(0.0);
    let x = state.ship.body.pos.x;
    state.play_sound(SoundEffect::Dash, x, 1.0);
    true
}

/// Apply one hit to the ship
pub fn damage_ship(state: &mut SimulationState) -> ShipHit {
    let pos = state.ship.body.pos;

    if state.ship.shield > 0.0 {
        state.ship.shield = 0.0;
        state.flash(SHIELD_FLASH_FRAMES, palette::SHIELD_FLASH);
        state.add_screen_shake(10.0);
        create_explosion(state, pos, 20, palette::SHIELD_BREAK, false);
        state.play_sound(SoundEffect::ExplosionMedium, pos.x, 0.8);
        return ShipHit::Shielded;
    }

    state.lives = state.lives.saturating_sub(1);
    state.untouchable_level = false;
    state.flash(DAMAGE_FLASH_FRAMES, palette::DAMAGE_FLASH);
    create_explosion(state, pos, PARTICLE_SHIP_EXPLOSION, palette::SHIP_EXPLOSION, false);
    create_explosion(state, pos, 10, palette::SCORE_TEXT, false);

    if state.lives == 0 {
        game_over(state);
        return ShipHit::GameOver;
    }
    log::debug!("Ship destroyed, {} lives left", state.lives);
    reset_ship(state);
    ShipHit::LifeLost
}

fn game_over(state: &mut SimulationState) {
    state.phase = GamePhase::GameOver;
    state.combo.max = state.combo.max.max(state.combo.current);
    state.ship.thrusting = false;
    state.time_scale = 1.0;
    state.events.push(GameEvent::StopAllSounds);
    state.events.push(GameEvent::GameOver { score: state.score });
    state.events.push(GameEvent::SaveRequested);
    log::info!(
        "Game over: score {} on level {} (high score {})",
        state.score,
        state.level,
        state.progress.high_score
    );
}

/// Nose position, for effects that originate at the gun
pub fn nose_position(state: &SimulationState) -> Vec2 {
    state.ship.body.pos + heading(state.ship.angle) * SHIP_NOSE_LENGTH * state.arena.scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::{Progression, UpgradeId};
    use crate::settings::SimConfig;
    use crate::sim::combo::FinisherPhase;
    use crate::sim::entity::{Body, Enemy, EnemyAi};

    fn live_state() -> SimulationState {
        let mut state = SimulationState::new(5, &SimConfig::default(), Progression::default());
        state.asteroids.clear();
        state.events.clear();
        state
    }

    fn thrust() -> TickInput {
        TickInput {
            thrust: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_turning_wraps_angle() {
        let mut state = live_state();
        let input = TickInput {
            turn: -1.0,
            ..Default::default()
        };
        update_ship(&mut state, &input);
        assert!((state.ship.angle - 354.0).abs() < 1e-4);
    }

    #[test]
    fn test_turn_input_is_clamped() {
        let mut state = live_state();
        let input = TickInput {
            turn: 10.0,
            ..Default::default()
        };
        update_ship(&mut state, &input);
        assert!((state.ship.angle - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_thrust_respects_speed_limit() {
        let mut state = live_state();
        for _ in 0..600 {
            update_ship(&mut state, &thrust());
        }
        assert!(state.ship.body.vel.length() <= SHIP_MAX_SPEED + 1e-3);
        assert!(state.ship.body.vel.x > 0.0);
        assert!(state.arena.contains(state.ship.body.pos));
    }

    #[test]
    fn test_speed_upgrade_raises_limit() {
        let mut state = live_state();
        state.progress.set_upgrade_level(UpgradeId::MaxSpeed, 5);
        for _ in 0..600 {
            update_ship(&mut state, &thrust());
        }
        assert!(state.ship.body.vel.length() > SHIP_MAX_SPEED);
    }

    #[test]
    fn test_thrust_sound_starts_and_stops() {
        let mut state = live_state();
        update_ship(&mut state, &thrust());
        update_ship(&mut state, &thrust());
        update_ship(&mut state, &TickInput::default());
        let thrust_starts = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::Sound { effect: SoundEffect::Thrust, .. }))
            .count();
        assert_eq!(thrust_starts, 1);
        assert!(state.events.contains(&GameEvent::StopThrustSound));
    }

    #[test]
    fn test_shot_cooldown() {
        let mut state = live_state();
        assert!(try_shoot(&mut state));
        assert_eq!(state.bullets.len(), 1);
        assert_eq!(state.ship.bullet_cooldown, NORMAL_FIRE_RATE);
        assert!(!try_shoot(&mut state));

        state.ship.bullet_cooldown = 0.0;
        state.ship.rapid_fire = 100.0;
        state.progress.set_upgrade_level(UpgradeId::FireRate, 5);
        assert!(try_shoot(&mut state));
        // floor(5 * 0.5)
        assert_eq!(state.ship.bullet_cooldown, 2.0);
    }

    #[test]
    fn test_triple_shot_spreads() {
        let mut state = live_state();
        state.ship.triple_shot = 100.0;
        assert!(try_shoot(&mut state));
        assert_eq!(state.bullets.len(), 3);
        let ys: Vec<f32> = state.bullets.iter().map(|b| b.body.vel.y).collect();
        assert!(ys[0] < 0.0 && ys[1].abs() < 1e-4 && ys[2] > 0.0);
    }

    #[test]
    fn test_no_shooting_while_respawning() {
        let mut state = live_state();
        state.ship.respawning = 10.0;
        assert!(!try_shoot(&mut state));
        assert!(!try_dash(&mut state));
    }

    #[test]
    fn test_respawning_ship_ignores_input() {
        let mut state = live_state();
        state.ship.respawning = 10.0;
        state.ship.invulnerable = 50.0;
        update_ship(&mut state, &thrust());
        assert_eq!(state.ship.body.vel, Vec2::ZERO);
        assert_eq!(state.ship.respawning, 9.0);
        assert_eq!(state.ship.invulnerable, 50.0);
    }

    #[test]
    fn test_normal_dash() {
        let mut state = live_state();
        assert!(try_dash(&mut state));
        assert_eq!(state.ship.dashing, DASH_DURATION);
        assert_eq!(state.ship.dash_cooldown, DASH_COOLDOWN);
        update_ship(&mut state, &TickInput::default());
        let expected = SHIP_MAX_SPEED * DASH_SPEED_MULT;
        assert!((state.ship.body.vel.length() - expected).abs() < 1e-3);
        assert!(!state.ship.is_vulnerable());
        assert!(!try_dash(&mut state));
    }

    #[test]
    fn test_dash_cooldown_upgrade() {
        let mut state = live_state();
        state.progress.set_upgrade_level(UpgradeId::DashCooldown, 3);
        assert!(try_dash(&mut state));
        assert_eq!(state.ship.dash_cooldown, DASH_COOLDOWN - 60.0);
    }

    #[test]
    fn test_dash_with_ready_meter_starts_finisher() {
        let mut state = live_state();
        let pos = state.ship.body.pos + Vec2::new(120.0, 0.0);
        let id = state.next_entity_id();
        state.enemies.push(Enemy {
            id,
            body: Body::new(pos, Vec2::ZERO),
            angle: 0.0,
            ai: EnemyAi::Circler,
            orbit_angle: 0.0,
            fire_cooldown: 90.0,
            health: ENEMY_HEALTH,
            max_health: ENEMY_HEALTH,
            radius: ENEMY_RADIUS,
            hit_flash: 0.0,
        });
        state.finisher.meter = 100.0;
        state.finisher.ready = true;
        assert!(try_dash(&mut state));
        assert_eq!(state.finisher.phase, FinisherPhase::LockOn);
        assert_eq!(state.finisher.target, Some(id));
        assert_eq!(state.ship.dashing, 0.0);
    }

    #[test]
    fn test_shield_absorbs_hit() {
        let mut state = live_state();
        state.ship.shield = 100.0;
        assert_eq!(damage_ship(&mut state), ShipHit::Shielded);
        assert_eq!(state.lives, SHIP_START_LIVES);
        assert_eq!(state.ship.shield, 0.0);
        assert!(state.untouchable_level);
    }

    #[test]
    fn test_life_lost_resets_ship() {
        let mut state = live_state();
        state.ship.body.pos = Vec2::new(10.0, 10.0);
        state.ship.body.vel = Vec2::new(3.0, 3.0);
        assert_eq!(damage_ship(&mut state), ShipHit::LifeLost);
        assert_eq!(state.lives, SHIP_START_LIVES - 1);
        assert!(!state.untouchable_level);
        assert_eq!(state.ship.body.pos, state.arena.center());
        assert_eq!(state.ship.body.vel, Vec2::ZERO);
        assert_eq!(state.ship.respawning, SHIP_RESPAWN_DURATION);
        assert_eq!(state.ship.invulnerable, SHIP_INVULNERABILITY_TIME);
    }

    #[test]
    fn test_last_life_ends_game() {
        let mut state = live_state();
        state.lives = 1;
        assert_eq!(damage_ship(&mut state), ShipHit::GameOver);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.events.contains(&GameEvent::StopAllSounds));
        assert!(state.events.contains(&GameEvent::SaveRequested));
    }
}
