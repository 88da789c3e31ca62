//! Enemy steering and shooting

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::entity::{Bullet, Enemy, EnemyAi};
use super::physics::{Arena, apply_friction, apply_speed_limit, tick_timer, update_entity_physics};
use super::state::SimulationState;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::{angle_between, heading, normalize_degrees};

/// Steer toward the behavior's goal and face the ship
pub fn update_enemy_ai(enemy: &mut Enemy, ship_pos: Vec2, time_scale: f32, scale: f32) {
    let to_ship = ship_pos - enemy.body.pos;
    let distance = to_ship.length();
    let dir = to_ship.normalize_or_zero();
    let speed = ENEMY_SPEED * scale * time_scale;

    match enemy.ai {
        EnemyAi::Hunter => {
            if distance > ENEMY_MIN_DISTANCE * scale {
                enemy.body.vel += dir * HUNTER_APPROACH_SPEED * speed;
            } else {
                enemy.body.vel -= dir * HUNTER_RETREAT_SPEED * speed;
            }
        }
        EnemyAi::Circler => {
            enemy.orbit_angle = normalize_degrees(enemy.orbit_angle + CIRCLER_ORBIT_SPEED * time_scale);
            let target = ship_pos + heading(enemy.orbit_angle) * CIRCLER_ORBIT_RADIUS * scale;
            let to_target = (target - enemy.body.pos).normalize_or_zero();
            enemy.body.vel += to_target * CIRCLER_APPROACH_SPEED * speed;
        }
    }

    if distance > 0.0 {
        enemy.angle = normalize_degrees(angle_between(enemy.body.pos, ship_pos));
    }
}

/// Speed cap, drag and movement with wrap-around
pub fn apply_enemy_physics(enemy: &mut Enemy, time_scale: f32, arena: &Arena) {
    apply_speed_limit(&mut enemy.body.vel, ENEMY_SPEED * arena.scale * ENEMY_SPEED_REDUCTION);
    apply_friction(&mut enemy.body.vel, ENEMY_FRICTION, time_scale);
    update_entity_physics(enemy, time_scale, Some(arena));
}

fn roll_fire_cooldown(rng: &mut Pcg32) -> f32 {
    ENEMY_FIRE_RATE + rng.random_range(-ENEMY_FIRE_VARIANCE..=ENEMY_FIRE_VARIANCE) as f32
}

/// Count the fire cooldown down and shoot when the ship is in range.
///
/// The cooldown is rerolled whenever it runs out, whether or not a shot was
/// fired, so an enemy out of range does not fire the instant it gets close.
pub fn update_enemy_shooting(
    enemy: &mut Enemy,
    ship_pos: Vec2,
    time_scale: f32,
    scale: f32,
    rng: &mut Pcg32,
) -> Option<Bullet> {
    enemy.fire_cooldown = tick_timer(enemy.fire_cooldown, 1.0, time_scale);
    if enemy.fire_cooldown > 0.0 {
        return None;
    }
    enemy.fire_cooldown = roll_fire_cooldown(rng);

    let distance = enemy.body.pos.distance(ship_pos);
    if distance <= ENEMY_FIRE_MIN_DISTANCE * scale || distance >= ENEMY_FIRE_MAX_DISTANCE * scale {
        return None;
    }

    let aim = enemy.angle + rng.random_range(-ENEMY_AIM_INACCURACY..ENEMY_AIM_INACCURACY);
    let dir = heading(aim);
    let speed = BULLET_SPEED * scale * ENEMY_BULLET_SPEED_MULT;
    Some(Bullet::new(enemy.body.pos + dir * enemy.radius, dir * speed, true))
}

/// Run AI, physics and shooting for every enemy
pub fn update_enemies(state: &mut SimulationState) {
    let ship_pos = state.ship.body.pos;
    let ts = state.time_scale;
    let arena = state.arena;
    let mut shots = Vec::new();

    for enemy in &mut state.enemies {
        update_enemy_ai(enemy, ship_pos, ts, arena.scale);
        apply_enemy_physics(enemy, ts, &arena);
        if let Some(bullet) = update_enemy_shooting(enemy, ship_pos, ts, arena.scale, &mut state.rng) {
            shots.push(bullet);
        }
    }

    for bullet in shots {
        let x = bullet.body.pos.x;
        state.enemy_bullets.push(bullet);
        state.play_sound(SoundEffect::EnemyShoot, x, 0.7);
    }
}
