//! Hit resolution
//!
//! One pass per frame, in a fixed order: player bullets against asteroids,
//! then against enemies, then the ship against anything harmful, then
//! power-up pickups. Removals are marked during a pass and applied when it
//! ends, so nothing is processed twice in one frame.

use glam::Vec2;
use rand::Rng;

use super::collision::{ShipContact, compact, find_pickups, find_ship_contact, first_overlap};
use super::combo::add_combo;
use super::effects::{create_explosion, create_floating_text, create_powerup_streak};
use super::entity::{Asteroid, PowerUpKind, Rgb, palette};
use super::ship::damage_ship;
use super::spawn::{create_asteroid, create_enemy, create_powerup};
use super::state::{GamePhase, SimulationState};
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::progression::AchievementId;

/// Explosion colour and particle count for a destroyed asteroid
fn asteroid_explosion(size: u8) -> (Rgb, usize) {
    match size {
        3 => (Rgb(255, 150, 50), 30),
        2 => (Rgb(200, 200, 100), 20),
        _ => (Rgb(150, 150, 255), 15),
    }
}

/// Run every collision pass for this frame
pub fn resolve_collisions(state: &mut SimulationState) {
    resolve_bullet_hits(state);
    if state.ship.is_vulnerable() {
        resolve_ship_contact(state);
    }
    if state.phase == GamePhase::Playing {
        resolve_pickups(state);
    }
}

/// Player bullets against asteroids, then the unspent ones against enemies
pub fn resolve_bullet_hits(state: &mut SimulationState) {
    let bullet_radius = state.scaled(BULLET_RADIUS);
    let margin = state.scaled(ASTEROID_COLLISION_MARGIN);

    let mut spent = vec![false; state.bullets.len()];
    let mut asteroids_gone = vec![false; state.asteroids.len()];
    let mut fragments = Vec::new();

    for (b, spent_flag) in spent.iter_mut().enumerate() {
        let pos = state.bullets[b].body.pos;
        let targets = state.asteroids.iter().map(|a| (a.body.pos, a.radius + margin));
        let Some(a) = first_overlap(pos, bullet_radius, targets, &asteroids_gone) else {
            continue;
        };
        *spent_flag = true;
        if hit_asteroid(state, a, &mut fragments) {
            asteroids_gone[a] = true;
        }
    }

    let mut enemies_gone = vec![false; state.enemies.len()];
    for (b, spent_flag) in spent.iter_mut().enumerate() {
        if *spent_flag {
            continue;
        }
        let pos = state.bullets[b].body.pos;
        let targets = state.enemies.iter().map(|e| (e.body.pos, e.radius));
        let Some(e) = first_overlap(pos, bullet_radius, targets, &enemies_gone) else {
            continue;
        };
        *spent_flag = true;
        if hit_enemy(state, e) {
            enemies_gone[e] = true;
        }
    }

    compact(&mut state.bullets, &spent);
    compact(&mut state.asteroids, &asteroids_gone);
    state.asteroids.extend(fragments);
    compact(&mut state.enemies, &enemies_gone);
}

/// Apply one bullet hit to asteroid `index`. Returns true when it is destroyed.
///
/// Any hit destroys a regular asteroid and splits it into two of the next size
/// down. Bosses soak damage until their health runs out.
fn hit_asteroid(state: &mut SimulationState, index: usize, fragments: &mut Vec<Asteroid>) -> bool {
    let damage = state.progress.bullet_damage();
    let asteroid = &mut state.asteroids[index];
    let pos = asteroid.body.pos;

    if asteroid.is_boss {
        asteroid.health -= damage;
        asteroid.hit_flash = ASTEROID_HIT_FLASH;
        let destroyed = asteroid.health <= 0;
        if destroyed {
            destroy_boss(state, pos);
        }
        state.check_achievement(AchievementId::FirstBlood);
        return destroyed;
    }

    let size = asteroid.size;
    let has_crystals = asteroid.has_crystals;
    let base_score = asteroid.base_score();
    if size > 1 {
        asteroid.hit_flash = ASTEROID_HIT_FLASH;
    }

    let (color, count) = asteroid_explosion(size);
    create_explosion(state, pos, count, color, false);
    let drop = has_crystals.then_some(PowerUpKind::Crystal);
    create_powerup(state, pos, drop);

    let points = (base_score as f32 * (1.0 + state.combo.current as f32 * 0.1)) as u32;
    state.add_score(points);
    add_combo(state);
    create_floating_text(state, pos, format!("+{points}"), palette::SCORE_TEXT);

    if size > 1 {
        for _ in 0..ASTEROID_SPLIT_COUNT {
            let child = create_asteroid(state, size - 1, Some(pos), false, false);
            fragments.push(child);
        }
    }

    if state.rng.random::<f32>() < ENEMY_SPAWN_CHANCE && state.enemies.len() < ENEMY_MAX_COUNT {
        let enemy = create_enemy(state);
        log::debug!("Enemy {} ({:?}) joined the fight", enemy.id, enemy.ai);
        state.enemies.push(enemy);
    }

    state.check_achievement(AchievementId::FirstBlood);
    true
}

fn destroy_boss(state: &mut SimulationState, pos: Vec2) {
    create_explosion(state, pos, 60, palette::BOSS, false);
    state.add_score(BOSS_SCORE);
    add_combo(state);
    create_floating_text(state, pos, format!("+{BOSS_SCORE}"), palette::GOLD);

    let spread = state.scaled(BOSS_CRYSTAL_SPREAD);
    for _ in 0..BOSS_CRYSTAL_DROPS {
        let offset = Vec2::new(
            state.rng.random_range(-spread..=spread),
            state.rng.random_range(-spread..=spread),
        );
        create_powerup(state, pos + offset, Some(PowerUpKind::Crystal));
    }

    state.progress.boss_kills += 1;
    log::info!("Boss destroyed on level {} ({} total)", state.level, state.progress.boss_kills);
    state.check_achievement(AchievementId::BossSlayer);
}

/// Apply one bullet hit to enemy `index`. Returns true when it is destroyed.
fn hit_enemy(state: &mut SimulationState, index: usize) -> bool {
    let damage = state.progress.bullet_damage();
    let enemy = &mut state.enemies[index];
    enemy.health -= damage;
    enemy.hit_flash = ASTEROID_HIT_FLASH;
    if enemy.health > 0 {
        return false;
    }

    let pos = enemy.body.pos;
    create_explosion(state, pos, 25, palette::ENEMY, true);
    state.add_score(ENEMY_SCORE);
    add_combo(state);
    create_floating_text(state, pos, format!("+{ENEMY_SCORE}"), palette::ENEMY);

    let drop = if state.rng.random::<f32>() < ENEMY_CRYSTAL_DROP_CHANCE {
        Some(PowerUpKind::Crystal)
    } else {
        None
    };
    create_powerup(state, pos, drop);
    true
}

/// Resolve at most one harmful contact with the ship
fn resolve_ship_contact(state: &mut SimulationState) {
    let Some(contact) = find_ship_contact(state) else {
        return;
    };
    match contact {
        ShipContact::Asteroid(_) => {}
        ShipContact::Enemy(i) => {
            let enemy = state.enemies.remove(i);
            create_explosion(state, enemy.body.pos, 20, palette::ENEMY, true);
            if state.finisher.target == Some(enemy.id) {
                log::debug!("Finisher target {} rammed", enemy.id);
            }
        }
        ShipContact::EnemyBullet(i) => {
            state.enemy_bullets.remove(i);
        }
    }
    damage_ship(state);
}

/// Collect every power-up the ship is touching
fn resolve_pickups(state: &mut SimulationState) {
    let picked = find_pickups(state);
    if picked.is_empty() {
        return;
    }

    let mut taken = vec![false; state.powerups.len()];
    for &i in &picked {
        taken[i] = true;
        let (pos, kind) = (state.powerups[i].body.pos, state.powerups[i].kind);
        let ship_pos = state.ship.body.pos;
        create_powerup_streak(state, pos, ship_pos, kind.color());
        apply_powerup(state, kind);

        if kind == PowerUpKind::Crystal {
            state.add_crystals(CRYSTAL_VALUE);
            create_floating_text(state, pos, format!("+{CRYSTAL_VALUE} crystals"), palette::CRYSTAL);
            state.check_achievement(AchievementId::CrystalHoarder);
        } else {
            state.add_score(POWERUP_SCORE);
            create_floating_text(state, pos, format!("+{POWERUP_SCORE}"), kind.color());
        }
    }
    compact(&mut state.powerups, &taken);
}

/// Ship-side effect of a power-up
pub fn apply_powerup(state: &mut SimulationState, kind: PowerUpKind) {
    let sound = match kind {
        PowerUpKind::Rapid => SoundEffect::PowerupRapid,
        PowerUpKind::Triple => SoundEffect::PowerupTriple,
        PowerUpKind::Shield => SoundEffect::PowerupShield,
        PowerUpKind::Life => SoundEffect::PowerupLife,
        PowerUpKind::Crystal => SoundEffect::PowerupCrystal,
    };
    let x = state.ship.body.pos.x;
    state.play_sound(sound, x, 1.0);

    state.ship.powerup_flash = POWERUP_FLASH;
    state.ship.powerup_flash_color = kind.color();
    state.add_screen_shake(3.0);

    match kind {
        PowerUpKind::Rapid => state.ship.rapid_fire = RAPID_FIRE_DURATION,
        PowerUpKind::Triple => state.ship.triple_shot = TRIPLE_SHOT_DURATION,
        PowerUpKind::Shield => state.ship.shield = SHIELD_DURATION,
        PowerUpKind::Life => {
            state.lives = (state.lives + 1).min(SHIP_MAX_LIVES);
            state.ship.powerup_flash = POWERUP_FLASH_MAX;
            state.add_screen_shake(5.0);
        }
        PowerUpKind::Crystal => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::{Progression, UpgradeId};
    use crate::settings::SimConfig;
    use crate::sim::entity::{Body, Bullet, Enemy, EnemyAi, PowerUp};

    fn empty_state() -> SimulationState {
        let mut state = SimulationState::new(11, &SimConfig::default(), Progression::default());
        state.asteroids.clear();
        state.events.clear();
        // Keep the ship out of the way of test targets
        state.ship.body.pos = Vec2::new(700.0, 500.0);
        state
    }

    fn rock(state: &mut SimulationState, size: u8, pos: Vec2) -> usize {
        let mut a = create_asteroid(state, size, Some(pos), false, false);
        a.body.vel = Vec2::ZERO;
        state.asteroids.push(a);
        state.asteroids.len() - 1
    }

    fn enemy(state: &mut SimulationState, pos: Vec2) {
        let id = state.next_entity_id();
        state.enemies.push(Enemy {
            id,
            body: Body::new(pos, Vec2::ZERO),
            angle: 0.0,
            ai: EnemyAi::Hunter,
            orbit_angle: 0.0,
            fire_cooldown: 90.0,
            health: ENEMY_HEALTH,
            max_health: ENEMY_HEALTH,
            radius: ENEMY_RADIUS,
            hit_flash: 0.0,
        });
    }

    fn shoot_at(state: &mut SimulationState, pos: Vec2) {
        state.bullets.push(Bullet::new(pos, Vec2::ZERO, false));
    }

    #[test]
    fn test_large_asteroid_splits_in_place() {
        let mut state = empty_state();
        let pos = Vec2::new(200.0, 200.0);
        rock(&mut state, 3, pos);
        shoot_at(&mut state, pos);
        resolve_bullet_hits(&mut state);

        assert!(state.bullets.is_empty());
        assert_eq!(state.asteroids.len(), 2);
        assert!(state.asteroids.iter().all(|a| a.size == 2 && a.body.pos == pos));
        assert_eq!(state.score, 100);
        assert_eq!(state.combo.current, 1);
        assert!(state.progress.is_unlocked(AchievementId::FirstBlood));
    }

    #[test]
    fn test_smallest_asteroid_vanishes() {
        let mut state = empty_state();
        let pos = Vec2::new(200.0, 200.0);
        rock(&mut state, 1, pos);
        shoot_at(&mut state, pos);
        resolve_bullet_hits(&mut state);
        assert!(state.asteroids.is_empty());
        assert_eq!(state.score, 20);
    }

    #[test]
    fn test_two_bullets_one_small_asteroid() {
        let mut state = empty_state();
        let pos = Vec2::new(200.0, 200.0);
        rock(&mut state, 1, pos);
        shoot_at(&mut state, pos);
        shoot_at(&mut state, pos + Vec2::new(1.0, 0.0));
        resolve_bullet_hits(&mut state);

        assert!(state.asteroids.is_empty());
        assert_eq!(state.score, 20);
        assert_eq!(state.combo.current, 1);
        // The second bullet found nothing left to hit
        assert_eq!(state.bullets.len(), 1);
    }

    #[test]
    fn test_score_scales_with_combo() {
        let mut state = empty_state();
        state.combo.current = 5;
        state.combo.timer = COMBO_TIMEOUT;
        let pos = Vec2::new(200.0, 200.0);
        rock(&mut state, 2, pos);
        shoot_at(&mut state, pos);
        resolve_bullet_hits(&mut state);
        // 50 * 1.5
        assert_eq!(state.score, 75);
        assert_eq!(state.combo.current, 6);
    }

    #[test]
    fn test_boss_takes_many_hits() {
        let mut state = empty_state();
        let pos = Vec2::new(300.0, 300.0);
        let mut boss = create_asteroid(&mut state, 3, Some(pos), true, false);
        boss.body.vel = Vec2::ZERO;
        boss.health = 2;
        state.asteroids.push(boss);

        shoot_at(&mut state, pos);
        resolve_bullet_hits(&mut state);
        assert_eq!(state.asteroids.len(), 1);
        assert_eq!(state.asteroids[0].health, 1);
        assert_eq!(state.score, 0);

        shoot_at(&mut state, pos);
        resolve_bullet_hits(&mut state);
        assert!(state.asteroids.is_empty());
        assert_eq!(state.score, BOSS_SCORE);
        assert_eq!(state.progress.boss_kills, 1);
        assert!(state.progress.is_unlocked(AchievementId::BossSlayer));
        let crystals = state
            .powerups
            .iter()
            .filter(|p| p.kind == PowerUpKind::Crystal)
            .count();
        assert!(crystals >= BOSS_CRYSTAL_DROPS);
    }

    #[test]
    fn test_boss_accepts_several_bullets_in_one_frame() {
        let mut state = empty_state();
        let pos = Vec2::new(300.0, 300.0);
        let mut boss = create_asteroid(&mut state, 3, Some(pos), true, false);
        boss.body.vel = Vec2::ZERO;
        state.asteroids.push(boss);
        for _ in 0..3 {
            shoot_at(&mut state, pos);
        }
        resolve_bullet_hits(&mut state);
        assert!(state.bullets.is_empty());
        assert_eq!(state.asteroids[0].health, BOSS_HEALTH - 3);
    }

    #[test]
    fn test_damage_upgrade_hits_harder() {
        let mut state = empty_state();
        state.progress.set_upgrade_level(UpgradeId::Damage, 5);
        let pos = Vec2::new(300.0, 100.0);
        enemy(&mut state, pos);
        shoot_at(&mut state, pos);
        resolve_bullet_hits(&mut state);
        // floor(1 + 5 * 0.2) = 2
        assert_eq!(state.enemies[0].health, ENEMY_HEALTH - 2);
    }

    #[test]
    fn test_enemy_destroyed_after_three_hits() {
        let mut state = empty_state();
        let pos = Vec2::new(300.0, 100.0);
        enemy(&mut state, pos);
        for _ in 0..3 {
            shoot_at(&mut state, pos);
        }
        resolve_bullet_hits(&mut state);
        assert!(state.enemies.is_empty());
        assert_eq!(state.score, ENEMY_SCORE);
        assert_eq!(state.combo.current, 1);
    }

    #[test]
    fn test_bullet_spent_on_asteroid_skips_enemy() {
        let mut state = empty_state();
        let pos = Vec2::new(300.0, 100.0);
        rock(&mut state, 1, pos);
        enemy(&mut state, pos);
        shoot_at(&mut state, pos);
        resolve_bullet_hits(&mut state);
        assert_eq!(state.enemies[0].health, ENEMY_HEALTH);
    }

    #[test]
    fn test_ship_hit_once_per_frame() {
        let mut state = empty_state();
        let ship_pos = state.ship.body.pos;
        rock(&mut state, 1, ship_pos);
        state
            .enemy_bullets
            .push(Bullet::new(ship_pos, Vec2::ZERO, true));
        resolve_collisions(&mut state);
        assert_eq!(state.lives, SHIP_START_LIVES - 1);
        assert_eq!(state.enemy_bullets.len(), 1);
    }

    #[test]
    fn test_shielded_hit_still_ends_ship_pass() {
        let mut state = empty_state();
        state.ship.shield = 100.0;
        let ship_pos = state.ship.body.pos;
        rock(&mut state, 1, ship_pos);
        enemy(&mut state, ship_pos);
        resolve_collisions(&mut state);
        assert_eq!(state.lives, SHIP_START_LIVES);
        assert_eq!(state.ship.shield, 0.0);
        assert_eq!(state.enemies.len(), 1);
    }

    #[test]
    fn test_ramming_destroys_enemy() {
        let mut state = empty_state();
        let ship_pos = state.ship.body.pos;
        enemy(&mut state, ship_pos + Vec2::new(5.0, 0.0));
        resolve_collisions(&mut state);
        assert!(state.enemies.is_empty());
        assert_eq!(state.lives, SHIP_START_LIVES - 1);
    }

    #[test]
    fn test_invulnerable_ship_is_not_hurt() {
        let mut state = empty_state();
        state.ship.invulnerable = 10.0;
        let ship_pos = state.ship.body.pos;
        rock(&mut state, 1, ship_pos);
        resolve_collisions(&mut state);
        assert_eq!(state.lives, SHIP_START_LIVES);
    }

    #[test]
    fn test_pickups() {
        let mut state = empty_state();
        state.lives = SHIP_MAX_LIVES;
        let ship_pos = state.ship.body.pos;
        for kind in [PowerUpKind::Rapid, PowerUpKind::Life, PowerUpKind::Crystal] {
            state.powerups.push(PowerUp {
                body: Body::new(ship_pos, Vec2::ZERO),
                kind,
                lifetime: 100.0,
                pulse: 0.0,
            });
        }
        resolve_collisions(&mut state);

        assert!(state.powerups.is_empty());
        assert_eq!(state.ship.rapid_fire, RAPID_FIRE_DURATION);
        assert_eq!(state.lives, SHIP_MAX_LIVES);
        assert_eq!(state.crystals, CRYSTAL_VALUE);
        assert_eq!(state.progress.lifetime_crystals, CRYSTAL_VALUE);
        assert_eq!(state.score, 2 * POWERUP_SCORE);
    }

    #[test]
    fn test_shield_pickup() {
        let mut state = empty_state();
        apply_powerup(&mut state, PowerUpKind::Shield);
        assert_eq!(state.ship.shield, SHIELD_DURATION);
        assert_eq!(state.ship.powerup_flash, POWERUP_FLASH);
    }
}
