//! Combo counter and the finisher move
//!
//! Kills feed a combo that times out after three seconds without another kill.
//! The combo fills the finisher meter; a full meter turns the next dash into a
//! scripted execution that runs through
//! `Idle -> LockOn -> PreImpact -> Impact -> PostImpact -> Idle`.
//!
//! Phase timers count real frames, not scaled ones, so the sequence lasts the
//! same wall-clock time while it slows the rest of the world down.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::effects::{create_explosion, create_finisher_explosion, create_floating_text};
use super::entity::{Enemy, PowerUpKind, palette};
use super::physics::tick_timer;
use super::spawn::create_powerup;
use super::state::SimulationState;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::progression::AchievementId;
use crate::{angle_between, heading, normalize_degrees};

/// Kill streak
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComboState {
    pub current: u32,
    /// Frames until the streak breaks
    pub timer: f32,
    /// Kills in the current streak
    pub kills: u32,
    /// Best streak this run
    pub max: u32,
    /// HUD pulse intensity
    pub pulse: f32,
}

/// Finisher execution phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FinisherPhase {
    #[default]
    Idle,
    LockOn,
    PreImpact,
    Impact,
    PostImpact,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinisherState {
    /// 0-100
    pub meter: f32,
    pub ready: bool,
    pub executing: bool,
    pub phase: FinisherPhase,
    /// Frames left in the current phase
    pub timer: f32,
    /// Id of the targeted enemy; it may die before impact
    pub target: Option<u32>,
    pub shockwave_radius: f32,
    pub lock_on_progress: f32,
    pub impact: Vec2,
    /// Shockwave damage checkpoints already applied this impact
    checkpoints_applied: usize,
}

/// Frames from lock-on to the end of post-impact
pub const FINISHER_TOTAL_FRAMES: f32 = FINISHER_LOCK_ON_FRAMES
    + FINISHER_PRE_IMPACT_FRAMES
    + FINISHER_IMPACT_FRAMES
    + FINISHER_POST_IMPACT_FRAMES;

/// Distance covered by a full dash
pub fn dash_distance(scale: f32) -> f32 {
    SHIP_MAX_SPEED * scale * DASH_SPEED_MULT * DASH_DURATION
}

/// Register a kill: extend the streak, fill the meter and announce milestones
pub fn add_combo(state: &mut SimulationState) {
    if state.combo.current == 0 {
        state.combo.kills = 0;
    }
    state.combo.current += 1;
    state.combo.timer = COMBO_TIMEOUT;
    state.combo.kills += 1;

    if !state.finisher.ready {
        let fill = if state.combo.current >= COMBO_HIGH_THRESHOLD {
            COMBO_FILL_HIGH
        } else if state.combo.current >= COMBO_MEDIUM_THRESHOLD {
            COMBO_FILL_MEDIUM
        } else {
            COMBO_FILL_BASE
        };
        state.finisher.meter = (state.finisher.meter + fill).min(FINISHER_METER_MAX);
        if state.finisher.meter >= FINISHER_METER_MAX {
            state.finisher.ready = true;
            let x = state.ship.body.pos.x;
            state.play_sound(SoundEffect::PowerupLife, x, 0.5);
        }
    }

    state.check_achievement(AchievementId::Combo5);
    state.check_achievement(AchievementId::Combo10);

    let current = state.combo.current;
    if current < COMBO_TEXT_THRESHOLD {
        return;
    }
    let ship_pos = state.ship.body.pos;
    let above = Vec2::new(ship_pos.x, ship_pos.y - state.scaled(30.0));
    create_floating_text(state, above, format!("COMBO x{current}!"), palette::GOLD);

    if state.combo.kills % COMBO_PULSE_INTERVAL == 0 {
        state.combo.pulse = (current as f32 * 2.0).min(COMBO_MAX_PULSE);
        state.add_screen_shake(8.0);
        state.play_sound(SoundEffect::PowerupLife, ship_pos.x, 0.8);
        let below = Vec2::new(ship_pos.x, ship_pos.y + state.scaled(20.0));
        create_floating_text(state, below, "10TH KILL!", palette::SCORE_TEXT);
    } else if COMBO_MILESTONES.contains(&current) {
        state.add_screen_shake(5.0);
        state.play_sound(SoundEffect::PowerupLife, ship_pos.x, 0.6);
    }
}

/// Count the streak down and fade the pulse
pub fn update_combo(state: &mut SimulationState) {
    let ts = state.time_scale;
    let combo = &mut state.combo;
    if combo.timer > 0.0 {
        combo.timer = tick_timer(combo.timer, 1.0, ts);
        if combo.timer <= 0.0 {
            combo.max = combo.max.max(combo.current);
            combo.current = 0;
            combo.kills = 0;
        }
    }
    combo.pulse = (combo.pulse - COMBO_PULSE_FADE * ts).max(0.0);
}

/// Drain the meter while no streak is running
pub fn update_finisher_meter(state: &mut SimulationState) {
    let finisher = &mut state.finisher;
    if state.combo.current == 0 && finisher.meter > 0.0 && !finisher.executing {
        finisher.meter = (finisher.meter - FINISHER_METER_DECAY * state.time_scale).max(0.0);
        if finisher.meter < FINISHER_METER_MAX {
            finisher.ready = false;
        }
    }
}

/// First enemy (nearest along the path) a dash from `origin` would pass through
pub fn find_finisher_target(
    origin: Vec2,
    angle: f32,
    enemies: &[Enemy],
    ship_radius: f32,
    dash_len: f32,
) -> Option<u32> {
    let path = heading(angle) * dash_len;
    let len_sq = path.length_squared();
    if len_sq == 0.0 {
        return None;
    }

    let mut best: Option<(f32, u32)> = None;
    for enemy in enemies {
        let t = ((enemy.body.pos - origin).dot(path) / len_sq).clamp(0.0, 1.0);
        let closest = origin + path * t;
        let reach = enemy.radius + ship_radius;
        if enemy.body.pos.distance_squared(closest) <= reach * reach
            && best.is_none_or(|(best_t, _)| t < best_t)
        {
            best = Some((t, enemy.id));
        }
    }
    best.map(|(_, id)| id)
}

/// Begin the execution sequence against enemy `target`
pub fn start_finisher(state: &mut SimulationState, target: u32) {
    let Some(idx) = state.enemy_index(target) else {
        return;
    };
    let target_pos = state.enemies[idx].body.pos;
    let ship_pos = state.ship.body.pos;

    state.ship.angle = normalize_degrees(angle_between(ship_pos, target_pos));
    let impact = ship_pos + heading(state.ship.angle) * dash_distance(state.arena.scale) / 2.0;

    let finisher = &mut state.finisher;
    finisher.executing = true;
    finisher.phase = FinisherPhase::LockOn;
    finisher.timer = FINISHER_LOCK_ON_FRAMES;
    finisher.target = Some(target);
    finisher.lock_on_progress = 0.0;
    finisher.impact = impact;
    finisher.checkpoints_applied = 0;

    let invuln = FINISHER_TOTAL_FRAMES + (FINISHER_INVULN_BUFFER_SECS * FPS).floor();
    state.ship.invulnerable = state.ship.invulnerable.max(invuln);
    state.time_scale = FINISHER_LOCK_ON_TIME_SCALE;
    state.play_sound(SoundEffect::PowerupShield, ship_pos.x, 0.8);
    log::debug!("Finisher locked on enemy {target}");
}

/// Advance the execution sequence by one frame
pub fn update_finisher(state: &mut SimulationState) {
    if !state.finisher.executing {
        return;
    }
    state.finisher.timer -= 1.0;

    match state.finisher.phase {
        FinisherPhase::LockOn => {
            // Keep the nose on the target while the world slows down
            if let Some(idx) = state.finisher.target.and_then(|id| state.enemy_index(id)) {
                let target_pos = state.enemies[idx].body.pos;
                state.ship.angle = normalize_degrees(angle_between(state.ship.body.pos, target_pos));
            }
            state.finisher.lock_on_progress =
                (1.0 - state.finisher.timer / FINISHER_LOCK_ON_FRAMES).clamp(0.0, 1.0);
            if state.finisher.timer <= 0.0 {
                enter_pre_impact(state);
            }
        }
        FinisherPhase::PreImpact => {
            if state.finisher.timer <= 0.0 {
                enter_impact(state);
            }
        }
        FinisherPhase::Impact => {
            update_shockwave(state);
            if state.finisher.timer <= 0.0 {
                state.finisher.phase = FinisherPhase::PostImpact;
                state.finisher.timer = FINISHER_POST_IMPACT_FRAMES;
                state.time_scale = 1.0;
            }
        }
        FinisherPhase::PostImpact => {
            if state.finisher.timer <= 0.0 {
                finish(state);
            }
        }
        FinisherPhase::Idle => {
            // executing without a phase should not happen; recover quietly
            finish(state);
        }
    }
}

fn enter_pre_impact(state: &mut SimulationState) {
    let finisher = &mut state.finisher;
    finisher.phase = FinisherPhase::PreImpact;
    finisher.timer = FINISHER_PRE_IMPACT_FRAMES;
    finisher.lock_on_progress = 1.0;
    finisher.meter = 0.0;
    finisher.ready = false;

    // The lunge itself runs at full speed
    state.time_scale = 1.0;
    state.ship.dashing = FINISHER_PRE_IMPACT_FRAMES + FINISHER_IMPACT_FRAMES + FINISHER_POST_IMPACT_FRAMES;
    let x = state.ship.body.pos.x;
    state.play_sound(SoundEffect::Dash, x, 1.2);
}

fn enter_impact(state: &mut SimulationState) {
    state.finisher.phase = FinisherPhase::Impact;
    state.finisher.timer = FINISHER_IMPACT_FRAMES;
    state.finisher.shockwave_radius = state.scaled(FINISHER_SHOCKWAVE_START);
    state.finisher.checkpoints_applied = 0;
    state.time_scale = FINISHER_IMPACT_TIME_SCALE;

    let Some(idx) = state.finisher.target.and_then(|id| state.enemy_index(id)) else {
        log::debug!("Finisher target gone before impact");
        return;
    };
    let target = state.enemies.remove(idx);
    let pos = target.body.pos;

    create_finisher_explosion(state, pos);
    let label = Vec2::new(pos.x, pos.y - state.scaled(30.0));
    create_floating_text(state, label, "EXECUTED!", palette::GOLD);
    state.finisher.impact = pos;
    state.add_screen_shake(30.0);
    state.flash(20.0, palette::WHITE);
    state.play_sound(SoundEffect::ExplosionLarge, pos.x, 1.5);

    state.add_score(FINISHER_SCORE);
    state.ship.dash_cooldown = 0.0;
    create_powerup(state, pos, Some(PowerUpKind::Crystal));
    state.combo.timer = COMBO_TIMEOUT;
    log::debug!("Finisher executed enemy {}", target.id);
}

/// Grow the shockwave and apply damage as it passes each checkpoint
fn update_shockwave(state: &mut SimulationState) {
    let progress = (1.0 - state.finisher.timer / FINISHER_IMPACT_FRAMES).clamp(0.0, 1.0);
    let start = state.scaled(FINISHER_SHOCKWAVE_START);
    let max = state.scaled(FINISHER_SHOCKWAVE_RADIUS);
    state.finisher.shockwave_radius = start + (max - start) * progress;

    while let Some(&checkpoint) = FINISHER_DAMAGE_CHECKPOINTS.get(state.finisher.checkpoints_applied) {
        if progress < checkpoint {
            break;
        }
        state.finisher.checkpoints_applied += 1;
        let (center, radius) = (state.finisher.impact, state.finisher.shockwave_radius);
        apply_shockwave_damage(state, center, radius);
    }
}

/// Damage and push back every enemy inside the shockwave
pub fn apply_shockwave_damage(state: &mut SimulationState, center: Vec2, radius: f32) {
    let knockback = state.scaled(FINISHER_KNOCKBACK);
    let mut killed = Vec::new();
    for (i, enemy) in state.enemies.iter_mut().enumerate() {
        let offset = enemy.body.pos - center;
        let dist = offset.length();
        if dist >= radius {
            continue;
        }
        enemy.health -= if dist < radius * 0.5 {
            FINISHER_CLOSE_DAMAGE
        } else {
            FINISHER_FAR_DAMAGE
        };
        enemy.hit_flash = ASTEROID_HIT_FLASH;
        if dist > 0.0 {
            enemy.body.vel += offset / dist * (1.0 - dist / radius) * knockback;
        }
        if enemy.health <= 0 {
            killed.push(i);
        }
    }

    for &i in killed.iter().rev() {
        let enemy = state.enemies.remove(i);
        create_explosion(state, enemy.body.pos, 20, palette::ENEMY, true);
        state.add_score(ENEMY_SCORE);
        add_combo(state);
    }
}

fn finish(state: &mut SimulationState) {
    let finisher = &mut state.finisher;
    finisher.executing = false;
    finisher.phase = FinisherPhase::Idle;
    finisher.timer = 0.0;
    finisher.target = None;
    finisher.shockwave_radius = 0.0;
    finisher.lock_on_progress = 0.0;
    finisher.checkpoints_applied = 0;
    state.ship.dashing = 0.0;
    state.time_scale = 1.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::Progression;
    use crate::settings::SimConfig;
    use crate::sim::entity::{Body, EnemyAi};

    fn empty_state() -> SimulationState {
        let mut state = SimulationState::new(11, &SimConfig::default(), Progression::default());
        state.asteroids.clear();
        state.events.clear();
        state
    }

    fn push_enemy(state: &mut SimulationState, pos: Vec2) -> u32 {
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
        id
    }

    #[test]
    fn test_meter_fill_rates() {
        let mut state = empty_state();
        for _ in 0..4 {
            add_combo(&mut state);
        }
        assert_eq!(state.finisher.meter, 40.0);
        // 5th kill is at the medium rate
        add_combo(&mut state);
        assert_eq!(state.finisher.meter, 55.0);
        for _ in 0..3 {
            add_combo(&mut state);
        }
        assert_eq!(state.finisher.meter, 100.0);
        assert!(state.finisher.ready);
    }

    #[test]
    fn test_ready_meter_does_not_keep_filling() {
        let mut state = empty_state();
        state.finisher.meter = 95.0;
        add_combo(&mut state);
        assert!(state.finisher.ready);
        let sounds_before = state.events.len();
        add_combo(&mut state);
        assert_eq!(state.finisher.meter, 100.0);
        assert!(state.finisher.ready);
        // No second "meter full" fanfare
        assert!(state.events.len() - sounds_before <= 1);
    }

    #[test]
    fn test_combo_times_out() {
        let mut state = empty_state();
        add_combo(&mut state);
        add_combo(&mut state);
        add_combo(&mut state);
        for _ in 0..COMBO_TIMEOUT as usize {
            update_combo(&mut state);
        }
        assert_eq!(state.combo.current, 0);
        assert_eq!(state.combo.kills, 0);
        assert_eq!(state.combo.max, 3);
    }

    #[test]
    fn test_combo_timer_slows_with_time_scale() {
        let mut state = empty_state();
        add_combo(&mut state);
        state.time_scale = 0.1;
        for _ in 0..COMBO_TIMEOUT as usize {
            update_combo(&mut state);
        }
        assert_eq!(state.combo.current, 1);
    }

    #[test]
    fn test_combo_achievements_unlock() {
        let mut state = empty_state();
        for _ in 0..10 {
            add_combo(&mut state);
        }
        assert!(state.progress.is_unlocked(AchievementId::Combo5));
        assert!(state.progress.is_unlocked(AchievementId::Combo10));
        assert_eq!(state.combo.pulse, COMBO_MAX_PULSE);
    }

    #[test]
    fn test_meter_decays_only_without_combo() {
        let mut state = empty_state();
        state.finisher.meter = 100.0;
        state.finisher.ready = true;
        state.combo.current = 2;
        update_finisher_meter(&mut state);
        assert_eq!(state.finisher.meter, 100.0);
        assert!(state.finisher.ready);

        state.combo.current = 0;
        update_finisher_meter(&mut state);
        assert!(state.finisher.meter < 100.0);
        assert!(!state.finisher.ready);
    }

    #[test]
    fn test_target_search_picks_nearest_along_dash() {
        let mut state = empty_state();
        let origin = Vec2::new(100.0, 300.0);
        let far = push_enemy(&mut state, Vec2::new(300.0, 305.0));
        let near = push_enemy(&mut state, Vec2::new(180.0, 295.0));
        push_enemy(&mut state, Vec2::new(100.0, 100.0));
        let dash = dash_distance(1.0);
        let hit = find_finisher_target(origin, 0.0, &state.enemies, SHIP_RADIUS, dash);
        assert_eq!(hit, Some(near));
        assert_ne!(hit, Some(far));

        let miss = find_finisher_target(origin, 180.0, &state.enemies, SHIP_RADIUS, dash);
        assert_eq!(miss, None);
    }

    #[test]
    fn test_full_sequence_kills_target() {
        let mut state = empty_state();
        state.ship.body.pos = Vec2::new(100.0, 300.0);
        let target = push_enemy(&mut state, Vec2::new(200.0, 300.0));
        state.finisher.meter = 100.0;
        state.finisher.ready = true;
        let score_before = state.score;

        start_finisher(&mut state, target);
        assert_eq!(state.finisher.phase, FinisherPhase::LockOn);
        assert_eq!(state.time_scale, FINISHER_LOCK_ON_TIME_SCALE);
        assert!(state.ship.invulnerable >= FINISHER_TOTAL_FRAMES);

        for _ in 0..FINISHER_LOCK_ON_FRAMES as usize {
            update_finisher(&mut state);
        }
        assert_eq!(state.finisher.phase, FinisherPhase::PreImpact);
        assert_eq!(state.finisher.meter, 0.0);
        assert!(!state.finisher.ready);

        for _ in 0..FINISHER_PRE_IMPACT_FRAMES as usize {
            update_finisher(&mut state);
        }
        assert_eq!(state.finisher.phase, FinisherPhase::Impact);
        assert_eq!(state.time_scale, FINISHER_IMPACT_TIME_SCALE);
        assert!(state.enemy_index(target).is_none());
        assert_eq!(state.score, score_before + FINISHER_SCORE);
        assert!(state.powerups.iter().any(|p| p.kind == PowerUpKind::Crystal));
        let label = state
            .floating_texts
            .iter()
            .find(|t| t.text == "EXECUTED!")
            .expect("execution announced");
        assert_eq!(label.pos.y, state.finisher.impact.y - 30.0);

        for _ in 0..FINISHER_IMPACT_FRAMES as usize {
            update_finisher(&mut state);
        }
        assert_eq!(state.finisher.phase, FinisherPhase::PostImpact);
        assert_eq!(state.time_scale, 1.0);

        for _ in 0..FINISHER_POST_IMPACT_FRAMES as usize {
            update_finisher(&mut state);
        }
        assert_eq!(state.finisher.phase, FinisherPhase::Idle);
        assert!(!state.finisher.executing);
        assert_eq!(state.finisher.target, None);
        assert_eq!(state.ship.dashing, 0.0);
    }

    #[test]
    fn test_target_destroyed_before_impact() {
        let mut state = empty_state();
        state.ship.body.pos = Vec2::new(100.0, 300.0);
        let target = push_enemy(&mut state, Vec2::new(200.0, 300.0));
        start_finisher(&mut state, target);
        state.enemies.clear();
        let score_before = state.score;

        for _ in 0..(FINISHER_LOCK_ON_FRAMES + FINISHER_PRE_IMPACT_FRAMES) as usize {
            update_finisher(&mut state);
        }
        assert_eq!(state.finisher.phase, FinisherPhase::Impact);
        assert_eq!(state.score, score_before);
        assert!(state.powerups.is_empty());

        for _ in 0..(FINISHER_IMPACT_FRAMES + FINISHER_POST_IMPACT_FRAMES) as usize {
            update_finisher(&mut state);
        }
        assert_eq!(state.finisher.phase, FinisherPhase::Idle);
    }

    #[test]
    fn test_shockwave_damages_bystanders_twice() {
        let mut state = empty_state();
        state.ship.body.pos = Vec2::new(100.0, 300.0);
        let target = push_enemy(&mut state, Vec2::new(200.0, 300.0));
        // Far ring at the first checkpoint, close ring at the second
        let bystander = push_enemy(&mut state, Vec2::new(200.0, 350.0));
        start_finisher(&mut state, target);

        let frames = FINISHER_LOCK_ON_FRAMES + FINISHER_PRE_IMPACT_FRAMES + FINISHER_IMPACT_FRAMES;
        for _ in 0..frames as usize {
            update_finisher(&mut state);
        }
        assert!(state.enemy_index(bystander).is_none());
        assert!(state.combo.current >= 1);
    }

    #[test]
    fn test_shockwave_knockback_pushes_outward() {
        let mut state = empty_state();
        let id = push_enemy(&mut state, Vec2::new(150.0, 100.0));
        state.enemies[0].health = 10;
        apply_shockwave_damage(&mut state, Vec2::new(100.0, 100.0), 200.0);
        let idx = state.enemy_index(id).expect("enemy survives");
        let enemy = &state.enemies[idx];
        assert_eq!(enemy.health, 7);
        assert!(enemy.body.vel.x > 0.0);
        assert_eq!(enemy.hit_flash, ASTEROID_HIT_FLASH);
    }
}
