//! Game state and core simulation types
//!
//! Everything a frame reads or writes lives in [`SimulationState`]. The only
//! randomness comes from the seeded RNG stored here, so two states built from
//! the same seed and fed the same inputs stay identical.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::combo::{ComboState, FinisherState};
use super::entity::{
    Asteroid, Bullet, Enemy, FloatingText, PowerUp, Rgb, Ship, palette,
};
use super::particles::ParticlePool;
use super::physics::Arena;
use super::spawn;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::progression::{AchievementContext, AchievementId, Progression, UpgradeId};
use crate::settings::SimConfig;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Active gameplay (including level transitions)
    Playing,
    /// Game is paused
    Paused,
    /// Run ended; waits for a restart
    GameOver,
}

/// Things the frontend reacts to, drained once per frame
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Play a sound cue panned at `x`
    Sound {
        effect: SoundEffect,
        x: f32,
        volume: f32,
    },
    StopThrustSound,
    StopAllSounds,
    AchievementUnlocked(AchievementId),
    LevelStarted { level: u32 },
    /// A boss level is about to begin
    BossWave { level: u32 },
    GameOver { score: u32 },
    /// Progression changed and should be written to disk
    SaveRequested,
}

/// Full-screen feedback state for the renderer
#[derive(Debug, Clone, Default)]
pub struct ScreenEffects {
    pub screen_shake: f32,
    pub damage_flash: f32,
    pub damage_flash_color: Rgb,
    /// Frames left before the next level spawns
    pub level_transition: f32,
    pub level_transition_text: String,
    pub wave_warning: f32,
    pub wave_warning_text: String,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub arena: Arena,
    pub phase: GamePhase,
    pub ship: Ship,
    pub asteroids: Vec<Asteroid>,
    pub bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<Bullet>,
    pub enemies: Vec<Enemy>,
    pub powerups: Vec<PowerUp>,
    pub particles: ParticlePool,
    pub floating_texts: Vec<FloatingText>,
    pub combo: ComboState,
    pub finisher: FinisherState,
    pub effects: ScreenEffects,
    pub score: u32,
    pub lives: u32,
    /// Current level (1-based)
    pub level: u32,
    /// Spendable crystals collected this run
    pub crystals: u32,
    /// No life lost since the current level began
    pub untouchable_level: bool,
    /// Global simulation speed; 1.0 is real time
    pub time_scale: f32,
    /// Player preferences for camera shake and full-screen flashes
    pub screen_shake_enabled: bool,
    pub flashes_enabled: bool,
    /// Simulation tick counter
    pub frame: u64,
    /// Upgrades, achievements and records that outlive a run
    pub progress: Progression,
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl SimulationState {
    /// Create a fresh run with the given seed and saved progression
    pub fn new(seed: u64, config: &SimConfig, progress: Progression) -> Self {
        let arena = Arena::new(config.width, config.height);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            arena,
            phase: GamePhase::Playing,
            ship: Ship::new(arena.center()),
            asteroids: Vec::new(),
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            enemies: Vec::new(),
            powerups: Vec::new(),
            particles: ParticlePool::new(config.particle_capacity),
            floating_texts: Vec::new(),
            combo: ComboState::default(),
            finisher: FinisherState::default(),
            effects: ScreenEffects::default(),
            score: 0,
            lives: SHIP_START_LIVES,
            level: 1,
            crystals: 0,
            untouchable_level: true,
            time_scale: 1.0,
            screen_shake_enabled: config.screen_shake,
            flashes_enabled: config.flashes,
            frame: 0,
            progress,
            events: Vec::new(),
            next_id: 1,
        };
        spawn::reset_game(&mut state);
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Scale a reference-space distance or speed to the current arena
    #[inline]
    pub fn scaled(&self, value: f32) -> f32 {
        self.arena.scaled(value)
    }

    pub fn play_sound(&mut self, effect: SoundEffect, x: f32, volume: f32) {
        self.events.push(GameEvent::Sound { effect, x, volume });
    }

    /// Add screen shake, capped at the scaled maximum
    pub fn add_screen_shake(&mut self, amount: f32) {
        if !self.screen_shake_enabled {
            return;
        }
        let cap = self.scaled(MAX_SCREEN_SHAKE);
        self.effects.screen_shake = (self.effects.screen_shake + amount).min(cap);
    }

    /// Start a full-screen flash, unless flashes are turned off
    pub fn flash(&mut self, frames: f32, color: Rgb) {
        if !self.flashes_enabled {
            return;
        }
        self.effects.damage_flash = frames;
        self.effects.damage_flash_color = color;
    }

    /// Award points and keep the high score current
    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        self.progress.record_score(self.score);
    }

    /// Credit crystals to the run and the lifetime total
    pub fn add_crystals(&mut self, amount: u32) {
        self.crystals = self.crystals.saturating_add(amount);
        self.progress.lifetime_crystals = self.progress.lifetime_crystals.saturating_add(amount);
    }

    pub fn achievement_context(&self) -> AchievementContext {
        AchievementContext {
            score: self.score,
            combo: self.combo.current,
            level: self.level,
            untouchable_level: self.untouchable_level,
        }
    }

    /// Check an achievement and announce it when it unlocks
    pub fn check_achievement(&mut self, id: AchievementId) -> bool {
        let ctx = self.achievement_context();
        if !self.progress.check_achievement(id, &ctx, &mut self.crystals) {
            return false;
        }
        let def = id.def();
        let center = self.arena.center();
        let spread = self.scaled(50.0);
        super::effects::create_floating_text(
            self,
            Vec2::new(center.x, center.y - spread),
            format!("ACHIEVEMENT: {}", def.name),
            palette::GOLD,
        );
        super::effects::create_floating_text(
            self,
            center,
            format!("+{} crystals", def.reward),
            palette::CRYSTAL,
        );
        let x = self.ship.body.pos.x;
        self.play_sound(SoundEffect::PowerupLife, x, 1.0);
        self.events.push(GameEvent::AchievementUnlocked(id));
        self.events.push(GameEvent::SaveRequested);
        true
    }

    /// Spend session crystals on an upgrade
    pub fn purchase_upgrade(&mut self, id: UpgradeId) -> bool {
        if !self.progress.apply_upgrade(id, &mut self.crystals) {
            return false;
        }
        self.check_achievement(AchievementId::SpeedDemon);
        self.events.push(GameEvent::SaveRequested);
        true
    }

    /// Take this frame's events, leaving the queue empty
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Index of the enemy with `id`, if it is still alive
    pub fn enemy_index(&self, id: u32) -> Option<usize> {
        self.enemies.iter().position(|e| e.id == id)
    }

    /// Read-only snapshot for rendering
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            phase: self.phase,
            ship: &self.ship,
            asteroids: &self.asteroids,
            bullets: &self.bullets,
            enemy_bullets: &self.enemy_bullets,
            enemies: &self.enemies,
            powerups: &self.powerups,
            particles: &self.particles,
            floating_texts: &self.floating_texts,
            combo: &self.combo,
            finisher: &self.finisher,
            effects: &self.effects,
            score: self.score,
            high_score: self.progress.high_score,
            lives: self.lives,
            level: self.level,
            crystals: self.crystals,
            time_scale: self.time_scale,
        }
    }
}

/// Borrowed view of everything a renderer draws in one frame
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub phase: GamePhase,
    pub ship: &'a Ship,
    pub asteroids: &'a [Asteroid],
    pub bullets: &'a [Bullet],
    pub enemy_bullets: &'a [Bullet],
    pub enemies: &'a [Enemy],
    pub powerups: &'a [PowerUp],
    pub particles: &'a ParticlePool,
    pub floating_texts: &'a [FloatingText],
    pub combo: &'a ComboState,
    pub finisher: &'a FinisherState,
    pub effects: &'a ScreenEffects,
    pub score: u32,
    pub high_score: u32,
    pub lives: u32,
    pub level: u32,
    pub crystals: u32,
    pub time_scale: f32,
}
