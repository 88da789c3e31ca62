//! Entity model
//!
//! Every simulated kind embeds a [`Body`] and opts into shared behavior through
//! the [`Moving`] trait, so physics can treat them uniformly.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// RGB colour for cosmetic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Named colours shared by gameplay feedback
pub mod palette {
    use super::Rgb;

    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLUE_GLOW: Rgb = Rgb(100, 150, 255);
    pub const ASTEROID: Rgb = Rgb(200, 200, 255);
    pub const BULLET: Rgb = Rgb(255, 255, 100);
    pub const CRYSTAL: Rgb = Rgb(150, 255, 255);
    pub const ENEMY: Rgb = Rgb(255, 100, 100);
    pub const BOSS: Rgb = Rgb(255, 50, 50);
    pub const GOLD: Rgb = Rgb(255, 215, 0);
    pub const DAMAGE_FLASH: Rgb = Rgb(255, 0, 0);
    pub const SHIELD_FLASH: Rgb = Rgb(0, 150, 255);
    pub const DASH: Rgb = Rgb(100, 200, 255);
    pub const SCORE_TEXT: Rgb = Rgb(255, 255, 100);
    pub const ENEMY_BULLET: Rgb = Rgb(255, 150, 150);
    pub const THRUSTER: Rgb = Rgb(255, 200, 0);
    pub const SHIP_EXPLOSION: Rgb = Rgb(255, 100, 0);
    pub const SHIELD_BREAK: Rgb = Rgb(0, 200, 255);
    pub const RAPID: Rgb = Rgb(255, 255, 0);
    pub const TRIPLE: Rgb = Rgb(0, 255, 255);
    pub const SHIELD: Rgb = Rgb(100, 100, 255);
    pub const LIFE: Rgb = Rgb(255, 100, 255);
}

/// Position and velocity shared by every moving entity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Body {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self { pos, vel }
    }
}

/// Capabilities the generic physics step looks for
pub trait Moving {
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;

    /// Facing angle and spin rate, for entities that rotate on their own
    fn spin_mut(&mut self) -> Option<(&mut f32, f32)> {
        None
    }

    /// Hit-flash countdown, for entities that flash when damaged
    fn hit_flash_mut(&mut self) -> Option<&mut f32> {
        None
    }
}

/// One sample of the ship's dash afterimage
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrailSample {
    pub pos: Vec2,
    pub angle: f32,
    pub life: f32,
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub body: Body,
    /// Facing in degrees, [0, 360)
    pub angle: f32,
    pub invulnerable: f32,
    pub rapid_fire: f32,
    pub triple_shot: f32,
    pub shield: f32,
    pub powerup_flash: f32,
    pub powerup_flash_color: Rgb,
    pub respawning: f32,
    pub dashing: f32,
    pub dash_cooldown: f32,
    pub bullet_cooldown: f32,
    pub aura_pulse: f32,
    /// Whether the thrust cue is currently playing
    pub thrusting: bool,
    /// Dash afterimages (newest first)
    pub dash_trail: Vec<TrailSample>,
}

impl Ship {
    pub fn new(pos: Vec2) -> Self {
        Self {
            body: Body::new(pos, Vec2::ZERO),
            angle: 0.0,
            invulnerable: 0.0,
            rapid_fire: 0.0,
            triple_shot: 0.0,
            shield: 0.0,
            powerup_flash: 0.0,
            powerup_flash_color: palette::WHITE,
            respawning: 0.0,
            dashing: 0.0,
            dash_cooldown: 0.0,
            bullet_cooldown: 0.0,
            aura_pulse: 0.0,
            thrusting: false,
            dash_trail: Vec::with_capacity(DASH_TRAIL_MAX_LENGTH + 1),
        }
    }

    /// Collisions only hurt the ship outside invulnerability and dashes
    pub fn is_vulnerable(&self) -> bool {
        self.invulnerable <= 0.0 && self.dashing <= 0.0
    }

    pub fn is_respawning(&self) -> bool {
        self.respawning > 0.0
    }

    /// Record a dash afterimage, evicting the oldest beyond capacity
    pub fn record_dash_trail(&mut self, life: f32) {
        self.dash_trail.insert(
            0,
            TrailSample {
                pos: self.body.pos,
                angle: self.angle,
                life,
            },
        );
        if self.dash_trail.len() > DASH_TRAIL_MAX_LENGTH {
            self.dash_trail.pop();
        }
    }
}

impl Moving for Ship {
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

/// An asteroid, or a boss asteroid when `is_boss` is set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub body: Body,
    /// 1 (small) to 3 (large)
    pub size: u8,
    pub radius: f32,
    pub angle: f32,
    pub spin: f32,
    /// Outline offsets for the renderer
    pub shape: [u8; ASTEROID_VERTEX_COUNT],
    pub hit_flash: f32,
    pub is_boss: bool,
    pub health: i32,
    /// Full health, for the boss health bar
    pub max_health: i32,
    /// Drops a crystal when destroyed instead of rolling for a power-up
    pub has_crystals: bool,
}

impl Asteroid {
    /// Base score by size (before combo bonus)
    pub fn base_score(&self) -> u32 {
        match self.size {
            3 => 100,
            2 => 50,
            _ => 20,
        }
    }
}

impl Moving for Asteroid {
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
    fn spin_mut(&mut self) -> Option<(&mut f32, f32)> {
        Some((&mut self.angle, self.spin))
    }
    fn hit_flash_mut(&mut self) -> Option<&mut f32> {
        Some(&mut self.hit_flash)
    }
}

/// A projectile from the ship or an enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub body: Body,
    pub life: f32,
    /// Previous positions (newest first)
    pub trail: Vec<Vec2>,
    pub from_enemy: bool,
}

impl Bullet {
    pub fn new(pos: Vec2, vel: Vec2, from_enemy: bool) -> Self {
        Self {
            body: Body::new(pos, vel),
            life: BULLET_LIFETIME,
            trail: Vec::with_capacity(Self::trail_capacity(from_enemy) + 1),
            from_enemy,
        }
    }

    fn trail_capacity(from_enemy: bool) -> usize {
        if from_enemy {
            ENEMY_BULLET_TRAIL_LENGTH
        } else {
            BULLET_TRAIL_LENGTH
        }
    }

    pub fn record_trail(&mut self) {
        self.trail.insert(0, self.body.pos);
        if self.trail.len() > Self::trail_capacity(self.from_enemy) {
            self.trail.pop();
        }
    }
}

impl Moving for Bullet {
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

/// Enemy steering behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyAi {
    /// Closes in to a standoff distance, backs off when too close
    Hunter,
    /// Orbits the ship at a fixed radius
    Circler,
}

/// A hostile ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    /// Stable id, used by the finisher to refer back to its target
    pub id: u32,
    pub body: Body,
    pub angle: f32,
    pub ai: EnemyAi,
    pub orbit_angle: f32,
    pub fire_cooldown: f32,
    pub health: i32,
    pub max_health: i32,
    pub radius: f32,
    pub hit_flash: f32,
}

impl Moving for Enemy {
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
    fn hit_flash_mut(&mut self) -> Option<&mut f32> {
        Some(&mut self.hit_flash)
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    Rapid,
    Triple,
    Shield,
    Life,
    Crystal,
}

impl PowerUpKind {
    /// Kinds that can drop from a regular roll
    pub const REGULAR: [PowerUpKind; 4] = [
        PowerUpKind::Rapid,
        PowerUpKind::Triple,
        PowerUpKind::Shield,
        PowerUpKind::Life,
    ];

    pub fn color(&self) -> Rgb {
        match self {
            PowerUpKind::Rapid => palette::RAPID,
            PowerUpKind::Triple => palette::TRIPLE,
            PowerUpKind::Shield => palette::SHIELD,
            PowerUpKind::Life => palette::LIFE,
            PowerUpKind::Crystal => palette::CRYSTAL,
        }
    }
}

/// A collectible floating in the arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub body: Body,
    pub kind: PowerUpKind,
    pub lifetime: f32,
    pub pulse: f32,
}

impl Moving for PowerUp {
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

/// Score popups and announcements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingText {
    pub pos: Vec2,
    pub text: String,
    pub color: Rgb,
    pub life: f32,
    pub vy: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dash_trail_evicts_oldest() {
        let mut ship = Ship::new(Vec2::ZERO);
        for i in 0..(DASH_TRAIL_MAX_LENGTH + 3) {
            ship.body.pos = Vec2::new(i as f32, 0.0);
            ship.record_dash_trail(DASH_TRAIL_LIFE);
        }
        assert_eq!(ship.dash_trail.len(), DASH_TRAIL_MAX_LENGTH);
        assert_eq!(ship.dash_trail[0].pos.x, (DASH_TRAIL_MAX_LENGTH + 2) as f32);
        assert_eq!(ship.dash_trail[DASH_TRAIL_MAX_LENGTH - 1].pos.x, 3.0);
    }

    #[test]
    fn test_bullet_trail_capacity_depends_on_owner() {
        let mut player = Bullet::new(Vec2::ZERO, Vec2::X, false);
        let mut enemy = Bullet::new(Vec2::ZERO, Vec2::X, true);
        for _ in 0..20 {
            player.record_trail();
            enemy.record_trail();
        }
        assert_eq!(player.trail.len(), BULLET_TRAIL_LENGTH);
        assert_eq!(enemy.trail.len(), ENEMY_BULLET_TRAIL_LENGTH);
        assert!(enemy.from_enemy);
    }

    #[test]
    fn test_ship_vulnerability() {
        let mut ship = Ship::new(Vec2::ZERO);
        assert!(ship.is_vulnerable());
        ship.dashing = 3.0;
        assert!(!ship.is_vulnerable());
        ship.dashing = 0.0;
        ship.invulnerable = 0.5;
        assert!(!ship.is_vulnerable());
    }
}
