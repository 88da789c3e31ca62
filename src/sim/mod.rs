//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (list order, entity IDs for references)
//! - No rendering, audio or platform dependencies; those react to events

pub mod collision;
pub mod combat;
pub mod combo;
pub mod effects;
pub mod enemy_ai;
pub mod entity;
pub mod particles;
pub mod physics;
pub mod ship;
pub mod spawn;
pub mod state;
pub mod tick;

pub use combo::{ComboState, FinisherPhase, FinisherState};
pub use entity::{
    Asteroid, Body, Bullet, Enemy, EnemyAi, FloatingText, PowerUp, PowerUpKind, Rgb,
    Ship,
};
pub use particles::{Particle, ParticleKind, ParticlePool};
pub use physics::Arena;
pub use state::{FrameView, GameEvent, GamePhase, ScreenEffects, SimulationState};
pub use tick::{TickInput, tick};
