//! Fixed-capacity particle pool
//!
//! Particles live in one contiguous buffer that is allocated once. Two index
//! stacks track which slots are free and which are live, so acquiring and
//! releasing are O(1) and nothing allocates during play.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::Rgb;
use crate::consts::*;

/// Visual category, which also selects the update rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParticleKind {
    #[default]
    Default,
    /// Pulled toward the ship (power-up collection)
    Streak,
    Respawn,
    Dash,
    Finisher,
    EnemyExplosion,
    Burst,
}

/// A single cosmetic particle
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub color: Rgb,
    pub kind: ParticleKind,
}

#[derive(Debug, Clone)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    free: Vec<usize>,
    active: Vec<usize>,
}

impl ParticlePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: vec![Particle::default(); capacity],
            // Reverse so slot 0 is handed out first
            free: (0..capacity).rev().collect(),
            active: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Take a free slot, reset to defaults. `None` when the pool is exhausted.
    pub fn acquire(&mut self) -> Option<&mut Particle> {
        let idx = self.free.pop()?;
        self.active.push(idx);
        let particle = &mut self.particles[idx];
        *particle = Particle::default();
        Some(particle)
    }

    /// Return every live particle to the free stack
    pub fn release_all(&mut self) {
        self.free.extend(self.active.drain(..));
    }

    /// Advance live particles and retire the expired ones
    pub fn update(&mut self, time_scale: f32, ship_pos: Vec2) {
        let friction = PARTICLE_FRICTION.powf(time_scale);
        let mut i = 0;
        while i < self.active.len() {
            let idx = self.active[i];
            let p = &mut self.particles[idx];
            p.pos += p.vel * time_scale;
            p.life -= time_scale;

            if p.kind == ParticleKind::Streak && p.life > STREAK_MIN_LIFE {
                let to_ship = ship_pos - p.pos;
                // Compared against the squared distance, so streaks are only
                // left alone in the last few pixels
                let dist_sq = to_ship.length_squared();
                if dist_sq > STREAK_ATTRACTION_DISTANCE {
                    let dist = dist_sq.sqrt();
                    p.vel += to_ship / dist * STREAK_ATTRACTION_FORCE * time_scale;
                }
            } else {
                p.vel *= friction;
            }

            if p.life <= 0.0 {
                self.active.swap_remove(i);
                self.free.push(idx);
            } else {
                i += 1;
            }
        }
    }

    /// Live particles, for rendering
    pub fn active(&self) -> impl Iterator<Item = &Particle> {
        self.active.iter().map(|&idx| &self.particles[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spawn(pool: &mut ParticlePool, life: f32) -> bool {
        match pool.acquire() {
            Some(p) => {
                p.life = life;
                true
            }
            None => false,
        }
    }

    #[test]
    fn test_pool_exhaustion_is_silent() {
        let mut pool = ParticlePool::new(1000);
        let spawned = (0..1500).filter(|_| spawn(&mut pool, 10.0)).count();
        assert_eq!(spawned, 1000);
        assert_eq!(pool.active_count(), 1000);
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn test_expired_particles_return_to_pool() {
        let mut pool = ParticlePool::new(4);
        spawn(&mut pool, 1.0);
        spawn(&mut pool, 5.0);
        pool.update(1.0, Vec2::ZERO);
        assert_eq!(pool.active_count(), 1);
        assert!(spawn(&mut pool, 1.0));
        assert!(spawn(&mut pool, 1.0));
        assert!(spawn(&mut pool, 1.0));
        assert!(!spawn(&mut pool, 1.0));
    }

    #[test]
    fn test_acquire_resets_slot() {
        let mut pool = ParticlePool::new(1);
        if let Some(p) = pool.acquire() {
            p.life = 1.0;
            p.kind = ParticleKind::Streak;
            p.vel = Vec2::new(3.0, 3.0);
        }
        pool.update(1.0, Vec2::ZERO);
        let p = pool.acquire().expect("slot should be free again");
        assert_eq!(p.kind, ParticleKind::Default);
        assert_eq!(p.vel, Vec2::ZERO);
    }

    #[test]
    fn test_streak_is_attracted_to_ship() {
        let mut pool = ParticlePool::new(1);
        if let Some(p) = pool.acquire() {
            p.life = 30.0;
            p.kind = ParticleKind::Streak;
            p.pos = Vec2::new(100.0, 0.0);
        }
        pool.update(1.0, Vec2::ZERO);
        let p = pool.active().next().expect("live particle");
        assert!(p.vel.x < 0.0, "streak should accelerate toward the ship");
        assert!((p.vel.x + STREAK_ATTRACTION_FORCE).abs() < 1e-5);
    }

    #[test]
    fn test_regular_particles_slow_down() {
        let mut pool = ParticlePool::new(1);
        if let Some(p) = pool.acquire() {
            p.life = 30.0;
            p.vel = Vec2::new(10.0, 0.0);
        }
        pool.update(1.0, Vec2::ZERO);
        let p = pool.active().next().expect("live particle");
        assert!((p.vel.x - 9.5).abs() < 1e-4);
        assert!((p.pos.x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_release_all() {
        let mut pool = ParticlePool::new(8);
        for _ in 0..8 {
            spawn(&mut pool, 50.0);
        }
        pool.release_all();
        assert_eq!(pool.active_count(), 0);
        assert_eq!((0..8).filter(|_| spawn(&mut pool, 1.0)).count(), 8);
    }

    proptest! {
        #[test]
        fn prop_slots_are_conserved(
            lives in proptest::collection::vec(0.5f32..20.0, 0..64),
            steps in 0usize..30,
        ) {
            let mut pool = ParticlePool::new(32);
            for life in &lives {
                spawn(&mut pool, *life);
            }
            for _ in 0..steps {
                pool.update(1.0, Vec2::ZERO);
            }
            prop_assert!(pool.active_count() <= pool.capacity());
            prop_assert_eq!(pool.active_count() + pool.free.len(), pool.capacity());
            prop_assert!(pool.active().all(|p| p.life > 0.0));
        }
    }
}
