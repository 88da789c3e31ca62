//! Collision detection
//!
//! Everything collides as a circle. Detection only reports indices; the
//! combat module decides what a contact means and removes entities after
//! each pass with [`compact`].

use glam::Vec2;

use super::state::SimulationState;
use crate::consts::*;

/// Strict circle overlap: touching edges do not count
#[inline]
pub fn circles_overlap(a: Vec2, b: Vec2, ra: f32, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) < reach * reach
}

/// First target overlapping a circle at `pos`, skipping targets already claimed
/// this frame
pub fn first_overlap<I>(pos: Vec2, radius: f32, targets: I, claimed: &[bool]) -> Option<usize>
where
    I: IntoIterator<Item = (Vec2, f32)>,
{
    targets
        .into_iter()
        .enumerate()
        .find(|&(i, (target_pos, target_radius))| {
            !claimed.get(i).copied().unwrap_or(false)
                && circles_overlap(pos, target_pos, radius, target_radius)
        })
        .map(|(i, _)| i)
}

/// Drop every item whose index is marked
pub fn compact<T>(items: &mut Vec<T>, marked: &[bool]) {
    let mut index = 0;
    items.retain(|_| {
        let keep = !marked.get(index).copied().unwrap_or(false);
        index += 1;
        keep
    });
}

/// Something touching the ship that can hurt it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipContact {
    Asteroid(usize),
    Enemy(usize),
    EnemyBullet(usize),
}

/// The first harmful contact with the ship, checking asteroids, then enemies,
/// then enemy bullets
pub fn find_ship_contact(state: &SimulationState) -> Option<ShipContact> {
    let ship_pos = state.ship.body.pos;
    let ship_radius = state.scaled(SHIP_RADIUS);
    let margin = state.scaled(ASTEROID_COLLISION_MARGIN);
    let bullet_radius = state.scaled(BULLET_RADIUS) * 2.0;

    let asteroids = state.asteroids.iter().map(|a| (a.body.pos, a.radius + margin));
    if let Some(i) = first_overlap(ship_pos, ship_radius, asteroids, &[]) {
        return Some(ShipContact::Asteroid(i));
    }
    let enemies = state.enemies.iter().map(|e| (e.body.pos, e.radius));
    if let Some(i) = first_overlap(ship_pos, ship_radius, enemies, &[]) {
        return Some(ShipContact::Enemy(i));
    }
    let bullets = state.enemy_bullets.iter().map(|b| (b.body.pos, bullet_radius));
    first_overlap(ship_pos, ship_radius, bullets, &[]).map(ShipContact::EnemyBullet)
}

/// Indices of every power-up inside the ship's pickup reach
pub fn find_pickups(state: &SimulationState) -> Vec<usize> {
    let ship_pos = state.ship.body.pos;
    let reach = state.scaled(POWERUP_PICKUP_RADIUS);
    let visual = state.scaled(POWERUP_VISUAL_RADIUS);
    state
        .powerups
        .iter()
        .enumerate()
        .filter(|(_, p)| circles_overlap(ship_pos, p.body.pos, reach, visual))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::Progression;
    use crate::settings::SimConfig;
    use crate::sim::entity::{Body, Bullet, PowerUp, PowerUpKind};
    use crate::sim::spawn::create_asteroid;

    #[test]
    fn test_circles_overlap_is_strict() {
        let a = Vec2::new(0.0, 0.0);
        assert!(circles_overlap(a, Vec2::new(9.9, 0.0), 5.0, 5.0));
        assert!(!circles_overlap(a, Vec2::new(10.0, 0.0), 5.0, 5.0));
        assert!(!circles_overlap(a, Vec2::new(8.0, 8.0), 5.0, 5.0));
    }

    #[test]
    fn test_first_overlap_skips_claimed() {
        let targets = [(Vec2::new(5.0, 0.0), 3.0), (Vec2::new(4.0, 0.0), 3.0)];
        assert_eq!(first_overlap(Vec2::ZERO, 2.0, targets, &[]), Some(0));
        assert_eq!(first_overlap(Vec2::ZERO, 2.0, targets, &[true, false]), Some(1));
        assert_eq!(first_overlap(Vec2::ZERO, 2.0, targets, &[true, true]), None);
    }

    #[test]
    fn test_compact_removes_marked() {
        let mut items = vec!['a', 'b', 'c', 'd'];
        compact(&mut items, &[false, true, false, true]);
        assert_eq!(items, vec!['a', 'c']);

        // Short mark lists keep the tail
        let mut items = vec![1, 2, 3];
        compact(&mut items, &[true]);
        assert_eq!(items, vec![2, 3]);
    }

    #[test]
    fn test_ship_contact_prefers_asteroids() {
        let mut state = SimulationState::new(3, &SimConfig::default(), Progression::default());
        state.asteroids.clear();
        let ship_pos = state.ship.body.pos;
        assert_eq!(find_ship_contact(&state), None);

        state
            .enemy_bullets
            .push(Bullet::new(ship_pos + Vec2::new(5.0, 0.0), Vec2::ZERO, true));
        assert_eq!(find_ship_contact(&state), Some(ShipContact::EnemyBullet(0)));

        let rock = create_asteroid(&mut state, 1, Some(ship_pos), false, false);
        state.asteroids.push(rock);
        assert_eq!(find_ship_contact(&state), Some(ShipContact::Asteroid(0)));
    }

    #[test]
    fn test_pickup_reach() {
        let mut state = SimulationState::new(3, &SimConfig::default(), Progression::default());
        let ship_pos = state.ship.body.pos;
        for offset in [30.0, 40.0] {
            state.powerups.push(PowerUp {
                body: Body::new(ship_pos + Vec2::new(offset, 0.0), Vec2::ZERO),
                kind: PowerUpKind::Rapid,
                lifetime: 100.0,
                pulse: 0.0,
            });
        }
        // 15 + 20 reach
        assert_eq!(find_pickups(&state), vec![0]);
    }
}
