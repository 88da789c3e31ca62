//! Persistent progression: upgrades bought with crystals and one-time achievements
//!
//! The tables below are the single source of truth for balance values. The
//! simulation reads multipliers from [`Progression`] at the point of use, so a
//! purchase takes effect on the next shot, dash or thrust.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Purchasable upgrade tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeId {
    Damage,
    FireRate,
    MaxSpeed,
    DashCooldown,
}

/// Static definition of an upgrade track
#[derive(Debug, Clone, Copy)]
pub struct UpgradeDef {
    pub name: &'static str,
    pub description: &'static str,
    pub max_level: u32,
    pub base_cost: u32,
    pub cost_multiplier: f64,
    /// Multiplier delta per level, or frames for the dash cooldown track
    pub effect_per_level: f32,
}

const UPGRADES: [UpgradeDef; 4] = [
    UpgradeDef {
        name: "Damage Boost",
        description: "Increase bullet damage",
        max_level: 5,
        base_cost: 100,
        cost_multiplier: 1.5,
        effect_per_level: 0.2,
    },
    UpgradeDef {
        name: "Rapid Fire",
        description: "Increase fire rate",
        max_level: 5,
        base_cost: 80,
        cost_multiplier: 1.4,
        effect_per_level: 0.1,
    },
    UpgradeDef {
        name: "Engine Power",
        description: "Increase max speed",
        max_level: 5,
        base_cost: 60,
        cost_multiplier: 1.3,
        effect_per_level: 0.15,
    },
    UpgradeDef {
        name: "Dash Recharge",
        description: "Reduce dash cooldown",
        max_level: 3,
        base_cost: 150,
        cost_multiplier: 2.0,
        effect_per_level: 20.0,
    },
];

impl UpgradeId {
    pub const ALL: [UpgradeId; 4] = [
        UpgradeId::Damage,
        UpgradeId::FireRate,
        UpgradeId::MaxSpeed,
        UpgradeId::DashCooldown,
    ];

    fn index(self) -> usize {
        match self {
            UpgradeId::Damage => 0,
            UpgradeId::FireRate => 1,
            UpgradeId::MaxSpeed => 2,
            UpgradeId::DashCooldown => 3,
        }
    }

    pub fn def(self) -> &'static UpgradeDef {
        &UPGRADES[self.index()]
    }

    pub fn max_level(self) -> u32 {
        self.def().max_level
    }

    /// Key used in save files
    pub fn key(self) -> &'static str {
        match self {
            UpgradeId::Damage => "damage",
            UpgradeId::FireRate => "fire_rate",
            UpgradeId::MaxSpeed => "max_speed",
            UpgradeId::DashCooldown => "dash_cooldown",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.key() == key)
    }
}

/// One-time achievements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstBlood,
    Combo5,
    Combo10,
    Survivor,
    BossSlayer,
    Untouchable,
    SpeedDemon,
    CrystalHoarder,
}

#[derive(Debug, Clone, Copy)]
pub struct AchievementDef {
    pub name: &'static str,
    pub description: &'static str,
    /// Crystals credited on unlock
    pub reward: u32,
}

impl AchievementId {
    pub const ALL: [AchievementId; 8] = [
        AchievementId::FirstBlood,
        AchievementId::Combo5,
        AchievementId::Combo10,
        AchievementId::Survivor,
        AchievementId::BossSlayer,
        AchievementId::Untouchable,
        AchievementId::SpeedDemon,
        AchievementId::CrystalHoarder,
    ];

    pub fn def(self) -> AchievementDef {
        let (name, description, reward) = match self {
            AchievementId::FirstBlood => ("First Blood", "Destroy your first asteroid", 50),
            AchievementId::Combo5 => ("Combo Master", "Achieve a 5x combo", 100),
            AchievementId::Combo10 => ("Combo Legend", "Achieve a 10x combo", 200),
            AchievementId::Survivor => ("Survivor", "Reach level 10", 300),
            AchievementId::BossSlayer => ("Boss Slayer", "Defeat your first boss", 500),
            AchievementId::Untouchable => ("Untouchable", "Complete a level without taking damage", 200),
            AchievementId::SpeedDemon => ("Speed Demon", "Max out speed upgrade", 150),
            AchievementId::CrystalHoarder => ("Crystal Hoarder", "Collect 1000 crystals total", 250),
        };
        AchievementDef {
            name,
            description,
            reward,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            AchievementId::FirstBlood => "first_blood",
            AchievementId::Combo5 => "combo_5",
            AchievementId::Combo10 => "combo_10",
            AchievementId::Survivor => "survivor",
            AchievementId::BossSlayer => "boss_slayer",
            AchievementId::Untouchable => "untouchable",
            AchievementId::SpeedDemon => "speed_demon",
            AchievementId::CrystalHoarder => "crystal_hoarder",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.key() == key)
    }
}

/// Session values achievement predicates look at
#[derive(Debug, Clone, Copy, Default)]
pub struct AchievementContext {
    pub score: u32,
    pub combo: u32,
    pub level: u32,
    /// No life lost during the level that just ended
    pub untouchable_level: bool,
}

/// Progress that survives between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    pub high_score: u32,
    pub lifetime_crystals: u32,
    pub boss_kills: u32,
    pub upgrade_levels: [u32; 4],
    pub achievements: BTreeSet<AchievementId>,
}

impl Progression {
    pub fn upgrade_level(&self, id: UpgradeId) -> u32 {
        self.upgrade_levels[id.index()]
    }

    /// Set a level, clamped to the track's maximum
    pub fn set_upgrade_level(&mut self, id: UpgradeId, level: u32) {
        self.upgrade_levels[id.index()] = level.min(id.max_level());
    }

    /// Price of the next level, `None` once the track is maxed
    pub fn upgrade_cost(&self, id: UpgradeId) -> Option<u32> {
        let def = id.def();
        let level = self.upgrade_level(id);
        if level >= def.max_level {
            return None;
        }
        let level = i32::try_from(level).ok()?;
        Some((f64::from(def.base_cost) * def.cost_multiplier.powi(level)).floor() as u32)
    }

    /// Buy the next level if affordable, debiting `crystals`
    pub fn apply_upgrade(&mut self, id: UpgradeId, crystals: &mut u32) -> bool {
        let Some(cost) = self.upgrade_cost(id) else {
            return false;
        };
        if *crystals < cost {
            return false;
        }
        *crystals -= cost;
        self.upgrade_levels[id.index()] += 1;
        log::info!(
            "Upgrade {} -> level {} for {} crystals",
            id.key(),
            self.upgrade_level(id),
            cost
        );
        true
    }

    fn effect(&self, id: UpgradeId) -> f32 {
        self.upgrade_level(id) as f32 * id.def().effect_per_level
    }

    pub fn damage_multiplier(&self) -> f32 {
        1.0 + self.effect(UpgradeId::Damage)
    }

    /// Multiplier applied to the shot cooldown (lower fires faster)
    pub fn fire_rate_multiplier(&self) -> f32 {
        1.0 - self.effect(UpgradeId::FireRate)
    }

    pub fn speed_multiplier(&self) -> f32 {
        1.0 + self.effect(UpgradeId::MaxSpeed)
    }

    /// Frames removed from the dash cooldown
    pub fn dash_cooldown_reduction(&self) -> f32 {
        self.effect(UpgradeId::DashCooldown)
    }

    /// Whole-number damage dealt per bullet hit
    pub fn bullet_damage(&self) -> i32 {
        (self.damage_multiplier().floor() as i32).max(1)
    }

    pub fn is_unlocked(&self, id: AchievementId) -> bool {
        self.achievements.contains(&id)
    }

    fn condition_met(&self, id: AchievementId, ctx: &AchievementContext) -> bool {
        match id {
            AchievementId::FirstBlood => ctx.score > 0,
            AchievementId::Combo5 => ctx.combo >= 5,
            AchievementId::Combo10 => ctx.combo >= 10,
            AchievementId::Survivor => ctx.level >= 10,
            AchievementId::BossSlayer => self.boss_kills > 0,
            AchievementId::Untouchable => ctx.level > 1 && ctx.untouchable_level,
            AchievementId::SpeedDemon => {
                self.upgrade_level(UpgradeId::MaxSpeed) >= UpgradeId::MaxSpeed.max_level()
            }
            AchievementId::CrystalHoarder => self.lifetime_crystals >= 1000,
        }
    }

    /// Unlock `id` if its condition holds and it is still locked.
    ///
    /// The reward is credited to both `crystals` and the lifetime total.
    pub fn check_achievement(
        &mut self,
        id: AchievementId,
        ctx: &AchievementContext,
        crystals: &mut u32,
    ) -> bool {
        if self.is_unlocked(id) || !self.condition_met(id, ctx) {
            return false;
        }
        self.achievements.insert(id);
        let reward = id.def().reward;
        *crystals = crystals.saturating_add(reward);
        self.lifetime_crystals = self.lifetime_crystals.saturating_add(reward);
        log::info!("Achievement unlocked: {} (+{} crystals)", id.key(), reward);
        true
    }

    /// Track the best score; returns true when it was beaten
    pub fn record_score(&mut self, score: u32) -> bool {
        if score > self.high_score {
            self.high_score = score;
            true
        } else {
            false
        }
    }
}
