//! Save/load persistence with validation
//!
//! Features:
//! - Flat JSON record (`high_score`, `lifetime_crystals`,
//!   `achievements_unlocked`, `upgrade_levels`, `boss_kills`)
//! - Field-by-field validation; any failure falls back to a full default
//!   record, never a partial merge
//! - Sanitising of valid records (negative numbers clamp to 0, unknown ids
//!   are dropped, upgrade levels clamp to their track's maximum)
//! - Atomic writes (tmp file, then rename)

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::progression::{AchievementId, Progression, UpgradeId};

/// Default save file name
pub const SAVE_FILE_NAME: &str = "asteroids_save.json";

/// Why a save could not be read or written
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    MissingField(&'static str),
    InvalidField(&'static str),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "save file I/O failed: {e}"),
            SaveError::Parse(e) => write!(f, "save file is not valid JSON: {e}"),
            SaveError::MissingField(field) => write!(f, "save file is missing `{field}`"),
            SaveError::InvalidField(field) => write!(f, "save file has an invalid `{field}`"),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Io(e) => Some(e),
            SaveError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(e: serde_json::Error) -> Self {
        SaveError::Parse(e)
    }
}

/// On-disk form of [`Progression`]
///
/// Achievements are kept sorted and upgrade levels live in a sorted map, so
/// encoding the same record twice gives the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub high_score: u32,
    pub lifetime_crystals: u32,
    pub achievements_unlocked: Vec<String>,
    pub upgrade_levels: BTreeMap<String, u32>,
    pub boss_kills: u32,
}

impl Default for SaveRecord {
    fn default() -> Self {
        Self::from_progression(&Progression::default())
    }
}

impl SaveRecord {
    pub fn from_progression(progress: &Progression) -> Self {
        Self {
            high_score: progress.high_score,
            lifetime_crystals: progress.lifetime_crystals,
            achievements_unlocked: progress.achievements.iter().map(|a| a.key().to_string()).collect(),
            upgrade_levels: UpgradeId::ALL
                .into_iter()
                .map(|id| (id.key().to_string(), progress.upgrade_level(id)))
                .collect(),
            boss_kills: progress.boss_kills,
        }
    }

    pub fn to_progression(&self) -> Progression {
        let mut progress = Progression {
            high_score: self.high_score,
            lifetime_crystals: self.lifetime_crystals,
            boss_kills: self.boss_kills,
            achievements: self
                .achievements_unlocked
                .iter()
                .filter_map(|key| AchievementId::from_key(key))
                .collect(),
            ..Default::default()
        };
        for (key, &level) in &self.upgrade_levels {
            if let Some(id) = UpgradeId::from_key(key) {
                progress.set_upgrade_level(id, level);
            }
        }
        progress
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a save file's contents
    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(fields) = value else {
            return Err(SaveError::InvalidField("root"));
        };

        let high_score = count_field(&fields, "high_score")?;
        let lifetime_crystals = count_field(&fields, "lifetime_crystals")?;
        let boss_kills = count_field(&fields, "boss_kills")?;

        let Value::Array(unlocked) = required(&fields, "achievements_unlocked")? else {
            return Err(SaveError::InvalidField("achievements_unlocked"));
        };
        let mut achievements: Vec<AchievementId> = unlocked
            .iter()
            .filter_map(Value::as_str)
            .filter_map(AchievementId::from_key)
            .collect();
        achievements.sort();
        achievements.dedup();

        let Value::Object(levels) = required(&fields, "upgrade_levels")? else {
            return Err(SaveError::InvalidField("upgrade_levels"));
        };
        let mut upgrade_levels: BTreeMap<String, u32> =
            UpgradeId::ALL.into_iter().map(|id| (id.key().to_string(), 0)).collect();
        for (key, level) in levels {
            let level = to_count(level).ok_or(SaveError::InvalidField("upgrade_levels"))?;
            if let Some(id) = UpgradeId::from_key(key) {
                upgrade_levels.insert(key.clone(), level.min(id.max_level()));
            }
        }

        Ok(Self {
            high_score,
            lifetime_crystals,
            achievements_unlocked: achievements.iter().map(|a| a.key().to_string()).collect(),
            upgrade_levels,
            boss_kills,
        })
    }
}

fn required<'a>(fields: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, SaveError> {
    fields.get(name).ok_or(SaveError::MissingField(name))
}

/// Integer or float, truncated and clamped into `u32`
fn to_count(value: &Value) -> Option<u32> {
    let n = value.as_f64()?;
    if !n.is_finite() {
        return None;
    }
    Some(n.trunc().clamp(0.0, f64::from(u32::MAX)) as u32)
}

fn count_field(fields: &Map<String, Value>, name: &'static str) -> Result<u32, SaveError> {
    to_count(required(fields, name)?).ok_or(SaveError::InvalidField(name))
}

/// Read and validate the save at `path`
pub fn load(path: &Path) -> Result<Progression, SaveError> {
    let json = std::fs::read_to_string(path)?;
    let record = SaveRecord::from_json(&json)?;
    Ok(record.to_progression())
}

/// Read the save at `path`, or start fresh if it is missing or broken
pub fn load_or_default(path: &Path) -> Progression {
    match load(path) {
        Ok(progress) => {
            log::info!(
                "Loaded save: high score {}, {} achievements",
                progress.high_score,
                progress.achievements.len()
            );
            progress
        }
        Err(SaveError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No save file found, using defaults");
            Progression::default()
        }
        Err(e) => {
            log::warn!("{e}; using defaults");
            Progression::default()
        }
    }
}

/// Write `progress` to `path` via a temporary file
pub fn save_to_path(path: &Path, progress: &Progression) -> Result<(), SaveError> {
    let json = SaveRecord::from_progression(progress).to_json()?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    log::debug!("Saved progression to {}", path.display());
    Ok(())
}
