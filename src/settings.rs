//! Game settings and preferences
//!
//! Persisted as JSON next to the save file, separately from progression.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{PARTICLE_POOL_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    /// Particle pool capacity for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 250,
            QualityPreset::Medium => PARTICLE_POOL_SIZE,
            QualityPreset::High => 2000,
        }
    }
}

/// What the simulation needs to know about the player's setup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    pub width: f32,
    pub height: f32,
    pub particle_capacity: usize,
    /// Camera shake on impacts
    pub screen_shake: bool,
    /// Full-screen damage and impact flashes
    pub flashes: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            particle_capacity: PARTICLE_POOL_SIZE,
            screen_shake: true,
            flashes: true,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Particle effects (explosions, trails, streaks)
    pub particles: bool,
    /// Screen shake on explosions/impacts
    pub screen_shake: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Display ===
    pub screen_width: u32,
    pub screen_height: u32,

    // === Accessibility ===
    /// Reduced motion (minimize shake, flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            particles: true,
            screen_shake: true,

            master_volume: 0.8,
            sfx_volume: 1.0,

            screen_width: SCREEN_WIDTH as u32,
            screen_height: SCREEN_HEIGHT as u32,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Arena size and pool capacity for a new simulation
    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            width: self.screen_width.max(1) as f32,
            height: self.screen_height.max(1) as f32,
            particle_capacity: self.max_particles(),
            screen_shake: self.effective_screen_shake(),
            flashes: !self.reduced_motion,
        }
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::info!("Using default settings ({}: {})", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring invalid settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to `path`; failures are logged and otherwise ignored
    pub fn save(&self, path: &Path) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => match std::fs::write(path, json) {
                Ok(()) => log::info!("Settings saved"),
                Err(e) => log::warn!("Could not save settings to {}: {}", path.display(), e),
            },
            Err(e) => log::warn!("Could not encode settings: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_particle_caps() {
        assert_eq!(QualityPreset::Low.max_particles(), 250);
        assert_eq!(QualityPreset::Medium.max_particles(), 1000);
        assert_eq!(QualityPreset::High.max_particles(), 2000);
    }

    #[test]
    fn test_sim_config_follows_settings() {
        let mut settings = Settings::from_preset(QualityPreset::High);
        settings.screen_width = 1920;
        settings.screen_height = 1080;
        let config = settings.sim_config();
        assert_eq!(config.width, 1920.0);
        assert_eq!(config.height, 1080.0);
        assert_eq!(config.particle_capacity, 2000);

        settings.particles = false;
        assert_eq!(settings.sim_config().particle_capacity, 0);
        assert_eq!(Settings::default().sim_config(), SimConfig::default());
    }

    #[test]
    fn test_reduced_motion_disables_shake() {
        let mut settings = Settings::default();
        assert!(settings.effective_screen_shake());
        settings.reduced_motion = true;
        assert!(!settings.effective_screen_shake());
        let config = settings.sim_config();
        assert!(!config.screen_shake);
        assert!(!config.flashes);

        settings.reduced_motion = false;
        settings.screen_shake = false;
        let config = settings.sim_config();
        assert!(!config.screen_shake);
        assert!(config.flashes);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"quality":"Low","sfx_volume":0.5}"#)
            .expect("partial settings parse");
        assert_eq!(settings.quality, QualityPreset::Low);
        assert_eq!(settings.sfx_volume, 0.5);
        assert_eq!(settings.screen_width, 800);
        assert!(settings.particles);
    }

    #[test]
    fn test_load_falls_back_and_round_trips() {
        let dir = std::env::temp_dir().join(format!("asteroids-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("settings.json");

        let _ = std::fs::remove_file(&path);
        assert_eq!(Settings::load(&path).quality, QualityPreset::Medium);

        std::fs::write(&path, "not json").expect("write");
        assert_eq!(Settings::load(&path).quality, QualityPreset::Medium);

        let mut settings = Settings::from_preset(QualityPreset::Low);
        settings.master_volume = 0.25;
        settings.save(&path);
        let loaded = Settings::load(&path);
        assert_eq!(loaded.quality, QualityPreset::Low);
        assert_eq!(loaded.master_volume, 0.25);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
