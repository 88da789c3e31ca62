//! Audio trigger interface
//!
//! The simulation never synthesizes sound. It queues [`GameEvent`]s and the
//! frontend forwards the audio ones to whatever backend implements [`AudioSink`].

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Player shot
    Shoot,
    /// Enemy shot
    EnemyShoot,
    /// Asteroid destroyed, by explosion size
    ExplosionSmall,
    ExplosionMedium,
    ExplosionLarge,
    /// Enemy ship destroyed
    EnemyExplosion,
    /// Dash and finisher lunge
    Dash,
    /// Looping engine noise (started/stopped by events)
    Thrust,
    /// Power-up collected
    PowerupRapid,
    PowerupTriple,
    PowerupShield,
    /// Extra life, also used for combo and meter fanfares
    PowerupLife,
    PowerupCrystal,
    /// Level cleared
    LevelTransition,
}

impl SoundEffect {
    /// Stable asset name for backends that load files
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundEffect::Shoot => "shoot",
            SoundEffect::EnemyShoot => "enemy_shoot",
            SoundEffect::ExplosionSmall => "explosion_small",
            SoundEffect::ExplosionMedium => "explosion_medium",
            SoundEffect::ExplosionLarge => "explosion_large",
            SoundEffect::EnemyExplosion => "enemy_explosion",
            SoundEffect::Dash => "dash",
            SoundEffect::Thrust => "thrust",
            SoundEffect::PowerupRapid => "powerup_rapid",
            SoundEffect::PowerupTriple => "powerup_triple",
            SoundEffect::PowerupShield => "powerup_shield",
            SoundEffect::PowerupLife => "powerup_life",
            SoundEffect::PowerupCrystal => "powerup_crystal",
            SoundEffect::LevelTransition => "level_transition",
        }
    }
}

/// Something that can play sound cues
pub trait AudioSink {
    /// Play `effect` panned by horizontal position `x` at `volume` (1.0 = normal)
    fn play_sound(&mut self, effect: SoundEffect, x: f32, volume: f32);
    fn stop_thrust(&mut self);
    fn stop_all(&mut self);
}

/// Sink that drops every cue (headless runs, tests)
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play_sound(&mut self, _effect: SoundEffect, _x: f32, _volume: f32) {}
    fn stop_thrust(&mut self) {}
    fn stop_all(&mut self) {}
}

/// Sink that writes cues to the log, applying settings volume and mute
#[derive(Debug)]
pub struct LogAudio {
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    /// Cues played so far
    pub played: usize,
}

impl LogAudio {
    pub fn new(master_volume: f32, sfx_volume: f32) -> Self {
        Self {
            master_volume: master_volume.clamp(0.0, 1.0),
            sfx_volume: sfx_volume.clamp(0.0, 1.0),
            muted: false,
            played: 0,
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self, volume: f32) -> f32 {
        if self.muted {
            0.0
        } else {
            volume * self.master_volume * self.sfx_volume
        }
    }
}

impl AudioSink for LogAudio {
    fn play_sound(&mut self, effect: SoundEffect, x: f32, volume: f32) {
        let volume = self.effective_volume(volume);
        if volume <= 0.0 {
            return;
        }
        self.played += 1;
        log::debug!("sound {} x={:.0} vol={:.2}", effect.as_str(), x, volume);
    }

    fn stop_thrust(&mut self) {
        log::debug!("sound thrust stopped");
    }

    fn stop_all(&mut self) {
        log::debug!("all sounds stopped");
    }
}

/// Forward the audio events of a frame to `sink`, ignoring the rest
pub fn dispatch_events<S: AudioSink + ?Sized>(events: &[GameEvent], sink: &mut S) {
    for event in events {
        match *event {
            GameEvent::Sound { effect, x, volume } => sink.play_sound(effect, x, volume),
            GameEvent::StopThrustSound => sink.stop_thrust(),
            GameEvent::StopAllSounds => sink.stop_all(),
            _ => {}
        }
    }
}
