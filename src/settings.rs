//! Game settings and preferences
//!
//! Parsed from JSON text handed over by the host. Reading and writing the file
//! is the host's job; the core only converts between text and `Settings`.

use glam::UVec2;
use serde::{Deserialize, Serialize};

use crate::config::{GameConfig, PhysicsConfig};
use crate::error::Result;
use crate::input::KeyBindings;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 500,
            QualityPreset::High => 2000,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Particle effects (explosions, debris)
    pub particles: bool,

    // === Display ===
    pub resolution: UVec2,
    pub show_fps: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Controls ===
    pub key_bindings: KeyBindings,

    // === Gameplay ===
    pub starting_lives: u32,
    /// Overrides for physics tuning; missing fields keep their defaults
    pub physics: PhysicsConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let config = GameConfig::default();
        Self {
            quality: QualityPreset::Medium,
            particles: true,

            resolution: config.screen,
            show_fps: false,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            key_bindings: KeyBindings::default(),

            starting_lives: config.starting_lives,
            physics: config.physics,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;
        // High implies the effects are wanted
        if preset == QualityPreset::High {
            self.particles = true;
        }
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Strict parse
    pub fn parse(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Parse settings text, falling back to defaults on any error
    pub fn from_json(json: &str) -> Self {
        match Self::parse(json) {
            Ok(settings) => {
                log::info!("Loaded settings ({} quality)", settings.quality.as_str());
                settings
            }
            Err(err) => {
                log::warn!("{}; using default settings", err);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamp values a hand-edited file may get wrong
    fn sanitized(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        if self.resolution.x == 0 || self.resolution.y == 0 {
            log::warn!("resolution {:?} is empty; using default", self.resolution);
            self.resolution = Settings::default().resolution;
        }
        self.starting_lives = self.starting_lives.max(1);
        self
    }

    /// Immutable configuration for a game built from these settings
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            physics: self.physics.clone(),
            screen: self.resolution,
            starting_lives: self.starting_lives,
            max_particles: self.max_particles(),
            show_fps: self.show_fps,
            ..GameConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Action;

    #[test]
    fn garbage_falls_back_to_defaults() {
        assert_eq!(Settings::from_json("not json {"), Settings::default());
        assert!(Settings::parse("[1, 2]").is_err());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = Settings::from_json(
            r#"{ "quality": "High", "master_volume": 3.5, "physics": { "gravity": 900.0 } }"#,
        );
        assert_eq!(settings.quality, QualityPreset::High);
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.physics.gravity, 900.0);
        assert_eq!(settings.physics.jump_speed, PhysicsConfig::default().jump_speed);
        assert_eq!(settings.key_bindings, KeyBindings::default());
    }

    #[test]
    fn key_bindings_round_trip() {
        let mut settings = Settings::default();
        settings.key_bindings.bind("K", Action::Jump);
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json), settings);
    }

    #[test]
    fn game_config_reflects_settings() {
        let mut settings = Settings::from_preset(QualityPreset::Low);
        settings.resolution = UVec2::new(640, 480);
        settings.starting_lives = 5;
        let config = settings.game_config();
        assert_eq!(config.screen, UVec2::new(640, 480));
        assert_eq!(config.starting_lives, 5);
        assert_eq!(config.max_particles, 100);

        settings.particles = false;
        settings.show_fps = true;
        assert_eq!(settings.game_config().max_particles, 0);
        assert!(settings.game_config().show_fps);
    }

    #[test]
    fn preset_names() {
        assert_eq!(QualityPreset::parse("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
        assert_eq!(QualityPreset::High.as_str(), "High");
    }
}
