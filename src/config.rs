//! Immutable game configuration
//!
//! Built once at startup (usually from `Settings`) and passed by reference to
//! everything that needs physics constants or the screen size.

use glam::{UVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Physics tuning shared by every simulated body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub terminal_velocity: f32,
    /// Initial vertical speed of a jump (negative = up)
    pub jump_speed: f32,
    pub player_speed: f32,
    pub acceleration: f32,
    pub friction: f32,
    pub run_multiplier: f32,
    pub coyote_time: f32,
    pub jump_buffer: f32,
    pub stomp_bounce: f32,
    pub max_step_px: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            terminal_velocity: TERMINAL_VELOCITY,
            jump_speed: JUMP_SPEED,
            player_speed: PLAYER_SPEED,
            acceleration: PLAYER_ACCELERATION,
            friction: PLAYER_FRICTION,
            run_multiplier: RUN_MULTIPLIER,
            coyote_time: COYOTE_TIME,
            jump_buffer: JUMP_BUFFER,
            stomp_bounce: STOMP_BOUNCE,
            max_step_px: MAX_STEP_PX,
        }
    }
}

/// Everything the simulation reads but never writes
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    /// Viewport size in pixels
    pub screen: UVec2,
    pub target_fps: u32,
    pub camera_smoothing: f32,
    pub starting_lives: u32,
    pub time_bonus_per_second: u64,
    /// Particle budget for the effects manager
    pub max_particles: usize,
    /// Seed for cosmetic randomness (particles)
    pub effects_seed: u64,
    /// Draw the frame-rate readout
    pub show_fps: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            screen: UVec2::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            target_fps: TARGET_FPS,
            camera_smoothing: CAMERA_SMOOTHING,
            starting_lives: STARTING_LIVES,
            time_bonus_per_second: TIME_BONUS_PER_SECOND,
            max_particles: 500,
            effects_seed: 0x5eed,
            show_fps: false,
        }
    }
}

impl GameConfig {
    pub fn viewport(&self) -> Vec2 {
        self.screen.as_vec2()
    }
}
