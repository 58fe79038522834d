//! Tile Dash - a tile-based side-scrolling platformer
//!
//! Core modules:
//! - `sim`: Frame-stepped simulation (entities, physics, collisions, levels, camera)
//! - `engine`: Game state machine (menu, playing, paused, game over)
//! - `renderer`: Draw list handed to the external rendering backend
//! - `input`: Logical actions and key bindings
//! - `settings`: Persisted preferences and the immutable game configuration

pub mod assets;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod highscores;
pub mod input;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use config::{GameConfig, PhysicsConfig};
pub use engine::{GameEngine, GameStateKind};
pub use error::{GameError, Result};
pub use highscores::HighScores;
pub use settings::{QualityPreset, Settings};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Target frame rate of the host loop
    pub const TARGET_FPS: u32 = 60;

    /// Default viewport
    pub const SCREEN_WIDTH: u32 = 1024;
    pub const SCREEN_HEIGHT: u32 = 768;

    /// Edge length of one level tile in pixels
    pub const TILE_SIZE: u32 = 32;

    /// World physics (pixels, seconds; +y points down)
    pub const GRAVITY: f32 = 1200.0;
    pub const TERMINAL_VELOCITY: f32 = 800.0;
    pub const JUMP_SPEED: f32 = -600.0;
    /// Largest distance a body may travel in one collision substep
    pub const MAX_STEP_PX: f32 = 8.0;

    /// Player movement
    pub const PLAYER_SPEED: f32 = 200.0;
    pub const PLAYER_ACCELERATION: f32 = 1000.0;
    pub const PLAYER_FRICTION: f32 = 800.0;
    pub const RUN_MULTIPLIER: f32 = 2.0;
    pub const PLAYER_WIDTH: u32 = 32;
    pub const PLAYER_HEIGHT: u32 = 32;
    pub const BIG_PLAYER_HEIGHT: u32 = 48;
    /// Grace window after walking off a ledge (seconds)
    pub const COYOTE_TIME: f32 = 0.2;
    /// How early a jump press is remembered before landing (seconds)
    pub const JUMP_BUFFER: f32 = 0.1;
    /// Upward speed after stomping an enemy
    pub const STOMP_BOUNCE: f32 = -300.0;
    pub const STARTING_LIVES: u32 = 3;

    /// Camera smoothing per 1/60 s reference step (0 < f <= 1)
    pub const CAMERA_SMOOTHING: f32 = 0.085;

    /// Level timer
    pub const LEVEL_TIME_LIMIT: f32 = 400.0;
    pub const TIME_BONUS_PER_SECOND: u64 = 50;

    /// Render/update layers
    pub const LAYER_BACKGROUND: i32 = 0;
    pub const LAYER_PLATFORMS: i32 = 1;
    pub const LAYER_ENTITIES: i32 = 2;
    pub const LAYER_PLAYER: i32 = 3;
    pub const LAYER_EFFECTS: i32 = 4;
    pub const LAYER_UI: i32 = 5;
}

/// Move `current` toward `target` by at most `max_delta`
#[inline]
pub fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
    let diff = target - current;
    if diff.abs() <= max_delta {
        target
    } else {
        current + max_delta * diff.signum()
    }
}

/// -1.0, 0.0 or 1.0 depending on the sign of `value` (zero stays zero)
#[inline]
pub fn sign_or_zero(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
