//! Vertex types handed to the rendering backend

use bytemuck::{Pod, Zeroable};

/// 2D vertex in screen pixels with an RGBA color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }
}

/// Colors for game elements
pub mod colors {
    pub const SKY: [f32; 4] = [0.53, 0.81, 0.92, 1.0];
    pub const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
    pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const YELLOW: [f32; 4] = [1.0, 1.0, 0.0, 1.0];
    pub const GOLD: [f32; 4] = [1.0, 0.84, 0.0, 1.0];
    pub const RED: [f32; 4] = [0.86, 0.08, 0.08, 1.0];
    pub const ORANGE: [f32; 4] = [1.0, 0.55, 0.1, 1.0];
    pub const GREEN: [f32; 4] = [0.1, 0.7, 0.2, 1.0];
    pub const DARK_GREEN: [f32; 4] = [0.0, 0.4, 0.1, 1.0];
    pub const BROWN: [f32; 4] = [0.55, 0.27, 0.07, 1.0];
    pub const GROUND: [f32; 4] = [0.6, 0.4, 0.2, 1.0];
    pub const GRASS: [f32; 4] = [0.3, 0.7, 0.2, 1.0];
    pub const STONE: [f32; 4] = [0.5, 0.5, 0.5, 1.0];
    pub const DARK_GRAY: [f32; 4] = [0.25, 0.25, 0.25, 1.0];
    pub const BRICK: [f32; 4] = [0.7, 0.3, 0.15, 1.0];
    pub const QUESTION: [f32; 4] = [0.95, 0.7, 0.1, 1.0];
    pub const USED_BLOCK: [f32; 4] = [0.45, 0.35, 0.25, 1.0];
    pub const PLAYER: [f32; 4] = [0.9, 0.1, 0.1, 1.0];
    pub const PLAYER_FIRE: [f32; 4] = [1.0, 0.95, 0.9, 1.0];
    pub const OVERLAY: [f32; 4] = [0.0, 0.0, 0.0, 0.5];
    /// Magenta, for assets that failed to load
    pub const PLACEHOLDER: [f32; 4] = [1.0, 0.0, 1.0, 1.0];
}

/// Same color with alpha scaled by `fade` (0..=1)
pub fn faded(color: [f32; 4], fade: f32) -> [f32; 4] {
    [color[0], color[1], color[2], color[3] * fade.clamp(0.0, 1.0)]
}
