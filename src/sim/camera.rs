//! Side-scrolling camera
//!
//! Position is the top-left corner of the viewport in world space. Everything
//! stays in floating point; rounding happens only in `world_to_screen`.

use glam::{IVec2, Vec2};

use super::geom::Aabb;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub pos: Vec2,
    pub viewport: Vec2,
    /// Fraction of the remaining distance covered per 1/60 s (0 < f <= 1)
    pub smoothing: f32,
    /// Level size in world units; `None` leaves the camera unclamped
    bounds: Option<Vec2>,
}

impl Camera {
    pub fn new(viewport: Vec2, smoothing: f32) -> Self {
        Self {
            pos: Vec2::ZERO,
            viewport,
            smoothing: smoothing.clamp(f32::EPSILON, 1.0),
            bounds: None,
        }
    }

    /// Constrain the camera to a level of `size` world units
    pub fn set_bounds(&mut self, size: Vec2) {
        self.bounds = Some(size);
        self.pos = self.clamp(self.pos);
    }

    /// Largest top-left position that keeps the viewport inside the level
    pub fn max_pos(&self) -> Vec2 {
        match self.bounds {
            Some(size) => (size - self.viewport).max(Vec2::ZERO),
            None => Vec2::splat(f32::INFINITY),
        }
    }

    fn clamp(&self, pos: Vec2) -> Vec2 {
        match self.bounds {
            Some(_) => pos.clamp(Vec2::ZERO, self.max_pos()),
            None => pos,
        }
    }

    /// Top-left position that centres `focus`
    fn target_for(&self, focus: Vec2) -> Vec2 {
        focus - self.viewport * 0.5
    }

    /// Ease toward centring `focus`
    pub fn follow(&mut self, focus: Vec2, dt: f32) {
        let target = self.target_for(focus);
        let t = (self.smoothing * dt * 60.0).min(1.0);
        self.pos = self.clamp(self.pos + (target - self.pos) * t);
    }

    /// Centre on `focus` immediately (level start, respawn)
    pub fn snap_to(&mut self, focus: Vec2) {
        self.pos = self.clamp(self.target_for(focus));
    }

    pub fn visible_rect(&self) -> Aabb {
        Aabb::new(self.pos, self.viewport)
    }

    pub fn world_to_screen(&self, world: Vec2) -> IVec2 {
        (world - self.pos).round().as_ivec2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn camera() -> Camera {
        let mut camera = Camera::new(Vec2::new(800.0, 600.0), 0.1);
        camera.set_bounds(Vec2::new(1600.0, 800.0));
        camera
    }

    #[test]
    fn follow_eases_toward_target() {
        let mut camera = camera();
        camera.follow(Vec2::new(900.0, 300.0), 1.0 / 60.0);
        // target x is 500, a tenth of the way is 50
        assert!((camera.pos.x - 50.0).abs() < 1e-3);
        assert_eq!(camera.pos.y, 0.0);
    }

    #[test]
    fn large_steps_do_not_overshoot() {
        let mut camera = camera();
        camera.follow(Vec2::new(900.0, 300.0), 1.0);
        assert_eq!(camera.pos, Vec2::new(500.0, 0.0));
    }

    #[test]
    fn snap_clamps_to_level() {
        let mut camera = camera();
        camera.snap_to(Vec2::new(1590.0, 790.0));
        assert_eq!(camera.pos, Vec2::new(800.0, 200.0));
        camera.snap_to(Vec2::new(10.0, 10.0));
        assert_eq!(camera.pos, Vec2::ZERO);
    }

    #[test]
    fn level_smaller_than_viewport_pins_to_origin() {
        let mut camera = Camera::new(Vec2::new(800.0, 600.0), 1.0);
        camera.set_bounds(Vec2::new(400.0, 300.0));
        camera.follow(Vec2::new(390.0, 290.0), 1.0 / 60.0);
        assert_eq!(camera.pos, Vec2::ZERO);
    }

    #[test]
    fn screen_projection_rounds_last() {
        let mut camera = camera();
        camera.pos = Vec2::new(10.4, 0.6);
        assert_eq!(camera.world_to_screen(Vec2::new(20.0, 20.0)), IVec2::new(10, 19));
        assert_eq!(camera.visible_rect(), Aabb::from_xywh(10.4, 0.6, 800.0, 600.0));
    }

    proptest! {
        #[test]
        fn stays_within_level(
            x in 0.0f32..1600.0,
            y in 0.0f32..800.0,
            frames in 1usize..120,
            smoothing in 0.01f32..1.0,
        ) {
            let mut camera = camera();
            camera.smoothing = smoothing;
            for _ in 0..frames {
                camera.follow(Vec2::new(x, y), 1.0 / 60.0);
                prop_assert!(camera.pos.x >= 0.0 && camera.pos.x <= 800.0);
                prop_assert!(camera.pos.y >= 0.0 && camera.pos.y <= 200.0);
            }
        }
    }
}
