//! Axis-aligned rectangle geometry
//!
//! World space uses pixels with +y pointing down, so `top()` is the smaller y.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box given by its top-left corner and size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub const fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.min.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.min.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.min.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.min.y + self.size.y
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    pub fn area(&self) -> f32 {
        self.size.x * self.size.y
    }

    /// Strict overlap test: touching edges do not count
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Penetration depth on each axis, or `None` if the boxes do not overlap.
    ///
    /// Depth is the smaller of the two ways to separate along that axis.
    pub fn overlap(&self, other: &Aabb) -> Option<Vec2> {
        if !self.intersects(other) {
            return None;
        }
        let x = (self.right() - other.left()).min(other.right() - self.left());
        let y = (self.bottom() - other.top()).min(other.bottom() - self.top());
        Some(Vec2::new(x, y))
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }

    pub fn translated(&self, delta: Vec2) -> Aabb {
        Aabb::new(self.min + delta, self.size)
    }

    /// Grow by `margin` on every side
    pub fn expanded(&self, margin: f32) -> Aabb {
        Aabb::new(
            self.min - Vec2::splat(margin),
            self.size + Vec2::splat(margin * 2.0),
        )
    }
}
