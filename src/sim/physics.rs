//! Platformer physics and collision resolution
//!
//! Movement is integrated in substeps of at most `max_step_px` so fast bodies
//! cannot tunnel through a tile. After each substep the body is pushed out of
//! every overlapping static solid along the minimum-translation axis.

use super::arena::EntityId;
use super::entity::Body;
use super::geom::Aabb;
use crate::approach;
use crate::config::PhysicsConfig;
use crate::consts::MAX_SUBSTEPS;

/// Resolution passes per substep; each pass re-tests every solid
const MAX_RESOLVE_PASSES: usize = 4;

/// Which side of the moving body touched the other box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionSide {
    Left,
    Right,
    /// Head hit something above
    Top,
    /// Feet landed on something below
    Bottom,
}

impl CollisionSide {
    pub fn is_vertical(self) -> bool {
        matches!(self, CollisionSide::Top | CollisionSide::Bottom)
    }
}

/// Classify an overlap by its minimum-translation axis.
///
/// The axis with the smaller penetration depth wins; equal depths resolve
/// vertically so a body settling onto a corner lands instead of sticking to a wall.
pub fn collision_side(mover: &Aabb, other: &Aabb) -> Option<CollisionSide> {
    let depth = mover.overlap(other)?;
    let (mc, oc) = (mover.center(), other.center());
    Some(if depth.x < depth.y {
        if mc.x < oc.x {
            CollisionSide::Right
        } else {
            CollisionSide::Left
        }
    } else if mc.y < oc.y {
        CollisionSide::Bottom
    } else {
        CollisionSide::Top
    })
}

/// `vy = min(vy + g*dt, terminal)`
#[inline]
pub fn apply_gravity(body: &mut Body, cfg: &PhysicsConfig, dt: f32) {
    body.vel.y = (body.vel.y + cfg.gravity * dt).min(cfg.terminal_velocity);
}

/// Accelerate toward `target` when there is intent, otherwise brake with friction
#[inline]
pub fn horizontal(vx: f32, target: f32, accel: f32, friction: f32, dt: f32) -> f32 {
    if target != 0.0 {
        approach(vx, target, accel * dt)
    } else {
        approach(vx, 0.0, friction * dt)
    }
}

/// A static box the mover may collide with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solid {
    pub id: EntityId,
    pub rect: Aabb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub id: EntityId,
    pub side: CollisionSide,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionReport {
    pub landed: bool,
    pub hit_wall: bool,
    pub hit_ceiling: bool,
    pub contacts: Vec<Contact>,
}

impl CollisionReport {
    pub fn touched(&self, side: CollisionSide) -> impl Iterator<Item = EntityId> + '_ {
        self.contacts.iter().filter(move |c| c.side == side).map(|c| c.id)
    }
}

/// Integrate `body.vel` over `dt` and resolve against `solids`.
///
/// Clears and re-derives `on_ground`.
pub fn move_and_collide(
    body: &mut Body,
    solids: &[Solid],
    cfg: &PhysicsConfig,
    dt: f32,
) -> CollisionReport {
    let mut report = CollisionReport::default();
    body.on_ground = false;

    let delta = body.vel * dt;
    let longest = delta.x.abs().max(delta.y.abs());
    let steps = ((longest / cfg.max_step_px.max(1.0)).ceil() as u32).clamp(1, MAX_SUBSTEPS);
    let mut step = delta / steps as f32;

    for _ in 0..steps {
        body.pos += step;
        resolve(body, solids, &mut report);
        // A blocked axis stops advancing for the rest of the frame
        if body.vel.x == 0.0 {
            step.x = 0.0;
        }
        if body.vel.y == 0.0 {
            step.y = 0.0;
        }
    }

    body.on_ground = report.landed;
    report
}

/// Push `body` out of every overlapping solid, largest overlap first.
pub fn resolve(body: &mut Body, solids: &[Solid], report: &mut CollisionReport) {
    for _ in 0..MAX_RESOLVE_PASSES {
        let rect = body.aabb();
        let mut hits: Vec<(usize, f32)> = solids
            .iter()
            .enumerate()
            .filter_map(|(i, s)| rect.overlap(&s.rect).map(|d| (i, d.x * d.y)))
            .collect();
        if hits.is_empty() {
            return;
        }
        hits.sort_by(|a, b| b.1.total_cmp(&a.1));

        for (i, _) in hits {
            let solid = &solids[i];
            // Earlier pushes in this pass may already have separated us
            let Some(side) = collision_side(&body.aabb(), &solid.rect) else {
                continue;
            };
            push_out(body, &solid.rect, side, report);
            report.contacts.push(Contact { id: solid.id, side });
        }
    }
}

fn push_out(body: &mut Body, solid: &Aabb, side: CollisionSide, report: &mut CollisionReport) {
    let size = body.size.as_vec2();
    match side {
        CollisionSide::Bottom => {
            body.pos.y = solid.top() - size.y;
            if body.vel.y >= 0.0 {
                body.vel.y = 0.0;
                report.landed = true;
            }
        }
        CollisionSide::Top => {
            body.pos.y = solid.bottom();
            if body.vel.y < 0.0 {
                body.vel.y = 0.0;
            }
            report.hit_ceiling = true;
        }
        CollisionSide::Right => {
            body.pos.x = solid.left() - size.x;
            if body.vel.x > 0.0 {
                body.vel.x = 0.0;
            }
            report.hit_wall = true;
        }
        CollisionSide::Left => {
            body.pos.x = solid.right();
            if body.vel.x < 0.0 {
                body.vel.x = 0.0;
            }
            report.hit_wall = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arena::Arena;
    use glam::{UVec2, Vec2};
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;
    const EPS: f32 = 0.01;

    fn ids(n: usize) -> Vec<EntityId> {
        let mut arena = Arena::new();
        (0..n).map(|_| arena.insert(())).collect()
    }

    fn body_at(x: f32, y: f32) -> Body {
        Body::new(Vec2::new(x, y), UVec2::new(32, 32), 0)
    }

    #[test]
    fn equal_overlap_resolves_vertically() {
        let mover = Aabb::from_xywh(0.0, 0.0, 32.0, 32.0);
        let block = Aabb::from_xywh(24.0, 24.0, 32.0, 32.0);
        assert_eq!(collision_side(&mover, &block), Some(CollisionSide::Bottom));

        let above = Aabb::from_xywh(24.0, 40.0, 32.0, 32.0);
        let mover = Aabb::from_xywh(0.0, 64.0, 32.0, 32.0);
        // 8x8 overlap from underneath: head bump, not a wall
        assert_eq!(collision_side(&mover, &above), Some(CollisionSide::Top));
    }

    #[test]
    fn smaller_axis_wins() {
        let mover = Aabb::from_xywh(0.0, 0.0, 32.0, 32.0);
        let wall = Aabb::from_xywh(30.0, -10.0, 32.0, 64.0);
        assert_eq!(collision_side(&mover, &wall), Some(CollisionSide::Right));
        let wall = Aabb::from_xywh(-30.0, -10.0, 32.0, 64.0);
        assert_eq!(collision_side(&mover, &wall), Some(CollisionSide::Left));
    }

    #[test]
    fn falling_body_lands_and_zeroes_velocity() {
        let cfg = PhysicsConfig::default();
        let id = ids(1)[0];
        let ground = [Solid {
            id,
            rect: Aabb::from_xywh(0.0, 100.0, 320.0, 32.0),
        }];
        let mut body = body_at(10.0, 60.0);
        body.vel.y = 600.0;
        let report = move_and_collide(&mut body, &ground, &cfg, DT);
        assert!(report.landed);
        assert!(body.on_ground);
        assert_eq!(body.vel.y, 0.0);
        assert_eq!(body.bottom(), 100.0);
        assert_eq!(report.contacts[0].side, CollisionSide::Bottom);
    }

    #[test]
    fn rising_body_bumps_ceiling_without_landing() {
        let cfg = PhysicsConfig::default();
        let id = ids(1)[0];
        let ceiling = [Solid {
            id,
            rect: Aabb::from_xywh(0.0, 0.0, 320.0, 32.0),
        }];
        let mut body = body_at(10.0, 36.0);
        body.vel.y = -600.0;
        let report = move_and_collide(&mut body, &ceiling, &cfg, DT);
        assert!(report.hit_ceiling);
        assert!(!body.on_ground);
        assert_eq!(body.pos.y, 32.0);
        assert_eq!(body.vel.y, 0.0);
    }

    #[test]
    fn walking_across_a_seam_does_not_stop() {
        // Two separate blocks side by side; the body sinks slightly into both
        let cfg = PhysicsConfig::default();
        let id = ids(2);
        let solids = [
            Solid {
                id: id[0],
                rect: Aabb::from_xywh(0.0, 100.0, 32.0, 32.0),
            },
            Solid {
                id: id[1],
                rect: Aabb::from_xywh(32.0, 100.0, 32.0, 32.0),
            },
        ];
        let mut body = body_at(2.0, 68.0);
        body.vel = Vec2::new(120.0, 20.0);
        let report = move_and_collide(&mut body, &solids, &cfg, DT);
        assert!(!report.hit_wall);
        assert!(report.landed);
        assert_eq!(body.vel.x, 120.0);
    }

    #[test]
    fn fast_body_does_not_tunnel_through_thin_floor() {
        let cfg = PhysicsConfig::default();
        let id = ids(1)[0];
        let floor = [Solid {
            id,
            rect: Aabb::from_xywh(0.0, 100.0, 320.0, 8.0),
        }];
        let mut body = body_at(10.0, 60.0);
        body.vel.y = cfg.terminal_velocity;
        move_and_collide(&mut body, &floor, &cfg, DT);
        assert_eq!(body.bottom(), 100.0);
    }

    #[test]
    fn horizontal_model() {
        // accelerate toward target, capped at target
        assert_eq!(horizontal(0.0, 200.0, 100.0, 80.0, 1.0), 100.0);
        assert_eq!(horizontal(190.0, 200.0, 100.0, 80.0, 1.0), 200.0);
        // friction toward zero with no intent
        assert_eq!(horizontal(100.0, 0.0, 100.0, 80.0, 1.0), 20.0);
        assert_eq!(horizontal(-50.0, 0.0, 100.0, 80.0, 1.0), 0.0);
    }

    #[test]
    fn gravity_is_capped() {
        let cfg = PhysicsConfig::default();
        let mut body = body_at(0.0, 0.0);
        body.vel.y = cfg.terminal_velocity - 1.0;
        apply_gravity(&mut body, &cfg, DT);
        assert_eq!(body.vel.y, cfg.terminal_velocity);
    }

    proptest! {
        #[test]
        fn no_overlap_after_resolution(
            x in 0.0f32..400.0,
            y in -200.0f32..60.0,
            vx in -800.0f32..800.0,
            vy in -800.0f32..800.0,
        ) {
            let cfg = PhysicsConfig::default();
            let id = ids(3);
            let solids = [
                Solid { id: id[0], rect: Aabb::from_xywh(-64.0, 100.0, 600.0, 64.0) },
                Solid { id: id[1], rect: Aabb::from_xywh(-64.0, -400.0, 32.0, 500.0) },
                Solid { id: id[2], rect: Aabb::from_xywh(480.0, -400.0, 32.0, 500.0) },
            ];
            let mut body = body_at(x, y);
            body.vel = Vec2::new(vx, vy);
            for _ in 0..30 {
                apply_gravity(&mut body, &cfg, DT);
                move_and_collide(&mut body, &solids, &cfg, DT);
                for s in &solids {
                    if let Some(d) = body.aabb().overlap(&s.rect) {
                        prop_assert!(d.x.min(d.y) <= EPS, "overlap {:?} with {:?}", d, s.rect);
                    }
                }
            }
        }
    }
}
