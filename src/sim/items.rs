//! Collectibles, power-ups, projectiles, bumpable blocks and the goal flag

use glam::{UVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::entity::{Body, Entity, EntityKind, Facing};
use super::enemies::fall_and_collide;
use super::frame::FrameContext;
use super::manager::WorldView;
use crate::consts::{LAYER_ENTITIES, TILE_SIZE};

pub const COIN_SIZE: u32 = 16;
pub const COIN_POINTS: u64 = 100;
pub const POWERUP_SIZE: u32 = 20;
pub const POWERUP_POINTS: u64 = 1000;
pub const MUSHROOM_SPEED: f32 = 60.0;

pub const FIREBALL_SIZE: u32 = 12;
pub const FIREBALL_SPEED: f32 = 350.0;
pub const FIREBALL_BOUNCE: f32 = -250.0;
pub const FIREBALL_LIFETIME: f32 = 3.0;

pub const BUMP_TIME: f32 = 0.12;
pub const BRICK_POINTS: u64 = 50;

pub const GOAL_WIDTH: u32 = 12;
pub const GOAL_HEIGHT: u32 = 100;

/// Things a level or a question block can hand out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Coin,
    Mushroom,
    FireFlower,
}

impl ItemKind {
    /// Build the entity for a level spawn with its top-left at `(x, y)`
    pub fn spawn(self, x: f32, y: f32) -> Entity {
        match self {
            ItemKind::Coin => Coin::spawn(x, y),
            ItemKind::Mushroom | ItemKind::FireFlower => PowerUpItem::spawn(self, x, y),
        }
    }
}

/// Bobbing coin
#[derive(Debug, Clone, PartialEq)]
pub struct Coin {
    pub base_y: f32,
    pub time: f32,
}

impl Coin {
    pub fn new(base_y: f32) -> Self {
        Self { base_y, time: 0.0 }
    }

    pub fn spawn(x: f32, y: f32) -> Entity {
        Entity::new(
            Body::new(Vec2::new(x, y), UVec2::splat(COIN_SIZE), LAYER_ENTITIES),
            EntityKind::Coin(Coin::new(y)),
        )
    }

    pub fn update(&mut self, body: &mut Body, dt: f32) {
        self.time += dt;
        body.pos.y = self.base_y + 3.0 * (self.time * 6.0).sin();
    }
}

/// Mushroom (walks, bounces off walls) or fire flower (stays put)
#[derive(Debug, Clone, PartialEq)]
pub struct PowerUpItem {
    pub item: ItemKind,
    pub dir: f32,
}

impl PowerUpItem {
    pub fn spawn(item: ItemKind, x: f32, y: f32) -> Entity {
        Entity::new(
            Body::new(Vec2::new(x, y), UVec2::splat(POWERUP_SIZE), LAYER_ENTITIES),
            EntityKind::PowerUp(PowerUpItem { item, dir: 1.0 }),
        )
    }

    pub fn speed(&self) -> f32 {
        match self.item {
            ItemKind::Mushroom => MUSHROOM_SPEED,
            _ => 0.0,
        }
    }

    pub fn update(&mut self, body: &mut Body, dt: f32, view: &WorldView<'_>, ctx: &mut FrameContext<'_>) {
        if self.item == ItemKind::FireFlower {
            return;
        }
        body.vel.x = self.dir * self.speed();
        let report = fall_and_collide(body, dt, view, &ctx.config.physics);
        if report.hit_wall {
            self.dir = -self.dir;
        }
    }
}

/// Bouncing projectile thrown by a fire-powered player
#[derive(Debug, Clone, PartialEq)]
pub struct Fireball {
    pub dir: f32,
    pub ttl: f32,
}

impl Fireball {
    pub fn spawn(pos: Vec2, dir: f32) -> Entity {
        let mut body = Body::new(pos, UVec2::splat(FIREBALL_SIZE), LAYER_ENTITIES);
        body.vel = Vec2::new(dir * FIREBALL_SPEED, 0.0);
        body.facing = Facing::from_sign(dir).unwrap_or_default();
        Entity::new(
            body,
            EntityKind::Fireball(Fireball {
                dir,
                ttl: FIREBALL_LIFETIME,
            }),
        )
    }

    pub fn update(&mut self, body: &mut Body, dt: f32, view: &WorldView<'_>, ctx: &mut FrameContext<'_>) {
        self.ttl -= dt;
        body.vel.x = self.dir * FIREBALL_SPEED;
        let report = fall_and_collide(body, dt, view, &ctx.config.physics);
        if report.landed {
            body.vel.y = FIREBALL_BOUNCE;
        }
        if report.hit_wall || self.ttl <= 0.0 {
            body.destroy();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Question { contents: ItemKind },
    Brick,
}

/// Result of hitting a block from below
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpOutcome {
    Dispense(ItemKind),
    Break,
    /// Wobbles, nothing else
    Bounce,
    /// Spent question block
    Nothing,
}

/// Question or brick block tied to a level cell
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    /// (row, col) of the level tile this block stands for
    pub cell: (usize, usize),
    pub used: bool,
    pub bump_timer: f32,
}

impl Block {
    pub fn spawn(kind: BlockKind, row: usize, col: usize) -> Entity {
        let pos = Vec2::new((col as u32 * TILE_SIZE) as f32, (row as u32 * TILE_SIZE) as f32);
        let body = Body::new(pos, UVec2::splat(TILE_SIZE), LAYER_ENTITIES).solid();
        Entity::new(
            body,
            EntityKind::Block(Block {
                kind,
                cell: (row, col),
                used: false,
                bump_timer: 0.0,
            }),
        )
    }

    /// Hit from below. Only big players break bricks.
    pub fn bump(&mut self, big: bool) -> BumpOutcome {
        match self.kind {
            BlockKind::Question { .. } if self.used => BumpOutcome::Nothing,
            BlockKind::Question { contents } => {
                self.used = true;
                self.bump_timer = BUMP_TIME;
                BumpOutcome::Dispense(contents)
            }
            BlockKind::Brick if big => BumpOutcome::Break,
            BlockKind::Brick => {
                self.bump_timer = BUMP_TIME;
                BumpOutcome::Bounce
            }
        }
    }

    /// Vertical draw offset: pops up 4 px when bumped and settles back
    pub fn bump_offset(&self) -> f32 {
        -4.0 * (self.bump_timer / BUMP_TIME).clamp(0.0, 1.0)
    }

    pub fn update(&mut self, dt: f32) {
        self.bump_timer = (self.bump_timer - dt).max(0.0);
    }
}

/// Level exit. Reaching it is latched so repeated overlaps report once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalFlag {
    pub reached: bool,
}

impl GoalFlag {
    /// Pole standing on `base` (the ground point under the flag)
    pub fn spawn(base: Vec2) -> Entity {
        let pos = Vec2::new(base.x, base.y - GOAL_HEIGHT as f32);
        Entity::new(
            Body::new(pos, UVec2::new(GOAL_WIDTH, GOAL_HEIGHT), LAYER_ENTITIES),
            EntityKind::Goal(GoalFlag::default()),
        )
    }

    /// Returns true the first time only
    pub fn reach(&mut self) -> bool {
        !std::mem::replace(&mut self.reached, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::entity::EntityType;
    use crate::sim::geom::Aabb;
    use crate::sim::level::TileKind;
    use crate::sim::manager::EntityManager;

    const DT: f32 = 1.0 / 60.0;

    fn run(manager: &mut EntityManager, frames: usize) {
        let config = GameConfig::default();
        for _ in 0..frames {
            let mut ctx = FrameContext::new(&config);
            manager.update(DT, &mut ctx);
            manager.sweep();
        }
    }

    #[test]
    fn question_block_dispenses_once() {
        let mut block = Block {
            kind: BlockKind::Question {
                contents: ItemKind::Mushroom,
            },
            cell: (3, 4),
            used: false,
            bump_timer: 0.0,
        };
        assert_eq!(block.bump(false), BumpOutcome::Dispense(ItemKind::Mushroom));
        assert_eq!(block.bump(true), BumpOutcome::Nothing);
    }

    #[test]
    fn brick_breaks_only_for_big_players() {
        let entity = Block::spawn(BlockKind::Brick, 2, 5);
        assert_eq!(entity.body.pos, Vec2::new(160.0, 64.0));
        let EntityKind::Block(mut block) = entity.kind else {
            unreachable!()
        };
        assert_eq!(block.bump(false), BumpOutcome::Bounce);
        assert!(block.bump_offset() < 0.0);
        block.update(BUMP_TIME);
        assert_eq!(block.bump_offset(), 0.0);
        assert_eq!(block.bump(true), BumpOutcome::Break);
    }

    #[test]
    fn goal_latches() {
        let mut goal = GoalFlag::default();
        assert!(goal.reach());
        assert!(!goal.reach());
    }

    #[test]
    fn coin_bobs_around_its_base() {
        let mut manager = EntityManager::new();
        let id = manager.add(Coin::spawn(10.0, 100.0)).unwrap();
        for _ in 0..60 {
            run(&mut manager, 1);
            let y = manager.get(id).unwrap().body.pos.y;
            assert!((y - 100.0).abs() <= 3.0 + 1e-3);
        }
    }

    #[test]
    fn mushroom_bounces_off_walls() {
        let mut manager = EntityManager::new();
        manager
            .add(Entity::platform(
                Aabb::from_xywh(0.0, 320.0, 640.0, 32.0),
                TileKind::Ground,
            ))
            .unwrap();
        manager
            .add(Entity::platform(
                Aabb::from_xywh(200.0, 256.0, 32.0, 64.0),
                TileKind::Pipe,
            ))
            .unwrap();
        let id = manager
            .add(PowerUpItem::spawn(ItemKind::Mushroom, 150.0, 300.0))
            .unwrap();
        run(&mut manager, 120);
        let e = manager.get(id).unwrap();
        let EntityKind::PowerUp(item) = &e.kind else {
            unreachable!()
        };
        assert_eq!(item.dir, -1.0);
        assert!(e.body.pos.x < 180.0);
        assert!(e.body.on_ground);
    }

    #[test]
    fn fire_flower_stays_put() {
        let mut manager = EntityManager::new();
        let id = manager
            .add(PowerUpItem::spawn(ItemKind::FireFlower, 50.0, 50.0))
            .unwrap();
        run(&mut manager, 30);
        assert_eq!(manager.get(id).unwrap().body.pos, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn fireball_bounces_then_dies_on_wall() {
        let mut manager = EntityManager::new();
        manager
            .add(Entity::platform(
                Aabb::from_xywh(0.0, 320.0, 640.0, 32.0),
                TileKind::Ground,
            ))
            .unwrap();
        manager
            .add(Entity::platform(
                Aabb::from_xywh(400.0, 192.0, 32.0, 128.0),
                TileKind::Stone,
            ))
            .unwrap();
        let id = manager
            .add(Fireball::spawn(Vec2::new(100.0, 290.0), 1.0))
            .unwrap();
        let mut bounced = false;
        for _ in 0..90 {
            run(&mut manager, 1);
            match manager.get(id) {
                Some(e) => bounced |= e.body.vel.y < 0.0,
                None => break,
            }
        }
        assert!(bounced);
        assert!(manager.get(id).is_none());
        assert!(manager.ids_by_type(EntityType::Projectile).is_empty());
    }
}
