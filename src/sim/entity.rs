//! Entity model
//!
//! An entity is a `Body` (the physical state every kind shares), a closed
//! `EntityKind` payload carrying per-kind behavior state, and a component table.
//! Keeping the body next to (not inside) the kind lets behavior code borrow both
//! mutably at once.

use glam::{UVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::arena::EntityId;
use super::component::ComponentTable;
use super::enemies::Enemy;
use super::frame::FrameContext;
use super::geom::Aabb;
use super::items::{Block, Coin, Fireball, GoalFlag, PowerUpItem};
use super::level::TileKind;
use super::manager::WorldView;
use super::player::Player;

/// Closed set of entity type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Player,
    Goomba,
    Koopa,
    Piranha,
    FlyingEnemy,
    Platform,
    Block,
    Collectible,
    PowerUp,
    Projectile,
    Goal,
    Effect,
}

impl EntityType {
    pub fn is_enemy(self) -> bool {
        matches!(
            self,
            EntityType::Goomba | EntityType::Koopa | EntityType::Piranha | EntityType::FlyingEnemy
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn from_sign(value: f32) -> Option<Facing> {
        if value > 0.0 {
            Some(Facing::Right)
        } else if value < 0.0 {
            Some(Facing::Left)
        } else {
            None
        }
    }
}

/// Physical state shared by every entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Top-left corner in world pixels
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: UVec2,
    /// Blocks other bodies' movement
    pub solid: bool,
    /// Updated and collided; inactive entities are swept at end of frame
    pub active: bool,
    pub visible: bool,
    pub on_ground: bool,
    pub facing: Facing,
    pub layer: i32,
}

impl Body {
    pub fn new(pos: Vec2, size: UVec2, layer: i32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            size,
            solid: false,
            active: true,
            visible: true,
            on_ground: false,
            facing: Facing::Right,
            layer,
        }
    }

    pub fn solid(mut self) -> Self {
        self.solid = true;
        self
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.size.as_vec2())
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size.as_vec2() * 0.5
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y as f32
    }

    /// Resize while keeping the bottom edge and horizontal center fixed
    pub fn set_size_keep_feet(&mut self, size: UVec2) {
        let feet = Vec2::new(self.center().x, self.bottom());
        self.size = size;
        self.pos = Vec2::new(feet.x - size.x as f32 * 0.5, feet.y - size.y as f32);
    }

    /// Mark for removal at the end of the frame
    pub fn destroy(&mut self) {
        self.active = false;
    }
}

/// Static level geometry produced from merged tiles
#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub tile: TileKind,
}

/// Per-kind payload
#[derive(Debug, Clone)]
pub enum EntityKind {
    Player(Player),
    Enemy(Enemy),
    Platform(Platform),
    Block(Block),
    Coin(Coin),
    PowerUp(PowerUpItem),
    Fireball(Fireball),
    Goal(GoalFlag),
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub body: Body,
    pub kind: EntityKind,
    pub components: ComponentTable,
}

impl Entity {
    pub fn new(body: Body, kind: EntityKind) -> Self {
        Self {
            body,
            kind,
            components: ComponentTable::new(),
        }
    }

    pub fn platform(rect: Aabb, tile: TileKind) -> Self {
        let size = rect.size.as_uvec2();
        Self::new(
            Body::new(rect.min, size, crate::consts::LAYER_PLATFORMS).solid(),
            EntityKind::Platform(Platform { tile }),
        )
    }

    pub fn entity_type(&self) -> EntityType {
        match &self.kind {
            EntityKind::Player(_) => EntityType::Player,
            EntityKind::Enemy(enemy) => enemy.entity_type(),
            EntityKind::Platform(_) => EntityType::Platform,
            EntityKind::Block(_) => EntityType::Block,
            EntityKind::Coin(_) => EntityType::Collectible,
            EntityKind::PowerUp(_) => EntityType::PowerUp,
            EntityKind::Fireball(_) => EntityType::Projectile,
            EntityKind::Goal(_) => EntityType::Goal,
        }
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        self.body.aabb()
    }

    /// Static geometry other bodies collide against
    pub fn is_static_solid(&self) -> bool {
        self.body.solid
            && self.body.active
            && matches!(self.kind, EntityKind::Platform(_) | EntityKind::Block(_))
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_enemy(&self) -> Option<&Enemy> {
        match &self.kind {
            EntityKind::Enemy(e) => Some(e),
            _ => None,
        }
    }

    /// Per-frame update. `view` sees every other entity, read-only.
    pub fn update(&mut self, id: EntityId, dt: f32, view: &WorldView<'_>, ctx: &mut FrameContext<'_>) {
        let Entity {
            body,
            kind,
            components,
        } = self;
        match kind {
            EntityKind::Player(player) => player.update(id, body, components, dt, view, ctx),
            EntityKind::Enemy(enemy) => enemy.update(body, dt, view, ctx),
            EntityKind::Block(block) => block.update(dt),
            EntityKind::Coin(coin) => coin.update(body, dt),
            EntityKind::PowerUp(item) => item.update(body, dt, view, ctx),
            EntityKind::Fireball(fireball) => fireball.update(body, dt, view, ctx),
            EntityKind::Platform(_) | EntityKind::Goal(_) => {}
        }
    }
}
