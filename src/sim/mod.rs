//! Frame-stepped simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (entity creation order)
//! - No platform dependencies; drawing goes through `RenderSurface`

pub mod arena;
pub mod camera;
pub mod component;
pub mod effects;
pub mod enemies;
pub mod entity;
pub mod frame;
pub mod geom;
pub mod interaction;
pub mod items;
pub mod level;
pub mod manager;
pub mod physics;
pub mod player;
pub mod session;

pub use arena::EntityId;
pub use camera::Camera;
pub use component::{Component, ComponentTable, Health, Inventory};
pub use effects::EffectsManager;
pub use enemies::{Enemy, EnemyKind};
pub use entity::{Body, Entity, EntityKind, EntityType, Facing};
pub use frame::{FrameContext, GameEvent};
pub use geom::Aabb;
pub use items::{BlockKind, ItemKind};
pub use level::{Level, LevelBuilder, LevelData, TileKind};
pub use manager::{EntityManager, WorldView};
pub use physics::CollisionSide;
pub use player::{Intent, Player, PowerLevel};
pub use session::{PlayerStats, Session, SessionStatus};
