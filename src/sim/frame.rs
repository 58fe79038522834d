//! Per-frame scratch state shared by entity updates and interaction passes

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::EntityId;
use super::entity::Entity;
use super::items::ItemKind;
use super::level::TileKind;
use crate::config::GameConfig;

/// Something that happened this frame. Drained by the session, which turns
/// events into effects, sound cues and level mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Jumped,
    Stomped { pos: Vec2, points: u64 },
    EnemyKilled { pos: Vec2, points: u64 },
    ShellKicked { pos: Vec2 },
    PlayerDamaged,
    LifeLost { lives_left: u32 },
    PlayerDied,
    ExtraLife,
    CoinCollected { pos: Vec2 },
    PowerUpCollected { pos: Vec2, item: ItemKind },
    BlockBumped { pos: Vec2 },
    BrickBroken { pos: Vec2 },
    TileChanged { row: usize, col: usize, kind: TileKind },
    FireballThrown,
    GoalReached { pos: Vec2 },
    LevelComplete { bonus: u64 },
    TimeUp,
}

/// Mutable context threaded through one simulation frame
pub struct FrameContext<'a> {
    pub config: &'a GameConfig,
    pub events: Vec<GameEvent>,
    /// Entities created during update, committed after interactions
    pub spawns: Vec<Entity>,
    /// Solids the player hit with its head this frame
    pub ceiling_hits: Vec<EntityId>,
}

impl<'a> FrameContext<'a> {
    pub fn new(config: &'a GameConfig) -> Self {
        Self {
            config,
            events: Vec::new(),
            spawns: Vec::new(),
            ceiling_hits: Vec::new(),
        }
    }

    #[inline]
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn spawn(&mut self, entity: Entity) {
        self.spawns.push(entity);
    }
}
