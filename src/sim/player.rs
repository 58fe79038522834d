//! Player character
//!
//! Movement follows the shared platformer model with a few extras: a jump
//! buffer, coyote time, a run modifier and power levels derived from Health
//! (1 = small, 2 = big, 3 = fire).

use glam::{UVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::arena::EntityId;
use super::component::{Component, ComponentTable, Health, Inventory};
use super::entity::{Body, Entity, EntityKind, EntityType, Facing};
use super::frame::{FrameContext, GameEvent};
use super::items::Fireball;
use super::manager::WorldView;
use super::physics::{self, CollisionSide};
use crate::config::PhysicsConfig;
use crate::consts::*;

/// Seconds of invulnerability after losing a power level
pub const DAMAGE_INVULNERABILITY: f32 = 2.0;
/// Seconds of invulnerability after respawning
pub const RESPAWN_INVULNERABILITY: f32 = 3.0;
pub const MAX_FIREBALLS: usize = 2;
pub const FIREBALL_COOLDOWN: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PowerLevel {
    Small,
    Big,
    Fire,
}

impl PowerLevel {
    pub fn from_health(hp: u32) -> Self {
        match hp {
            0 | 1 => PowerLevel::Small,
            2 => PowerLevel::Big,
            _ => PowerLevel::Fire,
        }
    }

    pub fn health(self) -> u32 {
        match self {
            PowerLevel::Small => 1,
            PowerLevel::Big => 2,
            PowerLevel::Fire => 3,
        }
    }

    pub fn size(self) -> UVec2 {
        match self {
            PowerLevel::Small => UVec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            PowerLevel::Big | PowerLevel::Fire => UVec2::new(PLAYER_WIDTH, BIG_PLAYER_HEIGHT),
        }
    }
}

/// Coyote and jump-buffer countdowns
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JumpTimers {
    /// Time left in which an airborne jump is still accepted
    pub coyote: f32,
    /// Time left in which a remembered jump press may fire
    pub buffer: f32,
}

impl JumpTimers {
    /// Advance both countdowns; while grounded the coyote window is refilled
    pub fn tick(&mut self, dt: f32, grounded: bool, cfg: &PhysicsConfig) {
        if grounded {
            self.coyote = cfg.coyote_time;
        } else {
            self.coyote = (self.coyote - dt).max(0.0);
        }
        self.buffer = (self.buffer - dt).max(0.0);
    }

    pub fn press(&mut self, cfg: &PhysicsConfig) {
        self.buffer = cfg.jump_buffer;
    }

    /// Fire a buffered jump if the player may jump now
    pub fn try_consume(&mut self, grounded: bool) -> bool {
        if self.buffer > 0.0 && (grounded || self.coyote > 0.0) {
            self.buffer = 0.0;
            self.coyote = 0.0;
            true
        } else {
            false
        }
    }
}

/// What the player wants to do this frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Intent {
    /// -1, 0 or 1
    pub direction: f32,
    pub jump_pressed: bool,
    pub run: bool,
    pub fire_pressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationState {
    Idle,
    Walk,
    Run,
    Jump,
    Fall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Invulnerable: nothing happened
    Ignored,
    PowerLost,
    /// Lost a life and respawned
    LifeLost,
    OutOfLives,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub intent: Intent,
    pub timers: JumpTimers,
    pub spawn_point: Vec2,
    pub animation: AnimationState,
    fire_cooldown: f32,
}

impl Player {
    pub fn new(spawn_point: Vec2) -> Self {
        Self {
            intent: Intent::default(),
            timers: JumpTimers::default(),
            spawn_point,
            animation: AnimationState::Idle,
            fire_cooldown: 0.0,
        }
    }

    /// Build the player entity with its Health and Inventory components
    pub fn spawn(pos: Vec2, lives: u32) -> Entity {
        let size = PowerLevel::Small.size();
        let mut body = Body::new(pos, size, LAYER_PLAYER);
        body.solid = true;
        let mut entity = Entity::new(body, EntityKind::Player(Player::new(pos)));
        entity
            .components
            .attach(Component::Health(Health::new(1, PowerLevel::Fire.health())));
        entity
            .components
            .attach(Component::Inventory(Inventory::new(lives)));
        entity
    }

    /// Latest held state wins; jump and fire presses latch until `update`
    /// consumes them, so a press on a frame with no simulation step survives.
    pub fn handle_input(&mut self, intent: Intent) {
        self.intent = Intent {
            jump_pressed: self.intent.jump_pressed || intent.jump_pressed,
            fire_pressed: self.intent.fire_pressed || intent.fire_pressed,
            ..intent
        };
    }

    pub fn power(components: &ComponentTable) -> PowerLevel {
        PowerLevel::from_health(components.health().map_or(1, |h| h.current))
    }

    pub fn update(
        &mut self,
        id: EntityId,
        body: &mut Body,
        components: &mut ComponentTable,
        dt: f32,
        view: &WorldView<'_>,
        ctx: &mut FrameContext<'_>,
    ) {
        let config = ctx.config;
        let cfg = &config.physics;
        let grounded = body.on_ground;

        if let Some(health) = components.health_mut() {
            health.tick(dt);
        }

        self.timers.tick(dt, grounded, cfg);
        if self.intent.jump_pressed {
            self.timers.press(cfg);
        }
        if self.timers.try_consume(grounded) {
            body.vel.y = cfg.jump_speed;
            ctx.emit(GameEvent::Jumped);
        }

        physics::apply_gravity(body, cfg, dt);

        let mut max_speed = cfg.player_speed;
        if self.intent.run {
            max_speed *= cfg.run_multiplier;
        }
        let target = self.intent.direction * max_speed;
        body.vel.x = physics::horizontal(body.vel.x, target, cfg.acceleration, cfg.friction, dt);
        if let Some(facing) = Facing::from_sign(self.intent.direction) {
            body.facing = facing;
        }

        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
        if self.intent.fire_pressed && Self::power(components) == PowerLevel::Fire {
            self.throw_fireball(body, view, ctx);
        }

        let reach = body.vel.abs() * dt + Vec2::splat(TILE_SIZE as f32);
        let area = body.aabb().expanded(reach.max_element());
        let solids = view.static_solids_near(&area);
        let report = physics::move_and_collide(body, &solids, cfg, dt);
        ctx.ceiling_hits.extend(report.touched(CollisionSide::Top));

        self.animation = animation_for(body, self.intent.run);
        self.intent.jump_pressed = false;
        self.intent.fire_pressed = false;
        log::trace!("player {:?} at {:?} vel {:?}", id, body.pos, body.vel);
    }

    fn throw_fireball(&mut self, body: &Body, view: &WorldView<'_>, ctx: &mut FrameContext<'_>) {
        if self.fire_cooldown > 0.0 || view.count_type(EntityType::Projectile) >= MAX_FIREBALLS {
            return;
        }
        self.fire_cooldown = FIREBALL_COOLDOWN;
        let dir = body.facing.sign();
        let x = if dir > 0.0 {
            body.pos.x + body.size.x as f32
        } else {
            body.pos.x - super::items::FIREBALL_SIZE as f32
        };
        ctx.spawn(Fireball::spawn(Vec2::new(x, body.center().y), dir));
        ctx.emit(GameEvent::FireballThrown);
    }

    /// Take one hit. Loses a power level, or a life when already small.
    pub fn take_damage(&mut self, body: &mut Body, components: &mut ComponentTable) -> DamageOutcome {
        let Some(health) = components.health_mut() else {
            return DamageOutcome::Ignored;
        };
        if !health.damage(1) {
            return DamageOutcome::Ignored;
        }
        if health.is_depleted() {
            return self.lose_life(body, components);
        }
        health.invulnerable = DAMAGE_INVULNERABILITY;
        let level = PowerLevel::from_health(health.current);
        body.set_size_keep_feet(level.size());
        DamageOutcome::PowerLost
    }

    /// Lose a life regardless of power level (falls, timer)
    pub fn lose_life(&mut self, body: &mut Body, components: &mut ComponentTable) -> DamageOutcome {
        let lives = match components.inventory_mut() {
            Some(inv) => {
                inv.lives = inv.lives.saturating_sub(1);
                inv.lives
            }
            None => 0,
        };
        if lives == 0 {
            body.vel = Vec2::ZERO;
            body.destroy();
            body.visible = false;
            return DamageOutcome::OutOfLives;
        }
        self.respawn(body, components);
        DamageOutcome::LifeLost
    }

    pub fn respawn(&mut self, body: &mut Body, components: &mut ComponentTable) {
        let size = PowerLevel::Small.size();
        body.size = size;
        body.pos = self.spawn_point;
        body.vel = Vec2::ZERO;
        body.on_ground = false;
        body.facing = Facing::Right;
        if let Some(health) = components.health_mut() {
            health.current = PowerLevel::Small.health();
            health.invulnerable = RESPAWN_INVULNERABILITY;
        }
        self.timers = JumpTimers::default();
        self.fire_cooldown = 0.0;
    }

    /// Raise the power level to at least `level`
    pub fn power_up(body: &mut Body, components: &mut ComponentTable, level: PowerLevel) {
        if let Some(health) = components.health_mut() {
            health.raise_to(level.health());
            let level = PowerLevel::from_health(health.current);
            body.set_size_keep_feet(level.size());
        }
    }
}

fn animation_for(body: &Body, running: bool) -> AnimationState {
    if !body.on_ground {
        if body.vel.y < 0.0 {
            AnimationState::Jump
        } else {
            AnimationState::Fall
        }
    } else if body.vel.x.abs() > 10.0 {
        if running {
            AnimationState::Run
        } else {
            AnimationState::Walk
        }
    } else {
        AnimationState::Idle
    }
}
