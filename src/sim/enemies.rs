//! Enemy behaviors
//!
//! Every enemy shares `Enemy` (death animation, stomp/kick entry points) and
//! carries one closed `Behavior` variant. Behaviors implement `EnemyAi`; a new
//! enemy type only has to supply `update_ai`.

use glam::{UVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::entity::{Body, Entity, EntityKind, EntityType, Facing};
use super::frame::FrameContext;
use super::geom::Aabb;
use super::manager::WorldView;
use super::physics::{self, CollisionReport};
use crate::config::PhysicsConfig;
use crate::consts::{LAYER_ENTITIES, TILE_SIZE};

/// Seconds a killed enemy keeps falling before it is removed
pub const DEATH_DURATION: f32 = 1.0;
/// Upward pop when an enemy dies
pub const DEATH_BOUNCE: f32 = -200.0;
pub const STOMP_POINTS: u64 = 100;

pub const SHELL_HEIGHT: u32 = 20;
pub const SHELL_SPEED: f32 = 300.0;
/// Inert shell re-emerges after this long
pub const SHELL_INERT_TIME: f32 = 5.0;
/// Sliding shell stops after this long
pub const SHELL_SLIDE_TIME: f32 = 4.0;
/// After a kick the shell ignores the kicker briefly
pub const KICK_GRACE: f32 = 0.2;

pub const PIRANHA_HIDDEN_TIME: f32 = 2.0;
pub const PIRANHA_EMERGED_TIME: f32 = 2.0;
/// How far below its base a hidden piranha sits
pub const PIRANHA_DEPTH: f32 = 40.0;

pub const FLYER_AMPLITUDE: f32 = 50.0;
pub const FLYER_FREQUENCY: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Goomba,
    Koopa,
    Piranha,
    Flyer,
}

impl EnemyKind {
    pub fn entity_type(self) -> EntityType {
        match self {
            EnemyKind::Goomba => EntityType::Goomba,
            EnemyKind::Koopa => EntityType::Koopa,
            EnemyKind::Piranha => EntityType::Piranha,
            EnemyKind::Flyer => EntityType::FlyingEnemy,
        }
    }

    pub fn size(self) -> UVec2 {
        match self {
            EnemyKind::Goomba | EnemyKind::Flyer => UVec2::new(24, 24),
            EnemyKind::Koopa => UVec2::new(28, 32),
            EnemyKind::Piranha => UVec2::new(32, 32),
        }
    }
}

/// Capability every enemy behavior provides
pub trait EnemyAi {
    /// Steer and move the body for one frame
    fn update_ai(&mut self, body: &mut Body, dt: f32, view: &WorldView<'_>, cfg: &PhysicsConfig);

    /// Whether landing on top defeats (or shells) this enemy
    fn stompable(&self) -> bool {
        true
    }

    /// Whether touching it hurts the player right now
    fn harmful(&self) -> bool {
        true
    }
}

/// Back-and-forth walker shared by Goomba and Koopa
#[derive(Debug, Clone, PartialEq)]
pub struct Patrol {
    pub origin_x: f32,
    pub range: f32,
    pub speed: f32,
    pub dir: f32,
}

impl Patrol {
    pub fn new(origin_x: f32, range: f32, speed: f32) -> Self {
        Self {
            origin_x,
            range,
            speed,
            dir: -1.0,
        }
    }

    /// Walk one frame, turning at walls, ledges and the patrol limit
    pub fn step(&mut self, body: &mut Body, dt: f32, view: &WorldView<'_>, cfg: &PhysicsConfig) {
        body.vel.x = self.dir * self.speed;
        let report = fall_and_collide(body, dt, view, cfg);

        let from_origin = body.pos.x - self.origin_x;
        if report.hit_wall || (body.on_ground && ledge_ahead(body, self.dir, view)) {
            self.dir = -self.dir;
        } else if from_origin.abs() > self.range && from_origin.signum() == self.dir {
            self.dir = -self.dir;
        }
        body.facing = Facing::from_sign(self.dir).unwrap_or(body.facing);
    }
}

/// Gravity plus collision against nearby static solids
pub fn fall_and_collide(
    body: &mut Body,
    dt: f32,
    view: &WorldView<'_>,
    cfg: &PhysicsConfig,
) -> CollisionReport {
    physics::apply_gravity(body, cfg, dt);
    let area = body.aabb().expanded(body.vel.abs().max_element() * dt + TILE_SIZE as f32);
    let solids = view.static_solids_near(&area);
    physics::move_and_collide(body, &solids, cfg, dt)
}

/// No ground under the leading foot
fn ledge_ahead(body: &Body, dir: f32, view: &WorldView<'_>) -> bool {
    let rect = body.aabb();
    let x = if dir > 0.0 {
        rect.right() + 1.0
    } else {
        rect.left() - 2.0
    };
    let foot = Aabb::from_xywh(x, rect.bottom(), 1.0, 10.0);
    !view.any_solid_in(&foot)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Goomba {
    pub patrol: Patrol,
}

impl EnemyAi for Goomba {
    fn update_ai(&mut self, body: &mut Body, dt: f32, view: &WorldView<'_>, cfg: &PhysicsConfig) {
        self.patrol.step(body, dt, view, cfg);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShellState {
    Walking,
    Inert { timer: f32 },
    Sliding { timer: f32, grace: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Koopa {
    pub patrol: Patrol,
    pub shell: ShellState,
}

impl Koopa {
    pub fn is_sliding(&self) -> bool {
        matches!(self.shell, ShellState::Sliding { .. })
    }

    pub fn is_inert(&self) -> bool {
        matches!(self.shell, ShellState::Inert { .. })
    }

    fn enter_shell(&mut self, body: &mut Body) {
        self.shell = ShellState::Inert {
            timer: SHELL_INERT_TIME,
        };
        body.vel.x = 0.0;
        body.set_size_keep_feet(UVec2::new(body.size.x, SHELL_HEIGHT));
    }

    fn kick(&mut self, body: &mut Body, dir: f32) {
        self.shell = ShellState::Sliding {
            timer: SHELL_SLIDE_TIME,
            grace: KICK_GRACE,
        };
        self.patrol.dir = dir;
        body.vel.x = dir * SHELL_SPEED;
    }
}

impl EnemyAi for Koopa {
    fn update_ai(&mut self, body: &mut Body, dt: f32, view: &WorldView<'_>, cfg: &PhysicsConfig) {
        match &mut self.shell {
            ShellState::Walking => self.patrol.step(body, dt, view, cfg),
            ShellState::Inert { timer } => {
                *timer -= dt;
                body.vel.x = 0.0;
                fall_and_collide(body, dt, view, cfg);
                if *timer <= 0.0 {
                    self.shell = ShellState::Walking;
                    body.set_size_keep_feet(EnemyKind::Koopa.size());
                }
            }
            ShellState::Sliding { timer, grace } => {
                *timer -= dt;
                *grace = (*grace - dt).max(0.0);
                body.vel.x = self.patrol.dir * SHELL_SPEED;
                let report = fall_and_collide(body, dt, view, cfg);
                if report.hit_wall || *timer <= 0.0 {
                    self.shell = ShellState::Inert {
                        timer: SHELL_INERT_TIME,
                    };
                    body.vel.x = 0.0;
                }
            }
        }
    }

    fn harmful(&self) -> bool {
        match self.shell {
            ShellState::Walking => true,
            ShellState::Inert { .. } => false,
            ShellState::Sliding { grace, .. } => grace <= 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PiranhaPhase {
    Hidden,
    Emerged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Piranha {
    pub base_y: f32,
    pub phase: PiranhaPhase,
    pub timer: f32,
}

impl Piranha {
    fn place(&self, body: &mut Body) {
        match self.phase {
            PiranhaPhase::Hidden => {
                body.pos.y = self.base_y + PIRANHA_DEPTH;
                body.visible = false;
                body.solid = false;
            }
            PiranhaPhase::Emerged => {
                body.pos.y = self.base_y;
                body.visible = true;
                body.solid = true;
            }
        }
    }
}

impl EnemyAi for Piranha {
    fn update_ai(&mut self, body: &mut Body, dt: f32, _view: &WorldView<'_>, _cfg: &PhysicsConfig) {
        self.timer += dt;
        let (limit, next) = match self.phase {
            PiranhaPhase::Hidden => (PIRANHA_HIDDEN_TIME, PiranhaPhase::Emerged),
            PiranhaPhase::Emerged => (PIRANHA_EMERGED_TIME, PiranhaPhase::Hidden),
        };
        if self.timer >= limit {
            self.timer = 0.0;
            self.phase = next;
        }
        body.vel = Vec2::ZERO;
        self.place(body);
    }

    fn stompable(&self) -> bool {
        false
    }

    fn harmful(&self) -> bool {
        self.phase == PiranhaPhase::Emerged
    }
}

/// Flies a horizontal patrol while bobbing on a sine wave
#[derive(Debug, Clone, PartialEq)]
pub struct Flyer {
    pub base_y: f32,
    pub time: f32,
    pub patrol: Patrol,
}

impl EnemyAi for Flyer {
    fn update_ai(&mut self, body: &mut Body, dt: f32, _view: &WorldView<'_>, _cfg: &PhysicsConfig) {
        self.time += dt;
        body.vel.x = self.patrol.dir * self.patrol.speed;
        body.pos.x += body.vel.x * dt;
        let y = self.base_y + FLYER_AMPLITUDE * (self.time * FLYER_FREQUENCY).sin();
        body.vel.y = (y - body.pos.y) / dt.max(f32::EPSILON);
        body.pos.y = y;

        let from_origin = body.pos.x - self.patrol.origin_x;
        if from_origin.abs() > self.patrol.range && from_origin.signum() == self.patrol.dir {
            self.patrol.dir = -self.patrol.dir;
        }
        body.facing = Facing::from_sign(self.patrol.dir).unwrap_or(body.facing);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Goomba(Goomba),
    Koopa(Koopa),
    Piranha(Piranha),
    Flyer(Flyer),
}

impl Behavior {
    pub fn ai(&self) -> &dyn EnemyAi {
        match self {
            Behavior::Goomba(b) => b,
            Behavior::Koopa(b) => b,
            Behavior::Piranha(b) => b,
            Behavior::Flyer(b) => b,
        }
    }

    pub fn ai_mut(&mut self) -> &mut dyn EnemyAi {
        match self {
            Behavior::Goomba(b) => b,
            Behavior::Koopa(b) => b,
            Behavior::Piranha(b) => b,
            Behavior::Flyer(b) => b,
        }
    }
}

/// What a stomp did to the enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StompOutcome {
    Killed,
    Shelled,
    /// Inert shell sent sliding
    Kicked,
    /// Sliding shell stopped
    Stopped,
    Immune,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub behavior: Behavior,
    /// Counts down while the death animation plays
    pub death_timer: Option<f32>,
}

impl Enemy {
    pub fn entity_type(&self) -> EntityType {
        self.kind.entity_type()
    }

    pub fn is_dying(&self) -> bool {
        self.death_timer.is_some()
    }

    pub fn stompable(&self) -> bool {
        !self.is_dying() && self.behavior.ai().stompable()
    }

    pub fn harmful(&self) -> bool {
        !self.is_dying() && self.behavior.ai().harmful()
    }

    /// Inert shell that a side touch will kick
    pub fn kickable(&self) -> bool {
        !self.is_dying() && matches!(&self.behavior, Behavior::Koopa(k) if k.is_inert())
    }

    pub fn is_sliding_shell(&self) -> bool {
        !self.is_dying() && matches!(&self.behavior, Behavior::Koopa(k) if k.is_sliding())
    }

    pub fn update(&mut self, body: &mut Body, dt: f32, view: &WorldView<'_>, ctx: &mut FrameContext<'_>) {
        if let Some(timer) = &mut self.death_timer {
            *timer -= dt;
            physics::apply_gravity(body, &ctx.config.physics, dt);
            body.pos += body.vel * dt;
            if *timer <= 0.0 {
                body.destroy();
            }
            return;
        }
        self.behavior.ai_mut().update_ai(body, dt, view, &ctx.config.physics);
    }

    /// Player landed on top. `from_x` is the stomper's center.
    pub fn stomp(&mut self, body: &mut Body, from_x: f32) -> StompOutcome {
        if !self.stompable() {
            return StompOutcome::Immune;
        }
        match &mut self.behavior {
            Behavior::Koopa(koopa) => match koopa.shell {
                ShellState::Walking => {
                    koopa.enter_shell(body);
                    StompOutcome::Shelled
                }
                ShellState::Inert { .. } => {
                    koopa.kick(body, away_from(body, from_x));
                    StompOutcome::Kicked
                }
                ShellState::Sliding { .. } => {
                    koopa.shell = ShellState::Inert {
                        timer: SHELL_INERT_TIME,
                    };
                    body.vel.x = 0.0;
                    StompOutcome::Stopped
                }
            },
            _ => {
                self.die(body);
                StompOutcome::Killed
            }
        }
    }

    /// Side touch on an inert shell
    pub fn kick(&mut self, body: &mut Body, from_x: f32) -> bool {
        if !self.kickable() {
            return false;
        }
        if let Behavior::Koopa(koopa) = &mut self.behavior {
            koopa.kick(body, away_from(body, from_x));
        }
        true
    }

    /// Start the death animation: non-solid, pops up then falls
    pub fn die(&mut self, body: &mut Body) {
        if self.is_dying() {
            return;
        }
        self.death_timer = Some(DEATH_DURATION);
        body.solid = false;
        body.visible = true;
        body.vel = Vec2::new(0.0, DEATH_BOUNCE);
    }
}

fn away_from(body: &Body, from_x: f32) -> f32 {
    if from_x < body.center().x { 1.0 } else { -1.0 }
}

/// Enemy factory
pub struct EnemySpawner;

impl EnemySpawner {
    /// Build an enemy with its top-left corner at `(x, y)`
    pub fn create(kind: EnemyKind, x: f32, y: f32) -> Entity {
        let behavior = match kind {
            EnemyKind::Goomba => Behavior::Goomba(Goomba {
                patrol: Patrol::new(x, 80.0, 30.0),
            }),
            EnemyKind::Koopa => Behavior::Koopa(Koopa {
                patrol: Patrol::new(x, 120.0, 40.0),
                shell: ShellState::Walking,
            }),
            EnemyKind::Piranha => Behavior::Piranha(Piranha {
                base_y: y,
                phase: PiranhaPhase::Hidden,
                timer: 0.0,
            }),
            EnemyKind::Flyer => Behavior::Flyer(Flyer {
                base_y: y,
                time: 0.0,
                patrol: Patrol::new(x, 100.0, 60.0),
            }),
        };
        let mut body = Body::new(Vec2::new(x, y), kind.size(), LAYER_ENTITIES);
        body.solid = true;
        body.facing = Facing::Left;
        let enemy = Enemy {
            kind,
            behavior,
            death_timer: None,
        };
        if let Behavior::Piranha(p) = &enemy.behavior {
            p.place(&mut body);
        }
        Entity::new(body, EntityKind::Enemy(enemy))
    }
}
