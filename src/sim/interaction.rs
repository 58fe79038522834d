//! Entity-vs-entity gameplay interactions
//!
//! Runs once per frame after every entity has moved. Pairs are evaluated in
//! ascending creation order, so when the player overlaps several enemies in one
//! frame the oldest is handled first and later ones see its consequences (a
//! stomp bounce, a respawn).

use glam::Vec2;

use super::arena::EntityId;
use super::entity::{Body, Entity, EntityKind};
use super::enemies::{Enemy, STOMP_POINTS, StompOutcome};
use super::frame::{FrameContext, GameEvent};
use super::geom::Aabb;
use super::items::{BRICK_POINTS, BumpOutcome, ItemKind, POWERUP_POINTS, PowerUpItem, POWERUP_SIZE};
use super::level::TileKind;
use super::manager::EntityManager;
use super::physics::{CollisionSide, collision_side};
use super::player::{DamageOutcome, Player, PowerLevel};
use crate::consts::TILE_SIZE;

/// Points for an enemy killed by a shell or fireball
pub const KILL_POINTS: u64 = 200;
pub const KICK_POINTS: u64 = 400;

/// Resolve every interaction for this frame
pub fn resolve(entities: &mut EntityManager, player: EntityId, ctx: &mut FrameContext<'_>) {
    resolve_ceiling_hits(entities, player, ctx);
    resolve_player_contacts(entities, player, ctx);
    resolve_hazards(entities, ctx);
}

/// Blocks the player hit from below. Only the block nearest the player's
/// center reacts.
fn resolve_ceiling_hits(entities: &mut EntityManager, player: EntityId, ctx: &mut FrameContext<'_>) {
    let hits = std::mem::take(&mut ctx.ceiling_hits);
    let Some(mut p) = entities.take(player) else {
        return;
    };
    let center = p.body.center().x;
    let nearest = hits
        .iter()
        .copied()
        .filter(|&id| matches!(entities.get(id).map(|e| &e.kind), Some(EntityKind::Block(_))))
        .min_by(|&a, &b| {
            let da = entities.get(a).map_or(f32::MAX, |e| (e.body.center().x - center).abs());
            let db = entities.get(b).map_or(f32::MAX, |e| (e.body.center().x - center).abs());
            da.total_cmp(&db)
        });
    if let Some(block_id) = nearest {
        bump_block(entities, block_id, &mut p, ctx);
    }
    entities.restore(player, p);
}

fn bump_block(entities: &mut EntityManager, block_id: EntityId, player: &mut Entity, ctx: &mut FrameContext<'_>) {
    let power = Player::power(&player.components);
    let Some(entity) = entities.get_mut(block_id) else {
        return;
    };
    let Entity { body, kind, .. } = entity;
    let EntityKind::Block(block) = kind else {
        return;
    };
    let (row, col) = block.cell;
    let pos = body.pos;
    match block.bump(power >= PowerLevel::Big) {
        BumpOutcome::Dispense(item) => {
            ctx.emit(GameEvent::BlockBumped { pos });
            ctx.emit(GameEvent::TileChanged {
                row,
                col,
                kind: TileKind::UsedQuestion,
            });
            match item {
                ItemKind::Coin => collect_coin(player, pos, ctx),
                ItemKind::Mushroom | ItemKind::FireFlower => {
                    // a small player gets a mushroom even from a flower block
                    let item = if power == PowerLevel::Small {
                        ItemKind::Mushroom
                    } else {
                        item
                    };
                    let offset = (TILE_SIZE - POWERUP_SIZE) as f32 * 0.5;
                    ctx.spawn(PowerUpItem::spawn(
                        item,
                        pos.x + offset,
                        pos.y - POWERUP_SIZE as f32,
                    ));
                }
            }
        }
        BumpOutcome::Break => {
            body.destroy();
            ctx.emit(GameEvent::BrickBroken { pos });
            ctx.emit(GameEvent::TileChanged {
                row,
                col,
                kind: TileKind::Empty,
            });
            add_score(player, BRICK_POINTS);
        }
        BumpOutcome::Bounce => ctx.emit(GameEvent::BlockBumped { pos }),
        BumpOutcome::Nothing => {}
    }
}

fn resolve_player_contacts(entities: &mut EntityManager, player: EntityId, ctx: &mut FrameContext<'_>) {
    let Some(mut p) = entities.take(player) else {
        return;
    };
    let ids: Vec<EntityId> = entities.ids().to_vec();
    for id in ids {
        if !p.body.active {
            break;
        }
        if id == player {
            continue;
        }
        let Some(other) = entities.get_mut(id) else {
            continue;
        };
        if !other.body.active {
            continue;
        }
        let Some(side) = collision_side(&p.aabb(), &other.aabb()) else {
            continue;
        };
        let Entity { body, kind, .. } = other;
        match kind {
            EntityKind::Enemy(enemy) => {
                if enemy.is_dying() {
                    continue;
                }
                let stomp = side == CollisionSide::Bottom && p.body.vel.y > 0.0 && enemy.stompable();
                if stomp {
                    let outcome = enemy.stomp(body, p.body.center().x);
                    p.body.pos.y = body.pos.y - p.body.size.y as f32;
                    p.body.vel.y = ctx.config.physics.stomp_bounce;
                    let points = match outcome {
                        StompOutcome::Kicked => KICK_POINTS,
                        _ => STOMP_POINTS,
                    };
                    add_score(&mut p, points);
                    ctx.emit(GameEvent::Stomped {
                        pos: body.center(),
                        points,
                    });
                } else if enemy.kickable() {
                    enemy.kick(body, p.body.center().x);
                    add_score(&mut p, KICK_POINTS);
                    ctx.emit(GameEvent::ShellKicked { pos: body.center() });
                } else if enemy.harmful() {
                    damage_player(&mut p, ctx);
                }
            }
            EntityKind::Coin(_) => {
                body.destroy();
                collect_coin(&mut p, body.center(), ctx);
            }
            EntityKind::PowerUp(item) => {
                body.destroy();
                let level = match item.item {
                    ItemKind::FireFlower => PowerLevel::Fire,
                    _ => PowerLevel::Big,
                };
                let Entity {
                    body: pb,
                    components,
                    ..
                } = &mut p;
                Player::power_up(pb, components, level);
                add_score(&mut p, POWERUP_POINTS);
                ctx.emit(GameEvent::PowerUpCollected {
                    pos: p.body.center(),
                    item: item.item,
                });
            }
            EntityKind::Goal(goal) => {
                if goal.reach() {
                    ctx.emit(GameEvent::GoalReached { pos: body.center() });
                }
            }
            EntityKind::Player(_)
            | EntityKind::Platform(_)
            | EntityKind::Block(_)
            | EntityKind::Fireball(_) => {}
        }
    }
    entities.restore(player, p);
}

fn damage_player(p: &mut Entity, ctx: &mut FrameContext<'_>) {
    let Entity {
        body,
        kind,
        components,
    } = p;
    let EntityKind::Player(player) = kind else {
        return;
    };
    match player.take_damage(body, components) {
        DamageOutcome::Ignored => {}
        DamageOutcome::PowerLost => ctx.emit(GameEvent::PlayerDamaged),
        DamageOutcome::LifeLost => ctx.emit(GameEvent::LifeLost {
            lives_left: components.inventory().map_or(0, |i| i.lives),
        }),
        DamageOutcome::OutOfLives => ctx.emit(GameEvent::PlayerDied),
    }
}

fn collect_coin(p: &mut Entity, pos: Vec2, ctx: &mut FrameContext<'_>) {
    let Some(inventory) = p.components.inventory_mut() else {
        return;
    };
    let extra_life = inventory.add_coin();
    ctx.emit(GameEvent::CoinCollected { pos });
    if extra_life {
        ctx.emit(GameEvent::ExtraLife);
    }
}

fn add_score(p: &mut Entity, points: u64) {
    if let Some(inventory) = p.components.inventory_mut() {
        inventory.add_score(points);
    }
}

/// Sliding shells and fireballs against enemies
fn resolve_hazards(entities: &mut EntityManager, ctx: &mut FrameContext<'_>) {
    let view = entities.view();
    let hazards: Vec<(EntityId, Aabb, bool)> = view
        .iter()
        .filter_map(|(id, e)| {
            if !e.body.active {
                return None;
            }
            match &e.kind {
                EntityKind::Enemy(enemy) if enemy.is_sliding_shell() => Some((id, e.aabb(), false)),
                EntityKind::Fireball(_) => Some((id, e.aabb(), true)),
                _ => None,
            }
        })
        .collect();
    if hazards.is_empty() {
        return;
    }

    let ids: Vec<EntityId> = entities.ids().to_vec();
    for (hazard, rect, consumed) in hazards {
        for &id in &ids {
            if id == hazard {
                continue;
            }
            let Some(target) = entities.get_mut(id) else {
                continue;
            };
            let Entity { body, kind, .. } = target;
            let EntityKind::Enemy(enemy) = kind else {
                continue;
            };
            if !body.active || enemy.is_dying() || !body.visible || !body.aabb().intersects(&rect) {
                continue;
            }
            kill(enemy, body, ctx);
            if consumed {
                if let Some(fireball) = entities.get_mut(hazard) {
                    fireball.body.destroy();
                }
                break;
            }
        }
    }
}

fn kill(enemy: &mut Enemy, body: &mut Body, ctx: &mut FrameContext<'_>) {
    enemy.die(body);
    ctx.emit(GameEvent::EnemyKilled {
        pos: body.center(),
        points: KILL_POINTS,
    });
}
