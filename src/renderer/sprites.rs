//! Placeholder sprites: every entity is drawn as colored primitives

use glam::{IVec2, UVec2, Vec2};

use super::vertex::{colors, faded};
use super::{Color, RenderSurface};
use crate::consts::TILE_SIZE;
use crate::sim::camera::Camera;
use crate::sim::enemies::{Behavior, EnemyKind};
use crate::sim::entity::{Entity, EntityKind};
use crate::sim::items::{BlockKind, ItemKind};
use crate::sim::level::{Level, TileKind};
use crate::sim::player::{Player, PowerLevel};

/// Invulnerable players blink at this rate (toggles per second)
const BLINK_RATE: f32 = 10.0;

pub fn tile_color(tile: TileKind) -> Color {
    match tile {
        TileKind::Ground => colors::GROUND,
        TileKind::Grass => colors::GRASS,
        TileKind::Stone => colors::STONE,
        TileKind::Pipe => colors::DARK_GREEN,
        TileKind::Brick => colors::BRICK,
        TileKind::Question => colors::QUESTION,
        TileKind::UsedQuestion => colors::USED_BLOCK,
        TileKind::Decoration => colors::YELLOW,
        TileKind::Empty => colors::DARK_GRAY,
    }
}

fn enemy_color(kind: EnemyKind) -> Color {
    match kind {
        EnemyKind::Goomba => colors::BROWN,
        EnemyKind::Koopa => colors::GREEN,
        EnemyKind::Piranha => colors::RED,
        EnemyKind::Flyer => colors::ORANGE,
    }
}

/// Draw one entity at its camera-relative position
pub fn draw_entity(surface: &mut dyn RenderSurface, camera: &Camera, entity: &Entity) {
    let body = &entity.body;
    let pos = camera.world_to_screen(body.pos);
    let size = body.size;

    match &entity.kind {
        EntityKind::Platform(platform) => {
            surface.fill_rect(pos, size, tile_color(platform.tile));
            surface.outline_rect(pos, size, colors::BLACK);
        }
        EntityKind::Block(block) => {
            let pos = camera.world_to_screen(body.pos + Vec2::new(0.0, block.bump_offset()));
            let color = match block.kind {
                BlockKind::Brick => colors::BRICK,
                BlockKind::Question { .. } if block.used => colors::USED_BLOCK,
                BlockKind::Question { .. } => colors::QUESTION,
            };
            surface.fill_rect(pos, size, color);
            surface.outline_rect(pos, size, colors::BLACK);
            if matches!(block.kind, BlockKind::Question { .. }) && !block.used {
                surface.text(pos + IVec2::new(11, 6), "?", 20, colors::WHITE);
            }
        }
        EntityKind::Player(_) => {
            let invulnerable = entity.components.health().map_or(0.0, |h| h.invulnerable);
            if invulnerable > 0.0 && ((invulnerable * BLINK_RATE) as u32) % 2 == 1 {
                return;
            }
            let color = match Player::power(&entity.components) {
                PowerLevel::Fire => colors::PLAYER_FIRE,
                _ => colors::PLAYER,
            };
            surface.fill_rect(pos, size, color);
            // eye on the facing side
            let eye_x = if body.facing.sign() > 0.0 { size.x as i32 - 10 } else { 6 };
            surface.fill_rect(pos + IVec2::new(eye_x, 6), UVec2::splat(4), colors::BLACK);
        }
        EntityKind::Enemy(enemy) => {
            let mut color = enemy_color(enemy.kind);
            if enemy.is_dying() {
                color = faded(color, 0.6);
            }
            surface.fill_rect(pos, size, color);
            if let Behavior::Koopa(koopa) = &enemy.behavior {
                if !koopa.is_sliding() && !koopa.is_inert() {
                    surface.fill_rect(pos, UVec2::new(size.x, 6), colors::YELLOW);
                }
            }
            surface.outline_rect(pos, size, colors::BLACK);
        }
        EntityKind::Coin(_) => {
            let radius = size.x as f32 * 0.5;
            let center = camera.world_to_screen(body.center());
            surface.fill_circle(center, radius, colors::GOLD);
            surface.ring(center, radius, 2.0, colors::ORANGE);
        }
        EntityKind::PowerUp(item) => {
            let color = match item.item {
                ItemKind::FireFlower => colors::ORANGE,
                _ => colors::RED,
            };
            surface.fill_rect(pos, size, color);
            surface.fill_rect(
                pos + IVec2::new(0, size.y as i32 / 2),
                UVec2::new(size.x, size.y / 2),
                colors::WHITE,
            );
        }
        EntityKind::Fireball(_) => {
            let center = camera.world_to_screen(body.center());
            surface.fill_circle(center, size.x as f32 * 0.5, colors::ORANGE);
        }
        EntityKind::Goal(goal) => {
            surface.fill_rect(pos + IVec2::new(size.x as i32 / 2 - 2, 0), UVec2::new(4, size.y), colors::WHITE);
            let flag = if goal.reached { colors::GOLD } else { colors::GREEN };
            let drop = if goal.reached { size.y as i32 - 30 } else { 4 };
            surface.fill_rect(pos + IVec2::new(size.x as i32 / 2 + 2, drop), UVec2::new(24, 16), flag);
        }
    }
}

/// Sky and the non-solid decoration tiles inside the view
pub fn draw_level(surface: &mut dyn RenderSurface, camera: &Camera, level: &Level) {
    surface.clear(colors::SKY);
    let view = camera.visible_rect();
    let first = level.world_to_grid(view.min).max(IVec2::ZERO);
    let last = level.world_to_grid(view.max()) + IVec2::ONE;
    for row in first.y..last.y.min(level.height() as i32) {
        for col in first.x..last.x.min(level.width() as i32) {
            let (row, col) = (row as usize, col as usize);
            if level.get_tile(row, col) == Some(TileKind::Decoration) {
                let pos = camera.world_to_screen(level.grid_to_world(row, col));
                let inset = TILE_SIZE / 4;
                surface.fill_rect(
                    pos + IVec2::splat(inset as i32),
                    UVec2::splat(TILE_SIZE - 2 * inset),
                    tile_color(TileKind::Decoration),
                );
            }
        }
    }
}

/// Heads-up display values
#[derive(Debug, Clone, PartialEq)]
pub struct Hud<'a> {
    pub level_name: &'a str,
    pub score: u64,
    pub coins: u32,
    pub lives: u32,
    pub time_remaining: f32,
}

pub fn draw_hud(surface: &mut dyn RenderSurface, hud: &Hud<'_>) {
    let width = surface.size().x as i32;
    surface.text(IVec2::new(16, 12), &format!("SCORE {:06}", hud.score), 24, colors::WHITE);
    surface.text(IVec2::new(width / 4, 12), &format!("COINS x{:02}", hud.coins), 24, colors::GOLD);
    surface.text(IVec2::new(width / 2, 12), &format!("WORLD {}", hud.level_name), 24, colors::WHITE);
    surface.text(
        IVec2::new(width * 3 / 4, 12),
        &format!("TIME {:03}", hud.time_remaining.max(0.0).ceil() as u32),
        24,
        colors::WHITE,
    );
    surface.text(IVec2::new(16, 40), &format!("LIVES x{}", hud.lives), 24, colors::WHITE);
}

/// Large centred line of text
pub fn draw_banner(surface: &mut dyn RenderSurface, y: i32, text: &str, size: u32, color: Color) {
    let width = surface.size().x as i32;
    // backends measure glyphs; assume ~0.5 em per char for centring
    let approx = (text.chars().count() as u32 * size / 2) as i32;
    surface.text(IVec2::new((width - approx) / 2, y), text, size, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{DrawCommand, DrawList};

    fn camera() -> Camera {
        Camera::new(Vec2::new(800.0, 600.0), 1.0)
    }

    #[test]
    fn invulnerable_player_blinks() {
        let mut player = Player::spawn(Vec2::new(10.0, 10.0), 3);
        let mut list = DrawList::new(UVec2::new(800, 600));
        draw_entity(&mut list, &camera(), &player);
        assert!(!list.commands().is_empty());

        player.components.health_mut().unwrap().invulnerable = 0.15;
        list.reset();
        draw_entity(&mut list, &camera(), &player);
        assert!(list.commands().is_empty());
    }

    #[test]
    fn bumped_block_is_drawn_raised() {
        let mut entity = crate::sim::items::Block::spawn(BlockKind::Brick, 0, 2);
        let EntityKind::Block(block) = &mut entity.kind else {
            unreachable!()
        };
        block.bump(false);
        let mut list = DrawList::new(UVec2::new(800, 600));
        let mut camera = camera();
        camera.pos = Vec2::new(0.0, -100.0);
        draw_entity(&mut list, &camera, &entity);
        assert!(matches!(
            list.commands()[0],
            DrawCommand::Rect { pos, .. } if pos == IVec2::new(64, 96)
        ));
    }

    #[test]
    fn decorations_inside_view_only() {
        let mut level = Level::new("t", 40, 5);
        level.set_tile(1, 1, TileKind::Decoration);
        level.set_tile(1, 39, TileKind::Decoration);
        let mut list = DrawList::new(UVec2::new(800, 600));
        draw_level(&mut list, &camera(), &level);
        let rects = list
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Rect { .. }))
            .count();
        assert_eq!(rects, 1);
    }
}
