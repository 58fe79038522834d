//! Tile-based levels
//!
//! A `Level` is a row-major tile grid plus declarative spawn lists. It owns no
//! entities; `entities()` is a factory consumed when a level is (re)loaded,
//! and produces the same entity set every time for the same data.

use std::collections::BTreeMap;

use glam::{IVec2, UVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::enemies::{EnemyKind, EnemySpawner};
use super::entity::Entity;
use super::geom::Aabb;
use super::items::{Block, BlockKind, GoalFlag, ItemKind};
use crate::consts::{LEVEL_TIME_LIMIT, TILE_SIZE};
use crate::error::{GameError, Result};

/// Number of built-in levels
pub const LEVEL_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    #[default]
    Empty,
    Ground,
    Grass,
    Stone,
    Pipe,
    Brick,
    Question,
    UsedQuestion,
    Decoration,
}

impl TileKind {
    pub fn from_char(c: char) -> Option<TileKind> {
        Some(match c {
            '.' => TileKind::Empty,
            'G' => TileKind::Ground,
            'g' => TileKind::Grass,
            'S' => TileKind::Stone,
            'P' => TileKind::Pipe,
            'B' => TileKind::Brick,
            '?' => TileKind::Question,
            'U' => TileKind::UsedQuestion,
            '*' => TileKind::Decoration,
            _ => return None,
        })
    }

    pub fn to_char(self) -> char {
        match self {
            TileKind::Empty => '.',
            TileKind::Ground => 'G',
            TileKind::Grass => 'g',
            TileKind::Stone => 'S',
            TileKind::Pipe => 'P',
            TileKind::Brick => 'B',
            TileKind::Question => '?',
            TileKind::UsedQuestion => 'U',
            TileKind::Decoration => '*',
        }
    }

    /// Tiles merged into static platform geometry. Bricks and question
    /// blocks become `Block` entities instead.
    pub fn is_static_solid(self) -> bool {
        matches!(
            self,
            TileKind::Ground | TileKind::Grass | TileKind::Stone | TileKind::Pipe | TileKind::UsedQuestion
        )
    }

    pub fn is_block(self) -> bool {
        matches!(self, TileKind::Brick | TileKind::Question)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub pos: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemSpawn {
    pub kind: ItemKind,
    pub pos: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockSpawn {
    pub row: usize,
    pub col: usize,
    pub contents: ItemKind,
}

/// On-disk level format. `tiles` holds one string per row, one char per tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    pub name: String,
    pub tiles: Vec<String>,
    pub spawn: Vec2,
    /// Ground point under the goal flag
    pub goal: Vec2,
    #[serde(default = "default_time_limit")]
    pub time_limit: f32,
    #[serde(default)]
    pub enemies: Vec<EnemySpawn>,
    #[serde(default)]
    pub items: Vec<ItemSpawn>,
    /// Question block contents; unlisted question blocks hold a coin
    #[serde(default)]
    pub blocks: Vec<BlockSpawn>,
}

fn default_time_limit() -> f32 {
    LEVEL_TIME_LIMIT
}

#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub name: String,
    width: usize,
    height: usize,
    tiles: Vec<TileKind>,
    pub spawn_point: Vec2,
    pub goal_point: Vec2,
    pub time_limit: f32,
    pub enemy_spawns: Vec<EnemySpawn>,
    pub item_spawns: Vec<ItemSpawn>,
    block_contents: BTreeMap<(usize, usize), ItemKind>,
}

impl Level {
    /// Empty level of `width` x `height` tiles
    pub fn new(name: impl Into<String>, width: usize, height: usize) -> Self {
        let pixel_width = (width as u32 * TILE_SIZE) as f32;
        Self {
            name: name.into(),
            width,
            height,
            tiles: vec![TileKind::Empty; width * height],
            spawn_point: Vec2::new(100.0, 100.0),
            goal_point: Vec2::new(pixel_width - 100.0, 100.0),
            time_limit: LEVEL_TIME_LIMIT,
            enemy_spawns: Vec::new(),
            item_spawns: Vec::new(),
            block_contents: BTreeMap::new(),
        }
    }

    /// Width in tiles
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in tiles
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(
            (self.width as u32 * TILE_SIZE) as f32,
            (self.height as u32 * TILE_SIZE) as f32,
        )
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(Vec2::ZERO, self.pixel_size())
    }

    /// Out-of-range cells are ignored
    pub fn set_tile(&mut self, row: usize, col: usize, kind: TileKind) {
        if row < self.height && col < self.width {
            self.tiles[row * self.width + col] = kind;
        }
    }

    pub fn get_tile(&self, row: usize, col: usize) -> Option<TileKind> {
        (row < self.height && col < self.width).then(|| self.tiles[row * self.width + col])
    }

    pub fn tile_at_pixel(&self, pos: Vec2) -> Option<TileKind> {
        let cell = self.world_to_grid(pos);
        if cell.x < 0 || cell.y < 0 {
            return None;
        }
        self.get_tile(cell.y as usize, cell.x as usize)
    }

    /// (col, row) of the tile containing `pos`; may lie outside the grid
    pub fn world_to_grid(&self, pos: Vec2) -> IVec2 {
        (pos / TILE_SIZE as f32).floor().as_ivec2()
    }

    /// Top-left corner of a tile
    pub fn grid_to_world(&self, row: usize, col: usize) -> Vec2 {
        UVec2::new(col as u32, row as u32).as_vec2() * TILE_SIZE as f32
    }

    pub fn add_enemy_spawn(&mut self, kind: EnemyKind, x: f32, y: f32) {
        self.enemy_spawns.push(EnemySpawn {
            kind,
            pos: Vec2::new(x, y),
        });
    }

    pub fn add_item_spawn(&mut self, kind: ItemKind, x: f32, y: f32) {
        self.item_spawns.push(ItemSpawn {
            kind,
            pos: Vec2::new(x, y),
        });
    }

    /// Place a question block holding `contents`
    pub fn set_question_block(&mut self, row: usize, col: usize, contents: ItemKind) {
        self.set_tile(row, col, TileKind::Question);
        self.block_contents.insert((row, col), contents);
    }

    pub fn block_contents(&self, row: usize, col: usize) -> ItemKind {
        self.block_contents
            .get(&(row, col))
            .copied()
            .unwrap_or(ItemKind::Coin)
    }

    /// Number of tiles that become static platform geometry
    pub fn static_solid_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_static_solid()).count()
    }

    /// Merge static solid tiles into as few platforms as possible.
    ///
    /// Each row is split into runs of the same tile kind; a run continues a
    /// rectangle from the row above when start, end and kind all match.
    pub fn generate_platforms(&self) -> Vec<Entity> {
        #[derive(Debug)]
        struct Run {
            start: usize,
            end: usize,
            kind: TileKind,
            top: usize,
            rows: usize,
        }

        let mut open: Vec<Run> = Vec::new();
        let mut done: Vec<Run> = Vec::new();
        for row in 0..self.height {
            let mut next = Vec::new();
            for (start, end, kind) in self.row_runs(row) {
                match open
                    .iter()
                    .position(|r| r.start == start && r.end == end && r.kind == kind)
                {
                    Some(i) => {
                        let mut run = open.swap_remove(i);
                        run.rows += 1;
                        next.push(run);
                    }
                    None => next.push(Run {
                        start,
                        end,
                        kind,
                        top: row,
                        rows: 1,
                    }),
                }
            }
            done.append(&mut open);
            open = next;
        }
        done.append(&mut open);
        done.sort_by_key(|r| (r.top, r.start));

        let tile = TILE_SIZE as f32;
        done.into_iter()
            .map(|r| {
                let rect = Aabb::from_xywh(
                    r.start as f32 * tile,
                    r.top as f32 * tile,
                    (r.end - r.start) as f32 * tile,
                    r.rows as f32 * tile,
                );
                Entity::platform(rect, r.kind)
            })
            .collect()
    }

    /// Half-open column runs `[start, end)` of static solids in `row`
    fn row_runs(&self, row: usize) -> Vec<(usize, usize, TileKind)> {
        let tiles = &self.tiles[row * self.width..(row + 1) * self.width];
        let mut runs = Vec::new();
        let mut col = 0;
        while col < tiles.len() {
            let kind = tiles[col];
            if !kind.is_static_solid() {
                col += 1;
                continue;
            }
            let start = col;
            while col < tiles.len() && tiles[col] == kind {
                col += 1;
            }
            runs.push((start, col, kind));
        }
        runs
    }

    /// One `Block` entity per brick or question tile
    pub fn generate_blocks(&self) -> Vec<Entity> {
        let mut blocks = Vec::new();
        for row in 0..self.height {
            for col in 0..self.width {
                let kind = match self.tiles[row * self.width + col] {
                    TileKind::Brick => BlockKind::Brick,
                    TileKind::Question => BlockKind::Question {
                        contents: self.block_contents(row, col),
                    },
                    _ => continue,
                };
                blocks.push(Block::spawn(kind, row, col));
            }
        }
        blocks
    }

    /// Every entity the level populates, player excluded
    pub fn entities(&self) -> Vec<Entity> {
        let mut entities = self.generate_platforms();
        entities.extend(self.generate_blocks());
        entities.extend(
            self.enemy_spawns
                .iter()
                .map(|s| EnemySpawner::create(s.kind, s.pos.x, s.pos.y)),
        );
        entities.extend(self.item_spawns.iter().map(|s| s.kind.spawn(s.pos.x, s.pos.y)));
        entities.push(GoalFlag::spawn(self.goal_point));
        entities
    }

    pub fn from_json(text: &str) -> Result<Level> {
        let data: LevelData =
            serde_json::from_str(text).map_err(|e| GameError::InvalidLevel(e.to_string()))?;
        Level::from_data(data)
    }

    pub fn from_data(data: LevelData) -> Result<Level> {
        let height = data.tiles.len();
        let width = data.tiles.first().map_or(0, |r| r.chars().count());
        if width == 0 || height == 0 {
            return Err(GameError::InvalidLevel(format!("level `{}` has no tiles", data.name)));
        }
        if !(data.time_limit > 0.0) {
            return Err(GameError::InvalidLevel(format!(
                "level `{}` has non-positive time limit {}",
                data.name, data.time_limit
            )));
        }

        let mut level = Level::new(data.name, width, height);
        for (row, line) in data.tiles.iter().enumerate() {
            if line.chars().count() != width {
                return Err(GameError::InvalidLevel(format!(
                    "row {} is {} tiles wide, expected {}",
                    row,
                    line.chars().count(),
                    width
                )));
            }
            for (col, c) in line.chars().enumerate() {
                let kind = TileKind::from_char(c).ok_or_else(|| {
                    GameError::InvalidLevel(format!("unknown tile `{}` at row {} col {}", c, row, col))
                })?;
                level.set_tile(row, col, kind);
            }
        }

        let bounds = level.bounds();
        let inside = |what: &str, p: Vec2| -> Result<()> {
            // goal and spawn bases may sit exactly on the bottom edge
            if p.x < 0.0 || p.y < 0.0 || p.x > bounds.right() || p.y > bounds.bottom() {
                return Err(GameError::InvalidLevel(format!("{} {} outside level", what, p)));
            }
            Ok(())
        };
        inside("spawn", data.spawn)?;
        inside("goal", data.goal)?;
        for spawn in &data.enemies {
            inside("enemy", spawn.pos)?;
        }
        for spawn in &data.items {
            inside("item", spawn.pos)?;
        }
        for block in &data.blocks {
            if level.get_tile(block.row, block.col) != Some(TileKind::Question) {
                return Err(GameError::InvalidLevel(format!(
                    "block contents at row {} col {} without a question tile",
                    block.row, block.col
                )));
            }
            level.block_contents.insert((block.row, block.col), block.contents);
        }

        level.spawn_point = data.spawn;
        level.goal_point = data.goal;
        level.time_limit = data.time_limit;
        level.enemy_spawns = data.enemies;
        level.item_spawns = data.items;
        Ok(level)
    }

    pub fn to_data(&self) -> LevelData {
        LevelData {
            name: self.name.clone(),
            tiles: self
                .tiles
                .chunks(self.width)
                .map(|row| row.iter().map(|t| t.to_char()).collect())
                .collect(),
            spawn: self.spawn_point,
            goal: self.goal_point,
            time_limit: self.time_limit,
            enemies: self.enemy_spawns.clone(),
            items: self.item_spawns.clone(),
            blocks: self
                .block_contents
                .iter()
                .map(|(&(row, col), &contents)| BlockSpawn { row, col, contents })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_data()).map_err(|e| GameError::InvalidLevel(e.to_string()))
    }
}

/// Built-in levels
pub struct LevelBuilder;

impl LevelBuilder {
    /// 50x25 tile test level
    pub fn test_level() -> Level {
        let tile = TILE_SIZE as f32;
        let mut level = Level::new("1-1", 50, 25);

        for row in 20..25 {
            for col in 0..50 {
                level.set_tile(row, col, TileKind::Ground);
            }
        }
        for col in 10..15 {
            level.set_tile(15, col, TileKind::Grass);
        }
        for col in 20..25 {
            level.set_tile(12, col, TileKind::Stone);
        }
        for col in 30..35 {
            level.set_tile(18, col, TileKind::Grass);
        }
        // low enough to jump over
        for row in 16..20 {
            level.set_tile(row, 40, TileKind::Stone);
        }

        level.set_question_block(16, 5, ItemKind::Coin);
        level.set_question_block(16, 6, ItemKind::Mushroom);
        level.set_tile(16, 7, TileKind::Brick);
        level.set_tile(19, 2, TileKind::Decoration);

        level.spawn_point = Vec2::new(50.0, 19.0 * tile);
        level.goal_point = Vec2::new(45.0 * tile, 20.0 * tile);

        level.add_enemy_spawn(EnemyKind::Goomba, 300.0, 19.0 * tile);
        level.add_enemy_spawn(EnemyKind::Koopa, 600.0, 19.0 * tile);
        level.add_enemy_spawn(EnemyKind::Goomba, 900.0, 19.0 * tile);

        level.add_item_spawn(ItemKind::Mushroom, 400.0, 14.0 * tile);
        level.add_item_spawn(ItemKind::FireFlower, 780.0, 11.0 * tile);
        for i in 0..5 {
            level.add_item_spawn(ItemKind::Coin, 200.0 + i as f32 * 100.0, 19.0 * tile);
        }
        level
    }

    pub fn second_level() -> Result<Level> {
        Level::from_json(include_str!("levels/second.json"))
    }

    /// Built-in level by zero-based index
    pub fn load(index: usize) -> Result<Level> {
        match index {
            0 => Ok(Self::test_level()),
            1 => Self::second_level(),
            _ => Err(GameError::InvalidLevel(format!("no level with index {}", index))),
        }
    }
}
