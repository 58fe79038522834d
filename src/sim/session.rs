//! One playthrough of a level sequence
//!
//! Owns the loaded level and everything simulated on it. The frame order is
//! fixed: entity updates, interactions, spawns committed, game events applied,
//! effects, camera. Removal of dead entities waits for `end_frame`, which the
//! engine calls after rendering.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::EntityId;
use super::camera::Camera;
use super::effects::EffectsManager;
use super::entity::{Entity, EntityKind};
use super::frame::{FrameContext, GameEvent};
use super::interaction;
use super::items::{COIN_POINTS, POWERUP_POINTS};
use super::level::{LEVEL_COUNT, Level, LevelBuilder};
use super::manager::EntityManager;
use super::player::{DamageOutcome, Intent, Player};
use crate::config::GameConfig;
use crate::error::Result;
use crate::renderer::sprites::{self, Hud};
use crate::renderer::vertex::colors;
use crate::renderer::RenderSurface;

/// "Ready!" freeze before control is handed over
pub const INTRO_TIME: f32 = 1.0;
/// Celebration between touching the flag and the next level
pub const COMPLETE_TIME: f32 = 2.0;
/// How far below the level the player may fall before losing a life
pub const FALL_MARGIN: f32 = 64.0;

/// Player progress carried between levels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub score: u64,
    pub coins: u32,
    pub lives: u32,
    pub levels_cleared: u32,
    /// Share of `score` earned from time left on the clock
    pub time_bonus: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    /// Celebration finished; the engine should advance
    LevelComplete,
    /// Out of lives
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Intro { timer: f32 },
    Running,
    Complete { timer: f32 },
    Finished,
    Dead,
}

pub struct Session {
    level_index: usize,
    level: Level,
    entities: EntityManager,
    camera: Camera,
    effects: EffectsManager,
    player: EntityId,
    time_remaining: f32,
    phase: Phase,
    /// Last known stats; survives the player entity being swept
    stats: PlayerStats,
    events: Vec<GameEvent>,
}

impl Session {
    /// Fresh game on the first level
    pub fn new(config: &GameConfig) -> Result<Self> {
        let stats = PlayerStats {
            lives: config.starting_lives,
            ..Default::default()
        };
        Self::start(config, 0, stats)
    }

    /// Load built-in level `index` with the given player progress
    pub fn start(config: &GameConfig, index: usize, stats: PlayerStats) -> Result<Self> {
        let level = LevelBuilder::load(index)?;
        Self::with_level(config, index, level, stats)
    }

    pub fn with_level(config: &GameConfig, index: usize, level: Level, stats: PlayerStats) -> Result<Self> {
        let mut camera = Camera::new(config.viewport(), config.camera_smoothing);
        camera.set_bounds(level.pixel_size());
        let mut entities = EntityManager::new();
        let player = populate(&mut entities, &level, index, stats)?;
        if let Some(p) = entities.get(player) {
            camera.snap_to(p.body.center());
        }
        Ok(Self {
            level_index: index,
            time_remaining: level.time_limit,
            level,
            entities,
            camera,
            effects: EffectsManager::new(config.effects_seed, config.max_particles),
            player,
            phase: Phase::Intro { timer: INTRO_TIME },
            stats,
            events: Vec::new(),
        })
    }

    fn reload(&mut self) -> Result<()> {
        self.effects.clear();
        self.player = populate(&mut self.entities, &self.level, self.level_index, self.stats)?;
        self.camera.set_bounds(self.level.pixel_size());
        if let Some(p) = self.entities.get(self.player) {
            self.camera.snap_to(p.body.center());
        }
        self.time_remaining = self.level.time_limit;
        self.phase = Phase::Intro { timer: INTRO_TIME };
        Ok(())
    }

    /// Reload the current level from its spawn data. Progress made in the
    /// level (score, coins, broken blocks) is discarded.
    pub fn restart(&mut self, stats: PlayerStats) -> Result<()> {
        self.level = LevelBuilder::load(self.level_index)?;
        self.stats = stats;
        self.reload()
    }

    /// Move on to the next built-in level. Returns false after the last one.
    pub fn advance(&mut self) -> Result<bool> {
        let next = self.level_index + 1;
        if next >= LEVEL_COUNT {
            return Ok(false);
        }
        self.level = LevelBuilder::load(next)?;
        self.level_index = next;
        self.reload()?;
        Ok(true)
    }

    pub fn handle_input(&mut self, intent: Intent) {
        if self.phase != Phase::Running {
            return;
        }
        if let Some(Entity {
            kind: EntityKind::Player(player),
            ..
        }) = self.entities.get_mut(self.player)
        {
            player.handle_input(intent);
        }
    }

    /// Advance one frame
    pub fn update(&mut self, dt: f32, config: &GameConfig) -> SessionStatus {
        self.events.clear();
        match self.phase {
            Phase::Intro { timer } => {
                let timer = timer - dt;
                self.phase = if timer <= 0.0 {
                    Phase::Running
                } else {
                    Phase::Intro { timer }
                };
            }
            Phase::Running => self.step_world(dt, config),
            Phase::Complete { timer } => {
                let timer = timer - dt;
                if timer <= 0.0 {
                    self.finish_level(config);
                } else {
                    self.phase = Phase::Complete { timer };
                }
            }
            Phase::Finished | Phase::Dead => {}
        }

        self.effects.update(dt);
        if let Some(p) = self.entities.get(self.player) {
            self.camera.follow(p.body.center(), dt);
        }
        self.refresh_stats();

        match self.phase {
            Phase::Finished => SessionStatus::LevelComplete,
            Phase::Dead => SessionStatus::GameOver,
            _ => SessionStatus::Running,
        }
    }

    fn step_world(&mut self, dt: f32, config: &GameConfig) {
        let mut ctx = FrameContext::new(config);
        self.entities.update(dt, &mut ctx);
        interaction::resolve(&mut self.entities, self.player, &mut ctx);
        self.entities.commit_spawns(&mut ctx);
        self.check_bounds(&mut ctx);
        self.tick_timer(dt, &mut ctx);

        let events = std::mem::take(&mut ctx.events);
        for event in &events {
            self.apply_event(event);
        }
        self.events = events;
    }

    /// Keep the player inside the level horizontally; falling out the bottom
    /// costs a life.
    fn check_bounds(&mut self, ctx: &mut FrameContext<'_>) {
        let size = self.level.pixel_size();
        let Some(Entity {
            body,
            kind: EntityKind::Player(player),
            components,
            ..
        }) = self.entities.get_mut(self.player)
        else {
            return;
        };
        if !body.active {
            return;
        }
        let max_x = (size.x - body.size.x as f32).max(0.0);
        if body.pos.x < 0.0 || body.pos.x > max_x {
            body.pos.x = body.pos.x.clamp(0.0, max_x);
            body.vel.x = 0.0;
        }
        if body.pos.y > size.y + FALL_MARGIN {
            log::debug!("player fell out of level at x={}", body.pos.x);
            let outcome = player.lose_life(body, components);
            emit_life_outcome(outcome, components.inventory().map_or(0, |i| i.lives), ctx);
        }
    }

    fn tick_timer(&mut self, dt: f32, ctx: &mut FrameContext<'_>) {
        self.time_remaining -= dt;
        if self.time_remaining > 0.0 {
            return;
        }
        ctx.emit(GameEvent::TimeUp);
        self.time_remaining = self.level.time_limit;
        if let Some(Entity {
            body,
            kind: EntityKind::Player(player),
            components,
            ..
        }) = self.entities.get_mut(self.player)
        {
            let outcome = player.lose_life(body, components);
            emit_life_outcome(outcome, components.inventory().map_or(0, |i| i.lives), ctx);
        }
    }

    fn apply_event(&mut self, event: &GameEvent) {
        let player_center = self
            .entities
            .get(self.player)
            .map_or(self.level.spawn_point, |p| p.body.center());
        match event {
            GameEvent::Stomped { pos, points } | GameEvent::EnemyKilled { pos, points } => {
                self.effects.create_score_popup(*pos - Vec2::new(0.0, 20.0), *points);
                self.effects.create_explosion(*pos, colors::ORANGE, 15);
            }
            GameEvent::PlayerDamaged => {
                self.effects.create_explosion(player_center, colors::RED, 10);
            }
            GameEvent::LifeLost { lives_left } => {
                log::info!("life lost, {} left", lives_left);
                self.camera.snap_to(player_center);
            }
            GameEvent::PlayerDied => {
                log::info!("out of lives");
                self.phase = Phase::Dead;
            }
            GameEvent::CoinCollected { pos } => {
                self.effects.create_score_popup(*pos, COIN_POINTS);
            }
            GameEvent::ExtraLife => {
                self.effects
                    .create_text_popup(player_center - Vec2::new(0.0, 40.0), "1UP".to_owned(), colors::GREEN);
            }
            GameEvent::PowerUpCollected { pos, .. } => {
                self.effects.create_powerup_effect(*pos);
                self.effects.create_score_popup(*pos - Vec2::new(0.0, 30.0), POWERUP_POINTS);
            }
            GameEvent::BrickBroken { pos } => {
                self.effects.create_explosion(*pos + Vec2::splat(16.0), colors::BRICK, 12);
            }
            GameEvent::TileChanged { row, col, kind } => {
                self.level.set_tile(*row, *col, *kind);
            }
            GameEvent::GoalReached { .. } => {
                if self.phase == Phase::Running {
                    log::info!("goal reached with {:.1}s left", self.time_remaining);
                    self.phase = Phase::Complete { timer: COMPLETE_TIME };
                }
            }
            GameEvent::Jumped
            | GameEvent::ShellKicked { .. }
            | GameEvent::BlockBumped { .. }
            | GameEvent::FireballThrown
            | GameEvent::LevelComplete { .. }
            | GameEvent::TimeUp => {}
        }
    }

    /// Award the time bonus once and report the level as done
    fn finish_level(&mut self, config: &GameConfig) {
        let bonus = self.time_bonus(config);
        let Some(p) = self.entities.get_mut(self.player) else {
            log::warn!("player missing at level end, no time bonus");
            self.phase = Phase::Finished;
            return;
        };
        if let Some(inventory) = p.components.inventory_mut() {
            inventory.add_score(bonus);
        }
        let pos = p.body.pos - Vec2::new(0.0, 50.0);
        self.effects.create_text_popup(pos, bonus.to_string(), colors::GREEN);
        self.stats.levels_cleared += 1;
        self.stats.time_bonus += bonus;
        self.events.push(GameEvent::LevelComplete { bonus });
        log::info!("level {} complete, time bonus {}", self.level_index, bonus);
        self.phase = Phase::Finished;
    }

    /// Bonus for the whole seconds left on the clock
    pub fn time_bonus(&self, config: &GameConfig) -> u64 {
        self.time_remaining.max(0.0) as u64 * config.time_bonus_per_second
    }

    fn refresh_stats(&mut self) {
        if let Some(inventory) = self
            .entities
            .get(self.player)
            .and_then(|p| p.components.inventory())
        {
            self.stats = PlayerStats {
                score: inventory.score,
                coins: inventory.coins,
                lives: inventory.lives,
                ..self.stats
            };
        }
    }

    pub fn render(&self, surface: &mut dyn RenderSurface) {
        sprites::draw_level(surface, &self.camera, &self.level);
        self.entities.render(surface, &self.camera);
        self.effects.render(surface, &self.camera);
        sprites::draw_hud(
            surface,
            &Hud {
                level_name: &self.level.name,
                score: self.stats.score,
                coins: self.stats.coins,
                lives: self.stats.lives,
                time_remaining: self.time_remaining,
            },
        );
        let middle = surface.size().y as i32 / 2;
        match self.phase {
            Phase::Intro { .. } => sprites::draw_banner(surface, middle, "Ready!", 36, colors::WHITE),
            Phase::Complete { .. } | Phase::Finished => {
                sprites::draw_banner(surface, middle, "Level Complete!", 36, colors::GREEN)
            }
            _ => {}
        }
    }

    /// Sweep entities destroyed this frame
    pub fn end_frame(&mut self) {
        let removed = self.entities.sweep();
        if removed > 0 {
            log::trace!("swept {} entities", removed);
        }
    }

    /// Events from the last `update`
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn stats(&self) -> PlayerStats {
        self.stats
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn effects(&self) -> &EffectsManager {
        &self.effects
    }

    pub fn player_id(&self) -> EntityId {
        self.player
    }

    pub fn player(&self) -> Option<&Entity> {
        self.entities.get(self.player)
    }

    pub fn time_remaining(&self) -> f32 {
        self.time_remaining
    }

    pub fn is_intro(&self) -> bool {
        matches!(self.phase, Phase::Intro { .. })
    }

    pub fn is_completing(&self) -> bool {
        matches!(self.phase, Phase::Complete { .. } | Phase::Finished)
    }
}

/// Fill `entities` with the level and a player carrying `stats`
fn populate(entities: &mut EntityManager, level: &Level, index: usize, stats: PlayerStats) -> Result<EntityId> {
    entities.clear();
    let mut player = Player::spawn(level.spawn_point, stats.lives);
    if let Some(inventory) = player.components.inventory_mut() {
        inventory.score = stats.score;
        inventory.coins = stats.coins;
    }
    let id = entities.add(player)?;
    let added = entities.extend(level.entities());
    log::info!(
        "level {} `{}` loaded: {} entities, {} platforms from {} solid tiles",
        index,
        level.name,
        added + 1,
        level.generate_platforms().len(),
        level.static_solid_count()
    );
    Ok(id)
}

fn emit_life_outcome(outcome: DamageOutcome, lives_left: u32, ctx: &mut FrameContext<'_>) {
    match outcome {
        DamageOutcome::LifeLost => ctx.emit(GameEvent::LifeLost { lives_left }),
        DamageOutcome::OutOfLives => ctx.emit(GameEvent::PlayerDied),
        DamageOutcome::PowerLost => ctx.emit(GameEvent::PlayerDamaged),
        DamageOutcome::Ignored => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::DrawList;
    use crate::sim::entity::EntityType;
    use crate::sim::items::{GoalFlag, ItemKind};
    use crate::sim::player::PowerLevel;

    const DT: f32 = 1.0 / 60.0;

    fn running(config: &GameConfig) -> Session {
        let mut session = Session::new(config).unwrap();
        while session.is_intro() {
            session.update(DT, config);
        }
        session
    }

    fn player_mut(session: &mut Session) -> &mut Entity {
        let id = session.player_id();
        session.entities_mut().get_mut(id).unwrap()
    }

    #[test]
    fn intro_freezes_the_world() {
        let config = GameConfig::default();
        let mut session = Session::new(&config).unwrap();
        let start = session.player().unwrap().body.pos;
        session.handle_input(Intent {
            direction: 1.0,
            ..Default::default()
        });
        for _ in 0..30 {
            session.update(DT, &config);
        }
        assert!(session.is_intro());
        assert_eq!(session.player().unwrap().body.pos, start);
        assert_eq!(session.time_remaining(), session.level().time_limit);
    }

    #[test]
    fn player_walks_after_intro() {
        let config = GameConfig::default();
        let mut session = running(&config);
        let start = session.player().unwrap().body.pos.x;
        for _ in 0..30 {
            session.handle_input(Intent {
                direction: 1.0,
                ..Default::default()
            });
            session.update(DT, &config);
            session.end_frame();
        }
        let player = session.player().unwrap();
        assert!(player.body.pos.x > start);
        assert!(player.body.on_ground);
    }

    #[test]
    fn falling_out_of_the_level_costs_a_life() {
        let config = GameConfig::default();
        let mut session = running(&config);
        let below = session.level().pixel_size().y + FALL_MARGIN + 1.0;
        player_mut(&mut session).body.pos.y = below;
        session.update(DT, &config);
        assert!(
            session
                .drain_events()
                .contains(&GameEvent::LifeLost { lives_left: 2 })
        );
        assert_eq!(session.stats().lives, 2);
        assert_eq!(session.player().unwrap().body.pos, session.level().spawn_point);
    }

    #[test]
    fn last_life_ends_the_game() {
        let config = GameConfig::default();
        let mut session = running(&config);
        player_mut(&mut session)
            .components
            .inventory_mut()
            .unwrap()
            .lives = 1;
        let below = session.level().pixel_size().y + FALL_MARGIN + 1.0;
        player_mut(&mut session).body.pos.y = below;
        assert_eq!(session.update(DT, &config), SessionStatus::GameOver);
        session.end_frame();
        assert!(session.player().is_none());
        assert_eq!(session.stats().lives, 0);
    }

    #[test]
    fn goal_completes_once_with_time_bonus() {
        let config = GameConfig::default();
        let mut session = running(&config);
        // plant a flag right on the player
        let center = session.player().unwrap().body.center();
        session
            .entities_mut()
            .add(GoalFlag::spawn(center + Vec2::new(0.0, 40.0)))
            .unwrap();
        let score_before = session.stats().score;

        session.update(DT, &config);
        assert!(session.is_completing());
        let remaining = session.time_remaining();
        let expected_bonus = remaining as u64 * config.time_bonus_per_second;

        let mut completions = 0;
        let mut status = SessionStatus::Running;
        for _ in 0..(COMPLETE_TIME / DT) as usize + 2 {
            status = session.update(DT, &config);
            completions += session
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::LevelComplete { .. }))
                .count();
            // the clock is frozen while celebrating
            assert_eq!(session.time_remaining(), remaining);
        }
        assert_eq!(status, SessionStatus::LevelComplete);
        assert_eq!(completions, 1);
        assert_eq!(session.stats().score, score_before + expected_bonus);
        assert_eq!(session.stats().levels_cleared, 1);
        assert_eq!(session.stats().time_bonus, expected_bonus);
    }

    #[test]
    fn advance_carries_progress_and_stops_after_last_level() {
        let config = GameConfig::default();
        let mut session = running(&config);
        player_mut(&mut session)
            .components
            .inventory_mut()
            .unwrap()
            .score = 1234;
        session.update(DT, &config);
        assert!(session.advance().unwrap());
        assert_eq!(session.level_index(), 1);
        assert_eq!(session.stats().score, 1234);
        assert_eq!(
            session.player().unwrap().components.inventory().unwrap().score,
            1234
        );
        assert!(!session.advance().unwrap());
    }

    #[test]
    fn restart_reloads_level_entities() {
        let config = GameConfig::default();
        let mut session = running(&config);
        let goombas = session.entities().ids_by_type(EntityType::Goomba).len();
        for id in session.entities().ids_by_type(EntityType::Goomba) {
            session.entities_mut().get_mut(id).unwrap().body.destroy();
        }
        session.end_frame();
        assert!(session.entities().ids_by_type(EntityType::Goomba).is_empty());

        session.restart(session.stats()).unwrap();
        assert_eq!(session.entities().ids_by_type(EntityType::Goomba).len(), goombas);
        assert!(session.is_intro());
    }

    #[test]
    fn tile_changes_reach_the_level() {
        let config = GameConfig::default();
        let mut session = running(&config);
        // small player jumping under the mushroom block at row 16, col 6
        let block_x = 6.0 * 32.0;
        {
            let p = player_mut(&mut session);
            p.body.pos = Vec2::new(block_x, 560.0);
            p.body.vel = Vec2::new(0.0, -400.0);
        }
        let mut changed = false;
        for _ in 0..20 {
            session.update(DT, &config);
            changed |= session
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::TileChanged { .. }));
            session.end_frame();
        }
        assert!(changed);
        assert_eq!(
            session.level().get_tile(16, 6),
            Some(crate::sim::level::TileKind::UsedQuestion)
        );
        assert_eq!(Player::power(&session.player().unwrap().components), PowerLevel::Small);
        // two level spawns plus the mushroom from the block
        let powerups = session.entities().ids_by_type(EntityType::PowerUp);
        assert_eq!(powerups.len(), 3);
        let dispensed = powerups
            .iter()
            .filter_map(|&id| session.entities().get(id))
            .find(|e| (e.body.bottom() - 16.0 * 32.0).abs() < 0.5)
            .expect("mushroom resting on the block");
        assert!(dispensed.body.pos.x >= block_x && dispensed.body.pos.x < block_x + 32.0);
        assert!(matches!(
            &dispensed.kind,
            EntityKind::PowerUp(item) if item.item == ItemKind::Mushroom
        ));
    }

    #[test]
    fn render_draws_world_and_hud() {
        let config = GameConfig::default();
        let session = Session::new(&config).unwrap();
        let mut list = DrawList::new(config.screen);
        session.render(&mut list);
        let texts: Vec<_> = list.texts().collect();
        assert!(texts.iter().any(|t| t.starts_with("SCORE")));
        assert!(texts.contains(&"Ready!"));
        assert!(!list.vertices().is_empty());
    }
}
