//! Game state machine
//!
//! Four screens share one `GameData`. A screen asks for a transition by
//! returning the next `GameStateKind` from `handle_input` or `update`; the
//! engine holds the request until the frame has been rendered and swept, then
//! calls `exit` on the old screen and `enter` on the new one.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use glam::{IVec2, UVec2};
use serde::{Deserialize, Serialize};

use crate::assets::{AssetCache, AssetLoader, Image, NullLoader};
use crate::audio::{AudioManager, SoundEffect};
use crate::config::GameConfig;
use crate::error::Result;
use crate::highscores::{HighScoreEntry, HighScores};
use crate::input::{Action, InputState};
use crate::renderer::sprites;
use crate::renderer::vertex::colors;
use crate::renderer::RenderSurface;
use crate::settings::Settings;
use crate::sim::session::{PlayerStats, Session, SessionStatus};

/// Seconds the game-over screen waits before returning to the menu
pub const GAME_OVER_DELAY: f32 = 3.0;

/// Title art shown on the menu when the host can supply it
pub const LOGO_PATH: &str = "images/logo.png";

/// Host frames averaged by the FPS readout
const FPS_WINDOW: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameStateKind {
    Menu,
    Playing,
    Paused,
    GameOver,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub stats: PlayerStats,
    pub level: String,
    /// Finished the last level rather than running out of lives
    pub victory: bool,
    /// Leaderboard rank, set when the game-over screen records the run
    pub rank: Option<usize>,
}

/// State shared by every screen
pub struct GameData {
    pub config: GameConfig,
    /// The playthrough in progress; kept while paused
    pub session: Option<Session>,
    pub high_scores: HighScores,
    pub audio: AudioManager,
    pub assets: AssetCache<Box<dyn AssetLoader>>,
    /// Menu title art; a failed load leaves the placeholder here
    pub logo: Option<Arc<Image>>,
    pub last_run: Option<RunSummary>,
    /// Cleared by "Quit" or a host quit request
    pub running: bool,
}

impl GameData {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            session: None,
            high_scores: HighScores::new(),
            audio: AudioManager::default(),
            assets: AssetCache::new(Box::new(NullLoader)),
            logo: None,
            last_run: None,
            running: true,
        }
    }

    /// Fetch everything the screens use through the asset cache
    pub fn load_assets(&mut self) {
        self.audio.load_samples(&mut self.assets);
        self.logo = Some(self.assets.image(LOGO_PATH));
        if self.assets.failures() > 0 {
            log::warn!("{} assets replaced by placeholders", self.assets.failures());
        }
    }
}

/// One state of the machine
pub trait GameScreen {
    /// Called when the engine switches to this screen from `from`
    fn enter(&mut self, _from: GameStateKind, _data: &mut GameData) -> Result<()> {
        Ok(())
    }

    /// Called when the engine leaves this screen for `to`
    fn exit(&mut self, _to: GameStateKind, _data: &mut GameData) {}

    fn handle_input(&mut self, input: &InputState, data: &mut GameData) -> Option<GameStateKind>;

    fn update(&mut self, dt: f32, data: &mut GameData) -> Option<GameStateKind>;

    fn render(&self, data: &GameData, surface: &mut dyn RenderSurface);

    /// After render; removes what died this frame
    fn end_frame(&mut self, _data: &mut GameData) {}
}

// === Menu ===

const MENU_OPTIONS: [&str; 2] = ["Start Game", "Quit"];

#[derive(Debug, Default)]
pub struct MenuScreen {
    selected: usize,
}

impl MenuScreen {
    pub fn selected(&self) -> usize {
        self.selected
    }
}

impl GameScreen for MenuScreen {
    fn enter(&mut self, _from: GameStateKind, _data: &mut GameData) -> Result<()> {
        self.selected = 0;
        Ok(())
    }

    fn handle_input(&mut self, input: &InputState, data: &mut GameData) -> Option<GameStateKind> {
        if input.just_pressed(Action::MenuUp) {
            self.selected = (self.selected + MENU_OPTIONS.len() - 1) % MENU_OPTIONS.len();
            data.audio.play(SoundEffect::MenuMove);
        }
        if input.just_pressed(Action::MenuDown) {
            self.selected = (self.selected + 1) % MENU_OPTIONS.len();
            data.audio.play(SoundEffect::MenuMove);
        }
        if !input.just_pressed(Action::Confirm) {
            return None;
        }
        data.audio.play(SoundEffect::MenuSelect);
        match self.selected {
            0 => Some(GameStateKind::Playing),
            _ => {
                log::info!("quit selected");
                data.running = false;
                None
            }
        }
    }

    fn update(&mut self, _dt: f32, _data: &mut GameData) -> Option<GameStateKind> {
        None
    }

    fn render(&self, data: &GameData, surface: &mut dyn RenderSurface) {
        surface.clear(colors::SKY);
        match data.logo.as_ref().filter(|logo| !logo.placeholder) {
            Some(logo) => {
                let x = (surface.size().x as i32 - logo.size.x as i32) / 2;
                surface.image(IVec2::new(x, 200 - logo.size.y as i32 / 2), logo);
            }
            None => sprites::draw_banner(surface, 200, "Tile Dash", 72, colors::WHITE),
        }
        for (i, option) in MENU_OPTIONS.iter().enumerate() {
            let color = if i == self.selected {
                colors::WHITE
            } else {
                colors::STONE
            };
            sprites::draw_banner(surface, 350 + i as i32 * 60, option, 48, color);
        }
        if let Some(best) = data.high_scores.best() {
            let line = format!("TOP {:06}  WORLD {}", best.score, best.level);
            sprites::draw_banner(surface, 520, &line, 24, colors::GOLD);
        }
    }
}

// === Playing ===

#[derive(Debug, Default)]
pub struct PlayingScreen {
    /// Progress at the start of the current level; restart returns here
    checkpoint: PlayerStats,
}

impl PlayingScreen {
    fn end_run(data: &mut GameData, victory: bool) -> GameStateKind {
        if let Some(session) = &data.session {
            data.last_run = Some(RunSummary {
                stats: session.stats(),
                level: session.level().name.clone(),
                victory,
                rank: None,
            });
        }
        GameStateKind::GameOver
    }
}

impl GameScreen for PlayingScreen {
    fn enter(&mut self, from: GameStateKind, data: &mut GameData) -> Result<()> {
        if from == GameStateKind::Paused && data.session.is_some() {
            log::debug!("resuming");
            return Ok(());
        }
        let session = Session::new(&data.config)?;
        self.checkpoint = session.stats();
        data.session = Some(session);
        data.last_run = None;
        log::info!("new game");
        Ok(())
    }

    fn exit(&mut self, to: GameStateKind, data: &mut GameData) {
        if to != GameStateKind::Paused {
            data.session = None;
        }
    }

    fn handle_input(&mut self, input: &InputState, data: &mut GameData) -> Option<GameStateKind> {
        let session = data.session.as_mut()?;
        if input.just_pressed(Action::Pause) {
            return Some(GameStateKind::Paused);
        }
        if input.just_pressed(Action::Restart) {
            log::info!("restarting level {}", session.level_index());
            if let Err(err) = session.restart(self.checkpoint) {
                log::error!("restart failed: {}", err);
                return Some(GameStateKind::Menu);
            }
            return None;
        }
        session.handle_input(input.intent());
        None
    }

    fn update(&mut self, dt: f32, data: &mut GameData) -> Option<GameStateKind> {
        let GameData {
            config,
            session,
            audio,
            ..
        } = data;
        let Some(session) = session.as_mut() else {
            log::error!("playing without a session");
            return Some(GameStateKind::Menu);
        };

        let status = session.update(dt, config);
        audio.handle_events(&session.drain_events());

        match status {
            SessionStatus::Running => None,
            SessionStatus::GameOver => Some(Self::end_run(data, false)),
            SessionStatus::LevelComplete => match session.advance() {
                Ok(true) => {
                    self.checkpoint = session.stats();
                    None
                }
                Ok(false) => {
                    log::info!("all levels cleared");
                    Some(Self::end_run(data, true))
                }
                Err(err) => {
                    log::error!("could not load next level: {}", err);
                    Some(GameStateKind::Menu)
                }
            },
        }
    }

    fn render(&self, data: &GameData, surface: &mut dyn RenderSurface) {
        if let Some(session) = &data.session {
            session.render(surface);
        }
    }

    fn end_frame(&mut self, data: &mut GameData) {
        if let Some(session) = data.session.as_mut() {
            session.end_frame();
        }
    }
}

// === Paused ===

#[derive(Debug, Default)]
pub struct PausedScreen;

impl GameScreen for PausedScreen {
    fn enter(&mut self, _from: GameStateKind, data: &mut GameData) -> Result<()> {
        data.audio.play(SoundEffect::Pause);
        Ok(())
    }

    fn handle_input(&mut self, input: &InputState, _data: &mut GameData) -> Option<GameStateKind> {
        if input.just_pressed(Action::Pause) || input.just_pressed(Action::Confirm) {
            return Some(GameStateKind::Playing);
        }
        None
    }

    fn update(&mut self, _dt: f32, data: &mut GameData) -> Option<GameStateKind> {
        if data.session.is_none() {
            return Some(GameStateKind::Menu);
        }
        None
    }

    fn render(&self, data: &GameData, surface: &mut dyn RenderSurface) {
        if let Some(session) = &data.session {
            session.render(surface);
        }
        let size = surface.size();
        surface.fill_rect(IVec2::ZERO, size, colors::OVERLAY);
        let middle = size.y as i32 / 2;
        sprites::draw_banner(surface, middle, "PAUSED", 72, colors::WHITE);
        sprites::draw_banner(surface, middle + 100, "Press ESC or P to resume", 36, colors::WHITE);
    }
}

// === Game over ===

#[derive(Debug)]
pub struct GameOverScreen {
    timer: f32,
}

impl Default for GameOverScreen {
    fn default() -> Self {
        Self {
            timer: GAME_OVER_DELAY,
        }
    }
}

impl GameOverScreen {
    pub fn time_left(&self) -> f32 {
        self.timer
    }
}

impl GameScreen for GameOverScreen {
    fn enter(&mut self, _from: GameStateKind, data: &mut GameData) -> Result<()> {
        self.timer = GAME_OVER_DELAY;
        let Some(run) = data.last_run.as_mut() else {
            data.audio.play(SoundEffect::GameOver);
            return Ok(());
        };
        log::info!(
            "run over on {}: score {} coins {} levels {} ({})",
            run.level,
            run.stats.score,
            run.stats.coins,
            run.stats.levels_cleared,
            if run.victory { "cleared" } else { "out of lives" }
        );
        run.rank = data.high_scores.record(HighScoreEntry::from(&*run));
        let cue = if run.rank.is_some() {
            SoundEffect::HighScore
        } else {
            SoundEffect::GameOver
        };
        data.audio.play(cue);
        Ok(())
    }

    fn handle_input(&mut self, input: &InputState, _data: &mut GameData) -> Option<GameStateKind> {
        input
            .just_pressed(Action::Confirm)
            .then_some(GameStateKind::Menu)
    }

    fn update(&mut self, dt: f32, _data: &mut GameData) -> Option<GameStateKind> {
        self.timer -= dt;
        (self.timer <= 0.0).then_some(GameStateKind::Menu)
    }

    fn render(&self, data: &GameData, surface: &mut dyn RenderSurface) {
        surface.clear(colors::BLACK);
        let middle = surface.size().y as i32 / 2;
        let victory = data.last_run.as_ref().is_some_and(|r| r.victory);
        let (title, color) = if victory {
            ("YOU WIN!", colors::GOLD)
        } else {
            ("GAME OVER", colors::RED)
        };
        sprites::draw_banner(surface, middle - 100, title, 72, color);
        if let Some(run) = &data.last_run {
            sprites::draw_banner(
                surface,
                middle - 20,
                &format!("SCORE {:06}  TIME BONUS {}", run.stats.score, run.stats.time_bonus),
                36,
                colors::WHITE,
            );
            if let Some(rank) = run.rank {
                sprites::draw_banner(surface, middle + 20, &format!("New high score! #{}", rank), 28, colors::GOLD);
            }
        }
        let line = if self.timer > 0.0 {
            format!("Returning to menu in {}...", self.timer as u32 + 1)
        } else {
            "Press ENTER to return to menu".to_owned()
        };
        sprites::draw_banner(surface, middle + 60, &line, 28, colors::WHITE);
    }
}

// === Engine ===

/// Rolling average of host frame times
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    frame_times: VecDeque<f32>,
    total: f32,
}

impl FpsCounter {
    pub fn record(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        if self.frame_times.len() == FPS_WINDOW {
            if let Some(old) = self.frame_times.pop_front() {
                self.total -= old;
            }
        }
        self.frame_times.push_back(dt);
        self.total += dt;
    }

    pub fn fps(&self) -> u32 {
        if self.total <= 0.0 {
            return 0;
        }
        (self.frame_times.len() as f32 / self.total).round() as u32
    }
}

/// Owns the screens and drives the active one
pub struct GameEngine {
    data: GameData,
    screens: BTreeMap<GameStateKind, Box<dyn GameScreen>>,
    current: GameStateKind,
    pending: Option<GameStateKind>,
    frames: u64,
    fps: FpsCounter,
}

impl GameEngine {
    pub fn new(config: GameConfig) -> Self {
        let screens: Vec<(GameStateKind, Box<dyn GameScreen>)> = vec![
            (GameStateKind::Menu, Box::new(MenuScreen::default())),
            (GameStateKind::Playing, Box::new(PlayingScreen::default())),
            (GameStateKind::Paused, Box::new(PausedScreen)),
            (GameStateKind::GameOver, Box::new(GameOverScreen::default())),
        ];
        Self::with_screens(config, screens)
    }

    /// Engine configured from loaded settings, audio levels included
    pub fn from_settings(settings: &Settings) -> Self {
        let mut engine = Self::new(settings.game_config());
        engine.data.audio.apply_settings(settings);
        engine
    }

    /// Engine with caller-supplied screens; starts in the menu
    pub fn with_screens(
        config: GameConfig,
        screens: impl IntoIterator<Item = (GameStateKind, Box<dyn GameScreen>)>,
    ) -> Self {
        let mut engine = Self {
            data: GameData::new(config),
            screens: screens.into_iter().collect(),
            current: GameStateKind::Menu,
            pending: None,
            frames: 0,
            fps: FpsCounter::default(),
        };
        if let Some(menu) = engine.screens.get_mut(&GameStateKind::Menu) {
            if let Err(err) = menu.enter(GameStateKind::Menu, &mut engine.data) {
                log::error!("menu failed to start: {}", err);
            }
        }
        engine
    }

    /// Replace the audio output. Recorded cues already in the asset cache
    /// carry over.
    pub fn with_audio(mut self, audio: AudioManager) -> Self {
        self.data.audio = audio;
        self.data.audio.load_samples(&mut self.data.assets);
        self
    }

    /// Load menu art and recorded cues through `loader`
    pub fn with_assets(mut self, loader: impl AssetLoader + 'static) -> Self {
        self.data.assets = AssetCache::new(Box::new(loader));
        self.data.load_assets();
        self
    }

    pub fn with_high_scores(mut self, high_scores: HighScores) -> Self {
        self.data.high_scores = high_scores;
        self
    }

    /// Feed this frame's input to the active screen
    pub fn handle_input(&mut self, input: &InputState) {
        if input.quit_requested() {
            self.data.running = false;
        }
        if self.pending.is_some() {
            return;
        }
        if let Some(screen) = self.screens.get_mut(&self.current) {
            self.pending = screen.handle_input(input, &mut self.data);
        }
    }

    /// One simulation step. Skipped once a transition is pending.
    pub fn update(&mut self, dt: f32) {
        if self.pending.is_some() {
            return;
        }
        if let Some(screen) = self.screens.get_mut(&self.current) {
            self.pending = screen.update(dt, &mut self.data);
        }
    }

    pub fn render(&self, surface: &mut dyn RenderSurface) {
        if let Some(screen) = self.screens.get(&self.current) {
            screen.render(&self.data, surface);
        }
        if self.data.config.show_fps {
            let y = surface.size().y as i32 - 28;
            surface.text(IVec2::new(16, y), &format!("FPS {}", self.fps.fps()), 18, colors::WHITE);
        }
    }

    /// Host frame time, for the FPS readout
    pub fn record_frame_time(&mut self, dt: f32) {
        self.fps.record(dt);
    }

    pub fn fps(&self) -> u32 {
        self.fps.fps()
    }

    /// Sweep, then commit any requested transition
    pub fn end_frame(&mut self) {
        if let Some(screen) = self.screens.get_mut(&self.current) {
            screen.end_frame(&mut self.data);
        }
        self.frames += 1;
        if let Some(next) = self.pending.take() {
            self.change_state(next);
        }
    }

    /// Input, one update, render and end-of-frame in the usual order
    pub fn frame(&mut self, input: &InputState, dt: f32, surface: &mut dyn RenderSurface) {
        self.record_frame_time(dt);
        self.handle_input(input);
        self.update(dt);
        self.render(surface);
        self.end_frame();
    }

    /// Switch screens now: `exit` on the old one, then `enter` on the new one.
    /// A screen that fails to enter sends the engine back to the menu.
    pub fn change_state(&mut self, next: GameStateKind) {
        if next == self.current || !self.screens.contains_key(&next) {
            return;
        }
        let previous = self.current;
        if let Some(screen) = self.screens.get_mut(&previous) {
            screen.exit(next, &mut self.data);
        }
        self.current = next;
        log::info!("state {:?} -> {:?}", previous, next);

        let entered = match self.screens.get_mut(&next) {
            Some(screen) => screen.enter(previous, &mut self.data),
            None => Ok(()),
        };
        if let Err(err) = entered {
            log::error!("could not enter {:?}: {}", next, err);
            if next != GameStateKind::Menu {
                self.change_state(GameStateKind::Menu);
            }
        }
    }

    pub fn current_state(&self) -> GameStateKind {
        self.current
    }

    pub fn pending_state(&self) -> Option<GameStateKind> {
        self.pending
    }

    pub fn is_running(&self) -> bool {
        self.data.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn data(&self) -> &GameData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut GameData {
        &mut self.data
    }

    pub fn session(&self) -> Option<&Session> {
        self.data.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.data.session.as_mut()
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.data.high_scores
    }

    pub fn screen_size(&self) -> UVec2 {
        self.data.config.screen
    }
}
