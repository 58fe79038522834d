//! Tile Dash headless runner
//!
//! Drives the engine at a fixed simulation rate with a scripted input
//! sequence, so the whole game loop can be exercised without a window.
//!
//! Usage: `tile-dash [settings.json] [highscores.json]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::fs;

    use tile_dash::assets::NullLoader;
    use tile_dash::consts::*;
    use tile_dash::input::{InputEvent, InputState};
    use tile_dash::renderer::DrawList;
    use tile_dash::{GameEngine, GameStateKind, HighScores, Settings};

    /// Longest run before the script gives up (seconds of simulated time)
    const RUN_SECONDS: u32 = 60;

    /// Host frame times cycle through these to exercise the accumulator
    const FRAME_TIMES: [f32; 4] = [1.0 / 60.0, 1.0 / 30.0, 1.0 / 144.0, 1.0 / 60.0];

    fn key_down(key: &str) -> InputEvent {
        InputEvent::KeyDown(key.to_owned())
    }

    fn key_up(key: &str) -> InputEvent {
        InputEvent::KeyUp(key.to_owned())
    }

    /// Scripted host events for render frame `frame`
    fn script(frame: u32) -> Vec<InputEvent> {
        match frame {
            // start from the menu
            10 => vec![key_down("Enter")],
            11 => vec![key_up("Enter")],
            // run right, hopping regularly
            100 => vec![key_down("Right"), key_down("Shift")],
            f if (100..2400).contains(&f) && f % 40 == 0 => vec![key_down("Space")],
            f if (100..2400).contains(&f) && f % 40 == 12 => vec![key_up("Space")],
            // pause for a second in the middle
            1200 => vec![key_down("Escape")],
            1201 => vec![key_up("Escape")],
            1260 => vec![key_down("P")],
            1261 => vec![key_up("P")],
            2400 => vec![key_up("Right"), key_up("Shift")],
            _ => Vec::new(),
        }
    }

    fn load_settings() -> Settings {
        let Some(path) = std::env::args().nth(1) else {
            log::info!("no settings file given, using defaults");
            return Settings::default();
        };
        match fs::read_to_string(&path) {
            Ok(text) => Settings::from_json(&text),
            Err(err) => {
                log::warn!("could not read settings {}: {}; using defaults", path, err);
                Settings::default()
            }
        }
    }

    fn load_high_scores(path: &str) -> HighScores {
        match fs::read_to_string(path) {
            Ok(text) => HighScores::from_json(&text),
            Err(err) => {
                log::warn!("could not read high scores {}: {}; starting fresh", path, err);
                HighScores::new()
            }
        }
    }

    fn save_high_scores(path: &str, high_scores: &HighScores) {
        let json = match high_scores.to_json() {
            Ok(json) => json,
            Err(err) => {
                log::warn!("could not encode high scores: {}", err);
                return;
            }
        };
        match fs::write(path, json) {
            Ok(()) => log::info!("saved {} high scores to {}", high_scores.entries().len(), path),
            Err(err) => log::warn!("could not save high scores {}: {}", path, err),
        }
    }

    pub fn run() {
        env_logger::init();
        log::info!("Tile Dash (headless) starting...");

        let settings = load_settings();
        let scores_path = std::env::args().nth(2);
        let high_scores = scores_path
            .as_deref()
            .map_or_else(HighScores::new, load_high_scores);
        let mut engine = GameEngine::from_settings(&settings)
            .with_assets(NullLoader)
            .with_high_scores(high_scores);
        let mut list = DrawList::new(engine.screen_size());
        let mut input = InputState::new();

        let mut accumulator = 0.0;
        let mut sim_time = 0.0;
        let mut frame = 0u32;
        let mut max_vertices = 0;
        let mut peak_state = GameStateKind::Menu;

        while engine.is_running() && sim_time < RUN_SECONDS as f32 {
            for event in script(frame) {
                input.handle_event(&event, &settings.key_bindings);
            }
            engine.handle_input(&input);

            let dt = FRAME_TIMES[frame as usize % FRAME_TIMES.len()].min(0.1);
            engine.record_frame_time(dt);
            accumulator += dt;
            let mut substeps = 0;
            while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                engine.update(SIM_DT);
                accumulator -= SIM_DT;
                sim_time += SIM_DT;
                substeps += 1;
            }

            list.reset();
            engine.render(&mut list);
            max_vertices = max_vertices.max(list.vertices().len());
            engine.end_frame();
            input.end_frame();

            if engine.current_state() != GameStateKind::Menu {
                peak_state = peak_state.max(engine.current_state());
            }
            frame += 1;
        }

        let summary = engine.session().map(|s| (s.level().name.clone(), s.stats()));
        log::info!(
            "ran {} frames ({:.1}s simulated), state {:?}, furthest {:?}, peak {} vertices",
            engine.frames(),
            sim_time,
            engine.current_state(),
            peak_state,
            max_vertices
        );
        match summary {
            Some((level, stats)) => log::info!(
                "level {}: score {} coins {} lives {}",
                level,
                stats.score,
                stats.coins,
                stats.lives
            ),
            None => log::info!("no game in progress"),
        }
        if let Some(best) = engine.high_scores().best() {
            log::info!(
                "top score {} on {} ({} levels cleared)",
                best.score,
                best.level,
                best.levels_cleared
            );
        }
        log::info!("average {} fps", engine.fps());
        if let Some(path) = scores_path {
            save_high_scores(&path, engine.high_scores());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The wasm build is a library for the host page; nothing to run here
}
