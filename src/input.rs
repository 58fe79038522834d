//! Logical input actions
//!
//! The host turns OS events into `InputEvent`s keyed by physical key name.
//! `KeyBindings` maps those names to `Action`s and `InputState` keeps the
//! per-frame snapshot the engine reads.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::sim::player::Intent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
    /// Hold to run; pressing it throws a fireball when powered up
    Run,
    Pause,
    Restart,
    Confirm,
    MenuUp,
    MenuDown,
}

/// Raw event from the host, keyed by physical key name ("Left", "Space", ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(String),
    KeyUp(String),
    /// Window close or similar
    Quit,
}

impl Action {
    /// Read through the menu table rather than the gameplay one
    pub fn is_menu(self) -> bool {
        matches!(self, Action::MenuUp | Action::MenuDown)
    }
}

/// Key name to action tables. Gameplay and menu navigation are bound
/// separately, so one key can jump in play and move the menu cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    gameplay: BTreeMap<String, Action>,
    menu: BTreeMap<String, Action>,
}

fn table(pairs: &[(&str, Action)]) -> BTreeMap<String, Action> {
    pairs
        .iter()
        .map(|&(key, action)| (key.to_owned(), action))
        .collect()
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            gameplay: table(&[
                ("Left", Action::MoveLeft),
                ("A", Action::MoveLeft),
                ("Right", Action::MoveRight),
                ("D", Action::MoveRight),
                ("Space", Action::Jump),
                ("Up", Action::Jump),
                ("W", Action::Jump),
                ("Shift", Action::Run),
                ("Escape", Action::Pause),
                ("P", Action::Pause),
                ("R", Action::Restart),
                ("Enter", Action::Confirm),
            ]),
            menu: table(&[
                ("Up", Action::MenuUp),
                ("W", Action::MenuUp),
                ("Down", Action::MenuDown),
                ("S", Action::MenuDown),
            ]),
        }
    }
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            gameplay: BTreeMap::new(),
            menu: BTreeMap::new(),
        }
    }

    fn table_for(&self, action: Action) -> &BTreeMap<String, Action> {
        if action.is_menu() { &self.menu } else { &self.gameplay }
    }

    /// Gameplay action for `key`
    pub fn action(&self, key: &str) -> Option<Action> {
        self.gameplay.get(key).copied()
    }

    /// Menu navigation action for `key`
    pub fn menu_action(&self, key: &str) -> Option<Action> {
        self.menu.get(key).copied()
    }

    /// Bind `key` in the table `action` belongs to, replacing what it did there
    pub fn bind(&mut self, key: impl Into<String>, action: Action) {
        let table = if action.is_menu() {
            &mut self.menu
        } else {
            &mut self.gameplay
        };
        table.insert(key.into(), action);
    }

    /// Drop `key` from both tables. Returns the gameplay action it had, else
    /// the menu one.
    pub fn unbind(&mut self, key: &str) -> Option<Action> {
        let menu = self.menu.remove(key);
        self.gameplay.remove(key).or(menu)
    }

    pub fn keys_for(&self, action: Action) -> impl Iterator<Item = &str> {
        self.table_for(action)
            .iter()
            .filter(move |&(_, a)| *a == action)
            .map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.gameplay.len() + self.menu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gameplay.is_empty() && self.menu.is_empty()
    }
}

/// Held actions plus the ones newly pressed since the last `end_frame`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    held: BTreeSet<Action>,
    pressed: BTreeSet<Action>,
    quit: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, action: Action) {
        if self.held.insert(action) {
            self.pressed.insert(action);
        }
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(&action);
    }

    /// Apply a host event through `bindings`
    pub fn handle_event(&mut self, event: &InputEvent, bindings: &KeyBindings) {
        match event {
            InputEvent::KeyDown(key) => {
                let actions = [bindings.action(key), bindings.menu_action(key)];
                for action in actions.into_iter().flatten() {
                    self.press(action);
                }
            }
            InputEvent::KeyUp(key) => {
                let actions = [bindings.action(key), bindings.menu_action(key)];
                for action in actions.into_iter().flatten() {
                    self.release(action);
                }
            }
            InputEvent::Quit => self.quit = true,
        }
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    /// Pressed this frame (edge, not level)
    pub fn just_pressed(&self, action: Action) -> bool {
        self.pressed.contains(&action)
    }

    pub fn pressed(&self) -> impl Iterator<Item = Action> + '_ {
        self.pressed.iter().copied()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Horizontal axis from the held movement keys. Both held cancel out.
    pub fn direction(&self) -> f32 {
        let mut dir = 0.0;
        if self.is_held(Action::MoveLeft) {
            dir -= 1.0;
        }
        if self.is_held(Action::MoveRight) {
            dir += 1.0;
        }
        dir
    }

    /// Player intent for this frame
    pub fn intent(&self) -> Intent {
        Intent {
            direction: self.direction(),
            jump_pressed: self.just_pressed(Action::Jump),
            run: self.is_held(Action::Run),
            fire_pressed: self.just_pressed(Action::Run),
        }
    }

    /// Forget edges; called once the frame has consumed them
    pub fn end_frame(&mut self) {
        self.pressed.clear();
    }

    pub fn clear(&mut self) {
        self.held.clear();
        self.pressed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(key: &str) -> InputEvent {
        InputEvent::KeyDown(key.to_owned())
    }

    fn up(key: &str) -> InputEvent {
        InputEvent::KeyUp(key.to_owned())
    }

    #[test]
    fn default_bindings_cover_every_gameplay_action() {
        let bindings = KeyBindings::default();
        for action in [
            Action::MoveLeft,
            Action::MoveRight,
            Action::Jump,
            Action::Run,
            Action::Pause,
            Action::Restart,
            Action::Confirm,
        ] {
            assert!(bindings.keys_for(action).next().is_some(), "{action:?} unbound");
        }
        assert_eq!(bindings.keys_for(Action::Jump).count(), 3);
    }

    #[test]
    fn press_is_an_edge_hold_is_a_level() {
        let bindings = KeyBindings::default();
        let mut input = InputState::new();
        input.handle_event(&down("Space"), &bindings);
        assert!(input.just_pressed(Action::Jump));
        assert!(input.intent().jump_pressed);

        input.end_frame();
        // OS key repeat must not re-trigger
        input.handle_event(&down("Space"), &bindings);
        assert!(input.is_held(Action::Jump));
        assert!(!input.just_pressed(Action::Jump));

        input.handle_event(&up("Space"), &bindings);
        assert!(!input.is_held(Action::Jump));
    }

    #[test]
    fn opposite_directions_cancel() {
        let bindings = KeyBindings::default();
        let mut input = InputState::new();
        input.handle_event(&down("Left"), &bindings);
        assert_eq!(input.direction(), -1.0);
        input.handle_event(&down("D"), &bindings);
        assert_eq!(input.direction(), 0.0);
        input.handle_event(&up("Left"), &bindings);
        assert_eq!(input.intent().direction, 1.0);
    }

    #[test]
    fn up_key_also_navigates_menus() {
        let bindings = KeyBindings::default();
        let mut input = InputState::new();
        input.handle_event(&down("Up"), &bindings);
        assert!(input.just_pressed(Action::Jump));
        assert!(input.just_pressed(Action::MenuUp));
        input.handle_event(&down("S"), &bindings);
        assert!(input.just_pressed(Action::MenuDown));
    }

    #[test]
    fn rebinding_and_json() {
        let mut bindings = KeyBindings::empty();
        bindings.bind("J", Action::Jump);
        assert_eq!(bindings.action("J"), Some(Action::Jump));
        assert_eq!(bindings.action("Space"), None);

        let json = serde_json::to_string(&bindings).unwrap();
        assert_eq!(json, r#"{"gameplay":{"J":"Jump"},"menu":{}}"#);
        let back: KeyBindings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bindings);
        assert_eq!(bindings.unbind("J"), Some(Action::Jump));
        assert!(bindings.is_empty());
    }

    #[test]
    fn menu_keys_follow_their_bindings() {
        let mut bindings = KeyBindings::default();
        bindings.bind("K", Action::MenuDown);
        assert_eq!(bindings.unbind("S"), Some(Action::MenuDown));
        assert_eq!(bindings.action("K"), None);

        let mut input = InputState::new();
        input.handle_event(&down("S"), &bindings);
        assert!(!input.just_pressed(Action::MenuDown));
        input.handle_event(&down("K"), &bindings);
        assert!(input.just_pressed(Action::MenuDown));
        assert_eq!(bindings.keys_for(Action::MenuDown).collect::<Vec<_>>(), vec!["Down", "K"]);

        // a file that only rebinds gameplay keeps the default menu keys
        let partial: KeyBindings = serde_json::from_str(r#"{"gameplay":{"J":"Jump"}}"#).unwrap();
        assert_eq!(partial.menu_action("W"), Some(Action::MenuUp));
        assert_eq!(partial.action("Space"), None);
    }

    #[test]
    fn quit_event_is_latched() {
        let mut input = InputState::new();
        input.handle_event(&InputEvent::Quit, &KeyBindings::default());
        input.end_frame();
        assert!(input.quit_requested());
    }
}
