//! Sound cues
//!
//! Procedurally described sound effects. Each effect is a short list of
//! oscillator tones; an `AudioSink` supplied by the host turns them into
//! sound. A recorded sample found through the asset cache replaces the
//! recipe for its cue. Mixing is the sink's business.

use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::{AssetCache, AssetLoader, Sound};
use crate::settings::Settings;
use crate::sim::frame::GameEvent;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// One oscillator with an exponential pitch and gain ramp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    pub start_hz: f32,
    pub end_hz: f32,
    /// Peak gain before master/sfx volume
    pub gain: f32,
    /// Offset from the cue start (seconds)
    pub delay: f32,
    pub duration: f32,
}

impl Tone {
    const fn new(waveform: Waveform, start_hz: f32, end_hz: f32, gain: f32, delay: f32, duration: f32) -> Self {
        Self {
            waveform,
            start_hz,
            end_hz,
            gain,
            delay,
            duration,
        }
    }

    const fn flat(waveform: Waveform, hz: f32, gain: f32, delay: f32, duration: f32) -> Self {
        Self::new(waveform, hz, hz, gain, delay, duration)
    }

    /// Time at which this tone stops
    pub fn end(&self) -> f32 {
        self.delay + self.duration
    }
}

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    Jump,
    /// Enemy squashed from above
    Stomp,
    /// Shell kicked or enemy knocked out
    Kick,
    Coin,
    PowerUp,
    OneUp,
    /// Head hit a block that did not break
    Bump,
    BrickBreak,
    Fireball,
    /// Lost a power level
    Damage,
    /// Lost a life
    Death,
    LevelClear,
    TimeUp,
    GameOver,
    HighScore,
    MenuMove,
    MenuSelect,
    Pause,
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 18] = [
        SoundEffect::Jump,
        SoundEffect::Stomp,
        SoundEffect::Kick,
        SoundEffect::Coin,
        SoundEffect::PowerUp,
        SoundEffect::OneUp,
        SoundEffect::Bump,
        SoundEffect::BrickBreak,
        SoundEffect::Fireball,
        SoundEffect::Damage,
        SoundEffect::Death,
        SoundEffect::LevelClear,
        SoundEffect::TimeUp,
        SoundEffect::GameOver,
        SoundEffect::HighScore,
        SoundEffect::MenuMove,
        SoundEffect::MenuSelect,
        SoundEffect::Pause,
    ];

    /// Where a recorded sample for this cue is looked up
    pub fn asset_path(self) -> String {
        format!("sounds/{:?}.wav", self).to_lowercase()
    }

    /// Cue for a simulation event, if it has one
    pub fn from_event(event: &GameEvent) -> Option<SoundEffect> {
        let effect = match event {
            GameEvent::Jumped => SoundEffect::Jump,
            GameEvent::Stomped { .. } => SoundEffect::Stomp,
            GameEvent::EnemyKilled { .. } | GameEvent::ShellKicked { .. } => SoundEffect::Kick,
            GameEvent::PlayerDamaged => SoundEffect::Damage,
            GameEvent::LifeLost { .. } | GameEvent::PlayerDied => SoundEffect::Death,
            GameEvent::ExtraLife => SoundEffect::OneUp,
            GameEvent::CoinCollected { .. } => SoundEffect::Coin,
            GameEvent::PowerUpCollected { .. } => SoundEffect::PowerUp,
            GameEvent::BlockBumped { .. } => SoundEffect::Bump,
            GameEvent::BrickBroken { .. } => SoundEffect::BrickBreak,
            GameEvent::FireballThrown => SoundEffect::Fireball,
            GameEvent::GoalReached { .. } => SoundEffect::LevelClear,
            GameEvent::TimeUp => SoundEffect::TimeUp,
            GameEvent::TileChanged { .. } | GameEvent::LevelComplete { .. } => return None,
        };
        Some(effect)
    }

    /// Oscillator recipe
    pub fn tones(self) -> Vec<Tone> {
        use Waveform::*;
        match self {
            // Rising chirp
            SoundEffect::Jump => vec![Tone::new(Square, 300.0, 600.0, 0.2, 0.0, 0.12)],
            // Short squash
            SoundEffect::Stomp => vec![
                Tone::new(Sine, 200.0, 60.0, 0.5, 0.0, 0.1),
                Tone::flat(Square, 120.0, 0.15, 0.0, 0.05),
            ],
            SoundEffect::Kick => vec![Tone::new(Triangle, 500.0, 150.0, 0.4, 0.0, 0.1)],
            // Two bright notes, B5 then E6
            SoundEffect::Coin => vec![
                Tone::flat(Square, 987.77, 0.2, 0.0, 0.07),
                Tone::flat(Square, 1318.51, 0.2, 0.07, 0.3),
            ],
            SoundEffect::PowerUp => arpeggio(Triangle, &[523.25, 659.25, 783.99, 1046.5], 0.06, 0.25),
            SoundEffect::OneUp => arpeggio(Square, &[659.25, 783.99, 1318.51, 1046.5, 1174.66, 1567.98], 0.08, 0.15),
            SoundEffect::Bump => vec![Tone::new(Triangle, 300.0, 200.0, 0.25, 0.0, 0.08)],
            // Crunch over a bass thump
            SoundEffect::BrickBreak => vec![
                Tone::new(Sawtooth, 900.0, 100.0, 0.3, 0.0, 0.18),
                Tone::flat(Sine, 60.0, 0.3, 0.0, 0.12),
            ],
            SoundEffect::Fireball => vec![Tone::new(Sawtooth, 800.0, 300.0, 0.15, 0.0, 0.08)],
            SoundEffect::Damage => vec![Tone::new(Square, 400.0, 100.0, 0.35, 0.0, 0.3)],
            SoundEffect::Death => vec![
                Tone::new(Square, 500.0, 80.0, 0.4, 0.0, 0.6),
                Tone::flat(Sine, 70.0, 0.3, 0.1, 0.5),
            ],
            SoundEffect::LevelClear => arpeggio(Square, &[392.0, 523.25, 659.25, 783.99, 1046.5], 0.12, 0.4),
            SoundEffect::TimeUp => vec![
                Tone::flat(Square, 880.0, 0.3, 0.0, 0.1),
                Tone::flat(Square, 880.0, 0.3, 0.15, 0.1),
                Tone::flat(Square, 880.0, 0.3, 0.3, 0.1),
            ],
            // Descending, slow
            SoundEffect::GameOver => arpeggio(Triangle, &[523.25, 392.0, 329.63, 261.63], 0.25, 0.5),
            SoundEffect::HighScore => arpeggio(Triangle, &[523.25, 659.25, 783.99, 1046.5, 1318.51], 0.1, 0.35),
            SoundEffect::MenuMove => vec![Tone::flat(Sine, 440.0, 0.15, 0.0, 0.04)],
            SoundEffect::MenuSelect => vec![Tone::new(Sine, 440.0, 880.0, 0.2, 0.0, 0.1)],
            SoundEffect::Pause => vec![
                Tone::flat(Sine, 660.0, 0.2, 0.0, 0.06),
                Tone::flat(Sine, 440.0, 0.2, 0.08, 0.06),
            ],
        }
    }

    /// Length of the whole cue
    pub fn duration(self) -> f32 {
        self.tones().iter().map(Tone::end).fold(0.0, f32::max)
    }
}

/// Notes played one after another, each ringing for `ring` seconds
fn arpeggio(waveform: Waveform, notes: &[f32], step: f32, ring: f32) -> Vec<Tone> {
    notes
        .iter()
        .enumerate()
        .map(|(i, &hz)| Tone::flat(waveform, hz, 0.25, i as f32 * step, ring))
        .collect()
}

/// Where cues go. Implemented by the host's audio backend.
pub trait AudioSink {
    /// `volume` is already the effective volume in (0, 1]
    fn play(&mut self, effect: SoundEffect, tones: &[Tone], volume: f32);

    /// Recorded sample for `effect`. Sinks that cannot play PCM fall back
    /// to the oscillator recipe.
    fn play_sample(&mut self, effect: SoundEffect, _sound: &Sound, volume: f32) {
        self.play(effect, &effect.tones(), volume);
    }
}

/// Sink that drops every cue
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _effect: SoundEffect, _tones: &[Tone], _volume: f32) {}
}

/// Audio manager for the game
pub struct AudioManager {
    sink: Box<dyn AudioSink>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    samples: HashMap<SoundEffect, Arc<Sound>>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(Box::new(SilentAudio))
    }
}

impl AudioManager {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            samples: HashMap::new(),
        }
    }

    /// Take volume and mute from the player's settings
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.set_sfx_volume(settings.sfx_volume);
        self.set_muted(settings.muted);
    }

    /// Look up a recorded sample for every cue. Cues whose sample is missing
    /// keep their oscillator recipe. Returns how many samples were found.
    pub fn load_samples<L: AssetLoader>(&mut self, assets: &mut AssetCache<L>) -> usize {
        self.samples.clear();
        for effect in SoundEffect::ALL {
            let sound = assets.sound(&effect.asset_path());
            if !sound.placeholder {
                self.samples.insert(effect, sound);
            }
        }
        log::info!(
            "{} recorded cues, {} synthesized",
            self.samples.len(),
            SoundEffect::ALL.len() - self.samples.len()
        );
        self.samples.len()
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        log::trace!("sfx {:?} at {:.2}", effect, vol);
        match self.samples.get(&effect) {
            Some(sound) => self.sink.play_sample(effect, sound, vol),
            None => self.sink.play(effect, &effect.tones(), vol),
        }
    }

    /// Play the cue for every event that has one
    pub fn handle_events(&mut self, events: &[GameEvent]) {
        for effect in events.iter().filter_map(SoundEffect::from_event) {
            self.play(effect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::NullLoader;
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<(SoundEffect, f32)>>>);

    impl AudioSink for Recorder {
        fn play(&mut self, effect: SoundEffect, tones: &[Tone], volume: f32) {
            assert!(!tones.is_empty());
            self.0.borrow_mut().push((effect, volume));
        }
    }

    /// Sink that tells samples and recipes apart
    #[derive(Clone, Default)]
    struct PcmSink(Rc<RefCell<Vec<(SoundEffect, usize)>>>);

    impl AudioSink for PcmSink {
        fn play(&mut self, effect: SoundEffect, _tones: &[Tone], _volume: f32) {
            self.0.borrow_mut().push((effect, 0));
        }

        fn play_sample(&mut self, effect: SoundEffect, sound: &Sound, _volume: f32) {
            self.0.borrow_mut().push((effect, sound.samples.len()));
        }
    }

    /// Only the jump cue has a recording
    struct JumpOnly;

    impl AssetLoader for JumpOnly {
        fn load_image(&self, path: &str) -> crate::error::Result<crate::assets::Image> {
            NullLoader.load_image(path)
        }

        fn load_sound(&self, path: &str) -> crate::error::Result<Sound> {
            if path == "sounds/jump.wav" {
                Ok(Sound {
                    sample_rate: 8_000,
                    samples: vec![0.0; 400],
                    placeholder: false,
                })
            } else {
                NullLoader.load_sound(path)
            }
        }
    }

    #[test]
    fn recorded_samples_replace_recipes() {
        let sink = PcmSink::default();
        let mut audio = AudioManager::new(Box::new(sink.clone()));
        let mut assets = AssetCache::new(JumpOnly);
        assert_eq!(audio.load_samples(&mut assets), 1);
        assert_eq!(assets.failures(), SoundEffect::ALL.len() - 1);
        audio.play(SoundEffect::Jump);
        audio.play(SoundEffect::Coin);
        assert_eq!(
            *sink.0.borrow(),
            vec![(SoundEffect::Jump, 400), (SoundEffect::Coin, 0)]
        );
    }

    #[test]
    fn settings_set_volume_and_mute() {
        let recorder = Recorder::default();
        let mut audio = AudioManager::new(Box::new(recorder.clone()));
        let settings = Settings::from_json(r#"{ "master_volume": 0.5, "sfx_volume": 0.5 }"#);
        audio.apply_settings(&settings);
        assert_eq!(audio.effective_volume(), 0.25);
        audio.play(SoundEffect::Coin);
        assert_eq!(recorder.0.borrow()[0], (SoundEffect::Coin, 0.25));

        audio.apply_settings(&Settings::from_json(r#"{ "muted": true }"#));
        assert!(audio.is_muted());
        audio.play(SoundEffect::Coin);
        assert_eq!(recorder.0.borrow().len(), 1);
    }

    #[test]
    fn events_map_to_cues() {
        let recorder = Recorder::default();
        let mut audio = AudioManager::new(Box::new(recorder.clone()));
        audio.handle_events(&[
            GameEvent::Jumped,
            GameEvent::TileChanged {
                row: 0,
                col: 0,
                kind: crate::sim::level::TileKind::UsedQuestion,
            },
            GameEvent::CoinCollected { pos: Vec2::ZERO },
        ]);
        let played: Vec<_> = recorder.0.borrow().iter().map(|(e, _)| *e).collect();
        assert_eq!(played, vec![SoundEffect::Jump, SoundEffect::Coin]);
    }

    #[test]
    fn muted_or_silent_plays_nothing() {
        let recorder = Recorder::default();
        let mut audio = AudioManager::new(Box::new(recorder.clone()));
        audio.set_muted(true);
        audio.play(SoundEffect::Coin);
        audio.set_muted(false);
        audio.set_sfx_volume(0.0);
        audio.play(SoundEffect::Coin);
        assert!(recorder.0.borrow().is_empty());
    }

    #[test]
    fn volume_is_clamped_and_combined() {
        let recorder = Recorder::default();
        let mut audio = AudioManager::new(Box::new(recorder.clone()));
        audio.set_master_volume(2.0);
        audio.set_sfx_volume(0.5);
        audio.play(SoundEffect::Stomp);
        assert_eq!(recorder.0.borrow()[0], (SoundEffect::Stomp, 0.5));
    }

    #[test]
    fn arpeggios_are_staggered() {
        let tones = SoundEffect::LevelClear.tones();
        assert_eq!(tones.len(), 5);
        assert!(tones.windows(2).all(|w| w[1].delay > w[0].delay));
        assert!((SoundEffect::LevelClear.duration() - (0.48 + 0.4)).abs() < 1e-4);
    }
}
