//! Asset lookup with placeholder fallback
//!
//! Decoding is the host's job. The core only asks an `AssetLoader` for
//! images and sounds by path; a failed load is logged and replaced by a
//! placeholder so the game keeps running.

use std::collections::HashMap;
use std::sync::Arc;

use glam::UVec2;

use crate::error::{GameError, Result};
use crate::renderer::Color;
use crate::renderer::colors;

/// Decoded RGBA8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub size: UVec2,
    pub rgba: Vec<u8>,
    /// Stand-in generated after a failed load
    pub placeholder: bool,
}

impl Image {
    /// Solid rectangle of `color`
    pub fn solid(size: UVec2, color: Color) -> Self {
        let px = color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        let count = (size.x * size.y) as usize;
        Self {
            size,
            rgba: px.repeat(count),
            placeholder: false,
        }
    }

    pub fn placeholder(size: UVec2) -> Self {
        Self {
            placeholder: true,
            ..Self::solid(size, colors::PLACEHOLDER)
        }
    }
}

/// Decoded mono PCM
#[derive(Debug, Clone, PartialEq)]
pub struct Sound {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
    pub placeholder: bool,
}

impl Sound {
    pub fn silent() -> Self {
        Self {
            sample_rate: 44_100,
            samples: Vec::new(),
            placeholder: true,
        }
    }

    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Host-provided decoder
pub trait AssetLoader {
    fn load_image(&self, path: &str) -> Result<Image>;
    fn load_sound(&self, path: &str) -> Result<Sound>;
}

impl<L: AssetLoader + ?Sized> AssetLoader for Box<L> {
    fn load_image(&self, path: &str) -> Result<Image> {
        (**self).load_image(path)
    }

    fn load_sound(&self, path: &str) -> Result<Sound> {
        (**self).load_sound(path)
    }
}

/// Loader that finds nothing; every asset becomes a placeholder
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLoader;

impl AssetLoader for NullLoader {
    fn load_image(&self, path: &str) -> Result<Image> {
        Err(GameError::ResourceLoad {
            path: path.to_owned(),
            reason: "no asset loader configured".to_owned(),
        })
    }

    fn load_sound(&self, path: &str) -> Result<Sound> {
        Err(GameError::ResourceLoad {
            path: path.to_owned(),
            reason: "no asset loader configured".to_owned(),
        })
    }
}

/// Size used for placeholder images when the caller has no better guess
pub const PLACEHOLDER_SIZE: UVec2 = UVec2::new(32, 32);

/// Memoizing front of an `AssetLoader`
pub struct AssetCache<L> {
    loader: L,
    images: HashMap<String, Arc<Image>>,
    sounds: HashMap<String, Arc<Sound>>,
    failures: usize,
}

impl<L: AssetLoader> AssetCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            images: HashMap::new(),
            sounds: HashMap::new(),
            failures: 0,
        }
    }

    /// Image at `path`, or a placeholder rectangle if it cannot be loaded.
    /// Failures are cached too, so a missing file warns once.
    pub fn image(&mut self, path: &str) -> Arc<Image> {
        if let Some(image) = self.images.get(path) {
            return Arc::clone(image);
        }
        let image = match self.loader.load_image(path) {
            Ok(image) => {
                log::debug!("loaded image {} ({}x{})", path, image.size.x, image.size.y);
                image
            }
            Err(err) => {
                log::warn!("{}; using placeholder", err);
                self.failures += 1;
                Image::placeholder(PLACEHOLDER_SIZE)
            }
        };
        let image = Arc::new(image);
        self.images.insert(path.to_owned(), Arc::clone(&image));
        image
    }

    /// Sound at `path`, or silence
    pub fn sound(&mut self, path: &str) -> Arc<Sound> {
        if let Some(sound) = self.sounds.get(path) {
            return Arc::clone(sound);
        }
        let sound = match self.loader.load_sound(path) {
            Ok(sound) => sound,
            Err(err) => {
                log::warn!("{}; using silence", err);
                self.failures += 1;
                Sound::silent()
            }
        };
        let sound = Arc::new(sound);
        self.sounds.insert(path.to_owned(), Arc::clone(&sound));
        sound
    }

    /// Number of loads that fell back to a placeholder
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn clear(&mut self) {
        self.images.clear();
        self.sounds.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingLoader {
        calls: Cell<usize>,
    }

    impl AssetLoader for CountingLoader {
        fn load_image(&self, path: &str) -> Result<Image> {
            self.calls.set(self.calls.get() + 1);
            if path == "player.png" {
                Ok(Image::solid(UVec2::new(2, 1), colors::WHITE))
            } else {
                NullLoader.load_image(path)
            }
        }

        fn load_sound(&self, path: &str) -> Result<Sound> {
            NullLoader.load_sound(path)
        }
    }

    #[test]
    fn missing_image_becomes_placeholder_once() {
        let mut cache = AssetCache::new(CountingLoader::default());
        let first = cache.image("missing.png");
        let second = cache.image("missing.png");
        assert!(first.placeholder);
        assert_eq!(first.size, PLACEHOLDER_SIZE);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.failures(), 1);
        assert_eq!(cache.loader.calls.get(), 1);
    }

    #[test]
    fn loaded_image_is_returned() {
        let mut cache = AssetCache::new(CountingLoader::default());
        let image = cache.image("player.png");
        assert!(!image.placeholder);
        assert_eq!(image.rgba, vec![255; 8]);
        assert_eq!(cache.failures(), 0);
    }

    #[test]
    fn missing_sound_is_silent() {
        let mut cache = AssetCache::new(NullLoader);
        let sound = cache.sound("jump.wav");
        assert!(sound.placeholder);
        assert_eq!(sound.duration(), 0.0);
    }
}
