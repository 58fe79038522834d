//! Transient visual effects
//!
//! Effects never touch gameplay state. They live outside the entity manager
//! so the simulation stays independent of how much eye candy is enabled.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::camera::Camera;
use crate::renderer::vertex::{colors, faded};
use crate::renderer::{Color, RenderSurface};

pub const PARTICLE_GRAVITY: f32 = 300.0;
pub const EXPLOSION_PARTICLES: usize = 20;
pub const POPUP_DURATION: f32 = 1.5;
pub const POPUP_RISE_SPEED: f32 = -60.0;
pub const RINGS_DURATION: f32 = 1.0;
pub const RING_GROWTH: f32 = 100.0;
const RING_STAGGER: f32 = 0.1;
const RING_COLORS: [Color; 3] = [colors::WHITE, colors::YELLOW, colors::GOLD];

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: Color,
    pub size: f32,
    pub life: f32,
    pub max_life: f32,
}

impl Particle {
    /// Returns false once expired
    fn update(&mut self, dt: f32) -> bool {
        self.pos += self.vel * dt;
        self.vel.y += PARTICLE_GRAVITY * dt;
        self.life -= dt;
        self.life > 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    Explosion { particles: Vec<Particle> },
    ScorePopup { text: String, color: Color },
    PowerUpRings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub pos: Vec2,
    pub timer: f32,
    pub duration: f32,
    pub kind: EffectKind,
}

impl Effect {
    /// Advance one frame; false when the effect is finished
    fn update(&mut self, dt: f32) -> bool {
        self.timer += dt;
        match &mut self.kind {
            EffectKind::Explosion { particles } => {
                particles.retain_mut(|p| p.update(dt));
                !particles.is_empty()
            }
            EffectKind::ScorePopup { .. } => {
                self.pos.y += POPUP_RISE_SPEED * dt;
                self.timer < self.duration
            }
            EffectKind::PowerUpRings => self.timer < self.duration,
        }
    }

    fn render(&self, surface: &mut dyn RenderSurface, camera: &Camera) {
        let fade = 1.0 - self.timer / self.duration;
        match &self.kind {
            EffectKind::Explosion { particles } => {
                for p in particles {
                    let color = faded(p.color, p.life / p.max_life);
                    surface.fill_circle(camera.world_to_screen(p.pos), p.size, color);
                }
            }
            EffectKind::ScorePopup { text, color } => {
                surface.text(camera.world_to_screen(self.pos), text, 24, faded(*color, fade));
            }
            EffectKind::PowerUpRings => {
                let center = camera.world_to_screen(self.pos);
                for (i, color) in RING_COLORS.iter().enumerate() {
                    let t = self.timer - i as f32 * RING_STAGGER;
                    if t <= 0.0 {
                        continue;
                    }
                    let radius = t * RING_GROWTH;
                    let alpha = 1.0 - t / self.duration;
                    if radius < RING_GROWTH && alpha > 0.0 {
                        surface.ring(center, radius, 3.0, faded(*color, alpha));
                    }
                }
            }
        }
    }
}

pub struct EffectsManager {
    effects: Vec<Effect>,
    rng: Pcg32,
    max_particles: usize,
}

impl EffectsManager {
    pub fn new(seed: u64, max_particles: usize) -> Self {
        Self {
            effects: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            max_particles,
        }
    }

    /// Burst of particles flung mostly upward. Spawns fewer than `count` when
    /// the particle budget is nearly spent.
    pub fn create_explosion(&mut self, pos: Vec2, color: Color, count: usize) {
        let count = count.min(self.max_particles.saturating_sub(self.particle_count()));
        if count == 0 {
            log::debug!("particle budget exhausted, explosion at {} skipped", pos);
            return;
        }
        let rng = &mut self.rng;
        let particles = (0..count)
            .map(|_| {
                let angle: f32 = rng.random_range(0.0..TAU);
                let speed: f32 = rng.random_range(50.0..150.0);
                let vel = Vec2::new(angle.cos(), angle.sin()) * speed - Vec2::new(0.0, 100.0);
                let jitter = |c: f32, rng: &mut Pcg32| (c + rng.random_range(-0.2f32..0.2)).clamp(0.0, 1.0);
                let tint = [
                    jitter(color[0], rng),
                    jitter(color[1], rng),
                    jitter(color[2], rng),
                    color[3],
                ];
                let life: f32 = rng.random_range(0.5..1.5);
                Particle {
                    pos,
                    vel,
                    color: tint,
                    size: rng.random_range(2.0..6.0),
                    life,
                    max_life: life,
                }
            })
            .collect();
        self.effects.push(Effect {
            pos,
            timer: 0.0,
            duration: f32::INFINITY,
            kind: EffectKind::Explosion { particles },
        });
    }

    pub fn create_score_popup(&mut self, pos: Vec2, points: u64) {
        self.create_text_popup(pos, points.to_string(), colors::WHITE);
    }

    /// Floating text such as "1UP"
    pub fn create_text_popup(&mut self, pos: Vec2, text: String, color: Color) {
        self.effects.push(Effect {
            pos,
            timer: 0.0,
            duration: POPUP_DURATION,
            kind: EffectKind::ScorePopup { text, color },
        });
    }

    pub fn create_powerup_effect(&mut self, pos: Vec2) {
        self.effects.push(Effect {
            pos,
            timer: 0.0,
            duration: RINGS_DURATION,
            kind: EffectKind::PowerUpRings,
        });
    }

    /// Advance every effect and drop finished ones
    pub fn update(&mut self, dt: f32) {
        self.effects.retain_mut(|e| e.update(dt));
    }

    pub fn render(&self, surface: &mut dyn RenderSurface, camera: &Camera) {
        for effect in &self.effects {
            effect.render(surface, camera);
        }
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn particle_count(&self) -> usize {
        self.effects
            .iter()
            .map(|e| match &e.kind {
                EffectKind::Explosion { particles } => particles.len(),
                _ => 0,
            })
            .sum()
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{DrawCommand, DrawList};
    use glam::UVec2;

    const DT: f32 = 1.0 / 60.0;

    fn run(effects: &mut EffectsManager, seconds: f32) {
        for _ in 0..(seconds / DT).round() as usize {
            effects.update(DT);
        }
    }

    #[test]
    fn explosion_particles_are_culled_after_lifetime() {
        let mut effects = EffectsManager::new(7, 500);
        effects.create_explosion(Vec2::new(100.0, 100.0), colors::YELLOW, EXPLOSION_PARTICLES);
        assert_eq!(effects.particle_count(), EXPLOSION_PARTICLES);
        run(&mut effects, 0.4);
        assert_eq!(effects.particle_count(), EXPLOSION_PARTICLES);
        run(&mut effects, 1.2);
        assert!(effects.is_empty());
    }

    #[test]
    fn explosions_are_deterministic_per_seed() {
        let mut a = EffectsManager::new(42, 500);
        let mut b = EffectsManager::new(42, 500);
        a.create_explosion(Vec2::ZERO, colors::RED, 5);
        b.create_explosion(Vec2::ZERO, colors::RED, 5);
        assert_eq!(a.effects(), b.effects());
    }

    #[test]
    fn particle_budget_is_respected() {
        let mut effects = EffectsManager::new(1, 30);
        effects.create_explosion(Vec2::ZERO, colors::RED, 20);
        effects.create_explosion(Vec2::ZERO, colors::RED, 20);
        effects.create_explosion(Vec2::ZERO, colors::RED, 20);
        assert_eq!(effects.particle_count(), 30);
        assert_eq!(effects.len(), 2);
    }

    #[test]
    fn popup_rises_and_expires() {
        let mut effects = EffectsManager::new(0, 10);
        effects.create_score_popup(Vec2::new(50.0, 200.0), 100);
        run(&mut effects, 1.0);
        let y = effects.effects()[0].pos.y;
        assert!((y - 140.0).abs() < 0.5, "{y}");
        run(&mut effects, 0.6);
        assert!(effects.is_empty());
    }

    #[test]
    fn rings_render_staggered() {
        let mut effects = EffectsManager::new(0, 10);
        effects.create_powerup_effect(Vec2::new(100.0, 100.0));
        run(&mut effects, 0.15);
        let mut list = DrawList::new(UVec2::new(800, 600));
        effects.render(&mut list, &Camera::new(Vec2::new(800.0, 600.0), 1.0));
        let rings = list
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Ring { .. }))
            .count();
        assert_eq!(rings, 2);
        run(&mut effects, 1.0);
        assert!(effects.is_empty());
    }
}
