//! Entity manager
//!
//! Owns every live entity. Update and render walk entities in creation order;
//! removal is deferred to `sweep`, which runs once per frame after render.

use super::arena::{Arena, EntityId};
use super::camera::Camera;
use super::entity::{Entity, EntityType};
use super::frame::FrameContext;
use super::geom::Aabb;
use super::physics::Solid;
use crate::error::{Result, invariant};
use crate::renderer::{RenderSurface, sprites};

#[derive(Debug, Default)]
pub struct EntityManager {
    arena: Arena<Entity>,
    /// Live ids in creation order
    order: Vec<EntityId>,
}

impl EntityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity. Solid entities must have a non-zero size.
    pub fn add(&mut self, entity: Entity) -> Result<EntityId> {
        let size = entity.body.size;
        if entity.body.solid && (size.x == 0 || size.y == 0) {
            return Err(invariant(format!(
                "solid {:?} with degenerate size {}x{}",
                entity.entity_type(),
                size.x,
                size.y
            )));
        }
        let id = self.arena.insert(entity);
        self.order.push(id);
        Ok(id)
    }

    /// Add every entity, logging and skipping rejected ones
    pub fn extend(&mut self, entities: impl IntoIterator<Item = Entity>) -> usize {
        let mut added = 0;
        for entity in entities {
            match self.add(entity) {
                Ok(_) => added += 1,
                Err(e) => log::error!("entity rejected: {}", e),
            }
        }
        added
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.arena.get_mut(id)
    }

    /// Detach an entity for exclusive mutation alongside others; see `restore`
    pub fn take(&mut self, id: EntityId) -> Option<Entity> {
        self.arena.take(id)
    }

    pub fn restore(&mut self, id: EntityId, entity: Entity) {
        self.arena.restore(id, entity);
    }

    /// Ids in creation order
    pub fn ids(&self) -> &[EntityId] {
        &self.order
    }

    pub fn ids_by_type(&self, ty: EntityType) -> Vec<EntityId> {
        self.view()
            .iter()
            .filter(|(_, e)| e.entity_type() == ty)
            .map(|(id, _)| id)
            .collect()
    }

    /// Active entities whose box intersects `area`
    pub fn entities_in_area(&self, area: &Aabb) -> Vec<EntityId> {
        self.view()
            .iter()
            .filter(|(_, e)| e.body.active && e.aabb().intersects(area))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn view(&self) -> WorldView<'_> {
        WorldView {
            arena: &self.arena,
            order: &self.order,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Update every active entity once, in creation order.
    ///
    /// The entity being updated is taken out of the arena so it can be mutated
    /// while the rest of the world is read through a `WorldView`.
    pub fn update(&mut self, dt: f32, ctx: &mut FrameContext<'_>) {
        for i in 0..self.order.len() {
            let id = self.order[i];
            let Some(mut entity) = self.arena.take(id) else {
                continue;
            };
            if entity.body.active {
                let view = WorldView {
                    arena: &self.arena,
                    order: &self.order,
                };
                entity.update(id, dt, &view, ctx);
            }
            self.arena.restore(id, entity);
        }
    }

    /// Move entities queued during the frame into the arena
    pub fn commit_spawns(&mut self, ctx: &mut FrameContext<'_>) {
        let spawns = std::mem::take(&mut ctx.spawns);
        self.extend(spawns);
    }

    /// Visible entities that intersect the camera, lowest layer first.
    /// Ties keep creation order.
    pub fn render_order(&self, camera: &Camera) -> Vec<EntityId> {
        let visible = camera.visible_rect();
        let mut queue: Vec<(i32, EntityId)> = self
            .view()
            .iter()
            .filter(|(_, e)| e.body.active && e.body.visible && e.aabb().intersects(&visible))
            .map(|(id, e)| (e.body.layer, id))
            .collect();
        queue.sort_by_key(|&(layer, _)| layer);
        queue.into_iter().map(|(_, id)| id).collect()
    }

    pub fn render(&self, surface: &mut dyn RenderSurface, camera: &Camera) {
        for id in self.render_order(camera) {
            if let Some(entity) = self.arena.get(id) {
                sprites::draw_entity(surface, camera, entity);
            }
        }
    }

    /// Remove every inactive entity. Returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        let arena = &mut self.arena;
        let before = self.order.len();
        self.order.retain(|&id| {
            let alive = arena.get(id).is_some_and(|e| e.body.active);
            if !alive {
                arena.remove(id);
            }
            alive
        });
        before - self.order.len()
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.order.clear();
    }
}

/// Read-only view of the world handed to entity updates.
///
/// While an entity is being updated it is absent from the view.
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    arena: &'a Arena<Entity>,
    order: &'a [EntityId],
}

impl<'a> WorldView<'a> {
    pub fn get(&self, id: EntityId) -> Option<&'a Entity> {
        self.arena.get(id)
    }

    /// Present entities in creation order
    pub fn iter(self) -> impl Iterator<Item = (EntityId, &'a Entity)> + 'a {
        let arena = self.arena;
        self.order
            .iter()
            .filter_map(move |&id| arena.get(id).map(|e| (id, e)))
    }

    /// Static solids whose box intersects `area`
    pub fn static_solids_near(&self, area: &Aabb) -> Vec<Solid> {
        self.iter()
            .filter(|(_, e)| e.is_static_solid())
            .map(|(id, e)| Solid { id, rect: e.aabb() })
            .filter(|s| s.rect.intersects(area))
            .collect()
    }

    pub fn any_solid_in(&self, area: &Aabb) -> bool {
        self.iter()
            .any(|(_, e)| e.is_static_solid() && e.aabb().intersects(area))
    }

    /// The active player, if present in this view
    pub fn player(&self) -> Option<&'a Entity> {
        self.iter()
            .map(|(_, e)| e)
            .find(|e| e.body.active && e.as_player().is_some())
    }

    pub fn count_type(&self, ty: EntityType) -> usize {
        self.iter()
            .filter(|(_, e)| e.body.active && e.entity_type() == ty)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::renderer::DrawList;
    use crate::sim::enemies::{EnemyKind, EnemySpawner};
    use crate::sim::entity::{Body, EntityKind};
    use crate::sim::items::Coin;
    use crate::sim::level::TileKind;
    use glam::{UVec2, Vec2};

    fn platform(x: f32, y: f32) -> Entity {
        Entity::platform(Aabb::from_xywh(x, y, 64.0, 32.0), TileKind::Ground)
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "invariant violated"))]
    fn zero_sized_solid_is_rejected() {
        let mut manager = EntityManager::new();
        let bad = Entity::platform(Aabb::from_xywh(0.0, 0.0, 0.0, 32.0), TileKind::Ground);
        assert!(manager.add(bad).is_err());
        assert!(manager.is_empty());
    }

    #[test]
    fn sweep_removes_only_inactive_and_ids_go_stale() {
        let mut manager = EntityManager::new();
        let a = manager.add(platform(0.0, 0.0)).unwrap();
        let b = manager.add(platform(64.0, 0.0)).unwrap();
        manager.get_mut(a).unwrap().body.destroy();
        // still present until the sweep
        assert!(manager.get(a).is_some());
        assert_eq!(manager.sweep(), 1);
        assert!(manager.get(a).is_none());
        assert!(manager.get(b).is_some());

        let c = manager.add(platform(128.0, 0.0)).unwrap();
        assert_eq!(c.index(), a.index());
        assert!(manager.get(a).is_none());
        assert_eq!(manager.ids(), &[b, c]);
    }

    #[test]
    fn queries_by_type_and_area() {
        let mut manager = EntityManager::new();
        manager.add(platform(0.0, 100.0)).unwrap();
        let goomba = manager
            .add(EnemySpawner::create(EnemyKind::Goomba, 200.0, 68.0))
            .unwrap();
        assert_eq!(manager.ids_by_type(EntityType::Goomba), vec![goomba]);
        let hits = manager.entities_in_area(&Aabb::from_xywh(190.0, 60.0, 20.0, 20.0));
        assert_eq!(hits, vec![goomba]);
    }

    #[test]
    fn update_hides_self_from_view() {
        let config = GameConfig::default();
        let mut manager = EntityManager::new();
        manager.add(platform(0.0, 100.0)).unwrap();
        let goomba = manager
            .add(EnemySpawner::create(EnemyKind::Goomba, 10.0, 60.0))
            .unwrap();
        let mut ctx = FrameContext::new(&config);
        for _ in 0..30 {
            manager.update(1.0 / 60.0, &mut ctx);
        }
        let body = &manager.get(goomba).unwrap().body;
        assert!(body.on_ground);
        assert_eq!(body.bottom(), 100.0);
    }

    #[test]
    fn spawns_are_committed_after_update() {
        let config = GameConfig::default();
        let mut manager = EntityManager::new();
        let mut ctx = FrameContext::new(&config);
        ctx.spawn(Entity::new(
            Body::new(Vec2::ZERO, UVec2::splat(20), 2),
            EntityKind::Coin(Coin::new(0.0)),
        ));
        manager.update(1.0 / 60.0, &mut ctx);
        assert!(manager.is_empty());
        manager.commit_spawns(&mut ctx);
        assert_eq!(manager.len(), 1);
        assert!(ctx.spawns.is_empty());
    }

    #[test]
    fn render_culls_and_sorts_by_layer() {
        let config = GameConfig::default();
        let mut manager = EntityManager::new();
        let coin = manager
            .add(Entity::new(
                Body::new(Vec2::new(10.0, 10.0), UVec2::splat(20), 2),
                EntityKind::Coin(Coin::new(10.0)),
            ))
            .unwrap();
        let ground = manager.add(platform(0.0, 100.0)).unwrap();
        // far outside the viewport
        manager.add(platform(5000.0, 100.0)).unwrap();
        let mut hidden = platform(64.0, 100.0);
        hidden.body.visible = false;
        manager.add(hidden).unwrap();

        let camera = Camera::new(config.viewport(), 1.0);
        assert_eq!(manager.render_order(&camera), vec![ground, coin]);

        let mut list = DrawList::new(config.screen);
        manager.render(&mut list, &camera);
        assert!(!list.commands().is_empty());
    }
}
