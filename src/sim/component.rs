//! Per-entity component table
//!
//! A fixed-size table with one optional slot per `ComponentKind`. Components are
//! owned by exactly one entity and dropped with it (or when detached).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Health,
    Inventory,
}

impl ComponentKind {
    pub const COUNT: usize = 2;

    #[inline]
    fn slot(self) -> usize {
        match self {
            ComponentKind::Health => 0,
            ComponentKind::Inventory => 1,
        }
    }
}

/// Hit points plus a post-hit invulnerability window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: u32,
    pub max: u32,
    /// Seconds of invulnerability left
    pub invulnerable: f32,
}

impl Health {
    pub fn new(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
            invulnerable: 0.0,
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable > 0.0
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Apply damage unless invulnerable. Returns whether it landed.
    pub fn damage(&mut self, amount: u32) -> bool {
        if self.is_invulnerable() || amount == 0 {
            return false;
        }
        self.current = self.current.saturating_sub(amount);
        true
    }

    /// Raise hit points to at least `value` (never lowers them)
    pub fn raise_to(&mut self, value: u32) {
        self.current = self.current.max(value.min(self.max));
    }

    pub fn tick(&mut self, dt: f32) {
        if self.invulnerable > 0.0 {
            self.invulnerable = (self.invulnerable - dt).max(0.0);
        }
    }
}

/// Coins, lives and score carried by the player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub coins: u32,
    pub lives: u32,
    pub score: u64,
}

/// Coins needed for an extra life
pub const COINS_PER_LIFE: u32 = 100;

impl Inventory {
    pub fn new(lives: u32) -> Self {
        Self {
            lives,
            ..Default::default()
        }
    }

    /// Add a coin worth 100 points. Returns true when it granted an extra life.
    pub fn add_coin(&mut self) -> bool {
        self.coins += 1;
        self.score += 100;
        if self.coins >= COINS_PER_LIFE {
            self.coins = 0;
            self.lives += 1;
            return true;
        }
        false
    }

    pub fn add_score(&mut self, points: u64) {
        self.score += points;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    Health(Health),
    Inventory(Inventory),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Health(_) => ComponentKind::Health,
            Component::Inventory(_) => ComponentKind::Inventory,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentTable {
    slots: [Option<Component>; ComponentKind::COUNT],
}

impl ComponentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a component, returning the one it replaced
    pub fn attach(&mut self, component: Component) -> Option<Component> {
        let slot = component.kind().slot();
        self.slots[slot].replace(component)
    }

    pub fn detach(&mut self, kind: ComponentKind) -> Option<Component> {
        self.slots[kind.slot()].take()
    }

    pub fn has(&self, kind: ComponentKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    pub fn get(&self, kind: ComponentKind) -> Option<&Component> {
        self.slots[kind.slot()].as_ref()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn health(&self) -> Option<&Health> {
        match &self.slots[ComponentKind::Health.slot()] {
            Some(Component::Health(h)) => Some(h),
            _ => None,
        }
    }

    pub fn health_mut(&mut self) -> Option<&mut Health> {
        match &mut self.slots[ComponentKind::Health.slot()] {
            Some(Component::Health(h)) => Some(h),
            _ => None,
        }
    }

    pub fn inventory(&self) -> Option<&Inventory> {
        match &self.slots[ComponentKind::Inventory.slot()] {
            Some(Component::Inventory(i)) => Some(i),
            _ => None,
        }
    }

    pub fn inventory_mut(&mut self) -> Option<&mut Inventory> {
        match &mut self.slots[ComponentKind::Inventory.slot()] {
            Some(Component::Inventory(i)) => Some(i),
            _ => None,
        }
    }
}
