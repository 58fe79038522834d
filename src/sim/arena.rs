//! Generation-tagged slot storage for entities
//!
//! Ids are `(index, generation)` pairs. Removing a value bumps the slot's
//! generation, so ids held past removal never resolve to a newer occupant.

use serde::{Deserialize, Serialize};

/// Handle to an entity slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    /// Slot belongs to a live id (the value may be temporarily taken out)
    occupied: bool,
    value: Option<T>,
}

#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn insert(&mut self, value: T) -> EntityId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.occupied = true;
            slot.value = Some(value);
            EntityId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                occupied: true,
                value: Some(value),
            });
            EntityId {
                index,
                generation: 0,
            }
        }
    }

    fn slot(&self, id: EntityId) -> Option<&Slot<T>> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.occupied && s.generation == id.generation)
    }

    fn slot_mut(&mut self, id: EntityId) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.occupied && s.generation == id.generation)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.slot(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.slot(id).and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.slot_mut(id).and_then(|s| s.value.as_mut())
    }

    /// Free the slot and invalidate `id`
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let slot = self.slot_mut(id)?;
        let value = slot.value.take();
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        value
    }

    /// Borrow a value out of its slot without freeing the slot.
    ///
    /// While taken, `get` on the id returns `None`; `restore` puts it back.
    pub fn take(&mut self, id: EntityId) -> Option<T> {
        self.slot_mut(id).and_then(|s| s.value.take())
    }

    /// Return a value previously removed with `take`
    pub fn restore(&mut self, id: EntityId, value: T) {
        match self.slot_mut(id) {
            Some(slot) if slot.value.is_none() => slot.value = Some(value),
            _ => log::error!("restore into stale or filled slot {:?}", id),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove everything; every outstanding id goes stale
    pub fn clear(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.occupied {
                slot.occupied = false;
                slot.value = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(i as u32);
            }
        }
        self.len = 0;
    }
}
