//! Bounded pool of live non-player entities
//!
//! Everything that falls into the abyss is released so the simulation can
//! run indefinitely.

use super::physics::PhysicsWorld;
use super::state::{Entity, EntityId};

/// Live set of spawned shapes, capped at `capacity`
#[derive(Debug)]
pub struct EntityPool {
    entities: Vec<Entity>,
    capacity: usize,
    next_id: u32,
}

impl EntityPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity.min(1024)),
            capacity,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn count(&self) -> usize {
        self.entities.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entities.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Append an entity. Returns it back untouched when the pool is full;
    /// callers check [`is_full`](Self::is_full) first to avoid building it.
    pub fn add(&mut self, entity: Entity) -> Result<(), Entity> {
        if self.is_full() {
            return Err(entity);
        }
        self.entities.push(entity);
        Ok(())
    }

    /// Release every entity strictly below `threshold`, keeping order.
    /// Returns how many were removed.
    pub fn prune_below<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, threshold: f32) -> usize {
        let before = self.entities.len();
        // Single compacting pass: each entity is visited exactly once
        self.entities.retain(|entity| {
            if entity.height(&*world) < threshold {
                world.dispose(entity.body());
                false
            } else {
                true
            }
        });
        before - self.entities.len()
    }

    /// Release every entity (session teardown)
    pub fn clear<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        for entity in self.entities.drain(..) {
            world.dispose(entity.body());
        }
    }
}
