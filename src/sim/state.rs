//! Session phase and entity types

use serde::{Deserialize, Serialize};

use super::physics::{BodyDesc, BodyHandle, PhysicsMaterial, PhysicsWorld, ShapeKind, spawn_body};
use crate::error::PhysicsError;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Shapes falling, player in control
    #[default]
    Playing,
    /// Player fell off; terminal for the session
    GameOver,
}

/// Unique id of a pooled entity within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// A physical body in play.
///
/// Only constructible through [`Entity::spawn`], which attaches physics
/// before the entity exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    kind: ShapeKind,
    body: BodyHandle,
    spawn_tick: u32,
}

impl Entity {
    /// Create the body, attach physics and wrap it
    pub fn spawn<W: PhysicsWorld + ?Sized>(
        world: &mut W,
        id: EntityId,
        desc: &BodyDesc,
        material: PhysicsMaterial,
        spawn_tick: u32,
    ) -> Result<Self, PhysicsError> {
        let body = spawn_body(world, desc, material)?;
        Ok(Self {
            id,
            kind: desc.shape.kind(),
            body,
            spawn_tick,
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Scheduler tick index that spawned this entity
    pub fn spawn_tick(&self) -> u32 {
        self.spawn_tick
    }

    /// Vertical position; a body the world no longer knows reads as fallen
    pub fn height<W: PhysicsWorld + ?Sized>(&self, world: &W) -> f32 {
        world
            .position(self.body)
            .map_or(f32::NEG_INFINITY, |p| p.y)
    }
}
