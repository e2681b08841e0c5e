//! Physics/rendering capability seam
//!
//! The rigid-body integrator and renderer live outside this crate. The core
//! only needs to create bodies, attach physics, push them around, read their
//! position and release them.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;

/// Opaque handle to a body owned by a [`PhysicsWorld`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Collision/render shape kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Sphere,
    Box,
}

/// Shape dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere { diameter: f32 },
    Box { size: Vec3 },
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Sphere { .. } => ShapeKind::Sphere,
            Shape::Box { .. } => ShapeKind::Box,
        }
    }

    /// Half extent along the vertical axis (ignores rotation)
    pub fn half_height(&self) -> f32 {
        match self {
            Shape::Sphere { diameter } => diameter / 2.0,
            Shape::Box { size } => size.y / 2.0,
        }
    }

    fn is_valid(&self) -> bool {
        match self {
            Shape::Sphere { diameter } => diameter.is_finite() && *diameter > 0.0,
            Shape::Box { size } => size.is_finite() && size.min_element() > 0.0,
        }
    }
}

/// Everything needed to create a visible body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub shape: Shape,
    pub position: Vec3,
    pub rotation: Quat,
    /// Diffuse colour (channels may exceed 1.0 for glow)
    pub color: Vec3,
}

impl BodyDesc {
    /// Check dimensions and placement are usable
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !self.shape.is_valid() {
            return Err(PhysicsError::InvalidBody(format!(
                "bad dimensions {:?}",
                self.shape
            )));
        }
        if !self.position.is_finite() {
            return Err(PhysicsError::InvalidBody(format!(
                "non-finite position {}",
                self.position
            )));
        }
        Ok(())
    }
}

/// Rigid-body parameters attached to a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    /// Mass (0 = static)
    pub mass: f32,
    pub friction: Option<f32>,
    pub restitution: f32,
}

/// Capabilities consumed from the physics/rendering engine
pub trait PhysicsWorld {
    /// Create a render body (no physics yet)
    fn create_body(&mut self, desc: &BodyDesc) -> Result<BodyHandle, PhysicsError>;

    /// Attach rigid-body physics; fails if already attached
    fn attach_physics(
        &mut self,
        body: BodyHandle,
        material: PhysicsMaterial,
    ) -> Result<(), PhysicsError>;

    /// Apply an impulse at a world-space point
    fn apply_impulse(
        &mut self,
        body: BodyHandle,
        impulse: Vec3,
        at: Vec3,
    ) -> Result<(), PhysicsError>;

    /// Current world position, `None` once the body is gone
    fn position(&self, body: BodyHandle) -> Option<Vec3>;

    /// Release render and physics resources (idempotent)
    fn dispose(&mut self, body: BodyHandle);

    /// Advance the simulation by one display frame
    fn step(&mut self, dt: f32);
}

/// Create a body and attach physics as one step.
///
/// If attaching fails the body is disposed, so callers never hold a body
/// without physics.
pub fn spawn_body<W: PhysicsWorld + ?Sized>(
    world: &mut W,
    desc: &BodyDesc,
    material: PhysicsMaterial,
) -> Result<BodyHandle, PhysicsError> {
    desc.validate()?;
    if !material.mass.is_finite() || material.mass < 0.0 {
        return Err(PhysicsError::InvalidBody(format!(
            "bad mass {}",
            material.mass
        )));
    }

    let body = world.create_body(desc)?;
    if let Err(err) = world.attach_physics(body, material) {
        world.dispose(body);
        return Err(err);
    }
    Ok(body)
}
