//! Minimal built-in physics world
//!
//! Point-mass bodies under gravity over the arena's ramp and deck. No
//! body-body collision or angular motion; good enough to drive the core
//! without an engine and to observe it in tests.

use std::collections::BTreeMap;

use glam::Vec3;

use super::physics::{BodyDesc, BodyHandle, PhysicsMaterial, PhysicsWorld};
use crate::consts::GRAVITY;
use crate::error::PhysicsError;

/// Platform half-width along x
pub const PLATFORM_HALF_WIDTH: f32 = 7.5;
/// Ramp top edge (z, y)
pub const RAMP_TOP: (f32, f32) = (-4.9, 18.85);
/// Ramp bottom edge (z, y)
pub const RAMP_BOTTOM: (f32, f32) = (24.9, -14.85);
/// Flat deck height and z extent
pub const DECK_Y: f32 = -15.0;
pub const DECK_Z: (f32, f32) = (24.5, 39.5);

/// Deepest penetration still resolved as contact (thin planes)
const CONTACT_DEPTH: f32 = 2.0;
/// Velocity damping per unit friction per second while in contact
const FRICTION_DAMPING: f32 = 0.8;
/// Bounces slower than this come to rest
const REST_SPEED: f32 = 0.5;
const DEFAULT_FRICTION: f32 = 0.5;

#[derive(Debug, Clone)]
struct Body {
    desc: BodyDesc,
    position: Vec3,
    velocity: Vec3,
    material: Option<PhysicsMaterial>,
}

/// Surface under (x, z) and whether it is the slope
fn surface_at(x: f32, z: f32) -> Option<(f32, bool)> {
    if x.abs() > PLATFORM_HALF_WIDTH {
        return None;
    }

    let mut surface: Option<(f32, bool)> = None;
    let (z0, y0) = RAMP_TOP;
    let (z1, y1) = RAMP_BOTTOM;
    if (z0..=z1).contains(&z) {
        let t = (z - z0) / (z1 - z0);
        surface = Some((y0 + (y1 - y0) * t, true));
    }
    if (DECK_Z.0..=DECK_Z.1).contains(&z) {
        surface = match surface {
            Some((y, _)) if y > DECK_Y => surface,
            _ => Some((DECK_Y, false)),
        };
    }
    surface
}

/// Horizontal acceleration (+z) of a frictionless body resting on the ramp
fn ramp_slide_accel() -> f32 {
    let (z0, y0) = RAMP_TOP;
    let (z1, y1) = RAMP_BOTTOM;
    let angle = ((y0 - y1) / (z1 - z0)).atan();
    -GRAVITY * angle.sin() * angle.cos()
}

/// In-process physics world
#[derive(Debug, Default)]
pub struct HeadlessWorld {
    bodies: BTreeMap<BodyHandle, Body>,
    next_handle: u32,
}

impl HeadlessWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bodies not yet disposed
    pub fn live_bodies(&self) -> usize {
        self.bodies.len()
    }

    /// Teleport a body (test setup, debugging)
    pub fn set_position(&mut self, body: BodyHandle, position: Vec3) -> Result<(), PhysicsError> {
        let entry = self
            .bodies
            .get_mut(&body)
            .ok_or(PhysicsError::UnknownBody(body))?;
        entry.position = position;
        Ok(())
    }

    pub fn velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(&body).map(|b| b.velocity)
    }

    pub fn desc(&self, body: BodyHandle) -> Option<&BodyDesc> {
        self.bodies.get(&body).map(|b| &b.desc)
    }

    pub fn material(&self, body: BodyHandle) -> Option<PhysicsMaterial> {
        self.bodies.get(&body).and_then(|b| b.material)
    }
}

impl PhysicsWorld for HeadlessWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> Result<BodyHandle, PhysicsError> {
        desc.validate()?;
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(
            handle,
            Body {
                desc: *desc,
                position: desc.position,
                velocity: Vec3::ZERO,
                material: None,
            },
        );
        Ok(handle)
    }

    fn attach_physics(
        &mut self,
        body: BodyHandle,
        material: PhysicsMaterial,
    ) -> Result<(), PhysicsError> {
        let entry = self
            .bodies
            .get_mut(&body)
            .ok_or(PhysicsError::UnknownBody(body))?;
        if entry.material.is_some() {
            return Err(PhysicsError::AlreadyAttached(body));
        }
        entry.material = Some(material);
        Ok(())
    }

    fn apply_impulse(
        &mut self,
        body: BodyHandle,
        impulse: Vec3,
        _at: Vec3,
    ) -> Result<(), PhysicsError> {
        let entry = self
            .bodies
            .get_mut(&body)
            .ok_or(PhysicsError::UnknownBody(body))?;
        // Static or physics-less bodies don't move
        if let Some(material) = entry.material {
            if material.mass > 0.0 {
                entry.velocity += impulse / material.mass;
            }
        }
        Ok(())
    }

    fn position(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(&body).map(|b| b.position)
    }

    fn dispose(&mut self, body: BodyHandle) {
        self.bodies.remove(&body);
    }

    fn step(&mut self, dt: f32) {
        let slide = ramp_slide_accel();

        for body in self.bodies.values_mut() {
            let Some(material) = body.material else {
                continue;
            };
            if material.mass <= 0.0 {
                continue;
            }

            body.velocity.y += GRAVITY * dt;
            body.position += body.velocity * dt;

            let half = body.desc.shape.half_height();
            let bottom = body.position.y - half;
            let Some((surface, on_ramp)) = surface_at(body.position.x, body.position.z) else {
                continue;
            };
            if bottom >= surface || surface - bottom > CONTACT_DEPTH {
                continue;
            }

            // Resting contact
            body.position.y = surface + half;
            if body.velocity.y < 0.0 {
                body.velocity.y = -body.velocity.y * material.restitution;
                if body.velocity.y < REST_SPEED {
                    body.velocity.y = 0.0;
                }
            }
            if on_ramp {
                body.velocity.z += slide * dt;
            }

            let friction = material.friction.unwrap_or(DEFAULT_FRICTION);
            let damping = (1.0 - friction * FRICTION_DAMPING * dt).max(0.0);
            body.velocity.x *= damping;
            body.velocity.z *= damping;
        }
    }
}
