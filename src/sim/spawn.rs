//! Shape generation
//!
//! Which shapes a tick spawns is a pure function of the tick index; only
//! their size, colour, placement and material are random.

use std::f32::consts::PI;

use glam::{Quat, Vec3};
use rand::Rng;

use super::physics::{BodyDesc, PhysicsMaterial, Shape, ShapeKind};
use crate::consts::*;

/// Shapes spawned on tick `n`, in construction order.
///
/// Even ticks drop a sphere, odd ticks a box, and every third tick adds an
/// extra sphere.
pub fn spawn_plan(n: u32) -> Vec<ShapeKind> {
    let mut plan = Vec::with_capacity(2);
    if n.is_multiple_of(2) {
        plan.push(ShapeKind::Sphere);
    } else {
        plan.push(ShapeKind::Box);
    }
    if n.is_multiple_of(3) {
        plan.push(ShapeKind::Sphere);
    }
    plan
}

fn uniform<R: Rng>(rng: &mut R, (min, max): (f32, f32)) -> f32 {
    rng.random_range(min..max)
}

/// Roll a randomised body for a falling shape
pub fn roll_shape<R: Rng>(
    rng: &mut R,
    kind: ShapeKind,
    spawn_height: (f32, f32),
) -> (BodyDesc, PhysicsMaterial) {
    let (shape, rotation) = match kind {
        ShapeKind::Sphere => (
            Shape::Sphere {
                diameter: uniform(rng, SHAPE_SIZE),
            },
            Quat::IDENTITY,
        ),
        ShapeKind::Box => {
            let size = Vec3::new(
                uniform(rng, SHAPE_SIZE),
                uniform(rng, SHAPE_SIZE),
                uniform(rng, SHAPE_SIZE),
            );
            // World-space X tilt, then world-space Y tilt
            let tilt_x = Quat::from_rotation_x(PI / uniform(rng, TILT_DIVISOR));
            let tilt_y = Quat::from_rotation_y(PI / uniform(rng, TILT_DIVISOR));
            (Shape::Box { size }, tilt_y * tilt_x)
        }
    };

    let color = Vec3::new(
        uniform(rng, COLOR_RG),
        uniform(rng, COLOR_RG),
        uniform(rng, COLOR_B),
    );
    let position = Vec3::new(
        uniform(rng, SPAWN_X),
        uniform(rng, spawn_height),
        uniform(rng, SPAWN_Z),
    );
    let material = PhysicsMaterial {
        mass: uniform(rng, SHAPE_MASS),
        friction: None,
        restitution: uniform(rng, SHAPE_RESTITUTION),
    };

    (
        BodyDesc {
            shape,
            position,
            rotation,
            color,
        },
        material,
    )
}
