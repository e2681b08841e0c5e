//! Simulation core
//!
//! Gameplay rules with no platform dependencies:
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - Physics reached only through the [`PhysicsWorld`] trait

pub mod headless;
pub mod physics;
pub mod pool;
pub mod scheduler;
pub mod spawn;
pub mod state;

pub use headless::HeadlessWorld;
pub use physics::{BodyDesc, BodyHandle, PhysicsMaterial, PhysicsWorld, Shape, ShapeKind, spawn_body};
pub use pool::EntityPool;
pub use scheduler::{SpawnScheduler, TickOutcome, TickReport};
pub use spawn::{roll_shape, spawn_plan};
pub use state::{Entity, EntityId, GamePhase};
