//! Tiltfall - survive a growing rain of shapes on a tilted platform
//!
//! Core modules:
//! - `sim`: Spawn scheduler, entity pool, physics capability seam
//! - `platform`: Host timers and keyboard input
//! - `session`: Playing/GameOver state machine and restart
//! - `settings`: Data-driven gameplay tuning

pub mod error;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, PhysicsError, SessionError};
pub use session::{GameSession, SessionEvent, SessionTimer};
pub use settings::Tuning;

/// Game configuration constants
pub mod consts {
    /// Maximum live (non-player) entities
    pub const MAX_ENTITIES: usize = 400;
    /// Non-player entities below this height are pruned
    pub const DIE_AT_Y: f32 = -25.0;
    /// Player below this height ends the session
    pub const GAME_OVER_Y: f32 = -30.0;

    /// Spawn scheduler delay ramp (milliseconds)
    pub const INITIAL_INTERVAL_MS: u32 = 1000;
    pub const INTERVAL_STEP_MS: u32 = 10;
    pub const MIN_INTERVAL_MS: u32 = 50;

    /// Software key-repeat period (milliseconds, 0 = no repeat)
    pub const KEY_REPEAT_MS: u32 = 50;
    /// Impulse applied per key firing
    pub const IMPULSE_STRENGTH: f32 = 5.0;

    /// Player body
    pub const PLAYER_DIAMETER: f32 = 1.5;
    pub const PLAYER_MASS: f32 = 2.0;
    pub const PLAYER_FRICTION: f32 = 1.0;
    pub const PLAYER_RESTITUTION: f32 = 0.5;
    pub const PLAYER_START: [f32; 3] = [0.0, -14.0, 26.0];

    /// Spawned shape ranges (min, max)
    pub const SHAPE_SIZE: (f32, f32) = (0.5, 3.0);
    pub const SHAPE_MASS: (f32, f32) = (10.0, 20.0);
    pub const SHAPE_RESTITUTION: (f32, f32) = (0.4, 0.6);
    pub const SPAWN_X: (f32, f32) = (-5.0, 5.0);
    pub const SPAWN_Y: (f32, f32) = (15.0, 35.0);
    pub const SPAWN_Z: (f32, f32) = (0.0, 5.0);
    /// Colour channel ranges (red, green, blue)
    pub const COLOR_RG: (f32, f32) = (0.5, 6.0);
    pub const COLOR_B: (f32, f32) = (0.5, 3.0);
    /// Box tilt divisor: rotation angle is PI / U(min, max)
    pub const TILT_DIVISOR: (f32, f32) = (1.0, 4.0);

    /// World gravity (y axis)
    pub const GRAVITY: f32 = -19.81;
}
