//! Platform abstraction layer
//!
//! Host-side plumbing the simulation core runs on:
//! - Time: virtual-clock timeouts and intervals
//! - Input: key events, software key repeat, focus loss

pub mod input;
pub mod time;

pub use input::{InputController, KeyCode, default_bindings};
pub use time::{Fired, TimerId, TimerQueue};
