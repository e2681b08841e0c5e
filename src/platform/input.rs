//! Keyboard input with software key repeat
//!
//! Held keys re-fire on a timer instead of relying on OS auto-repeat, and a
//! window blur drops every held key since no key-up will arrive for them.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::time::{TimerId, TimerQueue};
use crate::error::PhysicsError;
use crate::sim::{BodyHandle, PhysicsWorld};

/// Raw key code as delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const A: KeyCode = KeyCode(65);
    pub const D: KeyCode = KeyCode(68);
    pub const S: KeyCode = KeyCode(83);
    pub const W: KeyCode = KeyCode(87);
}

/// Default WASD impulse directions (unit length)
pub fn default_bindings() -> HashMap<KeyCode, Vec3> {
    HashMap::from([
        (KeyCode::A, Vec3::X),
        (KeyCode::W, Vec3::NEG_Z),
        (KeyCode::D, Vec3::NEG_X),
        (KeyCode::S, Vec3::Z),
    ])
}

/// Maps held keys to impulses on the player body
#[derive(Debug)]
pub struct InputController {
    /// Impulse per bound key
    bindings: HashMap<KeyCode, Vec3>,
    /// Held keys and their repeat timer (`None` when repeat is off)
    active: HashMap<KeyCode, Option<TimerId>>,
    repeat_interval_ms: u32,
}

impl InputController {
    /// Bind WASD with the given impulse magnitude
    pub fn new(repeat_interval_ms: u32, impulse_strength: f32) -> Self {
        let bindings = default_bindings()
            .into_iter()
            .map(|(key, dir)| (key, dir * impulse_strength))
            .collect();
        Self::with_bindings(bindings, repeat_interval_ms)
    }

    pub fn with_bindings(bindings: HashMap<KeyCode, Vec3>, repeat_interval_ms: u32) -> Self {
        Self {
            bindings,
            active: HashMap::new(),
            repeat_interval_ms,
        }
    }

    pub fn is_bound(&self, key: KeyCode) -> bool {
        self.bindings.contains_key(&key)
    }

    pub fn is_active(&self, key: KeyCode) -> bool {
        self.active.contains_key(&key)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Repeat timer currently armed for `key`
    pub fn repeat_timer(&self, key: KeyCode) -> Option<TimerId> {
        self.active.get(&key).copied().flatten()
    }

    /// Apply the key's impulse at the player's current position
    pub fn fire<W: PhysicsWorld + ?Sized>(
        &self,
        key: KeyCode,
        world: &mut W,
        player: BodyHandle,
    ) -> Result<(), PhysicsError> {
        let Some(&impulse) = self.bindings.get(&key) else {
            return Ok(());
        };
        let at = world
            .position(player)
            .ok_or(PhysicsError::UnknownBody(player))?;
        world.apply_impulse(player, impulse, at)
    }

    /// Handle key-down. Returns whether the key is bound (consumed).
    ///
    /// A fresh press fires immediately and arms one repeat timer; a press
    /// for a key already held does nothing.
    pub fn key_down<T, W>(
        &mut self,
        key: KeyCode,
        timers: &mut TimerQueue<T>,
        world: &mut W,
        player: BodyHandle,
    ) -> Result<bool, PhysicsError>
    where
        T: From<KeyCode>,
        W: PhysicsWorld + ?Sized,
    {
        if !self.is_bound(key) {
            return Ok(false);
        }
        if self.is_active(key) {
            return Ok(true);
        }

        self.fire(key, world, player)?;
        let timer = (self.repeat_interval_ms != 0)
            .then(|| timers.set_interval(u64::from(self.repeat_interval_ms), T::from(key)));
        self.active.insert(key, timer);
        log::trace!("Key {:?} down (repeat {:?})", key, timer);
        Ok(true)
    }

    /// Handle key-up. Returns whether the key was held.
    pub fn key_up<T>(&mut self, key: KeyCode, timers: &mut TimerQueue<T>) -> bool {
        match self.active.remove(&key) {
            Some(timer) => {
                if let Some(id) = timer {
                    timers.cancel(id);
                }
                log::trace!("Key {:?} up", key);
                true
            }
            None => false,
        }
    }

    /// Repeat timer fired; only the key's current timer may fire it
    pub fn on_repeat<W: PhysicsWorld + ?Sized>(
        &self,
        key: KeyCode,
        timer: TimerId,
        world: &mut W,
        player: BodyHandle,
    ) -> Result<bool, PhysicsError> {
        if self.repeat_timer(key) != Some(timer) {
            return Ok(false);
        }
        self.fire(key, world, player)?;
        Ok(true)
    }

    /// Window lost focus: release every held key regardless of state.
    /// Returns how many keys were released.
    pub fn blur<T>(&mut self, timers: &mut TimerQueue<T>) -> usize {
        let released = self.active.len();
        for timer in self.active.drain().filter_map(|(_, timer)| timer) {
            timers.cancel(timer);
        }
        if released > 0 {
            log::trace!("Blur released {} key(s)", released);
        }
        released
    }
}
