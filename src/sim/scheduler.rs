//! Difficulty-ramping spawn scheduler
//!
//! One call to [`SpawnScheduler::tick`] is one firing of the host timer.
//! The returned outcome tells the host whether (and when) to fire again.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::physics::PhysicsWorld;
use super::pool::EntityPool;
use super::spawn::{roll_shape, spawn_plan};
use super::state::{Entity, GamePhase};
use crate::error::PhysicsError;
use crate::settings::Tuning;

/// What the host should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// Fire the next tick after `delay_ms`
    Continue { delay_ms: u32 },
    /// Session ended; stop ticking and offer a restart
    GameOver { waves: u32 },
}

/// Per-tick bookkeeping for logging and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TickReport {
    /// Tick index the spawn rule was evaluated on
    pub index: u32,
    pub spawned: usize,
    pub pruned: usize,
    pub pool_size: usize,
}

/// Tick counter and delay ramp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnScheduler {
    /// Waves survived so far (starts at 1)
    increment: u32,
    /// Delay until the next tick
    interval_ms: u32,
    interval_step_ms: u32,
    min_interval_ms: u32,
    /// Report from the most recent tick
    #[serde(skip)]
    last_report: TickReport,
}

impl SpawnScheduler {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            increment: 1,
            interval_ms: tuning.initial_interval_ms,
            interval_step_ms: tuning.interval_step_ms,
            min_interval_ms: tuning.min_interval_ms,
            last_report: TickReport::default(),
        }
    }

    pub fn increment(&self) -> u32 {
        self.increment
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn last_report(&self) -> TickReport {
        self.last_report
    }

    /// Tighten the delay, never below the floor
    fn ramp(&mut self) {
        if self.interval_ms > self.min_interval_ms {
            self.interval_ms = self
                .interval_ms
                .saturating_sub(self.interval_step_ms)
                .max(self.min_interval_ms);
        }
    }

    /// Run one scheduler tick.
    ///
    /// Order is fixed: arm, count, ramp, game-over check, spawn, prune.
    /// `player_y` is sampled before any of this tick's spawns exist. Once
    /// `phase` is `GameOver` the tick does nothing and reports the frozen
    /// wave count.
    #[allow(clippy::too_many_arguments)]
    pub fn tick<W: PhysicsWorld + ?Sized, R: Rng>(
        &mut self,
        phase: &mut GamePhase,
        player_y: f32,
        pool: &mut EntityPool,
        world: &mut W,
        rng: &mut R,
        tuning: &Tuning,
    ) -> Result<TickOutcome, PhysicsError> {
        if *phase == GamePhase::GameOver {
            return Ok(TickOutcome::GameOver {
                waves: self.increment,
            });
        }

        // Next tick is armed with the delay in force before this tick's ramp
        let next_delay = self.interval_ms;
        let index = self.increment;
        self.increment += 1;
        self.ramp();

        if player_y < tuning.game_over_y {
            *phase = GamePhase::GameOver;
        }

        let mut spawned = 0;
        for kind in spawn_plan(index) {
            if pool.is_full() {
                break;
            }
            let (desc, material) = roll_shape(rng, kind, tuning.spawn_height);
            let id = pool.next_entity_id();
            let entity = Entity::spawn(world, id, &desc, material, index)?;
            if let Err(rejected) = pool.add(entity) {
                world.dispose(rejected.body());
                break;
            }
            spawned += 1;
        }

        let pruned = pool.prune_below(world, tuning.death_y);

        self.last_report = TickReport {
            index,
            spawned,
            pruned,
            pool_size: pool.count(),
        };
        log::debug!(
            "Tick {}: next in {}ms, spawned {}, pruned {}, pool {}",
            index,
            next_delay,
            spawned,
            pruned,
            pool.count()
        );

        Ok(match *phase {
            GamePhase::Playing => TickOutcome::Continue {
                delay_ms: next_delay,
            },
            GamePhase::GameOver => TickOutcome::GameOver {
                waves: self.increment,
            },
        })
    }
}
