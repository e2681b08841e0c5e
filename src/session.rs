//! Game session: the Playing/GameOver state machine
//!
//! A session owns the physics world, the player body, the entity pool, the
//! spawn scheduler, the input bindings and every pending timer. Restarting
//! tears all of it down and builds a fresh session; nothing is reset in
//! place.

use glam::{Quat, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SessionError;
use crate::platform::{InputController, KeyCode, TimerId, TimerQueue};
use crate::settings::Tuning;
use crate::sim::{
    BodyDesc, BodyHandle, EntityPool, GamePhase, PhysicsMaterial, PhysicsWorld, Shape,
    SpawnScheduler, TickOutcome, spawn_body,
};

/// Payloads carried by session timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTimer {
    /// Run the next spawn scheduler tick
    SpawnTick,
    /// Re-fire a held key
    KeyRepeat(KeyCode),
}

impl From<KeyCode> for SessionTimer {
    fn from(key: KeyCode) -> Self {
        SessionTimer::KeyRepeat(key)
    }
}

/// Notifications for the HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Waves survived so far (once per tick)
    WavesSurvived(u32),
    /// Player fell off; a restart may be requested
    GameOver { waves: u32 },
}

/// One run from spawn to fall
#[derive(Debug)]
pub struct GameSession<W: PhysicsWorld> {
    world: W,
    tuning: Tuning,
    seed: u64,
    rng: Pcg32,
    phase: GamePhase,
    player: BodyHandle,
    pool: EntityPool,
    scheduler: SpawnScheduler,
    input: InputController,
    timers: TimerQueue<SessionTimer>,
    /// Armed scheduler tick, if any
    tick_timer: Option<TimerId>,
    events: Vec<SessionEvent>,
}

fn player_body() -> (BodyDesc, PhysicsMaterial) {
    (
        BodyDesc {
            shape: Shape::Sphere {
                diameter: PLAYER_DIAMETER,
            },
            position: Vec3::from_array(PLAYER_START),
            rotation: Quat::IDENTITY,
            color: Vec3::ONE,
        },
        PhysicsMaterial {
            mass: PLAYER_MASS,
            friction: Some(PLAYER_FRICTION),
            restitution: PLAYER_RESTITUTION,
        },
    )
}

impl<W: PhysicsWorld> GameSession<W> {
    /// Enter `Playing`: create the player, bind input, arm the first tick.
    ///
    /// The first scheduler tick is due immediately.
    pub fn new(mut world: W, tuning: Tuning, seed: u64) -> Result<Self, SessionError> {
        tuning.validate()?;

        let (desc, material) = player_body();
        let player = spawn_body(&mut world, &desc, material)?;

        let mut timers = TimerQueue::new();
        let tick_timer = Some(timers.set_timeout(0, SessionTimer::SpawnTick));

        log::info!("Session started with seed: {}", seed);

        Ok(Self {
            world,
            rng: Pcg32::seed_from_u64(seed),
            seed,
            phase: GamePhase::Playing,
            player,
            pool: EntityPool::new(tuning.max_entities),
            scheduler: SpawnScheduler::new(&tuning),
            input: InputController::new(tuning.repeat_interval_ms, tuning.impulse_strength),
            timers,
            tick_timer,
            events: Vec::new(),
            tuning,
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Waves survived (the scheduler's tick counter)
    pub fn waves(&self) -> u32 {
        self.scheduler.increment()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn player(&self) -> BodyHandle {
        self.player
    }

    pub fn pool(&self) -> &EntityPool {
        &self.pool
    }

    pub fn scheduler(&self) -> &SpawnScheduler {
        &self.scheduler
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    /// Direct world access (debug tools, tests)
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Whether a scheduler tick is armed
    pub fn tick_pending(&self) -> bool {
        self.tick_timer.is_some_and(|id| self.timers.is_pending(id))
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending_count()
    }

    /// Session clock (ms)
    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    /// Player height; a vanished body reads as fallen
    pub fn player_height(&self) -> f32 {
        match self.world.position(self.player) {
            Some(pos) => pos.y,
            None => {
                log::warn!("Player body {:?} is missing", self.player);
                f32::NEG_INFINITY
            }
        }
    }

    /// Render-loop callback: step physics by one frame
    pub fn frame(&mut self, dt: f32) {
        self.world.step(dt);
    }

    /// Fire every timer due by `now_ms`, in due order
    pub fn advance(&mut self, now_ms: u64) -> Result<(), SessionError> {
        while let Some(fired) = self.timers.pop_due(now_ms) {
            match fired.payload {
                SessionTimer::SpawnTick => {
                    if self.tick_timer == Some(fired.id) {
                        self.tick()?;
                    }
                }
                SessionTimer::KeyRepeat(key) => {
                    self.input
                        .on_repeat(key, fired.id, &mut self.world, self.player)?;
                }
            }
        }
        Ok(())
    }

    /// Run one scheduler tick.
    ///
    /// The next tick is armed before any work is done, so a failed spawn
    /// only loses that tick's remaining shapes; the session keeps ticking.
    /// The armed tick is cancelled once the phase reaches `GameOver`.
    pub fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        let was_playing = self.phase == GamePhase::Playing;
        if let Some(id) = self.tick_timer.take() {
            self.timers.cancel(id);
        }
        if was_playing {
            // Pre-ramp delay, same as the scheduler's `Continue` delay
            let delay = u64::from(self.scheduler.interval_ms());
            self.tick_timer = Some(self.timers.set_timeout(delay, SessionTimer::SpawnTick));
        }

        let player_y = self.player_height();
        let result = self.scheduler.tick(
            &mut self.phase,
            player_y,
            &mut self.pool,
            &mut self.world,
            &mut self.rng,
            &self.tuning,
        );

        if was_playing {
            let waves = self.scheduler.increment();
            self.push_event(SessionEvent::WavesSurvived(waves));
            if self.phase == GamePhase::GameOver {
                if let Some(id) = self.tick_timer.take() {
                    self.timers.cancel(id);
                }
                self.push_event(SessionEvent::GameOver { waves });
                log::info!("Game over after {} waves", waves);
            }
        }

        match result {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                log::warn!("Spawn tick aborted: {}", err);
                Err(err.into())
            }
        }
    }

    /// Queue a HUD notification; an unread wave count is overwritten
    fn push_event(&mut self, event: SessionEvent) {
        match (event, self.events.last_mut()) {
            (SessionEvent::WavesSurvived(waves), Some(SessionEvent::WavesSurvived(last))) => {
                *last = waves;
            }
            _ => self.events.push(event),
        }
    }

    /// Key pressed. Returns whether the key is bound.
    pub fn key_down(&mut self, key: KeyCode) -> Result<bool, SessionError> {
        let consumed = self
            .input
            .key_down(key, &mut self.timers, &mut self.world, self.player)?;
        Ok(consumed)
    }

    /// Key released. Returns whether it was held.
    pub fn key_up(&mut self, key: KeyCode) -> bool {
        self.input.key_up(key, &mut self.timers)
    }

    /// Window lost focus
    pub fn blur(&mut self) -> usize {
        self.input.blur(&mut self.timers)
    }

    /// Take pending HUD notifications.
    ///
    /// Hosts drain this once per frame. Between drains consecutive wave
    /// counts collapse into the latest one, and a session emits at most one
    /// `GameOver`, so the queue stays bounded either way.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Release every body, binding and timer and hand back the world
    pub fn teardown(mut self) -> W {
        self.input.blur(&mut self.timers);
        self.timers.clear();
        self.tick_timer = None;
        self.pool.clear(&mut self.world);
        self.world.dispose(self.player);
        log::info!(
            "Session torn down at {} waves ({:?})",
            self.scheduler.increment(),
            self.phase
        );
        self.world
    }

    /// Tear down and start a brand-new session on the same world
    pub fn restart(self, seed: u64) -> Result<Self, SessionError> {
        if self.phase == GamePhase::Playing {
            log::warn!("Restart requested while still playing");
        }
        let tuning = self.tuning.clone();
        let world = self.teardown();
        Self::new(world, tuning, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhysicsError;
    use crate::sim::{HeadlessWorld, ShapeKind};

    /// Headless world whose engine can be told to refuse the next body
    #[derive(Debug, Default)]
    struct FlakyWorld {
        inner: HeadlessWorld,
        fail_next: bool,
    }

    impl PhysicsWorld for FlakyWorld {
        fn create_body(&mut self, desc: &BodyDesc) -> Result<BodyHandle, PhysicsError> {
            if std::mem::take(&mut self.fail_next) {
                return Err(PhysicsError::InvalidBody("engine refused body".into()));
            }
            self.inner.create_body(desc)
        }

        fn attach_physics(
            &mut self,
            body: BodyHandle,
            material: PhysicsMaterial,
        ) -> Result<(), PhysicsError> {
            self.inner.attach_physics(body, material)
        }

        fn apply_impulse(
            &mut self,
            body: BodyHandle,
            impulse: Vec3,
            at: Vec3,
        ) -> Result<(), PhysicsError> {
            self.inner.apply_impulse(body, impulse, at)
        }

        fn position(&self, body: BodyHandle) -> Option<Vec3> {
            self.inner.position(body)
        }

        fn dispose(&mut self, body: BodyHandle) {
            self.inner.dispose(body);
        }

        fn step(&mut self, dt: f32) {
            self.inner.step(dt);
        }
    }

    fn session() -> GameSession<HeadlessWorld> {
        GameSession::new(HeadlessWorld::new(), Tuning::default(), 1234).unwrap()
    }

    fn drop_player(session: &mut GameSession<HeadlessWorld>, y: f32) {
        let player = session.player();
        session
            .world_mut()
            .set_position(player, Vec3::new(0.0, y, 26.0))
            .unwrap();
    }

    /// Drive frames and timers in lockstep for `ms` of virtual time
    fn run_for(session: &mut GameSession<HeadlessWorld>, ms: u64) {
        let start = session.now_ms();
        let mut t = start;
        while t < start + ms {
            t += 16;
            session.frame(0.016);
            session.advance(t).unwrap();
            assert!(session.pool().count() <= session.tuning().max_entities);
        }
    }

    #[test]
    fn test_new_session_starts_playing() {
        let session = session();
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.waves(), 1);
        assert_eq!(session.scheduler().interval_ms(), 1000);
        assert!(session.pool().is_empty());
        assert!(session.tick_pending());
        assert_eq!(session.world().live_bodies(), 1);
    }

    #[test]
    fn test_invalid_tuning_aborts_construction() {
        let tuning = Tuning {
            max_entities: 0,
            ..Default::default()
        };
        let result = GameSession::new(HeadlessWorld::new(), tuning, 1);
        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    #[test]
    fn test_first_tick() {
        let mut session = session();

        session.advance(0).unwrap();

        assert_eq!(session.waves(), 2);
        assert_eq!(session.scheduler().interval_ms(), 990);
        assert_eq!(session.pool().count(), 1);
        assert_eq!(session.pool().iter().next().unwrap().kind(), ShapeKind::Box);
        assert_eq!(session.drain_events(), vec![SessionEvent::WavesSurvived(2)]);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_ticks_follow_ramp() {
        let mut session = session();
        session.advance(0).unwrap();
        session.advance(999).unwrap();
        assert_eq!(session.waves(), 2);
        session.advance(1000).unwrap();
        assert_eq!(session.waves(), 3);
        session.advance(1989).unwrap();
        assert_eq!(session.waves(), 3);
        session.advance(1990).unwrap();
        assert_eq!(session.waves(), 4);
    }

    #[test]
    fn test_fall_ends_session() {
        let mut session = session();
        session.advance(0).unwrap();
        session.drain_events();
        drop_player(&mut session, -31.0);

        session.advance(1000).unwrap();

        assert_eq!(session.phase(), GamePhase::GameOver);
        assert_eq!(
            session.drain_events(),
            vec![
                SessionEvent::WavesSurvived(3),
                SessionEvent::GameOver { waves: 3 }
            ]
        );
        assert!(!session.tick_pending());
        assert_eq!(session.pending_timers(), 0);
    }

    #[test]
    fn test_game_over_is_frozen() {
        let mut session = session();
        drop_player(&mut session, -31.0);
        session.advance(0).unwrap();
        let waves = session.waves();
        let pool = session.pool().count();

        session.advance(60_000).unwrap();
        let outcome = session.tick().unwrap();

        assert_eq!(outcome, TickOutcome::GameOver { waves });
        assert_eq!(session.waves(), waves);
        assert_eq!(session.pool().count(), pool);
        // Exactly one game-over notification
        let game_overs = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);
    }

    #[test]
    fn test_keys_push_player() {
        let mut session = session();
        let player = session.player();
        assert!(session.key_down(KeyCode::W).unwrap());
        assert_eq!(
            session.world().velocity(player).unwrap(),
            Vec3::new(0.0, 0.0, -2.5)
        );
        // One repeat timer plus the scheduler tick
        assert_eq!(session.pending_timers(), 2);

        session.advance(0).unwrap();
        session.advance(100).unwrap();
        assert_eq!(
            session.world().velocity(player).unwrap(),
            Vec3::new(0.0, 0.0, -7.5)
        );

        assert!(session.key_up(KeyCode::W));
        assert_eq!(session.pending_timers(), 1);
        assert!(!session.key_down(KeyCode(13)).unwrap());
    }

    #[test]
    fn test_blur_keeps_scheduler() {
        let mut session = session();
        session.key_down(KeyCode::A).unwrap();
        session.key_down(KeyCode::D).unwrap();
        assert_eq!(session.blur(), 2);
        assert_eq!(session.input().active_count(), 0);
        assert_eq!(session.pending_timers(), 1);
        assert!(session.tick_pending());
    }

    #[test]
    fn test_capacity_holds_over_long_run() {
        let mut session = session();
        run_for(&mut session, 90_000);
        assert!(session.waves() > 100);
        assert!(session.pool().count() <= MAX_ENTITIES);
        assert_eq!(session.scheduler().interval_ms(), MIN_INTERVAL_MS);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let mut session = session();
        session.key_down(KeyCode::S).unwrap();
        run_for(&mut session, 5_000);
        assert!(!session.pool().is_empty());

        let world = session.teardown();

        assert_eq!(world.live_bodies(), 0);
    }

    #[test]
    fn test_restart_builds_fresh_session() {
        let mut session = session();
        session.key_down(KeyCode::A).unwrap();
        run_for(&mut session, 3_000);
        drop_player(&mut session, -40.0);
        run_for(&mut session, 2_000);
        assert!(session.is_game_over());

        let mut session = session.restart(99).unwrap();

        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.seed(), 99);
        assert_eq!(session.waves(), 1);
        assert_eq!(session.scheduler().interval_ms(), 1000);
        assert!(session.pool().is_empty());
        assert_eq!(session.input().active_count(), 0);
        assert_eq!(session.pending_timers(), 1);
        assert_eq!(session.world().live_bodies(), 1);
        assert!(session.drain_events().is_empty());
        assert!(session.player_height() > -15.0);
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = session();
        let mut b = session();
        for s in [&mut a, &mut b] {
            s.key_down(KeyCode::D).unwrap();
            run_for(s, 2_000);
            s.key_up(KeyCode::D);
            run_for(s, 2_000);
        }
        let heights = |s: &GameSession<HeadlessWorld>| -> Vec<(ShapeKind, f32)> {
            s.pool().iter().map(|e| (e.kind(), e.height(s.world()))).collect()
        };
        assert_eq!(heights(&a), heights(&b));
        assert_eq!(a.player_height(), b.player_height());
    }

    #[test]
    fn test_player_body_defaults() {
        let session = session();
        let player = session.player();
        let desc = session.world().desc(player).unwrap();
        assert_eq!(desc.shape, Shape::Sphere { diameter: 1.5 });
        assert_eq!(desc.position, Vec3::new(0.0, -14.0, 26.0));
        assert_eq!(
            session.world().material(player),
            Some(PhysicsMaterial {
                mass: 2.0,
                friction: Some(1.0),
                restitution: 0.5,
            })
        );
        assert_eq!(session.pool().capacity(), MAX_ENTITIES);
    }

    #[test]
    fn test_failed_spawn_keeps_ticking() {
        let mut session = GameSession::new(FlakyWorld::default(), Tuning::default(), 7).unwrap();
        session.advance(0).unwrap();
        session.drain_events();

        // Tick 2 wants a single sphere; the engine refuses it
        session.world_mut().fail_next = true;
        assert!(matches!(
            session.advance(1000),
            Err(SessionError::Physics(PhysicsError::InvalidBody(_)))
        ));

        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.waves(), 3);
        assert_eq!(session.pool().count(), 1);
        assert!(session.tick_pending());
        assert_eq!(session.drain_events(), vec![SessionEvent::WavesSurvived(3)]);

        session.advance(1989).unwrap();
        assert_eq!(session.waves(), 3);
        session.advance(1990).unwrap();
        assert_eq!(session.waves(), 4);
        assert_eq!(session.pool().count(), 3);
        assert!(session.tick_pending());
    }

    #[test]
    fn test_failed_spawn_on_final_tick_still_ends() {
        let mut session = GameSession::new(FlakyWorld::default(), Tuning::default(), 7).unwrap();
        session.advance(0).unwrap();
        session.drain_events();
        let player = session.player();
        session
            .world_mut()
            .inner
            .set_position(player, Vec3::new(0.0, -31.0, 26.0))
            .unwrap();
        session.world_mut().fail_next = true;

        assert!(session.advance(1000).is_err());

        assert!(session.is_game_over());
        assert!(!session.tick_pending());
        assert_eq!(session.pending_timers(), 0);
        assert_eq!(
            session.drain_events(),
            vec![
                SessionEvent::WavesSurvived(3),
                SessionEvent::GameOver { waves: 3 }
            ]
        );
    }

    #[test]
    fn test_undrained_wave_counts_collapse() {
        let mut session = session();
        session.advance(5_000).unwrap();
        assert!(session.waves() > 5);

        assert_eq!(
            session.drain_events(),
            vec![SessionEvent::WavesSurvived(session.waves())]
        );
    }
}
