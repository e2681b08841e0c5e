//! Tiltfall headless runner
//!
//! Plays rounds on the built-in physics world with a seeded autopilot at the
//! keys, restarting after every fall.
//!
//! Usage: `tiltfall [tuning.json] [rounds]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::time::{SystemTime, UNIX_EPOCH};

    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use tiltfall::platform::KeyCode;
    use tiltfall::sim::HeadlessWorld;
    use tiltfall::{GameSession, SessionError, SessionEvent, Tuning};

    /// One display frame (~60 Hz)
    const FRAME_MS: u64 = 16;
    /// Autopilot decision period
    const THINK_MS: u64 = 250;
    /// Give up on a round after this much virtual time
    const ROUND_LIMIT_MS: u64 = 30 * 60 * 1000;
    const DEFAULT_ROUNDS: u32 = 3;

    const KEYS: [KeyCode; 4] = [KeyCode::W, KeyCode::A, KeyCode::S, KeyCode::D];

    fn clock_seed() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    /// Press, release or blur at random
    fn autopilot(
        session: &mut GameSession<HeadlessWorld>,
        rng: &mut Pcg32,
    ) -> Result<(), SessionError> {
        let key = KEYS[rng.random_range(0..KEYS.len())];
        match rng.random_range(0..10) {
            0..6 => {
                session.key_down(key)?;
            }
            6..9 => {
                session.key_up(key);
            }
            _ => {
                session.blur();
            }
        }
        Ok(())
    }

    /// Play until the player falls or time runs out; returns waves reached
    fn play_round(
        session: &mut GameSession<HeadlessWorld>,
        pilot: &mut Pcg32,
    ) -> Result<u32, SessionError> {
        let start = session.now_ms();
        let mut now = start;
        let mut next_think = start;

        while now - start < ROUND_LIMIT_MS {
            now += FRAME_MS;
            session.frame(FRAME_MS as f32 / 1000.0);
            session.advance(now)?;

            if now >= next_think {
                autopilot(session, pilot)?;
                next_think = now + THINK_MS;
            }

            for event in session.drain_events() {
                match event {
                    SessionEvent::WavesSurvived(waves) => {
                        if waves.is_multiple_of(50) {
                            log::info!(
                                "Wave {} (pool {}, delay {}ms)",
                                waves,
                                session.pool().count(),
                                session.scheduler().interval_ms()
                            );
                        }
                    }
                    SessionEvent::GameOver { waves } => return Ok(waves),
                }
            }
        }

        log::warn!("Round hit the time limit");
        Ok(session.waves())
    }

    pub fn run() -> Result<(), SessionError> {
        let mut args = std::env::args().skip(1);
        let tuning = match args.next() {
            Some(path) => Tuning::load(path)?,
            None => Tuning::default(),
        };
        let rounds = args
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_ROUNDS);

        let mut seed = clock_seed();
        let mut pilot = Pcg32::seed_from_u64(seed ^ 0x5eed);
        let mut session = GameSession::new(HeadlessWorld::new(), tuning, seed)?;

        for round in 1..=rounds {
            let waves = play_round(&mut session, &mut pilot)?;
            log::info!("Round {} over (seed {})", round, seed);
            println!("Round {round}: survived {waves} waves");

            if round < rounds {
                seed = seed.wrapping_add(1);
                session = session.restart(seed)?;
            }
        }

        let world = session.teardown();
        log::info!("Done ({} bodies left)", world.live_bodies());
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Tiltfall (headless) starting...");

    if let Err(err) = native::run() {
        log::error!("{err}");
        eprintln!("tiltfall: {err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser host yet; the library is the deliverable on wasm
}
