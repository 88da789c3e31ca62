//! Asteroids Enhanced entry point
//!
//! Runs the simulation headless with a simple autopilot, routing sound cues to
//! the log and writing progression on the events that request it. Usage:
//! `asteroids-enhanced [seed] [seconds]`.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use asteroids_enhanced::audio::{LogAudio, dispatch_events};
    use asteroids_enhanced::consts::*;
    use asteroids_enhanced::sim::{GameEvent, GamePhase, SimulationState, TickInput, tick};
    use asteroids_enhanced::{Settings, angle_between, normalize_degrees, persistence};

    const SETTINGS_FILE: &str = "asteroids_settings.json";

    /// Game instance holding all state
    struct Game {
        state: SimulationState,
        audio: LogAudio,
        accumulator: f32,
        input: TickInput,
        save_path: PathBuf,
        saves: u32,
    }

    impl Game {
        fn new(seed: u64, settings: &Settings, save_path: PathBuf) -> Self {
            let progress = persistence::load_or_default(&save_path);
            let mut audio = LogAudio::new(settings.master_volume, settings.sfx_volume);
            audio.set_muted(settings.master_volume <= 0.0);
            Self {
                state: SimulationState::new(seed, &settings.sim_config(), progress),
                audio,
                accumulator: 0.0,
                input: TickInput::default(),
                save_path,
                saves: 0,
            }
        }

        /// Run simulation ticks for `dt` seconds of wall time
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.input = autopilot(&self.state);
                tick(&mut self.state, &self.input);
                self.accumulator -= SIM_DT;
                substeps += 1;

                let events = self.state.drain_events();
                dispatch_events(&events, &mut self.audio);
                self.handle_events(&events);
            }
        }

        fn handle_events(&mut self, events: &[GameEvent]) {
            for event in events {
                match event {
                    GameEvent::SaveRequested => self.save(),
                    GameEvent::AchievementUnlocked(id) => {
                        log::info!("Achievement: {}", id.def().name);
                    }
                    GameEvent::BossWave { level } => log::info!("Boss wave on level {level}"),
                    GameEvent::GameOver { score } => log::info!("Final score {score}"),
                    _ => {}
                }
            }
        }

        fn save(&mut self) {
            match persistence::save_to_path(&self.save_path, &self.state.progress) {
                Ok(()) => self.saves += 1,
                Err(e) => log::warn!("Could not save progression: {e}"),
            }
        }
    }

    /// Steer toward the nearest threat, fire often and spend a charged finisher
    fn autopilot(state: &SimulationState) -> TickInput {
        if state.phase == GamePhase::GameOver {
            return TickInput::default();
        }

        let ship = &state.ship;
        let nearest = state
            .enemies
            .iter()
            .map(|e| e.body.pos)
            .chain(state.asteroids.iter().map(|a| a.body.pos))
            .min_by(|a, b| {
                a.distance_squared(ship.body.pos)
                    .partial_cmp(&b.distance_squared(ship.body.pos))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        let mut input = TickInput::default();
        if let Some(target) = nearest {
            let desired = normalize_degrees(angle_between(ship.body.pos, target));
            let diff = normalize_degrees(desired - ship.angle + 180.0) - 180.0;
            input.turn = (diff / SHIP_TURN_SPEED).clamp(-SHIP_TURN_INPUT_LIMIT, SHIP_TURN_INPUT_LIMIT);
            input.shoot = diff.abs() < 15.0;
            input.thrust = ship.body.pos.distance(target) > state.scaled(250.0);
        }
        input.dash = state.finisher.ready && !state.enemies.is_empty();
        input
    }

    pub fn run() {
        let mut args = std::env::args().skip(1);
        let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(0xA57E_0001_u64);
        let seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(120.0);

        let settings_path = PathBuf::from(SETTINGS_FILE);
        let settings = Settings::load(&settings_path);
        if !settings_path.exists() {
            // Leave an editable file behind on first run
            settings.save(&settings_path);
        }
        let mut game = Game::new(seed, &settings, PathBuf::from(persistence::SAVE_FILE_NAME));
        log::info!("Simulating {seconds:.0}s with seed {seed:#x}");

        // Uneven frame times exercise the accumulator
        let frame_times = [1.0 / 60.0, 1.0 / 45.0, 1.0 / 90.0];
        let mut elapsed = 0.0;
        let mut i = 0;
        while elapsed < seconds && game.state.phase != GamePhase::GameOver {
            let dt = frame_times[i % frame_times.len()];
            game.update(dt);
            elapsed += dt;
            i += 1;
        }

        let state = &game.state;
        println!("seed:         {seed:#x}");
        println!("frames:       {}", state.frame);
        println!("level:        {}", state.level);
        println!("score:        {}", state.score);
        println!("high score:   {}", state.progress.high_score);
        println!("lives:        {}", state.lives);
        println!("crystals:     {}", state.crystals);
        println!("best combo:   {}", state.combo.max.max(state.combo.current));
        println!("achievements: {}", state.progress.achievements.len());
        println!("sound cues:   {}", game.audio.played);
        println!("saves:        {}", game.saves);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Asteroids Enhanced (headless) starting...");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by an embedding frontend on the web
}
