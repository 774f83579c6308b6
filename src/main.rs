//! Subzero entry point
//!
//! In the browser the page drives `subzero::web::WebRun` and the start hook
//! lives in the library. Natively this runs a headless autopilot: the
//! player circles the origin, shoots the nearest enemy with the right
//! polarity, and always takes the first upgrade offered.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(12345);
    let tuning = match args.next() {
        Some(path) => match load_tuning(&path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => subzero::Tuning::default(),
    };

    let summary = headless::run(&tuning, seed, 10 * 60 * 1000);
    println!(
        "seed {}: reached round {} with {} points ({} kills, {} upgrades){}",
        seed,
        summary.round,
        summary.score,
        summary.kills,
        summary.upgrades,
        if summary.game_over { ", game over" } else { "" }
    );

    let mut board = subzero::HighScores::load();
    if let Some(rank) = board.add_score("autopilot", summary.score) {
        println!("leaderboard rank #{}", rank);
        board.save();
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn load_tuning(path: &str) -> Result<subzero::Tuning, String> {
    let json = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
    subzero::Tuning::from_json(&json).map_err(|e| format!("{}: {}", path, e))
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use subzero::Tuning;
    use subzero::polar_to_cartesian;
    use subzero::sim::{GameEvent, GameState, HitOutcome, Projectile, TickInput, tick};

    const FRAME_MS: f32 = 1000.0 / 60.0;
    const ORBIT_RADIUS: f32 = 300.0;
    /// Radians per second
    const ORBIT_SPEED: f32 = 0.2;
    /// Shots land on targets closer than this
    const HIT_RANGE: f32 = 700.0;

    pub struct Summary {
        pub round: u32,
        pub score: u64,
        pub kills: u32,
        pub upgrades: u32,
        pub game_over: bool,
    }

    pub fn run(tuning: &Tuning, seed: u64, duration_ms: u32) -> Summary {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut state = GameState::new(tuning, Vec2::new(ORBIT_RADIUS, 0.0));
        let mut kills = 0;
        let mut upgrades = 0;
        let mut elapsed = 0.0;

        while elapsed < duration_ms as f32 && !state.is_game_over() {
            if let Some(choice) = state.upgrades.selection().map(|s| s.choices[0]) {
                if state.commit_upgrade(choice).is_ok() {
                    upgrades += 1;
                }
            }

            let angle = elapsed / 1000.0 * ORBIT_SPEED;
            let player_pos = polar_to_cartesian(ORBIT_RADIUS, angle);
            let target = nearest_enemy(&state, player_pos);

            let input = TickInput {
                player_pos: Some(player_pos),
                fire: target.map(|(_, aim, polarity)| (aim, polarity)),
                shield: state.player.health < state.player.max_health / 2,
                overdrive: state.spawner.boss_active(),
                ..Default::default()
            };
            let shots = tick(&mut state, &input, FRAME_MS, &mut rng);
            if let Some((id, _, _)) = target {
                kills += land_shots(&mut state, id, &shots);
            }

            for event in state.drain_events() {
                if let GameEvent::RoundStarted { round, .. } = event {
                    log::info!("autopilot entering round {} at score {}", round, state.score);
                }
            }
            elapsed += FRAME_MS;
        }

        Summary {
            round: state.round.current_round,
            score: state.score,
            kills,
            upgrades,
            game_over: state.is_game_over(),
        }
    }

    fn nearest_enemy(
        state: &GameState,
        from: Vec2,
    ) -> Option<(u32, f32, subzero::sim::Polarity)> {
        state
            .world
            .enemies
            .entities
            .iter()
            .map(|e| (e, e.pos.distance(from)))
            .filter(|&(_, d)| d < HIT_RANGE)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(e, _)| {
                let to = e.pos - from;
                (e.id, to.y.atan2(to.x), e.polarity)
            })
    }

    fn land_shots(state: &mut GameState, id: u32, shots: &[Projectile]) -> u32 {
        let mut kills = 0;
        for shot in shots {
            match state.on_projectile_hit(id, shot) {
                Ok(HitOutcome::Killed { .. }) => kills += 1,
                Ok(_) => {}
                // Already dead from an earlier shot in the volley
                Err(_) => break,
            }
        }
        kills
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is subzero::web::start, this is just to satisfy the compiler
}
