//! Browser bindings
//!
//! The host page owns rendering, input and physics. It drives a [`WebRun`]
//! once per frame, reports collisions back, and reads the HUD and event
//! stream as JSON.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use wasm_bindgen::prelude::*;

use crate::error::SimError;
use crate::highscores::HighScores;
use crate::sim::{GameState, Hazard, Polarity, Projectile, TickInput, UpgradeId, tick};
use crate::tuning::Tuning;

fn js_err(e: SimError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::warn!("Serialization failed: {}", e);
        "null".to_string()
    })
}

fn polarity(accent: bool) -> Polarity {
    if accent { Polarity::B } else { Polarity::A }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
    log::info!("Subzero core loaded");
}

/// One run, driven by the page's frame loop
#[wasm_bindgen]
pub struct WebRun {
    state: GameState,
    rng: Pcg32,
    input: TickInput,
    seed: u64,
}

#[wasm_bindgen]
impl WebRun {
    /// Start a run. `seed` defaults to the current time; `tuning_json`
    /// overrides any subset of the balance values.
    #[wasm_bindgen(constructor)]
    pub fn new(
        seed: Option<f64>,
        tuning_json: Option<String>,
        player_x: f32,
        player_y: f32,
    ) -> Result<WebRun, JsValue> {
        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json).map_err(js_err)?,
            None => Tuning::default(),
        };
        let seed = seed.unwrap_or_else(js_sys::Date::now) as u64;
        log::info!("Starting run with seed {}", seed);
        Ok(Self {
            state: GameState::new(&tuning, Vec2::new(player_x, player_y)),
            rng: Pcg32::seed_from_u64(seed),
            input: TickInput::default(),
            seed,
        })
    }

    pub fn seed(&self) -> f64 {
        self.seed as f64
    }

    /// Hold the trigger this frame
    pub fn fire(&mut self, angle: f32, accent: bool) {
        self.input.fire = Some((angle, polarity(accent)));
    }

    pub fn overdrive(&mut self) {
        self.input.overdrive = true;
    }

    pub fn shield(&mut self) {
        self.input.shield = true;
    }

    pub fn dash(&mut self) {
        self.input.dash = true;
    }

    /// Advance one frame. Returns the fired projectiles as JSON.
    pub fn tick(&mut self, dt_ms: f32, player_x: f32, player_y: f32) -> String {
        let mut input = std::mem::take(&mut self.input);
        input.player_pos = Some(Vec2::new(player_x, player_y));
        let shots = tick(&mut self.state, &input, dt_ms, &mut self.rng);
        to_json(&shots)
    }

    /// Push the physics engine's position for an entity
    pub fn sync_position(&mut self, id: u32, x: f32, y: f32) -> bool {
        self.state.world.sync_position(id, Vec2::new(x, y))
    }

    /// A projectile (JSON as returned by `tick`) hit entity `id`
    pub fn projectile_hit(&mut self, id: u32, projectile_json: &str) -> Result<String, JsValue> {
        let shot: Projectile = serde_json::from_str(projectile_json)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let outcome = self.state.on_projectile_hit(id, &shot).map_err(js_err)?;
        Ok(to_json(&outcome))
    }

    /// A projectile touched prism `id`. Returns the (possibly flipped) projectile.
    pub fn prism_contact(&mut self, id: u32, projectile_json: &str) -> Result<String, JsValue> {
        let mut shot: Projectile = serde_json::from_str(projectile_json)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.state.on_prism_contact(id, &mut shot).map_err(js_err)?;
        Ok(to_json(&shot))
    }

    pub fn player_contact(&mut self, id: u32) -> Result<(), JsValue> {
        self.state.on_player_contact(id).map(|_| ()).map_err(js_err)
    }

    /// `pellet`, `trail` or `blast`
    pub fn hazard(&mut self, kind: &str) -> Result<(), JsValue> {
        let hazard = match kind {
            "pellet" => Hazard::Pellet,
            "trail" => Hazard::Trail,
            "blast" => Hazard::KamikazeBlast,
            other => return Err(JsValue::from_str(&format!("unknown hazard '{}'", other))),
        };
        self.state.on_hazard(hazard);
        Ok(())
    }

    /// Open upgrade choices as JSON, `null` when no selection is open
    pub fn offer(&self) -> String {
        to_json(&self.state.upgrades.selection())
    }

    pub fn commit_upgrade(&mut self, id: &str) -> Result<(), JsValue> {
        let id = UpgradeId::parse(id).map_err(js_err)?;
        self.state.commit_upgrade(id).map(|_| ()).map_err(js_err)
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }

    pub fn current_round(&self) -> u32 {
        self.state.round.current_round
    }

    pub fn round_timer_ms(&self) -> f32 {
        self.state.round.round_timer_ms
    }

    pub fn score(&self) -> f64 {
        self.state.score as f64
    }

    pub fn add_score(&mut self, points: f64) {
        self.state.add_score(points.max(0.0) as u64);
    }

    /// Remaining cooldown for `overdrive`, `shield` or `dash`
    pub fn skill_cooldown_ms(&self, skill: &str) -> f32 {
        let player = &self.state.player;
        match skill {
            "overdrive" => player.overdrive.cooldown_remaining_ms(),
            "shield" => player.shield.cooldown_remaining_ms(),
            _ => player.dash.cooldown_remaining_ms(),
        }
    }

    pub fn hud(&self) -> String {
        to_json(&self.state.hud())
    }

    pub fn drain_events(&mut self) -> String {
        to_json(&self.state.drain_events())
    }

    /// End the run and release everything it holds
    pub fn teardown(&mut self) {
        self.state.teardown();
    }
}

/// Stored leaderboard as JSON
#[wasm_bindgen]
pub fn leaderboard() -> String {
    HighScores::load().to_json()
}

/// Record a finished run. Returns the rank, or `undefined` if it missed the board.
#[wasm_bindgen]
pub fn submit_score(name: &str, score: f64) -> Option<u32> {
    let mut scores = HighScores::load();
    let rank = scores.add_score(name, score.max(0.0) as u64)?;
    scores.save();
    Some(rank as u32)
}
