//! Subzero - polarity arcade shooter core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (rounds, spawning, upgrades, combat rules)
//! - `tuning`: Data-driven game balance
//! - `highscores`: Top-10 leaderboard persisted to LocalStorage
//! - `web`: wasm-bindgen facade for the browser presentation layer

pub mod error;
pub mod highscores;
pub mod sim;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{SimError, SimResult};
pub use highscores::HighScores;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants that are not balance knobs
pub mod consts {
    /// Player base stats
    pub const BASE_MAX_HEALTH: i32 = 100;
    pub const MAX_HEALTH_PER_LEVEL: i32 = 25;
    pub const STARTING_LIVES: u8 = 3;
    pub const BASE_FIRE_RATE_MS: f32 = 200.0;
    /// Player polygon starts as a triangle and gains a side per upgrade
    pub const BASE_SHAPE_SIDES: u32 = 3;
    pub const BASE_SHAPE_SIZE: f32 = 12.0;

    /// Skill timings (ms)
    pub const OVERDRIVE_DURATION_MS: f32 = 7000.0;
    pub const OVERDRIVE_COOLDOWN_MS: f32 = 10_000.0;
    pub const SHIELD_BASE_DURATION_MS: f32 = 5000.0;
    pub const SHIELD_DURATION_PER_LEVEL_MS: f32 = 2000.0;
    pub const SHIELD_COOLDOWN_MS: f32 = 15_000.0;
    pub const DASH_DURATION_MS: f32 = 200.0;
    pub const DASH_BASE_COOLDOWN_MS: f32 = 3000.0;
    pub const DASH_COOLDOWN_PER_LEVEL_MS: f32 = 500.0;
    pub const VELOCITY_DEBUFF_MS: f32 = 2000.0;

    /// Maximum round transitions a single tick may apply, so a garbage
    /// frame delta cannot stall the page
    pub const MAX_ROUND_ADVANCES_PER_TICK: u32 = 100;

    /// Split cannon half-spread (radians, 22.5 degrees)
    pub const SPLIT_SPREAD: f32 = std::f32::consts::PI / 8.0;
    /// Bullet growth per unit travelled, per growth level
    pub const GROWTH_RATE_PER_LEVEL: f32 = 0.002;

    /// Contact damage dealt to the player
    pub const ENEMY_CONTACT_DAMAGE: i32 = 10;
    pub const METEOR_CONTACT_DAMAGE: i32 = 20;
    pub const PELLET_DAMAGE: i32 = 5;
    pub const TRAIL_DAMAGE: i32 = 2;
    pub const KAMIKAZE_BLAST_DAMAGE: i32 = 40;

    /// Enemy behaviour
    pub const STRIDER_FIRE_CHANCE: f32 = 0.01;
    pub const LOOMER_TRAIL_INTERVAL_MS: f32 = 200.0;
    pub const SENTINEL_FIELD_RADIUS: f32 = 300.0;
    pub const KAMIKAZE_DETECT_RADIUS: f32 = 150.0;
    pub const KAMIKAZE_BLAST_RADIUS: f32 = 200.0;
    pub const KAMIKAZE_FUSE_MS: f32 = 500.0;
    pub const VOID_RING_INTERVAL_MS: f32 = 3000.0;
    pub const VOID_RING_SHOTS: u32 = 20;
    pub const SERPENT_SPREAD_INTERVAL_MS: f32 = 2000.0;
    pub const SERPENT_SPREAD_SHOTS: u32 = 3;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}
