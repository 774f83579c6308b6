//! Data-driven game balance
//!
//! [`Tuning`] mirrors every balance constant the simulation reads. Defaults
//! are the shipped values; a JSON document may override any subset of keys
//! (missing keys fall back to the defaults).
//!
//! ```
//! let tuning = subzero::Tuning::from_json(r#"{ "round_duration_ms": 20000 }"#).unwrap();
//! assert_eq!(tuning.round_duration_ms, 20000.0);
//! assert_eq!(tuning.prism_cap, 5);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::sim::EntityKind;

/// Weighted enemy table used from `min_round` onward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnTier {
    pub min_round: u32,
    pub weights: Vec<(EntityKind, f32)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // Rounds
    pub round_duration_ms: f32,
    /// Banner time before an upgrade offer opens
    pub offer_delay_ms: f32,
    pub announce_ms: f32,
    pub enemy_cap_base: f32,
    pub enemy_cap_per_round: f32,
    pub meteor_cap_base: f32,
    pub meteor_cap_per_round: f32,
    pub round_bonus_per_round: u64,

    // Upgrades
    /// Offer every N rounds
    pub upgrade_offer_interval: u32,
    pub upgrade_choices: usize,
    pub regen_interval_ms: f32,
    pub flame_radius: f32,
    pub flame_dps_per_level: f32,
    pub flame_enemy_threshold: f32,
    pub flame_meteor_threshold: f32,
    pub min_fire_interval_ms: f32,
    pub min_dash_cooldown_ms: f32,

    // Spawning
    pub prism_cap: usize,
    pub cull_radius: f32,
    pub spawn_min_distance: f32,
    pub spawn_max_distance: f32,
    pub enemy_tiers: Vec<SpawnTier>,
    pub boss_score_threshold: u64,
    pub boss_chance: f32,
    /// Share of boss spawns that are serpents (the rest are voids)
    pub serpent_share: f32,
    pub prism_pool: usize,
    pub meteor_pool: usize,
    pub enemy_pool: usize,
    pub meteor_min_scale: f32,
    pub meteor_max_scale: f32,

    // Combat
    pub polarity_swap_ms: f32,
    pub matched_hit_damage: f32,
    pub overdrive_hit_damage: f32,
    pub meteor_hit_damage: f32,
    pub default_score: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            round_duration_ms: 30_000.0,
            offer_delay_ms: 1500.0,
            announce_ms: 1500.0,
            enemy_cap_base: 5.0,
            enemy_cap_per_round: 1.5,
            meteor_cap_base: 10.0,
            meteor_cap_per_round: 0.5,
            round_bonus_per_round: 500,

            upgrade_offer_interval: 1,
            upgrade_choices: 3,
            regen_interval_ms: 3000.0,
            flame_radius: 60.0,
            flame_dps_per_level: 5.0,
            flame_enemy_threshold: 20.0,
            flame_meteor_threshold: 10.0,
            min_fire_interval_ms: 50.0,
            min_dash_cooldown_ms: 1000.0,

            prism_cap: 5,
            cull_radius: 1500.0,
            spawn_min_distance: 400.0,
            spawn_max_distance: 800.0,
            enemy_tiers: vec![SpawnTier {
                min_round: 1,
                weights: vec![
                    (EntityKind::FluxStrider, 0.5),
                    (EntityKind::ChronoLoomer, 0.2),
                    (EntityKind::Kamikaze, 0.15),
                    (EntityKind::VoidSentinel, 0.15),
                ],
            }],
            boss_score_threshold: 1000,
            boss_chance: 0.05,
            serpent_share: 0.5,
            prism_pool: 16,
            meteor_pool: 64,
            enemy_pool: 96,
            meteor_min_scale: 0.8,
            meteor_max_scale: 1.5,

            polarity_swap_ms: 1500.0,
            matched_hit_damage: 10.0,
            overdrive_hit_damage: 50.0,
            meteor_hit_damage: 10.0,
            default_score: 100,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON document and validate it
    pub fn from_json(json: &str) -> SimResult<Self> {
        let tuning: Tuning = serde_json::from_str(json).map_err(|e| SimError::TuningParse {
            message: e.to_string(),
        })?;
        if let Err(e) = tuning.validate() {
            log::warn!("Rejected tuning: {}", e);
            return Err(e);
        }
        Ok(tuning)
    }

    /// Reject values that would stall or break the simulation
    pub fn validate(&self) -> SimResult<()> {
        positive("round_duration_ms", self.round_duration_ms)?;
        positive("cull_radius", self.cull_radius)?;
        positive("regen_interval_ms", self.regen_interval_ms)?;
        positive("polarity_swap_ms", self.polarity_swap_ms)?;
        positive("min_fire_interval_ms", self.min_fire_interval_ms)?;
        positive("min_dash_cooldown_ms", self.min_dash_cooldown_ms)?;
        non_negative("offer_delay_ms", self.offer_delay_ms)?;
        non_negative("spawn_min_distance", self.spawn_min_distance)?;
        probability("boss_chance", self.boss_chance)?;
        probability("serpent_share", self.serpent_share)?;

        if self.spawn_max_distance < self.spawn_min_distance {
            return Err(SimError::InvalidTuning {
                name: "spawn_max_distance",
                value: self.spawn_max_distance,
                safe_range: "[spawn_min_distance, ∞)",
            });
        }
        if self.upgrade_offer_interval == 0 {
            return Err(SimError::InvalidTuning {
                name: "upgrade_offer_interval",
                value: 0.0,
                safe_range: "[1, ∞)",
            });
        }
        if self.upgrade_choices == 0 {
            return Err(SimError::InvalidTuning {
                name: "upgrade_choices",
                value: 0.0,
                safe_range: "[1, ∞)",
            });
        }
        if self.enemy_tiers.is_empty() {
            return Err(SimError::InvalidTuning {
                name: "enemy_tiers",
                value: 0.0,
                safe_range: "at least one tier",
            });
        }
        for tier in &self.enemy_tiers {
            let mut total = 0.0;
            for &(_, w) in &tier.weights {
                non_negative("enemy_tiers.weight", w)?;
                total += w;
            }
            positive("enemy_tiers.total_weight", total)?;
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f32) -> SimResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidTuning {
            name,
            value,
            safe_range: "(0, ∞)",
        })
    }
}

fn non_negative(name: &'static str, value: f32) -> SimResult<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidTuning {
            name,
            value,
            safe_range: "[0, ∞)",
        })
    }
}

fn probability(name: &'static str, value: f32) -> SimResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::InvalidTuning {
            name,
            value,
            safe_range: "[0, 1]",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let t = Tuning::from_json(r#"{ "prism_cap": 8, "boss_chance": 0.1 }"#).unwrap();
        assert_eq!(t.prism_cap, 8);
        assert_eq!(t.boss_chance, 0.1);
        assert_eq!(t.cull_radius, 1500.0);
    }

    #[test]
    fn test_rejects_zero_round_duration() {
        let err = Tuning::from_json(r#"{ "round_duration_ms": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidTuning {
                name: "round_duration_ms",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_inverted_spawn_ring() {
        let json = r#"{ "spawn_min_distance": 900, "spawn_max_distance": 800 }"#;
        assert!(Tuning::from_json(json).is_err());
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        assert!(matches!(
            Tuning::from_json("{ nope"),
            Err(SimError::TuningParse { .. })
        ));
    }

    #[test]
    fn test_tiers_parse_from_pairs() {
        let json = r#"{ "enemy_tiers": [
            { "min_round": 1, "weights": [["FluxStrider", 1.0]] },
            { "min_round": 5, "weights": [["Kamikaze", 1.0]] }
        ] }"#;
        let t = Tuning::from_json(json).unwrap();
        assert_eq!(t.enemy_tiers.len(), 2);
        assert_eq!(t.enemy_tiers[1].weights[0], (EntityKind::Kamikaze, 1.0));
    }

    #[test]
    fn test_rejects_all_zero_weights() {
        let json = r#"{ "enemy_tiers": [ { "min_round": 1, "weights": [["FluxStrider", 0.0]] } ] }"#;
        assert!(Tuning::from_json(json).is_err());
    }
}
