//! Round timer and difficulty scaling
//!
//! Rounds are fixed-duration epochs. When the timer runs out the round
//! advances, caps are recomputed from the round number, a score bonus is
//! granted and the banner sub-phase starts. A huge `dt` (backgrounded tab)
//! advances several rounds in sequence, each with its own formula.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_ROUND_ADVANCES_PER_TICK;
use crate::tuning::Tuning;

/// Transient presentation sub-phase inside a round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RoundPhase {
    InRound,
    /// Round banner is showing
    Announcing { remaining_ms: f32 },
}

/// A single round transition produced by [`RoundController::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundAdvance {
    pub round: u32,
    pub bonus: u64,
    pub enemy_cap: usize,
    pub meteor_cap: usize,
}

/// Difficulty formulas, separated from the timer so they can be queried for any round
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Difficulty {
    pub enemy_cap_base: f32,
    pub enemy_cap_per_round: f32,
    pub meteor_cap_base: f32,
    pub meteor_cap_per_round: f32,
    pub bonus_per_round: u64,
}

impl Difficulty {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            enemy_cap_base: tuning.enemy_cap_base,
            enemy_cap_per_round: tuning.enemy_cap_per_round,
            meteor_cap_base: tuning.meteor_cap_base,
            meteor_cap_per_round: tuning.meteor_cap_per_round,
            bonus_per_round: tuning.round_bonus_per_round,
        }
    }

    /// `floor(5 + round * 1.5)` with default tuning
    pub fn enemy_cap(&self, round: u32) -> usize {
        (self.enemy_cap_base + round as f32 * self.enemy_cap_per_round)
            .floor()
            .max(0.0) as usize
    }

    /// `floor(10 + round * 0.5)` with default tuning
    pub fn meteor_cap(&self, round: u32) -> usize {
        (self.meteor_cap_base + round as f32 * self.meteor_cap_per_round)
            .floor()
            .max(0.0) as usize
    }

    pub fn round_bonus(&self, round: u32) -> u64 {
        self.bonus_per_round * round as u64
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::from_tuning(&Tuning::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundController {
    pub current_round: u32,
    /// Time left in the round, in (0, round_duration_ms]
    pub round_timer_ms: f32,
    pub round_duration_ms: f32,
    pub phase: RoundPhase,
    pub difficulty: Difficulty,
    announce_ms: f32,
}

impl RoundController {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            current_round: 1,
            round_timer_ms: tuning.round_duration_ms,
            round_duration_ms: tuning.round_duration_ms,
            phase: RoundPhase::InRound,
            difficulty: Difficulty::from_tuning(tuning),
            announce_ms: tuning.announce_ms,
        }
    }

    pub fn enemy_cap(&self) -> usize {
        self.difficulty.enemy_cap(self.current_round)
    }

    pub fn meteor_cap(&self) -> usize {
        self.difficulty.meteor_cap(self.current_round)
    }

    pub fn is_announcing(&self) -> bool {
        matches!(self.phase, RoundPhase::Announcing { .. })
    }

    /// Advance the timer by `dt_ms`, returning every round transition it caused
    pub fn tick(&mut self, dt_ms: f32) -> Vec<RoundAdvance> {
        if let RoundPhase::Announcing { remaining_ms } = self.phase {
            let remaining_ms = remaining_ms - dt_ms;
            self.phase = if remaining_ms > 0.0 {
                RoundPhase::Announcing { remaining_ms }
            } else {
                RoundPhase::InRound
            };
        }

        let remaining = dt_ms.max(0.0);
        if remaining < self.round_timer_ms {
            self.round_timer_ms -= remaining;
            return Vec::new();
        }

        // Whole rounds past the current one, counted up front so the
        // number of iterations never depends on float subtraction
        let duration = self.round_duration_ms as f64;
        let overflow = remaining as f64 - self.round_timer_ms as f64;
        let mut leftover = overflow % duration;
        if leftover.is_nan() {
            leftover = 0.0;
        }
        let extra = ((overflow - leftover) / duration).round();
        let due = if extra.is_finite() {
            (extra as u64).saturating_add(1)
        } else {
            u64::MAX
        };
        let count = due.min(MAX_ROUND_ADVANCES_PER_TICK as u64);
        if count < due {
            log::warn!(
                "Frame delta of {} ms spans {} rounds, applying {}",
                dt_ms,
                due,
                count
            );
            leftover = 0.0;
        }

        let advances: Vec<RoundAdvance> = (0..count).map(|_| self.advance_round()).collect();
        self.round_timer_ms = (duration - leftover).clamp(f32::MIN_POSITIVE as f64, duration) as f32;
        advances
    }

    /// Move to the next round: reset the timer, start the banner and
    /// report the new caps and bonus.
    pub fn advance_round(&mut self) -> RoundAdvance {
        self.current_round += 1;
        self.round_timer_ms = self.round_duration_ms;
        self.phase = RoundPhase::Announcing {
            remaining_ms: self.announce_ms,
        };
        let advance = RoundAdvance {
            round: self.current_round,
            bonus: self.difficulty.round_bonus(self.current_round),
            enemy_cap: self.enemy_cap(),
            meteor_cap: self.meteor_cap(),
        };
        log::info!(
            "Round {} (enemy cap {}, meteor cap {}, bonus {})",
            advance.round,
            advance.enemy_cap,
            advance.meteor_cap,
            advance.bonus
        );
        advance
    }
}
