//! Roguelite upgrade engine
//!
//! The catalog is a fixed table of leveled upgrades. Each effect recomputes
//! an absolute player stat from the new level, so reapplying a level is
//! harmless and unrelated upgrades commute. Only `maxHealth` carries the
//! current health deficit across the change.
//!
//! While a selection is open the world is suspended; it resumes only when a
//! choice is committed.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::player::PlayerState;
use super::rng::RandomSource;
use crate::consts::*;
use crate::error::{SimError, SimResult};
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpgradeId {
    SplitCannon,
    GrowingBullets,
    FireRate,
    FlameShield,
    ShieldDuration,
    HealthRecovery,
    MaxHealth,
    DashCooldown,
}

impl UpgradeId {
    pub const ALL: [UpgradeId; 8] = [
        UpgradeId::SplitCannon,
        UpgradeId::GrowingBullets,
        UpgradeId::FireRate,
        UpgradeId::FlameShield,
        UpgradeId::ShieldDuration,
        UpgradeId::HealthRecovery,
        UpgradeId::MaxHealth,
        UpgradeId::DashCooldown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeId::SplitCannon => "splitCannon",
            UpgradeId::GrowingBullets => "growingBullets",
            UpgradeId::FireRate => "fireRate",
            UpgradeId::FlameShield => "flameShield",
            UpgradeId::ShieldDuration => "shieldDuration",
            UpgradeId::HealthRecovery => "healthRecovery",
            UpgradeId::MaxHealth => "maxHealth",
            UpgradeId::DashCooldown => "dashCooldown",
        }
    }

    pub fn parse(s: &str) -> SimResult<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SimError::UnknownUpgrade { name: s.to_string() })
    }

    pub fn definition(self) -> &'static UpgradeDefinition {
        // CATALOG is ordered like ALL
        &CATALOG[self as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Weapon,
    Shield,
    Misc,
}

/// Clamp floors that effects must respect
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EffectLimits {
    pub min_fire_interval_ms: f32,
    pub min_dash_cooldown_ms: f32,
}

impl EffectLimits {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            min_fire_interval_ms: tuning.min_fire_interval_ms,
            min_dash_cooldown_ms: tuning.min_dash_cooldown_ms,
        }
    }
}

impl Default for EffectLimits {
    fn default() -> Self {
        Self::from_tuning(&Tuning::default())
    }
}

pub type Effect = fn(&mut PlayerState, u8, &EffectLimits);

pub struct UpgradeDefinition {
    pub id: UpgradeId,
    pub display_name: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub max_level: u8,
    pub effect: Effect,
}

impl std::fmt::Debug for UpgradeDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpgradeDefinition")
            .field("id", &self.id)
            .field("max_level", &self.max_level)
            .finish()
    }
}

fn split_cannon(p: &mut PlayerState, level: u8, _: &EffectLimits) {
    p.split_cannon_level = level;
}

fn growing_bullets(p: &mut PlayerState, level: u8, _: &EffectLimits) {
    p.growing_bullets_level = level;
}

fn fire_rate(p: &mut PlayerState, level: u8, limits: &EffectLimits) {
    p.fire_rate_bonus = level as f32 * 0.2;
    p.fire_rate_ms =
        (p.base_fire_rate_ms * (1.0 - p.fire_rate_bonus)).max(limits.min_fire_interval_ms);
}

fn flame_shield(p: &mut PlayerState, level: u8, _: &EffectLimits) {
    p.flame_shield_level = level;
}

fn shield_duration(p: &mut PlayerState, level: u8, _: &EffectLimits) {
    p.shield.duration_ms = SHIELD_BASE_DURATION_MS + level as f32 * SHIELD_DURATION_PER_LEVEL_MS;
}

fn health_recovery(p: &mut PlayerState, level: u8, _: &EffectLimits) {
    p.health_recovery_level = level;
}

fn max_health(p: &mut PlayerState, level: u8, _: &EffectLimits) {
    let old_max = p.max_health;
    p.max_health = BASE_MAX_HEALTH + level as i32 * MAX_HEALTH_PER_LEVEL;
    p.health += p.max_health - old_max;
}

fn dash_cooldown(p: &mut PlayerState, level: u8, limits: &EffectLimits) {
    p.dash.cooldown_ms = (DASH_BASE_COOLDOWN_MS - level as f32 * DASH_COOLDOWN_PER_LEVEL_MS)
        .max(limits.min_dash_cooldown_ms);
}

pub static CATALOG: [UpgradeDefinition; 8] = [
    UpgradeDefinition {
        id: UpgradeId::SplitCannon,
        display_name: "SPLIT CANNON",
        description: "Fire 3 bullets in a spread pattern",
        category: Category::Weapon,
        max_level: 3,
        effect: split_cannon,
    },
    UpgradeDefinition {
        id: UpgradeId::GrowingBullets,
        display_name: "PLASMA GROWTH",
        description: "Bullets grow larger over distance",
        category: Category::Weapon,
        max_level: 3,
        effect: growing_bullets,
    },
    UpgradeDefinition {
        id: UpgradeId::FireRate,
        display_name: "RAPID FIRE",
        description: "Increase fire rate by 20%",
        category: Category::Weapon,
        max_level: 5,
        effect: fire_rate,
    },
    UpgradeDefinition {
        id: UpgradeId::FlameShield,
        display_name: "FLAME SHIELD",
        description: "Shield burns nearby enemies for 5 DPS",
        category: Category::Shield,
        max_level: 3,
        effect: flame_shield,
    },
    UpgradeDefinition {
        id: UpgradeId::ShieldDuration,
        display_name: "EXTENDED SHIELD",
        description: "Increase shield duration by 2s",
        category: Category::Shield,
        max_level: 3,
        effect: shield_duration,
    },
    UpgradeDefinition {
        id: UpgradeId::HealthRecovery,
        display_name: "REGENERATION",
        description: "Recover 1 HP every 3 seconds",
        category: Category::Misc,
        max_level: 3,
        effect: health_recovery,
    },
    UpgradeDefinition {
        id: UpgradeId::MaxHealth,
        display_name: "REINFORCED HULL",
        description: "Increase max health by 25",
        category: Category::Misc,
        max_level: 4,
        effect: max_health,
    },
    UpgradeDefinition {
        id: UpgradeId::DashCooldown,
        display_name: "QUICK THRUSTERS",
        description: "Reduce dash cooldown by 0.5s",
        category: Category::Misc,
        max_level: 4,
        effect: dash_cooldown,
    },
];

/// Per-run upgrade levels
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpgradeProgress {
    levels: BTreeMap<UpgradeId, u8>,
}

impl UpgradeProgress {
    pub fn level(&self, id: UpgradeId) -> u8 {
        self.levels.get(&id).copied().unwrap_or(0)
    }

    pub fn is_maxed(&self, id: UpgradeId) -> bool {
        self.level(id) >= id.definition().max_level
    }

    /// Raise a level by exactly one. `None` (no change) if already maxed.
    pub fn level_up(&mut self, id: UpgradeId) -> Option<u8> {
        if self.is_maxed(id) {
            return None;
        }
        let level = self.levels.entry(id).or_insert(0);
        *level += 1;
        Some(*level)
    }

    /// Upgrades with level > 0, in catalog order
    pub fn active(&self) -> Vec<(UpgradeId, u8)> {
        UpgradeId::ALL
            .into_iter()
            .map(|id| (id, self.level(id)))
            .filter(|&(_, level)| level > 0)
            .collect()
    }
}

/// An offer waiting for its banner delay to elapse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingOffer {
    pub round: u32,
    pub delay_ms: f32,
}

/// The open modal selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub round: u32,
    pub choices: Vec<UpgradeId>,
}

/// Outcome of a committed choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Applied { id: UpgradeId, level: u8 },
    /// Already at max level; nothing changed
    Ignored { id: UpgradeId },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeEngine {
    pub progress: UpgradeProgress,
    /// Last round an offer was scheduled for
    last_offer_round: u32,
    pending: VecDeque<PendingOffer>,
    selection: Option<Selection>,
    offer_interval: u32,
    choice_count: usize,
    limits: EffectLimits,
}

impl UpgradeEngine {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            progress: UpgradeProgress::default(),
            last_offer_round: 0,
            pending: VecDeque::new(),
            selection: None,
            offer_interval: tuning.upgrade_offer_interval.max(1),
            choice_count: tuning.upgrade_choices,
            limits: EffectLimits::from_tuning(tuning),
        }
    }

    /// True when `round` is on the offer interval and has not been offered yet
    pub fn offer_predicate(&self, round: u32) -> bool {
        round >= 1 && round % self.offer_interval == 0 && round > self.last_offer_round
    }

    /// Queue an offer for `round` after `delay_ms`. Returns false if the
    /// predicate rejects the round.
    pub fn schedule_offer(&mut self, round: u32, delay_ms: f32) -> bool {
        if !self.offer_predicate(round) {
            return false;
        }
        self.last_offer_round = round;
        self.pending.push_back(PendingOffer { round, delay_ms });
        true
    }

    pub fn pending_offers(&self) -> usize {
        self.pending.len()
    }

    /// Count down the front pending offer. Returns its round once due.
    pub fn advance_pending(&mut self, dt_ms: f32) -> Option<u32> {
        let front = self.pending.front_mut()?;
        front.delay_ms -= dt_ms;
        if front.delay_ms > 0.0 {
            return None;
        }
        self.pending.pop_front().map(|p| p.round)
    }

    /// All catalog entries below their max level
    pub fn available_choices(&self) -> Vec<UpgradeId> {
        UpgradeId::ALL
            .into_iter()
            .filter(|&id| !self.progress.is_maxed(id))
            .collect()
    }

    /// Open the modal selection for `round`. `None` (and no pause) when
    /// every upgrade is maxed or a selection is already open.
    pub fn open_selection(
        &mut self,
        round: u32,
        rng: &mut impl RandomSource,
    ) -> Option<&Selection> {
        if self.selection.is_some() {
            return None;
        }
        let available = self.available_choices();
        if available.is_empty() {
            log::info!("Round {}: all upgrades maxed, no offer", round);
            return None;
        }
        let choices = select_random_subset(&available, self.choice_count, rng);
        log::info!(
            "Round {}: offering {:?}",
            round,
            choices.iter().map(|c| c.as_str()).collect::<Vec<_>>()
        );
        self.selection = Some(Selection { round, choices });
        self.selection.as_ref()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// World simulation is suspended while a selection is open
    pub fn is_paused(&self) -> bool {
        self.selection.is_some()
    }

    /// Commit one offered choice: level up, apply the effect, evolve the
    /// player shape and resume.
    pub fn commit(&mut self, choice: UpgradeId, player: &mut PlayerState) -> SimResult<Commit> {
        let selection = self.selection.as_ref().ok_or(SimError::NoSelectionOpen)?;
        if !selection.choices.contains(&choice) {
            return Err(SimError::ChoiceNotOffered { id: choice });
        }
        self.selection = None;
        Ok(self.apply(choice, player))
    }

    /// Level up and apply outside the modal flow (debug/replay)
    pub fn apply(&mut self, id: UpgradeId, player: &mut PlayerState) -> Commit {
        match self.progress.level_up(id) {
            Some(level) => {
                (id.definition().effect)(player, level, &self.limits);
                player.evolve_shape();
                log::info!(
                    "Upgrade {} -> level {} (shape sides {})",
                    id.as_str(),
                    level,
                    player.shape_sides
                );
                Commit::Applied { id, level }
            }
            None => {
                log::warn!("Upgrade {} already at max level, ignoring", id.as_str());
                Commit::Ignored { id }
            }
        }
    }

    /// Drop pending offers and any open selection (run teardown)
    pub fn reset_offers(&mut self) {
        self.pending.clear();
        self.selection = None;
    }
}

/// Uniform selection of `n` distinct items (partial Fisher-Yates)
pub fn select_random_subset<T: Copy>(
    items: &[T],
    n: usize,
    rng: &mut impl RandomSource,
) -> Vec<T> {
    let mut pool = items.to_vec();
    let take = n.min(pool.len());
    for i in 0..take {
        let j = i + rng.index(pool.len() - i);
        pool.swap(i, j);
    }
    pool.truncate(take);
    pool
}

/// Per-tick health regeneration. Returns HP restored.
pub fn regenerate(player: &mut PlayerState, dt_ms: f32, interval_ms: f32) -> i32 {
    if player.health_recovery_level == 0 {
        return 0;
    }
    if !dt_ms.is_finite() {
        return 0;
    }
    player.regen_accum_ms += dt_ms.max(0.0);
    if player.regen_accum_ms < interval_ms {
        return 0;
    }
    let leftover = player.regen_accum_ms % interval_ms;
    let pulses = ((player.regen_accum_ms - leftover) / interval_ms).round() as i64;
    player.regen_accum_ms = leftover;

    // Each pulse heals `level` up to max, so the pulses collapse into one clamp
    let before = player.health;
    let gained = pulses.saturating_mul(player.health_recovery_level as i64);
    let target = (before as i64).saturating_add(gained).min(player.max_health as i64);
    player.health = target as i32;
    player.health - before
}
