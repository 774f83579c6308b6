//! Population control
//!
//! Each world tick the director culls anything that drifted out of range,
//! then tops up each group by at most one entity. Enemy kinds come from a
//! cumulative weight table (single draw, first threshold wins). Bosses are
//! gated by score, a Bernoulli roll and a single run-scoped flag that only
//! the boss's own death notice clears.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catalog::{EntityKind, Group};
use super::rng::RandomSource;
use super::world::{DeathNotice, DespawnReason, EntityId, World};
use crate::polar_to_cartesian;
use crate::tuning::{SpawnTier, Tuning};

/// Something the director placed this tick
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRecord {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    /// Serpent segments created with the head
    pub children: Vec<EntityId>,
}

/// Population caps for the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caps {
    pub prisms: usize,
    pub meteors: usize,
    pub enemies: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnDirector {
    boss_active: bool,
    /// The live boss that owns the flag
    boss_id: Option<EntityId>,
    cull_radius: f32,
    spawn_min_distance: f32,
    spawn_max_distance: f32,
    boss_score_threshold: u64,
    boss_chance: f32,
    serpent_share: f32,
    meteor_min_scale: f32,
    meteor_max_scale: f32,
    tiers: Vec<SpawnTier>,
}

impl SpawnDirector {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            boss_active: false,
            boss_id: None,
            cull_radius: tuning.cull_radius,
            spawn_min_distance: tuning.spawn_min_distance,
            spawn_max_distance: tuning.spawn_max_distance,
            boss_score_threshold: tuning.boss_score_threshold,
            boss_chance: tuning.boss_chance,
            serpent_share: tuning.serpent_share,
            meteor_min_scale: tuning.meteor_min_scale,
            meteor_max_scale: tuning.meteor_max_scale,
            tiers: tuning.enemy_tiers.clone(),
        }
    }

    pub fn boss_active(&self) -> bool {
        self.boss_active
    }

    pub fn boss_id(&self) -> Option<EntityId> {
        self.boss_id
    }

    /// Remove every entity in `group` strictly farther than `radius` from
    /// `origin`. The returned notices must be fed back through
    /// [`SpawnDirector::on_death`].
    pub fn cull_distant(
        &self,
        world: &mut World,
        group: Group,
        origin: Vec2,
        radius: f32,
    ) -> Vec<DeathNotice> {
        let mut notices = Vec::new();
        for id in world.distant(group, origin, radius) {
            // A serpent head may already have taken this segment with it
            if let Some(notice) = world.destroy(id, DespawnReason::Culled) {
                log::debug!("Culled {} #{}", notice.kind.as_str(), id);
                notices.push(notice);
            }
        }
        notices
    }

    /// Cull all groups around the player using the configured radius
    pub fn cull_all(&self, world: &mut World, origin: Vec2) -> Vec<DeathNotice> {
        let radius = self.cull_radius;
        let mut notices = self.cull_distant(world, Group::Prisms, origin, radius);
        notices.extend(self.cull_distant(world, Group::Meteors, origin, radius));
        notices.extend(self.cull_distant(world, Group::Enemies, origin, radius));
        notices
    }

    /// Consume a death notice. Clears the boss flag exactly once, for the
    /// boss that set it.
    pub fn on_death(&mut self, notice: &DeathNotice) {
        if notice.is_boss() && self.boss_id == Some(notice.id) {
            self.boss_active = false;
            self.boss_id = None;
            log::info!("Boss {} #{} gone ({:?})", notice.kind.as_str(), notice.id, notice.reason);
        }
    }

    /// Release the flag without a death (run teardown)
    pub fn reset(&mut self) {
        self.boss_active = false;
        self.boss_id = None;
    }

    /// Uniform angle, distance in [min, max) around `origin`
    pub fn spawn_position(&self, origin: Vec2, rng: &mut impl RandomSource) -> Vec2 {
        let angle = rng.range_f32(0.0, std::f32::consts::TAU);
        let dist = rng.range_f32(self.spawn_min_distance, self.spawn_max_distance);
        origin + polar_to_cartesian(dist, angle)
    }

    /// Weight table in force for `round`: the last tier whose `min_round` was reached
    fn tier(&self, round: u32) -> Option<&SpawnTier> {
        self.tiers
            .iter()
            .filter(|t| t.min_round <= round)
            .max_by_key(|t| t.min_round)
            .or(self.tiers.first())
    }

    /// Weighted enemy kind for `round`: one uniform draw against cumulative
    /// thresholds, first match wins.
    pub fn pick_enemy_kind(&self, round: u32, rng: &mut impl RandomSource) -> EntityKind {
        let roll = rng.next_f32();
        self.tier(round)
            .and_then(|t| pick_weighted(&t.weights, roll))
            .unwrap_or(EntityKind::FluxStrider)
    }

    /// Spawn at most one entity per group below its cap
    pub fn maintain_population(
        &mut self,
        world: &mut World,
        caps: Caps,
        round: u32,
        score: u64,
        origin: Vec2,
        rng: &mut impl RandomSource,
    ) -> Vec<SpawnRecord> {
        let mut spawned = Vec::new();

        if world.prisms.count_active() < caps.prisms {
            let pos = self.spawn_position(origin, rng);
            if let Some(id) = world.spawn(EntityKind::Prism, pos) {
                spawned.push(SpawnRecord {
                    id,
                    kind: EntityKind::Prism,
                    pos,
                    children: Vec::new(),
                });
            }
        }

        if world.meteors.count_active() < caps.meteors {
            let pos = self.spawn_position(origin, rng);
            let scale = rng.range_f32(self.meteor_min_scale, self.meteor_max_scale);
            if let Some(id) = world.spawn_meteor(pos, scale) {
                spawned.push(SpawnRecord {
                    id,
                    kind: EntityKind::Meteor,
                    pos,
                    children: Vec::new(),
                });
            }
        }

        if world.enemies.count_active() < caps.enemies {
            let pos = self.spawn_position(origin, rng);
            if let Some(record) = self.try_spawn_boss(world, score, pos, rng) {
                spawned.push(record);
            } else {
                let kind = self.pick_enemy_kind(round, rng);
                if let Some(id) = world.spawn(kind, pos) {
                    log::debug!("Spawned {} #{}", kind.as_str(), id);
                    spawned.push(SpawnRecord {
                        id,
                        kind,
                        pos,
                        children: Vec::new(),
                    });
                }
            }
        }

        spawned
    }

    /// Boss gate: score above threshold, no live boss, Bernoulli roll succeeds
    fn try_spawn_boss(
        &mut self,
        world: &mut World,
        score: u64,
        pos: Vec2,
        rng: &mut impl RandomSource,
    ) -> Option<SpawnRecord> {
        if score <= self.boss_score_threshold || self.boss_active {
            return None;
        }
        if !rng.chance(self.boss_chance) {
            return None;
        }
        let record = if rng.chance(self.serpent_share) {
            let (id, children) = world.spawn_serpent(pos)?;
            SpawnRecord {
                id,
                kind: EntityKind::VoidSerpent,
                pos,
                children,
            }
        } else {
            let id = world.spawn(EntityKind::NegativeSpaceVoid, pos)?;
            SpawnRecord {
                id,
                kind: EntityKind::NegativeSpaceVoid,
                pos,
                children: Vec::new(),
            }
        };
        self.boss_active = true;
        self.boss_id = Some(record.id);
        log::info!("Boss {} #{} spawned", record.kind.as_str(), record.id);
        Some(record)
    }
}

/// First kind whose cumulative (normalized) weight exceeds `roll`
pub fn pick_weighted(weights: &[(EntityKind, f32)], roll: f32) -> Option<EntityKind> {
    let total: f32 = weights.iter().map(|&(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let mut cumulative = 0.0;
    for &(kind, w) in weights {
        cumulative += w.max(0.0) / total;
        if roll < cumulative {
            return Some(kind);
        }
    }
    // Rounding left the last threshold just under 1.0
    weights.iter().rev().find(|&&(_, w)| w > 0.0).map(|&(k, _)| k)
}
