//! Run state, events and the presentation snapshot
//!
//! `GameState` is the explicit simulation context: round controller,
//! upgrade engine, spawn director, player and populations all live here and
//! are passed to each tick. Collision reports from the host engine enter
//! through the `on_*` methods; every removal is routed through
//! [`GameState::handle_death`] so score and the boss flag are settled once.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catalog::{EntityKind, Polarity};
use super::combat::{self, CombatRules, Hazard, HitVerdict};
use super::player::{DamageOutcome, PlayerState, Projectile, SkillKind, volley};
use super::round::RoundController;
use super::spawn::SpawnDirector;
use super::upgrades::{Commit, UpgradeEngine, UpgradeId};
use super::world::{DeathNotice, DespawnReason, EntityId, World};
use crate::error::{SimError, SimResult};
use crate::tuning::Tuning;

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    /// Last life spent
    GameOver,
}

/// Something an enemy did this tick that the host should render or simulate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum EnemyAction {
    /// Strider shot aimed at the player
    FirePellet { angle: f32 },
    /// Loomer trail segment left at `pos`
    DropTrail { pos: Vec2 },
    /// Sentinel field while the player is close
    DisruptionPulse,
    /// Kamikaze locked on and started its fuse
    Armed,
    /// Kamikaze detonated; `hit` when the player was inside the blast
    Exploded { hit: bool },
    /// Void ring of `shots` projectiles
    RingBurst { shots: u32 },
    /// Serpent spread aimed at the player
    SpreadShot { angle: f32, shots: u32 },
    PolaritySwapped { polarity: Polarity },
}

/// Events for the presentation layer, drained once per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    Spawned {
        id: EntityId,
        kind: EntityKind,
        pos: Vec2,
    },
    Despawned {
        id: EntityId,
        kind: EntityKind,
        reason: DespawnReason,
    },
    Killed {
        id: EntityId,
        kind: EntityKind,
        points: u32,
    },
    RoundStarted {
        round: u32,
        enemy_cap: usize,
        meteor_cap: usize,
    },
    RoundBonus {
        round: u32,
        points: u64,
    },
    UpgradeOffered {
        round: u32,
        choices: Vec<UpgradeId>,
    },
    UpgradeApplied {
        id: UpgradeId,
        level: u8,
        shape_sides: u32,
    },
    BossSpawned {
        id: EntityId,
        kind: EntityKind,
    },
    BossDefeated {
        id: EntityId,
        kind: EntityKind,
    },
    /// Polarity mismatch: deflection flash only
    Glancing {
        id: EntityId,
    },
    /// Health-bearing target took a hit
    DamageFlash {
        id: EntityId,
        remaining: f32,
    },
    ShotsFired {
        count: usize,
        overdrive: bool,
    },
    EnemyAction {
        id: EntityId,
        action: EnemyAction,
    },
    PlayerDamaged {
        amount: i32,
        health: i32,
        lives: u8,
    },
    /// Shield absorbed the hit
    PlayerShielded,
    LifeLost {
        lives: u8,
    },
    SkillActivated {
        skill: SkillKind,
    },
    GameOver {
        score: u64,
        round: u32,
    },
}

/// What the HUD reads each frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub round: u32,
    pub round_timer_ms: f32,
    pub announcing: bool,
    pub score: u64,
    pub health: i32,
    pub max_health: i32,
    pub lives: u8,
    pub overdrive_cooldown_ms: f32,
    pub shield_cooldown_ms: f32,
    pub dash_cooldown_ms: f32,
    pub overdrive_active: bool,
    pub shield_active: bool,
    pub paused: bool,
    pub boss_active: bool,
    pub game_over: bool,
    pub upgrades: Vec<UpgradeTally>,
}

/// One line of the active-upgrade tally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeTally {
    pub id: UpgradeId,
    pub name: String,
    pub level: u8,
    pub max_level: u8,
}

/// Outcome of a projectile hit report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitOutcome {
    Killed { points: u32 },
    Damaged,
    Glancing,
    /// Target takes no projectile damage
    NoEffect,
}

/// Complete run state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub tuning: Tuning,
    pub rules: CombatRules,
    pub round: RoundController,
    pub upgrades: UpgradeEngine,
    pub spawner: SpawnDirector,
    pub player: PlayerState,
    pub world: World,
    pub score: u64,
    /// Simulated time, excluding paused time
    pub time_ms: f64,
    pub phase: GamePhase,
    /// Pending presentation events
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(tuning: &Tuning, player_pos: Vec2) -> Self {
        log::info!(
            "New run: round {} ms, {} upgrade choices",
            tuning.round_duration_ms,
            tuning.upgrade_choices
        );
        Self {
            tuning: tuning.clone(),
            rules: CombatRules::from_tuning(tuning),
            round: RoundController::new(tuning),
            upgrades: UpgradeEngine::new(tuning),
            spawner: SpawnDirector::new(tuning),
            player: PlayerState::new(player_pos),
            world: World::new(tuning.prism_pool, tuning.meteor_pool, tuning.enemy_pool),
            score: 0,
            time_ms: 0.0,
            phase: GamePhase::Playing,
            events: Vec::new(),
        }
    }

    /// World-advancing systems are suspended while an upgrade is being picked
    pub fn is_paused(&self) -> bool {
        self.upgrades.is_paused()
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn add_score(&mut self, points: u64) {
        self.score += points;
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn hud(&self) -> HudSnapshot {
        let upgrades = self
            .upgrades
            .progress
            .active()
            .into_iter()
            .map(|(id, level)| {
                let def = id.definition();
                UpgradeTally {
                    id,
                    name: def.display_name.to_string(),
                    level,
                    max_level: def.max_level,
                }
            })
            .collect();
        HudSnapshot {
            round: self.round.current_round,
            round_timer_ms: self.round.round_timer_ms,
            announcing: self.round.is_announcing(),
            score: self.score,
            health: self.player.health,
            max_health: self.player.max_health,
            lives: self.player.lives,
            overdrive_cooldown_ms: self.player.overdrive.cooldown_remaining_ms(),
            shield_cooldown_ms: self.player.shield.cooldown_remaining_ms(),
            dash_cooldown_ms: self.player.dash.cooldown_remaining_ms(),
            overdrive_active: self.player.overdrive.is_active(),
            shield_active: self.player.shield.is_active(),
            paused: self.is_paused(),
            boss_active: self.spawner.boss_active(),
            game_over: self.is_game_over(),
            upgrades,
        }
    }

    /// Settle a removal: boss flag, score for kills, presentation events
    pub fn handle_death(&mut self, notice: DeathNotice) {
        self.spawner.on_death(&notice);

        if notice.reason == DespawnReason::Killed {
            let points = self.rules.score_for(notice.score_value);
            self.add_score(points as u64);
            log::debug!("Killed {} #{} (+{})", notice.kind.as_str(), notice.id, points);
            self.push_event(GameEvent::Killed {
                id: notice.id,
                kind: notice.kind,
                points,
            });
            if notice.is_boss() {
                self.push_event(GameEvent::BossDefeated {
                    id: notice.id,
                    kind: notice.kind,
                });
            }
        }

        for &seg in &notice.cascaded {
            self.push_event(GameEvent::Despawned {
                id: seg,
                kind: EntityKind::VoidSerpentSegment,
                reason: DespawnReason::Cascade,
            });
        }
        self.push_event(GameEvent::Despawned {
            id: notice.id,
            kind: notice.kind,
            reason: notice.reason,
        });
    }

    /// Destroy `id` and settle the notice. Returns the points awarded.
    pub fn destroy(&mut self, id: EntityId, reason: DespawnReason) -> Option<u32> {
        let notice = self.world.destroy(id, reason)?;
        let points = if reason == DespawnReason::Killed {
            self.rules.score_for(notice.score_value)
        } else {
            0
        };
        self.handle_death(notice);
        Some(points)
    }

    /// A player projectile overlapped entity `id`
    pub fn on_projectile_hit(&mut self, id: EntityId, shot: &Projectile) -> SimResult<HitOutcome> {
        let rules = self.rules;
        let target = self
            .world
            .get_mut(id)
            .ok_or(SimError::UnknownEntity { id })?;
        let outcome = match combat::resolve_hit(&rules, shot, target) {
            HitVerdict::Destroy => {
                let points = self.destroy(id, DespawnReason::Killed).unwrap_or(0);
                HitOutcome::Killed { points }
            }
            HitVerdict::Damaged { remaining } => {
                self.push_event(GameEvent::DamageFlash { id, remaining });
                HitOutcome::Damaged
            }
            HitVerdict::Glancing => {
                self.push_event(GameEvent::Glancing { id });
                HitOutcome::Glancing
            }
            HitVerdict::Ignored => HitOutcome::NoEffect,
        };
        Ok(outcome)
    }

    /// A projectile touched prism `id`. Returns true if its polarity flipped.
    pub fn on_prism_contact(&self, id: EntityId, shot: &mut Projectile) -> SimResult<bool> {
        match self.world.prisms.get(id) {
            Some(_) => Ok(combat::reflect_at_prism(shot)),
            None => Err(SimError::UnknownEntity { id }),
        }
    }

    /// The player's body touched entity `id`
    pub fn on_player_contact(&mut self, id: EntityId) -> SimResult<DamageOutcome> {
        let target = self.world.get(id).ok_or(SimError::UnknownEntity { id })?;
        let verdict = combat::contact(target);
        if verdict.destroy {
            self.destroy(id, DespawnReason::Expended);
        }
        Ok(self.damage_player(verdict.damage))
    }

    /// A non-entity hazard (pellet, trail, blast) hit the player
    pub fn on_hazard(&mut self, hazard: Hazard) -> DamageOutcome {
        let outcome = self.damage_player(hazard.damage());
        if hazard == Hazard::Trail && outcome != DamageOutcome::Absorbed {
            self.player.apply_velocity_debuff();
        }
        outcome
    }

    /// Apply damage to the player and end the run on the last life
    pub fn damage_player(&mut self, amount: i32) -> DamageOutcome {
        if amount <= 0 || self.is_game_over() {
            return DamageOutcome::Absorbed;
        }
        let outcome = self.player.take_damage(amount);
        match outcome {
            DamageOutcome::Absorbed => self.push_event(GameEvent::PlayerShielded),
            DamageOutcome::Hit => self.push_event(GameEvent::PlayerDamaged {
                amount,
                health: self.player.health,
                lives: self.player.lives,
            }),
            DamageOutcome::LifeLost => {
                log::info!("Life lost, {} remaining", self.player.lives);
                self.push_event(GameEvent::LifeLost {
                    lives: self.player.lives,
                });
            }
            DamageOutcome::Dead => self.game_over(),
        }
        outcome
    }

    fn game_over(&mut self) {
        if self.is_game_over() {
            return;
        }
        log::info!(
            "Game over: score {} at round {}",
            self.score,
            self.round.current_round
        );
        self.phase = GamePhase::GameOver;
        self.push_event(GameEvent::GameOver {
            score: self.score,
            round: self.round.current_round,
        });
    }

    /// Pull the trigger. Empty when the fire interval has not elapsed.
    pub fn fire(&mut self, angle: f32, polarity: Polarity) -> Vec<Projectile> {
        if self.player.fire_cooldown_ms > 0.0 || self.is_game_over() {
            return Vec::new();
        }
        self.player.fire_cooldown_ms = self
            .player
            .effective_fire_rate_ms(self.tuning.min_fire_interval_ms);
        let shots = volley(&self.player, angle, polarity);
        self.push_event(GameEvent::ShotsFired {
            count: shots.len(),
            overdrive: self.player.overdrive.is_active(),
        });
        shots
    }

    pub fn activate_skill(&mut self, skill: SkillKind) -> bool {
        let fired = self.player.activate(skill);
        if fired {
            log::debug!("Skill {:?} activated", skill);
            self.push_event(GameEvent::SkillActivated { skill });
        }
        fired
    }

    /// Commit the player's pick from the open selection and resume
    pub fn commit_upgrade(&mut self, choice: UpgradeId) -> SimResult<Commit> {
        let commit = self.upgrades.commit(choice, &mut self.player)?;
        if let Commit::Applied { id, level } = commit {
            self.push_event(GameEvent::UpgradeApplied {
                id,
                level,
                shape_sides: self.player.shape_sides,
            });
        }
        Ok(commit)
    }

    /// End of run: drop every entity and release the boss flag even if the
    /// boss never died.
    pub fn teardown(&mut self) {
        self.world.clear();
        self.spawner.reset();
        self.upgrades.reset_offers();
        self.events.clear();
        log::info!("Run torn down at score {}", self.score);
    }
}
