//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering
//! and platform dependencies:
//! - Time advances only through `tick` with the host's frame delta
//! - Every random decision draws from a `RandomSource`
//! - Entity positions are pushed in by the host physics engine

pub mod catalog;
pub mod combat;
pub mod player;
pub mod rng;
pub mod round;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod upgrades;
pub mod world;

pub use catalog::{EntityKind, Group, KindStats, Polarity, SERPENT_SEGMENTS};
pub use combat::{
    CombatRules, FlameAura, Hazard, HitVerdict, burn_nearby, reflect_at_prism, resolve_hit,
};
pub use player::{
    DamageOutcome, PlayerState, Projectile, Skill, SkillKind, SkillPhase, growth_scale, volley,
};
pub use rng::{RandomSource, ScriptedRng};
pub use round::{Difficulty, RoundAdvance, RoundController, RoundPhase};
pub use spawn::{Caps, SpawnDirector, SpawnRecord, pick_weighted};
pub use state::{
    EnemyAction, GameEvent, GamePhase, GameState, HitOutcome, HudSnapshot, UpgradeTally,
};
pub use tick::{TickInput, tick};
pub use upgrades::{
    CATALOG, Category, Commit, Selection, UpgradeDefinition, UpgradeEngine, UpgradeId,
    UpgradeProgress, regenerate, select_random_subset,
};
pub use world::{Behavior, DeathNotice, DespawnReason, Entity, EntityId, Population, World};
