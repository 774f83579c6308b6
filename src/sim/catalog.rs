//! Static entity definitions
//!
//! Every spawnable kind and its base stats. The table is fixed at compile
//! time; runtime variation (meteor scale, polarity) is applied at spawn.

use serde::{Deserialize, Serialize};

/// Binary polarity tag carried by projectiles and damageable entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Polarity {
    /// White
    #[default]
    A,
    /// Accent (cyan)
    B,
}

impl Polarity {
    pub fn flipped(self) -> Self {
        match self {
            Polarity::A => Polarity::B,
            Polarity::B => Polarity::A,
        }
    }
}

/// Population group that owns an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Group {
    Prisms,
    Meteors,
    Enemies,
}

/// Every kind the spawn director can place in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Prism,
    Meteor,
    FluxStrider,
    ChronoLoomer,
    VoidSentinel,
    Kamikaze,
    NegativeSpaceVoid,
    VoidSerpent,
    VoidSerpentSegment,
}

/// Base stats for a kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindStats {
    pub group: Group,
    /// Intrinsic health; `None` means any qualifying hit destroys it
    pub health: Option<f32>,
    pub score_value: u32,
    /// Periodically flips polarity
    pub swaps_polarity: bool,
    pub is_boss: bool,
}

/// Number of body segments trailing a serpent head
pub const SERPENT_SEGMENTS: usize = 12;

impl EntityKind {
    pub fn stats(self) -> KindStats {
        use EntityKind::*;
        let (group, health, score_value, swaps_polarity, is_boss) = match self {
            Prism => (Group::Prisms, None, 0, false, false),
            // Meteor health is 50 * spawn scale, see `World::spawn`
            Meteor => (Group::Meteors, Some(50.0), 10, false, false),
            FluxStrider => (Group::Enemies, None, 100, true, false),
            ChronoLoomer => (Group::Enemies, None, 300, true, false),
            VoidSentinel => (Group::Enemies, None, 500, true, false),
            Kamikaze => (Group::Enemies, None, 200, true, false),
            NegativeSpaceVoid => (Group::Enemies, Some(1000.0), 5000, true, true),
            VoidSerpent => (Group::Enemies, Some(500.0), 2000, true, true),
            VoidSerpentSegment => (Group::Enemies, Some(30.0), 50, true, false),
        };
        KindStats {
            group,
            health,
            score_value,
            swaps_polarity,
            is_boss,
        }
    }

    pub fn group(self) -> Group {
        self.stats().group
    }

    pub fn is_boss(self) -> bool {
        self.stats().is_boss
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Prism => "prism",
            EntityKind::Meteor => "meteor",
            EntityKind::FluxStrider => "flux-strider",
            EntityKind::ChronoLoomer => "chrono-loomer",
            EntityKind::VoidSentinel => "void-sentinel",
            EntityKind::Kamikaze => "kamikaze",
            EntityKind::NegativeSpaceVoid => "negative-space-void",
            EntityKind::VoidSerpent => "void-serpent",
            EntityKind::VoidSerpentSegment => "void-serpent-segment",
        }
    }
}
