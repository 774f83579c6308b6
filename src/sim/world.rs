//! Population groups and the entities they own
//!
//! Entities are data: positions are owned by the external physics engine
//! and pushed in through [`World::sync_position`]. Removal always goes
//! through [`World::destroy`], which returns a [`DeathNotice`] that the
//! owner consumes synchronously (boss flag release, segment cascade).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catalog::{EntityKind, Group, Polarity, SERPENT_SEGMENTS};
use crate::distance;

pub type EntityId = u32;

/// Per-kind behaviour state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    Inert,
    Strider,
    Loomer { trail_ms: f32 },
    Sentinel,
    Kamikaze { fuse_ms: Option<f32> },
    Void { attack_ms: f32 },
    Serpent { segments: Vec<EntityId>, shoot_ms: f32 },
    Segment { head: EntityId },
}

impl Behavior {
    fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Prism | EntityKind::Meteor => Behavior::Inert,
            EntityKind::FluxStrider => Behavior::Strider,
            EntityKind::ChronoLoomer => Behavior::Loomer { trail_ms: 0.0 },
            EntityKind::VoidSentinel => Behavior::Sentinel,
            EntityKind::Kamikaze => Behavior::Kamikaze { fuse_ms: None },
            EntityKind::NegativeSpaceVoid => Behavior::Void { attack_ms: 0.0 },
            EntityKind::VoidSerpent => Behavior::Serpent {
                segments: Vec::new(),
                shoot_ms: 0.0,
            },
            // Rewired by `World::spawn_serpent`
            EntityKind::VoidSerpentSegment => Behavior::Segment { head: 0 },
        }
    }
}

/// A live world entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub polarity: Polarity,
    /// Graduated health; `None` for one-hit kinds
    pub health: Option<f32>,
    pub score_value: u32,
    /// Damage-over-time accumulated by sources that use a kill threshold
    pub burn: f32,
    /// Meteor size multiplier (1.0 for everything else)
    pub scale: f32,
    pub swap_timer_ms: f32,
    pub behavior: Behavior,
}

impl Entity {
    fn new(id: EntityId, kind: EntityKind, pos: Vec2) -> Self {
        let stats = kind.stats();
        Self {
            id,
            kind,
            pos,
            polarity: Polarity::A,
            health: stats.health,
            score_value: stats.score_value,
            burn: 0.0,
            scale: 1.0,
            swap_timer_ms: 0.0,
            behavior: Behavior::for_kind(kind),
        }
    }

    pub fn is_boss(&self) -> bool {
        self.kind.is_boss()
    }
}

/// Why an entity left the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DespawnReason {
    Killed,
    Culled,
    /// Rammed the player or self-destructed
    Expended,
    /// Owner died and took it along
    Cascade,
}

/// One-shot notification produced by [`World::destroy`]
#[derive(Debug, Clone, PartialEq)]
pub struct DeathNotice {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub score_value: u32,
    pub reason: DespawnReason,
    /// Segments removed along with a serpent head
    pub cascaded: Vec<EntityId>,
}

impl DeathNotice {
    pub fn is_boss(&self) -> bool {
        self.kind.is_boss()
    }
}

/// Entities of one group with a fixed pool size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Population {
    pub group: Group,
    pub entities: Vec<Entity>,
    /// Pool size; spawns beyond it are skipped
    pub capacity: usize,
}

impl Population {
    pub fn new(group: Group, capacity: usize) -> Self {
        Self {
            group,
            entities: Vec::new(),
            capacity,
        }
    }

    pub fn count_active(&self) -> usize {
        self.entities.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.entities.len() >= self.capacity
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    fn take(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(idx))
    }
}

/// All population groups plus the id allocator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub prisms: Population,
    pub meteors: Population,
    pub enemies: Population,
    next_id: EntityId,
}

impl World {
    pub fn new(prism_pool: usize, meteor_pool: usize, enemy_pool: usize) -> Self {
        Self {
            prisms: Population::new(Group::Prisms, prism_pool),
            meteors: Population::new(Group::Meteors, meteor_pool),
            enemies: Population::new(Group::Enemies, enemy_pool),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn group(&self, group: Group) -> &Population {
        match group {
            Group::Prisms => &self.prisms,
            Group::Meteors => &self.meteors,
            Group::Enemies => &self.enemies,
        }
    }

    pub fn group_mut(&mut self, group: Group) -> &mut Population {
        match group {
            Group::Prisms => &mut self.prisms,
            Group::Meteors => &mut self.meteors,
            Group::Enemies => &mut self.enemies,
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.enemies
            .get(id)
            .or_else(|| self.meteors.get(id))
            .or_else(|| self.prisms.get(id))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        if let Some(idx) = self.enemies.entities.iter().position(|e| e.id == id) {
            return self.enemies.entities.get_mut(idx);
        }
        if let Some(idx) = self.meteors.entities.iter().position(|e| e.id == id) {
            return self.meteors.entities.get_mut(idx);
        }
        self.prisms.get_mut(id)
    }

    /// Push the engine's position for an entity
    pub fn sync_position(&mut self, id: EntityId, pos: Vec2) -> bool {
        match self.get_mut(id) {
            Some(e) => {
                e.pos = pos;
                true
            }
            None => false,
        }
    }

    /// Place one entity into its group. `None` when the pool is exhausted.
    pub fn spawn(&mut self, kind: EntityKind, pos: Vec2) -> Option<EntityId> {
        let group = kind.group();
        if self.group(group).is_exhausted() {
            log::debug!("{:?} pool exhausted, skipping {}", group, kind.as_str());
            return None;
        }
        let id = self.next_entity_id();
        self.group_mut(group).entities.push(Entity::new(id, kind, pos));
        Some(id)
    }

    /// Place a meteor with the given scale; health scales with it
    pub fn spawn_meteor(&mut self, pos: Vec2, scale: f32) -> Option<EntityId> {
        let id = self.spawn(EntityKind::Meteor, pos)?;
        if let Some(m) = self.meteors.get_mut(id) {
            m.scale = scale;
            m.health = m.health.map(|h| h * scale);
        }
        Some(id)
    }

    /// Place a serpent head and its body segments (alternating polarity,
    /// first segment B). Segments that do not fit the pool are skipped.
    pub fn spawn_serpent(&mut self, pos: Vec2) -> Option<(EntityId, Vec<EntityId>)> {
        let head = self.spawn(EntityKind::VoidSerpent, pos)?;
        let mut segments = Vec::with_capacity(SERPENT_SEGMENTS);
        for i in 0..SERPENT_SEGMENTS {
            let Some(seg) = self.spawn(EntityKind::VoidSerpentSegment, pos) else {
                break;
            };
            if let Some(e) = self.enemies.get_mut(seg) {
                e.behavior = Behavior::Segment { head };
                e.polarity = if i % 2 == 0 { Polarity::B } else { Polarity::A };
            }
            segments.push(seg);
        }
        if let Some(e) = self.enemies.get_mut(head) {
            if let Behavior::Serpent { segments: owned, .. } = &mut e.behavior {
                *owned = segments.clone();
            }
        }
        Some((head, segments))
    }

    /// Remove an entity and everything it owns.
    ///
    /// A serpent head removes its remaining segments first; a segment
    /// unregisters itself from its head. Returns `None` if the id is not live.
    pub fn destroy(&mut self, id: EntityId, reason: DespawnReason) -> Option<DeathNotice> {
        let group = self.get(id)?.kind.group();
        let entity = self.group_mut(group).take(id)?;

        let mut cascaded = Vec::new();
        match &entity.behavior {
            Behavior::Serpent { segments, .. } => {
                for &seg in segments {
                    if self.enemies.take(seg).is_some() {
                        cascaded.push(seg);
                    }
                }
            }
            Behavior::Segment { head } => {
                if let Some(h) = self.enemies.get_mut(*head) {
                    if let Behavior::Serpent { segments, .. } = &mut h.behavior {
                        segments.retain(|&s| s != id);
                    }
                }
            }
            _ => {}
        }

        Some(DeathNotice {
            id,
            kind: entity.kind,
            pos: entity.pos,
            score_value: entity.score_value,
            reason,
            cascaded,
        })
    }

    /// Ids in `group` farther than `radius` from `origin` (strictly greater)
    pub fn distant(&self, group: Group, origin: Vec2, radius: f32) -> Vec<EntityId> {
        self.group(group)
            .entities
            .iter()
            .filter(|e| distance(e.pos, origin) > radius)
            .map(|e| e.id)
            .collect()
    }

    /// Drop every entity (run teardown)
    pub fn clear(&mut self) {
        self.prisms.entities.clear();
        self.meteors.entities.clear();
        self.enemies.entities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_respects_pool() {
        let mut world = World::new(1, 1, 1);
        assert!(world.spawn(EntityKind::Prism, Vec2::ZERO).is_some());
        assert!(world.spawn(EntityKind::Prism, Vec2::ZERO).is_none());
        assert_eq!(world.prisms.count_active(), 1);
    }

    #[test]
    fn test_meteor_health_scales() {
        let mut world = World::new(4, 4, 4);
        let id = world.spawn_meteor(Vec2::ZERO, 1.2).unwrap();
        let m = world.get(id).unwrap();
        assert!((m.health.unwrap() - 60.0).abs() < 1e-4);
        assert_eq!(m.score_value, 10);
    }

    #[test]
    fn test_serpent_owns_alternating_segments() {
        let mut world = World::new(4, 4, 64);
        let (head, segs) = world.spawn_serpent(Vec2::ZERO).unwrap();
        assert_eq!(segs.len(), SERPENT_SEGMENTS);
        assert_eq!(world.enemies.count_active(), SERPENT_SEGMENTS + 1);
        assert_eq!(world.get(segs[0]).unwrap().polarity, Polarity::B);
        assert_eq!(world.get(segs[1]).unwrap().polarity, Polarity::A);
        assert!(matches!(
            world.get(segs[3]).unwrap().behavior,
            Behavior::Segment { head: h } if h == head
        ));
    }

    #[test]
    fn test_head_death_cascades_to_segments() {
        let mut world = World::new(4, 4, 64);
        let (head, segs) = world.spawn_serpent(Vec2::ZERO).unwrap();
        world.destroy(segs[0], DespawnReason::Killed).unwrap();

        let notice = world.destroy(head, DespawnReason::Killed).unwrap();
        assert_eq!(notice.cascaded.len(), SERPENT_SEGMENTS - 1);
        assert!(!notice.cascaded.contains(&segs[0]));
        assert_eq!(world.enemies.count_active(), 0);
    }

    #[test]
    fn test_destroy_is_one_shot() {
        let mut world = World::new(4, 4, 4);
        let id = world.spawn(EntityKind::FluxStrider, Vec2::ZERO).unwrap();
        assert!(world.destroy(id, DespawnReason::Killed).is_some());
        assert!(world.destroy(id, DespawnReason::Killed).is_none());
    }

    #[test]
    fn test_distant_is_strict() {
        let mut world = World::new(4, 4, 4);
        let at_edge = world.spawn(EntityKind::Meteor, Vec2::new(1500.0, 0.0)).unwrap();
        let beyond = world.spawn(EntityKind::Meteor, Vec2::new(1500.5, 0.0)).unwrap();
        let far = world.distant(Group::Meteors, Vec2::ZERO, 1500.0);
        assert_eq!(far, vec![beyond]);
        assert!(!far.contains(&at_edge));
    }
}
