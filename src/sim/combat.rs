//! Combat resolution rules
//!
//! Detection is done by the host physics engine; these functions decide
//! what an overlap means. They mutate only the entity (health, burn) and
//! return a verdict. Removal, score and events are applied by `GameState`
//! so that every kill goes through a single death-notice path.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catalog::{EntityKind, Group};
use super::player::Projectile;
use super::world::{Entity, EntityId, World};
use crate::consts::*;
use crate::distance;
use crate::tuning::Tuning;

/// What a projectile overlap did to its target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HitVerdict {
    /// Target must be destroyed
    Destroy,
    /// Graduated damage, target survives
    Damaged { remaining: f32 },
    /// Polarity mismatch: no damage, projectile is still consumed
    Glancing,
    /// Target does not take projectile damage (prisms reflect instead)
    Ignored,
}

/// Damage numbers used by [`resolve_hit`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatRules {
    pub matched_hit_damage: f32,
    pub overdrive_hit_damage: f32,
    pub meteor_hit_damage: f32,
    pub default_score: u32,
}

impl CombatRules {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            matched_hit_damage: tuning.matched_hit_damage,
            overdrive_hit_damage: tuning.overdrive_hit_damage,
            meteor_hit_damage: tuning.meteor_hit_damage,
            default_score: tuning.default_score,
        }
    }

    /// Points for a kill; an unset (zero) value falls back to the default
    pub fn score_for(&self, score_value: u32) -> u32 {
        if score_value == 0 {
            self.default_score
        } else {
            score_value
        }
    }
}

impl Default for CombatRules {
    fn default() -> Self {
        Self::from_tuning(&Tuning::default())
    }
}

/// Decide a projectile hit against `target`, applying graduated damage.
///
/// Meteors take a fixed decrement regardless of polarity. Everything else
/// needs a matching polarity unless the shot is overdrive. One-hit kinds
/// are destroyed outright; health-bearing ones lose a fixed amount.
pub fn resolve_hit(rules: &CombatRules, shot: &Projectile, target: &mut Entity) -> HitVerdict {
    if target.kind == EntityKind::Prism {
        return HitVerdict::Ignored;
    }

    let damage = if shot.overdrive {
        rules.overdrive_hit_damage
    } else if target.kind == EntityKind::Meteor {
        rules.meteor_hit_damage
    } else if shot.polarity == target.polarity {
        rules.matched_hit_damage
    } else {
        return HitVerdict::Glancing;
    };

    match target.health.as_mut() {
        None => HitVerdict::Destroy,
        Some(health) => {
            *health -= damage;
            if *health <= 0.0 {
                HitVerdict::Destroy
            } else {
                HitVerdict::Damaged { remaining: *health }
            }
        }
    }
}

/// Prism contact: flip polarity once if the shot is reflectable.
/// Returns true when the polarity changed.
pub fn reflect_at_prism(shot: &mut Projectile) -> bool {
    if !shot.reflectable {
        return false;
    }
    shot.polarity = shot.polarity.flipped();
    true
}

/// Things other than a body contact that can hurt the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hazard {
    /// Strider pellet
    Pellet,
    /// Loomer trail segment; also slows
    Trail,
    KamikazeBlast,
}

impl Hazard {
    pub fn damage(self) -> i32 {
        match self {
            Hazard::Pellet => PELLET_DAMAGE,
            Hazard::Trail => TRAIL_DAMAGE,
            Hazard::KamikazeBlast => KAMIKAZE_BLAST_DAMAGE,
        }
    }
}

/// Player body contact with an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactVerdict {
    pub damage: i32,
    /// The contacted entity is expended
    pub destroy: bool,
}

/// Contact damage for touching `target`. Bosses survive the ram; prisms are harmless.
pub fn contact(target: &Entity) -> ContactVerdict {
    match target.kind.group() {
        Group::Prisms => ContactVerdict {
            damage: 0,
            destroy: false,
        },
        Group::Meteors => ContactVerdict {
            damage: METEOR_CONTACT_DAMAGE,
            destroy: true,
        },
        Group::Enemies => ContactVerdict {
            damage: ENEMY_CONTACT_DAMAGE,
            destroy: !target.is_boss(),
        },
    }
}

/// Flame aura parameters for the current upgrade level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlameAura {
    pub radius: f32,
    /// Damage per second
    pub dps: f32,
    pub enemy_threshold: f32,
    pub meteor_threshold: f32,
}

impl FlameAura {
    /// `None` when the aura is inactive (level 0)
    pub fn for_level(tuning: &Tuning, level: u8) -> Option<Self> {
        if level == 0 {
            return None;
        }
        Some(Self {
            radius: tuning.flame_radius,
            dps: tuning.flame_dps_per_level * level as f32,
            enemy_threshold: tuning.flame_enemy_threshold,
            meteor_threshold: tuning.flame_meteor_threshold,
        })
    }
}

/// Apply one tick of flame damage around `origin` and return the ids that
/// burned out. Health-bearing enemies lose health; meteors and one-hit
/// enemies accumulate burn until their threshold.
pub fn burn_nearby(world: &mut World, origin: Vec2, aura: &FlameAura, dt_ms: f32) -> Vec<EntityId> {
    let damage = aura.dps * dt_ms / 1000.0;
    let mut burned = Vec::new();

    for e in world.meteors.entities.iter_mut() {
        if distance(e.pos, origin) < aura.radius {
            e.burn += damage;
            if e.burn >= aura.meteor_threshold {
                burned.push(e.id);
            }
        }
    }

    for e in world.enemies.entities.iter_mut() {
        if distance(e.pos, origin) >= aura.radius {
            continue;
        }
        let dead = match e.health.as_mut() {
            Some(health) => {
                *health -= damage;
                *health <= 0.0
            }
            None => {
                e.burn += damage;
                e.burn >= aura.enemy_threshold
            }
        };
        if dead {
            burned.push(e.id);
        }
    }

    burned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::catalog::Polarity;

    fn enemy(world: &mut World, kind: EntityKind, polarity: Polarity) -> EntityId {
        let id = world.spawn(kind, Vec2::new(10.0, 0.0)).unwrap();
        world.get_mut(id).unwrap().polarity = polarity;
        id
    }

    #[test]
    fn test_matched_polarity_destroys_one_hit_enemy() {
        let mut world = World::new(4, 4, 4);
        let id = enemy(&mut world, EntityKind::FluxStrider, Polarity::A);
        let verdict = resolve_hit(
            &CombatRules::default(),
            &Projectile::new(0.0, Polarity::A),
            world.get_mut(id).unwrap(),
        );
        assert_eq!(verdict, HitVerdict::Destroy);
    }

    #[test]
    fn test_mismatched_polarity_glances() {
        let mut world = World::new(4, 4, 4);
        let id = enemy(&mut world, EntityKind::NegativeSpaceVoid, Polarity::B);
        let verdict = resolve_hit(
            &CombatRules::default(),
            &Projectile::new(0.0, Polarity::A),
            world.get_mut(id).unwrap(),
        );
        assert_eq!(verdict, HitVerdict::Glancing);
        assert_eq!(world.get(id).unwrap().health, Some(1000.0));
    }

    #[test]
    fn test_boss_takes_graduated_damage() {
        let mut world = World::new(4, 4, 4);
        let id = enemy(&mut world, EntityKind::VoidSerpent, Polarity::A);
        let rules = CombatRules::default();
        let shot = Projectile::new(0.0, Polarity::A);
        let verdict = resolve_hit(&rules, &shot, world.get_mut(id).unwrap());
        assert_eq!(verdict, HitVerdict::Damaged { remaining: 490.0 });

        let verdict = resolve_hit(&rules, &Projectile::overdrive(0.0), world.get_mut(id).unwrap());
        assert_eq!(verdict, HitVerdict::Damaged { remaining: 440.0 });
    }

    #[test]
    fn test_overdrive_ignores_polarity() {
        let mut world = World::new(4, 4, 4);
        let id = enemy(&mut world, EntityKind::Kamikaze, Polarity::B);
        let verdict = resolve_hit(
            &CombatRules::default(),
            &Projectile::overdrive(0.0),
            world.get_mut(id).unwrap(),
        );
        assert_eq!(verdict, HitVerdict::Destroy);
    }

    #[test]
    fn test_meteors_ignore_polarity() {
        let mut world = World::new(4, 4, 4);
        let id = world.spawn_meteor(Vec2::ZERO, 0.1).unwrap();
        world.get_mut(id).unwrap().polarity = Polarity::B;
        let rules = CombatRules::default();
        let shot = Projectile::new(0.0, Polarity::A);
        // 5 health, one hit
        assert_eq!(
            resolve_hit(&rules, &shot, world.get_mut(id).unwrap()),
            HitVerdict::Destroy
        );
    }

    #[test]
    fn test_prisms_flip_reflectable_shots_once() {
        let mut shot = Projectile::new(0.0, Polarity::A);
        assert!(reflect_at_prism(&mut shot));
        assert_eq!(shot.polarity, Polarity::B);

        let mut od = Projectile::overdrive(0.0);
        assert!(!reflect_at_prism(&mut od));
        assert_eq!(od.polarity, Polarity::A);
    }

    #[test]
    fn test_bosses_survive_contact() {
        let mut world = World::new(4, 4, 4);
        let boss = enemy(&mut world, EntityKind::NegativeSpaceVoid, Polarity::A);
        let grunt = enemy(&mut world, EntityKind::FluxStrider, Polarity::A);
        assert!(!contact(world.get(boss).unwrap()).destroy);
        let c = contact(world.get(grunt).unwrap());
        assert!(c.destroy);
        assert_eq!(c.damage, 10);
    }

    #[test]
    fn test_flame_burns_inside_radius_only() {
        let mut world = World::new(4, 4, 4);
        let near = world.spawn(EntityKind::FluxStrider, Vec2::new(59.0, 0.0)).unwrap();
        let edge = world.spawn(EntityKind::FluxStrider, Vec2::new(60.0, 0.0)).unwrap();
        let aura = FlameAura::for_level(&Tuning::default(), 2).unwrap();

        // 10 dps for 1 s
        let burned = burn_nearby(&mut world, Vec2::ZERO, &aura, 1000.0);
        assert!(burned.is_empty());
        assert!((world.get(near).unwrap().burn - 10.0).abs() < 1e-4);
        assert_eq!(world.get(edge).unwrap().burn, 0.0);

        let burned = burn_nearby(&mut world, Vec2::ZERO, &aura, 1000.0);
        assert_eq!(burned, vec![near]);
    }

    #[test]
    fn test_flame_drains_boss_health() {
        let mut world = World::new(4, 4, 4);
        let id = world.spawn(EntityKind::VoidSerpent, Vec2::new(5.0, 0.0)).unwrap();
        let aura = FlameAura::for_level(&Tuning::default(), 1).unwrap();
        burn_nearby(&mut world, Vec2::ZERO, &aura, 2000.0);
        assert_eq!(world.get(id).unwrap().health, Some(490.0));
    }

    #[test]
    fn test_no_aura_at_level_zero() {
        assert!(FlameAura::for_level(&Tuning::default(), 0).is_none());
    }
}
