//! Player ship state: health, lives, skills and upgrade-derived stats
//!
//! Upgrade effects write absolute values here (see `upgrades`); combat
//! damage goes through [`PlayerState::take_damage`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catalog::Polarity;
use crate::consts::*;

/// Skill lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SkillPhase {
    Ready,
    Active { remaining_ms: f32 },
    Cooldown { remaining_ms: f32 },
}

/// A timed ability (overdrive, shield, dash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub phase: SkillPhase,
    pub duration_ms: f32,
    pub cooldown_ms: f32,
    /// Cooldown starts at activation instead of when the active window ends
    pub cooldown_from_activation: bool,
    /// Cooldown still running while active (only with `cooldown_from_activation`)
    #[serde(default)]
    pending_cooldown_ms: f32,
}

impl Skill {
    pub fn new(duration_ms: f32, cooldown_ms: f32, cooldown_from_activation: bool) -> Self {
        Self {
            phase: SkillPhase::Ready,
            duration_ms,
            cooldown_ms,
            cooldown_from_activation,
            pending_cooldown_ms: 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, SkillPhase::Active { .. })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, SkillPhase::Ready)
    }

    /// Start the skill if ready. Returns true when it fired.
    pub fn activate(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.phase = SkillPhase::Active {
            remaining_ms: self.duration_ms,
        };
        self.pending_cooldown_ms = self.cooldown_ms;
        true
    }

    /// Advance timers. Returns true on the tick the active window ends.
    pub fn update(&mut self, dt_ms: f32) -> bool {
        match self.phase {
            SkillPhase::Ready => false,
            SkillPhase::Active { remaining_ms } => {
                if self.cooldown_from_activation {
                    self.pending_cooldown_ms -= dt_ms;
                }
                let remaining_ms = remaining_ms - dt_ms;
                if remaining_ms > 0.0 {
                    self.phase = SkillPhase::Active { remaining_ms };
                    return false;
                }
                let cooldown = if self.cooldown_from_activation {
                    self.pending_cooldown_ms
                } else {
                    self.cooldown_ms
                };
                self.phase = if cooldown > 0.0 {
                    SkillPhase::Cooldown {
                        remaining_ms: cooldown,
                    }
                } else {
                    SkillPhase::Ready
                };
                true
            }
            SkillPhase::Cooldown { remaining_ms } => {
                let remaining_ms = remaining_ms - dt_ms;
                self.phase = if remaining_ms > 0.0 {
                    SkillPhase::Cooldown { remaining_ms }
                } else {
                    SkillPhase::Ready
                };
                false
            }
        }
    }

    /// Remaining cooldown for the HUD (0 when ready or active)
    pub fn cooldown_remaining_ms(&self) -> f32 {
        match self.phase {
            SkillPhase::Cooldown { remaining_ms } => remaining_ms,
            _ => 0.0,
        }
    }
}

/// Which skill an input or event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillKind {
    Overdrive,
    Shield,
    Dash,
}

/// Result of damage applied to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Shield was up; nothing happened
    Absorbed,
    Hit,
    /// Health ran out and a life was spent
    LifeLost,
    /// Last life spent
    Dead,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub pos: Vec2,
    pub health: i32,
    pub max_health: i32,
    pub lives: u8,

    pub base_fire_rate_ms: f32,
    /// Current interval between shots
    pub fire_rate_ms: f32,
    pub fire_rate_bonus: f32,
    pub split_cannon_level: u8,
    pub growing_bullets_level: u8,
    pub flame_shield_level: u8,
    pub health_recovery_level: u8,

    /// Polygon side count; grows by one per upgrade pick
    pub shape_sides: u32,
    pub shape_size: f32,

    pub overdrive: Skill,
    pub shield: Skill,
    pub dash: Skill,

    /// Remaining loom-trail slow
    pub debuff_ms: f32,
    /// Time until the next shot may fire
    pub fire_cooldown_ms: f32,
    /// Regeneration accumulator
    pub regen_accum_ms: f32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            health: BASE_MAX_HEALTH,
            max_health: BASE_MAX_HEALTH,
            lives: STARTING_LIVES,
            base_fire_rate_ms: BASE_FIRE_RATE_MS,
            fire_rate_ms: BASE_FIRE_RATE_MS,
            fire_rate_bonus: 0.0,
            split_cannon_level: 0,
            growing_bullets_level: 0,
            flame_shield_level: 0,
            health_recovery_level: 0,
            shape_sides: BASE_SHAPE_SIDES,
            shape_size: BASE_SHAPE_SIZE,
            overdrive: Skill::new(OVERDRIVE_DURATION_MS, OVERDRIVE_COOLDOWN_MS, false),
            shield: Skill::new(SHIELD_BASE_DURATION_MS, SHIELD_COOLDOWN_MS, false),
            dash: Skill::new(DASH_DURATION_MS, DASH_BASE_COOLDOWN_MS, true),
            debuff_ms: 0.0,
            fire_cooldown_ms: 0.0,
            regen_accum_ms: 0.0,
        }
    }
}

impl PlayerState {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            ..Default::default()
        }
    }

    pub fn is_debuffed(&self) -> bool {
        self.debuff_ms > 0.0
    }

    pub fn is_alive(&self) -> bool {
        self.lives > 0
    }

    /// Add one polygon side (every upgrade pick)
    pub fn evolve_shape(&mut self) {
        self.shape_sides += 1;
        self.shape_size += 2.0;
    }

    /// Apply damage, honoring the shield and the life system.
    ///
    /// Running out of health spends a life and refills to `max_health`
    /// while lives remain.
    pub fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        if self.shield.is_active() {
            return DamageOutcome::Absorbed;
        }
        self.health -= amount;
        if self.health > 0 {
            return DamageOutcome::Hit;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives > 0 {
            self.health = self.max_health;
            DamageOutcome::LifeLost
        } else {
            self.health = 0;
            DamageOutcome::Dead
        }
    }

    /// Non-stacking slow from loom trails
    pub fn apply_velocity_debuff(&mut self) {
        if !self.is_debuffed() {
            self.debuff_ms = VELOCITY_DEBUFF_MS;
        }
    }

    /// Fire interval honoring overdrive
    pub fn effective_fire_rate_ms(&self, floor_ms: f32) -> f32 {
        if self.overdrive.is_active() {
            floor_ms
        } else {
            self.fire_rate_ms
        }
    }

    /// Try to activate a skill. Returns true when it fired.
    pub fn activate(&mut self, skill: SkillKind) -> bool {
        match skill {
            SkillKind::Overdrive => self.overdrive.activate(),
            SkillKind::Shield => self.shield.activate(),
            SkillKind::Dash => self.dash.activate(),
        }
    }

    /// Advance skill, debuff and fire timers
    pub fn update_timers(&mut self, dt_ms: f32) {
        self.overdrive.update(dt_ms);
        self.shield.update(dt_ms);
        self.dash.update(dt_ms);
        self.debuff_ms = (self.debuff_ms - dt_ms).max(0.0);
        self.fire_cooldown_ms = (self.fire_cooldown_ms - dt_ms).max(0.0);
    }
}

/// A shot leaving the player's cannon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub angle: f32,
    pub polarity: Polarity,
    /// Prisms flip its polarity
    pub reflectable: bool,
    /// Bypasses polarity matching
    pub overdrive: bool,
    pub growth_level: u8,
}

impl Projectile {
    pub fn new(angle: f32, polarity: Polarity) -> Self {
        Self {
            angle,
            polarity,
            reflectable: true,
            overdrive: false,
            growth_level: 0,
        }
    }

    pub fn overdrive(angle: f32) -> Self {
        Self {
            angle,
            polarity: Polarity::A,
            reflectable: false,
            overdrive: true,
            growth_level: 0,
        }
    }
}

/// Spread of shots for one trigger pull.
///
/// `1 + 2 * split` projectiles fanned evenly across ±π/8 around `base_angle`.
pub fn volley(player: &PlayerState, base_angle: f32, polarity: Polarity) -> Vec<Projectile> {
    let count = 1 + 2 * player.split_cannon_level as usize;
    let overdrive = player.overdrive.is_active();
    (0..count)
        .map(|i| {
            let angle = if count > 1 {
                let step = SPLIT_SPREAD * 2.0 / (count - 1) as f32;
                base_angle + (i as f32 - (count - 1) as f32 / 2.0) * step
            } else {
                base_angle
            };
            let mut shot = if overdrive {
                Projectile::overdrive(angle)
            } else {
                Projectile::new(angle, polarity)
            };
            shot.growth_level = player.growing_bullets_level;
            shot
        })
        .collect()
}

/// Visual/hitbox scale of a growing bullet after travelling `distance`
pub fn growth_scale(level: u8, distance: f32) -> f32 {
    if level == 0 {
        return 1.0;
    }
    let level = level as f32;
    (1.0 + distance * GROWTH_RATE_PER_LEVEL * level).min(1.0 + level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shield_absorbs_damage() {
        let mut p = PlayerState::default();
        assert!(p.activate(SkillKind::Shield));
        assert_eq!(p.take_damage(50), DamageOutcome::Absorbed);
        assert_eq!(p.health, 100);
    }

    #[test]
    fn test_losing_health_costs_a_life_and_refills() {
        let mut p = PlayerState::default();
        p.max_health = 125;
        assert_eq!(p.take_damage(130), DamageOutcome::LifeLost);
        assert_eq!(p.lives, 2);
        assert_eq!(p.health, 125);
    }

    #[test]
    fn test_last_life_is_fatal() {
        let mut p = PlayerState::default();
        p.lives = 1;
        assert_eq!(p.take_damage(100), DamageOutcome::Dead);
        assert!(!p.is_alive());
        assert_eq!(p.health, 0);
    }

    #[test]
    fn test_shield_cooldown_starts_after_active_window() {
        let mut s = Skill::new(100.0, 300.0, false);
        assert!(s.activate());
        assert!(!s.activate());
        assert!(!s.update(50.0));
        assert!(s.update(50.0));
        assert_eq!(s.cooldown_remaining_ms(), 300.0);
        s.update(300.0);
        assert!(s.is_ready());
    }

    #[test]
    fn test_dash_cooldown_counts_from_activation() {
        let mut s = Skill::new(200.0, 3000.0, true);
        s.activate();
        s.update(200.0);
        assert_eq!(s.cooldown_remaining_ms(), 2800.0);
    }

    #[test]
    fn test_overdrive_forces_fire_floor() {
        let mut p = PlayerState::default();
        assert_eq!(p.effective_fire_rate_ms(50.0), 200.0);
        p.activate(SkillKind::Overdrive);
        assert_eq!(p.effective_fire_rate_ms(50.0), 50.0);
    }

    #[test]
    fn test_volley_spread_is_symmetric() {
        let mut p = PlayerState::default();
        assert_eq!(volley(&p, 0.0, Polarity::A).len(), 1);

        p.split_cannon_level = 1;
        let shots = volley(&p, 0.0, Polarity::B);
        assert_eq!(shots.len(), 3);
        assert!((shots[0].angle + SPLIT_SPREAD).abs() < 1e-6);
        assert!(shots[1].angle.abs() < 1e-6);
        assert!((shots[2].angle - SPLIT_SPREAD).abs() < 1e-6);
        assert!(shots.iter().all(|s| s.polarity == Polarity::B && s.reflectable));
    }

    #[test]
    fn test_overdrive_shots_do_not_reflect() {
        let mut p = PlayerState::default();
        p.activate(SkillKind::Overdrive);
        let shots = volley(&p, 1.0, Polarity::B);
        assert!(shots.iter().all(|s| s.overdrive && !s.reflectable));
    }

    #[test]
    fn test_growth_is_capped_by_level() {
        assert_eq!(growth_scale(0, 1000.0), 1.0);
        assert!((growth_scale(1, 100.0) - 1.2).abs() < 1e-6);
        assert_eq!(growth_scale(3, 10_000.0), 4.0);
    }

    #[test]
    fn test_debuff_does_not_stack() {
        let mut p = PlayerState::default();
        p.apply_velocity_debuff();
        p.update_timers(1500.0);
        p.apply_velocity_debuff();
        assert_eq!(p.debuff_ms, 500.0);
    }
}
