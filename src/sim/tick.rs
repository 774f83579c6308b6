//! Per-frame simulation tick
//!
//! Order within a tick: player input and timers, pending upgrade offers,
//! round timer, continuous upgrade effects, enemy behaviours, then the
//! spawn director (cull before maintain). An open upgrade selection stops
//! everything after input handling until a choice is committed.

use glam::Vec2;

use super::catalog::Polarity;
use super::combat::{FlameAura, Hazard, burn_nearby};
use super::player::{Projectile, SkillKind};
use super::rng::RandomSource;
use super::spawn::Caps;
use super::state::{EnemyAction, GameEvent, GameState};
use super::upgrades::regenerate;
use super::world::{Behavior, DespawnReason, EntityId};
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Player position reported by the host physics engine
    pub player_pos: Option<Vec2>,
    /// Trigger held: aim angle and chosen polarity
    pub fire: Option<(f32, Polarity)>,
    pub overdrive: bool,
    pub shield: bool,
    pub dash: bool,
}

/// Advance the run by `dt_ms`. Returns the projectiles fired this tick
/// for the host to simulate.
pub fn tick(
    state: &mut GameState,
    input: &TickInput,
    dt_ms: f32,
    rng: &mut impl RandomSource,
) -> Vec<Projectile> {
    if state.is_game_over() {
        return Vec::new();
    }
    if let Some(pos) = input.player_pos {
        state.player.pos = pos;
    }
    // Modal upgrade selection: the world waits for a commit
    if state.is_paused() {
        return Vec::new();
    }
    if !dt_ms.is_finite() {
        log::warn!("Dropping frame with non-finite delta {}", dt_ms);
        return Vec::new();
    }
    let dt_ms = dt_ms.max(0.0);
    state.time_ms += dt_ms as f64;

    if input.overdrive {
        state.activate_skill(SkillKind::Overdrive);
    }
    if input.shield {
        state.activate_skill(SkillKind::Shield);
    }
    if input.dash {
        state.activate_skill(SkillKind::Dash);
    }
    state.player.update_timers(dt_ms);

    let shots = match input.fire {
        Some((angle, polarity)) => state.fire(angle, polarity),
        None => Vec::new(),
    };

    // The frame that ends the banner still counts toward the round clock
    let due_offer = state.upgrades.advance_pending(dt_ms);
    advance_rounds(state, dt_ms);
    if let Some(round) = due_offer {
        open_offer(state, round, rng);
        if state.is_paused() {
            return shots;
        }
    }

    apply_continuous_effects(state, dt_ms);
    update_enemies(state, dt_ms, rng);
    if state.is_game_over() {
        return shots;
    }
    direct_spawns(state, rng);

    shots
}

/// Round timer: each transition grants its bonus and queues an offer
fn advance_rounds(state: &mut GameState, dt_ms: f32) {
    for advance in state.round.tick(dt_ms) {
        state.add_score(advance.bonus);
        state.push_event(GameEvent::RoundStarted {
            round: advance.round,
            enemy_cap: advance.enemy_cap,
            meteor_cap: advance.meteor_cap,
        });
        state.push_event(GameEvent::RoundBonus {
            round: advance.round,
            points: advance.bonus,
        });
        let delay = state.tuning.offer_delay_ms;
        state.upgrades.schedule_offer(advance.round, delay);
    }
}

/// Open the selection modal. The round clock keeps what it had; it simply
/// stops while the modal is up.
fn open_offer(state: &mut GameState, round: u32, rng: &mut impl RandomSource) {
    let choices = state
        .upgrades
        .open_selection(round, rng)
        .map(|s| s.choices.clone());
    if let Some(choices) = choices {
        state.push_event(GameEvent::UpgradeOffered { round, choices });
    }
}

/// Regeneration and the flame aura
fn apply_continuous_effects(state: &mut GameState, dt_ms: f32) {
    let interval = state.tuning.regen_interval_ms;
    regenerate(&mut state.player, dt_ms, interval);

    if !state.player.shield.is_active() {
        return;
    }
    let Some(aura) = FlameAura::for_level(&state.tuning, state.player.flame_shield_level) else {
        return;
    };
    let origin = state.player.pos;
    for id in burn_nearby(&mut state.world, origin, &aura, dt_ms) {
        state.destroy(id, DespawnReason::Killed);
    }
}

/// Per-kind enemy behaviour. Positions are host-owned; this only advances
/// timers and reports what each enemy does.
fn update_enemies(state: &mut GameState, dt_ms: f32, rng: &mut impl RandomSource) {
    let player_pos = state.player.pos;
    let swap_ms = state.tuning.polarity_swap_ms;
    let mut actions: Vec<(EntityId, EnemyAction)> = Vec::new();
    let mut detonations: Vec<(EntityId, bool)> = Vec::new();

    for e in state.world.enemies.entities.iter_mut() {
        let id = e.id;
        let pos = e.pos;
        let to_player = player_pos - pos;
        let dist = to_player.length();
        let aim = to_player.y.atan2(to_player.x);

        let armed = matches!(e.behavior, Behavior::Kamikaze { fuse_ms: Some(_) });
        if e.kind.stats().swaps_polarity && !armed {
            e.swap_timer_ms += dt_ms;
            if e.swap_timer_ms >= swap_ms {
                e.swap_timer_ms = 0.0;
                e.polarity = e.polarity.flipped();
                actions.push((
                    id,
                    EnemyAction::PolaritySwapped {
                        polarity: e.polarity,
                    },
                ));
            }
        }

        match &mut e.behavior {
            Behavior::Strider => {
                if rng.chance(STRIDER_FIRE_CHANCE) {
                    actions.push((id, EnemyAction::FirePellet { angle: aim }));
                }
            }
            Behavior::Loomer { trail_ms } => {
                *trail_ms += dt_ms;
                if *trail_ms >= LOOMER_TRAIL_INTERVAL_MS {
                    *trail_ms = 0.0;
                    actions.push((id, EnemyAction::DropTrail { pos }));
                }
            }
            Behavior::Sentinel => {
                if dist < SENTINEL_FIELD_RADIUS {
                    actions.push((id, EnemyAction::DisruptionPulse));
                }
            }
            Behavior::Kamikaze { fuse_ms } => match fuse_ms {
                None => {
                    if dist < KAMIKAZE_DETECT_RADIUS {
                        *fuse_ms = Some(KAMIKAZE_FUSE_MS);
                        actions.push((id, EnemyAction::Armed));
                    }
                }
                Some(remaining) => {
                    *remaining -= dt_ms;
                    if *remaining <= 0.0 {
                        detonations.push((id, dist < KAMIKAZE_BLAST_RADIUS));
                    }
                }
            },
            Behavior::Void { attack_ms } => {
                *attack_ms += dt_ms;
                if *attack_ms >= VOID_RING_INTERVAL_MS {
                    *attack_ms = 0.0;
                    actions.push((
                        id,
                        EnemyAction::RingBurst {
                            shots: VOID_RING_SHOTS,
                        },
                    ));
                }
            }
            Behavior::Serpent { shoot_ms, .. } => {
                *shoot_ms += dt_ms;
                if *shoot_ms >= SERPENT_SPREAD_INTERVAL_MS {
                    *shoot_ms = 0.0;
                    actions.push((
                        id,
                        EnemyAction::SpreadShot {
                            angle: aim,
                            shots: SERPENT_SPREAD_SHOTS,
                        },
                    ));
                }
            }
            Behavior::Segment { .. } | Behavior::Inert => {}
        }
    }

    for (id, action) in actions {
        state.push_event(GameEvent::EnemyAction { id, action });
    }
    for (id, hit) in detonations {
        state.push_event(GameEvent::EnemyAction {
            id,
            action: EnemyAction::Exploded { hit },
        });
        state.destroy(id, DespawnReason::Expended);
        if hit {
            state.on_hazard(Hazard::KamikazeBlast);
        }
    }
}

/// Cull stale entities, then top up each group by one
fn direct_spawns(state: &mut GameState, rng: &mut impl RandomSource) {
    let origin = state.player.pos;
    for notice in state.spawner.cull_all(&mut state.world, origin) {
        state.handle_death(notice);
    }

    let caps = Caps {
        prisms: state.tuning.prism_cap,
        meteors: state.round.meteor_cap(),
        enemies: state.round.enemy_cap(),
    };
    let round = state.round.current_round;
    let score = state.score;
    let spawned =
        state
            .spawner
            .maintain_population(&mut state.world, caps, round, score, origin, rng);

    for record in spawned {
        state.push_event(GameEvent::Spawned {
            id: record.id,
            kind: record.kind,
            pos: record.pos,
        });
        for &child in &record.children {
            if let Some(seg) = state.world.get(child) {
                let event = GameEvent::Spawned {
                    id: child,
                    kind: seg.kind,
                    pos: seg.pos,
                };
                state.push_event(event);
            }
        }
        if record.kind.is_boss() {
            state.push_event(GameEvent::BossSpawned {
                id: record.id,
                kind: record.kind,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tuning;
    use crate::sim::catalog::EntityKind;
    use crate::sim::rng::ScriptedRng;
    use crate::sim::upgrades::{Commit, UpgradeId};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const FRAME: f32 = 16.0;

    fn state() -> GameState {
        GameState::new(&Tuning::default(), Vec2::ZERO)
    }

    #[test]
    fn test_first_tick_spawns_one_of_each() {
        let mut s = state();
        let mut rng = ScriptedRng::constant(0.5);
        tick(&mut s, &TickInput::default(), FRAME, &mut rng);
        assert_eq!(s.world.prisms.count_active(), 1);
        assert_eq!(s.world.meteors.count_active(), 1);
        assert_eq!(s.world.enemies.count_active(), 1);
    }

    #[test]
    fn test_round_end_grants_bonus_then_offers() {
        let mut s = state();
        let mut rng = ScriptedRng::constant(0.5);
        tick(&mut s, &TickInput::default(), 30_000.0, &mut rng);
        assert_eq!(s.round.current_round, 2);
        assert_eq!(s.score, 1000);
        assert!(!s.is_paused());
        assert_eq!(s.upgrades.pending_offers(), 1);

        // Banner delay elapses and the modal opens; the clock ran through the banner
        tick(&mut s, &TickInput::default(), 1500.0, &mut rng);
        assert!(s.is_paused());
        assert_eq!(s.round.round_timer_ms, 28_500.0);
        let offered = s.upgrades.selection().unwrap().choices.clone();
        assert_eq!(offered.len(), 3);
    }

    #[test]
    fn test_paused_world_does_not_advance() {
        let mut s = state();
        let mut rng = ScriptedRng::constant(0.5);
        tick(&mut s, &TickInput::default(), 30_000.0, &mut rng);
        tick(&mut s, &TickInput::default(), 1500.0, &mut rng);
        assert!(s.is_paused());

        let time = s.time_ms;
        let enemies = s.world.enemies.count_active();
        let round_timer = s.round.round_timer_ms;
        for _ in 0..100 {
            tick(&mut s, &TickInput::default(), FRAME, &mut rng);
        }
        assert_eq!(s.time_ms, time);
        assert_eq!(s.world.enemies.count_active(), enemies);
        assert_eq!(s.round.round_timer_ms, round_timer);

        let choice = s.upgrades.selection().unwrap().choices[0];
        let commit = s.commit_upgrade(choice).unwrap();
        assert!(matches!(commit, Commit::Applied { level: 1, .. }));
        assert_eq!(s.player.shape_sides, 4);
        tick(&mut s, &TickInput::default(), FRAME, &mut rng);
        assert!(s.time_ms > time);
    }

    #[test]
    fn test_continuous_effects_wait_for_selection() {
        let mut s = state();
        let mut rng = ScriptedRng::constant(0.5);
        tick(&mut s, &TickInput::default(), 30_000.0, &mut rng);
        tick(&mut s, &TickInput::default(), 1500.0, &mut rng);
        assert!(s.is_paused());

        s.upgrades.apply(UpgradeId::HealthRecovery, &mut s.player);
        s.upgrades.apply(UpgradeId::FlameShield, &mut s.player);
        assert!(s.activate_skill(SkillKind::Shield));
        s.player.health = 50;
        s.player.regen_accum_ms = 1000.0;
        let id = s
            .world
            .spawn(EntityKind::ChronoLoomer, s.player.pos + Vec2::new(30.0, 0.0))
            .unwrap();
        let burn = s.world.get(id).unwrap().burn;
        let health = s.world.get(id).unwrap().health;

        for _ in 0..625 {
            tick(&mut s, &TickInput::default(), FRAME, &mut rng);
        }
        assert!(s.player.shield.is_active());
        assert_eq!(s.player.health, 50);
        assert_eq!(s.player.regen_accum_ms, 1000.0);
        let enemy = s.world.get(id).unwrap();
        assert_eq!(enemy.burn, burn);
        assert_eq!(enemy.health, health);
    }

    #[test]
    fn test_non_finite_delta_is_dropped() {
        let mut s = state();
        let mut rng = ScriptedRng::constant(0.5);
        s.upgrades.apply(UpgradeId::HealthRecovery, &mut s.player);
        for dt in [f32::INFINITY, f32::NAN, f32::NEG_INFINITY] {
            tick(&mut s, &TickInput::default(), dt, &mut rng);
        }
        assert_eq!(s.time_ms, 0.0);
        assert_eq!(s.round.current_round, 1);
        assert_eq!(s.round.round_timer_ms, s.round.round_duration_ms);
        assert_eq!(s.player.regen_accum_ms, 0.0);
    }

    #[test]
    fn test_backgrounded_tab_applies_every_round() {
        let mut s = state();
        let mut rng = ScriptedRng::constant(0.5);
        tick(&mut s, &TickInput::default(), 95_000.0, &mut rng);
        assert_eq!(s.round.current_round, 4);
        assert_eq!(s.score, 1000 + 1500 + 2000);
        assert_eq!(s.upgrades.pending_offers(), 3);
        let rounds: Vec<u32> = s
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::RoundStarted { round, .. } => Some(round),
                _ => None,
            })
            .collect();
        assert_eq!(rounds, vec![2, 3, 4]);
    }

    #[test]
    fn test_kamikaze_arms_then_explodes() {
        let mut s = state();
        let mut rng = ScriptedRng::constant(0.5);
        let id = s.world.spawn(EntityKind::Kamikaze, Vec2::new(100.0, 0.0)).unwrap();
        tick(&mut s, &TickInput::default(), FRAME, &mut rng);
        assert!(matches!(
            s.world.get(id).unwrap().behavior,
            Behavior::Kamikaze { fuse_ms: Some(_) }
        ));

        tick(&mut s, &TickInput::default(), 500.0, &mut rng);
        assert!(s.world.get(id).is_none());
        assert_eq!(s.player.health, 60);
        assert_eq!(s.score, 0);
    }

    #[test]
    fn test_flame_aura_needs_the_shield() {
        let mut s = state();
        let mut rng = ScriptedRng::constant(0.5);
        s.upgrades.apply(UpgradeId::FlameShield, &mut s.player);
        let id = s.world.spawn(EntityKind::FluxStrider, Vec2::new(30.0, 0.0)).unwrap();

        tick(&mut s, &TickInput::default(), 4000.0, &mut rng);
        assert!(s.world.get(id).is_some());

        let shield = TickInput {
            shield: true,
            ..Default::default()
        };
        tick(&mut s, &shield, 4000.0, &mut rng);
        assert!(s.world.get(id).is_none());
        assert_eq!(s.score, 100);
    }

    #[test]
    fn test_distant_entities_are_culled() {
        let mut s = state();
        let mut rng = ScriptedRng::constant(0.5);
        let id = s.world.spawn(EntityKind::Meteor, Vec2::new(1600.0, 0.0)).unwrap();
        tick(&mut s, &TickInput::default(), FRAME, &mut rng);
        assert!(s.world.get(id).is_none());
        assert_eq!(s.score, 0);
    }

    #[test]
    fn test_firing_returns_a_volley() {
        let mut s = state();
        let mut rng = ScriptedRng::constant(0.5);
        s.upgrades.apply(UpgradeId::SplitCannon, &mut s.player);
        let input = TickInput {
            fire: Some((0.0, Polarity::B)),
            ..Default::default()
        };
        let shots = tick(&mut s, &input, FRAME, &mut rng);
        assert_eq!(shots.len(), 3);
        assert!(shots.iter().all(|p| p.polarity == Polarity::B));
    }

    #[test]
    fn test_game_over_freezes_the_run() {
        let mut s = state();
        let mut rng = ScriptedRng::constant(0.5);
        s.player.lives = 1;
        s.damage_player(1000);
        assert!(s.is_game_over());
        let time = s.time_ms;
        tick(&mut s, &TickInput::default(), FRAME, &mut rng);
        assert_eq!(s.time_ms, time);
    }

    #[test]
    fn test_seeded_runs_are_deterministic() {
        let mut a = state();
        let mut b = state();
        let mut rng_a = Pcg32::seed_from_u64(42);
        let mut rng_b = Pcg32::seed_from_u64(42);
        for _ in 0..600 {
            tick(&mut a, &TickInput::default(), FRAME, &mut rng_a);
            tick(&mut b, &TickInput::default(), FRAME, &mut rng_b);
        }
        assert_eq!(a.score, b.score);
        assert_eq!(a.world.enemies.count_active(), b.world.enemies.count_active());
        let kinds_a: Vec<_> = a.world.enemies.entities.iter().map(|e| e.kind).collect();
        let kinds_b: Vec<_> = b.world.enemies.entities.iter().map(|e| e.kind).collect();
        assert_eq!(kinds_a, kinds_b);
    }
}
