//! Property tests for the progression core.
//!
//! Covered properties:
//! 1. Population caps follow their formulas and never shrink as rounds advance.
//! 2. Random upgrade subsets are distinct and sized `min(n, available)`.
//! 3. Upgrade levels never pass their max, and maxed ids are never offered.
//! 4. Culling removes exactly the entities strictly beyond the radius.
//! 5. At most one boss is alive and the flag tracks it.
//! 6. Splitting a frame delta does not change how many rounds elapse.

use glam::Vec2;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use subzero::Tuning;
use subzero::polar_to_cartesian;
use subzero::sim::{
    Caps, DespawnReason, Difficulty, EntityKind, Group, PlayerState, RoundController,
    SpawnDirector, UpgradeEngine, UpgradeId, World, select_random_subset,
};

// Round scaling

proptest! {
    #[test]
    fn test_caps_match_formulas_and_grow(round in 1u32..10_000) {
        let d = Difficulty::default();
        prop_assert_eq!(d.enemy_cap(round), (5.0 + round as f32 * 1.5).floor() as usize);
        prop_assert_eq!(d.meteor_cap(round), (10.0 + round as f32 * 0.5).floor() as usize);
        prop_assert!(d.enemy_cap(round + 1) >= d.enemy_cap(round));
        prop_assert!(d.meteor_cap(round + 1) >= d.meteor_cap(round));
    }

    #[test]
    fn test_split_frames_elapse_the_same_rounds(frames in prop::collection::vec(1u32..5_000, 1..200)) {
        let tuning = Tuning::default();
        let mut chunked = RoundController::new(&tuning);
        let mut whole = RoundController::new(&tuning);

        let mut advanced = 0;
        for &dt in &frames {
            advanced += chunked.tick(dt as f32).len();
            prop_assert!(chunked.round_timer_ms > 0.0);
            prop_assert!(chunked.round_timer_ms <= chunked.round_duration_ms);
        }
        let total: u32 = frames.iter().sum();
        let at_once = whole.tick(total as f32).len();

        prop_assert_eq!(advanced, at_once);
        prop_assert_eq!(chunked.current_round, whole.current_round);
    }
}

// Upgrades

proptest! {
    #[test]
    fn test_subsets_are_distinct_and_bounded(
        len in 0usize..12,
        n in 0usize..6,
        seed in any::<u64>(),
    ) {
        let items: Vec<usize> = (0..len).collect();
        let mut rng = Pcg32::seed_from_u64(seed);
        let picked = select_random_subset(&items, n, &mut rng);

        prop_assert_eq!(picked.len(), n.min(len));
        let mut sorted = picked.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), picked.len());
        prop_assert!(picked.iter().all(|i| *i < len));
    }

    #[test]
    fn test_levels_never_pass_max(picks in prop::collection::vec(0usize..8, 0..80)) {
        let mut engine = UpgradeEngine::new(&Tuning::default());
        let mut player = PlayerState::default();
        for idx in picks {
            engine.apply(UpgradeId::ALL[idx], &mut player);
        }
        for id in UpgradeId::ALL {
            let level = engine.progress.level(id);
            prop_assert!(level <= id.definition().max_level);
            let offered = engine.available_choices().contains(&id);
            prop_assert_eq!(offered, level < id.definition().max_level);
        }
        prop_assert!(player.fire_rate_ms >= 50.0);
        prop_assert!(player.dash.cooldown_ms >= 1000.0);
    }
}

// Spawn director

proptest! {
    #[test]
    fn test_cull_is_strictly_beyond_radius(
        points in prop::collection::vec((0.0f32..3000.0, 0.0f32..std::f32::consts::TAU), 1..40),
    ) {
        let tuning = Tuning::default();
        let director = SpawnDirector::new(&tuning);
        let mut world = World::new(64, 64, 64);
        let mut ids = Vec::new();
        for &(r, theta) in &points {
            let pos = polar_to_cartesian(r, theta);
            if let Some(id) = world.spawn(EntityKind::Meteor, pos) {
                ids.push((id, pos));
            }
        }

        let culled: Vec<u32> = director
            .cull_distant(&mut world, Group::Meteors, Vec2::ZERO, 1500.0)
            .into_iter()
            .map(|n| n.id)
            .collect();

        for (id, pos) in ids {
            let beyond = pos.distance(Vec2::ZERO) > 1500.0;
            prop_assert_eq!(culled.contains(&id), beyond);
            prop_assert_eq!(world.get(id).is_none(), beyond);
        }
    }

    #[test]
    fn test_one_boss_at_a_time(
        seed in any::<u64>(),
        scores in prop::collection::vec(0u64..20_000, 1..200),
        kill_every in 1usize..20,
    ) {
        let tuning = Tuning::default();
        let mut director = SpawnDirector::new(&tuning);
        let mut world = World::new(8, 32, 256);
        let mut rng = Pcg32::seed_from_u64(seed);
        let caps = Caps { prisms: 5, meteors: 10, enemies: 200 };

        for (i, &score) in scores.iter().enumerate() {
            director.maintain_population(&mut world, caps, 1, score, Vec2::ZERO, &mut rng);

            let bosses: Vec<u32> = world
                .enemies
                .entities
                .iter()
                .filter(|e| e.is_boss())
                .map(|e| e.id)
                .collect();
            prop_assert!(bosses.len() <= 1);
            prop_assert_eq!(director.boss_active(), !bosses.is_empty());
            prop_assert_eq!(director.boss_id(), bosses.first().copied());

            if i % kill_every == 0 {
                if let Some(&boss) = bosses.first() {
                    let notice = world.destroy(boss, DespawnReason::Killed).unwrap();
                    director.on_death(&notice);
                    prop_assert!(!director.boss_active());
                    prop_assert!(world
                        .enemies
                        .entities
                        .iter()
                        .all(|e| e.kind != EntityKind::VoidSerpentSegment));
                }
            }
        }
    }
}
