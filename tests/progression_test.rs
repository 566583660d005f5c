//! Progression behavior: the level-up cascade with its milestone
//! rewards, stat allocation atomicity, resets, and curve consistency.

use emberward::character::attributes::StatKind;
use emberward::character::player::Player;
use emberward::data::memory::MemoryPlayerStore;
use emberward::error::EngineError;
use emberward::progression::curves::{
    experience_for_level, level_from_total_experience, total_experience_to_level,
};
use emberward::progression::engine::{ExperienceSource, ProgressionEngine};
use std::sync::Arc;

fn engine_with_player() -> (ProgressionEngine, Arc<MemoryPlayerStore>) {
    let store = Arc::new(MemoryPlayerStore::new());
    store.insert(Player::new("p1", "Aria", "meadow"));
    (ProgressionEngine::new(store.clone()), store)
}

#[test]
fn test_level_one_plus_150_xp_carries_50_over() {
    let (engine, store) = engine_with_player();
    let grant = engine
        .add_experience("p1", 150, ExperienceSource::Combat, 1.0)
        .unwrap();

    assert_eq!(grant.levels_gained, 1);
    assert_eq!(grant.new_level, 2);

    let player = store.get("p1").unwrap();
    assert_eq!(player.level, 2);
    assert_eq!(player.experience, 50);
    assert_eq!(player.experience_to_next, 100);
}

#[test]
fn test_cascade_to_level_ten_awards_points_and_gold() {
    let (engine, store) = engine_with_player();
    let grant = engine
        .add_experience(
            "p1",
            total_experience_to_level(10),
            ExperienceSource::Combat,
            1.0,
        )
        .unwrap();

    assert_eq!(grant.levels_gained, 9);
    assert_eq!(grant.new_level, 10);
    assert_eq!(grant.milestone_items, 0);

    let player = store.get("p1").unwrap();
    assert_eq!(player.level, 10);
    assert_eq!(player.experience, 0);
    assert_eq!(player.experience_to_next, experience_for_level(10));
    assert_eq!(player.stat_points, 9 * 5);
    assert_eq!(player.skill_points, 9);
    // One gold bonus, at the 10th level.
    assert_eq!(player.gold, 1000);
}

#[test]
fn test_fiftieth_and_hundredth_level_milestones() {
    let (engine, store) = engine_with_player();
    let grant = engine
        .add_experience(
            "p1",
            total_experience_to_level(100),
            ExperienceSource::Combat,
            1.0,
        )
        .unwrap();

    assert_eq!(grant.new_level, 100);
    assert_eq!(grant.milestone_items, 1);

    let player = store.get("p1").unwrap();
    assert_eq!(player.level, 100);
    // 99 levels at 1 point each, plus the extras at 50 and 100.
    assert_eq!(player.skill_points, 99 + 2);
    // 99 levels at 5 points each, plus the level-100 bonus.
    assert_eq!(player.stat_points, 99 * 5 + 5);
    // Tens: (10+20+...+100)*100. Fifties: (50+100)*500.
    assert_eq!(player.gold, 55_000 + 75_000);
    assert_eq!(player.item_count("milestone_cache"), 1);
}

#[test]
fn test_bracket_bonus_kicks_in_at_level_100() {
    let (engine, store) = engine_with_player();
    let mut veteran = store.get("p1").unwrap();
    veteran.level = 100;
    veteran.experience_to_next = experience_for_level(100);
    store.insert(veteran);

    let grant = engine
        .add_experience("p1", 100, ExperienceSource::Combat, 1.0)
        .unwrap();
    assert_eq!(grant.amount, 110);
    assert_eq!(store.get("p1").unwrap().experience, 110);
}

#[test]
fn test_source_and_caller_multipliers_stack() {
    let (engine, _) = engine_with_player();
    // 10 base * 2.0 event * 2.0 caller bonus.
    let grant = engine
        .add_experience("p1", 10, ExperienceSource::Event, 2.0)
        .unwrap();
    assert_eq!(grant.amount, 40);
}

#[test]
fn test_allocation_over_cap_is_rejected_whole() {
    let (engine, store) = engine_with_player();
    let mut player = store.get("p1").unwrap();
    player.level = 2;
    player.stat_points = 30;
    store.insert(player);

    // Cap at level 2 is 20; 10 + 11 would breach it.
    let err = engine
        .allocate_stat_points("p1", &[(StatKind::Strength, 11)])
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let player = store.get("p1").unwrap();
    assert_eq!(player.stat_points, 30);
    assert_eq!(player.attributes.get(StatKind::Strength), 10);

    // Exactly to the cap is fine.
    engine
        .allocate_stat_points("p1", &[(StatKind::Strength, 10)])
        .unwrap();
    let player = store.get("p1").unwrap();
    assert_eq!(player.attributes.get(StatKind::Strength), 20);
    assert_eq!(player.stat_points, 20);
}

#[test]
fn test_allocation_spends_across_stats_atomically() {
    let (engine, store) = engine_with_player();
    let mut player = store.get("p1").unwrap();
    player.level = 5;
    player.stat_points = 6;
    store.insert(player);

    let err = engine
        .allocate_stat_points("p1", &[(StatKind::Strength, 4), (StatKind::Luck, 3)])
        .unwrap_err();
    assert!(matches!(err, EngineError::Resource(_)));
    assert_eq!(store.get("p1").unwrap().stat_points, 6);

    engine
        .allocate_stat_points("p1", &[(StatKind::Strength, 4), (StatKind::Luck, 2)])
        .unwrap();
    let player = store.get("p1").unwrap();
    assert_eq!(player.attributes.get(StatKind::Strength), 14);
    assert_eq!(player.attributes.get(StatKind::Luck), 12);
    assert_eq!(player.stat_points, 0);
}

#[test]
fn test_reset_refunds_invested_points_for_gold() {
    let (engine, store) = engine_with_player();
    let mut player = store.get("p1").unwrap();
    player.level = 5;
    player.stat_points = 8;
    player.gold = 150;
    store.insert(player);

    engine
        .allocate_stat_points("p1", &[(StatKind::Vitality, 5), (StatKind::Strength, 3)])
        .unwrap();
    assert_eq!(store.get("p1").unwrap().stat_points, 0);

    // Short on gold first, then paid in full.
    let err = engine.reset_stats("p1", 500).unwrap_err();
    assert!(matches!(err, EngineError::Resource(_)));

    let refunded = engine.reset_stats("p1", 100).unwrap();
    assert_eq!(refunded, 8);

    let player = store.get("p1").unwrap();
    assert_eq!(player.stat_points, 8);
    assert_eq!(player.gold, 50);
    for stat in StatKind::all() {
        assert_eq!(player.attributes.get(stat), 10);
    }
}

#[test]
fn test_curves_round_trip_through_totals() {
    for level in [1, 5, 25, 60, 150] {
        let total = total_experience_to_level(level);
        assert_eq!(level_from_total_experience(total), level);
        assert_eq!(
            level_from_total_experience(total + experience_for_level(level)),
            level + 1
        );
    }
}
