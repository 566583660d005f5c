//! Battle lifecycle tests: engagement rules, turn flow, flee, rewards,
//! and disconnect handling, driven through the world simulator.

use emberward::character::attributes::{Attributes, StatKind};
use emberward::character::player::Player;
use emberward::combat::types::{BattleEndReason, BattleStatus};
use emberward::data::memory::{MemoryGameDataStore, MemoryPlayerStore};
use emberward::data::templates::{
    AreaTemplate, ConsumableEffect, ConsumableKind, DropEntry, DropTable, EffectKind,
    ItemCategory, ItemTemplate, MonsterBehavior, MonsterTemplate, SkillEffect, SkillTemplate,
};
use emberward::error::EngineError;
use emberward::world::monster::MonsterStatus;
use emberward::world::simulator::{PlayerAction, WorldSimulator};
use chrono::{DateTime, Duration, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// A closed arena with no periodic spawns, so every monster in play is
/// one a test placed deliberately.
fn arena_catalog() -> MemoryGameDataStore {
    let store = MemoryGameDataStore::new();
    store.insert_area(AreaTemplate {
        id: "arena".into(),
        name: "The Arena".into(),
        max_players: 10,
        spawns: vec![],
    });
    store.insert_monster(MonsterTemplate {
        id: "training_dummy".into(),
        name: "Training Dummy".into(),
        level: 1,
        attributes: Attributes::from_values(8, 6, 4, 10, 5),
        behavior: MonsterBehavior::Passive,
        detection_range: 0.0,
        move_speed: 0.5,
        drop_table: DropTable {
            experience: 20,
            gold_min: 3,
            gold_max: 3,
            items: vec![DropEntry {
                item_id: "dummy_stuffing".into(),
                chance_percent: 100.0,
                min_quantity: 2,
                max_quantity: 2,
            }],
        },
    });
    store.insert_item(ItemTemplate {
        id: "dummy_stuffing".into(),
        name: "Dummy Stuffing".into(),
        category: ItemCategory::Material,
        consumable: None,
    });
    store.insert_item(ItemTemplate {
        id: "health_potion".into(),
        name: "Health Potion".into(),
        category: ItemCategory::Consumable,
        consumable: Some(ConsumableEffect {
            kind: ConsumableKind::Heal,
            value: 50,
            duration_turns: None,
        }),
    });
    store.insert_skill(SkillTemplate {
        id: "crushing_blow".into(),
        name: "Crushing Blow".into(),
        effects: vec![SkillEffect {
            kind: EffectKind::Damage,
            base_value: 15,
            scaling_stat: StatKind::Strength,
            scaling_ratio: 1.2,
            chance_percent: None,
            duration_turns: None,
            mana_cost: 10,
        }],
    });
    store
}

fn world_with(players: &[Player]) -> (WorldSimulator, Arc<MemoryPlayerStore>) {
    let store = Arc::new(MemoryPlayerStore::new());
    for player in players {
        store.insert(player.clone());
    }
    let sim = WorldSimulator::new(store.clone(), Arc::new(arena_catalog()));
    (sim, store)
}

fn at(base: DateTime<Utc>, seconds: i64) -> DateTime<Utc> {
    base + Duration::seconds(seconds)
}

#[test]
fn test_second_engagement_of_same_monster_is_rejected() {
    let (mut sim, _) = world_with(&[
        Player::new("p1", "Aria", "arena"),
        Player::new("p2", "Bran", "arena"),
    ]);
    let t0 = Utc::now();
    sim.player_join("p1").unwrap();
    sim.player_join("p2").unwrap();
    let monster_id = sim
        .spawn_monster("training_dummy", "arena", 1.0, 0.0, t0)
        .unwrap()
        .to_string();

    sim.start_battle("p1", &monster_id, t0).unwrap();
    let err = sim.start_battle("p2", &monster_id, t0).unwrap_err();
    assert!(matches!(err, EngineError::State(_)));
    assert!(err.to_string().contains("already in a battle"));
    assert_eq!(sim.game_state().battle_count, 1);
}

#[test]
fn test_actions_are_rejected_off_turn() {
    let (mut sim, _) = world_with(&[Player::new("p1", "Aria", "arena")]);
    let t0 = Utc::now();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    sim.player_join("p1").unwrap();
    let monster_id = sim
        .spawn_monster("training_dummy", "arena", 1.0, 0.0, t0)
        .unwrap()
        .to_string();
    sim.start_battle("p1", &monster_id, t0).unwrap();

    let first = sim.player_action("p1", PlayerAction::Attack, t0, &mut rng);
    assert!(first.success);

    // The turn passed to the monster; a second action must wait.
    let second = sim.player_action("p1", PlayerAction::Attack, t0, &mut rng);
    assert!(!second.success);
    assert!(second.message.contains("not your turn"));
}

#[test]
fn test_action_without_battle_fails() {
    let (mut sim, _) = world_with(&[Player::new("p1", "Aria", "arena")]);
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    sim.player_join("p1").unwrap();

    let result = sim.player_action("p1", PlayerAction::Attack, Utc::now(), &mut rng);
    assert!(!result.success);
    assert!(result.message.contains("not in a battle"));
}

/// A Crushing Blow from strength 200 deals 255 before crits, enough to
/// fell the 200 HP dummy in one action and trigger the reward flow.
#[test]
fn test_victory_grants_rewards_and_refreshes_the_registry() {
    let mut strong = Player::new("p1", "Aria", "arena");
    strong.attributes.set(StatKind::Strength, 200);
    let (mut sim, store) = world_with(&[strong]);
    let t0 = Utc::now();
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    sim.player_join("p1").unwrap();
    let monster_id = sim
        .spawn_monster("training_dummy", "arena", 1.0, 0.0, t0)
        .unwrap()
        .to_string();
    let battle_id = sim.start_battle("p1", &monster_id, t0).unwrap().to_string();

    let result = sim.player_action(
        "p1",
        PlayerAction::UseSkill { skill_id: "crushing_blow".into() },
        t0,
        &mut rng,
    );
    assert!(result.success);
    assert_eq!(result.damage, Some(200), "damage clamps to the dummy's full HP");

    let battle = sim.battle(&battle_id).unwrap();
    assert_eq!(battle.status, BattleStatus::Ended);
    assert_eq!(battle.end_reason, Some(BattleEndReason::Victory));
    assert_eq!(battle.winner_id.as_deref(), Some("p1"));
    assert_eq!(
        sim.monster(&monster_id).unwrap().status,
        MonsterStatus::Dead
    );

    // Store and registry both reflect the spoils: fixed gold, base
    // experience, and the guaranteed two-piece drop.
    let stored = store.get("p1").unwrap();
    assert_eq!(stored.gold, 3);
    assert_eq!(stored.experience, 20);
    assert_eq!(stored.item_count("dummy_stuffing"), 2);
    assert_eq!(sim.player("p1").unwrap().experience, 20);
}

#[test]
fn test_flee_ends_the_battle_and_releases_the_monster() {
    let mut slippery = Player::new("p1", "Aria", "arena");
    slippery.attributes.set(StatKind::Dexterity, 130);
    let (mut sim, _) = world_with(&[slippery]);
    let t0 = Utc::now();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    sim.start();
    sim.player_join("p1").unwrap();
    let monster_id = sim
        .spawn_monster("training_dummy", "arena", 1.0, 0.0, t0)
        .unwrap()
        .to_string();
    let battle_id = sim.start_battle("p1", &monster_id, t0).unwrap().to_string();

    // Escape chance caps at 90%; a failed roll hands the monster a turn.
    let mut fled = false;
    for i in 0..30 {
        let result = sim.player_action("p1", PlayerAction::Flee, at(t0, i), &mut rng);
        if result.success {
            fled = true;
            break;
        }
        sim.tick(at(t0, i), &mut rng);
    }
    assert!(fled, "a 90% escape chance should succeed within 30 attempts");

    let battle = sim.battle(&battle_id).unwrap();
    assert_eq!(battle.status, BattleStatus::Ended);
    assert_eq!(battle.end_reason, Some(BattleEndReason::Fled));
    assert!(battle.winner_id.is_none());
    assert_eq!(sim.monster(&monster_id).unwrap().status, MonsterStatus::Idle);
}

#[test]
fn test_defend_holds_until_the_next_action() {
    let (mut sim, _) = world_with(&[Player::new("p1", "Aria", "arena")]);
    let t0 = Utc::now();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    sim.start();
    sim.player_join("p1").unwrap();
    let monster_id = sim
        .spawn_monster("training_dummy", "arena", 1.0, 0.0, t0)
        .unwrap()
        .to_string();
    let battle_id = sim.start_battle("p1", &monster_id, t0).unwrap().to_string();

    let result = sim.player_action("p1", PlayerAction::Defend, t0, &mut rng);
    assert!(result.success);
    assert!(sim.battle(&battle_id).unwrap().participant("p1").unwrap().defending);

    // The guard survives the monster's counterattack...
    sim.tick(at(t0, 1), &mut rng);
    assert!(sim.battle(&battle_id).unwrap().participant("p1").unwrap().defending);

    // ...and drops the moment the player acts again.
    sim.player_action("p1", PlayerAction::Attack, at(t0, 2), &mut rng);
    assert!(!sim.battle(&battle_id).unwrap().participant("p1").unwrap().defending);
}

#[test]
fn test_player_leave_ends_battle_and_marks_offline() {
    let (mut sim, store) = world_with(&[Player::new("p1", "Aria", "arena")]);
    let t0 = Utc::now();

    sim.player_join("p1").unwrap();
    assert!(store.get("p1").unwrap().online);
    let monster_id = sim
        .spawn_monster("training_dummy", "arena", 1.0, 0.0, t0)
        .unwrap()
        .to_string();
    let battle_id = sim.start_battle("p1", &monster_id, t0).unwrap().to_string();

    sim.player_leave("p1", at(t0, 5)).unwrap();

    let battle = sim.battle(&battle_id).unwrap();
    assert_eq!(battle.status, BattleStatus::Ended);
    assert_eq!(battle.end_reason, Some(BattleEndReason::PlayerLeft));
    assert_eq!(sim.monster(&monster_id).unwrap().status, MonsterStatus::Idle);
    assert!(sim.player("p1").is_none());
    assert!(!store.get("p1").unwrap().online);
}

#[test]
fn test_movement_is_blocked_mid_battle() {
    let (mut sim, _) = world_with(&[Player::new("p1", "Aria", "arena")]);
    let t0 = Utc::now();

    sim.player_join("p1").unwrap();
    let monster_id = sim
        .spawn_monster("training_dummy", "arena", 1.0, 0.0, t0)
        .unwrap()
        .to_string();
    sim.start_battle("p1", &monster_id, t0).unwrap();

    let err = sim.player_move("p1", "arena", 50.0, 50.0).unwrap_err();
    assert!(matches!(err, EngineError::State(_)));
}

#[test]
fn test_item_use_in_battle_draws_from_inventory() {
    let mut carrier = Player::new("p1", "Aria", "arena");
    carrier.grant_item("health_potion", 2);
    let (mut sim, store) = world_with(&[carrier]);
    let t0 = Utc::now();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    sim.player_join("p1").unwrap();
    let monster_id = sim
        .spawn_monster("training_dummy", "arena", 1.0, 0.0, t0)
        .unwrap()
        .to_string();
    let battle_id = sim.start_battle("p1", &monster_id, t0).unwrap().to_string();

    // Drinking at full HP still consumes the potion; the heal clamps.
    let result = sim.player_action(
        "p1",
        PlayerAction::UseItem { item_id: "health_potion".into() },
        t0,
        &mut rng,
    );
    assert!(result.success);
    assert_eq!(result.healing, Some(0));
    assert_eq!(store.get("p1").unwrap().item_count("health_potion"), 1);

    let battle = sim.battle(&battle_id).unwrap();
    assert_eq!(battle.active_turn_id(), Some(monster_id.as_str()));
}
