//! Starter content catalog.
//!
//! A small playable data set for tests, demos, and hosts that have not
//! wired a real catalog yet: two areas, a handful of monsters, the
//! basic skill and consumable set.

use crate::character::attributes::{Attributes, StatKind};
use crate::data::memory::MemoryGameDataStore;
use crate::data::templates::{
    AreaTemplate, ConsumableEffect, ConsumableKind, DropEntry, DropTable, EffectKind,
    ItemCategory, ItemTemplate, MonsterBehavior, MonsterTemplate, SkillEffect, SkillTemplate,
    SpawnConfig,
};

/// Builds a data store populated with the starter content.
pub fn starter_catalog() -> MemoryGameDataStore {
    let store = MemoryGameDataStore::new();

    for skill in starter_skills() {
        store.insert_skill(skill);
    }
    for item in starter_items() {
        store.insert_item(item);
    }
    for monster in starter_monsters() {
        store.insert_monster(monster);
    }
    for area in starter_areas() {
        store.insert_area(area);
    }

    store
}

fn starter_skills() -> Vec<SkillTemplate> {
    vec![
        SkillTemplate {
            id: "power_strike".into(),
            name: "Power Strike".into(),
            effects: vec![SkillEffect {
                kind: EffectKind::Damage,
                base_value: 15,
                scaling_stat: StatKind::Strength,
                scaling_ratio: 1.2,
                chance_percent: None,
                duration_turns: None,
                mana_cost: 10,
            }],
        },
        SkillTemplate {
            id: "fireball".into(),
            name: "Fireball".into(),
            effects: vec![
                SkillEffect {
                    kind: EffectKind::Damage,
                    base_value: 25,
                    scaling_stat: StatKind::Intelligence,
                    scaling_ratio: 1.8,
                    chance_percent: None,
                    duration_turns: None,
                    mana_cost: 18,
                },
                SkillEffect {
                    kind: EffectKind::Debuff,
                    base_value: 5,
                    scaling_stat: StatKind::Intelligence,
                    scaling_ratio: 0.2,
                    chance_percent: Some(30.0),
                    duration_turns: Some(3),
                    mana_cost: 0,
                },
            ],
        },
        SkillTemplate {
            id: "mend_wounds".into(),
            name: "Mend Wounds".into(),
            effects: vec![SkillEffect {
                kind: EffectKind::Heal,
                base_value: 20,
                scaling_stat: StatKind::Intelligence,
                scaling_ratio: 1.5,
                chance_percent: None,
                duration_turns: None,
                mana_cost: 12,
            }],
        },
        SkillTemplate {
            id: "battle_focus".into(),
            name: "Battle Focus".into(),
            effects: vec![SkillEffect {
                kind: EffectKind::Buff,
                base_value: 10,
                scaling_stat: StatKind::Dexterity,
                scaling_ratio: 0.5,
                chance_percent: None,
                duration_turns: Some(3),
                mana_cost: 8,
            }],
        },
    ]
}

fn starter_items() -> Vec<ItemTemplate> {
    vec![
        ItemTemplate {
            id: "health_potion".into(),
            name: "Health Potion".into(),
            category: ItemCategory::Consumable,
            consumable: Some(ConsumableEffect {
                kind: ConsumableKind::Heal,
                value: 50,
                duration_turns: None,
            }),
        },
        ItemTemplate {
            id: "mana_potion".into(),
            name: "Mana Potion".into(),
            category: ItemCategory::Consumable,
            consumable: Some(ConsumableEffect {
                kind: ConsumableKind::Mana,
                value: 30,
                duration_turns: None,
            }),
        },
        ItemTemplate {
            id: "wolf_pelt".into(),
            name: "Wolf Pelt".into(),
            category: ItemCategory::Material,
            consumable: None,
        },
        ItemTemplate {
            id: "slime_residue".into(),
            name: "Slime Residue".into(),
            category: ItemCategory::Material,
            consumable: None,
        },
        ItemTemplate {
            id: "milestone_cache".into(),
            name: "Milestone Cache".into(),
            category: ItemCategory::Material,
            consumable: None,
        },
    ]
}

fn starter_monsters() -> Vec<MonsterTemplate> {
    vec![
        MonsterTemplate {
            id: "meadow_slime".into(),
            name: "Meadow Slime".into(),
            level: 1,
            attributes: Attributes::from_values(8, 6, 4, 10, 5),
            behavior: MonsterBehavior::Passive,
            detection_range: 0.0,
            move_speed: 0.5,
            drop_table: DropTable {
                experience: 20,
                gold_min: 1,
                gold_max: 5,
                items: vec![DropEntry {
                    item_id: "slime_residue".into(),
                    chance_percent: 60.0,
                    min_quantity: 1,
                    max_quantity: 2,
                }],
            },
        },
        MonsterTemplate {
            id: "forest_wolf".into(),
            name: "Forest Wolf".into(),
            level: 4,
            attributes: Attributes::from_values(14, 16, 4, 12, 8),
            behavior: MonsterBehavior::Aggressive,
            detection_range: 12.0,
            move_speed: 2.0,
            drop_table: DropTable {
                experience: 55,
                gold_min: 5,
                gold_max: 14,
                items: vec![
                    DropEntry {
                        item_id: "wolf_pelt".into(),
                        chance_percent: 45.0,
                        min_quantity: 1,
                        max_quantity: 1,
                    },
                    DropEntry {
                        item_id: "health_potion".into(),
                        chance_percent: 10.0,
                        min_quantity: 1,
                        max_quantity: 1,
                    },
                ],
            },
        },
        MonsterTemplate {
            id: "thicket_horror".into(),
            name: "Thicket Horror".into(),
            level: 9,
            attributes: Attributes::from_values(22, 12, 10, 20, 10),
            behavior: MonsterBehavior::Aggressive,
            detection_range: 8.0,
            move_speed: 1.2,
            drop_table: DropTable {
                experience: 160,
                gold_min: 20,
                gold_max: 45,
                items: vec![
                    DropEntry {
                        item_id: "health_potion".into(),
                        chance_percent: 35.0,
                        min_quantity: 1,
                        max_quantity: 2,
                    },
                    DropEntry {
                        item_id: "mana_potion".into(),
                        chance_percent: 25.0,
                        min_quantity: 1,
                        max_quantity: 2,
                    },
                ],
            },
        },
    ]
}

fn starter_areas() -> Vec<AreaTemplate> {
    vec![
        AreaTemplate {
            id: "meadow".into(),
            name: "Sunny Meadow".into(),
            max_players: 50,
            spawns: vec![SpawnConfig {
                template_id: "meadow_slime".into(),
                max_instances: 8,
                spawn_chance: 0.6,
                x_range: (0.0, 100.0),
                y_range: (0.0, 100.0),
            }],
        },
        AreaTemplate {
            id: "dark_forest".into(),
            name: "Dark Forest".into(),
            max_players: 30,
            spawns: vec![
                SpawnConfig {
                    template_id: "forest_wolf".into(),
                    max_instances: 6,
                    spawn_chance: 0.4,
                    x_range: (0.0, 200.0),
                    y_range: (0.0, 200.0),
                },
                SpawnConfig {
                    template_id: "thicket_horror".into(),
                    max_instances: 2,
                    spawn_chance: 0.15,
                    x_range: (50.0, 150.0),
                    y_range: (50.0, 150.0),
                },
            ],
        },
    ]
}
