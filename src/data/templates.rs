//! Immutable game-data templates.
//!
//! Everything here is read-only catalog data served by a
//! [`GameDataStore`](crate::data::stores::GameDataStore). Instances
//! (spawned monsters, battles) reference templates by id and never
//! mutate them.

use crate::character::attributes::{Attributes, StatKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EffectKind {
    Damage,
    Heal,
    Buff,
    Debuff,
}

/// One effect of a skill, applied in declared order when the skill fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillEffect {
    pub kind: EffectKind,
    pub base_value: u32,
    /// Caster stat the effect scales with.
    pub scaling_stat: StatKind,
    pub scaling_ratio: f64,
    /// Independent roll in percent (0-100); `None` always applies.
    pub chance_percent: Option<f64>,
    /// Turns a buff/debuff is described as lasting.
    pub duration_turns: Option<u32>,
    pub mana_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillTemplate {
    pub id: String,
    pub name: String,
    pub effects: Vec<SkillEffect>,
}

impl SkillTemplate {
    /// Total mana the caster must hold before any effect applies.
    pub fn total_mana_cost(&self) -> u32 {
        self.effects.iter().map(|e| e.mana_cost).sum()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ItemCategory {
    Consumable,
    Equipment,
    Material,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConsumableKind {
    Heal,
    Mana,
    Buff,
    Debuff,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumableEffect {
    pub kind: ConsumableKind,
    pub value: u32,
    pub duration_turns: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub id: String,
    pub name: String,
    pub category: ItemCategory,
    /// Present only for `ItemCategory::Consumable`.
    pub consumable: Option<ConsumableEffect>,
}

impl ItemTemplate {
    pub fn is_consumable(&self) -> bool {
        self.category == ItemCategory::Consumable && self.consumable.is_some()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MonsterBehavior {
    /// Detects and hunts players inside `detection_range`.
    Aggressive,
    /// Never initiates; fights only when engaged.
    Passive,
}

/// One entry in a monster's drop table. `chance_percent` rolls
/// independently per kill; quantity is sampled uniformly from the range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropEntry {
    pub item_id: String,
    pub chance_percent: f64,
    pub min_quantity: u32,
    pub max_quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropTable {
    pub experience: u64,
    pub gold_min: u64,
    pub gold_max: u64,
    pub items: Vec<DropEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterTemplate {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub attributes: Attributes,
    pub behavior: MonsterBehavior,
    /// Radius within which an aggressive monster notices players.
    pub detection_range: f64,
    /// Distance covered per AI evaluation while hunting.
    pub move_speed: f64,
    pub drop_table: DropTable,
}

/// Periodic spawn rule inside an area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnConfig {
    pub template_id: String,
    /// Cap on live instances of this template in the area.
    pub max_instances: usize,
    /// Probability per spawn check, in `[0, 1]`.
    pub spawn_chance: f64,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaTemplate {
    pub id: String,
    pub name: String,
    pub max_players: usize,
    pub spawns: Vec<SpawnConfig>,
}

impl AreaTemplate {
    /// Spawn cap for a template in this area; templates outside the
    /// spawn list fall back to the global default so scripted spawns
    /// stay bounded too.
    pub fn template_cap(&self, template_id: &str) -> usize {
        self.spawns
            .iter()
            .find(|s| s.template_id == template_id)
            .map(|s| s.max_instances)
            .unwrap_or(crate::core::constants::DEFAULT_MONSTERS_PER_TEMPLATE)
    }
}
