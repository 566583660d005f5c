use crate::core::constants::{BASE_STAT_VALUE, NUM_STATS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StatKind {
    Strength,
    Dexterity,
    Intelligence,
    Vitality,
    Luck,
}

impl StatKind {
    pub fn all() -> [StatKind; NUM_STATS] {
        [
            StatKind::Strength,
            StatKind::Dexterity,
            StatKind::Intelligence,
            StatKind::Vitality,
            StatKind::Luck,
        ]
    }

    pub fn abbrev(&self) -> &str {
        match self {
            StatKind::Strength => "STR",
            StatKind::Dexterity => "DEX",
            StatKind::Intelligence => "INT",
            StatKind::Vitality => "VIT",
            StatKind::Luck => "LCK",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            StatKind::Strength => 0,
            StatKind::Dexterity => 1,
            StatKind::Intelligence => 2,
            StatKind::Vitality => 3,
            StatKind::Luck => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attributes {
    values: [u32; NUM_STATS],
}

impl Default for Attributes {
    fn default() -> Self {
        Self::new()
    }
}

impl Attributes {
    pub fn new() -> Self {
        Self {
            values: [BASE_STAT_VALUE; NUM_STATS],
        }
    }

    pub fn get(&self, stat: StatKind) -> u32 {
        self.values[stat.index()]
    }

    pub fn set(&mut self, stat: StatKind, value: u32) {
        self.values[stat.index()] = value;
    }

    pub fn add(&mut self, stat: StatKind, amount: u32) {
        self.values[stat.index()] = self.values[stat.index()].saturating_add(amount);
    }

    /// Creates Attributes from individual stat values.
    pub fn from_values(str: u32, dex: u32, int: u32, vit: u32, lck: u32) -> Self {
        Self {
            values: [str, dex, int, vit, lck],
        }
    }

    /// Total points invested above the level-1 baseline across all stats.
    pub fn invested_above_baseline(&self) -> u32 {
        self.values
            .iter()
            .map(|v| v.saturating_sub(BASE_STAT_VALUE))
            .sum()
    }

    /// Resets every stat to the level-1 baseline.
    pub fn reset_to_baseline(&mut self) {
        self.values = [BASE_STAT_VALUE; NUM_STATS];
    }
}
