//! Combat stats derived from base attributes and level.
//!
//! All combat math reads these snapshots rather than raw attributes, so
//! the formulas live in exactly one place. Values are recomputed on
//! demand; nothing here is cached or persisted.

use crate::character::attributes::{Attributes, StatKind};
use crate::core::constants::{
    ACCURACY_PER_DEXTERITY, ATTACK_PER_STRENGTH, BASE_ATTACK, BASE_DEFENSE, BASE_HP, BASE_MP,
    CRIT_CHANCE_BASE, CRIT_CHANCE_MAX, CRIT_CHANCE_PER_LUCK, CRIT_DAMAGE_MULTIPLIER,
    HP_PER_LEVEL, HP_PER_VITALITY, MP_PER_INTELLIGENCE, MP_PER_LEVEL,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DerivedStats {
    pub max_hp: u32,
    pub max_mp: u32,
    pub attack: u32,
    pub defense: u32,
    pub accuracy: u32,
    pub evasion: u32,
    /// Percent chance in `[0, 50]`.
    pub crit_chance_percent: f64,
    pub crit_multiplier: f64,
}

impl DerivedStats {
    /// Computes the full derived block for a combatant at `level`.
    pub fn calculate(attributes: &Attributes, level: u32) -> Self {
        let str = attributes.get(StatKind::Strength);
        let dex = attributes.get(StatKind::Dexterity);
        let int = attributes.get(StatKind::Intelligence);
        let vit = attributes.get(StatKind::Vitality);
        let lck = attributes.get(StatKind::Luck);
        let level_offset = level.saturating_sub(1);

        Self {
            max_hp: BASE_HP + vit * HP_PER_VITALITY + level_offset * HP_PER_LEVEL,
            max_mp: BASE_MP + int * MP_PER_INTELLIGENCE + level_offset * MP_PER_LEVEL,
            attack: BASE_ATTACK + str * ATTACK_PER_STRENGTH + dex / 2,
            defense: BASE_DEFENSE + vit + str / 2,
            accuracy: dex * ACCURACY_PER_DEXTERITY,
            evasion: dex + lck / 2,
            crit_chance_percent: (CRIT_CHANCE_BASE + lck as f64 * CRIT_CHANCE_PER_LUCK)
                .clamp(0.0, CRIT_CHANCE_MAX),
            crit_multiplier: CRIT_DAMAGE_MULTIPLIER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_level_one() {
        let stats = DerivedStats::calculate(&Attributes::new(), 1);
        assert_eq!(stats.max_hp, 100 + 10 * 10);
        assert_eq!(stats.max_mp, 50 + 10 * 8);
        assert_eq!(stats.attack, 10 + 10 * 2 + 5);
        assert_eq!(stats.defense, 5 + 10 + 5);
        assert_eq!(stats.accuracy, 20);
        assert_eq!(stats.evasion, 15);
        assert_eq!(stats.crit_chance_percent, 6.0);
        assert_eq!(stats.crit_multiplier, 1.5);
    }

    #[test]
    fn test_level_scales_hp_and_mp() {
        let attrs = Attributes::new();
        let lv1 = DerivedStats::calculate(&attrs, 1);
        let lv11 = DerivedStats::calculate(&attrs, 11);
        assert_eq!(lv11.max_hp, lv1.max_hp + 50);
        assert_eq!(lv11.max_mp, lv1.max_mp + 30);
        // Attack and defense come from attributes alone.
        assert_eq!(lv11.attack, lv1.attack);
        assert_eq!(lv11.defense, lv1.defense);
    }

    #[test]
    fn test_crit_chance_clamped_at_cap() {
        let mut attrs = Attributes::new();
        attrs.set(StatKind::Luck, 1000);
        let stats = DerivedStats::calculate(&attrs, 1);
        assert_eq!(stats.crit_chance_percent, 50.0);
    }

    #[test]
    fn test_level_zero_does_not_underflow() {
        let stats = DerivedStats::calculate(&Attributes::new(), 0);
        assert!(stats.max_hp >= BASE_HP);
    }
}
