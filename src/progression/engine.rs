//! Experience gain, level-up cascades, and stat management.
//!
//! All progression mutation flows through here: the world simulator calls
//! in after battles resolve, and hosts call in directly for quest or
//! event rewards and for stat allocation. Every operation loads the
//! player from the store, mutates the copy, and saves once at the end,
//! so a failed rule check leaves the record untouched.

use crate::character::attributes::StatKind;
use crate::character::player::Player;
use crate::core::constants::{
    GOLD_BONUS_LEVEL_INTERVAL, GOLD_BONUS_PER_LEVEL, LEVEL_BRACKETS, LEVEL_BRACKET_BONUS,
    MAJOR_BONUS_LEVEL_INTERVAL, MAJOR_GOLD_BONUS_PER_LEVEL, MAX_LEVEL, MILESTONE_ITEM_ID,
    MILESTONE_LEVEL_INTERVAL, MILESTONE_STAT_POINTS, NUM_STATS, PARTY_BONUS_MULTIPLIER,
    PARTY_LEVEL_FACTOR_MAX, PARTY_LEVEL_FACTOR_MIN, PARTY_LEVEL_FACTOR_PER_LEVEL,
    SKILL_POINTS_PER_LEVEL, STAT_CAP_PER_LEVEL, STAT_POINTS_PER_LEVEL,
};
use crate::data::stores::PlayerStore;
use crate::error::{EngineError, EngineResult};
use crate::progression::curves::experience_for_level;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where an experience grant came from; each source carries its own
/// multiplier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExperienceSource {
    Combat,
    Quest,
    Exploration,
    Event,
}

impl ExperienceSource {
    pub fn multiplier(&self) -> f64 {
        match self {
            ExperienceSource::Combat => 1.0,
            ExperienceSource::Quest => 1.5,
            ExperienceSource::Exploration => 0.8,
            ExperienceSource::Event => 2.0,
        }
    }
}

/// Compounding high-level bonus: gains multiply by the bracket bonus at
/// each threshold the player has reached.
pub fn level_bracket_bonus(level: u32) -> f64 {
    LEVEL_BRACKETS
        .iter()
        .filter(|&&threshold| level >= threshold)
        .fold(1.0, |bonus, _| bonus * LEVEL_BRACKET_BONUS)
}

/// Summary of one experience grant and every level-up side effect it
/// triggered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperienceGrant {
    /// Final amount credited after source, caller, and bracket multipliers.
    pub amount: u64,
    pub levels_gained: u32,
    pub new_level: u32,
    pub stat_points_awarded: u32,
    pub skill_points_awarded: u32,
    pub gold_awarded: u64,
    pub milestone_items: u32,
}

/// One party member's stake in a shared experience reward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PartyMember {
    pub level: u32,
    /// Relative damage/effort weight; only ratios matter.
    pub contribution: f64,
}

/// Splits a shared experience total across party members.
///
/// Each member's share is weighted by contribution, adjusted by a
/// level-difference factor relative to the party average (members far
/// below are boosted, far above are reduced, clamped to `[0.5, 1.5]`),
/// then multiplied by the flat party bonus. Zero total contribution
/// falls back to an even split.
pub fn split_party_experience(total: u64, members: &[PartyMember]) -> Vec<u64> {
    if members.is_empty() {
        return Vec::new();
    }
    let total_contribution: f64 = members.iter().map(|m| m.contribution).sum();
    let average_level =
        members.iter().map(|m| m.level as f64).sum::<f64>() / members.len() as f64;

    members
        .iter()
        .map(|member| {
            let weight = if total_contribution > 0.0 {
                member.contribution / total_contribution
            } else {
                1.0 / members.len() as f64
            };
            let level_factor = (1.0
                + (average_level - member.level as f64) * PARTY_LEVEL_FACTOR_PER_LEVEL)
                .clamp(PARTY_LEVEL_FACTOR_MIN, PARTY_LEVEL_FACTOR_MAX);
            (total as f64 * weight * level_factor * PARTY_BONUS_MULTIPLIER) as u64
        })
        .collect()
}

pub struct ProgressionEngine {
    players: Arc<dyn PlayerStore>,
}

impl ProgressionEngine {
    pub fn new(players: Arc<dyn PlayerStore>) -> Self {
        Self { players }
    }

    fn load(&self, player_id: &str) -> EngineResult<Player> {
        self.players
            .load_player(player_id)?
            .ok_or_else(|| EngineError::validation(format!("unknown player: {player_id}")))
    }

    /// Credits experience and runs the level-up loop.
    ///
    /// The final amount is `base * source multiplier * caller multiplier
    /// * bracket bonus`. Each level gained awards stat and skill points;
    /// every 10th level adds gold, every 50th an extra skill point and a
    /// larger gold bonus, every 100th extra stat points and a milestone
    /// item. Derived stats need no explicit recompute since they derive
    /// on demand from attributes and level.
    pub fn add_experience(
        &self,
        player_id: &str,
        base_amount: u64,
        source: ExperienceSource,
        multiplier: f64,
    ) -> EngineResult<ExperienceGrant> {
        let mut player = self.load(player_id)?;

        let bracket = level_bracket_bonus(player.level);
        let amount = (base_amount as f64 * source.multiplier() * multiplier * bracket) as u64;
        player.experience += amount;

        let mut grant = ExperienceGrant {
            amount,
            new_level: player.level,
            ..ExperienceGrant::default()
        };

        while player.experience >= player.experience_to_next && player.level < MAX_LEVEL {
            player.experience -= player.experience_to_next;
            player.level += 1;
            grant.levels_gained += 1;
            grant.stat_points_awarded += STAT_POINTS_PER_LEVEL;
            grant.skill_points_awarded += SKILL_POINTS_PER_LEVEL;

            if player.level % GOLD_BONUS_LEVEL_INTERVAL == 0 {
                grant.gold_awarded += player.level as u64 * GOLD_BONUS_PER_LEVEL;
            }
            if player.level % MAJOR_BONUS_LEVEL_INTERVAL == 0 {
                grant.skill_points_awarded += 1;
                grant.gold_awarded += player.level as u64 * MAJOR_GOLD_BONUS_PER_LEVEL;
            }
            if player.level % MILESTONE_LEVEL_INTERVAL == 0 {
                grant.stat_points_awarded += MILESTONE_STAT_POINTS;
                grant.milestone_items += 1;
            }

            player.experience_to_next = experience_for_level(player.level);
        }

        player.stat_points += grant.stat_points_awarded;
        player.skill_points += grant.skill_points_awarded;
        player.gold += grant.gold_awarded;
        grant.new_level = player.level;

        self.players.save_player(&player)?;
        if grant.milestone_items > 0 {
            self.players
                .add_item(player_id, MILESTONE_ITEM_ID, grant.milestone_items)?;
        }

        if grant.levels_gained > 0 {
            log::debug!(
                "{} gained {} level(s), now level {}",
                player.name,
                grant.levels_gained,
                grant.new_level
            );
        }
        Ok(grant)
    }

    /// Spends stat points on base attributes, all-or-nothing.
    ///
    /// Rejects without mutating when the requested total exceeds the
    /// available points or any single stat would pass its level cap.
    pub fn allocate_stat_points(
        &self,
        player_id: &str,
        allocation: &[(StatKind, u32)],
    ) -> EngineResult<()> {
        let mut player = self.load(player_id)?;

        // Merge duplicate entries so the cap check sees the real totals.
        let mut requested = [0u32; NUM_STATS];
        for (stat, amount) in allocation {
            requested[stat.index()] += amount;
        }
        let total: u32 = requested.iter().sum();
        if total == 0 {
            return Err(EngineError::validation("no stat points requested"));
        }
        if total > player.stat_points {
            return Err(EngineError::resource(format!(
                "requested {total} stat points, only {} available",
                player.stat_points
            )));
        }

        let cap = player.level * STAT_CAP_PER_LEVEL;
        for stat in StatKind::all() {
            let next = player.attributes.get(stat) + requested[stat.index()];
            if next > cap {
                return Err(EngineError::validation(format!(
                    "{} would exceed the cap of {cap}",
                    stat.abbrev()
                )));
            }
        }

        for stat in StatKind::all() {
            player.attributes.add(stat, requested[stat.index()]);
        }
        player.stat_points -= total;
        self.players.save_player(&player)
    }

    /// Refunds every point invested above the level-1 baseline and
    /// resets all base stats, for a gold fee. Returns the refunded
    /// point count.
    pub fn reset_stats(&self, player_id: &str, gold_cost: u64) -> EngineResult<u32> {
        let mut player = self.load(player_id)?;
        if player.gold < gold_cost {
            return Err(EngineError::resource(format!(
                "stat reset costs {gold_cost} gold, only {} held",
                player.gold
            )));
        }

        let refunded = player.attributes.invested_above_baseline();
        player.attributes.reset_to_baseline();
        player.stat_points += refunded;
        player.gold -= gold_cost;
        self.players.save_player(&player)?;
        Ok(refunded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryPlayerStore;

    fn engine_with_player() -> (ProgressionEngine, Arc<MemoryPlayerStore>) {
        let store = Arc::new(MemoryPlayerStore::new());
        store.insert(Player::new("p1", "Aria", "meadow"));
        (ProgressionEngine::new(store.clone()), store)
    }

    #[test]
    fn test_bracket_bonus_compounds_at_thresholds() {
        assert_eq!(level_bracket_bonus(1), 1.0);
        assert_eq!(level_bracket_bonus(99), 1.0);
        assert_eq!(level_bracket_bonus(100), 1.1);
        assert!((level_bracket_bonus(500) - 1.21).abs() < 1e-9);
        assert!((level_bracket_bonus(1000) - 1.331).abs() < 1e-9);
    }

    #[test]
    fn test_single_level_up_carries_remainder() {
        let (engine, store) = engine_with_player();
        let grant = engine
            .add_experience("p1", 150, ExperienceSource::Combat, 1.0)
            .unwrap();

        assert_eq!(grant.amount, 150);
        assert_eq!(grant.levels_gained, 1);
        assert_eq!(grant.new_level, 2);

        let player = store.get("p1").unwrap();
        assert_eq!(player.level, 2);
        assert_eq!(player.experience, 50);
        assert_eq!(player.experience_to_next, 100);
        assert_eq!(player.stat_points, 5);
        assert_eq!(player.skill_points, 1);
    }

    #[test]
    fn test_source_multiplier_scales_amount() {
        let (engine, store) = engine_with_player();
        let grant = engine
            .add_experience("p1", 40, ExperienceSource::Quest, 1.0)
            .unwrap();
        assert_eq!(grant.amount, 60);
        assert_eq!(store.get("p1").unwrap().experience, 60);
    }

    #[test]
    fn test_unknown_player_is_validation_error() {
        let (engine, _) = engine_with_player();
        let err = engine
            .add_experience("ghost", 10, ExperienceSource::Combat, 1.0)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_allocation_rejects_overspend_atomically() {
        let (engine, store) = engine_with_player();
        let mut player = store.get("p1").unwrap();
        player.stat_points = 4;
        store.insert(player);

        let err = engine
            .allocate_stat_points("p1", &[(StatKind::Strength, 3), (StatKind::Luck, 2)])
            .unwrap_err();
        assert!(matches!(err, EngineError::Resource(_)));

        let player = store.get("p1").unwrap();
        assert_eq!(player.stat_points, 4);
        assert_eq!(player.attributes.get(StatKind::Strength), 10);
        assert_eq!(player.attributes.get(StatKind::Luck), 10);
    }

    #[test]
    fn test_party_split_weights_and_level_factor() {
        // Equal levels: contribution alone decides, plus the party bonus.
        let even = split_party_experience(
            100,
            &[
                PartyMember { level: 10, contribution: 75.0 },
                PartyMember { level: 10, contribution: 25.0 },
            ],
        );
        assert_eq!(even, vec![90, 30]);

        // A member far below the average is boosted, far above reduced.
        // Factors here are 1.45 and 0.55 against the average of 10.
        let skewed = split_party_experience(
            100,
            &[
                PartyMember { level: 1, contribution: 50.0 },
                PartyMember { level: 19, contribution: 50.0 },
            ],
        );
        assert!((86..=87).contains(&skewed[0]), "boosted share: {}", skewed[0]);
        assert!((32..=33).contains(&skewed[1]), "reduced share: {}", skewed[1]);

        // The clamp bounds the factor for extreme level spreads.
        let clamped = split_party_experience(
            100,
            &[
                PartyMember { level: 1, contribution: 50.0 },
                PartyMember { level: 101, contribution: 50.0 },
            ],
        );
        assert_eq!(clamped, vec![90, 30]);

        assert!(split_party_experience(100, &[]).is_empty());
    }
}
