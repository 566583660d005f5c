//! Combat action resolution.
//!
//! Free functions hold the probability/damage math so the formulas stay
//! testable in isolation; [`CombatResolver`] orchestrates them against a
//! battle record. Resolution mutates only the [`BattleInstance`] it is
//! given (plus player inventory through the store for item use) — world
//! registries are the simulator's business.

use crate::combat::combatant::{Combatant, CombatantKind};
use crate::combat::types::{
    ActionResult, AppliedEffect, BattleEndReason, BattleInstance, BattleOutcome, BattleRewards,
    RewardItem,
};
use crate::core::constants::{
    BATTLE_TIMEOUT_SECONDS, DAMAGE_VARIANCE, DEFEND_DAMAGE_REDUCTION, DEFENSE_MITIGATION_FACTOR,
    FLEE_CHANCE_BASE, FLEE_CHANCE_MAX, FLEE_CHANCE_MIN, FLEE_EVASION_FACTOR, FLEE_EVASION_PIVOT,
    FLEE_LEVEL_DIFF_FACTOR, HIT_CHANCE_ACCURACY_FACTOR, HIT_CHANCE_BASE, HIT_CHANCE_MAX,
    HIT_CHANCE_MIN, OVERLEVEL_EXP_SCALE, REWARD_LEVEL_GAP, UNDERLEVEL_EXP_SCALE,
};
use crate::data::stores::{GameDataStore, PlayerStore};
use crate::data::templates::{ConsumableKind, EffectKind, MonsterTemplate, SkillEffect};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Chance in percent that an attack lands, clamped to `[10, 95]`.
pub fn hit_chance(accuracy: u32, evasion: u32) -> f64 {
    (HIT_CHANCE_BASE + (accuracy as f64 - evasion as f64) * HIT_CHANCE_ACCURACY_FACTOR)
        .clamp(HIT_CHANCE_MIN, HIT_CHANCE_MAX)
}

/// Chance in percent that disengaging succeeds, clamped to `[10, 90]`.
/// `level_diff` is fleer level minus opposing monster level and applies
/// to players only; callers pass 0 for monsters.
pub fn flee_chance(evasion: u32, level_diff: i64) -> f64 {
    (FLEE_CHANCE_BASE
        + (evasion as f64 - FLEE_EVASION_PIVOT) * FLEE_EVASION_FACTOR
        + level_diff as f64 * FLEE_LEVEL_DIFF_FACTOR)
        .clamp(FLEE_CHANCE_MIN, FLEE_CHANCE_MAX)
}

/// Damage before variance: attack less half the target's defense, never
/// below 1.
pub fn base_damage(attack: u32, defense: u32) -> f64 {
    (attack as f64 - defense as f64 * DEFENSE_MITIGATION_FACTOR).max(1.0)
}

/// Rolls a percent chance in `[0, 100]`.
pub fn roll_percent(chance_percent: f64, rng: &mut impl Rng) -> bool {
    rng.gen::<f64>() * 100.0 < chance_percent
}

/// Uniform damage variance multiplier in `[1 - v, 1 + v]`.
fn variance_multiplier(rng: &mut impl Rng) -> f64 {
    rng.gen_range(1.0 - DAMAGE_VARIANCE..=1.0 + DAMAGE_VARIANCE)
}

pub struct CombatResolver {
    game_data: Arc<dyn GameDataStore>,
    players: Arc<dyn PlayerStore>,
}

impl CombatResolver {
    pub fn new(game_data: Arc<dyn GameDataStore>, players: Arc<dyn PlayerStore>) -> Self {
        Self { game_data, players }
    }

    /// Resolves a basic attack from `attacker` against `target`,
    /// mutating the target's battle participant on a hit.
    pub fn basic_attack(
        &self,
        attacker: &Combatant,
        target: &Combatant,
        battle: &mut BattleInstance,
        rng: &mut impl Rng,
    ) -> ActionResult {
        let (target_alive, target_defending) = match battle.participant(target.id()) {
            Some(p) => (p.is_alive(), p.defending),
            None => {
                return ActionResult::failure(format!("{} is not in this battle", target.name()))
            }
        };
        if !target_alive {
            return ActionResult::failure(format!("{} is already defeated", target.name()));
        }

        let chance = hit_chance(attacker.stats().accuracy, target.stats().evasion);
        if !roll_percent(chance, rng) {
            return ActionResult {
                success: true,
                missed: true,
                message: format!("{} attacks {} but misses", attacker.name(), target.name()),
                ..ActionResult::default()
            };
        }

        let critical = roll_percent(attacker.stats().crit_chance_percent, rng);
        let mut damage =
            base_damage(attacker.stats().attack, target.stats().defense) * variance_multiplier(rng);
        if critical {
            damage *= attacker.stats().crit_multiplier;
        }
        if target_defending {
            damage *= DEFEND_DAMAGE_REDUCTION;
        }
        let damage = (damage as u32).max(1);

        let dealt = match battle.participant_mut(target.id()) {
            Some(p) => p.apply_damage(damage),
            None => return ActionResult::failure(format!("{} is not in this battle", target.name())),
        };

        let message = if critical {
            format!(
                "{} critically strikes {} for {} damage",
                attacker.name(),
                target.name(),
                dealt
            )
        } else {
            format!("{} hits {} for {} damage", attacker.name(), target.name(), dealt)
        };

        ActionResult {
            success: true,
            message,
            damage: Some(dealt),
            critical_hit: critical,
            ..ActionResult::default()
        }
    }

    /// Casts a skill: checks and deducts the summed mana cost, then
    /// applies each effect in declared order. Effects with a chance roll
    /// independently and are reported as skipped on failure.
    pub fn use_skill(
        &self,
        caster: &Combatant,
        target: Option<&Combatant>,
        skill_id: &str,
        battle: &mut BattleInstance,
        rng: &mut impl Rng,
    ) -> ActionResult {
        let Some(skill) = self.game_data.skill(skill_id) else {
            return ActionResult::failure(format!("unknown skill: {skill_id}"));
        };

        let mana_cost = skill.total_mana_cost();
        let Some(caster_state) = battle.participant_mut(caster.id()) else {
            return ActionResult::failure(format!("{} is not in this battle", caster.name()));
        };
        if !caster_state.spend_mana(mana_cost) {
            return ActionResult::failure(format!(
                "not enough mana for {} ({} needed)",
                skill.name, mana_cost
            ));
        }

        let mut result = ActionResult::succeeded(String::new());
        let mut total_damage = 0u32;
        let mut total_healing = 0u32;

        for effect in &skill.effects {
            let applied = self.apply_skill_effect(caster, target, effect, battle, rng);
            if applied.applied {
                match applied.kind {
                    EffectKind::Damage => total_damage += applied.amount,
                    EffectKind::Heal => total_healing += applied.amount,
                    _ => {}
                }
                if applied.description.contains("critically") {
                    result.critical_hit = true;
                }
            }
            result.effects.push(applied);
        }

        result.damage = (total_damage > 0).then_some(total_damage);
        result.healing = (total_healing > 0).then_some(total_healing);
        result.message = summarize_skill(&skill.name, caster.name(), total_damage, total_healing);
        result
    }

    fn apply_skill_effect(
        &self,
        caster: &Combatant,
        target: Option<&Combatant>,
        effect: &SkillEffect,
        battle: &mut BattleInstance,
        rng: &mut impl Rng,
    ) -> AppliedEffect {
        // Offensive effects need an explicit target; supportive ones
        // default to the caster.
        let recipient = match effect.kind {
            EffectKind::Damage | EffectKind::Debuff => target,
            EffectKind::Heal | EffectKind::Buff => target.or(Some(caster)),
        };
        let Some(recipient) = recipient else {
            return AppliedEffect {
                kind: effect.kind,
                target_id: String::new(),
                amount: 0,
                duration_turns: effect.duration_turns,
                applied: false,
                description: "no target".to_string(),
            };
        };

        if let Some(chance) = effect.chance_percent {
            if !roll_percent(chance, rng) {
                return AppliedEffect {
                    kind: effect.kind,
                    target_id: recipient.id().to_string(),
                    amount: 0,
                    duration_turns: effect.duration_turns,
                    applied: false,
                    description: format!("{} resists", recipient.name()),
                };
            }
        }

        let magnitude = effect.base_value as f64
            + caster.attributes().get(effect.scaling_stat) as f64 * effect.scaling_ratio;

        match effect.kind {
            EffectKind::Damage => {
                let critical = roll_percent(caster.stats().crit_chance_percent, rng);
                let mut damage = magnitude;
                if critical {
                    damage *= caster.stats().crit_multiplier;
                }
                let damage = (damage as u32).max(1);
                let dealt = battle
                    .participant_mut(recipient.id())
                    .map(|p| p.apply_damage(damage))
                    .unwrap_or(0);
                AppliedEffect {
                    kind: effect.kind,
                    target_id: recipient.id().to_string(),
                    amount: dealt,
                    duration_turns: None,
                    applied: true,
                    description: if critical {
                        format!("critically burns {} for {}", recipient.name(), dealt)
                    } else {
                        format!("hits {} for {}", recipient.name(), dealt)
                    },
                }
            }
            EffectKind::Heal => {
                let healed = battle
                    .participant_mut(recipient.id())
                    .map(|p| p.apply_healing(magnitude as u32))
                    .unwrap_or(0);
                AppliedEffect {
                    kind: effect.kind,
                    target_id: recipient.id().to_string(),
                    amount: healed,
                    duration_turns: None,
                    applied: true,
                    description: format!("restores {} HP to {}", healed, recipient.name()),
                }
            }
            EffectKind::Buff | EffectKind::Debuff => AppliedEffect {
                kind: effect.kind,
                target_id: recipient.id().to_string(),
                amount: magnitude as u32,
                duration_turns: effect.duration_turns,
                applied: true,
                description: format!(
                    "{} {} by {} for {} turns",
                    recipient.name(),
                    if effect.kind == EffectKind::Buff {
                        "bolstered"
                    } else {
                        "weakened"
                    },
                    magnitude as u32,
                    effect.duration_turns.unwrap_or(1)
                ),
            },
        }
    }

    /// Consumes an item. Players must hold the item in inventory; it is
    /// removed through the player store on success.
    pub fn use_item(
        &self,
        user: &Combatant,
        item_id: &str,
        battle: &mut BattleInstance,
    ) -> ActionResult {
        let Some(item) = self.game_data.item(item_id) else {
            return ActionResult::failure(format!("unknown item: {item_id}"));
        };
        if !item.is_consumable() {
            return ActionResult::failure(format!("{} cannot be consumed", item.name));
        }
        let Some(consumable) = item.consumable.clone() else {
            return ActionResult::failure(format!("{} cannot be consumed", item.name));
        };
        if battle.participant(user.id()).is_none() {
            return ActionResult::failure(format!("{} is not in this battle", user.name()));
        }

        if user.kind() == CombatantKind::Player {
            match self.players.remove_item(user.id(), item_id, 1) {
                Ok(true) => {}
                Ok(false) => {
                    return ActionResult::failure(format!("no {} in inventory", item.name));
                }
                Err(err) => {
                    log::error!("inventory lookup failed for {}: {err}", user.id());
                    return ActionResult::failure("item use failed unexpectedly");
                }
            }
        }

        let Some(user_state) = battle.participant_mut(user.id()) else {
            return ActionResult::failure(format!("{} is not in this battle", user.name()));
        };

        match consumable.kind {
            ConsumableKind::Heal => {
                let healed = user_state.apply_healing(consumable.value);
                ActionResult {
                    success: true,
                    message: format!("{} uses {} and recovers {} HP", user.name(), item.name, healed),
                    healing: Some(healed),
                    ..ActionResult::default()
                }
            }
            ConsumableKind::Mana => {
                let restored = user_state.restore_mana(consumable.value);
                ActionResult {
                    success: true,
                    message: format!(
                        "{} uses {} and recovers {} MP",
                        user.name(),
                        item.name,
                        restored
                    ),
                    ..ActionResult::default()
                }
            }
            ConsumableKind::Buff | ConsumableKind::Debuff => {
                let kind = if consumable.kind == ConsumableKind::Buff {
                    EffectKind::Buff
                } else {
                    EffectKind::Debuff
                };
                let effect = AppliedEffect {
                    kind,
                    target_id: user.id().to_string(),
                    amount: consumable.value,
                    duration_turns: consumable.duration_turns,
                    applied: true,
                    description: format!("{} takes effect", item.name),
                };
                ActionResult {
                    success: true,
                    message: format!("{} uses {}", user.name(), item.name),
                    effects: vec![effect],
                    ..ActionResult::default()
                }
            }
        }
    }

    /// Raises the defender's guard until their next action: incoming
    /// basic-attack damage is halved while the flag is set.
    pub fn defend(&self, defender_id: &str, battle: &mut BattleInstance) -> ActionResult {
        let Some(participant) = battle.participant_mut(defender_id) else {
            return ActionResult::failure("defender is not in this battle");
        };
        participant.defending = true;
        let name = participant.name.clone();
        ActionResult {
            success: true,
            message: format!("{name} braces for the next attack"),
            effects: vec![AppliedEffect {
                kind: EffectKind::Buff,
                target_id: defender_id.to_string(),
                amount: 0,
                duration_turns: Some(1),
                applied: true,
                description: format!("{name} takes a defensive stance"),
            }],
            ..ActionResult::default()
        }
    }

    /// One escape roll. Success means the caller should end the
    /// encounter; a failed roll still consumes the fleer's turn.
    pub fn attempt_flee(
        &self,
        fleer: &Combatant,
        battle: &BattleInstance,
        rng: &mut impl Rng,
    ) -> ActionResult {
        if battle.participant(fleer.id()).is_none() {
            return ActionResult::failure(format!("{} is not in this battle", fleer.name()));
        }

        // Level advantage only helps players slip away from monsters.
        let level_diff = if fleer.kind() == CombatantKind::Player {
            battle
                .participants
                .iter()
                .find(|p| p.kind == CombatantKind::Monster && p.id != fleer.id())
                .map(|m| fleer.level() as i64 - m.level as i64)
                .unwrap_or(0)
        } else {
            0
        };

        let chance = flee_chance(fleer.stats().evasion, level_diff);
        if roll_percent(chance, rng) {
            ActionResult::succeeded(format!("{} escapes from battle", fleer.name()))
        } else {
            ActionResult::failure(format!("{} fails to escape", fleer.name()))
        }
    }

    /// Terminal-state check: draw when nobody stands, victory when
    /// exactly one participant does, timeout after 30 minutes.
    pub fn check_battle_end(&self, battle: &BattleInstance, now: DateTime<Utc>) -> BattleOutcome {
        let alive = battle.alive_participants();
        match alive.len() {
            0 => BattleOutcome::Ended {
                reason: BattleEndReason::Draw,
                winner_id: None,
            },
            1 => BattleOutcome::Ended {
                reason: BattleEndReason::Victory,
                winner_id: Some(alive[0].id.clone()),
            },
            _ if battle.elapsed_seconds(now) > BATTLE_TIMEOUT_SECONDS => BattleOutcome::Ended {
                reason: BattleEndReason::Timeout,
                winner_id: None,
            },
            _ => BattleOutcome::Ongoing,
        }
    }

    /// Rolls the spoils for every defeated monster: level-gap-scaled
    /// experience, uniform gold, independent drop rolls. Identical item
    /// ids across monsters merge by quantity.
    pub fn calculate_battle_rewards(
        &self,
        winner_level: u32,
        defeated: &[&MonsterTemplate],
        rng: &mut impl Rng,
    ) -> BattleRewards {
        let mut rewards = BattleRewards::default();
        let mut merged: BTreeMap<String, u32> = BTreeMap::new();

        for template in defeated {
            let table = &template.drop_table;

            let mut experience = table.experience as f64;
            if winner_level > template.level + REWARD_LEVEL_GAP {
                experience = (experience * OVERLEVEL_EXP_SCALE).max(1.0);
            } else if template.level > winner_level + REWARD_LEVEL_GAP {
                experience *= UNDERLEVEL_EXP_SCALE;
            }
            rewards.experience += experience as u64;

            rewards.gold += rng.gen_range(table.gold_min..=table.gold_max);

            for entry in &table.items {
                if roll_percent(entry.chance_percent, rng) {
                    let quantity = rng.gen_range(entry.min_quantity..=entry.max_quantity);
                    *merged.entry(entry.item_id.clone()).or_insert(0) += quantity;
                }
            }
        }

        rewards.items = merged
            .into_iter()
            .map(|(item_id, quantity)| RewardItem { item_id, quantity })
            .collect();
        rewards
    }
}

fn summarize_skill(skill_name: &str, caster_name: &str, damage: u32, healing: u32) -> String {
    match (damage, healing) {
        (0, 0) => format!("{caster_name} uses {skill_name}"),
        (d, 0) => format!("{caster_name} uses {skill_name} for {d} damage"),
        (0, h) => format!("{caster_name} uses {skill_name}, restoring {h} HP"),
        (d, h) => format!("{caster_name} uses {skill_name} for {d} damage, restoring {h} HP"),
    }
}
