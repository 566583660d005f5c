//! Battle records and action results.

use crate::combat::combatant::CombatantKind;
use crate::data::templates::EffectKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One applied (or skipped) sub-effect of a skill or item, reported so
/// the host can narrate buffs/debuffs the engine does not track in a
/// timed ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedEffect {
    pub kind: EffectKind,
    pub target_id: String,
    pub amount: u32,
    pub duration_turns: Option<u32>,
    /// False when the effect's chance roll failed.
    pub applied: bool,
    pub description: String,
}

/// Outcome of a single combat action. Every resolver operation returns
/// one of these; failures carry a human-readable message instead of
/// crossing the boundary as errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    pub damage: Option<u32>,
    pub healing: Option<u32>,
    pub critical_hit: bool,
    pub missed: bool,
    pub effects: Vec<AppliedEffect>,
}

impl ActionResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BattleStatus {
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BattleEndReason {
    Victory,
    Draw,
    Timeout,
    Fled,
    PlayerLeft,
}

/// A combatant's mutable in-battle state. HP/MP here are authoritative
/// for the duration of the battle and written back on battle end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleParticipant {
    pub id: String,
    pub kind: CombatantKind,
    pub name: String,
    pub level: u32,
    pub current_hp: u32,
    pub max_hp: u32,
    pub current_mp: u32,
    pub max_mp: u32,
    pub position: (f64, f64),
    /// Set by the defend action; cleared when this participant next acts.
    pub defending: bool,
}

impl BattleParticipant {
    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    /// Applies damage clamped to remaining HP; returns the amount
    /// actually dealt.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.current_hp);
        self.current_hp -= dealt;
        dealt
    }

    /// Applies healing clamped to max HP; returns the amount actually
    /// restored.
    pub fn apply_healing(&mut self, amount: u32) -> u32 {
        let restored = amount.min(self.max_hp - self.current_hp);
        self.current_hp += restored;
        restored
    }

    /// Deducts mana, or returns false when short.
    pub fn spend_mana(&mut self, amount: u32) -> bool {
        if self.current_mp < amount {
            return false;
        }
        self.current_mp -= amount;
        true
    }

    pub fn restore_mana(&mut self, amount: u32) -> u32 {
        let restored = amount.min(self.max_mp - self.current_mp);
        self.current_mp += restored;
        restored
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleInstance {
    pub id: Uuid,
    pub area_id: String,
    pub participants: Vec<BattleParticipant>,
    /// Participant ids in acting order; `current_turn` indexes into it
    /// modulo its length.
    pub turn_order: Vec<String>,
    pub current_turn: u32,
    pub started_at: DateTime<Utc>,
    pub status: BattleStatus,
    pub end_reason: Option<BattleEndReason>,
    pub winner_id: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl BattleInstance {
    pub fn new(
        area_id: impl Into<String>,
        participants: Vec<BattleParticipant>,
        now: DateTime<Utc>,
    ) -> Self {
        let turn_order = participants.iter().map(|p| p.id.clone()).collect();
        Self {
            id: Uuid::new_v4(),
            area_id: area_id.into(),
            participants,
            turn_order,
            current_turn: 0,
            started_at: now,
            status: BattleStatus::Active,
            end_reason: None,
            winner_id: None,
            ended_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == BattleStatus::Active
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.participants.iter().any(|p| p.id == entity_id)
    }

    pub fn participant(&self, entity_id: &str) -> Option<&BattleParticipant> {
        self.participants.iter().find(|p| p.id == entity_id)
    }

    pub fn participant_mut(&mut self, entity_id: &str) -> Option<&mut BattleParticipant> {
        self.participants.iter_mut().find(|p| p.id == entity_id)
    }

    /// Id of the participant whose turn it is.
    pub fn active_turn_id(&self) -> Option<&str> {
        if self.turn_order.is_empty() {
            return None;
        }
        let index = self.current_turn as usize % self.turn_order.len();
        Some(&self.turn_order[index])
    }

    pub fn advance_turn(&mut self) {
        self.current_turn += 1;
    }

    pub fn alive_participants(&self) -> Vec<&BattleParticipant> {
        self.participants.iter().filter(|p| p.is_alive()).collect()
    }

    /// First living participant other than `entity_id`, the default
    /// target for a basic attack in a two-party encounter.
    pub fn opponent_of(&self, entity_id: &str) -> Option<&BattleParticipant> {
        self.participants
            .iter()
            .find(|p| p.id != entity_id && p.is_alive())
    }

    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_seconds()
    }

    pub fn end(&mut self, reason: BattleEndReason, winner_id: Option<String>, now: DateTime<Utc>) {
        self.status = BattleStatus::Ended;
        self.end_reason = Some(reason);
        self.winner_id = winner_id;
        self.ended_at = Some(now);
    }
}

/// Whether a battle has concluded, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleOutcome {
    Ongoing,
    Ended {
        reason: BattleEndReason,
        winner_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardItem {
    pub item_id: String,
    pub quantity: u32,
}

/// Aggregate spoils of a finished battle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleRewards {
    pub experience: u64,
    pub gold: u64,
    pub items: Vec<RewardItem>,
}
