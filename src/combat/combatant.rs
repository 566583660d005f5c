//! Combatant stat snapshots.
//!
//! Combat resolution never reaches into the world registries: callers
//! snapshot the acting and target entities into [`Combatant`] values and
//! hand those to the resolver together with the battle record. The
//! tagged union replaces any structural probing of "is this a player or
//! a monster" with an explicit variant.

use crate::character::attributes::Attributes;
use crate::character::derived_stats::DerivedStats;
use crate::character::player::Player;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CombatantKind {
    Player,
    Monster,
}

#[derive(Debug, Clone)]
pub struct CombatantSnapshot {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub attributes: Attributes,
    pub stats: DerivedStats,
}

#[derive(Debug, Clone)]
pub enum Combatant {
    Player(CombatantSnapshot),
    Monster(CombatantSnapshot),
}

impl Combatant {
    pub fn from_player(player: &Player) -> Self {
        Combatant::Player(CombatantSnapshot {
            id: player.id.clone(),
            name: player.name.clone(),
            level: player.level,
            attributes: player.attributes,
            stats: player.derived_stats(),
        })
    }

    pub fn monster(
        id: impl Into<String>,
        name: impl Into<String>,
        level: u32,
        attributes: Attributes,
    ) -> Self {
        Combatant::Monster(CombatantSnapshot {
            id: id.into(),
            name: name.into(),
            level,
            attributes,
            stats: DerivedStats::calculate(&attributes, level),
        })
    }

    pub fn kind(&self) -> CombatantKind {
        match self {
            Combatant::Player(_) => CombatantKind::Player,
            Combatant::Monster(_) => CombatantKind::Monster,
        }
    }

    fn snapshot(&self) -> &CombatantSnapshot {
        match self {
            Combatant::Player(s) | Combatant::Monster(s) => s,
        }
    }

    pub fn id(&self) -> &str {
        &self.snapshot().id
    }

    pub fn name(&self) -> &str {
        &self.snapshot().name
    }

    pub fn level(&self) -> u32 {
        self.snapshot().level
    }

    pub fn attributes(&self) -> &Attributes {
        &self.snapshot().attributes
    }

    pub fn stats(&self) -> &DerivedStats {
        &self.snapshot().stats
    }
}
