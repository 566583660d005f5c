//! Spawned monster instances.

use crate::character::attributes::Attributes;
use crate::character::derived_stats::DerivedStats;
use crate::combat::combatant::Combatant;
use crate::data::templates::MonsterTemplate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle: `Idle -> Hunting` when an aggressive monster detects a
/// player, `-> Fighting` when a battle starts, `-> Dead` at 0 HP.
/// Hunting and Fighting fall back to Idle when the chase or battle ends
/// without a death.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MonsterStatus {
    Idle,
    Hunting,
    Fighting,
    Dead,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterInstance {
    pub id: Uuid,
    pub template_id: String,
    pub name: String,
    pub level: u32,
    pub attributes: Attributes,
    pub current_hp: u32,
    pub current_mp: u32,
    pub x: f64,
    pub y: f64,
    pub area_id: String,
    pub spawned_at: DateTime<Utc>,
    /// Last AI evaluation; throttles AI to once per tick period.
    pub last_ai_at: DateTime<Utc>,
    pub target_player_id: Option<String>,
    pub status: MonsterStatus,
    pub died_at: Option<DateTime<Utc>>,
}

impl MonsterInstance {
    pub fn from_template(
        template: &MonsterTemplate,
        area_id: impl Into<String>,
        x: f64,
        y: f64,
        now: DateTime<Utc>,
    ) -> Self {
        let stats = DerivedStats::calculate(&template.attributes, template.level);
        Self {
            id: Uuid::new_v4(),
            template_id: template.id.clone(),
            name: template.name.clone(),
            level: template.level,
            attributes: template.attributes,
            current_hp: stats.max_hp,
            current_mp: stats.max_mp,
            x,
            y,
            area_id: area_id.into(),
            spawned_at: now,
            last_ai_at: now,
            target_player_id: None,
            status: MonsterStatus::Idle,
            died_at: None,
        }
    }

    pub fn stats(&self) -> DerivedStats {
        DerivedStats::calculate(&self.attributes, self.level)
    }

    pub fn combatant(&self) -> Combatant {
        Combatant::monster(self.id.to_string(), self.name.clone(), self.level, self.attributes)
    }

    pub fn is_alive(&self) -> bool {
        self.status != MonsterStatus::Dead && self.current_hp > 0
    }

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        let dx = self.x - x;
        let dy = self.y - y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Moves up to `step` toward a point, stopping exactly on it when
    /// closer than one step.
    pub fn step_towards(&mut self, x: f64, y: f64, step: f64) {
        let distance = self.distance_to(x, y);
        if distance <= step || distance == 0.0 {
            self.x = x;
            self.y = y;
        } else {
            self.x += (x - self.x) / distance * step;
            self.y += (y - self.y) / distance * step;
        }
    }

    pub fn mark_dead(&mut self, now: DateTime<Utc>) {
        self.status = MonsterStatus::Dead;
        self.current_hp = 0;
        self.target_player_id = None;
        self.died_at = Some(now);
    }

    /// Returns the monster to idle wandering after a chase or battle.
    pub fn disengage(&mut self) {
        self.status = MonsterStatus::Idle;
        self.target_player_id = None;
    }
}
