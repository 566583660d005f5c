//! Scheduled one-shot world events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A world-affecting action scheduled for a future tick. Consumed once
/// by the tick whose time reaches `trigger_at`, then retained briefly
/// for audit before eviction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldEvent {
    pub id: Uuid,
    /// Host-defined discriminator, e.g. `"spawn_monster"`.
    pub kind: String,
    pub area_id: Option<String>,
    pub payload: serde_json::Value,
    pub trigger_at: DateTime<Utc>,
    pub processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
}

impl WorldEvent {
    pub fn new(
        kind: impl Into<String>,
        area_id: Option<String>,
        payload: serde_json::Value,
        trigger_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            area_id,
            payload,
            trigger_at,
            processed: false,
            processed_at: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.processed && now >= self.trigger_at
    }
}
