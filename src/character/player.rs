//! Persistent player record.
//!
//! Loaded and saved through the host's [`PlayerStore`](crate::data::stores::PlayerStore);
//! the engine never touches persistence formats directly. Progression
//! fields (level, experience, points) are mutated only by the
//! [`ProgressionEngine`](crate::progression::engine::ProgressionEngine).

use crate::character::attributes::Attributes;
use crate::character::derived_stats::DerivedStats;
use crate::core::constants::XP_CURVE_BASE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub area_id: String,
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(area_id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            area_id: area_id.into(),
            x,
            y,
        }
    }

    /// Euclidean distance to a point in the same area.
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        let dx = self.x - x;
        let dy = self.y - y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub experience: u64,
    pub experience_to_next: u64,
    pub stat_points: u32,
    pub skill_points: u32,
    pub attributes: Attributes,
    pub gold: u64,
    /// Learned skill ids.
    pub skills: Vec<String>,
    /// Item id -> quantity. Ordered so serialized saves diff cleanly.
    pub inventory: BTreeMap<String, u32>,
    pub location: Location,
    pub online: bool,
    pub playtime_seconds: u64,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, area_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level: 1,
            experience: 0,
            experience_to_next: XP_CURVE_BASE as u64,
            stat_points: 0,
            skill_points: 0,
            attributes: Attributes::new(),
            gold: 0,
            skills: Vec::new(),
            inventory: BTreeMap::new(),
            location: Location::new(area_id, 0.0, 0.0),
            online: false,
            playtime_seconds: 0,
        }
    }

    pub fn derived_stats(&self) -> DerivedStats {
        DerivedStats::calculate(&self.attributes, self.level)
    }

    pub fn item_count(&self, item_id: &str) -> u32 {
        self.inventory.get(item_id).copied().unwrap_or(0)
    }

    pub fn grant_item(&mut self, item_id: &str, quantity: u32) {
        *self.inventory.entry(item_id.to_string()).or_insert(0) += quantity;
    }

    /// Removes `quantity` of an item. Returns false (and leaves the
    /// inventory untouched) when the player holds fewer than requested.
    pub fn consume_item(&mut self, item_id: &str, quantity: u32) -> bool {
        match self.inventory.get_mut(item_id) {
            Some(held) if *held >= quantity => {
                *held -= quantity;
                if *held == 0 {
                    self.inventory.remove(item_id);
                }
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_defaults() {
        let player = Player::new("p1", "Aria", "meadow");
        assert_eq!(player.level, 1);
        assert_eq!(player.experience, 0);
        assert_eq!(player.experience_to_next, 100);
        assert_eq!(player.stat_points, 0);
        assert!(!player.online);
    }

    #[test]
    fn test_inventory_grant_and_consume() {
        let mut player = Player::new("p1", "Aria", "meadow");
        player.grant_item("health_potion", 3);
        assert_eq!(player.item_count("health_potion"), 3);

        assert!(player.consume_item("health_potion", 2));
        assert_eq!(player.item_count("health_potion"), 1);

        // Consuming more than held fails and changes nothing.
        assert!(!player.consume_item("health_potion", 2));
        assert_eq!(player.item_count("health_potion"), 1);

        assert!(player.consume_item("health_potion", 1));
        assert_eq!(player.item_count("health_potion"), 0);
        assert!(!player.inventory.contains_key("health_potion"));
    }

    #[test]
    fn test_location_distance() {
        let loc = Location::new("meadow", 0.0, 0.0);
        assert_eq!(loc.distance_to(3.0, 4.0), 5.0);
    }
}
