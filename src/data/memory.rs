//! In-memory store implementations.
//!
//! Used by the test suite and by hosts that embed the engine without a
//! database. Interior locks make the stores shareable behind `Arc`
//! while the engine itself stays single-threaded per world shard.

use crate::character::player::{Location, Player};
use crate::data::stores::{GameDataStore, PlayerStore};
use crate::data::templates::{AreaTemplate, ItemTemplate, MonsterTemplate, SkillTemplate};
use crate::error::{EngineError, EngineResult};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryPlayerStore {
    players: RwLock<HashMap<String, Player>>,
}

impl MemoryPlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record directly, outside the trait surface.
    pub fn insert(&self, player: Player) {
        self.players.write().insert(player.id.clone(), player);
    }

    /// Snapshot of a record for assertions.
    pub fn get(&self, id: &str) -> Option<Player> {
        self.players.read().get(id).cloned()
    }

    fn with_player<T>(
        &self,
        id: &str,
        mutate: impl FnOnce(&mut Player) -> T,
    ) -> EngineResult<T> {
        let mut players = self.players.write();
        let player = players
            .get_mut(id)
            .ok_or_else(|| EngineError::validation(format!("unknown player: {id}")))?;
        Ok(mutate(player))
    }
}

impl PlayerStore for MemoryPlayerStore {
    fn load_player(&self, id: &str) -> EngineResult<Option<Player>> {
        Ok(self.players.read().get(id).cloned())
    }

    fn save_player(&self, player: &Player) -> EngineResult<()> {
        self.players
            .write()
            .insert(player.id.clone(), player.clone());
        Ok(())
    }

    fn add_item(&self, player_id: &str, item_id: &str, quantity: u32) -> EngineResult<()> {
        self.with_player(player_id, |p| p.grant_item(item_id, quantity))
    }

    fn remove_item(&self, player_id: &str, item_id: &str, quantity: u32) -> EngineResult<bool> {
        self.with_player(player_id, |p| p.consume_item(item_id, quantity))
    }

    fn update_location(&self, player_id: &str, location: &Location) -> EngineResult<()> {
        self.with_player(player_id, |p| p.location = location.clone())
    }

    fn update_online_status(&self, player_id: &str, online: bool) -> EngineResult<()> {
        self.with_player(player_id, |p| p.online = online)
    }

    fn add_playtime(&self, player_id: &str, seconds: u64) -> EngineResult<()> {
        self.with_player(player_id, |p| p.playtime_seconds += seconds)
    }
}

#[derive(Default)]
pub struct MemoryGameDataStore {
    skills: RwLock<HashMap<String, SkillTemplate>>,
    items: RwLock<HashMap<String, ItemTemplate>>,
    monsters: RwLock<HashMap<String, MonsterTemplate>>,
    areas: RwLock<HashMap<String, AreaTemplate>>,
}

impl MemoryGameDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_skill(&self, skill: SkillTemplate) {
        self.skills.write().insert(skill.id.clone(), skill);
    }

    pub fn insert_item(&self, item: ItemTemplate) {
        self.items.write().insert(item.id.clone(), item);
    }

    pub fn insert_monster(&self, monster: MonsterTemplate) {
        self.monsters.write().insert(monster.id.clone(), monster);
    }

    pub fn insert_area(&self, area: AreaTemplate) {
        self.areas.write().insert(area.id.clone(), area);
    }
}

impl GameDataStore for MemoryGameDataStore {
    fn skill(&self, id: &str) -> Option<SkillTemplate> {
        self.skills.read().get(id).cloned()
    }

    fn item(&self, id: &str) -> Option<ItemTemplate> {
        self.items.read().get(id).cloned()
    }

    fn monster(&self, id: &str) -> Option<MonsterTemplate> {
        self.monsters.read().get(id).cloned()
    }

    fn area(&self, id: &str) -> Option<AreaTemplate> {
        self.areas.read().get(id).cloned()
    }

    fn all_areas(&self) -> Vec<AreaTemplate> {
        self.areas.read().values().cloned().collect()
    }

    fn all_skills(&self) -> Vec<SkillTemplate> {
        self.skills.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_store_round_trip() {
        let store = MemoryPlayerStore::new();
        store.insert(Player::new("p1", "Aria", "meadow"));

        let loaded = store.load_player("p1").unwrap().unwrap();
        assert_eq!(loaded.name, "Aria");
        assert!(store.load_player("ghost").unwrap().is_none());
    }

    #[test]
    fn test_remove_item_insufficient_is_false_not_error() {
        let store = MemoryPlayerStore::new();
        let mut player = Player::new("p1", "Aria", "meadow");
        player.grant_item("health_potion", 1);
        store.insert(player);

        assert!(!store.remove_item("p1", "health_potion", 2).unwrap());
        assert_eq!(store.get("p1").unwrap().item_count("health_potion"), 1);
        assert!(store.remove_item("p1", "health_potion", 1).unwrap());
    }

    #[test]
    fn test_mutating_unknown_player_is_validation_error() {
        let store = MemoryPlayerStore::new();
        let err = store.add_item("ghost", "health_potion", 1).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
