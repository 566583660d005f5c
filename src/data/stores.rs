//! Collaborator contracts for persistence and game data.
//!
//! The engine is invoked in-process and owns no storage: player records
//! come and go through [`PlayerStore`], templates through
//! [`GameDataStore`]. Hosts provide real backends;
//! [`memory`](crate::data::memory) provides in-memory implementations
//! for tests and embedding.
//!
//! Read-modify-write consistency is the caller's job: the world tick
//! serializes all mutation of a given player through one execution
//! context, so a `save_player` always reflects every prior mutation of
//! that record.

use crate::character::player::{Location, Player};
use crate::data::templates::{AreaTemplate, ItemTemplate, MonsterTemplate, SkillTemplate};
use crate::error::EngineResult;

pub trait PlayerStore: Send + Sync {
    /// Loads a player record, `None` when the id is unknown.
    fn load_player(&self, id: &str) -> EngineResult<Option<Player>>;

    /// Persists the full record, replacing any previous state.
    fn save_player(&self, player: &Player) -> EngineResult<()>;

    fn add_item(&self, player_id: &str, item_id: &str, quantity: u32) -> EngineResult<()>;

    /// Removes up to `quantity` of an item. Returns `false` (without
    /// mutating) when the player holds fewer than requested.
    fn remove_item(&self, player_id: &str, item_id: &str, quantity: u32) -> EngineResult<bool>;

    fn update_location(&self, player_id: &str, location: &Location) -> EngineResult<()>;

    fn update_online_status(&self, player_id: &str, online: bool) -> EngineResult<()>;

    fn add_playtime(&self, player_id: &str, seconds: u64) -> EngineResult<()>;
}

/// Read-only template catalog. Lookups return owned clones; templates
/// are immutable from the engine's perspective.
pub trait GameDataStore: Send + Sync {
    fn skill(&self, id: &str) -> Option<SkillTemplate>;
    fn item(&self, id: &str) -> Option<ItemTemplate>;
    fn monster(&self, id: &str) -> Option<MonsterTemplate>;
    fn area(&self, id: &str) -> Option<AreaTemplate>;
    fn all_areas(&self) -> Vec<AreaTemplate>;
    fn all_skills(&self) -> Vec<SkillTemplate>;
}
