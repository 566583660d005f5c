//! emberward — a server-side, turn-based RPG simulation core.
//!
//! The engine resolves individual combat actions, advances a shared world
//! on a fixed tick, and governs character progression. It is organized as
//! three cooperating services:
//!
//! - [`combat::resolver::CombatResolver`] — resolves a single combat
//!   action (attack, skill, item, defend, flee) against two combatants'
//!   stat snapshots, mutating only the battle record it is given.
//! - [`world::simulator::WorldSimulator`] — owns the in-memory registries
//!   of active players, monster instances, battles, and scheduled world
//!   events, and drives the six-phase world tick.
//! - [`progression::engine::ProgressionEngine`] — experience gain,
//!   level-up cascades, stat allocation and resets.
//!
//! Presentation, HTTP, persistence internals, and authentication are host
//! concerns consumed through the [`data::stores::PlayerStore`] and
//! [`data::stores::GameDataStore`] traits. The engine installs no logger
//! and samples no wall-clock below the convenience wrappers: callers
//! inject `now` and an RNG so world shards stay deterministic under test.

pub mod character;
pub mod combat;
pub mod core;
pub mod data;
pub mod error;
pub mod progression;
pub mod world;

pub use character::player::Player;
pub use combat::resolver::CombatResolver;
pub use combat::types::{ActionResult, BattleInstance, BattleRewards};
pub use error::{EngineError, EngineResult};
pub use progression::engine::{ExperienceSource, ProgressionEngine};
pub use world::simulator::{PlayerAction, WorldSimulator};
