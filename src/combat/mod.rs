pub mod combatant;
pub mod resolver;
pub mod types;
