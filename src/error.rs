//! Engine error taxonomy.
//!
//! Expected domain failures (bad references, short resources, conflicting
//! state) are regular values returned to the caller. `System` is reserved
//! for conditions the engine did not anticipate; those are logged at the
//! boundary where they surface and converted, never propagated as panics.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A referenced actor, target, skill, item, or area does not exist.
    #[error("{0}")]
    Validation(String),

    /// Insufficient mana, gold, stat/skill points, or inventory quantity.
    #[error("{0}")]
    Resource(String),

    /// The operation conflicts with current world state (already in a
    /// battle, zone at capacity, not currently joinable).
    #[error("{0}")]
    State(String),

    /// Unexpected internal failure, reported generically to the caller.
    #[error("internal error: {0}")]
    System(String),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub fn resource(message: impl Into<String>) -> Self {
        EngineError::Resource(message.into())
    }

    pub fn state(message: impl Into<String>) -> Self {
        EngineError::State(message.into())
    }

    pub fn system(message: impl Into<String>) -> Self {
        EngineError::System(message.into())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_passes_message_through() {
        let err = EngineError::state("already in battle");
        assert_eq!(err.to_string(), "already in battle");
    }

    #[test]
    fn test_system_errors_are_generic() {
        let err = EngineError::system("index out of range");
        assert!(err.to_string().starts_with("internal error:"));
    }
}
