//! Engine error taxonomy.
//!
//! Choice failures (`InvalidChoice`, `RequirementNotMet`, `EventNotActive`)
//! are reported inside a `ChoiceResult` rather than returned as `Err`.
//! Registration failures are collected per event so one bad definition
//! never blocks the rest of a plugin.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything that can go wrong inside the event engine.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EngineError {
    #[error("choice index {index} out of range ({available} choices available)")]
    InvalidChoice { index: usize, available: usize },

    #[error("requirement not met: {requirement}")]
    RequirementNotMet { requirement: String },

    #[error("game context is missing `{subtree}`; skipped {skipped}")]
    MissingCollaboratorData { subtree: String, skipped: String },

    #[error("no handler for result tag `{tag}`")]
    UnknownResultTag { tag: String },

    #[error("event instance {instance_id} is not active")]
    EventNotActive { instance_id: String },

    #[error("event {event_id} is already active as {instance_id}")]
    AlreadyActive { event_id: String, instance_id: String },

    #[error("event instance {instance_id} has already finished")]
    Finished { instance_id: String },

    #[error("event `{event_id}` is not a scale-aware conflict")]
    NotAConflict { event_id: String },

    #[error("conflict is already at the highest scale")]
    MaxScaleReached,

    #[error("event `{event_id}` is already registered")]
    DuplicateEvent { event_id: String },

    #[error("invalid definition for `{event_id}`: {reason}")]
    InvalidDefinition { event_id: String, reason: String },

    #[error("unknown event `{event_id}`")]
    UnknownEvent { event_id: String },

    #[error("invalid engine configuration: {0}")]
    Config(String),

    #[error("snapshot serialization failed: {0}")]
    Serialization(String),
}

impl EngineError {
    /// Shorthand for a missing context sub-tree.
    pub fn missing(subtree: impl Into<String>, skipped: impl Into<String>) -> Self {
        Self::MissingCollaboratorData {
            subtree: subtree.into(),
            skipped: skipped.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = EngineError::InvalidChoice { index: 5, available: 3 };
        assert_eq!(err.to_string(), "choice index 5 out of range (3 choices available)");

        let err = EngineError::missing("player.inventory", "item reward");
        assert_eq!(
            err.to_string(),
            "game context is missing `player.inventory`; skipped item reward"
        );
    }
}
