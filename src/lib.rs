//! # cultivation-events
//!
//! World event engine for a cultivation RPG.
//!
//! ## Design Principles
//!
//! 1. **Caller-Owned State**: The engine never owns the game state. Every
//!    call borrows a `GameContext`; whatever the engine changes lands there
//!    and the caller persists it.
//!
//! 2. **Degrade, Don't Fail**: Any context sub-tree may be absent. The
//!    engine skips what depends on it and logs the gap.
//!
//! 3. **Injected Randomness**: Every random decision goes through a
//!    `Roller`, so scheduling and resolution replay exactly from a seed.
//!
//! ## Architecture
//!
//! - **Composition Over Inheritance**: An `EventInstance` drives the generic
//!   lifecycle and delegates everything type-specific to an `EventBehavior`.
//!   Conflicts are a behavior (`ConflictEscalationManager`) that composes a
//!   `ConflictKind`.
//!
//! - **Closed Result Tags**: Choice results are a sum type with an explicit
//!   `Unknown` variant; unknown tags resolve to `applied: false`.
//!
//! - **Synchronous**: No background work, no wall clock. Time advances only
//!   when the caller moves `ctx.world.time`.
//!
//! ## Modules
//!
//! - `core`: Game context, game time, RNG, configuration, errors
//! - `events`: Definitions, conditions, behaviors, instances, result resolution
//! - `conflicts`: Scale-aware conflicts and the daily spawn check
//! - `plugins`: Built-in event plugins and the event registry

pub mod core;
pub mod events;
pub mod conflicts;
pub mod plugins;

// Re-export commonly used types
pub use crate::core::{
    GameContext, PlayerState, WorldState, UiState,
    GameTime, Season,
    GameRng, GameRngState, Roller, ScriptedRolls,
    EngineConfig, RarityChances,
    EngineError, EngineResult,
};

pub use crate::events::{
    EventId, EventCategory, Rarity, EventDefinition, ChoiceSpec, Requirement, ResultSpec, EffectSpec,
    ConditionSet, ConditionEvaluator, DayPeriod,
    EventBehavior, DefaultBehavior,
    EventInstance, EventStatus, ActivationSummary, EventStateSnapshot,
    ChoiceResult, ResultOutcome, CombatHandoff,
};

pub use crate::conflicts::{
    ConflictScale, ConflictContext, ConflictSettings,
    ConflictEscalationManager, ConflictKind, BanditAttack, DemonicCultivators,
    ConflictTracker, ConflictSpawnCheck,
};

pub use crate::plugins::{
    EventRegistry, EventPlugin, EventType, RegistrationReport,
    register_all_event_plugins,
};
