//! Event system: definitions, conditions, behaviors, instances.
//!
//! ## Key Types
//!
//! - `EventDefinition`: immutable template (conditions, effects, choices)
//! - `ConditionEvaluator`: eligibility from a `ConditionSet` and the context
//! - `EventBehavior`: per-type strategy object (initial effects, result
//!   handlers, cleanup)
//! - `EventInstance`: the lifecycle state machine the scheduler drives
//! - `ResultResolver`: default handlers for generic result tags

pub mod definition;
pub mod condition;
pub mod outcome;
pub mod resolver;
pub mod behavior;
pub mod instance;

pub use definition::{
    ChoiceSpec, DurationRange, EffectSpec, EventCategory, EventDefinition, EventId, Rarity,
    Requirement, ResourceKind, ResultSpec,
};
pub use condition::{ConditionEvaluator, ConditionSet, DayPeriod};
pub use outcome::{
    ChoiceResult, CombatHandoff, Combatant, Consequences, Penalty, ResultOutcome, RewardItem, Rewards,
};
pub use resolver::ResultResolver;
pub use behavior::{ActivationScope, DefaultBehavior, EventBehavior};
pub use instance::{ActivationSummary, ChoiceView, EventInstance, EventStateSnapshot, EventStatus};
