//! Event behaviors - the per-type strategy object behind an instance.
//!
//! An `EventInstance` owns the generic lifecycle; everything type-specific
//! sits behind `EventBehavior`. Every hook has a default, so a purely
//! data-driven event uses `DefaultBehavior` and only events with real state
//! (conflicts, the lunar cycle) implement their own.

use crate::conflicts::ConflictEscalationManager;
use crate::core::{GameContext, GameTime, Roller};

use super::definition::{ChoiceSpec, EventDefinition, ResultSpec};
use super::outcome::ResultOutcome;
use super::resolver::ResultResolver;

/// Read-only facts about the activation in progress, passed to hooks.
#[derive(Clone, Copy, Debug)]
pub struct ActivationScope<'a> {
    pub instance_id: &'a str,
    pub definition: &'a EventDefinition,
    pub start_time: GameTime,
    pub end_time: GameTime,
}

/// Type-specific hooks of an event.
pub trait EventBehavior: std::fmt::Debug + Send {
    /// Extra eligibility gate, evaluated after the generic conditions.
    fn additional_conditions(&self, _def: &EventDefinition, _ctx: &GameContext) -> bool {
        true
    }

    /// Apply initial effects beyond the definition's ambient `EffectSpec`s.
    fn on_activate(&mut self, _scope: &ActivationScope<'_>, _ctx: &mut GameContext, _rng: &mut dyn Roller) {}

    /// Choices currently on offer. Refreshed after activation and escalation.
    fn choices(&self, def: &EventDefinition) -> Vec<ChoiceSpec> {
        def.choices.clone()
    }

    /// Interpret one result spec.
    fn apply_result(
        &mut self,
        spec: &ResultSpec,
        ctx: &mut GameContext,
        _rng: &mut dyn Roller,
    ) -> ResultOutcome {
        ResultResolver::apply_default(spec, ctx)
    }

    /// Ask the lifecycle to conclude after the current choice even though
    /// the choice itself does not conclude.
    fn wants_conclusion(&self) -> bool {
        false
    }

    /// Cleanup beyond removing instance-keyed effects.
    fn on_conclude(&mut self, _instance_id: &str, _ctx: &mut GameContext) {}

    /// Scale-aware conflict state, for behaviors that have it.
    fn as_conflict(&self) -> Option<&ConflictEscalationManager> {
        None
    }

    fn as_conflict_mut(&mut self) -> Option<&mut ConflictEscalationManager> {
        None
    }
}

/// Behavior of purely data-driven events.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultBehavior;

impl EventBehavior for DefaultBehavior {}
