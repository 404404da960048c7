//! Event instances - the runtime lifecycle state machine.
//!
//! ```text
//! Inactive --activate--> Active --conclude--> Concluded
//!                          |
//!                          +------expire-----> Expired
//! ```
//!
//! An instance pairs an immutable `EventDefinition` with a boxed
//! `EventBehavior` holding any type-specific state. It is owned by the
//! scheduler for its whole life; the `GameContext` is only ever borrowed
//! for the duration of one call.
//!
//! ## Randomness
//!
//! `activate` draws the duration first and the instance id suffix second;
//! the behavior's `on_activate` draws after that.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::conflicts::ConflictContext;
use crate::core::{
    ActiveBuff, AtmosphericEffect, EngineError, EngineResult, GameContext, GameTime, Notification,
    Roller, VisualEffect,
};

use super::behavior::{ActivationScope, EventBehavior};
use super::definition::{ChoiceSpec, EffectSpec, EventCategory, EventDefinition, EventId, Rarity, Requirement};
use super::outcome::ChoiceResult;

/// Lifecycle state of an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Inactive,
    Active,
    Concluded,
    Expired,
}

impl EventStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Concluded | Self::Expired)
    }
}

/// A choice as presented to the player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceView {
    pub index: usize,
    pub id: String,
    pub text: String,
    pub requirement: Option<Requirement>,
    pub concludes_event: bool,
}

/// Returned by `activate`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationSummary {
    pub instance_id: String,
    pub event_id: EventId,
    pub name: String,
    pub description: String,
    pub start_time: GameTime,
    pub end_time: GameTime,
    pub choices: Vec<ChoiceView>,
}

/// The only state an instance exposes for persistence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventStateSnapshot {
    pub event_id: EventId,
    pub instance_id: Option<String>,
    pub name: String,
    pub category: EventCategory,
    pub rarity: Rarity,
    pub is_active: bool,
    pub status: EventStatus,
    pub start_time: Option<GameTime>,
    pub end_time: Option<GameTime>,
    pub selected_choices: Vec<usize>,
    /// Current conflict context for scale-aware events.
    pub conflict: Option<ConflictContext>,
}

impl EventStateSnapshot {
    /// Compact binary encoding for storage.
    pub fn encode(&self) -> EngineResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| EngineError::Serialization(e.to_string()))
    }

    /// Decode bytes produced by `encode`.
    pub fn decode(bytes: &[u8]) -> EngineResult<Self> {
        bincode::deserialize(bytes).map_err(|e| EngineError::Serialization(e.to_string()))
    }
}

/// A live, time-boxed activation of an event definition.
#[derive(Debug)]
pub struct EventInstance {
    definition: Arc<EventDefinition>,
    behavior: Box<dyn EventBehavior>,
    instance_id: Option<String>,
    start_time: Option<GameTime>,
    end_time: Option<GameTime>,
    status: EventStatus,
    /// SmallVec: most events see one or two choices.
    selected_choices: SmallVec<[usize; 4]>,
    choices: Vec<ChoiceSpec>,
    /// Disambiguates instance ids; assigned by the registry.
    sequence: u64,
}

impl EventInstance {
    /// Create an inactive instance.
    #[must_use]
    pub fn new(definition: Arc<EventDefinition>, behavior: Box<dyn EventBehavior>) -> Self {
        Self {
            definition,
            behavior,
            instance_id: None,
            start_time: None,
            end_time: None,
            status: EventStatus::Inactive,
            selected_choices: SmallVec::new(),
            choices: Vec::new(),
            sequence: 0,
        }
    }

    /// Set the sequence number folded into the instance id.
    ///
    /// Two instances of one definition activated in the same game minute
    /// only get distinct ids if their sequence numbers differ.
    #[must_use]
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    // === Accessors ===

    #[must_use]
    pub fn definition(&self) -> &EventDefinition {
        &self.definition
    }

    #[must_use]
    pub fn behavior(&self) -> &dyn EventBehavior {
        self.behavior.as_ref()
    }

    #[must_use]
    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> EventStatus {
        self.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == EventStatus::Active
    }

    #[must_use]
    pub fn start_time(&self) -> Option<GameTime> {
        self.start_time
    }

    #[must_use]
    pub fn end_time(&self) -> Option<GameTime> {
        self.end_time
    }

    #[must_use]
    pub fn selected_choices(&self) -> &[usize] {
        &self.selected_choices
    }

    /// Choices currently on offer (empty before activation).
    #[must_use]
    pub fn choices(&self) -> &[ChoiceSpec] {
        &self.choices
    }

    // === Lifecycle ===

    /// Start the event.
    ///
    /// Freezes the start time from `ctx.world.time`, samples the duration,
    /// applies ambient effects and the behavior's initial effects, and
    /// returns what the player should see.
    ///
    /// The window always spans a duration drawn from the definition's range.
    /// A conflict keeps its own expiration in `ConflictContext`; only
    /// `escalate` stretches the window.
    pub fn activate(&mut self, ctx: &mut GameContext, rng: &mut dyn Roller) -> EngineResult<ActivationSummary> {
        match self.status {
            EventStatus::Active => {
                return Err(EngineError::AlreadyActive {
                    event_id: self.definition.id.to_string(),
                    instance_id: self.instance_id.clone().unwrap_or_default(),
                });
            }
            status if status.is_terminal() => {
                return Err(EngineError::Finished {
                    instance_id: self.instance_id.clone().unwrap_or_default(),
                });
            }
            _ => {}
        }

        let start = ctx.now().unwrap_or_else(|| {
            warn!(
                event = %self.definition.id,
                "{}",
                EngineError::missing("world", "activation time; using calendar epoch")
            );
            GameTime::default()
        });
        let duration = self.definition.duration.sample(rng);
        let end = start.plus_minutes(u64::from(duration));
        let instance_id = format!("{}-{}-{}", self.definition.id, start.total_minutes(), self.sequence);

        self.instance_id = Some(instance_id.clone());
        self.start_time = Some(start);
        self.end_time = Some(end);
        self.status = EventStatus::Active;
        self.selected_choices.clear();

        self.apply_ambient_effects(&instance_id, ctx);

        let definition = Arc::clone(&self.definition);
        let scope = ActivationScope {
            instance_id: &instance_id,
            definition: &definition,
            start_time: start,
            end_time: end,
        };
        self.behavior.on_activate(&scope, ctx, rng);
        self.choices = self.behavior.choices(&self.definition);

        info!(
            event = %self.definition.id,
            instance = %instance_id,
            start = %start,
            duration_minutes = duration,
            "event activated"
        );

        Ok(self.summary())
    }

    /// True once `now` is at or after the end of the activation window.
    ///
    /// An instance that was never activated never expires.
    #[must_use]
    pub fn is_expired(&self, now: GameTime) -> bool {
        self.end_time.is_some_and(|end| now >= end)
    }

    /// Close an active instance by timeout. Runs the same cleanup as `conclude`.
    pub fn expire(&mut self, ctx: &mut GameContext) -> bool {
        if !self.is_active() {
            return false;
        }
        self.cleanup(ctx);
        self.status = EventStatus::Expired;
        info!(event = %self.definition.id, instance = ?self.instance_id, "event expired");
        true
    }

    /// Resolve the player's choice.
    ///
    /// A rejected choice (out of range, unmet requirement, inactive event)
    /// leaves `ctx` untouched. In-range choices are logged in the selected
    /// choices whether or not their requirement is met.
    pub fn process_choice(&mut self, index: usize, ctx: &mut GameContext, rng: &mut dyn Roller) -> ChoiceResult {
        if !self.is_active() {
            return ChoiceResult::rejected(
                index,
                EngineError::EventNotActive {
                    instance_id: self.instance_id.clone().unwrap_or_default(),
                },
            );
        }

        let Some(choice) = self.choices.get(index).cloned() else {
            debug!(event = %self.definition.id, index, "choice index out of range");
            return ChoiceResult::rejected(
                index,
                EngineError::InvalidChoice {
                    index,
                    available: self.choices.len(),
                },
            );
        };

        self.selected_choices.push(index);

        if let Some(requirement) = &choice.requirement {
            if !requirement.is_met(ctx) {
                debug!(event = %self.definition.id, choice = %choice.id, %requirement, "requirement not met");
                return ChoiceResult::rejected(
                    index,
                    EngineError::RequirementNotMet {
                        requirement: requirement.to_string(),
                    },
                );
            }
        }

        let outcomes: Vec<_> = choice
            .results
            .iter()
            .map(|spec| self.behavior.apply_result(spec, ctx, rng))
            .collect();
        self.choices = self.behavior.choices(&self.definition);

        let concluded = if choice.concludes_event || self.behavior.wants_conclusion() {
            self.conclude(ctx)
        } else {
            false
        };

        debug!(
            event = %self.definition.id,
            choice = %choice.id,
            outcomes = outcomes.len(),
            concluded,
            "choice resolved"
        );

        ChoiceResult {
            success: true,
            choice_index: index,
            outcomes,
            concluded,
            error: None,
        }
    }

    /// End the event. Returns false if it was not active.
    pub fn conclude(&mut self, ctx: &mut GameContext) -> bool {
        if !self.is_active() {
            return false;
        }
        self.cleanup(ctx);
        self.status = EventStatus::Concluded;
        info!(event = %self.definition.id, instance = ?self.instance_id, "event concluded");
        true
    }

    /// Snapshot for external persistence.
    #[must_use]
    pub fn get_state(&self) -> EventStateSnapshot {
        EventStateSnapshot {
            event_id: self.definition.id.clone(),
            instance_id: self.instance_id.clone(),
            name: self.definition.name.clone(),
            category: self.definition.category,
            rarity: self.definition.rarity,
            is_active: self.is_active(),
            status: self.status,
            start_time: self.start_time,
            end_time: self.end_time,
            selected_choices: self.selected_choices.to_vec(),
            conflict: self.conflict().cloned(),
        }
    }

    // === Conflict escalation ===

    /// Current conflict context, for scale-aware events.
    #[must_use]
    pub fn conflict(&self) -> Option<&ConflictContext> {
        self.behavior.as_conflict().and_then(|manager| manager.context())
    }

    /// One escalation draw. Always false for inactive or non-conflict events.
    pub fn can_escalate(&self, rng: &mut dyn Roller) -> bool {
        self.is_active()
            && self
                .behavior
                .as_conflict()
                .is_some_and(|manager| manager.can_escalate(rng))
    }

    /// Move an active conflict to its next scale.
    ///
    /// The activation window is extended to the new conflict expiration and
    /// the offered choices are rebuilt for the new scale.
    pub fn escalate(&mut self, ctx: &mut GameContext, rng: &mut dyn Roller) -> EngineResult<ConflictContext> {
        if !self.is_active() {
            return Err(EngineError::EventNotActive {
                instance_id: self.instance_id.clone().unwrap_or_default(),
            });
        }
        let event_id = self.definition.id.to_string();
        let manager = self
            .behavior
            .as_conflict_mut()
            .ok_or(EngineError::NotAConflict { event_id })?;
        let next = manager.escalate(ctx, rng)?;

        self.extend_window_to_conflict();
        self.choices = self.behavior.choices(&self.definition);
        Ok(next)
    }

    // === Internals ===

    fn summary(&self) -> ActivationSummary {
        ActivationSummary {
            instance_id: self.instance_id.clone().unwrap_or_default(),
            event_id: self.definition.id.clone(),
            name: self.definition.name.clone(),
            description: self.definition.description.clone(),
            start_time: self.start_time.unwrap_or_default(),
            end_time: self.end_time.unwrap_or_default(),
            choices: self
                .choices
                .iter()
                .enumerate()
                .map(|(index, choice)| ChoiceView {
                    index,
                    id: choice.id.clone(),
                    text: choice.text.clone(),
                    requirement: choice.requirement.clone(),
                    concludes_event: choice.concludes_event,
                })
                .collect(),
        }
    }

    fn extend_window_to_conflict(&mut self) {
        let Some(expiration) = self.conflict().map(|c| c.expiration_time) else {
            return;
        };
        if let Some(end) = self.end_time {
            if expiration > end {
                self.end_time = Some(expiration);
            }
        }
    }

    fn cleanup(&mut self, ctx: &mut GameContext) {
        let instance_id = self.instance_id.clone().unwrap_or_default();
        let removed = ctx.remove_instance_effects(&instance_id);
        self.behavior.on_conclude(&instance_id, ctx);
        debug!(instance = %instance_id, removed, "instance effects removed");
    }

    fn apply_ambient_effects(&self, instance_id: &str, ctx: &mut GameContext) {
        for (i, effect) in self.definition.effects.iter().enumerate() {
            match effect {
                EffectSpec::Notification { title, message, kind } => {
                    let queued = ctx.notify(Notification {
                        id: format!("{instance_id}:notice-{i}"),
                        kind: *kind,
                        title: title.clone(),
                        message: message.clone(),
                    });
                    if !queued {
                        warn!("{}", EngineError::missing("ui", "event notification"));
                    }
                }
                EffectSpec::VisualEffect { kind, intensity } => match ctx.world.as_mut() {
                    Some(world) => world.visual_effects.push(VisualEffect {
                        id: format!("{instance_id}:{kind}"),
                        kind: kind.clone(),
                        intensity: *intensity,
                    }),
                    None => warn!("{}", EngineError::missing("world", "visual effect")),
                },
                EffectSpec::AtmosphericEffect { kind, description } => match ctx.world.as_mut() {
                    Some(world) => world.atmospheric_effects.push(AtmosphericEffect {
                        id: format!("{instance_id}:{kind}"),
                        kind: kind.clone(),
                        description: description.clone(),
                    }),
                    None => warn!("{}", EngineError::missing("world", "atmospheric effect")),
                },
                EffectSpec::TemporaryBuff { name, stat, multiplier } => match ctx.player.as_mut() {
                    Some(player) => player.active_buffs.push(ActiveBuff {
                        id: format!("{instance_id}:{name}"),
                        name: name.clone(),
                        stat: stat.clone(),
                        multiplier: *multiplier,
                    }),
                    None => warn!("{}", EngineError::missing("player", "temporary buff")),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameRng, NotificationKind, PlayerState, ScriptedRolls, Season, WorldState};
    use crate::events::{DefaultBehavior, DurationRange, ResultSpec};

    fn rain_definition() -> EventDefinition {
        EventDefinition::new("spirit_rain", "Spirit Rain", EventCategory::Nature)
            .with_duration(DurationRange::new(30, 90))
            .with_effect(EffectSpec::Notification {
                title: "Spirit Rain".into(),
                message: "Qi-laden rain begins to fall".into(),
                kind: NotificationKind::Event,
            })
            .with_effect(EffectSpec::VisualEffect {
                kind: "rain".into(),
                intensity: 0.6,
            })
            .with_effect(EffectSpec::TemporaryBuff {
                name: "rain_blessing".into(),
                stat: "cultivation_speed".into(),
                multiplier: 1.25,
            })
            .with_choice(
                ChoiceSpec::new("meditate", "Meditate")
                    .with_result(ResultSpec::Experience { amount: 40 })
                    .concludes(),
            )
            .with_choice(
                ChoiceSpec::new("gather", "Gather dew")
                    .requires(Requirement::Skill {
                        skill: "herbalism".into(),
                        level: 2,
                    })
                    .with_result(ResultSpec::Item {
                        item_id: "spirit_dew".into(),
                        name: "Spirit Dew".into(),
                        quantity: 1,
                    }),
            )
    }

    fn context() -> GameContext {
        GameContext::new(
            PlayerState::new(4),
            WorldState::new(GameTime::new(1, 3, 12, 23, 30), Season::Summer, "rain"),
        )
    }

    fn instance() -> EventInstance {
        EventInstance::new(Arc::new(rain_definition()), Box::new(DefaultBehavior))
    }

    #[test]
    fn test_activate_sets_window_and_effects() {
        let mut event = instance();
        let mut ctx = context();
        let mut rng = GameRng::new(3);

        let summary = event.activate(&mut ctx, &mut rng).unwrap();

        assert_eq!(event.status(), EventStatus::Active);
        assert!(summary.end_time > summary.start_time);
        let minutes = summary.start_time.minutes_until(&summary.end_time);
        assert!((30..=90).contains(&minutes));
        assert_eq!(summary.choices.len(), 2);
        assert!(summary.instance_id.starts_with("spirit_rain-"));

        assert_eq!(ctx.ui.as_ref().unwrap().notifications.len(), 1);
        assert_eq!(ctx.world.as_ref().unwrap().visual_effects.len(), 1);
        assert_eq!(ctx.player.as_ref().unwrap().active_buffs.len(), 1);
    }

    #[test]
    fn test_double_activation_rejected() {
        let mut event = instance();
        let mut ctx = context();
        let mut rng = GameRng::new(3);
        event.activate(&mut ctx, &mut rng).unwrap();
        assert!(matches!(
            event.activate(&mut ctx, &mut rng),
            Err(EngineError::AlreadyActive { .. })
        ));
    }

    #[test]
    fn test_window_crosses_midnight_without_early_expiry() {
        let mut event = instance();
        let mut ctx = context();
        // duration roll at the top of the range: 90 minutes from 23:30
        let mut rolls = ScriptedRolls::constant(0.999);
        let summary = event.activate(&mut ctx, &mut rolls).unwrap();

        assert_eq!(summary.end_time, GameTime::new(1, 3, 13, 1, 0));
        assert!(!event.is_expired(GameTime::new(1, 3, 12, 23, 45)));
        assert!(!event.is_expired(GameTime::new(1, 3, 13, 0, 59)));
        assert!(event.is_expired(GameTime::new(1, 3, 13, 1, 0)));
    }

    #[test]
    fn test_never_activated_never_expires() {
        assert!(!instance().is_expired(GameTime::new(99, 1, 1, 0, 0)));
    }

    #[test]
    fn test_concluding_choice_cleans_up() {
        let mut event = instance();
        let mut ctx = context();
        let mut rng = GameRng::new(3);
        event.activate(&mut ctx, &mut rng).unwrap();

        let result = event.process_choice(0, &mut ctx, &mut rng);
        assert!(result.success);
        assert!(result.concluded);
        assert_eq!(result.outcomes.len(), 1);
        assert_eq!(event.status(), EventStatus::Concluded);

        assert!(ctx.player.as_ref().unwrap().active_buffs.is_empty());
        assert!(ctx.world.as_ref().unwrap().visual_effects.is_empty());
        // notifications are a queue for the client, not cleaned up
        assert_eq!(ctx.ui.as_ref().unwrap().notifications.len(), 1);
        assert_eq!(ctx.player.as_ref().unwrap().cultivation.experience, 40);
    }

    #[test]
    fn test_invalid_choice_not_recorded() {
        let mut event = instance();
        let mut ctx = context();
        let mut rng = GameRng::new(3);
        event.activate(&mut ctx, &mut rng).unwrap();

        let result = event.process_choice(7, &mut ctx, &mut rng);
        assert!(!result.success);
        assert!(matches!(result.error, Some(EngineError::InvalidChoice { index: 7, available: 2 })));
        assert!(event.selected_choices().is_empty());
    }

    #[test]
    fn test_unmet_requirement_is_inert_but_recorded() {
        let mut event = instance();
        let mut ctx = context();
        let mut rng = GameRng::new(3);
        event.activate(&mut ctx, &mut rng).unwrap();
        let before = ctx.clone();

        let result = event.process_choice(1, &mut ctx, &mut rng);
        assert!(!result.success);
        assert!(matches!(result.error, Some(EngineError::RequirementNotMet { .. })));
        assert_eq!(ctx, before);
        assert_eq!(event.selected_choices(), &[1]);
        assert!(event.is_active());
    }

    #[test]
    fn test_choice_on_inactive_event() {
        let mut event = instance();
        let mut ctx = context();
        let result = event.process_choice(0, &mut ctx, &mut GameRng::new(1));
        assert!(matches!(result.error, Some(EngineError::EventNotActive { .. })));
    }

    #[test]
    fn test_expire_runs_cleanup() {
        let mut event = instance();
        let mut ctx = context();
        let mut rng = GameRng::new(3);
        event.activate(&mut ctx, &mut rng).unwrap();

        assert!(event.expire(&mut ctx));
        assert_eq!(event.status(), EventStatus::Expired);
        assert!(ctx.player.as_ref().unwrap().active_buffs.is_empty());
        assert!(!event.conclude(&mut ctx));
        assert!(matches!(
            event.activate(&mut ctx, &mut rng),
            Err(EngineError::Finished { .. })
        ));
    }

    #[test]
    fn test_activation_without_world_degrades() {
        let mut event = instance();
        let mut ctx = GameContext {
            player: Some(PlayerState::new(1)),
            ..GameContext::default()
        };
        let summary = event.activate(&mut ctx, &mut GameRng::new(5)).unwrap();
        assert_eq!(summary.start_time, GameTime::default());
        // buff still applied, visual effect and notification skipped
        assert_eq!(ctx.player.as_ref().unwrap().active_buffs.len(), 1);
    }

    #[test]
    fn test_escalate_non_conflict() {
        let mut event = instance();
        let mut ctx = context();
        let mut rng = GameRng::new(3);
        event.activate(&mut ctx, &mut rng).unwrap();
        assert!(!event.can_escalate(&mut rng));
        assert!(matches!(
            event.escalate(&mut ctx, &mut rng),
            Err(EngineError::NotAConflict { .. })
        ));
    }

    #[test]
    fn test_state_snapshot_roundtrip() {
        let mut event = instance();
        let mut ctx = context();
        let mut rng = GameRng::new(3);
        event.activate(&mut ctx, &mut rng).unwrap();
        event.process_choice(1, &mut ctx, &mut rng);

        let state = event.get_state();
        assert!(state.is_active);
        assert_eq!(state.selected_choices, vec![1]);
        assert_eq!(state.category, EventCategory::Nature);

        let bytes = state.encode().unwrap();
        assert_eq!(EventStateSnapshot::decode(&bytes).unwrap(), state);
    }
}
