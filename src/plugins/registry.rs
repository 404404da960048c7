//! Event type registry.
//!
//! The `EventRegistry` is the in-memory catalog of event types a scheduler
//! draws from. Event types arrive one at a time through `register_event` or
//! in named bundles through `register_plugin`; a failing registration is
//! logged and reported but never stops the rest.
//!
//! ## Example
//!
//! ```
//! use cultivation_events::events::{EventCategory, EventDefinition};
//! use cultivation_events::plugins::{EventRegistry, EventType};
//!
//! let mut registry = EventRegistry::new();
//! let rain = EventDefinition::new("spirit_rain", "Spirit Rain", EventCategory::Nature);
//! registry.register_event(EventType::simple(rain.clone())).unwrap();
//!
//! assert!(registry.contains("spirit_rain"));
//! assert!(registry.register_event(EventType::simple(rain)).is_err());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::conflicts::{
    check_conflict_conditions, ConflictScale, ConflictSettings, ConflictSpawnCheck, ConflictTracker,
};
use crate::core::{EngineConfig, EngineError, EngineResult, GameContext, GameTime, Roller};
use crate::events::{
    ConditionEvaluator, DefaultBehavior, EventBehavior, EventCategory, EventDefinition, EventId, EventInstance,
};

/// Builds a fresh behavior for each new instance.
pub type BehaviorFactory = Arc<dyn Fn() -> Box<dyn EventBehavior> + Send + Sync>;

/// A registrable event type: a definition plus the behavior it runs with.
#[derive(Clone)]
pub struct EventType {
    pub definition: Arc<EventDefinition>,
    factory: BehaviorFactory,
}

impl EventType {
    /// A purely data-driven event type.
    #[must_use]
    pub fn simple(definition: EventDefinition) -> Self {
        Self::new(definition, || Box::new(DefaultBehavior))
    }

    pub fn new<F>(definition: EventDefinition, factory: F) -> Self
    where
        F: Fn() -> Box<dyn EventBehavior> + Send + Sync + 'static,
    {
        Self {
            definition: Arc::new(definition),
            factory: Arc::new(factory),
        }
    }

    #[must_use]
    pub fn id(&self) -> &EventId {
        &self.definition.id
    }

    #[must_use]
    pub fn behavior(&self) -> Box<dyn EventBehavior> {
        (self.factory)()
    }

    /// A new inactive instance of this type.
    #[must_use]
    pub fn instantiate(&self) -> EventInstance {
        EventInstance::new(Arc::clone(&self.definition), self.behavior())
    }
}

impl std::fmt::Debug for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventType")
            .field("id", &self.definition.id)
            .finish_non_exhaustive()
    }
}

/// Metadata a plugin publishes alongside its events.
#[derive(Clone, Debug, Default)]
pub struct PluginMetadata {
    /// Scale, duration, reward and spawn settings of a conflict plugin.
    pub conflict: Option<ConflictSettings>,
}

/// A named bundle of event types.
#[derive(Clone, Debug)]
pub struct EventPlugin {
    pub id: String,
    pub name: String,
    pub events: Vec<EventType>,
    pub metadata: PluginMetadata,
}

impl EventPlugin {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            events: Vec::new(),
            metadata: PluginMetadata::default(),
        }
    }

    /// Add an event type (builder pattern).
    #[must_use]
    pub fn with_event(mut self, event: EventType) -> Self {
        self.events.push(event);
        self
    }

    /// Publish conflict settings (builder pattern).
    #[must_use]
    pub fn with_conflict_settings(mut self, settings: ConflictSettings) -> Self {
        self.metadata.conflict = Some(settings);
        self
    }
}

/// What a registered plugin contributed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginInfo {
    pub id: String,
    pub name: String,
    pub event_ids: Vec<EventId>,
}

/// A registration that did not go through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationFailure {
    pub plugin_id: String,
    pub error: EngineError,
}

/// Outcome of a bulk registration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    pub registered: Vec<EventId>,
    pub failures: Vec<RegistrationFailure>,
}

impl RegistrationReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: RegistrationReport) {
        self.registered.extend(other.registered);
        self.failures.extend(other.failures);
    }
}

/// Catalog of event types, in registration order.
#[derive(Debug, Default)]
pub struct EventRegistry {
    config: EngineConfig,
    events: Vec<EventType>,
    index: FxHashMap<EventId, usize>,
    plugins: Vec<PluginInfo>,
    conflict_settings: Option<ConflictSettings>,
    /// Game day each event last triggered on, for cooldowns.
    last_triggered: FxHashMap<EventId, u64>,
    /// Instances handed out so far; keeps instance ids unique.
    instances_created: AtomicU64,
}

impl EventRegistry {
    /// An empty registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // === Registration ===

    /// Add one event type.
    ///
    /// Fails on an invalid definition or an id that is already taken.
    pub fn register_event(&mut self, event: EventType) -> EngineResult<()> {
        let id = event.id().clone();
        event
            .definition
            .validate()
            .map_err(|reason| EngineError::InvalidDefinition {
                event_id: id.to_string(),
                reason,
            })?;
        if self.index.contains_key(&id) {
            return Err(EngineError::DuplicateEvent {
                event_id: id.to_string(),
            });
        }

        debug!(event = %id, "event type registered");
        self.index.insert(id, self.events.len());
        self.events.push(event);
        Ok(())
    }

    /// Register every event of a plugin, isolating failures.
    pub fn register_plugin(&mut self, plugin: EventPlugin) -> RegistrationReport {
        let mut report = RegistrationReport::default();
        let mut event_ids = Vec::new();

        for event in plugin.events {
            let id = event.id().clone();
            match self.register_event(event) {
                Ok(()) => {
                    event_ids.push(id.clone());
                    report.registered.push(id);
                }
                Err(error) => {
                    warn!(plugin = %plugin.id, event = %id, %error, "event registration failed");
                    report.failures.push(RegistrationFailure {
                        plugin_id: plugin.id.clone(),
                        error,
                    });
                }
            }
        }

        if let Some(settings) = plugin.metadata.conflict {
            match settings.validate() {
                Ok(()) => self.conflict_settings = Some(settings),
                Err(error) => {
                    warn!(plugin = %plugin.id, %error, "conflict settings rejected");
                    report.failures.push(RegistrationFailure {
                        plugin_id: plugin.id.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            plugin = %plugin.id,
            registered = event_ids.len(),
            failed = report.failures.len(),
            "plugin registered"
        );
        self.plugins.push(PluginInfo {
            id: plugin.id,
            name: plugin.name,
            event_ids,
        });
        report
    }

    // === Lookup ===

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&EventType> {
        self.index.get(&EventId::new(id)).map(|&i| &self.events[i])
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(&EventId::new(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &EventType> {
        self.events.iter()
    }

    #[must_use]
    pub fn plugins(&self) -> &[PluginInfo] {
        &self.plugins
    }

    /// A new inactive instance of a registered type.
    pub fn instantiate(&self, id: &str) -> EngineResult<EventInstance> {
        self.get(id)
            .map(|event| event.instantiate().with_sequence(self.next_sequence()))
            .ok_or_else(|| EngineError::UnknownEvent {
                event_id: id.to_string(),
            })
    }

    /// A new inactive conflict instance that activates at `scale`.
    pub fn instantiate_conflict(&self, id: &str, scale: ConflictScale) -> EngineResult<EventInstance> {
        let event = self.get(id).ok_or_else(|| EngineError::UnknownEvent {
            event_id: id.to_string(),
        })?;
        let mut behavior = event.behavior();
        behavior
            .as_conflict_mut()
            .ok_or_else(|| EngineError::NotAConflict {
                event_id: id.to_string(),
            })?
            .set_initial_scale(scale);
        Ok(EventInstance::new(Arc::clone(&event.definition), behavior).with_sequence(self.next_sequence()))
    }

    fn next_sequence(&self) -> u64 {
        self.instances_created.fetch_add(1, Ordering::Relaxed)
    }

    // === Scheduling support ===

    /// Note that an event triggered at `now`, starting its cooldown.
    pub fn record_trigger(&mut self, id: &EventId, now: GameTime) {
        self.last_triggered.insert(id.clone(), now.day_number());
    }

    /// True while an event's cooldown since its last trigger is running.
    #[must_use]
    pub fn is_on_cooldown(&self, definition: &EventDefinition, now: GameTime) -> bool {
        match self.last_triggered.get(&definition.id) {
            Some(&day) => now.day_number().saturating_sub(day) < u64::from(definition.cooldown_days),
            None => false,
        }
    }

    /// Event types that pass their conditions right now, in registration order.
    ///
    /// Conflict events are left out; they spawn through
    /// `check_conflict_conditions`.
    pub fn eligible_events(&self, ctx: &GameContext, rng: &mut dyn Roller) -> Vec<EventId> {
        let now = ctx.now();
        self.events
            .iter()
            .filter(|event| event.definition.category != EventCategory::Conflict)
            .filter(|event| !now.is_some_and(|t| self.is_on_cooldown(&event.definition, t)))
            .filter(|event| {
                let behavior = event.behavior();
                ConditionEvaluator::is_eligible_with(
                    &event.definition,
                    behavior.as_ref(),
                    ctx,
                    &self.config.base_chances,
                    rng,
                )
            })
            .map(|event| event.id().clone())
            .collect()
    }

    /// Conflict settings published by a plugin, or the configured ones.
    #[must_use]
    pub fn conflict_settings(&self) -> &ConflictSettings {
        self.conflict_settings.as_ref().unwrap_or(&self.config.conflicts)
    }

    /// Daily conflict spawn check with the registered conflict settings.
    pub fn check_conflict_conditions(
        &self,
        ctx: &GameContext,
        tracker: &ConflictTracker,
        rng: &mut dyn Roller,
    ) -> ConflictSpawnCheck {
        check_conflict_conditions(ctx, tracker, self.conflict_settings(), rng)
    }
}
