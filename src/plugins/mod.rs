//! Event plugins and the registry they register into.
//!
//! ## Key Types
//!
//! - `EventRegistry`: catalog of event types, eligibility and cooldowns
//! - `EventType`: definition plus behavior factory
//! - `EventPlugin`: named bundle of event types with optional metadata
//!
//! ## Built-in plugins
//!
//! - `combat`: spirit beast ambush
//! - `social`: wandering merchant fair
//! - `nature`: spirit rain
//! - `cycle`: lunar blessing
//! - `conflicts`: bandit attack, demonic cultivators

pub mod registry;
pub mod combat;
pub mod social;
pub mod nature;
pub mod cycle;
pub mod conflicts;

pub use registry::{
    BehaviorFactory, EventPlugin, EventRegistry, EventType, PluginInfo, PluginMetadata, RegistrationFailure,
    RegistrationReport,
};
pub use cycle::{calculate_days_to_next_phase, days_since_phase_start, determine_current_phase, LunarPhase};

use tracing::{info, warn};

/// Every built-in plugin, with conflict settings taken from `settings`.
#[must_use]
pub fn builtin_plugins(settings: &crate::conflicts::ConflictSettings) -> Vec<EventPlugin> {
    vec![
        combat::plugin(),
        social::plugin(),
        nature::plugin(),
        cycle::plugin(),
        conflicts::plugin(settings),
    ]
}

/// Register every built-in plugin.
///
/// Never fails: a plugin or event that cannot be registered is logged and
/// listed in the report, and registration carries on with the rest.
pub fn register_all_event_plugins(registry: &mut EventRegistry) -> RegistrationReport {
    let plugins = builtin_plugins(&registry.config().conflicts);
    let mut report = RegistrationReport::default();
    for plugin in plugins {
        report.merge(registry.register_plugin(plugin));
    }

    if report.is_clean() {
        info!(events = report.registered.len(), "event plugins registered");
    } else {
        warn!(
            events = report.registered.len(),
            failures = report.failures.len(),
            "event plugins registered with failures"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all() {
        let mut registry = EventRegistry::new();
        let report = register_all_event_plugins(&mut registry);

        assert!(report.is_clean());
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.plugins().len(), 5);
        for id in ["spirit_beast_ambush", "wandering_merchant_fair", "spirit_rain", "lunar_blessing", "bandit_attack", "demonic_cultivators"] {
            assert!(registry.contains(id), "{id}");
        }
    }

    #[test]
    fn test_register_all_twice_reports_duplicates() {
        let mut registry = EventRegistry::new();
        register_all_event_plugins(&mut registry);
        let second = register_all_event_plugins(&mut registry);

        assert!(second.registered.is_empty());
        assert_eq!(second.failures.len(), 6);
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn test_conflict_instances_are_conflicts() {
        let mut registry = EventRegistry::new();
        register_all_event_plugins(&mut registry);

        let bandits = registry.instantiate("bandit_attack").unwrap();
        assert!(bandits.behavior().as_conflict().is_some());
        let rain = registry.instantiate("spirit_rain").unwrap();
        assert!(rain.behavior().as_conflict().is_none());
        assert!(registry.instantiate_conflict("spirit_rain", crate::conflicts::ConflictScale::Regional).is_err());
    }
}
