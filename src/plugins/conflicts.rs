//! Conflict plugin: bandit attacks and demonic cultivator incursions.
//!
//! Both events run on `ConflictEscalationManager`; the plugin also publishes
//! the conflict settings the spawn check reads.

use super::registry::{EventPlugin, EventType};
use crate::conflicts::{BanditAttack, ConflictEscalationManager, ConflictScale, ConflictSettings, DemonicCultivators};
use crate::core::NotificationKind;
use crate::events::{DurationRange, EffectSpec, EventCategory, EventDefinition, Rarity};

pub const BANDIT_ATTACK: &str = "bandit_attack";
pub const DEMONIC_CULTIVATORS: &str = "demonic_cultivators";

pub fn plugin(settings: &ConflictSettings) -> EventPlugin {
    let bandit_settings = settings.clone();
    let demonic_settings = settings.clone();
    EventPlugin::new("conflicts", "World Conflicts")
        .with_event(EventType::new(bandit_attack(settings), move || {
            Box::new(ConflictEscalationManager::new(
                Box::new(BanditAttack::new()),
                bandit_settings.clone(),
            ))
        }))
        .with_event(EventType::new(demonic_cultivators(settings), move || {
            Box::new(ConflictEscalationManager::new(
                Box::new(DemonicCultivators::new()),
                demonic_settings.clone(),
            ))
        }))
        .with_conflict_settings(settings.clone())
}

/// Local-scale window; escalation extends the instance to the conflict's
/// own expiration.
fn local_window(settings: &ConflictSettings) -> DurationRange {
    let minutes = settings.scale(ConflictScale::Local).duration_minutes;
    DurationRange::new(minutes, minutes)
}

pub fn bandit_attack(settings: &ConflictSettings) -> EventDefinition {
    EventDefinition::new(BANDIT_ATTACK, "Bandit Attack", EventCategory::Conflict)
        .with_description("Armed bandits prey on travelers along the road.")
        .with_rarity(Rarity::Uncommon)
        .with_duration(local_window(settings))
        .with_effect(EffectSpec::AtmosphericEffect {
            kind: "tension".into(),
            description: "Travelers hurry past with lowered eyes.".into(),
        })
}

pub fn demonic_cultivators(settings: &ConflictSettings) -> EventDefinition {
    EventDefinition::new(DEMONIC_CULTIVATORS, "Demonic Cultivators", EventCategory::Conflict)
        .with_description("Practitioners of forbidden arts spread corruption through the land.")
        .with_rarity(Rarity::Rare)
        .with_duration(local_window(settings))
        .with_effect(EffectSpec::Notification {
            title: "Demonic Qi".into(),
            message: "A foul, blood-scented qi drifts on the wind.".into(),
            kind: NotificationKind::Warning,
        })
}
