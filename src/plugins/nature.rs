//! Nature plugin: spirit rain.
//!
//! Entirely data-driven: ambient effects come from the definition and every
//! result tag has a default handler, so it runs on `DefaultBehavior`.

use super::registry::{EventPlugin, EventType};
use crate::core::{NotificationKind, Season};
use crate::events::{
    ChoiceSpec, ConditionSet, DurationRange, EffectSpec, EventCategory, EventDefinition, Rarity, ResultSpec,
};

pub const SPIRIT_RAIN: &str = "spirit_rain";

pub fn plugin() -> EventPlugin {
    EventPlugin::new("nature", "Natural Phenomena").with_event(EventType::simple(spirit_rain()))
}

pub fn spirit_rain() -> EventDefinition {
    EventDefinition::new(SPIRIT_RAIN, "Spirit Rain", EventCategory::Nature)
        .with_description("Rain thick with spiritual energy falls from a clear sky.")
        .with_rarity(Rarity::Uncommon)
        .with_duration(DurationRange::new(30, 90))
        .with_cooldown_days(1)
        .with_conditions(
            ConditionSet::new()
                .with_weather("rain", 3.0)
                .with_weather("storm", 1.5)
                .with_weather("clear", 0.5)
                .with_season(Season::Spring, 1.5)
                .with_season(Season::Summer, 1.2)
                .with_season(Season::Winter, 0.3),
        )
        .with_effect(EffectSpec::Notification {
            title: "Spirit Rain".into(),
            message: "Spiritual energy saturates the air.".into(),
            kind: NotificationKind::Event,
        })
        .with_effect(EffectSpec::VisualEffect {
            kind: "spirit_rain".into(),
            intensity: 0.7,
        })
        .with_effect(EffectSpec::AtmosphericEffect {
            kind: "petrichor".into(),
            description: "The air smells of wet stone and ginseng.".into(),
        })
        .with_effect(EffectSpec::TemporaryBuff {
            name: "spirit_rain".into(),
            stat: "cultivation_speed".into(),
            multiplier: 1.5,
        })
        .with_choice(
            ChoiceSpec::new("meditate", "Meditate in the rain")
                .with_result(ResultSpec::Meditation { potency: 1.5 })
                .concludes(),
        )
        .with_choice(
            ChoiceSpec::new("collect_dew", "Collect the spirit dew")
                .with_result(ResultSpec::Item {
                    item_id: "spirit_dew".into(),
                    name: "Spirit Dew".into(),
                    quantity: 2,
                })
                .concludes(),
        )
        .with_choice(ChoiceSpec::new("ignore", "Carry on with your day").concludes())
}
