//! Property tests for gating, durations, escalation, reward scaling and the
//! lunar cycle.

use std::sync::Arc;

use proptest::prelude::*;

use cultivation_events::conflicts::{
    BanditAttack, ConflictEscalationManager, ConflictScale, ConflictSettings, DemonicCultivators,
};
use cultivation_events::core::{GameContext, GameRng, GameTime, PlayerState, RarityChances, ScriptedRolls, Season, WorldState};
use cultivation_events::events::{
    ConditionEvaluator, ConditionSet, DayPeriod, DefaultBehavior, DurationRange, EventCategory, EventDefinition,
    EventInstance, Rarity,
};
use cultivation_events::plugins::{calculate_days_to_next_phase, days_since_phase_start, determine_current_phase, LunarPhase};
use cultivation_events::EngineError;

const SEASONS: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];
const WEATHER: [&str; 4] = ["clear", "rain", "storm", "snow"];
const LOCATIONS: [&str; 4] = ["forest", "mountain", "city", "village"];
const RARITIES: [Rarity; 5] = [Rarity::Common, Rarity::Uncommon, Rarity::Rare, Rarity::Epic, Rarity::Legendary];

fn neutral_conditions() -> ConditionSet {
    let mut conditions = ConditionSet::new();
    for season in SEASONS {
        conditions = conditions.with_season(season, 1.0);
    }
    for weather in WEATHER {
        conditions = conditions.with_weather(weather, 1.0);
    }
    for location in LOCATIONS {
        conditions = conditions.with_location_type(location, 1.0);
    }
    conditions.with_day_period(DayPeriod::Night, 1.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Neutral multipliers reduce eligibility to one draw at the base chance.
    #[test]
    fn prop_neutral_conditions_single_draw(
        rarity in 0usize..5,
        season in 0usize..4,
        weather in 0usize..4,
        location in 0usize..4,
        hour in 0u32..24,
        sample in 0.0f64..1.0,
    ) {
        let def = EventDefinition::new("neutral", "Neutral", EventCategory::Nature)
            .with_rarity(RARITIES[rarity])
            .with_conditions(neutral_conditions());
        let ctx = GameContext::new(
            PlayerState::new(1).with_location("somewhere", LOCATIONS[location]),
            WorldState::new(GameTime::at(hour, 0), SEASONS[season], WEATHER[weather]),
        );
        let chances = RarityChances::default();

        let mut rolls = ScriptedRolls::constant(sample);
        let eligible = ConditionEvaluator::is_eligible(&def, &ctx, &chances, &mut rolls);

        prop_assert_eq!(rolls.consumed(), 1);
        prop_assert_eq!(eligible, sample <= chances.for_rarity(RARITIES[rarity]));
    }

    /// The activation window always lies inside the duration range.
    #[test]
    fn prop_duration_within_range(
        min in 1u32..600,
        extra in 0u32..600,
        seed in any::<u64>(),
        hour in 0u32..24,
        minute in 0u32..60,
    ) {
        let def = EventDefinition::new("timed", "Timed", EventCategory::Nature)
            .with_duration(DurationRange::new(min, min + extra));
        let mut instance = EventInstance::new(Arc::new(def), Box::new(DefaultBehavior));
        let mut ctx = GameContext::new(
            PlayerState::new(1),
            WorldState::new(GameTime::new(1, 12, 30, hour, minute), Season::Winter, "snow"),
        );

        let summary = instance.activate(&mut ctx, &mut GameRng::new(seed)).unwrap();
        let minutes = summary.start_time.minutes_until(&summary.end_time);
        prop_assert!(summary.end_time > summary.start_time);
        prop_assert!((min..=min + extra).contains(&(minutes as u32)));
        prop_assert!(!instance.is_expired(summary.start_time));
        prop_assert!(instance.is_expired(summary.end_time));
    }

    /// Lunar phases are a pure function of the date and the two day
    /// counters always span one full cycle.
    #[test]
    fn prop_lunar_cycle_determinism(day in 1u32..=30, month in 1u32..=12, phase in 0usize..8) {
        let first = determine_current_phase(day, month);
        prop_assert_eq!(first, determine_current_phase(day, month));

        let phase = LunarPhase::ALL[phase];
        prop_assert_eq!(
            calculate_days_to_next_phase(phase, day, month) + days_since_phase_start(phase, day, month),
            28
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Escalation visits local, regional, global in order and stops there.
    #[test]
    fn prop_escalation_is_monotonic(seed in any::<u64>(), level in 1u32..80, demonic in any::<bool>()) {
        let registry_id = if demonic { "demonic_cultivators" } else { "bandit_attack" };
        let mut registry = cultivation_events::EventRegistry::new();
        cultivation_events::register_all_event_plugins(&mut registry);

        let mut ctx = GameContext::new(
            PlayerState::new(level).with_location("misty_pass", "mountain"),
            WorldState::new(GameTime::at(8, 0), Season::Spring, "clear"),
        );
        let mut rng = GameRng::new(seed);
        let mut instance = registry.instantiate(registry_id).unwrap();
        instance.activate(&mut ctx, &mut rng).unwrap();

        let mut visited = vec![instance.conflict().unwrap().scale];
        loop {
            match instance.escalate(&mut ctx, &mut rng) {
                Ok(next) => visited.push(next.scale),
                Err(err) => {
                    prop_assert_eq!(err, EngineError::MaxScaleReached);
                    break;
                }
            }
        }

        prop_assert_eq!(visited, ConflictScale::ALL.to_vec());
        for sample in [0.0, 0.5, 0.999] {
            prop_assert!(!instance.can_escalate(&mut ScriptedRolls::constant(sample)));
        }
    }
}

/// Reward multipliers are exact for every level and both conflict types.
#[test]
fn test_reward_scaling_is_exact() {
    let settings = ConflictSettings::default();
    let managers = [
        ConflictEscalationManager::new(Box::new(BanditAttack::new()), settings.clone()),
        ConflictEscalationManager::new(Box::new(DemonicCultivators::new()), settings),
    ];
    for manager in &managers {
        for level in 1..=100 {
            let local = manager.rewards_for(ConflictScale::Local, level).experience;
            let regional = manager.rewards_for(ConflictScale::Regional, level).experience;
            let global = manager.rewards_for(ConflictScale::Global, level).experience;
            assert_eq!(regional * 2, local * 5, "level {level}");
            assert_eq!(global, local * 5, "level {level}");
        }
    }
}
