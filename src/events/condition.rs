//! Event trigger conditions.
//!
//! A `ConditionSet` gates an event on player level and scales its trigger
//! chance by four independent modifier maps (season, day period, weather,
//! location type). `ConditionEvaluator` turns a set plus a `GameContext`
//! into an eligibility decision.
//!
//! ## Gating
//!
//! The running chance starts at the rarity's base chance. Every category
//! that can actually move the chance (at least one multiplier other than
//! 1.0) multiplies it by the current context's multiplier and then draws
//! its own sample; any sample above the running chance fails the check.
//! With no such category, one draw against the base chance decides.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{GameContext, RarityChances, Roller, Season};

use super::behavior::EventBehavior;
use super::definition::EventDefinition;

/// Coarse time-of-day bucket used by condition modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPeriod {
    /// 05:00-08:00
    Dawn,
    /// 08:00-12:00
    Morning,
    /// 12:00-14:00
    Noon,
    /// 14:00-18:00
    Afternoon,
    /// 18:00-21:00
    Evening,
    /// 21:00-01:00
    Night,
    /// 01:00-05:00
    DeepNight,
}

impl DayPeriod {
    /// Bucket an hour (0-23).
    #[must_use]
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=7 => Self::Dawn,
            8..=11 => Self::Morning,
            12..=13 => Self::Noon,
            14..=17 => Self::Afternoon,
            18..=20 => Self::Evening,
            21..=23 | 0 => Self::Night,
            _ => Self::DeepNight,
        }
    }

    /// Night or deep night.
    #[must_use]
    pub fn is_dark(self) -> bool {
        matches!(self, Self::Night | Self::DeepNight)
    }
}

/// Declarative gating conditions for an event definition.
///
/// Multiplier lookups never fail: keys that are not listed resolve to 1.0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionSet {
    #[serde(default)]
    pub min_level: Option<u32>,
    #[serde(default)]
    pub season: FxHashMap<Season, f64>,
    #[serde(default)]
    pub day_period: FxHashMap<DayPeriod, f64>,
    #[serde(default)]
    pub weather: FxHashMap<String, f64>,
    #[serde(default)]
    pub location_type: FxHashMap<String, f64>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_min_level(mut self, level: u32) -> Self {
        self.min_level = Some(level);
        self
    }

    #[must_use]
    pub fn with_season(mut self, season: Season, multiplier: f64) -> Self {
        self.season.insert(season, multiplier);
        self
    }

    #[must_use]
    pub fn with_day_period(mut self, period: DayPeriod, multiplier: f64) -> Self {
        self.day_period.insert(period, multiplier);
        self
    }

    #[must_use]
    pub fn with_weather(mut self, weather: impl Into<String>, multiplier: f64) -> Self {
        self.weather.insert(weather.into(), multiplier);
        self
    }

    #[must_use]
    pub fn with_location_type(mut self, location_type: impl Into<String>, multiplier: f64) -> Self {
        self.location_type.insert(location_type.into(), multiplier);
        self
    }

    pub fn season_multiplier(&self, season: Season) -> f64 {
        self.season.get(&season).copied().unwrap_or(1.0)
    }

    pub fn day_period_multiplier(&self, period: DayPeriod) -> f64 {
        self.day_period.get(&period).copied().unwrap_or(1.0)
    }

    pub fn weather_multiplier(&self, weather: &str) -> f64 {
        self.weather.get(weather).copied().unwrap_or(1.0)
    }

    pub fn location_multiplier(&self, location_type: &str) -> f64 {
        self.location_type.get(location_type).copied().unwrap_or(1.0)
    }

    /// Multipliers of every category that can change the chance, in
    /// evaluation order (season, day period, weather, location type).
    ///
    /// A context value that is missing (no world, no location) looks up as 1.0.
    #[must_use]
    pub fn active_multipliers(&self, ctx: &GameContext) -> Vec<f64> {
        let world = ctx.world.as_ref();
        let location = ctx.player.as_ref().and_then(|p| p.location.as_ref());

        let mut multipliers = Vec::with_capacity(4);
        if is_active(&self.season) {
            multipliers.push(world.map_or(1.0, |w| self.season_multiplier(w.season)));
        }
        if is_active(&self.day_period) {
            multipliers.push(world.map_or(1.0, |w| {
                self.day_period_multiplier(DayPeriod::from_hour(w.time.hour))
            }));
        }
        if is_active(&self.weather) {
            multipliers.push(world.map_or(1.0, |w| self.weather_multiplier(&w.weather)));
        }
        if is_active(&self.location_type) {
            multipliers.push(location.map_or(1.0, |l| self.location_multiplier(&l.location_type)));
        }
        multipliers
    }
}

fn is_active<K>(map: &FxHashMap<K, f64>) -> bool {
    map.values().any(|&m| m != 1.0)
}

/// Evaluator for event conditions.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Check the level gate only.
    #[must_use]
    pub fn meets_level(def: &EventDefinition, ctx: &GameContext) -> bool {
        match def.conditions.min_level {
            None => true,
            Some(min) => ctx.player_level().is_some_and(|level| level >= min),
        }
    }

    /// Combined trigger probability: base chance times every multiplier.
    ///
    /// This is informational; `is_eligible` gates each category separately.
    #[must_use]
    pub fn trigger_probability(def: &EventDefinition, ctx: &GameContext, chances: &RarityChances) -> f64 {
        if !Self::meets_level(def, ctx) {
            return 0.0;
        }
        def.conditions
            .active_multipliers(ctx)
            .into_iter()
            .fold(chances.for_rarity(def.rarity), |chance, m| chance * m)
            .clamp(0.0, 1.0)
    }

    /// Decide whether the event triggers now.
    pub fn is_eligible(
        def: &EventDefinition,
        ctx: &GameContext,
        chances: &RarityChances,
        rng: &mut dyn Roller,
    ) -> bool {
        if !Self::meets_level(def, ctx) {
            return false;
        }

        let mut chance = chances.for_rarity(def.rarity);
        let multipliers = def.conditions.active_multipliers(ctx);

        if multipliers.is_empty() {
            return rng.roll() <= chance;
        }

        for multiplier in multipliers {
            chance *= multiplier;
            if rng.roll() > chance {
                return false;
            }
        }
        true
    }

    /// `is_eligible` followed by the behavior's own gate.
    pub fn is_eligible_with(
        def: &EventDefinition,
        behavior: &dyn EventBehavior,
        ctx: &GameContext,
        chances: &RarityChances,
        rng: &mut dyn Roller,
    ) -> bool {
        Self::is_eligible(def, ctx, chances, rng) && behavior.additional_conditions(def, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameRng, GameTime, PlayerState, ScriptedRolls, WorldState};
    use crate::events::{EventCategory, Rarity};

    fn ctx_at(level: u32, hour: u32, season: Season, weather: &str) -> GameContext {
        GameContext::new(
            PlayerState::new(level).with_location("azure_valley", "forest"),
            WorldState::new(GameTime::at(hour, 0), season, weather),
        )
    }

    #[test]
    fn test_day_period_buckets() {
        assert_eq!(DayPeriod::from_hour(5), DayPeriod::Dawn);
        assert_eq!(DayPeriod::from_hour(7), DayPeriod::Dawn);
        assert_eq!(DayPeriod::from_hour(8), DayPeriod::Morning);
        assert_eq!(DayPeriod::from_hour(12), DayPeriod::Noon);
        assert_eq!(DayPeriod::from_hour(14), DayPeriod::Afternoon);
        assert_eq!(DayPeriod::from_hour(18), DayPeriod::Evening);
        assert_eq!(DayPeriod::from_hour(21), DayPeriod::Night);
        assert_eq!(DayPeriod::from_hour(0), DayPeriod::Night);
        assert_eq!(DayPeriod::from_hour(1), DayPeriod::DeepNight);
        assert_eq!(DayPeriod::from_hour(4), DayPeriod::DeepNight);
    }

    #[test]
    fn test_missing_keys_default_to_one() {
        let set = ConditionSet::new().with_season(Season::Winter, 2.0);
        assert_eq!(set.season_multiplier(Season::Summer), 1.0);
        assert_eq!(set.weather_multiplier("fog"), 1.0);
        assert_eq!(set.location_multiplier("swamp"), 1.0);
        assert_eq!(set.day_period_multiplier(DayPeriod::Noon), 1.0);
    }

    #[test]
    fn test_level_gate_rejects_without_rolling() {
        let def = EventDefinition::new("e", "E", EventCategory::Combat)
            .with_conditions(ConditionSet::new().with_min_level(10));
        let ctx = ctx_at(5, 10, Season::Spring, "clear");
        let mut rolls = ScriptedRolls::constant(0.0);

        assert!(!ConditionEvaluator::is_eligible(&def, &ctx, &RarityChances::default(), &mut rolls));
        assert_eq!(rolls.consumed(), 0);
    }

    #[test]
    fn test_no_player_fails_level_gate() {
        let def = EventDefinition::new("e", "E", EventCategory::Combat)
            .with_conditions(ConditionSet::new().with_min_level(1));
        assert!(!ConditionEvaluator::meets_level(&def, &GameContext::default()));
    }

    #[test]
    fn test_unit_multipliers_reduce_to_single_draw() {
        let conditions = ConditionSet::new()
            .with_season(Season::Winter, 1.0)
            .with_day_period(DayPeriod::Night, 1.0)
            .with_weather("rain", 1.0)
            .with_location_type("forest", 1.0);
        let def = EventDefinition::new("e", "E", EventCategory::Nature)
            .with_rarity(Rarity::Common)
            .with_conditions(conditions);
        let chances = RarityChances::default();

        for (hour, season, weather) in [
            (3, Season::Winter, "rain"),
            (13, Season::Summer, "clear"),
        ] {
            let ctx = ctx_at(1, hour, season, weather);

            let mut pass = ScriptedRolls::constant(0.09);
            assert!(ConditionEvaluator::is_eligible(&def, &ctx, &chances, &mut pass));
            assert_eq!(pass.consumed(), 1);

            let mut fail = ScriptedRolls::constant(0.11);
            assert!(!ConditionEvaluator::is_eligible(&def, &ctx, &chances, &mut fail));
            assert_eq!(fail.consumed(), 1);
        }
    }

    #[test]
    fn test_each_category_draws_independently() {
        let conditions = ConditionSet::new()
            .with_season(Season::Winter, 2.0)
            .with_weather("snow", 3.0);
        let def = EventDefinition::new("e", "E", EventCategory::Nature)
            .with_rarity(Rarity::Common)
            .with_conditions(conditions);
        let ctx = ctx_at(1, 10, Season::Winter, "snow");
        let chances = RarityChances::default();

        // season gate: chance 0.2, weather gate: chance 0.6
        let mut rolls = ScriptedRolls::new([0.19, 0.59]);
        assert!(ConditionEvaluator::is_eligible(&def, &ctx, &chances, &mut rolls));
        assert_eq!(rolls.consumed(), 2);

        // first gate fails, second never drawn
        let mut rolls = ScriptedRolls::new([0.21, 0.0]);
        assert!(!ConditionEvaluator::is_eligible(&def, &ctx, &chances, &mut rolls));
        assert_eq!(rolls.consumed(), 1);

        // second gate fails
        let mut rolls = ScriptedRolls::new([0.1, 0.61]);
        assert!(!ConditionEvaluator::is_eligible(&def, &ctx, &chances, &mut rolls));
    }

    #[test]
    fn test_trigger_probability() {
        let conditions = ConditionSet::new()
            .with_day_period(DayPeriod::Night, 4.0)
            .with_location_type("forest", 0.5);
        let def = EventDefinition::new("e", "E", EventCategory::Combat)
            .with_rarity(Rarity::Uncommon)
            .with_conditions(conditions);
        let ctx = ctx_at(1, 22, Season::Autumn, "clear");

        let p = ConditionEvaluator::trigger_probability(&def, &ctx, &RarityChances::default());
        assert!((p - 0.05 * 4.0 * 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_eligibility_rate_tracks_base_chance() {
        let def = EventDefinition::new("e", "E", EventCategory::Nature).with_rarity(Rarity::Common);
        let ctx = ctx_at(1, 10, Season::Spring, "clear");
        let chances = RarityChances::default();
        let mut rng = GameRng::new(99);

        let trials = 20_000;
        let hits = (0..trials)
            .filter(|_| ConditionEvaluator::is_eligible(&def, &ctx, &chances, &mut rng))
            .count();
        let rate = hits as f64 / trials as f64;
        assert!((rate - 0.10).abs() < 0.01, "rate was {rate}");
    }
}
