//! Cycle plugin: the lunar blessing.
//!
//! The moon runs a 28-day cycle through eight phases. Phases are derived
//! purely from the calendar day, so any two calls for the same day and month
//! agree. The blessing only appears at night under a new or full moon.
//!
//! ## Phase starts (cycle day)
//!
//! | Phase           | Start |
//! |-----------------|-------|
//! | New moon        | 0     |
//! | Waxing crescent | 3     |
//! | First quarter   | 7     |
//! | Waxing gibbous  | 10    |
//! | Full moon       | 14    |
//! | Waning gibbous  | 17    |
//! | Last quarter    | 21    |
//! | Waning crescent | 24    |

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::registry::{EventPlugin, EventType};
use crate::core::{ActiveBuff, AtmosphericEffect, EngineError, GameContext, Roller, DAYS_PER_MONTH};
use crate::events::{
    ActivationScope, ChoiceSpec, DayPeriod, DurationRange, EventBehavior, EventCategory, EventDefinition, Rarity,
    ResultSpec,
};

pub const LUNAR_BLESSING: &str = "lunar_blessing";

/// Days in one lunar cycle.
pub const LUNAR_CYCLE_DAYS: u32 = 28;

/// Phase of the moon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LunarPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl LunarPhase {
    /// All phases in cycle order.
    pub const ALL: [LunarPhase; 8] = [
        Self::NewMoon,
        Self::WaxingCrescent,
        Self::FirstQuarter,
        Self::WaxingGibbous,
        Self::FullMoon,
        Self::WaningGibbous,
        Self::LastQuarter,
        Self::WaningCrescent,
    ];

    /// Cycle day this phase begins on.
    #[must_use]
    pub fn start_day(self) -> u32 {
        match self {
            Self::NewMoon => 0,
            Self::WaxingCrescent => 3,
            Self::FirstQuarter => 7,
            Self::WaxingGibbous => 10,
            Self::FullMoon => 14,
            Self::WaningGibbous => 17,
            Self::LastQuarter => 21,
            Self::WaningCrescent => 24,
        }
    }

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::NewMoon => "new_moon",
            Self::WaxingCrescent => "waxing_crescent",
            Self::FirstQuarter => "first_quarter",
            Self::WaxingGibbous => "waxing_gibbous",
            Self::FullMoon => "full_moon",
            Self::WaningGibbous => "waning_gibbous",
            Self::LastQuarter => "last_quarter",
            Self::WaningCrescent => "waning_crescent",
        }
    }

    /// Whether the blessing can appear in this phase.
    #[must_use]
    pub fn is_blessed(self) -> bool {
        matches!(self, Self::NewMoon | Self::FullMoon)
    }

    /// Meditation potency under this moon.
    #[must_use]
    pub fn potency(self) -> f64 {
        match self {
            Self::FullMoon => 2.0,
            Self::NewMoon => 1.5,
            Self::FirstQuarter | Self::LastQuarter => 1.2,
            _ => 1.0,
        }
    }
}

impl std::fmt::Display for LunarPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Position in the lunar cycle (0-27) for a day of the month and a month (1-based).
#[must_use]
pub fn cycle_day(day: u32, month: u32) -> u32 {
    let day_of_year = month.saturating_sub(1) * DAYS_PER_MONTH + day.saturating_sub(1);
    day_of_year % LUNAR_CYCLE_DAYS
}

/// Phase of the moon on a calendar day.
#[must_use]
pub fn determine_current_phase(day: u32, month: u32) -> LunarPhase {
    let today = cycle_day(day, month);
    LunarPhase::ALL
        .into_iter()
        .rev()
        .find(|phase| phase.start_day() <= today)
        .unwrap_or(LunarPhase::NewMoon)
}

/// Days since `phase` last began (0..=27).
#[must_use]
pub fn days_since_phase_start(phase: LunarPhase, day: u32, month: u32) -> u32 {
    (cycle_day(day, month) + LUNAR_CYCLE_DAYS - phase.start_day()) % LUNAR_CYCLE_DAYS
}

/// Days until `phase` next begins (1..=28).
#[must_use]
pub fn calculate_days_to_next_phase(phase: LunarPhase, day: u32, month: u32) -> u32 {
    LUNAR_CYCLE_DAYS - days_since_phase_start(phase, day, month)
}

pub fn plugin() -> EventPlugin {
    EventPlugin::new("cycle", "Celestial Cycles")
        .with_event(EventType::new(lunar_blessing(), || Box::new(LunarCycleBehavior::default())))
}

pub fn lunar_blessing() -> EventDefinition {
    EventDefinition::new(LUNAR_BLESSING, "Lunar Blessing", EventCategory::Cycle)
        .with_description("Moonlight pools like quicksilver, heavy with yin energy.")
        .with_rarity(Rarity::Rare)
        .with_duration(DurationRange::new(240, 480))
        .with_cooldown_days(3)
        .with_choice(
            ChoiceSpec::new("moonlight_cultivation", "Cultivate under the moon")
                .with_result(ResultSpec::Meditation { potency: 1.0 })
                .concludes(),
        )
        .with_choice(
            ChoiceSpec::new("observe", "Study the moon's movement")
                .with_result(ResultSpec::Experience { amount: 10 })
                .concludes(),
        )
        .with_choice(ChoiceSpec::new("rest", "Rest").concludes())
}

/// Phase-aware behavior of the lunar blessing.
#[derive(Clone, Debug, Default)]
pub struct LunarCycleBehavior {
    phase: Option<LunarPhase>,
}

impl LunarCycleBehavior {
    /// Phase fixed at activation.
    #[must_use]
    pub fn phase(&self) -> Option<LunarPhase> {
        self.phase
    }
}

impl EventBehavior for LunarCycleBehavior {
    fn additional_conditions(&self, _def: &EventDefinition, ctx: &GameContext) -> bool {
        let Some(now) = ctx.now() else {
            return false;
        };
        DayPeriod::from_hour(now.hour).is_dark() && determine_current_phase(now.day, now.month).is_blessed()
    }

    fn on_activate(&mut self, scope: &ActivationScope<'_>, ctx: &mut GameContext, _rng: &mut dyn Roller) {
        let now = scope.start_time;
        let phase = determine_current_phase(now.day, now.month);
        self.phase = Some(phase);

        let (stat, multiplier, description) = match phase {
            LunarPhase::FullMoon => ("cultivation_speed", 1.5, "The full moon floods the land with silver light."),
            LunarPhase::NewMoon => ("stealth", 1.3, "A moonless dark hides every movement."),
            _ => ("spirit", 1.1, "Faint moonlight stirs your spirit."),
        };

        match ctx.player.as_mut() {
            Some(player) => player.active_buffs.push(ActiveBuff {
                id: format!("{}:lunar_blessing", scope.instance_id),
                name: format!("{phase} blessing"),
                stat: stat.to_string(),
                multiplier,
            }),
            None => warn!("{}", EngineError::missing("player", "lunar buff")),
        }
        match ctx.world.as_mut() {
            Some(world) => world.atmospheric_effects.push(AtmosphericEffect {
                id: format!("{}:{phase}", scope.instance_id),
                kind: phase.id().to_string(),
                description: description.to_string(),
            }),
            None => warn!("{}", EngineError::missing("world", "lunar atmosphere")),
        }

        debug!(
            %phase,
            next_full = calculate_days_to_next_phase(LunarPhase::FullMoon, now.day, now.month),
            "lunar blessing"
        );
    }

    fn choices(&self, def: &EventDefinition) -> Vec<ChoiceSpec> {
        let potency = self.phase.map_or(1.0, LunarPhase::potency);
        def.choices
            .iter()
            .cloned()
            .map(|mut choice| {
                for result in &mut choice.results {
                    if let ResultSpec::Meditation { potency: p } = result {
                        *p = potency;
                    }
                }
                choice
            })
            .collect()
    }
}
