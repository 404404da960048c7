//! Daily conflict spawn check.
//!
//! The conflict plugin decides once per game day which scales may spawn a new
//! conflict. A scale is skipped when its active cap is reached, its cooldown
//! since the last completion has not elapsed, or the player is below its
//! minimum level. Surviving scales get one Bernoulli draw at
//! `spawn_chance × level multiplier × world-phase multiplier`.

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::scale::ConflictScale;
use super::settings::ConflictSettings;
use crate::core::{EngineError, GameContext, Roller};

/// Per-scale bookkeeping the caller keeps between spawn checks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConflictTracker {
    active: FxHashMap<ConflictScale, usize>,
    last_completed_day: FxHashMap<ConflictScale, u64>,
}

impl ConflictTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn active(&self, scale: ConflictScale) -> usize {
        self.active.get(&scale).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn last_completed_day(&self, scale: ConflictScale) -> Option<u64> {
        self.last_completed_day.get(&scale).copied()
    }

    pub fn record_started(&mut self, scale: ConflictScale) {
        *self.active.entry(scale).or_insert(0) += 1;
    }

    /// Record a conflict at `scale` ending on game day `day`.
    pub fn record_completed(&mut self, scale: ConflictScale, day: u64) {
        if let Some(count) = self.active.get_mut(&scale) {
            *count = count.saturating_sub(1);
        }
        self.last_completed_day.insert(scale, day);
    }

    /// Move one active conflict from `from` to `to` after an escalation.
    pub fn record_escalated(&mut self, from: ConflictScale, to: ConflictScale) {
        if let Some(count) = self.active.get_mut(&from) {
            *count = count.saturating_sub(1);
        }
        self.record_started(to);
    }
}

/// Scales that passed today's spawn draw, with candidate locations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConflictSpawnCheck {
    pub scales: Vec<ConflictScale>,
    /// Ids of regions that may host a conflict (not safe zones).
    pub locations: Vec<String>,
}

impl ConflictSpawnCheck {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }
}

/// Run the daily spawn check.
///
/// Without a world sub-tree nothing can spawn; without a player the level
/// gate treats the player as level 1.
pub fn check_conflict_conditions(
    ctx: &GameContext,
    tracker: &ConflictTracker,
    settings: &ConflictSettings,
    rng: &mut dyn Roller,
) -> ConflictSpawnCheck {
    let Some(world) = ctx.world.as_ref() else {
        warn!("{}", EngineError::missing("world", "conflict spawn check"));
        return ConflictSpawnCheck::default();
    };
    let level = ctx.player_level().unwrap_or_else(|| {
        warn!("{}", EngineError::missing("player", "conflict level gate; assuming level 1"));
        1
    });
    let today = world.time.day_number();
    let level_multiplier = settings.level_multiplier(level);
    let phase_multiplier = settings.phase_multiplier(world.phase.as_deref());

    let mut check = ConflictSpawnCheck {
        scales: Vec::new(),
        locations: world
            .regions
            .iter()
            .filter(|r| !r.safe_zone)
            .map(|r| r.id.clone())
            .collect(),
    };

    for scale_settings in &settings.scales {
        let scale = scale_settings.scale;
        if level < scale_settings.min_level {
            continue;
        }
        if tracker.active(scale) >= scale_settings.max_active {
            debug!(%scale, "conflict cap reached");
            continue;
        }
        if let Some(last) = tracker.last_completed_day(scale) {
            if today.saturating_sub(last) < u64::from(scale_settings.cooldown_days) {
                debug!(%scale, last, today, "conflict cooldown");
                continue;
            }
        }

        let chance = (scale_settings.spawn_chance * level_multiplier * phase_multiplier).clamp(0.0, 1.0);
        if rng.chance(chance) {
            check.scales.push(scale);
        }
    }

    debug!(scales = ?check.scales, locations = check.locations.len(), "conflict spawn check");
    check
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameTime, PlayerState, Region, ScriptedRolls, Season, WorldState};

    fn ctx(level: u32, phase: &str) -> GameContext {
        GameContext::new(
            PlayerState::new(level),
            WorldState::new(GameTime::new(1, 2, 10, 6, 0), Season::Spring, "clear")
                .with_phase(phase)
                .with_region(Region::new("misty_pass", "Misty Pass", "mountain"))
                .with_region(Region::new("sect_grounds", "Sect Grounds", "sect").safe()),
        )
    }

    #[test]
    fn test_all_scales_pass_for_high_level() {
        let settings = ConflictSettings::default();
        let check = check_conflict_conditions(&ctx(30, "war"), &ConflictTracker::new(), &settings, &mut ScriptedRolls::constant(0.0));
        assert_eq!(check.scales, ConflictScale::ALL.to_vec());
        assert_eq!(check.locations, ["misty_pass".to_string()]);
    }

    #[test]
    fn test_min_level_gates_scales() {
        let settings = ConflictSettings::default();
        let check = check_conflict_conditions(&ctx(5, "war"), &ConflictTracker::new(), &settings, &mut ScriptedRolls::constant(0.0));
        assert_eq!(check.scales, [ConflictScale::Local]);
    }

    #[test]
    fn test_cap_and_cooldown_skip_without_drawing() {
        let settings = ConflictSettings::default();
        let ctx = ctx(30, "war");
        let today = ctx.now().unwrap().day_number();

        let mut tracker = ConflictTracker::new();
        for _ in 0..3 {
            tracker.record_started(ConflictScale::Local);
        }
        tracker.record_started(ConflictScale::Global);
        tracker.record_completed(ConflictScale::Global, today);
        tracker.record_completed(ConflictScale::Regional, today - 2);

        let mut rolls = ScriptedRolls::constant(0.0);
        let check = check_conflict_conditions(&ctx, &tracker, &settings, &mut rolls);
        assert!(check.is_empty());
        assert_eq!(rolls.consumed(), 0);
    }

    #[test]
    fn test_multipliers_applied() {
        let settings = ConflictSettings::default();
        // level 10: ×1.2; peace: ×0.5 → local chance 0.25 × 0.6 = 0.15
        let ctx = ctx(10, "peace");
        let tracker = ConflictTracker::new();

        let pass = check_conflict_conditions(&ctx, &tracker, &settings, &mut ScriptedRolls::new([0.149, 0.99]));
        assert_eq!(pass.scales, [ConflictScale::Local]);

        let fail = check_conflict_conditions(&ctx, &tracker, &settings, &mut ScriptedRolls::new([0.151, 0.99]));
        assert!(fail.is_empty());
    }

    #[test]
    fn test_missing_world_is_empty() {
        let ctx = GameContext {
            player: Some(PlayerState::new(30)),
            ..GameContext::default()
        };
        let check = check_conflict_conditions(&ctx, &ConflictTracker::new(), &ConflictSettings::default(), &mut ScriptedRolls::constant(0.0));
        assert_eq!(check, ConflictSpawnCheck::default());
    }

    #[test]
    fn test_tracker_escalation_moves_count() {
        let mut tracker = ConflictTracker::new();
        tracker.record_started(ConflictScale::Local);
        tracker.record_escalated(ConflictScale::Local, ConflictScale::Regional);
        assert_eq!(tracker.active(ConflictScale::Local), 0);
        assert_eq!(tracker.active(ConflictScale::Regional), 1);
    }
}
