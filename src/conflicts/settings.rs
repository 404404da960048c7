//! Conflict plugin metadata: per-scale balance and spawn settings.
//!
//! This block is what the conflict plugin publishes to the registry and what
//! `check_conflict_conditions` consumes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::scale::ConflictScale;
use crate::core::{EngineError, EngineResult};

/// Balance and spawn settings for one scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleSettings {
    pub scale: ConflictScale,
    /// Enemy power multiplier.
    pub power_multiplier: f64,
    /// Reward multiplier relative to a local conflict.
    pub reward_multiplier: f64,
    /// How long a conflict at this scale stays open, in game minutes.
    pub duration_minutes: u32,
    /// Cap on simultaneously active conflicts at this scale.
    pub max_active: usize,
    /// Days after a completion before another conflict at this scale may spawn.
    pub cooldown_days: u32,
    /// Base daily spawn probability.
    pub spawn_chance: f64,
    /// Minimum player level before this scale can spawn.
    pub min_level: u32,
}

impl ScaleSettings {
    /// Shipped balance for a scale.
    #[must_use]
    pub fn builtin(scale: ConflictScale) -> Self {
        match scale {
            ConflictScale::Local => Self {
                scale,
                power_multiplier: 1.0,
                reward_multiplier: 1.0,
                duration_minutes: 180,
                max_active: 3,
                cooldown_days: 1,
                spawn_chance: 0.25,
                min_level: 1,
            },
            ConflictScale::Regional => Self {
                scale,
                power_multiplier: 1.5,
                reward_multiplier: 2.5,
                duration_minutes: 720,
                max_active: 2,
                cooldown_days: 5,
                spawn_chance: 0.08,
                min_level: 10,
            },
            ConflictScale::Global => Self {
                scale,
                power_multiplier: 2.5,
                reward_multiplier: 5.0,
                duration_minutes: 2880,
                max_active: 1,
                cooldown_days: 20,
                spawn_chance: 0.02,
                min_level: 25,
            },
        }
    }
}

/// Settings for the whole conflict family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictSettings {
    /// Configured scales, checked in order.
    pub scales: Vec<ScaleSettings>,
    /// Factor applied to the escalation chance on every escalation.
    pub escalation_decay: f64,
    /// Spawn chance bonus per player level.
    pub level_bonus_per_level: f64,
    /// Cap on the player-level spawn multiplier.
    pub max_level_multiplier: f64,
    /// Spawn multiplier per world phase; unlisted phases use 1.0.
    pub world_phase_multipliers: BTreeMap<String, f64>,
}

impl Default for ConflictSettings {
    fn default() -> Self {
        Self {
            scales: ConflictScale::ALL.into_iter().map(ScaleSettings::builtin).collect(),
            escalation_decay: 0.7,
            level_bonus_per_level: 0.02,
            max_level_multiplier: 2.0,
            world_phase_multipliers: BTreeMap::from([
                ("peace".to_string(), 0.5),
                ("unrest".to_string(), 1.0),
                ("turmoil".to_string(), 1.5),
                ("war".to_string(), 2.0),
            ]),
        }
    }
}

impl ConflictSettings {
    /// Settings for a scale, falling back to the shipped balance when the
    /// scale is not configured.
    #[must_use]
    pub fn scale(&self, scale: ConflictScale) -> ScaleSettings {
        self.scales
            .iter()
            .find(|s| s.scale == scale)
            .cloned()
            .unwrap_or_else(|| ScaleSettings::builtin(scale))
    }

    /// Spawn multiplier for a player level.
    #[must_use]
    pub fn level_multiplier(&self, level: u32) -> f64 {
        (1.0 + f64::from(level) * self.level_bonus_per_level).min(self.max_level_multiplier)
    }

    /// Spawn multiplier for a world phase.
    #[must_use]
    pub fn phase_multiplier(&self, phase: Option<&str>) -> f64 {
        phase
            .and_then(|p| self.world_phase_multipliers.get(p))
            .copied()
            .unwrap_or(1.0)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(self.escalation_decay > 0.0 && self.escalation_decay <= 1.0) {
            return Err(EngineError::Config(format!(
                "escalation_decay {} must be in (0, 1]",
                self.escalation_decay
            )));
        }
        for settings in &self.scales {
            if !(0.0..=1.0).contains(&settings.spawn_chance) {
                return Err(EngineError::Config(format!(
                    "{} spawn_chance {} is outside [0, 1]",
                    settings.scale, settings.spawn_chance
                )));
            }
            if settings.power_multiplier <= 0.0 || settings.reward_multiplier <= 0.0 {
                return Err(EngineError::Config(format!(
                    "{} multipliers must be positive",
                    settings.scale
                )));
            }
            if settings.duration_minutes == 0 {
                return Err(EngineError::Config(format!(
                    "{} duration must be positive",
                    settings.scale
                )));
            }
        }
        Ok(())
    }
}
