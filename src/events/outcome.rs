//! Outcome values returned to the caller.
//!
//! The engine never broadcasts anything. Every choice resolves to plain
//! values describing what happened; the caller decides what to show and
//! what to persist. Combat is never resolved here: a `CombatHandoff`
//! carries the enemies plus the victory/defeat consequences, and the caller
//! applies one of them after its combat resolver has run.

use serde::{Deserialize, Serialize};

use crate::core::EngineError;

/// One enemy in a combat handoff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub level: u32,
    /// Leaders, elders and other named foes.
    #[serde(default)]
    pub elite: bool,
}

impl Combatant {
    pub fn new(name: impl Into<String>, level: u32) -> Self {
        Self {
            name: name.into(),
            level,
            elite: false,
        }
    }

    pub fn elite(name: impl Into<String>, level: u32) -> Self {
        Self {
            name: name.into(),
            level,
            elite: true,
        }
    }
}

/// An item granted by a reward block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardItem {
    pub item_id: String,
    pub name: String,
    pub quantity: u32,
}

impl RewardItem {
    pub fn new(item_id: impl Into<String>, name: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
            quantity,
        }
    }
}

/// Experience, spirit stones, reputation and items.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewards {
    pub experience: i64,
    pub currency: i64,
    pub reputation: i64,
    #[serde(default)]
    pub items: Vec<RewardItem>,
}

impl Rewards {
    /// Scale the numeric parts, rounding to the nearest whole unit.
    #[must_use]
    pub fn scaled(&self, multiplier: f64) -> Self {
        let scale = |value: i64| (value as f64 * multiplier).round() as i64;
        Self {
            experience: scale(self.experience),
            currency: scale(self.currency),
            reputation: scale(self.reputation),
            items: self.items.clone(),
        }
    }

    /// Keep a fraction of the numeric parts and drop the items.
    #[must_use]
    pub fn partial(&self, fraction: f64) -> Self {
        Self {
            items: Vec::new(),
            ..self.scaled(fraction)
        }
    }
}

/// What a lost fight costs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    pub energy_loss: i64,
    pub currency_loss: i64,
    pub reputation_loss: i64,
}

/// Victory and defeat blocks attached to a combat handoff.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consequences {
    pub victory: Rewards,
    pub defeat: Penalty,
}

/// Everything the combat resolver needs to run the fight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatHandoff {
    pub enemy_power: u64,
    pub enemies: Vec<Combatant>,
    pub consequences: Consequences,
}

/// The outcome of resolving one `ResultSpec`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultOutcome {
    pub tag: String,
    pub applied: bool,
    pub description: String,
    /// Value of the touched field after the change, when there is one.
    #[serde(default)]
    pub new_value: Option<i64>,
    /// Set when the result hands the encounter to the combat resolver.
    #[serde(default)]
    pub combat: Option<CombatHandoff>,
}

impl ResultOutcome {
    pub fn applied(tag: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            applied: true,
            description: description.into(),
            new_value: None,
            combat: None,
        }
    }

    pub fn not_applied(tag: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            applied: false,
            description: description.into(),
            new_value: None,
            combat: None,
        }
    }

    pub fn combat_initiated(
        tag: impl Into<String>,
        description: impl Into<String>,
        handoff: CombatHandoff,
    ) -> Self {
        Self {
            tag: tag.into(),
            applied: true,
            description: description.into(),
            new_value: None,
            combat: Some(handoff),
        }
    }

    #[must_use]
    pub fn with_new_value(mut self, value: i64) -> Self {
        self.new_value = Some(value);
        self
    }

    /// True when this outcome hands off to combat.
    #[must_use]
    pub fn combat_initiated_flag(&self) -> bool {
        self.combat.is_some()
    }
}

/// The outcome of `EventInstance::process_choice`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChoiceResult {
    pub success: bool,
    pub choice_index: usize,
    pub outcomes: Vec<ResultOutcome>,
    pub concluded: bool,
    #[serde(default)]
    pub error: Option<EngineError>,
}

impl ChoiceResult {
    /// A rejected choice. Nothing in the context was touched.
    pub fn rejected(choice_index: usize, error: EngineError) -> Self {
        Self {
            success: false,
            choice_index,
            outcomes: Vec::new(),
            concluded: false,
            error: Some(error),
        }
    }

    /// The first combat handoff among the outcomes, if any.
    #[must_use]
    pub fn combat(&self) -> Option<&CombatHandoff> {
        self.outcomes.iter().find_map(|o| o.combat.as_ref())
    }
}
