//! Event definitions - immutable event templates.
//!
//! `EventDefinition` holds everything about an event type that never
//! changes: identity, gating conditions, ambient effects and the choices it
//! offers. Runtime state (activation window, selected choices) lives in
//! `EventInstance`.

use serde::{Deserialize, Serialize};

use crate::core::{GameContext, NotificationKind, Roller};

use super::condition::ConditionSet;

/// Unique identifier for an event definition (`"spirit_rain"`, `"bandit_attack"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    /// Create a new event ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw ID value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which plugin family an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Combat,
    Social,
    Nature,
    Cycle,
    Conflict,
}

/// Rarity tag. Drives the base trigger chance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// How long an activation lasts, in game minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRange {
    pub min_minutes: u32,
    pub max_minutes: u32,
}

impl DurationRange {
    #[must_use]
    pub const fn new(min_minutes: u32, max_minutes: u32) -> Self {
        Self {
            min_minutes,
            max_minutes,
        }
    }

    /// Check `0 < min <= max`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min_minutes > 0 && self.min_minutes <= self.max_minutes
    }

    /// Sample a duration uniformly from `[min, max]`, never below one minute.
    pub fn sample(&self, rng: &mut dyn Roller) -> u32 {
        let low = self.min_minutes.max(1);
        let high = self.max_minutes.max(low);
        rng.roll_int(i64::from(low), i64::from(high)) as u32
    }
}

/// An ambient effect applied on activation, independent of player choices.
///
/// Everything that lands in a context list is keyed by the instance id and
/// removed again when the instance concludes or expires.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectSpec {
    Notification {
        title: String,
        message: String,
        kind: NotificationKind,
    },
    VisualEffect {
        kind: String,
        intensity: f64,
    },
    AtmosphericEffect {
        kind: String,
        description: String,
    },
    TemporaryBuff {
        name: String,
        stat: String,
        multiplier: f64,
    },
}

/// Precondition on a choice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Requirement {
    /// Skill level at least `level`.
    Skill { skill: String, level: u32 },
    /// Stat value at least `min`.
    Stat { stat: String, min: i64 },
    /// Hold at least `quantity` of an item.
    Item { item_id: String, quantity: u32 },
    /// Hold at least `amount` spirit stones.
    Currency { amount: i64 },
}

impl Requirement {
    /// Check the requirement against the player. No player means not met.
    #[must_use]
    pub fn is_met(&self, ctx: &GameContext) -> bool {
        let Some(player) = ctx.player.as_ref() else {
            return false;
        };
        match self {
            Self::Skill { skill, level } => player.skill(skill) >= *level,
            Self::Stat { stat, min } => player.stat(stat) >= *min,
            Self::Item { item_id, quantity } => player
                .inventory
                .as_ref()
                .is_some_and(|inv| inv.quantity_of(item_id) >= *quantity),
            Self::Currency { amount } => player
                .inventory
                .as_ref()
                .is_some_and(|inv| inv.currency >= *amount),
        }
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skill { skill, level } => write!(f, "{skill} skill level {level}"),
            Self::Stat { stat, min } => write!(f, "{stat} of at least {min}"),
            Self::Item { item_id, quantity } => write!(f, "{quantity}x {item_id}"),
            Self::Currency { amount } => write!(f, "{amount} spirit stones"),
        }
    }
}

/// Player resource touched by a `Resource` result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Energy,
    Currency,
    Reputation,
}

/// One declarative effect a choice produces.
///
/// `Resource`, `Experience` and `Item` have a default interpretation; the
/// rest are interpreted by the owning event's behavior. `Unknown` carries
/// tags this build does not understand and always resolves as not applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultSpec {
    Resource { resource: ResourceKind, amount: i64 },
    Experience { amount: i64 },
    Item { item_id: String, name: String, quantity: u32 },
    /// Hand the encounter to the combat resolver.
    Combat { difficulty: f64 },
    /// Attempt to get away; failure usually means combat.
    Escape { base_chance: f64 },
    /// Buy from a merchant at a discount.
    Trading { discount: f64 },
    InformationGathering { topic: String },
    Meditation { potency: f64 },
    Intimidation,
    Bribe,
    Purify,
    ClosePortal,
    Unknown { tag: String },
}

impl ResultSpec {
    /// Stable tag name, used in outcomes and logs.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Resource { .. } => "resource",
            Self::Experience { .. } => "experience",
            Self::Item { .. } => "item",
            Self::Combat { .. } => "combat",
            Self::Escape { .. } => "escape",
            Self::Trading { .. } => "trading",
            Self::InformationGathering { .. } => "information_gathering",
            Self::Meditation { .. } => "meditation",
            Self::Intimidation => "intimidation",
            Self::Bribe => "bribe",
            Self::Purify => "purify",
            Self::ClosePortal => "close_portal",
            Self::Unknown { tag } => tag,
        }
    }
}

/// A player-facing option.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChoiceSpec {
    /// Short machine id (`"engage"`, `"intimidate"`).
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub requirement: Option<Requirement>,
    #[serde(default)]
    pub results: Vec<ResultSpec>,
    #[serde(default)]
    pub concludes_event: bool,
}

impl ChoiceSpec {
    /// Create a choice with no requirement and no results.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            requirement: None,
            results: Vec::new(),
            concludes_event: false,
        }
    }

    /// Set the requirement (builder pattern).
    #[must_use]
    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requirement = Some(requirement);
        self
    }

    /// Add a result (builder pattern).
    #[must_use]
    pub fn with_result(mut self, result: ResultSpec) -> Self {
        self.results.push(result);
        self
    }

    /// Mark this choice as ending the event (builder pattern).
    #[must_use]
    pub fn concludes(mut self) -> Self {
        self.concludes_event = true;
        self
    }
}

/// Static event definition.
///
/// ## Example
///
/// ```
/// use cultivation_events::events::{
///     ChoiceSpec, DurationRange, EventCategory, EventDefinition, Rarity, ResultSpec,
/// };
///
/// let def = EventDefinition::new("spirit_rain", "Spirit Rain", EventCategory::Nature)
///     .with_rarity(Rarity::Uncommon)
///     .with_duration(DurationRange::new(30, 90))
///     .with_choice(
///         ChoiceSpec::new("meditate", "Meditate in the rain")
///             .with_result(ResultSpec::Experience { amount: 20 })
///             .concludes(),
///     );
///
/// assert_eq!(def.choices.len(), 1);
/// assert!(def.duration.is_valid());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub id: EventId,
    pub name: String,
    pub description: String,
    pub category: EventCategory,
    pub rarity: Rarity,
    pub duration: DurationRange,
    #[serde(default)]
    pub conditions: ConditionSet,
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
    #[serde(default)]
    pub choices: Vec<ChoiceSpec>,
    #[serde(default)]
    pub cooldown_days: u32,
}

impl EventDefinition {
    /// Create a common event lasting one hour with no conditions or choices.
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: EventCategory) -> Self {
        Self {
            id: EventId::new(id),
            name: name.into(),
            description: String::new(),
            category,
            rarity: Rarity::Common,
            duration: DurationRange::new(60, 60),
            conditions: ConditionSet::default(),
            effects: Vec::new(),
            choices: Vec::new(),
            cooldown_days: 0,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: DurationRange) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_conditions(mut self, conditions: ConditionSet) -> Self {
        self.conditions = conditions;
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: EffectSpec) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_choice(mut self, choice: ChoiceSpec) -> Self {
        self.choices.push(choice);
        self
    }

    #[must_use]
    pub fn with_cooldown_days(mut self, days: u32) -> Self {
        self.cooldown_days = days;
        self
    }

    /// Reasons this definition cannot be registered, if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.as_str().is_empty() {
            return Err("empty event id".to_string());
        }
        if !self.duration.is_valid() {
            return Err(format!(
                "duration range {}..={} must satisfy 0 < min <= max",
                self.duration.min_minutes, self.duration.max_minutes
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameRng, PlayerState};

    #[test]
    fn test_duration_sample_within_range() {
        let range = DurationRange::new(30, 45);
        let mut rng = GameRng::new(1);
        for _ in 0..500 {
            let minutes = range.sample(&mut rng);
            assert!((30..=45).contains(&minutes));
        }
    }

    #[test]
    fn test_duration_validity() {
        assert!(DurationRange::new(1, 1).is_valid());
        assert!(!DurationRange::new(0, 10).is_valid());
        assert!(!DurationRange::new(20, 10).is_valid());
    }

    #[test]
    fn test_requirements() {
        let player = PlayerState::new(5)
            .with_skill("stealth", 3)
            .with_stat("strength", 7)
            .with_item("herb", "Herb", 2)
            .with_currency(50);
        let ctx = GameContext {
            player: Some(player),
            ..GameContext::default()
        };

        assert!(Requirement::Skill { skill: "stealth".into(), level: 3 }.is_met(&ctx));
        assert!(!Requirement::Skill { skill: "stealth".into(), level: 4 }.is_met(&ctx));
        assert!(Requirement::Stat { stat: "strength".into(), min: 7 }.is_met(&ctx));
        assert!(!Requirement::Stat { stat: "agility".into(), min: 1 }.is_met(&ctx));
        assert!(Requirement::Item { item_id: "herb".into(), quantity: 2 }.is_met(&ctx));
        assert!(!Requirement::Item { item_id: "herb".into(), quantity: 3 }.is_met(&ctx));
        assert!(Requirement::Currency { amount: 50 }.is_met(&ctx));
        assert!(!Requirement::Currency { amount: 51 }.is_met(&ctx));

        // No player at all
        assert!(!Requirement::Stat { stat: "strength".into(), min: 0 }.is_met(&GameContext::default()));
    }

    #[test]
    fn test_result_tags() {
        assert_eq!(ResultSpec::ClosePortal.tag(), "close_portal");
        assert_eq!(ResultSpec::Unknown { tag: "ritual".into() }.tag(), "ritual");
        assert_eq!(
            ResultSpec::InformationGathering { topic: "sects".into() }.tag(),
            "information_gathering"
        );
    }

    #[test]
    fn test_result_spec_serde_tagging() {
        let json = r#"{"type":"experience","amount":25}"#;
        let spec: ResultSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec, ResultSpec::Experience { amount: 25 });
    }

    #[test]
    fn test_validate() {
        let def = EventDefinition::new("x", "X", EventCategory::Nature);
        assert!(def.validate().is_ok());

        let bad = def.clone().with_duration(DurationRange::new(10, 5));
        assert!(bad.validate().is_err());

        let unnamed = EventDefinition::new("", "Nameless", EventCategory::Nature);
        assert!(unnamed.validate().is_err());
    }
}
