//! Bandit attacks.
//!
//! Bandit groups scale in headcount and level with the conflict scale. Besides
//! fighting or slipping away the player can pay them off or try to scare them
//! off; intimidation depends on strength relative to the bandits' level.
//! Escalated bands take hostages, which a bribe or a successful intimidation
//! releases.

use tracing::debug;

use super::context::ConflictContext;
use super::escalation::{combat_handoff, ConflictKind};
use super::scale::ConflictScale;
use crate::core::{GameContext, Roller};
use crate::events::{ChoiceSpec, Combatant, Requirement, ResourceKind, ResultOutcome, ResultResolver, ResultSpec, RewardItem, Rewards};

const BASE_ESCALATION_CHANCE: f64 = 0.30;
const INTIMIDATION_BASE: f64 = 0.3;
const INTIMIDATION_PER_LEVEL: f64 = 0.1;
/// Enemies who see through a failed intimidation fight harder.
const FAILED_INTIMIDATION_DIFFICULTY: f64 = 1.2;

/// Probability that intimidation succeeds:
/// `0.3 × (1 + (strength − bandit_level) × 0.1)`, clamped to `[0.05, 0.95]`.
#[must_use]
pub fn intimidation_chance(strength: i64, bandit_level: u32) -> f64 {
    let gap = (strength - i64::from(bandit_level)) as f64;
    (INTIMIDATION_BASE * (1.0 + gap * INTIMIDATION_PER_LEVEL)).clamp(0.05, 0.95)
}

/// The bandit conflict type.
#[derive(Clone, Debug, Default)]
pub struct BanditAttack {
    bandit_count: u32,
    bandit_level: u32,
    hostages: Vec<String>,
}

impl BanditAttack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive headcount range per scale.
    #[must_use]
    pub fn count_range(scale: ConflictScale) -> (i64, i64) {
        match scale {
            ConflictScale::Local => (2, 4),
            ConflictScale::Regional => (5, 8),
            ConflictScale::Global => (10, 15),
        }
    }

    /// `max(1, floor(player_level × factor))` with factor 0.7 / 0.85 / 1.0.
    #[must_use]
    pub fn bandit_level(scale: ConflictScale, player_level: u32) -> u32 {
        let factor = match scale {
            ConflictScale::Local => 0.7,
            ConflictScale::Regional => 0.85,
            ConflictScale::Global => 1.0,
        };
        ((f64::from(player_level) * factor).floor() as u32).max(1)
    }

    /// Price of letting the player pass: one and a half times the stake.
    #[must_use]
    pub fn bribe_cost(conflict: &ConflictContext) -> i64 {
        conflict.rewards.currency * 3 / 2
    }

    /// Rank-and-file bandits in the current group.
    #[must_use]
    pub fn bandit_count(&self) -> u32 {
        self.bandit_count
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.bandit_level
    }

    #[must_use]
    pub fn hostages(&self) -> &[String] {
        &self.hostages
    }

    fn intimidate(&mut self, conflict: &ConflictContext, ctx: &mut GameContext, rng: &mut dyn Roller) -> ResultOutcome {
        let strength = ctx.player.as_ref().map_or(0, |p| p.stat("strength"));
        let chance = intimidation_chance(strength, self.bandit_level);
        debug!(strength, bandit_level = self.bandit_level, chance, "intimidation attempt");

        if rng.chance(chance) {
            let freed = std::mem::take(&mut self.hostages);
            let gained = ResultResolver::apply_rewards(&conflict.rewards.partial(0.5), ctx);
            let mut description = String::from("The bandits lose their nerve and scatter");
            if !freed.is_empty() {
                description.push_str(&format!(", abandoning {} hostages", freed.len()));
            }
            let experience = gained.iter().find(|o| o.tag == "experience").and_then(|o| o.new_value);
            let outcome = ResultOutcome::applied("intimidation", description);
            match experience {
                Some(total) => outcome.with_new_value(total),
                None => outcome,
            }
        } else {
            ResultOutcome::combat_initiated(
                "intimidation",
                "The bandits laugh off your threats and attack",
                combat_handoff(conflict, FAILED_INTIMIDATION_DIFFICULTY, self.defeat_penalty(conflict)),
            )
        }
    }

    fn bribe(&mut self, conflict: &ConflictContext, ctx: &mut GameContext) -> ResultOutcome {
        let cost = Self::bribe_cost(conflict);
        let paid = ResultResolver::apply_resource(ResourceKind::Currency, -cost, ctx);
        if !paid.applied {
            return ResultOutcome::not_applied("bribe", paid.description);
        }
        let freed = std::mem::take(&mut self.hostages);
        let mut outcome = ResultOutcome::applied(
            "bribe",
            format!("You pay {cost} spirit stones and the bandits let you pass"),
        );
        if !freed.is_empty() {
            outcome.description.push_str(&format!("; {} hostages are released", freed.len()));
        }
        match paid.new_value {
            Some(remaining) => outcome.with_new_value(remaining),
            None => outcome,
        }
    }
}

impl ConflictKind for BanditAttack {
    fn label(&self) -> &str {
        "bandit attack"
    }

    fn base_escalation_chance(&self) -> f64 {
        BASE_ESCALATION_CHANCE
    }

    fn base_rewards(&self, level: u32) -> Rewards {
        let level = i64::from(level);
        Rewards {
            experience: level * 40,
            currency: level * 10,
            reputation: 5,
            items: Vec::new(),
        }
    }

    fn reward_items(&self, scale: ConflictScale) -> Vec<RewardItem> {
        match scale {
            ConflictScale::Local => Vec::new(),
            ConflictScale::Regional => vec![RewardItem::new("bandit_map", "Bandit Hideout Map", 1)],
            ConflictScale::Global => vec![
                RewardItem::new("bandit_map", "Bandit Hideout Map", 1),
                RewardItem::new("bandit_king_seal", "Bandit King's Seal", 1),
            ],
        }
    }

    fn build_enemy_group(&mut self, scale: ConflictScale, level: u32, rng: &mut dyn Roller) -> Vec<Combatant> {
        let (low, high) = Self::count_range(scale);
        self.bandit_count = rng.roll_int(low, high) as u32;
        self.bandit_level = Self::bandit_level(scale, level);

        let mut group: Vec<Combatant> = (0..self.bandit_count)
            .map(|_| Combatant::new("Bandit", self.bandit_level))
            .collect();
        if scale >= ConflictScale::Regional {
            group.push(Combatant::elite("Bandit Captain", self.bandit_level + 2));
        }
        if scale == ConflictScale::Global {
            group.push(Combatant::elite("Bandit King", self.bandit_level + 5));
        }
        group
    }

    fn choices(&self, conflict: &ConflictContext) -> Vec<ChoiceSpec> {
        let cost = Self::bribe_cost(conflict);
        vec![
            ChoiceSpec::new("engage", "Fight the bandits")
                .with_result(ResultSpec::Combat { difficulty: 1.0 })
                .concludes(),
            ChoiceSpec::new("avoid", "Try to slip past unseen")
                .with_result(ResultSpec::Escape { base_chance: 0.6 })
                .concludes(),
            ChoiceSpec::new("negotiate", format!("Pay them off ({cost} spirit stones)"))
                .requires(Requirement::Currency { amount: cost })
                .with_result(ResultSpec::Bribe)
                .concludes(),
            ChoiceSpec::new("intimidate", "Intimidate them with a show of strength")
                .with_result(ResultSpec::Intimidation)
                .concludes(),
        ]
    }

    fn announcement(&self, conflict: &ConflictContext) -> (String, String) {
        let place = conflict.location.as_deref().unwrap_or("the road");
        let title = match conflict.scale {
            ConflictScale::Local => "Bandits on the Road",
            ConflictScale::Regional => "Bandit Warband",
            ConflictScale::Global => "The Bandit King Rises",
        };
        (
            title.to_string(),
            format!(
                "{} bandits block the way near {place}. Their leader demands tribute.",
                conflict.enemy_group.len()
            ),
        )
    }

    fn on_escalate(
        &mut self,
        _from: &ConflictContext,
        to: &ConflictContext,
        _ctx: &mut GameContext,
        _rng: &mut dyn Roller,
    ) {
        let place = to.location.as_deref().unwrap_or("the roads");
        match to.scale {
            ConflictScale::Regional => self.hostages.push(format!("travelers from {place}")),
            ConflictScale::Global => self.hostages.push("a sect elder's disciple".to_string()),
            ConflictScale::Local => {}
        }
    }

    fn resolve(
        &mut self,
        spec: &ResultSpec,
        conflict: &ConflictContext,
        ctx: &mut GameContext,
        rng: &mut dyn Roller,
    ) -> Option<ResultOutcome> {
        match spec {
            ResultSpec::Intimidation => Some(self.intimidate(conflict, ctx, rng)),
            ResultSpec::Bribe => Some(self.bribe(conflict, ctx)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameTime, PlayerState, ScriptedRolls};

    fn conflict(currency: i64) -> ConflictContext {
        ConflictContext {
            scale: ConflictScale::Local,
            enemy_power: 5,
            enemy_group: vec![Combatant::new("Bandit", 3); 2],
            rewards: Rewards {
                experience: 200,
                currency,
                reputation: 5,
                items: Vec::new(),
            },
            escalation_chance: 0.3,
            expiration_time: GameTime::at(12, 0),
            location: Some("misty_pass".into()),
        }
    }

    #[test]
    fn test_intimidation_formula() {
        let expected = 0.3 * (1.0 + (5.0 - 3.0) * 0.1);
        assert_eq!(intimidation_chance(5, 3), expected);
        assert!((intimidation_chance(5, 3) - 0.36).abs() < 1e-12);
        assert_eq!(intimidation_chance(0, 40), 0.05);
        assert_eq!(intimidation_chance(100, 1), 0.95);
    }

    #[test]
    fn test_bandit_level_floor() {
        assert_eq!(BanditAttack::bandit_level(ConflictScale::Local, 5), 3);
        assert_eq!(BanditAttack::bandit_level(ConflictScale::Local, 1), 1);
        assert_eq!(BanditAttack::bandit_level(ConflictScale::Global, 30), 30);
    }

    #[test]
    fn test_group_size_per_scale() {
        for scale in ConflictScale::ALL {
            let (low, high) = BanditAttack::count_range(scale);
            for sample in [0.0, 0.5, 0.999_999] {
                let mut bandits = BanditAttack::new();
                bandits.build_enemy_group(scale, 20, &mut ScriptedRolls::constant(sample));
                let count = i64::from(bandits.bandit_count());
                assert!((low..=high).contains(&count), "{scale}: {count}");
            }
        }
    }

    #[test]
    fn test_escalated_group_has_leaders() {
        let mut bandits = BanditAttack::new();
        let group = bandits.build_enemy_group(ConflictScale::Global, 30, &mut ScriptedRolls::constant(0.0));
        assert_eq!(group.len(), 12);
        assert_eq!(group.iter().filter(|c| c.elite).count(), 2);
    }

    #[test]
    fn test_bribe_pays_and_frees_hostages() {
        let mut bandits = BanditAttack::new();
        bandits.hostages.push("travelers".into());
        let mut ctx = GameContext {
            player: Some(PlayerState::new(5).with_currency(100)),
            ..GameContext::default()
        };

        let outcome = bandits.bribe(&conflict(50), &mut ctx);
        assert!(outcome.applied);
        assert_eq!(outcome.new_value, Some(25));
        assert!(bandits.hostages().is_empty());
    }

    #[test]
    fn test_negotiate_requires_bribe_money() {
        let bandits = BanditAttack::new();
        let choices = bandits.choices(&conflict(50));
        let negotiate = choices.iter().find(|c| c.id == "negotiate").unwrap();
        assert_eq!(negotiate.requirement, Some(Requirement::Currency { amount: 75 }));
        assert!(choices.iter().all(|c| c.concludes_event));
    }

    #[test]
    fn test_escalation_takes_hostages() {
        let mut bandits = BanditAttack::new();
        let from = conflict(50);
        let to = ConflictContext {
            scale: ConflictScale::Regional,
            ..from.clone()
        };
        let mut ctx = GameContext::default();
        bandits.on_escalate(&from, &to, &mut ctx, &mut ScriptedRolls::constant(0.5));
        assert_eq!(bandits.hostages(), ["travelers from misty_pass".to_string()]);
    }
}
