//! Combat plugin: spirit beast ambushes in the wilds.

use tracing::debug;

use super::registry::{EventPlugin, EventType};
use crate::core::{GameContext, NotificationKind, Roller};
use crate::events::{
    ActivationScope, ChoiceSpec, CombatHandoff, Combatant, Consequences, DayPeriod, DurationRange, EffectSpec,
    EventBehavior, EventCategory, EventDefinition, ConditionSet, Penalty, Rarity, Requirement, ResultOutcome,
    ResultResolver, ResultSpec, RewardItem, Rewards,
};

pub const SPIRIT_BEAST_AMBUSH: &str = "spirit_beast_ambush";

/// Stealth needed to hide from the pack.
const HIDE_STEALTH: u32 = 3;

pub fn plugin() -> EventPlugin {
    EventPlugin::new("combat", "Combat Encounters")
        .with_event(EventType::new(spirit_beast_ambush(), || Box::new(AmbushBehavior::default())))
}

pub fn spirit_beast_ambush() -> EventDefinition {
    EventDefinition::new(SPIRIT_BEAST_AMBUSH, "Spirit Beast Ambush", EventCategory::Combat)
        .with_description("Glowing eyes surround you. A pack of spirit beasts has caught your scent.")
        .with_rarity(Rarity::Uncommon)
        .with_duration(DurationRange::new(30, 60))
        .with_conditions(
            ConditionSet::new()
                .with_min_level(2)
                .with_location_type("forest", 1.5)
                .with_location_type("mountain", 1.2)
                .with_location_type("city", 0.1)
                .with_day_period(DayPeriod::Night, 1.3)
                .with_day_period(DayPeriod::DeepNight, 1.3),
        )
        .with_effect(EffectSpec::Notification {
            title: "Ambush!".into(),
            message: "Spirit beasts leap from the undergrowth.".into(),
            kind: NotificationKind::Danger,
        })
        .with_choice(
            ChoiceSpec::new("fight", "Stand your ground and fight")
                .with_result(ResultSpec::Combat { difficulty: 1.0 })
                .concludes(),
        )
        .with_choice(
            ChoiceSpec::new("flee", "Run for it")
                .with_result(ResultSpec::Escape { base_chance: 0.5 })
                .concludes(),
        )
        .with_choice(
            ChoiceSpec::new("hide", "Mask your aura and hide")
                .requires(Requirement::Skill {
                    skill: "stealth".into(),
                    level: HIDE_STEALTH,
                })
                .with_result(ResultSpec::Experience { amount: 15 })
                .concludes(),
        )
}

/// Rolls the pack on activation and builds the combat handoff from it.
#[derive(Clone, Debug, Default)]
pub struct AmbushBehavior {
    pack: Vec<Combatant>,
}

impl AmbushBehavior {
    #[must_use]
    pub fn pack(&self) -> &[Combatant] {
        &self.pack
    }

    fn handoff(&self, difficulty: f64) -> CombatHandoff {
        let power: u32 = self.pack.iter().map(|b| b.level).sum();
        let lead = self.pack.iter().map(|b| b.level).max().unwrap_or(1);
        CombatHandoff {
            enemy_power: (f64::from(power) * difficulty).round() as u64,
            enemies: self.pack.clone(),
            consequences: Consequences {
                victory: Rewards {
                    experience: i64::from(power) * 20,
                    currency: 0,
                    reputation: 1,
                    items: vec![RewardItem::new("beast_core", "Spirit Beast Core", self.pack.len() as u32)],
                },
                defeat: Penalty {
                    energy_loss: i64::from(lead) * 5,
                    currency_loss: 0,
                    reputation_loss: 0,
                },
            },
        }
    }
}

impl EventBehavior for AmbushBehavior {
    fn on_activate(&mut self, _scope: &ActivationScope<'_>, ctx: &mut GameContext, rng: &mut dyn Roller) {
        let level = i64::from(ctx.player_level().unwrap_or(1));
        let size = rng.roll_int(1, 3);
        self.pack = (0..size)
            .map(|_| Combatant::new("Spirit Wolf", rng.roll_int(level - 1, level + 1).max(1) as u32))
            .collect();
        if size == 3 {
            self.pack.push(Combatant::elite("Alpha Spirit Wolf", level as u32 + 2));
        }
        debug!(pack = self.pack.len(), "spirit beast pack rolled");
    }

    fn apply_result(&mut self, spec: &ResultSpec, ctx: &mut GameContext, rng: &mut dyn Roller) -> ResultOutcome {
        match spec {
            ResultSpec::Combat { difficulty } => {
                ResultOutcome::combat_initiated("combat", "The pack closes in", self.handoff(*difficulty))
            }
            ResultSpec::Escape { base_chance } => {
                let agility = ctx.player.as_ref().map_or(0, |p| p.stat("agility"));
                let chance = (base_chance + agility as f64 * 0.02).clamp(0.05, 0.95);
                if rng.chance(chance) {
                    ResultOutcome::applied("escape", "You outrun the pack")
                } else {
                    ResultOutcome::combat_initiated("escape", "The pack runs you down", self.handoff(1.2))
                }
            }
            other => ResultResolver::apply_default(other, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameRng, GameTime, PlayerState, ScriptedRolls, Season, WorldState};

    fn ctx() -> GameContext {
        GameContext::new(
            PlayerState::new(6).with_location("dark_woods", "forest"),
            WorldState::new(GameTime::at(22, 0), Season::Autumn, "clear"),
        )
    }

    #[test]
    fn test_pack_and_fight() {
        let mut instance = EventType::new(spirit_beast_ambush(), || Box::new(AmbushBehavior::default())).instantiate();
        let mut ctx = ctx();
        let mut rng = GameRng::new(21);
        instance.activate(&mut ctx, &mut rng).unwrap();

        let result = instance.process_choice(0, &mut ctx, &mut rng);
        assert!(result.success);
        assert!(result.concluded);
        let handoff = result.combat().unwrap();
        assert!(!handoff.enemies.is_empty());
        assert!(handoff.enemy_power > 0);
        assert_eq!(handoff.consequences.victory.items[0].item_id, "beast_core");
    }

    #[test]
    fn test_failed_flight_turns_into_combat() {
        let mut behavior = AmbushBehavior::default();
        let mut ctx = ctx();
        behavior.pack.push(Combatant::new("Spirit Wolf", 6));

        let caught = behavior.apply_result(&ResultSpec::Escape { base_chance: 0.5 }, &mut ctx, &mut ScriptedRolls::constant(0.7));
        assert_eq!(caught.combat.as_ref().map(|h| h.enemy_power), Some(7));

        let away = behavior.apply_result(&ResultSpec::Escape { base_chance: 0.5 }, &mut ctx, &mut ScriptedRolls::constant(0.3));
        assert!(away.combat.is_none());
    }

    #[test]
    fn test_hide_needs_stealth() {
        let def = spirit_beast_ambush();
        let hide = &def.choices[2];
        assert!(!hide.requirement.as_ref().unwrap().is_met(&ctx()));

        let mut sneaky = ctx();
        sneaky.player = sneaky.player.map(|p| p.with_skill("stealth", 3));
        assert!(hide.requirement.as_ref().unwrap().is_met(&sneaky));
    }
}
