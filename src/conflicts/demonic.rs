//! Demonic cultivator incursions.
//!
//! Cultists corrupt the region they appear in. Escalation spreads the
//! corruption to another region and opens (then strengthens) a demonic
//! portal. Purifying every corrupted site and sealing the portal ends the
//! incursion without a fight.
//!
//! ## Sub-state
//!
//! - corrupted sites: region ids this incursion has corrupted and not yet
//!   purified
//! - portal stability: `None` while no portal is open, otherwise in `[0, 100]`;
//!   the portal closes when stability reaches zero

use tracing::{debug, warn};

use super::context::ConflictContext;
use super::escalation::ConflictKind;
use super::scale::ConflictScale;
use crate::core::{EngineError, GameContext, Roller, VisualEffect};
use crate::events::{
    ChoiceSpec, Combatant, Requirement, ResourceKind, ResultOutcome, ResultResolver, ResultSpec, RewardItem, Rewards,
};

const BASE_ESCALATION_CHANCE: f64 = 0.35;
const PORTAL_MAX_STABILITY: f64 = 100.0;
const PORTAL_OPENING_STABILITY: f64 = 60.0;
const PORTAL_GROWTH_ON_ESCALATION: f64 = 25.0;

/// The demonic cultivator conflict type.
#[derive(Clone, Debug, Default)]
pub struct DemonicCultivators {
    cultist_count: u32,
    cultist_level: u32,
    corrupted_sites: Vec<String>,
    portal_stability: Option<f64>,
}

impl DemonicCultivators {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive cultist headcount range per scale.
    #[must_use]
    pub fn count_range(scale: ConflictScale) -> (i64, i64) {
        match scale {
            ConflictScale::Local => (1, 3),
            ConflictScale::Regional => (3, 6),
            ConflictScale::Global => (6, 10),
        }
    }

    #[must_use]
    pub fn cultist_level(scale: ConflictScale, player_level: u32) -> u32 {
        let factor = match scale {
            ConflictScale::Local => 0.8,
            ConflictScale::Regional => 0.95,
            ConflictScale::Global => 1.1,
        };
        ((f64::from(player_level) * factor).floor() as u32).max(1)
    }

    #[must_use]
    pub fn cultist_count(&self) -> u32 {
        self.cultist_count
    }

    #[must_use]
    pub fn corrupted_sites(&self) -> &[String] {
        &self.corrupted_sites
    }

    #[must_use]
    pub fn portal_stability(&self) -> Option<f64> {
        self.portal_stability
    }

    fn open_or_grow_portal(&mut self) {
        let next = match self.portal_stability {
            Some(stability) => stability + PORTAL_GROWTH_ON_ESCALATION,
            None => PORTAL_OPENING_STABILITY,
        };
        self.portal_stability = Some(next.clamp(0.0, PORTAL_MAX_STABILITY));
    }

    fn corrupt(&mut self, region_id: &str, ctx: &mut GameContext) {
        if !self.corrupted_sites.iter().any(|s| s == region_id) {
            self.corrupted_sites.push(region_id.to_string());
        }
        match ctx.world.as_mut() {
            Some(world) => {
                if let Some(region) = world.regions.iter_mut().find(|r| r.id == region_id) {
                    region.corrupted = true;
                }
            }
            None => warn!("{}", EngineError::missing("world", "region corruption")),
        }
    }

    fn purify(&mut self, conflict: &ConflictContext, ctx: &mut GameContext, rng: &mut dyn Roller) -> ResultOutcome {
        let Some(site) = self.corrupted_sites.last().cloned() else {
            return ResultOutcome::not_applied("purify", "No corruption remains to purify");
        };
        let skill = ctx.player.as_ref().map_or(0, |p| p.skill("purification"));
        let chance = (0.4 + f64::from(skill) * 0.1 - conflict.scale.tier() as f64 * 0.1).clamp(0.1, 0.95);

        if !rng.chance(chance) {
            let backlash = 10 * (conflict.scale.tier() as i64 + 1);
            let drained = ResultResolver::apply_resource(ResourceKind::Energy, -backlash, ctx);
            let outcome = ResultOutcome::applied(
                "purify",
                format!("The corruption at {site} resists; demonic backlash drains {backlash} energy"),
            );
            return match drained.new_value {
                Some(energy) => outcome.with_new_value(energy),
                None => outcome,
            };
        }

        self.corrupted_sites.pop();
        if let Some(region) = ctx
            .world
            .as_mut()
            .and_then(|w| w.regions.iter_mut().find(|r| r.id == site))
        {
            region.corrupted = false;
        }
        ResultResolver::apply_experience(conflict.rewards.experience / 4, ctx);
        debug!(site = %site, remaining = self.corrupted_sites.len(), "site purified");

        ResultOutcome::applied("purify", format!("The corruption at {site} is cleansed"))
            .with_new_value(self.corrupted_sites.len() as i64)
    }

    fn close_portal(&mut self, conflict: &ConflictContext, ctx: &mut GameContext) -> ResultOutcome {
        let Some(stability) = self.portal_stability else {
            return ResultOutcome::not_applied("close_portal", "No portal is open");
        };
        let formations = ctx.player.as_ref().map_or(0, |p| p.skill("formations"));
        let damage = 25.0 + 5.0 * f64::from(formations);
        let remaining = (stability - damage).clamp(0.0, PORTAL_MAX_STABILITY);

        if remaining <= 0.0 {
            self.portal_stability = None;
            ResultResolver::apply_rewards(&conflict.rewards.partial(0.5), ctx);
            return ResultOutcome::applied("close_portal", "Your formation seals the demonic portal").with_new_value(0);
        }

        self.portal_stability = Some(remaining);
        ResultOutcome::applied("close_portal", format!("The portal wavers (stability {remaining:.0})"))
            .with_new_value(remaining.round() as i64)
    }
}

impl ConflictKind for DemonicCultivators {
    fn label(&self) -> &str {
        "demonic cultivators"
    }

    fn base_escalation_chance(&self) -> f64 {
        BASE_ESCALATION_CHANCE
    }

    fn base_rewards(&self, level: u32) -> Rewards {
        let level = i64::from(level);
        Rewards {
            experience: level * 60,
            currency: level * 8,
            reputation: 10,
            items: Vec::new(),
        }
    }

    fn reward_items(&self, scale: ConflictScale) -> Vec<RewardItem> {
        let mut items = vec![RewardItem::new("demonic_core", "Demonic Core", 1)];
        if scale >= ConflictScale::Regional {
            items.push(RewardItem::new("corrupted_jade", "Corrupted Jade", 1));
        }
        if scale == ConflictScale::Global {
            items.push(RewardItem::new("purification_pearl", "Purification Pearl", 1));
        }
        items
    }

    fn build_enemy_group(&mut self, scale: ConflictScale, level: u32, rng: &mut dyn Roller) -> Vec<Combatant> {
        let (low, high) = Self::count_range(scale);
        self.cultist_count = rng.roll_int(low, high) as u32;
        self.cultist_level = Self::cultist_level(scale, level);

        let mut group: Vec<Combatant> = (0..self.cultist_count)
            .map(|_| Combatant::new("Demonic Cultivator", self.cultist_level))
            .collect();
        group.push(Combatant::elite(
            "Demonic Elder",
            self.cultist_level + 2 + 2 * scale.tier() as u32,
        ));
        if scale == ConflictScale::Global {
            group.push(Combatant::elite("Avatar of the Blood Demon", self.cultist_level + 8));
        }
        group
    }

    fn choices(&self, conflict: &ConflictContext) -> Vec<ChoiceSpec> {
        let tier = conflict.scale.tier() as u32;
        let mut choices = vec![
            ChoiceSpec::new("engage", "Confront the demonic cultivators")
                .with_result(ResultSpec::Combat { difficulty: 1.0 })
                .concludes(),
            ChoiceSpec::new("avoid", "Withdraw before they notice you")
                .with_result(ResultSpec::Escape { base_chance: 0.5 })
                .concludes(),
        ];
        if !self.corrupted_sites.is_empty() {
            choices.push(
                ChoiceSpec::new("purify", "Purify the corrupted land")
                    .requires(Requirement::Skill {
                        skill: "purification".into(),
                        level: 1 + 2 * tier,
                    })
                    .with_result(ResultSpec::Purify),
            );
        }
        if self.portal_stability.is_some() {
            choices.push(
                ChoiceSpec::new("close_portal", "Lay a sealing formation over the portal")
                    .requires(Requirement::Skill {
                        skill: "formations".into(),
                        level: 2 + 2 * tier,
                    })
                    .with_result(ResultSpec::ClosePortal),
            );
        }
        choices
    }

    fn announcement(&self, conflict: &ConflictContext) -> (String, String) {
        let place = conflict.location.as_deref().unwrap_or("the wilds");
        let title = match conflict.scale {
            ConflictScale::Local => "Demonic Cultivators Sighted",
            ConflictScale::Regional => "Demonic Corruption Spreads",
            ConflictScale::Global => "The Demonic Tide",
        };
        let message = match self.portal_stability {
            Some(stability) => format!(
                "Demonic qi pours from a portal near {place} (stability {stability:.0}). {} sites are corrupted.",
                self.corrupted_sites.len()
            ),
            None => format!("Cultists are defiling the land near {place}."),
        };
        (title.to_string(), message)
    }

    fn on_activate(&mut self, conflict: &ConflictContext, instance_id: &str, ctx: &mut GameContext) {
        self.corrupted_sites.clear();
        self.portal_stability = None;

        if let Some(location) = &conflict.location {
            self.corrupt(location, ctx);
        }
        if conflict.scale >= ConflictScale::Regional {
            self.open_or_grow_portal();
        }
        if let Some(world) = ctx.world.as_mut() {
            world.visual_effects.push(VisualEffect {
                id: format!("{instance_id}:demonic_mist"),
                kind: "demonic_mist".into(),
                intensity: 0.4 + 0.2 * conflict.scale.tier() as f64,
            });
        }
    }

    fn on_escalate(
        &mut self,
        _from: &ConflictContext,
        to: &ConflictContext,
        ctx: &mut GameContext,
        rng: &mut dyn Roller,
    ) {
        let candidates: Vec<String> = ctx
            .world
            .as_ref()
            .map(|w| {
                w.regions
                    .iter()
                    .filter(|r| !r.safe_zone && !r.corrupted && !self.corrupted_sites.contains(&r.id))
                    .map(|r| r.id.clone())
                    .collect()
            })
            .unwrap_or_default();
        if let Some(index) = rng.pick_index(candidates.len()) {
            self.corrupt(&candidates[index], ctx);
        }
        self.open_or_grow_portal();
        debug!(
            scale = %to.scale,
            sites = self.corrupted_sites.len(),
            portal = ?self.portal_stability,
            "corruption spread"
        );
    }

    fn resolve(
        &mut self,
        spec: &ResultSpec,
        conflict: &ConflictContext,
        ctx: &mut GameContext,
        rng: &mut dyn Roller,
    ) -> Option<ResultOutcome> {
        match spec {
            ResultSpec::Purify => Some(self.purify(conflict, ctx, rng)),
            ResultSpec::ClosePortal => Some(self.close_portal(conflict, ctx)),
            _ => None,
        }
    }

    fn wants_conclusion(&self) -> bool {
        self.corrupted_sites.is_empty() && self.portal_stability.is_none()
    }

    fn on_conclude(&mut self, _instance_id: &str, _ctx: &mut GameContext) {
        // Unpurified sites stay corrupted in the world.
        self.portal_stability = None;
    }
}
