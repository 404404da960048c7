//! Social plugin: the wandering merchant fair.
//!
//! A travelling fair sets up for a few hours with a random selection of
//! wares. Browsing buys the first affordable ware at a discount; gathering
//! rumors reveals one rumor at a time. The fair packs up on its own once
//! the stock is sold out.

use tracing::debug;

use super::registry::{EventPlugin, EventType};
use crate::core::{GameContext, Notification, NotificationKind, Roller};
use crate::events::{
    ActivationScope, ChoiceSpec, ConditionSet, DayPeriod, DurationRange, EventBehavior, EventCategory,
    EventDefinition, Rarity, ResourceKind, ResultOutcome, ResultResolver, ResultSpec,
};

pub const WANDERING_MERCHANT_FAIR: &str = "wandering_merchant_fair";

/// How many wares the fair brings.
const STOCK_SIZE: usize = 3;

/// (item id, name, price in spirit stones)
const CATALOG: [(&str, &str, i64); 6] = [
    ("qi_gathering_pill", "Qi Gathering Pill", 40),
    ("spirit_herb_bundle", "Spirit Herb Bundle", 25),
    ("jade_talisman", "Jade Protection Talisman", 90),
    ("beast_taming_whistle", "Beast Taming Whistle", 60),
    ("cloud_step_manual", "Cloud Step Manual", 150),
    ("spirit_ink", "Spirit Ink", 15),
];

const RUMORS: [&str; 4] = [
    "The Azure Cloud Sect is quietly recruiting outer disciples.",
    "A cave of an ancient cultivator was uncovered near the eastern ridge.",
    "Bandits have been seen carrying demonic tokens.",
    "The next full moon is said to bless those who cultivate under it.",
];

pub fn plugin() -> EventPlugin {
    EventPlugin::new("social", "Social Encounters")
        .with_event(EventType::new(wandering_merchant_fair(), || Box::new(FairBehavior::default())))
}

pub fn wandering_merchant_fair() -> EventDefinition {
    EventDefinition::new(WANDERING_MERCHANT_FAIR, "Wandering Merchant Fair", EventCategory::Social)
        .with_description("Colourful stalls line the road as a travelling fair sets up shop.")
        .with_rarity(Rarity::Uncommon)
        .with_duration(DurationRange::new(120, 240))
        .with_cooldown_days(3)
        .with_conditions(
            ConditionSet::new()
                .with_location_type("city", 2.0)
                .with_location_type("village", 1.5)
                .with_location_type("forest", 0.3)
                .with_day_period(DayPeriod::Morning, 1.2)
                .with_day_period(DayPeriod::Afternoon, 1.2)
                .with_day_period(DayPeriod::Night, 0.2)
                .with_day_period(DayPeriod::DeepNight, 0.0),
        )
        .with_choice(
            ChoiceSpec::new("browse", "Browse the stalls").with_result(ResultSpec::Trading { discount: 0.2 }),
        )
        .with_choice(
            ChoiceSpec::new("rumors", "Listen for rumors").with_result(ResultSpec::InformationGathering {
                topic: "the jianghu".into(),
            }),
        )
        .with_choice(ChoiceSpec::new("leave", "Move on").concludes())
}

/// A ware on offer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ware {
    pub item_id: String,
    pub name: String,
    pub price: i64,
}

/// Stock and rumor state of one fair.
#[derive(Clone, Debug, Default)]
pub struct FairBehavior {
    instance_id: String,
    stock: Vec<Ware>,
    rumors: Vec<&'static str>,
}

impl FairBehavior {
    #[must_use]
    pub fn stock(&self) -> &[Ware] {
        &self.stock
    }

    fn trade(&mut self, discount: f64, ctx: &mut GameContext) -> ResultOutcome {
        let funds = ctx
            .player
            .as_ref()
            .and_then(|p| p.inventory.as_ref())
            .map_or(0, |inv| inv.currency);
        let price_of = |ware: &Ware| (ware.price as f64 * (1.0 - discount)).round() as i64;

        let Some(position) = self.stock.iter().position(|w| price_of(w) <= funds) else {
            return ResultOutcome::not_applied("trading", "Nothing here is within your means");
        };
        let ware = self.stock.remove(position);
        let price = price_of(&ware);

        let paid = ResultResolver::apply_resource(ResourceKind::Currency, -price, ctx);
        if !paid.applied {
            self.stock.insert(position, ware);
            return ResultOutcome::not_applied("trading", paid.description);
        }
        ResultResolver::apply_item(&ware.item_id, &ware.name, 1, ctx);
        debug!(item = %ware.item_id, price, "fair purchase");

        let outcome = ResultOutcome::applied("trading", format!("Bought {} for {price} spirit stones", ware.name));
        match paid.new_value {
            Some(remaining) => outcome.with_new_value(remaining),
            None => outcome,
        }
    }

    fn gather(&mut self, topic: &str, instance_id: &str, ctx: &mut GameContext) -> ResultOutcome {
        if self.rumors.is_empty() {
            return ResultOutcome::not_applied("information_gathering", "You have heard every rumor worth hearing");
        }
        let rumor = self.rumors.remove(0);
        ctx.notify(Notification {
            id: format!("{instance_id}:rumor-{}", self.rumors.len()),
            kind: NotificationKind::Info,
            title: format!("Rumors of {topic}"),
            message: rumor.to_string(),
        });
        ResultOutcome::applied("information_gathering", rumor)
    }
}

impl EventBehavior for FairBehavior {
    fn on_activate(&mut self, scope: &ActivationScope<'_>, _ctx: &mut GameContext, rng: &mut dyn Roller) {
        let mut catalog: Vec<_> = CATALOG.to_vec();
        self.stock.clear();
        while self.stock.len() < STOCK_SIZE {
            let Some(index) = rng.pick_index(catalog.len()) else {
                break;
            };
            let (item_id, name, price) = catalog.remove(index);
            self.stock.push(Ware {
                item_id: item_id.to_string(),
                name: name.to_string(),
                price,
            });
        }
        self.rumors = RUMORS.to_vec();
        self.instance_id = scope.instance_id.to_string();
        debug!(instance = scope.instance_id, wares = self.stock.len(), "fair stocked");
    }

    fn apply_result(&mut self, spec: &ResultSpec, ctx: &mut GameContext, _rng: &mut dyn Roller) -> ResultOutcome {
        match spec {
            ResultSpec::Trading { discount } => self.trade(*discount, ctx),
            ResultSpec::InformationGathering { topic } => {
                let instance_id = self.instance_id.clone();
                self.gather(topic, &instance_id, ctx)
            }
            other => ResultResolver::apply_default(other, ctx),
        }
    }

    fn wants_conclusion(&self) -> bool {
        self.stock.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameTime, PlayerState, ScriptedRolls, Season, WorldState};

    fn stocked(rolls: f64) -> FairBehavior {
        let def = wandering_merchant_fair();
        let scope = ActivationScope {
            instance_id: "fair-1",
            definition: &def,
            start_time: GameTime::at(10, 0),
            end_time: GameTime::at(12, 0),
        };
        let mut behavior = FairBehavior::default();
        behavior.on_activate(&scope, &mut GameContext::default(), &mut ScriptedRolls::constant(rolls));
        behavior
    }

    fn ctx(currency: i64) -> GameContext {
        GameContext::new(
            PlayerState::new(3).with_currency(currency),
            WorldState::new(GameTime::at(10, 0), Season::Spring, "clear"),
        )
    }

    #[test]
    fn test_stock_is_distinct() {
        let fair = stocked(0.0);
        let ids: Vec<_> = fair.stock().iter().map(|w| w.item_id.as_str()).collect();
        assert_eq!(ids, ["qi_gathering_pill", "spirit_herb_bundle", "jade_talisman"]);
    }

    #[test]
    fn test_trade_buys_first_affordable_at_discount() {
        let mut fair = stocked(0.0);
        let mut ctx = ctx(25);

        // pill costs 32 after discount, herbs cost 20
        let outcome = fair.trade(0.2, &mut ctx);
        assert!(outcome.applied);
        assert_eq!(outcome.new_value, Some(5));
        let inventory = ctx.player.as_ref().unwrap().inventory.as_ref().unwrap();
        assert_eq!(inventory.quantity_of("spirit_herb_bundle"), 1);
        assert_eq!(fair.stock().len(), 2);

        let broke = fair.trade(0.2, &mut ctx);
        assert!(!broke.applied);
    }

    #[test]
    fn test_rumors_run_out() {
        let mut fair = stocked(0.0);
        let mut ctx = ctx(0);
        for _ in 0..RUMORS.len() {
            assert!(fair.gather("the jianghu", "fair-1", &mut ctx).applied);
        }
        assert!(!fair.gather("the jianghu", "fair-1", &mut ctx).applied);
        assert_eq!(ctx.ui.as_ref().unwrap().notifications.len(), RUMORS.len());
    }
}
