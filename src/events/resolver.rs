//! Default result resolution.
//!
//! `ResultResolver` interprets the generic result tags (`resource`,
//! `experience`, `item`, `meditation`) against the player sub-tree. Event behaviors
//! handle their own tags first and fall back here; anything this resolver
//! does not know comes back as `applied: false`.

use tracing::{debug, warn};

use crate::core::{EngineError, GameContext};

use super::definition::{ResourceKind, ResultSpec};
use super::outcome::{Penalty, ResultOutcome, Rewards};

/// Experience points per point of bottleneck progress.
const EXPERIENCE_PER_BOTTLENECK_POINT: i64 = 10;
/// Energy restored by one meditation at potency 1.0.
const MEDITATION_ENERGY: f64 = 25.0;
/// Experience gained by one meditation at potency 1.0.
const MEDITATION_EXPERIENCE: f64 = 40.0;

/// Resolves generic result tags on the game context.
pub struct ResultResolver;

impl ResultResolver {
    /// Resolve a result spec with the default handlers.
    pub fn apply_default(spec: &ResultSpec, ctx: &mut GameContext) -> ResultOutcome {
        match spec {
            ResultSpec::Resource { resource, amount } => Self::apply_resource(*resource, *amount, ctx),
            ResultSpec::Experience { amount } => Self::apply_experience(*amount, ctx),
            ResultSpec::Item {
                item_id,
                name,
                quantity,
            } => Self::apply_item(item_id, name, *quantity, ctx),
            ResultSpec::Meditation { potency } => Self::apply_meditation(*potency, ctx),
            ResultSpec::Unknown { tag } => {
                let err = EngineError::UnknownResultTag { tag: tag.clone() };
                debug!(%tag, "{err}");
                ResultOutcome::not_applied(tag.as_str(), err.to_string())
            }
            other => {
                debug!(tag = other.tag(), "no default handler for result");
                ResultOutcome::not_applied(other.tag(), format!("no handler for `{}`", other.tag()))
            }
        }
    }

    /// Add to energy, currency or reputation.
    pub fn apply_resource(resource: ResourceKind, amount: i64, ctx: &mut GameContext) -> ResultOutcome {
        let Some(player) = ctx.player.as_mut() else {
            return missing("player", "resource result");
        };

        match resource {
            ResourceKind::Energy => {
                let cultivation = &mut player.cultivation;
                cultivation.energy = (cultivation.energy + amount).clamp(0, cultivation.max_energy);
                ResultOutcome::applied("resource", format!("Spiritual energy changed by {amount}"))
                    .with_new_value(cultivation.energy)
            }
            ResourceKind::Currency => {
                let Some(inventory) = player.inventory.as_mut() else {
                    return missing("player.inventory", "currency result");
                };
                inventory.currency = (inventory.currency + amount).max(0);
                ResultOutcome::applied("resource", format!("Spirit stones changed by {amount}"))
                    .with_new_value(inventory.currency)
            }
            ResourceKind::Reputation => {
                player.reputation += amount;
                ResultOutcome::applied("resource", format!("Reputation changed by {amount}"))
                    .with_new_value(player.reputation)
            }
        }
    }

    /// Grant experience. Also advances bottleneck progress (clamped).
    pub fn apply_experience(amount: i64, ctx: &mut GameContext) -> ResultOutcome {
        let Some(player) = ctx.player.as_mut() else {
            return missing("player", "experience result");
        };
        let cultivation = &mut player.cultivation;
        cultivation.experience = (cultivation.experience + amount).max(0);
        cultivation.add_bottleneck_progress(amount / EXPERIENCE_PER_BOTTLENECK_POINT);
        ResultOutcome::applied("experience", format!("Gained {amount} cultivation experience"))
            .with_new_value(cultivation.experience)
    }

    /// Put items into the inventory.
    pub fn apply_item(item_id: &str, name: &str, quantity: u32, ctx: &mut GameContext) -> ResultOutcome {
        let Some(inventory) = ctx.player.as_mut().and_then(|p| p.inventory.as_mut()) else {
            return missing("player.inventory", "item result");
        };
        let total = inventory.add_item(item_id, name, quantity);
        ResultOutcome::applied("item", format!("Received {quantity}x {name}")).with_new_value(i64::from(total))
    }

    /// Meditate: restore energy and gain experience, both scaled by potency.
    ///
    /// The outcome's `new_value` is the experience total.
    pub fn apply_meditation(potency: f64, ctx: &mut GameContext) -> ResultOutcome {
        if ctx.player.is_none() {
            return missing("player", "meditation result");
        }
        let energy = (MEDITATION_ENERGY * potency).round() as i64;
        let experience = (MEDITATION_EXPERIENCE * potency).round() as i64;
        Self::apply_resource(ResourceKind::Energy, energy, ctx);
        let gained = Self::apply_experience(experience, ctx);

        let mut outcome = ResultOutcome::applied(
            "meditation",
            format!("Meditation restores {energy} energy and yields {experience} experience"),
        );
        outcome.new_value = gained.new_value;
        outcome
    }

    /// Apply a whole reward block, one outcome per non-empty part.
    pub fn apply_rewards(rewards: &Rewards, ctx: &mut GameContext) -> Vec<ResultOutcome> {
        let mut outcomes = Vec::new();
        if rewards.experience != 0 {
            outcomes.push(Self::apply_experience(rewards.experience, ctx));
        }
        if rewards.currency != 0 {
            outcomes.push(Self::apply_resource(ResourceKind::Currency, rewards.currency, ctx));
        }
        if rewards.reputation != 0 {
            outcomes.push(Self::apply_resource(ResourceKind::Reputation, rewards.reputation, ctx));
        }
        for item in &rewards.items {
            outcomes.push(Self::apply_item(&item.item_id, &item.name, item.quantity, ctx));
        }
        outcomes
    }

    /// Apply a penalty block.
    pub fn apply_penalty(penalty: &Penalty, ctx: &mut GameContext) -> Vec<ResultOutcome> {
        let mut outcomes = Vec::new();
        if penalty.energy_loss != 0 {
            outcomes.push(Self::apply_resource(ResourceKind::Energy, -penalty.energy_loss, ctx));
        }
        if penalty.currency_loss != 0 {
            outcomes.push(Self::apply_resource(ResourceKind::Currency, -penalty.currency_loss, ctx));
        }
        if penalty.reputation_loss != 0 {
            outcomes.push(Self::apply_resource(ResourceKind::Reputation, -penalty.reputation_loss, ctx));
        }
        outcomes
    }
}

fn missing(subtree: &str, skipped: &str) -> ResultOutcome {
    let err = EngineError::missing(subtree, skipped);
    warn!("{err}");
    ResultOutcome::not_applied(skipped, err.to_string())
}
