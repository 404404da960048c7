//! Scale-aware conflict behavior.
//!
//! `ConflictEscalationManager` is the `EventBehavior` behind every conflict
//! event. It owns the current `ConflictContext`, computes power and rewards
//! per scale, and walks the scale forward on escalation. What differs
//! between conflict types (who the enemies are, which extra choices exist,
//! what sub-state changes on escalation) is delegated to a `ConflictKind`.
//!
//! ## Formulas
//!
//! - base power: `floor(level × scale_mult × U(0.9, 1.3))`
//! - enemy power: `floor(base_power × scale_mult)`
//! - rewards: the kind's local rewards × the scale's reward multiplier
//! - escalation chance: the kind's base, 0 at global, × decay per escalation

use im::Vector;
use tracing::{debug, info, warn};

use super::context::ConflictContext;
use super::scale::ConflictScale;
use super::settings::ConflictSettings;
use crate::core::{EngineError, EngineResult, GameContext, GameTime, Notification, NotificationKind, Roller};
use crate::events::{
    ActivationScope, ChoiceSpec, CombatHandoff, Combatant, Consequences, EventBehavior, EventDefinition,
    Penalty, ResultOutcome, ResultResolver, ResultSpec, RewardItem, Rewards,
};

/// Lower bound of the power roll.
const POWER_ROLL_MIN: f64 = 0.9;
/// Upper bound of the power roll.
const POWER_ROLL_MAX: f64 = 1.3;

/// What makes one conflict type different from another.
pub trait ConflictKind: std::fmt::Debug + Send {
    /// Short label for logs and notifications ("bandit attack").
    fn label(&self) -> &str;

    /// Escalation chance at local and regional scale.
    fn base_escalation_chance(&self) -> f64;

    /// Rewards of a local-scale conflict at a player level.
    fn base_rewards(&self, level: u32) -> Rewards;

    /// Extra items granted at a scale.
    fn reward_items(&self, _scale: ConflictScale) -> Vec<RewardItem> {
        Vec::new()
    }

    /// Build the enemy group for a scale. Kinds keep whatever counts they
    /// need for later choice resolution.
    fn build_enemy_group(&mut self, scale: ConflictScale, level: u32, rng: &mut dyn Roller) -> Vec<Combatant>;

    /// Choices on offer for the current context.
    fn choices(&self, conflict: &ConflictContext) -> Vec<ChoiceSpec>;

    /// Headline and body of the activation notification.
    fn announcement(&self, conflict: &ConflictContext) -> (String, String);

    /// Type-specific initial effects.
    fn on_activate(&mut self, _conflict: &ConflictContext, _instance_id: &str, _ctx: &mut GameContext) {}

    /// Type-specific sub-state changes when the scale advances.
    fn on_escalate(
        &mut self,
        _from: &ConflictContext,
        _to: &ConflictContext,
        _ctx: &mut GameContext,
        _rng: &mut dyn Roller,
    ) {
    }

    /// Resolve a type-specific result tag. `None` falls through to the
    /// shared combat/escape handling and then the default resolver.
    fn resolve(
        &mut self,
        _spec: &ResultSpec,
        _conflict: &ConflictContext,
        _ctx: &mut GameContext,
        _rng: &mut dyn Roller,
    ) -> Option<ResultOutcome> {
        None
    }

    /// What losing the fight costs.
    fn defeat_penalty(&self, conflict: &ConflictContext) -> Penalty {
        default_defeat_penalty(conflict)
    }

    fn wants_conclusion(&self) -> bool {
        false
    }

    fn on_conclude(&mut self, _instance_id: &str, _ctx: &mut GameContext) {}
}

/// Energy, half the stake in spirit stones, and reputation by tier.
#[must_use]
pub fn default_defeat_penalty(conflict: &ConflictContext) -> Penalty {
    Penalty {
        energy_loss: conflict.enemy_power as i64 * 2,
        currency_loss: conflict.rewards.currency / 2,
        reputation_loss: conflict.scale.tier() as i64 * 5,
    }
}

/// Combat handoff for a conflict, with enemy power scaled by `difficulty`.
#[must_use]
pub fn combat_handoff(conflict: &ConflictContext, difficulty: f64, defeat: Penalty) -> CombatHandoff {
    CombatHandoff {
        enemy_power: (conflict.enemy_power as f64 * difficulty).round() as u64,
        enemies: conflict.enemy_group.clone(),
        consequences: Consequences {
            victory: conflict.rewards.clone(),
            defeat,
        },
    }
}

/// Scale-aware conflict lifecycle, used as an `EventBehavior`.
#[derive(Debug)]
pub struct ConflictEscalationManager {
    kind: Box<dyn ConflictKind>,
    settings: ConflictSettings,
    initial_scale: ConflictScale,
    player_level: u32,
    instance_id: String,
    current: Option<ConflictContext>,
    /// Every context this conflict has left behind, oldest first.
    history: Vector<ConflictContext>,
}

impl ConflictEscalationManager {
    /// A conflict that starts at local scale.
    #[must_use]
    pub fn new(kind: Box<dyn ConflictKind>, settings: ConflictSettings) -> Self {
        Self {
            kind,
            settings,
            initial_scale: ConflictScale::Local,
            player_level: 1,
            instance_id: String::new(),
            current: None,
            history: Vector::new(),
        }
    }

    /// Start at a caller-chosen scale (builder pattern).
    #[must_use]
    pub fn with_scale(mut self, scale: ConflictScale) -> Self {
        self.set_initial_scale(scale);
        self
    }

    /// Change the scale the next activation starts at.
    pub fn set_initial_scale(&mut self, scale: ConflictScale) {
        self.initial_scale = scale;
    }

    #[must_use]
    pub fn kind(&self) -> &dyn ConflictKind {
        self.kind.as_ref()
    }

    #[must_use]
    pub fn settings(&self) -> &ConflictSettings {
        &self.settings
    }

    /// The live context. `None` before activation.
    #[must_use]
    pub fn context(&self) -> Option<&ConflictContext> {
        self.current.as_ref()
    }

    /// Contexts replaced by escalations, oldest first.
    #[must_use]
    pub fn history(&self) -> &Vector<ConflictContext> {
        &self.history
    }

    // === Formulas ===

    /// `floor(level × scale_mult × U(0.9, 1.3))`.
    pub fn base_power(&self, scale: ConflictScale, level: u32, rng: &mut dyn Roller) -> u64 {
        let multiplier = self.settings.scale(scale).power_multiplier;
        let roll = rng.roll_between(POWER_ROLL_MIN, POWER_ROLL_MAX);
        (f64::from(level.max(1)) * multiplier * roll).floor() as u64
    }

    /// `floor(base_power × scale_mult)`.
    pub fn enemy_power(&self, scale: ConflictScale, level: u32, rng: &mut dyn Roller) -> u64 {
        let multiplier = self.settings.scale(scale).power_multiplier;
        (self.base_power(scale, level, rng) as f64 * multiplier).floor() as u64
    }

    /// Rewards at a scale: the kind's local rewards times the scale's multiplier.
    #[must_use]
    pub fn rewards_for(&self, scale: ConflictScale, level: u32) -> Rewards {
        let multiplier = self.settings.scale(scale).reward_multiplier;
        let mut rewards = self.kind.base_rewards(level.max(1)).scaled(multiplier);
        rewards.items.extend(self.kind.reward_items(scale));
        rewards
    }

    /// Escalation chance for a freshly activated conflict.
    #[must_use]
    pub fn initial_escalation_chance(&self, scale: ConflictScale) -> f64 {
        match scale {
            ConflictScale::Global => 0.0,
            _ => self.kind.base_escalation_chance(),
        }
    }

    fn build_context(
        &mut self,
        scale: ConflictScale,
        level: u32,
        escalation_chance: f64,
        now: GameTime,
        location: Option<String>,
        rng: &mut dyn Roller,
    ) -> ConflictContext {
        let enemy_power = self.enemy_power(scale, level, rng);
        let enemy_group = self.kind.build_enemy_group(scale, level, rng);
        let rewards = self.rewards_for(scale, level);
        let duration = self.settings.scale(scale).duration_minutes;

        ConflictContext {
            scale,
            enemy_power,
            enemy_group,
            rewards,
            escalation_chance: escalation_chance.clamp(0.0, 1.0),
            expiration_time: now.plus_minutes(u64::from(duration)),
            location,
        }
    }

    // === Escalation ===

    /// One Bernoulli draw against the escalation chance. False at global
    /// scale or before activation, without drawing.
    pub fn can_escalate(&self, rng: &mut dyn Roller) -> bool {
        match &self.current {
            Some(conflict) if conflict.scale != ConflictScale::Global => {
                rng.chance(conflict.escalation_chance)
            }
            _ => false,
        }
    }

    /// Advance to the next scale, rebuilding the whole context for it.
    pub fn escalate(&mut self, ctx: &mut GameContext, rng: &mut dyn Roller) -> EngineResult<ConflictContext> {
        let current = self.current.clone().ok_or_else(|| EngineError::EventNotActive {
            instance_id: self.instance_id.clone(),
        })?;
        let next_scale = current.scale.next().ok_or(EngineError::MaxScaleReached)?;

        let level = ctx.player_level().unwrap_or(self.player_level).max(1);
        self.player_level = level;
        let now = ctx.now().unwrap_or_else(|| {
            warn!("{}", EngineError::missing("world", "escalation time; extending from previous expiration"));
            current.expiration_time
        });
        let escalation_chance = match next_scale {
            ConflictScale::Global => 0.0,
            _ => current.escalation_chance * self.settings.escalation_decay,
        };

        let next = self.build_context(next_scale, level, escalation_chance, now, current.location.clone(), rng);
        self.kind.on_escalate(&current, &next, ctx, rng);

        let (title, message) = self.kind.announcement(&next);
        ctx.notify(Notification {
            id: format!("{}:escalation-{}", self.instance_id, next_scale),
            kind: NotificationKind::Danger,
            title,
            message,
        });

        info!(
            conflict = self.kind.label(),
            instance = %self.instance_id,
            from = %current.scale,
            to = %next_scale,
            enemy_power = next.enemy_power,
            "conflict escalated"
        );

        self.history.push_back(current);
        self.current = Some(next.clone());
        Ok(next)
    }

    // === Shared result handling ===

    fn resolve_escape(&self, base_chance: f64, conflict: &ConflictContext, ctx: &GameContext, rng: &mut dyn Roller) -> ResultOutcome {
        let agility = ctx.player.as_ref().map_or(0, |p| p.stat("agility"));
        let chance = (base_chance + agility as f64 * 0.01 - conflict.scale.tier() as f64 * 0.1).clamp(0.05, 0.95);
        if rng.chance(chance) {
            ResultOutcome::applied("escape", format!("You slip away from the {}", self.kind.label()))
        } else {
            ResultOutcome::combat_initiated(
                "escape",
                "You are cornered and must fight",
                combat_handoff(conflict, 1.0, self.kind.defeat_penalty(conflict)),
            )
        }
    }
}

fn conflict_location(ctx: &GameContext) -> Option<String> {
    if let Some(location) = ctx.player.as_ref().and_then(|p| p.location.as_ref()) {
        return Some(location.region.clone());
    }
    ctx.world
        .as_ref()
        .and_then(|w| w.regions.iter().find(|r| !r.safe_zone))
        .map(|r| r.id.clone())
}

impl EventBehavior for ConflictEscalationManager {
    fn on_activate(&mut self, scope: &ActivationScope<'_>, ctx: &mut GameContext, rng: &mut dyn Roller) {
        let level = ctx.player_level().unwrap_or_else(|| {
            warn!("{}", EngineError::missing("player", "player level; conflict scaled for level 1"));
            1
        });
        self.player_level = level.max(1);
        self.instance_id = scope.instance_id.to_string();
        self.history = Vector::new();

        let scale = self.initial_scale;
        let chance = self.initial_escalation_chance(scale);
        let location = conflict_location(ctx);
        let conflict = self.build_context(scale, self.player_level, chance, scope.start_time, location, rng);

        self.kind.on_activate(&conflict, scope.instance_id, ctx);

        let (title, message) = self.kind.announcement(&conflict);
        ctx.notify(Notification {
            id: format!("{}:conflict", scope.instance_id),
            kind: NotificationKind::Danger,
            title,
            message,
        });

        debug!(
            conflict = self.kind.label(),
            scale = %conflict.scale,
            enemy_power = conflict.enemy_power,
            enemies = conflict.enemy_group.len(),
            "conflict context built"
        );
        self.current = Some(conflict);
    }

    fn choices(&self, def: &EventDefinition) -> Vec<ChoiceSpec> {
        match &self.current {
            Some(conflict) => self.kind.choices(conflict),
            None => def.choices.clone(),
        }
    }

    fn apply_result(&mut self, spec: &ResultSpec, ctx: &mut GameContext, rng: &mut dyn Roller) -> ResultOutcome {
        let Some(conflict) = self.current.clone() else {
            return ResultResolver::apply_default(spec, ctx);
        };

        if let Some(outcome) = self.kind.resolve(spec, &conflict, ctx, rng) {
            return outcome;
        }

        match spec {
            ResultSpec::Combat { difficulty } => ResultOutcome::combat_initiated(
                "combat",
                format!("You engage the {}", self.kind.label()),
                combat_handoff(&conflict, *difficulty, self.kind.defeat_penalty(&conflict)),
            ),
            ResultSpec::Escape { base_chance } => self.resolve_escape(*base_chance, &conflict, ctx, rng),
            other => ResultResolver::apply_default(other, ctx),
        }
    }

    fn wants_conclusion(&self) -> bool {
        self.kind.wants_conclusion()
    }

    fn on_conclude(&mut self, instance_id: &str, ctx: &mut GameContext) {
        self.kind.on_conclude(instance_id, ctx);
    }

    fn as_conflict(&self) -> Option<&ConflictEscalationManager> {
        Some(self)
    }

    fn as_conflict_mut(&mut self) -> Option<&mut ConflictEscalationManager> {
        Some(self)
    }
}
