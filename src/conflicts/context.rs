//! Runtime state of an escalating conflict.

use serde::{Deserialize, Serialize};

use super::scale::ConflictScale;
use crate::core::GameTime;
use crate::events::{Combatant, Rewards};

/// Everything that depends on the current scale.
///
/// Never patched in place: an escalation builds a whole new context for the
/// next scale and the previous one goes into the audit history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConflictContext {
    pub scale: ConflictScale,
    pub enemy_power: u64,
    pub enemy_group: Vec<Combatant>,
    pub rewards: Rewards,
    /// Probability in `[0, 1]` that the next escalation check succeeds.
    pub escalation_chance: f64,
    pub expiration_time: GameTime,
    /// Region the conflict is centred on, when known.
    pub location: Option<String>,
}

impl ConflictContext {
    #[must_use]
    pub fn is_expired(&self, now: GameTime) -> bool {
        now >= self.expiration_time
    }
}
