//! Scale-aware conflicts.
//!
//! ## Key Types
//!
//! - `ConflictScale`: local, regional, global; only ever advances
//! - `ConflictContext`: power, enemies, rewards and escalation chance at the
//!   current scale
//! - `ConflictEscalationManager`: the `EventBehavior` that owns a conflict's
//!   context and escalation
//! - `ConflictKind`: what differs between conflict types (`BanditAttack`,
//!   `DemonicCultivators`)
//! - `ConflictSettings`: per-scale balance, published as plugin metadata
//! - `check_conflict_conditions`: the daily spawn check

pub mod scale;
pub mod settings;
pub mod context;
pub mod escalation;
pub mod bandit;
pub mod demonic;
pub mod spawn;

pub use scale::ConflictScale;
pub use settings::{ConflictSettings, ScaleSettings};
pub use context::ConflictContext;
pub use escalation::{combat_handoff, default_defeat_penalty, ConflictEscalationManager, ConflictKind};
pub use bandit::{intimidation_chance, BanditAttack};
pub use demonic::DemonicCultivators;
pub use spawn::{check_conflict_conditions, ConflictSpawnCheck, ConflictTracker};
