//! Core engine types: game context, time, RNG, configuration, errors.
//!
//! This module contains the building blocks every event family shares.
//! Event-specific behavior lives in `events`, `conflicts` and `plugins`.

pub mod context;
pub mod time;
pub mod rng;
pub mod config;
pub mod error;

pub use context::{
    ActiveBuff, AtmosphericEffect, Cultivation, GameContext, Inventory, InventoryItem, Location,
    Notification, NotificationKind, PlayerState, Region, Season, UiState, VisualEffect, WorldState,
};
pub use time::{GameTime, DAYS_PER_MONTH, MONTHS_PER_YEAR};
pub use rng::{GameRng, GameRngState, Roller, ScriptedRolls};
pub use config::{EngineConfig, RarityChances};
pub use error::{EngineError, EngineResult};
