//! The game context: the caller-owned snapshot the engine reads and writes.
//!
//! ## Ownership
//!
//! The engine never owns a `GameContext`. It is passed by `&mut` into each
//! call; the caller persists whatever the engine mutated. Every sub-tree is
//! optional: an absent `player`, `world`, `ui`, inventory or location means
//! "feature unavailable", and the engine skips whatever depends on it.
//!
//! ## Instance-keyed effects
//!
//! Buffs, visual effects and atmospheric effects pushed by an event carry the
//! activating instance id as an id prefix (`"<instance_id>:<name>"`).
//! `GameContext::remove_instance_effects` strips them again on conclude.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::time::GameTime;

/// Root of the caller-owned game snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameContext {
    #[serde(default)]
    pub player: Option<PlayerState>,
    #[serde(default)]
    pub world: Option<WorldState>,
    #[serde(default)]
    pub ui: Option<UiState>,
}

impl GameContext {
    /// A context with all three sub-trees present.
    #[must_use]
    pub fn new(player: PlayerState, world: WorldState) -> Self {
        Self {
            player: Some(player),
            world: Some(world),
            ui: Some(UiState::default()),
        }
    }

    /// Player cultivation level, if a player sub-tree exists.
    #[must_use]
    pub fn player_level(&self) -> Option<u32> {
        self.player.as_ref().map(|p| p.cultivation.level)
    }

    /// Current game time, if a world sub-tree exists.
    #[must_use]
    pub fn now(&self) -> Option<GameTime> {
        self.world.as_ref().map(|w| w.time)
    }

    /// Queue a notification. Returns false when there is no ui sub-tree.
    pub fn notify(&mut self, notification: Notification) -> bool {
        match self.ui.as_mut() {
            Some(ui) => {
                ui.notifications.push(notification);
                true
            }
            None => false,
        }
    }

    /// Remove every buff and world effect keyed by `instance_id`.
    ///
    /// Returns how many entries were removed.
    pub fn remove_instance_effects(&mut self, instance_id: &str) -> usize {
        let prefix = format!("{instance_id}:");
        let mut removed = 0;

        if let Some(player) = self.player.as_mut() {
            let before = player.active_buffs.len();
            player.active_buffs.retain(|b| !b.id.starts_with(&prefix));
            removed += before - player.active_buffs.len();
        }

        if let Some(world) = self.world.as_mut() {
            let before = world.visual_effects.len() + world.atmospheric_effects.len();
            world.visual_effects.retain(|e| !e.id.starts_with(&prefix));
            world.atmospheric_effects.retain(|e| !e.id.starts_with(&prefix));
            removed += before - (world.visual_effects.len() + world.atmospheric_effects.len());
        }

        removed
    }
}

// =============================================================================
// Player
// =============================================================================

/// The player sub-tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub cultivation: Cultivation,
    /// Named stats: strength, agility, spirit, ...
    #[serde(default)]
    pub stats: BTreeMap<String, i64>,
    /// Named skill levels: stealth, purification, formations, ...
    #[serde(default)]
    pub skills: BTreeMap<String, u32>,
    #[serde(default)]
    pub inventory: Option<Inventory>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub active_buffs: Vec<ActiveBuff>,
    #[serde(default)]
    pub reputation: i64,
}

impl PlayerState {
    /// A player at the given level with an empty inventory and no location.
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            cultivation: Cultivation::at_level(level),
            inventory: Some(Inventory::default()),
            ..Self::default()
        }
    }

    /// Set a stat (builder pattern).
    #[must_use]
    pub fn with_stat(mut self, stat: impl Into<String>, value: i64) -> Self {
        self.stats.insert(stat.into(), value);
        self
    }

    /// Set a skill level (builder pattern).
    #[must_use]
    pub fn with_skill(mut self, skill: impl Into<String>, level: u32) -> Self {
        self.skills.insert(skill.into(), level);
        self
    }

    /// Set the location (builder pattern).
    #[must_use]
    pub fn with_location(mut self, region: impl Into<String>, location_type: impl Into<String>) -> Self {
        self.location = Some(Location {
            region: region.into(),
            location_type: location_type.into(),
        });
        self
    }

    /// Set the currency held (builder pattern). Creates the inventory if absent.
    #[must_use]
    pub fn with_currency(mut self, currency: i64) -> Self {
        self.inventory.get_or_insert_with(Inventory::default).currency = currency;
        self
    }

    /// Add an item stack (builder pattern). Creates the inventory if absent.
    #[must_use]
    pub fn with_item(mut self, id: impl Into<String>, name: impl Into<String>, quantity: u32) -> Self {
        self.inventory
            .get_or_insert_with(Inventory::default)
            .add_item(id, name, quantity);
        self
    }

    /// Stat value, zero when unknown.
    #[must_use]
    pub fn stat(&self, stat: &str) -> i64 {
        self.stats.get(stat).copied().unwrap_or(0)
    }

    /// Skill level, zero when unknown.
    #[must_use]
    pub fn skill(&self, skill: &str) -> u32 {
        self.skills.get(skill).copied().unwrap_or(0)
    }
}

/// Cultivation progress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cultivation {
    pub level: u32,
    pub realm: String,
    pub energy: i64,
    pub max_energy: i64,
    pub experience: i64,
    /// Progress toward breaking the current bottleneck, clamped to
    /// `[0, bottleneck_required]`.
    pub bottleneck_progress: u32,
    pub bottleneck_required: u32,
}

impl Default for Cultivation {
    fn default() -> Self {
        Self::at_level(1)
    }
}

impl Cultivation {
    /// Fresh cultivation state at a level.
    #[must_use]
    pub fn at_level(level: u32) -> Self {
        Self {
            level,
            realm: "Qi Condensation".to_string(),
            energy: 0,
            max_energy: 100 + i64::from(level) * 20,
            experience: 0,
            bottleneck_progress: 0,
            bottleneck_required: 100,
        }
    }

    /// Advance bottleneck progress, staying within `[0, required]`.
    pub fn add_bottleneck_progress(&mut self, delta: i64) -> u32 {
        let next = i64::from(self.bottleneck_progress) + delta;
        self.bottleneck_progress = next.clamp(0, i64::from(self.bottleneck_required)) as u32;
        self.bottleneck_progress
    }
}

/// Items and currency.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub items: Vec<InventoryItem>,
    /// Spirit stones.
    #[serde(default)]
    pub currency: i64,
}

impl Inventory {
    /// Quantity held of an item id.
    #[must_use]
    pub fn quantity_of(&self, item_id: &str) -> u32 {
        self.items
            .iter()
            .filter(|i| i.id == item_id)
            .map(|i| i.quantity)
            .sum()
    }

    /// Add to an existing stack or create one. Returns the new quantity.
    pub fn add_item(&mut self, id: impl Into<String>, name: impl Into<String>, quantity: u32) -> u32 {
        let id = id.into();
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == id) {
            existing.quantity += quantity;
            return existing.quantity;
        }
        self.items.push(InventoryItem {
            id,
            name: name.into(),
            quantity,
        });
        quantity
    }

    /// Remove up to `quantity` of an item, dropping empty stacks.
    ///
    /// Returns how many were actually removed.
    pub fn remove_item(&mut self, item_id: &str, quantity: u32) -> u32 {
        let Some(stack) = self.items.iter_mut().find(|i| i.id == item_id) else {
            return 0;
        };
        let taken = stack.quantity.min(quantity);
        stack.quantity -= taken;
        self.items.retain(|i| i.quantity > 0);
        taken
    }
}

/// One inventory stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub quantity: u32,
}

/// Where the player currently is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub region: String,
    /// Location type used by condition modifiers (forest, mountain, city, ...).
    pub location_type: String,
}

/// A temporary stat modifier applied by an event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveBuff {
    /// `"<instance_id>:<name>"`.
    pub id: String,
    pub name: String,
    pub stat: String,
    pub multiplier: f64,
}

// =============================================================================
// World
// =============================================================================

/// The world sub-tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub time: GameTime,
    pub season: Season,
    pub weather: String,
    /// Global narrative phase (peace, unrest, war, ...), used by conflict spawning.
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub visual_effects: Vec<VisualEffect>,
    #[serde(default)]
    pub atmospheric_effects: Vec<AtmosphericEffect>,
}

impl WorldState {
    /// A world at a time, season and weather with no regions or effects.
    #[must_use]
    pub fn new(time: GameTime, season: Season, weather: impl Into<String>) -> Self {
        Self {
            time,
            season,
            weather: weather.into(),
            phase: None,
            regions: Vec::new(),
            visual_effects: Vec::new(),
            atmospheric_effects: Vec::new(),
        }
    }

    /// Add a region (builder pattern).
    #[must_use]
    pub fn with_region(mut self, region: Region) -> Self {
        self.regions.push(region);
        self
    }

    /// Set the world phase (builder pattern).
    #[must_use]
    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }
}

/// Seasons of the game year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

/// A named region of the world map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub region_type: String,
    /// Sect grounds and cities never host conflicts.
    #[serde(default)]
    pub safe_zone: bool,
    #[serde(default)]
    pub corrupted: bool,
}

impl Region {
    /// An unsafe, uncorrupted region.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, region_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            region_type: region_type.into(),
            safe_zone: false,
            corrupted: false,
        }
    }

    /// Mark as a safe zone (builder pattern).
    #[must_use]
    pub fn safe(mut self) -> Self {
        self.safe_zone = true;
        self
    }
}

/// A rendering hint for the client (rain, moonlight, demonic mist, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualEffect {
    /// `"<instance_id>:<kind>"`.
    pub id: String,
    pub kind: String,
    pub intensity: f64,
}

/// A descriptive ambient effect shown alongside the world view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtmosphericEffect {
    /// `"<instance_id>:<kind>"`.
    pub id: String,
    pub kind: String,
    pub description: String,
}

// =============================================================================
// UI
// =============================================================================

/// The ui sub-tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiState {
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

/// Notification severity, drives styling on the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Event,
    Warning,
    Danger,
}

/// A queued notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_context() -> GameContext {
        GameContext::new(
            PlayerState::new(5).with_stat("strength", 5),
            WorldState::new(GameTime::at(10, 0), Season::Spring, "clear"),
        )
    }

    #[test]
    fn test_absent_subtrees_are_tolerated() {
        let mut ctx = GameContext::default();
        assert_eq!(ctx.player_level(), None);
        assert_eq!(ctx.now(), None);
        assert!(!ctx.notify(Notification {
            id: "n".into(),
            kind: NotificationKind::Info,
            title: "t".into(),
            message: "m".into(),
        }));
        assert_eq!(ctx.remove_instance_effects("evt-1"), 0);
    }

    #[test]
    fn test_remove_instance_effects_by_prefix() {
        let mut ctx = full_context();
        let player = ctx.player.as_mut().unwrap();
        player.active_buffs.push(ActiveBuff {
            id: "evt-1:rain".into(),
            name: "rain".into(),
            stat: "cultivation_speed".into(),
            multiplier: 1.2,
        });
        player.active_buffs.push(ActiveBuff {
            id: "evt-10:other".into(),
            name: "other".into(),
            stat: "strength".into(),
            multiplier: 1.1,
        });
        ctx.world.as_mut().unwrap().visual_effects.push(VisualEffect {
            id: "evt-1:rain".into(),
            kind: "rain".into(),
            intensity: 0.5,
        });

        assert_eq!(ctx.remove_instance_effects("evt-1"), 2);
        let player = ctx.player.as_ref().unwrap();
        assert_eq!(player.active_buffs.len(), 1);
        assert_eq!(player.active_buffs[0].id, "evt-10:other");
    }

    #[test]
    fn test_inventory_stacks() {
        let mut inventory = Inventory::default();
        assert_eq!(inventory.add_item("herb", "Herb", 2), 2);
        assert_eq!(inventory.add_item("herb", "Herb", 3), 5);
        assert_eq!(inventory.quantity_of("herb"), 5);
        assert_eq!(inventory.remove_item("herb", 10), 5);
        assert!(inventory.items.is_empty());
        assert_eq!(inventory.remove_item("herb", 1), 0);
    }

    #[test]
    fn test_bottleneck_progress_is_clamped() {
        let mut cultivation = Cultivation::at_level(3);
        assert_eq!(cultivation.add_bottleneck_progress(250), 100);
        assert_eq!(cultivation.add_bottleneck_progress(-500), 0);
        assert_eq!(cultivation.add_bottleneck_progress(40), 40);
    }

    #[test]
    fn test_context_serde_roundtrip() {
        let ctx = full_context();
        let json = serde_json::to_string(&ctx).unwrap();
        let back: GameContext = serde_json::from_str(&json).unwrap();
        assert_eq!(ctx, back);
    }
}
