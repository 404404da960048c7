//! Engine configuration.
//!
//! Everything tunable about the engine lives here: the rarity base chance
//! table and the conflict plugin's scale settings. Defaults match the
//! shipped game balance; a deployment can override any subset from JSON.
//!
//! ```
//! use cultivation_events::core::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "base_chances": { "common": 0.2 } }"#).unwrap();
//! assert_eq!(config.base_chances.common, 0.2);
//! assert_eq!(config.base_chances.rare, 0.02);
//! ```

use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult};
use crate::conflicts::ConflictSettings;
use crate::events::Rarity;

/// Base trigger chance per rarity tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RarityChances {
    pub common: f64,
    pub uncommon: f64,
    pub rare: f64,
    pub epic: f64,
    pub legendary: f64,
}

impl Default for RarityChances {
    fn default() -> Self {
        Self {
            common: 0.10,
            uncommon: 0.05,
            rare: 0.02,
            epic: 0.005,
            legendary: 0.001,
        }
    }
}

impl RarityChances {
    /// Base chance for a rarity.
    #[must_use]
    pub fn for_rarity(&self, rarity: Rarity) -> f64 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Uncommon => self.uncommon,
            Rarity::Rare => self.rare,
            Rarity::Epic => self.epic,
            Rarity::Legendary => self.legendary,
        }
    }

    fn validate(&self) -> EngineResult<()> {
        for (name, value) in [
            ("common", self.common),
            ("uncommon", self.uncommon),
            ("rare", self.rare),
            ("epic", self.epic),
            ("legendary", self.legendary),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Config(format!(
                    "base chance `{name}` = {value} is outside [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_chances: RarityChances,
    pub conflicts: ConflictSettings,
}

impl EngineConfig {
    /// Parse and validate a (possibly partial) JSON configuration.
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every tunable is in range.
    pub fn validate(&self) -> EngineResult<()> {
        self.base_chances.validate()?;
        self.conflicts.validate()
    }
}
