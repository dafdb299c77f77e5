//! Engine configuration: tunables, loot tables and their validation errors.
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use thiserror::Error;

use crate::exchange::ShardPrices;
use crate::loot::LootTable;
use crate::pity::PityTuning;
use crate::rarity::RarityTier;
use crate::trial::TrialTuning;

/// Errors raised while loading or validating tunables and tables.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("loot table id must not be blank")]
    BlankTableId,
    #[error("loot table `{table}` contains an item with a blank id")]
    BlankItemId { table: String },
    #[error("item `{item}` in loot table `{table}` has a zero count")]
    ZeroCount { table: String, item: String },
    #[error("loot table `{table}` has no {tier} items")]
    EmptyTier { table: String, tier: RarityTier },
    #[error("loot table `{table}` has no item with positive weight")]
    EmptyTable { table: String },
    #[error("shard prices must strictly increase (rare {rare}, epic {epic}, legendary {legendary})")]
    PricesNotIncreasing { rare: u32, epic: u32, legendary: u32 },
    #[error("{track} pity thresholds invalid (soft {soft}, hard {hard})")]
    PityThresholds {
        track: &'static str,
        soft: u32,
        hard: u32,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Full set of tunables the engine runs with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "LootTable::exploration")]
    pub exploration: LootTable,
    #[serde(default = "LootTable::scripture")]
    pub scripture: LootTable,
    #[serde(default)]
    pub pity: PityTuning,
    #[serde(default)]
    pub prices: ShardPrices,
    #[serde(default)]
    pub trial: TrialTuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exploration: LootTable::exploration(),
            scripture: LootTable::scripture(),
            pity: PityTuning::default(),
            prices: ShardPrices::default(),
            trial: TrialTuning::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration document. Missing sections take the shipped defaults.
    ///
    /// Loot tables are validated while they deserialize, so a bad table comes
    /// back as `ConfigError::Parse` whose message carries the table error
    /// (`EmptyTier`, `ZeroCount` and so on) rather than as that variant. Build
    /// tables with `LootTable::new` to match on the typed error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON or an invalid loot table,
    /// and the `validate` errors for out-of-range tunables.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the first invalid tunable found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pity.validate()?;
        self.prices.validate()?;
        self.trial.validate()?;
        Ok(())
    }
}

/// Source of engine configuration.
pub trait ConfigLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the engine configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or parsed.
    fn load_engine_config(&self) -> Result<EngineConfig, Self::Error>;
}

/// Loader that always yields the shipped defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinConfig;

impl ConfigLoader for BuiltinConfig {
    type Error = Infallible;

    fn load_engine_config(&self) -> Result<EngineConfig, Self::Error> {
        Ok(EngineConfig::default())
    }
}

/// Loader backed by an in-memory JSON document.
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    source: String,
}

impl JsonConfig {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl ConfigLoader for JsonConfig {
    type Error = ConfigError;

    fn load_engine_config(&self) -> Result<EngineConfig, Self::Error> {
        EngineConfig::from_json(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_sections_override_defaults() {
        let config =
            EngineConfig::from_json(r#"{"prices": {"rare": 10, "epic": 20, "legendary": 30}}"#)
                .unwrap();
        assert_eq!(config.prices.rare, 10);
        assert_eq!(config.pity, PityTuning::default());
    }

    #[test]
    fn invalid_tunables_are_rejected() {
        let err = EngineConfig::from_json(r#"{"trial": {"gamble_success_rate": -0.1}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::RangeViolation { .. }));
        assert!(err.to_string().contains("gamble_success_rate"));
    }

    #[test]
    fn invalid_tables_surface_as_parse_errors() {
        let json = r#"{"exploration": {"id": "broken", "pools": {}}}"#;
        assert!(matches!(
            EngineConfig::from_json(json),
            Err(ConfigError::Parse(_))
        ));

        let no_legendary = r#"{"exploration": {"id": "custom", "pools": {
            "common": [{"weight": 1, "item": {"kind": "material", "id": "dust", "count": 1}}],
            "rare": [{"weight": 1, "item": {"kind": "material", "id": "ore", "count": 1}}],
            "epic": [{"weight": 1, "item": {"kind": "material", "id": "bone", "count": 1}}]
        }}}"#;
        let err = EngineConfig::from_json(no_legendary).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("has no legendary items"), "{err}");
    }

    #[test]
    fn loaders_produce_configs() {
        let builtin = BuiltinConfig.load_engine_config().unwrap();
        assert_eq!(builtin.exploration.id(), "exploration");
        let json = JsonConfig::new("not json");
        assert!(json.load_engine_config().is_err());
    }
}
