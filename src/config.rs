//! Strategy configuration.
//!
//! Every tunable of the command engine lives here with a sensible default,
//! so an empty JSON object `{}` is a valid configuration file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::board::PieceKind;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for the command engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Seed for the engine's random source (0 = use entropy).
    pub seed: u64,
    /// Build price per piece kind. Kinds missing here cannot be built.
    pub prices: BTreeMap<PieceKind, u32>,
    /// Relative weights for what idle builders produce.
    pub production: BTreeMap<PieceKind, u32>,
    /// Builders never carry more than this.
    pub carry_cap: u32,
    /// Maximum money picked up from a tile in one turn.
    pub collect_cap: u32,
    /// Tanks sent at each enemy tile.
    pub enemy_squad_size: usize,
    /// Tanks sent at each neutral tile.
    pub neutral_squad_size: usize,
    /// Arrival radius for assigned attacks.
    pub attack_radius: u32,
    /// Arrival radius for artillery escorting a tank.
    pub defend_radius: u32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            seed: 0,
            prices: default_prices(),
            production: BTreeMap::from([(PieceKind::Tank, 50), (PieceKind::Builder, 50)]),
            carry_cap: 100,
            collect_cap: 5,
            enemy_squad_size: 2,
            neutral_squad_size: 1,
            attack_radius: 0,
            defend_radius: 2,
        }
    }
}

/// The game's standard price list.
pub fn default_prices() -> BTreeMap<PieceKind, u32> {
    BTreeMap::from([
        (PieceKind::Builder, 20),
        (PieceKind::Tank, 8),
        (PieceKind::Artillery, 8),
        (PieceKind::Airplane, 20),
        (PieceKind::Helicopter, 16),
        (PieceKind::Antitank, 10),
        (PieceKind::IronDome, 32),
        (PieceKind::Bunker, 10),
        (PieceKind::Spy, 20),
        (PieceKind::Tower, 16),
        (PieceKind::Satellite, 64),
    ])
}

impl StrategyConfig {
    /// Loads and validates a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parses and validates a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: StrategyConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the build price for a kind, or `None` if it is not buildable.
    pub fn price(&self, kind: PieceKind) -> Option<u32> {
        self.prices.get(&kind).copied()
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collect_cap == 0 {
            return Err(ConfigError::Invalid("collect_cap must be positive".into()));
        }
        if self.carry_cap == 0 {
            return Err(ConfigError::Invalid("carry_cap must be positive".into()));
        }
        if self.enemy_squad_size == 0 || self.neutral_squad_size == 0 {
            return Err(ConfigError::Invalid("squad sizes must be at least 1".into()));
        }
        for (kind, price) in &self.prices {
            if *price > self.carry_cap {
                return Err(ConfigError::Invalid(format!(
                    "{} costs {} but builders carry at most {}",
                    kind, price, self.carry_cap
                )));
            }
        }
        for kind in self.production.keys() {
            if !self.prices.contains_key(kind) {
                return Err(ConfigError::Invalid(format!(
                    "production lists {} which has no price",
                    kind
                )));
            }
        }
        if !self.production.is_empty() && self.production.values().all(|w| *w == 0) {
            return Err(ConfigError::Invalid("production weights are all zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = StrategyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.price(PieceKind::Tank), Some(8));
        assert_eq!(config.price(PieceKind::Satellite), Some(64));
        assert_eq!(config.collect_cap, 5);
        assert_eq!(config.carry_cap, 100);
    }

    #[test]
    fn empty_json_gives_defaults() {
        let config = StrategyConfig::from_json("{}").unwrap();
        assert_eq!(config, StrategyConfig::default());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config =
            StrategyConfig::from_json(r#"{"seed": 42, "prices": {"tank": 6}, "production": {"tank": 1}}"#)
                .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.price(PieceKind::Tank), Some(6));
        assert_eq!(config.price(PieceKind::Builder), None);
        assert_eq!(config.defend_radius, 2);
    }

    #[test]
    fn rejects_unpriced_production() {
        let err = StrategyConfig::from_json(r#"{"prices": {"tank": 8}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_caps() {
        assert!(StrategyConfig::from_json(r#"{"collect_cap": 0}"#).is_err());
        assert!(StrategyConfig::from_json(r#"{"enemy_squad_size": 0}"#).is_err());
    }

    #[test]
    fn rejects_price_above_carry_cap() {
        assert!(StrategyConfig::from_json(r#"{"carry_cap": 30}"#).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            StrategyConfig::from_json("{seed"),
            Err(ConfigError::Parse(_))
        ));
    }
}
