//! Validated session parameters.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_MASS_KG, MASS_MAX_KG, MASS_MIN_KG};
use crate::mechanism::{Ambient, Environment, Mechanism};

/// Errors raised while building a session configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown mechanism of injury `{0}`")]
    UnknownMechanism(String),
    #[error("unknown ambient condition `{0}`")]
    UnknownAmbient(String),
    #[error("mass `{0}` is not a number")]
    UnparsableMass(String),
    #[error("{field} must be between {min:.1} and {max:.1} (got {value:.1})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

/// Parameters a session is initialized from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub mechanism: Mechanism,
    #[serde(default = "SessionConfig::default_mass_kg")]
    pub mass_kg: f64,
    #[serde(default)]
    pub ambient: Ambient,
    /// Seed for physiologic noise; `None` runs without noise.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mechanism: Mechanism::default(),
            mass_kg: DEFAULT_MASS_KG,
            ambient: Ambient::default(),
            seed: None,
        }
    }
}

impl SessionConfig {
    const fn default_mass_kg() -> f64 {
        DEFAULT_MASS_KG
    }

    #[must_use]
    pub const fn new(mechanism: Mechanism, mass_kg: f64, ambient: Ambient) -> Self {
        Self {
            mechanism,
            mass_kg,
            ambient,
            seed: None,
        }
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build a configuration from raw form inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the mechanism or ambient key is unknown, or the mass
    /// is not a number within the supported range.
    pub fn from_inputs(mechanism: &str, mass_kg: &str, ambient: &str) -> Result<Self, ConfigError> {
        let mechanism = mechanism
            .parse::<Mechanism>()
            .map_err(|()| ConfigError::UnknownMechanism(mechanism.to_string()))?;
        let ambient = ambient
            .parse::<Ambient>()
            .map_err(|()| ConfigError::UnknownAmbient(ambient.to_string()))?;
        let mass = mass_kg
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::UnparsableMass(mass_kg.to_string()))?;
        let config = Self::new(mechanism, mass, ambient);
        config.validate()?;
        Ok(config)
    }

    /// Validate numeric ranges.
    ///
    /// # Errors
    ///
    /// Returns an error when the mass is non-finite or outside the supported range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.mass_kg.is_finite() || !(MASS_MIN_KG..=MASS_MAX_KG).contains(&self.mass_kg) {
            return Err(ConfigError::RangeViolation {
                field: "mass_kg",
                min: MASS_MIN_KG,
                max: MASS_MAX_KG,
                value: self.mass_kg,
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn environment(&self) -> Environment {
        Environment::new(self.mechanism, self.ambient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_form_inputs() {
        let config = SessionConfig::from_inputs("gsw_chest", " 72.5 ", "cold").unwrap();
        assert_eq!(config.mechanism, Mechanism::GswChest);
        assert!((config.mass_kg - 72.5).abs() < f64::EPSILON);
        assert_eq!(config.ambient, Ambient::Cold);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn rejects_non_numeric_mass() {
        assert_eq!(
            SessionConfig::from_inputs("blast", "heavy", "temperate"),
            Err(ConfigError::UnparsableMass("heavy".to_string()))
        );
    }

    #[test]
    fn rejects_out_of_range_mass() {
        let err = SessionConfig::from_inputs("blast", "5", "temperate").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::RangeViolation { field: "mass_kg", .. }
        ));
        assert!(err.to_string().contains("mass_kg must be between"));
        let nan = SessionConfig::new(Mechanism::Blast, f64::NAN, Ambient::Temperate);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            SessionConfig::from_inputs("stab", "80", "temperate"),
            Err(ConfigError::UnknownMechanism(_))
        ));
        assert!(matches!(
            SessionConfig::from_inputs("mvc", "80", "arctic"),
            Err(ConfigError::UnknownAmbient(_))
        ));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"mechanism":"mvc"}"#).unwrap();
        assert_eq!(config.mechanism, Mechanism::Mvc);
        assert!((config.mass_kg - 80.0).abs() < f64::EPSILON);
        assert_eq!(config.ambient, Ambient::Temperate);
        assert_eq!(config.with_seed(3).seed, Some(3));
    }
}
