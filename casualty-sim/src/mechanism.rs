//! Mechanism-of-injury presets and ambient conditions.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Injury pattern selected at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mechanism {
    #[default]
    Blast,
    GswTorso,
    GswChest,
    Mvc,
}

impl Mechanism {
    pub const ALL: [Self; 4] = [Self::Blast, Self::GswTorso, Self::GswChest, Self::Mvc];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blast => "blast",
            Self::GswTorso => "gsw_torso",
            Self::GswChest => "gsw_chest",
            Self::Mvc => "mvc",
        }
    }

    /// Human-readable label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Blast => "Blast injury",
            Self::GswTorso => "Gunshot wound, torso",
            Self::GswChest => "Gunshot wound, chest",
            Self::Mvc => "Motor vehicle collision",
        }
    }

    /// Initial injury burden for this mechanism.
    #[must_use]
    pub const fn preset(self) -> InjuryPreset {
        match self {
            Self::Blast => InjuryPreset {
                external_bleed: true,
                bleed_rate: 0.04,
                volume_fraction: 0.74,
                lactate: 4.5,
                left_chest_tension: false,
                tbi_chance: 0.0,
            },
            Self::GswTorso => InjuryPreset {
                external_bleed: false,
                bleed_rate: 0.035,
                volume_fraction: 0.78,
                lactate: 4.0,
                left_chest_tension: true,
                tbi_chance: 0.0,
            },
            Self::GswChest => InjuryPreset {
                external_bleed: false,
                bleed_rate: 0.025,
                volume_fraction: 0.80,
                lactate: 3.6,
                left_chest_tension: true,
                tbi_chance: 0.0,
            },
            Self::Mvc => InjuryPreset {
                external_bleed: false,
                bleed_rate: 0.02,
                volume_fraction: 0.82,
                lactate: 3.2,
                left_chest_tension: false,
                tbi_chance: 0.4,
            },
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mechanism {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blast" => Ok(Self::Blast),
            "gsw_torso" => Ok(Self::GswTorso),
            "gsw_chest" => Ok(Self::GswChest),
            "mvc" => Ok(Self::Mvc),
            _ => Err(()),
        }
    }
}

/// Starting injury burden applied on top of the baseline casualty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InjuryPreset {
    pub external_bleed: bool,
    pub bleed_rate: f64,
    pub volume_fraction: f64,
    pub lactate: f64,
    /// Left hemithorax starts open with tension.
    pub left_chest_tension: bool,
    /// Probability the casualty also carries a traumatic brain injury.
    pub tbi_chance: f64,
}

/// Ambient condition at the point of injury.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Ambient {
    #[default]
    Temperate,
    Cold,
    Hot,
}

impl Ambient {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Temperate => "temperate",
            Self::Cold => "cold",
            Self::Hot => "hot",
        }
    }
}

impl fmt::Display for Ambient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ambient {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperate" | "normal" => Ok(Self::Temperate),
            "cold" => Ok(Self::Cold),
            "hot" => Ok(Self::Hot),
            _ => Err(()),
        }
    }
}

/// Fixed scene context every tick and intervention reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Environment {
    pub mechanism: Mechanism,
    pub ambient: Ambient,
}

impl Environment {
    #[must_use]
    pub const fn new(mechanism: Mechanism, ambient: Ambient) -> Self {
        Self { mechanism, ambient }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mechanism_keys_roundtrip() {
        for mechanism in Mechanism::ALL {
            assert_eq!(mechanism.as_str().parse::<Mechanism>(), Ok(mechanism));
            assert_eq!(mechanism.to_string(), mechanism.as_str());
        }
        assert_eq!(" GSW_Chest ".parse::<Mechanism>(), Ok(Mechanism::GswChest));
        assert!("stab".parse::<Mechanism>().is_err());
    }

    #[test]
    fn only_blast_starts_with_external_bleed() {
        assert!(Mechanism::Blast.preset().external_bleed);
        assert!(
            Mechanism::ALL
                .iter()
                .filter(|m| **m != Mechanism::Blast)
                .all(|m| !m.preset().external_bleed)
        );
    }

    #[test]
    fn chest_mechanisms_start_with_tension() {
        assert!(Mechanism::GswChest.preset().left_chest_tension);
        assert!(Mechanism::GswTorso.preset().left_chest_tension);
        assert!(!Mechanism::Mvc.preset().left_chest_tension);
    }

    #[test]
    fn ambient_parses_aliases() {
        assert_eq!("normal".parse::<Ambient>(), Ok(Ambient::Temperate));
        assert_eq!("COLD".parse::<Ambient>(), Ok(Ambient::Cold));
        assert!("arctic".parse::<Ambient>().is_err());
    }

    #[test]
    fn mechanism_serializes_snake_case() {
        let json = serde_json::to_string(&Mechanism::GswTorso).unwrap();
        assert_eq!(json, "\"gsw_torso\"");
    }
}
