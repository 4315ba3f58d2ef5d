//! Finite consumable counters carried by the medic.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Consumable kinds tracked in the aid bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Supply {
    Tourniquet,
    OcclusiveSeal,
    DecompressionNeedle,
    Txa,
    WholeBlood,
    Crystalloid,
    Calcium,
    NasalAirway,
    SupraglotticAirway,
    HypothermiaKit,
    PelvicBinder,
    Norepinephrine,
    ChestTubeKit,
    SterileField,
}

impl Supply {
    pub const ALL: [Self; 14] = [
        Self::Tourniquet,
        Self::OcclusiveSeal,
        Self::DecompressionNeedle,
        Self::Txa,
        Self::WholeBlood,
        Self::Crystalloid,
        Self::Calcium,
        Self::NasalAirway,
        Self::SupraglotticAirway,
        Self::HypothermiaKit,
        Self::PelvicBinder,
        Self::Norepinephrine,
        Self::ChestTubeKit,
        Self::SterileField,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tourniquet => "tourniquet",
            Self::OcclusiveSeal => "occlusive_seal",
            Self::DecompressionNeedle => "decompression_needle",
            Self::Txa => "txa",
            Self::WholeBlood => "whole_blood",
            Self::Crystalloid => "crystalloid",
            Self::Calcium => "calcium",
            Self::NasalAirway => "nasal_airway",
            Self::SupraglotticAirway => "supraglottic_airway",
            Self::HypothermiaKit => "hypothermia_kit",
            Self::PelvicBinder => "pelvic_binder",
            Self::Norepinephrine => "norepinephrine",
            Self::ChestTubeKit => "chest_tube_kit",
            Self::SterileField => "sterile_field",
        }
    }

    /// Units issued in the standard aid bag.
    #[must_use]
    pub const fn standard_issue(self) -> u32 {
        match self {
            Self::WholeBlood => 4,
            Self::Tourniquet
            | Self::OcclusiveSeal
            | Self::DecompressionNeedle
            | Self::Crystalloid
            | Self::Calcium
            | Self::ChestTubeKit
            | Self::SterileField => 2,
            Self::Txa
            | Self::NasalAirway
            | Self::SupraglotticAirway
            | Self::HypothermiaKit
            | Self::PelvicBinder
            | Self::Norepinephrine => 1,
        }
    }
}

impl fmt::Display for Supply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remaining counts per supply. Counts are unsigned and only ever decremented
/// through checked consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    counts: BTreeMap<Supply, u32>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::standard()
    }
}

impl Inventory {
    /// The standard aid bag.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            counts: Supply::ALL
                .iter()
                .map(|supply| (*supply, supply.standard_issue()))
                .collect(),
        }
    }

    /// An empty bag.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn count(&self, supply: Supply) -> u32 {
        self.counts.get(&supply).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn has(&self, supply: Supply) -> bool {
        self.count(supply) > 0
    }

    pub fn set(&mut self, supply: Supply, count: u32) {
        self.counts.insert(supply, count);
    }

    pub fn restock(&mut self, supply: Supply, units: u32) {
        let entry = self.counts.entry(supply).or_insert(0);
        *entry = entry.saturating_add(units);
    }

    /// Take one unit if available.
    pub fn try_consume(&mut self, supply: Supply) -> bool {
        self.try_consume_all(&[supply])
    }

    /// Take one unit of every listed supply, or nothing at all.
    pub fn try_consume_all(&mut self, supplies: &[Supply]) -> bool {
        if !supplies.iter().all(|supply| self.has(*supply)) {
            return false;
        }
        for supply in supplies {
            if let Some(count) = self.counts.get_mut(supply) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    log::info!("{supply} depleted");
                }
            }
        }
        true
    }

    /// Iterate over supplies in stable order.
    pub fn iter(&self) -> impl Iterator<Item = (Supply, u32)> + '_ {
        self.counts.iter().map(|(supply, count)| (*supply, *count))
    }

    #[must_use]
    pub fn total_units(&self) -> u32 {
        self.counts.values().fold(0_u32, |acc, n| acc.saturating_add(*n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_bag_matches_issue() {
        let bag = Inventory::standard();
        assert_eq!(bag.count(Supply::Tourniquet), 2);
        assert_eq!(bag.count(Supply::WholeBlood), 4);
        assert_eq!(bag.count(Supply::Txa), 1);
        assert_eq!(bag.count(Supply::SterileField), 2);
        assert_eq!(bag.total_units(), 24);
    }

    #[test]
    fn consumption_stops_at_zero() {
        let mut bag = Inventory::standard();
        assert!(bag.try_consume(Supply::Txa));
        assert!(!bag.try_consume(Supply::Txa));
        assert_eq!(bag.count(Supply::Txa), 0);
        assert!(!bag.has(Supply::Txa));
    }

    #[test]
    fn paired_consumption_is_all_or_nothing() {
        let mut bag = Inventory::empty();
        bag.set(Supply::ChestTubeKit, 1);
        assert!(!bag.try_consume_all(&[Supply::ChestTubeKit, Supply::SterileField]));
        assert_eq!(bag.count(Supply::ChestTubeKit), 1);
        bag.restock(Supply::SterileField, 1);
        assert!(bag.try_consume_all(&[Supply::ChestTubeKit, Supply::SterileField]));
        assert_eq!(bag.total_units(), 0);
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut bag = Inventory::empty();
        bag.set(Supply::Calcium, 2);
        let json = serde_json::to_string(&bag).unwrap();
        assert_eq!(json, r#"{"calcium":2}"#);
        let back: Inventory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bag);
    }
}
