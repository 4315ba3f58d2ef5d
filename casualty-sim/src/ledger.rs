//! Score ledger: running score, care categories, and the append-only record
//! of clinically meaningful actions and score events.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Clinically meaningful care category. Once recorded it stays recorded until
/// the session is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareCategory {
    Tourniquet,
    AirwayAdjunct,
    ChestCare,
    Txa,
    Blood,
    Calcium,
    Antibiotics,
}

impl CareCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tourniquet => "tourniquet",
            Self::AirwayAdjunct => "airway_adjunct",
            Self::ChestCare => "chest_care",
            Self::Txa => "txa",
            Self::Blood => "blood",
            Self::Calcium => "calcium",
            Self::Antibiotics => "antibiotics",
        }
    }
}

impl fmt::Display for CareCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Doctrine gate identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GateKey {
    /// Massive hemorrhage.
    M,
    /// Airway.
    A,
    /// Respiration.
    R,
    /// Circulation.
    C,
}

impl GateKey {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::M => "M",
            Self::A => "A",
            Self::R => "R",
            Self::C => "C",
        }
    }
}

impl fmt::Display for GateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a gate resolved when its deadline was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateVerdict {
    NotApplicable,
    Passed,
    Missed,
}

/// A single change to the running score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub t_s: u32,
    pub delta: i32,
    pub reason: String,
}

/// A recorded clinical action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareAction {
    pub t_s: u32,
    pub category: Option<CareCategory>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScoreLedger {
    score: i32,
    categories: BTreeSet<CareCategory>,
    actions: Vec<CareAction>,
    events: Vec<ScoreEvent>,
    gates: BTreeMap<GateKey, GateVerdict>,
    last_gate_minute: Option<u32>,
    early_checkpoint_done: bool,
}

impl ScoreLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn score(&self) -> i32 {
        self.score
    }

    #[must_use]
    pub fn has(&self, category: CareCategory) -> bool {
        self.categories.contains(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = CareCategory> + '_ {
        self.categories.iter().copied()
    }

    #[must_use]
    pub fn actions(&self) -> &[CareAction] {
        &self.actions
    }

    #[must_use]
    pub fn events(&self) -> &[ScoreEvent] {
        &self.events
    }

    #[must_use]
    pub fn gate_verdict(&self, key: GateKey) -> Option<GateVerdict> {
        self.gates.get(&key).copied()
    }

    pub fn gate_verdicts(&self) -> impl Iterator<Item = (GateKey, GateVerdict)> + '_ {
        self.gates.iter().map(|(key, verdict)| (*key, *verdict))
    }

    #[must_use]
    pub const fn last_gate_minute(&self) -> Option<u32> {
        self.last_gate_minute
    }

    /// Record an action; returns true when the category is recorded for the first time.
    pub fn record(&mut self, t_s: u32, category: Option<CareCategory>, label: &str) -> bool {
        self.actions.push(CareAction {
            t_s,
            category,
            label: label.to_string(),
        });
        category.is_some_and(|category| self.categories.insert(category))
    }

    /// Apply a score change and append it to the event record.
    pub fn adjust(&mut self, t_s: u32, delta: i32, reason: &str) -> ScoreEvent {
        self.score = self.score.saturating_add(delta);
        let event = ScoreEvent {
            t_s,
            delta,
            reason: reason.to_string(),
        };
        self.events.push(event.clone());
        event
    }

    /// Store a gate verdict; returns false if the gate already fired.
    pub(crate) fn settle_gate(&mut self, key: GateKey, verdict: GateVerdict) -> bool {
        if self.gates.contains_key(&key) {
            return false;
        }
        self.gates.insert(key, verdict);
        true
    }

    pub(crate) const fn mark_gate_minute(&mut self, minute: u32) {
        self.last_gate_minute = Some(minute);
    }

    pub(crate) const fn early_checkpoint_done(&self) -> bool {
        self.early_checkpoint_done
    }

    pub(crate) const fn complete_early_checkpoint(&mut self) {
        self.early_checkpoint_done = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_write_once() {
        let mut ledger = ScoreLedger::new();
        assert!(ledger.record(10, Some(CareCategory::Blood), "Whole blood 250 mL"));
        assert!(!ledger.record(40, Some(CareCategory::Blood), "Whole blood 250 mL"));
        assert!(!ledger.record(50, None, "Ondansetron 4 mg"));
        assert!(ledger.has(CareCategory::Blood));
        assert_eq!(ledger.actions().len(), 3);
        assert_eq!(ledger.categories().count(), 1);
    }

    #[test]
    fn adjustments_accumulate_and_append() {
        let mut ledger = ScoreLedger::new();
        ledger.adjust(5, 1, "Wound irrigation");
        let event = ledger.adjust(6, -2, "Late hemorrhage control");
        assert_eq!(event.delta, -2);
        assert_eq!(ledger.score(), -1);
        assert_eq!(ledger.events().len(), 2);
        assert_eq!(ledger.events()[0].reason, "Wound irrigation");
    }

    #[test]
    fn gates_settle_once() {
        let mut ledger = ScoreLedger::new();
        assert!(ledger.settle_gate(GateKey::M, GateVerdict::Missed));
        assert!(!ledger.settle_gate(GateKey::M, GateVerdict::Passed));
        assert_eq!(ledger.gate_verdict(GateKey::M), Some(GateVerdict::Missed));
        assert_eq!(ledger.gate_verdict(GateKey::C), None);
    }
}
