//! Timed doctrine-compliance scoring.
//!
//! Gates are a fixed ordered table. Each gate resolves exactly once, on the
//! first evaluation at or past its deadline minute.
use crate::constants::{EARLY_CONTROL_BONUS, EARLY_CONTROL_MINUTE};
use crate::ledger::{CareCategory, GateKey, GateVerdict, ScoreEvent, ScoreLedger};
use crate::patient::PatientState;

/// One doctrine checkpoint.
#[derive(Debug, Clone, Copy)]
pub struct Gate {
    pub key: GateKey,
    pub deadline_min: u32,
    pub applies: fn(&PatientState) -> bool,
    pub passes: fn(&PatientState, &ScoreLedger) -> bool,
    pub penalty: i32,
    pub message: &'static str,
}

fn hemorrhage_uncontrolled(patient: &PatientState) -> bool {
    patient.external_bleed && patient.bleed_rate > 0.02
}

fn hypoxic(patient: &PatientState) -> bool {
    patient.spo2 < 90.0
}

fn under_resuscitated(patient: &PatientState) -> bool {
    patient.volume_fraction < 0.85 || patient.map < patient.map_target()
}

pub const GATES: [Gate; 4] = [
    Gate {
        key: GateKey::M,
        deadline_min: 3,
        applies: hemorrhage_uncontrolled,
        passes: |patient, ledger| ledger.has(CareCategory::Tourniquet) || patient.bleed_rate <= 0.01,
        penalty: 2,
        message: "Massive hemorrhage not controlled by 3 min",
    },
    Gate {
        key: GateKey::A,
        deadline_min: 5,
        applies: hypoxic,
        passes: |_, ledger| ledger.has(CareCategory::AirwayAdjunct),
        penalty: 1,
        message: "Airway not managed by 5 min",
    },
    Gate {
        key: GateKey::R,
        deadline_min: 6,
        applies: hypoxic,
        passes: |_, ledger| ledger.has(CareCategory::ChestCare),
        penalty: 1,
        message: "Respiration not addressed by 6 min",
    },
    Gate {
        key: GateKey::C,
        deadline_min: 10,
        applies: under_resuscitated,
        passes: |patient, ledger| {
            ledger.has(CareCategory::Blood)
                || (ledger.has(CareCategory::Txa) && patient.map >= patient.map_target())
        },
        penalty: 2,
        message: "Circulation not resuscitated by 10 min",
    },
];

/// Resolve every gate whose deadline has been reached, plus the early
/// hemorrhage-control checkpoint.
///
/// Evaluation is keyed to whole simulated minutes; calling twice for the same
/// minute returns no further events.
pub fn evaluate_gates(
    patient: &PatientState,
    ledger: &mut ScoreLedger,
    elapsed_minutes: u32,
) -> Vec<ScoreEvent> {
    if ledger
        .last_gate_minute()
        .is_some_and(|last| last >= elapsed_minutes)
    {
        return Vec::new();
    }
    ledger.mark_gate_minute(elapsed_minutes);

    let t_s = patient.elapsed_s;
    let mut events = Vec::new();

    if elapsed_minutes >= EARLY_CONTROL_MINUTE && !ledger.early_checkpoint_done() {
        ledger.complete_early_checkpoint();
        if !hemorrhage_uncontrolled(patient) {
            events.push(ledger.adjust(t_s, EARLY_CONTROL_BONUS, "Hemorrhage controlled early"));
        }
    }

    for gate in GATES.iter().filter(|gate| elapsed_minutes >= gate.deadline_min) {
        if ledger.gate_verdict(gate.key).is_some() {
            continue;
        }
        let verdict = if !(gate.applies)(patient) {
            GateVerdict::NotApplicable
        } else if (gate.passes)(patient, ledger) {
            GateVerdict::Passed
        } else {
            GateVerdict::Missed
        };
        ledger.settle_gate(gate.key, verdict);
        if verdict == GateVerdict::Missed {
            events.push(ledger.adjust(t_s, -gate.penalty, gate.message));
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bleeding() -> PatientState {
        PatientState {
            external_bleed: true,
            bleed_rate: 0.04,
            spo2: 96.0,
            ..PatientState::default()
        }
    }

    #[test]
    fn early_checkpoint_rewards_controlled_bleeding() {
        let mut patient = bleeding();
        patient.external_bleed = false;
        let mut ledger = ScoreLedger::new();
        assert!(evaluate_gates(&patient, &mut ledger, 1).is_empty());
        let events = evaluate_gates(&patient, &mut ledger, 2);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].delta, 1);
        assert_eq!(ledger.score(), 1);
    }

    #[test]
    fn hemorrhage_gate_penalizes_once() {
        let patient = bleeding();
        let mut ledger = ScoreLedger::new();
        for minute in 0..=3 {
            evaluate_gates(&patient, &mut ledger, minute);
        }
        assert_eq!(ledger.gate_verdict(GateKey::M), Some(GateVerdict::Missed));
        assert_eq!(ledger.score(), -2);
        for minute in 4..=9 {
            evaluate_gates(&patient, &mut ledger, minute);
        }
        let m_penalties = ledger
            .events()
            .iter()
            .filter(|event| event.reason.starts_with("Massive hemorrhage"))
            .count();
        assert_eq!(m_penalties, 1);
    }

    #[test]
    fn tourniquet_passes_hemorrhage_gate() {
        let patient = bleeding();
        let mut ledger = ScoreLedger::new();
        ledger.record(30, Some(CareCategory::Tourniquet), "Tourniquet");
        evaluate_gates(&patient, &mut ledger, 3);
        assert_eq!(ledger.gate_verdict(GateKey::M), Some(GateVerdict::Passed));
    }

    #[test]
    fn repeated_minute_is_ignored() {
        let patient = bleeding();
        let mut ledger = ScoreLedger::new();
        let first = evaluate_gates(&patient, &mut ledger, 3);
        let second = evaluate_gates(&patient, &mut ledger, 3);
        assert!(!first.is_empty());
        assert!(second.is_empty());
    }

    #[test]
    fn circulation_gate_accepts_txa_with_pressure() {
        let mut patient = PatientState {
            volume_fraction: 0.8,
            map: 68.0,
            spo2: 96.0,
            ..PatientState::default()
        };
        let mut ledger = ScoreLedger::new();
        ledger.record(60, Some(CareCategory::Txa), "TXA 1 g");
        evaluate_gates(&patient, &mut ledger, 10);
        assert_eq!(ledger.gate_verdict(GateKey::C), Some(GateVerdict::Passed));

        patient.tbi = true;
        let mut ledger = ScoreLedger::new();
        ledger.record(60, Some(CareCategory::Txa), "TXA 1 g");
        evaluate_gates(&patient, &mut ledger, 10);
        assert_eq!(ledger.gate_verdict(GateKey::C), Some(GateVerdict::Missed));
    }

    #[test]
    fn late_first_evaluation_settles_all_due_gates() {
        let patient = PatientState {
            spo2: 85.0,
            ..bleeding()
        };
        let mut ledger = ScoreLedger::new();
        let events = evaluate_gates(&patient, &mut ledger, 10);
        assert_eq!(ledger.gate_verdicts().count(), 4);
        // M, A, R and C all missed; no early bonus with an open bleed.
        assert_eq!(events.len(), 4);
        assert_eq!(ledger.score(), -6);
    }
}
