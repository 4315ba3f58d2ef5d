//! Terminal-condition state machine.
//!
//! A patient is ALIVE until one of six predicates holds, then DEAD for the rest
//! of the session. Only the instructor recompensation override leaves DEAD.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    ANOXIA_DEATH_S, DECOMPENSATED_MAP_MMHG, EXSANGUINATION_DEATH_S, EXSANGUINATION_MAP_MMHG,
    LOW_MAP_MMHG, LOW_SPO2_PCT, LOW_VOLUME_FRACTION, REFRACTORY_SHOCK_DEATH_S,
    TENSION_ARREST_AFTER_S,
};
use crate::mechanism::Mechanism;
use crate::patient::{PatientState, Side};

/// Recorded cause of death, in attribution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Asystole,
    Anoxia,
    Exsanguination,
    BrainDeath,
    RefractoryShock,
    Decompensation,
    InstructorOverride,
}

impl DeathCause {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Asystole => "Cardiac arrest (asystole/hypotension)",
            Self::Anoxia => "Hypoxic arrest (sustained anoxia)",
            Self::Exsanguination => "Exsanguination",
            Self::BrainDeath => "Severe TBI → herniation",
            Self::RefractoryShock => "Refractory shock (prolonged hypotension)",
            Self::Decompensation => "Decompensation",
            Self::InstructorOverride => "Instructor override",
        }
    }
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn accumulate(seconds: f64, condition: bool, dt: f64) -> f64 {
    if condition {
        seconds + dt
    } else {
        (seconds - 0.5 * dt).max(0.0)
    }
}

/// Run one ALIVE tick of the death state machine.
///
/// Returns the cause when this tick kills the patient; `None` while alive or
/// when the patient was already dead.
pub fn evaluate(patient: &mut PatientState, mechanism: Mechanism, dt_s: u32) -> Option<DeathCause> {
    if patient.death.dead {
        return None;
    }
    let dt = f64::from(dt_s);
    let death = &mut patient.death;
    death.low_map_s = accumulate(death.low_map_s, patient.map < LOW_MAP_MMHG, dt);
    death.low_spo2_s = accumulate(death.low_spo2_s, patient.spo2 < LOW_SPO2_PCT, dt);
    death.low_volume_s = accumulate(
        death.low_volume_s,
        patient.volume_fraction <= LOW_VOLUME_FRACTION,
        dt,
    );

    let now = patient.elapsed_s;
    let prolonged_tension = Side::BOTH
        .iter()
        .any(|side| patient.chest.side(*side).tension_duration_s(now) > TENSION_ARREST_AFTER_S);
    let blast_collapse = mechanism == Mechanism::Blast
        && (patient.volume_fraction < 0.6 || patient.coag_index > 0.8);
    if prolonged_tension || blast_collapse {
        patient.death.arrest_likely = true;
    }

    let death = &patient.death;
    let predicates = [
        (
            DeathCause::Asystole,
            patient.heart_rate <= 20.0 && patient.map <= 30.0,
        ),
        (DeathCause::Anoxia, death.low_spo2_s >= ANOXIA_DEATH_S),
        (
            DeathCause::Exsanguination,
            death.low_volume_s >= EXSANGUINATION_DEATH_S && patient.map <= EXSANGUINATION_MAP_MMHG,
        ),
        (
            DeathCause::BrainDeath,
            patient.tbi && patient.gcs <= 3.0 && patient.spo2 < 75.0 && patient.cpp() < 40.0,
        ),
        (
            DeathCause::RefractoryShock,
            death.low_map_s >= REFRACTORY_SHOCK_DEATH_S,
        ),
        (
            DeathCause::Decompensation,
            death.arrest_likely && patient.map < DECOMPENSATED_MAP_MMHG,
        ),
    ];
    let cause = predicates
        .into_iter()
        .find_map(|(cause, holds)| holds.then_some(cause))?;
    mark_dead(patient, cause);
    Some(cause)
}

/// Record a death. A no-op if the patient is already dead.
pub fn mark_dead(patient: &mut PatientState, cause: DeathCause) {
    if patient.death.dead {
        return;
    }
    patient.death.dead = true;
    patient.death.reason = Some(cause);
}
