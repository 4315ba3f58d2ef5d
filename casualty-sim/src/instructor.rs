//! Administrative overrides available to the exercise instructor.
//!
//! These bypass the physiology model and are never reachable through the
//! intervention catalog. Every override is clamped to the instructor range of
//! the vital it touches.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::LOG_INSTRUCTOR;
use crate::death::{self, DeathCause};
use crate::patient::PatientState;
use crate::session::Session;

/// Vitals the instructor panel can drive directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vital {
    HeartRate,
    Map,
    Spo2,
    RespRate,
    Etco2,
    CoreTemp,
    Lactate,
    BaseDeficit,
    VolumeFraction,
}

/// Instructor slider bounds and nudge step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VitalRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Vital {
    pub const ALL: [Self; 9] = [
        Self::HeartRate,
        Self::Map,
        Self::Spo2,
        Self::RespRate,
        Self::Etco2,
        Self::CoreTemp,
        Self::Lactate,
        Self::BaseDeficit,
        Self::VolumeFraction,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HeartRate => "hr",
            Self::Map => "map",
            Self::Spo2 => "spo2",
            Self::RespRate => "rr",
            Self::Etco2 => "etco2",
            Self::CoreTemp => "temp",
            Self::Lactate => "lactate",
            Self::BaseDeficit => "base_deficit",
            Self::VolumeFraction => "volume",
        }
    }

    #[must_use]
    pub const fn range(self) -> VitalRange {
        let (min, max, step) = match self {
            Self::HeartRate => (20.0, 170.0, 5.0),
            Self::Map => (30.0, 120.0, 5.0),
            Self::Spo2 => (60.0, 100.0, 2.0),
            Self::RespRate => (6.0, 36.0, 2.0),
            Self::Etco2 => (10.0, 50.0, 1.0),
            Self::CoreTemp => (33.0, 39.0, 0.2),
            Self::Lactate => (0.5, 10.0, 0.2),
            Self::BaseDeficit => (0.0, 20.0, 0.5),
            Self::VolumeFraction => (0.40, 1.10, 0.02),
        };
        VitalRange { min, max, step }
    }

    #[must_use]
    pub const fn read(self, patient: &PatientState) -> f64 {
        match self {
            Self::HeartRate => patient.heart_rate,
            Self::Map => patient.map,
            Self::Spo2 => patient.spo2,
            Self::RespRate => patient.resp_rate,
            Self::Etco2 => patient.etco2,
            Self::CoreTemp => patient.core_temp_c,
            Self::Lactate => patient.lactate,
            Self::BaseDeficit => patient.base_deficit,
            Self::VolumeFraction => patient.volume_fraction,
        }
    }

    const fn slot(self, patient: &mut PatientState) -> &mut f64 {
        match self {
            Self::HeartRate => &mut patient.heart_rate,
            Self::Map => &mut patient.map,
            Self::Spo2 => &mut patient.spo2,
            Self::RespRate => &mut patient.resp_rate,
            Self::Etco2 => &mut patient.etco2,
            Self::CoreTemp => &mut patient.core_temp_c,
            Self::Lactate => &mut patient.lactate,
            Self::BaseDeficit => &mut patient.base_deficit,
            Self::VolumeFraction => &mut patient.volume_fraction,
        }
    }
}

impl fmt::Display for Vital {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vital {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|vital| vital.as_str() == key)
            .ok_or(())
    }
}

/// Set a vital, clamped to its instructor range. Returns the stored value.
pub fn set_vital(patient: &mut PatientState, vital: Vital, value: f64) -> f64 {
    let range = vital.range();
    let stored = if value.is_nan() {
        range.min
    } else {
        value.clamp(range.min, range.max)
    };
    *vital.slot(patient) = stored;
    if vital == Vital::Lactate {
        patient.base_deficit = (1.5 * patient.lactate).clamp(0.0, 20.0);
    }
    stored
}

/// Shift a vital by `delta`, clamped to its instructor range.
pub fn nudge_vital(patient: &mut PatientState, vital: Vital, delta: f64) -> f64 {
    let current = vital.read(patient);
    set_vital(patient, vital, current + delta)
}

/// Push a living patient toward collapse. Returns false for the dead.
pub fn force_decompensation(patient: &mut PatientState) -> bool {
    if patient.is_dead() {
        return false;
    }
    patient.map = (patient.map - 20.0).max(30.0);
    patient.spo2 = patient.spo2.min(82.0);
    patient.volume_fraction = (patient.volume_fraction - 0.08).max(0.5);
    true
}

/// Declare death immediately, with agonal vitals.
pub fn force_death(patient: &mut PatientState) {
    patient.map = 28.0;
    patient.heart_rate = 22.0;
    patient.spo2 = 70.0;
    patient.etco2 = 12.0;
    death::mark_dead(patient, DeathCause::InstructorOverride);
}

/// Bring the patient back. The only path out of the dead state; the death
/// accumulators restart from zero while `arrest_likely` stays latched.
pub fn force_recompensation(patient: &mut PatientState) {
    patient.death.dead = false;
    patient.death.reason = None;
    patient.death.low_map_s = 0.0;
    patient.death.low_spo2_s = 0.0;
    patient.death.low_volume_s = 0.0;
    patient.map = patient.map.max(70.0);
    patient.spo2 = patient.spo2.max(94.0);
    patient.volume_fraction = (patient.volume_fraction + 0.08).min(1.0);
    patient.clamp();
}

impl Session {
    /// Instructor-set vital, logged.
    pub fn instructor_set(&mut self, vital: Vital, value: f64) -> f64 {
        let stored = set_vital(self.patient_mut(), vital, value);
        log::debug!("instructor set {vital} to {stored:.2}");
        self.push_log(LOG_INSTRUCTOR, format!("Instructor: {vital} set to {stored:.2}"));
        stored
    }

    /// Instructor nudge of a vital by whole steps.
    pub fn instructor_nudge(&mut self, vital: Vital, steps: i32) -> f64 {
        let delta = f64::from(steps) * vital.range().step;
        let stored = nudge_vital(self.patient_mut(), vital, delta);
        self.push_log(
            LOG_INSTRUCTOR,
            format!("Instructor: {vital} {delta:+} -> {stored:.2}"),
        );
        stored
    }

    pub fn force_decompensation(&mut self) -> bool {
        let applied = force_decompensation(self.patient_mut());
        if applied {
            self.push_log(LOG_INSTRUCTOR, "Instructor: Forced decompensation");
        }
        applied
    }

    pub fn force_death(&mut self) {
        force_death(self.patient_mut());
        log::info!("instructor forced death");
        self.push_log(LOG_INSTRUCTOR, "Instructor: Forced death");
    }

    pub fn force_recompensation(&mut self) {
        force_recompensation(self.patient_mut());
        log::info!("instructor forced recompensation");
        self.push_log(LOG_INSTRUCTOR, "Instructor: Forced recompensation");
    }
}
