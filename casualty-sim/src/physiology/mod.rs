//! Per-second continuous update of all vitals.
//!
//! [`step`] runs a fixed ordered pipeline of stages and finishes with the
//! death evaluator. It reads only the patient and the scene environment; the
//! inventory and score ledger are never consulted.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::constants::{
    DECOMP_MAP_MMHG, DECOMP_SPO2_PCT, DECOMP_VOLUME_FRACTION, DECOMP_WARNING_INTERVAL_S,
};
use crate::death::{self, DeathCause};
use crate::mechanism::Environment;
use crate::noise::NoiseSource;
use crate::patient::{Avpu, PatientState, Side};

mod cardiovascular;
mod metabolic;
mod neuro;
mod respiratory;

/// Discrete happenings during one step, for the session event log.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepOutcome {
    pub death: Option<DeathCause>,
    pub decompensating: bool,
    pub tension_onsets: SmallVec<[Side; 2]>,
    pub pupils_changed: bool,
}

/// Advance the patient by `dt_s` simulated seconds.
pub fn step(
    patient: &mut PatientState,
    env: Environment,
    dt_s: u32,
    noise: &mut impl NoiseSource,
) -> StepOutcome {
    let dt = f64::from(dt_s);
    patient.elapsed_s = patient.elapsed_s.saturating_add(dt_s);

    if patient.death.dead {
        decay_after_death(patient, dt);
        return StepOutcome::default();
    }

    let mut outcome = StepOutcome::default();

    patient.refresh_txa_window();
    metabolic::thermal_drift(patient, env.ambient, dt);
    outcome.tension_onsets = respiratory::progress_chest(patient, dt, noise);
    metabolic::coagulopathy(patient, dt);

    let shock = patient.shock_level();
    let resp_penalty = patient.chest.respiratory_penalty();
    let depression = respiratory::sedation_depression(&patient.drugs);
    respiratory::ventilate(patient, shock, depression, noise);
    respiratory::exchange_gases(patient, noise);

    cardiovascular::update_tone(patient, shock, dt);
    cardiovascular::update_hemodynamics(patient, shock, resp_penalty, noise);
    cardiovascular::bleed(patient, dt);
    metabolic::acid_base(patient, dt);

    outcome.pupils_changed = neuro::update(patient, dt, noise);
    metabolic::drug_kinetics(patient, dt);
    metabolic::perfusion_proxies(patient);
    outcome.decompensating = decompensation_warning(patient);
    metabolic::pain(patient, dt);

    patient.clamp();
    outcome.death = death::evaluate(patient, env.mechanism, dt_s);
    if outcome.death.is_some() {
        patient.clamp();
    }
    outcome
}

fn decay_after_death(patient: &mut PatientState, dt: f64) {
    patient.heart_rate = (patient.heart_rate - dt).max(0.0);
    patient.map = (patient.map - 1.5 * dt).max(0.0);
    patient.spo2 = (patient.spo2 - 0.8 * dt).max(0.0);
    patient.etco2 = (patient.etco2 - 0.5 * dt).max(0.0);
    patient.gcs = 3.0;
    patient.avpu = Avpu::Unresponsive;
    patient.clamp();
}

/// At most one warning per interval while any decompensation sign holds.
fn decompensation_warning(patient: &mut PatientState) -> bool {
    let failing = patient.map <= DECOMP_MAP_MMHG
        || patient.spo2 <= DECOMP_SPO2_PCT
        || patient.volume_fraction <= DECOMP_VOLUME_FRACTION;
    if !failing {
        return false;
    }
    let now = patient.elapsed_s;
    let due = patient
        .last_decomp_warning_s
        .is_none_or(|last| now.saturating_sub(last) >= DECOMP_WARNING_INTERVAL_S);
    if due {
        patient.last_decomp_warning_s = Some(now);
    }
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanism::{Ambient, Mechanism};
    use crate::noise::Noise;

    fn casualty(mechanism: Mechanism) -> (PatientState, Environment) {
        let env = Environment::new(mechanism, Ambient::Temperate);
        let patient = PatientState::casualty(mechanism, 80.0, env.ambient, &mut Noise::Quiet);
        (patient, env)
    }

    #[test]
    fn step_advances_time() {
        let (mut patient, env) = casualty(Mechanism::Mvc);
        step(&mut patient, env, 1, &mut Noise::Quiet);
        step(&mut patient, env, 1, &mut Noise::Quiet);
        assert_eq!(patient.elapsed_s, 2);
    }

    #[test]
    fn untreated_blast_bleeds_out() {
        let (mut patient, env) = casualty(Mechanism::Blast);
        let mut cause = None;
        while patient.elapsed_s < 600 && cause.is_none() {
            cause = step(&mut patient, env, 1, &mut Noise::Quiet).death;
        }
        assert!(patient.is_dead());
        assert!(matches!(
            cause,
            Some(DeathCause::Exsanguination | DeathCause::RefractoryShock)
        ));
    }

    #[test]
    fn dead_patients_decay_toward_zero() {
        let (mut patient, env) = casualty(Mechanism::Mvc);
        death::mark_dead(&mut patient, DeathCause::InstructorOverride);
        let volume = patient.volume_fraction;
        for _ in 0..200 {
            let outcome = step(&mut patient, env, 1, &mut Noise::Quiet);
            assert_eq!(outcome, StepOutcome::default());
        }
        assert!(patient.heart_rate.abs() < f64::EPSILON);
        assert!(patient.map.abs() < f64::EPSILON);
        assert!(patient.spo2.abs() < f64::EPSILON);
        assert!(patient.etco2.abs() < f64::EPSILON);
        assert!((patient.gcs - 3.0).abs() < f64::EPSILON);
        assert!((patient.volume_fraction - volume).abs() < f64::EPSILON);
    }

    #[test]
    fn decompensation_warning_is_throttled() {
        let mut patient = PatientState {
            volume_fraction: 0.45,
            ..PatientState::default()
        };
        let mut warnings = 0;
        for second in 0..180 {
            patient.elapsed_s = second;
            if decompensation_warning(&mut patient) {
                warnings += 1;
            }
        }
        assert_eq!(warnings, 3);
    }

    #[test]
    fn stable_mvc_survives_ten_minutes_with_blood() {
        let (mut patient, env) = casualty(Mechanism::Mvc);
        patient.transfused_ml = 250.0;
        patient.volume_fraction = 0.95;
        patient.bleed_rate = 0.002;
        for _ in 0..600 {
            step(&mut patient, env, 1, &mut Noise::Quiet);
        }
        assert!(!patient.is_dead());
        assert!(patient.map > 65.0);
    }
}
