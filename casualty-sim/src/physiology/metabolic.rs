use crate::constants::{
    BLOOD_COAG_PULL, COLD_DRIFT_PER_MIN, HOT_DRIFT_PER_MIN, HYPOTHERMIA_THRESHOLD_C, TEMP_MAX_C,
    TEMP_MIN_C, TXA_COAG_PULL, WARMING_CEILING_C, WARMING_DRIFT_PER_MIN,
};
use crate::mechanism::Ambient;
use crate::patient::PatientState;

pub(super) fn thermal_drift(patient: &mut PatientState, ambient: Ambient, dt: f64) {
    let minutes = dt / 60.0;
    let drift = match ambient {
        Ambient::Cold if !patient.hypothermia_kit => COLD_DRIFT_PER_MIN,
        Ambient::Hot => HOT_DRIFT_PER_MIN,
        _ => 0.0,
    };
    patient.core_temp_c = (patient.core_temp_c + drift * minutes).clamp(TEMP_MIN_C, TEMP_MAX_C);
    if patient.hypothermia_kit && patient.core_temp_c < WARMING_CEILING_C {
        patient.core_temp_c =
            (patient.core_temp_c + WARMING_DRIFT_PER_MIN * minutes).min(WARMING_CEILING_C);
    }
}

/// Weighted hypothermia, acidosis and volume-deficit burden.
pub(super) fn triad_load(patient: &PatientState) -> f64 {
    let mut load = 0.0;
    if patient.core_temp_c < HYPOTHERMIA_THRESHOLD_C {
        load += (HYPOTHERMIA_THRESHOLD_C - patient.core_temp_c) * 0.12;
    }
    if patient.base_deficit > 6.0 {
        load += (patient.base_deficit - 6.0) * 0.05;
    }
    if patient.volume_fraction < 0.75 {
        load += (0.75 - patient.volume_fraction) * 1.2;
    }
    load.clamp(0.0, 1.5)
}

pub(super) fn coagulopathy(patient: &mut PatientState, dt: f64) {
    let mut net = triad_load(patient);
    if patient.txa_active {
        net -= TXA_COAG_PULL;
    }
    if patient.transfused_ml > 0.0 {
        net -= BLOOD_COAG_PULL;
    }
    patient.coag_index = (patient.coag_index + net * dt / 60.0).clamp(0.0, 1.0);
}

pub(super) fn acid_base(patient: &mut PatientState, dt: f64) {
    let mut trend = 0.2 * (1.0 - patient.volume_fraction).clamp(0.0, 1.0);
    if patient.transfused_ml > 0.0 {
        trend -= 0.12;
    }
    if patient.map > 65.0 {
        trend -= 0.06;
    }
    patient.lactate = (patient.lactate + trend * dt / 60.0).clamp(0.0, 20.0);
    patient.base_deficit = (1.5 * patient.lactate).clamp(0.0, 20.0);
}

pub(super) fn drug_kinetics(patient: &mut PatientState, dt: f64) {
    let rates = patient.elimination;
    let drugs = &mut patient.drugs;
    drugs.ketamine *= (-rates.ketamine * dt).exp();
    drugs.fentanyl *= (-rates.fentanyl * dt).exp();
    drugs.midazolam *= (-rates.midazolam * dt).exp();
    drugs.epinephrine *= (-rates.epinephrine * dt).exp();
    if patient.ketamine_infusion > 0.0 {
        drugs.ketamine += patient.ketamine_infusion * dt;
    }
}

/// Urine output and capillary refill.
pub(super) fn perfusion_proxies(patient: &mut PatientState) {
    patient.urine_output = (60.0 * (patient.map - 55.0) / 25.0).clamp(0.0, 120.0);
    patient.cap_refill_s =
        (1.5 + (70.0 - patient.map) / 40.0 + 2.0 * (1.0 - patient.volume_fraction)).clamp(1.0, 5.0);
}

pub(super) fn pain(patient: &mut PatientState, dt: f64) {
    let mut analgesia = 0.0;
    if patient.drugs.ketamine > 0.0 {
        analgesia += 2.0;
    }
    if patient.drugs.fentanyl > 0.0 {
        analgesia += 1.5;
    }
    let target = (patient.baseline_pain - analgesia).clamp(0.0, 10.0);
    let step = (0.02 * dt).min(1.0);
    patient.pain = (patient.pain + (target - patient.pain) * step).clamp(0.0, 10.0);
}
