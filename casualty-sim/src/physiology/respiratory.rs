use smallvec::SmallVec;

use crate::constants::{
    BENZO_HALF_SATURATION, CRYSTALLOID_SHUNT_THRESHOLD_ML, OPIOID_HALF_SATURATION,
    TENSION_ONSET_CHANCE_PER_S,
};
use crate::noise::{NoiseDomain, NoiseSource};
use crate::patient::{DrugLevels, PatientState, Side};

/// Open, undrained wounds may tension. Returns the sides that did.
pub(super) fn progress_chest(
    patient: &mut PatientState,
    dt: f64,
    noise: &mut impl NoiseSource,
) -> SmallVec<[Side; 2]> {
    let now = patient.elapsed_s;
    let mut onsets = SmallVec::new();
    for side in Side::BOTH {
        let hemithorax = patient.chest.side_mut(side);
        if hemithorax.untreated_open()
            && !hemithorax.tension
            && noise.chance(NoiseDomain::Chest, TENSION_ONSET_CHANCE_PER_S * dt)
        {
            hemithorax.develop_tension(now);
            onsets.push(side);
        }
    }
    onsets
}

/// Opioid/benzodiazepine saturation curves.
pub(super) fn sedation_effects(drugs: &DrugLevels) -> (f64, f64) {
    let opioid = drugs.fentanyl / (drugs.fentanyl + OPIOID_HALF_SATURATION);
    let benzo = drugs.midazolam / (drugs.midazolam + BENZO_HALF_SATURATION);
    (opioid, benzo)
}

/// Breaths per minute removed by sedation.
pub(super) fn sedation_depression(drugs: &DrugLevels) -> f64 {
    let (opioid, benzo) = sedation_effects(drugs);
    let mut depression = 0.0;
    if opioid > 0.7 {
        depression += 4.0 * (opioid - 0.7) / 0.3;
    }
    if benzo > 0.5 {
        depression += 2.0 * (benzo - 0.5) / 0.5;
    }
    depression
}

pub(super) fn ventilate(
    patient: &mut PatientState,
    shock: f64,
    depression: f64,
    noise: &mut impl NoiseSource,
) {
    let acid_drive = ((patient.base_deficit - 4.0) / 6.0).clamp(0.0, 2.0);
    let hypoxic_kick = if patient.spo2 < 90.0 { 2.0 } else { 0.0 };
    let rate = 14.0 + 8.0 * shock + acid_drive - depression + hypoxic_kick
        + noise.jitter(NoiseDomain::Vitals, 0.5);
    patient.resp_rate = rate.clamp(6.0, 36.0);

    let tidal_volume =
        (0.45 + 0.15 * ((patient.mass_kg - 70.0) / 30.0).clamp(-0.5, 0.5)).clamp(0.3, 0.6);
    let mut drive = 1.0 + ((patient.base_deficit - 2.0) / 6.0).clamp(0.0, 2.0);
    if shock > 0.4 {
        drive += 0.5;
    }
    if depression > 0.0 {
        drive -= 0.4;
    }
    patient.minute_ventilation = (patient.resp_rate * tidal_volume * drive).clamp(3.5, 15.0);
}

/// Shunt, oxygen saturation and end-tidal CO2.
pub(super) fn exchange_gases(patient: &mut PatientState, noise: &mut impl NoiseSource) {
    let mut shunt = 0.05 + patient.edema_shunt;
    if patient.chest.any_open() {
        shunt += 0.07;
    }
    if patient.chest.any_tension() {
        shunt += 0.18;
    }
    if patient.crystalloid_ml > CRYSTALLOID_SHUNT_THRESHOLD_ML {
        shunt += 0.05;
    }
    if patient.map < 60.0 {
        shunt += 0.05;
    }
    patient.shunt_fraction = shunt.clamp(0.03, 0.60);

    let ideal_pao2 = 500.0 * patient.fio2 - 150.0 / patient.resp_rate.max(1.0);
    let pao2 = ideal_pao2 * (1.0 - patient.shunt_fraction);
    let sao2 = (90.0 + 0.25 * (pao2 - 60.0)).clamp(60.0, 100.0);
    let vent_bonus = if patient.vent_support { 1.0 } else { 0.0 };
    patient.spo2 = (sao2 + vent_bonus).clamp(60.0, 100.0);

    if patient.vent_support {
        let target = if patient.tbi { 36.0 } else { 38.0 };
        patient.etco2 = (target + noise.jitter(NoiseDomain::Vitals, 1.0)).clamp(32.0, 42.0);
    } else {
        let perfusion = ((patient.map - 40.0) / 30.0).clamp(0.0, 1.0);
        let paco2 = (42.0 - 5.0 * (patient.minute_ventilation - 7.0) / 3.0).clamp(25.0, 65.0);
        patient.etco2 = (paco2 * (0.85 * perfusion + 0.15)).clamp(10.0, 55.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::Noise;

    #[test]
    fn heavy_fentanyl_depresses_breathing() {
        let drugs = DrugLevels {
            fentanyl: 1.0,
            ..DrugLevels::default()
        };
        assert!(sedation_depression(&drugs) > 3.0);
        assert!(sedation_depression(&DrugLevels::default()).abs() < f64::EPSILON);
    }

    #[test]
    fn tension_worsens_oxygenation() {
        let mut clear = PatientState::default();
        exchange_gases(&mut clear, &mut Noise::Quiet);
        let mut tension = PatientState::default();
        tension.chest.left.open = true;
        tension.chest.left.develop_tension(0);
        exchange_gases(&mut tension, &mut Noise::Quiet);
        assert!(tension.shunt_fraction > clear.shunt_fraction);
        assert!(tension.spo2 < clear.spo2);
    }

    #[test]
    fn ventilation_support_targets_lower_etco2_with_tbi() {
        let mut patient = PatientState {
            vent_support: true,
            tbi: true,
            ..PatientState::default()
        };
        exchange_gases(&mut patient, &mut Noise::Quiet);
        assert!((patient.etco2 - 36.0).abs() < f64::EPSILON);
        patient.tbi = false;
        exchange_gases(&mut patient, &mut Noise::Quiet);
        assert!((patient.etco2 - 38.0).abs() < f64::EPSILON);
    }

    #[test]
    fn quiet_noise_never_tensions_chest() {
        let mut patient = PatientState::default();
        patient.chest.right.open = true;
        for _ in 0..1_000 {
            assert!(progress_chest(&mut patient, 1.0, &mut Noise::Quiet).is_empty());
        }
        assert!(!patient.chest.right.tension);
    }
}
