use super::respiratory::sedation_effects;
use crate::noise::{NoiseDomain, NoiseSource};
use crate::patient::{Avpu, PatientState, Pupils};

fn sedation_penalty(patient: &PatientState) -> f64 {
    let (opioid, benzo) = sedation_effects(&patient.drugs);
    let mut penalty = 0.0;
    if benzo > 0.3 {
        penalty += 1.0;
    }
    if opioid > 0.6 {
        penalty += 0.5;
    }
    if patient.drugs.ketamine > 0.6 * patient.mass_kg {
        penalty += 0.3;
    }
    penalty
}

/// GCS, AVPU and intracranial dynamics. Returns true when the pupils change.
pub(super) fn update(patient: &mut PatientState, dt: f64, noise: &mut impl NoiseSource) -> bool {
    let mut gcs = 15.0 - sedation_penalty(patient);
    if patient.spo2 < 88.0 {
        gcs -= 1.0;
    }
    if patient.map < 60.0 {
        gcs -= 1.0;
    }

    let mut pupils_changed = false;
    if patient.tbi {
        gcs -= 1.0;
        let oxygen_drift = if patient.spo2 < 92.0 { 0.06 } else { -0.01 };
        let co2_drift = if patient.etco2 > 40.0 { 0.05 } else { -0.02 };
        patient.icp = (patient.icp + (oxygen_drift + co2_drift) * dt).clamp(8.0, 35.0);

        let cpp = patient.cpp();
        patient.cpp_deficit_load = if cpp < 60.0 {
            patient.cpp_deficit_load + 0.005 * (60.0 - cpp) * dt
        } else {
            patient.cpp_deficit_load - 0.05 * dt
        }
        .clamp(0.0, 12.0);
        gcs -= patient.cpp_deficit_load;

        if patient.icp > 25.0
            && patient.pupils == Pupils::EqualReactive
            && noise.chance(NoiseDomain::Neuro, 0.002 * dt)
        {
            patient.pupils = Pupils::AsymmetricSluggish;
            pupils_changed = true;
        }
    }

    patient.gcs = gcs.clamp(3.0, 15.0);
    patient.avpu = Avpu::from_gcs(patient.gcs);
    pupils_changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::Noise;

    fn stable() -> PatientState {
        PatientState {
            spo2: 97.0,
            map: 80.0,
            etco2: 38.0,
            ..PatientState::default()
        }
    }

    #[test]
    fn stable_patient_is_alert() {
        let mut patient = stable();
        update(&mut patient, 1.0, &mut Noise::Quiet);
        assert!((patient.gcs - 15.0).abs() < f64::EPSILON);
        assert_eq!(patient.avpu, Avpu::Alert);
    }

    #[test]
    fn hypoxia_hypotension_and_tbi_stack() {
        let mut patient = PatientState {
            spo2: 85.0,
            map: 55.0,
            tbi: true,
            icp: 12.0,
            ..stable()
        };
        update(&mut patient, 1.0, &mut Noise::Quiet);
        assert!(patient.gcs < 12.0);
        assert!(patient.icp > 12.0);
        assert!(patient.cpp_deficit_load > 0.0);
    }

    #[test]
    fn sustained_low_cpp_erodes_consciousness() {
        let mut patient = PatientState {
            map: 50.0,
            tbi: true,
            icp: 30.0,
            ..stable()
        };
        for _ in 0..600 {
            update(&mut patient, 1.0, &mut Noise::Quiet);
        }
        assert!((patient.gcs - 3.0).abs() < f64::EPSILON);
        assert_eq!(patient.avpu, Avpu::Unresponsive);
        assert_eq!(patient.pupils, Pupils::EqualReactive);
    }

    #[test]
    fn heavy_benzodiazepine_lowers_gcs() {
        let mut patient = stable();
        patient.drugs.midazolam = 1.0;
        update(&mut patient, 1.0, &mut Noise::Quiet);
        assert!((patient.gcs - 14.0).abs() < f64::EPSILON);
        assert_eq!(patient.avpu, Avpu::Alert);
    }
}
