use crate::constants::{NOREPI_DECAY_PER_S, TXA_BLEED_FACTOR};
use crate::noise::{NoiseDomain, NoiseSource};
use crate::patient::PatientState;

/// Norepinephrine decay and the slow catecholamine filter.
pub(super) fn update_tone(patient: &mut PatientState, shock: f64, dt: f64) {
    patient.drugs.norepinephrine *= (-NOREPI_DECAY_PER_S * dt).exp();
    let mut target = 0.3 + 0.9 * shock;
    if patient.volume_fraction < 0.6 {
        // Exhausted sympathetic response.
        target -= 0.3;
    }
    let target = target.clamp(0.1, 1.0);
    patient.catecholamine_tone += (target - patient.catecholamine_tone) * 0.02 * dt;
    patient.catecholamine_tone = patient.catecholamine_tone.clamp(0.1, 1.0);
}

/// Fraction of normal preload delivered at the current volume. Below 0.6 the
/// venous return collapses toward zero at a volume fraction of 0.3.
fn preload(volume_fraction: f64) -> f64 {
    if volume_fraction >= 0.6 {
        volume_fraction.min(1.1)
    } else {
        (2.0 * (volume_fraction - 0.3)).max(0.05)
    }
}

pub(super) fn update_hemodynamics(
    patient: &mut PatientState,
    shock: f64,
    resp_penalty: f64,
    noise: &mut impl NoiseSource,
) {
    let norepi = patient.drugs.norepinephrine;
    let tone = patient.catecholamine_tone;
    let acidotic = patient.base_deficit > 6.0;

    let afterload = (1.0 + 0.25 * norepi + (tone - 0.6) * 0.3).clamp(0.8, 1.6);
    let mut contractility = 1.0 + (tone - 0.6) * 0.4;
    if patient.hypothermic() {
        contractility -= 0.15;
    }
    if acidotic {
        contractility -= 0.1;
    }
    if patient.calcium_debt > 0.0 {
        contractility -= 0.1;
    }
    let contractility = contractility.clamp(0.6, 1.3);
    let stroke_volume =
        (70.0 * preload(patient.volume_fraction) * contractility / afterload).clamp(8.0, 110.0);

    let mut heart_rate = 70.0 + 45.0 * shock + 0.4 * patient.pain + 30.0 * tone;
    if patient.drugs.epinephrine > 0.0 {
        heart_rate += 10.0;
    }
    if norepi > 0.0 {
        heart_rate += 3.0;
    }
    heart_rate += noise.jitter(NoiseDomain::Vitals, 2.0);
    if patient.map < 45.0 || patient.spo2 < 82.0 {
        heart_rate -= 10.0;
    }
    patient.heart_rate = heart_rate.clamp(20.0, 170.0);

    let cardiac_output = (patient.heart_rate * stroke_volume / 1000.0).clamp(0.8, 10.0);
    let pressor_tone = 4.0 * norepi;
    let calcium_penalty = 4.0 * patient.calcium_debt;
    let map = cardiac_output * 18.0 + pressor_tone - 0.7 * resp_penalty - calcium_penalty
        + noise.jitter(NoiseDomain::Vitals, 1.5);
    patient.map = map.clamp(30.0, 120.0);
}

/// Pressure-sensitive hemorrhage, amplified by the lethal triad.
pub(super) fn bleed(patient: &mut PatientState, dt: f64) {
    let pressure = ((patient.map - 50.0) / 25.0).clamp(0.5, 1.6);
    let txa = if patient.txa_active { TXA_BLEED_FACTOR } else { 1.0 };
    let mut triad = 1.0 + 0.8 * patient.coag_index;
    if patient.hypothermic() {
        triad += 0.25;
    }
    if patient.base_deficit > 6.0 {
        triad += 0.15;
    }
    let loss = patient.bleed_rate * pressure * txa * triad * dt / 60.0;
    patient.volume_fraction = (patient.volume_fraction - loss).clamp(0.0, 1.2);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::Noise;

    #[test]
    fn preload_collapses_below_threshold() {
        assert!((preload(0.8) - 0.8).abs() < f64::EPSILON);
        assert!((preload(1.2) - 1.1).abs() < f64::EPSILON);
        assert!((preload(0.5) - 0.4).abs() < 1e-12);
        assert!((preload(0.2) - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn low_volume_drops_pressure() {
        let mut full = PatientState {
            volume_fraction: 0.95,
            ..PatientState::default()
        };
        let mut empty = PatientState {
            volume_fraction: 0.45,
            ..PatientState::default()
        };
        let full_shock = full.shock_level();
        update_hemodynamics(&mut full, full_shock, 0.0, &mut Noise::Quiet);
        let empty_shock = empty.shock_level();
        update_hemodynamics(&mut empty, empty_shock, 0.0, &mut Noise::Quiet);
        assert!(empty.map < full.map);
        assert!(empty.map < 45.0);
    }

    #[test]
    fn txa_slows_bleeding() {
        let mut plain = PatientState::default();
        let mut treated = PatientState {
            txa_active: true,
            ..PatientState::default()
        };
        bleed(&mut plain, 60.0);
        bleed(&mut treated, 60.0);
        let lost_plain = 0.80 - plain.volume_fraction;
        let lost_treated = 0.80 - treated.volume_fraction;
        assert!((lost_treated - 0.7 * lost_plain).abs() < 1e-12);
    }

    #[test]
    fn norepinephrine_decays_first_order() {
        let mut patient = PatientState::default();
        patient.drugs.norepinephrine = 2.0;
        update_tone(&mut patient, 0.2, 200.0);
        assert!((patient.drugs.norepinephrine - 2.0 * (-0.7_f64).exp()).abs() < 1e-12);
    }
}
