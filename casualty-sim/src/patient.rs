//! Patient data entity and pure derived-quantity queries.
//!
//! [`PatientState`] is plain serializable data: every field needed to replay a
//! session is stored, nothing is hidden behind derived-only state.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    BLOOD_VOLUME_ML_PER_KG, HYPOTHERMIA_THRESHOLD_C, MAP_TARGET_MMHG, MAP_TARGET_TBI_MMHG,
    OPEN_CHEST_RESP_PENALTY, TEMP_COLD_START_C, TEMP_MAX_C, TEMP_MIN_C, TEMP_NORMAL_START_C,
    TENSION_RESP_PENALTY, TXA_WINDOW_S,
};
use crate::death::DeathCause;
use crate::mechanism::{Ambient, Mechanism};
use crate::noise::{NoiseDomain, NoiseSource};

/// Chest side addressed by decompression-class procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Self; 2] = [Self::Left, Self::Right];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One hemithorax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Hemithorax {
    pub open: bool,
    pub tension: bool,
    pub drained: bool,
    pub tubed: bool,
    /// Simulated second the current tension episode began.
    #[serde(default)]
    pub tension_since_s: Option<u32>,
}

impl Hemithorax {
    /// Open wound with nothing draining it.
    #[must_use]
    pub const fn untreated_open(&self) -> bool {
        self.open && !self.tubed && !self.drained
    }

    #[must_use]
    pub fn respiratory_penalty(&self) -> f64 {
        let mut penalty = 0.0;
        if self.untreated_open() {
            penalty += OPEN_CHEST_RESP_PENALTY;
        }
        if self.tension {
            penalty += TENSION_RESP_PENALTY;
        }
        penalty
    }

    pub(crate) const fn develop_tension(&mut self, now_s: u32) {
        self.tension = true;
        self.tension_since_s = Some(now_s);
    }

    /// Clear tension; returns whether any was present.
    pub(crate) const fn decompress(&mut self) -> bool {
        let had_tension = self.tension;
        self.tension = false;
        self.tension_since_s = None;
        had_tension
    }

    #[must_use]
    pub fn tension_duration_s(&self, now_s: u32) -> u32 {
        match self.tension_since_s {
            Some(since) if self.tension => now_s.saturating_sub(since),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Chest {
    pub left: Hemithorax,
    pub right: Hemithorax,
}

impl Chest {
    #[must_use]
    pub const fn side(&self, side: Side) -> &Hemithorax {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub const fn side_mut(&mut self, side: Side) -> &mut Hemithorax {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    #[must_use]
    pub const fn any_open(&self) -> bool {
        self.left.open || self.right.open
    }

    #[must_use]
    pub const fn any_tension(&self) -> bool {
        self.left.tension || self.right.tension
    }

    #[must_use]
    pub fn respiratory_penalty(&self) -> f64 {
        self.left.respiratory_penalty() + self.right.respiratory_penalty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Airway {
    #[default]
    Patent,
    Adjunct,
    Secured,
}

/// Alert / Verbal / Pain / Unresponsive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Avpu {
    #[default]
    Alert,
    Verbal,
    Pain,
    Unresponsive,
}

impl Avpu {
    #[must_use]
    pub fn from_gcs(gcs: f64) -> Self {
        if gcs >= 14.0 {
            Self::Alert
        } else if gcs >= 9.0 {
            Self::Verbal
        } else if gcs >= 6.0 {
            Self::Pain
        } else {
            Self::Unresponsive
        }
    }

    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Alert => 'A',
            Self::Verbal => 'V',
            Self::Pain => 'P',
            Self::Unresponsive => 'U',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Pupils {
    #[default]
    EqualReactive,
    AsymmetricSluggish,
}

/// Circulating drug levels in arbitrary dose units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DrugLevels {
    pub ketamine: f64,
    pub fentanyl: f64,
    pub midazolam: f64,
    pub epinephrine: f64,
    pub norepinephrine: f64,
}

/// First-order elimination constants, per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EliminationRates {
    pub ketamine: f64,
    pub fentanyl: f64,
    pub midazolam: f64,
    pub epinephrine: f64,
}

impl Default for EliminationRates {
    fn default() -> Self {
        Self {
            ketamine: 0.35 / 60.0,
            fentanyl: 0.5 / 60.0,
            midazolam: 0.4 / 60.0,
            epinephrine: 5.0 / 60.0,
        }
    }
}

/// Death bookkeeping owned by the death evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DeathState {
    pub dead: bool,
    pub reason: Option<DeathCause>,
    pub low_map_s: f64,
    pub low_spo2_s: f64,
    pub low_volume_s: f64,
    pub arrest_likely: bool,
}

/// Systolic and diastolic pressure reconstructed from MAP.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientState {
    pub elapsed_s: u32,
    pub mass_kg: f64,

    pub heart_rate: f64,
    pub map: f64,
    pub resp_rate: f64,
    pub spo2: f64,
    pub etco2: f64,

    pub fio2: f64,
    pub shunt_fraction: f64,
    pub minute_ventilation: f64,
    /// Persistent shunt added by over-resuscitation with crystalloid.
    pub edema_shunt: f64,

    pub volume_fraction: f64,
    pub lactate: f64,
    pub base_deficit: f64,
    pub coag_index: f64,
    pub core_temp_c: f64,

    pub pain: f64,
    pub baseline_pain: f64,
    pub gcs: f64,
    pub avpu: Avpu,
    pub tbi: bool,
    pub icp: f64,
    pub pupils: Pupils,
    /// Accumulated cerebral hypoperfusion, subtracted from GCS.
    pub cpp_deficit_load: f64,

    pub external_bleed: bool,
    pub bleed_rate: f64,
    pub chest: Chest,

    pub airway: Airway,
    pub vent_support: bool,
    pub o2_on: bool,
    pub pelvic_binder_on: bool,

    pub drugs: DrugLevels,
    pub elimination: EliminationRates,
    /// Continuous ketamine infusion, dose units per second.
    pub ketamine_infusion: f64,

    pub txa_given_at_s: Option<u32>,
    pub txa_active: bool,
    pub calcium_debt: f64,
    pub calcium_given: bool,
    pub crystalloid_ml: f64,
    pub transfused_ml: f64,
    pub hypothermia_kit: bool,

    pub catecholamine_tone: f64,
    pub urine_output: f64,
    pub cap_refill_s: f64,

    pub death: DeathState,
    pub last_decomp_warning_s: Option<u32>,
}

impl Default for PatientState {
    fn default() -> Self {
        Self {
            elapsed_s: 0,
            mass_kg: 80.0,
            heart_rate: 110.0,
            map: 65.0,
            resp_rate: 22.0,
            spo2: 94.0,
            etco2: 35.0,
            fio2: 0.21,
            shunt_fraction: 0.05,
            minute_ventilation: 7.0,
            edema_shunt: 0.0,
            volume_fraction: 0.80,
            lactate: 3.2,
            base_deficit: 4.8,
            coag_index: 0.2,
            core_temp_c: TEMP_NORMAL_START_C,
            pain: 8.0,
            baseline_pain: 8.0,
            gcs: 14.0,
            avpu: Avpu::Alert,
            tbi: false,
            icp: 12.0,
            pupils: Pupils::EqualReactive,
            cpp_deficit_load: 0.0,
            external_bleed: false,
            bleed_rate: 0.02,
            chest: Chest::default(),
            airway: Airway::Patent,
            vent_support: false,
            o2_on: false,
            pelvic_binder_on: false,
            drugs: DrugLevels::default(),
            elimination: EliminationRates::default(),
            ketamine_infusion: 0.0,
            txa_given_at_s: None,
            txa_active: false,
            calcium_debt: 0.0,
            calcium_given: false,
            crystalloid_ml: 0.0,
            transfused_ml: 0.0,
            hypothermia_kit: false,
            catecholamine_tone: 0.6,
            urine_output: 20.0,
            cap_refill_s: 2.0,
            death: DeathState::default(),
            last_decomp_warning_s: None,
        }
    }
}

impl PatientState {
    /// Build the casualty for a mechanism of injury.
    pub fn casualty(
        mechanism: Mechanism,
        mass_kg: f64,
        ambient: Ambient,
        noise: &mut impl NoiseSource,
    ) -> Self {
        let preset = mechanism.preset();
        let mut patient = Self {
            mass_kg,
            core_temp_c: if ambient == Ambient::Cold {
                TEMP_COLD_START_C
            } else {
                TEMP_NORMAL_START_C
            },
            external_bleed: preset.external_bleed,
            bleed_rate: preset.bleed_rate,
            volume_fraction: preset.volume_fraction,
            lactate: preset.lactate,
            ..Self::default()
        };
        if preset.left_chest_tension {
            patient.chest.left.open = true;
            patient.chest.left.develop_tension(0);
        }
        if preset.tbi_chance > 0.0 && noise.chance(NoiseDomain::Setup, preset.tbi_chance) {
            patient.tbi = true;
        }
        patient.base_deficit = (1.5 * patient.lactate).clamp(0.0, 20.0);
        patient
    }

    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.death.dead
    }

    #[must_use]
    pub fn elapsed_minutes(&self) -> u32 {
        self.elapsed_s / 60
    }

    #[must_use]
    pub fn shock_level(&self) -> f64 {
        (1.0 - self.volume_fraction).clamp(0.0, 1.2)
    }

    #[must_use]
    pub fn hypothermic(&self) -> bool {
        self.core_temp_c < HYPOTHERMIA_THRESHOLD_C
    }

    /// Circulating blood volume in millilitres at full volume.
    #[must_use]
    pub fn nominal_blood_volume_ml(&self) -> f64 {
        (self.mass_kg * BLOOD_VOLUME_ML_PER_KG).max(1.0)
    }

    /// MAP target for permissive hypotension, raised when the brain is injured.
    #[must_use]
    pub const fn map_target(&self) -> f64 {
        if self.tbi {
            MAP_TARGET_TBI_MMHG
        } else {
            MAP_TARGET_MMHG
        }
    }

    /// Whether TXA is still inside its effective window.
    #[must_use]
    pub fn txa_window_open(&self) -> bool {
        self.txa_active
            && self
                .txa_given_at_s
                .is_some_and(|given| self.elapsed_s.saturating_sub(given) <= TXA_WINDOW_S)
    }

    /// Expire the TXA window once it has elapsed.
    pub fn refresh_txa_window(&mut self) {
        self.txa_active = self.txa_window_open();
    }

    #[must_use]
    pub fn blood_pressure(&self) -> BloodPressure {
        let shock = (1.0 - self.volume_fraction).clamp(0.0, 1.0);
        let pulse_pressure = (40.0 - 20.0 * shock + 0.1 * (self.map - 65.0)).clamp(20.0, 70.0);
        let diastolic = (self.map - pulse_pressure / 3.0).clamp(30.0, 110.0);
        let systolic = (diastolic + pulse_pressure).clamp(60.0, 220.0);
        BloodPressure {
            systolic,
            diastolic,
        }
    }

    /// Heart rate over systolic pressure.
    #[must_use]
    pub fn shock_index(&self) -> f64 {
        self.heart_rate / self.blood_pressure().systolic.max(1.0)
    }

    /// Heart rate over mean arterial pressure.
    #[must_use]
    pub fn modified_shock_index(&self) -> f64 {
        self.heart_rate / self.map.max(1.0)
    }

    /// Cerebral perfusion pressure.
    #[must_use]
    pub fn cpp(&self) -> f64 {
        self.map - self.icp
    }

    /// Hemorrhagic shock class, 1 through 4.
    #[must_use]
    pub fn shock_grade(&self) -> u8 {
        if self.volume_fraction > 0.85 {
            1
        } else if self.volume_fraction > 0.75 {
            2
        } else if self.volume_fraction > 0.65 {
            3
        } else {
            4
        }
    }

    #[must_use]
    pub fn summary(&self) -> VitalsSummary {
        let bp = self.blood_pressure();
        VitalsSummary {
            elapsed_s: self.elapsed_s,
            heart_rate: self.heart_rate,
            systolic: bp.systolic,
            diastolic: bp.diastolic,
            map: self.map,
            resp_rate: self.resp_rate,
            spo2: self.spo2,
            etco2: self.etco2,
            core_temp_c: self.core_temp_c,
            gcs: self.gcs,
            avpu: self.avpu,
            shock_index: self.shock_index(),
            modified_shock_index: self.modified_shock_index(),
            cpp: self.cpp(),
            shock_grade: self.shock_grade(),
            march: MarchStatus {
                hemorrhage_controlled: !self.external_bleed && self.bleed_rate <= 0.01,
                airway_managed: self.airway != Airway::Patent,
                chest_stable: !self.chest.any_tension()
                    && !self.chest.left.untreated_open()
                    && !self.chest.right.untreated_open(),
                circulation_adequate: self.map >= self.map_target()
                    && self.volume_fraction >= 0.85,
                hypothermia_prevented: self.hypothermia_kit || !self.hypothermic(),
            },
            dead: self.death.dead,
        }
    }

    /// Clamp every physiologic field into its declared domain.
    pub fn clamp(&mut self) {
        // The passive decay after death is allowed to fall below live floors.
        let (hr_min, map_min, spo2_min, etco2_min) = if self.death.dead {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            (20.0, 30.0, 60.0, 10.0)
        };
        self.heart_rate = clamp_finite(self.heart_rate, hr_min, 170.0);
        self.map = clamp_finite(self.map, map_min, 120.0);
        self.spo2 = clamp_finite(self.spo2, spo2_min, 100.0);
        self.etco2 = clamp_finite(self.etco2, etco2_min, 55.0);
        self.resp_rate = clamp_finite(self.resp_rate, 6.0, 36.0);
        self.fio2 = clamp_finite(self.fio2, 0.21, 1.0);
        self.shunt_fraction = clamp_finite(self.shunt_fraction, 0.03, 0.60);
        self.minute_ventilation = clamp_finite(self.minute_ventilation, 3.5, 15.0);
        self.edema_shunt = clamp_finite(self.edema_shunt, 0.0, 0.45);
        self.volume_fraction = clamp_finite(self.volume_fraction, 0.0, 1.2);
        self.lactate = clamp_finite(self.lactate, 0.0, 20.0);
        self.base_deficit = clamp_finite(self.base_deficit, 0.0, 20.0);
        self.coag_index = clamp_finite(self.coag_index, 0.0, 1.0);
        self.core_temp_c = clamp_finite(self.core_temp_c, TEMP_MIN_C, TEMP_MAX_C);
        self.pain = clamp_finite(self.pain, 0.0, 10.0);
        self.baseline_pain = clamp_finite(self.baseline_pain, 0.0, 10.0);
        self.gcs = clamp_finite(self.gcs, 3.0, 15.0);
        self.icp = clamp_finite(self.icp, 8.0, 35.0);
        self.cpp_deficit_load = clamp_finite(self.cpp_deficit_load, 0.0, 12.0);
        self.bleed_rate = clamp_finite(self.bleed_rate, 0.0, 1.0);
        self.catecholamine_tone = clamp_finite(self.catecholamine_tone, 0.1, 1.0);
        self.urine_output = clamp_finite(self.urine_output, 0.0, 120.0);
        self.cap_refill_s = clamp_finite(self.cap_refill_s, 1.0, 5.0);
        self.calcium_debt = clamp_finite(self.calcium_debt, 0.0, f64::MAX);
        self.ketamine_infusion = clamp_finite(self.ketamine_infusion, 0.0, f64::MAX);
        for level in [
            &mut self.drugs.ketamine,
            &mut self.drugs.fentanyl,
            &mut self.drugs.midazolam,
            &mut self.drugs.epinephrine,
            &mut self.drugs.norepinephrine,
        ] {
            *level = clamp_finite(*level, 0.0, f64::MAX);
        }
        if self.death.dead {
            self.gcs = 3.0;
            self.avpu = Avpu::Unresponsive;
        } else {
            self.avpu = Avpu::from_gcs(self.gcs);
        }
    }
}

/// Non-finite values collapse to the lower bound.
fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Doctrine checklist status derived from current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarchStatus {
    pub hemorrhage_controlled: bool,
    pub airway_managed: bool,
    pub chest_stable: bool,
    pub circulation_adequate: bool,
    pub hypothermia_prevented: bool,
}

/// Display-ready snapshot for monitors and handoff reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalsSummary {
    pub elapsed_s: u32,
    pub heart_rate: f64,
    pub systolic: f64,
    pub diastolic: f64,
    pub map: f64,
    pub resp_rate: f64,
    pub spo2: f64,
    pub etco2: f64,
    pub core_temp_c: f64,
    pub gcs: f64,
    pub avpu: Avpu,
    pub shock_index: f64,
    pub modified_shock_index: f64,
    pub cpp: f64,
    pub shock_grade: u8,
    pub march: MarchStatus,
    pub dead: bool,
}
