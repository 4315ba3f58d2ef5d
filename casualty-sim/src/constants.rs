//! Centralized tuning constants for the casualty simulation.
//!
//! These values define the deterministic math of the physiology model and
//! the doctrine scoring. Keeping them together means the patient can only be
//! retuned through reviewed code changes rather than external assets.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_SESSION_START: &str = "log.session.start";
pub(crate) const LOG_INTERVENTION_APPLIED: &str = "log.intervention.applied";
pub(crate) const LOG_INTERVENTION_SKIPPED: &str = "log.intervention.skipped";
pub(crate) const LOG_TENSION_ONSET: &str = "log.chest.tension-onset";
pub(crate) const LOG_PUPILS_CHANGED: &str = "log.neuro.pupils";
pub(crate) const LOG_DECOMPENSATING: &str = "log.decompensating";
pub(crate) const LOG_DEATH: &str = "log.death";
pub(crate) const LOG_SCORE: &str = "log.score";
pub(crate) const LOG_INSTRUCTOR: &str = "log.instructor";
pub(crate) const LOG_WOUND_MARKED: &str = "log.wound.marked";

// Session ------------------------------------------------------------------
pub(crate) const EVENT_LOG_CAPACITY: usize = 300;
pub(crate) const MASS_MIN_KG: f64 = 30.0;
pub(crate) const MASS_MAX_KG: f64 = 200.0;
pub(crate) const DEFAULT_MASS_KG: f64 = 80.0;
pub(crate) const BLOOD_VOLUME_ML_PER_KG: f64 = 70.0;

// Thermal ------------------------------------------------------------------
pub(crate) const TEMP_MIN_C: f64 = 30.0;
pub(crate) const TEMP_MAX_C: f64 = 39.0;
pub(crate) const TEMP_COLD_START_C: f64 = 34.5;
pub(crate) const TEMP_NORMAL_START_C: f64 = 36.5;
pub(crate) const HYPOTHERMIA_THRESHOLD_C: f64 = 35.0;
pub(crate) const COLD_DRIFT_PER_MIN: f64 = -0.02;
pub(crate) const HOT_DRIFT_PER_MIN: f64 = 0.01;
pub(crate) const WARMING_DRIFT_PER_MIN: f64 = 0.01;
pub(crate) const WARMING_CEILING_C: f64 = 37.2;

// Chest --------------------------------------------------------------------
pub(crate) const TENSION_ONSET_CHANCE_PER_S: f64 = 0.004;
pub(crate) const TENSION_ARREST_AFTER_S: u32 = 180;
pub(crate) const OPEN_CHEST_RESP_PENALTY: f64 = 2.0;
pub(crate) const TENSION_RESP_PENALTY: f64 = 8.0;

// Hemostasis ---------------------------------------------------------------
pub(crate) const TXA_WINDOW_S: u32 = 180 * 60;
pub(crate) const TXA_BLEED_FACTOR: f64 = 0.7;
pub(crate) const TXA_COAG_PULL: f64 = 0.15;
pub(crate) const BLOOD_COAG_PULL: f64 = 0.2;
pub(crate) const TOURNIQUET_BLEED_FACTOR: f64 = 0.2;
pub(crate) const PACKING_BLEED_REDUCTION: f64 = 0.012;
pub(crate) const BINDER_BLEED_REDUCTION: f64 = 0.007;
pub(crate) const PACKING_BLEED_FLOOR: f64 = 0.002;
pub(crate) const IRRIGATION_BLEED_REDUCTION: f64 = 0.003;
pub(crate) const PRESSURE_DRESSING_BLEED_REDUCTION: f64 = 0.006;
pub(crate) const DRESSING_BLEED_FLOOR: f64 = 0.0015;
pub(crate) const HEMOSTATIC_BLEED_REDUCTION: f64 = 0.010;
pub(crate) const HEMOSTATIC_BLEED_FLOOR: f64 = 0.0012;

// Resuscitation ------------------------------------------------------------
pub(crate) const WHOLE_BLOOD_UNIT_ML: f64 = 250.0;
pub(crate) const CRYSTALLOID_UNIT_ML: f64 = 500.0;
pub(crate) const CRYSTALLOID_EFFICIENCY: f64 = 0.7;
pub(crate) const CALCIUM_DEBT_PER_ML: f64 = 1.0 / 500.0;
pub(crate) const DILUTION_THRESHOLD_ML: f64 = 1000.0;
pub(crate) const EDEMA_THRESHOLD_ML: f64 = 2000.0;
pub(crate) const CRYSTALLOID_SHUNT_THRESHOLD_ML: f64 = 1500.0;
pub(crate) const EDEMA_SHUNT_STEP: f64 = 0.03;
pub(crate) const EDEMA_SHUNT_MAX: f64 = 0.45;
pub(crate) const NOREPI_START_LEVEL: f64 = 2.0;
pub(crate) const NOREPI_DECAY_PER_S: f64 = 0.0035;

// Drugs --------------------------------------------------------------------
pub(crate) const KETAMINE_MG_PER_KG: f64 = 0.3;
pub(crate) const FENTANYL_DOSE: f64 = 0.05;
pub(crate) const MIDAZOLAM_DOSE: f64 = 1.0;
pub(crate) const EPINEPHRINE_DOSE: f64 = 1.0;
pub(crate) const OPIOID_HALF_SATURATION: f64 = 0.08;
pub(crate) const BENZO_HALF_SATURATION: f64 = 1.0;

// Death thresholds ---------------------------------------------------------
pub(crate) const LOW_MAP_MMHG: f64 = 45.0;
pub(crate) const LOW_SPO2_PCT: f64 = 80.0;
pub(crate) const LOW_VOLUME_FRACTION: f64 = 0.50;
pub(crate) const ANOXIA_DEATH_S: f64 = 60.0;
pub(crate) const EXSANGUINATION_DEATH_S: f64 = 45.0;
pub(crate) const REFRACTORY_SHOCK_DEATH_S: f64 = 90.0;
pub(crate) const EXSANGUINATION_MAP_MMHG: f64 = 35.0;
pub(crate) const DECOMPENSATED_MAP_MMHG: f64 = 35.0;

// Decompensation warning ---------------------------------------------------
pub(crate) const DECOMP_WARNING_INTERVAL_S: u32 = 60;
pub(crate) const DECOMP_MAP_MMHG: f64 = 35.0;
pub(crate) const DECOMP_SPO2_PCT: f64 = 85.0;
pub(crate) const DECOMP_VOLUME_FRACTION: f64 = 0.5;

// Scoring ------------------------------------------------------------------
pub(crate) const EARLY_CONTROL_MINUTE: u32 = 2;
pub(crate) const EARLY_CONTROL_BONUS: i32 = 1;
pub(crate) const MAP_TARGET_MMHG: f64 = 65.0;
pub(crate) const MAP_TARGET_TBI_MMHG: f64 = 70.0;
pub(crate) const UNNECESSARY_PROCEDURE_PENALTY: i32 = -1;
pub(crate) const UNSTERILE_ATTEMPT_PENALTY: i32 = -1;
pub(crate) const WOUND_CARE_BONUS: i32 = 1;
pub(crate) const ANTIBIOTIC_BONUS: i32 = 1;
